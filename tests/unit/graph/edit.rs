use super::*;
use crate::foundation::core::LayerId;
use crate::graph::dsl::GraphBuilder;
use crate::graph::model::GraphOwner;
use crate::scene::dsl::{CompositionBuilder, LayerBuilder};
use crate::scene::model::LayerKind;

fn owner() -> GraphOwner {
    GraphOwner::Layer {
        layer: LayerId::new("l"),
    }
}

fn id(s: &str) -> NodeId {
    NodeId::new(s)
}

fn comp() -> Composition {
    CompositionBuilder::new("c", 10.0, 10.0, 10)
        .layer(
            LayerBuilder::new("l", LayerKind::Rect)
                .number("opacity", 1.0)
                .vec2("pos", Vec2::new(1.0, 2.0))
                .vec2("size", Vec2::new(3.0, 4.0))
                .graph("g"),
        )
        .unwrap()
        .build()
        .unwrap()
}

// n -> e(a) ; e(b) -> deg
fn expr_graph() -> Graph {
    GraphBuilder::new("g", owner())
        .node("n", NodeKind::NumInput { value: 3.0 })
        .unwrap()
        .node(
            "e",
            NodeKind::Expr {
                expression: "b = a * 2".into(),
            },
        )
        .unwrap()
        .node("deg", NodeKind::DegToRad)
        .unwrap()
        .connect_named("n", "value", "e", "a")
        .unwrap()
        .connect_named("e", "b", "deg", "degrees")
        .unwrap()
        .build()
        .unwrap()
}

fn pointer(g: &Graph, node: &str, input: usize) -> Option<Pointer> {
    g.node(&id(node)).unwrap().inputs[input].pointer.clone()
}

#[test]
fn edits_leave_the_original_untouched() {
    let g = expr_graph();
    let next = g.without_node(&id("n")).unwrap();
    assert!(g.node(&id("n")).is_some());
    assert!(next.node(&id("n")).is_none());
    assert_eq!(pointer(&g, "e", 0), Some(Pointer::new(id("n"), 0)));
}

#[test]
fn removing_a_node_severs_its_consumers() {
    let g = expr_graph().without_node(&id("n")).unwrap();
    assert_eq!(pointer(&g, "e", 0), None);
    g.validate().unwrap();
    assert!(g.without_node(&id("n")).is_err());
}

#[test]
fn duplicate_node_ids_are_rejected() {
    let g = expr_graph();
    let dup = Node::new(NodeKind::Empty).with_id("n");
    assert!(g.with_node(dup).is_err());
}

#[test]
fn connection_replaces_previous_pointer() {
    let g = expr_graph()
        .with_node(Node::new(NodeKind::NumInput { value: 1.0 }).with_id("m"))
        .unwrap();
    let g = g.with_connection(&id("m"), 0, &id("e"), 0).unwrap();
    assert_eq!(pointer(&g, "e", 0), Some(Pointer::new(id("m"), 0)));
    let g = g.without_connection(&id("e"), 0).unwrap();
    assert_eq!(pointer(&g, "e", 0), None);
}

#[test]
fn input_values_are_conformed() {
    let g = expr_graph();
    let g2 = g
        .with_input_value(&id("deg"), 0, Value::Number(45.0))
        .unwrap();
    assert_eq!(g2.node(&id("deg")).unwrap().inputs[0].value, Value::Number(45.0));
    assert!(
        g.with_input_value(&id("deg"), 0, Value::Text("x".into()))
            .is_err()
    );
    assert!(g.with_input_value(&id("deg"), 4, Value::Number(1.0)).is_err());
}

#[test]
fn literal_state_must_match_the_kind() {
    let g = expr_graph();
    let g2 = g
        .with_literal(&id("n"), NodeKind::NumInput { value: 7.0 })
        .unwrap();
    assert_eq!(
        g2.node(&id("n")).unwrap().kind,
        NodeKind::NumInput { value: 7.0 }
    );
    assert!(
        g.with_literal(
            &id("n"),
            NodeKind::Vec2Input {
                value: Vec2::ZERO
            }
        )
        .is_err()
    );
    assert!(g.with_literal(&id("deg"), NodeKind::DegToRad).is_err());
}

#[test]
fn position_edits_only_move_the_node() {
    let g = expr_graph();
    let g2 = g.with_position(&id("e"), Vec2::new(40.0, 8.0)).unwrap();
    assert_eq!(g2.node(&id("e")).unwrap().position, Vec2::new(40.0, 8.0));
    assert_eq!(g2.node(&id("e")).unwrap().inputs, g.node(&id("e")).unwrap().inputs);
}

#[test]
fn expression_edit_keeps_surviving_slots() {
    let g = expr_graph()
        .with_expression(&id("e"), "c = k + a; b = c")
        .unwrap();
    let e = g.node(&id("e")).unwrap();
    let inputs: Vec<&str> = e.inputs.iter().map(|i| i.name.as_str()).collect();
    let outputs: Vec<&str> = e.outputs.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(inputs, ["k", "a"]);
    assert_eq!(outputs, ["c", "b"]);
    assert_eq!(e.inputs[1].pointer, Some(Pointer::new(id("n"), 0)));
    assert_eq!(e.inputs[0].pointer, None);
    // `b` moved from output 0 to output 1.
    assert_eq!(pointer(&g, "deg", 0), Some(Pointer::new(id("e"), 1)));
    g.validate().unwrap();
}

#[test]
fn expression_edit_drops_removed_slots() {
    let g = expr_graph().with_expression(&id("e"), "z = 1").unwrap();
    assert!(g.node(&id("e")).unwrap().inputs.is_empty());
    assert_eq!(pointer(&g, "deg", 0), None);
    g.validate().unwrap();
}

#[test]
fn unparseable_expression_keeps_previous_io() {
    let before = expr_graph();
    let g = before.with_expression(&id("e"), "b = (a").unwrap();
    let e = g.node(&id("e")).unwrap();
    assert_eq!(
        e.kind,
        NodeKind::Expr {
            expression: "b = (a".into()
        }
    );
    assert_eq!(e.inputs, before.node(&id("e")).unwrap().inputs);
    assert_eq!(pointer(&g, "deg", 0), Some(Pointer::new(id("e"), 0)));
}

#[test]
fn expression_edit_requires_an_expr_node() {
    assert!(expr_graph().with_expression(&id("deg"), "b = 1").is_err());
}

#[test]
fn reselecting_a_property_remaps_by_name() {
    let c = comp();
    let g = GraphBuilder::new("g", owner())
        .property_input("in", "pos", &c)
        .unwrap()
        .node("deg", NodeKind::DegToRad)
        .unwrap()
        .connect_named("in", "y", "deg", "degrees")
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(pointer(&g, "deg", 0), Some(Pointer::new(id("in"), 2)));

    let g = g
        .with_selected_property(&id("in"), Some(PropertyId::new("size")), &c)
        .unwrap();
    assert_eq!(pointer(&g, "deg", 0), Some(Pointer::new(id("in"), 2)));

    let g = g
        .with_selected_property(&id("in"), Some(PropertyId::new("opacity")), &c)
        .unwrap();
    assert_eq!(pointer(&g, "deg", 0), None);

    let g = g.with_selected_property(&id("in"), None, &c).unwrap();
    assert!(g.node(&id("in")).unwrap().outputs.is_empty());
}

#[test]
fn selecting_a_property_on_other_kinds_fails() {
    let c = comp();
    let g = expr_graph();
    assert!(
        g.with_selected_property(&id("deg"), Some(PropertyId::new("pos")), &c)
            .is_err()
    );
    let out = g
        .with_node(Node::new(NodeKind::PropertyOutput { property: None }).with_id("out"))
        .unwrap();
    assert!(
        out.with_selected_property(&id("out"), Some(PropertyId::new("nope")), &c)
            .is_err()
    );
}
