use super::*;
use crate::foundation::core::{ArrayModifierId, GraphId, LayerId, PropertyId};
use crate::graph::dsl::GraphBuilder;
use crate::scene::dsl::{CompositionBuilder, LayerBuilder};
use crate::scene::model::LayerKind;

fn comp() -> Composition {
    CompositionBuilder::new("c", 100.0, 50.0, 10)
        .layer(
            LayerBuilder::new("l", LayerKind::Rect)
                .number("opacity", 1.0)
                .number("scale", 1.0)
                .number("count", 3.0)
                .graph("g")
                .array_modifier("m", "count", Some("gm")),
        )
        .unwrap()
        .build()
        .unwrap()
}

fn layer_owner() -> GraphOwner {
    GraphOwner::Layer {
        layer: LayerId::new("l"),
    }
}

// in(opacity) -> cap -> out(scale); n -> lerp.a -> out(opacity); orphan is unconnected.
fn graph(c: &Composition) -> Graph {
    GraphBuilder::new("g", layer_owner())
        .property_input("in", "opacity", c)
        .unwrap()
        .node("cap", NodeKind::NumCap)
        .unwrap()
        .node("n", NodeKind::NumInput { value: 0.25 })
        .unwrap()
        .node("lerp", NodeKind::NumLerp)
        .unwrap()
        .node("orphan", NodeKind::DegToRad)
        .unwrap()
        .property_output("out_s", "scale", c)
        .unwrap()
        .property_output("out_o", "opacity", c)
        .unwrap()
        .connect("in", 0, "cap", 0)
        .unwrap()
        .connect("cap", 0, "out_s", 0)
        .unwrap()
        .connect("n", 0, "lerp", 0)
        .unwrap()
        .connect("n", 0, "lerp", 2)
        .unwrap()
        .connect("lerp", 0, "out_o", 0)
        .unwrap()
        .build()
        .unwrap()
}

#[test]
fn order_is_topological() {
    let c = comp();
    let g = graph(&c);
    let p = compile_flow_graph(&g, &c).unwrap();
    for compiled in p.nodes.values() {
        for src in compiled.node.sources() {
            assert!(p.nodes[src].compute_index < compiled.compute_index);
        }
    }
    let order: Vec<&str> = p.to_compute.iter().map(|n| n.0.as_str()).collect();
    assert_eq!(order, ["n", "lerp", "out_o", "in", "cap", "out_s"]);
}

#[test]
fn nodes_feeding_no_output_are_skipped() {
    let c = comp();
    let p = compile_flow_graph(&graph(&c), &c).unwrap();
    assert!(!p.nodes.contains_key(&NodeId::new("orphan")));

    let empty = Graph::new(layer_owner());
    assert!(compile_flow_graph(&empty, &c).unwrap().is_empty());
}

#[test]
fn successors_and_property_reads() {
    let c = comp();
    let p = compile_flow_graph(&graph(&c), &c).unwrap();
    assert_eq!(p.nodes[&NodeId::new("n")].next, [NodeId::new("lerp")]);
    assert_eq!(p.nodes[&NodeId::new("in")].next, [NodeId::new("cap")]);

    let readers: Vec<&str> = p.externals.property_value[&PropertyId::new("opacity")]
        .iter()
        .map(|n| n.0.as_str())
        .collect();
    assert_eq!(readers, ["in", "cap", "out_s"]);

    let out_o = &p.nodes[&NodeId::new("out_o")].affected_externals;
    assert!(out_o.potential_property_ids.contains(&PropertyId::new("opacity")));
    assert!(out_o.property_ids.is_empty());
}

#[test]
fn composition_outputs_split_frame_and_size() {
    let c = comp();
    let g = GraphBuilder::new("g", layer_owner())
        .node("comp", NodeKind::Composition)
        .unwrap()
        .property_output("out_s", "scale", &c)
        .unwrap()
        .property_output("out_o", "opacity", &c)
        .unwrap()
        .connect_named("comp", "width", "out_s", "scale")
        .unwrap()
        .connect_named("comp", "frame_index", "out_o", "opacity")
        .unwrap()
        .build()
        .unwrap();
    let p = compile_flow_graph(&g, &c).unwrap();
    let s = &p.nodes[&NodeId::new("out_s")].affected_externals;
    let o = &p.nodes[&NodeId::new("out_o")].affected_externals;
    assert!(s.container_size && !s.frame_index);
    assert!(o.frame_index && !o.container_size);
}

#[test]
fn modifier_graphs_seed_counts_and_index() {
    let c = comp();
    let g = GraphBuilder::new(
        "gm",
        GraphOwner::ArrayModifier {
            layer: LayerId::new("l"),
            modifier: ArrayModifierId::new("m"),
        },
    )
    .node("i", NodeKind::ArrayModifierIndex)
    .unwrap()
    .property_output("out", "scale", &c)
    .unwrap()
    .connect("i", 0, "out", 0)
    .unwrap()
    .build()
    .unwrap();
    let p = compile_flow_graph(&g, &c).unwrap();
    assert_eq!(p.externals.array_modifier_index.len(), 2);
    assert_eq!(p.externals.array_modifier_count[&ArrayModifierId::new("m")].len(), 2);
    assert_eq!(p.nodes[&NodeId::new("out")].graph, GraphId::new("gm"));
}

#[test]
fn invalid_graph_reports_at_graph_level() {
    let c = comp();
    let mut g = graph(&c);
    if let Some(n) = g.nodes.get_mut(&NodeId::new("cap")) {
        n.inputs[0].pointer = Some(crate::graph::model::Pointer::new(NodeId::new("ghost"), 0));
    }
    let errors = compile_flow_graph(&g, &c).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].graph, Some(GraphId::new("g")));
    assert_eq!(errors[0].node, None);
}

fn expr_graph(c: &Composition) -> Graph {
    GraphBuilder::new("g", layer_owner())
        .node(
            "e",
            NodeKind::Expr {
                expression: "b = 1".into(),
            },
        )
        .unwrap()
        .property_output("out", "scale", c)
        .unwrap()
        .connect("e", 0, "out", 0)
        .unwrap()
        .build()
        .unwrap()
}

#[test]
fn expressions_are_parsed_once() {
    let c = comp();
    let p = compile_flow_graph(&expr_graph(&c), &c).unwrap();
    assert!(p.expressions.contains_key(&NodeId::new("e")));
}

#[test]
fn unparseable_expression_is_a_node_error() {
    let c = comp();
    let g = expr_graph(&c)
        .with_expression(&NodeId::new("e"), "b = ")
        .unwrap();
    let errors = compile_flow_graph(&g, &c).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].node, Some(NodeId::new("e")));
}

#[test]
fn stale_expression_slots_are_reported() {
    let c = comp();
    let mut g = expr_graph(&c);
    if let Some(n) = g.nodes.get_mut(&NodeId::new("e")) {
        n.kind = NodeKind::Expr {
            expression: "c = 1".into(),
        };
    }
    let errors = compile_flow_graph(&g, &c).unwrap_err();
    assert!(errors[0].message.contains("do not match"));
}

#[test]
fn unknown_selected_property_is_reported() {
    let c = comp();
    let mut g = expr_graph(&c);
    if let Some(n) = g.nodes.get_mut(&NodeId::new("out")) {
        n.kind = NodeKind::PropertyOutput {
            property: Some(PropertyId::new("gone")),
        };
    }
    let errors = compile_flow_graph(&g, &c).unwrap_err();
    assert_eq!(errors[0].node, Some(NodeId::new("out")));
}
