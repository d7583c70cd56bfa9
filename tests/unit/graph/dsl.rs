use super::*;
use crate::foundation::core::LayerId;
use crate::graph::model::Pointer;
use crate::scene::dsl::{CompositionBuilder, LayerBuilder};
use crate::scene::model::LayerKind;

fn owner() -> GraphOwner {
    GraphOwner::Layer {
        layer: LayerId::new("l"),
    }
}

#[test]
fn builds_property_graph() {
    let comp = CompositionBuilder::new("c", 10.0, 10.0, 1)
        .layer(LayerBuilder::new("l", LayerKind::Rect).number("opacity", 1.0))
        .unwrap()
        .build()
        .unwrap();
    let g = GraphBuilder::new("g", owner())
        .property_input("in", "opacity", &comp)
        .unwrap()
        .node("cap", NodeKind::NumCap)
        .unwrap()
        .property_output("out", "opacity", &comp)
        .unwrap()
        .connect("in", 0, "cap", 0)
        .unwrap()
        .connect_named("cap", "value", "out", "opacity")
        .unwrap()
        .literal("cap", 2, Value::Number(0.5))
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(g.id, GraphId::new("g"));
    let out = g.node(&NodeId::new("out")).unwrap();
    assert_eq!(
        out.kind.selected_property(),
        Some(&PropertyId::new("opacity"))
    );
    assert_eq!(
        out.inputs[0].pointer,
        Some(Pointer::new(NodeId::new("cap"), 0))
    );
    let cap = g.node(&NodeId::new("cap")).unwrap();
    assert_eq!(cap.inputs[2].value, Value::Number(0.5));
}

#[test]
fn unknown_slot_names_fail() {
    let err = GraphBuilder::new("g", owner())
        .node("a", NodeKind::NumInput { value: 1.0 })
        .unwrap()
        .node("b", NodeKind::DegToRad)
        .unwrap()
        .connect_named("a", "value", "b", "nope");
    assert!(err.err().unwrap().to_string().contains("no slot nope"));
}

#[test]
fn refused_connections_become_validation_errors() {
    let err = GraphBuilder::new("g", owner())
        .node("a", NodeKind::ColorInput {
            color: Default::default(),
        })
        .unwrap()
        .node("b", NodeKind::DegToRad)
        .unwrap()
        .connect("a", 0, "b", 0)
        .err()
        .unwrap();
    assert!(matches!(err, FlowError::Validation(_)));
}
