use super::*;
use crate::foundation::core::LayerId;
use crate::graph::dsl::GraphBuilder;
use crate::graph::kind::NodeKind;
use crate::graph::model::GraphOwner;

fn owner() -> GraphOwner {
    GraphOwner::Layer {
        layer: LayerId::new("l"),
    }
}

// n -> rad -> deg, plus an unconnected vec2_add and color_input.
fn chain() -> Graph {
    GraphBuilder::new("g", owner())
        .node("n", NodeKind::NumInput { value: 90.0 })
        .unwrap()
        .node("rad", NodeKind::DegToRad)
        .unwrap()
        .node("deg", NodeKind::RadToDeg)
        .unwrap()
        .node("add", NodeKind::Vec2Add)
        .unwrap()
        .node("col", NodeKind::ColorInput { color: Default::default() })
        .unwrap()
        .connect("n", 0, "rad", 0)
        .unwrap()
        .connect("rad", 0, "deg", 0)
        .unwrap()
        .build()
        .unwrap()
}

fn id(s: &str) -> NodeId {
    NodeId::new(s)
}

#[test]
fn accepts_compatible_connection() {
    let g = chain();
    check_connection(&g, &id("n"), 0, &id("deg"), 0).unwrap();
}

#[test]
fn rejects_unknown_nodes_and_slots() {
    let g = chain();
    assert_eq!(
        check_connection(&g, &id("x"), 0, &id("deg"), 0),
        Err(ConnectionError::UnknownNode(id("x")))
    );
    assert!(matches!(
        check_connection(&g, &id("n"), 1, &id("deg"), 0),
        Err(ConnectionError::SlotOutOfRange { side: "output", index: 1, .. })
    ));
    assert!(matches!(
        check_connection(&g, &id("n"), 0, &id("deg"), 5),
        Err(ConnectionError::SlotOutOfRange { side: "input", .. })
    ));
}

#[test]
fn rejects_type_mismatch() {
    let g = chain();
    assert_eq!(
        check_connection(&g, &id("col"), 0, &id("add"), 0),
        Err(ConnectionError::TypeMismatch {
            from: ValueType::RgbaColor,
            to: ValueType::Vec2,
        })
    );
}

#[test]
fn rejects_cycles_including_self_loops() {
    let g = chain();
    assert!(matches!(
        check_connection(&g, &id("deg"), 0, &id("rad"), 0),
        Err(ConnectionError::WouldCreateCycle { .. })
    ));
    assert!(matches!(
        check_connection(&g, &id("rad"), 0, &id("rad"), 0),
        Err(ConnectionError::WouldCreateCycle { .. })
    ));
}

#[test]
fn dependency_closures_include_the_node() {
    let g = chain();
    let deg = id("deg");
    let deps: Vec<&str> = dependencies_of(&g, &deg)
        .into_iter()
        .map(|n| n.0.as_str())
        .collect();
    assert_eq!(deps, ["deg", "n", "rad"]);

    let n = id("n");
    let dependents: Vec<&str> = dependents_of(&g, &n)
        .into_iter()
        .map(|n| n.0.as_str())
        .collect();
    assert_eq!(dependents, ["deg", "n", "rad"]);

    let add = id("add");
    assert_eq!(dependents_of(&g, &add).len(), 1);
}

#[test]
fn available_inputs_skip_upstream_and_incompatible_slots() {
    let g = chain();
    let slots = available_inputs_for(&g, &id("rad"), 0);
    let nodes: BTreeSet<&str> = slots.iter().map(|s| s.node.0.as_str()).collect();
    // rad and n are upstream; vec2_add takes vectors.
    assert_eq!(nodes, BTreeSet::from(["deg"]));
    assert!(available_inputs_for(&g, &id("rad"), 9).is_empty());
}

#[test]
fn available_outputs_skip_downstream_and_incompatible_slots() {
    let g = chain();
    let slots = available_outputs_for(&g, &id("rad"), 0);
    let nodes: BTreeSet<&str> = slots.iter().map(|s| s.node.0.as_str()).collect();
    assert_eq!(nodes, BTreeSet::from(["n"]));
}

#[test]
fn every_offered_connection_is_accepted() {
    let g = chain();
    for node in g.nodes.values() {
        for output in 0..node.outputs.len() {
            for slot in available_inputs_for(&g, &node.id, output) {
                let next = g
                    .with_connection(&node.id, output, &slot.node, slot.slot)
                    .unwrap();
                next.validate().unwrap();
            }
        }
    }
}
