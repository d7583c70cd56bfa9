use super::*;
use crate::foundation::core::{LayerId, NodeId, PropertyId, Vec2};
use crate::graph::dsl::GraphBuilder;
use crate::graph::kind::NodeKind;
use crate::graph::model::GraphOwner;
use crate::scene::dsl::{CompositionBuilder, LayerBuilder};
use crate::scene::model::{LayerKind, PropertySource};
use crate::value::runtime::Value;

fn fixture() -> (Composition, BTreeMap<GraphId, Graph>) {
    let c = CompositionBuilder::new("c", 10.0, 10.0, 10)
        .layer(
            LayerBuilder::new("l", LayerKind::Rect)
                .number("opacity", 1.0)
                .graph("g"),
        )
        .unwrap()
        .build()
        .unwrap();
    let g = GraphBuilder::new(
        "g",
        GraphOwner::Layer {
            layer: LayerId::new("l"),
        },
    )
    .node("n", NodeKind::NumInput { value: 0.5 })
    .unwrap()
    .node("cap", NodeKind::NumCap)
    .unwrap()
    .property_output("out", "opacity", &c)
    .unwrap()
    .connect("cap", 0, "out", 0)
    .unwrap()
    .build()
    .unwrap();
    (c, [(g.id.clone(), g)].into_iter().collect())
}

fn edit_graph(graphs: &mut BTreeMap<GraphId, Graph>, f: impl FnOnce(&Graph) -> Graph) {
    let id = GraphId::new("g");
    let next = f(&graphs[&id]);
    graphs.insert(id, next);
}

#[test]
fn stable_across_calls() {
    let (c, graphs) = fixture();
    assert_eq!(fingerprint_topology(&c, &graphs), fingerprint_topology(&c, &graphs));
}

#[test]
fn layout_and_property_values_are_ignored() {
    let (mut c, mut graphs) = fixture();
    let before = fingerprint_topology(&c, &graphs);

    edit_graph(&mut graphs, |g| {
        g.with_position(&NodeId::new("n"), Vec2::new(300.0, 40.0))
            .unwrap()
    });
    if let Some(Property::Single { value, .. }) = c.properties.get_mut(&PropertyId::new("opacity"))
    {
        *value = PropertySource::Static(Value::Number(0.1));
    }
    assert_eq!(fingerprint_topology(&c, &graphs), before);
}

#[test]
fn connections_change_the_fingerprint() {
    let (c, mut graphs) = fixture();
    let before = fingerprint_topology(&c, &graphs);
    edit_graph(&mut graphs, |g| {
        g.with_connection(&NodeId::new("n"), 0, &NodeId::new("cap"), 0)
            .unwrap()
    });
    assert_ne!(fingerprint_topology(&c, &graphs), before);
}

#[test]
fn literals_change_the_fingerprint() {
    let (c, mut graphs) = fixture();
    let before = fingerprint_topology(&c, &graphs);
    edit_graph(&mut graphs, |g| {
        g.with_literal(&NodeId::new("n"), NodeKind::NumInput { value: 0.75 })
            .unwrap()
    });
    let after_literal = fingerprint_topology(&c, &graphs);
    assert_ne!(after_literal, before);

    edit_graph(&mut graphs, |g| {
        g.with_input_value(&NodeId::new("cap"), 2, Value::Number(2.0))
            .unwrap()
    });
    assert_ne!(fingerprint_topology(&c, &graphs), after_literal);
}

#[test]
fn detaching_a_graph_changes_the_fingerprint() {
    let (c, mut graphs) = fixture();
    let before = fingerprint_topology(&c, &graphs);
    graphs.clear();
    assert_ne!(fingerprint_topology(&c, &graphs), before);
}
