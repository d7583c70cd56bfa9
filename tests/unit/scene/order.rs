use super::*;
use crate::foundation::core::PropertyId;
use crate::graph::dsl::GraphBuilder;
use crate::graph::model::GraphOwner;
use crate::scene::dsl::{CompositionBuilder, LayerBuilder};
use crate::scene::model::LayerKind;

fn owner(layer: &str) -> GraphOwner {
    GraphOwner::Layer {
        layer: LayerId::new(layer),
    }
}

/// Graph on `layer` copying property `from` into `to`.
fn copy_graph(id: &str, layer: &str, from: &str, to: &str, comp: &Composition) -> Graph {
    GraphBuilder::new(id, owner(layer))
        .property_input("in", from, comp)
        .unwrap()
        .property_output("out", to, comp)
        .unwrap()
        .connect("in", 0, "out", 0)
        .unwrap()
        .build()
        .unwrap()
}

fn comp(graph_on: &[(&str, &str)]) -> Composition {
    let mut b = CompositionBuilder::new("c", 10.0, 10.0, 10);
    for id in ["b", "a", "c"] {
        let mut layer = LayerBuilder::new(id, LayerKind::Rect).number(id, 1.0);
        if let Some((_, g)) = graph_on.iter().find(|(l, _)| *l == id) {
            layer = layer.graph(*g);
        }
        b = b.layer(layer).unwrap();
    }
    b.build().unwrap()
}

fn ids(v: &[&str]) -> Vec<LayerId> {
    v.iter().map(|s| LayerId::new(*s)).collect()
}

#[test]
fn independent_layers_keep_stacking_order() {
    let c = comp(&[]);
    assert_eq!(layer_order(&c, &BTreeMap::new()).unwrap(), ids(&["b", "a", "c"]));
}

#[test]
fn readers_come_after_the_layer_they_read() {
    let c = comp(&[("b", "gb")]);
    let mut graphs = BTreeMap::new();
    graphs.insert(GraphId::new("gb"), copy_graph("gb", "b", "a", "b", &c));
    assert_eq!(layer_order(&c, &graphs).unwrap(), ids(&["a", "b", "c"]));
}

#[test]
fn reading_own_properties_is_not_a_dependency() {
    let c = comp(&[("a", "ga")]);
    let mut graphs = BTreeMap::new();
    graphs.insert(GraphId::new("ga"), copy_graph("ga", "a", "a", "a", &c));
    assert_eq!(layer_order(&c, &graphs).unwrap(), ids(&["b", "a", "c"]));
}

#[test]
fn cycles_are_reported_per_layer() {
    let c = comp(&[("a", "ga"), ("b", "gb")]);
    let mut graphs = BTreeMap::new();
    graphs.insert(GraphId::new("ga"), copy_graph("ga", "a", "b", "a", &c));
    graphs.insert(GraphId::new("gb"), copy_graph("gb", "b", "a", "b", &c));
    let errors = layer_order(&c, &graphs).unwrap_err();
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| e.message.contains("cycle")));
}

#[test]
fn graph_ids_list_layer_graph_first() {
    let c = CompositionBuilder::new("c", 1.0, 1.0, 1)
        .layer(
            LayerBuilder::new("l", LayerKind::Rect)
                .number("n", 2.0)
                .graph("own")
                .array_modifier("m1", "n", Some("rep"))
                .array_modifier("m2", "n", None),
        )
        .unwrap()
        .build()
        .unwrap();
    let got: Vec<&GraphId> = layer_graph_ids(&c.layers[0]).collect();
    assert_eq!(got, vec![&GraphId::new("own"), &GraphId::new("rep")]);
    assert!(c.property(&PropertyId::new("n")).is_some());
}
