use super::*;
use crate::foundation::core::{ArrayModifierId, LayerId};
use crate::graph::dsl::GraphBuilder;
use crate::graph::model::GraphOwner;
use crate::scene::dsl::{CompositionBuilder, LayerBuilder};
use crate::scene::model::LayerKind;
use crate::scene::timeline::Timeline;

fn fixture() -> (Composition, BTreeMap<GraphId, Graph>) {
    let c = CompositionBuilder::new("c", 10.0, 10.0, 10)
        .layer(
            LayerBuilder::new("l", LayerKind::Rect)
                .keyframed("opacity", Timeline::linear([(0, 0.0), (10, 1.0)]))
                .number("scale", 1.0)
                .number("width", 1.0)
                .number("rotation", 0.0)
                .number("still", 0.0)
                .number("count", 2.0)
                .graph("g")
                .array_modifier("m", "count", Some("gm")),
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
    .property_input("in", "opacity", &c)
    .unwrap()
    .node("comp", NodeKind::Composition)
    .unwrap()
    .property_output("out_scale", "scale", &c)
    .unwrap()
    .property_output("out_width", "width", &c)
    .unwrap()
    .connect("in", 0, "out_scale", 0)
    .unwrap()
    .connect_named("comp", "width", "out_width", "width")
    .unwrap()
    .build()
    .unwrap();
    let gm = GraphBuilder::new(
        "gm",
        GraphOwner::ArrayModifier {
            layer: LayerId::new("l"),
            modifier: ArrayModifierId::new("m"),
        },
    )
    .node("i", NodeKind::ArrayModifierIndex)
    .unwrap()
    .property_output("out_rot", "rotation", &c)
    .unwrap()
    .connect("i", 0, "out_rot", 0)
    .unwrap()
    .build()
    .unwrap();
    let graphs = [g, gm].into_iter().map(|g| (g.id.clone(), g)).collect();
    (c, graphs)
}

fn deps(property: &str) -> Vec<Dependency> {
    let (c, graphs) = fixture();
    property_dependencies(&c, &graphs, &PropertyId::new(property)).unwrap()
}

#[test]
fn keyframed_property_depends_on_frame() {
    assert_eq!(deps("opacity"), [Dependency::Frame]);
}

#[test]
fn reads_are_followed_transitively() {
    assert_eq!(
        deps("scale"),
        [
            Dependency::Frame,
            Dependency::OtherProperty(PropertyId::new("opacity"))
        ]
    );
}

#[test]
fn composition_size_and_instance_index() {
    assert_eq!(deps("width"), [Dependency::ContainerSize]);
    assert_eq!(deps("rotation"), [Dependency::ArrayModifierIndex]);
}

#[test]
fn untouched_static_property_has_no_dependencies() {
    assert!(deps("still").is_empty());
}

#[test]
fn unknown_property_is_an_error() {
    let (c, graphs) = fixture();
    assert!(property_dependencies(&c, &graphs, &PropertyId::new("nope")).is_err());
}

#[test]
fn dependencies_serialize_tagged() {
    let json = serde_json::to_value(deps("scale")).unwrap();
    assert_eq!(
        json,
        serde_json::json!([
            {"affected_by": "frame"},
            {"affected_by": "other_property", "property": "opacity"}
        ])
    );
}
