use super::*;
use crate::scene::dsl::{CompositionBuilder, LayerBuilder};
use crate::scene::timeline::Timeline;

fn comp() -> Composition {
    CompositionBuilder::new("c", 100.0, 50.0, 30)
        .layer(
            LayerBuilder::new("l1", LayerKind::Rect)
                .number("opacity", 0.5)
                .vec2("pos", Vec2::new(10.0, 20.0))
                .keyframed("rot", Timeline::linear([(0, 0.0), (10, 90.0)]))
                .group("xf", &["pos", "rot"])
                .unwrap(),
        )
        .unwrap()
        .layer(LayerBuilder::new("l2", LayerKind::Line).number("width", 2.0))
        .unwrap()
        .build()
        .unwrap()
}

fn ids(v: &[&str]) -> Vec<PropertyId> {
    v.iter().map(|s| PropertyId::new(*s)).collect()
}

#[test]
fn leaves_keep_compounds_whole() {
    let c = comp();
    let leaves: Vec<PropertyId> = c
        .leaves(&PropertyId::new("xf"))
        .unwrap()
        .into_iter()
        .map(|p| p.id().clone())
        .collect();
    assert_eq!(leaves, ids(&["pos", "rot"]));
}

#[test]
fn descendants_are_pre_order() {
    let c = comp();
    assert_eq!(
        c.descendants(&PropertyId::new("xf")).unwrap(),
        ids(&["xf", "pos", "pos.x", "pos.y", "rot"])
    );
}

#[test]
fn property_layers_cover_nested_properties() {
    let c = comp();
    let owners = c.property_layers();
    assert_eq!(owners[&PropertyId::new("pos.y")], LayerId::new("l1"));
    assert_eq!(owners[&PropertyId::new("width")], LayerId::new("l2"));
    assert_eq!(owners.len(), c.properties.len());
}

#[test]
fn raw_values_sample_timelines() {
    let c = comp();
    assert_eq!(
        c.raw_value(&PropertyId::new("rot"), FrameIndex(5)).unwrap(),
        Value::Number(45.0)
    );
    assert_eq!(
        c.raw_value(&PropertyId::new("opacity"), FrameIndex(5)).unwrap(),
        Value::Number(0.5)
    );
    assert!(c.raw_value(&PropertyId::new("pos"), FrameIndex(0)).is_err());
}

#[test]
fn slot_types() {
    let c = comp();
    let p = |id: &str| c.property(&PropertyId::new(id)).unwrap();
    assert_eq!(p("pos").slot_type(), Some(ValueType::Vec2));
    assert_eq!(p("opacity").slot_type(), Some(ValueType::Number));
    assert_eq!(p("xf").slot_type(), None);
    assert_eq!(p("pos").children(), ids(&["pos.x", "pos.y"]).as_slice());
}

#[test]
fn compound_value_reads_components() {
    let c = comp();
    let [x, y] = [PropertyId::new("pos.x"), PropertyId::new("pos.y")];
    let v = c
        .compound_value(&[x, y], |id| c.raw_value(id, FrameIndex(0)))
        .unwrap();
    assert_eq!(v, Vec2::new(10.0, 20.0));
}

#[test]
fn unknown_property_is_an_invariant_error() {
    let e = comp().require_property(&PropertyId::new("nope")).unwrap_err();
    assert!(matches!(e, FlowError::Invariant(_)));
}

#[test]
fn single_ids_skip_structure() {
    let c = comp();
    let singles: Vec<PropertyId> = c.single_ids().cloned().collect();
    assert_eq!(
        singles,
        ids(&["opacity", "pos.x", "pos.y", "rot", "width"])
    );
}
