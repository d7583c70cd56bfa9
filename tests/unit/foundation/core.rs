use super::*;

#[test]
fn generated_ids_are_unique_and_prefixed() {
    let a = NodeId::generate();
    let b = NodeId::generate();
    assert_ne!(a, b);
    assert!(a.0.starts_with("node_"));
    assert!(GraphId::generate().0.starts_with("graph_"));
}

#[test]
fn ids_display_their_inner_string() {
    assert_eq!(PropertyId::new("layer.opacity").to_string(), "layer.opacity");
    assert_eq!(LayerId::new("bg").to_string(), "bg");
}

#[test]
fn ids_serialize_as_plain_strings() {
    let s = serde_json::to_string(&PropertyId::new("p1")).unwrap();
    assert_eq!(s, "\"p1\"");
    let back: PropertyId = serde_json::from_str(&s).unwrap();
    assert_eq!(back, PropertyId::new("p1"));
}

#[test]
fn color_factors_clamp_and_scale() {
    let c = Rgba::from_factors(1.0, 0.5, -1.0, 2.0);
    assert_eq!(c, Rgba::rgba(255.0, 128.0, 0.0, 1.0));
    assert_eq!(Rgba::rgba(255.0, 0.0, 0.0, 0.25).to_factors(), [1.0, 0.0, 0.0, 0.25]);
}

#[test]
fn hsl_primaries() {
    assert_eq!(Rgba::from_hsl_factors(0.0, 1.0, 0.5, 1.0), Rgba::rgba(255.0, 0.0, 0.0, 1.0));
    assert_eq!(
        Rgba::from_hsl_factors(1.0 / 3.0, 1.0, 0.5, 1.0),
        Rgba::rgba(0.0, 255.0, 0.0, 1.0)
    );
    assert_eq!(Rgba::from_hsl_factors(0.5, 0.0, 1.0, 0.5), Rgba::rgba(255.0, 255.0, 255.0, 0.5));
}

#[test]
fn default_color_is_opaque_black() {
    assert_eq!(Rgba::default(), Rgba::rgba(0.0, 0.0, 0.0, 1.0));
    assert_eq!(Rgba::rgba(1.0, 2.0, 3.0, 0.1).opaque().a, 1.0);
}
