use super::*;

#[test]
fn any_is_universal() {
    for ty in ValueType::ALL {
        assert!(can_convert(ValueType::Any, ty));
        assert!(can_convert(ty, ValueType::Any));
        assert!(can_convert(ty, ty));
    }
}

#[test]
fn rgb_to_rgba_is_one_way() {
    assert!(can_convert(ValueType::RgbColor, ValueType::RgbaColor));
    assert!(!can_convert(ValueType::RgbaColor, ValueType::RgbColor));
    assert!(!can_convert(ValueType::Number, ValueType::Vec2));
}

#[test]
fn convert_sets_match_pairwise_check() {
    let to_rgba = types_that_can_convert_to(ValueType::RgbaColor);
    assert_eq!(
        to_rgba.into_iter().collect::<Vec<_>>(),
        vec![ValueType::Any, ValueType::RgbaColor, ValueType::RgbColor]
    );
    let from_number = types_that_can_convert_from(ValueType::Number);
    assert_eq!(
        from_number.into_iter().collect::<Vec<_>>(),
        vec![ValueType::Any, ValueType::Number]
    );
}

#[test]
fn serde_names() {
    assert_eq!(serde_json::to_string(&ValueType::RgbaColor).unwrap(), "\"rgba_color\"");
    assert_eq!(
        serde_json::from_str::<ValueType>("\"transform_behavior\"").unwrap(),
        ValueType::TransformBehavior
    );
}
