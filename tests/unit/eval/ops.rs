use super::*;

fn n(v: f64) -> Value {
    Value::Number(v)
}

fn v2(x: f64, y: f64) -> Value {
    Value::Vec2(Vec2::new(x, y))
}

fn single(out: NodeOutputs) -> Value {
    assert_eq!(out.len(), 1);
    out.into_iter().next().unwrap()
}

#[test]
fn num_cap_clamps() {
    assert_eq!(single(num_cap(&[n(5.0), n(0.0), n(1.0)]).unwrap()), n(1.0));
    assert_eq!(single(num_cap(&[n(-1.0), n(0.0), n(1.0)]).unwrap()), n(0.0));
    assert_eq!(single(num_cap(&[n(0.3), n(0.0), n(1.0)]).unwrap()), n(0.3));
}

#[test]
fn num_lerp_and_angles() {
    assert_eq!(single(num_lerp(&[n(0.0), n(10.0), n(0.25)]).unwrap()), n(2.5));

    let rad = single(deg_to_rad(&[n(180.0)]).unwrap()).as_number().unwrap();
    assert!((rad - std::f64::consts::PI).abs() < 1e-12);
    let deg = single(rad_to_deg(&[n(std::f64::consts::FRAC_PI_2)]).unwrap())
        .as_number()
        .unwrap();
    assert!((deg - 90.0).abs() < 1e-12);
}

#[test]
fn vector_ops() {
    assert_eq!(
        single(vec2_add(&[v2(1.0, 2.0), v2(3.0, 4.0)]).unwrap()),
        v2(4.0, 6.0)
    );
    assert_eq!(
        single(vec2_lerp(&[v2(0.0, 0.0), v2(10.0, 20.0), n(0.5)]).unwrap()),
        v2(5.0, 10.0)
    );
    assert_eq!(
        vec2_factors(&[v2(3.0, -1.0)]).unwrap().into_vec(),
        vec![n(3.0), n(-1.0)]
    );
}

#[test]
fn vec2_interpolate_maps_and_clamps() {
    let run = |v: f64, lo: f64, hi: f64| {
        single(vec2_interpolate(&[n(v), n(lo), n(hi), v2(0.0, 0.0), v2(10.0, 20.0)]).unwrap())
    };
    assert_eq!(run(5.0, 0.0, 10.0), v2(5.0, 10.0));
    assert_eq!(run(20.0, 0.0, 10.0), v2(10.0, 20.0));
    assert_eq!(run(-3.0, 0.0, 10.0), v2(0.0, 0.0));
    assert_eq!(run(4.0, 2.0, 2.0), v2(0.0, 0.0));
}

#[test]
fn rect_translate_offsets_both_corners() {
    let r = Value::Rect(Rect::new(0.0, 0.0, 10.0, 5.0));
    assert_eq!(
        single(rect_translate(&[r, v2(2.0, 3.0)]).unwrap()),
        Value::Rect(Rect::new(2.0, 3.0, 12.0, 8.0))
    );
}

#[test]
fn color_factors() {
    let c = single(color_from_rgba_factors(&[n(1.0), n(0.5), n(0.0), n(0.25)]).unwrap());
    assert_eq!(c, Value::Color(Rgba::rgba(255.0, 128.0, 0.0, 0.25)));

    let factors = color_to_rgba_factors(&[Value::Color(Rgba::rgba(255.0, 0.0, 51.0, 1.0))])
        .unwrap()
        .into_vec();
    assert_eq!(factors, vec![n(1.0), n(0.0), n(0.2), n(1.0)]);

    let red = single(color_from_hsl_factors(&[n(0.0), n(1.0), n(0.5), n(1.0)]).unwrap());
    assert_eq!(red, Value::Color(Rgba::rgba(255.0, 0.0, 0.0, 1.0)));
}

#[test]
fn bad_inputs_are_evaluation_errors() {
    let e = num_cap(&[Value::Text("x".into()), n(0.0), n(1.0)]).unwrap_err();
    assert!(matches!(e, FlowError::Evaluation(_)));
    assert!(e.to_string().contains("expected number, got text"));

    let e = deg_to_rad(&[]).unwrap_err();
    assert!(e.to_string().contains("missing input 0"));

    assert!(rect_translate(&[n(1.0), v2(0.0, 0.0)]).is_err());
}
