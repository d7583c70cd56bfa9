use super::*;
use crate::expression::parser::parse_program;
use crate::foundation::core::{Rect, Rgba, Vec2};
use crate::value::runtime::LineCap;

fn program(src: &str) -> Program {
    parse_program(src).unwrap()
}

#[test]
fn doubles_a_number() {
    let out = run_bound(&program("b = a * 2"), &[("a", &Value::Number(3.0))], &["b"]).unwrap();
    assert_eq!(out, vec![Value::Number(6.0)]);
}

#[test]
fn vectors_bind_as_objects() {
    let p = Value::Vec2(Vec2::new(10.0, 20.0));
    let out = run_bound(&program("s = p.x + p.y"), &[("p", &p)], &["s"]).unwrap();
    assert_eq!(out, vec![Value::Number(30.0)]);
}

#[test]
fn rects_bind_with_size() {
    let r = Value::Rect(Rect::new(1.0, 2.0, 11.0, 32.0));
    let out = run_bound(&program("a = r.width * r.height"), &[("r", &r)], &["a"]).unwrap();
    assert_eq!(out, vec![Value::Number(300.0)]);
}

#[test]
fn colors_bind_as_arrays() {
    let c = Value::Color(Rgba::rgba(10.0, 20.0, 30.0, 0.5));
    let out = run_bound(&program("g = c[2]; a = c[4]"), &[("c", &c)], &["g", "a"]).unwrap();
    assert_eq!(out, vec![Value::Number(20.0), Value::Number(0.5)]);
}

#[test]
fn enums_bind_as_names() {
    let cap = Value::LineCap(LineCap::Round);
    let out = run_bound(
        &program("r = cap == 'round' ? 1 : 0"),
        &[("cap", &cap)],
        &["r"],
    )
    .unwrap();
    assert_eq!(out, vec![Value::Number(1.0)]);
}

#[test]
fn arrays_come_back_as_matrices() {
    let out = run_bound(&program("m = [[1, 2], [3, 4]]"), &[], &["m"]).unwrap();
    assert_eq!(
        out,
        vec![Value::Matrix(vec![
            Value::Matrix(vec![Value::Number(1.0), Value::Number(2.0)]),
            Value::Matrix(vec![Value::Number(3.0), Value::Number(4.0)]),
        ])]
    );
}

#[test]
fn non_numeric_matrix_elements_are_rejected() {
    let e = run_bound(&program("m = [1, 'x']"), &[], &["m"]).unwrap_err();
    assert!(e.message.contains("matrix element 2"), "{}", e.message);
}

#[test]
fn missing_outputs_are_errors() {
    let e = run_bound(&program("a = 1"), &[], &["b"]).unwrap_err();
    assert!(e.message.contains("never assigned"));
}

#[test]
fn paths_cannot_be_bound() {
    let p = Value::Path(crate::foundation::core::BezPath::new());
    assert!(to_expr_value(&p).is_err());
}

#[test]
fn objects_round_trip() {
    let v = from_expr_value("o", &to_expr_value(&Value::Vec2(Vec2::new(1.0, 2.0))).unwrap()).unwrap();
    assert_eq!(v.as_vec2(), Some(Vec2::new(1.0, 2.0)));
}
