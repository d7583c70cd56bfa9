use super::*;
use crate::expression::parser::parse_program;

fn io(src: &str) -> ExprIo {
    infer_io(&parse_program(src).unwrap())
}

fn names(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| (*s).to_owned()).collect()
}

#[test]
fn reads_before_writes_are_inputs() {
    let io = io("b = a * 2");
    assert_eq!(io.inputs, names(&["a"]));
    assert_eq!(io.outputs, names(&["b"]));
}

#[test]
fn assigned_symbols_are_not_inputs_afterwards() {
    let io = io("t = x + 1; y = t * t; x2 = x");
    assert_eq!(io.inputs, names(&["x"]));
    assert_eq!(io.outputs, names(&["t", "y", "x2"]));
}

#[test]
fn self_update_reads_then_writes() {
    let io = io("v = v + 1");
    assert_eq!(io.inputs, names(&["v"]));
    assert_eq!(io.outputs, names(&["v"]));
}

#[test]
fn constants_and_function_names_are_not_inputs() {
    let io = io("y = sin(pi * t) + e");
    assert_eq!(io.inputs, names(&["t"]));
    assert_eq!(io.outputs, names(&["y"]));
}

#[test]
fn order_is_first_occurrence_and_deduplicated() {
    let io = io("out = b + a + b; out2 = a");
    assert_eq!(io.inputs, names(&["b", "a"]));
    assert_eq!(io.outputs, names(&["out", "out2"]));
}

#[test]
fn member_targets_are_read_but_keys_are_not() {
    let io = io("x = p.x + {k: q}.k");
    assert_eq!(io.inputs, names(&["p", "q"]));
}

#[test]
fn inference_is_idempotent() {
    let src = "a2 = a * 2\nb = a2 > 1 ? c : d[1]";
    let program = parse_program(src).unwrap();
    assert_eq!(infer_io(&program), infer_io(&program));
    assert_eq!(infer_io(&program), io(src));
}
