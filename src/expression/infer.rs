use std::collections::HashSet;

use crate::expression::ast::{Expr, Program, RESERVED_CONSTANTS};

/// Inputs and outputs of an expression, in order of first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExprIo {
    /// Symbols read before any assignment to them.
    pub inputs: Vec<String>,
    /// Symbols that are the target of an assignment.
    pub outputs: Vec<String>,
}

/// Single pass def/use analysis over `program`.
pub fn infer_io(program: &Program) -> ExprIo {
    let mut walker = IoWalker::default();
    for stmt in &program.statements {
        walker.visit(stmt);
    }
    walker.io
}

#[derive(Default)]
struct IoWalker {
    io: ExprIo,
    assigned: HashSet<String>,
}

impl IoWalker {
    fn read(&mut self, name: &str) {
        if self.assigned.contains(name) || RESERVED_CONSTANTS.contains(&name) {
            return;
        }
        if !self.io.inputs.iter().any(|n| n == name) {
            self.io.inputs.push(name.to_owned());
        }
    }

    fn write(&mut self, name: &str) {
        if !self.io.outputs.iter().any(|n| n == name) {
            self.io.outputs.push(name.to_owned());
        }
        self.assigned.insert(name.to_owned());
    }

    fn visit(&mut self, e: &Expr) {
        match e {
            Expr::Lit(_) => {}
            Expr::Symbol(name) => self.read(name),
            Expr::Unary { expr, .. } => self.visit(expr),
            Expr::Binary { left, right, .. } => {
                self.visit(left);
                self.visit(right);
            }
            Expr::Conditional {
                cond,
                then,
                otherwise,
            } => {
                self.visit(cond);
                self.visit(then);
                self.visit(otherwise);
            }
            Expr::Range { start, step, end } => {
                self.visit(start);
                if let Some(step) = step {
                    self.visit(step);
                }
                self.visit(end);
            }
            Expr::Array(items) => items.iter().for_each(|i| self.visit(i)),
            Expr::Object(fields) => fields.iter().for_each(|(_, v)| self.visit(v)),
            // Function names are not symbols; only the arguments are read.
            Expr::Call { args, .. } => args.iter().for_each(|a| self.visit(a)),
            Expr::Index { target, index } => {
                self.visit(target);
                self.visit(index);
            }
            Expr::Member { target, .. } => self.visit(target),
            Expr::Assign { name, value } => {
                self.visit(value);
                self.write(name);
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/infer.rs"]
mod tests;
