use crate::expression::ast::{BinaryOp, Expr, Lit, Program, UnaryOp};
use crate::expression::error::ExprError;
use crate::expression::lexer::{Span, Token, TokenKind, lex};

// Bounds the parse recursion and the depth of the resulting tree.
const MAX_NESTING: u32 = 256;

/// Parse the text of an `expr` node into a [`Program`].
///
/// An empty (or whitespace-only) text parses into a program with no statements.
pub fn parse_program(src: &str) -> Result<Program, ExprError> {
    let tokens = lex(src)?;
    let mut p = Parser {
        tokens,
        pos: 0,
        no_range: 0,
        depth: 0,
    };

    let mut statements = Vec::new();
    loop {
        while p.consume(TokenKind::Semicolon) {}
        if p.peek().kind == TokenKind::Eof {
            break;
        }
        statements.push(p.parse_statement()?);
        if p.peek().kind != TokenKind::Eof {
            p.expect(TokenKind::Semicolon)?;
        }
    }
    Ok(Program { statements })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    // >0 while parsing the `then` branch of `c ? a : b`, where `:` closes the branch.
    no_range: u32,
    depth: u32,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_at(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead)
    }

    fn bump(&mut self) -> &Token {
        let t = &self.tokens[self.pos];
        if t.kind != TokenKind::Eof {
            self.pos += 1;
        }
        t
    }

    fn span(&self) -> Span {
        self.peek().span
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), ExprError> {
        if self.peek().kind == kind {
            self.bump();
            Ok(())
        } else {
            Err(ExprError::new(
                self.span().start,
                format!("expected {kind:?}, found {:?}", self.peek().kind),
            ))
        }
    }

    fn consume(&mut self, kind: TokenKind) -> bool {
        if self.peek().kind == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Parse `inner` with range parsing re-enabled (inside brackets, parens, call args).
    fn nested<T>(
        &mut self,
        inner: impl FnOnce(&mut Self) -> Result<T, ExprError>,
    ) -> Result<T, ExprError> {
        let saved = std::mem::replace(&mut self.no_range, 0);
        let out = inner(self);
        self.no_range = saved;
        out
    }

    /// Parse `inner` one level deeper, failing once [`MAX_NESTING`] is reached.
    fn deeper<T>(
        &mut self,
        inner: impl FnOnce(&mut Self) -> Result<T, ExprError>,
    ) -> Result<T, ExprError> {
        self.enter()?;
        let out = inner(self);
        self.depth -= 1;
        out
    }

    fn enter(&mut self) -> Result<(), ExprError> {
        if self.depth >= MAX_NESTING {
            return Err(ExprError::new(
                self.span().start,
                "expression nested too deeply",
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_statement(&mut self) -> Result<Expr, ExprError> {
        let is_assignment = matches!(self.peek().kind, TokenKind::Ident(_))
            && self
                .peek_at(1)
                .is_some_and(|t| t.kind == TokenKind::Assign);
        if is_assignment {
            let name = match self.bump().kind.clone() {
                TokenKind::Ident(s) => s,
                other => {
                    return Err(ExprError::new(
                        self.span().start,
                        format!("expected identifier, found {other:?}"),
                    ));
                }
            };
            self.expect(TokenKind::Assign)?;
            let value = self.parse_expr()?;
            return Ok(Expr::Assign {
                name,
                value: Box::new(value),
            });
        }
        self.parse_expr()
    }

    fn parse_expr(&mut self) -> Result<Expr, ExprError> {
        self.parse_conditional()
    }

    fn parse_conditional(&mut self) -> Result<Expr, ExprError> {
        let cond = self.parse_or()?;
        if !self.consume(TokenKind::Question) {
            return Ok(cond);
        }
        self.no_range += 1;
        let then = self.deeper(|p| p.parse_conditional());
        self.no_range -= 1;
        let then = then?;
        self.expect(TokenKind::Colon)?;
        let otherwise = self.deeper(|p| p.parse_conditional())?;
        Ok(Expr::Conditional {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn parse_or(&mut self) -> Result<Expr, ExprError> {
        let mut e = self.parse_and()?;
        let mut links = 0;
        while self.consume(TokenKind::OrOr) {
            self.enter()?;
            links += 1;
            let r = self.parse_and()?;
            e = binary(BinaryOp::Or, e, r);
        }
        self.depth -= links;
        Ok(e)
    }

    fn parse_and(&mut self) -> Result<Expr, ExprError> {
        let mut e = self.parse_equality()?;
        let mut links = 0;
        while self.consume(TokenKind::AndAnd) {
            self.enter()?;
            links += 1;
            let r = self.parse_equality()?;
            e = binary(BinaryOp::And, e, r);
        }
        self.depth -= links;
        Ok(e)
    }

    fn parse_equality(&mut self) -> Result<Expr, ExprError> {
        let mut e = self.parse_comparison()?;
        let mut links = 0;
        loop {
            let op = if self.consume(TokenKind::EqEq) {
                BinaryOp::Eq
            } else if self.consume(TokenKind::Ne) {
                BinaryOp::Ne
            } else {
                break;
            };
            self.enter()?;
            links += 1;
            let r = self.parse_comparison()?;
            e = binary(op, e, r);
        }
        self.depth -= links;
        Ok(e)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ExprError> {
        let mut e = self.parse_range()?;
        let mut links = 0;
        loop {
            let op = if self.consume(TokenKind::Lt) {
                BinaryOp::Lt
            } else if self.consume(TokenKind::Le) {
                BinaryOp::Le
            } else if self.consume(TokenKind::Gt) {
                BinaryOp::Gt
            } else if self.consume(TokenKind::Ge) {
                BinaryOp::Ge
            } else {
                break;
            };
            self.enter()?;
            links += 1;
            let r = self.parse_range()?;
            e = binary(op, e, r);
        }
        self.depth -= links;
        Ok(e)
    }

    fn parse_range(&mut self) -> Result<Expr, ExprError> {
        let start = self.parse_term()?;
        if self.no_range > 0 || !self.consume(TokenKind::Colon) {
            return Ok(start);
        }
        let second = self.parse_term()?;
        if self.consume(TokenKind::Colon) {
            let end = self.parse_term()?;
            return Ok(Expr::Range {
                start: Box::new(start),
                step: Some(Box::new(second)),
                end: Box::new(end),
            });
        }
        Ok(Expr::Range {
            start: Box::new(start),
            step: None,
            end: Box::new(second),
        })
    }

    fn parse_term(&mut self) -> Result<Expr, ExprError> {
        let mut e = self.parse_factor()?;
        let mut links = 0;
        loop {
            let op = if self.consume(TokenKind::Plus) {
                BinaryOp::Add
            } else if self.consume(TokenKind::Minus) {
                BinaryOp::Sub
            } else {
                break;
            };
            self.enter()?;
            links += 1;
            let r = self.parse_factor()?;
            e = binary(op, e, r);
        }
        self.depth -= links;
        Ok(e)
    }

    fn parse_factor(&mut self) -> Result<Expr, ExprError> {
        let mut e = self.parse_unary()?;
        let mut links = 0;
        loop {
            let op = if self.consume(TokenKind::Star) {
                BinaryOp::Mul
            } else if self.consume(TokenKind::Slash) {
                BinaryOp::Div
            } else if self.consume(TokenKind::Percent) {
                BinaryOp::Mod
            } else {
                break;
            };
            self.enter()?;
            links += 1;
            let r = self.parse_unary()?;
            e = binary(op, e, r);
        }
        self.depth -= links;
        Ok(e)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        let op = if self.consume(TokenKind::Minus) {
            Some(UnaryOp::Neg)
        } else if self.consume(TokenKind::Plus) {
            Some(UnaryOp::Plus)
        } else if self.consume(TokenKind::Bang) {
            Some(UnaryOp::Not)
        } else {
            None
        };
        if let Some(op) = op {
            let e = self.deeper(|p| p.parse_unary())?;
            return Ok(Expr::Unary {
                op,
                expr: Box::new(e),
            });
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<Expr, ExprError> {
        let base = self.parse_postfix()?;
        if self.consume(TokenKind::Caret) {
            // Right associative: `2^3^2 == 2^(3^2)`.
            let exp = self.deeper(|p| p.parse_unary())?;
            return Ok(binary(BinaryOp::Pow, base, exp));
        }
        Ok(base)
    }

    fn parse_postfix(&mut self) -> Result<Expr, ExprError> {
        let mut e = self.parse_primary()?;
        let mut links = 0;

        loop {
            if !matches!(
                self.peek().kind,
                TokenKind::Dot | TokenKind::LParen | TokenKind::LBracket
            ) {
                break;
            }
            self.enter()?;
            links += 1;

            if self.consume(TokenKind::Dot) {
                let t = self.bump().clone();
                let name = match t.kind {
                    TokenKind::Ident(s) => s,
                    other => {
                        return Err(ExprError::new(
                            t.span.start,
                            format!("expected ident after '.', found {other:?}"),
                        ));
                    }
                };
                e = Expr::Member {
                    target: Box::new(e),
                    name,
                };
                continue;
            }

            if self.peek().kind == TokenKind::LParen {
                let at = self.span().start;
                self.bump();
                let func = match e {
                    Expr::Symbol(name) => name,
                    _ => {
                        return Err(ExprError::new(at, "call target must be an identifier"));
                    }
                };
                let args = self.deeper(|p| p.nested(|p| p.parse_list(TokenKind::RParen)))?;
                e = Expr::Call { func, args };
                continue;
            }

            if self.consume(TokenKind::LBracket) {
                let index = self.deeper(|p| p.nested(|p| p.parse_expr()))?;
                self.expect(TokenKind::RBracket)?;
                e = Expr::Index {
                    target: Box::new(e),
                    index: Box::new(index),
                };
                continue;
            }

            break;
        }

        self.depth -= links;
        Ok(e)
    }

    /// Comma separated expressions up to and including `close`.
    fn parse_list(&mut self, close: TokenKind) -> Result<Vec<Expr>, ExprError> {
        let mut items = Vec::new();
        if self.consume(close.clone()) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_expr()?);
            if self.consume(TokenKind::Comma) {
                continue;
            }
            self.expect(close)?;
            return Ok(items);
        }
    }

    fn parse_object(&mut self) -> Result<Vec<(String, Expr)>, ExprError> {
        let mut fields = Vec::new();
        if self.consume(TokenKind::RBrace) {
            return Ok(fields);
        }
        loop {
            let t = self.bump().clone();
            let key = match t.kind {
                TokenKind::Ident(s) | TokenKind::Str(s) => s,
                other => {
                    return Err(ExprError::new(
                        t.span.start,
                        format!("expected object key, found {other:?}"),
                    ));
                }
            };
            self.expect(TokenKind::Colon)?;
            let value = self.parse_expr()?;
            fields.push((key, value));
            if self.consume(TokenKind::Comma) {
                continue;
            }
            self.expect(TokenKind::RBrace)?;
            return Ok(fields);
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        let t = self.bump().clone();
        match t.kind {
            TokenKind::Number(v) => Ok(Expr::Lit(Lit::Number(v))),
            TokenKind::Str(s) => Ok(Expr::Lit(Lit::Str(s))),
            TokenKind::True => Ok(Expr::Lit(Lit::Bool(true))),
            TokenKind::False => Ok(Expr::Lit(Lit::Bool(false))),
            TokenKind::Ident(s) => Ok(Expr::Symbol(s)),
            TokenKind::LParen => {
                let e = self.deeper(|p| p.nested(|p| p.parse_expr()))?;
                self.expect(TokenKind::RParen)?;
                Ok(e)
            }
            TokenKind::LBracket => {
                let items = self.deeper(|p| p.nested(|p| p.parse_list(TokenKind::RBracket)))?;
                Ok(Expr::Array(items))
            }
            TokenKind::LBrace => {
                let fields = self.deeper(|p| p.nested(|p| p.parse_object()))?;
                Ok(Expr::Object(fields))
            }
            other => Err(ExprError::new(
                t.span.start,
                format!("unexpected token {other:?}"),
            )),
        }
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/parser.rs"]
mod tests;
