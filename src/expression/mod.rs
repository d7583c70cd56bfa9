pub(crate) mod ast;
pub(crate) mod bind;
pub(crate) mod error;
pub(crate) mod infer;
pub(crate) mod interp;
pub(crate) mod lexer;
pub(crate) mod parser;
