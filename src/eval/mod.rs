pub(crate) mod context;
pub(crate) mod evaluator;
pub(crate) mod ops;
pub(crate) mod recompute;
pub(crate) mod session;
pub(crate) mod sink;
pub(crate) mod store;
