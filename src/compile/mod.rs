pub(crate) mod composition;
pub(crate) mod deps;
pub(crate) mod fingerprint;
pub(crate) mod graph;
pub(crate) mod program;
