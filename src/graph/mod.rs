pub(crate) mod dsl;
pub(crate) mod edit;
pub(crate) mod guard;
pub(crate) mod kind;
pub(crate) mod model;
