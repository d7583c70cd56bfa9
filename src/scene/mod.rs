pub(crate) mod dsl;
pub(crate) mod model;
pub(crate) mod order;
pub(crate) mod project;
pub(crate) mod timeline;
