pub(crate) mod patch;
pub(crate) mod store;
