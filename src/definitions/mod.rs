pub(crate) mod builtin;
pub(crate) mod registry;
