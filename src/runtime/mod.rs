pub(crate) mod builtins;
pub(crate) mod context;
pub(crate) mod interpolate;
