pub(crate) mod error;
pub(crate) mod location;
