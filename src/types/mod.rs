pub(crate) mod color;
pub(crate) mod ty;
pub(crate) mod value;
