pub(crate) mod ast;
pub(crate) mod bytecode;
pub(crate) mod classify;
pub(crate) mod compile;
pub(crate) mod error;
pub(crate) mod forms;
pub(crate) mod lower;
pub(crate) mod parser;
pub(crate) mod serialize;
pub(crate) mod vm;
