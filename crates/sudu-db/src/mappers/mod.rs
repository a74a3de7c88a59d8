//! Entity <-> model mappers

mod code;
mod pending;
mod user;

pub use code::code_table;
