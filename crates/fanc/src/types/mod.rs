//! FanC type system
//!
//! The language only has primitive types, so a type is a plain `Copy` value
//! that carries its own assignability and cast rules.

mod primitive;

pub use primitive::Type;
