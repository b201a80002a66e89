//! Intermediate Representation module
//!
//! LLVM IR instructions, the buffer they are emitted into, and the
//! generator that lowers analyzed FanC programs.

mod codegen;
mod emitter;
mod inst;

pub use codegen::CodeGenerator;
pub use emitter::{CodeBuffer, StringConstant};
pub use inst::*;
