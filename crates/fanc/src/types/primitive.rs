//! FanC primitive types and the conversion rules between them

use std::fmt;

/// A FanC primitive type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    /// 32-bit signed integer
    Int,
    /// Unsigned 8-bit integer, stored widened to 32 bits
    Byte,
    /// String literal (only usable as a call argument)
    String,
    Bool,
    Void,
}

impl Type {
    /// Largest value representable by `byte`
    pub const BYTE_MAX: i64 = 255;

    pub fn is_numeric(self) -> bool {
        matches!(self, Type::Int | Type::Byte)
    }

    /// Whether a value of type `source` may be stored into a slot of type `self`
    /// without an explicit cast.
    ///
    /// Identical types always convert, and `byte` widens implicitly to `int`.
    pub fn is_assignable_from(self, source: Type) -> bool {
        self == source || (self == Type::Int && source == Type::Byte)
    }

    /// Whether `(self) source` is a legal explicit cast
    pub fn can_cast_from(self, source: Type) -> bool {
        self.is_assignable_from(source) || (self == Type::Byte && source == Type::Int)
    }

    /// Result type of an arithmetic operator applied to `self` and `other`.
    ///
    /// Returns `None` when either operand is not numeric. Two bytes stay a
    /// byte; anything involving an `int` widens to `int`.
    pub fn arithmetic_result(self, other: Type) -> Option<Type> {
        match (self, other) {
            (Type::Byte, Type::Byte) => Some(Type::Byte),
            (lhs, rhs) if lhs.is_numeric() && rhs.is_numeric() => Some(Type::Int),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Type::Int => "int",
            Type::Byte => "byte",
            Type::String => "string",
            Type::Bool => "bool",
            Type::Void => "void",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
