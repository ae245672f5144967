//! Type definitions
use serde::Serialize;
use std::fmt;

/// Primitive kinds known to the translator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    Int,    // long long
    Float,  // double
    String, // string
    Bool,   // bool
    Void,   // function returns only
}

impl Type {
    /// Convert a source type hint (`int`, `float`, `str`, `bool`, `None`) to a type
    pub fn from_hint(name: &str) -> Option<Self> {
        match name {
            "int" => Some(Type::Int),
            "float" => Some(Type::Float),
            "str" => Some(Type::String),
            "bool" => Some(Type::Bool),
            "None" => Some(Type::Void),
            _ => None,
        }
    }

    /// Source spelling, used by unparse
    pub fn hint_name(&self) -> &'static str {
        match self {
            Type::Int => "int",
            Type::Float => "float",
            Type::String => "str",
            Type::Bool => "bool",
            Type::Void => "None",
        }
    }

    /// Convert to C++ type string
    pub fn to_cpp_string(&self) -> &'static str {
        match self {
            Type::Int => "long long",
            Type::Float => "double",
            Type::String => "string",
            Type::Bool => "bool",
            Type::Void => "void",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    /// Kinds accepted where a condition is expected
    pub fn is_truthy(&self) -> bool {
        matches!(self, Type::Bool | Type::Int | Type::Float)
    }

    /// Whether a value of type `value` may be stored in a slot of this type.
    /// The only implicit conversion is int widening to float.
    pub fn accepts(&self, value: Type) -> bool {
        *self == value || (*self == Type::Float && value == Type::Int)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Type::Int => "int",
            Type::Float => "float",
            Type::String => "string",
            Type::Bool => "bool",
            Type::Void => "void",
        };
        f.write_str(name)
    }
}
