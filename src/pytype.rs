//! Mapping from interface-document type tags to Python types.
//!
//! This is the single classifier shared by every synthesizer; no component
//! re-implements tag matching, so the supported-type set cannot drift
//! between models, clients and tests.

use crate::error::GenError;

/// Python scalar type corresponding to a primitive type tag.
///
/// `number` maps to `Decimal`, never a binary float: generated clients
/// carry financial-style amounts and must not lose precision on the way
/// through deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PyPrimitive {
    /// `string` -> `str`
    Str,
    /// `integer` -> `int`
    Int,
    /// `number` -> `Decimal`
    Decimal,
}

impl PyPrimitive {
    /// The Python type name as written in annotations.
    #[must_use]
    pub fn py_name(self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Int => "int",
            Self::Decimal => "Decimal",
        }
    }

    /// True when using this type in generated Python requires
    /// `from decimal import Decimal`.
    #[must_use]
    pub fn needs_decimal_import(self) -> bool {
        matches!(self, Self::Decimal)
    }
}

/// Classify a scalar type tag, failing on anything outside the supported
/// set. Guessing a type here would generate client code that silently
/// diverges from the real API contract, so unknown tags abort generation.
///
/// `context` identifies the enclosing schema/operation for the error
/// message (e.g. `"Exchange.fee"`).
pub fn primitive_for_tag(tag: &str, context: &str) -> Result<PyPrimitive, GenError> {
    match tag {
        "string" => Ok(PyPrimitive::Str),
        "integer" => Ok(PyPrimitive::Int),
        "number" => Ok(PyPrimitive::Decimal),
        other => Err(GenError::UnsupportedType {
            tag: other.to_string(),
            context: context.to_string(),
        }),
    }
}
