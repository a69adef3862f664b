//! Schema fragment classification.
//!
//! Every response and array-item schema in the document is one of three
//! shapes: a primitive scalar, a reference to a named schema, or an array
//! of references. The closed [`ValueShape`] variant is what the rest of
//! the generator dispatches on; nothing downstream ever re-inspects raw
//! fragments.

use crate::document::SchemaFragment;
use crate::error::GenError;
use crate::pytype::{self, PyPrimitive};

/// What kind of value a schema fragment describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueShape {
    /// A primitive scalar (`string`, `integer`, `number`).
    Primitive(PyPrimitive),
    /// A single named schema, e.g. `#/components/schemas/Exchange`.
    Object(String),
    /// An array whose items reference a named schema.
    ListOf(String),
}

impl ValueShape {
    /// The Python annotation for this shape (`str`, `Exchange`,
    /// `List[Exchange]`).
    #[must_use]
    pub fn py_type(&self) -> String {
        match self {
            Self::Primitive(primitive) => primitive.py_name().to_string(),
            Self::Object(name) => name.clone(),
            Self::ListOf(name) => format!("List[{name}]"),
        }
    }
}

/// Extract the schema name from a `$ref` string: the substring after the
/// final `/`. `"#/components/schemas/Exchange"` yields `"Exchange"`.
#[must_use]
pub fn ref_name(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

/// Classify a schema fragment into exactly one [`ValueShape`].
///
/// `context` identifies the fragment's location in the document for error
/// messages. A fragment with neither a `$ref` nor a recognized type tag
/// means the document is malformed, which is fatal.
pub fn classify(fragment: &SchemaFragment, context: &str) -> Result<ValueShape, GenError> {
    if let Some(reference) = &fragment.reference {
        return Ok(ValueShape::Object(ref_name(reference).to_string()));
    }
    match fragment.r#type.as_deref() {
        Some("array") => {
            let items = fragment
                .items
                .as_ref()
                .ok_or_else(|| GenError::MalformedFragment(context.to_string()))?;
            let reference = items
                .reference
                .as_deref()
                .ok_or_else(|| GenError::MalformedFragment(context.to_string()))?;
            Ok(ValueShape::ListOf(ref_name(reference).to_string()))
        }
        Some(tag) => Ok(ValueShape::Primitive(pytype::primitive_for_tag(
            tag, context,
        )?)),
        None => Err(GenError::MalformedFragment(context.to_string())),
    }
}
