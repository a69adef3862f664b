//! Serde view of the interface document.
//!
//! Only the fields used by the generator are modeled; extra keys in the
//! JSON are ignored via serde's default behavior. All maps are `IndexMap`
//! because declaration order in the document is semantic: it determines
//! emitted field order, constructor parameter order and positional
//! reconstruction order.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

/// Top-level interface document: `info`, `paths` and `components.schemas`.
#[derive(Debug, Deserialize)]
pub struct ApiDocument {
    pub info: Info,
    pub paths: IndexMap<String, PathItem>,
    pub components: Components,
}

/// API title and long description, rendered into the generated client
/// class docstring.
#[derive(Debug, Deserialize)]
pub struct Info {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// One URL path. Only a single read-style operation per path is
/// supported; other HTTP methods are out of scope.
#[derive(Debug, Deserialize)]
pub struct PathItem {
    pub get: RawOperation,
}

#[derive(Debug, Deserialize)]
pub struct RawOperation {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub parameters: Vec<RawParameter>,
    pub responses: IndexMap<String, RawResponse>,
}

#[derive(Debug, Deserialize)]
pub struct RawParameter {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
    pub schema: ParamSchema,
}

/// The inline schema of a query parameter.
#[derive(Debug, Deserialize)]
pub struct ParamSchema {
    #[serde(default)]
    pub r#type: Option<String>,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub example: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct RawResponse {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseContent {
    #[serde(rename = "application/json")]
    pub application_json: MediaType,
}

#[derive(Debug, Deserialize)]
pub struct MediaType {
    pub schema: SchemaFragment,
}

/// A response or array-item schema fragment: either a `$ref` to a named
/// schema, a primitive type tag, or `array` with `$ref` items.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaFragment {
    #[serde(default, rename = "$ref")]
    pub reference: Option<String>,
    #[serde(default)]
    pub r#type: Option<String>,
    #[serde(default)]
    pub items: Option<Box<SchemaFragment>>,
}

#[derive(Debug, Deserialize)]
pub struct Components {
    pub schemas: IndexMap<String, RawSchema>,
}

/// A named schema definition under `components.schemas`.
#[derive(Debug, Deserialize)]
pub struct RawSchema {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub properties: IndexMap<String, RawProperty>,
    /// Literal example payload, keyed by property name. Rendered into
    /// field docstrings and method example responses.
    #[serde(default)]
    pub example: IndexMap<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct RawProperty {
    #[serde(default)]
    pub r#type: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub items: Option<SchemaFragment>,
}

impl ApiDocument {
    /// Parse an interface document from its JSON text.
    pub fn from_json(json: &str) -> Result<Self, crate::error::GenError> {
        Ok(serde_json::from_str(json)?)
    }
}
