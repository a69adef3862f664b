use std::path::PathBuf;

use thiserror::Error;

/// Error type for SDK generation.
///
/// Every fatal condition halts generation before any output is written;
/// a half-generated client package would run incorrectly against the real
/// API, so there is no partial-success path.
#[derive(Debug, Error)]
pub enum GenError {
    /// The interface document passed with `--file` does not exist.
    #[error("interface document not found: {0}")]
    DocumentNotFound(PathBuf),

    /// The destination folder exists and contains files.
    #[error("destination {0} already exists and is not an empty folder")]
    DestinationNotEmpty(PathBuf),

    /// The YAML configuration file passed with `--config` does not exist.
    #[error("configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    /// The YAML configuration file could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_yaml::Error),

    /// The interface document could not be parsed.
    #[error("failed to parse interface document: {0}")]
    Document(#[from] serde_json::Error),

    /// A property, parameter or response used a type tag outside the
    /// supported set {string, integer, number, array}.
    #[error("{tag:?} is not a supported type (in {context})")]
    UnsupportedType { tag: String, context: String },

    /// A schema fragment carried neither a `$ref` nor a recognized type tag.
    #[error("schema fragment in {0} has neither a $ref nor a recognized type")]
    MalformedFragment(String),

    /// A `$ref` pointed at a schema name absent from `components.schemas`.
    #[error("unresolved schema reference {name:?} (from {context})")]
    UnknownSchemaRef { name: String, context: String },

    /// An operation had no 200-status `application/json` response schema.
    #[error("no 200 application/json response schema for {0}")]
    MissingResponseSchema(String),

    /// I/O error while reading inputs or writing generated files.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GenError {
    /// Stable process exit code for this error kind.
    ///
    /// Input-validation failures each get their own code so callers can
    /// script against them; everything discovered during generation
    /// (schema-shape errors, I/O) exits 1.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::DocumentNotFound(_) => 2,
            Self::DestinationNotEmpty(_) => 3,
            Self::ConfigNotFound(_) | Self::Config(_) => 4,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct_per_precondition_kind() {
        let document = GenError::DocumentNotFound(PathBuf::from("missing.json"));
        let dest = GenError::DestinationNotEmpty(PathBuf::from("dest"));
        let config = GenError::ConfigNotFound(PathBuf::from("config.yml"));

        assert_eq!(2, document.exit_code());
        assert_eq!(3, dest.exit_code());
        assert_eq!(4, config.exit_code());
    }

    #[test]
    fn schema_shape_errors_exit_one() {
        let unsupported = GenError::UnsupportedType {
            tag: "boolean".to_string(),
            context: "Exchange.active".to_string(),
        };
        let missing = GenError::MissingResponseSchema("/v0/exchanges/".to_string());

        assert_eq!(1, unsupported.exit_code());
        assert_eq!(1, missing.exit_code());
    }

    #[test]
    fn unsupported_type_names_tag_and_context() {
        let error = GenError::UnsupportedType {
            tag: "boolean".to_string(),
            context: "Exchange.active".to_string(),
        };
        let rendered = error.to_string();

        assert!(rendered.contains("boolean"));
        assert!(rendered.contains("Exchange.active"));
    }
}
