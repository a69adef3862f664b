//! Intermediate representation of the document.
//!
//! The raw serde view (`document`) is lowered once into these types at the
//! start of a run; every synthesizer then receives the read-only
//! [`SchemaTable`] and [`OperationDef`] list by reference. Nothing here is
//! mutated after construction.

use heck::ToSnakeCase;
use indexmap::IndexMap;
use serde_json::Value;

use crate::document::{ApiDocument, RawOperation, RawSchema};
use crate::error::GenError;
use crate::pytype::{self, PyPrimitive};
use crate::resolve::{self, ValueShape};

/// Schemas whose name contains this token are emitted as exception
/// classes instead of models.
pub const ERROR_MARKER: &str = "Error";

/// One property of a named schema, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDef {
    pub name: String,
    pub kind: PropertyKind,
    pub description: String,
}

/// A property is either a scalar or a list of a named schema. Free-form
/// JSON-Schema constructs (oneOf, additionalProperties, ...) are out of
/// scope and rejected at lowering time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKind {
    Scalar(PyPrimitive),
    ListOf(String),
}

impl PropertyDef {
    /// The Python annotation for this property.
    #[must_use]
    pub fn py_type(&self) -> String {
        match &self.kind {
            PropertyKind::Scalar(primitive) => primitive.py_name().to_string(),
            PropertyKind::ListOf(item) => format!("List[{item}]"),
        }
    }
}

/// A named schema lowered from `components.schemas`.
#[derive(Debug, Clone)]
pub struct SchemaDef {
    pub name: String,
    pub description: String,
    /// Declaration order preserved; determines constructor parameter
    /// order and positional reconstruction order.
    pub properties: Vec<PropertyDef>,
    /// Example payload keyed by property name.
    pub example: IndexMap<String, Value>,
}

impl SchemaDef {
    /// True when this schema represents an error and becomes an
    /// exception class.
    #[must_use]
    pub fn is_exception(&self) -> bool {
        self.name.contains(ERROR_MARKER)
    }
}

/// Read-only mapping from schema name to definition, built once per run.
#[derive(Debug)]
pub struct SchemaTable {
    schemas: IndexMap<String, SchemaDef>,
}

impl SchemaTable {
    /// Lower every schema in the document, preserving declaration order.
    /// Every array property's item reference must resolve within the
    /// table, or generation fails before anything is written.
    pub fn from_document(document: &ApiDocument) -> Result<Self, GenError> {
        let mut schemas = IndexMap::new();
        for (name, raw) in &document.components.schemas {
            schemas.insert(name.clone(), lower_schema(name, raw)?);
        }
        let table = Self { schemas };
        for schema in table.schemas.values() {
            for property in &schema.properties {
                if let PropertyKind::ListOf(item) = &property.kind {
                    table.get(item, &format!("{}.{}", schema.name, property.name))?;
                }
            }
        }
        Ok(table)
    }

    /// Look up a schema, failing with the referencing context on a
    /// dangling reference.
    pub fn get(&self, name: &str, context: &str) -> Result<&SchemaDef, GenError> {
        self.schemas.get(name).ok_or_else(|| GenError::UnknownSchemaRef {
            name: name.to_string(),
            context: context.to_string(),
        })
    }

    /// Schemas emitted as models, in declaration order.
    pub fn models(&self) -> impl Iterator<Item = &SchemaDef> {
        self.schemas.values().filter(|schema| !schema.is_exception())
    }

    /// Schemas emitted as exception classes, in declaration order.
    pub fn exceptions(&self) -> impl Iterator<Item = &SchemaDef> {
        self.schemas.values().filter(|schema| schema.is_exception())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

fn lower_schema(name: &str, raw: &RawSchema) -> Result<SchemaDef, GenError> {
    let mut properties = Vec::with_capacity(raw.properties.len());
    for (property_name, property) in &raw.properties {
        let context = format!("{name}.{property_name}");
        let kind = match property.r#type.as_deref() {
            Some("array") => {
                let items = property
                    .items
                    .as_ref()
                    .ok_or_else(|| GenError::MalformedFragment(context.clone()))?;
                let reference = items
                    .reference
                    .as_deref()
                    .ok_or_else(|| GenError::MalformedFragment(context.clone()))?;
                PropertyKind::ListOf(resolve::ref_name(reference).to_string())
            }
            Some(tag) => PropertyKind::Scalar(pytype::primitive_for_tag(tag, &context)?),
            None => return Err(GenError::MalformedFragment(context)),
        };
        properties.push(PropertyDef {
            name: property_name.clone(),
            kind,
            description: property.description.clone(),
        });
    }
    Ok(SchemaDef {
        name: name.to_string(),
        description: raw.description.clone(),
        properties,
        example: raw.example.clone(),
    })
}

/// One query parameter of an operation.
#[derive(Debug, Clone)]
pub struct ParamDef {
    pub name: String,
    pub py: PyPrimitive,
    pub required: bool,
    /// Declared default literal. An optional parameter with a default is
    /// always sent to the API (the default is meaningful server-side);
    /// one without a default is sent only when the caller supplied it.
    pub default: Option<Value>,
    pub example: Option<Value>,
    pub description: String,
}

/// A non-200 response that maps to a generated exception.
#[derive(Debug, Clone)]
pub struct ErrorCase {
    pub status: String,
    pub exception: String,
    pub description: String,
}

/// One callable API operation, lowered from a path+get pair.
#[derive(Debug)]
pub struct OperationDef {
    /// Path sent on the wire: the document path with a trailing `/`
    /// stripped (the original tool requests `/v0/exchanges` for the
    /// documented `/v0/exchanges/`).
    pub wire_path: String,
    /// Python method name: the last non-empty path segment, snake_cased.
    pub method_name: String,
    pub summary: String,
    /// Description of the 200 response, rendered into `:return:`.
    pub response_description: String,
    /// Required parameters first, then optional, each group in
    /// declaration order.
    pub params: Vec<ParamDef>,
    pub response: ValueShape,
    pub errors: Vec<ErrorCase>,
}

impl OperationDef {
    pub fn required_params(&self) -> impl Iterator<Item = &ParamDef> {
        self.params.iter().filter(|param| param.required)
    }

    pub fn optional_params(&self) -> impl Iterator<Item = &ParamDef> {
        self.params.iter().filter(|param| !param.required)
    }
}

/// Lower every path+get pair, in document order.
pub fn build_operations(
    document: &ApiDocument,
    table: &SchemaTable,
) -> Result<Vec<OperationDef>, GenError> {
    let mut operations = Vec::with_capacity(document.paths.len());
    for (path, item) in &document.paths {
        operations.push(lower_operation(path, &item.get, table)?);
    }
    Ok(operations)
}

fn lower_operation(
    path: &str,
    raw: &RawOperation,
    table: &SchemaTable,
) -> Result<OperationDef, GenError> {
    let wire_path = path.strip_suffix('/').unwrap_or(path).to_string();
    let method_name = method_name_for_path(path);

    // Required parameters must come first in the emitted signature
    // regardless of their order in the document; each group keeps its
    // declaration order.
    let mut params = Vec::with_capacity(raw.parameters.len());
    for parameter in raw.parameters.iter().filter(|p| p.required) {
        params.push(lower_parameter(path, parameter)?);
    }
    for parameter in raw.parameters.iter().filter(|p| !p.required) {
        params.push(lower_parameter(path, parameter)?);
    }

    let ok_response = raw
        .responses
        .get("200")
        .ok_or_else(|| GenError::MissingResponseSchema(path.to_string()))?;
    let content = ok_response
        .content
        .as_ref()
        .ok_or_else(|| GenError::MissingResponseSchema(path.to_string()))?;
    let response = resolve::classify(&content.application_json.schema, path)?;

    // Every reference in the response must resolve now; failing during
    // rendering would leave partial output.
    match &response {
        ValueShape::Object(name) | ValueShape::ListOf(name) => {
            table.get(name, path)?;
        }
        ValueShape::Primitive(_) => {}
    }

    let mut errors = Vec::new();
    for (status, error_response) in &raw.responses {
        if status == "200" {
            continue;
        }
        let Some(content) = &error_response.content else {
            continue;
        };
        let Some(reference) = &content.application_json.schema.reference else {
            continue;
        };
        let exception = resolve::ref_name(reference).to_string();
        table.get(&exception, path)?;
        errors.push(ErrorCase {
            status: status.clone(),
            exception,
            description: error_response.description.clone(),
        });
    }

    Ok(OperationDef {
        wire_path,
        method_name,
        summary: raw.summary.clone(),
        response_description: ok_response.description.clone(),
        params,
        response,
        errors,
    })
}

fn lower_parameter(
    path: &str,
    raw: &crate::document::RawParameter,
) -> Result<ParamDef, GenError> {
    let context = format!("{path} parameter {}", raw.name);
    let tag = raw
        .schema
        .r#type
        .as_deref()
        .ok_or_else(|| GenError::MalformedFragment(context.clone()))?;
    let py = pytype::primitive_for_tag(tag, &context)?;
    Ok(ParamDef {
        name: raw.name.clone(),
        py,
        required: raw.required,
        default: raw.schema.default.clone(),
        example: raw.schema.example.clone(),
        description: raw.description.clone(),
    })
}

fn method_name_for_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .next_back()
        .unwrap_or("root")
        .to_snake_case()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ApiDocument;

    fn document(json: &str) -> ApiDocument {
        ApiDocument::from_json(json).expect("valid document")
    }

    fn exchange_document() -> ApiDocument {
        document(
            r##"{
            "info": {"title": "T", "description": ""},
            "paths": {
                "/v0/exchanges/": {
                    "get": {
                        "summary": "Get the list of supported exchanges by the API",
                        "parameters": [
                            {
                                "description": "Ignore for now",
                                "required": false,
                                "schema": {"type": "integer", "default": 1},
                                "name": "page",
                                "in": "query"
                            },
                            {
                                "description": "The blockchain to filter on",
                                "required": false,
                                "schema": {"type": "string"},
                                "name": "blockchain",
                                "in": "query"
                            }
                        ],
                        "responses": {
                            "200": {
                                "description": "The list of exchanges",
                                "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Exchanges"}}}
                            },
                            "422": {
                                "description": "Validation Error",
                                "content": {"application/json": {"schema": {"$ref": "#/components/schemas/HTTPValidationError"}}}
                            }
                        }
                    }
                }
            },
            "components": {"schemas": {
                "Exchange": {
                    "type": "object",
                    "properties": {
                        "exchange": {"type": "string", "description": "The exchange id"},
                        "fee": {"type": "integer", "description": "The exchange fee"}
                    },
                    "example": {"exchange": "lydia_finance_avalanche", "fee": 200}
                },
                "Exchanges": {
                    "type": "object",
                    "properties": {
                        "page": {"type": "integer", "description": "The page"},
                        "data": {"type": "array", "description": "The exchanges", "items": {"$ref": "#/components/schemas/Exchange"}}
                    },
                    "example": {"page": 1, "data": [{"exchange": "lydia_finance_avalanche", "fee": 200}]}
                },
                "HTTPValidationError": {
                    "type": "object",
                    "description": "Validation error returned by the API",
                    "properties": {}
                }
            }}
        }"##,
        )
    }

    #[test]
    fn schema_table_preserves_declaration_order() {
        let document = exchange_document();
        let table = SchemaTable::from_document(&document).expect("valid table");
        let exchanges = table.get("Exchanges", "test").expect("present");

        let names: Vec<&str> = exchanges
            .properties
            .iter()
            .map(|property| property.name.as_str())
            .collect();
        assert_eq!(vec!["page", "data"], names);
    }

    #[test]
    fn error_marker_partitions_models_and_exceptions() {
        let document = exchange_document();
        let table = SchemaTable::from_document(&document).expect("valid table");

        let models: Vec<&str> = table.models().map(|schema| schema.name.as_str()).collect();
        let exceptions: Vec<&str> = table
            .exceptions()
            .map(|schema| schema.name.as_str())
            .collect();

        assert_eq!(vec!["Exchange", "Exchanges"], models);
        assert_eq!(vec!["HTTPValidationError"], exceptions);
    }

    #[test]
    fn dangling_reference_is_fatal() {
        let document = exchange_document();
        let table = SchemaTable::from_document(&document).expect("valid table");

        let error = table.get("Missing", "/v0/whatever/").expect_err("must fail");
        match error {
            GenError::UnknownSchemaRef { name, context } => {
                assert_eq!("Missing", name);
                assert_eq!("/v0/whatever/", context);
            }
            other => panic!("expected UnknownSchemaRef, got {other:?}"),
        }
    }

    #[test]
    fn operation_lowering_extracts_wire_path_and_method_name() {
        let document = exchange_document();
        let table = SchemaTable::from_document(&document).expect("valid table");
        let operations = build_operations(&document, &table).expect("valid operations");

        assert_eq!(1, operations.len());
        assert_eq!("/v0/exchanges", operations[0].wire_path);
        assert_eq!("exchanges", operations[0].method_name);
    }

    #[test]
    fn camel_case_path_segment_becomes_snake_case_method() {
        assert_eq!("amount_out", method_name_for_path("/v0/exchanges/pairs/amountOut"));
        assert_eq!("decimals", method_name_for_path("/v0/tokens/decimals/"));
        assert_eq!("exchanges", method_name_for_path("/v0/exchanges/"));
    }

    #[test]
    fn required_parameters_precede_optional_regardless_of_document_order() {
        let document = document(
            r##"{
            "info": {"title": "T"},
            "paths": {
                "/v0/things/": {
                    "get": {
                        "summary": "",
                        "parameters": [
                            {"name": "opt1", "required": false, "schema": {"type": "string"}},
                            {"name": "req1", "required": true, "schema": {"type": "string"}},
                            {"name": "opt2", "required": false, "schema": {"type": "integer"}},
                            {"name": "req2", "required": true, "schema": {"type": "integer"}}
                        ],
                        "responses": {
                            "200": {
                                "description": "",
                                "content": {"application/json": {"schema": {"type": "integer"}}}
                            }
                        }
                    }
                }
            },
            "components": {"schemas": {}}
        }"##,
        );
        let table = SchemaTable::from_document(&document).expect("valid table");
        let operations = build_operations(&document, &table).expect("valid operations");

        let names: Vec<&str> = operations[0]
            .params
            .iter()
            .map(|param| param.name.as_str())
            .collect();
        assert_eq!(vec!["req1", "req2", "opt1", "opt2"], names);
    }

    #[test]
    fn missing_200_response_schema_is_fatal() {
        let document = document(
            r#"{
            "info": {"title": "T"},
            "paths": {
                "/v0/broken/": {
                    "get": {
                        "summary": "",
                        "parameters": [],
                        "responses": {"404": {"description": "nope"}}
                    }
                }
            },
            "components": {"schemas": {}}
        }"#,
        );
        let table = SchemaTable::from_document(&document).expect("valid table");

        let error = build_operations(&document, &table).expect_err("must fail");
        match error {
            GenError::MissingResponseSchema(path) => assert_eq!("/v0/broken/", path),
            other => panic!("expected MissingResponseSchema, got {other:?}"),
        }
    }

    #[test]
    fn error_responses_map_to_exception_cases() {
        let document = exchange_document();
        let table = SchemaTable::from_document(&document).expect("valid table");
        let operations = build_operations(&document, &table).expect("valid operations");

        assert_eq!(1, operations[0].errors.len());
        let case = &operations[0].errors[0];
        assert_eq!("422", case.status);
        assert_eq!("HTTPValidationError", case.exception);
        assert_eq!("Validation Error", case.description);
    }

    #[test]
    fn dangling_array_item_reference_is_fatal_at_table_build() {
        let document = document(
            r##"{
            "info": {"title": "T"},
            "paths": {},
            "components": {"schemas": {
                "Exchanges": {
                    "type": "object",
                    "properties": {
                        "data": {"type": "array", "items": {"$ref": "#/components/schemas/Missing"}}
                    }
                }
            }}
        }"##,
        );

        let error = SchemaTable::from_document(&document).expect_err("must fail");
        match error {
            GenError::UnknownSchemaRef { name, context } => {
                assert_eq!("Missing", name);
                assert_eq!("Exchanges.data", context);
            }
            other => panic!("expected UnknownSchemaRef, got {other:?}"),
        }
    }

    #[test]
    fn unsupported_property_type_is_fatal_with_context() {
        let document = document(
            r#"{
            "info": {"title": "T"},
            "paths": {},
            "components": {"schemas": {
                "Broken": {
                    "type": "object",
                    "properties": {"flag": {"type": "boolean"}}
                }
            }}
        }"#,
        );

        let error = SchemaTable::from_document(&document).expect_err("must fail");
        match error {
            GenError::UnsupportedType { tag, context } => {
                assert_eq!("boolean", tag);
                assert_eq!("Broken.flag", context);
            }
            other => panic!("expected UnsupportedType, got {other:?}"),
        }
    }
}
