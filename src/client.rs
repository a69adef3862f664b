//! Operation synthesizer: the generated client classes.
//!
//! For every path+get pair this emits one callable method (signature,
//! docstring with a literal example response, query mapping, request
//! dispatch and response reconstruction), plus the shared low-level
//! request method with dispatch-by-error-type exception raising. The
//! whole class is emitted twice: an asynchronous connection-reusing
//! variant and a synchronous per-call variant.

use std::collections::BTreeSet;
use std::io::Write;

use serde_json::Value;

use crate::config::RunConfig;
use crate::document::Info;
use crate::error::GenError;
use crate::ir::{OperationDef, ParamDef, PropertyKind, SchemaTable};
use crate::pytype::PyPrimitive;
use crate::render::{self, INDENT};
use crate::resolve::ValueShape;

/// Which calling convention a client file is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    /// One long-lived `aiohttp.ClientSession`, explicit `close()`.
    Async,
    /// One `requests` call per method invocation, no lifecycle to manage.
    Sync,
}

impl Flavor {
    fn def_keyword(self) -> &'static str {
        match self {
            Self::Async => "async def",
            Self::Sync => "def",
        }
    }

    fn await_keyword(self) -> &'static str {
        match self {
            Self::Async => "await ",
            Self::Sync => "",
        }
    }
}

/// Everything the client renderer needs, passed by reference; the
/// schema table is shared and read-only.
pub struct ClientContext<'a> {
    pub config: &'a RunConfig,
    pub info: &'a Info,
    pub table: &'a SchemaTable,
    pub operations: &'a [OperationDef],
}

fn loop_var(depth: usize) -> String {
    if depth <= 1 {
        "d".to_string()
    } else {
        format!("d{depth}")
    }
}

fn scalar_cast(primitive: PyPrimitive, source: &str) -> String {
    match primitive {
        PyPrimitive::Decimal => format!("Decimal(str({source}))"),
        PyPrimitive::Str | PyPrimitive::Int => source.to_string(),
    }
}

/// Recursively build the construction expression that rebuilds the
/// declared return type from the raw decoded response.
///
/// The first line carries no indentation (the caller places it after
/// `return ` or a list opener); continuation lines are indented relative
/// to `indent`. Field order follows the schema's declared property order
/// exactly, and nested list properties recurse with a fresh loop
/// variable, so arbitrary nesting depths reconstruct correctly.
pub(crate) fn reconstruction_expr(
    shape: &ValueShape,
    table: &SchemaTable,
    source: &str,
    indent: &str,
    depth: usize,
) -> Result<String, GenError> {
    match shape {
        ValueShape::Primitive(primitive) => Ok(scalar_cast(*primitive, source)),
        ValueShape::Object(name) => object_reconstruction(name, table, source, indent, depth),
        ValueShape::ListOf(name) => {
            let inner_indent = format!("{indent}{INDENT}");
            let var = loop_var(depth);
            let element = object_reconstruction(name, table, &var, &inner_indent, depth + 1)?;
            Ok(format!(
                "[\n{inner_indent}{element}\n{inner_indent}for {var} in {source}\n{indent}]"
            ))
        }
    }
}

fn object_reconstruction(
    name: &str,
    table: &SchemaTable,
    source: &str,
    indent: &str,
    depth: usize,
) -> Result<String, GenError> {
    let schema = table.get(name, "response reconstruction")?;
    let arg_indent = format!("{indent}{INDENT}");
    let mut arguments = Vec::with_capacity(schema.properties.len());
    for property in &schema.properties {
        let raw = format!("{source}[\"{}\"]", property.name);
        let argument = match &property.kind {
            PropertyKind::Scalar(primitive) => {
                format!("{arg_indent}{}={}", property.name, scalar_cast(*primitive, &raw))
            }
            PropertyKind::ListOf(item) => {
                let element_indent = format!("{arg_indent}{INDENT}");
                let var = loop_var(depth);
                let element =
                    object_reconstruction(item, table, &var, &element_indent, depth + 1)?;
                format!(
                    "{arg_indent}{}=[\n{element_indent}{element}\n{element_indent}for {var} in {raw}\n{arg_indent}]",
                    property.name
                )
            }
        };
        arguments.push(argument);
    }
    Ok(format!("{name}(\n{}\n{indent})", arguments.join(",\n")))
}

/// Build the literal example response shown in a method docstring: the
/// same construction shape as [`reconstruction_expr`], with values taken
/// from the schema's `example` map instead of a raw response variable.
///
/// Returns `None` for scalar responses (they carry no example source).
pub(crate) fn example_expr(
    shape: &ValueShape,
    table: &SchemaTable,
) -> Result<Option<String>, GenError> {
    match shape {
        ValueShape::Primitive(_) => Ok(None),
        ValueShape::Object(name) => {
            let schema = table.get(name, "example response")?;
            if schema.example.is_empty() {
                return Ok(None);
            }
            let values = Value::Object(schema.example.clone().into_iter().collect());
            Ok(Some(example_object(name, table, &values, "")?))
        }
        ValueShape::ListOf(name) => {
            let schema = table.get(name, "example response")?;
            if schema.example.is_empty() {
                return Ok(None);
            }
            let values = Value::Object(schema.example.clone().into_iter().collect());
            let element = example_object(name, table, &values, INDENT)?;
            Ok(Some(format!("[\n{INDENT}{element}\n]")))
        }
    }
}

fn example_object(
    name: &str,
    table: &SchemaTable,
    values: &Value,
    indent: &str,
) -> Result<String, GenError> {
    let schema = table.get(name, "example response")?;
    let arg_indent = format!("{indent}{INDENT}");
    let mut arguments = Vec::with_capacity(schema.properties.len());
    for property in &schema.properties {
        let value = values.get(&property.name).unwrap_or(&Value::Null);
        let argument = match &property.kind {
            PropertyKind::Scalar(PyPrimitive::Decimal) if value.is_number() => {
                format!("{arg_indent}{}=Decimal(\"{}\")", property.name, value)
            }
            PropertyKind::Scalar(_) => {
                format!("{arg_indent}{}={}", property.name, render::py_literal(value))
            }
            PropertyKind::ListOf(item) => {
                let element_indent = format!("{arg_indent}{INDENT}");
                let elements = match value {
                    Value::Array(items) => items
                        .iter()
                        .map(|element| {
                            example_object(item, table, element, &element_indent)
                                .map(|text| format!("{element_indent}{text}"))
                        })
                        .collect::<Result<Vec<_>, _>>()?,
                    _ => Vec::new(),
                };
                if elements.is_empty() {
                    format!("{arg_indent}{}=[]", property.name)
                } else {
                    format!(
                        "{arg_indent}{}=[\n{}\n{arg_indent}]",
                        property.name,
                        elements.join(",\n")
                    )
                }
            }
        };
        arguments.push(argument);
    }
    Ok(format!("{name}(\n{}\n{indent})", arguments.join(",\n")))
}

fn walk_models(name: &str, table: &SchemaTable, seen: &mut Vec<String>) -> Result<(), GenError> {
    if seen.iter().any(|existing| existing == name) {
        return Ok(());
    }
    seen.push(name.to_string());
    let schema = table.get(name, "client imports")?;
    for property in &schema.properties {
        if let PropertyKind::ListOf(item) = &property.kind {
            walk_models(item, table, seen)?;
        }
    }
    Ok(())
}

/// All models referenced by the operations' return types, transitively.
fn referenced_models(ctx: &ClientContext<'_>) -> Result<Vec<String>, GenError> {
    let mut seen = Vec::new();
    for operation in ctx.operations {
        match &operation.response {
            ValueShape::Object(name) | ValueShape::ListOf(name) => {
                walk_models(name, ctx.table, &mut seen)?;
            }
            ValueShape::Primitive(_) => {}
        }
    }
    Ok(seen)
}

fn shape_uses_decimal(shape: &ValueShape, table: &SchemaTable) -> Result<bool, GenError> {
    match shape {
        ValueShape::Primitive(primitive) => Ok(primitive.needs_decimal_import()),
        ValueShape::Object(name) | ValueShape::ListOf(name) => {
            let mut names = Vec::new();
            walk_models(name, table, &mut names)?;
            for name in names {
                let schema = table.get(&name, "client imports")?;
                let uses = schema.properties.iter().any(|property| {
                    matches!(property.kind, PropertyKind::Scalar(PyPrimitive::Decimal))
                });
                if uses {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}

fn needs_decimal(ctx: &ClientContext<'_>) -> Result<bool, GenError> {
    for operation in ctx.operations {
        if shape_uses_decimal(&operation.response, ctx.table)? {
            return Ok(true);
        }
        let param_decimal = operation
            .params
            .iter()
            .any(|param| param.py.needs_decimal_import());
        if param_decimal {
            return Ok(true);
        }
    }
    Ok(false)
}

fn param_default_literal(param: &ParamDef, value: &Value) -> String {
    if param.py == PyPrimitive::Decimal && value.is_number() {
        format!("Decimal(\"{value}\")")
    } else {
        render::py_literal(value)
    }
}

fn signature(operation: &OperationDef, flavor: Flavor) -> String {
    let mut parts = vec!["self".to_string()];
    for param in &operation.params {
        if param.required {
            parts.push(format!("{}: {}", param.name, param.py.py_name()));
        } else if let Some(default) = &param.default {
            parts.push(format!(
                "{}: {} = {}",
                param.name,
                param.py.py_name(),
                param_default_literal(param, default)
            ));
        } else {
            parts.push(format!("{}: {} | None = None", param.name, param.py.py_name()));
        }
    }
    format!(
        "{INDENT}{} {}({}) -> {}:",
        flavor.def_keyword(),
        operation.method_name,
        parts.join(", "),
        operation.response.py_type()
    )
}

fn method_doc_lines(
    operation: &OperationDef,
    table: &SchemaTable,
) -> Result<Vec<String>, GenError> {
    let mut lines = if operation.summary.is_empty() {
        vec![format!("Request {}", operation.wire_path)]
    } else {
        render::description_lines(&operation.summary)
    };
    lines.push(String::new());

    for param in &operation.params {
        let description = param.description.replace('\n', " ");
        let description = description.trim_end();
        if param.required {
            lines.push(format!(":param {}: {description}", param.name));
            lines.push(format!(":type {}: {}", param.name, param.py.py_name()));
        } else if let Some(default) = &param.default {
            lines.push(format!(
                ":param {}: {description}, defaults to {}",
                param.name,
                render::py_literal(default)
            ));
            lines.push(format!(":type {}: {}, optional", param.name, param.py.py_name()));
        } else {
            lines.push(format!(":param {}: {description}", param.name));
            lines.push(format!(
                ":type {}: {} | None, optional",
                param.name,
                param.py.py_name()
            ));
        }
        if let Some(example) = &param.example {
            lines.push(format!(
                ":example {}: {}",
                param.name,
                render::py_literal(example)
            ));
        }
    }

    for error in &operation.errors {
        let description = error.description.replace('\n', " ");
        lines.push(format!(":raises {}: {}", error.exception, description.trim_end()));
    }

    let return_lines = render::description_lines(&operation.response_description);
    match return_lines.split_first() {
        Some((first, rest)) => {
            lines.push(format!(":return: {first}"));
            lines.extend(rest.iter().cloned());
        }
        None => lines.push(":return: The API response".to_string()),
    }
    if let Some(example) = example_expr(&operation.response, table)? {
        lines.push(String::new());
        lines.push("Example response:".to_string());
        lines.extend(example.split('\n').map(String::from));
    }
    lines.push(format!(":rtype: {}", operation.response.py_type()));
    Ok(lines)
}

fn write_method<W: Write>(
    operation: &OperationDef,
    ctx: &ClientContext<'_>,
    flavor: Flavor,
    writer: &mut W,
) -> Result<(), GenError> {
    let inner = format!("{INDENT}{INDENT}");
    writeln!(writer, "{}", signature(operation, flavor))?;
    write!(
        writer,
        "{}",
        render::docstring(&inner, &method_doc_lines(operation, ctx.table)?)
    )?;

    // Required parameters and optional parameters with a declared
    // default are always sent (the default is meaningful to the API);
    // optional parameters without a default are sent only when the
    // caller supplied one. Omitting a parameter vs. sending its default
    // can change server-side behavior, so the policy is reproduced
    // exactly.
    let always: Vec<&ParamDef> = operation
        .params
        .iter()
        .filter(|param| param.required || param.default.is_some())
        .collect();
    let conditional: Vec<&ParamDef> = operation
        .params
        .iter()
        .filter(|param| !param.required && param.default.is_none())
        .collect();

    let has_params = !always.is_empty() || !conditional.is_empty();
    if has_params {
        if always.is_empty() {
            writeln!(writer, "{inner}params = {{}}")?;
        } else {
            writeln!(writer, "{inner}params = {{")?;
            let entries: Vec<String> = always
                .iter()
                .map(|param| format!("{inner}{INDENT}\"{}\": {}", param.name, param.name))
                .collect();
            writeln!(writer, "{}", entries.join(",\n"))?;
            writeln!(writer, "{inner}}}")?;
        }
        for param in &conditional {
            writeln!(writer, "{inner}if {} is not None:", param.name)?;
            writeln!(
                writer,
                "{inner}{INDENT}params[\"{}\"] = {}",
                param.name, param.name
            )?;
        }
        writeln!(writer)?;
    }

    let call = if has_params {
        format!(
            "{}self._do_request(\"{}\", params)",
            flavor.await_keyword(),
            operation.wire_path
        )
    } else {
        format!(
            "{}self._do_request(\"{}\")",
            flavor.await_keyword(),
            operation.wire_path
        )
    };
    writeln!(writer, "{inner}ret = {call}")?;
    let expression = reconstruction_expr(&operation.response, ctx.table, "ret", &inner, 1)?;
    writeln!(writer, "{inner}return {expression}")?;
    Ok(())
}

fn write_class_header<W: Write>(
    ctx: &ClientContext<'_>,
    flavor: Flavor,
    writer: &mut W,
) -> Result<(), GenError> {
    let class_name = match flavor {
        Flavor::Async => ctx.config.name.clone(),
        Flavor::Sync => ctx.config.sync_name(),
    };

    writeln!(writer, "class {class_name}:")?;
    let mut doc = render::description_lines(&ctx.info.title);
    if !ctx.info.description.is_empty() {
        doc.push(String::new());
        doc.extend(render::description_lines(&ctx.info.description));
    }
    write!(writer, "{}", render::docstring(INDENT, &doc))?;
    writeln!(writer)?;

    writeln!(writer, "{INDENT}_api_key: str | None")?;
    let api_key_doc = vec![
        "Your API key.".to_string(),
        String::new(),
        "The SDK will work without an API key, but we advise you to provide one in".to_string(),
        "order to unlock better performance.".to_string(),
    ];
    write!(writer, "{}", render::docstring(INDENT, &api_key_doc))?;
    writeln!(writer)?;

    match flavor {
        Flavor::Async => {
            writeln!(writer, "{INDENT}_session: ClientSession")?;
            let session_doc = vec![
                "The session that is used by async operations.".to_string(),
                String::new(),
                "This session must be closed at the end of your program or usage of".to_string(),
                "the API. It can be closed with:".to_string(),
                format!("await {}_instance.close()", ctx.config.package.name),
            ];
            write!(writer, "{}", render::docstring(INDENT, &session_doc))?;
        }
        Flavor::Sync => {
            writeln!(writer, "{INDENT}_api_url: str")?;
            let url_doc = vec![
                "The base URL of the API.".to_string(),
                String::new(),
                "Each method call opens its own connection against it and tears the".to_string(),
                "connection down when the call returns.".to_string(),
            ];
            write!(writer, "{}", render::docstring(INDENT, &url_doc))?;
        }
    }
    writeln!(writer)?;

    writeln!(writer, "{INDENT}_headers: Dict[str, str]")?;
    let headers_doc = vec![
        "The headers of the API.".to_string(),
        String::new(),
        "We pre-generate them and save them because they are the same for all".to_string(),
        "requests.".to_string(),
    ];
    write!(writer, "{}", render::docstring(INDENT, &headers_doc))?;
    writeln!(writer)?;

    let inner = format!("{INDENT}{INDENT}");
    writeln!(writer, "{INDENT}def __init__(self, api_key: str | None = None):")?;
    let init_doc = vec![
        format!("Create a {class_name} instance that allows you to make API calls."),
        String::new(),
        ":param api_key: Your API key, defaults to None".to_string(),
        ":type api_key: str | None, optional".to_string(),
    ];
    write!(writer, "{}", render::docstring(&inner, &init_doc))?;
    writeln!(writer, "{inner}self._api_key = api_key")?;
    writeln!(writer, "{inner}self._headers = {{")?;
    writeln!(writer, "{inner}{INDENT}\"accept\": \"application/json\"")?;
    writeln!(writer, "{inner}}}")?;
    writeln!(writer, "{inner}if self._api_key is not None:")?;
    writeln!(writer, "{inner}{INDENT}self._headers[\"api-key\"] = self._api_key")?;
    match flavor {
        Flavor::Async => {
            writeln!(
                writer,
                "{inner}self._session = ClientSession(\"{}\")",
                ctx.config.api_url
            )?;
        }
        Flavor::Sync => {
            writeln!(writer, "{inner}self._api_url = \"{}\"", ctx.config.api_url)?;
        }
    }
    writeln!(writer)?;

    if flavor == Flavor::Async {
        writeln!(writer, "{INDENT}async def close(self):")?;
        let close_doc = vec![
            "Close the async session object.".to_string(),
            String::new(),
            "You must call this method at the end of your program or when you have".to_string(),
            format!("finished working with {class_name}."),
        ];
        write!(writer, "{}", render::docstring(&inner, &close_doc))?;
        writeln!(writer, "{inner}await self._session.close()")?;
        writeln!(writer)?;
    }

    write_raise_error(ctx, writer)?;
    write_do_request(flavor, writer)?;
    Ok(())
}

fn write_raise_error<W: Write>(ctx: &ClientContext<'_>, writer: &mut W) -> Result<(), GenError> {
    let inner = format!("{INDENT}{INDENT}");
    let deep = format!("{inner}{INDENT}");
    writeln!(
        writer,
        "{INDENT}def _raise_error(self, status_code: int, body: Dict[str, Any]):"
    )?;
    let doc = vec![
        "Raise the generated exception matching an error response body.".to_string(),
        String::new(),
        ":param status_code: The HTTP status code of the response".to_string(),
        ":type status_code: int".to_string(),
        ":param body: The decoded error body".to_string(),
        ":type body: Dict[str, Any]".to_string(),
    ];
    write!(writer, "{}", render::docstring(&inner, &doc))?;
    writeln!(writer, "{inner}detail = body[\"detail\"]")?;
    writeln!(writer, "{inner}match detail[\"error_type\"]:")?;
    for exception in ctx.table.exceptions() {
        writeln!(writer, "{deep}case \"{}\":", exception.name)?;
        writeln!(
            writer,
            "{deep}{INDENT}raise {}(status_code, detail[\"detail\"])",
            exception.name
        )?;
    }
    writeln!(writer, "{deep}case _:")?;
    writeln!(
        writer,
        "{deep}{INDENT}raise {}(status_code, f\"Unknown error: {{status_code}} {{body}}\")",
        ctx.config.base_exception()
    )?;
    writeln!(writer)?;
    Ok(())
}

fn write_do_request<W: Write>(flavor: Flavor, writer: &mut W) -> Result<(), GenError> {
    let inner = format!("{INDENT}{INDENT}");
    let deep = format!("{inner}{INDENT}");
    writeln!(
        writer,
        "{INDENT}{} _do_request(self, path: str, params: Dict[str, Any] | None = None) -> Any:",
        flavor.def_keyword()
    )?;
    let doc = vec![
        "Make a raw API request (that returns the json result).".to_string(),
        String::new(),
        "It additionally adds the user API key to the request if it is present.".to_string(),
        String::new(),
        ":param path: The path of the request".to_string(),
        ":type path: str".to_string(),
        ":param params: The optional query parameters of the request, defaults to None".to_string(),
        ":type params: Dict[str, Any] | None, optional".to_string(),
        ":return: The json-formated result".to_string(),
        ":rtype: Any".to_string(),
    ];
    write!(writer, "{}", render::docstring(&inner, &doc))?;
    match flavor {
        Flavor::Async => {
            writeln!(
                writer,
                "{inner}async with self._session.get(path, params=params, headers=self._headers) as response:"
            )?;
            writeln!(writer, "{deep}if response.status != 200:")?;
            writeln!(
                writer,
                "{deep}{INDENT}self._raise_error(response.status, await response.json())"
            )?;
            writeln!(writer, "{deep}return await response.json()")?;
        }
        Flavor::Sync => {
            writeln!(
                writer,
                "{inner}response = requests.get(f\"{{self._api_url}}{{path}}\", params=params, headers=self._headers)"
            )?;
            writeln!(writer, "{inner}if response.status_code != 200:")?;
            writeln!(
                writer,
                "{inner}{INDENT}self._raise_error(response.status_code, response.json())"
            )?;
            writeln!(writer, "{inner}return response.json()")?;
        }
    }
    writeln!(writer)?;
    Ok(())
}

/// Emit one whole client class file for the given flavor.
pub fn write_client<W: Write>(
    ctx: &ClientContext<'_>,
    flavor: Flavor,
    writer: &mut W,
) -> Result<(), GenError> {
    if needs_decimal(ctx)? {
        writeln!(writer, "from decimal import Decimal")?;
    }
    let needs_list = ctx
        .operations
        .iter()
        .any(|operation| matches!(operation.response, ValueShape::ListOf(_)));
    if needs_list {
        writeln!(writer, "from typing import Any, Dict, List")?;
    } else {
        writeln!(writer, "from typing import Any, Dict")?;
    }
    writeln!(writer)?;
    match flavor {
        Flavor::Async => writeln!(writer, "from aiohttp import ClientSession")?,
        Flavor::Sync => writeln!(writer, "import requests")?,
    }
    writeln!(writer)?;

    let mut models = referenced_models(ctx)?;
    models.sort();
    for model in &models {
        writeln!(writer, "from .models.{model} import {model}")?;
    }
    let base = ctx.config.base_exception();
    writeln!(writer, "from .exceptions.{base} import {base}")?;
    let exception_names: BTreeSet<String> = ctx
        .table
        .exceptions()
        .map(|schema| schema.name.clone())
        .collect();
    for exception in &exception_names {
        writeln!(writer, "from .exceptions.{exception} import {exception}")?;
    }
    writeln!(writer)?;
    writeln!(writer)?;

    write_class_header(ctx, flavor, writer)?;

    for (index, operation) in ctx.operations.iter().enumerate() {
        write_method(operation, ctx, flavor, writer)?;
        if index + 1 < ctx.operations.len() {
            writeln!(writer)?;
        }
    }
    Ok(())
}
