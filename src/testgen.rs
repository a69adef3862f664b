//! Test synthesizer: one pytest file per operation, with one test method
//! per subset of the operation's optional parameters.
//!
//! The powerset enumeration is intentional: the generated suite is an
//! exhaustive contract test of the live API surface, not a sampling
//! strategy. No size cap is applied (see DESIGN.md).

use std::io::Write;

use heck::ToUpperCamelCase;

use crate::client;
use crate::config::RunConfig;
use crate::error::GenError;
use crate::ir::{OperationDef, ParamDef, PropertyKind, SchemaTable};
use crate::pytype::PyPrimitive;
use crate::render::{self, INDENT};
use crate::resolve::ValueShape;

/// Every subset of `items`, in binary-counting order: the empty set
/// first, each element's declaration order preserved within a subset.
#[must_use]
pub fn powerset<T>(items: &[T]) -> Vec<Vec<&T>> {
    let count = 1_usize << items.len();
    let mut subsets = Vec::with_capacity(count);
    for mask in 0..count {
        let subset: Vec<&T> = items
            .iter()
            .enumerate()
            .filter(|(index, _)| mask & (1 << index) != 0)
            .map(|(_, item)| item)
            .collect();
        subsets.push(subset);
    }
    subsets
}

/// Name of the test exercising one optional-parameter subset. The empty
/// subset carries the reserved name `only_required`.
fn subset_test_name(subset: &[&ParamDef]) -> String {
    if subset.is_empty() {
        "test_only_required".to_string()
    } else {
        let names: Vec<&str> = subset.iter().map(|param| param.name.as_str()).collect();
        format!("test_{}", names.join("_"))
    }
}

/// The literal value a test passes for a parameter: the documented
/// example, else the declared default, else a type placeholder.
fn param_value_literal(param: &ParamDef) -> String {
    let source = param.example.as_ref().or(param.default.as_ref());
    match source {
        Some(value) => {
            if param.py == PyPrimitive::Decimal && value.is_number() {
                format!("Decimal(\"{value}\")")
            } else {
                render::py_literal(value)
            }
        }
        None => match param.py {
            PyPrimitive::Str => "\"\"".to_string(),
            PyPrimitive::Int => "1".to_string(),
            PyPrimitive::Decimal => "Decimal(\"1\")".to_string(),
        },
    }
}

/// The query-parameter entries the raw cross-check request must send to
/// mirror the generated client for a given subset: required parameters
/// and chosen optionals with their passed values, plus omitted optionals
/// that carry a declared default (the client always sends those).
fn raw_query_entries(operation: &OperationDef, subset: &[&ParamDef]) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    for param in &operation.params {
        let chosen = subset.iter().any(|candidate| candidate.name == param.name);
        if param.required || chosen {
            entries.push((param.name.clone(), param_value_literal(param)));
        } else if let Some(default) = &param.default {
            let literal = if param.py == PyPrimitive::Decimal && default.is_number() {
                format!("Decimal(\"{default}\")")
            } else {
                render::py_literal(default)
            };
            entries.push((param.name.clone(), literal));
        }
    }
    entries
}

fn test_file_needs_decimal(operation: &OperationDef, table: &SchemaTable) -> bool {
    let param_decimal = operation
        .params
        .iter()
        .any(|param| param.py.needs_decimal_import());
    if param_decimal {
        return true;
    }
    match &operation.response {
        ValueShape::Primitive(primitive) => primitive.needs_decimal_import(),
        ValueShape::Object(name) | ValueShape::ListOf(name) => {
            let mut pending = vec![name.clone()];
            let mut seen = Vec::new();
            while let Some(current) = pending.pop() {
                if seen.contains(&current) {
                    continue;
                }
                seen.push(current.clone());
                let Ok(schema) = table.get(&current, "test imports") else {
                    continue;
                };
                for property in &schema.properties {
                    match &property.kind {
                        PropertyKind::Scalar(PyPrimitive::Decimal) => return true,
                        PropertyKind::ListOf(item) => pending.push(item.clone()),
                        PropertyKind::Scalar(_) => {}
                    }
                }
            }
            false
        }
    }
}

fn response_models(operation: &OperationDef, table: &SchemaTable) -> Result<Vec<String>, GenError> {
    let mut models = Vec::new();
    let mut pending = match &operation.response {
        ValueShape::Object(name) | ValueShape::ListOf(name) => vec![name.clone()],
        ValueShape::Primitive(_) => Vec::new(),
    };
    while let Some(current) = pending.pop() {
        if models.contains(&current) {
            continue;
        }
        let schema = table.get(&current, "test imports")?;
        models.push(current);
        for property in &schema.properties {
            if let PropertyKind::ListOf(item) = &property.kind {
                pending.push(item.clone());
            }
        }
    }
    models.sort();
    Ok(models)
}

fn write_subset_test<W: Write>(
    operation: &OperationDef,
    subset: &[&ParamDef],
    table: &SchemaTable,
    writer: &mut W,
) -> Result<(), GenError> {
    let inner = format!("{INDENT}{INDENT}");
    writeln!(writer, "{INDENT}@pytest.mark.asyncio")?;
    writeln!(
        writer,
        "{INDENT}async def {}(self, api, raw_session):",
        subset_test_name(subset)
    )?;

    let mut call_arguments = Vec::new();
    for param in operation.required_params() {
        call_arguments.push(format!("{}={}", param.name, param_value_literal(param)));
    }
    for param in subset {
        call_arguments.push(format!("{}={}", param.name, param_value_literal(param)));
    }
    writeln!(
        writer,
        "{inner}result = await api.{}({})",
        operation.method_name,
        call_arguments.join(", ")
    )?;

    let entries = raw_query_entries(operation, subset);
    if entries.is_empty() {
        writeln!(
            writer,
            "{inner}async with raw_session.get(\"{}\") as response:",
            operation.wire_path
        )?;
    } else {
        writeln!(writer, "{inner}params = {{")?;
        let rendered: Vec<String> = entries
            .iter()
            .map(|(name, literal)| format!("{inner}{INDENT}\"{name}\": {literal}"))
            .collect();
        writeln!(writer, "{}", rendered.join(",\n"))?;
        writeln!(writer, "{inner}}}")?;
        writeln!(
            writer,
            "{inner}async with raw_session.get(\"{}\", params=params) as response:",
            operation.wire_path
        )?;
    }
    writeln!(writer, "{inner}{INDENT}assert response.status == 200")?;
    writeln!(writer, "{inner}{INDENT}ret = await response.json()")?;

    let expression = client::reconstruction_expr(&operation.response, table, "ret", &inner, 1)?;
    writeln!(writer, "{inner}expected = {expression}")?;
    writeln!(writer, "{inner}assert expected == result")?;
    Ok(())
}

fn write_missing_required_test<W: Write>(
    operation: &OperationDef,
    writer: &mut W,
) -> std::io::Result<()> {
    let inner = format!("{INDENT}{INDENT}");
    writeln!(writer, "{INDENT}@pytest.mark.asyncio")?;
    writeln!(
        writer,
        "{INDENT}async def test_missing_required(self, raw_session):"
    )?;
    writeln!(
        writer,
        "{inner}async with raw_session.get(\"{}\") as response:",
        operation.wire_path
    )?;
    writeln!(writer, "{inner}{INDENT}assert response.status != 200")?;
    Ok(())
}

/// Emit `tests/test_<method>.py` for one operation: the full powerset of
/// optional-parameter subsets, plus a missing-required-parameter check
/// when the operation has required parameters.
pub fn write_operation_tests<W: Write>(
    operation: &OperationDef,
    table: &SchemaTable,
    config: &RunConfig,
    writer: &mut W,
) -> Result<(), GenError> {
    writeln!(writer, "import pytest")?;
    if test_file_needs_decimal(operation, table) {
        writeln!(writer)?;
        writeln!(writer, "from decimal import Decimal")?;
    }
    let models = response_models(operation, table)?;
    if !models.is_empty() {
        writeln!(writer)?;
        for model in &models {
            writeln!(
                writer,
                "from {}.models.{model} import {model}",
                config.package.name
            )?;
        }
    }
    writeln!(writer)?;
    writeln!(writer)?;
    writeln!(
        writer,
        "class Test{}:",
        operation.method_name.to_upper_camel_case()
    )?;
    let doc = if operation.summary.is_empty() {
        vec![format!("Contract tests for {}", operation.wire_path)]
    } else {
        vec![format!(
            "Contract tests for {}: every optional-parameter combination.",
            operation.wire_path
        )]
    };
    write!(writer, "{}", render::docstring(INDENT, &doc))?;
    writeln!(writer)?;

    let optionals: Vec<ParamDef> = operation.optional_params().cloned().collect();
    let subsets = powerset(&optionals);
    let has_required = operation.required_params().next().is_some();

    for (index, subset) in subsets.iter().enumerate() {
        write_subset_test(operation, subset, table, writer)?;
        if index + 1 < subsets.len() || has_required {
            writeln!(writer)?;
        }
    }
    if has_required {
        write_missing_required_test(operation, writer)?;
    }
    Ok(())
}

/// Emit the shared `tests/conftest.py` fixtures.
pub fn write_conftest<W: Write>(config: &RunConfig, writer: &mut W) -> std::io::Result<()> {
    writeln!(writer, "import pytest_asyncio")?;
    writeln!(writer, "from aiohttp import ClientSession")?;
    writeln!(writer)?;
    writeln!(writer, "from secret_config import API_KEY")?;
    writeln!(
        writer,
        "from {} import {}",
        config.package.name, config.name
    )?;
    writeln!(writer)?;
    writeln!(writer)?;
    writeln!(writer, "@pytest_asyncio.fixture")?;
    writeln!(writer, "async def api():")?;
    write!(
        writer,
        "{}",
        render::docstring(
            INDENT,
            &["The generated async client, ready for API calls.".to_string()]
        )
    )?;
    writeln!(writer, "{INDENT}client = {}(API_KEY)", config.name)?;
    writeln!(writer, "{INDENT}yield client")?;
    writeln!(writer, "{INDENT}await client.close()")?;
    writeln!(writer)?;
    writeln!(writer)?;
    writeln!(writer, "@pytest_asyncio.fixture")?;
    writeln!(writer, "async def raw_session():")?;
    write!(
        writer,
        "{}",
        render::docstring(
            INDENT,
            &["A raw aiohttp session against the same API, for cross-checking.".to_string()]
        )
    )?;
    writeln!(writer, "{INDENT}headers = {{")?;
    writeln!(writer, "{INDENT}{INDENT}\"accept\": \"application/json\"")?;
    writeln!(writer, "{INDENT}}}")?;
    writeln!(writer, "{INDENT}if API_KEY is not None:")?;
    writeln!(writer, "{INDENT}{INDENT}headers[\"api-key\"] = API_KEY")?;
    writeln!(
        writer,
        "{INDENT}session = ClientSession(\"{}\", headers=headers)",
        config.api_url
    )?;
    writeln!(writer, "{INDENT}yield session")?;
    writeln!(writer, "{INDENT}await session.close()")?;
    Ok(())
}

/// Emit the `tests/secret_config.py` placeholder, covered by the
/// generated `.gitignore`.
pub fn write_secret_config<W: Write>(writer: &mut W) -> std::io::Result<()> {
    let doc = vec![
        "Local secrets for the generated test suite.".to_string(),
        String::new(),
        "Fill in your API key locally; this file matches the secret_* pattern".to_string(),
        "of the generated .gitignore and must never be committed.".to_string(),
    ];
    write!(writer, "{}", render::docstring("", &doc))?;
    writeln!(writer)?;
    writeln!(writer, "API_KEY = None")?;
    Ok(())
}
