//! Model synthesizer: one immutable Python dataclass per non-error
//! schema.
//!
//! The constructor contract is the forward-compatibility invariant of the
//! generated SDK: it accepts the declared fields plus `**_`, so a client
//! generated today keeps constructing models when the remote API starts
//! returning extra fields tomorrow.

use std::collections::BTreeSet;
use std::io::Write;

use crate::ir::{PropertyKind, SchemaDef};
use crate::render::{self, INDENT};

/// Python imports needed at the top of a model file.
fn collect_imports(schema: &SchemaDef) -> (bool, bool, BTreeSet<String>) {
    let mut needs_decimal = false;
    let mut needs_list = false;
    let mut referenced = BTreeSet::new();
    for property in &schema.properties {
        match &property.kind {
            PropertyKind::Scalar(primitive) => {
                needs_decimal = needs_decimal || primitive.needs_decimal_import();
            }
            PropertyKind::ListOf(item) => {
                needs_list = true;
                if item != &schema.name {
                    referenced.insert(item.clone());
                }
            }
        }
    }
    (needs_decimal, needs_list, referenced)
}

fn class_doc_lines(schema: &SchemaDef) -> Vec<String> {
    if schema.description.is_empty() {
        vec![format!("The {} model", schema.name)]
    } else {
        render::description_lines(&schema.description)
    }
}

/// Emit `models/<Name>.py` for one schema.
///
/// Field order is the schema's declared property order; each field
/// docstring carries the property description and a literal example from
/// the schema's `example` map.
pub fn write_model<W: Write>(schema: &SchemaDef, writer: &mut W) -> std::io::Result<()> {
    let (needs_decimal, needs_list, referenced) = collect_imports(schema);

    writeln!(writer, "from dataclasses import dataclass")?;
    if needs_decimal {
        writeln!(writer, "from decimal import Decimal")?;
    }
    if needs_list {
        writeln!(writer, "from typing import List")?;
    }
    if !referenced.is_empty() {
        writeln!(writer)?;
        for item in &referenced {
            writeln!(writer, "from .{item} import {item}")?;
        }
    }
    writeln!(writer)?;
    writeln!(writer)?;
    writeln!(writer, "@dataclass(slots=True, frozen=True)")?;
    writeln!(writer, "class {}:", schema.name)?;
    write!(
        writer,
        "{}",
        render::docstring(INDENT, &class_doc_lines(schema))
    )?;
    writeln!(writer)?;

    for property in &schema.properties {
        writeln!(writer, "{INDENT}{}: {}", property.name, property.py_type())?;
        let mut lines = render::description_lines(&property.description);
        if let Some(example) = schema.example.get(&property.name) {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.push(format!("example: {}", render::example_block(example, "")));
        }
        if !lines.is_empty() {
            // An example block may span several lines; split it back out
            // so the docstring renderer indents each line once.
            let flat: Vec<String> = lines
                .iter()
                .flat_map(|line| line.split('\n').map(String::from))
                .collect();
            write!(writer, "{}", render::docstring(INDENT, &flat))?;
        }
    }

    writeln!(writer)?;
    write_constructor(schema, writer)?;
    Ok(())
}

fn write_constructor<W: Write>(schema: &SchemaDef, writer: &mut W) -> std::io::Result<()> {
    let mut parameters = vec!["self".to_string()];
    parameters.extend(
        schema
            .properties
            .iter()
            .map(|property| format!("{}: {}", property.name, property.py_type())),
    );
    parameters.push("**_".to_string());
    writeln!(writer, "{INDENT}def __init__({}):", parameters.join(", "))?;

    let inner = format!("{INDENT}{INDENT}");
    let mut lines = vec![format!("Creates a {} model", schema.name)];
    lines.push(String::new());
    for property in &schema.properties {
        let description = property.description.replace('\n', " ");
        lines.push(format!(":param {}: {}", property.name, description.trim_end()));
        lines.push(format!(":type {}: {}", property.name, property.py_type()));
    }
    write!(writer, "{}", render::docstring(&inner, &lines))?;

    // frozen=True blocks plain attribute assignment inside the custom
    // constructor; object.__setattr__ is the dataclass-sanctioned escape
    // hatch and keeps instances immutable afterwards.
    for property in &schema.properties {
        writeln!(
            writer,
            "{inner}object.__setattr__(self, \"{}\", {})",
            property.name, property.name
        )?;
    }
    Ok(())
}

/// Emit the `models/__init__.py` with the configured module docstring and
/// one re-export per model, in declaration order.
pub fn write_models_init<W: Write>(
    models: &[&SchemaDef],
    module_description: &str,
    writer: &mut W,
) -> std::io::Result<()> {
    if !module_description.is_empty() {
        write!(
            writer,
            "{}",
            render::docstring("", &render::description_lines(module_description))
        )?;
        writeln!(writer)?;
    }
    for model in models {
        writeln!(writer, "from .{} import {}", model.name, model.name)?;
    }
    writeln!(writer)?;
    writeln!(writer, "__all__ = [")?;
    let names: Vec<String> = models
        .iter()
        .map(|model| format!("{INDENT}\"{}\"", model.name))
        .collect();
    writeln!(writer, "{}", names.join(",\n"))?;
    writeln!(writer, "]")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{PropertyDef, PropertyKind};
    use crate::pytype::PyPrimitive;
    use indexmap::IndexMap;
    use serde_json::json;

    fn exchange_schema() -> SchemaDef {
        let mut example = IndexMap::new();
        example.insert("exchange".to_string(), json!("lydia_finance_avalanche"));
        example.insert("fee".to_string(), json!(200));
        SchemaDef {
            name: "Exchange".to_string(),
            description: String::new(),
            properties: vec![
                PropertyDef {
                    name: "exchange".to_string(),
                    kind: PropertyKind::Scalar(PyPrimitive::Str),
                    description: "The id of the exchange".to_string(),
                },
                PropertyDef {
                    name: "fee".to_string(),
                    kind: PropertyKind::Scalar(PyPrimitive::Int),
                    description: "The fee of the exchange".to_string(),
                },
            ],
            example,
        }
    }

    fn render_model(schema: &SchemaDef) -> String {
        let mut output = Vec::new();
        write_model(schema, &mut output).expect("write_model should succeed");
        String::from_utf8(output).expect("valid UTF-8")
    }

    #[test]
    fn emits_fields_in_declaration_order_with_examples() {
        let expected = r#"from dataclasses import dataclass


@dataclass(slots=True, frozen=True)
class Exchange:
    """The Exchange model"""

    exchange: str
    """The id of the exchange

    example: "lydia_finance_avalanche"
    """
    fee: int
    """The fee of the exchange

    example: 200
    """

    def __init__(self, exchange: str, fee: int, **_):
        """Creates a Exchange model

        :param exchange: The id of the exchange
        :type exchange: str
        :param fee: The fee of the exchange
        :type fee: int
        """
        object.__setattr__(self, "exchange", exchange)
        object.__setattr__(self, "fee", fee)
"#;

        let actual = render_model(&exchange_schema());

        assert_eq!(expected, actual);
    }

    #[test]
    fn field_order_matches_declared_property_order() {
        let rendered = render_model(&exchange_schema());
        let exchange_position = rendered.find("exchange: str").expect("field present");
        let fee_position = rendered.find("fee: int").expect("field present");

        assert!(exchange_position < fee_position);
    }

    #[test]
    fn constructor_accepts_unknown_extra_fields() {
        let rendered = render_model(&exchange_schema());

        assert!(rendered.contains("def __init__(self, exchange: str, fee: int, **_):"));
    }

    #[test]
    fn number_property_imports_decimal() {
        let schema = SchemaDef {
            name: "Reserve".to_string(),
            description: String::new(),
            properties: vec![PropertyDef {
                name: "amount".to_string(),
                kind: PropertyKind::Scalar(PyPrimitive::Decimal),
                description: String::new(),
            }],
            example: IndexMap::new(),
        };

        let rendered = render_model(&schema);

        assert!(rendered.contains("from decimal import Decimal"));
        assert!(rendered.contains("amount: Decimal"));
    }

    #[test]
    fn list_property_imports_item_model_and_renders_full_example() {
        let mut example = IndexMap::new();
        example.insert("page".to_string(), json!(1));
        example.insert(
            "data".to_string(),
            json!([
                {"exchange": "lydia_finance_avalanche", "fee": 200},
                {"exchange": "oliveswap_avalanche", "fee": 250}
            ]),
        );
        let schema = SchemaDef {
            name: "Exchanges".to_string(),
            description: String::new(),
            properties: vec![
                PropertyDef {
                    name: "page".to_string(),
                    kind: PropertyKind::Scalar(PyPrimitive::Int),
                    description: "The page of the request".to_string(),
                },
                PropertyDef {
                    name: "data".to_string(),
                    kind: PropertyKind::ListOf("Exchange".to_string()),
                    description: "The list of exchanges".to_string(),
                },
            ],
            example,
        };

        let rendered = render_model(&schema);

        assert!(rendered.contains("from typing import List"));
        assert!(rendered.contains("from .Exchange import Exchange"));
        assert!(rendered.contains("data: List[Exchange]"));
        // Both elements of the example sub-array are re-rendered.
        assert!(rendered.contains("lydia_finance_avalanche"));
        assert!(rendered.contains("oliveswap_avalanche"));
    }

    #[test]
    fn models_init_lists_every_model() {
        let exchange = exchange_schema();
        let models: Vec<&SchemaDef> = vec![&exchange];
        let mut output = Vec::new();
        write_models_init(&models, "Models returned by the API", &mut output)
            .expect("write_models_init should succeed");
        let rendered = String::from_utf8(output).expect("valid UTF-8");

        let expected = r#""""Models returned by the API"""

from .Exchange import Exchange

__all__ = [
    "Exchange"
]
"#;
        assert_eq!(expected, rendered);
    }
}
