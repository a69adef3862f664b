//! Exception synthesizer: one shared base exception per generated
//! package, plus one subclass per schema whose name carries the error
//! marker.

use std::io::Write;

use crate::ir::SchemaDef;
use crate::render::{self, INDENT};

/// Emit the package base exception, holding a numeric status code and a
/// free-text detail rendered as `"<code> - <detail>"`.
pub fn write_base_exception<W: Write>(class_name: &str, writer: &mut W) -> std::io::Result<()> {
    writeln!(writer, "class {class_name}(Exception):")?;
    let doc = vec![
        "The base exception of the generated SDK.".to_string(),
        String::new(),
        "Every exception raised from an API error response inherits from".to_string(),
        "this class, so you can catch it to handle all API errors at once.".to_string(),
    ];
    write!(writer, "{}", render::docstring(INDENT, &doc))?;
    writeln!(writer)?;
    writeln!(writer, "{INDENT}error_code: int")?;
    write!(
        writer,
        "{}",
        render::docstring(INDENT, &["The HTTP status code of the error".to_string()])
    )?;
    writeln!(writer)?;
    writeln!(writer, "{INDENT}detail: str")?;
    write!(
        writer,
        "{}",
        render::docstring(INDENT, &["More details about the error".to_string()])
    )?;
    writeln!(writer)?;
    writeln!(writer, "{INDENT}def __init__(self, error_code: int, detail: str):")?;
    let inner = format!("{INDENT}{INDENT}");
    writeln!(writer, "{inner}self.error_code = error_code")?;
    writeln!(writer, "{inner}self.detail = detail")?;
    writeln!(writer, "{inner}super().__init__(f\"{{error_code}} - {{detail}}\")")?;
    Ok(())
}

/// Emit one exception subclass. It carries no behavior beyond the
/// inherited fields; only its docstring differs.
pub fn write_exception<W: Write>(
    schema: &SchemaDef,
    base_class: &str,
    writer: &mut W,
) -> std::io::Result<()> {
    writeln!(writer, "from .{base_class} import {base_class}")?;
    writeln!(writer)?;
    writeln!(writer)?;
    writeln!(writer, "class {}({base_class}):", schema.name)?;
    let doc = if schema.description.is_empty() {
        vec![format!("Raised when the API answers with a {} error", schema.name)]
    } else {
        render::description_lines(&schema.description)
    };
    write!(writer, "{}", render::docstring(INDENT, &doc))?;
    Ok(())
}

/// Emit the `exceptions/__init__.py`: the base exception first, then
/// every subclass in declaration order.
pub fn write_exceptions_init<W: Write>(
    exceptions: &[&SchemaDef],
    base_class: &str,
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
    writeln!(writer, "from .{base_class} import {base_class}")?;
    for exception in exceptions {
        writeln!(writer, "from .{} import {}", exception.name, exception.name)?;
    }
    writeln!(writer)?;
    writeln!(writer, "__all__ = [")?;
    let mut names = vec![format!("{INDENT}\"{base_class}\"")];
    names.extend(
        exceptions
            .iter()
            .map(|exception| format!("{INDENT}\"{}\"", exception.name)),
    );
    writeln!(writer, "{}", names.join(",\n"))?;
    writeln!(writer, "]")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn validation_error() -> SchemaDef {
        SchemaDef {
            name: "HTTPValidationError".to_string(),
            description: "Validation error returned by the API".to_string(),
            properties: Vec::new(),
            example: IndexMap::new(),
        }
    }

    #[test]
    fn base_exception_renders_code_dash_detail() {
        let mut output = Vec::new();
        write_base_exception("BlockchainAPIsException", &mut output)
            .expect("write_base_exception should succeed");
        let rendered = String::from_utf8(output).expect("valid UTF-8");

        assert!(rendered.starts_with("class BlockchainAPIsException(Exception):"));
        assert!(rendered.contains("error_code: int"));
        assert!(rendered.contains("detail: str"));
        assert!(rendered.contains("super().__init__(f\"{error_code} - {detail}\")"));
    }

    #[test]
    fn subclass_inherits_base_and_adds_nothing() {
        let expected = r#"from .BlockchainAPIsException import BlockchainAPIsException


class HTTPValidationError(BlockchainAPIsException):
    """Validation error returned by the API"""
"#;

        let mut output = Vec::new();
        write_exception(&validation_error(), "BlockchainAPIsException", &mut output)
            .expect("write_exception should succeed");
        let actual = String::from_utf8(output).expect("valid UTF-8");

        assert_eq!(expected, actual);
    }

    #[test]
    fn exceptions_init_exports_base_first() {
        let error = validation_error();
        let exceptions: Vec<&SchemaDef> = vec![&error];
        let mut output = Vec::new();
        write_exceptions_init(
            &exceptions,
            "BlockchainAPIsException",
            "Exceptions raised by the API",
            &mut output,
        )
        .expect("write_exceptions_init should succeed");
        let rendered = String::from_utf8(output).expect("valid UTF-8");

        let base_position = rendered
            .find("from .BlockchainAPIsException")
            .expect("base import present");
        let subclass_position = rendered
            .find("from .HTTPValidationError")
            .expect("subclass import present");
        assert!(base_position < subclass_position);
        assert!(rendered.contains("\"BlockchainAPIsException\",\n    \"HTTPValidationError\""));
    }
}
