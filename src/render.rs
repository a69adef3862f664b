//! Python source text helpers shared by every synthesizer: literals,
//! docstrings and indentation.

use serde_json::Value;

/// One indentation step in generated Python.
pub const INDENT: &str = "    ";

/// Render a string as a double-quoted Python literal.
#[must_use]
pub fn py_str(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Render a JSON value as an inline Python literal.
///
/// `null` becomes `None` and booleans become `True`/`False`; numbers are
/// passed through verbatim so integer example values never grow a
/// trailing `.0`.
#[must_use]
pub fn py_literal(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => py_str(text),
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(py_literal).collect();
            format!("[{}]", rendered.join(", "))
        }
        Value::Object(map) => {
            let rendered: Vec<String> = map
                .iter()
                .map(|(key, item)| format!("{}: {}", py_str(key), py_literal(item)))
                .collect();
            format!("{{{}}}", rendered.join(", "))
        }
    }
}

/// Render an example value for a field docstring. Scalars stay inline;
/// arrays and objects are re-rendered in full, one entry per line, so a
/// list example shows every element at a consistent indentation instead
/// of just the first.
#[must_use]
pub fn example_block(value: &Value, indent: &str) -> String {
    match value {
        Value::Array(items) => {
            if items.is_empty() {
                return "[]".to_string();
            }
            let inner_indent = format!("{indent}{INDENT}");
            let rendered: Vec<String> = items
                .iter()
                .map(|item| format!("{inner_indent}{}", example_block(item, &inner_indent)))
                .collect();
            format!("[\n{}\n{indent}]", rendered.join(",\n"))
        }
        Value::Object(map) => {
            if map.is_empty() {
                return "{}".to_string();
            }
            let inner_indent = format!("{indent}{INDENT}");
            let rendered: Vec<String> = map
                .iter()
                .map(|(key, item)| {
                    format!(
                        "{inner_indent}{}: {}",
                        py_str(key),
                        example_block(item, &inner_indent)
                    )
                })
                .collect();
            format!("{{\n{}\n{indent}}}", rendered.join(",\n"))
        }
        scalar => py_literal(scalar),
    }
}

/// Render a docstring at the given indentation. A single line stays on
/// one line; multiple lines put the closing quotes on their own line.
/// Empty lines carry no trailing indentation.
#[must_use]
pub fn docstring(indent: &str, lines: &[String]) -> String {
    match lines {
        [] => format!("{indent}\"\"\"\"\"\"\n"),
        [only] => format!("{indent}\"\"\"{only}\"\"\"\n"),
        [first, rest @ ..] => {
            let mut out = format!("{indent}\"\"\"{first}\n");
            for line in rest {
                if line.is_empty() {
                    out.push('\n');
                } else {
                    out.push_str(indent);
                    out.push_str(line);
                    out.push('\n');
                }
            }
            out.push_str(indent);
            out.push_str("\"\"\"\n");
            out
        }
    }
}

/// Split free-form description text into docstring lines, trimming
/// trailing whitespace the document authors left behind.
#[must_use]
pub fn description_lines(text: &str) -> Vec<String> {
    text.trim_end()
        .lines()
        .map(|line| line.trim_end().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn py_str_escapes_quotes_and_backslashes() {
        assert_eq!(r#""plain""#, py_str("plain"));
        assert_eq!(r#""say \"hi\"""#, py_str(r#"say "hi""#));
        assert_eq!(r#""a\\b""#, py_str(r"a\b"));
        assert_eq!(r#""line\nbreak""#, py_str("line\nbreak"));
    }

    #[test]
    fn py_literal_maps_json_scalars_to_python() {
        assert_eq!("None", py_literal(&Value::Null));
        assert_eq!("True", py_literal(&json!(true)));
        assert_eq!("False", py_literal(&json!(false)));
        assert_eq!("843047442340946", py_literal(&json!(843_047_442_340_946_i64)));
        assert_eq!("0.003", py_literal(&json!(0.003)));
        assert_eq!("\"avalanche\"", py_literal(&json!("avalanche")));
    }

    #[test]
    fn py_literal_renders_collections_inline() {
        assert_eq!("[1, 2, 3]", py_literal(&json!([1, 2, 3])));
        assert_eq!(
            "{\"page\": 1, \"name\": \"a\"}",
            py_literal(&json!({"page": 1, "name": "a"}))
        );
    }

    #[test]
    fn example_block_renders_every_array_element() {
        let value = json!([
            {"exchange": "lydia_finance_avalanche", "fee": 200},
            {"exchange": "oliveswap_avalanche", "fee": 250}
        ]);

        let expected = "[\n    {\n        \"exchange\": \"lydia_finance_avalanche\",\n        \"fee\": 200\n    },\n    {\n        \"exchange\": \"oliveswap_avalanche\",\n        \"fee\": 250\n    }\n]";
        let actual = example_block(&value, "");

        assert_eq!(expected, actual);
    }

    #[test]
    fn docstring_single_line_stays_inline() {
        let actual = docstring("    ", &["The Exchanges model".to_string()]);
        assert_eq!("    \"\"\"The Exchanges model\"\"\"\n", actual);
    }

    #[test]
    fn docstring_multi_line_closes_on_own_line() {
        let lines = vec![
            "The page of the request".to_string(),
            String::new(),
            "example: 1".to_string(),
        ];

        let expected = "    \"\"\"The page of the request\n\n    example: 1\n    \"\"\"\n";
        let actual = docstring("    ", &lines);

        assert_eq!(expected, actual);
    }

    #[test]
    fn description_lines_trims_trailing_whitespace() {
        let lines = description_lines("first line  \n\nsecond line\n");
        assert_eq!(
            vec!["first line".to_string(), String::new(), "second line".to_string()],
            lines
        );
    }
}
