//! Identifier checks, string literals and doc-comment text shared by back-ends.

use std::path::Path;

use serde_json::Value;

use crate::diagnostic::ModgenError;
use crate::ir::Entity;

/// First line of every generated file.
pub const BANNER: &str = "// Auto-generated by modgen from the schema document. Do not edit by hand.";

pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Rejects names that cannot become class, file or member names.
pub fn check_entity(entity: &Entity) -> Result<(), ModgenError> {
    let parts = match (&entity.namespace, &entity.method) {
        (Some(ns), Some(method)) => vec![ns.as_str(), method.as_str()],
        _ => vec![entity.name.as_str()],
    };

    for part in parts {
        if !is_identifier(part) {
            return Err(ModgenError::render(&entity.name, format!("'{}' is not a valid identifier", part)));
        }
    }

    for prop in &entity.properties {
        if !is_identifier(&prop.name) {
            return Err(ModgenError::render(
                &entity.name,
                format!("property '{}' is not a valid identifier", prop.name),
            ));
        }
    }

    Ok(())
}

/// Double-quoted string literal valid in JavaScript, ActionScript and C#.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// A comma separated list of quoted strings.
pub fn quote_list<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
    items.into_iter().map(quote).collect::<Vec<_>>().join(", ")
}

/// A schema default as an ECMAScript literal.
pub fn ecma_literal(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "null".to_string(),
        Some(Value::String(s)) => quote(s),
        Some(v) => v.to_string(),
    }
}

/// Splits a schema description into comment lines.
///
/// Blank lines are dropped and `#Name` references become `qualify(Name)`.
pub fn description_lines(text: &str, qualify: impl Fn(&str) -> String) -> Vec<String> {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .map(|line| expand_references(line, &qualify))
        .collect()
}

fn expand_references(line: &str, qualify: &impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;

    while let Some(pos) = rest.find('#') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());

        if len > 0 && after.starts_with(|c: char| c.is_ascii_alphabetic()) {
            out.push_str(&qualify(&after[..len]));
        } else {
            out.push('#');
            out.push_str(&after[..len]);
        }
        rest = &after[len..];
    }

    out.push_str(rest);
    out
}

/// Relative ES module specifier from the directory of `from_file` to `to_file`.
pub fn module_specifier(from_file: &Path, to_file: &Path) -> String {
    let from_dir = from_file.parent().unwrap_or_else(|| Path::new(""));
    let relative = pathdiff::diff_paths(to_file, from_dir).unwrap_or_else(|| to_file.to_path_buf());

    let spec = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/");

    if spec.starts_with("../") || spec.starts_with('/') {
        spec
    } else {
        format!("./{}", spec)
    }
}

/// Pushes a hand-written partial verbatim.
pub fn push_partial(out: &mut String, partial: Option<&String>) {
    if let Some(text) = partial {
        out.push_str(text);
        if !text.ends_with('\n') {
            out.push('\n');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_identifiers() {
        assert!(is_identifier("getScores"));
        assert!(is_identifier("_id"));
        assert!(!is_identifier("user-id"));
        assert!(!is_identifier("9lives"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote(r#"say "hi"\"#), r#""say \"hi\"\\""#);
        assert_eq!(quote_list(["a", "b"]), r#""a", "b""#);
    }

    #[test]
    fn test_ecma_literal() {
        assert_eq!(ecma_literal(None), "null");
        assert_eq!(ecma_literal(Some(&serde_json::json!(10))), "10");
        assert_eq!(ecma_literal(Some(&serde_json::json!("x"))), "\"x\"");
        assert_eq!(ecma_literal(Some(&serde_json::json!(false))), "false");
    }

    #[test]
    fn test_description_references() {
        let lines = description_lines("Holds a #Score.\n\nSee #Medal, not # or #1.", |n| format!("ns.{}", n));
        assert_eq!(lines, vec!["Holds a ns.Score.", "See ns.Medal, not # or #1."]);
    }

    #[test]
    fn test_module_specifier() {
        let from = PathBuf::from("out/objects/User.js");
        assert_eq!(module_specifier(&from, Path::new("out/objects/Score.js")), "./Score.js");
        assert_eq!(module_specifier(&from, Path::new("out/runtime.js")), "../runtime.js");
        assert_eq!(
            module_specifier(Path::new("out/ObjectIndex.js"), Path::new("out/results/ScoreBoard/getScores.js")),
            "./results/ScoreBoard/getScores.js"
        );
    }
}
