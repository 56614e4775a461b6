use std::fs;
use std::path::Path;

use batcher_core::errors::{BatcherError, ErrorInfo};
use serde_json::Value;

/// Removes `#` comments that appear outside of string literals.
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut in_comment = false;
    for c in text.chars() {
        if in_comment {
            if c == '\n' {
                in_comment = false;
                out.push(c);
            }
            continue;
        }
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '#' => in_comment = true,
            '"' => {
                in_string = true;
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Reads a JSON description that may contain `#` line comments.
pub fn read_description(path: &Path) -> Result<Value, BatcherError> {
    let text = fs::read_to_string(path).map_err(|err| {
        BatcherError::Spec(
            ErrorInfo::new("spec.read", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })?;
    serde_json::from_str(&strip_comments(&text)).map_err(|err| {
        BatcherError::Spec(
            ErrorInfo::new("spec.parse", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_inside_strings_survive() {
        let text = "{\n  # a comment\n  \"bin\": \"echo #1\" # trailing\n}\n";
        let value: Value = serde_json::from_str(&strip_comments(text)).unwrap();
        assert_eq!(value["bin"], "echo #1");
    }

    #[test]
    fn escaped_quotes_do_not_end_strings() {
        let text = r##"{"bin": "say \"#hi\"" # done
}"##;
        let value: Value = serde_json::from_str(&strip_comments(text)).unwrap();
        assert_eq!(value["bin"], "say \"#hi\"");
    }
}
