//! `{param}` placeholder substitution for experiment templates.
//!
//! A placeholder is a brace-delimited identifier (`{nodes}`, `{run.size}`).
//! Anything else stays literal so shell text survives untouched: `${HOME}`,
//! `{ cmd; }` and a lone `}` are copied through. `{{` and `}}` produce single
//! braces.

use crate::errors::{BatcherError, ErrorInfo};
use crate::value::ParameterSample;

enum Piece<'a> {
    Text(&'a str),
    Brace(char),
    Param(&'a str),
}

fn is_placeholder_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

fn tokenize(template: &str) -> Vec<Piece<'_>> {
    let bytes = template.as_bytes();
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut idx = 0;
    while idx < bytes.len() {
        match bytes[idx] {
            b'{' if bytes.get(idx + 1) == Some(&b'{') => {
                pieces.push(Piece::Text(&template[start..idx]));
                pieces.push(Piece::Brace('{'));
                idx += 2;
                start = idx;
            }
            b'}' if bytes.get(idx + 1) == Some(&b'}') => {
                pieces.push(Piece::Text(&template[start..idx]));
                pieces.push(Piece::Brace('}'));
                idx += 2;
                start = idx;
            }
            b'{' if idx == 0 || bytes[idx - 1] != b'$' => {
                let close = template[idx + 1..].find('}').map(|off| idx + 1 + off);
                match close {
                    Some(end) if is_placeholder_name(&template[idx + 1..end]) => {
                        pieces.push(Piece::Text(&template[start..idx]));
                        pieces.push(Piece::Param(&template[idx + 1..end]));
                        idx = end + 1;
                        start = idx;
                    }
                    _ => idx += 1,
                }
            }
            _ => idx += 1,
        }
    }
    pieces.push(Piece::Text(&template[start..]));
    pieces
}

/// Drops every placeholder from `template`, keeping the literal text.
///
/// Separators left dangling at either end (`_`, `-`, `.`) are trimmed, so
/// `double_{n}` becomes `double`. Every sample of a template maps to the same
/// result.
pub fn strip_placeholders(template: &str) -> String {
    let mut out = String::with_capacity(template.len());
    for piece in tokenize(template) {
        match piece {
            Piece::Text(text) => out.push_str(text),
            Piece::Brace(brace) => out.push(brace),
            Piece::Param(_) => {}
        }
    }
    out.trim_matches(|c| matches!(c, '_' | '-' | '.')).to_string()
}

/// Substitutes every placeholder through `lookup`.
///
/// A placeholder the lookup cannot resolve is an error naming the parameter.
pub fn render<F>(template: &str, lookup: F) -> Result<String, BatcherError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len());
    for piece in tokenize(template) {
        match piece {
            Piece::Text(text) => out.push_str(text),
            Piece::Brace(brace) => out.push(brace),
            Piece::Param(name) => match lookup(name) {
                Some(value) => out.push_str(&value),
                None => {
                    return Err(BatcherError::Template(
                        ErrorInfo::new(
                            "template.missing_param",
                            format!("template references unknown parameter '{name}'"),
                        )
                        .with_context("param", name)
                        .with_context("template", template),
                    ))
                }
            },
        }
    }
    Ok(out)
}

/// Substitutes placeholders with the values bound in `sample`.
pub fn render_sample(template: &str, sample: &ParameterSample) -> Result<String, BatcherError> {
    render(template, |name| sample.get(name).map(|value| value.to_string()))
}
