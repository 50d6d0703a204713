//! Tuple splitter.
//!
//! Splits a VALUES body into row literals with a single forward scan and a
//! parenthesis-depth counter. A tuple ends exactly where depth returns to
//! zero after a `)`; the separator that follows is consumed.

use crate::error::ParseError;
use ahash::AHashSet;
use serde::{Deserialize, Serialize};

/// How the scanner treats single-quoted literals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanMode {
    /// Parentheses and commas inside `'...'` are data; `''` is an escaped quote
    #[default]
    QuoteAware,
    /// Every parenthesis counts, even inside literals
    Legacy,
}

impl std::str::FromStr for ScanMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quote-aware" | "quote_aware" => Ok(ScanMode::QuoteAware),
            "legacy" => Ok(ScanMode::Legacy),
            _ => Err(format!(
                "Unknown scan mode: {}. Valid options: quote-aware, legacy",
                s
            )),
        }
    }
}

impl std::fmt::Display for ScanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanMode::QuoteAware => write!(f, "quote-aware"),
            ScanMode::Legacy => write!(f, "legacy"),
        }
    }
}

/// Split a VALUES body into tuples, each including its own parentheses.
pub fn split_tuples(body: &str, mode: ScanMode) -> Result<Vec<&str>, ParseError> {
    let bytes = body.as_bytes();
    let mut tuples = Vec::new();
    let mut depth: usize = 0;
    let mut start = 0;
    let mut in_quote = false;
    let mut awaiting_separator = false;
    let mut pending_comma: Option<usize> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        if in_quote {
            if b == b'\'' {
                if bytes.get(i + 1) == Some(&b'\'') {
                    i += 2;
                    continue;
                }
                in_quote = false;
            }
            i += 1;
            continue;
        }

        match b {
            b'\'' if mode == ScanMode::QuoteAware && depth > 0 => in_quote = true,
            b'(' => {
                if depth == 0 {
                    if awaiting_separator {
                        return Err(ParseError::at("missing ',' between tuples", i));
                    }
                    start = i;
                    pending_comma = None;
                }
                depth += 1;
            }
            b')' => {
                if depth == 0 {
                    return Err(ParseError::at("unbalanced ')' outside any tuple", i));
                }
                depth -= 1;
                if depth == 0 {
                    tuples.push(&body[start..=i]);
                    awaiting_separator = true;
                }
            }
            b',' if depth == 0 => {
                if !awaiting_separator {
                    return Err(ParseError::at("unexpected ',' between tuples", i));
                }
                awaiting_separator = false;
                pending_comma = Some(i);
            }
            _ if depth == 0 && b.is_ascii_whitespace() => {}
            _ if depth == 0 => {
                return Err(ParseError::at(
                    format!("unexpected {:?} outside any tuple", b as char),
                    i,
                ));
            }
            _ => {}
        }
        i += 1;
    }

    if in_quote {
        return Err(ParseError::at("unterminated string literal", start));
    }
    if depth > 0 {
        return Err(ParseError::at("unterminated tuple", start));
    }
    if let Some(pos) = pending_comma {
        return Err(ParseError::at("trailing ',' after last tuple", pos));
    }
    Ok(tuples)
}

/// Split one tuple into its top-level fields, trimmed.
///
/// Always quote-aware; nested parentheses and brackets stay inside a field.
pub fn split_fields(tuple: &str) -> Result<Vec<&str>, ParseError> {
    let trimmed = tuple.trim();
    let inner = trimmed
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .ok_or_else(|| ParseError::new("tuple is not enclosed in parentheses"))?;

    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    let bytes = inner.as_bytes();
    let mut fields = Vec::new();
    let mut depth: usize = 0;
    let mut in_quote = false;
    let mut field_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if in_quote {
            if b == b'\'' {
                if bytes.get(i + 1) == Some(&b'\'') {
                    i += 2;
                    continue;
                }
                in_quote = false;
            }
            i += 1;
            continue;
        }
        match b {
            b'\'' => in_quote = true,
            b'(' | b'[' => depth += 1,
            b')' | b']' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                fields.push(inner[field_start..i].trim());
                field_start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if in_quote {
        return Err(ParseError::new("unterminated string literal in tuple"));
    }
    fields.push(inner[field_start..].trim());
    Ok(fields)
}

/// Reject the first tuple whose field count differs from `expected`.
pub fn check_arity<S: AsRef<str>>(tuples: &[S], expected: usize) -> Result<(), ParseError> {
    for (idx, tuple) in tuples.iter().enumerate() {
        let fields = split_fields(tuple.as_ref())
            .map_err(|e| ParseError::new(format!("tuple {}: {}", idx + 1, e.message)))?;
        if fields.len() != expected {
            return Err(ParseError::new(format!(
                "tuple {} has {} fields, expected {}",
                idx + 1,
                fields.len(),
                expected
            )));
        }
    }
    Ok(())
}

/// Primary keys (first field) that occur more than once, in order of first
/// repetition.
pub fn duplicate_ids<S: AsRef<str>>(tuples: &[S]) -> Vec<String> {
    let mut seen: AHashSet<&str> = AHashSet::new();
    let mut reported: AHashSet<&str> = AHashSet::new();
    let mut duplicates = Vec::new();

    for tuple in tuples {
        let Ok(fields) = split_fields(tuple.as_ref()) else {
            continue;
        };
        let Some(id) = fields.first().copied() else {
            continue;
        };
        if !seen.insert(id) && reported.insert(id) {
            duplicates.push(id.trim_matches('\'').to_string());
        }
    }
    duplicates
}
