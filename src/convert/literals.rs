//! Literal transformer.
//!
//! Rewrites an exported PostgreSQL insert into the store's dialect: the
//! schema qualifier is dropped, the verb becomes an upsert, `ARRAY[...]`
//! literals become quoted bracketed strings and quoted booleans become
//! integers. The passes are independent and run in that order; the first
//! two only touch the header before `VALUES`, the last two only the rows.

use crate::error::ParseError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Upsert verb of the target store (replace on primary-key conflict)
pub const UPSERT_VERB: &str = "INSERT OR REPLACE INTO";

/// `"public".` or `public.` before the table name of an insert header
static SCHEMA_QUALIFIER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\b(INSERT\s+(?:OR\s+REPLACE\s+)?INTO\s+)(?:"[^"]+"|[A-Za-z_][A-Za-z0-9_]*)\s*\.\s*"#,
    )
    .unwrap()
});

/// Plain insert verb; already-upsert headers don't match
static INSERT_VERB_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bINSERT\s+INTO\b").unwrap());

static VERBATIM_ARRAY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)ARRAY\[(.*?)\]").unwrap());

/// Column list of the insert header: `INSERT ... INTO <table> (<cols>) VALUES`
static HEADER_COLUMNS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)\bINTO\s+(?:"[^"]+"|[A-Za-z_][A-Za-z0-9_]*)(?:\s*\.\s*(?:"[^"]+"|[A-Za-z_][A-Za-z0-9_]*))?\s*\(([^)]*)\)\s*VALUES"#)
        .unwrap()
});

/// How `ARRAY[...]` items are carried into the quoted bracketed string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrayMode {
    /// String items become JSON strings, `NULL` becomes `null`; the result
    /// is always a valid JSON array.
    #[default]
    Json,
    /// Items pass through untouched, matching seed files produced by
    /// earlier tooling. Lossy for string items.
    Verbatim,
}

impl std::str::FromStr for ArrayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ArrayMode::Json),
            "verbatim" => Ok(ArrayMode::Verbatim),
            _ => Err(format!(
                "Unknown array mode: {}. Valid options: json, verbatim",
                s
            )),
        }
    }
}

impl std::fmt::Display for ArrayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArrayMode::Json => write!(f, "json"),
            ArrayMode::Verbatim => write!(f, "verbatim"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TransformOptions {
    pub arrays: ArrayMode,
}

/// Apply all literal passes to the dump text.
///
/// The header passes see only the text before the `VALUES` keyword, the
/// value passes only the text from it on.
pub fn transform(text: &str, options: &TransformOptions) -> Result<String, ParseError> {
    let split = find_values_keyword(text).unwrap_or(text.len());
    let (header, body) = text.split_at(split);

    let mut out = to_upsert(&strip_schema_qualifier(header));
    let body = match options.arrays {
        ArrayMode::Json => rewrite_arrays_json(body),
        ArrayMode::Verbatim => rewrite_arrays_verbatim(body),
    }
    .map_err(|mut e| {
        e.offset = e.offset.map(|o| o + split);
        e
    })?;
    out.push_str(&rewrite_booleans(&body));
    Ok(out)
}

/// Text between the `VALUES` keyword and the last `;`.
pub fn extract_values(text: &str) -> Result<&str, ParseError> {
    let start =
        find_values_keyword(text).ok_or_else(|| ParseError::new("no VALUES clause found"))?;
    let rest = &text[start + "VALUES".len()..];
    let end = rest
        .rfind(';')
        .ok_or_else(|| ParseError::new("VALUES clause is not terminated by ';'"))?;
    Ok(rest[..end].trim_start())
}

/// Offset of the first `VALUES` keyword outside quotes and `--` comments.
pub fn find_values_keyword(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'\'' | b'"') => {
                // a doubled quote closes and reopens
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    i += 1;
                }
                i += 1;
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b if is_word_byte(b) => {
                let start = i;
                while i < bytes.len() && is_word_byte(bytes[i]) {
                    i += 1;
                }
                if text[start..i].eq_ignore_ascii_case("VALUES") {
                    return Some(start);
                }
            }
            _ => i += 1,
        }
    }
    None
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// [`transform`] followed by [`extract_values`].
pub fn prepare(text: &str, options: &TransformOptions) -> Result<String, ParseError> {
    let transformed = transform(text, options)?;
    extract_values(&transformed).map(str::to_string)
}

/// Unquoted column names from the insert header, if it lists any.
pub fn header_columns(text: &str) -> Option<Vec<String>> {
    let header = &text[..find_values_keyword(text)? + "VALUES".len()];
    let caps = HEADER_COLUMNS_RE.captures(header)?;
    let list = caps.get(1)?.as_str();
    Some(
        list.split(',')
            .map(|c| c.trim().trim_matches('"').trim_matches('`').to_string())
            .filter(|c| !c.is_empty())
            .collect(),
    )
}

pub fn strip_schema_qualifier(text: &str) -> String {
    SCHEMA_QUALIFIER_RE.replace_all(text, "${1}").into_owned()
}

pub fn to_upsert(text: &str) -> String {
    INSERT_VERB_RE.replace_all(text, UPSERT_VERB).into_owned()
}

/// Replace literals that are exactly `'true'` or `'false'` with `1`/`0`.
/// Longer text containing those words, escaped quotes included, is kept.
pub fn rewrite_booleans(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'\'' {
            i += 1;
            continue;
        }
        let end = literal_end(bytes, i);
        let replacement = match &text[i..end] {
            "'true'" => Some("1"),
            "'false'" => Some("0"),
            _ => None,
        };
        if let Some(r) = replacement {
            out.push_str(&text[copied..i]);
            out.push_str(r);
            copied = end;
        }
        i = end;
    }
    out.push_str(&text[copied..]);
    out
}

/// Offset past the single-quoted literal opening at `start`. An
/// unterminated literal runs to the end; the tuple splitter reports it.
fn literal_end(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            if bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

fn rewrite_arrays_verbatim(text: &str) -> Result<String, ParseError> {
    let out = VERBATIM_ARRAY_RE.replace_all(text, "'[$1]'").into_owned();
    if let Some(pos) = out.find("ARRAY[") {
        return Err(ParseError::at("unterminated ARRAY[ literal", pos));
    }
    Ok(out)
}

/// Rewrite `ARRAY[...]` outside string literals into a quoted JSON array.
fn rewrite_arrays_json(text: &str) -> Result<String, ParseError> {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut in_quote = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\'' {
            in_quote = !in_quote;
            i += 1;
            continue;
        }
        if !in_quote && is_array_start(bytes, i) {
            out.push_str(&text[copied..i]);
            let (json, end) = array_to_json(text, i + 6)?;
            out.push('\'');
            out.push_str(&json.replace('\'', "''"));
            out.push('\'');
            i = end;
            copied = end;
            continue;
        }
        i += 1;
    }
    out.push_str(&text[copied..]);
    Ok(out)
}

fn is_array_start(bytes: &[u8], i: usize) -> bool {
    bytes.len() >= i + 6
        && bytes[i..i + 5].eq_ignore_ascii_case(b"ARRAY")
        && bytes[i + 5] == b'['
        && (i == 0 || !(bytes[i - 1].is_ascii_alphanumeric() || bytes[i - 1] == b'_'))
}

/// Convert the array body starting at `start` (just past `ARRAY[`).
///
/// Returns the bracketed JSON text and the offset just past the closing `]`.
/// Whitespace, separators and numeric tokens are copied as-is so numeric
/// arrays render exactly as in verbatim mode.
fn array_to_json(text: &str, start: usize) -> Result<(String, usize), ParseError> {
    let bytes = text.as_bytes();
    let mut out = String::from("[");
    let mut depth = 0usize;
    let mut i = start;

    loop {
        let Some(&b) = bytes.get(i) else {
            return Err(ParseError::at("unterminated ARRAY[ literal", start - 6));
        };
        match b {
            b']' if depth == 0 => {
                out.push(']');
                return Ok((out, i + 1));
            }
            b']' => {
                depth -= 1;
                out.push(']');
                i += 1;
            }
            b'[' => {
                depth += 1;
                out.push('[');
                i += 1;
            }
            b'\'' => {
                let (value, end) = sql_string(text, i)?;
                out.push_str(&serde_json::Value::String(value).to_string());
                i = end;
            }
            b'"' => {
                let end = json_string_end(bytes, i)?;
                out.push_str(&text[i..end]);
                i = end;
            }
            b',' => {
                out.push(',');
                i += 1;
            }
            b if b.is_ascii_whitespace() => {
                out.push(b as char);
                i += 1;
            }
            _ => {
                let end = bytes[i..]
                    .iter()
                    .position(|c| matches!(c, b',' | b']' | b'[') || c.is_ascii_whitespace())
                    .map(|p| i + p)
                    .unwrap_or(bytes.len());
                let token = &text[i..end];
                if token.eq_ignore_ascii_case("NULL") {
                    out.push_str("null");
                } else {
                    out.push_str(token);
                }
                i = end;
            }
        }
    }
}

/// Decode the single-quoted literal at `start`, returning its value and
/// the offset past the closing quote.
fn sql_string(text: &str, start: usize) -> Result<(String, usize), ParseError> {
    let bytes = text.as_bytes();
    let mut value = String::new();
    let mut seg = start + 1;
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            value.push_str(&text[seg..i]);
            if bytes.get(i + 1) == Some(&b'\'') {
                value.push('\'');
                i += 2;
                seg = i;
                continue;
            }
            return Ok((value, i + 1));
        }
        i += 1;
    }
    Err(ParseError::at("unterminated string inside ARRAY[ literal", start))
}

/// Offset past the closing quote of the double-quoted item at `start`.
fn json_string_end(bytes: &[u8], start: usize) -> Result<usize, ParseError> {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Ok(i + 1),
            _ => i += 1,
        }
    }
    Err(ParseError::at("unterminated string inside ARRAY[ literal", start))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json() -> TransformOptions {
        TransformOptions {
            arrays: ArrayMode::Json,
        }
    }

    fn verbatim() -> TransformOptions {
        TransformOptions {
            arrays: ArrayMode::Verbatim,
        }
    }

    #[test]
    fn test_schema_qualifier_removed() {
        let sql = r#"INSERT INTO "public"."reurb_properties" ("id") VALUES ('a');"#;
        assert_eq!(
            strip_schema_qualifier(sql),
            r#"INSERT INTO "reurb_properties" ("id") VALUES ('a');"#
        );
        assert_eq!(
            strip_schema_qualifier("insert into public.t values (1);"),
            "insert into t values (1);"
        );
    }

    #[test]
    fn test_upsert_verb() {
        assert_eq!(to_upsert("INSERT INTO t VALUES (1);"), "INSERT OR REPLACE INTO t VALUES (1);");
        assert_eq!(
            to_upsert("INSERT OR REPLACE INTO t VALUES (1);"),
            "INSERT OR REPLACE INTO t VALUES (1);"
        );
    }

    #[test]
    fn test_numeric_arrays_identical_in_both_modes() {
        let sql = "VALUES ('a', ARRAY[1,2,3], ARRAY[], ARRAY[4, 5]);";
        let a = transform(sql, &json()).unwrap();
        let b = transform(sql, &verbatim()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, "VALUES ('a', '[1,2,3]', '[]', '[4, 5]');");
    }

    #[test]
    fn test_string_arrays_json_mode() {
        let sql = "VALUES (ARRAY['RG', 'it''s', NULL]);";
        let out = transform(sql, &json()).unwrap();
        assert_eq!(out, r#"VALUES ('["RG", "it''s", null]');"#);
    }

    #[test]
    fn test_string_arrays_verbatim_mode_is_lossy() {
        let sql = "VALUES (ARRAY['RG', 'CPF']);";
        let out = transform(sql, &verbatim()).unwrap();
        assert_eq!(out, "VALUES ('['RG', 'CPF']');");
    }

    #[test]
    fn test_double_quoted_items_kept() {
        let sql = r#"VALUES (ARRAY["a.jpg", "b.jpg"]);"#;
        let out = transform(sql, &json()).unwrap();
        assert_eq!(out, r#"VALUES ('["a.jpg", "b.jpg"]');"#);
    }

    #[test]
    fn test_array_text_inside_literal_untouched() {
        let sql = "VALUES ('see ARRAY[1] docs', ARRAY[2]);";
        let out = transform(sql, &json()).unwrap();
        assert_eq!(out, "VALUES ('see ARRAY[1] docs', '[2]');");
    }

    #[test]
    fn test_unterminated_array_is_error() {
        let err = transform("VALUES (ARRAY[1, 2);", &json()).unwrap_err();
        assert!(err.message.contains("unterminated ARRAY["));
        assert!(transform("VALUES (ARRAY[1, 2);", &verbatim()).is_err());
    }

    #[test]
    fn test_unterminated_string_in_array_is_error() {
        let err = transform("VALUES (ARRAY['abc]);", &json()).unwrap_err();
        assert!(err.message.contains("unterminated string"));
    }

    #[test]
    fn test_booleans() {
        assert_eq!(rewrite_booleans("('a', 'true', 'false')"), "('a', 1, 0)");
    }

    #[test]
    fn test_booleans_inside_text_untouched() {
        let body = "('ele disse ''true'' ontem', 'true', 'false positive', '''false''')";
        assert_eq!(
            rewrite_booleans(body),
            "('ele disse ''true'' ontem', 1, 'false positive', '''false''')"
        );
    }

    #[test]
    fn test_header_passes_skip_values() {
        let sql = "INSERT INTO public.reurb_properties VALUES ('pedido: insert into public.cadastro');";
        assert_eq!(
            transform(sql, &json()).unwrap(),
            "INSERT OR REPLACE INTO reurb_properties VALUES ('pedido: insert into public.cadastro');"
        );
    }

    #[test]
    fn test_values_keyword_skips_comments_and_identifiers() {
        let sql = "-- exported VALUES; do not edit\nINSERT INTO t (\"values\", revalues) VALUES (1);";
        let pos = find_values_keyword(sql).unwrap();
        assert!(sql[pos..].starts_with("VALUES (1)"));
        assert_eq!(extract_values(sql).unwrap(), "(1)");
        assert_eq!(
            header_columns(sql),
            Some(vec!["values".to_string(), "revalues".to_string()])
        );
    }

    #[test]
    fn test_array_error_offset_counts_from_statement_start() {
        let sql = "INSERT INTO t VALUES (ARRAY[1, 2);";
        let err = transform(sql, &json()).unwrap_err();
        assert_eq!(err.offset, sql.find("ARRAY"));
    }

    #[test]
    fn test_literal_rewrite_example() {
        let sql = "VALUES ('a', ARRAY[1,2,3], 'true'), ('b', ARRAY[], 'false');";
        let body = prepare(sql, &json()).unwrap();
        assert_eq!(body, "('a', '[1,2,3]', 1), ('b', '[]', 0)");
    }

    #[test]
    fn test_missing_values_is_error() {
        assert!(extract_values("INSERT INTO t (a) SELECT 1;").is_err());
        assert!(extract_values("INSERT INTO t VALUES (1)").is_err());
    }

    #[test]
    fn test_header_columns() {
        let sql = r#"INSERT INTO "public"."reurb_properties" ("id", "quadra_id") VALUES ('a', 'b');"#;
        assert_eq!(
            header_columns(sql),
            Some(vec!["id".to_string(), "quadra_id".to_string()])
        );
        assert_eq!(header_columns("INSERT INTO t VALUES (1);"), None);
    }
}
