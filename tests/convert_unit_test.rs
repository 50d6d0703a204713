//! Unit tests for the literal transformer and tuple splitter, driven by
//! generated REURB dumps.

use reurb_seed::convert::{
    check_arity, parse_dump, prepare, split_fields, split_tuples, ArrayMode, ScanMode,
    TransformOptions,
};
use reurb_seed::model::PROPERTY_COLUMNS;
use test_data_gen::{ArrayQuoting, DumpOptions, Generator, Scale};

fn options(arrays: ArrayMode) -> TransformOptions {
    TransformOptions { arrays }
}

fn generated_dump(tricky: bool, dump: DumpOptions) -> String {
    let mut gen = Generator::new(7, Scale::Small).with_tricky_text(tricky);
    gen.generate().render_dump(&dump)
}

/// Decode a quoted SQL literal field: strip the quotes, unescape `''`.
fn unquote(field: &str) -> String {
    field
        .strip_prefix('\'')
        .and_then(|f| f.strip_suffix('\''))
        .unwrap_or(field)
        .replace("''", "'")
}

#[test]
fn test_literal_rewrite_example() {
    let sql = "INSERT INTO \"public\".\"t\" VALUES ('a', ARRAY[1,2,3], 'true'), ('b', ARRAY[], 'false');";
    let body = prepare(sql, &options(ArrayMode::Json)).unwrap();
    let tuples = split_tuples(&body, ScanMode::QuoteAware).unwrap();
    assert_eq!(tuples, vec!["('a', '[1,2,3]', 1)", "('b', '[]', 0)"]);

    let body = prepare(sql, &options(ArrayMode::Verbatim)).unwrap();
    let tuples = split_tuples(&body, ScanMode::Legacy).unwrap();
    assert_eq!(tuples, vec!["('a', '[1,2,3]', 1)", "('b', '[]', 0)"]);
}

#[test]
fn test_split_then_rejoin_reproduces_body() {
    let dump = generated_dump(true, DumpOptions::default());
    let body = prepare(&dump, &options(ArrayMode::Json)).unwrap();
    let tuples = split_tuples(&body, ScanMode::QuoteAware).unwrap();
    assert_eq!(tuples.len(), 48);

    // Removing the tuples in order leaves only separators
    let mut pos = 0;
    for tuple in &tuples {
        let idx = body[pos..].find(tuple).unwrap();
        assert!(body[pos..pos + idx]
            .chars()
            .all(|c| c == ',' || c.is_whitespace()));
        pos += idx + tuple.len();
    }
    assert!(body[pos..].trim().is_empty());

    // Rejoining and splitting again is stable
    let rejoined = tuples.join(",\n");
    assert_eq!(split_tuples(&rejoined, ScanMode::QuoteAware).unwrap(), tuples);
}

#[test]
fn test_depth_zero_only_at_boundaries() {
    let dump = generated_dump(true, DumpOptions::default());
    let body = prepare(&dump, &options(ArrayMode::Json)).unwrap();

    for tuple in split_tuples(&body, ScanMode::QuoteAware).unwrap() {
        assert!(tuple.starts_with('(') && tuple.ends_with(')'));
        let mut depth = 0i32;
        let mut in_quote = false;
        for (i, c) in tuple.char_indices() {
            match c {
                '\'' => in_quote = !in_quote,
                '(' if !in_quote => depth += 1,
                ')' if !in_quote => {
                    depth -= 1;
                    assert!(depth >= 0);
                    if depth == 0 {
                        assert_eq!(i, tuple.len() - 1, "depth hit zero inside {tuple}");
                    }
                }
                _ => {}
            }
        }
        assert_eq!(depth, 0);
    }
}

#[test]
fn test_every_generated_tuple_has_24_fields() {
    let dump = generated_dump(false, DumpOptions::default());
    let tuples = parse_dump(&dump, ScanMode::QuoteAware, &options(ArrayMode::Json)).unwrap();
    assert_eq!(tuples.len(), 48);
    assert!(check_arity(&tuples, PROPERTY_COLUMNS.len()).is_ok());
}

#[test]
fn test_row_per_line_dump_splits_identically() {
    let single = generated_dump(false, DumpOptions::default());
    let per_line = generated_dump(
        false,
        DumpOptions {
            row_per_line: true,
            ..Default::default()
        },
    );
    let a = parse_dump(&single, ScanMode::QuoteAware, &options(ArrayMode::Json)).unwrap();
    let b = parse_dump(&per_line, ScanMode::QuoteAware, &options(ArrayMode::Json)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_scan_modes_diverge_on_unbalanced_literal() {
    let mut fields = vec!["'p1'".to_string(), "'q1'".to_string(), "'Lote 1'".to_string()];
    fields.push("'120.00'".to_string());
    fields.push("'Obs: muro do lado direito)'".to_string());
    fields.extend((5..24).map(|_| "NULL".to_string()));
    let row = format!("({})", fields.join(", "));
    let dump = format!("INSERT INTO reurb_properties VALUES {}, {};", row, row.replace("p1", "p2"));

    let quote_aware = parse_dump(&dump, ScanMode::QuoteAware, &options(ArrayMode::Json)).unwrap();
    assert_eq!(quote_aware.len(), 2);

    let legacy = parse_dump(&dump, ScanMode::Legacy, &options(ArrayMode::Json));
    assert!(legacy.is_err());
}

#[test]
fn test_json_array_mode_yields_valid_json() {
    let dump = generated_dump(false, DumpOptions::default());
    let tuples = parse_dump(&dump, ScanMode::QuoteAware, &options(ArrayMode::Json)).unwrap();

    for tuple in &tuples {
        let fields = split_fields(tuple).unwrap();
        for column in ["images", "documentos_comprobatorios"] {
            let idx = PROPERTY_COLUMNS.iter().position(|c| *c == column).unwrap();
            let items: Vec<String> = serde_json::from_str(&unquote(fields[idx])).unwrap();
            if column == "documentos_comprobatorios" {
                assert!(!items.is_empty());
            }
        }
    }
}

#[test]
fn test_verbatim_array_mode_keeps_raw_items() {
    let dump = generated_dump(false, DumpOptions::default());
    let tuples = parse_dump(&dump, ScanMode::QuoteAware, &options(ArrayMode::Verbatim)).unwrap();
    assert_eq!(tuples.len(), 48);

    // Single-quoted items are carried through untouched, which is not JSON
    let fields = split_fields(&tuples[0]).unwrap();
    assert!(fields[14].starts_with("'['"));
    assert!(serde_json::from_str::<Vec<String>>(&unquote(fields[14])).is_err());
}

#[test]
fn test_double_quoted_arrays_identical_in_both_modes() {
    let dump = generated_dump(
        false,
        DumpOptions {
            arrays: ArrayQuoting::Double,
            ..Default::default()
        },
    );
    let json = parse_dump(&dump, ScanMode::QuoteAware, &options(ArrayMode::Json)).unwrap();
    let verbatim = parse_dump(&dump, ScanMode::QuoteAware, &options(ArrayMode::Verbatim)).unwrap();
    assert_eq!(json, verbatim);

    let fields = split_fields(&json[0]).unwrap();
    let docs: Vec<String> = serde_json::from_str(&unquote(fields[14])).unwrap();
    assert!(!docs.is_empty());
}

#[test]
fn test_missing_values_clause_is_parse_error() {
    let err = parse_dump(
        "INSERT INTO reurb_properties SELECT * FROM other;",
        ScanMode::QuoteAware,
        &options(ArrayMode::Json),
    )
    .unwrap_err();
    assert!(err.message.contains("VALUES"));
}

/// One 24-column row whose description (column 4) is `description`.
fn row_with_description(id: &str, description: &str) -> String {
    let mut fields = vec![
        format!("'{}'", id),
        "'q1'".to_string(),
        "'Lote 1'".to_string(),
        "'120.00'".to_string(),
        description.to_string(),
    ];
    fields.extend((5..24).map(|_| "NULL".to_string()));
    format!("({})", fields.join(", "))
}

#[test]
fn test_quoted_boolean_words_inside_text_survive() {
    let description = "'ele disse ''true'' e depois ''false'''";
    let dump = format!(
        "INSERT INTO reurb_properties VALUES {};",
        row_with_description("p1", description)
    );
    let tuples = parse_dump(&dump, ScanMode::QuoteAware, &options(ArrayMode::Json)).unwrap();
    let fields = split_fields(&tuples[0]).unwrap();
    assert_eq!(fields.len(), PROPERTY_COLUMNS.len());
    assert_eq!(fields[4], description);
    assert_eq!(unquote(fields[4]), "ele disse 'true' e depois 'false'");
}

#[test]
fn test_insert_text_inside_values_survives() {
    let description = "'pedido: insert into public.cadastro'";
    let dump = format!(
        "INSERT INTO public.reurb_properties VALUES {};",
        row_with_description("p1", description)
    );
    for arrays in [ArrayMode::Json, ArrayMode::Verbatim] {
        let tuples = parse_dump(&dump, ScanMode::QuoteAware, &options(arrays)).unwrap();
        let fields = split_fields(&tuples[0]).unwrap();
        assert_eq!(fields[4], description);
    }
}

#[test]
fn test_values_inside_leading_comment_ignored() {
    let dump = format!(
        "-- values exported from production; keep\nINSERT INTO reurb_properties VALUES {};",
        row_with_description("p1", "'x'")
    );
    let tuples = parse_dump(&dump, ScanMode::QuoteAware, &options(ArrayMode::Json)).unwrap();
    assert_eq!(tuples.len(), 1);
    assert!(tuples[0].starts_with("('p1'"));
}
