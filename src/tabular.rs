use thiserror::Error;

/// First column name of the expected CMS header. Lines whose first field
/// equals this are treated as header repeats and dropped; the upstream
/// export has been observed to re-emit its header mid-file.
const HEADER_FIRST_COLUMN: &str = "NPI";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The payload had no data lines at all (empty, or header/blank lines
    /// only). Distinct from "rows present but all structurally invalid",
    /// which yields an empty row set without an error.
    #[error("tabular input had no usable rows")]
    EmptyInput,
}

/// One tokenized line. Ephemeral: produced by [`parse`], consumed by the
/// normalizer, then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub fields: Vec<String>,
    /// 1-based line number in the source text, for log messages.
    pub line_number: usize,
}

/// Parses a comma-delimited payload into rows.
///
/// Tolerates a UTF-8 BOM, `\r\n` line endings, blank lines, and repeated
/// header lines. Fields may be wrapped in single or double quotes, inside
/// which commas are literal; an unterminated quote is treated as closed at
/// end of line. The tokenizer does not trim whitespace; that is the
/// normalizer's job.
///
/// At most `max_rows` rows are returned; anything past the cap is silently
/// ignored. Rows with fewer than `min_columns` fields are logged and
/// skipped without aborting the batch.
pub fn parse(raw_text: &str, max_rows: usize, min_columns: usize) -> Result<Vec<RawRow>, ParseError> {
    let text = raw_text.strip_prefix('\u{feff}').unwrap_or(raw_text);

    let mut rows = Vec::new();
    let mut data_lines = 0usize;

    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        if rows.len() >= max_rows && data_lines > 0 {
            break;
        }

        let fields = tokenize_line(line);
        if fields
            .first()
            .is_some_and(|f| f.trim() == HEADER_FIRST_COLUMN)
        {
            continue;
        }
        data_lines += 1;

        if fields.len() < min_columns {
            tracing::warn!(
                "Skipping line {}: expected at least {} columns, got {}",
                idx + 1,
                min_columns,
                fields.len()
            );
            continue;
        }

        rows.push(RawRow {
            fields,
            line_number: idx + 1,
        });
    }

    if data_lines == 0 {
        return Err(ParseError::EmptyInput);
    }
    Ok(rows)
}

/// Character scanner for one line. Commas split fields unless inside a
/// quoted run; the quote character itself (either `'` or `"`) is consumed,
/// not emitted.
fn tokenize_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for ch in line.chars() {
        match quote {
            None if ch == '"' || ch == '\'' => quote = Some(ch),
            None if ch == ',' => {
                fields.push(std::mem::take(&mut current));
            }
            Some(q) if ch == q => quote = None,
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[&str]) -> String {
        fields.join(",")
    }

    fn wide_row(name: &str) -> String {
        let mut fields = vec![""; 30];
        fields[0] = "1234567890";
        fields[3] = name;
        row(&fields)
    }

    #[test]
    fn parse_is_idempotent() {
        let text = format!("{}\n{}\n", wide_row("SMITH"), wide_row("JONES"));
        let a = parse(&text, 1000, 29).unwrap();
        let b = parse(&text, 1000, 29).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn quoted_comma_stays_in_one_field() {
        let fields = tokenize_line(r#""Smith, John",MD"#);
        assert_eq!(fields, vec!["Smith, John", "MD"]);
    }

    #[test]
    fn single_quotes_also_guard_commas() {
        let fields = tokenize_line("'Richmond, VA',clinic");
        assert_eq!(fields, vec!["Richmond, VA", "clinic"]);
    }

    #[test]
    fn unterminated_quote_closes_at_end_of_line() {
        let fields = tokenize_line(r#"a,"b,c"#);
        assert_eq!(fields, vec!["a", "b,c"]);
    }

    #[test]
    fn tokenizer_does_not_trim() {
        let fields = tokenize_line(" a , b ");
        assert_eq!(fields, vec![" a ", " b "]);
    }

    #[test]
    fn row_cap_is_enforced() {
        let mut text = String::new();
        for i in 0..1500 {
            text.push_str(&wide_row(&format!("DOC{i}")));
            text.push('\n');
        }
        let rows = parse(&text, 1000, 29).unwrap();
        assert_eq!(rows.len(), 1000);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert_eq!(parse("", 1000, 29), Err(ParseError::EmptyInput));
        assert_eq!(parse("\n\n  \n", 1000, 29), Err(ParseError::EmptyInput));
    }

    #[test]
    fn header_only_input_is_an_error() {
        let header = "NPI,Ind_PAC_ID,Ind_enrl_ID,Provider Last Name";
        assert_eq!(parse(header, 1000, 29), Err(ParseError::EmptyInput));
    }

    #[test]
    fn header_repeats_are_dropped_mid_file() {
        let text = format!(
            "NPI,Ind_PAC_ID\n{}\nNPI,Ind_PAC_ID\n{}\n",
            wide_row("SMITH"),
            wide_row("JONES")
        );
        let rows = parse(&text, 1000, 29).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn short_rows_are_skipped_not_fatal() {
        let text = format!("a,b,c\n{}\n", wide_row("SMITH"));
        let rows = parse(&text, 1000, 29).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fields[3], "SMITH");
    }

    #[test]
    fn all_invalid_rows_yield_empty_ok() {
        let rows = parse("a,b,c\nd,e,f\n", 1000, 29).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn crlf_and_bom_are_tolerated() {
        let text = format!("\u{feff}{}\r\n{}\r\n", wide_row("SMITH"), wide_row("JONES"));
        let rows = parse(&text, 1000, 29).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].fields[0], "1234567890");
    }
}
