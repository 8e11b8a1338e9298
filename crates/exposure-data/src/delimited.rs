//! Minimal delimited-text parsing and writing.
//!
//! Covers the subset of RFC 4180 the input tables actually use: quoted
//! fields, doubled quotes inside quoted fields, and CRLF line endings.
//! Fields spanning multiple lines are not supported.

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Split one line into fields on `delimiter`, honouring double-quoted fields.
///
/// A quote inside a quoted field is written as `""`. A trailing `\r` left
/// over from CRLF line endings is stripped before splitting.
pub fn split_line(line: &str, delimiter: char) -> Vec<String> {
    let line = line.strip_suffix('\r').unwrap_or(line);

    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    // Doubled quote → literal quote.
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else if c == '"' && current.is_empty() {
            in_quotes = true;
        } else if c == delimiter {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    fields.push(current);
    fields
}

// ── Writing ───────────────────────────────────────────────────────────────────

/// Join fields into one output line, quoting any field that needs it.
pub fn join_fields<S: AsRef<str>>(fields: &[S], delimiter: char) -> String {
    fields
        .iter()
        .map(|f| escape_field(f.as_ref(), delimiter))
        .collect::<Vec<_>>()
        .join(&delimiter.to_string())
}

/// Quote `field` when it contains the delimiter, a quote, or a newline.
fn escape_field(field: &str, delimiter: char) -> String {
    if field.contains(delimiter) || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
