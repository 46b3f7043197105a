//! Line-oriented comma-delimited text handling.
//!
//! Two splitting modes exist. [`QuoteMode::Strip`] splits on every comma and
//! removes literal `"` characters afterwards, so a quoted comma still splits
//! the cell. [`QuoteMode::Track`] follows quote state character by character
//! and keeps quoted commas inside their cell.

use crate::table::QuoteMode;
use encoding_rs::UTF_8;
use std::borrow::Cow;
use tracing::warn;

/// Lines that are not blank after trimming, in order.
pub(crate) fn non_blank_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').filter(|line| !line.trim().is_empty())
}

/// Splits one line into trimmed cells.
pub(crate) fn split_line(line: &str, mode: QuoteMode) -> Vec<String> {
    match mode {
        QuoteMode::Strip => split_loose(line),
        QuoteMode::Track => split_quoted(line),
    }
}

fn split_loose(line: &str) -> Vec<String> {
    line.split(',')
        .map(|cell| cell.trim().replace('"', ""))
        .collect()
}

fn split_quoted(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if !in_quotes => in_quotes = true,
            '"' => {
                // "" inside quotes is a literal quote
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            ',' if !in_quotes => {
                cells.push(current.trim().to_owned());
                current.clear();
            }
            _ => current.push(c),
        }
    }

    cells.push(current.trim().to_owned());
    cells
}

/// Decodes uploaded text as UTF-8, dropping a byte order mark. Malformed
/// sequences become U+FFFD.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let (text, _, had_errors) = UTF_8.decode(bytes);
    if had_errors {
        warn!(size = bytes.len(), "text input is not valid UTF-8, replaced malformed sequences");
    }
    text
}

/// Quotes a field for export when it contains a comma.
pub(crate) fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains(',') {
        Cow::Owned(format!("\"{field}\""))
    } else {
        Cow::Borrowed(field)
    }
}
