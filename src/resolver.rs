//! # Identifier Resolver
//!
//! Finds the row whose identifier column matches a search value, across one
//! or more parsed sheets.
use crate::logging::redact_value;
use crate::table::Row;
use crate::table::Sheet;
use serde::Serialize;
use tracing::debug;
use tracing::info;

/// Header spellings recognised as the identifier column, compared exactly.
pub const IDENTIFIER_SPELLINGS: [&str; 4] = ["id", "ID", "Id", "iD"];

/// The column used as lookup key: the first column spelled like an id, else
/// the first column. `None` only for a sheet without columns.
pub fn identifier_column(columns: &[String]) -> Option<&str> {
    columns
        .iter()
        .find(|column| IDENTIFIER_SPELLINGS.contains(&column.as_str()))
        .or_else(|| columns.first())
        .map(String::as_str)
}

/// The first matching row of one sheet.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetMatch {
    pub sheet_name: String,
    pub data: Row,
    pub searched_column: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LookupResult {
    /// Exactly one sheet matched.
    Found(SheetMatch),
    /// Several sheets matched, in sheet order.
    Multiple(Vec<SheetMatch>),
    /// No sheet matched; carries the search value as given.
    NotFound { searched_value: String },
}

impl LookupResult {
    pub fn is_found(&self) -> bool {
        !matches!(self, LookupResult::NotFound { .. })
    }

    /// Matches in sheet order, empty when nothing matched.
    pub fn matches(&self) -> &[SheetMatch] {
        match self {
            LookupResult::Found(found) => std::slice::from_ref(found),
            LookupResult::Multiple(matches) => matches,
            LookupResult::NotFound { .. } => &[],
        }
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Scans `sheets` in order and keeps the first matching row of each.
///
/// Both sides are trimmed and lowercased before comparison. There is no
/// index; every call scans every row.
pub fn resolve(sheets: &[Sheet], search_value: &str) -> LookupResult {
    let target = normalize(search_value);
    let mut matches = Vec::new();
    for sheet in sheets {
        let Some(column) = identifier_column(&sheet.columns) else {
            continue;
        };
        let found = sheet.rows.iter().find(|row| {
            row.get(column)
                .map(|value| normalize(&value.to_string()) == target)
                .unwrap_or(false)
        });
        if let Some(row) = found {
            debug!(sheet = sheet.name.as_str(), column, "identifier matched");
            matches.push(SheetMatch {
                sheet_name: sheet.name.to_owned(),
                data: row.clone(),
                searched_column: column.to_owned(),
            });
        }
    }

    info!(
        value = %redact_value(search_value),
        sheets = sheets.len(),
        matched = matches.len(),
        "identifier lookup"
    );
    match matches.len() {
        0 => LookupResult::NotFound {
            searched_value: search_value.to_owned(),
        },
        1 => LookupResult::Found(matches.remove(0)),
        _ => LookupResult::Multiple(matches),
    }
}
