//! # Tabular Parser
//!
//! Turns raw CSV text or workbook bytes into [`Sheet`]s: a header list plus
//! ordered rows keyed by header name. Every entry point takes a
//! [`NormalizationPolicy`] that decides how blank rows, blank headers and
//! quotes are treated.
use crate::error::LookupError;
use crate::error::Result;
use crate::workbook::open_workbook;
use serde::ser::SerializeMap;
use serde::Serialize;
use serde::Serializer;
use tracing::debug;
use tracing::warn;

pub(crate) mod csv;
mod kind;
mod value;

pub use csv::decode_text;
pub use kind::FileKind;
pub use value::Value;

/// Name given to the single sheet produced from delimited text.
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// How double quotes in delimited text are handled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QuoteMode {
    /// Split on every comma, then remove `"` from each cell.
    #[default]
    Strip,
    /// Track quote state so quoted commas stay inside their cell.
    Track,
}

/// Normalization rules shared by the display and search entry points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NormalizationPolicy {
    /// Drop data rows whose cells are all blank.
    pub skip_blank_rows: bool,
    /// Leave synthesized `Column_<n>` headers out of displayed column lists.
    pub hide_blank_headers: bool,
    pub quotes: QuoteMode,
}

impl NormalizationPolicy {
    /// Rules for showing a file to a user.
    pub const fn display() -> Self {
        NormalizationPolicy {
            skip_blank_rows: true,
            hide_blank_headers: true,
            quotes: QuoteMode::Strip,
        }
    }

    /// Rules for identifier search. Blank CSV rows are kept and synthesized
    /// headers stay visible.
    pub const fn search() -> Self {
        NormalizationPolicy {
            skip_blank_rows: false,
            hide_blank_headers: false,
            quotes: QuoteMode::Strip,
        }
    }

    /// Rules for text fetched from a published Google Sheet.
    pub const fn url_import() -> Self {
        NormalizationPolicy {
            quotes: QuoteMode::Track,
            ..NormalizationPolicy::display()
        }
    }
}

impl Default for NormalizationPolicy {
    fn default() -> Self {
        NormalizationPolicy::display()
    }
}

/// One data row: column name to value, in column order. A name occurs at
/// most once; inserting an existing name replaces its value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    entries: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Row::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when every value is blank.
    pub fn is_blank(&self) -> bool {
        self.entries.iter().all(|(_, value)| value.is_blank())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut row = Row::new();
        for (column, value) in iter {
            row.insert(column, value);
        }
        row
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (column, value) in &self.entries {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// One tab of a workbook, or the whole of a CSV body.
#[derive(Clone, Debug, PartialEq)]
pub struct Sheet {
    pub name: String,
    /// Header names in order. Blank headers are named `Column_<n>`.
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    /// Which entries of `columns` were synthesized.
    synthesized: Vec<bool>,
}

impl Sheet {
    /// Builds a sheet from a header record and data records. Missing
    /// trailing cells become [`Value::Empty`]; cells past the header width
    /// are dropped.
    pub(crate) fn from_records<I>(name: &str, header: Vec<Value>, records: I, policy: &NormalizationPolicy) -> Sheet
    where
        I: IntoIterator<Item = Vec<Value>>,
    {
        let (columns, synthesized): (Vec<String>, Vec<bool>) = header
            .iter()
            .enumerate()
            .map(|(index, cell)| {
                if cell.is_blank() {
                    (format!("Column_{}", index + 1), true)
                } else {
                    (cell.to_string(), false)
                }
            })
            .unzip();

        let mut rows = Vec::new();
        let mut skipped = 0usize;
        let mut truncated = 0usize;
        for record in records {
            if record.len() > columns.len() && record[columns.len()..].iter().any(|cell| !cell.is_blank()) {
                truncated += 1;
            }
            let mut cells = record.into_iter();
            let row: Row = columns
                .iter()
                .map(|column| (column.as_str(), cells.next().unwrap_or_default()))
                .collect();
            if policy.skip_blank_rows && row.is_blank() {
                skipped += 1;
            } else {
                rows.push(row);
            }
        }

        if truncated > 0 {
            warn!(sheet = name, rows = truncated, "dropped cells beyond the header width");
        }
        debug!(
            sheet = name,
            columns = columns.len(),
            rows = rows.len(),
            skipped_blank_rows = skipped,
            "normalized sheet"
        );
        Sheet {
            name: name.to_owned(),
            columns,
            rows,
            synthesized,
        }
    }

    /// Column names to show under `policy`.
    pub fn visible_columns(&self, policy: &NormalizationPolicy) -> Vec<String> {
        self.columns
            .iter()
            .zip(&self.synthesized)
            .filter(|(_, synthesized)| !(policy.hide_blank_headers && **synthesized))
            .map(|(column, _)| column.to_owned())
            .collect()
    }
}

/// Parses comma-delimited text into a single sheet named `Sheet1`.
///
/// The first non-blank line is the header. Fails with
/// [`LookupError::EmptyInput`] when no non-blank line exists; a header with
/// no data lines is a sheet with zero rows.
pub fn parse_delimited_text(text: &str, policy: &NormalizationPolicy) -> Result<Sheet> {
    let mut lines = csv::non_blank_lines(text);
    let header = lines.next().ok_or(LookupError::EmptyInput)?;
    let header = to_record(csv::split_line(header, policy.quotes));
    let records = lines.map(|line| to_record(csv::split_line(line, policy.quotes)));
    Ok(Sheet::from_records(DEFAULT_SHEET_NAME, header, records, policy))
}

fn to_record(cells: Vec<String>) -> Vec<Value> {
    cells
        .into_iter()
        .map(|cell| if cell.is_empty() { Value::Empty } else { Value::Text(cell) })
        .collect()
}

/// Parses every non-empty worksheet of an xlsx or ods workbook, in workbook
/// order. The first non-empty row of each worksheet is its header.
pub fn parse_workbook(bytes: &[u8], policy: &NormalizationPolicy) -> Result<Vec<Sheet>> {
    let mut workbook = open_workbook(bytes)?;
    let grids = workbook.read_grids()?;
    let total = grids.len();
    let sheets: Vec<Sheet> = grids
        .into_iter()
        .filter(|grid| !grid.is_empty())
        .map(|grid| {
            let name = grid.name.to_owned();
            let mut records = grid.into_rows().into_iter();
            let header = records.next().unwrap_or_default();
            Sheet::from_records(&name, header, records, policy)
        })
        .collect();
    debug!(sheets = sheets.len(), empty = total - sheets.len(), "parsed workbook");
    Ok(sheets)
}

/// Parses `bytes` with the parser for `kind`.
pub fn parse(bytes: &[u8], kind: FileKind, policy: &NormalizationPolicy) -> Result<Vec<Sheet>> {
    match kind {
        FileKind::Csv => Ok(vec![parse_delimited_text(&decode_text(bytes), policy)?]),
        FileKind::Workbook => parse_workbook(bytes, policy),
        FileKind::Other => Err(LookupError::UnsupportedKind {
            kind: kind.to_string(),
        }),
    }
}

/// Parses `bytes` according to a declared kind, `"csv"` or `"workbook"`.
pub fn parse_declared(bytes: &[u8], declared_kind: &str, policy: &NormalizationPolicy) -> Result<Vec<Sheet>> {
    parse(bytes, FileKind::parse(declared_kind)?, policy)
}

/// Number of tabs in a workbook; delimited text always has one. A workbook
/// that cannot be opened counts as one sheet.
pub fn count_sheets(bytes: &[u8], kind: FileKind) -> usize {
    match kind {
        FileKind::Workbook => match open_workbook(bytes) {
            Ok(workbook) => workbook.sheet_names().len(),
            Err(error) => {
                warn!(%error, "could not read workbook for sheet count");
                1
            }
        },
        FileKind::Csv | FileKind::Other => 1,
    }
}
