//! JSON-ready shapes returned to callers: sheet views for display and
//! search responses for identifier lookups.
use crate::error::Result;
use crate::resolver::LookupResult;
use crate::resolver::SheetMatch;
use crate::table::csv::escape_field;
use crate::table::parse;
use crate::table::FileKind;
use crate::table::NormalizationPolicy;
use crate::table::Row;
use crate::table::Sheet;
use crate::upload::UploadedFile;
use serde::Serialize;
use tracing::debug;

/// One sheet prepared for display.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetView {
    pub file_name: String,
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub data: Vec<Row>,
    pub total_rows: usize,
}

impl SheetView {
    pub fn new(file_name: &str, sheet: &Sheet, policy: &NormalizationPolicy) -> Self {
        SheetView {
            file_name: file_name.to_owned(),
            sheet_name: sheet.name.to_owned(),
            columns: sheet.visible_columns(policy),
            data: sheet.rows.clone(),
            total_rows: sheet.rows.len(),
        }
    }

    /// Header line then one line per row, joined with `\n`. Values holding
    /// a comma are wrapped in double quotes.
    pub fn to_csv(&self) -> String {
        let mut lines = Vec::with_capacity(self.data.len() + 1);
        lines.push(self.columns.join(","));
        for row in &self.data {
            let cells: Vec<String> = self
                .columns
                .iter()
                .map(|column| {
                    let value = row.get(column).map(ToString::to_string).unwrap_or_default();
                    escape_field(&value).into_owned()
                })
                .collect();
            lines.push(cells.join(","));
        }
        lines.join("\n")
    }
}

/// Every non-empty sheet of a file, the first one singled out.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContents {
    pub success: bool,
    pub data: Option<SheetView>,
    pub all_sheets: Vec<SheetView>,
}

/// Parses a stored file into display views.
pub fn read_file(file_name: &str, bytes: &[u8], kind: FileKind, policy: &NormalizationPolicy) -> Result<FileContents> {
    let sheets = parse(bytes, kind, policy)?;
    let all_sheets: Vec<SheetView> = sheets
        .iter()
        .map(|sheet| SheetView::new(file_name, sheet, policy))
        .collect();
    debug!(file = file_name, sheets = all_sheets.len(), "read file for display");
    Ok(FileContents {
        success: true,
        data: all_sheets.first().cloned(),
        all_sheets,
    })
}

/// `data` is the row itself for one matching sheet, the per-sheet matches
/// otherwise.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SearchData {
    Single(Row),
    Multiple(Vec<SheetMatch>),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<SearchData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_sheets: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheets: Option<Vec<SheetMatch>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub searched_value: String,
}

impl SearchResponse {
    pub fn from_result(result: LookupResult, searched_value: &str) -> Self {
        let matches = match result {
            LookupResult::NotFound { searched_value } => {
                return SearchResponse {
                    success: false,
                    data: None,
                    multiple_sheets: None,
                    sheets: None,
                    error: Some(format!("No data found for ID: {searched_value}")),
                    searched_value,
                };
            }
            LookupResult::Found(found) => vec![found],
            LookupResult::Multiple(matches) => matches,
        };
        let data = match matches.as_slice() {
            [single] => SearchData::Single(single.data.clone()),
            _ => SearchData::Multiple(matches.clone()),
        };
        SearchResponse {
            success: true,
            data: Some(data),
            multiple_sheets: Some(matches.len() > 1),
            sheets: Some(matches),
            error: None,
            searched_value: searched_value.to_owned(),
        }
    }
}

/// Body for hard failures.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl ToString) -> Self {
        ErrorResponse {
            success: false,
            error: error.to_string(),
        }
    }
}

/// Recorded metadata of one upload.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetadataResponse {
    pub success: bool,
    pub file: UploadedFile,
}

impl MetadataResponse {
    pub fn new(file: UploadedFile) -> Self {
        MetadataResponse { success: true, file }
    }
}

/// Acknowledgement of a completed change.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl ToString) -> Self {
        MessageResponse {
            success: true,
            message: message.to_string(),
        }
    }
}
