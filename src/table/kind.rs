use crate::error::LookupError;
use serde::Deserialize;
use serde::Serialize;
use std::fmt::Display;
use std::path::Path;

const WORKBOOK_MIME_TYPES: [&str; 3] = [
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.oasis.opendocument.spreadsheet",
];
const WORKBOOK_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xls", "ods"];

/// Which parser a stored file is routed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Csv,
    Workbook,
    Other,
}

impl FileKind {
    /// Sniffs the kind from the MIME type and the file name extension.
    pub fn detect(file_name: &str, mime_type: &str) -> FileKind {
        let mime_type = mime_type.to_ascii_lowercase();
        let extension = Path::new(file_name)
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        if mime_type.contains("excel")
            || WORKBOOK_MIME_TYPES.contains(&mime_type.as_str())
            || WORKBOOK_EXTENSIONS.contains(&extension.as_str())
        {
            FileKind::Workbook
        } else if mime_type.contains("csv") || extension == "csv" {
            FileKind::Csv
        } else {
            FileKind::Other
        }
    }

    /// Parses a declared kind. Only `csv` and `workbook` are accepted.
    pub fn parse(declared: &str) -> Result<FileKind, LookupError> {
        match declared {
            "csv" => Ok(FileKind::Csv),
            "workbook" => Ok(FileKind::Workbook),
            other => Err(LookupError::UnsupportedKind {
                kind: other.to_owned(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Csv => "csv",
            FileKind::Workbook => "workbook",
            FileKind::Other => "other",
        }
    }
}

impl Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
