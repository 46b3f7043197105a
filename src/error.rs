use thiserror::Error;

/// Errors returned by parsing and byte sources.
///
/// "No row matched" is not an error: it is reported as
/// [`LookupResult::NotFound`](crate::resolver::LookupResult::NotFound).
#[derive(Error, Debug)]
pub enum LookupError {
    /// No usable rows remain after blank lines are filtered out.
    #[error("No data found in file")]
    EmptyInput,

    /// The bytes could not be decoded as a supported workbook.
    #[error("Unreadable workbook: {reason}")]
    UnreadableWorkbook { reason: String },

    /// The caller declared a file kind this crate does not parse.
    #[error("Unsupported file type '{kind}'")]
    UnsupportedKind { kind: String },

    /// The byte source could not deliver the file.
    #[error(transparent)]
    Source(#[from] crate::source::SourceError),
}

impl From<DecodeError> for LookupError {
    fn from(error: DecodeError) -> Self {
        LookupError::UnreadableWorkbook {
            reason: error.to_string(),
        }
    }
}

/// Result type for parsing and lookup operations.
pub type Result<T> = std::result::Result<T, LookupError>;

/// Aggregates everything that can go wrong while decoding a workbook archive.
/// Collapsed into [`LookupError::UnreadableWorkbook`] at the public boundary.
#[derive(Error, Debug)]
pub(crate) enum DecodeError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    #[error("{0}")]
    ParseFloatError(#[from] std::num::ParseFloatError),

    #[error("{0}")]
    StringEncodingError(#[from] std::str::Utf8Error),

    // Third-party library errors
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    // Helper and reader errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    #[error("{0}")]
    WorkbookError(#[from] crate::workbook::WorkbookError),
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for std::result::Result<T, DecodeError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| DecodeError::WithContextError(format!("{}: {}", message, e)))
    }
}
