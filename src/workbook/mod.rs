//! # Workbook Readers
//!
//! Decodes Office Open XML (`.xlsx`, `.xlsm`) and OpenDocument (`.ods`)
//! workbooks from an in-memory byte buffer into one [`Grid`] per worksheet.
//! The format is sniffed from the content, never from a file name.
use crate::error::DecodeError;
use crate::helpers::zip::ZipHelper;
use std::io::Cursor;
use thiserror::Error;
use tracing::debug;
use zip::ZipArchive;

pub(crate) mod cell;
pub(crate) mod grid;
pub(crate) mod ods;
pub(crate) mod reference;
pub(crate) mod xlsx;

pub(crate) use grid::Grid;

/// Compound File Binary header shared by legacy `.xls` and encrypted OOXML.
const CFB_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";

pub(crate) type ByteReader<'a> = Cursor<&'a [u8]>;

#[derive(Error, Debug)]
pub(crate) enum WorkbookError {
    #[error("Cannot detect workbook format")]
    UnknownFormat,

    #[error("Legacy binary or password protected workbooks are not supported")]
    CompoundDocument,

    #[error("Missing workbook part '{0}'")]
    MissingPart(String),

    #[error("Invalid ODS MIME type")]
    MimeType,

    #[error("Password protected workbook")]
    PasswordProtected,
}

/// A decoded workbook container.
pub(crate) trait Workbook {
    /// Tab names in workbook order.
    fn sheet_names(&self) -> Vec<String>;

    /// Reads every worksheet, in workbook order. Empty worksheets yield empty
    /// grids; dropping them is the caller's decision.
    fn read_grids(&mut self) -> Result<Vec<Grid>, DecodeError>;
}

/// Opens the workbook held in `bytes`, choosing the reader by content.
pub(crate) fn open_workbook(bytes: &[u8]) -> Result<Box<dyn Workbook + '_>, DecodeError> {
    if bytes.starts_with(&CFB_SIGNATURE) {
        Err(WorkbookError::CompoundDocument)?
    }
    if !bytes.starts_with(ZIP_SIGNATURE) {
        Err(WorkbookError::UnknownFormat)?
    }

    let zip = ZipArchive::new(Cursor::new(bytes))?;
    if zip.contains("xl/workbook.xml") {
        debug!(size = bytes.len(), "opening xlsx workbook");
        Ok(Box::new(xlsx::XlsxWorkbook::open(zip)?))
    } else if zip.contains("content.xml") {
        debug!(size = bytes.len(), "opening ods workbook");
        Ok(Box::new(ods::OdsWorkbook::open(zip)?))
    } else {
        Err(WorkbookError::UnknownFormat)?
    }
}
