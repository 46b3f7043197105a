//! Accepting uploaded files into a [`FileStore`].
//!
//! An upload is checked against the allowed types, written under
//! `uploads/` with a timestamped name, and described by an
//! [`UploadedFile`] record stored next to it as JSON.
use crate::source::ByteSource;
use crate::source::FileStore;
use crate::source::SourceError;
use crate::table::count_sheets;
use crate::table::FileKind;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use tracing::warn;

/// Directory, relative to the store root, that receives uploads.
pub const UPLOAD_DIRECTORY: &str = "uploads";

pub const ALLOWED_MIME_TYPES: [&str; 4] = [
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "text/csv",
    "application/csv",
];
const ALLOWED_EXTENSIONS: [&str; 3] = [".xlsx", ".xls", ".csv"];
const METADATA_SUFFIX: &str = ".json";

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("No file provided")]
    EmptyFile,

    #[error("Invalid file type. Only Excel (.xlsx, .xls) and CSV files are allowed.")]
    InvalidFileType,

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Invalid upload metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// Metadata kept for every stored upload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    /// `<timestamp>_<sanitized name>`
    pub filename: String,
    pub original_name: String,
    /// Store reference, `uploads/<filename>`
    pub file_path: String,
    pub file_size: u64,
    pub mime_type: String,
    pub upload_date: DateTime<Utc>,
    pub file_type: FileKind,
    pub sheet_count: usize,
}

/// Accepts a file whose MIME type is allowed or whose name ends in
/// `.xlsx`, `.xls` or `.csv`.
pub fn validate_upload(file_name: &str, mime_type: &str) -> Result<(), UploadError> {
    let name = file_name.to_ascii_lowercase();
    if ALLOWED_MIME_TYPES.contains(&mime_type) || ALLOWED_EXTENSIONS.iter().any(|extension| name.ends_with(extension)) {
        Ok(())
    } else {
        Err(UploadError::InvalidFileType)
    }
}

/// Store reference for an upload: `uploads/<timestamp>_<name>`, where every
/// character of the name outside `[A-Za-z0-9.-]` becomes `_`.
pub fn storage_file_name(original_name: &str, timestamp_millis: i64) -> String {
    format!("{UPLOAD_DIRECTORY}/{}", unique_file_name(original_name, timestamp_millis))
}

fn unique_file_name(original_name: &str, timestamp_millis: i64) -> String {
    let sanitized: String = original_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    format!("{timestamp_millis}_{sanitized}")
}

/// Validates and stores `bytes`, then records its metadata. When the record
/// cannot be written the stored bytes are removed again.
pub fn upload(
    store: &FileStore,
    original_name: &str,
    mime_type: &str,
    bytes: &[u8],
    now: DateTime<Utc>,
) -> Result<UploadedFile, UploadError> {
    if bytes.is_empty() {
        return Err(UploadError::EmptyFile);
    }
    validate_upload(original_name, mime_type)?;

    let filename = unique_file_name(original_name, now.timestamp_millis());
    let file_type = FileKind::detect(original_name, mime_type);
    let uploaded = UploadedFile {
        file_path: format!("{UPLOAD_DIRECTORY}/{filename}"),
        filename,
        original_name: original_name.to_owned(),
        file_size: bytes.len() as u64,
        mime_type: mime_type.to_owned(),
        upload_date: now,
        file_type,
        sheet_count: count_sheets(bytes, file_type),
    };
    let metadata = serde_json::to_vec_pretty(&uploaded)?;

    store.save(&uploaded.file_path, bytes)?;
    if let Err(error) = store.save(&record_reference(&uploaded.file_path), &metadata) {
        if let Err(cleanup) = store.remove(&uploaded.file_path) {
            warn!(file = uploaded.file_path.as_str(), %cleanup, "could not remove upload without record");
        }
        return Err(error.into());
    }

    info!(
        file = uploaded.file_path.as_str(),
        size = uploaded.file_size,
        kind = %uploaded.file_type,
        sheets = uploaded.sheet_count,
        "stored upload"
    );
    Ok(uploaded)
}

fn record_reference(file_path: &str) -> String {
    format!("{file_path}{METADATA_SUFFIX}")
}

/// The record stored beside `file_path`, or `None` when it has none.
pub fn upload_record(store: &FileStore, file_path: &str) -> Result<Option<UploadedFile>, UploadError> {
    match store.fetch(&record_reference(file_path)) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(SourceError::NotFound(_)) => Ok(None),
        Err(error) => Err(error.into()),
    }
}

/// Removes an upload and its record. Fails with [`SourceError::NotFound`]
/// when the file itself does not exist.
pub fn delete_upload(store: &FileStore, file_path: &str) -> Result<(), UploadError> {
    store.remove(file_path)?;
    match store.remove(&record_reference(file_path)) {
        Ok(()) | Err(SourceError::NotFound(_)) => (),
        Err(error) => return Err(error.into()),
    }
    info!(file = file_path, "deleted upload");
    Ok(())
}

/// Page and filter applied by [`list_uploads`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListQuery {
    /// 1-based page number.
    pub page: usize,
    pub limit: usize,
    pub file_type: Option<FileKind>,
}

impl Default for ListQuery {
    fn default() -> Self {
        ListQuery {
            page: 1,
            limit: 10,
            file_type: None,
        }
    }
}

/// One page of recorded uploads, newest first. Unreadable records are
/// skipped.
pub fn list_uploads(store: &FileStore, query: &ListQuery) -> Result<Vec<UploadedFile>, UploadError> {
    let mut uploads = Vec::new();
    for reference in store.list(UPLOAD_DIRECTORY)? {
        if !reference.ends_with(METADATA_SUFFIX) {
            continue;
        }
        match serde_json::from_slice::<UploadedFile>(&store.fetch(&reference)?) {
            Ok(uploaded) => uploads.push(uploaded),
            Err(error) => warn!(reference = reference.as_str(), %error, "skipping unreadable upload record"),
        }
    }
    uploads.retain(|uploaded| query.file_type.map_or(true, |kind| uploaded.file_type == kind));
    uploads.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));
    let offset = query.page.saturating_sub(1).saturating_mul(query.limit);
    Ok(uploads.into_iter().skip(offset).take(query.limit).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allowed_types() {
        assert!(validate_upload("people.xlsx", "application/octet-stream").is_ok());
        assert!(validate_upload("PEOPLE.CSV", "").is_ok());
        assert!(validate_upload("legacy.xls", "").is_ok());
        assert!(validate_upload("data", "text/csv").is_ok());
    }

    #[test]
    fn rejects_other_types() {
        let error = validate_upload("notes.txt", "text/plain").unwrap_err();
        assert_eq!(
            error.to_string(),
            "Invalid file type. Only Excel (.xlsx, .xls) and CSV files are allowed."
        );
        assert!(validate_upload("report.ods", "").is_err());
    }

    #[test]
    fn sanitizes_stored_names() {
        assert_eq!(
            storage_file_name("My People (v2).xlsx", 1700000000000),
            "uploads/1700000000000_My_People__v2_.xlsx"
        );
        assert_eq!(storage_file_name("a-b.c.csv", 5), "uploads/5_a-b.c.csv");
        assert_eq!(storage_file_name("résumé.csv", 1), "uploads/1_r_sum_.csv");
    }
}
