//! # Byte Sources
//!
//! Where file bytes come from before parsing: a directory-backed
//! [`FileStore`] for uploaded files and an [`HttpSource`] for published
//! Google Sheets. Sources are plain values built by the caller; nothing here
//! holds global state.
use crate::table::decode_text;
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::fs;
use std::io::ErrorKind;
use std::io::Write;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use tracing::info;
use url::Url;

/// User agent sent with every Google Sheets request.
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; DataFetcher/1.0)";

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

static SPREADSHEET_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/spreadsheets/d/([a-zA-Z0-9_-]+)").expect("Hardcode regex pattern"));
static PUBLISH_QUERY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"pub\?.*").expect("Hardcode regex pattern"));

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("File not found: '{0}'")]
    NotFound(String),

    #[error("Invalid file reference '{0}'")]
    InvalidReference(String),

    #[error("Invalid Google Sheets URL")]
    InvalidSheetUrl,

    #[error("Invalid Google Sheets URL format: '{0}'")]
    UnrecognizedSheetUrl(String),

    #[error("Access denied. Please ensure the Google Sheet is publicly accessible or shared with view permissions.")]
    AccessDenied,

    #[error("Google Sheet not found. Please check the URL.")]
    SheetNotFound,

    #[error("Failed to fetch data from Google Sheets (Status: {0})")]
    Status(u16),

    #[error("No data found in the Google Sheet")]
    EmptyBody,

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Http(#[from] reqwest::Error),
}

/// Delivers the raw bytes behind a file reference.
pub trait ByteSource {
    fn fetch(&self, reference: &str) -> Result<Vec<u8>, SourceError>;

    /// The bytes decoded as UTF-8 text.
    fn fetch_text(&self, reference: &str) -> Result<String, SourceError> {
        let bytes = self.fetch(reference)?;
        Ok(decode_text(&bytes).into_owned())
    }
}

/// Files kept under a root directory, addressed by relative paths such as
/// `uploads/1700000000000_people.csv`.
#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of `reference`. Absolute references and `..`
    /// components are rejected.
    pub fn path_of(&self, reference: &str) -> Result<PathBuf, SourceError> {
        let relative = Path::new(reference);
        let is_contained = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        if reference.is_empty() || !is_contained {
            return Err(SourceError::InvalidReference(reference.to_owned()));
        }
        Ok(self.root.join(relative))
    }

    /// Writes `bytes` at `reference`, creating parent directories. An
    /// existing file is never replaced.
    pub fn save(&self, reference: &str, bytes: &[u8]) -> Result<PathBuf, SourceError> {
        let path = self.path_of(reference)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::OpenOptions::new().write(true).create_new(true).open(&path)?;
        file.write_all(bytes)?;
        debug!(reference, size = bytes.len(), "stored file");
        Ok(path)
    }

    pub fn remove(&self, reference: &str) -> Result<(), SourceError> {
        let path = self.path_of(reference)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(reference, "removed file");
                Ok(())
            }
            Err(error) if error.kind() == ErrorKind::NotFound => Err(SourceError::NotFound(reference.to_owned())),
            Err(error) => Err(error.into()),
        }
    }

    /// References of the files directly under `directory`, sorted.
    pub fn list(&self, directory: &str) -> Result<Vec<String>, SourceError> {
        let path = self.path_of(directory)?;
        let entries = match fs::read_dir(&path) {
            Ok(entries) => entries,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(error.into()),
        };
        let mut references = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                references.push(format!("{}/{}", directory.trim_end_matches('/'), entry.file_name().to_string_lossy()));
            }
        }
        references.sort();
        Ok(references)
    }
}

impl ByteSource for FileStore {
    fn fetch(&self, reference: &str) -> Result<Vec<u8>, SourceError> {
        let path = self.path_of(reference)?;
        match fs::read(&path) {
            Ok(bytes) => {
                debug!(reference, size = bytes.len(), "read stored file");
                Ok(bytes)
            }
            Err(error) if error.kind() == ErrorKind::NotFound => Err(SourceError::NotFound(reference.to_owned())),
            Err(error) => Err(error.into()),
        }
    }
}

/// Blocking HTTP fetcher for published sheets and other remote files.
#[derive(Clone, Debug)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new() -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(HttpSource { client })
    }
}

impl ByteSource for HttpSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            info!(%status, "remote fetch failed");
            return Err(match status {
                StatusCode::FORBIDDEN => SourceError::AccessDenied,
                StatusCode::NOT_FOUND => SourceError::SheetNotFound,
                other => SourceError::Status(other.as_u16()),
            });
        }
        let bytes = response.bytes()?.to_vec();
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(SourceError::EmptyBody);
        }
        debug!(size = bytes.len(), "fetched remote file");
        Ok(bytes)
    }
}

/// A local store or the network, picked per reference.
#[derive(Clone, Debug)]
pub enum UnifiedSource {
    Local(FileStore),
    Remote(HttpSource),
}

impl UnifiedSource {
    /// `http(s)` references go to the network, anything else to `store`.
    pub fn for_reference(reference: &str, store: &FileStore) -> Result<Self, SourceError> {
        if is_remote_url(reference) {
            Ok(UnifiedSource::Remote(HttpSource::new()?))
        } else {
            Ok(UnifiedSource::Local(store.clone()))
        }
    }
}

impl ByteSource for UnifiedSource {
    fn fetch(&self, reference: &str) -> Result<Vec<u8>, SourceError> {
        match self {
            UnifiedSource::Local(store) => store.fetch(reference),
            UnifiedSource::Remote(http) => http.fetch(reference),
        }
    }
}

pub fn is_remote_url(reference: &str) -> bool {
    Url::parse(reference)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Rejects URLs that do not point at Google Sheets.
pub fn validate_sheet_url(url: &str) -> Result<(), SourceError> {
    if url.contains("docs.google.com/spreadsheets") {
        Ok(())
    } else {
        Err(SourceError::InvalidSheetUrl)
    }
}

/// Rewrites a Google Sheets link into its CSV export form.
///
/// - `.../spreadsheets/d/<id>/edit...` becomes `.../d/<id>/export?format=csv`
/// - `.../pub?...` becomes `.../pub?output=csv`
/// - links already containing `export?format=csv` are returned unchanged
pub fn to_csv_export_url(url: &str) -> Result<String, SourceError> {
    let url = url.trim();
    let export = if url.contains("/edit") {
        SPREADSHEET_ID
            .captures(url)
            .and_then(|captures| captures.get(1))
            .map(|id| format!("https://docs.google.com/spreadsheets/d/{}/export?format=csv", id.as_str()))
    } else if url.contains("/pub") {
        Some(PUBLISH_QUERY.replace(url, "pub?output=csv").into_owned())
    } else if url.contains("export?format=csv") {
        Some(url.to_owned())
    } else {
        None
    };
    match export {
        Some(export) => {
            debug!(url = export.as_str(), "normalized Google Sheets url");
            Ok(export)
        }
        None => Err(SourceError::UnrecognizedSheetUrl(url.to_owned())),
    }
}
