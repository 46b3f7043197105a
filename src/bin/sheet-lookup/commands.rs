use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info_span};

use sheet_lookup::resolve;
use sheet_lookup::response::{read_file, FileContents, MessageResponse, MetadataResponse, SearchResponse, SheetView};
use sheet_lookup::source::{
    is_remote_url, to_csv_export_url, validate_sheet_url, ByteSource, FileStore, HttpSource, UnifiedSource,
};
use sheet_lookup::upload::{delete_upload, list_uploads, upload, upload_record, ListQuery, UploadedFile};
use sheet_lookup::{parse, FileKind, NormalizationPolicy};

use crate::cli::{ExportArgs, FileArgs, FileTypeArg, KindArg, ListArgs, SearchArgs, SheetArgs, StoredArgs, UploadArgs};

const GOOGLE_SHEET_FILE_NAME: &str = "Google Sheet";

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{json}");
    Ok(())
}

pub fn run_upload(store: &FileStore, args: &UploadArgs) -> Result<UploadedFile> {
    let bytes = fs::read(&args.path).with_context(|| format!("read {}", args.path.display()))?;
    let name = match &args.name {
        Some(name) => name.to_owned(),
        None => file_name_of(&args.path)?,
    };
    Ok(upload(store, &name, &args.mime, &bytes, Utc::now())?)
}

pub fn run_list(store: &FileStore, args: &ListArgs) -> Result<Vec<UploadedFile>> {
    let query = ListQuery {
        page: usize::try_from(args.page).context("page out of range")?,
        limit: usize::try_from(args.limit).context("limit out of range")?,
        file_type: args.file_type.map(|file_type| match file_type {
            FileTypeArg::Csv => FileKind::Csv,
            FileTypeArg::Workbook => FileKind::Workbook,
            FileTypeArg::Other => FileKind::Other,
        }),
    };
    Ok(list_uploads(store, &query)?)
}

pub fn run_info(store: &FileStore, args: &StoredArgs) -> Result<MetadataResponse> {
    let file = upload_record(store, &args.file)?.ok_or_else(|| anyhow!("File not found"))?;
    Ok(MetadataResponse::new(file))
}

pub fn run_delete(store: &FileStore, args: &StoredArgs) -> Result<MessageResponse> {
    delete_upload(store, &args.file)?;
    Ok(MessageResponse::new("File deleted successfully"))
}

pub fn run_read(store: &FileStore, args: &FileArgs) -> Result<FileContents> {
    let (bytes, kind) = load(store, args)?;
    Ok(read_file(&display_name(&args.file), &bytes, kind, &NormalizationPolicy::display())?)
}

pub fn run_search(store: &FileStore, args: &SearchArgs) -> Result<SearchResponse> {
    let span = info_span!("search", file = args.file.file.as_str());
    let _guard = span.enter();
    let (bytes, kind) = load(store, &args.file)?;
    let sheets = parse(&bytes, kind, &NormalizationPolicy::search())?;
    Ok(SearchResponse::from_result(resolve(&sheets, &args.value), &args.value))
}

pub enum SheetOutput {
    View(FileContents),
    Search(SearchResponse),
}

pub fn run_sheet(args: &SheetArgs) -> Result<SheetOutput> {
    validate_sheet_url(&args.url)?;
    let export_url = to_csv_export_url(&args.url)?;
    let http = HttpSource::new()?;
    let bytes = http.fetch(&export_url)?;
    let policy = NormalizationPolicy::url_import();
    match &args.value {
        Some(value) => {
            let sheets = parse(&bytes, FileKind::Csv, &policy)?;
            Ok(SheetOutput::Search(SearchResponse::from_result(resolve(&sheets, value), value)))
        }
        None => Ok(SheetOutput::View(read_file(GOOGLE_SHEET_FILE_NAME, &bytes, FileKind::Csv, &policy)?)),
    }
}

pub fn run_export(store: &FileStore, args: &ExportArgs) -> Result<()> {
    let contents = run_read(store, &args.file)?;
    let view: SheetView = match &args.sheet {
        Some(name) => contents
            .all_sheets
            .into_iter()
            .find(|view| &view.sheet_name == name)
            .ok_or_else(|| anyhow!("sheet '{name}' not found in {}", args.file.file))?,
        None => contents
            .data
            .ok_or_else(|| anyhow!("{} has no non-empty sheet", args.file.file))?,
    };
    let csv = view.to_csv();
    match &args.output {
        Some(path) => {
            fs::write(path, csv).with_context(|| format!("write {}", path.display()))?;
            debug!(path = %path.display(), rows = view.total_rows, "exported sheet");
        }
        None => println!("{csv}"),
    }
    Ok(())
}

/// Bytes of the referenced file and the parser to use for it. An explicit
/// `--kind` wins, then the kind recorded at upload, then the file name.
fn load(store: &FileStore, args: &FileArgs) -> Result<(Vec<u8>, FileKind)> {
    let source = UnifiedSource::for_reference(&args.file, store)?;
    let bytes = source
        .fetch(&args.file)
        .with_context(|| format!("load {}", args.file))?;
    let kind = match args.kind {
        Some(KindArg::Csv) => FileKind::Csv,
        Some(KindArg::Workbook) => FileKind::Workbook,
        None if is_remote_url(&args.file) => FileKind::detect(&args.file, ""),
        None => match upload_record(store, &args.file)? {
            Some(record) => record.file_type,
            None => FileKind::detect(&args.file, ""),
        },
    };
    debug!(file = args.file.as_str(), %kind, "loaded file");
    Ok((bytes, kind))
}

fn file_name_of(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("{} has no file name", path.display()))
}

/// Last path segment of a reference, without the upload timestamp prefix.
fn display_name(reference: &str) -> String {
    let name = reference.rsplit('/').next().unwrap_or(reference);
    match name.split_once('_') {
        Some((timestamp, rest)) if !timestamp.is_empty() && timestamp.bytes().all(|b| b.is_ascii_digit()) => {
            rest.to_owned()
        }
        _ => name.to_owned(),
    }
}
