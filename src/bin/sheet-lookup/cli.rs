//! Command line arguments for `sheet-lookup`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};

#[derive(Parser)]
#[command(
    name = "sheet-lookup",
    version,
    about = "Upload spreadsheets and look up rows by identifier",
    long_about = "Store CSV, Excel and OpenDocument spreadsheets and look up a single row\n\
                  by its identifier column, across every sheet of the file.\n\n\
                  Published Google Sheets can be searched directly by URL."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding uploaded files.
    #[arg(long, value_name = "DIR", env = "SHEET_LOOKUP_STORE", default_value = ".", global = true)]
    pub store: PathBuf,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Log output format.
    #[arg(long = "log-format", value_enum, default_value = "pretty", global = true)]
    pub log_format: LogFormatArg,

    /// Include search values in log output.
    #[arg(long = "log-values", global = true)]
    pub log_values: bool,

    /// Prefix log lines with a timestamp.
    #[arg(long = "log-timestamps", global = true)]
    pub log_timestamps: bool,

    /// Append logs to this file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Copy a local file into the store and record its metadata.
    Upload(UploadArgs),

    /// List recorded uploads, newest first.
    List(ListArgs),

    /// Print the recorded metadata of an upload.
    Info(StoredArgs),

    /// Remove an upload and its metadata from the store.
    Delete(StoredArgs),

    /// Print every non-empty sheet of a file as JSON.
    Read(FileArgs),

    /// Find the row whose identifier matches VALUE.
    Search(SearchArgs),

    /// Fetch a published Google Sheet and search it, or print it when no
    /// VALUE is given.
    Sheet(SheetArgs),

    /// Write one sheet of a file as CSV.
    Export(ExportArgs),
}

#[derive(Args)]
pub struct UploadArgs {
    /// Local file to upload.
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// MIME type reported for the file.
    #[arg(long, value_name = "TYPE", default_value = "")]
    pub mime: String,

    /// Name to record instead of the file name of PATH.
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Page to show, starting at 1.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub page: u64,

    /// Uploads per page.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub limit: u64,

    /// Only list uploads of this kind.
    #[arg(long = "type", value_enum)]
    pub file_type: Option<FileTypeArg>,
}

#[derive(Args)]
pub struct StoredArgs {
    /// Store reference, e.g. uploads/1700000000000_people.csv.
    #[arg(value_name = "FILE")]
    pub file: String,
}

#[derive(Args)]
pub struct FileArgs {
    /// Store reference (e.g. uploads/1700000000000_people.csv) or http(s) URL.
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Parser to use; taken from the upload record, or detected from the
    /// file name, when omitted.
    #[arg(long, value_enum)]
    pub kind: Option<KindArg>,
}

#[derive(Args)]
pub struct SearchArgs {
    #[command(flatten)]
    pub file: FileArgs,

    /// Identifier to look for.
    #[arg(value_name = "VALUE")]
    pub value: String,
}

#[derive(Args)]
pub struct SheetArgs {
    /// Google Sheets link (edit, pub or export form).
    #[arg(value_name = "URL")]
    pub url: String,

    /// Identifier to look for.
    #[arg(value_name = "VALUE")]
    pub value: Option<String>,
}

#[derive(Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub file: FileArgs,

    /// Sheet to export; the first non-empty sheet when omitted.
    #[arg(long, value_name = "NAME")]
    pub sheet: Option<String>,

    /// Output path; stdout when omitted.
    #[arg(long, short, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Declared file kinds.
#[derive(Clone, Copy, ValueEnum)]
pub enum KindArg {
    Csv,
    Workbook,
}

/// Recorded upload kinds.
#[derive(Clone, Copy, ValueEnum)]
pub enum FileTypeArg {
    Csv,
    Workbook,
    Other,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
