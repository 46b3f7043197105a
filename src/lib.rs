//! # sheet_lookup
//!
//! Spreadsheet ingestion and identifier lookup.
//!
//! Raw bytes from an uploaded CSV, xlsx or ods file are turned into
//! normalized [`Sheet`]s by the tabular parser ([`table`]), and a search
//! value is resolved against them by the identifier resolver
//! ([`resolver`]). Byte sources, upload handling and response shapes sit
//! around that core.
//!
//! ```no_run
//! use sheet_lookup::{parse_declared, resolve, LookupResult, NormalizationPolicy};
//!
//! let sheets = parse_declared(b"id,name\n1,Alice\n2,Bob\n", "csv", &NormalizationPolicy::search())?;
//! match resolve(&sheets, "2") {
//!     LookupResult::Found(found) => println!("{} in {}", found.searched_column, found.sheet_name),
//!     LookupResult::Multiple(matches) => println!("{} sheets matched", matches.len()),
//!     LookupResult::NotFound { searched_value } => println!("no row for {searched_value}"),
//! }
//! # Ok::<(), sheet_lookup::LookupError>(())
//! ```

mod error;
mod helpers;
mod workbook;

pub mod logging;
pub mod resolver;
pub mod response;
pub mod source;
pub mod table;
pub mod upload;

pub use error::LookupError;
pub use error::Result;
pub use resolver::resolve;
pub use resolver::LookupResult;
pub use resolver::SheetMatch;
pub use table::count_sheets;
pub use table::parse;
pub use table::parse_declared;
pub use table::parse_delimited_text;
pub use table::parse_workbook;
pub use table::FileKind;
pub use table::NormalizationPolicy;
pub use table::QuoteMode;
pub use table::Row;
pub use table::Sheet;
pub use table::Value;
