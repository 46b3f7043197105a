use crate::error::DecodeError;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::workbook::cell::Cell;
use crate::workbook::cell::CellType;
use crate::workbook::ByteReader;
use crate::workbook::Grid;
use crate::workbook::Workbook;
use crate::workbook::WorkbookError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::io::Read;
use tracing::debug;
use tracing::trace;
use zip::ZipArchive;

const MIME_TYPE: &[u8] = b"application/vnd.oasis.opendocument.spreadsheet";
const TABLE: QName = QName(b"table:table");
const TABLE_ROW: QName = QName(b"table:table-row");
const TABLE_CELL: QName = QName(b"table:table-cell");
const TABLE_COVERED_CELL: QName = QName(b"table:covered-table-cell");
const ANNOTATION: QName = QName(b"office:annotation");
const PARAGRAPH: QName = QName(b"text:p");
const SPACE: QName = QName(b"text:s");
const FILE_ENTRY: QName = QName(b"manifest:file-entry");
const ENCRYPTION_DATA: QName = QName(b"manifest:encryption-data");

/// Repeated cells past this many columns are trailing filler.
const MAX_REPEATED_COLUMNS: usize = 16_384;

/// An OpenDocument spreadsheet held in memory.
pub(crate) struct OdsWorkbook<'a> {
    zip: ZipArchive<ByteReader<'a>>,
    sheet_names: Vec<String>,
}

impl<'a> OdsWorkbook<'a> {
    pub(crate) fn open(mut zip: ZipArchive<ByteReader<'a>>) -> Result<Self, DecodeError> {
        check_mime(&mut zip)?;
        if is_password_protected(&mut zip)? {
            Err(WorkbookError::PasswordProtected)?
        }
        let sheet_names = load_sheet_names(&mut zip)?;
        debug!(sheets = sheet_names.len(), "loaded ods workbook structure");
        Ok(OdsWorkbook { zip, sheet_names })
    }
}

impl Workbook for OdsWorkbook<'_> {
    fn sheet_names(&self) -> Vec<String> {
        self.sheet_names.clone()
    }

    fn read_grids(&mut self) -> Result<Vec<Grid>, DecodeError> {
        let mut grids = Vec::<Grid>::new();
        let mut reader = self
            .zip
            .xml_reader("content.xml")?
            .ok_or_else(|| WorkbookError::MissingPart("content.xml".to_owned()))?;

        let mut grid: Option<Grid> = None;
        let mut row = 0usize;
        let mut col = 0usize;
        let mut row_count = 1usize;
        let mut col_count = 1usize;
        let mut kind = CellType::default();
        let mut value = String::new();
        // inside a string cell's paragraphs
        let mut element_context = false;
        let mut comment_context = false;
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TABLE => {
                let name = event.get_attribute_value("table:name")?.unwrap_or_default();
                grid = Some(Grid::new(&name));
                row = 0;
            }
            Event::End(event) if event.name() == TABLE => {
                if let Some(grid) = grid.take() {
                    trace!(sheet = grid.name.as_str(), width = grid.width(), height = grid.height(), "read ods table");
                    grids.push(grid);
                }
            }
            Event::Start(event) if event.name() == TABLE_ROW => {
                row_count = event.parse_attribute_value("table:number-rows-repeated")?.unwrap_or(1);
                col = 0;
            }
            Event::End(event) if event.name() == TABLE_ROW => {
                row += row_count;
            }
            Event::Start(event) if event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL => {
                value.clear();
                element_context = false;
                col_count = event.parse_attribute_value("table:number-columns-repeated")?.unwrap_or(1);
                kind = CellType::Empty;
                if let Some(value_type) = event.get_attribute_value("office:value-type")? {
                    match &*value_type {
                        "string" => {
                            kind = CellType::Text;
                            element_context = true;
                        }
                        "boolean" => {
                            kind = CellType::Boolean;
                            let flag = event.get_attribute_value("office:boolean-value")?
                                .map(|cow| cow != "false" && cow != "0")
                                .unwrap_or(false);
                            value.push_str(if flag { "1" } else { "0" });
                        }
                        "date" => {
                            kind = CellType::IsoDateTime;
                            if let Some(data) = event.get_attribute_value("office:date-value")? {
                                value.push_str(&data);
                            }
                        }
                        "time" => {
                            kind = CellType::IsoDuration;
                            if let Some(data) = event.get_attribute_value("office:time-value")? {
                                value.push_str(&data);
                            }
                        }
                        _ => {
                            kind = CellType::Number;
                            if let Some(data) = event.get_attribute_value("office:value")? {
                                value.push_str(&data);
                            }
                        }
                    }
                }
            }
            Event::End(event) if event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL => {
                if let Some(grid) = grid.as_mut() {
                    if kind != CellType::Empty && !value.is_empty() {
                        for row_offset in 0..row_count {
                            for col_offset in 0..col_count.min(MAX_REPEATED_COLUMNS) {
                                grid.push(Cell {
                                    row: row + row_offset,
                                    col: col + col_offset,
                                    kind,
                                    value: value.to_owned(),
                                })?;
                            }
                        }
                    }
                }
                col += col_count;
                element_context = false;
                comment_context = false;
            }
            Event::Start(event) if element_context && event.name() == ANNOTATION => comment_context = true,
            Event::End(event) if element_context && comment_context && event.name() == ANNOTATION => comment_context = false,
            Event::Start(event) if element_context && !comment_context && event.name() == PARAGRAPH => {
                if !value.is_empty() {
                    value.push('\n');
                }
            }
            Event::Start(event) if element_context && !comment_context && event.name() == SPACE => {
                let count = event.parse_attribute_value("text:c")?.unwrap_or(1usize);
                value.extend(std::iter::repeat(' ').take(count));
            }
            Event::Text(event) if element_context && !comment_context => value.push_bytes_text(&event)?,
            Event::GeneralRef(event) if element_context && !comment_context => value.push_bytes_ref(&event)?,
        });

        Ok(grids)
    }
}

fn check_mime(zip: &mut ZipArchive<ByteReader<'_>>) -> Result<(), DecodeError> {
    if let Some(mut file) = zip.file("mimetype")? {
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        if buffer.trim_ascii() != MIME_TYPE {
            Err(WorkbookError::MimeType)?;
        }
    }
    Ok(())
}

fn is_password_protected(zip: &mut ZipArchive<ByteReader<'_>>) -> Result<bool, DecodeError> {
    let mut reader = match zip.xml_reader("META-INF/manifest.xml")? {
        Some(reader) => reader,
        None => return Ok(false),
    };
    let mut in_file_entry = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == FILE_ENTRY => in_file_entry = true,
        Event::End(event) if event.name() == FILE_ENTRY => in_file_entry = false,
        Event::Start(event) if in_file_entry && event.name() == ENCRYPTION_DATA => return Ok(true),
    });
    Ok(false)
}

fn load_sheet_names(zip: &mut ZipArchive<ByteReader<'_>>) -> Result<Vec<String>, DecodeError> {
    let mut reader = zip
        .xml_reader("content.xml")?
        .ok_or_else(|| WorkbookError::MissingPart("content.xml".to_owned()))?;
    let mut names = Vec::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TABLE => {
            names.push(event.get_attribute_value("table:name")?.unwrap_or_default().to_string());
        }
    });
    Ok(names)
}
