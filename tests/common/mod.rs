//! In-memory workbook builders shared by the integration tests.
#![allow(dead_code)]

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub fn build_zip(parts: &[(&str, String)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in parts {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// An xlsx cell: shared string index, inline text, number or boolean.
pub enum XCell {
    Shared(&'static str, usize),
    Inline(&'static str, &'static str),
    Number(&'static str, &'static str),
    Date(&'static str, &'static str),
    Bool(&'static str, bool),
}

impl XCell {
    fn to_xml(&self) -> String {
        match self {
            XCell::Shared(r, index) => format!(r#"<c r="{r}" t="s"><v>{index}</v></c>"#),
            XCell::Inline(r, text) => format!(r#"<c r="{r}" t="inlineStr"><is><t>{text}</t></is></c>"#),
            XCell::Number(r, number) => format!(r#"<c r="{r}"><v>{number}</v></c>"#),
            XCell::Date(r, serial) => format!(r#"<c r="{r}" s="1"><v>{serial}</v></c>"#),
            XCell::Bool(r, flag) => format!(r#"<c r="{r}" t="b"><v>{}</v></c>"#, u8::from(*flag)),
        }
    }
}

/// Builds an xlsx workbook. Each sheet is a name plus rows of cells; the
/// row number is taken from the cell references.
pub fn xlsx(shared_strings: &[&str], sheets: &[(&str, Vec<Vec<XCell>>)]) -> Vec<u8> {
    let mut workbook_sheets = String::new();
    let mut relationships = String::new();
    let mut parts: Vec<(String, String)> = Vec::new();
    for (index, (name, rows)) in sheets.iter().enumerate() {
        let id = index + 1;
        workbook_sheets.push_str(&format!(r#"<sheet name="{name}" sheetId="{id}" r:id="rId{id}"/>"#));
        relationships.push_str(&format!(
            r#"<Relationship Id="rId{id}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{id}.xml"/>"#
        ));
        let mut sheet_data = String::new();
        for row in rows {
            sheet_data.push_str("<row>");
            for cell in row {
                sheet_data.push_str(&cell.to_xml());
            }
            sheet_data.push_str("</row>");
        }
        parts.push((
            format!("xl/worksheets/sheet{id}.xml"),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{sheet_data}</sheetData></worksheet>"#
            ),
        ));
    }
    relationships.push_str(
        r#"<Relationship Id="rIdStyles" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
    );

    let strings: String = shared_strings.iter().map(|s| format!("<si><t>{s}</t></si>")).collect();
    parts.push((
        "xl/workbook.xml".to_owned(),
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><workbookPr/><sheets>{workbook_sheets}</sheets></workbook>"#
        ),
    ));
    parts.push((
        "xl/_rels/workbook.xml.rels".to_owned(),
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{relationships}</Relationships>"#
        ),
    ));
    parts.push((
        "xl/sharedStrings.xml".to_owned(),
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">{strings}</sst>"#,
            shared_strings.len()
        ),
    ));
    parts.push((
        "xl/styles.xml".to_owned(),
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><numFmts count="1"><numFmt numFmtId="164" formatCode="yyyy\-mm\-dd"/></numFmts><cellXfs count="2"><xf numFmtId="0"/><xf numFmtId="164" applyNumberFormat="1"/></cellXfs></styleSheet>"#.to_owned(),
    ));
    parts.push(("[Content_Types].xml".to_owned(), "<Types/>".to_owned()));

    let borrowed: Vec<(&str, String)> = parts.iter().map(|(name, content)| (name.as_str(), content.clone())).collect();
    build_zip(&borrowed)
}

/// Builds an ods workbook from `(name, rows)` where each row is raw
/// `table:table-row` inner XML.
pub fn ods(tables: &[(&str, &[&str])]) -> Vec<u8> {
    let mut body = String::new();
    for (name, rows) in tables {
        body.push_str(&format!(r#"<table:table table:name="{name}">"#));
        for row in rows.iter() {
            body.push_str(row);
        }
        body.push_str("</table:table>");
    }
    let content = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0"><office:body><office:spreadsheet>{body}</office:spreadsheet></office:body></office:document-content>"#
    );
    build_zip(&[
        ("mimetype", "application/vnd.oasis.opendocument.spreadsheet".to_owned()),
        ("content.xml", content),
        (
            "META-INF/manifest.xml",
            r#"<?xml version="1.0" encoding="UTF-8"?><manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0"><manifest:file-entry manifest:full-path="/" manifest:media-type="application/vnd.oasis.opendocument.spreadsheet"/><manifest:file-entry manifest:full-path="content.xml" manifest:media-type="text/xml"/></manifest:manifest>"#.to_owned(),
        ),
    ])
}

/// `<table:table-cell>` holding a string.
pub fn ods_text(text: &str) -> String {
    format!(r#"<table:table-cell office:value-type="string"><text:p>{text}</text:p></table:table-cell>"#)
}

/// `<table:table-cell>` holding a float.
pub fn ods_float(value: &str) -> String {
    format!(r#"<table:table-cell office:value-type="float" office:value="{value}"><text:p>{value}</text:p></table:table-cell>"#)
}
