//! Minimal Office Open XML workbook writer
//!
//! Produces a single-sheet workbook with inline strings: a header row
//! followed by one row per record.

use quick_xml::escape::escape;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::OutputError;
use crate::models::{InstanceRecord, RECORD_HEADERS};

/// Name of the only worksheet
pub const SHEET_NAME: &str = "OCI Metrics";

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const CONTENT_TYPES: &str = concat!(
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    r#"<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
    r#"</Types>"#
);

const ROOT_RELS: &str = concat!(
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
    r#"</Relationships>"#
);

const WORKBOOK_RELS: &str = concat!(
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>"#,
    r#"</Relationships>"#
);

/// Write records to a workbook at `path`
pub fn write_xlsx(path: &Path, records: &[InstanceRecord]) -> Result<(), OutputError> {
    let file = File::create(path).map_err(|e| OutputError::io(path, e))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));

    let workbook = workbook_xml(SHEET_NAME);
    let sheet = sheet_xml(records);
    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("xl/workbook.xml", workbook.as_str()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
        ("xl/worksheets/sheet1.xml", sheet.as_str()),
    ];

    for (name, body) in parts {
        zip.start_file(name, part_options())?;
        zip.write_all(XML_DECLARATION.as_bytes())
            .and_then(|_| zip.write_all(body.as_bytes()))
            .map_err(|e| OutputError::io(path, e))?;
    }

    let mut writer = zip.finish()?;
    writer.flush().map_err(|e| OutputError::io(path, e))?;

    debug!(path = %path.display(), records = records.len(), "Wrote spreadsheet output");
    Ok(())
}

fn part_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

fn workbook_xml(sheet_name: &str) -> String {
    format!(
        concat!(
            r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
            r#"<sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets>"#,
            r#"</workbook>"#
        ),
        escape(sheet_name)
    )
}

fn sheet_xml(records: &[InstanceRecord]) -> String {
    let mut xml = String::from(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );

    push_row(&mut xml, 1, &RECORD_HEADERS);
    for (i, record) in records.iter().enumerate() {
        push_row(&mut xml, i + 2, &record.cells());
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

fn push_row(xml: &mut String, row: usize, cells: &[&str]) {
    xml.push_str(&format!(r#"<row r="{}">"#, row));
    for (col, value) in cells.iter().enumerate() {
        let text = strip_invalid_xml_chars(value);
        xml.push_str(&format!(
            r#"<c r="{}{}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
            column_name(col),
            row,
            escape(text.as_str())
        ));
    }
    xml.push_str("</row>");
}

/// Spreadsheet column letters for a zero-based index (0 -> A, 26 -> AA)
fn column_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

/// Drop control characters XML 1.0 cannot represent
fn strip_invalid_xml_chars(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect()
}
