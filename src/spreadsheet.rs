use std::io::{Cursor, Write};

use camino::Utf8PathBuf;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::domain::CompoundTable;
use crate::error::PhytoError;
use crate::fs_util::{Persisted, persist_new, stage_in};
use crate::workspace::PlantWorkspace;

const SHEET_NAME: &str = "Phytochemicals";
const MAX_SUFFIX: usize = 1000;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

/// Writes `table` to a new `.xlsx` in the workspace, stamped with the current
/// local time.
pub fn export_table(
    table: &CompoundTable,
    workspace: &PlantWorkspace,
) -> Result<Utf8PathBuf, PhytoError> {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    export_table_stamped(table, workspace, &stamp)
}

/// Like [`export_table`] with an explicit stamp. An existing file is never
/// replaced: when `<plant>_<stamp>.xlsx` is taken the first free
/// `<plant>_<stamp>_<n>.xlsx` is used instead.
pub fn export_table_stamped(
    table: &CompoundTable,
    workspace: &PlantWorkspace,
    stamp: &str,
) -> Result<Utf8PathBuf, PhytoError> {
    workspace.ensure()?;
    let bytes = render_xlsx(table)?;
    let mut staged = stage_in(workspace.dir().as_std_path(), &bytes)?;

    for attempt in 0..MAX_SUFFIX {
        let path = workspace.spreadsheet_path(stamp, attempt);
        match persist_new(staged, path.as_std_path())? {
            Persisted::Written => return Ok(path),
            Persisted::Taken(file) => staged = file,
        }
    }
    Err(PhytoError::persistence(
        workspace.spreadsheet_path(stamp, MAX_SUFFIX),
        "too many exports with the same timestamp",
    ))
}

/// Minimal single-sheet SpreadsheetML package; every cell is an inline string.
pub fn render_xlsx(table: &CompoundTable) -> Result<Vec<u8>, PhytoError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", ROOT_RELS.to_string()),
        ("xl/workbook.xml", workbook_xml()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.to_string()),
        ("xl/worksheets/sheet1.xml", sheet_xml(table)),
    ];
    for (name, content) in parts {
        zip.start_file(name, part_options())
            .map_err(|err| PhytoError::persistence(name, err))?;
        zip.write_all(content.as_bytes())
            .map_err(|err| PhytoError::persistence(name, err))?;
    }
    let cursor = zip
        .finish()
        .map_err(|err| PhytoError::persistence("spreadsheet", err))?;
    Ok(cursor.into_inner())
}

fn part_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
}

fn workbook_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{SHEET_NAME}" sheetId="1" r:id="rId1"/></sheets></workbook>"#
    )
}

fn sheet_xml(table: &CompoundTable) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    let header = table.columns.iter().map(String::as_str);
    push_row(&mut xml, 1, header);
    for (idx, record) in table.records.iter().enumerate() {
        let cells = record.fields.iter().map(|(_, value)| value.as_str());
        push_row(&mut xml, idx + 2, cells);
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

fn push_row<'a>(xml: &mut String, row: usize, cells: impl Iterator<Item = &'a str>) {
    xml.push_str(&format!(r#"<row r="{row}">"#));
    for (col, value) in cells.enumerate() {
        let reference = format!("{}{row}", column_letters(col));
        xml.push_str(&format!(
            r#"<c r="{reference}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
            escape_xml(value)
        ));
    }
    xml.push_str("</row>");
}

/// Zero-based column index to `A`, `B`, ..., `Z`, `AA`, ...
fn column_letters(mut col: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (col % 26) as u8);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    letters.iter().rev().map(|b| *b as char).collect()
}

fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(ch),
            // not representable in XML 1.0
            c if (c as u32) < 0x20 => {}
            c => out.push(c),
        }
    }
    out
}
