//! Scraping of the IMPPAT phytochemical page.
//!
//! Everything that knows what the page markup looks like lives here, behind
//! [`parse_compound_table`]. The parser is deliberately tolerant: tag names
//! are matched case-insensitively, attributes are ignored, nested markup in
//! cells (links, `<br>`, spans) is stripped to text and entities are decoded.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::domain::{CompoundRecord, CompoundTable, collapse_whitespace, normalize_column};
use crate::error::PhytoError;

pub const DEFAULT_NAME_COLUMN: &str = "Phytochemical name";
pub const DEFAULT_IDENTIFIER_COLUMN: &str = "IMPPAT Phytochemical identifier";

static TABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<table\b[^>]*>(.*?)</table\s*>").expect("static regex"));
static THEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<thead\b[^>]*>(.*?)</thead\s*>").expect("static regex"));
static ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr\s*>").expect("static regex"));
static CELL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(t[hd])\b[^>]*>(.*?)</t[hd]\s*>").expect("static regex")
});
static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("static regex"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("static regex"));
static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("static regex")
});

/// Which source columns carry the compound name and the IMPPAT identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumns {
    pub name: String,
    pub identifier: String,
}

impl Default for TableColumns {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME_COLUMN.to_string(),
            identifier: DEFAULT_IDENTIFIER_COLUMN.to_string(),
        }
    }
}

/// Parses the first `<table>` of `html` into a [`CompoundTable`].
///
/// Fails with [`PhytoError::NotFound`] when the page has no table, when the
/// table has no data rows, or when the name column is missing. A missing
/// identifier column is not an error here: it only matters once the IMPPAT
/// provider is chosen, and is then reported per row.
pub fn parse_compound_table(
    html: &str,
    columns: &TableColumns,
) -> Result<CompoundTable, PhytoError> {
    let html = COMMENT.replace_all(html, "");
    let table = TABLE
        .captures(&html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| PhytoError::NotFound("no phytochemical table on the page".to_string()))?;

    let (header, body) = match THEAD.captures(table) {
        Some(caps) => {
            let head = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let header = rows(head).into_iter().next().map(|row| row.cells);
            let rest = THEAD.replace(table, "");
            (header.unwrap_or_default(), rows(&rest))
        }
        None => {
            // Caption rows may precede the `<th>` header row.
            let mut all = rows(table);
            let at = all.iter().position(|row| row.is_header).unwrap_or(0);
            let body = all.split_off((at + 1).min(all.len()));
            let header = all.pop().map(|row| row.cells);
            (header.unwrap_or_default(), body)
        }
    };

    if header.is_empty() {
        return Err(PhytoError::NotFound(
            "phytochemical table has no header row".to_string(),
        ));
    }
    let header: Vec<String> = header.iter().map(|cell| normalize_column(cell)).collect();

    let table = CompoundTable {
        columns: header,
        records: Vec::new(),
    };
    let name_idx = table.column_index(&columns.name).ok_or_else(|| {
        PhytoError::NotFound(format!("phytochemical table has no {:?} column", columns.name))
    })?;
    let id_idx = table.column_index(&columns.identifier);

    let width = table.columns.len();
    let records: Vec<CompoundRecord> = body
        .into_iter()
        .map(|Row { mut cells, .. }| {
            cells.resize(width, String::new());
            let identifier = id_idx
                .map(|idx| cells[idx].clone())
                .filter(|value| !value.is_empty());
            CompoundRecord {
                name: cells[name_idx].clone(),
                identifier,
                fields: table.columns.iter().cloned().zip(cells).collect(),
            }
        })
        .collect();

    if records.is_empty() {
        return Err(PhytoError::NotFound(
            "no phytochemicals listed for this plant".to_string(),
        ));
    }

    Ok(CompoundTable {
        columns: table.columns,
        records,
    })
}

struct Row {
    cells: Vec<String>,
    /// Every cell is a `<th>`.
    is_header: bool,
}

/// Rows with at least one cell, each as cleaned cell text.
fn rows(fragment: &str) -> Vec<Row> {
    ROW.captures_iter(fragment)
        .filter_map(|row| row.get(1))
        .map(|row| {
            let mut is_header = true;
            let mut cells = Vec::new();
            for cell in CELL.captures_iter(row.as_str()) {
                is_header &= cell[1].eq_ignore_ascii_case("th");
                cells.push(cell_text(&cell[2]));
            }
            Row { cells, is_header }
        })
        .filter(|row| !row.cells.is_empty())
        .collect()
}

fn cell_text(raw: &str) -> String {
    let stripped = TAG.replace_all(raw, " ");
    let decoded = ENTITY.replace_all(&stripped, |caps: &Captures<'_>| {
        decode_entity(&caps[1]).unwrap_or_else(|| caps[0].to_string())
    });
    collapse_whitespace(&decoded.replace('\u{a0}', " "))
}

fn decode_entity(entity: &str) -> Option<String> {
    if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        return u32::from_str_radix(hex, 16)
            .ok()
            .and_then(char::from_u32)
            .map(String::from);
    }
    if let Some(dec) = entity.strip_prefix('#') {
        return dec.parse::<u32>().ok().and_then(char::from_u32).map(String::from);
    }
    let ch = match entity {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "alpha" => 'α',
        "beta" => 'β',
        "gamma" => 'γ',
        "delta" => 'δ',
        _ => return None,
    };
    Some(ch.to_string())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const PAGE: &str = r#"
        <html><body>
        <!-- <table><tr><td>commented out</td></tr></table> -->
        <TABLE class="table table-striped">
          <thead>
            <tr><th> Plant name </th><th>Plant part</th><th>IMPPAT Phytochemical
                identifier</th><th>Phytochemical name</th><th>References</th></tr>
          </thead>
          <tbody>
            <tr><td>Ocimum sanctum</td><td>leaf</td>
                <td><a href="/imppat/phytochemical-detailedpage/IMPHY000001">IMPHY000001</a></td>
                <td>Eugenol</td><td>ref&nbsp;1</td></tr>
            <tr><td>Ocimum sanctum</td><td>leaf</td><td>IMPHY000002</td>
                <td>Ursolic&#32;acid</td><td>Smith &amp; Jones</td></tr>
            <tr><td>Ocimum sanctum</td><td>seed</td><td></td><td>&beta;-caryophyllene</td></tr>
          </tbody>
        </TABLE>
        <table><tr><th>Phytochemical name</th></tr><tr><td>ignored</td></tr></table>
        </body></html>
    "#;

    #[test]
    fn parses_first_table() {
        let table = parse_compound_table(PAGE, &TableColumns::default()).unwrap();
        assert_eq!(
            table.columns,
            vec![
                "Plant name",
                "Plant part",
                "IMPPAT Phytochemical identifier",
                "Phytochemical name",
                "References"
            ]
        );
        assert_eq!(table.len(), 3);

        let first = &table.records[0];
        assert_eq!(first.name, "Eugenol");
        assert_eq!(first.identifier.as_deref(), Some("IMPHY000001"));
        assert_eq!(first.field("references"), Some("ref 1"));

        let second = &table.records[1];
        assert_eq!(second.name, "Ursolic acid");
        assert_eq!(second.field("References"), Some("Smith & Jones"));
    }

    #[test]
    fn short_rows_are_padded() {
        let table = parse_compound_table(PAGE, &TableColumns::default()).unwrap();
        let third = &table.records[2];
        assert_eq!(third.name, "β-caryophyllene");
        assert_eq!(third.identifier, None);
        assert_eq!(third.field("References"), Some(""));
        assert_eq!(third.fields.len(), 5);
    }

    #[test]
    fn header_without_thead_is_first_row() {
        let html = "<table><tr><td>Phytochemical name</td><td>Other</td></tr>\
                    <tr><td>Eugenol</td><td>x</td></tr></table>";
        let table = parse_compound_table(html, &TableColumns::default()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.records[0].name, "Eugenol");
        assert!(!table.has_column(DEFAULT_IDENTIFIER_COLUMN));
    }

    #[test]
    fn caption_rows_before_th_header_are_dropped() {
        let html = "<table><tr><td colspan=2>Results</td></tr>\
                    <tr><th>Phytochemical name</th><th>IMPPAT Phytochemical identifier</th></tr>\
                    <tr><td>Eugenol</td><td>IMPHY000001</td></tr></table>";
        let table = parse_compound_table(html, &TableColumns::default()).unwrap();
        assert_eq!(
            table.columns,
            vec!["Phytochemical name", "IMPPAT Phytochemical identifier"]
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.records[0].name, "Eugenol");
        assert_eq!(table.records[0].identifier.as_deref(), Some("IMPHY000001"));
    }

    #[test]
    fn page_without_table_is_not_found() {
        let err = parse_compound_table("<html><p>No results</p></html>", &TableColumns::default())
            .unwrap_err();
        assert_matches!(err, PhytoError::NotFound(_));
    }

    #[test]
    fn header_only_table_is_not_found() {
        let html = "<table><tr><th>Phytochemical name</th></tr></table>";
        let err = parse_compound_table(html, &TableColumns::default()).unwrap_err();
        assert_matches!(err, PhytoError::NotFound(_));
    }

    #[test]
    fn missing_name_column_is_not_found() {
        let html = "<table><tr><th>Compound</th></tr><tr><td>Eugenol</td></tr></table>";
        let err = parse_compound_table(html, &TableColumns::default()).unwrap_err();
        assert_matches!(err, PhytoError::NotFound(msg) if msg.contains("Phytochemical name"));
    }

    #[test]
    fn custom_columns() {
        let html = "<table><tr><th>Compound</th><th>Id</th></tr>\
                    <tr><td>Eugenol</td><td>IMPHY000001</td></tr></table>";
        let columns = TableColumns {
            name: "compound".to_string(),
            identifier: "ID".to_string(),
        };
        let table = parse_compound_table(html, &columns).unwrap();
        assert_eq!(table.records[0].identifier.as_deref(), Some("IMPHY000001"));
    }
}
