// Delimited-text import (CSV/TSV/semicolon/pipe exports)

use std::collections::BTreeMap;

use encoding_rs::Encoding;
use estimate_core::money::parse_financial_number;
use estimate_core::{CellValue, Sheet, SourceFormat, Workbook};

use crate::error::FileError;
use crate::reader::ReadOptions;

/// Sheet name given to the single grid read from delimited text.
pub const TEXT_SHEET_NAME: &str = "Sheet1";

/// Read delimited text into a one-sheet workbook. Text that does not sniff
/// as delimited (prose, binary) is rejected as unreadable.
pub fn read_delimited(bytes: &[u8], options: &ReadOptions) -> Result<Workbook, FileError> {
    let content = decode_text(bytes)?;
    let delimiter = sniff_delimiter(&content).ok_or_else(|| {
        FileError::Unreadable("not a spreadsheet file or delimited text".into())
    })?;
    log::debug!("delimited text, delimiter {:?}", delimiter as char);

    let sheet = import_from_string(&content, delimiter, options)?;
    Ok(Workbook::new(SourceFormat::Csv, vec![sheet]))
}

/// Decode bytes to text: BOM-declared encoding first, then UTF-8, falling
/// back to Windows-1252 (common for Excel-exported CSVs).
fn decode_text(bytes: &[u8]) -> Result<String, FileError> {
    let text = match Encoding::for_bom(bytes) {
        Some((encoding, bom_len)) => {
            let (decoded, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
            decoded.into_owned()
        }
        None => match String::from_utf8(bytes.to_vec()) {
            Ok(s) => s,
            Err(e) => {
                let bytes = e.into_bytes();
                let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
                decoded.into_owned()
            }
        },
    };

    if looks_binary(&text) {
        return Err(FileError::Unreadable("binary data is not a recognized spreadsheet".into()));
    }
    Ok(text)
}

/// NUL anywhere, or more than 1% control characters, means binary.
fn looks_binary(text: &str) -> bool {
    let mut total = 0usize;
    let mut control = 0usize;
    for c in text.chars() {
        if c == '\0' {
            return true;
        }
        total += 1;
        if c.is_control() && !matches!(c, '\t' | '\r' | '\n') {
            control += 1;
        }
    }
    total > 0 && control * 100 > total
}

/// Detect the field delimiter from the first few non-blank lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line and
/// take the most common multi-field count. The candidate with the most lines
/// at that count (times the count) wins. A candidate needs at least two lines
/// split the same way, and one of them must carry a numeric field. A one-line
/// file (a bare header row) needs three or more fields instead.
fn sniff_delimiter(content: &str) -> Option<u8> {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(10)
        .collect();

    if sample_lines.is_empty() {
        return None;
    }
    let single_line = sample_lines.len() == 1;

    let mut best = None;
    let mut best_score = 0u64;

    for &delim in candidates {
        // field count -> (lines, lines with a numeric field)
        let mut tally: BTreeMap<usize, (u64, u64)> = BTreeMap::new();
        for line in &sample_lines {
            let record = ::csv::ReaderBuilder::new()
                .delimiter(delim)
                .has_headers(false)
                .flexible(true)
                .from_reader(line.as_bytes())
                .records()
                .next()
                .and_then(|r| r.ok());
            let Some(record) = record else { continue };
            if record.len() > 1 {
                let numeric = record.iter().any(|field| parse_financial_number(field).is_some());
                let entry = tally.entry(record.len()).or_insert((0, 0));
                entry.0 += 1;
                entry.1 += u64::from(numeric);
            }
        }

        // Most common multi-field count; more columns breaks ties
        let Some((&target, &(consistent, numeric))) =
            tally.iter().max_by_key(|(count, (lines, _))| (*lines, **count))
        else {
            continue;
        };
        let tabular = if single_line {
            target >= 3
        } else {
            consistent >= 2 && numeric >= 1
        };
        if !tabular {
            continue;
        }

        let score = consistent * target as u64;
        if score > best_score {
            best_score = score;
            best = Some(delim);
        }
    }

    best
}

fn import_from_string(content: &str, delimiter: u8, options: &ReadOptions) -> Result<Sheet, FileError> {
    let mut reader = ::csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut sheet = Sheet::new(TEXT_SHEET_NAME);
    let mut max_cols = 0usize;

    for (row_idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| FileError::Unreadable(format!("malformed delimited text: {}", e)))?;
        max_cols = max_cols.max(record.len());

        let grid_cells = (row_idx + 1).saturating_mul(max_cols);
        if grid_cells > options.max_cells {
            return Err(FileError::TooLarge {
                what: "cells",
                actual: grid_cells,
                limit: options.max_cells,
            });
        }

        for (col_idx, field) in record.iter().enumerate() {
            sheet.set(row_idx, col_idx, CellValue::from_input(field));
        }
    }

    Ok(sheet)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniff_semicolon_delimiter() {
        let content = "Name;Qty;Total\nShingles;20;3000\nRidge cap;40;500\n";
        assert_eq!(sniff_delimiter(content), Some(b';'));
    }

    #[test]
    fn sniff_comma_delimiter() {
        let content = "Description,Qty,Total\nShingles,20,3000\nRidge cap,40,500\n";
        assert_eq!(sniff_delimiter(content), Some(b','));
    }

    #[test]
    fn sniff_tab_delimiter() {
        let content = "Description\tQty\tTotal\nShingles\t20\t3000\n";
        assert_eq!(sniff_delimiter(content), Some(b'\t'));
    }

    #[test]
    fn sniff_semicolon_with_commas_in_values() {
        let content = "Description;Unit Price;Total\n\"Tear off, haul\";\"1,200.00\";1200\nFelt;\"12.00\";12\n";
        assert_eq!(sniff_delimiter(content), Some(b';'));
    }

    #[test]
    fn sniff_tolerates_title_lines() {
        let content = "Smith Residence Estimate\nDescription,Qty,Total\nShingles,20,3000\nFelt,2,24\n";
        assert_eq!(sniff_delimiter(content), Some(b','));
    }

    #[test]
    fn sniff_rejects_prose() {
        let content = "Dear adjuster,\nplease find the estimate attached.\nThanks\n";
        assert_eq!(sniff_delimiter(content), None);
    }

    #[test]
    fn sniff_rejects_prose_with_commas_on_every_line() {
        let content = "Notes about the roof, north side.\nCall the adjuster, then the owner.\n";
        assert_eq!(sniff_delimiter(content), None);

        let err = read_delimited(content.as_bytes(), &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, FileError::Unreadable(_)), "got {err:?}");
    }

    #[test]
    fn sniff_accepts_bare_header_row() {
        assert_eq!(sniff_delimiter("Category,Description,Quantity,Total\n"), Some(b','));
        assert_eq!(sniff_delimiter("Roof notes, north side\n"), None);
    }

    #[test]
    fn windows_1252_fallback() {
        // "Café" in Windows-1252
        let bytes = b"Description,Total\nCaf\xe9 counter,10\n";
        let text = decode_text(bytes).unwrap();
        assert!(text.contains("Café"));
    }

    #[test]
    fn utf16_with_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "Description\tTotal\nFelt\t12\n".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let wb = read_delimited(&bytes, &ReadOptions::default()).unwrap();
        let sheet = &wb.sheets()[0];
        assert_eq!(sheet.get(1, 0), &CellValue::Text("Felt".into()));
    }

    #[test]
    fn binary_rejected() {
        let err = decode_text(&[0x01, 0x00, 0x02, 0x03]).unwrap_err();
        assert!(matches!(err, FileError::Unreadable(_)));
    }

    #[test]
    fn cell_limit_enforced() {
        let options = ReadOptions { max_cells: 5, ..ReadOptions::default() };
        let err = read_delimited(b"a,b,c\n1,2,3\n", &options).unwrap_err();
        assert!(matches!(err, FileError::TooLarge { what: "cells", .. }));
    }

    #[test]
    fn blank_fields_not_stored() {
        let wb = read_delimited(b"Category,Description,Total\nTotal,,3500.00\n", &ReadOptions::default()).unwrap();
        let sheet = &wb.sheets()[0];
        assert_eq!(sheet.get(1, 1), &CellValue::Empty);
        assert_eq!(sheet.get(1, 2), &CellValue::Text("3500.00".into()));
        assert_eq!(sheet.rows, 2);
        assert_eq!(sheet.cols, 3);
    }
}
