// Spreadsheet container import (xlsx, xlsm, xlsb, xls, ods) via calamine.
//
// One-way conversion into the in-memory grid. Formulas are not evaluated;
// the cached value stored in the file is what the pipeline sees.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use estimate_core::{CellValue, Sheet, SourceFormat, Workbook};

use crate::error::FileError;
use crate::reader::ReadOptions;

/// Open a ZIP/OLE container and copy every sheet into a `Workbook`.
pub fn read_container(bytes: &[u8], options: &ReadOptions) -> Result<Workbook, FileError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| FileError::Unreadable(format!("not a recognized spreadsheet: {}", e)))?;

    let format = match &workbook {
        Sheets::Xls(_) => SourceFormat::Xls,
        Sheets::Xlsx(_) => SourceFormat::Xlsx,
        Sheets::Xlsb(_) => SourceFormat::Xlsb,
        Sheets::Ods(_) => SourceFormat::Ods,
    };

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err(FileError::Unreadable("workbook contains no sheets".into()));
    }

    let mut total_cells = 0usize;
    let mut sheets = Vec::with_capacity(sheet_names.len());

    for sheet_name in &sheet_names {
        let range = workbook
            .worksheet_range(sheet_name)
            .map_err(|e| FileError::Unreadable(format!("cannot read sheet '{}': {}", sheet_name, e)))?;

        // Guard on the dense extent before copying anything
        let (height, width) = range.get_size();
        total_cells = total_cells.saturating_add(height.saturating_mul(width));
        if total_cells > options.max_cells {
            log::warn!("sheet '{}' pushes the grid past {} cells", sheet_name, options.max_cells);
            return Err(FileError::TooLarge {
                what: "cells",
                actual: total_cells,
                limit: options.max_cells,
            });
        }

        let sheet = sheet_from_range(sheet_name, &range);
        log::debug!(
            "sheet '{}': {}x{} range, {} non-empty cells",
            sheet_name,
            height,
            width,
            sheet.cell_count()
        );
        sheets.push(sheet);
    }

    Ok(Workbook::new(format, sheets))
}

fn sheet_from_range(name: &str, range: &Range<Data>) -> Sheet {
    let mut sheet = Sheet::new(name);

    // Range start offset (data may not begin at A1)
    let (start_row, start_col) = range.start().unwrap_or((0, 0));

    for (row_idx, row) in range.rows().enumerate() {
        let target_row = start_row as usize + row_idx;
        for (col_idx, cell) in row.iter().enumerate() {
            let target_col = start_col as usize + col_idx;
            let value = cell_value(cell);
            if !value.is_blank() {
                sheet.set(target_row, target_col, value);
            }
        }
    }

    sheet
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::from_input(s),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        // Error cells stay visible as text so a numeric column reports them
        Data::Error(e) => CellValue::Text(format!("#{:?}", e)),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::from_input(s),
    }
}
