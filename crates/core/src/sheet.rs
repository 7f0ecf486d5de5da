use std::collections::HashMap;

use serde::Serialize;

use super::cell::CellValue;

static EMPTY: CellValue = CellValue::Empty;

/// Container format a workbook was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    Xlsx,
    Xls,
    Xlsb,
    Ods,
    Csv,
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Xlsx => write!(f, "xlsx"),
            Self::Xls => write!(f, "xls"),
            Self::Xlsb => write!(f, "xlsb"),
            Self::Ods => write!(f, "ods"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

/// One named grid of cells. Row and column indices are the original
/// 0-based positions in the source sheet (A1 = (0, 0)).
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    cells: HashMap<(usize, usize), CellValue>,
    /// One past the last row holding a non-empty cell
    pub rows: usize,
    /// One past the last column holding a non-empty cell
    pub cols: usize,
}

impl Sheet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cells: HashMap::new(),
            rows: 0,
            cols: 0,
        }
    }

    /// Build a sheet from rows of cells starting at A1. Test and template helper.
    pub fn from_rows(name: &str, rows: Vec<Vec<CellValue>>) -> Self {
        let mut sheet = Self::new(name);
        for (r, row) in rows.into_iter().enumerate() {
            for (c, value) in row.into_iter().enumerate() {
                sheet.set(r, c, value);
            }
        }
        sheet
    }

    /// Store a value. Blank values are not stored and do not grow the extent.
    pub fn set(&mut self, row: usize, col: usize, value: CellValue) {
        if value.is_blank() {
            self.cells.remove(&(row, col));
            return;
        }
        self.cells.insert((row, col), value);
        self.rows = self.rows.max(row + 1);
        self.cols = self.cols.max(col + 1);
    }

    pub fn get(&self, row: usize, col: usize) -> &CellValue {
        self.cells.get(&(row, col)).unwrap_or(&EMPTY)
    }

    /// Number of non-empty cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// True when every cell of the row is blank.
    pub fn row_is_blank(&self, row: usize) -> bool {
        (0..self.cols).all(|col| self.get(row, col).is_blank())
    }

    /// Cells of one row in column order, blanks included.
    pub fn row_values(&self, row: usize) -> impl Iterator<Item = (usize, &CellValue)> {
        (0..self.cols).map(move |col| (col, self.get(row, col)))
    }
}

/// Ordered sequence of sheets read from one file. Owned by a single parse
/// call and never persisted.
#[derive(Debug, Clone)]
pub struct Workbook {
    sheets: Vec<Sheet>,
    pub format: SourceFormat,
}

impl Workbook {
    pub fn new(format: SourceFormat, sheets: Vec<Sheet>) -> Self {
        Self { sheets, format }
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Case-insensitive lookup by sheet name.
    pub fn sheet_by_name(&self, name: &str) -> Option<&Sheet> {
        self.sheets
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}
