// Blank estimate template for download (xlsx via rust_xlsxwriter, or CSV).
//
// The header row uses exactly the labels the column resolver recognizes, so
// "download template → fill in → upload" always resolves.

use rust_xlsxwriter::{Format, FormatBorder, Workbook as XlsxWorkbook, XlsxError};

use estimate_core::ColumnRole;

use crate::error::FileError;

pub const TEMPLATE_SHEET: &str = "Estimate";
pub const CATEGORY_SHEET: &str = "Categories";

fn write_err(e: XlsxError) -> FileError {
    FileError::Write(e.to_string())
}

fn column_width(role: ColumnRole) -> f64 {
    match role {
        ColumnRole::Description => 48.0,
        ColumnRole::Category => 18.0,
        ColumnRole::Unit => 8.0,
        _ => 12.0,
    }
}

/// Build the blank template workbook: an `Estimate` sheet with the canonical
/// header row and no data rows, plus a `Categories` reference sheet.
pub fn generate_template(categories: &[&str]) -> Result<Vec<u8>, FileError> {
    let mut workbook = XlsxWorkbook::new();

    let header_format = Format::new().set_bold().set_border_bottom(FormatBorder::Thin);
    let money_format = Format::new().set_num_format("#,##0.00");
    let quantity_format = Format::new().set_num_format("0.00");

    {
        let worksheet = workbook.add_worksheet().set_name(TEMPLATE_SHEET).map_err(write_err)?;
        for (col, role) in ColumnRole::ALL.iter().enumerate() {
            let col = col as u16;
            worksheet
                .write_string_with_format(0, col, role.header_label(), &header_format)
                .map_err(write_err)?;
            worksheet.set_column_width(col, column_width(*role)).map_err(write_err)?;

            match role {
                ColumnRole::Quantity => {
                    worksheet.set_column_format(col, &quantity_format).map_err(write_err)?;
                }
                ColumnRole::UnitPrice | ColumnRole::Tax | ColumnRole::OverheadProfit | ColumnRole::Total => {
                    worksheet.set_column_format(col, &money_format).map_err(write_err)?;
                }
                _ => {}
            }
        }
        worksheet.set_freeze_panes(1, 0).map_err(write_err)?;
    }

    {
        let worksheet = workbook.add_worksheet().set_name(CATEGORY_SHEET).map_err(write_err)?;
        worksheet
            .write_string_with_format(0, 0, "Category", &header_format)
            .map_err(write_err)?;
        worksheet.set_column_width(0, 28.0).map_err(write_err)?;
        for (i, name) in categories.iter().enumerate() {
            worksheet.write_string(i as u32 + 1, 0, *name).map_err(write_err)?;
        }
    }

    workbook.save_to_buffer().map_err(write_err)
}

/// The template header row as CSV text.
pub fn generate_csv_template() -> Result<String, FileError> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    let header: Vec<&str> = ColumnRole::ALL.iter().map(|r| r.header_label()).collect();
    writer
        .write_record(&header)
        .map_err(|e| FileError::Write(e.to_string()))?;
    let bytes = writer
        .into_inner()
        .map_err(|e| FileError::Write(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| FileError::Write(e.to_string()))
}
