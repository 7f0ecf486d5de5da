use estimate_core::{Sheet, SourceFormat, Workbook};

use crate::assemble::assemble;
use crate::category::{get_unique_categories, CategoryNormalizer};
use crate::columns::resolve_columns;
use crate::config::PipelineConfig;
use crate::error::ImportError;
use crate::extract::extract;
use crate::model::{ColumnMapping, ExcelParseResult, ParseMeta};
use crate::reconcile::reconcile;

/// Read an uploaded file and parse the first sheet that holds an estimate.
pub fn parse_bytes(bytes: &[u8], config: &PipelineConfig) -> Result<ExcelParseResult, ImportError> {
    parse_bytes_sheet(bytes, config, None)
}

/// Like `parse_bytes`, optionally naming the sheet to parse.
pub fn parse_bytes_sheet(
    bytes: &[u8],
    config: &PipelineConfig,
    sheet: Option<&str>,
) -> Result<ExcelParseResult, ImportError> {
    let workbook = estimate_io::read_with_options(bytes, &config.reader)?;
    parse_workbook(&workbook, config, sheet)
}

/// Parse one sheet of an already-read workbook.
///
/// With `sheet` named, only that sheet is tried. Otherwise sheets are tried
/// in order and the first one whose header resolves is parsed; when none
/// does, the first sheet's header error is returned.
pub fn parse_workbook(
    workbook: &Workbook,
    config: &PipelineConfig,
    sheet: Option<&str>,
) -> Result<ExcelParseResult, ImportError> {
    let normalizer = CategoryNormalizer::new(&config.categories.aliases);

    if let Some(name) = sheet {
        let target = workbook.sheet_by_name(name).ok_or_else(|| ImportError::SheetNotFound {
            sheet: name.to_string(),
            available: workbook.sheet_names().iter().map(|s| s.to_string()).collect(),
        })?;
        let mapping = resolve_columns(target, &config.header)?;
        return Ok(parse_resolved(target, mapping, workbook.format, config, &normalizer));
    }

    let mut first_error: Option<ImportError> = None;
    for candidate in workbook.sheets() {
        match resolve_columns(candidate, &config.header) {
            Ok(mapping) => {
                return Ok(parse_resolved(candidate, mapping, workbook.format, config, &normalizer));
            }
            Err(e) => {
                log::debug!("skipping sheet '{}': {}", candidate.name, e);
                first_error.get_or_insert(e);
            }
        }
    }

    Err(first_error.unwrap_or_else(|| ImportError::NoHeaderFound {
        sheet: String::new(),
        detail: "workbook has no sheets".into(),
    }))
}

/// Parse a single sheet: resolve columns, extract, reconcile, assemble.
pub fn parse_sheet(
    sheet: &Sheet,
    format: SourceFormat,
    config: &PipelineConfig,
) -> Result<ExcelParseResult, ImportError> {
    let normalizer = CategoryNormalizer::new(&config.categories.aliases);
    let mapping = resolve_columns(sheet, &config.header)?;
    Ok(parse_resolved(sheet, mapping, format, config, &normalizer))
}

fn parse_resolved(
    sheet: &Sheet,
    mapping: ColumnMapping,
    format: SourceFormat,
    config: &PipelineConfig,
    normalizer: &CategoryNormalizer,
) -> ExcelParseResult {
    let extraction = extract(sheet, &mapping, &config.extract, normalizer);
    let reconciliation = reconcile(&extraction.line_items, &extraction.declared_totals, &config.reconcile);
    let categories = get_unique_categories(&extraction.line_items);

    let result = assemble(
        ParseMeta::now(format),
        &sheet.name,
        mapping,
        extraction,
        reconciliation,
        categories,
        &config.reconcile,
    );

    log::info!(
        "parsed sheet '{}': {} item(s), {} error(s), {} warning(s)",
        result.sheet_name(),
        result.line_items().len(),
        result.errors().count(),
        result.warnings().count()
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DiagnosticCode;
    use estimate_core::CellValue;

    fn t(s: &str) -> CellValue {
        CellValue::from_input(s)
    }

    fn workbook() -> Workbook {
        let cover = Sheet::from_rows("Cover", vec![vec![t("Smith Residence")], vec![t("Claim"), t("ABC-1")]]);
        let estimate = Sheet::from_rows(
            "Estimate",
            vec![
                vec![t("Description"), t("Total")],
                vec![t("Shingles"), t("100")],
            ],
        );
        Workbook::new(SourceFormat::Xlsx, vec![cover, estimate])
    }

    #[test]
    fn first_resolvable_sheet_wins() {
        let result = parse_workbook(&workbook(), &PipelineConfig::default(), None).unwrap();
        assert_eq!(result.sheet_name(), "Estimate");
        assert_eq!(result.line_items().len(), 1);
        assert_eq!(result.meta().source_format, SourceFormat::Xlsx);
    }

    #[test]
    fn named_sheet() {
        let err = parse_workbook(&workbook(), &PipelineConfig::default(), Some("cover")).unwrap_err();
        assert!(matches!(err, ImportError::NoHeaderFound { ref sheet, .. } if sheet == "Cover"));

        let err = parse_workbook(&workbook(), &PipelineConfig::default(), Some("Summary")).unwrap_err();
        match err {
            ImportError::SheetNotFound { sheet, available } => {
                assert_eq!(sheet, "Summary");
                assert_eq!(available, vec!["Cover", "Estimate"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn no_resolvable_sheet_reports_first() {
        let wb = Workbook::new(
            SourceFormat::Xlsx,
            vec![
                Sheet::from_rows("A", vec![vec![t("hello")]]),
                Sheet::from_rows("B", vec![vec![t("world")]]),
            ],
        );
        let err = parse_workbook(&wb, &PipelineConfig::default(), None).unwrap_err();
        assert!(matches!(err, ImportError::NoHeaderFound { ref sheet, .. } if sheet == "A"));
    }

    #[test]
    fn aliases_reach_the_normalizer() {
        let config = PipelineConfig::from_toml("[categories.aliases]\n\"tear off\" = \"Roof Removal\"\n").unwrap();
        let csv = "Category,Description,Total\nTear-Off,Remove shingles,250\n";
        let result = parse_bytes(csv.as_bytes(), &config).unwrap();
        assert_eq!(result.line_items()[0].canonical_category, "Roof Removal");
        assert_eq!(result.categories(), ["Roof Removal".to_string()]);
    }

    #[test]
    fn unreadable_bytes_fail_before_columns() {
        let err = parse_bytes(b"just some notes about the roof", &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, ImportError::File(estimate_io::FileError::Unreadable(_))));
    }

    fn codes(result: &ExcelParseResult) -> Vec<DiagnosticCode> {
        result.diagnostics().iter().map(|d| d.code).collect()
    }

    #[test]
    fn huge_amounts_become_row_errors() {
        let csv = "Description,Qty,Unit Price,Tax\nShingles,1000000000000000000000,100.00,1.00\n";
        let result = parse_bytes(csv.as_bytes(), &PipelineConfig::default()).unwrap();
        assert!(result.line_items().is_empty());
        assert_eq!(codes(&result), vec![DiagnosticCode::InvalidNumber, DiagnosticCode::NoLineItems]);
        assert!(result.has_errors());

        let csv = "Description,Total\nA,90000000000000000\nB,90000000000000000\n";
        let result = parse_bytes(csv.as_bytes(), &PipelineConfig::default()).unwrap();
        let errors: Vec<Option<usize>> = result.errors().map(|d| d.row_index).collect();
        assert_eq!(errors, vec![Some(1), Some(2)]);
        assert_eq!(result.summary().computed_grand_total_cents, 0);
    }

    const FOOTER: &str = "\
Description,Qty,Unit Price,Total
30yr shingles,20,150.00,3000.00
Ridge cap,40,12.50,500.00
Subtotal,,,3500.00
Sales Tax,,,200.00
Grand Total,,,3700.00
";

    #[test]
    fn last_total_of_a_footer_block_is_declared() {
        let result = parse_bytes(FOOTER.as_bytes(), &PipelineConfig::default()).unwrap();
        let summary = result.summary();
        assert_eq!(summary.computed_grand_total_cents, 350_000);
        assert_eq!(summary.declared_grand_total_cents, Some(370_000));
        assert_eq!(summary.declared_total_row, Some(5));
        assert_eq!(summary.discrepancy_cents, Some(-20_000));
        assert_eq!(result.declared_totals().len(), 2);
        assert_eq!(
            codes(&result),
            vec![
                DiagnosticCode::RowsAfterTotal,
                DiagnosticCode::MultipleDeclaredTotals,
                DiagnosticCode::TotalsMismatch,
            ]
        );
        assert_eq!(result.diagnostics()[0].row_index, Some(4));
    }

    #[test]
    fn first_policy_picks_the_subtotal() {
        let config = PipelineConfig::from_toml("[reconcile]\ndeclared_total = \"first\"\n").unwrap();
        let result = parse_bytes(FOOTER.as_bytes(), &config).unwrap();
        assert_eq!(result.summary().declared_total_row, Some(3));
        assert!(result.summary().reconciles());
        assert_eq!(
            codes(&result),
            vec![DiagnosticCode::RowsAfterTotal, DiagnosticCode::MultipleDeclaredTotals]
        );
    }
}
