use std::sync::OnceLock;

use estimate_core::money::{checked_sum, cents_from_f64, extend_price, format_cents, parse_cents, parse_financial_number};
use estimate_core::{CellValue, ColumnRole, Sheet};
use regex::Regex;

use crate::category::CategoryNormalizer;
use crate::config::ExtractConfig;
use crate::label::{normalize_label, tidy};
use crate::model::{
    ColumnMapping, DeclaredTotal, DiagnosticCode, LineTotalSource, ParseDiagnostic, ParsedLineItem,
};

/// Labels that mark a row as a declared aggregate rather than a line item
/// (`normalize_label` form).
const SENTINELS: &[&str] = &[
    "total",
    "totals",
    "grand total",
    "subtotal",
    "sub total",
    "estimate total",
    "total estimate",
];

/// Largest quantity a line item may carry.
const MAX_QUANTITY: f64 = 1.0e12;

pub fn is_sentinel(text: &str) -> bool {
    SENTINELS.contains(&normalize_label(text).as_str())
}

/// Line items, row diagnostics and declared-total candidates of one sheet.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub line_items: Vec<ParsedLineItem>,
    pub diagnostics: Vec<ParseDiagnostic>,
    pub declared_totals: Vec<DeclaredTotal>,
}

/// Running category state while walking rows.
struct CategoryCursor<'a> {
    normalizer: &'a CategoryNormalizer,
    default: &'a str,
    current: Option<String>,
}

impl CategoryCursor<'_> {
    /// (raw, canonical) for a row. A non-blank cell also becomes the running
    /// category for the rows below it.
    fn resolve(&mut self, cell: Option<&str>) -> (String, String) {
        if let Some(text) = cell {
            self.current = Some(tidy(text));
        }
        match &self.current {
            Some(raw) => (raw.clone(), self.normalizer.normalize(raw)),
            None => (self.default.to_string(), self.default.to_string()),
        }
    }
}

/// Walk the rows below the header, producing one line item per valid row.
///
/// Rows are never fatal: anything skipped leaves a diagnostic behind.
pub fn extract(
    sheet: &Sheet,
    mapping: &ColumnMapping,
    config: &ExtractConfig,
    normalizer: &CategoryNormalizer,
) -> Extraction {
    let mut out = Extraction::default();
    let mut categories = CategoryCursor {
        normalizer,
        default: &config.default_category,
        current: None,
    };
    let mut stopped_at: Option<usize> = None;
    let mut unread_rows = 0usize;
    let mut first_unread: Option<usize> = None;

    for row in (mapping.header_row + 1)..sheet.rows {
        if sheet.row_is_blank(row) {
            if stopped_at.is_none() {
                out.diagnostics.push(ParseDiagnostic::warning(
                    DiagnosticCode::BlankRow,
                    Some(row),
                    "blank row skipped",
                ));
            }
            continue;
        }

        // Total rows below the first one are still declared-total candidates.
        if let Some(label) = sentinel_label(sheet, row, mapping) {
            match sentinel_amount(sheet, row, mapping) {
                Some(amount_cents) => {
                    log::debug!("row {}: declared total '{}' = {}", row + 1, label, amount_cents);
                    out.declared_totals.push(DeclaredTotal {
                        row_index: row,
                        label,
                        amount_cents,
                    });
                    if config.stop_at_first_total && stopped_at.is_none() {
                        stopped_at = Some(row);
                    }
                }
                None => out.diagnostics.push(ParseDiagnostic::warning(
                    DiagnosticCode::TotalWithoutAmount,
                    Some(row),
                    format!("'{label}' row has no amount; ignored"),
                )),
            }
            continue;
        }

        if stopped_at.is_some() {
            unread_rows += 1;
            first_unread.get_or_insert(row);
            continue;
        }

        if let Some(heading) = section_heading(sheet, row, mapping) {
            let (_, canonical) = categories.resolve(Some(heading.as_str()));
            out.diagnostics.push(ParseDiagnostic::warning(
                DiagnosticCode::SectionHeading,
                Some(row),
                format!("section heading '{heading}' applies category '{canonical}' to the rows below"),
            ));
            continue;
        }

        match extract_row(sheet, row, mapping, config, &mut categories) {
            RowOutcome::Item(item, warnings) => {
                out.line_items.push(item);
                out.diagnostics.extend(warnings);
            }
            RowOutcome::Skipped(diagnostic) => out.diagnostics.push(diagnostic),
        }
    }

    if let (Some(total_row), Some(first)) = (stopped_at, first_unread) {
        out.diagnostics.push(ParseDiagnostic::warning(
            DiagnosticCode::RowsAfterTotal,
            Some(first),
            format!(
                "{unread_rows} non-blank row(s) below the total on row {} were not read",
                total_row + 1
            ),
        ));
    }

    log::debug!(
        "sheet '{}': {} line item(s), {} diagnostic(s), {} total row(s)",
        sheet.name,
        out.line_items.len(),
        out.diagnostics.len(),
        out.declared_totals.len()
    );
    out
}

// ---------------------------------------------------------------------------
// Row classification
// ---------------------------------------------------------------------------

static UNMAPPED: CellValue = CellValue::Empty;

fn cell<'a>(sheet: &'a Sheet, row: usize, mapping: &ColumnMapping, role: ColumnRole) -> &'a CellValue {
    match mapping.get(role) {
        Some(col) => sheet.get(row, col),
        None => &UNMAPPED,
    }
}

fn cell_text<'a>(sheet: &'a Sheet, row: usize, mapping: &ColumnMapping, role: ColumnRole) -> Option<&'a str> {
    cell(sheet, row, mapping, role).as_text()
}

/// Sentinel label of a total row. Checks DESCRIPTION, then CATEGORY, then the
/// first text cell of the row; only the first of those that holds text counts.
fn sentinel_label(sheet: &Sheet, row: usize, mapping: &ColumnMapping) -> Option<String> {
    let text = cell_text(sheet, row, mapping, ColumnRole::Description)
        .or_else(|| cell_text(sheet, row, mapping, ColumnRole::Category))
        .or_else(|| sheet.row_values(row).find_map(|(_, v)| v.as_text()))?;
    is_sentinel(text).then(|| tidy(text))
}

/// TOTAL cell of a total row, else its right-most numeric cell.
fn sentinel_amount(sheet: &Sheet, row: usize, mapping: &ColumnMapping) -> Option<i64> {
    if let Some(cents) = money(cell(sheet, row, mapping, ColumnRole::Total)).ok().flatten() {
        return Some(cents);
    }
    let values: Vec<(usize, &CellValue)> = sheet.row_values(row).collect();
    values
        .into_iter()
        .rev()
        .find_map(|(_, value)| money(value).ok().flatten())
}

/// Text alone in the CATEGORY or DESCRIPTION column.
fn section_heading(sheet: &Sheet, row: usize, mapping: &ColumnMapping) -> Option<String> {
    let mut filled = sheet.row_values(row).filter(|(_, v)| !v.is_blank());
    let (col, value) = filled.next()?;
    if filled.next().is_some() {
        return None;
    }
    let text = value.as_text()?;
    let in_heading_column = mapping.get(ColumnRole::Category) == Some(col)
        || mapping.get(ColumnRole::Description) == Some(col);
    (in_heading_column && parse_financial_number(text).is_none()).then(|| tidy(text))
}

// ---------------------------------------------------------------------------
// Line items
// ---------------------------------------------------------------------------

enum RowOutcome {
    Item(ParsedLineItem, Vec<ParseDiagnostic>),
    Skipped(ParseDiagnostic),
}

/// Numeric cells of one row, parsed.
#[derive(Default)]
struct Amounts {
    quantity: Option<f64>,
    embedded_unit: Option<String>,
    unit_price: Option<i64>,
    tax: Option<i64>,
    overhead_profit: Option<i64>,
    total: Option<i64>,
}

fn extract_row(
    sheet: &Sheet,
    row: usize,
    mapping: &ColumnMapping,
    config: &ExtractConfig,
    categories: &mut CategoryCursor<'_>,
) -> RowOutcome {
    let category_cell = cell_text(sheet, row, mapping, ColumnRole::Category);

    let description = tidy(&cell(sheet, row, mapping, ColumnRole::Description).raw_display());
    if description.is_empty() {
        // Still a category for the rows below.
        if category_cell.is_some() {
            categories.resolve(category_cell);
        }
        return RowOutcome::Skipped(ParseDiagnostic::warning(
            DiagnosticCode::MissingDescription,
            Some(row),
            "row has no description; skipped",
        ));
    }

    let amounts = match read_amounts(sheet, row, mapping) {
        Ok(a) => a,
        Err(problems) => {
            return RowOutcome::Skipped(ParseDiagnostic::error(
                DiagnosticCode::InvalidNumber,
                Some(row),
                problems.join("; "),
            ))
        }
    };

    if let Some(q) = amounts.quantity {
        if q < 0.0 {
            return RowOutcome::Skipped(ParseDiagnostic::error(
                DiagnosticCode::NegativeQuantity,
                Some(row),
                format!("quantity {q} is negative"),
            ));
        }
    }

    let out_of_range = || {
        RowOutcome::Skipped(ParseDiagnostic::error(
            DiagnosticCode::InvalidNumber,
            Some(row),
            format!("line total of '{description}' is out of range"),
        ))
    };

    let Some(extras) = checked_sum([amounts.tax.unwrap_or(0), amounts.overhead_profit.unwrap_or(0)]) else {
        return out_of_range();
    };
    let mut warnings = Vec::new();

    let (line_total_cents, total_source) = match (amounts.total, amounts.unit_price) {
        (Some(total), price) => {
            if let (Some(q), Some(p)) = (amounts.quantity, price) {
                match extend_price(q, p).and_then(|extended| checked_sum([extended, extras])) {
                    Some(expected) if (total - expected).abs() > config.line_tolerance_cents => {
                        warnings.push(ParseDiagnostic::warning(
                            DiagnosticCode::LineTotalMismatch,
                            Some(row),
                            format!(
                                "total {} differs from quantity × unit price{} = {}; using the total",
                                format_cents(total),
                                if extras != 0 { " + tax + O&P" } else { "" },
                                format_cents(expected)
                            ),
                        ));
                    }
                    Some(_) => {}
                    None => warnings.push(ParseDiagnostic::warning(
                        DiagnosticCode::LineTotalMismatch,
                        Some(row),
                        format!(
                            "quantity × unit price is out of range; using the total {}",
                            format_cents(total)
                        ),
                    )),
                }
            }
            (total, LineTotalSource::TotalCell)
        }
        (None, Some(price)) => {
            let q = amounts.quantity.unwrap_or(1.0);
            match extend_price(q, price).and_then(|extended| checked_sum([extended, extras])) {
                Some(total) => (total, LineTotalSource::Computed),
                None => return out_of_range(),
            }
        }
        (None, None) => {
            if category_cell.is_some() {
                categories.resolve(category_cell);
            }
            return RowOutcome::Skipped(ParseDiagnostic::warning(
                DiagnosticCode::NoAmount,
                Some(row),
                format!("'{description}' has neither a total nor a unit price; skipped"),
            ));
        }
    };

    let unit = cell(sheet, row, mapping, ColumnRole::Unit)
        .as_text()
        .map(tidy)
        .or(amounts.embedded_unit);

    let (raw_category, canonical_category) = categories.resolve(category_cell);

    RowOutcome::Item(
        ParsedLineItem {
            row_index: row,
            raw_category,
            canonical_category,
            description,
            quantity: amounts.quantity,
            unit,
            unit_price_cents: amounts.unit_price,
            tax_cents: amounts.tax,
            overhead_profit_cents: amounts.overhead_profit,
            line_total_cents,
            total_source,
        },
        warnings,
    )
}

/// Parse every numeric cell of the row. Errors list each offending cell.
fn read_amounts(sheet: &Sheet, row: usize, mapping: &ColumnMapping) -> Result<Amounts, Vec<String>> {
    let mut amounts = Amounts::default();
    let mut problems = Vec::new();

    for role in ColumnRole::ALL.into_iter().filter(ColumnRole::is_numeric) {
        let value = cell(sheet, row, mapping, role);
        let parsed = match role {
            ColumnRole::Quantity => quantity(value).map(|q| {
                if let Some((q, unit)) = q {
                    amounts.quantity = Some(q);
                    amounts.embedded_unit = unit;
                }
                None
            }),
            _ => money(value),
        };
        let parsed = match parsed {
            Ok(v) => v,
            Err(bad) => {
                let label = mapping.label(role).unwrap_or(role.header_label());
                problems.push(format!("{label} '{}' {bad}", value.raw_display()));
                continue;
            }
        };
        match role {
            ColumnRole::UnitPrice => amounts.unit_price = parsed,
            ColumnRole::Tax => amounts.tax = parsed,
            ColumnRole::OverheadProfit => amounts.overhead_profit = parsed,
            ColumnRole::Total => amounts.total = parsed,
            _ => {}
        }
    }

    if problems.is_empty() {
        Ok(amounts)
    } else {
        Err(problems)
    }
}

/// Why a numeric cell was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BadNumber {
    NotANumber,
    OutOfRange,
}

impl std::fmt::Display for BadNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotANumber => write!(f, "is not a number"),
            Self::OutOfRange => write!(f, "is out of range"),
        }
    }
}

/// Currency cell → cents. `Ok(None)` for blank cells.
fn money(value: &CellValue) -> Result<Option<i64>, BadNumber> {
    match value {
        CellValue::Empty => Ok(None),
        CellValue::Number(n) if !n.is_finite() => Err(BadNumber::NotANumber),
        CellValue::Number(n) => cents_from_f64(*n).map(Some).ok_or(BadNumber::OutOfRange),
        CellValue::Text(s) if s.trim().is_empty() => Ok(None),
        CellValue::Text(s) => match parse_cents(s) {
            Some(cents) => Ok(Some(cents)),
            None if parse_financial_number(s).is_some() => Err(BadNumber::OutOfRange),
            None => Err(BadNumber::NotANumber),
        },
    }
}

fn quantity_with_unit() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([+-]?[\d,]*\.?\d+)\s*([A-Za-z][A-Za-z/.]*)$").ok())
        .as_ref()
}

/// Quantity cell → (quantity, embedded unit). `"24.00 SF"` → `(24.0, Some("SF"))`.
fn quantity(value: &CellValue) -> Result<Option<(f64, Option<String>)>, BadNumber> {
    let parsed = match value {
        CellValue::Empty => None,
        CellValue::Number(n) if n.is_finite() => Some((*n, None)),
        CellValue::Number(_) => return Err(BadNumber::NotANumber),
        CellValue::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else if let Some(q) = parse_financial_number(s) {
                Some((q, None))
            } else {
                let caps = quantity_with_unit()
                    .and_then(|re| re.captures(s))
                    .ok_or(BadNumber::NotANumber)?;
                let q = parse_financial_number(&caps[1]).ok_or(BadNumber::NotANumber)?;
                Some((q, Some(caps[2].to_string())))
            }
        }
    };
    match parsed {
        Some((q, _)) if !q.is_finite() || q.abs() > MAX_QUANTITY => Err(BadNumber::OutOfRange),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::resolve_columns;
    use crate::config::HeaderConfig;

    fn t(s: &str) -> CellValue {
        CellValue::from_input(s)
    }

    fn n(v: f64) -> CellValue {
        CellValue::Number(v)
    }

    fn run(rows: Vec<Vec<CellValue>>) -> Extraction {
        run_with(rows, &ExtractConfig::default())
    }

    fn run_with(rows: Vec<Vec<CellValue>>, config: &ExtractConfig) -> Extraction {
        let sheet = Sheet::from_rows("Estimate", rows);
        let mapping = resolve_columns(&sheet, &HeaderConfig::default()).unwrap();
        extract(&sheet, &mapping, config, &CategoryNormalizer::default())
    }

    fn header() -> Vec<CellValue> {
        ["Category", "Description", "Qty", "Unit Price", "Total"].iter().map(|s| t(s)).collect()
    }

    fn codes(ex: &Extraction) -> Vec<DiagnosticCode> {
        ex.diagnostics.iter().map(|d| d.code).collect()
    }

    #[test]
    fn scenario_rows() {
        let ex = run(vec![
            header(),
            vec![t("Roofing"), t("30yr shingles"), n(20.0), n(150.0), n(3000.0)],
            vec![t("Roofing"), t("Ridge cap"), n(40.0), n(12.5), n(500.0)],
            vec![t("Total"), t(""), t(""), t(""), n(3500.0)],
        ]);
        assert_eq!(ex.line_items.len(), 2);
        assert!(ex.diagnostics.is_empty(), "{:?}", ex.diagnostics);
        assert_eq!(ex.line_items[0].row_index, 1);
        assert_eq!(ex.line_items[0].line_total_cents, 300_000);
        assert_eq!(ex.line_items[0].total_source, LineTotalSource::TotalCell);
        assert_eq!(ex.line_items[1].unit_price_cents, Some(1250));
        assert_eq!(ex.declared_totals.len(), 1);
        assert_eq!(ex.declared_totals[0].row_index, 3);
        assert_eq!(ex.declared_totals[0].amount_cents, 350_000);
    }

    #[test]
    fn garbage_quantity_is_row_error() {
        let ex = run(vec![
            header(),
            vec![t("Roofing"), t("Shingles"), t("abc"), n(150.0), n(3000.0)],
            vec![t("Roofing"), t("Ridge cap"), n(40.0), n(12.5), n(500.0)],
        ]);
        assert_eq!(ex.line_items.len(), 1);
        assert_eq!(ex.diagnostics.len(), 1);
        let d = &ex.diagnostics[0];
        assert!(d.is_error());
        assert_eq!(d.code, DiagnosticCode::InvalidNumber);
        assert_eq!(d.row_index, Some(1));
        assert!(d.message.contains("Qty 'abc'"), "{}", d.message);
    }

    #[test]
    fn currency_text_is_tolerated() {
        let ex = run(vec![
            header(),
            vec![t("Roofing"), t("Shingles"), t(" 1,200 "), t("$1.50"), t("$1,800.00")],
        ]);
        assert!(ex.diagnostics.is_empty(), "{:?}", ex.diagnostics);
        assert_eq!(ex.line_items[0].quantity, Some(1200.0));
        assert_eq!(ex.line_items[0].line_total_cents, 180_000);
    }

    #[test]
    fn computed_total_without_total_cell() {
        let ex = run(vec![
            vec![t("Description"), t("Qty"), t("Unit"), t("Unit Price"), t("Tax"), t("O&P")],
            vec![t("Drywall patch"), t("24.00 SF"), t(""), n(2.25), n(3.0), n(10.0)],
            vec![t("Trip charge"), t(""), t(""), n(75.0), t(""), t("")],
        ]);
        assert!(ex.diagnostics.is_empty(), "{:?}", ex.diagnostics);
        let patch = &ex.line_items[0];
        assert_eq!(patch.quantity, Some(24.0));
        assert_eq!(patch.unit.as_deref(), Some("SF"));
        assert_eq!(patch.line_total_cents, 5400 + 300 + 1000);
        assert_eq!(patch.total_source, LineTotalSource::Computed);

        let trip = &ex.line_items[1];
        assert_eq!(trip.quantity, None);
        assert_eq!(trip.line_total_cents, 7500);
        assert_eq!(trip.canonical_category, "General");
    }

    #[test]
    fn unit_cell_beats_embedded_unit() {
        let ex = run(vec![
            vec![t("Description"), t("Qty"), t("Unit"), t("Total")],
            vec![t("Felt"), t("3 SQ"), t("RL"), n(90.0)],
        ]);
        assert_eq!(ex.line_items[0].unit.as_deref(), Some("RL"));
    }

    #[test]
    fn line_math_mismatch_warns_total_wins() {
        let ex = run(vec![
            header(),
            vec![t("Roofing"), t("Shingles"), n(20.0), n(150.0), n(3100.0)],
            vec![t("Roofing"), t("Ridge cap"), n(3.0), n(0.333), n(1.0)],
        ]);
        assert_eq!(codes(&ex), vec![DiagnosticCode::LineTotalMismatch]);
        assert_eq!(ex.diagnostics[0].row_index, Some(1));
        assert_eq!(ex.line_items[0].line_total_cents, 310_000);
        // 3 × 0.33 = 0.99, inside the one-cent tolerance.
        assert_eq!(ex.line_items[1].line_total_cents, 100);
    }

    #[test]
    fn skipped_rows_leave_warnings() {
        let ex = run(vec![
            header(),
            vec![t("Roofing"), t("Shingles"), n(1.0), n(10.0), n(10.0)],
            vec![],
            vec![t(""), t(""), n(3.0), n(1.0), n(3.0)],
            vec![t(""), t("Haul debris"), n(1.0), t(""), t("")],
            vec![t(""), t("Underlayment"), n(-2.0), n(5.0), t("")],
        ]);
        assert_eq!(
            codes(&ex),
            vec![
                DiagnosticCode::BlankRow,
                DiagnosticCode::MissingDescription,
                DiagnosticCode::NoAmount,
                DiagnosticCode::NegativeQuantity,
            ]
        );
        assert!(ex.diagnostics[3].is_error());
        assert!(!ex.diagnostics[2].is_error());
        assert_eq!(ex.line_items.len(), 1);
    }

    #[test]
    fn section_headings_and_inheritance() {
        let ex = run(vec![
            header(),
            vec![t(""), t("Gutters"), t(""), t(""), t("")],
            vec![t(""), t("Seamless gutter"), n(100.0), n(8.0), n(800.0)],
            vec![t("RFG"), t("Shingles"), n(10.0), n(100.0), n(1000.0)],
            vec![t(""), t("Drip edge"), n(10.0), n(2.0), n(20.0)],
        ]);
        assert_eq!(codes(&ex), vec![DiagnosticCode::SectionHeading]);
        let cats: Vec<&str> = ex.line_items.iter().map(|i| i.canonical_category.as_str()).collect();
        assert_eq!(cats, vec!["Gutters", "Roofing", "Roofing"]);
        assert_eq!(ex.line_items[2].raw_category, "RFG");
    }

    #[test]
    fn default_category_is_not_normalized() {
        let config = ExtractConfig {
            default_category: "Misc Work".into(),
            ..ExtractConfig::default()
        };
        let ex = run_with(
            vec![
                vec![t("Description"), t("Total")],
                vec![t("Item"), n(5.0)],
            ],
            &config,
        );
        assert_eq!(ex.line_items[0].canonical_category, "Misc Work");
        assert_eq!(ex.line_items[0].raw_category, "Misc Work");
    }

    #[test]
    fn stops_at_first_total_and_reports_footer() {
        let ex = run(vec![
            header(),
            vec![t("Roofing"), t("Shingles"), n(1.0), n(10.0), n(10.0)],
            vec![t(""), t("Subtotal"), t(""), t(""), n(10.0)],
            vec![t("Painting"), t("Walls"), n(1.0), n(5.0), n(5.0)],
            vec![t(""), t("Grand Total"), t(""), t(""), n(15.0)],
        ]);
        assert_eq!(ex.line_items.len(), 1);
        let totals: Vec<(usize, i64)> = ex.declared_totals.iter().map(|d| (d.row_index, d.amount_cents)).collect();
        assert_eq!(totals, vec![(2, 1000), (4, 1500)]);
        assert_eq!(codes(&ex), vec![DiagnosticCode::RowsAfterTotal]);
        assert_eq!(ex.diagnostics[0].row_index, Some(3));
        assert!(ex.diagnostics[0].message.starts_with("1 non-blank row(s) below the total on row 3"));
    }

    #[test]
    fn footer_block_totals_are_all_candidates() {
        let ex = run(vec![
            header(),
            vec![t("Roofing"), t("30yr shingles"), n(20.0), n(150.0), n(3000.0)],
            vec![t("Roofing"), t("Ridge cap"), n(40.0), n(12.5), n(500.0)],
            vec![t(""), t("Subtotal"), t(""), t(""), n(3500.0)],
            vec![t(""), t("Sales Tax"), t(""), t(""), n(200.0)],
            vec![],
            vec![t(""), t("Grand Total"), t(""), t(""), n(3700.0)],
        ]);
        assert_eq!(ex.line_items.len(), 2);
        let totals: Vec<(usize, i64)> = ex.declared_totals.iter().map(|d| (d.row_index, d.amount_cents)).collect();
        assert_eq!(totals, vec![(3, 350_000), (6, 370_000)]);
        assert_eq!(ex.declared_totals[1].label, "Grand Total");
        // Only the tax row went unread; the blank row below the total is silent.
        assert_eq!(codes(&ex), vec![DiagnosticCode::RowsAfterTotal]);
        assert_eq!(ex.diagnostics[0].row_index, Some(4));
        assert!(ex.diagnostics[0].message.starts_with("1 non-blank row(s)"));
    }

    #[test]
    fn collects_all_totals_when_not_stopping() {
        let config = ExtractConfig {
            stop_at_first_total: false,
            ..ExtractConfig::default()
        };
        let ex = run_with(
            vec![
                header(),
                vec![t("Roofing"), t("Shingles"), n(1.0), n(10.0), n(10.0)],
                vec![t(""), t("Subtotal:"), t(""), t(""), n(10.0)],
                vec![t("Painting"), t("Walls"), n(1.0), n(5.0), n(5.0)],
                vec![t(""), t("GRAND TOTAL"), t(""), t(""), t("$15.00")],
            ],
            &config,
        );
        assert_eq!(ex.line_items.len(), 2);
        let totals: Vec<i64> = ex.declared_totals.iter().map(|d| d.amount_cents).collect();
        assert_eq!(totals, vec![1000, 1500]);
        assert_eq!(ex.declared_totals[0].label, "Subtotal:");
    }

    #[test]
    fn total_amount_falls_back_to_rightmost_number() {
        let ex = run(vec![
            vec![t("Description"), t("Unit Price"), t("Notes")],
            vec![t("Labor"), n(100.0), t("")],
            vec![t("Total"), n(100.0), t("")],
        ]);
        assert_eq!(ex.declared_totals[0].amount_cents, 10_000);

        let ex = run(vec![
            vec![t("Description"), t("Unit Price"), t("Total")],
            vec![t("Labor"), n(100.0), t("")],
            vec![t("Total"), t(""), t("")],
        ]);
        assert!(ex.declared_totals.is_empty());
        assert_eq!(codes(&ex), vec![DiagnosticCode::TotalWithoutAmount]);
    }

    #[test]
    fn sentinel_must_be_whole_label() {
        let ex = run(vec![
            header(),
            vec![t("Roofing"), t("Total tear off"), n(1.0), n(10.0), n(10.0)],
        ]);
        assert_eq!(ex.line_items.len(), 1);
        assert!(ex.declared_totals.is_empty());
    }

    #[test]
    fn quantity_parsing() {
        assert_eq!(quantity(&t("24.00 SF")), Ok(Some((24.0, Some("SF".into())))));
        assert_eq!(quantity(&t("1,250LF")), Ok(Some((1250.0, Some("LF".into())))));
        assert_eq!(quantity(&t("3")), Ok(Some((3.0, None))));
        assert_eq!(quantity(&CellValue::Empty), Ok(None));
        assert_eq!(quantity(&t("abc")), Err(BadNumber::NotANumber));
        assert_eq!(quantity(&t("SF 24")), Err(BadNumber::NotANumber));
        assert_eq!(quantity(&n(f64::NAN)), Err(BadNumber::NotANumber));
        assert_eq!(quantity(&t("1e3")), Err(BadNumber::NotANumber));
        assert_eq!(quantity(&n(2.0e12)), Err(BadNumber::OutOfRange));
    }

    #[test]
    fn out_of_range_amounts_are_row_errors() {
        let ex = run(vec![
            vec![t("Description"), t("Qty"), t("Unit Price"), t("Tax")],
            vec![t("Shingles"), t("1000000000000000000000"), n(100.0), n(1.0)],
            vec![t("Felt"), n(2.0), t("90000000000000000"), t("")],
            vec![t("Drip edge"), n(1.0e11), n(90_000_000.0), t("")],
            vec![t("Vents"), n(2.0), n(10.0), t("")],
        ]);
        assert_eq!(
            codes(&ex),
            vec![DiagnosticCode::InvalidNumber, DiagnosticCode::InvalidNumber, DiagnosticCode::InvalidNumber]
        );
        assert!(ex.diagnostics.iter().all(|d| d.is_error()));
        let rows: Vec<Option<usize>> = ex.diagnostics.iter().map(|d| d.row_index).collect();
        assert_eq!(rows, vec![Some(1), Some(2), Some(3)]);
        assert_eq!(ex.diagnostics[0].message, "Qty '1000000000000000000000' is out of range");
        assert_eq!(ex.diagnostics[1].message, "Unit Price '90000000000000000' is out of range");
        assert_eq!(ex.diagnostics[2].message, "line total of 'Drip edge' is out of range");

        assert_eq!(ex.line_items.len(), 1);
        assert_eq!(ex.line_items[0].line_total_cents, 2_000);
    }
}
