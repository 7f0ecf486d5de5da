use std::collections::BTreeMap;

use estimate_core::{ColumnRole, SourceFormat};
use serde::Serialize;

use crate::config::ReconcileConfig;

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

/// Canonical role → column index for one sheet. Built once by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMapping {
    /// 0-based row index of the header row
    pub header_row: usize,
    columns: BTreeMap<ColumnRole, usize>,
    /// Header text as written in the sheet, per resolved role
    labels: BTreeMap<ColumnRole, String>,
}

impl ColumnMapping {
    pub fn new(header_row: usize) -> Self {
        Self {
            header_row,
            columns: BTreeMap::new(),
            labels: BTreeMap::new(),
        }
    }

    /// Add a role. The first column claiming a role keeps it.
    pub fn with_column(mut self, role: ColumnRole, col: usize, label: &str) -> Self {
        if !self.columns.contains_key(&role) {
            self.columns.insert(role, col);
            self.labels.insert(role, label.trim().to_string());
        }
        self
    }

    pub fn get(&self, role: ColumnRole) -> Option<usize> {
        self.columns.get(&role).copied()
    }

    pub fn contains(&self, role: ColumnRole) -> bool {
        self.columns.contains_key(&role)
    }

    pub fn label(&self, role: ColumnRole) -> Option<&str> {
        self.labels.get(&role).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Resolved roles with their columns, in role order.
    pub fn iter(&self) -> impl Iterator<Item = (ColumnRole, usize)> + '_ {
        self.columns.iter().map(|(role, col)| (*role, *col))
    }
}

// ---------------------------------------------------------------------------
// Line items
// ---------------------------------------------------------------------------

/// How a line total was obtained. Exactly one path per item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineTotalSource {
    /// Read from the TOTAL column
    TotalCell,
    /// quantity × unit price + tax + O&P (quantity 1 when blank)
    Computed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedLineItem {
    /// 0-based row index in the source sheet
    pub row_index: usize,
    pub raw_category: String,
    pub canonical_category: String,
    pub description: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub unit_price_cents: Option<i64>,
    pub tax_cents: Option<i64>,
    pub overhead_profit_cents: Option<i64>,
    pub line_total_cents: i64,
    pub total_source: LineTotalSource,
}

impl ParsedLineItem {
    /// Line total before tax and O&P.
    pub fn subtotal_cents(&self) -> i64 {
        self.line_total_cents
            .saturating_sub(self.tax_cents.unwrap_or(0))
            .saturating_sub(self.overhead_profit_cents.unwrap_or(0))
    }
}

/// A total row found in the sheet: a declared-total candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclaredTotal {
    pub row_index: usize,
    pub label: String,
    pub amount_cents: i64,
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedEstimateSummary {
    pub item_count: usize,
    pub computed_subtotal_cents: i64,
    pub computed_tax_cents: i64,
    pub computed_overhead_profit_cents: i64,
    pub computed_grand_total_cents: i64,
    pub declared_grand_total_cents: Option<i64>,
    /// Row the declared total was taken from
    pub declared_total_row: Option<usize>,
    /// computed − declared; None only when no total row was found
    pub discrepancy_cents: Option<i64>,
    /// Discrepancy allowed before the mismatch warning
    pub tolerance_cents: i64,
}

impl ParsedEstimateSummary {
    pub fn reconciles(&self) -> bool {
        self.discrepancy_cents
            .map(|d| d.abs() <= self.tolerance_cents)
            .unwrap_or(true)
    }
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    BlankRow,
    MissingDescription,
    SectionHeading,
    InvalidNumber,
    NegativeQuantity,
    NoAmount,
    LineTotalMismatch,
    TotalWithoutAmount,
    RowsAfterTotal,
    TotalsMismatch,
    MultipleDeclaredTotals,
    NoLineItems,
    TotalsOutOfRange,
    RowDropped,
    Recategorized,
}

impl DiagnosticCode {
    /// Codes produced by reconciliation; recomputed whenever items change.
    pub fn is_reconciliation(&self) -> bool {
        matches!(
            self,
            Self::TotalsMismatch | Self::MultipleDeclaredTotals | Self::NoLineItems | Self::TotalsOutOfRange
        )
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::BlankRow => "BLANK_ROW",
            Self::MissingDescription => "MISSING_DESCRIPTION",
            Self::SectionHeading => "SECTION_HEADING",
            Self::InvalidNumber => "INVALID_NUMBER",
            Self::NegativeQuantity => "NEGATIVE_QUANTITY",
            Self::NoAmount => "NO_AMOUNT",
            Self::LineTotalMismatch => "LINE_TOTAL_MISMATCH",
            Self::TotalWithoutAmount => "TOTAL_WITHOUT_AMOUNT",
            Self::RowsAfterTotal => "ROWS_AFTER_TOTAL",
            Self::TotalsMismatch => "TOTALS_MISMATCH",
            Self::MultipleDeclaredTotals => "MULTIPLE_DECLARED_TOTALS",
            Self::NoLineItems => "NO_LINE_ITEMS",
            Self::TotalsOutOfRange => "TOTALS_OUT_OF_RANGE",
            Self::RowDropped => "ROW_DROPPED",
            Self::Recategorized => "RECATEGORIZED",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseDiagnostic {
    pub severity: Severity,
    /// 0-based source row, None for sheet-level findings
    pub row_index: Option<usize>,
    pub message: String,
    pub code: DiagnosticCode,
}

impl ParseDiagnostic {
    pub fn warning(code: DiagnosticCode, row_index: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            row_index,
            message: message.into(),
            code,
        }
    }

    pub fn error(code: DiagnosticCode, row_index: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            row_index,
            message: message.into(),
            code,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.row_index {
            Some(row) => write!(f, "{} [{}] row {}: {}", self.severity, self.code, row + 1, self.message),
            None => write!(f, "{} [{}]: {}", self.severity, self.code, self.message),
        }
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseMeta {
    pub engine_version: String,
    pub source_format: SourceFormat,
    pub parsed_at: String,
}

/// Everything one parse produced. Immutable: preview edits return a new
/// result (see `preview`), the original is never touched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExcelParseResult {
    pub(crate) meta: ParseMeta,
    pub(crate) sheet_name: String,
    pub(crate) column_mapping: ColumnMapping,
    pub(crate) line_items: Vec<ParsedLineItem>,
    pub(crate) summary: ParsedEstimateSummary,
    pub(crate) categories: Vec<String>,
    pub(crate) diagnostics: Vec<ParseDiagnostic>,
    pub(crate) declared_totals: Vec<DeclaredTotal>,
    #[serde(skip)]
    pub(crate) reconcile: ReconcileConfig,
}

impl ExcelParseResult {
    pub fn meta(&self) -> &ParseMeta {
        &self.meta
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    pub fn column_mapping(&self) -> &ColumnMapping {
        &self.column_mapping
    }

    pub fn line_items(&self) -> &[ParsedLineItem] {
        &self.line_items
    }

    pub fn summary(&self) -> &ParsedEstimateSummary {
        &self.summary
    }

    /// Distinct canonical categories in first-seen order
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn diagnostics(&self) -> &[ParseDiagnostic] {
        &self.diagnostics
    }

    pub fn declared_totals(&self) -> &[DeclaredTotal] {
        &self.declared_totals
    }

    pub fn errors(&self) -> impl Iterator<Item = &ParseDiagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ParseDiagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_error())
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error())
    }

    /// The import action is allowed only without ERROR diagnostics.
    pub fn can_import(&self) -> bool {
        !self.has_errors()
    }
}
