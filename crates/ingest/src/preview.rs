//! Preview edits. Each edit returns a new result with summary, categories
//! and reconciliation findings recomputed; the receiver is left untouched.

use std::collections::BTreeSet;

use crate::category::get_unique_categories;
use crate::error::ImportError;
use crate::label::tidy;
use crate::model::{DiagnosticCode, ExcelParseResult, ParseDiagnostic, ParsedLineItem};
use crate::reconcile::reconcile;

impl ExcelParseResult {
    /// Drop the given rows: their line items, their row diagnostics (errors
    /// included) and any declared total they carried. A row with none of
    /// these is `RowNotFound`.
    pub fn without_rows(&self, rows: &[usize]) -> Result<ExcelParseResult, ImportError> {
        let touched: BTreeSet<usize> = rows.iter().copied().collect();
        if let Some(row) = touched.iter().copied().find(|r| !self.holds_row(*r)) {
            return Err(ImportError::RowNotFound(row));
        }
        if touched.is_empty() {
            return Ok(self.clone());
        }

        let line_items: Vec<ParsedLineItem> = self
            .line_items
            .iter()
            .filter(|i| !touched.contains(&i.row_index))
            .cloned()
            .collect();

        let mut next = self.clone();
        next.declared_totals.retain(|d| !touched.contains(&d.row_index));
        next.diagnostics.retain(|d| match d.row_index {
            Some(r) => !touched.contains(&r) || d.code.is_reconciliation(),
            None => true,
        });
        for row in &touched {
            next.diagnostics.push(ParseDiagnostic::warning(
                DiagnosticCode::RowDropped,
                Some(*row),
                format!("row {} dropped in preview", row + 1),
            ));
        }
        log::debug!("preview: dropped {} row(s)", touched.len());
        Ok(next.recomputed(line_items))
    }

    fn holds_row(&self, row: usize) -> bool {
        self.line_items.iter().any(|i| i.row_index == row)
            || self.declared_totals.iter().any(|d| d.row_index == row)
            || self
                .diagnostics
                .iter()
                .any(|d| d.row_index == Some(row) && !d.code.is_reconciliation())
    }

    /// Move one line item to another canonical category.
    pub fn with_category(&self, row: usize, category: &str) -> Result<ExcelParseResult, ImportError> {
        let index = self
            .line_items
            .iter()
            .position(|i| i.row_index == row)
            .ok_or(ImportError::RowNotFound(row))?;

        let category = tidy(category);
        let previous = &self.line_items[index].canonical_category;
        if category.is_empty() || *previous == category {
            return Ok(self.clone());
        }

        let message = format!("row {} moved from '{}' to '{}'", row + 1, previous, category);
        let mut line_items = self.line_items.clone();
        line_items[index].canonical_category = category;

        let mut next = self.clone();
        next.diagnostics.push(ParseDiagnostic::warning(DiagnosticCode::Recategorized, Some(row), message));
        Ok(next.recomputed(line_items))
    }

    /// Swap in new line items and rebuild everything derived from them.
    fn recomputed(mut self, line_items: Vec<ParsedLineItem>) -> ExcelParseResult {
        let reconciliation = reconcile(&line_items, &self.declared_totals, &self.reconcile);
        self.diagnostics.retain(|d| !d.code.is_reconciliation());
        self.diagnostics.extend(reconciliation.diagnostics);
        self.summary = reconciliation.summary;
        self.categories = get_unique_categories(&line_items);
        self.line_items = line_items;
        self
    }
}
