use estimate_core::SourceFormat;

use crate::config::ReconcileConfig;
use crate::extract::Extraction;
use crate::model::{ColumnMapping, ExcelParseResult, ParseMeta};
use crate::reconcile::Reconciliation;

impl ParseMeta {
    /// Stamp for a parse happening now.
    pub fn now(source_format: SourceFormat) -> Self {
        Self {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            source_format,
            parsed_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Package one sheet's parse into the immutable result handed to preview and
/// conversion. Row diagnostics come first in row order, then the
/// reconciliation findings.
pub fn assemble(
    meta: ParseMeta,
    sheet_name: &str,
    column_mapping: ColumnMapping,
    extraction: Extraction,
    reconciliation: Reconciliation,
    categories: Vec<String>,
    reconcile: &ReconcileConfig,
) -> ExcelParseResult {
    let Extraction {
        line_items,
        mut diagnostics,
        declared_totals,
    } = extraction;
    diagnostics.extend(reconciliation.diagnostics);

    ExcelParseResult {
        meta,
        sheet_name: sheet_name.to_string(),
        column_mapping,
        line_items,
        summary: reconciliation.summary,
        categories,
        diagnostics,
        declared_totals,
        reconcile: reconcile.clone(),
    }
}
