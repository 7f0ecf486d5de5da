use estimate_core::{ColumnRole, Sheet};

use crate::config::HeaderConfig;
use crate::error::ImportError;
use crate::label::normalize_label;
use crate::model::ColumnMapping;

// ---------------------------------------------------------------------------
// Synonym dictionary
// ---------------------------------------------------------------------------

/// Header synonyms per role, already in `normalize_label` form.
const SYNONYMS: &[(ColumnRole, &[&str])] = &[
    (
        ColumnRole::Category,
        &["category", "categories", "cat", "trade", "group", "section", "division", "area", "room", "cat code", "category code"],
    ),
    (
        ColumnRole::Description,
        &[
            "description", "desc", "item", "item description", "line item", "line item description",
            "work description", "scope", "scope of work", "activity", "task", "details",
        ],
    ),
    (
        ColumnRole::Quantity,
        &["quantity", "qty", "quant", "qnty", "count", "units", "no of units", "amount of units"],
    ),
    (
        ColumnRole::Unit,
        &["unit", "uom", "u m", "unit of measure", "measure", "um"],
    ),
    (
        ColumnRole::UnitPrice,
        &[
            "unit price", "unit cost", "price", "rate", "unit rate", "price per unit", "cost per unit",
            "remove", "replace", "price each", "each",
        ],
    ),
    (
        ColumnRole::Tax,
        &["tax", "taxes", "sales tax", "material tax"],
    ),
    (
        ColumnRole::OverheadProfit,
        &["o and p", "op", "overhead and profit", "overhead profit", "o p", "overhead"],
    ),
    (
        ColumnRole::Total,
        &["total", "line total", "total cost", "total price", "extended", "extended price", "ext price", "amount", "rcv", "cost", "line amount"],
    ),
];

/// Role of one header cell, if its text is a known synonym.
pub fn match_header(text: &str) -> Option<ColumnRole> {
    let key = strip_currency_token(&normalize_label(text));
    if key.is_empty() {
        return None;
    }
    SYNONYMS
        .iter()
        .find(|(_, words)| words.contains(&key.as_str()))
        .map(|(role, _)| *role)
}

/// "unit price usd" → "unit price"
fn strip_currency_token(key: &str) -> String {
    key.strip_suffix(" usd")
        .or_else(|| key.strip_suffix(" dollars"))
        .unwrap_or(key)
        .to_string()
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Candidate header row: its mapping plus how many roles it matched.
fn score_row(sheet: &Sheet, row: usize) -> ColumnMapping {
    let mut mapping = ColumnMapping::new(row);
    for (col, value) in sheet.row_values(row) {
        let Some(text) = value.as_text() else { continue };
        if let Some(role) = match_header(text) {
            mapping = mapping.with_column(role, col, text);
        }
    }
    mapping
}

/// Locate the header row among the first `scan_rows` rows and map its
/// columns to canonical roles.
///
/// The row matching the most distinct roles wins; ties go to the earlier
/// row. A winner must reach `min_matches` and resolve DESCRIPTION plus one
/// of UNIT_PRICE / TOTAL.
pub fn resolve_columns(sheet: &Sheet, config: &HeaderConfig) -> Result<ColumnMapping, ImportError> {
    let scan = config.scan_rows.min(sheet.rows);
    let mut best: Option<ColumnMapping> = None;

    for row in 0..scan {
        let candidate = score_row(sheet, row);
        if candidate.is_empty() || candidate.len() < config.min_matches {
            continue;
        }
        let better = match &best {
            Some(b) => candidate.len() > b.len(),
            None => true,
        };
        if better {
            best = Some(candidate);
        }
    }

    let Some(mapping) = best else {
        log::debug!("sheet '{}': no header row in first {} rows", sheet.name, scan);
        return Err(ImportError::NoHeaderFound {
            sheet: sheet.name.clone(),
            detail: format!(
                "no row in the first {} matched at least {} column names",
                config.scan_rows, config.min_matches
            ),
        });
    };

    if !mapping.contains(ColumnRole::Description) {
        return Err(missing(sheet, &mapping, "no Description column"));
    }
    if !mapping.contains(ColumnRole::UnitPrice) && !mapping.contains(ColumnRole::Total) {
        return Err(missing(sheet, &mapping, "needs a Unit Price or Total column"));
    }

    log::debug!(
        "sheet '{}': header at row {} with {} column(s)",
        sheet.name,
        mapping.header_row + 1,
        mapping.len()
    );
    Ok(mapping)
}

fn missing(sheet: &Sheet, mapping: &ColumnMapping, what: &str) -> ImportError {
    ImportError::NoHeaderFound {
        sheet: sheet.name.clone(),
        detail: format!("header candidate at row {} {}", mapping.header_row + 1, what),
    }
}
