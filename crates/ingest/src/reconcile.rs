use crate::config::{DeclaredTotalPolicy, ReconcileConfig};
use crate::model::{DeclaredTotal, DiagnosticCode, ParseDiagnostic, ParsedEstimateSummary, ParsedLineItem};
use estimate_core::money::{checked_sum, format_cents, MAX_ABS_CENTS};

/// Summary plus the reconciliation diagnostics that go with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub summary: ParsedEstimateSummary,
    pub diagnostics: Vec<ParseDiagnostic>,
}

/// Allowed |discrepancy|: `per_hundred` cents for every started hundred
/// items, counting an empty estimate as one hundred.
pub fn tolerance_cents(item_count: usize, per_hundred: i64) -> i64 {
    let hundreds = item_count.div_ceil(100).max(1) as i64;
    per_hundred.saturating_mul(hundreds)
}

/// The declared total the policy picks among the sheet's total rows.
pub fn select_declared(declared: &[DeclaredTotal], policy: DeclaredTotalPolicy) -> Option<&DeclaredTotal> {
    match policy {
        DeclaredTotalPolicy::Last => declared.last(),
        DeclaredTotalPolicy::First => declared.first(),
        DeclaredTotalPolicy::Largest => declared
            .iter()
            .rev()
            .max_by_key(|d| d.amount_cents),
    }
}

/// Sum line items in cents and cross-check against the declared total.
///
/// Mismatches are advisory: they produce WARNING diagnostics only.
pub fn reconcile(
    items: &[ParsedLineItem],
    declared: &[DeclaredTotal],
    config: &ReconcileConfig,
) -> Reconciliation {
    let sums = [
        checked_sum(items.iter().map(ParsedLineItem::subtotal_cents)),
        checked_sum(items.iter().map(|i| i.tax_cents.unwrap_or(0))),
        checked_sum(items.iter().map(|i| i.overhead_profit_cents.unwrap_or(0))),
        checked_sum(items.iter().map(|i| i.line_total_cents)),
    ];
    let in_range = sums.iter().all(Option::is_some);
    let [subtotal, tax, overhead_profit, grand_total] = sums.map(|s| s.unwrap_or(0));

    let tolerance = tolerance_cents(items.len(), config.tolerance_cents_per_hundred_items);
    let chosen = select_declared(declared, config.declared_total);
    let discrepancy = chosen
        .filter(|_| in_range)
        .and_then(|d| grand_total.checked_sub(d.amount_cents));

    let mut diagnostics = Vec::new();

    if items.is_empty() {
        diagnostics.push(ParseDiagnostic::warning(
            DiagnosticCode::NoLineItems,
            None,
            "no line items found below the header",
        ));
    }

    if !in_range {
        diagnostics.push(ParseDiagnostic::error(
            DiagnosticCode::TotalsOutOfRange,
            None,
            format!(
                "line items add up to more than {}; totals cannot be computed",
                format_cents(MAX_ABS_CENTS)
            ),
        ));
    }

    if let Some(chosen) = chosen {
        let distinct = {
            let mut amounts: Vec<i64> = declared.iter().map(|d| d.amount_cents).collect();
            amounts.sort_unstable();
            amounts.dedup();
            amounts.len()
        };
        if distinct > 1 {
            diagnostics.push(ParseDiagnostic::warning(
                DiagnosticCode::MultipleDeclaredTotals,
                Some(chosen.row_index),
                format!(
                    "{} total rows with different amounts; using '{}' on row {} ({})",
                    declared.len(),
                    chosen.label,
                    chosen.row_index + 1,
                    policy_name(config.declared_total)
                ),
            ));
        }

        if let Some(d) = discrepancy {
            if d.abs() > tolerance {
                diagnostics.push(ParseDiagnostic::warning(
                    DiagnosticCode::TotalsMismatch,
                    Some(chosen.row_index),
                    format!(
                        "totals do not reconcile: computed {} vs declared {} (difference {})",
                        format_cents(grand_total),
                        format_cents(chosen.amount_cents),
                        format_cents(d)
                    ),
                ));
            }
        }
    }

    log::debug!(
        "reconcile: {} item(s), computed {}, declared {:?}, tolerance {}",
        items.len(),
        grand_total,
        chosen.map(|d| d.amount_cents),
        tolerance
    );

    Reconciliation {
        summary: ParsedEstimateSummary {
            item_count: items.len(),
            computed_subtotal_cents: subtotal,
            computed_tax_cents: tax,
            computed_overhead_profit_cents: overhead_profit,
            computed_grand_total_cents: grand_total,
            declared_grand_total_cents: chosen.map(|d| d.amount_cents),
            declared_total_row: chosen.map(|d| d.row_index),
            discrepancy_cents: discrepancy,
            tolerance_cents: tolerance,
        },
        diagnostics,
    }
}

fn policy_name(policy: DeclaredTotalPolicy) -> &'static str {
    match policy {
        DeclaredTotalPolicy::Last => "last",
        DeclaredTotalPolicy::First => "first",
        DeclaredTotalPolicy::Largest => "largest",
    }
}
