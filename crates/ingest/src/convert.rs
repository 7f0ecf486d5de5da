use serde::Serialize;

use crate::error::ImportError;
use crate::model::ExcelParseResult;

/// Category → line-item tree edited by the estimate builder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderEstimate {
    pub sheet_name: String,
    pub categories: Vec<BuilderCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderCategory {
    pub id: String,
    pub name: String,
    pub items: Vec<BuilderLineItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderLineItem {
    pub id: String,
    pub description: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub unit_price_cents: Option<i64>,
    pub tax_cents: Option<i64>,
    pub overhead_profit_cents: Option<i64>,
    pub line_total_cents: i64,
    /// 1-based row in the uploaded sheet
    pub source_row: usize,
}

impl BuilderEstimate {
    pub fn item_count(&self) -> usize {
        self.categories.iter().map(|c| c.items.len()).sum()
    }

    pub fn total_cents(&self) -> i64 {
        self.categories
            .iter()
            .flat_map(|c| c.items.iter())
            .fold(0i64, |acc, i| acc.saturating_add(i.line_total_cents))
    }
}

/// Restructure an error-free parse into builder categories.
///
/// Categories keep first-seen order, items keep row order. Values are copied,
/// never recomputed, so preview and builder show the same numbers.
pub fn convert(result: &ExcelParseResult) -> Result<BuilderEstimate, ImportError> {
    let errors: Vec<_> = result.errors().collect();
    if !errors.is_empty() {
        let mut rows: Vec<usize> = errors.iter().filter_map(|d| d.row_index).collect();
        rows.sort_unstable();
        rows.dedup();
        return Err(ImportError::ConversionBlocked {
            errors: errors.len(),
            rows,
        });
    }

    let mut categories: Vec<BuilderCategory> = result
        .categories()
        .iter()
        .enumerate()
        .map(|(i, name)| BuilderCategory {
            id: format!("category-{}", i + 1),
            name: name.clone(),
            items: Vec::new(),
        })
        .collect();

    for item in result.line_items() {
        let slot = match categories.iter().position(|c| c.name == item.canonical_category) {
            Some(slot) => slot,
            None => {
                // Category list and items always agree; tolerate a hand-built result anyway.
                categories.push(BuilderCategory {
                    id: format!("category-{}", categories.len() + 1),
                    name: item.canonical_category.clone(),
                    items: Vec::new(),
                });
                categories.len() - 1
            }
        };
        categories[slot].items.push(BuilderLineItem {
            id: format!("row-{}", item.row_index + 1),
            description: item.description.clone(),
            quantity: item.quantity,
            unit: item.unit.clone(),
            unit_price_cents: item.unit_price_cents,
            tax_cents: item.tax_cents,
            overhead_profit_cents: item.overhead_profit_cents,
            line_total_cents: item.line_total_cents,
            source_row: item.row_index + 1,
        });
    }

    categories.retain(|c| !c.items.is_empty());

    log::info!(
        "converted '{}': {} categor(ies), {} item(s)",
        result.sheet_name(),
        categories.len(),
        result.line_items().len()
    );

    Ok(BuilderEstimate {
        sheet_name: result.sheet_name().to_string(),
        categories,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::pipeline::parse_bytes;

    const SHEET: &str = "\
Category,Description,Qty,Unit Price,Total
Roofing,Shingles,20,150.00,3000.00
Gutters,Seamless gutter,100,8.00,800.00
RFG,Ridge cap,40,12.50,500.00
,Drip edge,10,2.00,20.00
Total,,,,4320.00
";

    #[test]
    fn groups_by_category_in_first_seen_order() {
        let result = parse_bytes(SHEET.as_bytes(), &PipelineConfig::default()).unwrap();
        let estimate = convert(&result).unwrap();

        let names: Vec<&str> = estimate.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Roofing", "Gutters"]);
        assert_eq!(estimate.categories[0].id, "category-1");

        let roofing: Vec<&str> = estimate.categories[0].items.iter().map(|i| i.description.as_str()).collect();
        assert_eq!(roofing, vec!["Shingles", "Ridge cap", "Drip edge"]);
        assert_eq!(estimate.categories[0].items[1].id, "row-4");
        assert_eq!(estimate.categories[0].items[1].source_row, 4);
        assert_eq!(estimate.item_count(), 4);
        assert_eq!(estimate.total_cents(), result.summary().computed_grand_total_cents);
    }

    #[test]
    fn values_copied_unchanged() {
        let result = parse_bytes(SHEET.as_bytes(), &PipelineConfig::default()).unwrap();
        let estimate = convert(&result).unwrap();
        let shingles = &estimate.categories[0].items[0];
        let parsed = &result.line_items()[0];
        assert_eq!(shingles.quantity, parsed.quantity);
        assert_eq!(shingles.unit_price_cents, Some(15_000));
        assert_eq!(shingles.line_total_cents, parsed.line_total_cents);
    }

    #[test]
    fn errors_block_conversion() {
        let csv = "Description,Qty,Unit Price\nShingles,abc,150\nRidge cap,2,12.50\nVent,x,y\n";
        let result = parse_bytes(csv.as_bytes(), &PipelineConfig::default()).unwrap();
        match convert(&result) {
            Err(ImportError::ConversionBlocked { errors, rows }) => {
                assert_eq!(errors, 2);
                assert_eq!(rows, vec![1, 3]);
            }
            other => panic!("expected ConversionBlocked, got {other:?}"),
        }
    }

    #[test]
    fn serializes_camel_case() {
        let result = parse_bytes(SHEET.as_bytes(), &PipelineConfig::default()).unwrap();
        let json = serde_json::to_value(convert(&result).unwrap()).unwrap();
        assert_eq!(json["sheetName"], "Sheet1");
        assert_eq!(json["categories"][0]["items"][0]["lineTotalCents"], 300_000);
        assert_eq!(json["categories"][0]["items"][0]["unitPriceCents"], 15_000);
    }
}
