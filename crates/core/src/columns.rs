use serde::{Deserialize, Serialize};

/// Canonical role a spreadsheet column plays in an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnRole {
    Category,
    Description,
    Quantity,
    Unit,
    UnitPrice,
    Tax,
    OverheadProfit,
    Total,
}

impl ColumnRole {
    /// All roles in template column order.
    pub const ALL: [ColumnRole; 8] = [
        ColumnRole::Category,
        ColumnRole::Description,
        ColumnRole::Quantity,
        ColumnRole::Unit,
        ColumnRole::UnitPrice,
        ColumnRole::Tax,
        ColumnRole::OverheadProfit,
        ColumnRole::Total,
    ];

    /// Header text written by the template. Every label is also a synonym
    /// the column resolver recognizes.
    pub fn header_label(&self) -> &'static str {
        match self {
            Self::Category => "Category",
            Self::Description => "Description",
            Self::Quantity => "Quantity",
            Self::Unit => "Unit",
            Self::UnitPrice => "Unit Price",
            Self::Tax => "Tax",
            Self::OverheadProfit => "O&P",
            Self::Total => "Total",
        }
    }

    /// Roles whose cells must hold numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Quantity | Self::UnitPrice | Self::Tax | Self::OverheadProfit | Self::Total
        )
    }
}

impl std::fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Category => write!(f, "CATEGORY"),
            Self::Description => write!(f, "DESCRIPTION"),
            Self::Quantity => write!(f, "QUANTITY"),
            Self::Unit => write!(f, "UNIT"),
            Self::UnitPrice => write!(f, "UNIT_PRICE"),
            Self::Tax => write!(f, "TAX"),
            Self::OverheadProfit => write!(f, "OVERHEAD_PROFIT"),
            Self::Total => write!(f, "TOTAL"),
        }
    }
}
