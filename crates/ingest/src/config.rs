use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use estimate_io::ReadOptions;
use serde::{Deserialize, Serialize};

use crate::error::ImportError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Pipeline settings. Every field has a default, so an empty document is valid.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub reader: ReadOptions,
    pub header: HeaderConfig,
    pub extract: ExtractConfig,
    pub reconcile: ReconcileConfig,
    pub categories: CategoryConfig,
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeaderConfig {
    /// Rows scanned from the top of the sheet when looking for the header
    pub scan_rows: usize,
    /// Minimum distinct column roles a row must match to count as a header
    pub min_matches: usize,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            scan_rows: 10,
            min_matches: 2,
        }
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractConfig {
    /// Category given to items when the sheet has no category at all
    pub default_category: String,
    /// Allowed gap between a TOTAL cell and qty × price + tax + O&P
    pub line_tolerance_cents: i64,
    /// Stop reading line items at the first total row. When false, total rows
    /// are collected as declared totals and extraction carries on below them.
    pub stop_at_first_total: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            default_category: "General".into(),
            line_tolerance_cents: 1,
            stop_at_first_total: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// Which total row is authoritative when a sheet declares several.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclaredTotalPolicy {
    /// Closest to the end of the sheet
    #[default]
    Last,
    First,
    Largest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconcileConfig {
    /// Discrepancy allowed per started hundred line items before warning
    pub tolerance_cents_per_hundred_items: i64,
    pub declared_total: DeclaredTotalPolicy,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            tolerance_cents_per_hundred_items: 1,
            declared_total: DeclaredTotalPolicy::Last,
        }
    }
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CategoryConfig {
    /// Extra raw label → canonical label entries
    pub aliases: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl PipelineConfig {
    pub fn from_toml(input: &str) -> Result<Self, ImportError> {
        let config: PipelineConfig =
            toml::from_str(input).map_err(|e| ImportError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ImportError> {
        let input = std::fs::read_to_string(path)
            .map_err(|e| ImportError::Io(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&input)
    }

    /// Per-user config file location (`<config_dir>/estimate-import/config.toml`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("estimate-import").join("config.toml"))
    }

    /// Load the per-user config file, or defaults when it does not exist.
    pub fn load_default() -> Result<Self, ImportError> {
        match Self::default_path() {
            Some(path) if path.exists() => {
                log::debug!("loading config from {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ImportError> {
        if self.reader.max_cells == 0 {
            return Err(ImportError::ConfigValidation("reader.max_cells must be at least 1".into()));
        }
        if self.reader.max_bytes == 0 {
            return Err(ImportError::ConfigValidation("reader.max_bytes must be at least 1".into()));
        }
        if self.header.scan_rows == 0 {
            return Err(ImportError::ConfigValidation("header.scan_rows must be at least 1".into()));
        }
        if self.header.min_matches == 0 {
            return Err(ImportError::ConfigValidation("header.min_matches must be at least 1".into()));
        }
        if self.extract.default_category.trim().is_empty() {
            return Err(ImportError::ConfigValidation("extract.default_category must not be empty".into()));
        }
        if self.extract.line_tolerance_cents < 0 {
            return Err(ImportError::ConfigValidation("extract.line_tolerance_cents must not be negative".into()));
        }
        if self.reconcile.tolerance_cents_per_hundred_items < 0 {
            return Err(ImportError::ConfigValidation(
                "reconcile.tolerance_cents_per_hundred_items must not be negative".into(),
            ));
        }
        for (raw, canonical) in &self.categories.aliases {
            if raw.trim().is_empty() || canonical.trim().is_empty() {
                return Err(ImportError::ConfigValidation(format!(
                    "categories.aliases: empty label in '{raw}' = '{canonical}'"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
