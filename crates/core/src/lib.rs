//! `estimate-core`: shared types for estimate spreadsheet ingestion.
//!
//! In-memory cell grid, the canonical column roles, and integer-cent money
//! helpers. No IO.

pub mod cell;
pub mod columns;
pub mod money;
pub mod sheet;

pub use cell::CellValue;
pub use columns::ColumnRole;
pub use sheet::{Sheet, SourceFormat, Workbook};
