//! `estimate-ingest`: estimate spreadsheet ingestion pipeline.
//!
//! Workbook in, immutable `ExcelParseResult` out; `convert` turns an
//! error-free result into the category → line-item tree the estimate builder
//! edits. Pure engine crate apart from reading config files: no CLI, no
//! persistence.

pub mod assemble;
pub mod category;
pub mod columns;
pub mod config;
pub mod convert;
pub mod error;
pub mod extract;
pub mod label;
pub mod model;
pub mod pipeline;
pub mod preview;
pub mod reconcile;
pub mod session;

pub use category::CategoryNormalizer;
pub use columns::resolve_columns;
pub use config::PipelineConfig;
pub use convert::{convert, BuilderCategory, BuilderEstimate, BuilderLineItem};
pub use error::ImportError;
pub use model::{
    ColumnMapping, DeclaredTotal, DiagnosticCode, ExcelParseResult, LineTotalSource, ParseDiagnostic, ParseMeta,
    ParsedEstimateSummary, ParsedLineItem, Severity,
};
pub use pipeline::{parse_bytes, parse_bytes_sheet, parse_sheet, parse_workbook};
pub use session::{UploadSession, UploadTicket};

/// Blank template workbook (xlsx bytes) with the canonical header row and
/// the category reference sheet.
pub fn generate_template() -> Result<Vec<u8>, estimate_io::FileError> {
    estimate_io::generate_template(&category::canonical_categories())
}
