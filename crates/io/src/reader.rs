// Workbook reader: sniff the byte stream, then hand off to the container
// reader (calamine) or the delimited-text reader.

use serde::Deserialize;

use estimate_core::Workbook;

use crate::error::FileError;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Resource limits applied while reading an upload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReadOptions {
    /// Maximum number of grid cells (rows × columns, summed over sheets)
    pub max_cells: usize,
    /// Maximum size of the uploaded file in bytes
    pub max_bytes: usize,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            max_cells: 1_000_000,
            max_bytes: 50 * 1024 * 1024,
        }
    }
}

/// Container family detected from the leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// ZIP package: xlsx, xlsm, xlsb or ods
    Zip,
    /// OLE2 compound file: legacy xls
    Ole,
    /// Anything else; may still be delimited text
    Unknown,
}

pub fn detect_container(bytes: &[u8]) -> Container {
    if bytes.starts_with(ZIP_MAGIC) {
        Container::Zip
    } else if bytes.starts_with(OLE_MAGIC) {
        Container::Ole
    } else {
        Container::Unknown
    }
}

/// Read an uploaded file into an in-memory workbook with default limits.
pub fn read(bytes: &[u8]) -> Result<Workbook, FileError> {
    read_with_options(bytes, &ReadOptions::default())
}

/// Read an uploaded file into an in-memory workbook.
///
/// Fails with `Unreadable` when the bytes are empty, are neither a spreadsheet
/// container nor delimited text, or hold zero sheets, and with `TooLarge`
/// when a size guard trips before the grid is built.
pub fn read_with_options(bytes: &[u8], options: &ReadOptions) -> Result<Workbook, FileError> {
    if bytes.is_empty() {
        return Err(FileError::Unreadable("file is empty".into()));
    }
    if bytes.len() > options.max_bytes {
        log::warn!("rejecting upload of {} bytes (limit {})", bytes.len(), options.max_bytes);
        return Err(FileError::TooLarge {
            what: "bytes",
            actual: bytes.len(),
            limit: options.max_bytes,
        });
    }

    let container = detect_container(bytes);
    log::debug!("detected container {:?} for {} bytes", container, bytes.len());

    let workbook = match container {
        Container::Zip | Container::Ole => crate::xlsx::read_container(bytes, options)?,
        Container::Unknown => crate::csv::read_delimited(bytes, options)?,
    };

    if workbook.sheet_count() == 0 {
        return Err(FileError::Unreadable("workbook contains no sheets".into()));
    }

    log::info!(
        "read {} workbook with {} sheet(s): {}",
        workbook.format,
        workbook.sheet_count(),
        workbook.sheet_names().join(", ")
    );
    Ok(workbook)
}
