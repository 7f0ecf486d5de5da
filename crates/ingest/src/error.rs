use std::fmt;

use estimate_io::FileError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    /// The upload could not be read (unreadable container or size guard).
    File(FileError),
    /// No row in the scanned range looks like an estimate header, or the best
    /// candidate lacks a required column.
    NoHeaderFound { sheet: String, detail: String },
    /// A sheet was requested by name but the workbook has no such sheet.
    SheetNotFound { sheet: String, available: Vec<String> },
    /// ERROR diagnostics remain; the builder conversion is refused.
    ConversionBlocked { errors: usize, rows: Vec<usize> },
    /// A preview edit referenced a row with nothing on it to edit.
    RowNotFound(usize),
    /// Import requested with no preview pending.
    NothingToImport,
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error.
    ConfigValidation(String),
    /// IO error (config file read, etc.).
    Io(String),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(e) => write!(f, "{e}"),
            Self::NoHeaderFound { sheet, detail } => {
                write!(f, "sheet '{sheet}': no estimate header found ({detail})")
            }
            Self::SheetNotFound { sheet, available } => {
                write!(f, "sheet '{sheet}' not found (available: {})", available.join(", "))
            }
            Self::ConversionBlocked { errors, rows } => {
                let rows: Vec<String> = rows.iter().map(|r| (r + 1).to_string()).collect();
                if rows.is_empty() {
                    write!(f, "import blocked by {errors} error(s)")
                } else {
                    write!(f, "import blocked by {errors} error(s) on row(s) {}", rows.join(", "))
                }
            }
            Self::RowNotFound(row) => write!(f, "row {} has no line item to edit", row + 1),
            Self::NothingToImport => write!(f, "no parsed estimate is awaiting import"),
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::File(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FileError> for ImportError {
    fn from(e: FileError) -> Self {
        Self::File(e)
    }
}
