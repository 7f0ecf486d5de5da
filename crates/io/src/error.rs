use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileError {
    /// Not a recognized spreadsheet container, corrupt, empty, or no sheets.
    Unreadable(String),
    /// Resource guard tripped before the grid was materialized.
    TooLarge {
        what: &'static str,
        actual: usize,
        limit: usize,
    },
    /// Writing the template workbook failed.
    Write(String),
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable(msg) => write!(f, "unreadable file: {msg}"),
            Self::TooLarge { what, actual, limit } => {
                write!(f, "file too large: {actual} {what} exceeds the limit of {limit}")
            }
            Self::Write(msg) => write!(f, "cannot write workbook: {msg}"),
        }
    }
}

impl std::error::Error for FileError {}
