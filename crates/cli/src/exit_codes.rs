//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain    | Description                                   |
//! |---------|-----------|-----------------------------------------------|
//! | 0       | Universal | Success                                       |
//! | 1       | Universal | General error (unspecified)                   |
//! | 2       | Universal | CLI usage error (bad args, missing file)      |
//! | 3       | Universal | IO error (cannot read input / write output)   |
//! | 10-19   | import    | Reading and parsing an uploaded estimate      |
//! | 20-29   | config    | Pipeline config files                         |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `import_exit_code` or the relevant command

use estimate_ingest::ImportError;
use estimate_io::FileError;

// =============================================================================
// Universal (0-3)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Cannot read the input file or write the output file.
pub const EXIT_IO: u8 = 3;

// =============================================================================
// Import (10-19)
// =============================================================================

/// Not a spreadsheet container or delimited text, or corrupt.
pub const EXIT_UNREADABLE: u8 = 10;

/// File exceeds the byte or cell guard.
pub const EXIT_TOO_LARGE: u8 = 11;

/// No sheet has a recognizable estimate header.
pub const EXIT_NO_HEADER: u8 = 12;

/// `--sheet` names a sheet the workbook does not have.
pub const EXIT_SHEET_NOT_FOUND: u8 = 13;

/// Parse finished but ERROR diagnostics remain (`parse`).
pub const EXIT_ROW_ERRORS: u8 = 14;

/// Builder conversion refused because ERROR diagnostics remain (`convert`).
pub const EXIT_CONVERSION_BLOCKED: u8 = 15;

/// `--drop-row` names a row with nothing to drop, or `--category` a row
/// holding no line item.
pub const EXIT_ROW_NOT_FOUND: u8 = 16;

// =============================================================================
// Config (20-29)
// =============================================================================

/// Config file failed to parse or validate.
pub const EXIT_CONFIG_INVALID: u8 = 20;

/// Map an ImportError to its exit code.
pub fn import_exit_code(err: &ImportError) -> u8 {
    match err {
        ImportError::File(FileError::Unreadable(_)) => EXIT_UNREADABLE,
        ImportError::File(FileError::TooLarge { .. }) => EXIT_TOO_LARGE,
        ImportError::File(FileError::Write(_)) => EXIT_IO,
        ImportError::NoHeaderFound { .. } => EXIT_NO_HEADER,
        ImportError::SheetNotFound { .. } => EXIT_SHEET_NOT_FOUND,
        ImportError::ConversionBlocked { .. } => EXIT_CONVERSION_BLOCKED,
        ImportError::RowNotFound(_) => EXIT_ROW_NOT_FOUND,
        ImportError::NothingToImport => EXIT_ERROR,
        ImportError::ConfigParse(_) | ImportError::ConfigValidation(_) => EXIT_CONFIG_INVALID,
        ImportError::Io(_) => EXIT_IO,
    }
}

/// What the user can do about an ImportError, if anything.
pub fn import_hint(err: &ImportError) -> Option<&'static str> {
    match err {
        ImportError::File(FileError::Unreadable(_)) => Some("upload an .xlsx, .xls, .ods or .csv export"),
        ImportError::File(FileError::TooLarge { .. }) => Some("split the file into smaller estimates"),
        ImportError::NoHeaderFound { .. } => Some("run `estimate template` to download the template"),
        ImportError::SheetNotFound { .. } => Some("omit --sheet to use the first estimate sheet"),
        ImportError::ConversionBlocked { .. } => Some("fix or drop the rows listed above (--drop-row N)"),
        ImportError::ConfigParse(_) | ImportError::ConfigValidation(_) => {
            Some("check the file with `estimate config validate <file>`")
        }
        _ => None,
    }
}
