// File I/O: estimate spreadsheets in, blank template out

pub mod csv;
pub mod error;
pub mod reader;
pub mod template;
pub mod xlsx;

pub use error::FileError;
pub use reader::{read, read_with_options, ReadOptions};
pub use template::{generate_csv_template, generate_template};
