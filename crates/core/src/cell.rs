use serde::{Deserialize, Serialize};

/// Raw value of one spreadsheet cell as read from the source file.
///
/// Booleans, error values and ISO date strings from binary containers are
/// carried as `Text`; date serials as `Number`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    /// Build a cell from delimited-text input. Whitespace-only input is empty;
    /// nothing else is interpreted here (number parsing is the extractor's job).
    pub fn from_input(input: &str) -> Self {
        if input.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(input.to_string())
        }
    }

    /// True for `Empty` and for text that is only whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// Trimmed text content, `None` for numbers and blanks.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) if !s.trim().is_empty() => Some(s.trim()),
            _ => None,
        }
    }

    pub fn raw_display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_input_blank_is_empty() {
        assert_eq!(CellValue::from_input("   "), CellValue::Empty);
        assert_eq!(CellValue::from_input(""), CellValue::Empty);
        assert_eq!(CellValue::from_input("12"), CellValue::Text("12".into()));
    }

    #[test]
    fn raw_display_integers_without_decimals() {
        assert_eq!(CellValue::Number(3000.0).raw_display(), "3000");
        assert_eq!(CellValue::Number(12.5).raw_display(), "12.5");
        assert_eq!(CellValue::Text("  Ridge cap ".into()).raw_display(), "Ridge cap");
    }

    #[test]
    fn as_text_skips_numbers_and_blanks() {
        assert_eq!(CellValue::Text(" Roofing ".into()).as_text(), Some("Roofing"));
        assert_eq!(CellValue::Text("  ".into()).as_text(), None);
        assert_eq!(CellValue::Number(1.0).as_text(), None);
    }
}
