use crate::spreadsheet::reference::index_to_reference;
use std::fmt::Display;

/// Types of cell data in the raw grid.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean values stored as "1" / "0"
    Boolean,
    /// Numeric values, including dates which banner exports never use
    Number,
    /// Text values (inline, shared or formula strings)
    Text,
    /// Error values such as "#DIV/0!"
    Error,
}

/// Represents a single cell in a spreadsheet with position, type, and value.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    /// Cell data type
    pub(crate) kind: CellType,
    /// Cell value as string
    pub(crate) value: String,
}

impl Cell {
    pub(crate) fn new(row: usize, col: usize, kind: CellType, value: impl Into<String>) -> Self {
        Cell { row, col, kind, value: value.into() }
    }

    /// Returns the Excel-style cell reference (e.g., "A1", "B2").
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// Empty cells and whitespace-only text both count as blank.
    pub(crate) fn is_blank(&self) -> bool {
        match self.kind {
            CellType::Empty => true,
            CellType::Text => self.value.trim().is_empty(),
            _ => self.value.is_empty(),
        }
    }

    pub(crate) fn is_text(&self) -> bool {
        self.kind == CellType::Text
    }

    /// Converts cell value to double-precision floating point.
    pub(crate) fn to_double(&self) -> Result<f64, String> {
        self.value.trim().parse::<f64>().map_err(|_| format!("parse '{}' to double failed", self.value))
    }

    /// Numeric value of a number cell or of text that spells a number.
    pub(crate) fn as_number(&self) -> Option<f64> {
        match self.kind {
            CellType::Number | CellType::Text => self.to_double().ok().filter(|value| value.is_finite()),
            _ => None,
        }
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            CellType::Boolean => write!(f, "{}", if self.value == "1" { "true" } else { "false" }),
            CellType::Number => match self.to_double() {
                Ok(value) => write!(f, "{}", format_number(value)),
                Err(_) => write!(f, "{}", self.value),
            },
            _ => write!(f, "{}", self.value),
        }
    }
}

/// Formats a number the way a spreadsheet shows it in a general cell:
/// integral values without a fraction, everything else in shortest form.
pub(crate) fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_numbers_like_a_general_cell() {
        assert_eq!(Cell::new(0, 0, CellType::Number, "100").to_string(), "100");
        assert_eq!(Cell::new(0, 0, CellType::Number, "100.0").to_string(), "100");
        assert_eq!(Cell::new(0, 0, CellType::Number, "0.337").to_string(), "0.337");
        assert_eq!(Cell::new(0, 0, CellType::Number, "1E-3").to_string(), "0.001");
        assert_eq!(Cell::new(0, 0, CellType::Boolean, "1").to_string(), "true");
        assert_eq!(Cell::new(0, 0, CellType::Text, "Total").to_string(), "Total");
    }

    #[test]
    fn numeric_text_is_a_number() {
        assert_eq!(Cell::new(0, 0, CellType::Text, " 42 ").as_number(), Some(42.0));
        assert_eq!(Cell::new(0, 0, CellType::Text, "-").as_number(), None);
        assert_eq!(Cell::new(0, 0, CellType::Text, "NaN").as_number(), None);
        assert_eq!(Cell::new(0, 0, CellType::Boolean, "1").as_number(), None);
    }

    #[test]
    fn blank_cells() {
        assert!(Cell::new(0, 0, CellType::Empty, "").is_blank());
        assert!(Cell::new(0, 0, CellType::Text, "  ").is_blank());
        assert!(!Cell::new(0, 0, CellType::Text, "A").is_blank());
        assert_eq!(Cell::new(6, 3, CellType::Number, "1").reference(), "D7");
    }
}
