//! Conversions between Excel-style references ("D7", "AB", "12") and 0-based indexes.

/// Largest 0-based column index of a worksheet (XFD).
pub(crate) const MAX_COLUMN_INDEX: usize = 16_383;

/// Number of rows of a worksheet.
pub(crate) const MAX_ROWS: usize = 1_048_576;

/// Converts column letters to a 0-based column index: A = 0, Z = 25, AA = 26.
pub(crate) fn col_to_index(letters: &str) -> Option<usize> {
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    letters
        .to_ascii_uppercase()
        .chars()
        .map(|c| c as usize - 'A' as usize + 1)
        .try_fold(0usize, |index, digit| index.checked_mul(26)?.checked_add(digit))
        .map(|column| column - 1)
}

/// Converts a 1-based row number string to a 0-based row index.
pub(crate) fn row_to_index(number: &str) -> Option<usize> {
    number
        .parse::<usize>()
        .ok()
        .filter(|row| *row > 0)
        .map(|row| row - 1)
}

/// Converts a 0-based column index to column letters.
pub(crate) fn index_to_col(col: usize) -> String {
    let mut column = col + 1;
    let mut letters = String::new();
    while column > 0 {
        column -= 1;
        letters.insert(0, (b'A' + (column % 26) as u8) as char);
        column /= 26;
    }
    letters
}

/// Converts 0-based row and column indexes to an Excel-style reference.
pub(crate) fn index_to_reference(row: usize, col: usize) -> String {
    format!("{}{}", index_to_col(col), row + 1)
}

/// Converts an Excel-style cell reference to 0-based (row, column) indexes.
pub(crate) fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    let col = col_to_index(letters.trim_matches('$'))?;
    let row = row_to_index(digits)?;
    Some((row, col))
}
