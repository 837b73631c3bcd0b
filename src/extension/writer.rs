//! Writing result fields into DuckDB vectors.

use duckdb::core::FlatVector;
use duckdb::core::Inserter;

/// One value of an output record.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Field {
    Null,
    BigInt(i64),
    Double(f64),
    Varchar(String),
}

impl Field {
    /// Text field, or NULL when the text is empty.
    pub(crate) fn text_or_null(value: &str) -> Field {
        if value.is_empty() {
            Field::Null
        } else {
            Field::Varchar(value.to_owned())
        }
    }
}

impl<T: Into<Field>> From<Option<T>> for Field {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Field::Null)
    }
}

impl From<i64> for Field {
    fn from(value: i64) -> Self {
        Field::BigInt(value)
    }
}

impl From<f64> for Field {
    fn from(value: f64) -> Self {
        Field::Double(value)
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Field::Varchar(value.to_owned())
    }
}

impl From<String> for Field {
    fn from(value: String) -> Self {
        Field::Varchar(value)
    }
}

impl From<usize> for Field {
    fn from(value: usize) -> Self {
        Field::BigInt(value as i64)
    }
}

/// Writes a field at `row` of a vector whose type matches the field.
pub(super) fn write_field(vector: &mut FlatVector, row: usize, field: &Field) {
    match field {
        Field::Null => vector.set_null(row),
        Field::BigInt(value) => write_value(vector, row, *value),
        Field::Double(value) => write_value(vector, row, *value),
        Field::Varchar(value) => vector.insert(row, value.as_str()),
    }
}

/// The vector holds values of type `T` and at least `row + 1` of them.
#[allow(unused_unsafe)]
fn write_value<T: Copy>(vector: &mut FlatVector, row: usize, value: T) {
    unsafe { vector.as_mut_slice::<T>()[row] = value };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_null() {
        assert_eq!(Field::text_or_null(""), Field::Null);
        assert_eq!(Field::text_or_null("33.7% (42)"), Field::Varchar("33.7% (42)".to_string()));
        assert_eq!(Field::from(3usize), Field::BigInt(3));
        assert_eq!(Field::from(Some(42i64)), Field::BigInt(42));
        assert_eq!(Field::from(Some(33.7)), Field::Double(33.7));
        assert_eq!(Field::from(None::<f64>), Field::Null);
    }
}
