//! Field values exposed to the comparator and their ordering.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// A sortable field value borrowed from a record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    /// Field absent on this record.
    Missing,
    Text(&'a str),
    Number(f64),
    /// Milliseconds since the Unix epoch.
    Time(i64),
    Bool(bool),
}

impl<'a> FieldValue<'a> {
    /// Total ordering over field values.
    ///
    /// Same kinds order naturally, numbers by `f64::total_cmp`. Missing values
    /// sort before every present value and mismatched kinds order by kind.
    pub fn compare(&self, other: &FieldValue<'_>) -> Ordering {
        match (self, other) {
            (Self::Text(a), FieldValue::Text(b)) => a.cmp(b),
            (Self::Number(a), FieldValue::Number(b)) => a.total_cmp(b),
            (Self::Time(a), FieldValue::Time(b)) => a.cmp(b),
            (Self::Bool(a), FieldValue::Bool(b)) => a.cmp(b),
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Self::Missing => 0,
            Self::Bool(_) => 1,
            Self::Number(_) => 2,
            Self::Time(_) => 3,
            Self::Text(_) => 4,
        }
    }
}

impl From<u64> for FieldValue<'_> {
    fn from(value: u64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<DateTime<Utc>> for FieldValue<'_> {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Time(value.timestamp_millis())
    }
}

impl From<Option<DateTime<Utc>>> for FieldValue<'_> {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        value.map(FieldValue::from).unwrap_or(Self::Missing)
    }
}

impl<'a> From<&'a str> for FieldValue<'a> {
    fn from(value: &'a str) -> Self {
        Self::Text(value)
    }
}

impl<'a> From<Option<&'a str>> for FieldValue<'a> {
    fn from(value: Option<&'a str>) -> Self {
        value.map(Self::Text).unwrap_or(Self::Missing)
    }
}

#[cfg(test)]
mod tests {
    use super::FieldValue;
    use std::cmp::Ordering;

    #[test]
    fn same_kind_values_order_naturally() {
        assert_eq!(FieldValue::Text("a").compare(&FieldValue::Text("b")), Ordering::Less);
        assert_eq!(FieldValue::from(10u64).compare(&FieldValue::from(2u64)), Ordering::Greater);
        assert_eq!(FieldValue::Time(5).compare(&FieldValue::Time(5)), Ordering::Equal);
        assert_eq!(FieldValue::Bool(false).compare(&FieldValue::Bool(true)), Ordering::Less);
    }

    #[test]
    fn missing_sorts_first_and_kinds_never_tie() {
        assert_eq!(FieldValue::Missing.compare(&FieldValue::Missing), Ordering::Equal);
        assert_eq!(FieldValue::Missing.compare(&FieldValue::Number(1.0)), Ordering::Less);
        assert_eq!(FieldValue::Text("x").compare(&FieldValue::Missing), Ordering::Greater);
        assert_eq!(FieldValue::Text("x").compare(&FieldValue::Number(1.0)), Ordering::Greater);
        assert_eq!(FieldValue::Number(1.0).compare(&FieldValue::Text("x")), Ordering::Less);
    }

    #[test]
    fn nan_orders_consistently() {
        let nan = FieldValue::Number(f64::NAN);
        assert_eq!(nan.compare(&nan), Ordering::Equal);
        assert_eq!(nan.compare(&FieldValue::Number(1.0)), Ordering::Greater);
        assert_eq!(FieldValue::Number(1.0).compare(&nan), Ordering::Less);
    }
}
