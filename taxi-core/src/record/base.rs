//! Base implementation of records.
use crate::error::TaxiError;
use chrono::prelude::{DateTime, Local};
use std::collections::{
    hash_map::{IntoIter, Iter, Keys},
    HashMap,
};

/// Represents possible types of values that can be stored in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A single value such as a trial reward or a step count.
    Scalar(f32),

    /// A timestamp with local timezone.
    DateTime(DateTime<Local>),

    /// A sequence of values, such as per-trial rewards of a session.
    Array1(Vec<f32>),

    /// A text value, such as a solver name or a trial status.
    String(String),
}

/// A container of key-value pairs.
///
/// ```rust
/// use taxi_core::record::{Record, RecordValue};
///
/// let mut record = Record::from_scalar("trial_reward", -12.0);
/// record.insert("status", RecordValue::String("terminated".to_string()));
///
/// assert_eq!(record.get_scalar("trial_reward").unwrap(), -12.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Creates a record containing a single scalar value.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        let mut map = HashMap::new();
        map.insert(name.into(), RecordValue::Scalar(value));
        Self(map)
    }

    /// Creates a record from a slice of key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Returns an iterator over the keys in the record.
    pub fn keys(&self) -> Keys<String, RecordValue> {
        self.0.keys()
    }

    /// Inserts a key-value pair into the record.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Returns an iterator over the key-value pairs in the record.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Returns an iterator that consumes the record.
    pub fn into_iter_in_record(self) -> IntoIter<String, RecordValue> {
        self.0.into_iter()
    }

    /// Gets a reference to the value associated with the given key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Merges two records, consuming both.
    ///
    /// Values of `record` win on duplicate keys.
    pub fn merge(self, record: Record) -> Self {
        Record(self.0.into_iter().chain(record.0).collect())
    }

    /// Merges another record into this one in place.
    pub fn merge_inplace(&mut self, record: Record) {
        for (k, v) in record.into_iter_in_record() {
            self.0.insert(k, v);
        }
    }

    /// Gets a scalar value from the record.
    pub fn get_scalar(&self, k: &str) -> Result<f32, TaxiError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            Some(_) => Err(TaxiError::RecordValueTypeError("Scalar".to_string())),
            None => Err(TaxiError::RecordKeyError(k.to_string())),
        }
    }

    /// Gets a 1-dimensional array from the record.
    pub fn get_array1(&self, k: &str) -> Result<Vec<f32>, TaxiError> {
        match self.0.get(k) {
            Some(RecordValue::Array1(v)) => Ok(v.clone()),
            Some(_) => Err(TaxiError::RecordValueTypeError("Array1".to_string())),
            None => Err(TaxiError::RecordKeyError(k.to_string())),
        }
    }

    /// Gets a string value from the record.
    pub fn get_string(&self, k: &str) -> Result<String, TaxiError> {
        match self.0.get(k) {
            Some(RecordValue::String(s)) => Ok(s.clone()),
            Some(_) => Err(TaxiError::RecordValueTypeError("String".to_string())),
            None => Err(TaxiError::RecordKeyError(k.to_string())),
        }
    }

    /// Returns `true` if the record contains no key-value pairs.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_getters() {
        let mut record = Record::from_scalar("reward", -3.0);
        record.insert("solver", RecordValue::String("rmax".to_string()));

        assert_eq!(record.get_scalar("reward"), Ok(-3.0));
        assert_eq!(
            record.get_scalar("solver"),
            Err(TaxiError::RecordValueTypeError("Scalar".to_string()))
        );
        assert_eq!(
            record.get_string("missing"),
            Err(TaxiError::RecordKeyError("missing".to_string()))
        );
    }

    #[test]
    fn test_merge_prefers_second() {
        let a = Record::from_slice(&[
            ("x", RecordValue::Scalar(1.0)),
            ("y", RecordValue::Scalar(2.0)),
        ]);
        let b = Record::from_scalar("y", 5.0);
        let merged = a.merge(b);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get_scalar("y"), Ok(5.0));
    }
}
