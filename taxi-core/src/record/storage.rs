//! Record storage and aggregation.
use super::{Record, RecordValue};
use std::collections::HashSet;
use xxhash_rust::xxh3::Xxh3Builder;

/// Stores records and aggregates them on demand.
///
/// Scalars seen more than once are summarized with min, max, mean and median.
/// For every other value type the most recent value wins.
#[derive(Debug, Default)]
pub struct RecordStorage {
    data: Vec<Record>,
}

fn min(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(vs.iter().copied().fold(f32::INFINITY, f32::min))
}

fn max(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(vs.iter().copied().fold(f32::NEG_INFINITY, f32::max))
}

fn mean(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(vs.iter().sum::<f32>() / vs.len() as f32)
}

fn median(mut vs: Vec<f32>) -> RecordValue {
    vs.sort_by(|x, y| x.total_cmp(y));
    RecordValue::Scalar(vs[vs.len() / 2])
}

impl RecordStorage {
    /// Creates a new empty storage.
    pub fn new() -> Self {
        Self { data: vec![] }
    }

    fn get_keys(&self) -> HashSet<String, Xxh3Builder> {
        let mut keys = HashSet::<String, Xxh3Builder>::default();
        for record in self.data.iter() {
            for k in record.keys() {
                keys.insert(k.clone());
            }
        }
        keys
    }

    fn latest(&self, key: &str) -> Option<&RecordValue> {
        self.data.iter().rev().find_map(|record| record.get(key))
    }

    fn scalar(&self, key: &str) -> Record {
        let vs: Vec<f32> = self
            .data
            .iter()
            .filter_map(|record| match record.get(key) {
                Some(RecordValue::Scalar(v)) => Some(*v),
                _ => None,
            })
            .collect();

        match vs.len() {
            0 => Record::empty(),
            1 => Record::from_scalar(key, vs[0]),
            _ => Record::from_slice(&[
                (format!("{}_min", key), min(&vs)),
                (format!("{}_max", key), max(&vs)),
                (format!("{}_mean", key), mean(&vs)),
                (format!("{}_median", key), median(vs)),
            ]),
        }
    }

    /// Stores a record.
    pub fn store(&mut self, record: Record) {
        self.data.push(record);
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if no record is stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Aggregates all stored records and clears the storage.
    pub fn aggregate(&mut self) -> Record {
        let mut record = Record::empty();

        for key in self.get_keys().iter() {
            let r = match self.latest(key) {
                Some(RecordValue::Scalar(..)) => self.scalar(key),
                Some(value) => Record::from_slice(&[(key.as_str(), value.clone())]),
                None => Record::empty(),
            };
            record.merge_inplace(r);
        }

        self.data.clear();

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_scalars() {
        let mut storage = RecordStorage::new();
        for v in [-12.0f32, -3.0, -7.0].iter() {
            storage.store(Record::from_scalar("trial_reward", *v));
        }
        storage.store(Record::from_scalar("replans", 4.0));

        let record = storage.aggregate();
        assert_eq!(record.get_scalar("trial_reward_min"), Ok(-12.0));
        assert_eq!(record.get_scalar("trial_reward_max"), Ok(-3.0));
        assert_eq!(record.get_scalar("trial_reward_median"), Ok(-7.0));
        assert!((record.get_scalar("trial_reward_mean").unwrap() + 22.0 / 3.0).abs() < 1e-5);
        assert_eq!(record.get_scalar("replans"), Ok(4.0));
        assert!(storage.is_empty());
    }

    #[test]
    fn test_latest_string_wins() {
        let mut storage = RecordStorage::new();
        storage.store(Record::from_slice(&[(
            "status",
            RecordValue::String("step_capped".to_string()),
        )]));
        storage.store(Record::from_slice(&[(
            "status",
            RecordValue::String("terminated".to_string()),
        )]));

        let record = storage.aggregate();
        assert_eq!(record.get_string("status"), Ok("terminated".to_string()));
    }
}
