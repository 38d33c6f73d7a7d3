use super::{AggregateRecorder, Record, RecordStorage, RecordValue, Recorder};
use log::info;

/// Writes records to the `log` facade.
///
/// Records passed to [`Recorder::write`] are logged right away. Stored records
/// are aggregated and logged as one line on [`AggregateRecorder::flush`].
pub struct LogRecorder {
    name: String,
    storage: RecordStorage,
}

impl LogRecorder {
    /// Constructs a recorder whose lines are prefixed with `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            storage: RecordStorage::new(),
        }
    }

    fn format(record: &Record) -> String {
        let mut items: Vec<(&String, &RecordValue)> = record.iter().collect();
        items.sort_by(|a, b| a.0.cmp(b.0));
        items
            .into_iter()
            .map(|(k, v)| match v {
                RecordValue::Scalar(v) => format!("{} = {}", k, v),
                RecordValue::DateTime(v) => format!("{} = {}", k, v.format("%Y-%m-%d %H:%M:%S")),
                RecordValue::Array1(v) => format!("{} = {:?}", k, v),
                RecordValue::String(v) => format!("{} = {}", k, v),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Recorder for LogRecorder {
    fn write(&mut self, record: Record) {
        if !record.is_empty() {
            info!("{}: {}", self.name, Self::format(&record));
        }
    }
}

impl AggregateRecorder for LogRecorder {
    fn store(&mut self, record: Record) {
        self.storage.store(record);
    }

    fn flush(&mut self, step: i64) {
        if !self.storage.is_empty() {
            let record = self.storage.aggregate();
            info!("{} [{}]: {}", self.name, step, Self::format(&record));
        }
    }
}
