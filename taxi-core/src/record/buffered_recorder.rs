use super::{AggregateRecorder, Record, RecordStorage, Recorder};

/// Buffered recorder.
///
/// Keeps written records in memory. Stored records are aggregated on
/// [`AggregateRecorder::flush`] and the aggregate is appended to the buffer,
/// so tests can inspect exactly what a session reported.
#[derive(Default)]
pub struct BufferedRecorder {
    buf: Vec<Record>,
    storage: RecordStorage,
}

impl BufferedRecorder {
    /// Constructs the recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an iterator over the records.
    pub fn iter(&self) -> std::slice::Iter<Record> {
        self.buf.iter()
    }

    /// Number of buffered records.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Recorder for BufferedRecorder {
    /// Writes a [`Record`] to the buffer.
    fn write(&mut self, record: Record) {
        self.buf.push(record);
    }
}

impl AggregateRecorder for BufferedRecorder {
    fn store(&mut self, record: Record) {
        self.storage.store(record);
    }

    fn flush(&mut self, _step: i64) {
        if !self.storage.is_empty() {
            let record = self.storage.aggregate();
            self.buf.push(record);
        }
    }
}
