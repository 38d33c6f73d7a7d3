use super::Record;

/// Writes a record to an output destination with [`Recorder::write`].
pub trait Recorder {
    /// Writes a record to the [`Recorder`].
    fn write(&mut self, record: Record);
}

/// Stores records and writes values aggregated over them.
pub trait AggregateRecorder {
    /// Stores the record.
    fn store(&mut self, record: Record);

    /// Writes values aggregated from the stored records.
    ///
    /// `step` is the index of the trial or session being flushed.
    fn flush(&mut self, step: i64);
}
