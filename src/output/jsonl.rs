//! One JSON object per line.
use std::io::Write;

use crate::output::{OutputError, SampleRecord, SampleWriter};

pub struct JsonlWriter<W> {
    inner: W,
}

impl<W: Write> JsonlWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: Write> SampleWriter for JsonlWriter<W> {
    fn write_sample(&mut self, record: &SampleRecord) -> Result<(), OutputError> {
        let line = serde_json::to_string(record)?;
        writeln!(self.inner, "{line}")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), OutputError> {
        self.inner.flush()?;
        Ok(())
    }
}
