//! Dataset writers: JSONL lines or raw concatenated protobuf frames behind
//! one narrow trait, selected by the configured format.

pub mod jsonl;
pub mod proto;
pub mod record;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use jsonl::JsonlWriter;
pub use proto::ProtobufWriter;
pub use record::{GraphRecord, PetriNetRecord, RecordError, SampleRecord};

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Output encoding of the dataset file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jsonl,
    Protobuf,
}

pub trait SampleWriter {
    fn write_sample(&mut self, record: &SampleRecord) -> Result<(), OutputError>;
    fn finish(&mut self) -> Result<(), OutputError>;
}

/// Opens `path` and returns the writer for the given format.
pub fn create_writer(
    format: OutputFormat,
    path: &Path,
) -> Result<Box<dyn SampleWriter>, OutputError> {
    let file = BufWriter::new(File::create(path)?);
    Ok(match format {
        OutputFormat::Jsonl => Box::new(JsonlWriter::new(file)),
        OutputFormat::Protobuf => Box::new(ProtobufWriter::new(file)),
    })
}
