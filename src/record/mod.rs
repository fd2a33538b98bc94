//! Versioned run records written after a run and read back for replay.
mod format;


use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::RecordError;
use crate::metrics::ResponseTimings;

pub use format::RecordFormat;

pub const RECORD_VERSION: &str = "v1";

/// Everything needed to rebuild a report without re-running the test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub version: String,
    pub target: String,
    pub concurrency: usize,
    pub duration_ms: u64,
    pub response_count: usize,
    /// Average requests per second, times 100.
    pub request_rate_x100: u64,
    pub response_timings: ResponseTimings,
}

#[derive(Deserialize)]
struct VersionHeader {
    version: String,
}

/// Serializes a record. JSON is written as a single line.
///
/// # Errors
///
/// Returns an error when serialization fails.
pub fn encode(record: &RunRecord, format: RecordFormat) -> Result<Vec<u8>, RecordError> {
    match format {
        RecordFormat::Json => {
            let mut bytes =
                serde_json::to_vec(record).map_err(|source| RecordError::EncodeJson { source })?;
            bytes.push(b'\n');
            Ok(bytes)
        }
        RecordFormat::Yaml => serde_yaml::to_string(record)
            .map(String::into_bytes)
            .map_err(|source| RecordError::EncodeYaml { source }),
    }
}

/// Parses a record, rejecting versions other than [`RECORD_VERSION`] and
/// records whose `response_count` disagrees with their timings.
///
/// # Errors
///
/// Returns an error when the input is not a valid record in `format`,
/// carries an unsupported version or has an inconsistent response count.
pub fn decode(bytes: &[u8], format: RecordFormat) -> Result<RunRecord, RecordError> {
    let record: RunRecord = match format {
        RecordFormat::Json => {
            let header: VersionHeader = serde_json::from_slice(bytes)
                .map_err(|source| RecordError::DecodeJson { source })?;
            check_version(header.version)?;
            serde_json::from_slice(bytes).map_err(|source| RecordError::DecodeJson { source })?
        }
        RecordFormat::Yaml => {
            let header: VersionHeader = serde_yaml::from_slice(bytes)
                .map_err(|source| RecordError::DecodeYaml { source })?;
            check_version(header.version)?;
            serde_yaml::from_slice(bytes).map_err(|source| RecordError::DecodeYaml { source })?
        }
    };
    if record.response_count != record.response_timings.len() {
        return Err(RecordError::CountMismatch {
            declared: record.response_count,
            actual: record.response_timings.len(),
        });
    }
    Ok(record)
}

fn check_version(version: String) -> Result<(), RecordError> {
    if version == RECORD_VERSION {
        Ok(())
    } else {
        Err(RecordError::UnsupportedVersion { version })
    }
}

/// # Errors
///
/// Returns an error when encoding fails or the file cannot be written.
pub async fn write_record(
    path: &Path,
    record: &RunRecord,
    format: RecordFormat,
) -> Result<(), RecordError> {
    let bytes = encode(record, format)?;
    let write_err = |source| RecordError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = tokio::fs::File::create(path).await.map_err(write_err)?;
    file.write_all(&bytes).await.map_err(write_err)?;
    file.flush().await.map_err(write_err)?;
    debug!(
        "Wrote {} response(s) to {} as {}",
        record.response_count,
        path.display(),
        format
    );
    Ok(())
}

/// # Errors
///
/// Returns an error when the file cannot be read or decoded.
pub async fn read_record(path: &Path, format: RecordFormat) -> Result<RunRecord, RecordError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| RecordError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    decode(&bytes, format)
}
