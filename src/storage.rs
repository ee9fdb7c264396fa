use crate::app::ports::RecordSink;
use crate::error::{Result, ScraperError};
use crate::types::RawRecord;
use async_trait::async_trait;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Streams records into a JSON array file, flushing after every record.
///
/// The closing bracket is written by `finish`; a file that was never
/// finished holds every appended record but no closing `]`.
pub struct JsonArraySink {
    path: PathBuf,
    state: Mutex<SinkState>,
}

struct SinkState {
    writer: Option<BufWriter<File>>,
    count: usize,
}

impl JsonArraySink {
    /// Creates (or truncates) `path`, creating parent directories as needed
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(&path)?);
        writer.write_all(b"[")?;
        writer.flush()?;
        debug!("Opened record sink at {}", path.display());
        Ok(Self {
            path,
            state: Mutex::new(SinkState {
                writer: Some(writer),
                count: 0,
            }),
        })
    }

    pub fn count(&self) -> usize {
        self.lock().count
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SinkState> {
        // a poisoned lock still holds a consistent file: each write is whole
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn closed_sink() -> ScraperError {
    ScraperError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        "record sink already finished",
    ))
}

#[async_trait]
impl RecordSink for JsonArraySink {
    async fn append(&self, record: RawRecord) -> Result<()> {
        let json = serde_json::to_string(&record)?;
        let mut state = self.lock();
        let separator: &[u8] = if state.count == 0 { b"\n" } else { b",\n" };
        let writer = state.writer.as_mut().ok_or_else(closed_sink)?;
        writer.write_all(separator)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;
        state.count += 1;
        Ok(())
    }

    async fn finish(&self) -> Result<()> {
        let mut state = self.lock();
        if let Some(mut writer) = state.writer.take() {
            writer.write_all(b"\n]\n")?;
            writer.flush()?;
            info!("Wrote {} raw records to {}", state.count, self.path.display());
        }
        Ok(())
    }
}

/// Keeps records in memory; handy for tests and dry runs
#[derive(Clone, Default)]
pub struct InMemorySink {
    records: Arc<Mutex<Vec<RawRecord>>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<RawRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl RecordSink for InMemorySink {
    async fn append(&self, record: RawRecord) -> Result<()> {
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        records.push(record);
        Ok(())
    }

    async fn finish(&self) -> Result<()> {
        Ok(())
    }
}

/// Reads the intermediate JSON array written by `JsonArraySink`
pub fn load_raw_records(path: &Path) -> Result<Vec<RawRecord>> {
    let file = File::open(path).map_err(|e| {
        ScraperError::Io(std::io::Error::new(
            e.kind(),
            format!("cannot open raw records '{}': {}", path.display(), e),
        ))
    })?;
    let records: Vec<RawRecord> = serde_json::from_reader(BufReader::new(file))?;
    debug!("Loaded {} raw records from {}", records.len(), path.display());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_json_sink_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("singers.json");
        let sink = JsonArraySink::create(&path).unwrap();

        let mut barbara = RawRecord::new("Barbara");
        barbara.insert("Labels", "Philips");
        sink.append(barbara.clone()).await.unwrap();
        sink.append(RawRecord::new("Zaz")).await.unwrap();
        sink.finish().await.unwrap();

        let loaded = load_raw_records(&path).unwrap();
        assert_eq!(loaded, vec![barbara, RawRecord::new("Zaz")]);
        assert_eq!(sink.count(), 2);
    }

    #[tokio::test]
    async fn test_empty_sink_is_empty_array() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.json");
        let sink = JsonArraySink::create(&path).unwrap();
        sink.finish().await.unwrap();

        assert!(load_raw_records(&path).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_after_finish_fails() {
        let dir = tempdir().unwrap();
        let sink = JsonArraySink::create(dir.path().join("closed.json")).unwrap();
        sink.finish().await.unwrap();
        assert!(sink.append(RawRecord::new("Zaz")).await.is_err());
        // finishing twice is harmless
        assert!(sink.finish().await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_appends_stay_whole() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("concurrent.json");
        let sink = Arc::new(JsonArraySink::create(&path).unwrap());

        let mut handles = Vec::new();
        for i in 0..32 {
            let sink = sink.clone();
            handles.push(tokio::spawn(async move {
                let mut record = RawRecord::new(format!("Chanteur {}", i));
                record.insert("Instruments", "Guitare\nPiano");
                sink.append(record).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        sink.finish().await.unwrap();

        let loaded = load_raw_records(&path).unwrap();
        assert_eq!(loaded.len(), 32);
        assert!(loaded.iter().all(|r| r.get("Instruments") == Some("Guitare\nPiano")));
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempdir().unwrap();
        let result = load_raw_records(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(ScraperError::Io(_))));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "[{\"name\": \"Zaz\"},").unwrap();
        assert!(matches!(load_raw_records(&path), Err(ScraperError::Json(_))));
    }
}
