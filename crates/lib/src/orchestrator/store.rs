//! Run store: one JSON file per run under the runs directory.
//!
//! Records are written before every transition and removed on terminal state,
//! so whatever is on disk at startup is exactly the set of runs to resume.

use super::run::RunRecord;
use std::path::{Path, PathBuf};

pub struct RunStore {
    dir: PathBuf,
}

impl RunStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Persist the record, creating the runs directory if needed.
    pub async fn save(&self, record: &RunRecord) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.record_path(&record.id), json).await
    }

    /// Remove the record file. Missing file is fine (already discarded).
    pub async fn remove(&self, id: &str) -> std::io::Result<()> {
        match tokio::fs::remove_file(self.record_path(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Load every non-terminal record from disk. Unreadable or unparsable
    /// files are logged and skipped.
    pub async fn load_incomplete(&self) -> Vec<RunRecord> {
        let mut records = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(_) => return records,
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_record(&path).await {
                Ok(record) if !record.state.is_terminal() => records.push(record),
                Ok(_) => {}
                Err(e) => {
                    log::warn!("run store: skipping {}: {}", path.display(), e);
                }
            }
        }
        records
    }
}

async fn read_record(path: &Path) -> Result<RunRecord, String> {
    let s = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| e.to_string())?;
    serde_json::from_str(&s).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::run::RunState;
    use crate::webhook::{Event, EventKind};

    fn temp_store() -> RunStore {
        let dir = std::env::temp_dir().join(format!("mogu-store-test-{}", uuid::Uuid::new_v4()));
        RunStore::new(dir)
    }

    fn record() -> RunRecord {
        RunRecord::new(Event {
            kind: EventKind::Postback,
            reply_token: "tok".to_string(),
            timestamp: 0,
            source: None,
            message: None,
            postback: None,
        })
    }

    #[tokio::test]
    async fn save_then_load_incomplete_round_trips() {
        let store = temp_store();
        let run = record();
        store.save(&run).await.expect("save");
        let loaded = store.load_incomplete().await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, run.id);
        assert_eq!(loaded[0].state, RunState::Dispatching);
    }

    #[tokio::test]
    async fn terminal_records_are_not_loaded() {
        let store = temp_store();
        let mut run = record();
        run.state = RunState::Completed;
        store.save(&run).await.expect("save");
        assert!(store.load_incomplete().await.is_empty());
    }

    #[tokio::test]
    async fn remove_discards_the_record() {
        let store = temp_store();
        let run = record();
        store.save(&run).await.expect("save");
        store.remove(&run.id).await.expect("remove");
        assert!(store.load_incomplete().await.is_empty());
    }

    #[tokio::test]
    async fn remove_of_missing_record_is_ok() {
        let store = temp_store();
        store.remove("run-nope").await.expect("remove missing");
    }

    #[tokio::test]
    async fn unparsable_files_are_skipped() {
        let store = temp_store();
        let run = record();
        store.save(&run).await.expect("save");
        tokio::fs::write(store.dir.join("junk.json"), "{broken")
            .await
            .expect("write junk");
        let loaded = store.load_incomplete().await;
        assert_eq!(loaded.len(), 1);
    }

    #[tokio::test]
    async fn missing_directory_loads_nothing() {
        let store = temp_store();
        assert!(store.load_incomplete().await.is_empty());
    }
}
