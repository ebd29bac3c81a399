//! File-backed record store
//!
//! Layout:
//! ```text
//! <data_dir>/quarters/<quarter_id>/overrides.jsonl
//! <data_dir>/quarters/<quarter_id>/finalizations.jsonl
//! ```
//!
//! - One JSON record per line, CRC32-framed (see `checksum`)
//! - Append-only: existing lines are never rewritten
//! - Every append is flushed and fsynced before returning
//! - A trailing line without a newline is an unfinished append and is ignored

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::checksum::{frame_line, unframe_line};
use super::{check_override_unique, check_sequence_free, RecordStore, StoreError, StoreResult};
use crate::finalization::QuarterFinalization;
use crate::model::is_valid_quarter_id;
use crate::observability::{log_event_at, Event, Severity};
use crate::overrides::QuarterOverride;

const QUARTERS_DIR: &str = "quarters";
const OVERRIDES_FILE: &str = "overrides.jsonl";
const FINALIZATIONS_FILE: &str = "finalizations.jsonl";

/// Durable record store rooted at a data directory
#[derive(Debug)]
pub struct FileRecordStore {
    root: PathBuf,
    /// Serializes read-check-append sequences within this process
    write_lock: Mutex<()>,
}

impl FileRecordStore {
    /// Open (and create if needed) a store under `data_dir`
    pub fn open(data_dir: &Path) -> StoreResult<Self> {
        let root = data_dir.join(QUARTERS_DIR);
        fs::create_dir_all(&root).map_err(|e| {
            StoreError::Io(format!(
                "Failed to create store directory {}: {}",
                root.display(),
                e
            ))
        })?;
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    /// Root directory holding per-quarter folders
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn quarter_dir(&self, quarter_id: &str) -> StoreResult<PathBuf> {
        validate_quarter_id(quarter_id)?;
        Ok(self.root.join(quarter_id))
    }

    fn read_lines<T: DeserializeOwned>(path: &Path) -> StoreResult<Vec<T>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(path)
            .map_err(|e| StoreError::Io(format!("Failed to read {}: {}", path.display(), e)))?;

        let committed = &content[..committed_len(content.as_bytes())];
        if committed.len() < content.len() {
            log_event_at(
                Severity::Warn,
                Event::IncompleteRecordDiscarded,
                &[
                    ("path", &path.display().to_string()),
                    ("bytes", &(content.len() - committed.len()).to_string()),
                ],
            );
        }

        committed
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                let corrupt = |reason: String| {
                    StoreError::Corrupt(format!("{} line {}: {}", path.display(), idx + 1, reason))
                };
                let body = unframe_line(line).map_err(corrupt)?;
                serde_json::from_str(body).map_err(|e| corrupt(e.to_string()))
            })
            .collect()
    }

    /// Append one framed record.
    ///
    /// On any write or fsync failure the file is cut back to its last
    /// complete line, so a failed append leaves nothing behind.
    fn append_line<T: Serialize>(path: &Path, record: &T) -> StoreResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StoreError::Io(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let body = serde_json::to_string(record)
            .map_err(|e| StoreError::Corrupt(format!("Failed to serialize record: {}", e)))?;
        let mut line = frame_line(&body);
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| StoreError::Io(format!("Failed to open {}: {}", path.display(), e)))?;

        let mut existing = Vec::new();
        file.read_to_end(&mut existing)
            .map_err(|e| StoreError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        let start = committed_len(&existing) as u64;

        let written = file
            .set_len(start)
            .and_then(|_| file.seek(SeekFrom::Start(start)))
            .and_then(|_| file.write_all(line.as_bytes()))
            .and_then(|_| file.sync_all());

        if let Err(e) = written {
            let rolled_back = file.set_len(start).and_then(|_| file.sync_all()).is_ok();
            log_event_at(
                Severity::Error,
                Event::AppendRolledBack,
                &[
                    ("path", &path.display().to_string()),
                    ("reason", &e.to_string()),
                    ("rolled_back", if rolled_back { "true" } else { "false" }),
                ],
            );
            return Err(StoreError::Io(format!(
                "Failed to append {}: {}",
                path.display(),
                e
            )));
        }

        if let Some(parent) = path.parent() {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }
        Ok(())
    }
}

/// Length of the prefix ending at the last newline.
///
/// Bytes after it belong to an append that never completed.
fn committed_len(content: &[u8]) -> usize {
    content
        .iter()
        .rposition(|b| *b == b'\n')
        .map_or(0, |idx| idx + 1)
}

fn validate_quarter_id(quarter_id: &str) -> StoreResult<()> {
    if is_valid_quarter_id(quarter_id) {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(format!(
            "quarter id '{}' is not a valid storage key",
            quarter_id
        )))
    }
}

impl RecordStore for FileRecordStore {
    fn insert_override(&self, record: &QuarterOverride) -> StoreResult<()> {
        let path = self.quarter_dir(&record.quarter_id)?.join(OVERRIDES_FILE);
        let _guard = self.write_lock.lock().map_err(|_| StoreError::lock_poisoned())?;

        let existing: Vec<QuarterOverride> = Self::read_lines(&path)?;
        check_override_unique(&existing, record)?;
        Self::append_line(&path, record)
    }

    fn overrides_for(&self, quarter_id: &str) -> StoreResult<Vec<QuarterOverride>> {
        let path = self.quarter_dir(quarter_id)?.join(OVERRIDES_FILE);
        Self::read_lines(&path)
    }

    fn append_finalization(&self, record: &QuarterFinalization) -> StoreResult<()> {
        let path = self.quarter_dir(&record.quarter_id)?.join(FINALIZATIONS_FILE);
        let _guard = self.write_lock.lock().map_err(|_| StoreError::lock_poisoned())?;

        let existing: Vec<QuarterFinalization> = Self::read_lines(&path)?;
        check_sequence_free(&existing, record)?;
        Self::append_line(&path, record)
    }

    fn finalizations_for(&self, quarter_id: &str) -> StoreResult<Vec<QuarterFinalization>> {
        let path = self.quarter_dir(quarter_id)?.join(FINALIZATIONS_FILE);
        Self::read_lines(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    #[test]
    fn test_records_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();

        {
            let store = FileRecordStore::open(temp_dir.path()).unwrap();
            let o = QuarterOverride::new(
                "Q1-2025",
                "missing_resolution",
                "INC-7",
                "documented in postmortem doc",
                "alice",
                Utc::now(),
            );
            store.insert_override(&o).unwrap();

            let f = QuarterFinalization::new("Q1-2025", 1, "bob", "0".repeat(64), None, None, Utc::now());
            store.append_finalization(&f).unwrap();
        }

        let store = FileRecordStore::open(temp_dir.path()).unwrap();
        let overrides = store.overrides_for("Q1-2025").unwrap();
        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides[0].incident_id, "INC-7");

        let finalizations = store.finalizations_for("Q1-2025").unwrap();
        assert_eq!(finalizations.len(), 1);
        assert_eq!(finalizations[0].finalized_by, "bob");
    }

    #[test]
    fn test_duplicate_override_conflicts_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileRecordStore::open(temp_dir.path()).unwrap();
        let o = QuarterOverride::new("Q1-2025", "missing_resolution", "INC-7", "r", "alice", Utc::now());
        store.insert_override(&o).unwrap();

        let again = QuarterOverride::new("Q1-2025", "missing_resolution", "INC-7", "other", "bob", Utc::now());
        assert!(matches!(
            store.insert_override(&again),
            Err(StoreError::Conflict(_))
        ));
    }

    #[test]
    fn test_missing_quarter_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileRecordStore::open(temp_dir.path()).unwrap();
        assert!(store.overrides_for("Q3-2025").unwrap().is_empty());
        assert!(store.finalizations_for("Q3-2025").unwrap().is_empty());
    }

    #[test]
    fn test_rejects_path_like_quarter_ids() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileRecordStore::open(temp_dir.path()).unwrap();
        for id in ["../etc", "", ".hidden", "Q1 2025"] {
            assert!(matches!(
                store.overrides_for(id),
                Err(StoreError::InvalidKey(_))
            ));
        }
    }

    #[test]
    fn test_corrupt_line_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileRecordStore::open(temp_dir.path()).unwrap();
        let dir = store.root().join("Q1-2025");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(OVERRIDES_FILE), "{not json}\n").unwrap();

        assert!(matches!(
            store.overrides_for("Q1-2025"),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[test]
    fn test_committed_len() {
        assert_eq!(committed_len(b""), 0);
        assert_eq!(committed_len(b"abc"), 0);
        assert_eq!(committed_len(b"abc\n"), 4);
        assert_eq!(committed_len(b"abc\nde"), 4);
    }

    #[test]
    fn test_unfinished_tail_is_ignored_and_replaced() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileRecordStore::open(temp_dir.path()).unwrap();
        let first = QuarterOverride::new("Q1-2025", "missing_resolution", "INC-7", "r", "alice", Utc::now());
        store.insert_override(&first).unwrap();

        let path = store.root().join("Q1-2025").join(OVERRIDES_FILE);
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"1a2b3c4d {\"id\":\"").unwrap();
        drop(file);

        assert_eq!(store.overrides_for("Q1-2025").unwrap(), vec![first.clone()]);

        let second = QuarterOverride::new("Q1-2025", "missing_root_cause", "INC-7", "r", "bob", Utc::now());
        store.insert_override(&second).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.ends_with('\n'));
        assert_eq!(content.lines().count(), 2);
        assert_eq!(store.overrides_for("Q1-2025").unwrap(), vec![first, second]);
    }

    #[test]
    fn test_edited_record_fails_checksum() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileRecordStore::open(temp_dir.path()).unwrap();
        let f = QuarterFinalization::new("Q1-2025", 1, "bob", "0".repeat(64), None, None, Utc::now());
        store.append_finalization(&f).unwrap();

        let path = store.root().join("Q1-2025").join(FINALIZATIONS_FILE);
        let edited = fs::read_to_string(&path).unwrap().replace("bob", "eve");
        fs::write(&path, edited).unwrap();

        match store.finalizations_for("Q1-2025") {
            Err(StoreError::Corrupt(msg)) => assert!(msg.contains("checksum mismatch")),
            other => panic!("expected Corrupt, got {:?}", other),
        }
    }
}
