use crate::lab::LabKind;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Which editable slot of a workspace a draft belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftSlot {
    Design,
    Testbench,
}

/// Storage key for one persisted draft: a workspace kind plus a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraftKey {
    pub kind: LabKind,
    pub slot: DraftSlot,
}

impl DraftKey {
    pub fn new(kind: LabKind, slot: DraftSlot) -> Self {
        Self { kind, slot }
    }

    /// Flat string form used in the draft file, e.g. `verilog_design`,
    /// `verilog_tb`.
    pub fn storage_key(&self) -> String {
        let suffix = match self.slot {
            DraftSlot::Design => "design",
            DraftSlot::Testbench => "tb",
        };
        format!("{}_{}", self.kind.language_id(), suffix)
    }
}

/// Durable key/value storage for workspace drafts. Writes are
/// write-through: a `set` must be visible to every later `get` of the same
/// key, including after a process restart for durable implementations.
pub trait DraftStore {
    fn get(&self, key: &DraftKey) -> Option<String>;
    fn set(&mut self, key: &DraftKey, value: &str);
}

pub(crate) fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("USERPROFILE").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn default_drafts_path() -> PathBuf {
    home_dir().join(".bitlab").join("drafts.json")
}

/// File-backed draft store: one JSON object of storage-key to text,
/// rewritten atomically on every set. A missing or unreadable file is an
/// empty store, never an error.
pub struct FileDraftStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileDraftStore {
    pub fn open(path: PathBuf) -> Self {
        let entries = match fs::read(&path) {
            Ok(data) => match serde_json::from_slice(&data) {
                Ok(entries) => entries,
                Err(err) => {
                    log::warn!("draft file {} is corrupt, starting empty: {err}", path.display());
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                log::warn!("failed to read draft file {}: {err}", path.display());
                BTreeMap::new()
            }
        };

        Self { path, entries }
    }

    fn persist(&self) -> io::Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let bytes = serde_json::to_vec_pretty(&self.entries)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;

        let tmp_path = tmp_sibling(&self.path);
        fs::write(&tmp_path, bytes)?;
        match fs::rename(&tmp_path, &self.path) {
            Ok(()) => Ok(()),
            Err(rename_err) => {
                if self.path.exists() {
                    fs::remove_file(&self.path)?;
                    fs::rename(&tmp_path, &self.path)?;
                    Ok(())
                } else {
                    Err(rename_err)
                }
            }
        }
    }
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

impl DraftStore for FileDraftStore {
    fn get(&self, key: &DraftKey) -> Option<String> {
        self.entries.get(&key.storage_key()).cloned()
    }

    fn set(&mut self, key: &DraftKey, value: &str) {
        self.entries.insert(key.storage_key(), value.to_string());
        if let Err(err) = self.persist() {
            log::warn!("failed to persist draft {}: {err}", key.storage_key());
        }
    }
}

/// In-memory store, used by tests and available as a non-durable fallback.
#[derive(Default)]
pub struct MemoryDraftStore {
    entries: BTreeMap<String, String>,
}

impl DraftStore for MemoryDraftStore {
    fn get(&self, key: &DraftKey) -> Option<String> {
        self.entries.get(&key.storage_key()).cloned()
    }

    fn set(&mut self, key: &DraftKey, value: &str) {
        self.entries.insert(key.storage_key(), value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time should be monotonic")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "bitlab_drafts_{prefix}_{}_{}.json",
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn storage_keys_match_the_wire_naming() {
        let design = DraftKey::new(LabKind::Verilog, DraftSlot::Design);
        let tb = DraftKey::new(LabKind::Verilog, DraftSlot::Testbench);
        assert_eq!(design.storage_key(), "verilog_design");
        assert_eq!(tb.storage_key(), "verilog_tb");
    }

    #[test]
    fn file_store_reads_back_the_last_write_across_reopen() {
        let path = temp_path("roundtrip");
        let key = DraftKey::new(LabKind::Vhdl, DraftSlot::Design);

        let mut store = FileDraftStore::open(path.clone());
        store.set(&key, "entity one");
        store.set(&key, "entity two");
        assert_eq!(store.get(&key).as_deref(), Some("entity two"));

        let reopened = FileDraftStore::open(path.clone());
        assert_eq!(reopened.get(&key).as_deref(), Some("entity two"));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_is_an_empty_store() {
        let path = temp_path("missing");
        let store = FileDraftStore::open(path);
        let key = DraftKey::new(LabKind::Qnx, DraftSlot::Design);
        assert_eq!(store.get(&key), None);
    }

    #[test]
    fn corrupt_file_is_an_empty_store() {
        let path = temp_path("corrupt");
        fs::write(&path, b"not json at all").expect("fixture should write");

        let store = FileDraftStore::open(path.clone());
        let key = DraftKey::new(LabKind::Verilog, DraftSlot::Design);
        assert_eq!(store.get(&key), None);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn keys_never_collide_across_kinds() {
        let mut store = MemoryDraftStore::default();
        store.set(&DraftKey::new(LabKind::Verilog, DraftSlot::Design), "a");
        store.set(&DraftKey::new(LabKind::Vhdl, DraftSlot::Design), "b");
        assert_eq!(
            store
                .get(&DraftKey::new(LabKind::Verilog, DraftSlot::Design))
                .as_deref(),
            Some("a")
        );
        assert_eq!(
            store
                .get(&DraftKey::new(LabKind::Vhdl, DraftSlot::Design))
                .as_deref(),
            Some("b")
        );
    }
}
