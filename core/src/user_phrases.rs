//! User phrase storage.
//!
//! `UserPhrases` is the in-session store of phrases the user added via
//! marking. The newest phrase for a key sorts first so it wins candidate
//! merging. An optional redb-backed store persists phrases across sessions;
//! the engine itself never opens files — hosts attach a store explicitly.

use redb::{Database, ReadableTable, TableDefinition};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

const TABLE: TableDefinition<&str, &str> = TableDefinition::new("user_phrases");

/// In-memory user phrase map with optional write-through persistence.
#[derive(Debug, Default, Clone)]
pub struct UserPhrases {
    map: HashMap<String, Vec<String>>,
    store: Option<Arc<PhraseStore>>,
}

impl UserPhrases {
    /// Create an empty, purely in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or create) a redb-backed store and load its contents.
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self, redb::Error> {
        if let Some(dir) = path.as_ref().parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        let store = PhraseStore {
            db: Database::create(path.as_ref())?,
            path: path.as_ref().to_path_buf(),
        };
        let map = store.load_all()?;
        Ok(Self {
            map,
            store: Some(Arc::new(store)),
        })
    }

    /// Add a phrase for a reading key.
    ///
    /// The phrase is prepended so it becomes the preferred candidate; an
    /// existing occurrence is moved to the front rather than duplicated.
    pub fn add(&mut self, key: &str, phrase: &str) {
        let list = self.map.entry(key.to_string()).or_default();
        list.retain(|p| p != phrase);
        list.insert(0, phrase.to_string());
        if let Some(store) = &self.store {
            let _ = store.save(key, list);
        }
    }

    /// Phrases for a key, newest first.
    pub fn phrases(&self, key: &str) -> &[String] {
        self.map.get(key).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// True if the key has at least one phrase.
    pub fn contains_key(&self, key: &str) -> bool {
        self.map.get(key).map(|v| !v.is_empty()).unwrap_or(false)
    }

    /// True if the exact (key, phrase) pair is present.
    pub fn contains(&self, key: &str, phrase: &str) -> bool {
        self.phrases(key).iter().any(|p| p == phrase)
    }

    /// Number of keys with phrases.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Export all phrases as pretty-printed JSON.
    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.map)
    }

    /// Merge phrases from a JSON export produced by `export_json`.
    pub fn import_json(&mut self, json: &str) -> Result<(), serde_json::Error> {
        let imported: HashMap<String, Vec<String>> = serde_json::from_str(json)?;
        for (key, phrases) in imported {
            // Reverse so the first phrase of the import ends up first here too.
            for phrase in phrases.iter().rev() {
                self.add(&key, phrase);
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
struct PhraseStore {
    db: Database,
    #[allow(dead_code)]
    path: PathBuf,
}

impl PhraseStore {
    fn save(&self, key: &str, phrases: &[String]) -> Result<(), redb::Error> {
        let joined = phrases.join("\n");
        let w = self.db.begin_write()?;
        {
            let mut table = w.open_table(TABLE)?;
            table.insert(key, joined.as_str())?;
        }
        w.commit()?;
        Ok(())
    }

    fn load_all(&self) -> Result<HashMap<String, Vec<String>>, redb::Error> {
        let mut out = HashMap::new();
        let r = self.db.begin_read()?;
        match r.open_table(TABLE) {
            Ok(table) => {
                for item in table.iter()? {
                    let (k, v) = item?;
                    let phrases: Vec<String> =
                        v.value().split('\n').map(|s| s.to_string()).collect();
                    out.insert(k.value().to_string(), phrases);
                }
            }
            Err(e) => {
                // A freshly created database has no table yet.
                if !matches!(e, redb::TableError::TableDoesNotExist(_)) {
                    return Err(e.into());
                }
            }
        }
        Ok(out)
    }
}
