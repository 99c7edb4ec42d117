//! # Catalog storage
//!
//! Everything soundsig remembers is a JSON document under a string key. The
//! [`KeyValueStore`] trait is the only I/O seam: [`SqliteStore`] keeps the
//! documents in a single `kv` table, [`MemoryStore`] keeps them in a map for
//! tests. [`Catalog`] layers typed load/save operations on top.
//!
//! Documents that no longer parse are logged and treated as missing, so one
//! bad record never locks the user out of the rest of the catalog. Store I/O
//! failures do propagate.

use crate::algorithm::{FilterMode, ScoringContext};
use crate::experience::ExperienceRecord;
use crate::rules::{custom_ids, CategoryRuleSet, CustomCategoryDef};
use crate::signature::Signature;
use crate::spectrum::SpectrumPins;
use anyhow::{Context, Result};
use log::{debug, trace, warn};
use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

pub const RULES_KEY: &str = "category_rules";
pub const FILTER_MODE_KEY: &str = "category_filter_mode";
pub const CUSTOM_CATEGORIES_KEY: &str = "custom_categories";
pub const COLLECTION_KEY: &str = "headphone_collection";
pub const SPECTRUM_KEY: &str = "spectrum_selections";

#[must_use]
pub fn song_signature_key(song_id: &str) -> String {
    format!("song_signature_{song_id}")
}

#[must_use]
pub fn headphone_signature_key(headphone_id: &str) -> String {
    format!("headphone_signature_{headphone_id}")
}

#[must_use]
pub fn experience_key(song_id: &str, headphone_id: &str) -> String {
    format!("experience_{song_id}_{headphone_id}")
}

/// String key-value persistence.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or overwrite.
    fn put(&mut self, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;

    /// Every key starting with `prefix`, sorted.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).put(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        (**self).remove(key)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        (**self).keys_with_prefix(prefix)
    }
}

/// SQLite-backed store. One row per key.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the catalog at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Rusqlite DB connection refused. DB location: {}", path.display()))?;
        debug!("Opened catalog at {}", path.display());
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory().context("Failed to open in-memory SQLite database")?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            (),
        )
        .context("Invalid SQL command when CREATEing kv TABLE.")?;
        Ok(Self { conn })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        trace!("GET {key}");
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()
            .with_context(|| format!("Failed to read key `{key}`"))
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        trace!("PUT {key}");
        self.conn
            .execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                (key, value),
            )
            .with_context(|| format!("Failed to write key `{key}`"))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        trace!("DELETE {key}");
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", [key])
            .with_context(|| format!("Failed to delete key `{key}`"))?;
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        trace!("KEYS {prefix}*");
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key")
            .context("Invalid SQL command when listing keys.")?;
        let keys = stmt
            .query_map([prefix], |row| row.get(0))
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<String>>>())
            .with_context(|| format!("Failed to list keys starting with `{prefix}`"))?;
        Ok(keys)
    }
}

/// In-memory store for tests and dry runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.entries.keys().filter(|key| key.starts_with(prefix)).cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

/// Typed access to every record soundsig persists.
pub struct Catalog<S> {
    store: S,
}

impl<S: KeyValueStore> Catalog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Ignoring unreadable record `{key}`: {e}");
                Ok(None)
            }
        }
    }

    fn save<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value).with_context(|| format!("Failed to serialize `{key}`"))?;
        self.store.put(key, &json)
    }

    // Signatures

    pub fn song_signature(&self, song_id: &str) -> Result<Option<Signature>> {
        self.load(&song_signature_key(song_id))
    }

    pub fn save_song_signature(&mut self, song_id: &str, signature: &Signature) -> Result<()> {
        self.save(&song_signature_key(song_id), signature)
    }

    pub fn delete_song_signature(&mut self, song_id: &str) -> Result<()> {
        self.store.remove(&song_signature_key(song_id))
    }

    pub fn headphone_signature(&self, headphone_id: &str) -> Result<Option<Signature>> {
        self.load(&headphone_signature_key(headphone_id))
    }

    pub fn save_headphone_signature(&mut self, headphone_id: &str, signature: &Signature) -> Result<()> {
        self.save(&headphone_signature_key(headphone_id), signature)
    }

    pub fn delete_headphone_signature(&mut self, headphone_id: &str) -> Result<()> {
        self.store.remove(&headphone_signature_key(headphone_id))
    }

    /// Ids of every headphone with a saved signature, owned or not.
    pub fn headphone_signature_ids(&self) -> Result<Vec<String>> {
        let prefix = headphone_signature_key("");
        let keys = self.store.keys_with_prefix(&prefix)?;
        Ok(keys.iter().filter_map(|key| key.strip_prefix(prefix.as_str())).map(str::to_string).collect())
    }

    /// Saved signatures for `ids`; ids without one are left out.
    pub fn headphone_signatures(&self, ids: &[String]) -> Result<HashMap<String, Signature>> {
        let mut signatures = HashMap::new();
        for id in ids {
            if let Some(signature) = self.headphone_signature(id)? {
                signatures.insert(id.clone(), signature);
            }
        }
        Ok(signatures)
    }

    // Experiences

    pub fn experience(&self, song_id: &str, headphone_id: &str) -> Result<Option<ExperienceRecord>> {
        self.load(&experience_key(song_id, headphone_id))
    }

    pub fn save_experience(&mut self, song_id: &str, headphone_id: &str, record: &ExperienceRecord) -> Result<()> {
        self.save(&experience_key(song_id, headphone_id), record)
    }

    pub fn delete_experience(&mut self, song_id: &str, headphone_id: &str) -> Result<()> {
        self.store.remove(&experience_key(song_id, headphone_id))
    }

    // Rules and preferences

    /// Stored rule set, or the defaults.
    pub fn rules(&self) -> Result<CategoryRuleSet> {
        Ok(self.load(RULES_KEY)?.unwrap_or_default())
    }

    pub fn save_rules(&mut self, rules: &CategoryRuleSet) -> Result<()> {
        self.save(RULES_KEY, rules)
    }

    /// Forget edited rules and custom categories.
    pub fn reset_rules(&mut self) -> Result<()> {
        self.store.remove(RULES_KEY)?;
        self.store.remove(CUSTOM_CATEGORIES_KEY)
    }

    /// Stored as the bare mode name; anything unrecognized reads as precise.
    pub fn filter_mode(&self) -> Result<FilterMode> {
        let raw = self.store.get(FILTER_MODE_KEY)?;
        Ok(raw.and_then(|mode| mode.parse().ok()).unwrap_or_default())
    }

    pub fn set_filter_mode(&mut self, mode: FilterMode) -> Result<()> {
        self.store.put(FILTER_MODE_KEY, mode.as_str())
    }

    pub fn custom_categories(&self) -> Result<Vec<CustomCategoryDef>> {
        Ok(self.load(CUSTOM_CATEGORIES_KEY)?.unwrap_or_default())
    }

    pub fn save_custom_categories(&mut self, defs: &[CustomCategoryDef]) -> Result<()> {
        self.save(CUSTOM_CATEGORIES_KEY, &defs)
    }

    /// Rules, mode and custom ids as currently stored.
    pub fn scoring_context(&self) -> Result<ScoringContext> {
        let defs = self.custom_categories()?;
        Ok(ScoringContext::new(self.rules()?, self.filter_mode()?, custom_ids(&defs)))
    }

    // Collection

    pub fn collection(&self) -> Result<Vec<String>> {
        Ok(self.load(COLLECTION_KEY)?.unwrap_or_default())
    }

    /// Append `id` unless already owned. Returns the updated collection.
    pub fn add_to_collection(&mut self, id: &str) -> Result<Vec<String>> {
        let mut ids = self.collection()?;
        if !ids.iter().any(|owned| owned == id) {
            ids.push(id.to_string());
            self.save(COLLECTION_KEY, &ids)?;
        }
        Ok(ids)
    }

    pub fn remove_from_collection(&mut self, id: &str) -> Result<Vec<String>> {
        let ids: Vec<String> = self.collection()?.into_iter().filter(|owned| owned != id).collect();
        self.save(COLLECTION_KEY, &ids)?;
        Ok(ids)
    }

    // Spectrum

    pub fn spectrum_pins(&self) -> Result<SpectrumPins> {
        Ok(self.load(SPECTRUM_KEY)?.unwrap_or_default())
    }

    pub fn save_spectrum_pins(&mut self, pins: &SpectrumPins) -> Result<()> {
        self.save(SPECTRUM_KEY, pins)
    }
}
