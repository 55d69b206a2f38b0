// crates/xgeo-core/src/store.rs

//! # Entry Store
//!
//! One [`GeoEntry`] per subject, plus a handle index for the renderer.
//!
//! Merge rules:
//! - the location is replaced as a unit (country XOR region);
//! - a handle is only replaced by another non-empty handle;
//! - `is_vpn` is overwritten whenever the observation assessed it, even
//!   with `false`, and kept otherwise;
//! - classification fields (`signal_type`, `confidence`, `signals`, `meta`)
//!   come from the newest observation.
//!
//! Every merge is written through to the [`EntryStorage`]. A failed write is
//! logged and otherwise ignored: memory stays authoritative.

use crate::config::EngineConfig;
use crate::error::Result;
use crate::model::{GeoEntry, GeoObservation, StoredEntry};
use crate::storage::EntryStorage;
use crate::text::normalize_handle;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Result of a [`EntryStore::merge`].
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub entry: GeoEntry,
    /// True when anything a viewer can see differs from before.
    pub changed: bool,
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Debug)]
pub struct EntryStore<S: EntryStorage> {
    entries: HashMap<String, GeoEntry>,
    handles: HashMap<String, String>,
    storage: S,
    config: EngineConfig,
}

impl<S: EntryStorage> EntryStore<S> {
    /// An empty store writing to `storage`. Nothing is loaded.
    pub fn new(storage: S, config: &EngineConfig) -> Self {
        Self {
            entries: HashMap::new(),
            handles: HashMap::new(),
            storage,
            config: config.clone(),
        }
    }

    /// A store seeded from everything `storage` holds under the entry prefix.
    ///
    /// Entries without an identity or without any location are skipped.
    pub fn restore(storage: S, config: &EngineConfig) -> Result<Self> {
        let mut store = Self::new(storage, config);
        let now = now_millis();
        let mut discarded = 0usize;

        for (key, value) in store.storage.load_all()? {
            if !key.starts_with(&store.config.storage_prefix) {
                continue;
            }
            let entry = serde_json::from_value::<StoredEntry>(value)
                .map_err(crate::XGeoError::from)
                .and_then(|raw| raw.into_entry(now));
            match entry {
                Ok(entry) => store.insert(entry),
                Err(err) => {
                    discarded += 1;
                    debug!(key = %key, error = %err, "stored entry discarded");
                }
            }
        }

        debug!(restored = store.entries.len(), discarded, "entry store restored");
        Ok(store)
    }

    fn insert(&mut self, entry: GeoEntry) {
        if let Some(handle) = &entry.handle {
            self.handles.insert(handle.clone(), entry.subject_id.clone());
        }
        self.entries.insert(entry.subject_id.clone(), entry);
    }

    /// Fold an observation into the entry for its subject and persist it.
    pub fn merge(&mut self, observation: GeoObservation) -> MergeOutcome {
        let previous = self.entries.get(&observation.subject_id);

        let handle = observation
            .handle
            .as_deref()
            .and_then(normalize_handle)
            .or_else(|| {
                observation
                    .meta
                    .about_profile
                    .as_ref()
                    .and_then(|p| p.get("username"))
                    .and_then(|v| v.as_str())
                    .and_then(normalize_handle)
            })
            .or_else(|| previous.and_then(|p| p.handle.clone()));
        let is_vpn = observation
            .is_vpn
            .or_else(|| previous.map(|p| p.is_vpn))
            .unwrap_or(false);

        let entry = GeoEntry {
            subject_id: observation.subject_id,
            handle,
            location: observation.location,
            signal_type: observation.signal_type,
            confidence: observation.confidence,
            signals: observation.signals,
            is_vpn,
            meta: observation.meta,
            cached_at: now_millis(),
        };
        let changed = previous.map_or(true, |p| !p.same_observables(&entry));
        let stale_handle = previous
            .and_then(|p| p.handle.clone())
            .filter(|old| entry.handle.as_ref() != Some(old));

        if let Some(old) = stale_handle {
            if self.handles.get(&old) == Some(&entry.subject_id) {
                self.handles.remove(&old);
            }
        }
        self.insert(entry.clone());
        self.persist(&entry);

        MergeOutcome { entry, changed }
    }

    fn persist(&mut self, entry: &GeoEntry) {
        let key = self.config.storage_key(&entry.subject_id);
        let written = serde_json::to_value(entry)
            .map_err(crate::XGeoError::from)
            .and_then(|value| self.storage.upsert(&key, &value));
        if let Err(err) = written {
            warn!(event = "persist_failed", key = %key, error = %err, "entry not persisted");
        }
    }

    pub fn get(&self, subject_id: &str) -> Option<&GeoEntry> {
        self.entries.get(subject_id)
    }

    /// Entry for a handle (any case, with or without `@`).
    ///
    /// Uses the index first and falls back to scanning every entry, since
    /// handles can be learned under a different identity than the indexed one.
    pub fn lookup_by_handle(&self, handle: &str) -> Option<&GeoEntry> {
        let handle = normalize_handle(handle)?;
        self.handles
            .get(&handle)
            .and_then(|id| self.entries.get(id))
            .filter(|e| e.handle.as_ref() == Some(&handle))
            .or_else(|| {
                self.entries
                    .values()
                    .find(|e| e.handle.as_ref() == Some(&handle))
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeoEntry> {
        self.entries.values()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Remove every entry from memory and storage, returning how many keys
    /// were dropped. Keys outside the entry prefix are left alone.
    pub fn clear_all(&mut self) -> Result<usize> {
        let mut keys: BTreeSet<String> = self
            .storage
            .load_all()?
            .into_iter()
            .map(|(key, _)| key)
            .filter(|key| key.starts_with(&self.config.storage_prefix))
            .collect();
        keys.extend(self.entries.keys().map(|id| self.config.storage_key(id)));

        let keys: Vec<String> = keys.into_iter().collect();
        self.storage.remove(&keys)?;
        self.entries.clear();
        self.handles.clear();
        debug!(removed = keys.len(), "entry store cleared");
        Ok(keys.len())
    }
}
