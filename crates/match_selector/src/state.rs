//! Perzistovaný stav selektoru - jediná věc, kterou si BlueZone pamatuje mezi ticky.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use tracing::warn;

pub const TIME_PATTERN: &str = "%Y-%m-%dT%H:%M:%S";
pub const STATE_VERSION: u32 = 1;

/// Zápas, který se právě vysílá, a kdy na něj BlueZone přepnul
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentMatch {
    pub match_key: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorState {
    pub current: Option<CurrentMatch>,
    pub blacklisted: BTreeSet<String>,
}

/// Drátový formát stavu (JSON v state store)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub current_match: Option<String>,
    #[serde(default)]
    pub current_match_added: Option<String>,
    #[serde(default)]
    pub blacklisted_matches: Vec<String>,
}

fn default_version() -> u32 {
    STATE_VERSION
}

impl SelectorState {
    pub fn current_key(&self) -> Option<&str> {
        self.current.as_ref().map(|c| c.match_key.as_str())
    }

    pub fn is_blacklisted(&self, match_key: &str) -> bool {
        self.blacklisted.contains(match_key)
    }

    pub fn to_record(&self) -> StateRecord {
        StateRecord {
            version: STATE_VERSION,
            current_match: self.current.as_ref().map(|c| c.match_key.clone()),
            current_match_added: self
                .current
                .as_ref()
                .map(|c| c.added_at.format(TIME_PATTERN).to_string()),
            blacklisted_matches: self.blacklisted.iter().cloned().collect(),
        }
    }

    /// Nekonzistentní záznam (id bez času, nečitelný čas, neznámá verze)
    /// se načte jako "žádný current match".
    pub fn from_record(record: StateRecord) -> Self {
        if record.version > STATE_VERSION {
            warn!(
                version = record.version,
                "Unknown selector state version, starting cold"
            );
            return Self::default();
        }

        let current = match (record.current_match, record.current_match_added) {
            (Some(match_key), Some(added)) => {
                match NaiveDateTime::parse_from_str(&added, TIME_PATTERN) {
                    Ok(ts) => Some(CurrentMatch {
                        match_key,
                        added_at: ts.and_utc(),
                    }),
                    Err(e) => {
                        warn!("Unparseable current_match_added {:?}: {}", added, e);
                        None
                    }
                }
            }
            (Some(match_key), None) => {
                warn!("current_match {} has no added time, ignoring", match_key);
                None
            }
            (None, _) => None,
        };

        Self {
            current,
            blacklisted: record.blacklisted_matches.into_iter().collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.to_record()).context("serialize selector state")
    }

    /// Nečitelný JSON = studený start, ne chyba
    pub fn from_json(raw: &str) -> Self {
        match serde_json::from_str::<StateRecord>(raw) {
            Ok(record) => Self::from_record(record),
            Err(e) => {
                warn!("Selector state is not valid JSON, starting cold: {}", e);
                Self::default()
            }
        }
    }
}

/// Úložiště stavu selektoru. `save` musí být atomický vůči ostatním zapisovatelům.
pub trait StateStore {
    /// Chybějící klíč vrací `SelectorState::default()`
    fn load(&self, key: &str) -> Result<SelectorState>;
    fn save(&self, key: &str, state: &SelectorState) -> Result<()>;
}

/// In-process store, drží JSON záznamy stejně jako perzistentní varianta
#[derive(Default)]
pub struct MemoryStateStore {
    records: Mutex<HashMap<String, String>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.records
            .lock()
            .ok()
            .and_then(|records| records.get(key).cloned())
    }

    pub fn put_raw(&self, key: &str, raw: &str) {
        if let Ok(mut records) = self.records.lock() {
            records.insert(key.to_string(), raw.to_string());
        }
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self, key: &str) -> Result<SelectorState> {
        Ok(self
            .raw(key)
            .map(|raw| SelectorState::from_json(&raw))
            .unwrap_or_default())
    }

    fn save(&self, key: &str, state: &SelectorState) -> Result<()> {
        let raw = state.to_json()?;
        self.records
            .lock()
            .map_err(|_| anyhow::anyhow!("state store mutex poisoned"))?
            .insert(key.to_string(), raw);
        Ok(())
    }
}
