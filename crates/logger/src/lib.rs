/// BlueZone — Logger
/// JSONL event stream + denní textový log rozhodnutí

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

pub struct EventLogger {
    log_dir: PathBuf,
}

impl EventLogger {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        let dir = log_dir.into();
        fs::create_dir_all(&dir).ok();
        Self { log_dir: dir }
    }

    /// Soubor dne se bere z `ts` (čas ticku), ne z hodin procesu
    pub fn log<T: Serialize>(&self, ts: DateTime<Utc>, event: &T) -> Result<()> {
        let date  = ts.format("%Y-%m-%d").to_string();
        let path  = self.log_dir.join(format!("{date}.jsonl"));
        let line  = serde_json::to_string(event)?;
        let mut f = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(f, "{line}")?;
        Ok(())
    }
}

// ── Decision log ─────────────────────────────────────────────────────────────

/// Append-only log rozhodnutí, jeden rostoucí soubor na kalendářní den.
/// Implementace nemusí být atomická vůči souběžným zapisovatelům.
pub trait DecisionLog {
    fn append(&self, day: NaiveDate, text: &str) -> Result<()>;
}

/// `<dir>/<prefix>_<YYYY-MM-DD>.txt`, read-then-append: přečte obsah,
/// připojí text a zapíše celý soubor zpět
pub struct DailyTextLog {
    dir:    PathBuf,
    prefix: String,
}

impl DailyTextLog {
    pub fn new(dir: impl Into<PathBuf>, prefix: &str) -> Self {
        Self { dir: dir.into(), prefix: prefix.to_string() }
    }

    pub fn path_for(&self, day: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}_{}.txt", self.prefix, day.format("%Y-%m-%d")))
    }
}

impl DecisionLog for DailyTextLog {
    fn append(&self, day: NaiveDate, text: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("create log dir {}", self.dir.display()))?;
        let path = self.path_for(day);

        let existing = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e).with_context(|| format!("read {}", path.display())),
        };

        fs::write(&path, existing + text).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }
}

// ── Event typy ────────────────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
pub struct BlueZoneTickEvent {
    pub ts:              String,
    pub event:           &'static str,   // "BLUEZONE_TICK"
    pub candidates:      usize,
    pub potential:       Vec<String>,    // seřazeno podle hotness
    pub selected:        Option<String>,
    pub outcome:         &'static str,   // "idle" | "hold" | "switch" | "no_webcast"
    pub switched:        bool,
    pub blacklist_size:  usize,
}
