use anyhow::{Context, Result};
use chrono::Utc;
use match_selector::{SelectorState, StateStore};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::path::Path;

/// Jeden řádek historie přepnutí
#[derive(Debug, Clone)]
pub struct SwitchRow {
    pub ts: String,
    pub state_key: String,
    pub match_key: String,
    pub blacklist_size: i64,
}

/// SQLite state store. Stav = JSON záznam pod klíčem, každé uložení
/// s current matchem přidá řádek do `switch_history` ve stejné transakci.
pub struct SqliteStateStore {
    conn: Connection,
}

impl SqliteStateStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db_path = path.as_ref();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("open sqlite db at {}", db_path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "synchronous", "NORMAL").ok();

        init_schema(&conn)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite")?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Posledních `limit` přepnutí, nejnovější první
    pub fn history(&self, limit: usize) -> Result<Vec<SwitchRow>> {
        recent_switches(&self.conn, limit)
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS selector_state (
            key TEXT PRIMARY KEY,
            payload_json TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS switch_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ts TEXT NOT NULL,
            state_key TEXT NOT NULL,
            match_key TEXT NOT NULL,
            blacklist_size INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_switch_ts ON switch_history(ts);
        "#,
    ).context("init schema")?;

    Ok(())
}

fn recent_switches(conn: &Connection, limit: usize) -> Result<Vec<SwitchRow>> {
    let mut stmt = conn.prepare(
        "SELECT ts, state_key, match_key, blacklist_size FROM switch_history ORDER BY id DESC LIMIT ?1",
    )?;
    let rows = stmt
        .query_map(params![limit as i64], |r| {
            Ok(SwitchRow {
                ts: r.get(0)?,
                state_key: r.get(1)?,
                match_key: r.get(2)?,
                blacklist_size: r.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("read switch history")?;
    Ok(rows)
}

impl StateStore for SqliteStateStore {
    fn load(&self, key: &str) -> Result<SelectorState> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT payload_json FROM selector_state WHERE key = ?1",
                params![key],
                |r| r.get(0),
            )
            .optional()
            .context("read selector state")?;

        Ok(raw.map(|r| SelectorState::from_json(&r)).unwrap_or_default())
    }

    fn save(&self, key: &str, state: &SelectorState) -> Result<()> {
        let payload = state.to_json()?;
        let now = Utc::now().to_rfc3339();

        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)
            .context("begin state transaction")?;
        tx.execute(
            r#"
            INSERT INTO selector_state(key, payload_json, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                payload_json=excluded.payload_json,
                updated_at=excluded.updated_at
            "#,
            params![key, payload, now],
        )?;
        if let Some(current) = &state.current {
            tx.execute(
                "INSERT INTO switch_history(ts, state_key, match_key, blacklist_size) VALUES (?1, ?2, ?3, ?4)",
                params![now, key, current.match_key, state.blacklisted.len() as i64],
            )?;
        }
        tx.commit().context("commit selector state")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use match_selector::CurrentMatch;

    fn state(key: &str, blacklisted: &[&str]) -> SelectorState {
        SelectorState {
            current: Some(CurrentMatch {
                match_key: key.to_string(),
                added_at: Utc.with_ymd_and_hms(2024, 3, 2, 18, 0, 0).unwrap(),
            }),
            blacklisted: blacklisted.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn missing_key_loads_default() {
        let store = SqliteStateStore::open_in_memory().unwrap();
        assert_eq!(store.load("bluezone").unwrap(), SelectorState::default());
    }

    #[test]
    fn save_overwrites_and_records_history() {
        let store = SqliteStateStore::open_in_memory().unwrap();
        store.save("bluezone", &state("2024a_qm1", &[])).unwrap();
        store.save("bluezone", &state("2024b_qm1", &["2024a_qm1"])).unwrap();

        let loaded = store.load("bluezone").unwrap();
        assert_eq!(loaded, state("2024b_qm1", &["2024a_qm1"]));

        let history = store.history(10).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].match_key, "2024b_qm1");
        assert_eq!(history[0].blacklist_size, 1);
        assert_eq!(history[1].match_key, "2024a_qm1");
        assert_eq!(history[1].state_key, "bluezone");
    }

    #[test]
    fn keys_are_independent() {
        let store = SqliteStateStore::open_in_memory().unwrap();
        store.save("a", &state("x", &[])).unwrap();
        assert_eq!(store.load("b").unwrap(), SelectorState::default());
        assert_eq!(store.load("a").unwrap().current_key(), Some("x"));
    }

    #[test]
    fn corrupt_payload_loads_cold() {
        let store = SqliteStateStore::open_in_memory().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO selector_state(key, payload_json, updated_at) VALUES ('bluezone', '{oops', 'now')",
                [],
            )
            .unwrap();
        assert_eq!(store.load("bluezone").unwrap(), SelectorState::default());
    }

    #[test]
    fn file_backed_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("bluezone.db");
        SqliteStateStore::open(&path)
            .unwrap()
            .save("bluezone", &state("2024a_qm1", &["old"]))
            .unwrap();

        let reopened = SqliteStateStore::open(&path).unwrap();
        assert_eq!(
            reopened.load("bluezone").unwrap(),
            state("2024a_qm1", &["old"])
        );
    }
}
