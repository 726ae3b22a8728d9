use anyhow::{Context, Result};
use match_selector::SelectorState;
use rusqlite::Connection;

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let db_path = std::env::var("BLUEZONE_DB_PATH").unwrap_or_else(|_| "data/bluezone.db".to_string());
    let conn = Connection::open(&db_path).with_context(|| format!("open db at {db_path}"))?;

    println!("db_path={db_path}");

    let mut stmt = conn
        .prepare("SELECT key, payload_json, updated_at FROM selector_state ORDER BY key")
        .context("query selector_state")?;
    let rows = stmt
        .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?, r.get::<_, String>(2)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("read selector_state")?;

    if rows.is_empty() {
        println!("selector_state: <none>");
    }
    for (key, payload, updated_at) in rows {
        let state = SelectorState::from_json(&payload);
        let current = state
            .current
            .as_ref()
            .map(|c| format!("{} (since {})", c.match_key, c.added_at.format("%Y-%m-%d %H:%M:%S")))
            .unwrap_or_else(|| "<none>".to_string());
        println!("state[{key}]: updated_at={updated_at} current={current} blacklisted={}", state.blacklisted.len());
        for m in &state.blacklisted {
            println!("  blacklisted: {m}");
        }
    }

    let switches: i64 = conn
        .query_row("SELECT COUNT(1) FROM switch_history", [], |r| r.get(0))
        .context("count switch_history")?;
    println!("switch_history: {switches}");

    let mut stmt = conn
        .prepare("SELECT ts, state_key, match_key FROM switch_history ORDER BY id DESC LIMIT 10")
        .context("query switch_history")?;
    let recent = stmt
        .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?, r.get::<_, String>(2)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("read switch_history")?;
    for (ts, key, match_key) in recent {
        println!("  {ts} [{key}] → {match_key}");
    }

    Ok(())
}
