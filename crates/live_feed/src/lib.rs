/// BlueZone — Live Feed
///
/// Okrajové I/O kolem selektoru:
/// - HttpLiveEventSource: GET snapshot live eventů (JSON pole `LiveEvent`)
/// - SnapshotEventSource: stejný formát ze souboru, pro lokální běh
/// - HttpFeedPublisher: PUT webcastu a match listu virtuálního eventu
/// - DryRunPublisher: jen loguje, nic neposílá

use anyhow::{Context, Result};
use async_trait::async_trait;
use match_selector::{FeedPublisher, LiveEvent, LiveEventSource, Match, Webcast};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info, warn};

fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent("bluezone-live/0.1")
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

fn snippet(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

// ── Live event sources ───────────────────────────────────────────────────────

pub struct HttpLiveEventSource {
    client: reqwest::Client,
    url:    String,
}

impl HttpLiveEventSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { client: build_client(), url: url.into() }
    }
}

#[async_trait]
impl LiveEventSource for HttpLiveEventSource {
    async fn list_live_events(&self) -> Result<Vec<LiveEvent>> {
        let resp = self.client.get(&self.url)
            .header("Accept", "application/json")
            .send().await.context("live events request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!("Live events API {status}: {}", snippet(&body, 200));
            return Err(anyhow::anyhow!("live events HTTP {status}"));
        }

        let raw = resp.text().await.context("live events body read failed")?;
        debug!("Live events raw (first 300): {}", snippet(&raw, 300));
        let events: Vec<LiveEvent> = serde_json::from_str(&raw)
            .context("live events JSON parse failed")?;
        info!("Fetched {} live events", events.len());
        Ok(events)
    }
}

/// Live eventy ze souboru, čte se znovu každý tick
pub struct SnapshotEventSource {
    path: PathBuf,
}

impl SnapshotEventSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl LiveEventSource for SnapshotEventSource {
    async fn list_live_events(&self) -> Result<Vec<LiveEvent>> {
        let raw = tokio::fs::read_to_string(&self.path).await
            .with_context(|| format!("read snapshot {}", self.path.display()))?;
        let events: Vec<LiveEvent> = serde_json::from_str(&raw)
            .with_context(|| format!("parse snapshot {}", self.path.display()))?;
        Ok(events)
    }
}

// ── Publishers ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct WebcastUpdate<'a> {
    webcasts: [&'a Webcast; 1],
}

pub struct HttpFeedPublisher {
    client:   reqwest::Client,
    base_url: String,
}

impl HttpFeedPublisher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: build_client(), base_url: base_url.into() }
    }

    fn endpoint(&self, virtual_event_id: &str, leaf: &str) -> String {
        endpoint(&self.base_url, virtual_event_id, leaf)
    }

    async fn put_json<T: Serialize + ?Sized>(&self, url: &str, body: &T) -> Result<()> {
        let resp = self.client.put(url)
            .json(body)
            .send().await
            .with_context(|| format!("PUT {url} failed"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!("Publish {url} status {status}: {}", snippet(&body, 200));
            return Err(anyhow::anyhow!("publish HTTP {status}"));
        }
        Ok(())
    }
}

pub fn endpoint(base_url: &str, virtual_event_id: &str, leaf: &str) -> String {
    format!("{}/events/{}/{}.json", base_url.trim_end_matches('/'), virtual_event_id, leaf)
}

#[async_trait]
impl FeedPublisher for HttpFeedPublisher {
    async fn publish(&self, virtual_event_id: &str, webcast: &Webcast) -> Result<()> {
        let url = self.endpoint(virtual_event_id, "webcasts");
        self.put_json(&url, &WebcastUpdate { webcasts: [webcast] }).await?;
        info!(channel = %webcast.channel, kind = %webcast.kind, "Published webcast for {virtual_event_id}");
        Ok(())
    }

    async fn publish_matches(&self, virtual_event_id: &str, matches: &[Match]) -> Result<()> {
        let url = self.endpoint(virtual_event_id, "matches");
        self.put_json(&url, matches).await?;
        debug!("Published {} matches for {virtual_event_id}", matches.len());
        Ok(())
    }
}

/// Publisher pro běh bez backendu
pub struct DryRunPublisher;

#[async_trait]
impl FeedPublisher for DryRunPublisher {
    async fn publish(&self, virtual_event_id: &str, webcast: &Webcast) -> Result<()> {
        info!("[DRY RUN] {virtual_event_id} webcast → {} / {}", webcast.kind, webcast.channel);
        Ok(())
    }

    async fn publish_matches(&self, virtual_event_id: &str, matches: &[Match]) -> Result<()> {
        let keys: Vec<&str> = matches.iter().map(|m| m.key.as_str()).collect();
        info!("[DRY RUN] {virtual_event_id} now playing → {:?}", keys);
        Ok(())
    }
}
