//! Rozhraní na okolní svět: odkud bereme live eventy a kam publikujeme výstup.

use crate::model::{LiveEvent, Match, Webcast};
use anyhow::Result;
use async_trait::async_trait;

pub use crate::state::StateStore;
pub use logger::DecisionLog;

#[async_trait]
pub trait LiveEventSource: Send + Sync {
    /// Snapshot právě běžících eventů včetně zápasů a predikcí
    async fn list_live_events(&self) -> Result<Vec<LiveEvent>>;
}

#[async_trait]
pub trait FeedPublisher: Send + Sync {
    /// Nahradí webcast výstupního (virtuálního) eventu
    async fn publish(&self, virtual_event_id: &str, webcast: &Webcast) -> Result<()>;

    /// Aktualizuje seznam "now playing" zápasů vedle feedu
    async fn publish_matches(&self, virtual_event_id: &str, matches: &[Match]) -> Result<()>;
}
