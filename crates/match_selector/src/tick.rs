use crate::collab::{DecisionLog, FeedPublisher, LiveEventSource, StateStore};
use crate::config::SelectorConfig;
use crate::model::{Match, VirtualEvent};
use crate::select::{decide, Outcome};
use crate::state::SelectorState;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use logger::{BlueZoneTickEvent, EventLogger};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Idle,
    Hold,
    Switched,
    NoWebcast,
}

#[derive(Debug, Clone)]
pub struct TickReport {
    pub outcome: TickOutcome,
    pub selected: Option<Match>,
    /// Výstupní event; při switchi nese webcast vybraného eventu
    pub virtual_event: VirtualEvent,
    /// Stav po ticku (uložený jen při switchi)
    pub state: SelectorState,
}

/// Řídicí smyčka BlueZone: jeden `run_tick` = načti, rozhodni, aplikuj
pub struct BlueZone {
    cfg: SelectorConfig,
    source: Box<dyn LiveEventSource>,
    store: Box<dyn StateStore>,
    publisher: Box<dyn FeedPublisher>,
    decisions: Box<dyn DecisionLog>,
    events: Option<EventLogger>,
}

impl BlueZone {
    pub fn new(
        cfg: SelectorConfig,
        source: Box<dyn LiveEventSource>,
        store: Box<dyn StateStore>,
        publisher: Box<dyn FeedPublisher>,
        decisions: Box<dyn DecisionLog>,
    ) -> Self {
        Self {
            cfg,
            source,
            store,
            publisher,
            decisions,
            events: None,
        }
    }

    /// Zapíná JSONL záznam o každém ticku
    pub fn with_event_logger(mut self, logger: EventLogger) -> Self {
        self.events = Some(logger);
        self
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.cfg
    }

    /// Pořadí při switchi: webcast → stav → log → match list.
    /// Stav se ukládá až po úspěšném publish, takže selhaný publish
    /// se v dalším ticku zopakuje. Zápis logů je best-effort.
    pub async fn run_tick(&self, now: DateTime<Utc>) -> Result<TickReport> {
        let live_events = self
            .source
            .list_live_events()
            .await
            .context("list live events")?;
        let state = self
            .store
            .load(&self.cfg.state_key)
            .context("load selector state")?;

        let mut decision = decide(&live_events, &state, now, &self.cfg);
        let mut virtual_event = VirtualEvent::bluezone(&self.cfg.virtual_event_id, now);

        let (outcome, next_state) = match &decision.outcome {
            Outcome::Switch { webcast, next_state } => {
                virtual_event.webcasts = vec![(*webcast).clone()];
                self.publisher
                    .publish(&virtual_event.key, webcast)
                    .await
                    .context("publish webcast")?;
                self.store
                    .save(&self.cfg.state_key, next_state)
                    .context("save selector state")?;

                if let Some(m) = decision.selected {
                    decision.trace.line(format!("Switching to: {}", m.key));
                }
                if let Err(e) = self.decisions.append(now.date_naive(), &decision.trace.render()) {
                    warn!("Decision log append failed: {e:#}");
                }
                (TickOutcome::Switched, next_state.clone())
            }
            Outcome::Hold => (TickOutcome::Hold, state.clone()),
            Outcome::NoWebcast => (TickOutcome::NoWebcast, state.clone()),
            Outcome::Idle => (TickOutcome::Idle, state.clone()),
        };

        if let Some(m) = decision.selected {
            self.publisher
                .publish_matches(&virtual_event.key, std::slice::from_ref(m))
                .await
                .context("publish match list")?;
        }

        if let Some(events) = &self.events {
            let ev = BlueZoneTickEvent {
                ts:             now.to_rfc3339(),
                event:          "BLUEZONE_TICK",
                candidates:     decision.candidate_count,
                potential:      decision.ranked.iter().map(|c| c.m.key.clone()).collect(),
                selected:       decision.selected.map(|m| m.key.clone()),
                outcome:        decision.outcome.label(),
                switched:       outcome == TickOutcome::Switched,
                blacklist_size: next_state.blacklisted.len(),
            };
            if let Err(e) = events.log(now, &ev) {
                warn!("Tick event log write failed: {e}");
            }
        }

        info!(
            outcome = ?outcome,
            selected = ?decision.selected.map(|m| m.key.as_str()),
            candidates = decision.candidate_count,
            "BlueZone tick done"
        );

        Ok(TickReport {
            outcome,
            selected: decision.selected.cloned(),
            virtual_event,
            state: next_state,
        })
    }
}
