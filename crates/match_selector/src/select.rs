//! Výběr zápasu s hysterezí.
//!
//! Preferuje ukázat něco než nic. Klidně přepne NA zápas, který už běží,
//! ale nepřepne Z rozběhnutého zápasu, dokud nevyprší MAX_TIME_PER_MATCH.
//!
//! 1. Najdi nejbližší neodehraný zápas přes všechny live eventy
//! 2. Vezmi všechny zápasy, které začínají do TIME_BUCKET od něj
//! 3. Přepni na nejhorkější z nich, pokud není na blacklistu
//!    (current match po MAX_TIME_PER_MATCH jde na blacklist)

use crate::candidates::{gather_candidates, potential_set};
use crate::config::SelectorConfig;
use crate::model::{collect_predictions, EventIndex, LiveEvent, Match, Webcast};
use crate::state::{CurrentMatch, SelectorState};
use chrono::{DateTime, Utc};
use prediction_engine::score_hotness;
use std::collections::BTreeSet;
use tracing::info;

const TRACE_SEPARATOR: &str = "--------------------------------------------------";

/// Kandidát s hotness pro tento tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate<'a> {
    pub m: &'a Match,
    pub hotness: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<'a> {
    /// Nic vybráno, výstup zůstává jak byl
    Idle,
    /// Vybraný zápas už se vysílá
    Hold,
    /// Přepnout feed a uložit nový stav
    Switch {
        webcast: &'a Webcast,
        next_state: SelectorState,
    },
    /// Nový zápas vybrán, ale jeho event nemá webcast - nepřepínáme
    NoWebcast,
}

impl Outcome<'_> {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Idle => "idle",
            Outcome::Hold => "hold",
            Outcome::Switch { .. } => "switch",
            Outcome::NoWebcast => "no_webcast",
        }
    }
}

/// Textová stopa rozhodování; každý řádek jde i do tracingu
#[derive(Debug, Clone, Default)]
pub struct DecisionTrace {
    lines: Vec<String>,
}

impl DecisionTrace {
    pub fn line(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        info!("[BLUEZONE] {}", msg);
        self.lines.push(msg);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn render(&self) -> String {
        let mut out = String::with_capacity(64 * (self.lines.len() + 1));
        out.push_str(TRACE_SEPARATOR);
        out.push('\n');
        for line in &self.lines {
            out.push_str("[BLUEZONE] ");
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct Decision<'a> {
    pub candidate_count: usize,
    /// Potential set seřazený podle hotness sestupně
    pub ranked: Vec<Candidate<'a>>,
    pub selected: Option<&'a Match>,
    /// Blacklist po tomto ticku (původní + nově přidané)
    pub blacklist: BTreeSet<String>,
    pub outcome: Outcome<'a>,
    pub trace: DecisionTrace,
}

impl Decision<'_> {
    pub fn is_switch(&self) -> bool {
        matches!(self.outcome, Outcome::Switch { .. })
    }
}

/// Seřadí kandidáty podle hotness sestupně; stabilní, shody drží časové pořadí
pub fn rank_by_hotness(candidates: &mut [Candidate<'_>]) {
    candidates.sort_by(|a, b| b.hotness.total_cmp(&a.hotness));
}

/// Jeden krok řídicí smyčky. Čistá funkce - žádné I/O, jen rozhodnutí.
pub fn decide<'a>(
    events: &'a [LiveEvent],
    state: &SelectorState,
    now: DateTime<Utc>,
    cfg: &SelectorConfig,
) -> Decision<'a> {
    let mut trace = DecisionTrace::default();
    trace.line(format!("Current time: {}", now.format("%Y-%m-%d %H:%M:%S")));
    trace.line(format!(
        "State: current={:?} blacklisted={:?}",
        state.current_key(),
        state.blacklisted
    ));

    let index = EventIndex::build(events);
    let current: Option<&CurrentMatch> = match &state.current {
        Some(c) if index.find_match(&c.match_key).is_some() => Some(c),
        Some(c) => {
            trace.line(format!("Current match {} is not live, ignoring", c.match_key));
            None
        }
        None => None,
    };

    // (1, 2) nejbližší zápas + vše co začíná do TIME_BUCKET od něj
    let candidates = gather_candidates(events, cfg.matches_per_event);
    let potential = potential_set(&candidates, cfg.time_bucket);
    trace.line(format!(
        "potential_matches sorted by predicted time: {:?}",
        potential.iter().map(|m| m.key.as_str()).collect::<Vec<_>>()
    ));

    let predictions = collect_predictions(events);
    let hotness = score_hotness(potential, &predictions);
    let mut ranked: Vec<Candidate<'a>> = potential
        .iter()
        .zip(hotness)
        .map(|(&m, hotness)| Candidate { m, hotness })
        .collect();
    rank_by_hotness(&mut ranked);
    trace.line(format!(
        "potential_matches sorted by hotness: {:?}",
        ranked
            .iter()
            .map(|c| format!("{}={:.1}", c.m.key, c.hotness))
            .collect::<Vec<_>>()
    ));

    // (3) nejhorkější, který není na blacklistu. Current match v okně,
    // který ještě nevypršel, má přednost před každým rivalem.
    // přetečení deadlinu = nikdy nevyprší
    let timed_out = |cur: &CurrentMatch| {
        cur.added_at
            .checked_add_signed(cfg.max_time_per_match)
            .map_or(false, |deadline| now > deadline)
    };
    let holding = current.map_or(false, |cur| {
        !state.is_blacklisted(&cur.match_key)
            && !timed_out(cur)
            && ranked.iter().any(|c| c.m.key == cur.match_key)
    });

    let mut selected: Option<&'a Match> = None;
    let mut accumulator: BTreeSet<String> = BTreeSet::new();
    for c in &ranked {
        let key = c.m.key.as_str();
        trace.line(format!("Trying potential match: {key}"));

        if state.is_blacklisted(key) {
            trace.line(format!("Match already blacklisted: {key}"));
            accumulator.insert(key.to_string());
            continue;
        }

        match current {
            Some(cur) if cur.match_key == key => {
                if timed_out(cur) {
                    trace.line(format!("Adding match to blacklist: {key}"));
                    trace.line(format!(
                        "added time: {}, now: {}",
                        cur.added_at.format("%Y-%m-%d %H:%M:%S"),
                        now.format("%Y-%m-%d %H:%M:%S")
                    ));
                    accumulator.insert(key.to_string());
                    continue;
                }
                trace.line(format!("Continuing to use match: {key}"));
            }
            _ if holding => {
                trace.line(format!("Skipping {key}, current match still in play"));
                continue;
            }
            _ => trace.line(format!("Found a good new match: {key}")),
        }
        selected = Some(c.m);
        break;
    }

    if selected.is_none() {
        trace.line("No match selected");
    }

    // blacklist se nikdy nezmenšuje
    let mut blacklist = state.blacklisted.clone();
    blacklist.extend(accumulator);

    let outcome = match selected {
        None => Outcome::Idle,
        Some(m) if current.map(|c| c.match_key.as_str()) == Some(m.key.as_str()) => Outcome::Hold,
        Some(m) => match index.event(&m.event_key).and_then(|e| e.current_webcasts.first()) {
            Some(webcast) => Outcome::Switch {
                webcast,
                next_state: SelectorState {
                    current: Some(CurrentMatch {
                        match_key: m.key.clone(),
                        added_at: now,
                    }),
                    blacklisted: blacklist.clone(),
                },
            },
            None => {
                trace.line(format!("No webcast for event {}, not switching", m.event_key));
                Outcome::NoWebcast
            }
        },
    };

    Decision {
        candidate_count: candidates.len(),
        ranked,
        selected,
        blacklist,
        outcome,
        trace,
    }
}
