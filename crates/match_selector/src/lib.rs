//! BlueZone match selector
//!
//! Z běžících live eventů vybírá jediný "nejzajímavější" zápas, který se právě
//! hraje nebo začne, a drží na něj výstupní feed. Volá se periodicky,
//! stav mezi ticky žije jen ve `StateStore`.

pub mod candidates;
pub mod collab;
pub mod config;
pub mod model;
pub mod select;
pub mod state;
pub mod tick;

pub use candidates::{gather_candidates, potential_set, upcoming_matches};
pub use collab::{DecisionLog, FeedPublisher, LiveEventSource, StateStore};
pub use config::{env_parse, SelectorConfig};
pub use model::{collect_predictions, EventIndex, LiveEvent, Match, VirtualEvent, Webcast};
pub use prediction_engine::{Prediction, PredictionMap};
pub use select::{decide, Candidate, Decision, DecisionTrace, Outcome};
pub use state::{CurrentMatch, MemoryStateStore, SelectorState, StateRecord, TIME_PATTERN};
pub use tick::{BlueZone, TickOutcome, TickReport};
