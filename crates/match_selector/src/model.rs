//! Vstupní data jednoho ticku: live eventy, jejich zápasy, webcasty a predikce.

use chrono::{DateTime, Datelike, Utc};
use prediction_engine::{PredictionMap, Scorable};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub key: String,
    pub event_key: String,
    /// None = zápas nejde naplánovat
    #[serde(default)]
    pub predicted_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub has_been_played: bool,
}

impl Scorable for Match {
    fn match_key(&self) -> &str {
        &self.key
    }

    fn has_been_played(&self) -> bool {
        self.has_been_played
    }
}

/// Popis streamu, např. `{"type": "twitch", "channel": "firstinspires"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Webcast {
    #[serde(rename = "type")]
    pub kind: String,
    pub channel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Webcast {
    pub fn new(kind: &str, channel: &str) -> Self {
        Self {
            kind: kind.to_string(),
            channel: channel.to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveEvent {
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub matches: Vec<Match>,
    #[serde(default)]
    pub current_webcasts: Vec<Webcast>,
    #[serde(default)]
    pub match_predictions: Option<PredictionMap>,
}

/// Výstupní "virtuální" event, který zrcadlí webcast právě vybraného zápasu
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualEvent {
    pub key: String,
    pub name: String,
    pub short_name: String,
    pub year: i32,
    pub webcasts: Vec<Webcast>,
}

impl VirtualEvent {
    pub fn bluezone(key: &str, now: DateTime<Utc>) -> Self {
        Self {
            key: key.to_string(),
            name: "TBA BlueZone (BETA)".to_string(),
            short_name: "bluezone".to_string(),
            year: now.year(),
            webcasts: vec![Webcast::new("twitch", "firstinspires")],
        }
    }
}

/// Id-indexovaný pohled na live eventy, postavený jednou za tick
pub struct EventIndex<'a> {
    events: HashMap<&'a str, &'a LiveEvent>,
    matches: HashMap<&'a str, &'a Match>,
}

impl<'a> EventIndex<'a> {
    pub fn build(events: &'a [LiveEvent]) -> Self {
        let mut index = Self {
            events: HashMap::with_capacity(events.len()),
            matches: HashMap::new(),
        };
        for event in events {
            index.events.insert(event.key.as_str(), event);
            for m in &event.matches {
                index.matches.insert(m.key.as_str(), m);
            }
        }
        index
    }

    pub fn event(&self, key: &str) -> Option<&'a LiveEvent> {
        self.events.get(key).copied()
    }

    pub fn find_match(&self, key: &str) -> Option<&'a Match> {
        self.matches.get(key).copied()
    }
}

/// Sjednotí predikce všech eventů. Pozdější event přepíše dřívější při kolizi id.
pub fn collect_predictions(events: &[LiveEvent]) -> PredictionMap {
    let mut predictions = PredictionMap::new();
    for event in events {
        if let Some(p) = &event.match_predictions {
            predictions.extend(p.iter().map(|(k, v)| (k.clone(), *v)));
        }
    }
    predictions
}

#[cfg(test)]
mod tests {
    use super::*;
    use prediction_engine::Prediction;

    fn event(key: &str, preds: &[(&str, f64, f64)]) -> LiveEvent {
        LiveEvent {
            key: key.to_string(),
            name: String::new(),
            matches: vec![Match {
                key: format!("{key}_qm1"),
                event_key: key.to_string(),
                predicted_time: None,
                has_been_played: false,
            }],
            current_webcasts: vec![],
            match_predictions: Some(
                preds
                    .iter()
                    .map(|(k, r, b)| (k.to_string(), Prediction::new(*r, *b)))
                    .collect(),
            ),
        }
    }

    #[test]
    fn later_event_overwrites_prediction_on_collision() {
        let events = vec![
            event("2024a", &[("x", 1.0, 2.0), ("y", 3.0, 4.0)]),
            event("2024b", &[("x", 9.0, 9.0)]),
        ];
        let p = collect_predictions(&events);
        assert_eq!(p.len(), 2);
        assert_eq!(p["x"], Prediction::new(9.0, 9.0));
        assert_eq!(p["y"], Prediction::new(3.0, 4.0));
    }

    #[test]
    fn index_resolves_events_and_matches() {
        let events = vec![event("2024a", &[]), event("2024b", &[])];
        let index = EventIndex::build(&events);
        assert_eq!(index.event("2024b").map(|e| e.key.as_str()), Some("2024b"));
        assert!(index.event("2024z").is_none());
        assert_eq!(
            index.find_match("2024a_qm1").map(|m| m.event_key.as_str()),
            Some("2024a")
        );
        assert!(index.find_match("nope").is_none());
    }

    #[test]
    fn live_event_parses_with_defaults() {
        let raw = r#"{
            "key": "2024casj",
            "matches": [
                {"key": "2024casj_qm7", "event_key": "2024casj",
                 "predicted_time": "2024-03-02T18:04:00Z"}
            ],
            "current_webcasts": [{"type": "twitch", "channel": "frcsv"}],
            "match_predictions": {
                "2024casj_qm7": {"red": {"score": 61}, "blue": {"score": 58}}
            }
        }"#;
        let ev: LiveEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(ev.name, "");
        assert!(!ev.matches[0].has_been_played);
        assert!(ev.matches[0].predicted_time.is_some());
        assert_eq!(ev.current_webcasts[0], Webcast::new("twitch", "frcsv"));
        assert_eq!(
            ev.match_predictions.unwrap()["2024casj_qm7"],
            Prediction::new(61.0, 58.0)
        );
    }
}
