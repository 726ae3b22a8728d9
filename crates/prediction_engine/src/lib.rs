//! Prediction engine pro BlueZone
//! Hotness heuristika nad predikovaným skóre - žádné ML, jen pravidlo
//! "vysoké a těsné skóre je nejzajímavější".

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Predikované skóre jedné aliance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlliancePrediction {
    pub score: f64,
}

/// Predikce výsledku zápasu (red vs blue)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub red: AlliancePrediction,
    pub blue: AlliancePrediction,
}

impl Prediction {
    pub fn new(red_score: f64, blue_score: f64) -> Self {
        Self {
            red: AlliancePrediction { score: red_score },
            blue: AlliancePrediction { score: blue_score },
        }
    }

    /// (winner, loser) podle predikovaného skóre
    pub fn split(&self) -> (f64, f64) {
        if self.red.score > self.blue.score {
            (self.red.score, self.blue.score)
        } else {
            (self.blue.score, self.red.score)
        }
    }

    /// Surová hotness: winner + 2 × loser.
    /// Těsné high-scoring zápasy vyhrávají nad debaklem.
    pub fn raw_hotness(&self) -> f64 {
        let (winner, loser) = self.split();
        winner + 2.0 * loser
    }
}

/// Predikce indexované podle match id (sjednocené přes všechny live eventy)
pub type PredictionMap = HashMap<String, Prediction>;

/// Vstup pro scoring: id zápasu a jestli už se odehrál
pub trait Scorable {
    fn match_key(&self) -> &str;
    fn has_been_played(&self) -> bool;
}

impl<T: Scorable + ?Sized> Scorable for &T {
    fn match_key(&self) -> &str {
        (**self).match_key()
    }
    fn has_been_played(&self) -> bool {
        (**self).has_been_played()
    }
}

pub const HOTNESS_MIN: f64 = 0.0;
pub const HOTNESS_MAX: f64 = 100.0;

/// Spočítá normalizovanou hotness (0–100) pro každý vstup, ve stejném pořadí.
///
/// Neodehrané zápasy s predikcí se normalizují mezi min a max surovou hodnotou.
/// Zápasy bez predikce (nebo už odehrané) dostanou 0 a do min/max se nepočítají.
/// Když je max == min (jeden kandidát, nebo všichni stejně), dostanou všichni
/// skórovaní 100.
pub fn score_hotness<T: Scorable>(items: &[T], predictions: &PredictionMap) -> Vec<f64> {
    let raw: Vec<Option<f64>> = items
        .iter()
        .map(|m| {
            if m.has_been_played() {
                return None;
            }
            predictions.get(m.match_key()).map(Prediction::raw_hotness)
        })
        .collect();

    let (min_raw, max_raw) = raw.iter().flatten().fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(lo, hi), &r| (lo.min(r), hi.max(r)),
    );

    let span = max_raw - min_raw;
    raw.into_iter()
        .map(|r| match r {
            None => HOTNESS_MIN,
            Some(_) if !(span > 0.0) => HOTNESS_MAX,
            Some(r) => (HOTNESS_MAX * (r - min_raw) / span).clamp(HOTNESS_MIN, HOTNESS_MAX),
        })
        .collect()
}
