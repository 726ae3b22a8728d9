use crate::model::{LiveEvent, Match};
use chrono::Duration;

/// Nejbližších `n` neodehraných zápasů eventu se známým predicted_time, od nejdřívějšího
pub fn upcoming_matches(event: &LiveEvent, n: usize) -> Vec<&Match> {
    let mut upcoming: Vec<&Match> = event
        .matches
        .iter()
        .filter(|m| !m.has_been_played && m.predicted_time.is_some())
        .collect();
    upcoming.sort_by_key(|m| m.predicted_time);
    upcoming.truncate(n);
    upcoming
}

/// Kandidáti přes všechny live eventy, seřazení vzestupně podle predicted_time.
/// Řazení je stabilní, shodné časy drží pořadí eventů.
pub fn gather_candidates(events: &[LiveEvent], n: usize) -> Vec<&Match> {
    let mut candidates: Vec<&Match> = events
        .iter()
        .flat_map(|event| upcoming_matches(event, n))
        .collect();
    candidates.sort_by_key(|m| m.predicted_time);
    candidates
}

/// Prefix kandidátů, kteří začínají méně než `bucket` po nejbližším zápasu.
/// Vstup musí být seřazený podle predicted_time.
pub fn potential_set<'c, 'a>(candidates: &'c [&'a Match], bucket: Duration) -> &'c [&'a Match] {
    let Some(anchor) = candidates.first().and_then(|m| m.predicted_time) else {
        return &[];
    };
    // přetečení = okno bez konce
    let cutoff = anchor.checked_add_signed(bucket);

    let len = candidates
        .iter()
        .take_while(|m| match (m.predicted_time, cutoff) {
            (Some(t), Some(cutoff)) => t < cutoff,
            (Some(_), None) => true,
            (None, _) => false,
        })
        .count();
    &candidates[..len]
}
