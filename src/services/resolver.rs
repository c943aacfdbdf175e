//! Fuzzy device resolution
//!
//! Maps a spoken fragment such as "kitchen lamp" onto exactly one FHEM
//! entity. Every candidate in the active room is scored against its
//! normalized name, extended with the names of the other rooms it belongs to,
//! and against its alias. The highest score above the acceptance floor wins.
//! Ties keep the candidate the backend listed first.

use crate::client::{DeviceClassFilter, FhemClient, FhemEntity};
use crate::error::{FhemError, Result};
use crate::services::candidates::{fetch_by_type, fetch_candidates};
use crate::services::matching::{ratio, token_sort_ratio, Score};
use crate::services::normalizer::normalize;
use serde::Serialize;
use tracing::debug;

/// Minimum score for general entity resolution
pub const GENERAL_FLOOR: Score = 50;

/// Minimum score for matching roommates by real name
pub const PRESENCE_FLOOR: Score = 66;

/// FHEM module type of roommate entities
pub const ROOMMATE_TYPE: &str = "ROOMMATE";

/// Result of a successful resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedCandidate {
    /// FHEM device name
    pub entity_id: String,
    /// Alias if set, otherwise the device name
    pub display_name: String,
    /// Winning score, always above the floor
    pub match_score: Score,
    /// Value of the `state` reading at resolution time
    pub current_state: String,
}

/// Result of a successful roommate lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresenceMatch {
    pub entity_id: String,
    pub real_name: String,
    pub presence: String,
    pub match_score: Score,
}

/// Running maximum with a floor; only strictly better scores replace the
/// current best, so earlier candidates win ties
struct BestMatch<T> {
    floor: Score,
    best: Option<(Score, T)>,
}

impl<T> BestMatch<T> {
    fn new(floor: Score) -> Self {
        Self { floor, best: None }
    }

    fn threshold(&self) -> Score {
        self.best.as_ref().map_or(self.floor, |(score, _)| *score)
    }

    fn offer(&mut self, score: Score, candidate: impl FnOnce() -> T) {
        if score > self.threshold() {
            self.best = Some((score, candidate()));
        }
    }

    fn into_inner(self) -> Option<(Score, T)> {
        self.best
    }
}

/// Normalized name of `entity` followed by each of its rooms that is neither
/// the active room, ignored, nor already one of the name's tokens
pub fn comparison_name(entity: &FhemEntity, active_room: &str, ignore_rooms: &[String]) -> String {
    let mut name = normalize(&entity.name);
    let base_tokens: Vec<String> = name.split(' ').map(str::to_string).collect();
    let active_room = active_room.to_lowercase();

    let Some(rooms) = entity.rooms() else {
        return name;
    };

    for room in rooms {
        let room = room.to_lowercase();
        if room == active_room || ignore_rooms.contains(&room) || base_tokens.contains(&room) {
            continue;
        }
        let qualifier = normalize(&room);
        if qualifier.is_empty() {
            continue;
        }
        if !name.is_empty() {
            name.push(' ');
        }
        name.push_str(&qualifier);
    }

    name
}

/// Scores of one candidate, alias first when it is scored at all
fn candidate_scores(fragment: &str, entity: &FhemEntity, name: &str) -> Vec<Score> {
    let raw_name = normalize(&entity.name);
    match entity.alias().map(normalize) {
        Some(alias) if alias != raw_name => {
            vec![token_sort_ratio(fragment, &alias), token_sort_ratio(fragment, name)]
        }
        _ => vec![token_sort_ratio(fragment, name)],
    }
}

fn resolved(entity: &FhemEntity, score: Score) -> Result<ResolvedCandidate> {
    let current_state = entity.reading_text("state").ok_or_else(|| {
        FhemError::malformed(format!("{} has no state reading", entity.name))
    })?;

    Ok(ResolvedCandidate {
        entity_id: entity.name.clone(),
        display_name: entity.display_name().to_string(),
        match_score: score,
        current_state,
    })
}

/// Pick the best candidate for `fragment` from an already fetched list
pub fn select_best(
    fragment: &str,
    candidates: &[FhemEntity],
    active_room: &str,
    ignore_rooms: &[String],
    floor: Score,
) -> Option<ResolvedCandidate> {
    let mut best = BestMatch::new(floor);

    for entity in candidates {
        let name = comparison_name(entity, active_room, ignore_rooms);
        let scores = candidate_scores(fragment, entity, &name);
        let top = scores.iter().copied().max().unwrap_or(0);
        debug!(candidate = %entity.name, comparison = %name, ?scores, "Scored candidate");

        if top <= best.threshold() {
            continue;
        }

        match resolved(entity, top) {
            Ok(candidate) => best.offer(top, || candidate),
            Err(e) => debug!("Skipping candidate: {e}"),
        }
    }

    best.into_inner().map(|(_, candidate)| candidate)
}

/// Resolve a spoken fragment to one entity in `room` of the given classes
pub async fn resolve(
    client: &dyn FhemClient,
    fragment: &str,
    room: &str,
    filter: &DeviceClassFilter,
    ignore_rooms: &[String],
) -> Result<Option<ResolvedCandidate>> {
    let candidates = fetch_candidates(client, room, filter).await?;
    let winner = select_best(fragment, &candidates, room, ignore_rooms, GENERAL_FLOOR);
    debug!(fragment, ?winner, "Resolution finished");
    Ok(winner)
}

/// Real name of a roommate: the attribute named by `rr_realname`
fn real_name(entity: &FhemEntity) -> Option<&str> {
    entity
        .attribute("rr_realname")
        .and_then(|key| entity.attribute(key))
        .filter(|name| !name.trim().is_empty())
}

/// Pick the roommate whose real name best matches `wanted`
pub fn select_roommate(wanted: &str, roommates: &[FhemEntity]) -> Option<PresenceMatch> {
    let wanted = wanted.to_lowercase();
    let mut best = BestMatch::new(PRESENCE_FLOOR);

    for entity in roommates {
        let Some(name) = real_name(entity) else {
            debug!("Skipping roommate {} without real name", entity.name);
            continue;
        };
        let Some(presence) = entity.reading_text("presence") else {
            debug!("Skipping roommate {} without presence reading", entity.name);
            continue;
        };

        let score = ratio(&wanted, &name.to_lowercase());
        debug!(roommate = %entity.name, real_name = name, score, "Scored roommate");
        best.offer(score, || PresenceMatch {
            entity_id: entity.name.clone(),
            real_name: name.to_string(),
            presence,
            match_score: score,
        });
    }

    best.into_inner().map(|(_, found)| found)
}

/// Find the roommate in `room` whose real name best matches `wanted`
pub async fn resolve_roommate(
    client: &dyn FhemClient,
    wanted: &str,
    room: &str,
) -> Result<Option<PresenceMatch>> {
    let roommates = fetch_by_type(client, room, ROOMMATE_TYPE).await?;
    Ok(select_roommate(wanted, &roommates))
}
