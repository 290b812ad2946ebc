//! Player roster management
//!
//! This module tracks the players of a single session: their identities,
//! names, avatars, and host-owned score state. The roster preserves join
//! order, which doubles as the deterministic tie-breaker for equal scores
//! on the leaderboard. Name validation follows the same rules everywhere:
//! trimmed, bounded length, unique within the session, and filtered for
//! inappropriate content.

use std::{
    collections::{HashMap, HashSet},
    fmt::Display,
    str::FromStr,
};

use rustrict::CensorStr;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay, skip_serializing_none};
use thiserror::Error;
use uuid::Uuid;

use crate::scoring::RoundScore;

/// A unique identifier for a session participant
///
/// Ids are supplied by the caller (a client generates one on first use and
/// keeps it in durable storage), so the same player keeps the same id
/// across reconnects and reloads.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random participant id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for Id {
    /// Creates a new random participant id (same as `new()`)
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Id {
    /// Formats the id as a UUID string
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Id {
    type Err = uuid::Error;

    /// Parses an id from a UUID string
    ///
    /// # Errors
    ///
    /// Returns a `uuid::Error` if the string is not a valid UUID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// A player in a session, with host-owned score state
///
/// `score` and `streak` are mutated exclusively by the host when a round
/// closes. `last_answer_correct` is transient REVEAL metadata; it is
/// stripped from broadcast snapshots so the round outcome never leaks to
/// players before the host reveals it.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Caller-supplied identifier, stable across reconnects
    pub id: Id,
    /// Display name, validated on join
    pub name: String,
    /// Opaque avatar reference (emoji, image key)
    pub avatar: Option<String>,
    /// Total points; only ever increases
    pub score: u64,
    /// Consecutive correct answers; resets on any miss
    pub streak: u32,
    /// Whether the last closed round was answered correctly
    pub last_answer_correct: Option<bool>,
}

impl Player {
    /// Creates a fresh player with zero score and streak
    pub fn new(id: Id, name: String, avatar: Option<String>) -> Self {
        Self {
            id,
            name,
            avatar,
            score: 0,
            streak: 0,
            last_answer_correct: None,
        }
    }

    /// Applies a round's scoring outcome to this player
    pub fn apply_round(&mut self, score: RoundScore, correct: bool) {
        self.score += score.delta;
        self.streak = score.streak;
        self.last_answer_correct = Some(correct);
    }

    /// Returns a copy safe to broadcast: REVEAL metadata stripped
    pub fn stripped(&self) -> Self {
        Self {
            last_answer_correct: None,
            ..self.clone()
        }
    }
}

/// Errors that can occur when joining the roster
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The name is empty or contains only whitespace
    #[error("name cannot be empty")]
    Empty,
    /// The name exceeds the maximum allowed length
    #[error("name is too long")]
    TooLong,
    /// The name contains inappropriate content
    #[error("name is inappropriate")]
    Sinful,
    /// The name is already in use by another player
    #[error("name already in-use")]
    Used,
    /// The session has reached the maximum number of allowed players
    #[error("maximum number of players reached")]
    MaximumPlayers,
}

/// Serialization helper for the Roster struct
#[derive(Deserialize)]
struct RosterSerde {
    players: Vec<Player>,
}

/// The players of one session, in join order
///
/// Insertion order is preserved and exposed; everything else (id lookups,
/// name uniqueness) is derived and rebuilt on deserialization.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(from = "RosterSerde")]
pub struct Roster {
    /// Players in the order they joined
    players: Vec<Player>,

    /// Index from player id into `players` (not serialized)
    #[serde(skip_serializing)]
    index: HashMap<Id, usize>,
    /// Names already taken, for uniqueness checks (not serialized)
    #[serde(skip_serializing)]
    names: HashSet<String>,
}

impl From<RosterSerde> for Roster {
    /// Reconstructs the roster from serialized data, rebuilding the
    /// id index and the taken-name set
    fn from(serde: RosterSerde) -> Self {
        let RosterSerde { players } = serde;
        let index = players
            .iter()
            .enumerate()
            .map(|(position, player)| (player.id, position))
            .collect();
        let names = players.iter().map(|player| player.name.clone()).collect();
        Self {
            players,
            index,
            names,
        }
    }
}

impl Roster {
    /// Adds a player to the roster after validating their name
    ///
    /// A join with an id that is already present is a reconnect and
    /// succeeds without changing anything (the stored name wins over the
    /// resubmitted one). Otherwise the name is trimmed and validated.
    ///
    /// # Errors
    ///
    /// * `Error::TooLong` - name exceeds the maximum length
    /// * `Error::Empty` - name is empty after trimming whitespace
    /// * `Error::Sinful` - name contains inappropriate content
    /// * `Error::Used` - name is taken by another player
    /// * `Error::MaximumPlayers` - the session is full
    pub fn join(&mut self, id: Id, name: &str, avatar: Option<String>) -> Result<(), Error> {
        if self.index.contains_key(&id) {
            return Ok(());
        }
        if name.len() > crate::constants::session::MAX_NAME_LENGTH {
            return Err(Error::TooLong);
        }
        let name = rustrict::trim_whitespace(name);
        if name.is_empty() {
            return Err(Error::Empty);
        }
        if name.is_inappropriate() {
            return Err(Error::Sinful);
        }
        if self.players.len() >= crate::constants::session::MAX_PLAYER_COUNT {
            return Err(Error::MaximumPlayers);
        }
        if !self.names.insert(name.to_owned()) {
            return Err(Error::Used);
        }

        self.index.insert(id, self.players.len());
        self.players.push(Player::new(id, name.to_owned(), avatar));
        Ok(())
    }

    /// Gets a player by id
    pub fn get(&self, id: Id) -> Option<&Player> {
        self.index.get(&id).map(|position| &self.players[*position])
    }

    /// Gets a mutable player by id
    pub fn get_mut(&mut self, id: Id) -> Option<&mut Player> {
        self.index
            .get(&id)
            .map(|position| &mut self.players[*position])
    }

    /// Whether a player with this id has joined
    pub fn contains(&self, id: Id) -> bool {
        self.index.contains_key(&id)
    }

    /// Players in join order
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Mutable iterator over the players in join order
    pub fn players_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.iter_mut()
    }

    /// Number of joined players
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether nobody has joined yet
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Clears the transient REVEAL metadata on every player
    pub fn clear_round_flags(&mut self) {
        for player in &mut self.players {
            player.last_answer_correct = None;
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::scoring::score_answer;

    #[test]
    fn test_join_and_get() {
        let mut roster = Roster::default();
        let id = Id::new();

        roster.join(id, "Ada", Some("🦉".to_owned())).unwrap();

        let player = roster.get(id).unwrap();
        assert_eq!(player.name, "Ada");
        assert_eq!(player.score, 0);
        assert_eq!(player.streak, 0);
        assert_eq!(player.avatar.as_deref(), Some("🦉"));
    }

    #[test]
    fn test_rejoin_with_same_id_is_idempotent() {
        let mut roster = Roster::default();
        let id = Id::new();

        roster.join(id, "Ada", None).unwrap();
        roster.join(id, "SomebodyElse", None).unwrap();

        assert_eq!(roster.len(), 1);
        assert_eq!(roster.get(id).unwrap().name, "Ada");
    }

    #[test]
    fn test_join_rejects_bad_names() {
        let mut roster = Roster::default();

        assert_eq!(roster.join(Id::new(), "   ", None), Err(Error::Empty));
        assert_eq!(
            roster.join(Id::new(), &"x".repeat(31), None),
            Err(Error::TooLong)
        );
    }

    #[test]
    fn test_join_rejects_duplicate_name() {
        let mut roster = Roster::default();

        roster.join(Id::new(), "Ada", None).unwrap();
        assert_eq!(roster.join(Id::new(), "Ada", None), Err(Error::Used));
    }

    #[test]
    fn test_join_order_is_preserved() {
        let mut roster = Roster::default();
        for name in ["First", "Second", "Third"] {
            roster.join(Id::new(), name, None).unwrap();
        }

        let names: Vec<_> = roster.players().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["First", "Second", "Third"]);
    }

    #[test]
    fn test_score_is_monotonic_across_rounds() {
        let mut roster = Roster::default();
        let id = Id::new();
        roster.join(id, "Ada", None).unwrap();

        let mut last_score = 0;
        for correct in [true, true, false, true, false] {
            let player = roster.get_mut(id).unwrap();
            let outcome = score_answer(correct, player.streak, 10, 20);
            player.apply_round(outcome, correct);

            let player = roster.get(id).unwrap();
            assert!(player.score >= last_score);
            last_score = player.score;
        }
    }

    #[test]
    fn test_streak_resets_on_miss() {
        let mut roster = Roster::default();
        let id = Id::new();
        roster.join(id, "Ada", None).unwrap();

        for _ in 0..3 {
            let player = roster.get_mut(id).unwrap();
            let outcome = score_answer(true, player.streak, 0, 20);
            player.apply_round(outcome, true);
        }
        assert_eq!(roster.get(id).unwrap().streak, 3);

        let player = roster.get_mut(id).unwrap();
        let outcome = score_answer(false, player.streak, 0, 20);
        player.apply_round(outcome, false);
        assert_eq!(roster.get(id).unwrap().streak, 0);
    }

    #[test]
    fn test_stripped_removes_reveal_metadata() {
        let mut player = Player::new(Id::new(), "Ada".to_owned(), None);
        player.apply_round(score_answer(true, 0, 20, 20), true);

        assert_eq!(player.last_answer_correct, Some(true));
        assert_eq!(player.stripped().last_answer_correct, None);
        assert_eq!(player.stripped().score, player.score);
    }

    #[test]
    fn test_clear_round_flags() {
        let mut roster = Roster::default();
        let id = Id::new();
        roster.join(id, "Ada", None).unwrap();
        roster
            .get_mut(id)
            .unwrap()
            .apply_round(score_answer(true, 0, 20, 20), true);

        roster.clear_round_flags();
        assert_eq!(roster.get(id).unwrap().last_answer_correct, None);
    }

    #[test]
    fn test_roster_serde_roundtrip_rebuilds_index() {
        let mut roster = Roster::default();
        let id = Id::new();
        roster.join(id, "Ada", None).unwrap();
        roster.join(Id::new(), "Grace", None).unwrap();

        let json = serde_json::to_string(&roster).unwrap();
        let restored: Roster = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.len(), 2);
        assert_eq!(restored.get(id).unwrap().name, "Ada");
        // Rebuilt name set still enforces uniqueness
        let mut restored = restored;
        assert_eq!(restored.join(Id::new(), "Grace", None), Err(Error::Used));
    }
}
