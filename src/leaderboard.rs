//! Leaderboard and ranking views
//!
//! This module derives ranked views from the session roster: the full
//! ranking, the between-round "Top 5", the final podium, and the transient
//! rank-change markers (up/down/same relative to the previous round).
//! Scores live on the players themselves; the leaderboard only remembers
//! the previous round's ranks, so it can be recomputed from any snapshot.
//!
//! Ranking is a stable sort by score descending. Ties break by join order,
//! which keeps rankings deterministic and reproducible.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use web_time::SystemTime;

use crate::{
    TruncatedVec,
    constants::leaderboard::{PODIUM_SIZE, RANK_CHANGE_WINDOW_MS, TOP_VIEW_LIMIT},
    roster::{Id, Roster},
};

/// One row of a ranked leaderboard view
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    /// The ranked player
    pub id: Id,
    /// The player's display name
    pub name: String,
    /// Opaque avatar reference
    pub avatar: Option<String>,
    /// Total points
    pub score: u64,
    /// 1-indexed position
    pub rank: usize,
}

/// Direction a player's rank moved relative to the previous round
///
/// Display metadata only: not part of the player, not persisted, and
/// expired a couple of seconds after each leaderboard refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankChange {
    /// Rank improved since the previous round
    Up,
    /// Rank worsened since the previous round
    Down,
    /// Rank unchanged (or the player is new)
    Same,
}

/// Ranked-view derivation and rank-change tracking for one session
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Leaderboard {
    /// Rank-by-id as of the previous refresh
    previous_ranks: HashMap<Id, usize>,

    /// Rank-change classification from the latest refresh (not persisted)
    #[serde(skip)]
    rank_changes: HashMap<Id, RankChange>,
    /// When the latest refresh happened (not persisted)
    #[serde(skip)]
    refreshed_at: Option<SystemTime>,
    /// Final standings, computed once at FINISH
    #[serde(skip)]
    final_standings: once_cell_serde::sync::OnceCell<Vec<Standing>>,
}

/// Derives the full ranking for a roster
///
/// Stable sort by score descending; the underlying join order breaks ties.
pub fn standings(roster: &Roster) -> Vec<Standing> {
    let mut ranked: Vec<Standing> = roster
        .players()
        .iter()
        .map(|player| Standing {
            id: player.id,
            name: player.name.clone(),
            avatar: player.avatar.clone(),
            score: player.score,
            rank: 0,
        })
        .collect();
    ranked.sort_by_key(|standing| std::cmp::Reverse(standing.score));
    for (position, standing) in ranked.iter_mut().enumerate() {
        standing.rank = position + 1;
    }
    ranked
}

impl Leaderboard {
    /// Recomputes the ranking and classifies each player's rank movement
    ///
    /// Called on every `REVEAL → LEADERBOARD` transition. Players without a
    /// previous rank (first round, or joined late) classify as `Same`.
    /// Returns the freshly computed full ranking.
    pub fn refresh(&mut self, roster: &Roster) -> Vec<Standing> {
        let ranked = standings(roster);

        self.rank_changes = ranked
            .iter()
            .map(|standing| {
                let change = match self.previous_ranks.get(&standing.id) {
                    Some(previous) if standing.rank < *previous => RankChange::Up,
                    Some(previous) if standing.rank > *previous => RankChange::Down,
                    _ => RankChange::Same,
                };
                (standing.id, change)
            })
            .collect();
        self.previous_ranks = ranked
            .iter()
            .map(|standing| (standing.id, standing.rank))
            .collect();
        self.refreshed_at = Some(SystemTime::now());

        ranked
    }

    /// The player's rank movement, if the display window is still open
    pub fn change(&self, id: Id) -> Option<RankChange> {
        self.change_as_of(id, SystemTime::now())
    }

    /// Like [`Self::change`], evaluated at an explicit instant
    pub fn change_as_of(&self, id: Id, now: SystemTime) -> Option<RankChange> {
        let refreshed_at = self.refreshed_at?;
        let age = now.duration_since(refreshed_at).unwrap_or_default();
        if age > Duration::from_millis(RANK_CHANGE_WINDOW_MS) {
            return None;
        }
        self.rank_changes.get(&id).copied()
    }

    /// The "Top 5" view shown between rounds
    pub fn top(roster: &Roster) -> TruncatedVec<Standing> {
        let ranked = standings(roster);
        let count = ranked.len();
        TruncatedVec::new(ranked.into_iter(), TOP_VIEW_LIMIT, count)
    }

    /// A specific player's current rank, 1-indexed
    pub fn position(roster: &Roster, id: Id) -> Option<usize> {
        standings(roster)
            .into_iter()
            .find(|standing| standing.id == id)
            .map(|standing| standing.rank)
    }

    /// The final full ranking, computed once and then frozen
    ///
    /// First call (at FINISH) captures the standings; later calls return
    /// the same ranking regardless of roster changes.
    pub fn finalize(&self, roster: &Roster) -> &[Standing] {
        self.final_standings.get_or_init(|| standings(roster))
    }

    /// The final podium: the top three of the frozen ranking
    pub fn podium(&self, roster: &Roster) -> TruncatedVec<Standing> {
        let ranked = self.finalize(roster);
        TruncatedVec::new(ranked.iter().cloned(), PODIUM_SIZE, ranked.len())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::scoring::score_answer;

    fn roster_with_scores(scores: &[(&str, u64)]) -> (Roster, Vec<Id>) {
        let mut roster = Roster::default();
        let mut ids = Vec::new();
        for (name, score) in scores {
            let id = Id::new();
            roster.join(id, name, None).unwrap();
            roster.get_mut(id).unwrap().score = *score;
            ids.push(id);
        }
        (roster, ids)
    }

    #[test]
    fn test_standings_sorted_by_score_descending() {
        let (roster, _) = roster_with_scores(&[("Low", 100), ("High", 900), ("Mid", 500)]);

        let ranked = standings(&roster);
        let names: Vec<_> = ranked.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["High", "Mid", "Low"]);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[2].rank, 3);
    }

    #[test]
    fn test_ties_break_by_join_order() {
        let (roster, ids) = roster_with_scores(&[("First", 500), ("Second", 500), ("Third", 500)]);

        let ranked = standings(&roster);
        assert_eq!(ranked[0].id, ids[0]);
        assert_eq!(ranked[1].id, ids[1]);
        assert_eq!(ranked[2].id, ids[2]);
    }

    #[test]
    fn test_top_view_truncates_to_five() {
        let scores: Vec<(String, u64)> = (0..8).map(|i| (format!("P{i}"), i * 100)).collect();
        let borrowed: Vec<(&str, u64)> = scores.iter().map(|(n, s)| (n.as_str(), *s)).collect();
        let (roster, _) = roster_with_scores(&borrowed);

        let top = Leaderboard::top(&roster);
        assert_eq!(top.exact_count(), 8);
        assert_eq!(top.items().len(), 5);
        assert_eq!(top.items()[0].name, "P7");
    }

    #[test]
    fn test_rank_changes_classified_against_previous_round() {
        let (mut roster, ids) = roster_with_scores(&[("Ada", 500), ("Grace", 300)]);
        let mut leaderboard = Leaderboard::default();
        leaderboard.refresh(&roster);

        // Grace overtakes Ada
        roster.get_mut(ids[1]).unwrap().score = 900;
        leaderboard.refresh(&roster);

        assert_eq!(leaderboard.change(ids[1]), Some(RankChange::Up));
        assert_eq!(leaderboard.change(ids[0]), Some(RankChange::Down));
    }

    #[test]
    fn test_new_player_classifies_as_same() {
        let (roster, ids) = roster_with_scores(&[("Ada", 500)]);
        let mut leaderboard = Leaderboard::default();
        leaderboard.refresh(&roster);

        assert_eq!(leaderboard.change(ids[0]), Some(RankChange::Same));
    }

    #[test]
    fn test_rank_change_expires_after_window() {
        let (roster, ids) = roster_with_scores(&[("Ada", 500)]);
        let mut leaderboard = Leaderboard::default();
        leaderboard.refresh(&roster);

        let later = SystemTime::now() + Duration::from_millis(RANK_CHANGE_WINDOW_MS + 500);
        assert_eq!(leaderboard.change_as_of(ids[0], later), None);
    }

    #[test]
    fn test_change_before_any_refresh() {
        let leaderboard = Leaderboard::default();
        assert_eq!(leaderboard.change(Id::new()), None);
    }

    #[test]
    fn test_position() {
        let (roster, ids) = roster_with_scores(&[("Ada", 200), ("Grace", 800)]);
        assert_eq!(Leaderboard::position(&roster, ids[1]), Some(1));
        assert_eq!(Leaderboard::position(&roster, ids[0]), Some(2));
        assert_eq!(Leaderboard::position(&roster, Id::new()), None);
    }

    #[test]
    fn test_finalize_freezes_standings() {
        let (mut roster, ids) = roster_with_scores(&[("Ada", 500), ("Grace", 300)]);
        let leaderboard = Leaderboard::default();

        let final_ranking: Vec<Standing> = leaderboard.finalize(&roster).to_vec();
        assert_eq!(final_ranking[0].name, "Ada");

        // Later roster mutation does not change the frozen ranking
        roster.get_mut(ids[1]).unwrap().score = 9000;
        assert_eq!(leaderboard.finalize(&roster), final_ranking.as_slice());
    }

    #[test]
    fn test_podium_holds_three_of_the_frozen_ranking() {
        let scores: Vec<(String, u64)> = (0..5).map(|i| (format!("P{i}"), i * 100)).collect();
        let borrowed: Vec<(&str, u64)> = scores.iter().map(|(n, s)| (n.as_str(), *s)).collect();
        let (roster, _) = roster_with_scores(&borrowed);
        let leaderboard = Leaderboard::default();

        let podium = leaderboard.podium(&roster);
        assert_eq!(podium.exact_count(), 5);
        assert_eq!(podium.items().len(), 3);
        assert_eq!(podium.items()[0].name, "P4");
    }

    #[test]
    fn test_previous_ranks_survive_serde_roundtrip() {
        let (roster, _) = roster_with_scores(&[("Ada", 500), ("Grace", 300)]);
        let mut leaderboard = Leaderboard::default();
        leaderboard.refresh(&roster);

        let json = serde_json::to_string(&leaderboard).unwrap();
        let restored: Leaderboard = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.previous_ranks, leaderboard.previous_ranks);
        // Transient classification does not survive
        assert!(restored.rank_changes.is_empty());
    }

    #[test]
    fn test_scores_feed_through_from_scoring() {
        let (mut roster, ids) = roster_with_scores(&[("Ada", 0)]);
        let outcome = score_answer(true, 0, 20, 20);
        roster.get_mut(ids[0]).unwrap().apply_round(outcome, true);

        assert_eq!(standings(&roster)[0].score, 1000);
    }
}
