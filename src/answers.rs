//! Per-round answer aggregation
//!
//! This module implements the mailbox that collects player submissions
//! during a QUESTION round. Each player id owns exactly one slot; the
//! first submission wins and later ones from the same player are ignored.
//! The mailbox is only meaningful while a round is open; the session
//! empties it at round open and again after REVEAL ends. It exposes a
//! live count for the host's "N answers" display.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{quiz::Answer, roster::Id};

/// One player's submission for the current round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// The submitting player
    pub player_id: Id,
    /// The answer, shaped by the question type
    pub answer: Answer,
    /// Client-reported seconds left on the round clock; trusted for scoring
    pub time_remaining: u32,
}

/// Mailbox of submissions for the round in progress, keyed by player id
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AnswerAggregator {
    slots: HashMap<Id, Submission>,
}

impl AnswerAggregator {
    /// Stores a submission if the player has no slot yet
    ///
    /// First write wins: a second submission from the same player within
    /// one round is dropped. Returns whether the submission was accepted.
    pub fn accept(&mut self, submission: Submission) -> bool {
        match self.slots.entry(submission.player_id) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(submission);
                true
            }
        }
    }

    /// The submission stored for a player, if any
    pub fn get(&self, player_id: Id) -> Option<&Submission> {
        self.slots.get(&player_id)
    }

    /// Number of players who have answered this round
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no answers have arrived yet
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Empties the mailbox at a round boundary
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
