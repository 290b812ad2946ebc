//! Immutable game history records
//!
//! When a session finishes, its final state is distilled into a
//! [`HistoryRecord`]: the quiz metadata, the final ranked players with
//! their real correct/answered tallies, and per-question aggregate counts.
//! Records are owned by the hosting identity, appended to a [`HistoryLog`],
//! and never mutated afterwards.
//!
//! Tallies come from the per-round outcomes the session recorded at each
//! REVEAL, so a player's `correct_answers` counts rounds actually judged
//! correct rather than whatever their streak happened to be at the end.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use web_time::SystemTime;

use crate::{
    game_pin::GamePin,
    leaderboard,
    quiz::QuestionType,
    roster::Id,
    session::{GameState, Session},
};

/// One player's final line in a finished game
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResult {
    /// The player's stable id
    pub id: Id,
    /// Display name
    pub name: String,
    /// Opaque avatar reference
    pub avatar: Option<String>,
    /// Final score
    pub score: u64,
    /// Final rank, 1-indexed
    pub rank: usize,
    /// Rounds this player answered correctly
    pub correct_answers: usize,
    /// Rounds this player submitted an answer for
    pub total_answers: usize,
}

/// Per-question aggregate over all players
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    /// The question text
    pub text: String,
    /// The question kind
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    /// How many submissions were correct
    pub correct_answers: usize,
    /// How many submissions arrived at all
    pub total_answers: usize,
}

/// Immutable summary of one finished game
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    /// The hosting identity that owns this record
    pub host: Id,
    /// Title of the quiz that was played
    pub quiz_title: String,
    /// Reference into the embedder's quiz library, if any
    pub quiz_id: Option<String>,
    /// The pin the game was played under
    pub game_pin: GamePin,
    /// When the first round opened
    pub started_at: Option<SystemTime>,
    /// When the game ended
    pub ended_at: SystemTime,
    /// How many players took part
    pub total_players: usize,
    /// Final ranking with per-player tallies
    pub players: Vec<PlayerResult>,
    /// Per-question aggregates, in play order
    pub questions: Vec<QuestionResult>,
}

impl HistoryRecord {
    /// Distills a finished session into an immutable record
    ///
    /// Only a session in FINISH, or one abandoned in LOBBY with players
    /// present, produces a record; anything else returns `None`. Tallies
    /// are derived by walking the session's recorded round outcomes.
    pub fn capture(session: &Session, host: Id, quiz_id: Option<String>) -> Option<Self> {
        let capturable = match session.state {
            GameState::Finish => true,
            GameState::Lobby => !session.roster.is_empty(),
            _ => false,
        };
        if !capturable {
            return None;
        }

        let players = leaderboard::standings(&session.roster)
            .into_iter()
            .map(|standing| PlayerResult {
                correct_answers: session
                    .round_outcomes
                    .iter()
                    .filter(|outcome| outcome.correct.contains(&standing.id))
                    .count(),
                total_answers: session
                    .round_outcomes
                    .iter()
                    .filter(|outcome| outcome.answered.contains(&standing.id))
                    .count(),
                id: standing.id,
                name: standing.name,
                avatar: standing.avatar,
                score: standing.score,
                rank: standing.rank,
            })
            .collect();

        let questions = session
            .quiz
            .questions
            .iter()
            .zip(&session.round_outcomes)
            .map(|(question, outcome)| QuestionResult {
                text: question.text.clone(),
                question_type: question.question_type,
                correct_answers: outcome.correct.len(),
                total_answers: outcome.answered.len(),
            })
            .collect();

        Some(Self {
            host,
            quiz_title: session.quiz.title.clone(),
            quiz_id,
            game_pin: session.pin,
            started_at: session.started_at,
            ended_at: SystemTime::now(),
            total_players: session.roster.len(),
            players,
            questions,
        })
    }
}

/// Append-only collection of finished games
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HistoryLog {
    records: Vec<HistoryRecord>,
}

impl HistoryLog {
    /// Appends a finished game's record
    pub fn append(&mut self, record: HistoryRecord) {
        self.records.push(record);
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records owned by a host, most recently ended first
    ///
    /// `quiz_id` narrows the result to games of one library quiz.
    pub fn for_host(&self, host: Id, quiz_id: Option<&str>) -> Vec<&HistoryRecord> {
        self.records
            .iter()
            .filter(|record| record.host == host)
            .filter(|record| match quiz_id {
                Some(wanted) => record.quiz_id.as_deref() == Some(wanted),
                None => true,
            })
            .sorted_by(|a, b| b.ended_at.cmp(&a.ended_at))
            .collect()
    }
}
