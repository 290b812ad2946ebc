//! Session lifecycle and state machine
//!
//! A [`Session`] owns everything about one live game: the pin, the quiz
//! (already shuffled), the roster, the current round's answer mailbox, and
//! the leaderboard bookkeeping. State advances strictly along
//! `LOBBY → QUESTION → REVEAL → LEADERBOARD → (QUESTION | FINISH)`; a round
//! closes only when its timer reaches zero, never because every player has
//! answered.
//!
//! The session is a plain value with no clock and no transport attached.
//! The host runtime drives it by calling [`Session::tick`] once per second
//! and broadcasting [`Session::snapshot`] after every mutation, which keeps
//! the whole state machine testable without timers.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use web_time::SystemTime;

use crate::{
    answers::{AnswerAggregator, Submission},
    game_pin::GamePin,
    leaderboard::Leaderboard,
    quiz::{Question, Quiz},
    roster::{self, Id, Roster},
    scoring::score_answer,
    sync::HostSnapshot,
};

/// Phase of a session, as shown on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameState {
    /// Host screen before any session exists
    Menu,
    /// Waiting room; the only state that admits new players
    Lobby,
    /// A round is open and the timer is running
    Question,
    /// The round closed; correctness is being shown
    Reveal,
    /// Standings between rounds
    Leaderboard,
    /// The game ended; standings are frozen
    Finish,
}

impl GameState {
    /// Whether a session in this state is still running
    pub fn is_live(self) -> bool {
        !matches!(self, GameState::Menu | GameState::Finish)
    }
}

/// Errors from session operations
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq, Serialize)]
pub enum Error {
    /// The pin does not correspond to a live session
    #[error("no live session with that pin")]
    SessionNotFound,
    /// A new player tried to join outside the LOBBY state
    #[error("the lobby is closed")]
    LobbyClosed,
    /// The roster rejected the join
    #[error(transparent)]
    Roster(#[from] roster::Error),
}

/// Who answered, and who answered correctly, in one closed round
///
/// Recorded at REVEAL so per-player and per-question tallies can be
/// derived for the history record without re-scoring anything.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RoundOutcome {
    /// Players with a submission in the round's mailbox
    pub answered: HashSet<Id>,
    /// Players whose submission checked out correct
    pub correct: HashSet<Id>,
}

/// One live game: pin, quiz, roster, round mailbox, and standings
#[derive(Debug, Serialize, Deserialize)]
pub struct Session {
    /// The join code players use
    pub pin: GamePin,
    /// The quiz being played, in final (shuffled) question order
    pub quiz: Quiz,
    /// Current phase
    pub state: GameState,
    /// Index of the question in play (meaningful from the first round on)
    pub current_index: usize,
    /// Seconds left on the round clock
    pub time_left: u32,
    /// Everyone who joined
    pub roster: Roster,
    /// Mailbox for the round in progress
    pub answers: AnswerAggregator,
    /// Rank bookkeeping across rounds
    pub leaderboard: Leaderboard,
    /// When the first round opened
    pub started_at: Option<SystemTime>,
    /// Outcome of every closed round, in play order
    pub round_outcomes: Vec<RoundOutcome>,
}

impl Session {
    /// Creates a session in LOBBY with a shuffled copy of the quiz
    ///
    /// `is_free` reports whether a candidate pin is unclaimed, so the
    /// caller can guarantee pin uniqueness across its live sessions.
    pub fn create<F: Fn(GamePin) -> bool>(quiz: &Quiz, is_free: F) -> Self {
        Self {
            pin: GamePin::new_where(is_free),
            quiz: quiz.shuffled(),
            state: GameState::Lobby,
            current_index: 0,
            time_left: 0,
            roster: Roster::default(),
            answers: AnswerAggregator::default(),
            leaderboard: Leaderboard::default(),
            started_at: None,
            round_outcomes: Vec::new(),
        }
    }

    /// Admits a player, or recognizes a returning one
    ///
    /// New ids are only admitted in LOBBY. A known id is accepted in any
    /// live state, which is what lets a reloaded player pick their seat
    /// back up mid-game.
    pub fn join(&mut self, id: Id, name: &str, avatar: Option<String>) -> Result<(), Error> {
        if self.roster.contains(id) {
            return Ok(());
        }
        if self.state != GameState::Lobby {
            return Err(Error::LobbyClosed);
        }
        self.roster.join(id, name, avatar)?;
        Ok(())
    }

    /// Starts the game by opening the first round
    ///
    /// Ignored outside LOBBY and ignored while the roster is empty; a game
    /// with nobody in it has nothing to play.
    pub fn start(&mut self) {
        if self.state != GameState::Lobby || self.roster.is_empty() {
            return;
        }
        self.started_at = Some(SystemTime::now());
        self.open_round(0);
    }

    /// The question currently in play
    pub fn current_question(&self) -> Option<&Question> {
        match self.state {
            GameState::Question | GameState::Reveal => {
                self.quiz.questions.get(self.current_index)
            }
            _ => None,
        }
    }

    /// Records a player's submission for the open round
    ///
    /// Returns whether the submission was stored. Anything arriving
    /// outside QUESTION is dropped, as is a second submission from the
    /// same player or an answer shaped wrong for the question type.
    pub fn submit(&mut self, submission: Submission) -> bool {
        if self.state != GameState::Question {
            return false;
        }
        if !self.roster.contains(submission.player_id) {
            return false;
        }
        let Some(question) = self.quiz.questions.get(self.current_index) else {
            return false;
        };
        if !question.accepts(&submission.answer) {
            return false;
        }
        self.answers.accept(submission)
    }

    /// Advances the round clock by one second
    ///
    /// When the clock hits zero the round closes: every player is scored
    /// exactly once and the session moves to REVEAL. Ticks outside
    /// QUESTION are ignored.
    pub fn tick(&mut self) {
        if self.state != GameState::Question {
            return;
        }
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            self.close_round();
        }
    }

    /// Moves past REVEAL or LEADERBOARD when the host says so
    pub fn advance(&mut self) {
        match self.state {
            GameState::Reveal => {
                self.answers.clear();
                self.leaderboard.refresh(&self.roster);
                self.state = GameState::Leaderboard;
            }
            GameState::Leaderboard => {
                let next = self.current_index + 1;
                if next < self.quiz.len() {
                    self.open_round(next);
                } else {
                    self.finish();
                }
            }
            _ => {}
        }
    }

    /// Host snapshot of the current state, shaped for broadcast
    ///
    /// The roster is stripped of per-round correctness before it goes on
    /// the wire; players learn their own result from the revealed answer,
    /// not from the broadcast. Result info is only attached in REVEAL.
    pub fn snapshot(&self) -> HostSnapshot {
        let question = self.current_question();
        HostSnapshot {
            pin: self.pin,
            game_state: self.state,
            current_question: question.cloned(),
            time_left: (self.state == GameState::Question).then_some(self.time_left),
            players: (self.state != GameState::Menu).then(|| {
                self.roster
                    .players()
                    .iter()
                    .map(roster::Player::stripped)
                    .collect()
            }),
            result_info: (self.state == GameState::Reveal)
                .then(|| question.map(Question::result_info))
                .flatten(),
        }
    }

    fn open_round(&mut self, index: usize) {
        let Some(question) = self.quiz.questions.get(index) else {
            self.finish();
            return;
        };
        self.current_index = index;
        self.time_left = question.time_limit_seconds;
        self.answers.clear();
        self.roster.clear_round_flags();
        self.state = GameState::Question;
    }

    /// Scores the closed round and records its outcome
    ///
    /// Every rostered player is scored exactly once: answered players per
    /// their submission, silent players as incorrect with no time bonus.
    /// The mailbox stays intact through REVEAL so the host can still show
    /// the answer count.
    fn close_round(&mut self) {
        let Some(question) = self.quiz.questions.get(self.current_index) else {
            self.finish();
            return;
        };
        let time_limit = question.time_limit_seconds;

        let mut outcome = RoundOutcome::default();
        for player in self.roster.players_mut() {
            let (correct, time_remaining) = match self.answers.get(player.id) {
                Some(submission) => {
                    outcome.answered.insert(player.id);
                    (question.check(&submission.answer), submission.time_remaining)
                }
                None => (false, 0),
            };
            if correct {
                outcome.correct.insert(player.id);
            }
            let score = score_answer(correct, player.streak, time_remaining, time_limit);
            player.apply_round(score, correct);
        }
        self.round_outcomes.push(outcome);
        self.state = GameState::Reveal;
    }

    fn finish(&mut self) {
        self.answers.clear();
        self.leaderboard.finalize(&self.roster);
        self.state = GameState::Finish;
    }
}
