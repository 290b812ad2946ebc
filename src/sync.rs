//! Wire protocol between host and players
//!
//! Everything crossing the channel is a [`ChannelMessage`]: the host
//! broadcasts full-state [`HostSnapshot`]s, players send join and answer
//! events addressed to the host. Messages are externally tagged as
//! `{"type": ..., "payload": ...}` JSON so either side can dispatch on the
//! type without deserializing the payload first.
//!
//! The transport itself is behind the [`SyncChannel`] trait: the state
//! machine publishes and retracts, and never learns what carries the bytes.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::{
    answers::Submission,
    game_pin::GamePin,
    quiz::{Answer, Question, ResultInfo},
    roster::{Id, Player},
    session::GameState,
};

/// Full host-side state, broadcast after every mutation
///
/// Snapshots are self-contained: a player who missed any number of them is
/// fully caught up by the next one. Optional fields are attached per state,
/// see [`crate::session::Session::snapshot`].
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostSnapshot {
    /// The session's join code
    pub pin: GamePin,
    /// Current phase
    pub game_state: GameState,
    /// The question in play (QUESTION and REVEAL)
    pub current_question: Option<Question>,
    /// Seconds left on the round clock (QUESTION only)
    pub time_left: Option<u32>,
    /// The roster, stripped of per-round correctness
    pub players: Option<Vec<Player>>,
    /// The revealed answer (REVEAL only)
    pub result_info: Option<ResultInfo>,
}

/// A player announcing themselves to the host
///
/// Carries the pin the player typed in, so a host sharing the channel
/// with other sessions only admits joins addressed to its own pin.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinEvent {
    /// The player's self-assigned stable id
    pub id: Id,
    /// Requested display name
    pub name: String,
    /// The session the player wants to join
    pub pin: GamePin,
    /// Opaque avatar reference
    pub avatar: Option<String>,
}

/// A player's answer for the current round
///
/// The answer flattens into the event, so an indexed answer wires as
/// `{"playerId": ..., "answerIndex": 2, "timeRemaining": 14}` and a text
/// answer carries `answerText` instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEvent {
    /// The submitting player
    pub player_id: Id,
    /// The answer itself
    #[serde(flatten)]
    pub answer: Answer,
    /// Client-reported seconds left on the round clock
    pub time_remaining: u32,
}

impl From<AnswerEvent> for Submission {
    fn from(event: AnswerEvent) -> Self {
        Submission {
            player_id: event.player_id,
            answer: event.answer,
            time_remaining: event.time_remaining,
        }
    }
}

/// Any message that travels over the channel
#[derive(Debug, Clone, Serialize, Deserialize, derive_more::From)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelMessage {
    /// Host broadcast of the full game state
    HostStateUpdate(HostSnapshot),
    /// Player asking to join
    PlayerJoin(JoinEvent),
    /// Player submitting an answer
    PlayerAnswer(AnswerEvent),
}

/// Transport abstraction for one session's channel
///
/// Implementations carry [`ChannelMessage`]s between the host and every
/// player on the same pin. `retract` tears the channel down; players treat
/// it as the host vanishing for good.
pub trait SyncChannel {
    /// Sends a message to everyone else on the channel
    fn publish(&self, message: &ChannelMessage);

    /// Closes the channel, signalling the session is gone
    fn retract(&self);
}
