//! Player-side runtime
//!
//! [`PlayerRuntime`] is a snapshot consumer: it joins a session by pin,
//! replaces its local view wholesale with every host broadcast, validates
//! answers before they touch the wire, and works out its own round result
//! from the revealed answer during REVEAL. The seat is persisted on every
//! change so a reload can probe and resume.
//!
//! The runtime never holds session truth. A retracted channel means the
//! host is gone for good; the runtime terminates and clears its seat.

use serde::{Deserialize, Serialize};

use crate::{
    game_pin::GamePin,
    quiz::Answer,
    roster::Id,
    session::GameState,
    store::{self, Probe, SavedPlayer, SessionStore},
    sync::{AnswerEvent, ChannelMessage, HostSnapshot, JoinEvent, SyncChannel},
};

/// Errors from answer submission, raised before anything reaches the wire
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Error {
    /// No question is currently accepting answers
    #[error("no question is accepting answers")]
    NotAccepting,
    /// The answer's shape does not fit the current question's type
    #[error("the answer does not fit the question")]
    InvalidSubmission,
    /// This round already has an answer from us
    #[error("an answer was already submitted this round")]
    AlreadyAnswered,
}

/// One player's side of a game: seat, channel, store, and local view
pub struct PlayerRuntime<C, S> {
    seat: SavedPlayer,
    channel: C,
    store: S,
    view: Option<HostSnapshot>,
    /// Id of the question the current submission belongs to
    round_question: Option<String>,
    submitted: Option<Answer>,
    terminated: bool,
}

impl<C: SyncChannel, S: SessionStore> PlayerRuntime<C, S> {
    /// Announces a join on the channel and persists the seat
    ///
    /// The join is fire-and-forget; it counts as acknowledged once a host
    /// snapshot arrives with this player on the roster.
    pub fn join(
        pin: GamePin,
        id: Id,
        name: &str,
        avatar: Option<String>,
        channel: C,
        store: S,
    ) -> Result<Self, serde_json::Error> {
        let seat = SavedPlayer {
            id,
            name: name.to_owned(),
            pin,
            avatar,
            joined: false,
        };
        store::save_player(&store, &seat)?;
        channel.publish(&ChannelMessage::PlayerJoin(JoinEvent {
            id: seat.id,
            name: seat.name.clone(),
            pin: seat.pin,
            avatar: seat.avatar.clone(),
        }));
        Ok(Self {
            seat,
            channel,
            store,
            view: None,
            round_question: None,
            submitted: None,
            terminated: false,
        })
    }

    /// Picks a saved seat back up after a reload
    ///
    /// Only a seat whose pin probes live is restored; the runtime then
    /// re-announces its known id, which any active session accepts. A
    /// stale seat is discarded silently and the caller falls back to the
    /// entry screen.
    pub fn resume<F>(channel: C, store: S, probe: F) -> Result<Option<Self>, serde_json::Error>
    where
        F: FnOnce(GamePin) -> Probe,
    {
        let Some(seat) = store::resume_player(&store, probe) else {
            return Ok(None);
        };
        channel.publish(&ChannelMessage::PlayerJoin(JoinEvent {
            id: seat.id,
            name: seat.name.clone(),
            pin: seat.pin,
            avatar: seat.avatar.clone(),
        }));
        Ok(Some(Self {
            seat,
            channel,
            store,
            view: None,
            round_question: None,
            submitted: None,
            terminated: false,
        }))
    }

    /// Handles one message arriving on the channel
    ///
    /// Only host snapshots for our pin matter; the local view is replaced
    /// wholesale, so stale or duplicated deliveries are harmless. A new
    /// question id resets the local answer state for the new round.
    pub fn on_message(&mut self, message: &ChannelMessage) -> Result<(), serde_json::Error> {
        let ChannelMessage::HostStateUpdate(snapshot) = message else {
            return Ok(());
        };
        if snapshot.pin != self.seat.pin {
            return Ok(());
        }

        let question_id = snapshot
            .current_question
            .as_ref()
            .map(|question| question.id.clone());
        if question_id != self.round_question {
            self.round_question = question_id;
            self.submitted = None;
        }

        let on_roster = snapshot
            .players
            .as_ref()
            .is_some_and(|players| players.iter().any(|player| player.id == self.seat.id));
        if on_roster && !self.seat.joined {
            self.seat.joined = true;
            store::save_player(&self.store, &self.seat)?;
        }

        self.view = Some(snapshot.clone());
        Ok(())
    }

    /// Validates and submits an answer for the current round
    ///
    /// Shape mismatches and duplicates are rejected here and never reach
    /// the channel. `time_remaining` is what our local countdown shows;
    /// the host clamps it against the real limit when scoring.
    pub fn answer(&mut self, answer: Answer, time_remaining: u32) -> Result<(), Error> {
        let question = self
            .view
            .as_ref()
            .filter(|view| view.game_state == GameState::Question)
            .and_then(|view| view.current_question.as_ref())
            .ok_or(Error::NotAccepting)?;
        if self.submitted.is_some() {
            return Err(Error::AlreadyAnswered);
        }
        if !question.accepts(&answer) {
            return Err(Error::InvalidSubmission);
        }

        self.channel.publish(&ChannelMessage::PlayerAnswer(AnswerEvent {
            player_id: self.seat.id,
            answer: answer.clone(),
            time_remaining,
        }));
        self.submitted = Some(answer);
        Ok(())
    }

    /// Our own outcome for the round being revealed
    ///
    /// Derived locally from the broadcast result info, since correctness
    /// is stripped from the roster before broadcast. Outside REVEAL there
    /// is no outcome; an absent submission counts as incorrect.
    pub fn own_result(&self) -> Option<bool> {
        let view = self
            .view
            .as_ref()
            .filter(|view| view.game_state == GameState::Reveal)?;
        let result_info = view.result_info.as_ref()?;
        Some(
            self.submitted
                .as_ref()
                .is_some_and(|answer| result_info.judges(answer)),
        )
    }

    /// Handles the channel being retracted: the session is gone
    ///
    /// Terminal; the seat is cleared and the player must re-join to play
    /// again.
    pub fn on_retracted(&mut self) {
        self.terminated = true;
        self.view = None;
        store::clear_player(&self.store);
    }

    /// Whether the session was terminated under us
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Whether this round already has our answer
    pub fn has_answered(&self) -> bool {
        self.submitted.is_some()
    }

    /// The latest view of the game, if any snapshot arrived yet
    pub fn view(&self) -> Option<&HostSnapshot> {
        self.view.as_ref()
    }

    /// The persisted seat
    pub fn seat(&self) -> &SavedPlayer {
        &self.seat
    }

    /// Leaves the game voluntarily, clearing the persisted seat
    pub fn leave(self) {
        store::clear_player(&self.store);
    }
}
