//! Host-side runtime
//!
//! [`HostRuntime`] owns the one authoritative copy of a session and wires
//! it to a [`SyncChannel`] and a [`SessionStore`]. Every state-affecting
//! change is followed by the same two effects: the full snapshot is
//! broadcast, and the session is persisted. Nothing else ever writes
//! session truth.
//!
//! The embedder drives the runtime: it delivers incoming channel messages
//! to [`HostRuntime::on_message`], calls [`HostRuntime::tick`] once per
//! second while a round is open, and calls [`HostRuntime::advance`] on the
//! host's "next" action. Timing policy (the tick interval, the purge grace
//! period after FINISH) stays with the embedder.

use garde::Validate;

use crate::{
    game_pin::GamePin,
    history::{HistoryLog, HistoryRecord},
    quiz::Quiz,
    roster::Id,
    session::{GameState, Session},
    store::{self, Probe, SessionStore},
    sync::{ChannelMessage, SyncChannel},
};

/// Errors from host runtime operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The quiz configuration failed validation
    #[error("invalid quiz: {0}")]
    InvalidQuiz(#[from] garde::Report),
    /// The session snapshot could not be persisted
    #[error("could not persist the session: {0}")]
    Persist(#[from] serde_json::Error),
}

/// The host's side of one game: session, channel, store, and history
pub struct HostRuntime<C, S> {
    session: Session,
    host: Id,
    quiz_id: Option<String>,
    channel: C,
    store: S,
    history: HistoryLog,
}

impl<C: SyncChannel, S: SessionStore> HostRuntime<C, S> {
    /// Validates the quiz and opens a new session in LOBBY
    ///
    /// `is_free` reports whether a candidate pin is unclaimed among the
    /// embedder's concurrently active sessions; generation retries until
    /// it passes. The fresh lobby is broadcast and persisted immediately
    /// so players can join and a reload can resume.
    pub fn host<F: Fn(GamePin) -> bool>(
        quiz: &Quiz,
        host: Id,
        quiz_id: Option<String>,
        channel: C,
        store: S,
        is_free: F,
    ) -> Result<Self, Error> {
        quiz.validate()?;
        let mut runtime = Self {
            session: Session::create(quiz, is_free),
            host,
            quiz_id,
            channel,
            store,
            history: HistoryLog::default(),
        };
        runtime.sync_out()?;
        Ok(runtime)
    }

    /// Picks a saved session back up after a reload
    ///
    /// The saved snapshot is only restored when `probe` confirms its pin
    /// is still live; otherwise the store is cleared and there is nothing
    /// to resume. A restored session re-broadcasts its state at once so
    /// waiting players catch up.
    pub fn resume<F>(host: Id, channel: C, store: S, probe: F) -> Result<Option<Self>, Error>
    where
        F: FnOnce(GamePin) -> Probe,
    {
        let Some(saved) = store::resume_host(&store, probe) else {
            return Ok(None);
        };
        let mut runtime = Self {
            session: saved.session,
            host,
            quiz_id: saved.quiz_id,
            channel,
            store,
            history: HistoryLog::default(),
        };
        runtime.sync_out()?;
        Ok(Some(runtime))
    }

    /// Handles one message arriving on the channel
    ///
    /// Join events are admitted only when addressed to this session's
    /// pin (a rejected join is dropped; the broadcast model has no
    /// per-player reply). Answer events feed the round mailbox. Host
    /// state updates are our own echoes and ignored.
    pub fn on_message(&mut self, message: &ChannelMessage) -> Result<(), Error> {
        let changed = match message {
            ChannelMessage::PlayerJoin(event) => {
                event.pin == self.session.pin
                    && self
                        .session
                        .join(event.id, &event.name, event.avatar.clone())
                        .is_ok()
            }
            ChannelMessage::PlayerAnswer(event) => self.session.submit(event.clone().into()),
            ChannelMessage::HostStateUpdate(_) => false,
        };
        if changed {
            self.sync_out()?;
        }
        Ok(())
    }

    /// Starts the game from LOBBY
    pub fn start(&mut self) -> Result<(), Error> {
        self.session.start();
        self.sync_out()
    }

    /// Advances the round clock by one second
    pub fn tick(&mut self) -> Result<(), Error> {
        if self.session.state != GameState::Question {
            return Ok(());
        }
        self.session.tick();
        self.sync_out()
    }

    /// Moves past REVEAL or LEADERBOARD
    ///
    /// A transition into FINISH captures the game's history record before
    /// the new state goes out.
    pub fn advance(&mut self) -> Result<(), Error> {
        let before = self.session.state;
        self.session.advance();
        if self.session.state == GameState::Finish && before != GameState::Finish {
            self.record_history();
        }
        self.sync_out()
    }

    /// Tears the session down on explicit host exit
    ///
    /// A lobby abandoned with players present still leaves a history
    /// record. Subscribers observe the retraction as hard termination.
    pub fn exit(mut self) -> HistoryLog {
        if self.session.state == GameState::Lobby {
            self.record_history();
        }
        self.channel.retract();
        store::clear_host(&self.store);
        self.history
    }

    /// Drops the persisted snapshot once the final screen has had its
    /// grace period ([`crate::constants::store::FINISH_PURGE_GRACE_MS`])
    pub fn purge_saved(&self) {
        store::clear_host(&self.store);
    }

    /// The authoritative session state
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// History records captured so far
    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    fn record_history(&mut self) {
        if let Some(record) = HistoryRecord::capture(&self.session, self.host, self.quiz_id.clone())
        {
            self.history.append(record);
        }
    }

    fn sync_out(&mut self) -> Result<(), Error> {
        self.channel
            .publish(&ChannelMessage::HostStateUpdate(self.session.snapshot()));
        store::save_host_view(&self.store, &self.session, self.quiz_id.as_deref())?;
        Ok(())
    }
}
