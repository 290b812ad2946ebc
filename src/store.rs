//! Durable local snapshots and resumption
//!
//! Host and player each persist their local view on every state-affecting
//! change, so a reload can pick the game back up. Storage is behind the
//! [`SessionStore`] port (get/set/clear on string keys), with
//! [`MemoryStore`] as the bundled in-memory implementation.
//!
//! Resumption is probe-then-restore-or-discard: a saved snapshot is only
//! restored after the transport confirms the session's pin is still live.
//! A [`Probe::Gone`] or [`Probe::Inconclusive`] result (the latter covers
//! a probe that timed out) discards the snapshot, never restores it.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use web_time::SystemTime;

use crate::{game_pin::GamePin, roster::Id, session::Session};

/// Storage key for the host's saved session
pub use crate::constants::store::HOST_KEY;
/// Storage key for a player's saved seat
pub use crate::constants::store::PLAYER_KEY;

/// Port over a durable string key-value store
///
/// The embedder maps this onto whatever durable storage the platform has.
/// Values are opaque JSON documents; keys are the two constants above.
pub trait SessionStore {
    /// Reads the value under a key, if present
    fn get(&self, key: &str) -> Option<String>;

    /// Writes a value under a key, replacing any previous value
    fn set(&self, key: &str, value: &str);

    /// Removes a key and its value
    fn clear(&self, key: &str);
}

impl<S: SessionStore + ?Sized> SessionStore for &S {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) {
        (**self).set(key, value);
    }

    fn clear(&self, key: &str) {
        (**self).clear(key);
    }
}

/// In-memory [`SessionStore`] backed by a mutexed map
#[derive(Debug, Default)]
pub struct MemoryStore {
    cells: Mutex<HashMap<String, String>>,
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.cells
            .lock()
            .ok()
            .and_then(|cells| cells.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut cells) = self.cells.lock() {
            cells.insert(key.to_owned(), value.to_owned());
        }
    }

    fn clear(&self, key: &str) {
        if let Ok(mut cells) = self.cells.lock() {
            cells.remove(key);
        }
    }
}

/// Result of probing the shared backing store for a saved pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// The session is still live; restoring is safe
    Live,
    /// The session no longer exists
    Gone,
    /// The probe could not tell within its timeout
    /// ([`crate::constants::store::PROBE_TIMEOUT_MS`])
    Inconclusive,
}

/// The host's persisted view: the entire session, verbatim
#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedHost {
    /// The full serialized session
    pub session: Session,
    /// Reference into the embedder's quiz library, if the quiz came from one
    pub quiz_id: Option<String>,
    /// When this snapshot was written
    pub saved_at: SystemTime,
}

/// A player's persisted seat
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPlayer {
    /// The player's stable id
    pub id: Id,
    /// The name they joined under
    pub name: String,
    /// The session they were in
    pub pin: GamePin,
    /// Opaque avatar reference
    pub avatar: Option<String>,
    /// Whether the join had been acknowledged
    pub joined: bool,
}

/// Persists the host's session under [`HOST_KEY`]
pub fn save_host<S: SessionStore + ?Sized>(
    store: &S,
    saved: &SavedHost,
) -> Result<(), serde_json::Error> {
    store.set(HOST_KEY, &serde_json::to_string(saved)?);
    Ok(())
}

/// Persists a borrowed session under [`HOST_KEY`]
///
/// Same document shape as [`save_host`], without handing over ownership
/// of the session. This is the call sites' save on every change.
pub fn save_host_view<S: SessionStore + ?Sized>(
    store: &S,
    session: &Session,
    quiz_id: Option<&str>,
) -> Result<(), serde_json::Error> {
    #[skip_serializing_none]
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct View<'a> {
        session: &'a Session,
        quiz_id: Option<&'a str>,
        saved_at: SystemTime,
    }
    store.set(
        HOST_KEY,
        &serde_json::to_string(&View {
            session,
            quiz_id,
            saved_at: SystemTime::now(),
        })?,
    );
    Ok(())
}

/// Persists a player's seat under [`PLAYER_KEY`]
pub fn save_player<S: SessionStore + ?Sized>(
    store: &S,
    saved: &SavedPlayer,
) -> Result<(), serde_json::Error> {
    store.set(PLAYER_KEY, &serde_json::to_string(saved)?);
    Ok(())
}

/// Removes the host's saved session
pub fn clear_host<S: SessionStore + ?Sized>(store: &S) {
    store.clear(HOST_KEY);
}

/// Removes the player's saved seat
pub fn clear_player<S: SessionStore + ?Sized>(store: &S) {
    store.clear(PLAYER_KEY);
}

/// Restores the host's saved session if its pin probes [`Probe::Live`]
///
/// Anything short of a confirmed live session (including a snapshot that
/// no longer parses) discards the saved state and returns `None`, leaving
/// the host at the entry screen.
pub fn resume_host<S, F>(store: &S, probe: F) -> Option<SavedHost>
where
    S: SessionStore + ?Sized,
    F: FnOnce(GamePin) -> Probe,
{
    let raw = store.get(HOST_KEY)?;
    let Ok(saved) = serde_json::from_str::<SavedHost>(&raw) else {
        clear_host(store);
        return None;
    };
    if probe(saved.session.pin) == Probe::Live {
        Some(saved)
    } else {
        clear_host(store);
        None
    }
}

/// Restores a player's saved seat if its pin probes [`Probe::Live`]
pub fn resume_player<S, F>(store: &S, probe: F) -> Option<SavedPlayer>
where
    S: SessionStore + ?Sized,
    F: FnOnce(GamePin) -> Probe,
{
    let raw = store.get(PLAYER_KEY)?;
    let Ok(saved) = serde_json::from_str::<SavedPlayer>(&raw) else {
        clear_player(store);
        return None;
    };
    if probe(saved.pin) == Probe::Live {
        Some(saved)
    } else {
        clear_player(store);
        None
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::quiz::{Question, QuestionType, Quiz};
    use crate::session::GameState;

    fn sample_quiz() -> Quiz {
        Quiz {
            title: "Capitals".to_owned(),
            topic: "Geography".to_owned(),
            questions: vec![Question {
                id: "q-0".to_owned(),
                question_type: QuestionType::TrueFalse,
                text: "Paris is the capital of France".to_owned(),
                options: vec!["True".to_owned(), "False".to_owned()],
                correct_index: 0,
                time_limit_seconds: 10,
            }],
        }
    }

    fn saved_host_with_player() -> (SavedHost, Id) {
        let mut session = Session::create(&sample_quiz(), |_| true);
        let id = Id::new();
        session.join(id, "Ada", None).unwrap();
        session.start();
        (
            SavedHost {
                session,
                quiz_id: Some("lib-42".to_owned()),
                saved_at: SystemTime::now(),
            },
            id,
        )
    }

    #[test]
    fn test_memory_store_set_get_clear() {
        let store = MemoryStore::default();
        assert!(store.get("k").is_none());

        store.set("k", "v1");
        store.set("k", "v2");
        assert_eq!(store.get("k").as_deref(), Some("v2"));

        store.clear("k");
        assert!(store.get("k").is_none());
    }

    #[test]
    fn test_live_probe_restores_identical_host_state() {
        let store = MemoryStore::default();
        let (saved, id) = saved_host_with_player();
        let pin = saved.session.pin;
        save_host(&store, &saved).unwrap();

        let restored = resume_host(&store, |probed| {
            assert_eq!(probed, pin);
            Probe::Live
        })
        .unwrap();

        assert_eq!(restored.session.pin, pin);
        assert_eq!(restored.session.state, GameState::Question);
        assert_eq!(restored.session.current_index, 0);
        assert!(restored.session.roster.contains(id));
        assert_eq!(restored.quiz_id.as_deref(), Some("lib-42"));
        // The snapshot stays put for the next save cycle
        assert!(store.get(HOST_KEY).is_some());
    }

    #[test]
    fn test_borrowed_save_round_trips_through_resume() {
        let store = MemoryStore::default();
        let (saved, id) = saved_host_with_player();
        save_host_view(&store, &saved.session, Some("lib-42")).unwrap();

        let restored = resume_host(&store, |_| Probe::Live).unwrap();
        assert_eq!(restored.session.pin, saved.session.pin);
        assert!(restored.session.roster.contains(id));
        assert_eq!(restored.quiz_id.as_deref(), Some("lib-42"));
    }

    #[test]
    fn test_gone_probe_discards_host_snapshot() {
        let store = MemoryStore::default();
        let (saved, _) = saved_host_with_player();
        save_host(&store, &saved).unwrap();

        assert!(resume_host(&store, |_| Probe::Gone).is_none());
        assert!(store.get(HOST_KEY).is_none());
    }

    #[test]
    fn test_inconclusive_probe_discards_too() {
        let store = MemoryStore::default();
        let (saved, _) = saved_host_with_player();
        save_host(&store, &saved).unwrap();

        assert!(resume_host(&store, |_| Probe::Inconclusive).is_none());
        assert!(store.get(HOST_KEY).is_none());
    }

    #[test]
    fn test_resume_with_nothing_saved() {
        let store = MemoryStore::default();
        assert!(resume_host(&store, |_| Probe::Live).is_none());
        assert!(resume_player(&store, |_| Probe::Live).is_none());
    }

    #[test]
    fn test_corrupt_snapshot_is_discarded_silently() {
        let store = MemoryStore::default();
        store.set(HOST_KEY, "{not json");

        assert!(resume_host(&store, |_| Probe::Live).is_none());
        assert!(store.get(HOST_KEY).is_none());
    }

    #[test]
    fn test_player_seat_round_trips() {
        let store = MemoryStore::default();
        let seat = SavedPlayer {
            id: Id::new(),
            name: "Grace".to_owned(),
            pin: "482913".parse().unwrap(),
            avatar: Some("🦀".to_owned()),
            joined: true,
        };
        save_player(&store, &seat).unwrap();

        let restored = resume_player(&store, |pin| {
            assert_eq!(pin.to_string(), "482913");
            Probe::Live
        })
        .unwrap();
        assert_eq!(restored, seat);
    }

    #[test]
    fn test_gone_probe_clears_player_seat() {
        let store = MemoryStore::default();
        let seat = SavedPlayer {
            id: Id::new(),
            name: "Grace".to_owned(),
            pin: "100000".parse().unwrap(),
            avatar: None,
            joined: false,
        };
        save_player(&store, &seat).unwrap();

        assert!(resume_player(&store, |_| Probe::Gone).is_none());
        assert!(store.get(PLAYER_KEY).is_none());
    }
}
