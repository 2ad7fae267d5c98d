/*!
 * Process-wide conversation session store.
 *
 * Sessions live in a map keyed by id, each behind its own mutex, so that
 * mutations on one id are linearized while different ids never contend
 * beyond the brief map lookup. `clear` marks the removed slot so a
 * mutator that raced with it retries against a fresh session instead of
 * writing into a detached one.
 *
 * Every slot carries an epoch that is unique for the lifetime of the store.
 * A multi-step turn records the epoch when it starts and writes its result
 * only while that same session is still live.
 */

use log::debug;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use super::models::{ConversationSession, Message};

/// One lifetime of a session id. Clearing and recreating an id yields a new epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionEpoch(u64);

struct SessionSlot {
    session: ConversationSession,
    epoch: SessionEpoch,
    removed: bool,
}

type SharedSlot = Arc<Mutex<SessionSlot>>;

/// Keyed store of conversation sessions
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SharedSlot>>,
    next_epoch: AtomicU64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a fresh session id
    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// The given id, or a generated one when it is missing or blank
    pub fn resolve_id(id: Option<&str>) -> String {
        match id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => Self::generate_id(),
        }
    }

    fn slot(&self, id: &str) -> SharedSlot {
        if let Some(slot) = self.sessions.read().get(id) {
            return slot.clone();
        }

        self.sessions
            .write()
            .entry(id.to_string())
            .or_insert_with(|| {
                debug!("Creating session {}", id);
                Arc::new(Mutex::new(SessionSlot {
                    session: ConversationSession::new(id),
                    epoch: SessionEpoch(self.next_epoch.fetch_add(1, Ordering::Relaxed)),
                    removed: false,
                }))
            })
            .clone()
    }

    /// Run `f` on the live slot of `id` under its lock, creating the session if needed
    fn with_slot<R>(&self, id: &str, f: impl FnOnce(&mut SessionSlot) -> R) -> R {
        loop {
            let slot = self.slot(id);
            let mut guard = slot.lock();
            if guard.removed {
                continue;
            }
            return f(&mut guard);
        }
    }

    /// Return the session `id`, creating it empty when unknown.
    /// A missing or blank id gets a newly generated one.
    pub fn get_or_create(&self, id: Option<&str>) -> ConversationSession {
        let id = Self::resolve_id(id);
        self.with_slot(&id, |slot| slot.session.clone())
    }

    /// Replace the system message of session `id`
    pub fn set_system_prompt(&self, id: &str, prompt: &str) {
        self.with_slot(id, |slot| slot.session.set_system_prompt(prompt));
    }

    /// Append `message` to session `id`
    pub fn append(&self, id: &str, message: Message) {
        self.with_slot(id, |slot| slot.session.push(message));
    }

    /// Start a turn on session `id` in one locked step: optionally replace the
    /// system prompt, append `message`, and return the resulting history along
    /// with the epoch of the session it was written to.
    pub fn begin_turn(
        &self,
        id: &str,
        system_prompt: Option<&str>,
        message: Message,
    ) -> (ConversationSession, SessionEpoch) {
        self.with_slot(id, |slot| {
            if let Some(prompt) = system_prompt {
                slot.session.set_system_prompt(prompt);
            }
            slot.session.push(message);
            (slot.session.clone(), slot.epoch)
        })
    }

    /// Append `message` only if session `id` is still the one identified by `epoch`.
    /// Never creates a session. Returns whether the message was stored.
    pub fn append_if_current(&self, id: &str, epoch: SessionEpoch, message: Message) -> bool {
        let Some(slot) = self.sessions.read().get(id).cloned() else {
            return false;
        };
        let mut guard = slot.lock();
        if guard.removed || guard.epoch != epoch {
            return false;
        }
        guard.session.push(message);
        true
    }

    /// Remove session `id` entirely. Returns whether it existed.
    pub fn clear(&self, id: &str) -> bool {
        let removed = self.sessions.write().remove(id);
        match removed {
            Some(slot) => {
                slot.lock().removed = true;
                debug!("Cleared session {}", id);
                true
            }
            None => false,
        }
    }

    /// Copy of session `id`, if it exists
    pub fn snapshot(&self, id: &str) -> Option<ConversationSession> {
        let slot = self.sessions.read().get(id).cloned()?;
        let guard = slot.lock();
        (!guard.removed).then(|| guard.session.clone())
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}
