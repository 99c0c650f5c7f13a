//! In-memory table of attempts, guarded by the orchestrator's mutex.

use std::collections::{HashMap, HashSet};

use crate::application::WidgetLease;
use crate::domain::foundation::AttemptId;
use crate::domain::payment::{AdmissionKey, PaymentAttempt};

pub(super) struct Entry {
    pub attempt: PaymentAttempt,

    /// Present from gateway selection until the attempt ends.
    pub lease: Option<WidgetLease>,
}

#[derive(Default)]
pub(super) struct AttemptTable {
    entries: HashMap<AttemptId, Entry>,

    /// The one non-terminal attempt per subject and kind.
    live: HashMap<AdmissionKey, AttemptId>,

    /// Provider refs whose return step is running.
    resuming: HashSet<String>,
}

pub(super) fn admission_key(attempt: &PaymentAttempt) -> AdmissionKey {
    AdmissionKey {
        subject: attempt.subject().clone(),
        kind: attempt.kind(),
    }
}

impl AttemptTable {
    pub fn live_for(&self, key: &AdmissionKey) -> Option<AttemptId> {
        self.live.get(key).copied()
    }

    /// Registers a non-terminal attempt, pruning finished attempts for the
    /// same subject and kind.
    pub fn insert_live(&mut self, entry: Entry) {
        let key = admission_key(&entry.attempt);
        self.entries
            .retain(|_, existing| !(existing.attempt.is_terminal() && admission_key(&existing.attempt) == key));
        self.live.insert(key, entry.attempt.id());
        self.entries.insert(entry.attempt.id(), entry);
    }

    /// Re-admits an existing entry after its attempt was re-armed.
    pub fn mark_live(&mut self, id: AttemptId) {
        if let Some(entry) = self.entries.get(&id) {
            self.live.insert(admission_key(&entry.attempt), id);
        }
    }

    pub fn get(&self, id: AttemptId) -> Option<&Entry> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: AttemptId) -> Option<&mut Entry> {
        self.entries.get_mut(&id)
    }

    /// Releases what a finished attempt held: its lease and its admission slot.
    pub fn settle(&mut self, id: AttemptId) {
        let Some(entry) = self.entries.get_mut(&id) else {
            return;
        };
        entry.lease = None;
        let key = admission_key(&entry.attempt);
        if self.live.get(&key) == Some(&id) {
            self.live.remove(&key);
        }
    }

    pub fn remove(&mut self, id: AttemptId) -> Option<Entry> {
        self.settle(id);
        self.entries.remove(&id)
    }

    pub fn is_resuming(&self, provider_ref: &str) -> bool {
        self.resuming.contains(provider_ref)
    }

    pub fn start_resume(&mut self, provider_ref: &str) {
        self.resuming.insert(provider_ref.to_string());
    }

    pub fn finish_resume(&mut self, provider_ref: &str) {
        self.resuming.remove(provider_ref);
    }
}
