//! Per-method gates that park a mock call until the test releases it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::Notify;

#[derive(Default)]
struct Gate {
    entered: Notify,
    released: Notify,
}

/// Set of named gates shared by a mock and its clones.
#[derive(Clone, Default)]
pub struct Gates {
    gates: Arc<Mutex<HashMap<String, Arc<Gate>>>>,
}

impl Gates {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next call to `method` parks until [`Gates::release`].
    pub fn hold(&self, method: &str) {
        self.guard()
            .insert(method.to_string(), Arc::new(Gate::default()));
    }

    /// Lets the parked (or next) call to `method` through and removes the gate.
    pub fn release(&self, method: &str) {
        if let Some(gate) = self.guard().remove(method) {
            gate.released.notify_one();
        }
    }

    /// Resolves once a call to `method` has reached its gate.
    pub async fn entered(&self, method: &str) {
        let gate = self.guard().get(method).cloned();
        if let Some(gate) = gate {
            gate.entered.notified().await;
        }
    }

    /// Called by the mock at the start of `method`.
    pub(crate) async fn pass(&self, method: &str) {
        let gate = self.guard().get(method).cloned();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.released.notified().await;
        }
    }

    fn guard(&self) -> MutexGuard<'_, HashMap<String, Arc<Gate>>> {
        self.gates.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
