//! A gate shared by several connections.
//!
//! Fragments from every holder are serialized through one lock, so the leading
//! input exemption counts them in the order they reach the gate.

use std::borrow::Cow;
use std::sync::{Arc, Mutex};

use crate::gate::core::Gate;
use crate::mutator::Mutator;

#[derive(Debug)]
pub struct SharedGate<M: Mutator> {
    inner: Arc<Mutex<Gate<M>>>,
}

impl<M: Mutator> Clone for SharedGate<M> {
    fn clone(&self) -> Self {
        SharedGate { inner: Arc::clone(&self.inner) }
    }
}

impl<M: Mutator> SharedGate<M> {
    pub fn new(gate: Gate<M>) -> Self {
        SharedGate { inner: Arc::new(Mutex::new(gate)) }
    }

    /// Same contract as `Gate::decide`. A poisoned lock passes the fragment through.
    pub fn decide<'a>(&self, fragment: &'a [u8], label: &str) -> Cow<'a, [u8]> {
        match self.inner.lock() {
            Ok(mut gate) => gate.decide(fragment, label),
            Err(_) => {
                tracing::warn!(label, "mutation gate lock poisoned; sending fragment unmodified");
                Cow::Borrowed(fragment)
            }
        }
    }

    /// Fragments counted so far, or `None` if the lock is poisoned.
    pub fn fragments_seen(&self) -> Option<u64> {
        self.inner.lock().ok().map(|gate| gate.fragments_seen())
    }

    /// Runs `f` with exclusive access to the gate.
    pub fn with_gate<R>(&self, f: impl FnOnce(&mut Gate<M>) -> R) -> Option<R> {
        self.inner.lock().ok().map(|mut gate| f(&mut *gate))
    }
}
