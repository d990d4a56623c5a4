//!
//! The mutation gate: decides, fragment by fragment, whether the encoder's output
//! goes onto the wire as-is or through the mutation engine first.

use std::any::Any;
use std::borrow::Cow;
use std::panic::{self, AssertUnwindSafe};

use crate::config::GateConfig;
use crate::error::MutationError;
use crate::mutator::Mutator;
use crate::seed::SeedSource;
use crate::types::{Category, Decision, MutateTrigger, PassReason};

/// Diagnostic target for `show_io` echoes.
pub const IO_TARGET: &str = "fuzz_gate::io";

/// A mutation gate for one logical run (typically one connection).
///
/// The policy is fixed at construction; the only state that changes between
/// calls is the count of fragments seen, which is never reset.
#[derive(Debug)]
pub struct Gate<M: Mutator> {
    config: GateConfig,
    mutator: M,
    fragments_seen: u64,
}

impl<M: Mutator> Gate<M> {
    /// Creates a gate and installs the policy's seed strategy into `mutator`.
    pub fn new(config: GateConfig, mut mutator: M) -> Self {
        mutator.set_seed(SeedSource::from(config.seed_mode));
        tracing::debug!(
            enabled = config.enabled,
            seed_mode = ?config.seed_mode,
            skip_first_inputs = config.skip_first_inputs,
            skip_containing = ?config.skip_containing,
            categories = ?config.enabled_categories(),
            show_io = config.show_io,
            "mutation gate configured"
        );
        Gate { config, mutator, fragments_seen: 0 }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn mutator(&self) -> &M {
        &self.mutator
    }

    /// Fragments counted so far. Calls made while the gate is disabled are not counted.
    pub fn fragments_seen(&self) -> u64 {
        self.fragments_seen
    }

    /// Applies the policy to one fragment without mutating it.
    ///
    /// Rules, first match wins:
    /// 1. disabled gate: pass (not counted);
    /// 2. within the first `skip_first_inputs` counted fragments: pass;
    /// 3. `skip_containing` configured: pass if the fragment contains it,
    ///    otherwise mutate without looking at the label;
    /// 4. first enabled category in `Category::PRIORITY` matching the label: mutate;
    /// 5. otherwise pass.
    pub fn evaluate(&mut self, fragment: &[u8], label: &str) -> Decision {
        if !self.config.enabled {
            return Decision::PassThrough(PassReason::Disabled);
        }

        self.fragments_seen = self.fragments_seen.saturating_add(1);

        let skip_first = self.config.skip_first_inputs;
        if skip_first > 0 && self.fragments_seen <= skip_first {
            return Decision::PassThrough(PassReason::LeadingInput);
        }

        if let Some(marker) = self.config.skip_containing.as_deref().filter(|m| !m.is_empty()) {
            return if contains(fragment, marker.as_bytes()) {
                Decision::PassThrough(PassReason::ContainsSkipMarker)
            } else {
                Decision::Mutate(MutateTrigger::SkipMarkerAbsent)
            };
        }

        for category in Category::PRIORITY {
            if category.matches(label) && self.config.category_enabled(category) {
                return Decision::Mutate(MutateTrigger::Category(category));
            }
        }

        match Category::of(label) {
            Some(_) => Decision::PassThrough(PassReason::CategoryDisabled),
            None => Decision::PassThrough(PassReason::Unclassified),
        }
    }

    /// Returns `fragment` unchanged or the mutation engine's replacement for it.
    ///
    /// Never fails: if the engine errors or panics, the original fragment is returned.
    pub fn decide<'a>(&mut self, fragment: &'a [u8], label: &str) -> Cow<'a, [u8]> {
        let decision = self.evaluate(fragment, label);
        let trigger = match decision {
            Decision::PassThrough(reason) => {
                tracing::trace!(label, ?reason, seen = self.fragments_seen, "fragment passed through");
                return Cow::Borrowed(fragment);
            }
            Decision::Mutate(trigger) => trigger,
        };

        if self.config.show_io {
            tracing::info!(target: IO_TARGET, label, input = %hex::encode(fragment), "in");
        }

        match self.mutate_guarded(fragment) {
            Ok(mutated) => {
                if self.config.show_io {
                    tracing::info!(target: IO_TARGET, label, output = %hex::encode(&mutated), "out");
                }
                tracing::trace!(label, ?trigger, in_len = fragment.len(), out_len = mutated.len(), "fragment mutated");
                Cow::Owned(mutated)
            }
            Err(err) => {
                tracing::warn!(label, ?trigger, error = %err, "mutation failed; sending fragment unmodified");
                Cow::Borrowed(fragment)
            }
        }
    }

    pub(crate) fn mutate_guarded(&mut self, fragment: &[u8]) -> Result<Vec<u8>, MutationError> {
        let mutator = &mut self.mutator;
        panic::catch_unwind(AssertUnwindSafe(|| mutator.mutate(fragment)))
            .unwrap_or_else(|payload| Err(MutationError::Panicked(panic_message(payload.as_ref()))))
    }
}

/// Binary-safe substring search. An empty needle is never "contained".
pub(crate) fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty()
        && needle.len() <= haystack.len()
        && haystack.windows(needle.len()).any(|window| window == needle)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
