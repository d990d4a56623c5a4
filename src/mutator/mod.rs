//!
//! Mutation engine abstraction.
//!
//! The gate never mutates bytes itself. It hands fragments to a `Mutator`,
//! an external engine reached through this narrow contract, so the policy stays
//! independent of any particular fuzzer.

use crate::error::MutationError;
use crate::seed::SeedSource;

/// Contract of an external mutation engine.
pub trait Mutator {
    /// Installs the seed strategy used by subsequent `mutate` calls.
    ///
    /// Called once, when the gate is built.
    fn set_seed(&mut self, seed: SeedSource);

    /// Returns a mutated variant of `input`.
    fn mutate(&mut self, input: &[u8]) -> Result<Vec<u8>, MutationError>;
}

impl<M: Mutator + ?Sized> Mutator for Box<M> {
    fn set_seed(&mut self, seed: SeedSource) {
        (**self).set_seed(seed)
    }

    fn mutate(&mut self, input: &[u8]) -> Result<Vec<u8>, MutationError> {
        (**self).mutate(input)
    }
}

// Adapter for the Radamsa command-line fuzzer.
pub mod radamsa;

pub use radamsa::RadamsaMutator;
