//! Stub mutators for exercising the gate without an external engine.

use crate::error::MutationError;
use crate::mutator::Mutator;
use crate::seed::SeedSource;

/// Bytes returned by `SentinelMutator`.
pub const SENTINEL: &[u8] = b"<<mutated>>";

/// Replaces every fragment with `SENTINEL` and records what it was given.
#[derive(Debug, Default)]
pub struct SentinelMutator {
    pub inputs: Vec<Vec<u8>>,
    pub seeded: bool,
}

impl SentinelMutator {
    pub fn calls(&self) -> usize {
        self.inputs.len()
    }
}

impl Mutator for SentinelMutator {
    fn set_seed(&mut self, _seed: SeedSource) {
        self.seeded = true;
    }

    fn mutate(&mut self, input: &[u8]) -> Result<Vec<u8>, MutationError> {
        self.inputs.push(input.to_vec());
        Ok(SENTINEL.to_vec())
    }
}

/// Deterministic in its seed: prefixes the fragment with the seed's
/// little-endian bytes and xors the fragment with the low seed byte.
#[derive(Debug, Default)]
pub struct SeedEchoMutator {
    seed: Option<SeedSource>,
    pub seeds: Vec<u64>,
}

impl Mutator for SeedEchoMutator {
    fn set_seed(&mut self, seed: SeedSource) {
        self.seed = Some(seed);
    }

    fn mutate(&mut self, input: &[u8]) -> Result<Vec<u8>, MutationError> {
        let seed = self
            .seed
            .as_mut()
            .ok_or_else(|| MutationError::Other("mutator was never seeded".into()))?
            .next_seed();
        self.seeds.push(seed);
        let mut out = seed.to_le_bytes().to_vec();
        out.extend(input.iter().map(|b| b ^ seed as u8));
        Ok(out)
    }
}

/// Always fails with `MutationError::Other`.
#[derive(Debug, Default)]
pub struct FailingMutator {
    pub attempts: usize,
}

impl Mutator for FailingMutator {
    fn set_seed(&mut self, _seed: SeedSource) {}

    fn mutate(&mut self, _input: &[u8]) -> Result<Vec<u8>, MutationError> {
        self.attempts += 1;
        Err(MutationError::Other("engine unavailable".into()))
    }
}

/// Panics on every mutation.
#[derive(Debug, Default)]
pub struct PanickingMutator;

impl Mutator for PanickingMutator {
    fn set_seed(&mut self, _seed: SeedSource) {}

    fn mutate(&mut self, _input: &[u8]) -> Result<Vec<u8>, MutationError> {
        panic!("mutation engine crashed")
    }
}
