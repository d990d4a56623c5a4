//! Seed strategies handed to a `Mutator`.
//!
//! The seed mode is resolved once, when the gate is built, into a `SeedSource`
//! that the mutator owns. The per-fragment path only calls `next_seed`.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::SeedMode;

/// Where a mutator gets the seed for each mutation.
pub enum SeedSource {
    /// The same seed for every mutation.
    Fixed(u64),
    /// A fresh seed per mutation, produced by the closure.
    Generator(Box<dyn FnMut() -> u64 + Send>),
}

impl SeedSource {
    /// A generator returning the current Unix time in milliseconds.
    pub fn timestamp() -> Self {
        SeedSource::Generator(Box::new(unix_millis))
    }

    /// Seed for the next mutation.
    #[inline]
    pub fn next_seed(&mut self) -> u64 {
        match self {
            SeedSource::Fixed(seed) => *seed,
            SeedSource::Generator(generate) => generate(),
        }
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, SeedSource::Fixed(_))
    }
}

impl From<SeedMode> for SeedSource {
    fn from(mode: SeedMode) -> Self {
        match mode {
            SeedMode::Timestamp => SeedSource::timestamp(),
            SeedMode::Fixed(seed) => SeedSource::Fixed(seed),
        }
    }
}

impl Default for SeedSource {
    fn default() -> Self {
        SeedSource::timestamp()
    }
}

impl fmt::Debug for SeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedSource::Fixed(seed) => f.debug_tuple("Fixed").field(seed).finish(),
            SeedSource::Generator(_) => f.write_str("Generator(..)"),
        }
    }
}

// A clock set before 1970 yields 0 rather than failing the mutation.
fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
