#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(deprecated)]

//!
//! Fuzz-Gate is a selective mutation gate for protocol fuzzing.
//!
//! A protocol encoder hands every fragment it is about to send (headers,
//! flags, numbers, strings, the protocol version) to a `Gate` together with a
//! label naming the fragment's role. Based on a `GateConfig` fixed at startup
//! the gate either returns the fragment unchanged or returns what an external
//! mutation engine (see `mutator`) made of it.

// Label vocabulary and decision types.
pub mod types;

// Policy configuration (environment and JSON).
pub mod config;

// Seed strategies for the mutation engine.
pub mod seed;

// Mutation engine abstraction and the Radamsa adapter.
pub mod mutator;

// Error types.
pub mod error;

// The gate itself.
pub mod gate;

// `std::io::Write` adapter over a gate.
pub mod writer;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use config::{GateConfig, SeedMode};
pub use error::{ConfigError, MutationError};
pub use gate::{Gate, SharedGate};
pub use mutator::{Mutator, RadamsaMutator};
pub use seed::SeedSource;
pub use types::{labels, Category, Decision, MutateTrigger, PassReason};
pub use writer::GatedWriter;
