pub mod core;
pub mod shared;

#[cfg(test)]
mod tests;

pub use self::core::{Gate, IO_TARGET};
pub use self::shared::SharedGate;
