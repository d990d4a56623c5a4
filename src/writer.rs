//! Stream adapter that routes encoder fragments through a gate.
//!
//! The encoder calls `write_fragment` with each labeled piece of a packet.
//! Whatever the gate returns is what reaches the sink.

use std::io::{self, Write};

use crate::gate::Gate;
use crate::mutator::Mutator;

#[derive(Debug)]
pub struct GatedWriter<W: Write, M: Mutator> {
    sink: W,
    gate: Gate<M>,
}

impl<W: Write, M: Mutator> GatedWriter<W, M> {
    pub fn new(sink: W, gate: Gate<M>) -> Self {
        GatedWriter { sink, gate }
    }

    /// Writes `fragment`, or its mutated replacement, to the sink.
    ///
    /// Returns the number of bytes actually written, which differs from
    /// `fragment.len()` when the fragment was mutated.
    pub fn write_fragment(&mut self, fragment: &[u8], label: &str) -> io::Result<usize> {
        let out = self.gate.decide(fragment, label);
        self.sink.write_all(&out)?;
        Ok(out.len())
    }

    /// Writes bytes the encoder does not label, bypassing the gate.
    pub fn write_raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.sink.write_all(bytes)
    }

    pub fn gate(&self) -> &Gate<M> {
        &self.gate
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    pub fn into_inner(self) -> (W, Gate<M>) {
        (self.sink, self.gate)
    }
}

impl<W: Write, M: Mutator> Write for GatedWriter<W, M> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.sink.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}
