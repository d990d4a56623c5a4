//! `Mutator` backed by an external `radamsa` process.
//!
//! Every mutation spawns the engine once: the fragment goes in on stdin, the
//! mutated bytes come back on stdout, and the seed is passed as `--seed <n>`.

use std::ffi::OsString;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use crate::error::MutationError;
use crate::mutator::Mutator;
use crate::seed::SeedSource;

/// Program looked up on `PATH` when none is given.
pub const DEFAULT_PROGRAM: &str = "radamsa";

#[derive(Debug)]
pub struct RadamsaMutator {
    program: PathBuf,
    args: Vec<OsString>,
    seed: SeedSource,
}

impl Default for RadamsaMutator {
    fn default() -> Self {
        Self::with_program(DEFAULT_PROGRAM)
    }
}

impl RadamsaMutator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `program` instead of `radamsa` from `PATH`.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        RadamsaMutator {
            program: program.into(),
            args: Vec::new(),
            // Until a gate installs its own strategy.
            seed: SeedSource::timestamp(),
        }
    }

    /// Appends an argument passed before `--seed`.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Mutator for RadamsaMutator {
    fn set_seed(&mut self, seed: SeedSource) {
        self.seed = seed;
    }

    fn mutate(&mut self, input: &[u8]) -> Result<Vec<u8>, MutationError> {
        let seed = self.seed.next_seed();

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg("--seed")
            .arg(seed.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| MutationError::Spawn {
                program: self.program.display().to_string(),
                reason: e.to_string(),
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| MutationError::Io("engine stdin was not captured".into()))?;
        let fragment = input.to_vec();
        // Feed stdin from another thread so a full stdout pipe cannot deadlock us.
        let feeder = thread::spawn(move || stdin.write_all(&fragment));

        let output = child
            .wait_with_output()
            .map_err(|e| MutationError::Io(e.to_string()))?;

        match feeder.join() {
            Ok(Ok(())) => {}
            // The engine may exit without draining its input.
            Ok(Err(e)) if e.kind() == ErrorKind::BrokenPipe => {}
            Ok(Err(e)) => return Err(MutationError::Io(e.to_string())),
            Err(_) => return Err(MutationError::Io("stdin feeder thread panicked".into())),
        }

        if !output.status.success() {
            return Err(MutationError::Exit {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        tracing::trace!(
            program = %self.program.display(),
            seed,
            in_len = input.len(),
            out_len = output.stdout.len(),
            "radamsa mutation complete"
        );
        Ok(output.stdout)
    }
}
