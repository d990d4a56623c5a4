//! Pipes labeled fragments through a mutation gate.
//!
//! Each stdin line is `<label>\t<fragment>`; the gated fragment is written to
//! stdout followed by a newline. Lines without a tab are copied unchanged.
//! The policy comes from `--policy` (JSON) overlaid with `MQTT_FUZZ_*` variables.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use fuzz_gate::{Gate, GateConfig, GatedWriter, RadamsaMutator};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(about = "Selectively mutate labeled protocol fragments")]
struct Args {
    /// JSON policy file applied before environment overrides.
    #[arg(long)]
    policy: Option<PathBuf>,
    /// Radamsa executable.
    #[arg(long, default_value = "radamsa")]
    radamsa: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let base = match &args.policy {
        Some(path) => GateConfig::from_json_file(path)
            .with_context(|| format!("loading policy {}", path.display()))?,
        None => GateConfig::default(),
    };
    let config = base.with_env_overrides().context("reading MQTT_FUZZ_* overrides")?;

    let gate = Gate::new(config, RadamsaMutator::with_program(args.radamsa));
    let stdout = io::stdout();
    let mut out = GatedWriter::new(stdout.lock(), gate);

    for line in io::stdin().lock().split(b'\n') {
        let line = line.context("reading stdin")?;
        match line.iter().position(|&b| b == b'\t') {
            Some(tab) => {
                let label = String::from_utf8_lossy(&line[..tab]);
                out.write_fragment(&line[tab + 1..], &label)?;
            }
            None => out.write_raw(&line)?,
        }
        out.write_raw(b"\n")?;
    }
    out.flush()?;

    tracing::info!(fragments = out.gate().fragments_seen(), "done");
    Ok(())
}
