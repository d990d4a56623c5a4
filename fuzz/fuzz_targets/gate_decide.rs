#![no_main]

// Harness: any policy, any sequence of labeled fragments.
// `decide` must never panic, a disabled gate must be the identity, and the
// leading exemption must hold for the first `skip_first_inputs` fragments.

use libfuzzer_sys::fuzz_target;
use arbitrary::Arbitrary;
use fuzz_gate::config::{GateConfig, SeedMode};
use fuzz_gate::gate::Gate;
use fuzz_gate::testing::SeedEchoMutator;

#[derive(Arbitrary, Debug)]
struct FuzzPolicy {
    enabled: bool,
    flags: [bool; 6],
    seed: Option<u64>,
    skip_containing: Option<String>,
    skip_first_inputs: u8,
}

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    policy: FuzzPolicy,
    fragments: Vec<(Vec<u8>, String)>,
}

fuzz_target!(|input: FuzzInput| {
    let p = input.policy;
    let config = GateConfig {
        enabled: p.enabled,
        fuzz_flags: p.flags[0],
        fuzz_headers: p.flags[1],
        fuzz_lengths: p.flags[2],
        fuzz_numbers: p.flags[3],
        fuzz_protocol_version: p.flags[4],
        fuzz_strings: p.flags[5],
        // Timestamp seeds would make crashes irreproducible.
        seed_mode: SeedMode::Fixed(p.seed.unwrap_or(0)),
        show_io: false,
        skip_containing: p.skip_containing,
        skip_first_inputs: u64::from(p.skip_first_inputs),
    };
    let enabled = config.enabled;
    let skip = config.skip_first_inputs;
    let mut gate = Gate::new(config, SeedEchoMutator::default());

    for (i, (fragment, label)) in input.fragments.iter().enumerate() {
        let out = gate.decide(fragment, label);
        if !enabled || (i as u64) < skip {
            assert_eq!(out.as_ref(), fragment.as_slice());
        }
    }
});
