#![cfg(test)]

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::thread;

use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

use crate::config::{GateConfig, SeedMode};
use crate::error::MutationError;
use crate::gate::core::contains;
use crate::gate::{Gate, SharedGate, IO_TARGET};
use crate::testing::{FailingMutator, PanickingMutator, SeedEchoMutator, SentinelMutator, SENTINEL};
use crate::types::{labels, Category, Decision, MutateTrigger, PassReason};

// --- Test Utilities ---

fn enabled_config() -> GateConfig {
    GateConfig { enabled: true, ..GateConfig::default() }
}

fn only(category: Category) -> GateConfig {
    GateConfig {
        enabled: true,
        fuzz_flags: category == Category::Flags,
        fuzz_headers: category == Category::Headers,
        fuzz_lengths: false,
        fuzz_numbers: category == Category::Numbers,
        fuzz_protocol_version: category == Category::ProtocolVersion,
        fuzz_strings: category == Category::Strings,
        ..GateConfig::default()
    }
}

fn sentinel_gate(config: GateConfig) -> Gate<SentinelMutator> {
    Gate::new(config, SentinelMutator::default())
}

const ALL_LABELS: [&str; 7] = [
    labels::GENERIC_NUMBER,
    labels::GENERIC_STRING,
    labels::PROTOCOL_VERSION,
    "connect_header",
    "subscribe_flags",
    "connect_length",
    "",
];

// --- Master switch ---

#[test]
fn test_disabled_gate_passes_everything() {
    let mut gate = sentinel_gate(GateConfig::default());
    for label in ALL_LABELS {
        let out = gate.decide(b"\x10\x0c", label);
        assert!(matches!(out, Cow::Borrowed(b"\x10\x0c")));
    }
    assert_eq!(gate.mutator().calls(), 0);
}

#[test]
fn test_disabled_gate_does_not_count() {
    let mut gate = sentinel_gate(GateConfig { skip_first_inputs: 2, ..GateConfig::default() });
    for _ in 0..5 {
        assert_eq!(gate.evaluate(b"x", labels::GENERIC_NUMBER), Decision::PassThrough(PassReason::Disabled));
    }
    assert_eq!(gate.fragments_seen(), 0);
}

// --- Leading input exemption ---

#[test]
fn test_skip_first_inputs_exempts_prefix() {
    let mut gate = sentinel_gate(GateConfig { skip_first_inputs: 3, ..enabled_config() });
    for _ in 0..3 {
        assert_eq!(gate.decide(b"\x30", "publish_header").as_ref(), b"\x30");
    }
    assert_eq!(gate.decide(b"\x30", "publish_header").as_ref(), SENTINEL);
    assert_eq!(gate.fragments_seen(), 4);
    assert_eq!(gate.mutator().calls(), 1);
}

#[test]
fn test_skip_first_inputs_counts_unclassified_fragments() {
    let mut gate = sentinel_gate(GateConfig { skip_first_inputs: 2, ..enabled_config() });
    assert_eq!(gate.evaluate(b"a", "unknown"), Decision::PassThrough(PassReason::LeadingInput));
    assert_eq!(gate.evaluate(b"b", "unknown"), Decision::PassThrough(PassReason::LeadingInput));
    assert_eq!(gate.evaluate(b"c", "unknown"), Decision::PassThrough(PassReason::Unclassified));
    assert_eq!(
        gate.evaluate(b"d", labels::GENERIC_STRING),
        Decision::Mutate(MutateTrigger::Category(Category::Strings))
    );
}

#[test]
fn test_leading_exemption_beats_skip_marker() {
    let config = GateConfig {
        skip_first_inputs: 1,
        skip_containing: Some("keep".into()),
        ..enabled_config()
    };
    let mut gate = sentinel_gate(config);
    assert_eq!(gate.evaluate(b"other", "x"), Decision::PassThrough(PassReason::LeadingInput));
    assert_eq!(gate.evaluate(b"other", "x"), Decision::Mutate(MutateTrigger::SkipMarkerAbsent));
}

// --- Skip marker ---

#[test]
fn test_skip_marker_present_passes_even_for_enabled_category() {
    let mut gate = sentinel_gate(GateConfig {
        skip_containing: Some("$SYS".into()),
        ..enabled_config()
    });
    let out = gate.decide(b"$SYS/broker/uptime", labels::GENERIC_STRING);
    assert_eq!(out.as_ref(), b"$SYS/broker/uptime");
    assert_eq!(gate.mutator().calls(), 0);
}

#[test]
fn test_skip_marker_absent_mutates_regardless_of_label() {
    // Every category off: with a marker configured the label is never consulted.
    let config = GateConfig {
        fuzz_flags: false,
        fuzz_headers: false,
        fuzz_numbers: false,
        fuzz_protocol_version: false,
        fuzz_strings: false,
        skip_containing: Some("$SYS".into()),
        ..enabled_config()
    };
    let mut gate = sentinel_gate(config);
    assert_eq!(gate.decide(b"sensors/temp", "not_a_label").as_ref(), SENTINEL);
    assert_eq!(gate.decide(b"sensors/temp", labels::GENERIC_STRING).as_ref(), SENTINEL);
}

#[test]
fn test_skip_marker_is_binary_safe() {
    let mut gate = sentinel_gate(GateConfig {
        skip_containing: Some("\u{0}\u{1}".into()),
        ..enabled_config()
    });
    assert_eq!(
        gate.evaluate(&[0xff, 0x00, 0x01, 0xfe], labels::GENERIC_NUMBER),
        Decision::PassThrough(PassReason::ContainsSkipMarker)
    );
    assert_eq!(
        gate.evaluate(&[0xff, 0x00, 0x02, 0x01], labels::GENERIC_NUMBER),
        Decision::Mutate(MutateTrigger::SkipMarkerAbsent)
    );
}

#[test]
fn test_empty_skip_marker_is_ignored() {
    let mut gate = sentinel_gate(GateConfig {
        skip_containing: Some(String::new()),
        fuzz_numbers: false,
        ..enabled_config()
    });
    assert_eq!(
        gate.evaluate(b"42", labels::GENERIC_NUMBER),
        Decision::PassThrough(PassReason::CategoryDisabled)
    );
}

// --- Categories ---

#[test]
fn test_each_category_only_mutates_its_labels() {
    let cases = [
        (Category::Numbers, labels::GENERIC_NUMBER),
        (Category::Strings, labels::GENERIC_STRING),
        (Category::Headers, "pubrel_header"),
        (Category::Flags, "connect_flags"),
        (Category::ProtocolVersion, labels::PROTOCOL_VERSION),
    ];
    for (category, matching) in cases {
        let mut gate = sentinel_gate(only(category));
        assert_eq!(
            gate.evaluate(b"v", matching),
            Decision::Mutate(MutateTrigger::Category(category)),
            "{category:?} / {matching}"
        );
        for (other, label) in cases {
            if other != category {
                assert_eq!(
                    gate.evaluate(b"v", label),
                    Decision::PassThrough(PassReason::CategoryDisabled),
                    "{category:?} / {label}"
                );
            }
        }
        assert_eq!(gate.evaluate(b"v", "connect_length"), Decision::PassThrough(PassReason::Unclassified));
    }
}

#[test]
fn test_lengths_flag_has_no_rule() {
    let mut gate = sentinel_gate(GateConfig { fuzz_lengths: true, ..only(Category::Numbers) });
    assert_eq!(
        gate.evaluate(b"\x00\x10", "connect_length"),
        Decision::PassThrough(PassReason::Unclassified)
    );
}

#[test]
fn test_enabled_category_returns_engine_output() {
    let mut gate = sentinel_gate(enabled_config());
    let out = gate.decide(b"\x00\x0a", labels::GENERIC_NUMBER);
    assert!(matches!(out, Cow::Owned(_)));
    assert_eq!(out.as_ref(), SENTINEL);
    assert_eq!(gate.mutator().inputs, vec![b"\x00\x0a".to_vec()]);
}

// --- Seeding ---

#[test]
fn test_gate_installs_seed_once() {
    let gate = sentinel_gate(enabled_config());
    assert!(gate.mutator().seeded);
}

#[test]
fn test_fixed_seed_runs_are_identical() {
    let run = || {
        let mut gate = Gate::new(
            GateConfig { seed_mode: SeedMode::Fixed(42), ..enabled_config() },
            SeedEchoMutator::default(),
        );
        let outputs: Vec<Vec<u8>> = [
            (b"\x10".as_slice(), "connect_header"),
            (b"\x04".as_slice(), labels::PROTOCOL_VERSION),
            (b"client".as_slice(), labels::GENERIC_STRING),
        ]
        .into_iter()
        .map(|(frag, label)| gate.decide(frag, label).into_owned())
        .collect();
        assert_eq!(gate.mutator().seeds, vec![42, 42, 42]);
        outputs
    };
    assert_eq!(run(), run());
}

#[test]
fn test_timestamp_seed_is_drawn_per_mutation() {
    let mut gate = Gate::new(enabled_config(), SeedEchoMutator::default());
    gate.decide(b"a", labels::GENERIC_NUMBER);
    gate.decide(b"b", labels::GENERIC_NUMBER);
    let seeds = &gate.mutator().seeds;
    assert_eq!(seeds.len(), 2);
    // Wall-clock milliseconds: well past 2020-01-01 and non-decreasing.
    assert!(seeds[0] > 1_577_836_800_000);
    assert!(seeds[1] >= seeds[0]);
}

// --- Engine faults ---

#[test]
fn test_engine_error_fails_open() {
    let mut gate = Gate::new(enabled_config(), FailingMutator::default());
    let out = gate.decide(b"topic/a", labels::GENERIC_STRING);
    assert!(matches!(out, Cow::Borrowed(b"topic/a")));
    assert_eq!(gate.mutator().attempts, 1);
}

#[test]
fn test_engine_panic_fails_open() {
    let mut gate = Gate::new(enabled_config(), PanickingMutator);
    let out = gate.decide(b"\xe0", "disconnect_header");
    assert_eq!(out.as_ref(), b"\xe0");
    // The gate keeps working afterwards.
    assert_eq!(gate.decide(b"\xe0", "disconnect_header").as_ref(), b"\xe0");
    assert_eq!(gate.fragments_seen(), 2);
}

#[test]
fn test_mutate_guarded_reports_panic_message() {
    let mut gate = Gate::new(enabled_config(), PanickingMutator);
    let err = gate.mutate_guarded(b"x").unwrap_err();
    assert_eq!(err, MutationError::Panicked("mutation engine crashed".into()));
}

#[test]
fn test_show_io_does_not_change_output() {
    let mut quiet = sentinel_gate(enabled_config());
    let mut loud = sentinel_gate(GateConfig { show_io: true, ..enabled_config() });
    for label in ALL_LABELS {
        assert_eq!(quiet.decide(b"\x82", label), loud.decide(b"\x82", label));
    }
}

type Captured = Arc<Mutex<Vec<BTreeMap<String, String>>>>;

/// Records the fields of every event on the I/O echo target.
#[derive(Clone, Default)]
struct IoCapture(Captured);

struct FieldMap<'a>(&'a mut BTreeMap<String, String>);

impl Visit for FieldMap<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{value:?}"));
    }
}

impl<S: tracing::Subscriber> Layer<S> for IoCapture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        if event.metadata().target() != IO_TARGET {
            return;
        }
        let mut fields = BTreeMap::new();
        event.record(&mut FieldMap(&mut fields));
        self.0.lock().unwrap().push(fields);
    }
}

fn capture_io<R>(f: impl FnOnce() -> R) -> (R, Vec<BTreeMap<String, String>>) {
    let capture = IoCapture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    let out = tracing::subscriber::with_default(subscriber, f);
    let events = capture.0.lock().unwrap().clone();
    (out, events)
}

#[test]
fn test_show_io_echoes_hex_input_and_output() {
    let fragment = b"\x00\x04MQTT";
    let mut gate = sentinel_gate(GateConfig { show_io: true, ..enabled_config() });
    let (out, events) = capture_io(|| gate.decide(fragment, labels::GENERIC_STRING).into_owned());

    assert_eq!(out, SENTINEL);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["message"], "in");
    assert_eq!(events[0]["label"], labels::GENERIC_STRING);
    assert_eq!(events[0]["input"], hex::encode(fragment));
    assert_eq!(events[1]["message"], "out");
    assert_eq!(events[1]["output"], hex::encode(SENTINEL));
}

#[test]
fn test_show_io_silent_when_off_or_passing() {
    let mut quiet = sentinel_gate(enabled_config());
    let (_, events) = capture_io(|| quiet.decide(b"\x82", labels::GENERIC_NUMBER).into_owned());
    assert!(events.is_empty());

    let mut loud = sentinel_gate(GateConfig { show_io: true, fuzz_numbers: false, ..enabled_config() });
    let (out, events) = capture_io(|| loud.decide(b"\x82", labels::GENERIC_NUMBER).into_owned());
    assert_eq!(out, b"\x82");
    assert!(events.is_empty());
}

// --- Shared gate ---

#[test]
fn test_shared_gate_counts_across_threads() {
    let shared = SharedGate::new(sentinel_gate(GateConfig { skip_first_inputs: 10, ..enabled_config() }));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let gate = shared.clone();
            thread::spawn(move || {
                (0..25)
                    .filter(|_| gate.decide(b"n", labels::GENERIC_NUMBER).as_ref() == SENTINEL)
                    .count()
            })
        })
        .collect();
    let mutated: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(shared.fragments_seen(), Some(100));
    assert_eq!(mutated, 90);
    assert_eq!(shared.with_gate(|g| g.mutator().calls()), Some(90));
}

// --- Substring search ---

#[test]
fn test_contains() {
    assert!(contains(b"abcdef", b"cd"));
    assert!(contains(b"abc", b"abc"));
    assert!(!contains(b"ab", b"abc"));
    assert!(!contains(b"abc", b""));
    assert!(!contains(b"", b"a"));
}
