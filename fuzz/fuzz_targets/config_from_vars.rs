#![no_main]

// Harness: arbitrary key/value overrides either build a policy or fail with a
// ConfigError; they never panic. Keys are forced into the namespace half the
// time so the value parsers actually run.

use libfuzzer_sys::fuzz_target;
use fuzz_gate::config::{GateConfig, ENV_PREFIX};

fuzz_target!(|vars: Vec<(bool, String, String)>| {
    let vars = vars.into_iter().map(|(prefixed, key, value)| {
        let key = if prefixed { format!("{ENV_PREFIX}{key}") } else { key };
        (key, value)
    });
    if let Ok(config) = GateConfig::from_vars(vars) {
        // Whatever parsed must survive the JSON policy format.
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(GateConfig::from_json_str(&json).ok(), Some(config));
    }
});

