//!
//! Policy configuration for the mutation gate.
//!
//! A `GateConfig` is built once at startup, from built-in defaults, an optional
//! JSON policy document and `MQTT_FUZZ_*` overrides (applied in that order), and
//! is never mutated afterwards. Malformed numeric values are rejected here so the
//! gate never runs with an ambiguous policy.

use std::ffi::OsString;
use std::path::Path;

use crate::error::ConfigError;
use crate::types::Category;

/// Namespace shared by every recognized override key.
pub const ENV_PREFIX: &str = "MQTT_FUZZ_";

/// Override keys, without the namespace prefix.
pub mod keys {
    pub const ENABLE: &str = "ENABLE";
    pub const FLAGS: &str = "FLAGS";
    pub const HEADERS: &str = "HEADERS";
    pub const LENGTHS: &str = "LENGTHS";
    pub const NUMBERS: &str = "NUMBERS";
    pub const PROTOCOL_VERSION: &str = "PROTOCOL_VERSION";
    pub const SEED: &str = "SEED";
    pub const SHOW_IO: &str = "SHOW_IO";
    pub const SKIP_CONTAINING: &str = "SKIP_CONTAINING";
    pub const SKIP_FIRST_INPUTS: &str = "SKIP_FIRST_INPUTS";
    pub const STRINGS: &str = "STRINGS";
}

const SEED_TIMESTAMP: &str = "timestamp";

/// How the mutation engine's randomness is seeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedMode {
    /// A fresh seed (wall-clock milliseconds) is drawn for every mutation.
    #[default]
    Timestamp,
    /// One seed for the whole run, making it reproducible.
    Fixed(u64),
}

/// The immutable mutation policy.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GateConfig {
    /// Master switch. When off the gate is a pass-through.
    pub enabled: bool,
    pub fuzz_flags: bool,
    pub fuzz_headers: bool,
    /// Carried for completeness; no decision rule consults it.
    pub fuzz_lengths: bool,
    pub fuzz_numbers: bool,
    pub fuzz_protocol_version: bool,
    pub fuzz_strings: bool,
    pub seed_mode: SeedMode,
    /// Echo every mutated fragment before and after mutation.
    pub show_io: bool,
    /// Fragments containing this byte string are never mutated.
    pub skip_containing: Option<String>,
    /// Number of leading fragments exempt from mutation.
    pub skip_first_inputs: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        GateConfig {
            enabled: false,
            fuzz_flags: true,
            fuzz_headers: true,
            fuzz_lengths: true,
            fuzz_numbers: true,
            fuzz_protocol_version: true,
            fuzz_strings: true,
            seed_mode: SeedMode::Timestamp,
            show_io: false,
            skip_containing: None,
            skip_first_inputs: 0,
        }
    }
}

impl GateConfig {
    /// Builds a policy from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        GateConfig::default().with_env_overrides()
    }

    /// Layers the process's `MQTT_FUZZ_*` variables over this policy.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_os_overrides(std::env::vars_os())
    }

    /// Layers `MQTT_FUZZ_*` entries of an OS-string mapping over this policy.
    ///
    /// Names that are not valid Unicode cannot be recognized keys and are
    /// skipped. A non-Unicode value under the namespace is a `ConfigError`.
    pub fn with_os_overrides<I>(self, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let mut namespaced = Vec::new();
        for (key, value) in vars {
            let Some(key) = key.to_str().filter(|k| k.starts_with(ENV_PREFIX)) else {
                continue;
            };
            let value = value.into_string().map_err(|raw| ConfigError::NonUnicode {
                key: key.to_string(),
                value: raw.to_string_lossy().into_owned(),
            })?;
            namespaced.push((key.to_string(), value));
        }
        self.with_overrides(namespaced)
    }

    /// Builds a policy from defaults plus `MQTT_FUZZ_*` entries of `vars`.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self::from_prefixed_vars(ENV_PREFIX, vars)
    }

    /// Like `from_vars`, with a caller-chosen namespace prefix.
    pub fn from_prefixed_vars<I, K, V>(prefix: &str, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        GateConfig::default().apply_overrides(prefix, vars)
    }

    /// Layers `MQTT_FUZZ_*` entries of `vars` over this policy.
    pub fn with_overrides<I, K, V>(self, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.apply_overrides(ENV_PREFIX, vars)
    }

    /// Parses a JSON policy document. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a JSON policy document from `path`.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json_str(&data)
    }

    /// Whether the flag for `category` is on.
    pub fn category_enabled(&self, category: Category) -> bool {
        match category {
            Category::Numbers => self.fuzz_numbers,
            Category::Strings => self.fuzz_strings,
            Category::Headers => self.fuzz_headers,
            Category::Flags => self.fuzz_flags,
            Category::ProtocolVersion => self.fuzz_protocol_version,
        }
    }

    /// Enabled categories in evaluation order.
    pub fn enabled_categories(&self) -> Vec<Category> {
        Category::PRIORITY
            .into_iter()
            .filter(|c| self.category_enabled(*c))
            .collect()
    }

    fn apply_overrides<I, K, V>(mut self, prefix: &str, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let full_key = key.as_ref();
            let Some(name) = full_key.strip_prefix(prefix) else {
                continue;
            };
            let value = value.as_ref();
            match name {
                keys::ENABLE => self.enabled = parse_bool(value),
                keys::FLAGS => self.fuzz_flags = parse_bool(value),
                keys::HEADERS => self.fuzz_headers = parse_bool(value),
                keys::LENGTHS => self.fuzz_lengths = parse_bool(value),
                keys::NUMBERS => self.fuzz_numbers = parse_bool(value),
                keys::PROTOCOL_VERSION => self.fuzz_protocol_version = parse_bool(value),
                keys::STRINGS => self.fuzz_strings = parse_bool(value),
                keys::SHOW_IO => self.show_io = parse_bool(value),
                keys::SEED => self.seed_mode = parse_seed(full_key, value)?,
                keys::SKIP_FIRST_INPUTS => self.skip_first_inputs = parse_count(full_key, value)?,
                keys::SKIP_CONTAINING => {
                    self.skip_containing = (!value.is_empty()).then(|| value.to_string());
                }
                _ => {
                    tracing::debug!(key = full_key, "ignoring unrecognized fuzz option");
                }
            }
        }
        Ok(self)
    }
}

/// `1` and `true` enable an option; any other value disables it.
fn parse_bool(value: &str) -> bool {
    value == "1" || value == "true"
}

fn parse_count(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidInteger {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_seed(key: &str, value: &str) -> Result<SeedMode, ConfigError> {
    let trimmed = value.trim();
    if trimmed == SEED_TIMESTAMP {
        return Ok(SeedMode::Timestamp);
    }
    trimmed
        .parse::<u64>()
        .map(SeedMode::Fixed)
        .map_err(|_| ConfigError::InvalidSeed {
            key: key.to_string(),
            value: value.to_string(),
        })
}
