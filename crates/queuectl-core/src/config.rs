//! Recognized configuration keys and their defaults.
//!
//! `queuectl` stores config as plain string key/value pairs; only these
//! three keys are read by the core. Unknown keys may still be stored by
//! the CLI (with an operator confirmation) but are never consulted here.

pub const CONFIG_MAX_RETRIES: &str = "max-retries";
pub const CONFIG_BACKOFF_BASE: &str = "backoff-base";
pub const CONFIG_BACKOFF_INITIAL_DELAY: &str = "backoff-initial-delay";

/// Default values used when a key is absent from the config table.
pub struct ConfigDefaults;

impl ConfigDefaults {
    pub const MAX_RETRIES: u32 = 3;
    pub const BACKOFF_BASE: u32 = 2;
    pub const BACKOFF_INITIAL_DELAY: u32 = 1;

    /// All known keys, used by the CLI to warn on unrecognized `config set`.
    pub const KNOWN_KEYS: [&'static str; 3] = [
        CONFIG_MAX_RETRIES,
        CONFIG_BACKOFF_BASE,
        CONFIG_BACKOFF_INITIAL_DELAY,
    ];
}
