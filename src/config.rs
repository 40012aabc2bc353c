//! Runtime configuration, read from the environment.

use chrono::Duration;
use thiserror::Error;

/// Longest window an activation or top-up may grant: one week.
pub const MAX_WINDOW_MINS: i64 = 7 * 24 * 60;
/// Largest first display number.
pub const MAX_DISPLAY_BASE: u64 = 1_000_000_000;
/// Upper bound for actor mailboxes and the change broadcast.
pub const MAX_CHANNEL_CAPACITY: i64 = 1 << 20;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Application configuration.
///
/// Every field has a default matching the product rules: a paid activation
/// opens a 3 hour window, a top-up adds 1.5 hours, receipts count from #100.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Length of the window opened by an activation (env: STALL_BASE_WINDOW_MINS)
    pub base_window: Duration,
    /// Time added by a top-up (env: STALL_TOPUP_WINDOW_MINS)
    pub topup_window: Duration,
    /// Display number of a stall's first order (env: ORDER_DISPLAY_BASE)
    pub display_base: u64,
    /// Mailbox size of each store actor (env: ACTOR_BUFFER_SIZE)
    pub actor_buffer: usize,
    /// Capacity of the change broadcast (env: FEED_CHANNEL_CAPACITY)
    pub feed_capacity: usize,
    /// Reject illegal order status transitions (env: ORDER_STRICT_TRANSITIONS)
    pub strict_transitions: bool,
    /// Register the demo stalls on startup (env: SEED_DEMO_STALLS)
    pub seed_demo_stalls: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_window: Duration::minutes(180),
            topup_window: Duration::minutes(90),
            display_base: 100,
            actor_buffer: 100,
            feed_capacity: 1024,
            strict_transitions: false,
            seed_demo_stalls: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Missing or empty keys keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            base_window: match get("STALL_BASE_WINDOW_MINS") {
                Some(v) => parse_window("STALL_BASE_WINDOW_MINS", &v)?,
                None => defaults.base_window,
            },
            topup_window: match get("STALL_TOPUP_WINDOW_MINS") {
                Some(v) => parse_window("STALL_TOPUP_WINDOW_MINS", &v)?,
                None => defaults.topup_window,
            },
            display_base: match get("ORDER_DISPLAY_BASE") {
                Some(v) => match parse::<u64>("ORDER_DISPLAY_BASE", &v)? {
                    n if n <= MAX_DISPLAY_BASE => n,
                    _ => return Err(invalid("ORDER_DISPLAY_BASE", &v)),
                },
                None => defaults.display_base,
            },
            actor_buffer: match get("ACTOR_BUFFER_SIZE") {
                Some(v) => parse_bounded("ACTOR_BUFFER_SIZE", &v, MAX_CHANNEL_CAPACITY)? as usize,
                None => defaults.actor_buffer,
            },
            feed_capacity: match get("FEED_CHANNEL_CAPACITY") {
                Some(v) => parse_bounded("FEED_CHANNEL_CAPACITY", &v, MAX_CHANNEL_CAPACITY)? as usize,
                None => defaults.feed_capacity,
            },
            strict_transitions: match get("ORDER_STRICT_TRANSITIONS") {
                Some(v) => parse_flag("ORDER_STRICT_TRANSITIONS", &v)?,
                None => defaults.strict_transitions,
            },
            seed_demo_stalls: match get("SEED_DEMO_STALLS") {
                Some(v) => parse_flag("SEED_DEMO_STALLS", &v)?,
                None => defaults.seed_demo_stalls,
            },
        })
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| invalid(key, value))
}

fn invalid(key: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
    }
}

/// Integer in `1..=max`.
fn parse_bounded(key: &'static str, value: &str, max: i64) -> Result<i64, ConfigError> {
    match parse::<i64>(key, value)? {
        n if n > 0 && n <= max => Ok(n),
        _ => Err(invalid(key, value)),
    }
}

fn parse_window(key: &'static str, value: &str) -> Result<Duration, ConfigError> {
    let minutes = parse_bounded(key, value, MAX_WINDOW_MINS)?;
    Duration::try_minutes(minutes).ok_or_else(|| invalid(key, value))
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}
