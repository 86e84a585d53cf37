//! Utility functions and helpers
//!
//! Logging setup and formatting helpers used throughout the crate.

use log::info;

use crate::WEI_PER_ETH;

/// Initialise the `env_logger` backend for the `log` facade
///
/// `RUST_LOG` overrides `level`. Calling it again is a no-op, so tests can call it freely.
pub fn init_logging(level: &str) {
    let env = env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, level);

    if env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init()
        .is_ok()
    {
        info!("Logging initialised at level {}", level);
    }
}

/// Format a wei amount as ether with up to 18 decimals, trailing zeros trimmed
pub fn format_wei(amount: u128) -> String {
    let whole = amount / WEI_PER_ETH;
    let fraction = amount % WEI_PER_ETH;

    if fraction == 0 {
        return format!("{} ETH", whole);
    }

    let digits = format!("{:018}", fraction);
    format!("{}.{} ETH", whole, digits.trim_end_matches('0'))
}
