//! # Telemetry
//!
//! Subscriber setup for binaries and tests. The library itself only emits
//! `tracing` events; nothing is printed unless a subscriber is installed.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid
pub const DEFAULT_DIRECTIVE: &str = "routeforge=info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Install the global subscriber, JSON formatted when `json` is set.
///
/// Returns `false` if a subscriber was already installed.
pub fn init_tracing(json: bool) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_rejected() {
        init_tracing(false);
        assert!(!init_tracing(true));
    }
}
