// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `tracing` output for tools and tests running flicker.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding the log filter directives.
pub const ENV_VAR: &str = "FLICKER_LOG";

/// The filter from [`ENV_VAR`], or `fallback` when it is unset or invalid.
#[must_use]
pub fn filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_env(ENV_VAR).unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Installs a global subscriber printing to stderr.
///
/// Returns `false` if a global subscriber was already set, which leaves
/// that one in place.
///
/// ```
/// flicker_debug::log::install("flicker_service=info");
/// assert!(!flicker_debug::log::install("debug"));
/// ```
pub fn install(fallback: &str) -> bool {
    tracing_subscriber::registry()
        .with(filter(fallback))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .is_ok()
}

/// Like [`install`], but captured by the test harness.
pub fn install_for_tests(fallback: &str) -> bool {
    tracing_subscriber::registry()
        .with(filter(fallback))
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installing_twice_keeps_the_first() {
        install_for_tests("flicker_service=debug");
        assert!(!install_for_tests("trace"), "second install is refused");
    }
}
