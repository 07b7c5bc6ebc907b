//! Logging setup for binaries and tests
//!
//! The engine only logs through the `log` facade. These helpers install
//! `env_logger` for callers that have no logger of their own.

pub use log::{debug, error, info, trace, warn, LevelFilter};

/// Install `env_logger` with `level` as the default filter
///
/// Module directives from `RUST_LOG` still apply. Returns `false` if a
/// logger was already installed.
pub fn init_with_level(level: LevelFilter) -> bool {
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .try_init()
        .is_ok()
}

/// Initialize logging for tests; safe to call more than once
pub fn try_init_for_tests() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_refused() {
        try_init_for_tests();
        assert!(!init_with_level(LevelFilter::Trace));
    }
}
