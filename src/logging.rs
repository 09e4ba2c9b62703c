//! Tracing subscriber setup for hosts that do not install their own.

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::{Directive, LevelFilter};

/// Maps verbosity flags to the level of the `vitals` target.
pub fn level_for(verbose: u8, quiet: bool) -> Level {
    if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

/// Installs a `fmt` subscriber filtered by `RUST_LOG` plus a `vitals=<level>`
/// directive. Does nothing if a global subscriber is already set.
pub fn init_logging(verbose: u8, quiet: bool) {
    let level = level_for(verbose, quiet);
    let filter = EnvFilter::from_default_env().add_directive(level_directive(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn level_directive(level: Level) -> Directive {
    format!("vitals={}", level)
        .parse()
        .unwrap_or_else(|_| LevelFilter::from_level(level).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for() {
        assert_eq!(level_for(0, false), Level::INFO);
        assert_eq!(level_for(1, false), Level::DEBUG);
        assert_eq!(level_for(5, false), Level::TRACE);
        assert_eq!(level_for(2, true), Level::ERROR);
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init_logging(1, false);
        init_logging(0, true);
    }

    #[test]
    fn test_level_directive() {
        assert_eq!(level_directive(Level::DEBUG).to_string(), "vitals=debug");
    }
}
