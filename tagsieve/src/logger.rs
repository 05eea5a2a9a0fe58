// tagsieve/src/logger.rs
//! Logger setup for the CLI. The library only talks to the `log` facade;
//! this is the one place a backend is installed.

use env_logger::{Builder, Env, Target};
use log::LevelFilter;

/// Installs `env_logger` writing to stderr.
///
/// `RUST_LOG` sets the baseline (default `warn`). `level`, when given,
/// overrides it for the tagsieve crates.
pub fn init_logger(level: Option<LevelFilter>) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("warn"));
    if let Some(level) = level {
        builder
            .filter_module("tagsieve", level)
            .filter_module("tagsieve_core", level);
    }
    builder.format_timestamp(None).target(Target::Stderr);

    // A second call (e.g. from tests) keeps the first logger.
    if builder.try_init().is_err() {
        log::debug!("Logger already initialized.");
    }
}

/// Resolves the three logging flags into an override level.
pub fn level_for_flags(quiet: bool, debug: bool, disable_debug: bool) -> Option<LevelFilter> {
    if quiet {
        Some(LevelFilter::Off)
    } else if disable_debug {
        Some(LevelFilter::Info)
    } else if debug {
        Some(LevelFilter::Debug)
    } else {
        None
    }
}
