//! Logging setup for the logotext binary.
//!
//! The library only talks to the `log` facade; this module wires up the
//! `env_logger` backend. Levels are chosen by (in priority order):
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. CLI flags: `--quiet` (errors only) or `-v` / `-vv` (debug / trace)
//! 3. Default: info for this crate, warnings for dependencies
//!
//! Dependencies (`reqwest`, `hyper`, `rustls`) stay at warn level unless
//! `RUST_LOG` says otherwise, so `-vv` traces extraction rather than TLS.
//!
//! ```rust,no_run
//! use logotext::logging::init_logging;
//!
//! init_logging(1, false);
//! log::debug!("Debug output enabled");
//! ```

use std::env;
use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

/// Initialize logging from CLI verbosity flags.
///
/// Calling it more than once is harmless: later calls are ignored.
///
/// # Arguments
///
/// * `verbose` - Verbosity count from CLI (0=info, 1=debug, 2+=trace)
/// * `quiet` - If true, only show errors (overridden by `RUST_LOG`)
pub fn init_logging(verbose: u8, quiet: bool) {
    let use_env = env::var("RUST_LOG").is_ok();
    let level = determine_level(verbose, quiet);

    let mut builder = Builder::new();
    if use_env {
        builder.parse_default_env();
    } else {
        builder
            .filter_level(dependency_level(level))
            .filter_module(env!("CARGO_CRATE_NAME"), level);
    }

    builder.format(move |buf, record| {
        let level_style = buf.default_level_style(record.level());
        if verbose >= 1 {
            writeln!(
                buf,
                "{} {level_style}{:<5}{level_style:#} [{}] {}",
                buf.timestamp_seconds(),
                record.level(),
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        } else {
            writeln!(
                buf,
                "{level_style}{:<5}{level_style:#} {}",
                record.level(),
                record.args()
            )
        }
    });

    if builder.try_init().is_err() {
        return;
    }

    if use_env {
        log::debug!("Logging initialized from RUST_LOG: {:?}", env::var("RUST_LOG").ok());
    } else {
        log::debug!("Logging initialized at level: {:?}", level);
    }
}

/// Level for this crate's own messages.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Level for every other crate: never noisier than warn.
fn dependency_level(own: LevelFilter) -> LevelFilter {
    own.min(LevelFilter::Warn)
}
