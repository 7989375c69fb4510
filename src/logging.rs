//! `log` facade wired to an `env_logger` backend.
//!
//! `RUST_LOG` wins when set; otherwise `--quiet` selects error level and each
//! `-v` raises the level one step from info.

use env_logger::Builder;
use log::LevelFilter;
use std::env;
use std::io::Write;

/// Call once, before any logging. Later calls are ignored.
pub fn init_logging(verbose: u8, quiet: bool) {
    let mut builder = Builder::new();

    if env::var_os("RUST_LOG").is_some() {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose, quiet));
    }

    builder.format(move |buf, record| {
        let level = record.level();
        let level_style = buf.default_level_style(level);
        if verbose >= 1 {
            writeln!(
                buf,
                "{} {level_style}{:<5}{level_style:#} [{}] {}",
                buf.timestamp_seconds(),
                level,
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        } else {
            writeln!(buf, "{level_style}{:<5}{level_style:#} {}", level, record.args())
        }
    });

    if builder.try_init().is_ok() {
        log::debug!("Logging initialized at level: {:?}", log::max_level());
    }
}

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
