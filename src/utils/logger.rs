use env_logger::Builder;
use log::LevelFilter;

use crate::errors::prelude::*;

use std::env;
use std::io::Write;

/// `env_logger` backed logger for binaries and tests embedding the crate.
///
/// The library itself only emits records through the `log` facade and never
/// installs a logger.
pub struct DefaultLogger;

impl DefaultLogger {
    pub fn init(pattern: Option<String>) -> AnonCredsResult<()> {
        let pattern = pattern.or_else(|| env::var("RUST_LOG").ok());

        Builder::new()
            .format(|buf, record| {
                writeln!(
                    buf,
                    "{:>5}|{:<30}|{:>35}:{:<4}| {}",
                    record.level(),
                    record.target(),
                    record.file().unwrap_or(""),
                    record.line().unwrap_or(0),
                    record.args()
                )
            })
            .filter(None, LevelFilter::Off)
            .parse_filters(pattern.as_deref().unwrap_or(""))
            .try_init()?;

        Ok(())
    }
}

#[cfg(debug_assertions)]
#[macro_export]
macro_rules! secret {
    ($val:expr) => {{
        $val
    }};
}

#[cfg(not(debug_assertions))]
#[macro_export]
macro_rules! secret {
    ($val:expr) => {{
        "_"
    }};
}
