//! Logging setup.

use std::panic;

use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::Error;
use crate::middleware::{catching, panic_message};

/// Installs the global `tracing` subscriber and a panic hook that logs
/// through it.
///
/// `RUST_LOG` wins when set; otherwise `config.log_filter` applies. Fails if a
/// global subscriber is already installed.
///
/// Panics inside a request are reported once, by
/// [`Recovery`](crate::middleware::Recovery), so the hook skips them. Any
/// other panic becomes an ERROR event instead of a stderr backtrace.
pub fn init(config: &Config) -> Result<(), Error> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_filter).map_err(|e| Error::Telemetry(Box::new(e)))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(Error::Telemetry)?;

    panic::set_hook(Box::new(|info| {
        if catching() {
            return;
        }
        let location = info.location().map(ToString::to_string).unwrap_or_default();
        error!(panic = panic_message(info.payload()), %location, "panic");
    }));
    Ok(())
}
