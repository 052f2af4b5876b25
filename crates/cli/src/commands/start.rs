use bulkrooms_core::config::{AppConfig, LoadOptions};
use bulkrooms_core::counters::CounterService;

use crate::commands::{CommandResult, ErrorClass};

/// Everything `bulkrooms-server` needs before it binds: a valid config and a
/// readable counters snapshot.
pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("start", ErrorClass::ConfigValidation, error.to_string());
        }
    };

    let counters = match CounterService::init(&config.counters) {
        Ok(counters) => counters,
        Err(error) => {
            return CommandResult::failure("start", ErrorClass::CountersStorage, error.to_string());
        }
    };

    CommandResult::success(
        "start",
        format!(
            "preflight passed: server will bind {}:{} with {} quotes recorded in `{}`",
            config.server.bind_address,
            config.server.port,
            counters.snapshot().quotes_submitted,
            counters.path().display()
        ),
    )
}
