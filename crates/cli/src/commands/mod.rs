pub mod config;
pub mod doctor;
pub mod start;

use serde_json::json;

/// Why a command failed; each class owns its process exit code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    ConfigValidation,
    CountersStorage,
}

impl ErrorClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConfigValidation => "config_validation",
            Self::CountersStorage => "counters_storage",
        }
    }

    pub fn exit_code(self) -> u8 {
        match self {
            Self::ConfigValidation => 2,
            Self::CountersStorage => 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self { exit_code: 0, output: outcome(command, None, message.into()) }
    }

    pub fn failure(command: &str, class: ErrorClass, message: impl Into<String>) -> Self {
        Self { exit_code: class.exit_code(), output: outcome(command, Some(class), message.into()) }
    }
}

fn outcome(command: &str, class: Option<ErrorClass>, message: String) -> String {
    json!({
        "command": command,
        "status": if class.is_some() { "error" } else { "ok" },
        "error_class": class.map(ErrorClass::as_str),
        "message": message,
    })
    .to_string()
}
