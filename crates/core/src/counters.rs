//! Process-wide "hours saved / savings" figures shown on marketing pages.
//!
//! The snapshot lives in memory; `flush` persists it as JSON by writing a
//! sibling temp file and renaming it over the target.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::CounterConfig;
use crate::errors::ApplicationError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterSnapshot {
    pub hours_saved: u64,
    pub savings: u64,
    pub quotes_submitted: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CounterIncrements {
    pub hours: u64,
    pub savings: u64,
}

#[derive(Clone)]
pub struct CounterService {
    path: PathBuf,
    increments: CounterIncrements,
    state: Arc<Mutex<CounterSnapshot>>,
    // One writer at a time owns the temp file.
    flush_lock: Arc<Mutex<()>>,
}

impl CounterService {
    /// Loads the persisted snapshot, or seeds one from the configured
    /// initial values when the file does not exist yet.
    pub fn init(config: &CounterConfig) -> Result<Self, ApplicationError> {
        let snapshot = match fs::read_to_string(&config.path) {
            Ok(raw) => serde_json::from_str::<CounterSnapshot>(&raw).map_err(|error| {
                ApplicationError::Persistence(format!(
                    "counter snapshot `{}` is not valid JSON: {error}",
                    config.path.display()
                ))
            })?,
            Err(error) if error.kind() == io::ErrorKind::NotFound => CounterSnapshot {
                hours_saved: config.initial_hours_saved,
                savings: config.initial_savings,
                quotes_submitted: 0,
                updated_at: None,
            },
            Err(error) => {
                return Err(ApplicationError::Persistence(format!(
                    "could not read counter snapshot `{}`: {error}",
                    config.path.display()
                )))
            }
        };

        Ok(Self {
            path: config.path.clone(),
            increments: CounterIncrements {
                hours: config.hours_per_quote,
                savings: config.savings_per_quote,
            },
            state: Arc::new(Mutex::new(snapshot)),
            flush_lock: Arc::default(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record_quote_submission(&self) -> CounterSnapshot {
        let increments = self.increments;
        self.with_state(|snapshot| {
            snapshot.hours_saved = snapshot.hours_saved.saturating_add(increments.hours);
            snapshot.savings = snapshot.savings.saturating_add(increments.savings);
            snapshot.quotes_submitted = snapshot.quotes_submitted.saturating_add(1);
            snapshot.updated_at = Some(Utc::now());
            snapshot.clone()
        })
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        self.with_state(|snapshot| snapshot.clone())
    }

    /// Writes the latest snapshot. Concurrent callers are serialized so the
    /// file on disk never goes backwards.
    pub fn flush(&self) -> Result<(), ApplicationError> {
        let _guard = match self.flush_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let snapshot = self.snapshot();
        let payload = serde_json::to_vec_pretty(&snapshot).map_err(|error| {
            ApplicationError::Persistence(format!("could not serialize counters: {error}"))
        })?;

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|error| self.io_error("create directory", error))?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, payload).map_err(|error| self.io_error("write", error))?;
        fs::rename(&temp_path, &self.path).map_err(|error| self.io_error("rename", error))?;
        Ok(())
    }

    fn io_error(&self, operation: &str, error: io::Error) -> ApplicationError {
        ApplicationError::Persistence(format!(
            "counter flush failed to {operation} for `{}`: {error}",
            self.path.display()
        ))
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut CounterSnapshot) -> T) -> T {
        match self.state.lock() {
            Ok(mut snapshot) => f(&mut snapshot),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}
