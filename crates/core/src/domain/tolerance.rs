use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// A count expressed as "fixed ± variation", used for headcount and rooms.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tolerance {
    pub fixed: Option<i64>,
    pub variation: Option<i64>,
}

impl Tolerance {
    pub fn new(fixed: i64, variation: i64) -> Self {
        Self { fixed: Some(fixed), variation: Some(variation) }
    }

    pub fn is_non_negative(&self) -> bool {
        self.fixed.unwrap_or(0) >= 0 && self.variation.unwrap_or(0) >= 0
    }

    /// Wire form; an unset variation reads as zero.
    pub fn render(&self) -> String {
        match self.fixed {
            Some(fixed) => format!("{fixed} ± {}", self.variation.unwrap_or(0)),
            None => String::new(),
        }
    }
}

/// Empty input clears the value.
pub fn parse_count(field: &str, value: &str) -> Result<Option<i64>, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse::<i64>().map(Some).map_err(|_| DomainError::InvalidField {
        field: field.to_string(),
        reason: format!("`{trimmed}` is not a whole number"),
    })
}
