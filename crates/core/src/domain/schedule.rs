//! Stay dates: either an exact check-in/check-out pair or a flexible month.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateMode {
    #[default]
    Exact,
    Flexible,
}

impl std::str::FromStr for DateMode {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "exact" | "specific" => Ok(Self::Exact),
            "flexible" => Ok(Self::Flexible),
            other => Err(DomainError::InvalidField {
                field: "dateMode".to_string(),
                reason: format!("unsupported date mode `{other}` (expected exact|flexible)"),
            }),
        }
    }
}

/// A `YYYY-MM` month token as offered by the flexible-month picker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthToken {
    year: i32,
    month: u32,
}

impl MonthToken {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self { year: date.year(), month: date.month() }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn label(&self) -> String {
        match NaiveDate::from_ymd_opt(self.year, self.month, 1) {
            Some(first) => first.format("%B %Y").to_string(),
            None => self.to_string(),
        }
    }
}

impl std::fmt::Display for MonthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl std::str::FromStr for MonthToken {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::InvalidField {
            field: "flexibleMonth".to_string(),
            reason: format!("`{}` is not a YYYY-MM month", value.trim()),
        };

        let (year, month) = value.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }
}

impl TryFrom<String> for MonthToken {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthToken> for String {
    fn from(value: MonthToken) -> Self {
        value.to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthOption {
    pub value: String,
    pub label: String,
}

/// The twelve picker options starting with the month containing `today`.
pub fn next_twelve_months(today: NaiveDate) -> Vec<MonthOption> {
    let first = today.with_day(1).unwrap_or(today);
    (0..12)
        .filter_map(|offset| first.checked_add_months(Months::new(offset)))
        .map(MonthToken::of)
        .map(|token| MonthOption { value: token.to_string(), label: token.label() })
        .collect()
}

pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| DomainError::InvalidField {
        field: field.to_string(),
        reason: format!("`{}` is not a YYYY-MM-DD date", value.trim()),
    })
}

/// `en-US` short date, the format browsers produce for `toLocaleDateString()`.
pub fn locale_date(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.month(), date.day(), date.year())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{locale_date, next_twelve_months, DateMode, MonthToken};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    #[test]
    fn month_token_parses_and_formats() {
        let token: MonthToken = "2025-06".parse().expect("valid token");
        assert_eq!(token.year(), 2025);
        assert_eq!(token.month(), 6);
        assert_eq!(token.to_string(), "2025-06");
        assert_eq!(token.label(), "June 2025");
    }

    #[test]
    fn month_token_rejects_malformed_input() {
        for raw in ["2025-13", "2025-6", "25-06", "June", ""] {
            assert!(raw.parse::<MonthToken>().is_err(), "`{raw}` should be rejected");
        }
    }

    #[test]
    fn picker_starts_at_current_month_and_wraps_year() {
        let options = next_twelve_months(date(2025, 11, 19));
        assert_eq!(options.len(), 12);
        assert_eq!(options[0].value, "2025-11");
        assert_eq!(options[1].value, "2025-12");
        assert_eq!(options[2].value, "2026-01");
        assert_eq!(options[2].label, "January 2026");
        assert_eq!(options[11].value, "2026-10");
    }

    #[test]
    fn locale_date_has_no_zero_padding() {
        assert_eq!(locale_date(date(2025, 12, 1)), "12/1/2025");
        assert_eq!(locale_date(date(2026, 3, 14)), "3/14/2026");
    }

    #[test]
    fn date_mode_accepts_legacy_specific_alias() {
        assert_eq!("specific".parse::<DateMode>().ok(), Some(DateMode::Exact));
        assert_eq!("Flexible".parse::<DateMode>().ok(), Some(DateMode::Flexible));
        assert!("sometime".parse::<DateMode>().is_err());
    }
}
