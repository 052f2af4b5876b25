use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::event::EventCategory;
use crate::domain::schedule::{parse_date, DateMode, MonthToken};
use crate::domain::tolerance::{parse_count, Tolerance};
use crate::errors::DomainError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNumber {
    pub country_code: String,
    pub number: String,
}

impl PhoneNumber {
    pub fn render(&self) -> String {
        let number = self.number.trim();
        if number.is_empty() {
            return String::new();
        }
        format!("{} {number}", self.country_code.trim()).trim().to_string()
    }
}

/// The in-progress quote request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionDraft {
    pub contact_name: String,
    pub email: String,
    pub phone: PhoneNumber,
    pub event_type: Option<EventCategory>,
    pub event_type_other: String,
    pub locations: Vec<String>,
    pub date_mode: DateMode,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub flexible_month: Option<MonthToken>,
    pub adults: Tolerance,
    pub rooms: Tolerance,
    pub budget: String,
    pub additional_requirements: String,
}

impl Default for SubmissionDraft {
    fn default() -> Self {
        Self {
            contact_name: String::new(),
            email: String::new(),
            phone: PhoneNumber::default(),
            event_type: None,
            event_type_other: String::new(),
            locations: vec![String::new()],
            date_mode: DateMode::default(),
            start_date: None,
            end_date: None,
            flexible_month: None,
            adults: Tolerance::default(),
            rooms: Tolerance::default(),
            budget: String::new(),
            additional_requirements: String::new(),
        }
    }
}

/// Addressable draft fields, named by their wire keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DraftField {
    ContactName,
    Email,
    PhoneCountryCode,
    Phone,
    EventType,
    EventTypeOther,
    Location(usize),
    DateMode,
    StartDate,
    EndDate,
    FlexibleMonth,
    AdultsFixed,
    AdultsVariation,
    RoomsFixed,
    RoomsVariation,
    Budget,
    AdditionalRequirements,
}

/// Where a gate message is displayed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSlot {
    EventType,
    Location(usize),
    Dates,
    Email,
    Adults,
    Rooms,
}

impl ErrorSlot {
    pub fn key(&self) -> String {
        match self {
            Self::EventType => "eventType".to_string(),
            Self::Location(index) => format!("locations[{index}]"),
            Self::Dates => "dates".to_string(),
            Self::Email => "email".to_string(),
            Self::Adults => "adults".to_string(),
            Self::Rooms => "rooms".to_string(),
        }
    }
}

impl DraftField {
    pub fn key(&self) -> String {
        let name = match self {
            Self::ContactName => "contactName",
            Self::Email => "email",
            Self::PhoneCountryCode => "phoneCountryCode",
            Self::Phone => "phone",
            Self::EventType => "eventType",
            Self::EventTypeOther => "eventTypeOther",
            Self::Location(index) => return format!("locations[{index}]"),
            Self::DateMode => "dateMode",
            Self::StartDate => "startDate",
            Self::EndDate => "endDate",
            Self::FlexibleMonth => "flexibleMonth",
            Self::AdultsFixed => "adultsFixed",
            Self::AdultsVariation => "adultsVariation",
            Self::RoomsFixed => "roomsFixed",
            Self::RoomsVariation => "roomsVariation",
            Self::Budget => "budget",
            Self::AdditionalRequirements => "additionalRequirements",
        };
        name.to_string()
    }

    pub fn slot(&self) -> Option<ErrorSlot> {
        match self {
            Self::Email => Some(ErrorSlot::Email),
            Self::EventType | Self::EventTypeOther => Some(ErrorSlot::EventType),
            Self::Location(index) => Some(ErrorSlot::Location(*index)),
            Self::DateMode | Self::StartDate | Self::EndDate | Self::FlexibleMonth => {
                Some(ErrorSlot::Dates)
            }
            Self::AdultsFixed | Self::AdultsVariation => Some(ErrorSlot::Adults),
            Self::RoomsFixed | Self::RoomsVariation => Some(ErrorSlot::Rooms),
            Self::ContactName
            | Self::PhoneCountryCode
            | Self::Phone
            | Self::Budget
            | Self::AdditionalRequirements => None,
        }
    }
}

impl std::str::FromStr for DraftField {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let key = value.trim();
        let field = match key {
            "contactName" => Self::ContactName,
            "email" => Self::Email,
            "phoneCountryCode" => Self::PhoneCountryCode,
            "phone" => Self::Phone,
            "eventType" => Self::EventType,
            "eventTypeOther" => Self::EventTypeOther,
            "dateMode" => Self::DateMode,
            "startDate" => Self::StartDate,
            "endDate" => Self::EndDate,
            "flexibleMonth" => Self::FlexibleMonth,
            "adultsFixed" => Self::AdultsFixed,
            "adultsVariation" => Self::AdultsVariation,
            "roomsFixed" => Self::RoomsFixed,
            "roomsVariation" => Self::RoomsVariation,
            "budget" => Self::Budget,
            "additionalRequirements" => Self::AdditionalRequirements,
            other => {
                let index = other
                    .strip_prefix("locations[")
                    .and_then(|rest| rest.strip_suffix(']'))
                    .and_then(|index| index.parse::<usize>().ok());
                match index {
                    Some(index) => Self::Location(index),
                    None => {
                        return Err(DomainError::InvalidField {
                            field: other.to_string(),
                            reason: "unknown field".to_string(),
                        })
                    }
                }
            }
        };
        Ok(field)
    }
}

impl SubmissionDraft {
    /// Applies one textual edit. Typed fields that fail to parse leave the
    /// draft untouched.
    pub fn set_field(&mut self, field: DraftField, value: &str) -> Result<(), DomainError> {
        let key = field.key();
        match field {
            DraftField::ContactName => self.contact_name = value.to_string(),
            DraftField::Email => self.email = value.to_string(),
            DraftField::PhoneCountryCode => self.phone.country_code = value.to_string(),
            DraftField::Phone => self.phone.number = value.to_string(),
            DraftField::EventType => {
                self.event_type =
                    if value.trim().is_empty() { None } else { Some(value.parse()?) };
            }
            DraftField::EventTypeOther => self.event_type_other = value.to_string(),
            DraftField::Location(index) => self.set_location(index, value)?,
            DraftField::DateMode => self.date_mode = value.parse()?,
            DraftField::StartDate => self.start_date = parse_optional_date(&key, value)?,
            DraftField::EndDate => self.end_date = parse_optional_date(&key, value)?,
            DraftField::FlexibleMonth => {
                self.flexible_month =
                    if value.trim().is_empty() { None } else { Some(value.parse()?) };
            }
            DraftField::AdultsFixed => self.adults.fixed = parse_count(&key, value)?,
            DraftField::AdultsVariation => self.adults.variation = parse_count(&key, value)?,
            DraftField::RoomsFixed => self.rooms.fixed = parse_count(&key, value)?,
            DraftField::RoomsVariation => self.rooms.variation = parse_count(&key, value)?,
            DraftField::Budget => self.budget = value.to_string(),
            DraftField::AdditionalRequirements => self.additional_requirements = value.to_string(),
        }
        Ok(())
    }

    pub fn add_location(&mut self) -> usize {
        self.locations.push(String::new());
        self.locations.len() - 1
    }

    /// Returns whether a slot was removed; the last remaining slot is kept.
    pub fn remove_location(&mut self, index: usize) -> bool {
        if self.locations.len() <= 1 || index >= self.locations.len() {
            return false;
        }
        self.locations.remove(index);
        true
    }

    pub fn set_location(&mut self, index: usize, value: &str) -> Result<(), DomainError> {
        let slot = self.locations.get_mut(index).ok_or_else(|| DomainError::InvalidField {
            field: format!("locations[{index}]"),
            reason: "no such location slot".to_string(),
        })?;
        *slot = value.to_string();
        Ok(())
    }

    /// Nights between check-in and check-out, when both exact dates are set.
    pub fn days_count(&self) -> Option<i64> {
        match (self.date_mode, self.start_date, self.end_date) {
            (DateMode::Exact, Some(start), Some(end)) => Some((end - start).num_days()),
            _ => None,
        }
    }
}

fn parse_optional_date(field: &str, value: &str) -> Result<Option<NaiveDate>, DomainError> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    parse_date(field, value).map(Some)
}
