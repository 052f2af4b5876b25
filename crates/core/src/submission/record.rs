use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::contact::ContactMessage;
use crate::domain::draft::SubmissionDraft;
use crate::domain::event::EventCategory;
use crate::domain::place::UNKNOWN_IP;
use crate::domain::schedule::{locale_date, DateMode};

/// Metadata captured at the moment of submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionContext {
    pub sheet_name: String,
    pub timestamp: DateTime<Utc>,
    pub ip: Option<String>,
}

impl SubmissionContext {
    pub fn new(sheet_name: impl Into<String>, ip: Option<String>) -> Self {
        Self { sheet_name: sheet_name.into(), timestamp: Utc::now(), ip }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    fn ip_or_unknown(&self) -> String {
        self.ip
            .as_deref()
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .unwrap_or(UNKNOWN_IP)
            .to_string()
    }

    fn timestamp_text(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRecord {
    pub sheet_name: String,
    pub timestamp: String,
    pub ip: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub event_type: String,
    pub locations: String,
    pub start_date: String,
    pub end_date: String,
    pub flexible_month: String,
    pub adults: String,
    pub rooms_needed: String,
    pub budget: String,
    pub additional_requirements: String,
}

impl QuoteRecord {
    pub fn from_draft(draft: &SubmissionDraft, context: &SubmissionContext) -> Self {
        let event_type = match draft.event_type {
            Some(EventCategory::Other) => draft.event_type_other.trim().to_string(),
            Some(category) => category.as_str().to_string(),
            None => String::new(),
        };

        let (start_date, end_date, flexible_month) = match draft.date_mode {
            DateMode::Exact => (
                draft.start_date.map(locale_date).unwrap_or_default(),
                draft.end_date.map(locale_date).unwrap_or_default(),
                String::new(),
            ),
            DateMode::Flexible => (
                String::new(),
                String::new(),
                draft.flexible_month.map(|month| month.to_string()).unwrap_or_default(),
            ),
        };

        let locations = draft
            .locations
            .iter()
            .map(|location| location.trim())
            .filter(|location| !location.is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            sheet_name: context.sheet_name.clone(),
            timestamp: context.timestamp_text(),
            ip: context.ip_or_unknown(),
            contact_name: draft.contact_name.trim().to_string(),
            email: draft.email.trim().to_string(),
            phone: draft.phone.render(),
            event_type,
            locations,
            start_date,
            end_date,
            flexible_month,
            adults: draft.adults.render(),
            rooms_needed: draft.rooms.render(),
            budget: draft.budget.trim().to_string(),
            additional_requirements: draft.additional_requirements.trim().to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRecord {
    pub sheet_name: String,
    pub timestamp: String,
    pub ip: String,
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactRecord {
    pub fn from_message(message: &ContactMessage, context: &SubmissionContext) -> Self {
        Self {
            sheet_name: context.sheet_name.clone(),
            timestamp: context.timestamp_text(),
            ip: context.ip_or_unknown(),
            name: message.name.trim().to_string(),
            email: message.email.trim().to_string(),
            message: message.message.trim().to_string(),
        }
    }
}

/// The body posted to the spreadsheet webhook; `sheetName` tells the
/// receiving script which tab to append to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SubmissionRecord {
    Quote(QuoteRecord),
    Contact(ContactRecord),
}

impl SubmissionRecord {
    pub fn sheet_name(&self) -> &str {
        match self {
            Self::Quote(record) => &record.sheet_name,
            Self::Contact(record) => &record.sheet_name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Quote(_) => "quote",
            Self::Contact(_) => "contact",
        }
    }
}
