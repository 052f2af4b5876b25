use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventCategory {
    Wedding,
    CorporateStay,
    Trip,
    Conference,
    SportsEvent,
    FamilyReunion,
    Birthday,
    Anniversary,
    Other,
}

impl EventCategory {
    pub const ALL: [EventCategory; 9] = [
        Self::Wedding,
        Self::CorporateStay,
        Self::Trip,
        Self::Conference,
        Self::SportsEvent,
        Self::FamilyReunion,
        Self::Birthday,
        Self::Anniversary,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wedding => "wedding",
            Self::CorporateStay => "corporate-stay",
            Self::Trip => "trip",
            Self::Conference => "conference",
            Self::SportsEvent => "sports-event",
            Self::FamilyReunion => "family-reunion",
            Self::Birthday => "birthday",
            Self::Anniversary => "anniversary",
            Self::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Wedding => "Wedding",
            Self::CorporateStay => "Corporate Stay",
            Self::Trip => "Trip",
            Self::Conference => "Conference",
            Self::SportsEvent => "Sports Event",
            Self::FamilyReunion => "Family Reunion",
            Self::Birthday => "Birthday",
            Self::Anniversary => "Anniversary",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventCategory {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|category| category.as_str() == normalized).ok_or_else(|| {
            DomainError::InvalidField {
                field: "eventType".to_string(),
                reason: format!("unknown event type `{}`", value.trim()),
            }
        })
    }
}
