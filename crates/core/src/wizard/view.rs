//! What a renderer needs to draw the current step. Views hold no behaviour;
//! every mutation goes back through [`WizardSession`].

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::draft::{DraftField, ErrorSlot, SubmissionDraft};
use crate::domain::event::EventCategory;
use crate::domain::schedule::{next_twelve_months, DateMode};
use crate::routes::Route;
use crate::wizard::session::WizardSession;
use crate::wizard::states::{WizardState, WizardStep};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Email,
    Tel,
    Number,
    Date,
    Select,
    Textarea,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldView {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub value: String,
    pub required: bool,
    pub options: Vec<SelectOption>,
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepView {
    pub session_id: String,
    pub state: WizardState,
    pub step: u8,
    pub route: Route,
    pub fields: Vec<FieldView>,
    pub errors: BTreeMap<String, String>,
    pub banner: Option<String>,
    pub submitting: bool,
    pub can_go_back: bool,
    pub can_remove_location: bool,
    pub days_count: Option<i64>,
}

impl StepView {
    pub fn field(&self, name: &str) -> Option<&FieldView> {
        self.fields.iter().find(|field| field.name == name)
    }
}

pub fn render(session: &WizardSession, today: NaiveDate) -> StepView {
    let draft = session.draft();
    let state = session.state();
    let step = session.step();

    let mut fields = match step {
        WizardStep::Step1 => step1_fields(draft, today),
        WizardStep::Step2 => step2_fields(draft),
    };
    for field in &mut fields {
        field.error = field_error(session, field);
    }

    let route = if state == WizardState::Confirmed {
        Route::QuoteThankYou
    } else {
        Route::QuoteWizard { session_id: session.id().clone() }
    };

    StepView {
        session_id: session.id().to_string(),
        state,
        step: step.number(),
        route,
        fields,
        errors: session
            .errors()
            .iter()
            .map(|(slot, message)| (slot.key(), message.clone()))
            .collect(),
        banner: session.banner().map(str::to_string),
        submitting: session.is_submitting(),
        can_go_back: matches!(state, WizardState::Step2 | WizardState::SubmissionFailed),
        can_remove_location: draft.locations.len() > 1,
        days_count: draft.days_count(),
    }
}

/// Slot messages are shown next to one control only.
fn field_error(session: &WizardSession, field: &FieldView) -> Option<String> {
    let parsed = field.name.parse::<DraftField>().ok()?;
    let slot = parsed.slot()?;
    let message = session.error(slot)?;
    (primary_field(slot, session.draft()) == parsed).then(|| message.to_string())
}

fn primary_field(slot: ErrorSlot, draft: &SubmissionDraft) -> DraftField {
    match slot {
        ErrorSlot::EventType => match draft.event_type {
            Some(EventCategory::Other) => DraftField::EventTypeOther,
            _ => DraftField::EventType,
        },
        ErrorSlot::Location(index) => DraftField::Location(index),
        ErrorSlot::Dates => match draft.date_mode {
            DateMode::Exact => DraftField::StartDate,
            DateMode::Flexible => DraftField::FlexibleMonth,
        },
        ErrorSlot::Email => DraftField::Email,
        ErrorSlot::Adults => DraftField::AdultsFixed,
        ErrorSlot::Rooms => DraftField::RoomsFixed,
    }
}

fn step1_fields(draft: &SubmissionDraft, today: NaiveDate) -> Vec<FieldView> {
    let mut fields = vec![FieldView {
        options: EventCategory::ALL
            .iter()
            .map(|category| SelectOption {
                value: category.as_str().to_string(),
                label: category.label().to_string(),
            })
            .collect(),
        ..field(
            DraftField::EventType,
            "Event Type",
            FieldKind::Select,
            draft.event_type.map(|category| category.as_str().to_string()).unwrap_or_default(),
            true,
        )
    }];

    if draft.event_type == Some(EventCategory::Other) {
        fields.push(field(
            DraftField::EventTypeOther,
            "Describe your event",
            FieldKind::Text,
            draft.event_type_other.clone(),
            true,
        ));
    }

    for (index, location) in draft.locations.iter().enumerate() {
        let label =
            if index == 0 { "Location".to_string() } else { format!("Location {}", index + 1) };
        fields.push(FieldView {
            label,
            ..field(DraftField::Location(index), "", FieldKind::Text, location.clone(), true)
        });
    }

    fields.push(FieldView {
        options: vec![
            SelectOption { value: "exact".to_string(), label: "Specific dates".to_string() },
            SelectOption { value: "flexible".to_string(), label: "Flexible month".to_string() },
        ],
        ..field(
            DraftField::DateMode,
            "Dates",
            FieldKind::Select,
            match draft.date_mode {
                DateMode::Exact => "exact".to_string(),
                DateMode::Flexible => "flexible".to_string(),
            },
            true,
        )
    });

    match draft.date_mode {
        DateMode::Exact => {
            fields.push(field(
                DraftField::StartDate,
                "Check-in",
                FieldKind::Date,
                draft.start_date.map(|date| date.to_string()).unwrap_or_default(),
                true,
            ));
            fields.push(field(
                DraftField::EndDate,
                "Check-out",
                FieldKind::Date,
                draft.end_date.map(|date| date.to_string()).unwrap_or_default(),
                true,
            ));
        }
        DateMode::Flexible => fields.push(FieldView {
            options: next_twelve_months(today)
                .into_iter()
                .map(|month| SelectOption { value: month.value, label: month.label })
                .collect(),
            ..field(
                DraftField::FlexibleMonth,
                "Month",
                FieldKind::Select,
                draft.flexible_month.map(|month| month.to_string()).unwrap_or_default(),
                true,
            )
        }),
    }

    fields
}

fn step2_fields(draft: &SubmissionDraft) -> Vec<FieldView> {
    let count = |value: Option<i64>| value.map(|value| value.to_string()).unwrap_or_default();
    vec![
        field(
            DraftField::AdultsFixed,
            "Adults",
            FieldKind::Number,
            count(draft.adults.fixed),
            true,
        ),
        field(
            DraftField::AdultsVariation,
            "Adults (±)",
            FieldKind::Number,
            count(draft.adults.variation),
            false,
        ),
        field(DraftField::RoomsFixed, "Rooms", FieldKind::Number, count(draft.rooms.fixed), true),
        field(
            DraftField::RoomsVariation,
            "Rooms (±)",
            FieldKind::Number,
            count(draft.rooms.variation),
            false,
        ),
        field(
            DraftField::ContactName,
            "Contact Person Name",
            FieldKind::Text,
            draft.contact_name.clone(),
            false,
        ),
        field(DraftField::Email, "Email Address", FieldKind::Email, draft.email.clone(), true),
        field(
            DraftField::PhoneCountryCode,
            "Country Code",
            FieldKind::Tel,
            draft.phone.country_code.clone(),
            false,
        ),
        field(DraftField::Phone, "Phone", FieldKind::Tel, draft.phone.number.clone(), false),
        field(DraftField::Budget, "Budget", FieldKind::Text, draft.budget.clone(), false),
        field(
            DraftField::AdditionalRequirements,
            "Additional Requirements",
            FieldKind::Textarea,
            draft.additional_requirements.clone(),
            false,
        ),
    ]
}

fn field(
    name: DraftField,
    label: &str,
    kind: FieldKind,
    value: String,
    required: bool,
) -> FieldView {
    FieldView {
        name: name.key(),
        label: label.to_string(),
        kind,
        value,
        required,
        options: Vec::new(),
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::render;
    use crate::domain::draft::DraftField;
    use crate::routes::Route;
    use crate::wizard::gate::{DESCRIBE_EVENT_TYPE, SELECT_DATE_RANGE};
    use crate::wizard::session::WizardSession;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 20).expect("valid date")
    }

    #[test]
    fn step1_lists_event_locations_and_exact_dates() {
        let session = WizardSession::default();
        let view = render(&session, today());

        assert_eq!(view.step, 1);
        assert!(!view.can_go_back);
        assert!(!view.can_remove_location);
        let names: Vec<&str> = view.fields.iter().map(|field| field.name.as_str()).collect();
        assert_eq!(names, ["eventType", "locations[0]", "dateMode", "startDate", "endDate"]);
        assert_eq!(view.field("eventType").map(|field| field.options.len()), Some(9));
        assert_eq!(view.route, Route::QuoteWizard { session_id: session.id().clone() });
    }

    #[test]
    fn flexible_mode_offers_twelve_months() {
        let mut session = WizardSession::default();
        session.set_field(DraftField::DateMode, "flexible").expect("mode");
        let view = render(&session, today());

        let month = view.field("flexibleMonth").expect("month picker");
        assert_eq!(month.options.len(), 12);
        assert_eq!(month.options[0].value, "2025-05");
        assert!(view.field("startDate").is_none());
    }

    #[test]
    fn gate_errors_attach_to_one_control() {
        let mut session = WizardSession::default();
        session.set_field(DraftField::EventType, "other").expect("other");
        session.set_field(DraftField::Location(0), "Goa").expect("location");
        let _ = session.advance();

        let view = render(&session, today());
        assert_eq!(
            view.field("eventTypeOther").and_then(|field| field.error.as_deref()),
            Some(DESCRIBE_EVENT_TYPE)
        );
        assert_eq!(view.field("eventType").and_then(|field| field.error.as_deref()), None);
        assert_eq!(view.errors.get("eventType").map(String::as_str), Some(DESCRIBE_EVENT_TYPE));

        session.set_field(DraftField::EventTypeOther, "Retreat").expect("elaboration");
        let _ = session.advance();
        let view = render(&session, today());
        assert_eq!(
            view.field("startDate").and_then(|field| field.error.as_deref()),
            Some(SELECT_DATE_RANGE)
        );
    }

    #[test]
    fn step2_view_shows_days_count_and_back_navigation() {
        let mut session = WizardSession::default();
        for (field, value) in [
            (DraftField::EventType, "trip"),
            (DraftField::Location(0), "Manali"),
            (DraftField::StartDate, "2025-12-01"),
            (DraftField::EndDate, "2025-12-03"),
        ] {
            session.set_field(field, value).expect("edit");
        }
        session.advance().expect("step 1");

        let view = render(&session, today());
        assert_eq!(view.step, 2);
        assert!(view.can_go_back);
        assert_eq!(view.days_count, Some(2));
        assert!(view.field("adultsFixed").is_some_and(|field| field.required));
        assert!(view.field("additionalRequirements").is_some_and(|field| !field.required));
    }
}
