//! Per-step predicates deciding whether the wizard may move forward.
//!
//! The gate is a pure function of the draft and the step being left. It
//! reports the first failing check only; that message is what the form shows
//! next to the offending control.

use crate::domain::contact::is_well_formed_email;
use crate::domain::draft::{ErrorSlot, SubmissionDraft};
use crate::domain::event::EventCategory;
use crate::domain::schedule::DateMode;
use crate::domain::tolerance::Tolerance;
use crate::wizard::states::WizardStep;

pub const SELECT_EVENT_TYPE: &str = "Please select an event type";
pub const DESCRIBE_EVENT_TYPE: &str = "Please describe your event type";
pub const ENTER_LOCATION: &str = "Please enter a location";
pub const SELECT_DATE_RANGE: &str = "Please select a date range";
pub const CHECK_OUT_AFTER_CHECK_IN: &str = "Check-out date must be after check-in date";
pub const SELECT_MONTH: &str = "Please select a month";
pub const ENTER_ADULTS: &str = "Please enter the number of adults";
pub const ENTER_ROOMS: &str = "Please enter the number of rooms";
pub const NO_NEGATIVE_COUNTS: &str = "Numbers cannot be negative";
pub const ENTER_VALID_EMAIL: &str = "Please enter a valid email address";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ValidationOutcome {
    #[default]
    Advance,
    Rejected {
        slot: ErrorSlot,
        message: String,
    },
}

impl ValidationOutcome {
    pub fn is_advance(&self) -> bool {
        matches!(self, Self::Advance)
    }

    fn rejected(slot: ErrorSlot, message: &str) -> Self {
        Self::Rejected { slot, message: message.to_string() }
    }
}

pub fn check(draft: &SubmissionDraft, step: WizardStep) -> ValidationOutcome {
    match step {
        WizardStep::Step1 => check_event_location_dates(draft),
        WizardStep::Step2 => check_counts_and_contact(draft),
    }
}

fn check_event_location_dates(draft: &SubmissionDraft) -> ValidationOutcome {
    match draft.event_type {
        None => return ValidationOutcome::rejected(ErrorSlot::EventType, SELECT_EVENT_TYPE),
        Some(EventCategory::Other) if draft.event_type_other.trim().is_empty() => {
            return ValidationOutcome::rejected(ErrorSlot::EventType, DESCRIBE_EVENT_TYPE);
        }
        Some(_) => {}
    }

    if let Some(index) = draft.locations.iter().position(|location| location.trim().is_empty()) {
        return ValidationOutcome::rejected(ErrorSlot::Location(index), ENTER_LOCATION);
    }

    match draft.date_mode {
        DateMode::Exact => match (draft.start_date, draft.end_date) {
            (Some(start), Some(end)) if start < end => ValidationOutcome::Advance,
            (Some(_), Some(_)) => {
                ValidationOutcome::rejected(ErrorSlot::Dates, CHECK_OUT_AFTER_CHECK_IN)
            }
            _ => ValidationOutcome::rejected(ErrorSlot::Dates, SELECT_DATE_RANGE),
        },
        DateMode::Flexible => match draft.flexible_month {
            Some(_) => ValidationOutcome::Advance,
            None => ValidationOutcome::rejected(ErrorSlot::Dates, SELECT_MONTH),
        },
    }
}

fn check_counts_and_contact(draft: &SubmissionDraft) -> ValidationOutcome {
    if let Some(outcome) = check_count(&draft.adults, ErrorSlot::Adults, ENTER_ADULTS) {
        return outcome;
    }
    if let Some(outcome) = check_count(&draft.rooms, ErrorSlot::Rooms, ENTER_ROOMS) {
        return outcome;
    }
    if !is_well_formed_email(&draft.email) {
        return ValidationOutcome::rejected(ErrorSlot::Email, ENTER_VALID_EMAIL);
    }
    ValidationOutcome::Advance
}

fn check_count(count: &Tolerance, slot: ErrorSlot, missing: &str) -> Option<ValidationOutcome> {
    if count.fixed.is_none() {
        return Some(ValidationOutcome::rejected(slot, missing));
    }
    if !count.is_non_negative() {
        return Some(ValidationOutcome::rejected(slot, NO_NEGATIVE_COUNTS));
    }
    None
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::draft::DraftField;

    fn step1_ready() -> SubmissionDraft {
        let mut draft = SubmissionDraft::default();
        draft.set_field(DraftField::EventType, "wedding").expect("event");
        draft.set_field(DraftField::Location(0), "Jaipur").expect("location");
        draft.set_field(DraftField::StartDate, "2025-12-01").expect("start");
        draft.set_field(DraftField::EndDate, "2025-12-03").expect("end");
        draft
    }

    fn step2_ready() -> SubmissionDraft {
        let mut draft = step1_ready();
        draft.set_field(DraftField::AdultsFixed, "50").expect("adults");
        draft.set_field(DraftField::AdultsVariation, "5").expect("adults variation");
        draft.set_field(DraftField::RoomsFixed, "20").expect("rooms");
        draft.set_field(DraftField::Email, "a@b.com").expect("email");
        draft
    }

    fn rejected_with(outcome: ValidationOutcome, slot: ErrorSlot, message: &str) {
        assert_eq!(outcome, ValidationOutcome::Rejected { slot, message: message.to_string() });
    }

    #[test]
    fn step1_passes_for_complete_exact_range() {
        assert!(check(&step1_ready(), WizardStep::Step1).is_advance());
    }

    #[test]
    fn step1_requires_event_type() {
        let mut draft = step1_ready();
        draft.event_type = None;
        rejected_with(check(&draft, WizardStep::Step1), ErrorSlot::EventType, SELECT_EVENT_TYPE);
    }

    #[test]
    fn other_event_type_needs_elaboration() {
        let mut draft = step1_ready();
        draft.set_field(DraftField::EventType, "other").expect("other");
        draft.set_field(DraftField::EventTypeOther, "   ").expect("blank elaboration");
        rejected_with(check(&draft, WizardStep::Step1), ErrorSlot::EventType, DESCRIBE_EVENT_TYPE);

        draft.set_field(DraftField::EventTypeOther, "Film shoot crew").expect("elaboration");
        assert!(check(&draft, WizardStep::Step1).is_advance());
    }

    #[test]
    fn every_location_slot_must_be_filled() {
        let mut draft = step1_ready();
        let index = draft.add_location();
        rejected_with(
            check(&draft, WizardStep::Step1),
            ErrorSlot::Location(index),
            ENTER_LOCATION,
        );

        draft.set_location(index, "Udaipur").expect("second location");
        assert!(check(&draft, WizardStep::Step1).is_advance());
    }

    #[test]
    fn exact_range_must_be_strictly_ordered() {
        let base = NaiveDate::from_ymd_opt(2025, 12, 1).expect("date");
        for (start_offset, end_offset, accepted) in [(0, 1, true), (0, 0, false), (2, 1, false)] {
            let mut draft = step1_ready();
            draft.start_date = Some(base + chrono::Days::new(start_offset));
            draft.end_date = Some(base + chrono::Days::new(end_offset));
            let outcome = check(&draft, WizardStep::Step1);
            if accepted {
                assert!(outcome.is_advance());
            } else {
                rejected_with(outcome, ErrorSlot::Dates, CHECK_OUT_AFTER_CHECK_IN);
            }
        }
    }

    #[test]
    fn exact_mode_requires_both_dates() {
        let mut draft = step1_ready();
        draft.end_date = None;
        rejected_with(check(&draft, WizardStep::Step1), ErrorSlot::Dates, SELECT_DATE_RANGE);
    }

    #[test]
    fn flexible_mode_requires_a_month_and_ignores_exact_dates() {
        let mut draft = step1_ready();
        draft.start_date = None;
        draft.end_date = None;
        draft.set_field(DraftField::DateMode, "flexible").expect("mode");
        rejected_with(check(&draft, WizardStep::Step1), ErrorSlot::Dates, SELECT_MONTH);

        draft.set_field(DraftField::FlexibleMonth, "2025-06").expect("month");
        assert!(check(&draft, WizardStep::Step1).is_advance());
    }

    #[test]
    fn step2_passes_without_additional_requirements() {
        assert!(check(&step2_ready(), WizardStep::Step2).is_advance());
    }

    #[test]
    fn step2_requires_fixed_counts() {
        let mut draft = step2_ready();
        draft.rooms.fixed = None;
        rejected_with(check(&draft, WizardStep::Step2), ErrorSlot::Rooms, ENTER_ROOMS);
    }

    #[test]
    fn step2_rejects_negative_variation() {
        let mut draft = step2_ready();
        draft.set_field(DraftField::AdultsVariation, "-5").expect("parse");
        rejected_with(check(&draft, WizardStep::Step2), ErrorSlot::Adults, NO_NEGATIVE_COUNTS);
    }

    #[test]
    fn step2_requires_well_formed_email() {
        let mut draft = step2_ready();
        draft.set_field(DraftField::Email, "not-an-email").expect("email text");
        rejected_with(check(&draft, WizardStep::Step2), ErrorSlot::Email, ENTER_VALID_EMAIL);
    }
}
