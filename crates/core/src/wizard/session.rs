use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::draft::{DraftField, ErrorSlot, SubmissionDraft};
use crate::domain::place::GeoInfo;
use crate::errors::DomainError;
use crate::submission::{
    Dispatcher, QuoteRecord, SubmissionContext, SubmissionRecord, TransportError,
};
use crate::wizard::engine::{QuoteRequestFlow, WizardEngine, WizardTransitionError};
use crate::wizard::gate;
use crate::wizard::states::{
    TransitionOutcome, WizardAction, WizardContext, WizardEvent, WizardState, WizardStep,
};

pub const SUBMISSION_FAILED: &str =
    "Something went wrong while sending your request. Please try again.";

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim()).map(Self)
    }
}

/// Owns one quote-request draft together with the wizard position and the
/// transient UI state (error slots, banner, in-flight flag).
pub struct WizardSession {
    id: SessionId,
    engine: WizardEngine<QuoteRequestFlow>,
    state: WizardState,
    draft: SubmissionDraft,
    errors: BTreeMap<ErrorSlot, String>,
    banner: Option<String>,
    geo: Option<GeoInfo>,
    touched_at: DateTime<Utc>,
}

impl Default for WizardSession {
    fn default() -> Self {
        Self::new(SessionId::new())
    }
}

impl WizardSession {
    pub fn new(id: SessionId) -> Self {
        let engine = WizardEngine::default();
        let state = engine.initial_state();
        Self {
            id,
            engine,
            state,
            draft: SubmissionDraft::default(),
            errors: BTreeMap::new(),
            banner: None,
            geo: None,
            touched_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn step(&self) -> WizardStep {
        self.state.step()
    }

    pub fn draft(&self) -> &SubmissionDraft {
        &self.draft
    }

    pub fn errors(&self) -> &BTreeMap<ErrorSlot, String> {
        &self.errors
    }

    pub fn error(&self, slot: ErrorSlot) -> Option<&str> {
        self.errors.get(&slot).map(String::as_str)
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.state == WizardState::Submitting
    }

    pub fn geo(&self) -> Option<&GeoInfo> {
        self.geo.as_ref()
    }

    pub fn set_geo(&mut self, geo: GeoInfo) {
        self.geo = Some(geo);
    }

    pub fn touched_at(&self) -> DateTime<Utc> {
        self.touched_at
    }

    pub fn is_idle_longer_than(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.touched_at > ttl
    }

    pub fn set_field(&mut self, field: DraftField, value: &str) -> Result<(), DomainError> {
        self.ensure_editable()?;
        self.draft.set_field(field, value)?;
        if let Some(slot) = field.slot() {
            self.errors.remove(&slot);
        }
        self.touch();
        Ok(())
    }

    pub fn add_location(&mut self) -> Result<usize, DomainError> {
        self.ensure_editable()?;
        self.touch();
        Ok(self.draft.add_location())
    }

    /// Removing the only remaining location is a no-op, reported as `false`.
    pub fn remove_location(&mut self, index: usize) -> Result<bool, DomainError> {
        self.ensure_editable()?;
        let removed = self.draft.remove_location(index);
        if removed {
            // Slots after the removed one shift down; stale indices would point elsewhere.
            self.errors.retain(|slot, _| !matches!(slot, ErrorSlot::Location(_)));
        }
        self.touch();
        Ok(removed)
    }

    pub fn set_location(&mut self, index: usize, value: &str) -> Result<(), DomainError> {
        self.set_field(DraftField::Location(index), value)
    }

    pub fn advance(&mut self) -> Result<TransitionOutcome, DomainError> {
        self.apply(WizardEvent::Advance)
    }

    pub fn back(&mut self) -> Result<TransitionOutcome, DomainError> {
        self.apply(WizardEvent::Back)
    }

    /// Runs the step-2 gate and freezes the draft into a wire record. The
    /// session stays `Submitting` until `complete_submission` is called.
    pub fn begin_submission(
        &mut self,
        mut context: SubmissionContext,
    ) -> Result<SubmissionRecord, DomainError> {
        self.apply(WizardEvent::Submit)?;
        if context.ip.is_none() {
            context.ip = self.geo.as_ref().map(|geo| geo.ip.clone());
        }
        Ok(SubmissionRecord::Quote(QuoteRecord::from_draft(&self.draft, &context)))
    }

    pub fn complete_submission(
        &mut self,
        result: &Result<(), TransportError>,
    ) -> Result<TransitionOutcome, DomainError> {
        let event = match result {
            Ok(()) => WizardEvent::TransportSucceeded,
            Err(_) => WizardEvent::TransportFailed,
        };
        self.apply(event)
    }

    /// Gate, dispatch and settle in one go, for callers that own the session.
    pub async fn submit<D>(
        &mut self,
        dispatcher: &D,
        context: SubmissionContext,
    ) -> Result<TransitionOutcome, DomainError>
    where
        D: Dispatcher + ?Sized,
    {
        let record = self.begin_submission(context)?;
        let result = dispatcher.dispatch(&record).await;
        self.complete_submission(&result)
    }

    fn apply(&mut self, event: WizardEvent) -> Result<TransitionOutcome, DomainError> {
        let gate = match event {
            WizardEvent::Advance | WizardEvent::Submit => gate::check(&self.draft, self.step()),
            _ => gate::ValidationOutcome::Advance,
        };
        self.touch();

        match self.engine.apply(&self.state, &event, &WizardContext { gate }) {
            Ok(outcome) => {
                for action in &outcome.actions {
                    match action {
                        WizardAction::ClearErrors => {
                            self.errors.clear();
                            self.banner = None;
                        }
                        WizardAction::ShowSubmissionError => {
                            self.banner = Some(SUBMISSION_FAILED.to_string());
                        }
                        WizardAction::RenderStep(_)
                        | WizardAction::DispatchSubmission
                        | WizardAction::ShowConfirmation => {}
                    }
                }
                self.state = outcome.to;
                Ok(outcome)
            }
            Err(error) => {
                if let WizardTransitionError::GateRejected { slot, message, .. } = &error {
                    self.errors.insert(*slot, message.clone());
                }
                Err(error.into())
            }
        }
    }

    fn ensure_editable(&self) -> Result<(), DomainError> {
        match self.state {
            WizardState::Submitting | WizardState::Confirmed => {
                Err(WizardTransitionError::DraftFrozen { state: self.state }.into())
            }
            WizardState::Step1 | WizardState::Step2 | WizardState::SubmissionFailed => Ok(()),
        }
    }

    fn touch(&mut self) {
        self.touched_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::{SessionId, WizardSession, SUBMISSION_FAILED};
    use crate::domain::draft::{DraftField, ErrorSlot};
    use crate::domain::place::GeoInfo;
    use crate::errors::DomainError;
    use crate::submission::{InMemoryDispatcher, SubmissionContext, SubmissionRecord};
    use crate::wizard::engine::WizardTransitionError;
    use crate::wizard::gate::{ENTER_ROOMS, SELECT_DATE_RANGE, SELECT_MONTH};
    use crate::wizard::states::{WizardState, WizardStep};

    fn edit(session: &mut WizardSession, edits: &[(DraftField, &str)]) {
        for (field, value) in edits {
            session.set_field(*field, value).expect("valid edit");
        }
    }

    fn jaipur_wedding() -> WizardSession {
        let mut session = WizardSession::default();
        edit(
            &mut session,
            &[
                (DraftField::EventType, "wedding"),
                (DraftField::Location(0), "Jaipur"),
                (DraftField::StartDate, "2025-12-01"),
                (DraftField::EndDate, "2025-12-03"),
            ],
        );
        session
    }

    fn fill_step2(session: &mut WizardSession) {
        edit(
            session,
            &[
                (DraftField::AdultsFixed, "50"),
                (DraftField::AdultsVariation, "5"),
                (DraftField::RoomsFixed, "20"),
                (DraftField::RoomsVariation, "2"),
                (DraftField::Email, "a@b.com"),
            ],
        );
    }

    fn quotes() -> SubmissionContext {
        SubmissionContext::new("Quotes", None)
    }

    #[tokio::test]
    async fn jaipur_wedding_scenario_reaches_confirmation() {
        let mut session = jaipur_wedding();
        session.advance().expect("step 1 gate passes");
        assert_eq!(session.state(), WizardState::Step2);
        assert_eq!(session.draft().days_count(), Some(2));

        fill_step2(&mut session);
        let dispatcher = InMemoryDispatcher::default();
        let outcome = session.submit(&dispatcher, quotes()).await.expect("submission");
        assert_eq!(outcome.to, WizardState::Confirmed);

        let delivered = dispatcher.delivered();
        let SubmissionRecord::Quote(record) = &delivered[0] else {
            panic!("expected a quote record");
        };
        assert_eq!(record.adults, "50 ± 5");
        assert_eq!(record.rooms_needed, "20 ± 2");
        assert_eq!(record.start_date, "12/1/2025");
        assert_eq!(record.end_date, "12/3/2025");
        assert_eq!(record.flexible_month, "");
        assert_eq!(record.ip, "unknown");
    }

    #[test]
    fn flexible_month_scenario_passes_step1_without_exact_dates() {
        let mut session = WizardSession::default();
        edit(
            &mut session,
            &[
                (DraftField::EventType, "conference"),
                (DraftField::Location(0), "Bengaluru"),
                (DraftField::DateMode, "flexible"),
            ],
        );
        let error = session.advance().expect_err("month missing");
        assert_eq!(error.to_string(), SELECT_MONTH);

        session.set_field(DraftField::FlexibleMonth, "2025-06").expect("month");
        session.advance().expect("step 1 gate passes");
        fill_step2(&mut session);

        let record = session.begin_submission(quotes()).expect("gate passes");
        let SubmissionRecord::Quote(record) = record else {
            panic!("expected a quote record");
        };
        assert_eq!(record.start_date, "");
        assert_eq!(record.end_date, "");
        assert_eq!(record.flexible_month, "2025-06");
    }

    #[test]
    fn gate_failure_keeps_step_and_fills_slot_until_field_edited() {
        let mut session = jaipur_wedding();
        session.set_field(DraftField::EndDate, "").expect("clear end date");

        let error = session.advance().expect_err("missing end date");
        assert!(matches!(
            error,
            DomainError::WizardTransition(WizardTransitionError::GateRejected { .. })
        ));
        assert_eq!(session.state(), WizardState::Step1);
        assert_eq!(session.error(ErrorSlot::Dates), Some(SELECT_DATE_RANGE));

        session.set_field(DraftField::Email, "x@y.org").expect("unrelated edit");
        assert_eq!(session.error(ErrorSlot::Dates), Some(SELECT_DATE_RANGE));

        session.set_field(DraftField::EndDate, "2025-12-05").expect("end date");
        assert_eq!(session.error(ErrorSlot::Dates), None);
    }

    #[tokio::test]
    async fn transport_failure_stays_on_step2_then_retry_confirms() {
        let mut session = jaipur_wedding();
        session.advance().expect("step 1");
        fill_step2(&mut session);

        let dispatcher = InMemoryDispatcher::default();
        dispatcher.fail_next(1);

        let failed = session.submit(&dispatcher, quotes()).await.expect("transition applies");
        assert_eq!(failed.to, WizardState::SubmissionFailed);
        assert_eq!(session.step(), WizardStep::Step2);
        assert_eq!(session.banner(), Some(SUBMISSION_FAILED));
        assert!(!session.banner().unwrap_or_default().is_empty());

        session.set_field(DraftField::AdditionalRequirements, "Ground floor").expect("editable");
        let retried = session.submit(&dispatcher, quotes()).await.expect("retry");
        assert_eq!(retried.to, WizardState::Confirmed);
        assert_eq!(session.banner(), None);
        assert_eq!(dispatcher.delivered().len(), 1);
    }

    #[test]
    fn draft_is_frozen_while_submitting_and_after_confirmation() {
        let mut session = jaipur_wedding();
        session.advance().expect("step 1");
        fill_step2(&mut session);
        session.begin_submission(quotes()).expect("submitting");
        assert!(session.is_submitting());

        let error = session.set_field(DraftField::Email, "late@edit.com").expect_err("frozen");
        assert!(matches!(
            error,
            DomainError::WizardTransition(WizardTransitionError::DraftFrozen { .. })
        ));
        assert!(session.begin_submission(quotes()).is_err(), "no double submit while in flight");

        session.complete_submission(&Ok(())).expect("confirmed");
        assert!(session.add_location().is_err());
        assert!(session.back().is_err());
    }

    #[tokio::test]
    async fn back_after_failed_send_clears_banner_and_keeps_draft() {
        let mut session = jaipur_wedding();
        session.advance().expect("step 1");
        fill_step2(&mut session);
        let dispatcher = InMemoryDispatcher::default();
        dispatcher.fail_next(1);
        session.submit(&dispatcher, quotes()).await.expect("transition applies");
        assert_eq!(session.banner(), Some(SUBMISSION_FAILED));

        session.back().expect("back from a failed send");
        assert_eq!(session.state(), WizardState::Step1);
        assert_eq!(session.banner(), None);
        assert_eq!(session.draft().email, "a@b.com");

        session.advance().expect("step 1 again");
        let outcome = session.submit(&dispatcher, quotes()).await.expect("resend");
        assert_eq!(outcome.to, WizardState::Confirmed);
    }

    #[tokio::test]
    async fn gated_retry_stays_failed_and_fills_the_slot() {
        let mut session = jaipur_wedding();
        session.advance().expect("step 1");
        fill_step2(&mut session);
        let dispatcher = InMemoryDispatcher::default();
        dispatcher.fail_next(1);
        session.submit(&dispatcher, quotes()).await.expect("transition applies");

        session.set_field(DraftField::RoomsFixed, "").expect("editable after failure");
        let error = session.submit(&dispatcher, quotes()).await.expect_err("gate blocks retry");
        assert!(matches!(
            error,
            DomainError::WizardTransition(WizardTransitionError::GateRejected { .. })
        ));
        assert_eq!(session.state(), WizardState::SubmissionFailed);
        assert_eq!(session.step(), WizardStep::Step2);
        assert_eq!(session.error(ErrorSlot::Rooms), Some(ENTER_ROOMS));
        assert!(!session.is_submitting());
        assert!(dispatcher.delivered().is_empty());
    }

    #[test]
    fn back_returns_to_step1_keeping_the_draft() {
        let mut session = jaipur_wedding();
        session.advance().expect("step 1");
        session.back().expect("back");
        assert_eq!(session.state(), WizardState::Step1);
        assert_eq!(session.draft().locations, vec!["Jaipur".to_string()]);
    }

    #[test]
    fn geolocated_ip_is_used_when_context_has_none() {
        let mut session = jaipur_wedding();
        session.set_geo(GeoInfo {
            ip: "198.51.100.4".to_string(),
            country_name: Some("India".to_string()),
            country_code: Some("IN".to_string()),
        });
        session.advance().expect("step 1");
        fill_step2(&mut session);

        let SubmissionRecord::Quote(record) = session.begin_submission(quotes()).expect("record")
        else {
            panic!("expected a quote record");
        };
        assert_eq!(record.ip, "198.51.100.4");
    }

    #[test]
    fn removing_the_last_location_is_a_guarded_no_op() {
        let mut session = WizardSession::default();
        assert!(!session.remove_location(0).expect("editable"));
        assert_eq!(session.draft().locations.len(), 1);

        let index = session.add_location().expect("add");
        assert_eq!(index, 1);
        assert!(session.remove_location(0).expect("remove"));
        assert_eq!(session.draft().locations.len(), 1);
    }

    #[test]
    fn idle_sessions_expire_after_ttl() {
        let session = WizardSession::new(SessionId::new());
        let later = Utc::now() + Duration::minutes(31);
        assert!(session.is_idle_longer_than(Duration::minutes(30), later));
        assert!(!session.is_idle_longer_than(Duration::minutes(30), Utc::now()));
    }
}
