use thiserror::Error;

use crate::domain::draft::ErrorSlot;
use crate::wizard::gate::ValidationOutcome;
use crate::wizard::states::{
    TransitionOutcome, WizardAction, WizardContext, WizardEvent, WizardState, WizardStep,
};

pub trait WizardDefinition {
    fn name(&self) -> &'static str;
    fn initial_state(&self) -> WizardState;
    fn transition(
        &self,
        current: &WizardState,
        event: &WizardEvent,
        context: &WizardContext,
    ) -> Result<TransitionOutcome, WizardTransitionError>;
}

/// The two-step quote request: event, location and dates first, then
/// headcount, rooms and contact details.
#[derive(Clone, Debug, Default)]
pub struct QuoteRequestFlow;

impl WizardDefinition for QuoteRequestFlow {
    fn name(&self) -> &'static str {
        "quote_request"
    }

    fn initial_state(&self) -> WizardState {
        WizardState::Step1
    }

    fn transition(
        &self,
        current: &WizardState,
        event: &WizardEvent,
        context: &WizardContext,
    ) -> Result<TransitionOutcome, WizardTransitionError> {
        transition_quote_request(current, event, context)
    }
}

pub struct WizardEngine<F> {
    flow: F,
}

impl<F> WizardEngine<F>
where
    F: WizardDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn name(&self) -> &'static str {
        self.flow.name()
    }

    pub fn initial_state(&self) -> WizardState {
        self.flow.initial_state()
    }

    pub fn apply(
        &self,
        current: &WizardState,
        event: &WizardEvent,
        context: &WizardContext,
    ) -> Result<TransitionOutcome, WizardTransitionError> {
        self.flow.transition(current, event, context)
    }
}

impl Default for WizardEngine<QuoteRequestFlow> {
    fn default() -> Self {
        Self::new(QuoteRequestFlow)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WizardTransitionError {
    #[error("{message}")]
    GateRejected { state: WizardState, slot: ErrorSlot, message: String },
    #[error("invalid transition from {state:?} using event {event:?}")]
    InvalidTransition { state: WizardState, event: WizardEvent },
    #[error("the draft cannot be edited while {state:?}")]
    DraftFrozen { state: WizardState },
}

fn transition_quote_request(
    current: &WizardState,
    event: &WizardEvent,
    context: &WizardContext,
) -> Result<TransitionOutcome, WizardTransitionError> {
    use WizardAction::{
        ClearErrors, DispatchSubmission, RenderStep, ShowConfirmation, ShowSubmissionError,
    };
    use WizardEvent::{Advance, Back, Submit, TransportFailed, TransportSucceeded};
    use WizardState::{Confirmed, Step1, Step2, SubmissionFailed, Submitting};

    let (to, actions) = match (current, event) {
        (Step1, Advance) => {
            require_gate(current, context)?;
            (Step2, vec![ClearErrors, RenderStep(WizardStep::Step2)])
        }
        (Step2, Back) => (Step1, vec![RenderStep(WizardStep::Step1)]),
        // Leaving a failed send drops its banner.
        (SubmissionFailed, Back) => (Step1, vec![ClearErrors, RenderStep(WizardStep::Step1)]),
        (Step2, Submit) | (SubmissionFailed, Submit) => {
            require_gate(current, context)?;
            (Submitting, vec![ClearErrors, DispatchSubmission])
        }
        (Submitting, TransportSucceeded) => (Confirmed, vec![ShowConfirmation]),
        (Submitting, TransportFailed) => (SubmissionFailed, vec![ShowSubmissionError]),
        _ => {
            return Err(WizardTransitionError::InvalidTransition {
                state: *current,
                event: *event,
            });
        }
    };

    Ok(TransitionOutcome { from: *current, to, event: *event, actions })
}

fn require_gate(
    current: &WizardState,
    context: &WizardContext,
) -> Result<(), WizardTransitionError> {
    match &context.gate {
        ValidationOutcome::Advance => Ok(()),
        ValidationOutcome::Rejected { slot, message } => {
            Err(WizardTransitionError::GateRejected {
                state: *current,
                slot: *slot,
                message: message.clone(),
            })
        }
    }
}
