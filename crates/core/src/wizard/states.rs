use serde::{Deserialize, Serialize};

use crate::wizard::gate::ValidationOutcome;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Step1,
    Step2,
}

impl WizardStep {
    pub fn number(&self) -> u8 {
        match self {
            Self::Step1 => 1,
            Self::Step2 => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardState {
    Step1,
    Step2,
    Submitting,
    Confirmed,
    SubmissionFailed,
}

impl WizardState {
    /// The form step on screen; submission states keep showing step 2.
    pub fn step(&self) -> WizardStep {
        match self {
            Self::Step1 => WizardStep::Step1,
            Self::Step2 | Self::Submitting | Self::Confirmed | Self::SubmissionFailed => {
                WizardStep::Step2
            }
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardEvent {
    Advance,
    Back,
    Submit,
    TransportSucceeded,
    TransportFailed,
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct WizardContext {
    pub gate: ValidationOutcome,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardAction {
    ClearErrors,
    RenderStep(WizardStep),
    DispatchSubmission,
    ShowConfirmation,
    ShowSubmissionError,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: WizardState,
    pub to: WizardState,
    pub event: WizardEvent,
    pub actions: Vec<WizardAction>,
}
