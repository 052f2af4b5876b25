pub mod engine;
pub mod gate;
pub mod session;
pub mod states;
pub mod view;

pub use engine::{QuoteRequestFlow, WizardDefinition, WizardEngine, WizardTransitionError};
pub use gate::ValidationOutcome;
pub use session::{SessionId, WizardSession};
pub use states::{
    TransitionOutcome, WizardAction, WizardContext, WizardEvent, WizardState, WizardStep,
};
pub use view::{FieldKind, FieldView, SelectOption, StepView};
