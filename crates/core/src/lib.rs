pub mod config;
pub mod counters;
pub mod domain;
pub mod errors;
pub mod routes;
pub mod submission;
pub mod wizard;

pub use counters::{CounterService, CounterSnapshot};
pub use domain::contact::ContactMessage;
pub use domain::draft::{DraftField, ErrorSlot, SubmissionDraft};
pub use domain::event::EventCategory;
pub use domain::place::{GeoInfo, PlaceSuggestion};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use routes::Route;
pub use submission::{Dispatcher, SubmissionContext, SubmissionRecord, TransportError};
pub use wizard::{SessionId, StepView, WizardSession, WizardState};
