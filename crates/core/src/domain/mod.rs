pub mod contact;
pub mod draft;
pub mod event;
pub mod place;
pub mod schedule;
pub mod tolerance;
