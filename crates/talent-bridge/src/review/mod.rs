//! Admin status transitions for profiles and contact messages.

pub mod service;
pub mod transitions;

pub use service::{ReviewError, ReviewOutcome, ReviewService, CV_LINK_TTL};
pub use transitions::{contact_transition, review_transition, ContactAction, ReviewAction, TransitionError};
