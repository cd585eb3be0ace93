//! Registration workflow for the Amotekun Corps recruitment portal.
//!
//! The crate owns the applicant draft, its validation rules, the review and
//! confirmation state machine, and the client side of the registration API
//! that turns a confirmed draft into a downloadable registration slip.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
