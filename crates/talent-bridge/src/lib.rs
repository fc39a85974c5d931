//! Back office for the talent sponsorship platform: public submission forms,
//! the gated talent directory, and the admin dashboard with its review
//! workflow and CSV export.

pub mod config;
pub mod dashboard;
pub mod directory;
pub mod domain;
pub mod drafts;
pub mod error;
pub mod export;
pub mod forms;
pub mod remote;
pub mod review;
pub mod telemetry;
