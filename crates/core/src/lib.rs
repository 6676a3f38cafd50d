//! Shared vocabulary for the job-application tracker.
//!
//! Types, error taxonomy and well-known constants used by both the
//! notification relay (`jobtrack-events`) and the HTTP process
//! (`jobtrack-api`).

pub mod error;
pub mod notification_types;
pub mod status;
pub mod types;
