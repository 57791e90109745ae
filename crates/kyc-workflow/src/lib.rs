//! KYC verification workflow.
//!
//! [`FlowController`] owns the session, mounts each step (camera feeds for
//! capture steps) and routes captures and selections to the backend and the
//! session.

pub mod capture;
pub mod flow;

pub use capture::{CaptureOutcome, StepState};
pub use flow::FlowController;
