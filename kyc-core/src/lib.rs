//! KYC wizard core library.
//!
//! `kyc-core` holds the session model, step sequence, reference data, scan
//! method resolution and the verification backend used by the flow
//! controller, the TUI and the binary.

pub mod backend;
pub mod cli;
pub mod config;
pub mod logging;
pub mod reference;
pub mod report;
pub mod scan;
pub mod session;
pub mod steps;

#[cfg(test)]
mod test_support;
