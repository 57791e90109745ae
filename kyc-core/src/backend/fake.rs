//! Fake backend for tests and offline runs.
//!
//! Each operation has a queue of scripted replies; an empty queue accepts.
//! Every call is recorded so tests can assert on what was sent.

use super::{DocumentSide, Submission, VerificationBackend, VerificationSummary};
use crate::scan::ScanMethod;
use crate::session::VerificationId;
use kyc_error::{KycError, KycResult};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendOp {
    Selfie,
    Document,
    Ocr,
    Scan,
    Summary,
    Status,
}

/// Call records for verification in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Selfie {
        verification_id: String,
        bytes: usize,
    },
    Document {
        verification_id: String,
        side: DocumentSide,
        country_code: String,
        document_type: String,
    },
    Ocr {
        request_id: String,
    },
    Scan {
        verification_id: String,
        method: ScanMethod,
    },
    Summary(VerificationSummary),
    Status {
        verification_id: String,
    },
}

impl BackendCall {
    pub fn op(&self) -> BackendOp {
        match self {
            BackendCall::Selfie { .. } => BackendOp::Selfie,
            BackendCall::Document { .. } => BackendOp::Document,
            BackendCall::Ocr { .. } => BackendOp::Ocr,
            BackendCall::Scan { .. } => BackendOp::Scan,
            BackendCall::Summary(_) => BackendOp::Summary,
            BackendCall::Status { .. } => BackendOp::Status,
        }
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Submission(Submission),
    NetworkError(String),
}

#[derive(Debug, Default)]
struct FakeBackendState {
    calls: Vec<BackendCall>,
    replies: HashMap<BackendOp, VecDeque<Reply>>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeBackendState>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeBackendState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue the reply for the next `op` call.
    pub fn respond(&self, op: BackendOp, submission: Submission) -> &Self {
        self.push(op, Reply::Submission(submission))
    }

    /// Queue a transport failure for the next `op` call.
    pub fn fail_network(&self, op: BackendOp, message: &str) -> &Self {
        self.push(op, Reply::NetworkError(message.to_string()))
    }

    fn push(&self, op: BackendOp, reply: Reply) -> &Self {
        self.state().replies.entry(op).or_default().push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.state().calls.clone()
    }

    pub fn calls_for(&self, op: BackendOp) -> Vec<BackendCall> {
        self.state()
            .calls
            .iter()
            .filter(|call| call.op() == op)
            .cloned()
            .collect()
    }

    pub fn call_count(&self, op: BackendOp) -> usize {
        self.calls_for(op).len()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    fn record(&self, call: BackendCall) -> KycResult<Submission> {
        let op = call.op();
        let mut state = self.state();
        state.calls.push(call);
        let reply = state.replies.get_mut(&op).and_then(VecDeque::pop_front);
        match reply {
            Some(Reply::Submission(submission)) => Ok(submission),
            Some(Reply::NetworkError(message)) => Err(KycError::Network(message)),
            None => Ok(default_reply(op)),
        }
    }
}

fn default_reply(op: BackendOp) -> Submission {
    match op {
        BackendOp::Selfie => Submission::accepted("Face verified."),
        BackendOp::Document => Submission::accepted("CLEAR IMAGE"),
        BackendOp::Scan => Submission::Accepted {
            message: "Scan successful.".to_string(),
            payload: Some(json!({ "document_number": "FAKE0000" })),
        },
        BackendOp::Ocr | BackendOp::Summary | BackendOp::Status => Submission::accepted("OK"),
    }
}

impl VerificationBackend for FakeBackend {
    fn submit_selfie(&self, id: &VerificationId, image: &[u8]) -> KycResult<Submission> {
        self.record(BackendCall::Selfie {
            verification_id: id.to_string(),
            bytes: image.len(),
        })
    }

    fn submit_document_image(
        &self,
        id: &VerificationId,
        side: DocumentSide,
        country_code: &str,
        document_type: &str,
        _image: &[u8],
    ) -> KycResult<Submission> {
        self.record(BackendCall::Document {
            verification_id: id.to_string(),
            side,
            country_code: country_code.to_string(),
            document_type: document_type.to_string(),
        })
    }

    fn submit_ocr(&self, request_id: &str, _image: &[u8]) -> KycResult<Submission> {
        self.record(BackendCall::Ocr {
            request_id: request_id.to_string(),
        })
    }

    fn submit_scan(
        &self,
        id: &VerificationId,
        method: ScanMethod,
        _image: &[u8],
    ) -> KycResult<Submission> {
        self.record(BackendCall::Scan {
            verification_id: id.to_string(),
            method,
        })
    }

    fn submit_verification_summary(
        &self,
        summary: &VerificationSummary,
    ) -> KycResult<Submission> {
        self.record(BackendCall::Summary(summary.clone()))
    }

    fn verification_status(&self, verification_id: &str) -> KycResult<Submission> {
        self.record(BackendCall::Status {
            verification_id: verification_id.to_string(),
        })
    }
}
