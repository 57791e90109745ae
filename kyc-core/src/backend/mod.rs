//! Verification backend interface.
//!
//! Capture steps talk to the backend only through [`VerificationBackend`].
//! Every call returns a tagged [`Submission`]; transport and HTTP failures
//! come back as `KycError::Network`. Interpreting raw response bodies is the
//! job of [`adapter`] alone.

pub mod adapter;
pub mod fake;
pub mod http;

pub use fake::{BackendCall, BackendOp, FakeBackend};
pub use http::HttpBackend;

use crate::scan::ScanMethod;
use crate::session::VerificationId;
use kyc_error::KycResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentSide {
    Front,
    Back,
}

impl DocumentSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentSide::Front => "document-front",
            DocumentSide::Back => "document-back",
        }
    }

    pub fn is_back(&self) -> bool {
        matches!(self, DocumentSide::Back)
    }
}

/// Outcome of a backend call that reached the service.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// The content is usable. `payload` carries structured data where the
    /// endpoint returns any (e.g. parsed MRZ fields).
    Accepted {
        message: String,
        payload: Option<Value>,
    },
    /// The service judged the content unusable (blurry, fake, unreadable).
    Rejected { message: String },
}

impl Submission {
    pub fn accepted(message: impl Into<String>) -> Self {
        Submission::Accepted {
            message: message.into(),
            payload: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Submission::Rejected {
            message: message.into(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Submission::Accepted { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Submission::Accepted { message, .. } | Submission::Rejected { message } => message,
        }
    }
}

/// Which artifacts a session produced, sent once scanning succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationSummary {
    pub verification_id: String,
    pub selfie_processed: bool,
    pub document_front_processed: bool,
    pub document_back_processed: bool,
    pub mrz_processed: bool,
}

pub trait VerificationBackend: Send + Sync {
    /// Liveness check on a selfie.
    fn submit_selfie(&self, id: &VerificationId, image: &[u8]) -> KycResult<Submission>;

    /// Image-quality check on one side of a document.
    fn submit_document_image(
        &self,
        id: &VerificationId,
        side: DocumentSide,
        country_code: &str,
        document_type: &str,
        image: &[u8],
    ) -> KycResult<Submission>;

    /// Text extraction from an already accepted document image.
    fn submit_ocr(&self, request_id: &str, image: &[u8]) -> KycResult<Submission>;

    /// MRZ or barcode parsing.
    fn submit_scan(
        &self,
        id: &VerificationId,
        method: ScanMethod,
        image: &[u8],
    ) -> KycResult<Submission>;

    fn submit_verification_summary(&self, summary: &VerificationSummary)
        -> KycResult<Submission>;

    fn verification_status(&self, verification_id: &str) -> KycResult<Submission>;
}
