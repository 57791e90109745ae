//! Verification session: the unit of work for one verification attempt.

use crate::backend::VerificationSummary;
use crate::reference::ReferenceData;
use crate::scan::{resolve_scan_method, ScanMethod};
use crate::steps::Step;
use chrono::{DateTime, Utc};
use kyc_error::{KycError, KycResult};
use kyc_hal::{HandleRegistry, ImageHandle};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Correlation key sent with every backend call for a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationId(String);

impl VerificationId {
    /// `KYC-<unix-ms>-<9 hex chars>`.
    pub fn generate() -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!(
            "KYC-{}-{}",
            Utc::now().timestamp_millis(),
            &suffix[..9]
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VerificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureSlot {
    Selfie,
    DocumentFront,
    DocumentBack,
    Scan,
}

impl CaptureSlot {
    pub fn all() -> &'static [CaptureSlot] {
        &[
            CaptureSlot::Selfie,
            CaptureSlot::DocumentFront,
            CaptureSlot::DocumentBack,
            CaptureSlot::Scan,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            CaptureSlot::Selfie => "Selfie",
            CaptureSlot::DocumentFront => "Document front",
            CaptureSlot::DocumentBack => "Document back",
            CaptureSlot::Scan => "MRZ / barcode scan",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessingStatus::Completed | ProcessingStatus::Failed)
    }

    fn can_become(&self, next: ProcessingStatus) -> bool {
        use ProcessingStatus as P;
        matches!(
            (self, next),
            (P::Pending | P::Failed | P::Completed, P::Processing)
                | (P::Processing, P::Completed)
                | (P::Processing, P::Failed)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingStatuses {
    pub selfie: ProcessingStatus,
    pub document_front: ProcessingStatus,
    pub document_back: ProcessingStatus,
    pub scan: ProcessingStatus,
}

impl Default for ProcessingStatuses {
    fn default() -> Self {
        Self {
            selfie: ProcessingStatus::Pending,
            document_front: ProcessingStatus::Pending,
            document_back: ProcessingStatus::Pending,
            scan: ProcessingStatus::Pending,
        }
    }
}

impl ProcessingStatuses {
    pub fn get(&self, slot: CaptureSlot) -> ProcessingStatus {
        match slot {
            CaptureSlot::Selfie => self.selfie,
            CaptureSlot::DocumentFront => self.document_front,
            CaptureSlot::DocumentBack => self.document_back,
            CaptureSlot::Scan => self.scan,
        }
    }

    fn slot_mut(&mut self, slot: CaptureSlot) -> &mut ProcessingStatus {
        match slot {
            CaptureSlot::Selfie => &mut self.selfie,
            CaptureSlot::DocumentFront => &mut self.document_front,
            CaptureSlot::DocumentBack => &mut self.document_back,
            CaptureSlot::Scan => &mut self.scan,
        }
    }

    /// Apply a transition; invalid transitions are logged and ignored.
    fn transition(&mut self, slot: CaptureSlot, next: ProcessingStatus) -> bool {
        let current = self.slot_mut(slot);
        if !current.can_become(next) {
            log::warn!(
                "ignoring {:?} status change {:?} -> {:?}",
                slot,
                current,
                next
            );
            return false;
        }
        *current = next;
        true
    }
}

/// A captured still with its display handle.
#[derive(Debug)]
pub struct CaptureRecord {
    bytes: Vec<u8>,
    handle: ImageHandle,
    captured_at: DateTime<Utc>,
}

impl CaptureRecord {
    pub fn new(bytes: Vec<u8>, registry: &HandleRegistry) -> Self {
        let handle = registry.register(bytes.len());
        Self {
            bytes,
            handle,
            captured_at: Utc::now(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn handle(&self) -> &ImageHandle {
        &self.handle
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}

#[derive(Debug)]
pub struct VerificationSession {
    verification_id: VerificationId,
    selected_country_code: Option<String>,
    selected_document_type: Option<String>,
    scan_method: Option<ScanMethod>,
    selfie: Option<CaptureRecord>,
    document_front: Option<CaptureRecord>,
    document_back: Option<CaptureRecord>,
    scan_payload: Option<String>,
    processing: ProcessingStatuses,
    current_step: Step,
    started_at: DateTime<Utc>,
}

impl Default for VerificationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl VerificationSession {
    pub fn new() -> Self {
        let verification_id = VerificationId::generate();
        log::info!("new verification session {}", verification_id);
        Self {
            verification_id,
            selected_country_code: None,
            selected_document_type: None,
            scan_method: None,
            selfie: None,
            document_front: None,
            document_back: None,
            scan_payload: None,
            processing: ProcessingStatuses::default(),
            current_step: Step::first(),
            started_at: Utc::now(),
        }
    }

    pub fn verification_id(&self) -> &VerificationId {
        &self.verification_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn selected_country_code(&self) -> Option<&str> {
        self.selected_country_code.as_deref()
    }

    pub fn selected_document_type(&self) -> Option<&str> {
        self.selected_document_type.as_deref()
    }

    /// `None` until both country and document type are selected.
    pub fn scan_method(&self) -> Option<ScanMethod> {
        self.scan_method
    }

    pub fn current_step(&self) -> Step {
        self.current_step
    }

    pub fn current_index(&self) -> usize {
        self.current_step.index()
    }

    pub fn processing(&self) -> &ProcessingStatuses {
        &self.processing
    }

    pub fn status(&self, slot: CaptureSlot) -> ProcessingStatus {
        self.processing.get(slot)
    }

    pub fn scan_payload(&self) -> Option<&str> {
        self.scan_payload.as_deref()
    }

    pub fn capture(&self, slot: CaptureSlot) -> Option<&CaptureRecord> {
        match slot {
            CaptureSlot::Selfie => self.selfie.as_ref(),
            CaptureSlot::DocumentFront => self.document_front.as_ref(),
            CaptureSlot::DocumentBack => self.document_back.as_ref(),
            CaptureSlot::Scan => None,
        }
    }

    pub fn has_artifact(&self, slot: CaptureSlot) -> bool {
        match slot {
            CaptureSlot::Scan => self.scan_payload.is_some(),
            _ => self.capture(slot).is_some(),
        }
    }

    pub fn select_country(&mut self, code: &str, reference: &ReferenceData) -> KycResult<()> {
        let code = code.trim();
        if !reference.has_country(code) {
            return Err(KycError::UnknownSelection {
                field: "country",
                value: code.to_string(),
            });
        }
        set_once(&mut self.selected_country_code, "country", code)?;
        self.refresh_scan_method(reference);
        Ok(())
    }

    pub fn select_document_type(
        &mut self,
        document_type: &str,
        reference: &ReferenceData,
    ) -> KycResult<()> {
        let document_type = document_type.trim();
        let country = self
            .selected_country_code
            .as_deref()
            .ok_or(KycError::WrongStep)?;
        if reference.find(country, document_type).is_none() {
            return Err(KycError::UnknownSelection {
                field: "document type",
                value: document_type.to_string(),
            });
        }
        set_once(
            &mut self.selected_document_type,
            "document type",
            document_type,
        )?;
        self.refresh_scan_method(reference);
        Ok(())
    }

    fn refresh_scan_method(&mut self, reference: &ReferenceData) {
        self.scan_method = match (
            self.selected_country_code.as_deref(),
            self.selected_document_type.as_deref(),
        ) {
            (Some(country), Some(doc)) => Some(resolve_scan_method(reference, country, doc)),
            _ => None,
        };
    }

    /// Move to the next step of the sequence and return it.
    pub fn advance(&mut self) -> Step {
        let next = self.current_step.next(self);
        if next != self.current_step {
            log::info!(
                "session {}: {:?} -> {:?}",
                self.verification_id,
                self.current_step,
                next
            );
        }
        self.current_step = next;
        next
    }

    pub fn begin_processing(&mut self, slot: CaptureSlot) -> bool {
        self.processing.transition(slot, ProcessingStatus::Processing)
    }

    pub fn complete_processing(&mut self, slot: CaptureSlot) -> bool {
        self.processing.transition(slot, ProcessingStatus::Completed)
    }

    pub fn fail_processing(&mut self, slot: CaptureSlot) -> bool {
        self.processing.transition(slot, ProcessingStatus::Failed)
    }

    /// Put an accepted image into its slot. A previous record is dropped,
    /// which releases its display handle.
    pub fn store_capture(&mut self, slot: CaptureSlot, record: CaptureRecord) -> KycResult<()> {
        let target = match slot {
            CaptureSlot::Selfie => &mut self.selfie,
            CaptureSlot::DocumentFront => &mut self.document_front,
            CaptureSlot::DocumentBack => &mut self.document_back,
            CaptureSlot::Scan => return Err(KycError::WrongStep),
        };
        if let Some(old) = target.replace(record) {
            log::debug!("replaced {:?} capture (handle {})", slot, old.handle().id());
        }
        Ok(())
    }

    pub fn store_scan_payload(&mut self, payload: String) {
        self.scan_payload = Some(payload);
    }

    /// What has been processed so far, for the final submission.
    pub fn summary(&self) -> VerificationSummary {
        VerificationSummary {
            verification_id: self.verification_id.to_string(),
            selfie_processed: self.has_artifact(CaptureSlot::Selfie),
            document_front_processed: self.has_artifact(CaptureSlot::DocumentFront),
            document_back_processed: self.has_artifact(CaptureSlot::DocumentBack),
            mrz_processed: self.has_artifact(CaptureSlot::Scan),
        }
    }
}

fn set_once(slot: &mut Option<String>, field: &'static str, value: &str) -> KycResult<()> {
    match slot {
        Some(existing) if existing.as_str() == value => Ok(()),
        Some(_) => Err(KycError::SelectionLocked { field }),
        None => {
            *slot = Some(value.to_string());
            Ok(())
        }
    }
}
