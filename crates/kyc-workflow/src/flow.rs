//! Verification flow controller.
//!
//! Owns one [`VerificationSession`] at a time together with the state of the
//! mounted step. Camera feeds are held through [`CameraGuard`]s inside
//! [`StepState`], so leaving a step by any path (acceptance, rejection,
//! restart, or dropping the controller) stops the feed.
//!
//! Primary submissions (selfie, document sides, scan) gate advancement. The
//! secondary OCR request after an accepted document and the verification
//! summary after an accepted scan are best-effort: their failures are logged
//! (and, for the summary, kept as `session_error`) but never block the flow.

use crate::capture::{rejection_error, unsupported_error, CaptureOutcome, StepState};
use anyhow::Result;
use chrono::Utc;
use kyc_core::backend::{DocumentSide, Submission, VerificationBackend};
use kyc_core::reference::{CountryOption, DocumentOption, ReferenceData};
use kyc_core::report::{self, VerificationReport};
use kyc_core::scan::ScanMethod;
use kyc_core::session::{CaptureRecord, CaptureSlot, VerificationSession};
use kyc_core::steps::Step;
use kyc_error::{CaptureError, KycError, KycResult, StepError};
use kyc_hal::{Camera, CameraGuard, HandleRegistry};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

pub const DEFAULT_COMPLETION_DELAY: Duration = Duration::from_millis(3000);

/// A primary submission prepared from the current step before the frame is
/// recorded as processing.
enum Request {
    Selfie,
    Document {
        side: DocumentSide,
        country_code: String,
        document_type: String,
    },
    Scan(ScanMethod),
}

pub struct FlowController {
    camera: Arc<dyn Camera>,
    backend: Arc<dyn VerificationBackend>,
    reference: Arc<ReferenceData>,
    registry: HandleRegistry,
    session: VerificationSession,
    step_state: StepState,
    session_error: Option<String>,
    completed_at: Option<Instant>,
    completion_delay: Duration,
}

impl FlowController {
    /// Start a fresh session with the selfie step mounted.
    pub fn new(
        camera: Arc<dyn Camera>,
        backend: Arc<dyn VerificationBackend>,
        reference: Arc<ReferenceData>,
    ) -> Self {
        let mut controller = Self {
            camera,
            backend,
            reference,
            registry: HandleRegistry::new(),
            session: VerificationSession::new(),
            step_state: StepState::Idle,
            session_error: None,
            completed_at: None,
            completion_delay: DEFAULT_COMPLETION_DELAY,
        };
        controller.mount(Step::first());
        controller
    }

    pub fn with_completion_delay(mut self, delay: Duration) -> Self {
        self.completion_delay = delay;
        self
    }

    pub fn session(&self) -> &VerificationSession {
        &self.session
    }

    pub fn current_step(&self) -> Step {
        self.session.current_step()
    }

    pub fn step_state(&self) -> &StepState {
        &self.step_state
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    pub fn handles(&self) -> &HandleRegistry {
        &self.registry
    }

    /// Failure of the best-effort verification summary, if any.
    pub fn session_error(&self) -> Option<&str> {
        self.session_error.as_deref()
    }

    pub fn country_options(&self) -> Vec<CountryOption> {
        self.reference.countries()
    }

    /// Document types for the selected country; empty before a country is
    /// chosen.
    pub fn document_options(&self) -> Vec<DocumentOption> {
        self.session
            .selected_country_code()
            .map(|country| self.reference.document_options(country))
            .unwrap_or_default()
    }

    pub fn select_country(&mut self, code: &str) -> KycResult<Step> {
        self.expect_step(Step::CountrySelection)?;
        self.session.select_country(code, &self.reference)?;
        Ok(self.advance())
    }

    pub fn select_document_type(&mut self, document_type: &str) -> KycResult<Step> {
        self.expect_step(Step::DocumentTypeSelection)?;
        self.session
            .select_document_type(document_type, &self.reference)?;
        Ok(self.advance())
    }

    /// Take a frame from the live feed and submit it for the current step.
    ///
    /// Misuse (wrong step, unsupported scan) is an `Err`; camera, capture,
    /// validation and network problems are `Rejected` outcomes the user can
    /// retry.
    pub fn capture(&mut self) -> KycResult<CaptureOutcome> {
        let step = self.current_step();
        let slot = step.slot().ok_or(KycError::WrongStep)?;
        if let StepState::Unsupported(_) = self.step_state {
            return Err(self.unsupported());
        }
        let request = self.request_for(step)?;

        let bytes = match self.take_frame() {
            Ok(bytes) => bytes,
            Err(err) => {
                log::warn!("{:?}: capture failed: {}", step, err);
                let error = err.to_step_error();
                self.step_state = StepState::Rejected {
                    error: error.clone(),
                    frame: None,
                };
                return Ok(CaptureOutcome::Rejected(error));
            }
        };

        let record = CaptureRecord::new(bytes, &self.registry);
        self.session.begin_processing(slot);
        let submitted = self.submit(&request, record.bytes());
        // The feed is released whatever the verdict; retry re-acquires it.
        self.step_state = StepState::Idle;

        match submitted {
            Ok(Submission::Accepted { message, payload }) => {
                log::info!("{:?} accepted: {}", step, message);
                self.session.complete_processing(slot);
                self.accept(step, &request, slot, record, payload)?;
                Ok(CaptureOutcome::Advanced(self.advance()))
            }
            Ok(Submission::Rejected { message }) => {
                log::warn!("{:?} rejected: {}", step, message);
                self.session.fail_processing(slot);
                let error = rejection_error(step, self.session.scan_method(), &message);
                Ok(self.reject(error, record))
            }
            Err(err) => {
                log::warn!("{:?} submission failed: {}", step, err);
                self.session.fail_processing(slot);
                Ok(self.reject(err.to_step_error(), record))
            }
        }
    }

    /// Clear the step's frame and error and re-acquire the camera.
    pub fn retry(&mut self) -> KycResult<()> {
        let step = self.current_step();
        if !step.is_capture() {
            return Err(KycError::WrongStep);
        }
        if let StepState::Unsupported(_) = self.step_state {
            return Err(self.unsupported());
        }
        log::info!("{:?}: retry", step);
        self.mount(step);
        Ok(())
    }

    /// Discard the session (releasing every capture handle and the camera)
    /// and start over at the first step with a new verification id.
    pub fn restart(&mut self) {
        log::info!(
            "restarting verification {}",
            self.session.verification_id()
        );
        self.step_state = StepState::Idle;
        self.session = VerificationSession::new();
        self.session_error = None;
        self.completed_at = None;
        self.mount(Step::first());
    }

    /// Whether the completion placeholder has run its course.
    pub fn completion_ready(&self, now: Instant) -> bool {
        self.completed_at
            .map(|entered| now.saturating_duration_since(entered) >= self.completion_delay)
            .unwrap_or(false)
    }

    pub fn report(&self) -> VerificationReport {
        VerificationReport::from_session(&self.session, Utc::now())
    }

    /// Write the local report into `dir`; only available once complete.
    pub fn write_report(&self, dir: &Path) -> Result<PathBuf> {
        if self.current_step() != Step::Complete {
            return Err(KycError::WrongStep.into());
        }
        report::write_report(dir, &self.report())
    }

    fn expect_step(&self, step: Step) -> KycResult<()> {
        if self.current_step() == step {
            Ok(())
        } else {
            Err(KycError::WrongStep)
        }
    }

    fn unsupported(&self) -> KycError {
        KycError::UnsupportedConfiguration {
            country: self
                .session
                .selected_country_code()
                .unwrap_or_default()
                .to_string(),
            document_type: self
                .session
                .selected_document_type()
                .unwrap_or_default()
                .to_string(),
        }
    }

    fn request_for(&self, step: Step) -> KycResult<Request> {
        let selections = || -> KycResult<(String, String)> {
            let country = self.session.selected_country_code();
            let document = self.session.selected_document_type();
            match (country, document) {
                (Some(country), Some(document)) => Ok((country.to_string(), document.to_string())),
                _ => Err(KycError::WrongStep),
            }
        };
        match step {
            Step::Selfie => Ok(Request::Selfie),
            Step::DocumentFront | Step::DocumentBack => {
                let (country_code, document_type) = selections()?;
                let side = if step == Step::DocumentBack {
                    DocumentSide::Back
                } else {
                    DocumentSide::Front
                };
                Ok(Request::Document {
                    side,
                    country_code,
                    document_type,
                })
            }
            Step::Scanning => match self.session.scan_method() {
                Some(method) if method.is_supported() => Ok(Request::Scan(method)),
                _ => Err(self.unsupported()),
            },
            _ => Err(KycError::WrongStep),
        }
    }

    fn take_frame(&self) -> KycResult<Vec<u8>> {
        let StepState::Live(guard) = &self.step_state else {
            return Err(CaptureError::CameraUnavailable.into());
        };
        let camera = guard.camera();
        if !camera.is_streaming() {
            return Err(CaptureError::CameraUnavailable.into());
        }
        camera.capture_frame().ok_or_else(|| {
            CaptureError::FrameCaptureFailed("no frame available from the feed".to_string()).into()
        })
    }

    fn submit(&self, request: &Request, image: &[u8]) -> KycResult<Submission> {
        let id = self.session.verification_id();
        match request {
            Request::Selfie => self.backend.submit_selfie(id, image),
            Request::Document {
                side,
                country_code,
                document_type,
            } => self
                .backend
                .submit_document_image(id, *side, country_code, document_type, image),
            Request::Scan(method) => self.backend.submit_scan(id, *method, image),
        }
    }

    fn accept(
        &mut self,
        step: Step,
        request: &Request,
        slot: CaptureSlot,
        record: CaptureRecord,
        payload: Option<Value>,
    ) -> KycResult<()> {
        match request {
            Request::Selfie => self.session.store_capture(slot, record),
            Request::Document { side, .. } => {
                self.secondary_ocr(*side, record.bytes());
                self.session.store_capture(slot, record)
            }
            Request::Scan(method) => {
                let parsed = payload.unwrap_or(Value::Null);
                let text = serde_json::to_string_pretty(&parsed)?;
                log::debug!("{:?} {} payload: {} bytes", step, method, text.len());
                self.session.store_scan_payload(text);
                self.submit_summary();
                Ok(())
            }
        }
    }

    /// Non-gating OCR of an accepted document side.
    fn secondary_ocr(&self, side: DocumentSide, image: &[u8]) {
        let request_id = format!("ML_{}", Uuid::new_v4());
        match self.backend.submit_ocr(&request_id, image) {
            Ok(submission) if submission.is_accepted() => {
                log::info!("{} OCR {} accepted", side.as_str(), request_id);
            }
            Ok(submission) => {
                log::warn!(
                    "{} OCR {} rejected: {}",
                    side.as_str(),
                    request_id,
                    submission.message()
                );
            }
            Err(err) => log::warn!("{} OCR {} failed: {}", side.as_str(), request_id, err),
        }
    }

    /// Non-gating summary after the scan; failure is kept as session error.
    fn submit_summary(&mut self) {
        let summary = self.session.summary();
        self.session_error = match self.backend.submit_verification_summary(&summary) {
            Ok(Submission::Accepted { .. }) => None,
            Ok(Submission::Rejected { message }) => Some(message),
            Err(err) => Some(err.to_string()),
        };
        if let Some(ref error) = self.session_error {
            log::warn!(
                "verification summary for {} failed: {}",
                summary.verification_id,
                error
            );
        }
    }

    fn reject(&mut self, error: StepError, record: CaptureRecord) -> CaptureOutcome {
        self.step_state = StepState::Rejected {
            error: error.clone(),
            frame: Some(record),
        };
        CaptureOutcome::Rejected(error)
    }

    fn advance(&mut self) -> Step {
        let next = self.session.advance();
        self.mount(next);
        next
    }

    /// Enter `step`: drop whatever the previous step held, then acquire what
    /// this one needs.
    fn mount(&mut self, step: Step) {
        self.step_state = StepState::Idle;

        if step == Step::Complete {
            self.completed_at.get_or_insert_with(Instant::now);
            return;
        }
        let Some(facing) = step.facing() else {
            return;
        };
        if step == Step::Scanning
            && !self
                .session
                .scan_method()
                .map(|method| method.is_supported())
                .unwrap_or(false)
        {
            let country = self.session.selected_country_code().unwrap_or_default();
            let document = self.session.selected_document_type().unwrap_or_default();
            log::warn!("no scanner for {}/{}", country, document);
            self.step_state = StepState::Unsupported(unsupported_error(country, document));
            return;
        }

        self.step_state = match CameraGuard::acquire(Arc::clone(&self.camera), facing) {
            Ok(guard) => {
                log::debug!("{:?}: {} camera ready", step, facing);
                StepState::Live(guard)
            }
            Err(err) => {
                log::warn!("{:?}: camera unavailable: {}", step, err);
                StepState::CameraFailed(KycError::from(err).to_step_error())
            }
        };
    }
}
