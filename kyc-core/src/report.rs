//! Local verification report export.
//!
//! A JSON file named after the verification id recording which artifacts the
//! session holds. Nothing is sent to the backend.

use crate::session::{CaptureSlot, VerificationSession};
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub verification_id: String,
    pub timestamp: String,
    pub status: String,
    pub documents: ReportDocuments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocuments {
    pub selfie: bool,
    pub document_front: bool,
    pub document_back: bool,
    pub mrz_scan: bool,
}

impl VerificationReport {
    pub fn from_session(session: &VerificationSession, at: DateTime<Utc>) -> Self {
        Self {
            verification_id: session.verification_id().to_string(),
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            status: "completed".to_string(),
            documents: ReportDocuments {
                selfie: session.has_artifact(CaptureSlot::Selfie),
                document_front: session.has_artifact(CaptureSlot::DocumentFront),
                document_back: session.has_artifact(CaptureSlot::DocumentBack),
                mrz_scan: session.has_artifact(CaptureSlot::Scan),
            },
        }
    }

    pub fn file_name(&self) -> String {
        report_file_name(&self.verification_id)
    }
}

pub fn report_file_name(verification_id: &str) -> String {
    format!("kyc-verification-{}.json", verification_id)
}

/// Write the report into `dir` via a temp file and rename; returns the final
/// path.
pub fn write_report(dir: &Path, report: &VerificationReport) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create report directory: {}", dir.display()))?;

    let path = dir.join(report.file_name());
    let tmp_path = dir.join(format!("{}.tmp", report.file_name()));
    let payload = serde_json::to_string_pretty(report).context("Failed to serialize report")?;

    let written = (|| -> Result<()> {
        let mut file = File::create(&tmp_path)
            .with_context(|| format!("Failed to create temp report: {}", tmp_path.display()))?;
        file.write_all(payload.as_bytes())
            .context("Failed to write report")?;
        file.sync_all().context("Failed to flush report")?;
        fs::rename(&tmp_path, &path)
            .with_context(|| format!("Failed to move report into place: {}", path.display()))
    })();
    if let Err(err) = written {
        fs::remove_file(&tmp_path).ok();
        return Err(err);
    }
    log::info!("verification report written to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_reference;
    use kyc_hal::HandleRegistry;
    use crate::session::CaptureRecord;
    use tempfile::tempdir;

    #[test]
    fn report_reflects_captured_slots() {
        let registry = HandleRegistry::new();
        let mut session = VerificationSession::new();
        session
            .store_capture(
                CaptureSlot::Selfie,
                CaptureRecord::new(vec![1, 2], &registry),
            )
            .unwrap();
        let report = VerificationReport::from_session(&session, Utc::now());
        assert_eq!(report.status, "completed");
        assert!(report.documents.selfie);
        assert!(!report.documents.document_front);
        assert!(!report.documents.mrz_scan);
    }

    #[test]
    fn writes_named_json_file() {
        let dir = tempdir().unwrap();
        let reference = sample_reference();
        let mut session = VerificationSession::new();
        session.select_country("XX", &reference).unwrap();
        session.store_scan_payload("{}".to_string());

        let report = VerificationReport::from_session(&session, Utc::now());
        let path = write_report(dir.path(), &report).unwrap();

        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some(report_file_name(session.verification_id().as_str()).as_str())
        );
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["verificationId"], session.verification_id().as_str());
        assert_eq!(raw["documents"]["mrzScan"], true);
        assert_eq!(raw["documents"]["documentBack"], false);
        assert!(!dir.path().join(format!("{}.tmp", report.file_name())).exists());
    }

    #[test]
    fn failed_rename_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let session = VerificationSession::new();
        let report = VerificationReport::from_session(&session, Utc::now());
        // A non-empty directory where the report should land blocks the rename.
        let blocker = dir.path().join(report.file_name());
        fs::create_dir(&blocker).unwrap();
        fs::write(blocker.join("keep"), b"x").unwrap();

        let err = write_report(dir.path(), &report).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to move report into place"));
        assert!(!dir.path().join(format!("{}.tmp", report.file_name())).exists());
        assert!(blocker.is_dir());
    }
}
