//! Scan-method resolution.
//!
//! Maps a document's symbology onto the scanner the Scanning step must run.
//! Pure and deterministic: the same inputs always give the same method.

use crate::reference::ReferenceData;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Machine-readable-zone layouts.
pub const MRZ_SYMBOLOGIES: &[&str] = &[
    "TD1", "TD2", "TD3", "TD1 F", "TD2 F", "TD2 B", "TD3 B", "TD3 F",
];

/// 1D/2D barcode formats.
pub const BARCODE_SYMBOLOGIES: &[&str] = &[
    "PDF417",
    "PDF417 B",
    "PDF417 F",
    "QR B",
    "QR F",
    "QR AADHAAR",
    "ITF B",
    "ITF F",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMethod {
    Mrz,
    Barcode,
    Unsupported,
}

impl ScanMethod {
    pub fn is_supported(&self) -> bool {
        !matches!(self, ScanMethod::Unsupported)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScanMethod::Mrz => "MRZ",
            ScanMethod::Barcode => "Barcode",
            ScanMethod::Unsupported => "Unsupported",
        }
    }

    /// Value of the backend's `type_data` field for this scanner.
    pub fn wire_name(&self) -> Option<&'static str> {
        match self {
            ScanMethod::Mrz => Some("mrz"),
            ScanMethod::Barcode => Some("barcode"),
            ScanMethod::Unsupported => None,
        }
    }
}

impl fmt::Display for ScanMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn classify_symbology(symbology: &str) -> ScanMethod {
    let normalized = symbology.trim().to_uppercase();
    if MRZ_SYMBOLOGIES.contains(&normalized.as_str()) {
        ScanMethod::Mrz
    } else if BARCODE_SYMBOLOGIES.contains(&normalized.as_str()) {
        ScanMethod::Barcode
    } else {
        ScanMethod::Unsupported
    }
}

pub fn resolve_scan_method(
    reference: &ReferenceData,
    country_code: &str,
    document_type: &str,
) -> ScanMethod {
    match reference.find(country_code, document_type) {
        Some(record) => {
            let method = classify_symbology(&record.symbology);
            log::debug!(
                "scan method for {}/{}: {} (symbology {:?})",
                country_code,
                document_type,
                method,
                record.symbology
            );
            method
        }
        None => {
            log::debug!(
                "no reference record for {}/{}; scanning unsupported",
                country_code,
                document_type
            );
            ScanMethod::Unsupported
        }
    }
}
