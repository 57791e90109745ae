//! Shared fixtures for unit tests.

use crate::reference::{DocumentRecord, ReferenceData};

pub fn record(country: &str, doc: &str, alt: &str, symbology: &str) -> DocumentRecord {
    DocumentRecord {
        id: None,
        country_code: country.to_string(),
        country_name: format!("{} land", country),
        document_type: doc.to_string(),
        alternative_text: alt.to_string(),
        symbology: symbology.to_string(),
        date_format: None,
        is_live: 1,
        engine_language: None,
        is_country_european: None,
        version: None,
        tenant_name: None,
        server_key: None,
    }
}

/// US driving licence (barcode), XX passport (MRZ), YY id card with an
/// unclassified symbology.
pub fn sample_reference() -> ReferenceData {
    ReferenceData::new(vec![
        record("US", "DL", "Driver License", "PDF417"),
        record("US", "PP", "Passport", "TD3"),
        record("XX", "PP", "Passport", "TD3"),
        record("YY", "NI", "Identity Card", "OCR-B"),
    ])
    .expect("sample reference data is valid")
}
