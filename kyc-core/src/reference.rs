//! Country / document-type reference table.
//!
//! Loaded once at startup and queried read-only. Records use the metadata
//! schema published by the verification backend, so an exported table can be
//! dropped in with `--reference-data`.

use anyhow::{Context, Result};
use kyc_error::{KycError, KycResult};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

static BUILTIN: Lazy<ReferenceData> = Lazy::new(|| {
    let table = include_str!("../data/reference.json");
    ReferenceData::from_json_str(table).unwrap_or_else(|err| {
        log::error!("built-in reference data is invalid: {}", err);
        ReferenceData::default()
    })
});

/// Display labels for well-known document type codes.
const TYPE_LABELS: &[(&str, &str)] = &[
    ("PP", "Passport"),
    ("DL", "Driving License"),
    ("NI", "National ID"),
    ("AADHAAR", "Aadhaar"),
];

fn default_live() -> u8 {
    1
}

/// Case-insensitive code comparison.
pub(crate) fn same_code(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    #[serde(default)]
    pub id: Option<u64>,
    pub country_code: String,
    #[serde(default, rename = "country", alias = "country_name")]
    pub country_name: String,
    #[serde(rename = "type", alias = "document_type")]
    pub document_type: String,
    #[serde(default, alias = "alternative_label")]
    pub alternative_text: String,
    /// Machine-readable format printed on the document (e.g. `TD3`, `PDF417`).
    #[serde(default, rename = "barcode", alias = "scan_symbology")]
    pub symbology: String,
    #[serde(default)]
    pub date_format: Option<String>,
    #[serde(default = "default_live")]
    pub is_live: u8,
    #[serde(default)]
    pub engine_language: Option<u32>,
    #[serde(default)]
    pub is_country_european: Option<u8>,
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default)]
    pub tenant_name: Option<String>,
    #[serde(default)]
    pub server_key: Option<String>,
}

impl DocumentRecord {
    pub fn is_live(&self) -> bool {
        self.is_live != 0
    }

    /// Whether `document_type` names this record by code or by label.
    pub fn matches_type(&self, document_type: &str) -> bool {
        same_code(&self.document_type, document_type)
            || same_code(&self.alternative_text, document_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryOption {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    records: Vec<DocumentRecord>,
}

impl ReferenceData {
    /// The table compiled into the binary.
    pub fn builtin() -> &'static ReferenceData {
        &BUILTIN
    }

    pub fn new(records: Vec<DocumentRecord>) -> KycResult<Self> {
        for (idx, record) in records.iter().enumerate() {
            if record.country_code.trim().is_empty() {
                return Err(KycError::ReferenceData(format!(
                    "record {} has an empty country_code",
                    idx
                )));
            }
            if record.document_type.trim().is_empty() && record.alternative_text.trim().is_empty()
            {
                return Err(KycError::ReferenceData(format!(
                    "record {} ({}) has neither type nor alternative_text",
                    idx, record.country_code
                )));
            }
        }
        Ok(Self { records })
    }

    pub fn from_json_str(json: &str) -> KycResult<Self> {
        let records: Vec<DocumentRecord> = serde_json::from_str(json)?;
        Self::new(records)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read reference data: {}", path.display()))?;
        let data = Self::from_json_str(&content)
            .with_context(|| format!("Failed to parse reference data: {}", path.display()))?;
        log::info!(
            "Loaded {} reference records from {}",
            data.records.len(),
            path.display()
        );
        Ok(data)
    }

    pub fn records(&self) -> &[DocumentRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Selectable countries, unique by code and sorted by display name.
    pub fn countries(&self) -> Vec<CountryOption> {
        let mut countries: Vec<CountryOption> = Vec::new();
        for record in self.records.iter().filter(|r| r.is_live()) {
            if countries.iter().any(|c| c.code == record.country_code) {
                continue;
            }
            let name = if record.country_name.trim().is_empty() {
                record.country_code.clone()
            } else {
                record.country_name.clone()
            };
            countries.push(CountryOption {
                code: record.country_code.clone(),
                name,
            });
        }
        countries.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.code.cmp(&b.code)));
        countries
    }

    pub fn has_country(&self, country_code: &str) -> bool {
        self.records.iter().any(|r| r.country_code == country_code)
    }

    /// Document types offered for `country_code`.
    ///
    /// Options are deduplicated by lower-cased value: the first occurrence
    /// fixes the position, the last one wins the label.
    pub fn document_options(&self, country_code: &str) -> Vec<DocumentOption> {
        let mut options: Vec<DocumentOption> = Vec::new();
        for record in self
            .records
            .iter()
            .filter(|r| r.is_live() && r.country_code == country_code)
        {
            let value = if record.document_type.is_empty() {
                record.alternative_text.clone()
            } else {
                record.document_type.clone()
            };
            let label = type_label(&value)
                .map(str::to_string)
                .or_else(|| {
                    (!record.alternative_text.is_empty()).then(|| record.alternative_text.clone())
                })
                .unwrap_or_else(|| value.clone());

            let option = DocumentOption { value, label };
            match options.iter_mut().find(|o| same_code(&o.value, &option.value)) {
                Some(existing) => *existing = option,
                None => options.push(option),
            }
        }
        options
    }

    /// First record for `country_code` whose type or alternative text matches
    /// `document_type` case-insensitively.
    pub fn find(&self, country_code: &str, document_type: &str) -> Option<&DocumentRecord> {
        self.records
            .iter()
            .find(|r| r.country_code == country_code && r.matches_type(document_type))
    }
}

pub fn type_label(code: &str) -> Option<&'static str> {
    let upper = code.to_uppercase();
    TYPE_LABELS
        .iter()
        .find(|(known, _)| *known == upper)
        .map(|(_, label)| *label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record;

    #[test]
    fn builtin_table_parses() {
        let data = ReferenceData::builtin();
        assert!(!data.is_empty());
        assert!(data.find("US", "dl").is_some());
    }

    #[test]
    fn parses_backend_metadata_schema() {
        let json = r#"[{"id": 7, "barcode": "TD3", "country": "Utopia", "country_code": "UT",
            "type": "PP", "alternative_text": "Passport", "is_live": 1, "server_key": "k"}]"#;
        let data = ReferenceData::from_json_str(json).unwrap();
        let rec = &data.records()[0];
        assert_eq!(rec.symbology, "TD3");
        assert_eq!(rec.country_name, "Utopia");
        assert_eq!(rec.server_key.as_deref(), Some("k"));
    }

    #[test]
    fn accepts_portable_field_names() {
        let json = r#"[{"country_code": "UT", "country_name": "Utopia", "document_type": "DL",
            "alternative_label": "Licence", "scan_symbology": "PDF417"}]"#;
        let data = ReferenceData::from_json_str(json).unwrap();
        let rec = data.find("UT", "licence").unwrap();
        assert_eq!(rec.symbology, "PDF417");
        assert!(rec.is_live());
    }

    #[test]
    fn rejects_record_without_country() {
        let json = r#"[{"country_code": " ", "type": "PP"}]"#;
        assert!(matches!(
            ReferenceData::from_json_str(json),
            Err(KycError::ReferenceData(_))
        ));
    }

    #[test]
    fn countries_are_unique_and_sorted() {
        let data = ReferenceData::new(vec![
            record("ZZ", "PP", "Passport", "TD3"),
            record("AA", "DL", "Licence", "PDF417"),
            record("ZZ", "DL", "Licence", "PDF417"),
        ])
        .unwrap();
        let codes: Vec<_> = data.countries().into_iter().map(|c| c.code).collect();
        assert_eq!(codes, vec!["AA", "ZZ"]);
    }

    #[test]
    fn document_options_dedupe_and_label() {
        let data = ReferenceData::new(vec![
            record("US", "DL", "Driver License", "PDF417"),
            record("US", "pp", "Passport Book", "TD3"),
            record("US", "PP", "Passport", "TD3"),
            record("US", "XYZ", "Special Permit", "QR F"),
            record("CA", "DL", "Licence", "PDF417"),
        ])
        .unwrap();

        let options = data.document_options("US");
        assert_eq!(
            options,
            vec![
                DocumentOption {
                    value: "DL".into(),
                    label: "Driving License".into()
                },
                DocumentOption {
                    value: "PP".into(),
                    label: "Passport".into()
                },
                DocumentOption {
                    value: "XYZ".into(),
                    label: "Special Permit".into()
                },
            ]
        );
    }

    #[test]
    fn non_live_records_are_hidden_but_resolvable() {
        let mut hidden = record("US", "HC", "Health Card", "ITF B");
        hidden.is_live = 0;
        let data = ReferenceData::new(vec![record("US", "DL", "", "PDF417"), hidden]).unwrap();
        assert_eq!(data.document_options("US").len(), 1);
        assert!(data.find("US", "HC").is_some());
    }

    #[test]
    fn find_matches_alternative_text_case_insensitively() {
        let data = ReferenceData::new(vec![record("IN", "AADHAAR", "Aadhaar Card", "QR AADHAAR")])
            .unwrap();
        assert!(data.find("IN", "aadhaar card").is_some());
        assert!(data.find("in", "AADHAAR").is_none());
    }
}
