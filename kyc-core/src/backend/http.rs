//! Blocking HTTP client for the verification service.

use super::adapter;
use super::{DocumentSide, Submission, VerificationBackend, VerificationSummary};
use crate::config::BackendConfig;
use crate::scan::ScanMethod;
use crate::session::VerificationId;
use anyhow::Context;
use kyc_error::{KycError, KycResult};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use url::Url;

const LIVENESS_PATH: &str = "ocr/liveness";
const DOCUMENT_PATH: &str = "bq/image_request";
const OCR_PATH: &str = "ocr/document";
const SCAN_PATH: &str = "3/getparces";
const SUBMIT_PATH: &str = "kyc/submit-verification";

/// OCR engine language index the service expects for Latin scripts.
const DEFAULT_ENGINE_LANGUAGE: &str = "1";

fn network(err: impl std::fmt::Display) -> KycError {
    KycError::Network(err.to_string())
}

fn image_part(image: &[u8], file_name: String) -> KycResult<Part> {
    Part::bytes(image.to_vec())
        .file_name(file_name)
        .mime_str("image/jpeg")
        .map_err(network)
}

pub struct HttpBackend {
    client: Client,
    base_url: Url,
    config: BackendConfig,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> anyhow::Result<Self> {
        let base_url = config.base_url()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("kyc-wizard")
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url,
            config: config.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> KycResult<Url> {
        self.base_url.join(path).map_err(network)
    }

    /// Sends the request and returns the JSON body of a 2xx response.
    fn send(&self, label: &str, request: RequestBuilder) -> KycResult<Value> {
        let response = request
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .map_err(|err| {
                log::warn!("[{}] request failed: {}", label, err);
                network(err)
            })?;
        let status = response.status();
        log::debug!("[{}] response status {}", label, status);
        if !status.is_success() {
            return Err(KycError::Network(format!("HTTP error! status: {}", status)));
        }
        response.json::<Value>().map_err(network)
    }
}

impl VerificationBackend for HttpBackend {
    fn submit_selfie(&self, id: &VerificationId, image: &[u8]) -> KycResult<Submission> {
        let mut form = Form::new()
            .part("file", image_part(image, format!("selfie-{}.jpg", id))?)
            .text("type", "selfie")
            .text("verificationId", id.to_string())
            .text("token", self.config.token.clone())
            .text("latitude", "0")
            .text("longitude", "0");
        if !self.config.liveness_server_key.is_empty() {
            form = form.text("server_key", self.config.liveness_server_key.clone());
        }
        let url = self.endpoint(LIVENESS_PATH)?;
        log::debug!("[selfie] POST {}", url);
        let body = self.send("selfie", self.client.post(url).multipart(form))?;
        Ok(adapter::interpret_liveness(&body))
    }

    fn submit_document_image(
        &self,
        id: &VerificationId,
        side: DocumentSide,
        country_code: &str,
        document_type: &str,
        image: &[u8],
    ) -> KycResult<Submission> {
        let form = Form::new()
            .part(
                "data",
                image_part(image, format!("{}-{}.jpg", side.as_str(), id))?,
            )
            .text("uuid", id.to_string())
            .text("server_key", self.config.document_server_key.clone())
            .text("token", self.config.token.clone())
            .text("country", country_code.to_string())
            .text("tenant_name", self.config.tenant_name.clone())
            .text("isBackSide", if side.is_back() { "1" } else { "0" })
            .text("document_type", document_type.to_string());
        let url = self.endpoint(DOCUMENT_PATH)?;
        log::debug!("[{}] POST {}", side.as_str(), url);
        let body = self.send(side.as_str(), self.client.post(url).multipart(form))?;
        Ok(adapter::interpret_document(&body))
    }

    fn submit_ocr(&self, request_id: &str, image: &[u8]) -> KycResult<Submission> {
        let form = Form::new()
            .part("file", image_part(image, format!("ocr-{}.jpg", request_id))?)
            .text("uuid", request_id.to_string())
            .text("server_key", self.config.ocr_server_key.clone())
            .text("engine_language", DEFAULT_ENGINE_LANGUAGE)
            .text("latitude", "0")
            .text("longitude", "0")
            .text("persistLoc", "0")
            .text("metadataIndex", "-1");
        let url = self.endpoint(OCR_PATH)?;
        log::debug!("[ocr] POST {}", url);
        let body = self.send("ocr", self.client.post(url).multipart(form))?;
        Ok(adapter::interpret_generic(&body))
    }

    fn submit_scan(
        &self,
        id: &VerificationId,
        method: ScanMethod,
        image: &[u8],
    ) -> KycResult<Submission> {
        let type_data = method.wire_name().ok_or_else(|| {
            KycError::Validation(format!("{} documents cannot be scanned", method))
        })?;
        let form = Form::new()
            .part("data", image_part(image, format!("{}-{}.jpg", type_data, id))?)
            .text("uuid", id.to_string())
            .text("server_key", self.config.scan_server_key.clone())
            .text("type_data", type_data);
        let url = self.endpoint(SCAN_PATH)?;
        log::debug!("[{}] POST {}", type_data, url);
        let body = self.send(type_data, self.client.post(url).multipart(form))?;
        let fallback = match method {
            ScanMethod::Barcode => adapter::BARCODE_FAILED,
            _ => adapter::MRZ_FAILED,
        };
        Ok(adapter::interpret_scan(&body, fallback))
    }

    fn submit_verification_summary(
        &self,
        summary: &VerificationSummary,
    ) -> KycResult<Submission> {
        let url = self.endpoint(SUBMIT_PATH)?;
        log::debug!("[summary] POST {} for {}", url, summary.verification_id);
        let body = self.send("summary", self.client.post(url).json(summary))?;
        Ok(adapter::interpret_generic(&body))
    }

    fn verification_status(&self, verification_id: &str) -> KycResult<Submission> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| KycError::Network(format!("cannot extend {}", self.base_url)))?
            .pop_if_empty()
            .extend(["kyc", "verification-status", verification_id]);
        log::debug!("[status] GET {}", url);
        let body = self.send("status", self.client.get(url))?;
        Ok(adapter::interpret_generic(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn backend_for(server: &MockServer) -> HttpBackend {
        let config = BackendConfig {
            base_url: server.url("/api"),
            token: "tok-123".to_string(),
            document_server_key: "doc-key".to_string(),
            scan_server_key: "scan-key".to_string(),
            tenant_name: "Acme".to_string(),
            timeout_secs: 5,
            ..BackendConfig::default()
        };
        HttpBackend::new(&config).unwrap()
    }

    #[test]
    fn selfie_posts_multipart_and_reads_liveness() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/ocr/liveness")
                .body_contains("name=\"verificationId\"")
                .body_contains("tok-123");
            then.status(200).json_body(json!({"live": "REAL"}));
        });
        let backend = backend_for(&server);
        let id = VerificationId::generate();
        let submission = backend.submit_selfie(&id, b"jpeg-bytes").unwrap();
        mock.assert();
        assert!(submission.is_accepted());
    }

    #[test]
    fn document_sends_selected_country_and_type() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/bq/image_request")
                .body_contains("DE")
                .body_contains("NI")
                .body_contains("doc-key")
                .body_contains("Acme");
            then.status(200).json_body(json!({"message": "BLURRY"}));
        });
        let backend = backend_for(&server);
        let id = VerificationId::generate();
        let submission = backend
            .submit_document_image(&id, DocumentSide::Back, "DE", "NI", b"img")
            .unwrap();
        mock.assert();
        assert_eq!(submission, Submission::rejected("BLURRY"));
    }

    #[test]
    fn scan_uses_method_wire_name() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/3/getparces")
                .body_contains("barcode");
            then.status(200).json_body(json!({"status": "failed"}));
        });
        let backend = backend_for(&server);
        let id = VerificationId::generate();
        let submission = backend
            .submit_scan(&id, ScanMethod::Barcode, b"img")
            .unwrap();
        mock.assert();
        assert_eq!(submission.message(), adapter::BARCODE_FAILED);
    }

    #[test]
    fn unsupported_scan_never_reaches_the_network() {
        let server = MockServer::start();
        let backend = backend_for(&server);
        let id = VerificationId::generate();
        let err = backend
            .submit_scan(&id, ScanMethod::Unsupported, b"img")
            .unwrap_err();
        assert!(matches!(err, KycError::Validation(_)));
    }

    #[test]
    fn non_success_status_is_network_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/kyc/submit-verification");
            then.status(503);
        });
        let backend = backend_for(&server);
        let summary = VerificationSummary {
            verification_id: "KYC-1-abc".to_string(),
            selfie_processed: true,
            document_front_processed: true,
            document_back_processed: false,
            mrz_processed: true,
        };
        let err = backend.submit_verification_summary(&summary).unwrap_err();
        assert!(matches!(err, KycError::Network(ref msg) if msg.contains("503")));
    }

    #[test]
    fn summary_is_posted_as_camel_case_json() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/kyc/submit-verification")
                .json_body(json!({
                    "verificationId": "KYC-1-abc",
                    "selfieProcessed": true,
                    "documentFrontProcessed": true,
                    "documentBackProcessed": false,
                    "mrzProcessed": true
                }));
            then.status(200).json_body(json!({"success": true, "message": "queued"}));
        });
        let backend = backend_for(&server);
        let summary = VerificationSummary {
            verification_id: "KYC-1-abc".to_string(),
            selfie_processed: true,
            document_front_processed: true,
            document_back_processed: false,
            mrz_processed: true,
        };
        let submission = backend.submit_verification_summary(&summary).unwrap();
        mock.assert();
        assert_eq!(submission.message(), "queued");
    }

    #[test]
    fn status_lookup_appends_the_id() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/kyc/verification-status/KYC-42-abc");
            then.status(200)
                .json_body(json!({"success": true, "data": {"state": "approved"}}));
        });
        let backend = backend_for(&server);
        match backend.verification_status("KYC-42-abc").unwrap() {
            Submission::Accepted { payload, .. } => {
                assert_eq!(payload, Some(json!({"state": "approved"})));
            }
            other => panic!("unexpected {:?}", other),
        }
        mock.assert();
    }

    #[test]
    fn unreachable_backend_is_network_error() {
        let config = BackendConfig {
            base_url: "http://127.0.0.1:9/api/".to_string(),
            timeout_secs: 1,
            ..BackendConfig::default()
        };
        let backend = HttpBackend::new(&config).unwrap();
        let err = backend.verification_status("x").unwrap_err();
        assert!(matches!(err, KycError::Network(_)));
    }
}
