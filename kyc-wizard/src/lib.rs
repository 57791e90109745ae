use anyhow::Context;
use clap::Parser;
use kyc_core::backend::{HttpBackend, Submission, VerificationBackend};
use kyc_core::cli::{Cli, Command};
use kyc_core::config::KycConfig;
use kyc_core::reference::ReferenceData;
use kyc_core::scan::resolve_scan_method;
use kyc_hal::FileCamera;
use kyc_workflow::FlowController;
use std::sync::Arc;
use std::time::Duration;

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = KycConfig::load(cli.config.as_deref())?;
    config.apply_overrides(&cli)?;
    kyc_core::logging::init(&config.flow.log_file);

    let reference = Arc::new(load_reference(&config)?);

    if cli.dump_tui {
        print!("{}", kyc_tui::dump_all_steps(reference));
        return Ok(());
    }

    match &cli.command {
        None | Some(Command::Run) => {
            log::info!("🎉 Launching KYC wizard...");
            launch(&config, reference)?;
        }
        Some(Command::Countries) => print!("{}", list_countries(&reference)),
        Some(Command::Documents { country }) => print!("{}", list_documents(&reference, country)),
        Some(Command::Resolve {
            country,
            document_type,
        }) => {
            let method = resolve_scan_method(&reference, country, document_type);
            println!("{}/{}: {}", country, document_type, method);
        }
        Some(Command::Status { verification_id }) => {
            log::info!("🔍 Querying status of {}", verification_id);
            let backend = HttpBackend::new(&config.backend)?;
            match backend.verification_status(verification_id)? {
                Submission::Accepted { message, payload } => {
                    println!("✅ {}", message);
                    if let Some(payload) = payload {
                        println!("{}", serde_json::to_string_pretty(&payload)?);
                    }
                }
                Submission::Rejected { message } => {
                    anyhow::bail!("Status lookup for {} failed: {}", verification_id, message)
                }
            }
        }
    }
    Ok(())
}

fn launch(config: &KycConfig, reference: Arc<ReferenceData>) -> anyhow::Result<()> {
    let camera = FileCamera::new(config.camera.frames_dir.clone());
    let backend = HttpBackend::new(&config.backend).context("Failed to set up backend client")?;
    log::info!(
        "camera frames from {}, backend {}",
        config.camera.frames_dir.display(),
        backend.base_url()
    );
    let flow = FlowController::new(Arc::new(camera), Arc::new(backend), reference)
        .with_completion_delay(Duration::from_millis(config.flow.completion_delay_ms));
    let app = kyc_tui::App::new(flow, config.flow.report_dir.clone());
    kyc_tui::run(app)?;
    Ok(())
}

fn load_reference(config: &KycConfig) -> anyhow::Result<ReferenceData> {
    match &config.flow.reference_data {
        Some(path) => ReferenceData::load(path),
        None => Ok(ReferenceData::builtin().clone()),
    }
}

pub fn list_countries(reference: &ReferenceData) -> String {
    reference
        .countries()
        .into_iter()
        .map(|c| format!("{}\t{}\n", c.code, c.name))
        .collect()
}

pub fn list_documents(reference: &ReferenceData, country: &str) -> String {
    let options = reference.document_options(country);
    if options.is_empty() {
        return format!("No live document types for {}\n", country);
    }
    options
        .into_iter()
        .map(|o| format!("{}\t{}\n", o.value, o.label))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> ReferenceData {
        ReferenceData::from_json_str(
            r#"[
            {"country_code": "US", "country": "United States", "type": "DL", "barcode": "PDF417"},
            {"country_code": "AL", "country": "Albania", "type": "PP", "barcode": "TD3"}
        ]"#,
        )
        .unwrap()
    }

    #[test]
    fn countries_are_listed_by_name() {
        assert_eq!(
            list_countries(&reference()),
            "AL\tAlbania\nUS\tUnited States\n"
        );
    }

    #[test]
    fn documents_use_known_labels() {
        assert_eq!(list_documents(&reference(), "US"), "DL\tDriving License\n");
        assert!(list_documents(&reference(), "ZZ").contains("No live document"));
    }

    #[test]
    fn configured_reference_file_replaces_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reference.json");
        std::fs::write(
            &path,
            r#"[{"country_code": "UT", "country": "Utopia", "type": "NI", "barcode": "TD1"}]"#,
        )
        .unwrap();
        let mut config = KycConfig::default();
        config.flow.reference_data = Some(path);
        let data = load_reference(&config).unwrap();
        assert_eq!(data.records().len(), 1);

        config.flow.reference_data = None;
        assert!(!load_reference(&config).unwrap().is_empty());
    }
}
