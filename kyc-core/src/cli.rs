//! CLI argument parsing for the KYC wizard
//!
//! The interactive wizard runs when no subcommand is given.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "kyc-wizard")]
#[command(about = "Identity verification wizard")]
#[command(long_about = "Identity verification wizard\n\n\
    Walks through selfie, document and MRZ/barcode capture against a verification backend.\n\n\
    Run without arguments to launch the interactive wizard.\n\
    Or use subcommands to inspect reference data and verification status.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Configuration file (TOML). Defaults to ./kyc-wizard.toml when present
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verification backend base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Directory of captured frames served as the camera feed
    #[arg(long, global = true)]
    pub frames_dir: Option<PathBuf>,

    /// Country/document reference table (JSON) replacing the built-in one
    #[arg(long, global = true)]
    pub reference_data: Option<PathBuf>,

    /// Where downloaded verification reports are written
    #[arg(long, global = true)]
    pub report_dir: Option<PathBuf>,

    /// Dump wizard step render text to stdout and exit
    #[arg(long, global = true)]
    pub dump_tui: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive wizard (default)
    Run,

    /// List countries with at least one live document type
    Countries,

    /// List document types offered for a country
    Documents {
        #[arg(long)]
        country: String,
    },

    /// Show which scanner a country/document combination uses
    Resolve {
        #[arg(long)]
        country: String,

        #[arg(long)]
        document_type: String,
    },

    /// Query the backend for a verification's status
    Status {
        verification_id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_wizard() {
        let cli = Cli::parse_from(["kyc-wizard"]);
        assert!(cli.command.is_none());
        assert!(!cli.dump_tui);
    }

    #[test]
    fn resolve_takes_country_and_document() {
        let cli = Cli::parse_from([
            "kyc-wizard",
            "resolve",
            "--country",
            "US",
            "--document-type",
            "DL",
        ]);
        match cli.command {
            Some(Command::Resolve {
                country,
                document_type,
            }) => {
                assert_eq!(country, "US");
                assert_eq!(document_type, "DL");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["kyc-wizard", "countries", "--reference-data", "ref.json"]);
        assert!(matches!(cli.command, Some(Command::Countries)));
        assert_eq!(cli.reference_data, Some(PathBuf::from("ref.json")));
    }
}
