use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use vault_warden::config::{WardenConfig, DEFAULT_CONFIG_PATH};
use vault_warden::shutdown::shutdown_signal;
use vault_warden::utils::init_logging;
use vault_warden::vault::UnsealOutcome;

#[derive(Parser, Debug)]
#[command(name = "vault-warden", version, about = "Vault unsealer and audit log monitor")]
struct Cli {
    /// Path to config file
    #[arg(long, env = "VAULT_WARDEN_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Check seal status once and submit unseal keys if sealed
    Unlock,
    /// Follow the audit log and report privileged access until interrupted
    Audit,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let _guard = init_logging();

    let config = match WardenConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Config error");
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.mode {
        Mode::Unlock => match vault_warden::run_unlock(&config).await {
            Ok(UnsealOutcome::AlreadyUnsealed) => {
                println!("Vault is already unsealed. Skipping.");
                ExitCode::SUCCESS
            }
            Ok(UnsealOutcome::Unsealed { keys_submitted }) => {
                println!("Vault unsealed after {} key(s).", keys_submitted);
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!(error = %e, code = e.error_code(), "Unlock failed");
                ExitCode::FAILURE
            }
        },
        Mode::Audit => match vault_warden::run_audit(&config, shutdown_signal()).await {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!(error = %e, code = e.error_code(), "Audit monitor failed");
                ExitCode::FAILURE
            }
        },
    }
}
