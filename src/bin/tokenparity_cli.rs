//! TokenParity CLI - Bridge interface for build pipelines
//!
//! Commands: validate, batch, constraints
//! Outputs JSON to stdout, logs to stderr
//! Returns 2 on inconsistency, 1 on input errors

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use tokenparity_core::{
    compute_results_fingerprint, EngineConfig, PlatformConstraintHandler, PrimitiveToken,
    TokenSet, ValidationContext,
};

#[derive(Parser)]
#[command(name = "tokenparity-cli")]
#[command(about = "TokenParity CLI - Cross-platform design token consistency")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to engine configuration (TOML)
    #[arg(short, long, global = true, env = "TOKENPARITY_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a single token
    Validate {
        /// JSON payload (PrimitiveToken)
        #[arg(short, long)]
        payload: String,

        /// Reject tokens that trigger any platform constraint
        #[arg(long)]
        strict: bool,

        /// Skip platform constraint handling
        #[arg(long)]
        no_constraints: bool,
    },

    /// Validate every token in a JSON array file
    Batch {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Print the platform constraint documentation
    Constraints,
}

fn error_exit(message: String) -> ExitCode {
    let output = serde_json::json!({ "error": message });
    println!("{}", output);
    ExitCode::FAILURE
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let config = match EngineConfig::resolve(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => return error_exit(format!("Failed to load configuration: {}", e)),
    };

    match cli.command {
        Commands::Validate { payload, strict, no_constraints } => {
            let token: PrimitiveToken = match serde_json::from_str(&payload) {
                Ok(t) => t,
                Err(e) => return error_exit(format!("Invalid payload: {}", e)),
            };

            let validator = config.build_validator();
            let providers = config.build_providers();
            let mut options = config.validation.options();
            options.strict_mode |= strict;

            let result = validator.validate_token(&ValidationContext {
                token: &token,
                providers: &providers,
                handle_constraints: config.validation.handle_constraints && !no_constraints,
                options,
            });

            if let Err(e) = print_json(&result) {
                return error_exit(e.to_string());
            }
            if result.is_consistent {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }

        Commands::Batch { file } => {
            let set = match TokenSet::load_from_file(&file) {
                Ok(s) => s,
                Err(e) => return error_exit(format!("Failed to load tokens: {}", e)),
            };

            let validator = config.build_validator();
            let providers = config.build_providers();
            let results = validator.validate_tokens(
                set.tokens(),
                &providers,
                config.validation.handle_constraints,
                &config.validation.options(),
            );
            let summary = validator.generate_summary_report(&results);
            let fingerprint = match compute_results_fingerprint(&results) {
                Ok(f) => f,
                Err(e) => return error_exit(e.to_string()),
            };

            let output = serde_json::json!({
                "results": results,
                "summary": summary,
                "fingerprint": fingerprint,
            });
            if let Err(e) = print_json(&output) {
                return error_exit(e.to_string());
            }

            if summary.inconsistent_tokens == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }

        Commands::Constraints => {
            let docs = PlatformConstraintHandler::default().constraint_documentation();
            match print_json(&docs) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => error_exit(e.to_string()),
            }
        }
    }
}
