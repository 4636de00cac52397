mod commands;
mod helpers;

use clap::Parser;
use hfprop_core::domain::PredictError;

pub async fn run_from_env() -> i32 {
    helpers::init_tracing();

    match parse_and_dispatch(std::env::args().collect()).await {
        Ok(code) => code,
        Err(error) => {
            let prediction_error = error.as_predict_error();
            if let CliError::Predict(_) = &error {
                // callers parsing stdout still get a structured body
                if let Ok(body) = serde_json::to_string_pretty(&prediction_error.report()) {
                    println!("{body}");
                }
            }
            eprintln!("{}", prediction_error.diagnostic_line());
            prediction_error.exit_code()
        }
    }
}

async fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => dispatch_parsed(cli.command).await,
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{err}");
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(name = "hfprop", version, about = "HF propagation predictions from an external engine")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Predict a single path at one hour
    Predict(commands::PredictArgs),
    /// Predict every hour of the day
    Hourly(commands::PredictArgs),
    /// Predict and summarize by amateur band
    Bands(commands::PredictArgs),
    /// Check the engine installation
    Health(commands::HealthArgs),
    /// Serve the prediction API over HTTP
    Serve(commands::ServeArgs),
}

async fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Predict(args) => commands::run_predict_command(args).await,
        CliCommand::Hourly(args) => commands::run_hourly_command(args).await,
        CliCommand::Bands(args) => commands::run_bands_command(args).await,
        CliCommand::Health(args) => commands::run_health_command(args),
        CliCommand::Serve(args) => commands::run_serve_command(args).await,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Predict(PredictError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_predict_error(&self) -> PredictError {
        match self {
            Self::Usage(message) => {
                PredictError::invalid_request("INPUT.CLI_USAGE", message.clone())
            }
            Self::Predict(error) => error.clone(),
            Self::Internal(error) => PredictError::internal("INTERNAL.CLI", format!("{error:#}")),
        }
    }
}

impl From<PredictError> for CliError {
    fn from(error: PredictError) -> Self {
        Self::Predict(error)
    }
}

#[cfg(test)]
mod tests {
    use super::{CliError, parse_and_dispatch};
    use hfprop_core::domain::{ErrorCategory, PredictError};

    #[test]
    fn cli_errors_map_to_exit_codes() {
        let usage = CliError::Usage("bad flag".to_string());
        assert_eq!(usage.as_predict_error().exit_code(), 2);
        let timeout = PredictError::engine_timeout("RUN.ENGINE_TIMEOUT", "slow");
        assert_eq!(CliError::Predict(timeout).as_predict_error().exit_code(), 4);
        let internal = CliError::Internal(anyhow::anyhow!("stdout closed")).as_predict_error();
        assert_eq!(internal.category(), ErrorCategory::Internal);
        assert_eq!(internal.code(), "INTERNAL.CLI");
        assert_eq!(internal.exit_code(), 5);
    }

    #[tokio::test]
    async fn help_is_not_an_error() {
        let code = parse_and_dispatch(vec!["hfprop".to_string(), "--help".to_string()])
            .await
            .expect("help should succeed");
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn unknown_subcommand_is_usage_error() {
        let error = parse_and_dispatch(vec!["hfprop".to_string(), "forecast".to_string()])
            .await
            .expect_err("unknown command should fail");
        assert!(matches!(error, CliError::Usage(_)));
    }
}
