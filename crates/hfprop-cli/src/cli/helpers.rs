use super::CliError;
use super::commands::EngineArgs;
use anyhow::Context;
use hfprop_core::{EngineConfig, Predictor, ProcessEngine};
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

pub(super) const DEFAULT_LOG_FILTER: &str = "hfprop=info";

/// Logs go to stderr; stdout carries JSON only.
pub(super) fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub(super) fn engine_config(args: &EngineArgs) -> EngineConfig {
    let mut config = EngineConfig::new(&args.engine, &args.data_dir)
        .with_timeout(Duration::from_secs(args.timeout_secs))
        .with_batch_workers(args.workers)
        .with_required_data_file(args.required_file.clone());
    if let Some(engine_dir) = &args.engine_dir {
        config = config.with_install_dir(engine_dir);
    }
    if let Some(scratch_dir) = &args.scratch_dir {
        config = config.with_scratch_dir(scratch_dir);
    }
    config
}

pub(super) fn build_predictor(config: &EngineConfig) -> Result<Predictor, CliError> {
    let engine = ProcessEngine::new(config.clone())?;
    Ok(Predictor::new(Arc::new(engine), config.timeout))
}

pub(super) fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value).context("failed to encode JSON output")?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{rendered}").context("failed to write JSON output")?;
    Ok(())
}
