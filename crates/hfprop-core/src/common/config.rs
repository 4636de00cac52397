use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_ENGINE_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_BATCH_WORKERS: usize = 4;
pub const DEFAULT_REQUIRED_DATA_FILE: &str = "P1239-3 Decile Factors.txt";
pub const SCRATCH_DIR_NAME: &str = "hfprop";

/// Where the prediction engine lives and how it is run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub engine_path: PathBuf,
    /// Directory holding the engine's shared libraries.
    pub install_dir: PathBuf,
    pub data_dir: PathBuf,
    pub scratch_dir: PathBuf,
    pub timeout: Duration,
    pub required_data_file: String,
    pub batch_workers: usize,
}

impl EngineConfig {
    pub fn new(engine_path: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        let engine_path = engine_path.into();
        let install_dir = engine_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Self {
            engine_path,
            install_dir,
            data_dir: data_dir.into(),
            scratch_dir: std::env::temp_dir().join(SCRATCH_DIR_NAME),
            timeout: DEFAULT_ENGINE_TIMEOUT,
            required_data_file: DEFAULT_REQUIRED_DATA_FILE.to_string(),
            batch_workers: DEFAULT_BATCH_WORKERS,
        }
    }

    pub fn with_install_dir(mut self, install_dir: impl Into<PathBuf>) -> Self {
        self.install_dir = install_dir.into();
        self
    }

    pub fn with_scratch_dir(mut self, scratch_dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = scratch_dir.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_required_data_file(mut self, file_name: impl Into<String>) -> Self {
        self.required_data_file = file_name.into();
        self
    }

    pub fn with_batch_workers(mut self, workers: usize) -> Self {
        self.batch_workers = workers.max(1);
        self
    }

    pub fn required_data_path(&self) -> PathBuf {
        self.data_dir.join(&self.required_data_file)
    }

    /// Resolves every path against the current directory.
    pub fn absolutized(mut self) -> std::io::Result<Self> {
        self.engine_path = std::path::absolute(&self.engine_path)?;
        self.install_dir = std::path::absolute(&self.install_dir)?;
        self.data_dir = std::path::absolute(&self.data_dir)?;
        self.scratch_dir = std::path::absolute(&self.scratch_dir)?;
        Ok(self)
    }
}
