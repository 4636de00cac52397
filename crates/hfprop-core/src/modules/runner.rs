//! Subprocess execution of the prediction engine.
//!
//! Each invocation writes its deck to a uniquely named file in the scratch
//! directory and expects the report next to it. Both files are removed when
//! the invocation ends, however it ends.

use super::input::EngineLayout;
use super::serialization::write_text_artifact;
use super::traits::EnginePort;
use crate::common::EngineConfig;
use crate::domain::{EngineDiagnostics, EngineRun, PredictError, PredictResult};
use async_trait::async_trait;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[cfg(target_os = "macos")]
pub const LIBRARY_PATH_VAR: &str = "DYLD_LIBRARY_PATH";
#[cfg(not(target_os = "macos"))]
pub const LIBRARY_PATH_VAR: &str = "LD_LIBRARY_PATH";

/// How long output pipes may stay open after the engine has exited.
pub const PIPE_DRAIN_GRACE: Duration = Duration::from_secs(1);

pub fn new_invocation_id() -> String {
    hex::encode(rand::random::<[u8; 8]>())
}

/// Input and report paths owned by one engine invocation.
#[derive(Debug)]
pub struct ScratchFiles {
    id: String,
    input: PathBuf,
    output: PathBuf,
}

impl ScratchFiles {
    pub fn allocate(scratch_dir: &Path) -> Self {
        let id = new_invocation_id();
        Self {
            input: scratch_dir.join(format!("input_{id}.txt")),
            output: scratch_dir.join(format!("output_{id}.txt")),
            id,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        for path in [&self.input, &self.output] {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(error) if error.kind() == ErrorKind::NotFound => {}
                Err(error) => warn!(
                    invocation = %self.id,
                    path = %path.display(),
                    %error,
                    "failed to remove engine scratch file"
                ),
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessEngine {
    config: EngineConfig,
}

impl ProcessEngine {
    /// Resolves configured paths and creates the scratch directory.
    pub fn new(config: EngineConfig) -> PredictResult<Self> {
        let config = config.absolutized().map_err(|source| {
            PredictError::io_system(
                "IO.ENGINE_CONFIG",
                format!("failed to resolve engine paths: {source}"),
            )
        })?;
        fs::create_dir_all(&config.scratch_dir).map_err(|source| {
            PredictError::io_system(
                "IO.SCRATCH_DIR",
                format!(
                    "failed to create scratch directory '{}': {}",
                    config.scratch_dir.display(),
                    source
                ),
            )
        })?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn ensure_engine_present(&self) -> PredictResult<()> {
        let path = &self.config.engine_path;
        let metadata = fs::metadata(path).map_err(|_| {
            PredictError::engine_missing(
                "RUN.ENGINE_MISSING",
                format!("prediction engine not found at '{}'", path.display()),
            )
        })?;
        if !metadata.is_file() || !is_executable(&metadata) {
            return Err(PredictError::engine_missing(
                "RUN.ENGINE_NOT_EXECUTABLE",
                format!("prediction engine at '{}' is not executable", path.display()),
            ));
        }
        Ok(())
    }

    fn library_search_path(&self) -> OsString {
        let mut paths = vec![self.config.install_dir.clone()];
        if let Some(existing) = std::env::var_os(LIBRARY_PATH_VAR) {
            paths.extend(std::env::split_paths(&existing));
        }
        std::env::join_paths(paths).unwrap_or_else(|_| self.config.install_dir.clone().into())
    }
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool {
    true
}

/// Output drained from one engine pipe by a background task.
///
/// The buffer is shared so that whatever arrived before a timeout or an
/// early exit can still be reported. The reader is aborted on drop.
struct PipeCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
    reader: JoinHandle<()>,
}

impl PipeCapture {
    fn spawn<R>(pipe: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);
        let reader = tokio::spawn(async move {
            let Some(mut pipe) = pipe else {
                return;
            };
            let mut chunk = [0u8; 8192];
            loop {
                match pipe.read(&mut chunk).await {
                    Ok(0) => break,
                    Ok(read) => match sink.lock() {
                        Ok(mut buffer) => buffer.extend_from_slice(&chunk[..read]),
                        Err(_) => break,
                    },
                    Err(error) => {
                        debug!(%error, "engine output pipe closed early");
                        break;
                    }
                }
            }
        });
        Self { buffer, reader }
    }

    /// Waits up to `grace` for end of file, then returns what was read.
    async fn finish(mut self, grace: Duration) -> String {
        if tokio::time::timeout(grace, &mut self.reader).await.is_err() {
            debug!("engine output pipe still open after exit; keeping partial output");
        }
        let bytes = match self.buffer.lock() {
            Ok(buffer) => buffer.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Drop for PipeCapture {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn drain_pipes(stdout: PipeCapture, stderr: PipeCapture) -> (String, String) {
    tokio::join!(
        stdout.finish(PIPE_DRAIN_GRACE),
        stderr.finish(PIPE_DRAIN_GRACE)
    )
}

#[async_trait]
impl EnginePort for ProcessEngine {
    fn layout(&self) -> EngineLayout<'_> {
        EngineLayout {
            data_dir: &self.config.data_dir,
            report_dir: &self.config.scratch_dir,
        }
    }

    async fn invoke(&self, input: &str, timeout: Duration) -> PredictResult<EngineRun> {
        self.ensure_engine_present()?;

        let files = ScratchFiles::allocate(&self.config.scratch_dir);
        let diagnostics =
            |stdout: String, stderr: String, exit_code: Option<i32>| EngineDiagnostics {
                input: input.to_string(),
                stdout,
                stderr,
                raw_report: String::new(),
                exit_code,
            };

        write_text_artifact(files.input(), input).await.map_err(|source| {
            PredictError::io_system(
                "IO.ENGINE_INPUT",
                format!(
                    "failed to write engine input '{}': {}",
                    files.input().display(),
                    source
                ),
            )
        })?;
        debug!(invocation = files.id(), bytes = input.len(), "engine input written");

        let started = Instant::now();
        let mut child = Command::new(&self.config.engine_path)
            .arg(files.input())
            .arg(files.output())
            .env(LIBRARY_PATH_VAR, self.library_search_path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| match source.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => PredictError::engine_missing(
                    "RUN.ENGINE_SPAWN",
                    format!(
                        "failed to start prediction engine '{}': {}",
                        self.config.engine_path.display(),
                        source
                    ),
                ),
                _ => PredictError::io_system(
                    "IO.ENGINE_SPAWN",
                    format!("failed to start prediction engine: {source}"),
                ),
            })?;

        let stdout = PipeCapture::spawn(child.stdout.take());
        let stderr = PipeCapture::spawn(child.stderr.take());
        let waited = tokio::time::timeout(timeout, child.wait()).await;
        let elapsed = started.elapsed();

        let status = match waited {
            Ok(Ok(status)) => status,
            Ok(Err(source)) => {
                let (stdout, stderr) = drain_pipes(stdout, stderr).await;
                return Err(PredictError::io_system(
                    "IO.ENGINE_WAIT",
                    format!("failed to wait for prediction engine: {source}"),
                )
                .with_diagnostics(diagnostics(stdout, stderr, None)));
            }
            Err(_) => {
                if let Err(error) = child.kill().await {
                    warn!(invocation = files.id(), %error, "failed to kill timed-out engine");
                }
                warn!(
                    invocation = files.id(),
                    timeout_ms = timeout.as_millis() as u64,
                    "prediction engine timed out"
                );
                let (stdout, stderr) = drain_pipes(stdout, stderr).await;
                return Err(PredictError::engine_timeout(
                    "RUN.ENGINE_TIMEOUT",
                    format!(
                        "prediction engine timed out after {:.1} s",
                        timeout.as_secs_f64()
                    ),
                )
                .with_diagnostics(diagnostics(stdout, stderr, None)));
            }
        };
        let (stdout, stderr) = drain_pipes(stdout, stderr).await;

        let exit_code = status.code();
        if !status.success() {
            let status_text = exit_code.map_or_else(
                || "terminated by signal".to_string(),
                |code| format!("exit code {code}"),
            );
            warn!(
                invocation = files.id(),
                status = %status_text,
                "prediction engine reported failure; reading report anyway"
            );
        }

        let report = match tokio::fs::read(files.output()).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(source) if source.kind() == ErrorKind::NotFound => {
                let error = if status.success() {
                    PredictError::report_missing(
                        "RUN.REPORT_MISSING",
                        "prediction engine finished without writing a report",
                    )
                } else {
                    PredictError::engine_non_zero_exit(
                        "RUN.ENGINE_EXIT",
                        format!(
                            "prediction engine failed ({}) and wrote no report",
                            exit_code.map_or_else(
                                || "terminated by signal".to_string(),
                                |code| format!("exit code {code}"),
                            )
                        ),
                    )
                };
                return Err(error.with_diagnostics(diagnostics(stdout, stderr, exit_code)));
            }
            Err(source) => {
                return Err(PredictError::io_system(
                    "IO.ENGINE_REPORT",
                    format!(
                        "failed to read engine report '{}': {}",
                        files.output().display(),
                        source
                    ),
                )
                .with_diagnostics(diagnostics(stdout, stderr, exit_code)));
            }
        };

        info!(
            invocation = files.id(),
            elapsed_ms = elapsed.as_millis() as u64,
            report_bytes = report.len(),
            "prediction engine finished"
        );

        Ok(EngineRun {
            invocation_id: files.id().to_string(),
            report,
            stdout,
            stderr,
            exit_code,
            succeeded: status.success(),
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ProcessEngine, ScratchFiles, new_invocation_id};
    use crate::common::EngineConfig;
    use crate::domain::ErrorCategory;
    use crate::modules::traits::EnginePort;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn invocation_ids_are_unique_hex_tokens() {
        let first = new_invocation_id();
        let second = new_invocation_id();
        assert_eq!(first.len(), 16);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }

    #[test]
    fn scratch_files_are_removed_on_drop() {
        let temp = TempDir::new().expect("tempdir should be created");
        let (input, output) = {
            let files = ScratchFiles::allocate(temp.path());
            fs::write(files.input(), "deck").expect("input should be written");
            fs::write(files.output(), "report").expect("output should be written");
            assert!(files.input().ends_with(format!("input_{}.txt", files.id())));
            (files.input().to_path_buf(), files.output().to_path_buf())
        };
        assert!(!input.exists());
        assert!(!output.exists());
    }

    #[test]
    fn scratch_drop_tolerates_missing_files() {
        let temp = TempDir::new().expect("tempdir should be created");
        drop(ScratchFiles::allocate(temp.path()));
        assert_eq!(fs::read_dir(temp.path()).expect("readable").count(), 0);
    }

    #[tokio::test]
    async fn missing_engine_fails_before_touching_scratch() {
        let temp = TempDir::new().expect("tempdir should be created");
        let scratch = temp.path().join("scratch");
        let engine = ProcessEngine::new(
            EngineConfig::new(temp.path().join("absent-engine"), temp.path())
                .with_scratch_dir(&scratch),
        )
        .expect("engine should construct");

        let error = engine
            .invoke("Path.year 2024", Duration::from_secs(1))
            .await
            .expect_err("missing engine should fail");
        assert_eq!(error.category(), ErrorCategory::EngineMissing);
        assert_eq!(fs::read_dir(&scratch).expect("scratch exists").count(), 0);
    }

    #[test]
    fn layout_points_reports_at_scratch_dir() {
        let temp = TempDir::new().expect("tempdir should be created");
        let engine = ProcessEngine::new(
            EngineConfig::new(temp.path().join("engine"), temp.path().join("data"))
                .with_scratch_dir(temp.path().join("scratch")),
        )
        .expect("engine should construct");
        let layout = engine.layout();
        assert_eq!(layout.report_dir, temp.path().join("scratch"));
        assert_eq!(layout.data_dir, temp.path().join("data"));
    }
}
