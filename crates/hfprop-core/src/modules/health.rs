//! Installation checks for the prediction engine. Existence only; the engine
//! is never started here.

use crate::common::EngineConfig;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub ready: bool,
    pub engine_path: PathBuf,
    pub engine_present: bool,
    pub engine_executable: bool,
    pub library_dir: PathBuf,
    pub shared_libraries: Vec<String>,
    pub data_dir: PathBuf,
    pub data_dir_present: bool,
    pub required_file: PathBuf,
    pub required_file_present: bool,
}

pub fn probe(config: &EngineConfig) -> HealthReport {
    let engine = fs::metadata(&config.engine_path).ok().filter(fs::Metadata::is_file);
    let engine_present = engine.is_some();
    let engine_executable = engine.as_ref().is_some_and(is_executable);
    let shared_libraries = shared_libraries(&config.install_dir);
    let data_dir_present = config.data_dir.is_dir();
    let required_file = config.required_data_path();
    let required_file_present = required_file.is_file();

    HealthReport {
        ready: engine_executable
            && !shared_libraries.is_empty()
            && data_dir_present
            && required_file_present,
        engine_path: config.engine_path.clone(),
        engine_present,
        engine_executable,
        library_dir: config.install_dir.clone(),
        shared_libraries,
        data_dir: config.data_dir.clone(),
        data_dir_present,
        required_file,
        required_file_present,
    }
}

fn shared_libraries(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|name| is_shared_object(name))
        .collect::<Vec<_>>();
    names.sort();
    names
}

fn is_shared_object(name: &str) -> bool {
    name.ends_with(".so")
        || name.contains(".so.")
        || name.ends_with(".dylib")
        || name.ends_with(".dll")
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

#[cfg(test)]
mod tests {
    use super::{is_shared_object, probe};
    use crate::common::EngineConfig;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn empty_install_is_not_ready() {
        let temp = TempDir::new().expect("tempdir should be created");
        let report = probe(&EngineConfig::new(
            temp.path().join("bin/engine"),
            temp.path().join("data"),
        ));
        assert!(!report.ready);
        assert!(!report.engine_present);
        assert!(!report.data_dir_present);
        assert!(!report.required_file_present);
        assert!(report.shared_libraries.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn complete_install_is_ready() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().expect("tempdir should be created");
        let bin = temp.path().join("bin");
        let data = temp.path().join("data");
        fs::create_dir_all(&bin).expect("bin dir should be created");
        fs::create_dir_all(&data).expect("data dir should be created");

        let engine = bin.join("engine");
        fs::write(&engine, "#!/bin/sh\n").expect("engine should be written");
        fs::set_permissions(&engine, fs::Permissions::from_mode(0o755))
            .expect("engine should be executable");
        fs::write(bin.join("libp533.so"), b"").expect("library should be written");
        fs::write(bin.join("libitur.so.1"), b"").expect("library should be written");
        let config = EngineConfig::new(&engine, &data);
        fs::write(config.required_data_path(), "factors").expect("data file should be written");

        let report = probe(&config);
        assert!(report.ready, "report: {report:?}");
        assert_eq!(report.shared_libraries, vec!["libitur.so.1", "libp533.so"]);
    }

    #[test]
    fn shared_object_names() {
        assert!(is_shared_object("libp533.so"));
        assert!(is_shared_object("libp372.so.2"));
        assert!(is_shared_object("libp533.dylib"));
        assert!(!is_shared_object("p533"));
        assert!(!is_shared_object("notes.txt"));
    }
}
