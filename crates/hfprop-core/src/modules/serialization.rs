use std::path::Path;

pub const RAW_REPORT_LIMIT: usize = 4000;
const TRUNCATION_MARKER: &str = "\n... [truncated]";

pub fn normalize_text_artifact(content: &str) -> String {
    let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    if !normalized.is_empty() && !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

pub async fn write_text_artifact(path: &Path, content: &str) -> std::io::Result<()> {
    tokio::fs::write(path, normalize_text_artifact(content)).await
}

/// Caps diagnostic text at `limit` characters.
pub fn truncate_diagnostic(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

/// Engine path arguments are directories with a trailing separator.
pub fn directory_argument(path: &Path) -> String {
    let rendered = path.display().to_string();
    if rendered.ends_with('/') || rendered.ends_with('\\') {
        rendered
    } else {
        format!("{rendered}/")
    }
}
