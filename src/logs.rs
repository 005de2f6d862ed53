//! Daily-rotated log file and its tail for the `/logs` endpoint.
//!
//! Files are named `launch_digest.<YYYY-MM-DD>.log`, so the newest file is
//! also the last one by name.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};

const FILE_PREFIX: &str = "launch_digest";
const FILE_SUFFIX: &str = "log";

/// Appender writing to `dir`, rotated at midnight UTC.
pub fn file_appender(dir: &str) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(FILE_PREFIX)
        .filename_suffix(FILE_SUFFIX)
        .max_log_files(7)
        .build(dir)
}

async fn newest_log_file(dir: &Path) -> std::io::Result<Option<PathBuf>> {
    let mut newest: Option<PathBuf> = None;
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(FILE_PREFIX) && n.ends_with(FILE_SUFFIX));
        if is_log && newest.as_ref().is_none_or(|current| path > *current) {
            newest = Some(path);
        }
    }
    Ok(newest)
}

/// The last `limit` lines of the newest log file in `dir`.
///
/// # Arguments
///
/// * `dir` - Directory the [`file_appender`] writes to
/// * `limit` - Maximum number of lines returned
///
/// # Returns
///
/// Lines oldest first. Empty when no log file exists yet.
pub async fn tail(dir: &Path, limit: usize) -> std::io::Result<Vec<String>> {
    let Some(path) = newest_log_file(dir).await? else {
        return Ok(Vec::new());
    };
    let content = fs::read_to_string(&path).await?;
    let lines = content.lines().collect::<Vec<_>>();
    let start = lines.len().saturating_sub(limit);
    Ok(lines[start..].iter().map(|l| l.to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tail_reads_newest_file() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("launch_digest.2025-05-05.log"), "old\n").unwrap();
        let body = (1..=60).map(|i| format!("line {i}\n")).collect::<String>();
        std::fs::write(tmp.path().join("launch_digest.2025-05-06.log"), body).unwrap();
        std::fs::write(tmp.path().join("unrelated.txt"), "nope\n").unwrap();

        let lines = tail(tmp.path(), 50).await.unwrap();
        assert_eq!(lines.len(), 50);
        assert_eq!(lines[0], "line 11");
        assert_eq!(lines[49], "line 60");
    }

    #[tokio::test]
    async fn test_tail_without_files_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(tail(tmp.path(), 50).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tail_of_missing_directory_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(tail(&tmp.path().join("absent"), 50).await.unwrap().is_empty());
    }

    #[test]
    fn test_appender_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("logs");
        file_appender(dir.to_str().unwrap()).unwrap();
        assert!(dir.is_dir());
    }
}
