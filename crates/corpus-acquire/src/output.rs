use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Serialize `value` as pretty JSON indented with tabs.
pub fn to_tab_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8(buf)?)
}

/// Remove `dir` with everything in it, then recreate it (and `subdirs`) empty.
pub async fn reset_dir(dir: &Path, subdirs: &[&str]) -> Result<()> {
    if tokio::fs::try_exists(dir).await? {
        tokio::fs::remove_dir_all(dir)
            .await
            .with_context(|| format!("Failed to clear {}", dir.display()))?;
        tracing::debug!(path = %dir.display(), "Cleared output directory");
    }
    ensure_dirs(dir, subdirs).await
}

/// Create `dir` and `subdirs` beneath it if missing.
pub async fn ensure_dirs(dir: &Path, subdirs: &[&str]) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    for sub in subdirs {
        let path = dir.join(sub);
        tokio::fs::create_dir_all(&path)
            .await
            .with_context(|| format!("Failed to create {}", path.display()))?;
    }
    Ok(())
}

/// Counts file decisions across concurrently running units and logs each one.
#[derive(Debug, Default)]
pub struct Progress {
    decisions: AtomicUsize,
    written: AtomicUsize,
    skipped: AtomicUsize,
}

impl Progress {
    /// Write `contents` to `path`, logging it with a running count.
    pub async fn write(&self, path: &Path, contents: &str) -> Result<()> {
        tokio::fs::write(path, contents)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        let count = self.next_count();
        self.written.fetch_add(1, Ordering::Relaxed);
        tracing::info!(count, path = %path.display(), bytes = contents.len(), "Wrote file");
        Ok(())
    }

    /// Log that `path` is already materialized.
    pub fn skip(&self, path: &Path) {
        let count = self.next_count();
        self.skipped.fetch_add(1, Ordering::Relaxed);
        tracing::info!(count, path = %path.display(), "Already written, skipping");
    }

    pub fn written(&self) -> usize {
        self.written.load(Ordering::Relaxed)
    }

    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::Relaxed)
    }

    fn next_count(&self) -> usize {
        self.decisions.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tab_json() {
        let value = json!({"paragraphs": [{"cues": []}]});
        assert_eq!(
            to_tab_json(&value).unwrap(),
            "{\n\t\"paragraphs\": [\n\t\t{\n\t\t\t\"cues\": []\n\t\t}\n\t]\n}"
        );
    }

    #[tokio::test]
    async fn test_reset_dir_discards_previous_files() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("1880");
        ensure_dirs(&root, &["json"]).await.unwrap();
        std::fs::write(root.join("json/old.json"), "{}").unwrap();

        reset_dir(&root, &["json", "txt"]).await.unwrap();

        assert!(root.join("json").is_dir());
        assert!(root.join("txt").is_dir());
        assert!(!root.join("json/old.json").exists());
    }

    #[tokio::test]
    async fn test_progress_counts() {
        let tmp = tempfile::tempdir().unwrap();
        let progress = Progress::default();
        let a = tmp.path().join("a.txt");

        progress.write(&a, "hello").await.unwrap();
        progress.skip(&a);

        assert_eq!(std::fs::read_to_string(&a).unwrap(), "hello");
        assert_eq!(progress.written(), 1);
        assert_eq!(progress.skipped(), 1);
    }
}
