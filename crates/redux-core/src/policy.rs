//! Which files the privileged layer agrees to touch.

use crate::CoreError;
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone)]
pub struct PathPolicy {
    allowed_extensions: Vec<String>,
}

impl PathPolicy {
    pub fn new<I, S>(allowed_extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|ext| ext.into().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    /// Canonicalize `requested` and check that it names an existing regular
    /// file with an allowed extension.
    pub async fn check(&self, requested: &Path) -> Result<PathBuf, CoreError> {
        let canonical = fs::canonicalize(requested).await.map_err(|e| {
            CoreError::IoErrorString(format!("Cannot resolve {}: {}", requested.display(), e))
        })?;

        let metadata = fs::metadata(&canonical).await?;
        if !metadata.is_file() {
            return Err(CoreError::Rejected(format!(
                "{} is not a regular file",
                canonical.display()
            )));
        }

        let extension = canonical
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if !self.allowed_extensions.iter().any(|ext| *ext == extension) {
            return Err(CoreError::Rejected(format!(
                "{} does not have an allowed extension ({})",
                canonical.display(),
                self.allowed_extensions.join(", ")
            )));
        }

        Ok(canonical)
    }
}

impl Default for PathPolicy {
    fn default() -> Self {
        Self::new(["json5", "json"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn accepts_allowed_files_and_canonicalizes() {
        let dir = tempfile::tempdir().expect("tmp");
        std::fs::create_dir(dir.path().join("sub")).expect("mkdir");
        let file = dir.path().join("config.JSON5");
        std::fs::write(&file, "{}").expect("write");

        let policy = PathPolicy::new([".json5"]);
        let roundabout = dir.path().join("sub").join("..").join("config.JSON5");
        let checked = policy.check(&roundabout).await.expect("allowed");
        assert_eq!(checked, file.canonicalize().expect("canon"));
    }

    #[tokio::test]
    async fn rejects_directories_missing_files_and_other_extensions() {
        let dir = tempfile::tempdir().expect("tmp");
        let policy = PathPolicy::default();

        let err = policy.check(dir.path()).await.expect_err("directory");
        assert!(matches!(err, CoreError::Rejected(_)));

        let err = policy
            .check(&dir.path().join("absent.json5"))
            .await
            .expect_err("missing");
        assert!(matches!(err, CoreError::IoErrorString(_)));

        let script = dir.path().join("run.sh");
        std::fs::write(&script, "echo").expect("write");
        let err = policy.check(&script).await.expect_err("extension");
        assert!(err.to_string().contains("json5, json"));
    }
}
