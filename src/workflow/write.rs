//! Output persistence.

use std::path::Path;

use tokio::fs;

use super::WorkflowError;

/// Write `contents` to `path`, creating missing parent directories first.
///
/// `create_dir_all` succeeds when the directory already exists, so tasks
/// racing on the same directory are fine.
pub async fn write_file(path: &Path, contents: &str) -> Result<(), WorkflowError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .await
            .map_err(|source| WorkflowError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    fs::write(path, contents)
        .await
        .map_err(|source| WorkflowError::Write {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_creates_parents() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("x/y/z.html");
        write_file(&path, "<p>hi</p>").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<p>hi</p>");
    }

    #[tokio::test]
    async fn test_concurrent_directory_creation() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("shared/dir");
        let first = dir.join("a.html");
        let second = dir.join("b.html");
        let (a, b) = tokio::join!(write_file(&first, "a"), write_file(&second, "b"));
        a.unwrap();
        b.unwrap();
        assert!(first.is_file() && second.is_file());
    }

    #[tokio::test]
    async fn test_write_into_file_fails() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let err = write_file(&blocker.join("a.html"), "a").await.unwrap_err();
        assert!(matches!(err, WorkflowError::CreateDir { .. }));
    }
}
