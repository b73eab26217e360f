//! Directory creation helpers.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Ensures that a directory exists, creating it and all parents if needed.
///
/// # Errors
///
/// Fails if the directory cannot be created or if `path` exists but is not a
/// directory.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()));
    }
    Ok(())
}

/// Ensures that the parent directory of a file path exists.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        ensure_dir(parent)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_dir_creates_nested() {
        let temp = tempdir().unwrap();
        let nested = temp.path().join("a").join("b");

        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());

        // Second call is a no-op
        ensure_dir(&nested).unwrap();
    }

    #[test]
    fn test_ensure_dir_rejects_file() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();

        assert!(ensure_dir(&file).is_err());
    }

    #[test]
    fn test_ensure_parent_dir_with_bare_file_name() {
        // A bare file name has an empty parent, which means the current directory
        ensure_parent_dir(Path::new("fulfill_params.json")).unwrap();
    }
}
