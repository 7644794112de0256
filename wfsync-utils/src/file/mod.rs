//! File system helpers.

use std::fs;
use std::path::{Path, PathBuf};

/// Normalize path lexically (`a/b/../c` becomes `a/c`)
pub fn normalize_path(path: &Path) -> PathBuf {
    path_clean::clean(path)
}

/// Check that `path` resolves inside `root`.
///
/// Both paths are canonicalized when they exist so symlinks cannot escape the
/// project root; otherwise the lexical normal form is compared.
pub fn is_within_root(path: &Path, root: &Path) -> bool {
    let resolved = path.canonicalize().unwrap_or_else(|_| normalize_path(path));
    let root = root.canonicalize().unwrap_or_else(|_| normalize_path(root));
    resolved.starts_with(root)
}

/// Read a text file, replacing invalid UTF-8 sequences
pub fn read_text_file(path: &Path) -> crate::Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
            let bytes = fs::read(path)?;
            Ok(String::from_utf8_lossy(&bytes).to_string())
        }
        Err(e) => Err(e.into()),
    }
}

/// Ensure directory exists (mkdir -p)
pub fn ensure_dir(path: &Path) -> crate::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    } else if !path.is_dir() {
        return Err(crate::UtilError::PathOperation(format!(
            "Path exists but is not a directory: {}",
            path.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_normalize_path() {
        let path = Path::new("/a/b/../c/./d");
        assert_eq!(normalize_path(path), PathBuf::from("/a/c/d"));
    }

    #[test]
    fn test_is_within_root() -> crate::Result<()> {
        let temp_dir = tempdir()?;
        let root = temp_dir.path();
        let inner = root.join("stories").join("a.md");
        fs::create_dir_all(inner.parent().unwrap())?;
        fs::write(&inner, "x")?;

        assert!(is_within_root(&inner, root));
        assert!(!is_within_root(Path::new("/etc/passwd"), root));
        assert!(!is_within_root(&root.join("../outside.md"), root));
        Ok(())
    }

    #[test]
    fn test_ensure_dir() -> crate::Result<()> {
        let temp_dir = tempdir()?;
        let nested = temp_dir.path().join("a").join("b");
        ensure_dir(&nested)?;
        assert!(nested.is_dir());

        let file = temp_dir.path().join("file.txt");
        fs::write(&file, "x")?;
        assert!(ensure_dir(&file).is_err());
        Ok(())
    }

    #[test]
    fn test_read_text_file_lossy() -> crate::Result<()> {
        let temp_dir = tempdir()?;
        let path = temp_dir.path().join("bad.md");
        fs::write(&path, [b'o', b'k', 0xFF])?;
        let content = read_text_file(&path)?;
        assert!(content.starts_with("ok"));
        Ok(())
    }
}
