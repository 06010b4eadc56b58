use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// The default/only shipped collaborator for spec §6.4's writer items
/// (SPEC_FULL §10.6): persists `DownloadUrl`/`SaveFileContent` bytes to an
/// absolute path, creating intermediate directories as needed.
pub trait Writer: Send + Sync {
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct FsWriter;

impl Writer for FsWriter {
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
    }
}

impl fmt::Display for FsWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FsWriter")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_intermediate_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/c.txt");
        FsWriter.write(&path, b"hello").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"hello");
    }

    #[test]
    fn overwrites_an_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        FsWriter.write(&path, b"first").unwrap();
        FsWriter.write(&path, b"second").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"second");
    }
}
