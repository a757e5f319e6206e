//! Output file writer.
//!
//! Every generated file goes through [`write_output`]: written to a dot-prefixed
//! temporary sibling, then renamed over the target. Existing files are
//! replaced unconditionally.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

use advisorygen_shared::{AdvisoryError, Result};

/// Metadata for one written file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub sha256: String,
    pub size_bytes: usize,
}

/// Write `content` to `path`, creating parent directories as needed.
pub fn write_output(path: &Path, content: &str) -> Result<WrittenFile> {
    let parent = path.parent().ok_or_else(|| {
        AdvisoryError::validation(format!("no parent directory for {}", path.display()))
    })?;
    std::fs::create_dir_all(parent).map_err(|e| AdvisoryError::io(parent, e))?;

    let file_name = path
        .file_name()
        .ok_or_else(|| AdvisoryError::validation(format!("no file name in {}", path.display())))?
        .to_string_lossy();
    let temp = parent.join(format!(".{file_name}.tmp"));

    std::fs::write(&temp, content).map_err(|e| AdvisoryError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| AdvisoryError::io(path, e))?;

    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let sha256 = format!("{:x}", hasher.finalize());

    debug!(path = %path.display(), size = content.len(), "wrote output file");

    Ok(WrittenFile {
        path: path.to_path_buf(),
        sha256,
        size_bytes: content.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("advisorygen-output-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn writes_file_and_creates_parents() {
        let tmp = temp_dir();
        let target = tmp.join("advisories").join("page.php");

        let written = write_output(&target, "hello").unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "hello");
        assert_eq!(written.size_bytes, 5);
        assert_eq!(written.sha256.len(), 64);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn overwrites_existing_file() {
        let tmp = temp_dir();
        let target = tmp.join("page.php");
        std::fs::write(&target, "old content that is longer").unwrap();

        write_output(&target, "new").unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "new");

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn same_content_same_digest_and_no_temp_left() {
        let tmp = temp_dir();
        let target = tmp.join("side.php");

        let first = write_output(&target, "<p>x</p>").unwrap();
        let second = write_output(&target, "<p>x</p>").unwrap();
        assert_eq!(first, second);

        for entry in std::fs::read_dir(&tmp).unwrap() {
            let name = entry.unwrap().file_name().to_string_lossy().to_string();
            assert!(!name.starts_with('.'), "temp file left behind: {name}");
        }

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
