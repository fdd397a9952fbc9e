//! Output formatting and persistence
//!
//! - `json`: per-sample summary artifacts
//! - `csv`: per-window tables, curve exports, workload-level tables
//! - `text`: console reports
//!
//! Every file is written through [`write_atomic`], so an artifact present under
//! its final name is always complete.

pub mod csv;
pub mod json;
pub mod text;

use crate::Result;
use anyhow::Context;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Write a file by filling a temporary sibling and renaming it into place
///
/// The temporary file lives in the destination directory so the final rename
/// stays on one filesystem. Parent directories are created as needed.
pub fn write_atomic<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    {
        let mut writer = std::io::BufWriter::new(tmp.as_file_mut());
        fill(&mut writer)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .with_context(|| format!("Failed to move output into place: {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/out.txt");
        write_atomic(&path, |w| {
            writeln!(w, "hello")?;
            Ok(())
        })
        .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
    }

    #[test]
    fn test_failed_fill_leaves_no_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.txt");
        let result = write_atomic(&path, |w| {
            writeln!(w, "partial")?;
            anyhow::bail!("interrupted")
        });
        assert!(result.is_err());
        assert!(!path.exists());
        // The temporary file is removed on drop
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
