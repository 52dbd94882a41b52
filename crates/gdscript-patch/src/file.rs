//! Scoped script I/O.
//!
//! Writes go to a temporary file in the target's directory which is flushed,
//! synced and then renamed over the target, so a failed write leaves the
//! previous contents in place and no handle outlives the call.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::PatchError;
use crate::patch::{PatchOutcome, PatchRequest};

/// Result of [`patch_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilePatchReport {
    pub outcome: PatchOutcome,
    pub bytes_written: usize,
}

/// Reads a UTF-8 script.
pub fn read_source(path: &Path) -> Result<String, PatchError> {
    fs::read_to_string(path).map_err(|e| PatchError::io(path, e))
}

/// Replaces the contents of `path` with `text`, creating parent directories.
///
/// Existing file permissions are carried over to the new contents.
pub fn write_source(path: &Path, text: &str) -> Result<(), PatchError> {
    let io_err = |e: std::io::Error| PatchError::io(path, e);

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(io_err)?;

    let mut staged = NamedTempFile::new_in(parent).map_err(io_err)?;
    if let Ok(metadata) = fs::metadata(path) {
        staged
            .as_file()
            .set_permissions(metadata.permissions())
            .map_err(io_err)?;
    }
    staged.write_all(text.as_bytes()).map_err(io_err)?;
    staged.flush().map_err(io_err)?;
    staged.as_file().sync_all().map_err(io_err)?;
    staged.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

/// Applies `request` to the script at `path` and writes the result back.
///
/// The file is only rewritten when the patch succeeds.
pub fn patch_file(path: &Path, request: &PatchRequest) -> Result<FilePatchReport, PatchError> {
    let original = read_source(path)?;
    let patched = request.apply(&original)?;
    write_source(path, &patched.text)?;
    Ok(FilePatchReport {
        outcome: patched.outcome,
        bytes_written: patched.text.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn patch_file_rewrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("player.gd");
        fs::write(&path, "func a():\n\tpass\nfunc b():\n\tpass\n").unwrap();

        let request = PatchRequest::new("a", "func a():\n\treturn 1");
        let report = patch_file(&path, &request).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "func a():\n\treturn 1\n\nfunc b():\n\tpass\n");
        assert_eq!(report.bytes_written, written.len());
        assert_eq!(report.outcome, PatchOutcome::Replaced { line: 1 });
    }

    #[test]
    fn failed_patch_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dupes.gd");
        let original = "func a():\n\tpass\n\nfunc a():\n\tpass\n";
        fs::write(&path, original).unwrap();

        let err = patch_file(&path, &PatchRequest::new("a", "func a():\n\treturn")).unwrap_err();
        assert_eq!(err.code(), "P002");
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn missing_file_is_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.gd");
        let err = patch_file(&path, &PatchRequest::new("a", "func a():\n\tpass")).unwrap_err();
        assert_eq!(err.code(), "P003");
        assert!(err.to_string().contains("missing.gd"));
    }

    #[test]
    fn write_source_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scripts/enemies/slime.gd");
        write_source(&path, "extends Node\n").unwrap();
        assert_eq!(read_source(&path).unwrap(), "extends Node\n");

        write_source(&path, "extends Node2D\n").unwrap();
        assert_eq!(read_source(&path).unwrap(), "extends Node2D\n");
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn non_utf8_source_is_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("binary.gd");
        fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        assert_eq!(read_source(&path).unwrap_err().code(), "P003");
    }
}
