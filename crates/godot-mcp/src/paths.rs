//! Confinement of tool paths to the project root.

use std::path::{Component, Path, PathBuf};

use gdscript_patch::PatchError;

/// Extension accepted by the script tools.
pub const SCRIPT_EXTENSION: &str = "gd";

/// Joins `rel` onto `root`, rejecting anything that could escape it.
pub fn safe_relpath_join(root: &Path, rel: &str) -> Result<PathBuf, &'static str> {
    let p = Path::new(rel);

    if p.is_absolute() || rel.starts_with('/') || rel.starts_with('\\') {
        return Err("absolute paths are not allowed");
    }

    let mut cleaned = PathBuf::new();
    for c in p.components() {
        match c {
            Component::Normal(s) => {
                // Windows separators are not components on Unix.
                if s.to_string_lossy().split('\\').any(|part| part == "..") {
                    return Err("'..' path traversal is not allowed");
                }
                cleaned.push(s)
            }
            Component::CurDir => {}
            Component::ParentDir => return Err("'..' path traversal is not allowed"),
            Component::Prefix(_) | Component::RootDir => {
                return Err("path prefixes/root are not allowed")
            }
        }
    }

    if cleaned.as_os_str().is_empty() {
        return Err("empty paths are not allowed");
    }

    Ok(root.join(cleaned))
}

/// Resolves a project-relative `.gd` path.
///
/// `res://` prefixes are accepted since agents copy paths from Godot. `root`
/// must be canonical. The real path of the deepest part of the target that
/// already exists, the file itself or its nearest existing ancestor, must be
/// inside the root, so a symlinked file or directory cannot lead out of the
/// project, including for files that do not exist yet.
pub fn resolve_script_path(root: &Path, rel: &str) -> Result<PathBuf, PatchError> {
    let rel = rel.trim();
    let rel = rel.strip_prefix("res://").unwrap_or(rel);

    let path = safe_relpath_join(root, rel)
        .map_err(|msg| PatchError::invalid(format!("invalid path '{rel}': {msg}")))?;

    if path.extension().and_then(|ext| ext.to_str()) != Some(SCRIPT_EXTENSION) {
        return Err(PatchError::invalid(format!(
            "invalid path '{rel}': only .{SCRIPT_EXTENSION} scripts are supported"
        )));
    }

    let existing = path
        .ancestors()
        .find(|ancestor| ancestor.symlink_metadata().is_ok())
        .unwrap_or(root);
    // A dangling symlink has metadata but no real path.
    let real = existing.canonicalize().map_err(|_| {
        PatchError::invalid(format!(
            "invalid path '{rel}': '{}' cannot be resolved",
            existing.display()
        ))
    })?;
    if !real.starts_with(root) {
        return Err(PatchError::invalid(format!(
            "invalid path '{rel}': resolves outside the project root"
        )));
    }

    Ok(path)
}
