//! Server configuration.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Settings shared by every tool call.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    project_root: PathBuf,
}

impl ServerConfig {
    /// Builds a configuration rooted at `root`, which must be an existing directory.
    ///
    /// The root is canonicalized so confinement checks compare real paths.
    pub fn from_root(root: &Path) -> Result<Self> {
        let project_root = root
            .canonicalize()
            .with_context(|| format!("Project root not accessible: {}", root.display()))?;
        if !project_root.is_dir() {
            bail!("Project root is not a directory: {}", project_root.display());
        }
        Ok(Self { project_root })
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }
}
