//! CLI command implementations

pub mod generate;
pub mod modules;
pub mod order;

use anyhow::{Context, Result};
use std::path::Path;
use strata_manifest::ProjectManifest;

/// Load the project manifest, with path context on failure.
pub(crate) fn load_manifest(project_dir: &Path, manifest_name: &Path) -> Result<ProjectManifest> {
    let path = project_dir.join(manifest_name);
    ProjectManifest::from_file(&path)
        .with_context(|| format!("failed to load manifest {}", path.display()))
}
