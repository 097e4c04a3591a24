//! Modules command - list resolvable modules

use anyhow::{Context, Result};
use std::path::Path;
use strata_build::GraphBuilder;

pub fn run(project_dir: &Path, manifest_name: &Path) -> Result<()> {
    let manifest = super::load_manifest(project_dir, manifest_name)?;
    let mut builder = GraphBuilder::new(project_dir.to_path_buf(), manifest)
        .context("failed to set up graph construction")?;
    builder.discover().context("source discovery failed")?;
    for (module, interface) in builder.registry().modules() {
        println!("{module} {interface}");
    }
    Ok(())
}
