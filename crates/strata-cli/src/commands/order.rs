//! Order command - show the type-export order for a meta-source file

use anyhow::{bail, Context, Result};
use std::path::Path;
use strata_build::GraphBuilder;

pub fn run(project_dir: &Path, manifest_name: &Path, file: &str) -> Result<()> {
    let manifest = super::load_manifest(project_dir, manifest_name)?;
    let mut builder = GraphBuilder::new(project_dir.to_path_buf(), manifest)
        .context("failed to set up graph construction")?;
    builder.run().context("graph construction failed")?;
    match builder.export_order(file) {
        Some(order) => {
            for dump in order {
                println!("{dump}");
            }
            Ok(())
        }
        None => bail!("no type-export order for '{file}': not a meta-source file with build options"),
    }
}
