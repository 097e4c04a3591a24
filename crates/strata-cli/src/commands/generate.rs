//! Gen command - construct the graph and write backend build files

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use strata_build::GraphBuilder;
use strata_graph::{Emitter, MakeEmitter, NinjaEmitter};

pub fn run(
    project_dir: &Path,
    manifest_name: &Path,
    make: Option<PathBuf>,
    ninja: Option<PathBuf>,
    extract: bool,
) -> Result<()> {
    let mut manifest = super::load_manifest(project_dir, manifest_name)?;
    if extract {
        manifest.extraction.enabled = true;
    }

    let mut builder = GraphBuilder::new(project_dir.to_path_buf(), manifest)
        .context("failed to set up graph construction")?;
    builder.run().context("graph construction failed")?;
    let graph = builder.graph();

    // Render everything first, then write: a failed pass must never leave a
    // partial build description behind.
    let mut outputs: Vec<(PathBuf, String)> = Vec::new();
    if let Some(path) = make {
        outputs.push((path, MakeEmitter::new().emit(graph)));
    }
    if let Some(path) = ninja {
        outputs.push((path, NinjaEmitter::new().emit(graph)));
    }
    if outputs.is_empty() {
        let emitter = MakeEmitter::new();
        outputs.push((PathBuf::from(emitter.default_file_name()), emitter.emit(graph)));
    }
    for (path, text) in outputs {
        let path = project_dir.join(path);
        fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))?;
        println!("wrote {}", path.display());
    }
    println!(
        "{} targets across {} modules",
        graph.len(),
        builder.registry().len()
    );
    Ok(())
}
