//! Per-file edge synthesis from meta-source directives
//!
//! Scanning one meta-source file turns its typed directives into graph
//! edges: meta-to-meta ordering, forced interface-verification edges, dump
//! references for the type-export builder, and extraction ordering.

use crate::builder::GraphBuilder;
use crate::directives::Directive;
use crate::error::{BuildError, BuildResult};
use crate::source::{self, SourceFile};

impl GraphBuilder {
    pub(crate) fn scan_meta_file(&mut self, file: &SourceFile, text: &str) -> BuildResult<()> {
        let directives = self.scanner.scan(text);
        let dirname = source::dir_of(file.path()).to_string();
        let obj_base = source::drop_extension(&self.layout.to_obj(file.path()));
        let fst = format!("{obj_base}.fst");
        let fsti = format!("{obj_base}.fsti");
        let impl_tmp = source::verified_tmp(&fst);
        let both_tmps = [source::verified_tmp(&fst), source::verified_tmp(&fsti)];
        let types = source::types_artifact(&obj_base);

        self.meta_dump_deps.entry(file.path().to_string()).or_default();
        self.meta_file_deps.entry(file.path().to_string()).or_default();
        // translation cannot start before the type import exists
        self.graph
            .add_dependency([fst.clone(), fsti.clone()], [types]);

        for directive in directives {
            match directive {
                Directive::IncludeTypes { module } => {
                    let interface = match self.registry.interface(&module) {
                        Some(interface) => interface.to_string(),
                        None => return Err(BuildError::unresolved(module, file.path())),
                    };
                    let dump_base = self.layout.to_obj(&interface);
                    if !self.is_project_path(&dump_base) {
                        return Err(BuildError::ForeignTypeInclude {
                            module,
                            path: interface,
                        });
                    }
                    self.meta_dump_deps
                        .entry(file.path().to_string())
                        .or_default()
                        .insert(source::dump(&dump_base));
                }
                Directive::IncludeFile { path, from_base } => {
                    let anchor = if from_base {
                        self.manifest.paths.base_root().to_string()
                    } else {
                        dirname.clone()
                    };
                    let included = source::join_path(&anchor, &path);
                    self.meta_file_deps
                        .entry(file.path().to_string())
                        .or_default()
                        .insert(included.clone());
                    // if A includes B, both of A's verification steps wait
                    // for B's generated interface to be verified
                    let inc_base = source::drop_extension(&self.layout.to_obj(&included));
                    self.graph.add_dependency(
                        both_tmps.clone(),
                        [source::verified(&format!("{inc_base}.fsti"))],
                    );
                    self.add_extract_dependencies(&[fst.clone()], &[format!("{inc_base}.fst")]);
                }
                Directive::Open { module } => {
                    if let Some(interface) = self.lookup_reference(&module, file)? {
                        let obj_interface = self.layout.to_obj(&interface);
                        self.graph
                            .add_dependency(both_tmps.clone(), [source::verified(&obj_interface)]);
                        self.add_extract_dependencies(&[fst.clone()], &[interface]);
                    }
                }
                Directive::Friend { module } => {
                    if let Some(interface) = self.lookup_reference(&module, file)? {
                        // friend code sees internal definitions, so the
                        // implementation itself must be verified, not just
                        // the interface
                        let impl_path = format!("{}.fst", source::drop_extension(&interface));
                        let obj_impl = self.layout.to_obj(&impl_path);
                        self.graph
                            .add_dependency([impl_tmp.clone()], [source::verified(&obj_impl)]);
                        self.add_extract_dependencies(&[fst.clone()], &[interface]);
                    }
                }
            }
        }
        Ok(())
    }

    /// Resolve a by-name reference. Lenient mode drops unknown names with a
    /// breadcrumb; strict mode fails the pass.
    fn lookup_reference(&self, module: &str, file: &SourceFile) -> BuildResult<Option<String>> {
        match self.registry.interface(module) {
            Some(interface) => Ok(Some(interface.to_string())),
            None if self.manifest.options.strict_references => {
                Err(BuildError::unresolved(module, file.path()))
            }
            None => {
                tracing::debug!(
                    module,
                    file = file.path(),
                    "skipping unresolved module reference"
                );
                Ok(None)
            }
        }
    }

    pub(crate) fn is_project_path(&self, path: &str) -> bool {
        self.layout
            .is_project(path, &self.manifest.paths.source_roots)
    }

    /// Mirror a dependency into extraction space: each project-owned file
    /// maps to its extraction artifact, the manifest's exclusions and
    /// self-edges are filtered out.
    pub(crate) fn add_extract_dependencies(&mut self, targets: &[String], sources: &[String]) {
        if !self.manifest.extraction.enabled {
            return;
        }
        let targets_ml = self.extraction_artifacts(targets);
        let mut sources_ml = self.extraction_artifacts(sources);
        sources_ml.retain(|s| !targets_ml.contains(s));
        if targets_ml.is_empty() || sources_ml.is_empty() {
            return;
        }
        self.graph
            .add_dependency(targets_ml.clone(), sources_ml.clone());
        for target in targets_ml {
            self.extract_deps
                .entry(target)
                .or_default()
                .extend(sources_ml.iter().cloned());
        }
    }

    fn extraction_artifacts(&self, paths: &[String]) -> Vec<String> {
        paths
            .iter()
            .filter(|path| self.is_project_path(path))
            .map(|path| self.layout.extracted(&source::module_name_of(path), ".ml"))
            .filter(|artifact| !self.no_extract.contains(artifact))
            .collect()
    }
}
