//! Graph construction orchestration
//!
//! One `GraphBuilder` owns every piece of shared state for a construction
//! pass: the target graph, the module registry, and the dependency maps the
//! topological builder consumes. Construction is single-threaded and staged:
//! discover and register sources, synthesize per-file rules, integrate the
//! external dependency analysis, then compute type-export orders. Nothing is
//! mutated after the pass completes; emitters only read.

use crate::depend::DependTool;
use crate::directives::DirectiveScanner;
use crate::error::{BuildError, BuildResult};
use crate::registry::ModuleRegistry;
use crate::source::{self, ObjectLayout, SourceFile, SourceKind};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;
use strata_graph::TargetGraph;
use strata_manifest::{OptionTable, ProjectManifest};
use walkdir::WalkDir;

pub struct GraphBuilder {
    pub(crate) root: PathBuf,
    pub(crate) manifest: ProjectManifest,
    pub(crate) options: OptionTable,
    pub(crate) layout: ObjectLayout,
    pub(crate) scanner: DirectiveScanner,
    pub(crate) graph: TargetGraph,
    pub(crate) registry: ModuleRegistry,
    /// Discovered project sources, sorted by path.
    pub(crate) sources: Vec<SourceFile>,
    /// Object-tree copies of declared foreign files.
    pub(crate) foreign: Vec<SourceFile>,
    pub(crate) src_include_dirs: Vec<String>,
    pub(crate) obj_include_dirs: Vec<String>,
    /// Dump artifact -> dump artifacts it depends on.
    pub(crate) dump_deps: BTreeMap<String, BTreeSet<String>>,
    /// Meta-source path -> dump artifacts it references directly.
    pub(crate) meta_dump_deps: BTreeMap<String, BTreeSet<String>>,
    /// Meta-source path -> meta-source files it includes.
    pub(crate) meta_file_deps: BTreeMap<String, BTreeSet<String>>,
    /// Extraction artifact -> extraction artifacts it depends on.
    pub(crate) extract_deps: BTreeMap<String, BTreeSet<String>>,
    /// Meta-source path -> ordered dump list fed to the type-import tool.
    pub(crate) export_orders: BTreeMap<String, Vec<String>>,
    /// Extraction artifacts excluded by the manifest.
    pub(crate) no_extract: BTreeSet<String>,
}

impl GraphBuilder {
    /// Create a builder for the project rooted at `root`.
    pub fn new(root: impl Into<PathBuf>, manifest: ProjectManifest) -> BuildResult<Self> {
        let options = manifest.option_table()?;
        let layout = ObjectLayout::new(&manifest.paths.object_root);
        let no_extract = manifest
            .extraction
            .no_extract
            .iter()
            .map(|module| layout.extracted(module, ".ml"))
            .collect();
        Ok(Self {
            root: root.into(),
            manifest,
            options,
            layout,
            scanner: DirectiveScanner::new(),
            graph: TargetGraph::new(),
            registry: ModuleRegistry::new(),
            sources: Vec::new(),
            foreign: Vec::new(),
            src_include_dirs: Vec::new(),
            obj_include_dirs: Vec::new(),
            dump_deps: BTreeMap::new(),
            meta_dump_deps: BTreeMap::new(),
            meta_file_deps: BTreeMap::new(),
            extract_deps: BTreeMap::new(),
            export_orders: BTreeMap::new(),
            no_extract,
        })
    }

    /// Run the whole construction pass, invoking the external dependency
    /// tool. Any error aborts before a backend file could be written.
    pub fn run(&mut self) -> BuildResult<()> {
        self.discover()?;
        self.process_sources()?;
        let analysis = self.run_depend_tool()?;
        self.apply_depend_output(&analysis)?;
        self.finish()
    }

    /// Walk the source roots, classify files, and populate the registry.
    pub fn discover(&mut self) -> BuildResult<()> {
        let mut found = Vec::new();
        for source_root in &self.manifest.paths.source_roots {
            let dir = self.root.join(source_root);
            if !dir.is_dir() {
                continue;
            }
            for entry in WalkDir::new(&dir).into_iter().filter_map(Result::ok) {
                if !entry.file_type().is_file() {
                    continue;
                }
                let rel = entry.path().strip_prefix(&self.root).unwrap_or(entry.path());
                if let Some(file) = SourceFile::discover(rel) {
                    found.push(file);
                }
            }
        }
        found.sort_by(|a, b| a.path().cmp(b.path()));
        found.dedup();
        self.sources = found;
        self.prepare_object_tree()?;
        self.register_sources()
    }

    fn prepare_object_tree(&self) -> BuildResult<()> {
        let mut dirs = vec![
            self.layout.root().to_string(),
            self.layout.external_root().to_string(),
        ];
        if self.manifest.extraction.enabled {
            dirs.push(self.layout.extract_root().to_string());
        }
        for dir in dirs {
            let path = self.root.join(dir);
            fs::create_dir_all(&path).map_err(|e| BuildError::io(&path, e))?;
        }
        Ok(())
    }

    /// Populate the module registry and include paths.
    ///
    /// Implementations claim module names first, interface files refine the
    /// interface mapping, foreign files follow, and meta-source files come
    /// last: their generated interface is registered before translation is
    /// modeled so other files can already resolve the name.
    fn register_sources(&mut self) -> BuildResult<()> {
        let sources = self.sources.clone();
        for file in sources.iter().filter(|f| f.kind() == SourceKind::Implementation) {
            self.add_src_include_dir(file.path())?;
            if self.options.resolve(file.path()).is_some() {
                let module = file.module_name();
                self.registry.register(module.clone(), file.path())?;
                self.registry.record_interface(module, file.path());
            }
        }
        for file in sources.iter().filter(|f| f.kind() == SourceKind::Interface) {
            self.add_src_include_dir(file.path())?;
            if self.options.resolve(file.path()).is_some() {
                self.registry.record_interface(file.module_name(), file.path());
            }
        }
        let foreign_files = self.manifest.foreign.clone();
        for foreign in &foreign_files {
            let original = source::normalize_path(&foreign.path);
            let copy = self.layout.external_copy(&original);
            self.graph.copy(copy.clone(), original)?;
            if let Some(file) = SourceFile::discover(&copy) {
                self.registry
                    .record_interface(file.module_name(), file.path().to_string());
                self.foreign.push(file);
            }
        }
        for file in sources.iter().filter(|f| f.kind() == SourceKind::MetaSource) {
            self.add_obj_include_dir(file.path());
            if self.options.resolve(file.path()).is_some() {
                let module = file.module_name();
                let obj_base = source::drop_extension(&self.layout.to_obj(file.path()));
                self.registry.register(module.clone(), file.path())?;
                self.registry
                    .record_interface(module.clone(), format!("{obj_base}.fsti"));
                self.write_dummies(file, &module)?;
            }
        }
        Ok(())
    }

    /// The external dependency analysis runs before meta-source files are
    /// translated, so each gets a dummy interface/implementation pair under
    /// the placeholder object tree.
    fn write_dummies(&self, file: &SourceFile, module: &str) -> BuildResult<()> {
        let base = source::drop_extension(file.path());
        for extension in ["fst", "fsti"] {
            let dummy = self.root.join(self.layout.dummy(&base, extension));
            if let Some(parent) = dummy.parent() {
                fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
            }
            fs::write(&dummy, format!("module {module}\n"))
                .map_err(|e| BuildError::io(&dummy, e))?;
        }
        let obj_dir = self
            .root
            .join(source::dir_of(&self.layout.to_obj(file.path())));
        fs::create_dir_all(&obj_dir).map_err(|e| BuildError::io(&obj_dir, e))?;
        Ok(())
    }

    fn add_src_include_dir(&mut self, path: &str) -> BuildResult<()> {
        let dir = source::dir_of(path).to_string();
        if !self.src_include_dirs.contains(&dir) {
            self.src_include_dirs.push(dir.clone());
            let obj_dir = self.root.join(self.layout.to_obj(&dir));
            fs::create_dir_all(&obj_dir).map_err(|e| BuildError::io(&obj_dir, e))?;
        }
        Ok(())
    }

    fn add_obj_include_dir(&mut self, path: &str) {
        let dir = source::dir_of(path).to_string();
        if !self.obj_include_dirs.contains(&dir) {
            self.obj_include_dirs.push(dir);
        }
    }

    /// Include directories handed to the external tools; `obj_prefix` is the
    /// real object root for verification, the dummy tree for the dependency
    /// analysis.
    pub(crate) fn include_dirs(&self, obj_prefix: &str) -> Vec<String> {
        let mut dirs = self.src_include_dirs.clone();
        dirs.push(self.layout.external_root().to_string());
        dirs.extend(
            self.obj_include_dirs
                .iter()
                .map(|dir| format!("{obj_prefix}/{dir}")),
        );
        dirs
    }

    fn include_flags(&self, obj_prefix: &str) -> String {
        self.include_dirs(obj_prefix)
            .iter()
            .map(|dir| format!(" --include {dir}"))
            .collect()
    }

    /// Synthesize the per-file rules: verification, translation, dumps,
    /// copies, extraction.
    pub fn process_sources(&mut self) -> BuildResult<()> {
        let includes = self.include_flags(&self.layout.root().to_string());
        let sources = self.sources.clone();
        let foreign = self.foreign.clone();
        for file in sources.iter().filter(|f| f.kind() != SourceKind::MetaSource) {
            self.verify_and_dump(file.path(), file.kind(), &includes)?;
        }
        for file in &foreign {
            self.verify_and_dump(file.path(), file.kind(), &includes)?;
        }
        for file in sources.iter().filter(|f| f.kind() == SourceKind::MetaSource) {
            self.process_meta(file, &includes)?;
        }
        Ok(())
    }

    /// Verification and type-dump rules for one verifier-native file, either
    /// a discovered source or a translation product under the object root.
    fn verify_and_dump(
        &mut self,
        source_path: &str,
        kind: SourceKind,
        includes: &str,
    ) -> BuildResult<()> {
        let flags = match self.options.resolve(source_path) {
            Some(bundle) => bundle.verifier_flags.clone(),
            None => return Ok(()),
        };
        let verifier = self.manifest.tools.verifier.clone();
        let obj = self.layout.to_obj(source_path);
        let target = source::verified(&obj);
        let tmp = source::verified_tmp(&obj);
        self.graph.set_command(
            [tmp.clone()],
            [source_path.to_string()],
            format!("{verifier} {source_path} {flags}{includes} --out {tmp}"),
        )?;
        self.graph.copy(target.clone(), tmp)?;
        let module = source::module_name_of(source_path);
        let dump_file = source::dump(&obj);
        self.graph.set_command(
            [dump_file.clone()],
            [source_path.to_string()],
            format!(
                "{verifier} {source_path} {flags}{includes} --admit --dump-module {module} --out {dump_file}"
            ),
        )?;
        self.graph.add_dependency([dump_file], [target]);
        if kind == SourceKind::Implementation {
            self.extract_file(source_path, &flags, includes)?;
        }
        Ok(())
    }

    /// Extraction rule for one implementation file, unless extraction is off
    /// or the module is excluded.
    fn extract_file(&mut self, source_path: &str, flags: &str, includes: &str) -> BuildResult<()> {
        if !self.manifest.extraction.enabled {
            return Ok(());
        }
        let module = source::module_name_of(source_path);
        let artifact = self.layout.extracted(&module, ".ml");
        if self.no_extract.contains(&artifact) {
            return Ok(());
        }
        let obj = self.layout.to_obj(source_path);
        self.graph
            .add_dependency([artifact.clone()], [source::verified(&obj)]);
        let extract = self.manifest.tools.extract.clone();
        let odir = self.layout.extract_root().to_string();
        self.graph.set_command(
            [artifact],
            [source_path.to_string()],
            format!("{extract} {source_path} {flags}{includes} --odir {odir} --module {module}"),
        )?;
        Ok(())
    }

    /// Rules for one meta-source file: directive scan, translation into the
    /// interface/implementation pair, verification of both, and the forced
    /// interface-before-implementation edge.
    fn process_meta(&mut self, file: &SourceFile, includes: &str) -> BuildResult<()> {
        let meta_includes = match self.options.resolve(file.path()) {
            Some(bundle) => bundle.meta_includes.clone(),
            None => return Ok(()),
        };
        let disk = self.root.join(file.path());
        let text = fs::read_to_string(&disk).map_err(|e| BuildError::io(&disk, e))?;
        self.scan_meta_file(file, &text)?;

        let obj_base = source::drop_extension(&self.layout.to_obj(file.path()));
        let fst = format!("{obj_base}.fst");
        let fsti = format!("{obj_base}.fsti");
        let types = source::types_artifact(&obj_base);
        let translator = self.manifest.tools.translator.clone();
        let meta_includes = meta_includes
            .or_else(|| self.manifest.options.meta_includes.clone())
            .unwrap_or_default();
        let extra = if meta_includes.is_empty() {
            String::new()
        } else {
            format!(" {meta_includes}")
        };
        self.graph.set_command(
            [fst.clone(), fsti.clone()],
            [file.path().to_string()],
            format!(
                "{translator} -in {} -out {fst} -outi {fsti} -types {types}{extra}",
                file.path()
            ),
        )?;
        self.verify_and_dump(&fst, SourceKind::Implementation, includes)?;
        self.verify_and_dump(&fsti, SourceKind::Interface, includes)?;
        // the generated interface must check before the implementation's own
        // check starts
        self.graph
            .add_dependency([source::verified_tmp(&fst)], [source::verified(&fsti)]);
        Ok(())
    }

    /// Invoke the whole-project dependency-inference tool once, over every
    /// verifier-native file that participates in the build.
    pub fn run_depend_tool(&self) -> BuildResult<String> {
        let files: Vec<String> = self
            .sources
            .iter()
            .filter(|f| f.kind() != SourceKind::MetaSource)
            .filter(|f| self.options.resolve(f.path()).is_some())
            .map(|f| f.path().to_string())
            .collect();
        let include_dirs = self.include_dirs(self.layout.dummy_root());
        DependTool::new(&self.manifest.tools.depend).run(&self.root, &include_dirs, &files)
    }

    /// Compute type-export orders and apply manual edges. Called after the
    /// dependency analysis has been applied.
    pub fn finish(&mut self) -> BuildResult<()> {
        self.compute_export_orders()?;
        let manual = self.manifest.manual_dependencies.clone();
        for (target, sources) in manual {
            self.graph.add_dependency([target], sources);
        }
        Ok(())
    }

    pub fn graph(&self) -> &TargetGraph {
        &self.graph
    }

    pub fn into_graph(self) -> TargetGraph {
        self.graph
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn manifest(&self) -> &ProjectManifest {
        &self.manifest
    }

    /// Ordered dump list computed for a meta-source file, if any.
    pub fn export_order(&self, meta: &str) -> Option<&[String]> {
        self.export_orders.get(meta).map(Vec::as_slice)
    }

    pub fn export_orders(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.export_orders
            .iter()
            .map(|(meta, order)| (meta.as_str(), order.as_slice()))
    }

    /// Extraction ordering edges accumulated from the scan and the
    /// dependency analysis.
    pub fn extract_deps(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.extract_deps
    }

    /// Dump artifacts a dump artifact depends on, if any were recorded.
    pub fn dump_dependencies(&self, dump: &str) -> Option<&BTreeSet<String>> {
        self.dump_deps.get(dump)
    }
}
