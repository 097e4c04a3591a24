//! External whole-project dependency analysis
//!
//! The dependency-inference tool runs once per build, over every
//! verifier-native file (with dummy stand-ins for not-yet-translated
//! meta-source files on its include path), and prints make-style
//! `targets : sources` lines. Its output is rewritten into verified-artifact
//! ordering edges, dump-node edges, and extraction edges. The invocation is
//! synchronous with no timeout and no retry: a non-zero exit or a warning in
//! the output aborts the whole pass, because a partial dependency graph is
//! worse than none.

use crate::builder::GraphBuilder;
use crate::error::{BuildError, BuildResult};
use crate::source;
use std::path::Path;
use std::process::Command;

/// Handle on the external dependency-inference program.
#[derive(Debug, Clone)]
pub struct DependTool {
    program: String,
}

impl DependTool {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run the tool over `files` with the given include directories and
    /// return its stdout.
    pub fn run(
        &self,
        root: &Path,
        include_dirs: &[String],
        files: &[String],
    ) -> BuildResult<String> {
        let mut command = Command::new(&self.program);
        command.current_dir(root);
        for dir in include_dirs {
            command.arg("--include").arg(dir);
        }
        for file in files {
            command.arg(file);
        }
        tracing::info!(tool = %self.program, files = files.len(), "dependency analysis starting");
        let output = command.output().map_err(|e| BuildError::DependSpawn {
            tool: self.program.clone(),
            source: e,
        })?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BuildError::DependAnalysis {
                output: format!("{stdout}{stderr}"),
            });
        }
        tracing::info!("dependency analysis finished");
        Ok(stdout)
    }
}

impl GraphBuilder {
    /// Integrate the dependency tool's output into the graph.
    pub fn apply_depend_output(&mut self, output: &str) -> BuildResult<()> {
        let warnings: Vec<&str> = output
            .lines()
            .filter(|line| line.contains("Warning:"))
            .collect();
        if !warnings.is_empty() {
            return Err(BuildError::DependAnalysis {
                output: warnings.join("\n"),
            });
        }
        for line in output.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            // deprecation chatter of the form "(Warning 307) ..." is benign
            if line.contains("(Warning ") {
                continue;
            }
            self.apply_dep_line(line)?;
        }
        Ok(())
    }

    fn apply_dep_line(&mut self, line: &str) -> BuildResult<()> {
        // split on ': ', not ':', so drive-letter paths survive
        let (targets, sources) =
            line.split_once(": ")
                .ok_or_else(|| BuildError::MalformedDepLine {
                    line: line.to_string(),
                })?;
        let targets: Vec<String> = targets
            .split_whitespace()
            .map(|t| self.layout.rewrite_dummy(&source::normalize_path(t)))
            .collect();
        let sources: Vec<String> = sources
            .split_whitespace()
            .map(|s| self.layout.rewrite_dummy(&source::normalize_path(s)))
            .collect();
        self.warn_cross_area(&targets, &sources);

        // verified-artifact ordering: project-owned files only, foreign
        // files are pre-verified black boxes
        let targets_ver: Vec<String> = targets
            .iter()
            .filter(|t| self.is_project_path(t))
            .map(|t| source::verified_tmp(&self.layout.to_obj(t)))
            .collect();
        let sources_ver: Vec<String> = sources
            .iter()
            .filter(|s| self.is_project_path(s))
            .map(|s| source::verified(&self.layout.to_obj(s)))
            .collect();
        self.graph.add_dependency(targets_ver, sources_ver);
        self.add_extract_dependencies(&targets, &sources);

        for target in &targets {
            let target_dump = if self.is_project_path(target) {
                source::dump(&self.layout.to_obj(target))
            } else {
                self.foreign_dump_command(target)?
            };
            let deps: Vec<String> = sources
                .iter()
                .map(|s| {
                    if self.is_project_path(s) {
                        source::dump(&self.layout.to_obj(s))
                    } else {
                        self.layout.external_dump(s)
                    }
                })
                .collect();
            self.dump_deps.entry(target_dump).or_default().extend(deps);
        }
        Ok(())
    }

    /// Dump rule for a foreign file, under the shared external area. It is
    /// produced once, with default options, no matter how many project files
    /// reference it.
    fn foreign_dump_command(&mut self, path: &str) -> BuildResult<String> {
        let dump_file = self.layout.external_dump(path);
        let module = source::module_name_of(path);
        let verifier = self.manifest.tools.verifier.clone();
        self.graph.set_command(
            [dump_file.clone()],
            [path.to_string()],
            format!("{verifier} {path} --admit --dump-module {module} --out {dump_file}"),
        )?;
        Ok(dump_file)
    }

    fn warn_cross_area(&self, targets: &[String], sources: &[String]) {
        for target in targets {
            if !self.in_spec_area(target) {
                continue;
            }
            for dependency in sources {
                if self.is_project_path(dependency) && !self.in_spec_area(dependency) {
                    tracing::warn!(
                        "file {target} in a specification area depends on {dependency} outside it"
                    );
                }
            }
        }
    }

    fn in_spec_area(&self, path: &str) -> bool {
        // object-tree paths count through their source-tree mirror
        let prefix = format!("{}/", self.layout.root());
        let stripped = path.strip_prefix(&prefix).unwrap_or(path);
        self.manifest
            .paths
            .spec_areas
            .iter()
            .any(|area| source::path_under(area, stripped))
    }
}
