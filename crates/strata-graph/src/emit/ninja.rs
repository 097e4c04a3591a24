//! Ninja backend
//!
//! Ninja has no standalone ordering statements, so each target's pure
//! ordering edges are attached to its producing build statement as implicit
//! inputs; targets produced by nothing become `phony` builds. Commands go
//! through a single generic rule with a per-build `cmd` binding.

use crate::emit::Emitter;
use crate::graph::TargetGraph;
use std::collections::BTreeSet;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, Default)]
pub struct NinjaEmitter;

impl NinjaEmitter {
    pub fn new() -> Self {
        Self
    }
}

/// Escape a path for use in a ninja build statement.
fn escape_path(path: &str) -> String {
    path.replace('$', "$$").replace(' ', "$ ").replace(':', "$:")
}

/// Escape a command for use as a ninja variable value.
fn escape_value(value: &str) -> String {
    value.replace('$', "$$")
}

/// Ordering inputs of all listed targets, minus the explicit sources.
fn implicit_inputs<'a, I>(graph: &'a TargetGraph, targets: I, explicit: &BTreeSet<String>) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut implicit: BTreeSet<&str> = BTreeSet::new();
    for target in targets {
        if let Some(deps) = graph.dependencies_of(target) {
            implicit.extend(deps.iter().map(String::as_str));
        }
    }
    implicit
        .into_iter()
        .filter(|dep| !explicit.contains(*dep))
        .collect()
}

impl Emitter for NinjaEmitter {
    fn default_file_name(&self) -> &'static str {
        "build.ninja"
    }

    fn emit(&self, graph: &TargetGraph) -> String {
        let mut out = String::new();
        out.push_str("# Generated build description; do not edit.\n\n");
        out.push_str("rule copy\n  command = cp $in $out\n\n");
        out.push_str("rule cmd\n  command = $cmd\n\n");

        for rule in graph.command_rules() {
            let outputs: Vec<String> = rule.targets.iter().map(|t| escape_path(t)).collect();
            let inputs: Vec<String> = rule.sources.iter().map(|s| escape_path(s)).collect();
            let _ = write!(out, "build {}: cmd {}", outputs.join(" "), inputs.join(" "));
            let implicit =
                implicit_inputs(graph, rule.targets.iter().map(String::as_str), &rule.sources);
            if !implicit.is_empty() {
                let implicit: Vec<String> = implicit.iter().map(|d| escape_path(d)).collect();
                let _ = write!(out, " | {}", implicit.join(" "));
            }
            out.push('\n');
            let _ = writeln!(out, "  cmd = {}", escape_value(&rule.command));
        }
        if graph.command_rules().next().is_some() {
            out.push('\n');
        }

        for (target, source) in graph.copy_rules() {
            let explicit: BTreeSet<String> = [source.to_string()].into_iter().collect();
            let _ = write!(out, "build {}: copy {}", escape_path(target), escape_path(source));
            let implicit = implicit_inputs(graph, [target], &explicit);
            if !implicit.is_empty() {
                let implicit: Vec<String> = implicit.iter().map(|d| escape_path(d)).collect();
                let _ = write!(out, " | {}", implicit.join(" "));
            }
            out.push('\n');
        }
        if graph.copy_rules().next().is_some() {
            out.push('\n');
        }

        // Targets nothing produces: declare them phony so their ordering
        // edges still participate in the graph.
        let mut wrote_phony = false;
        for (target, sources) in graph.ordering_rules() {
            if graph.command_of(target).is_some() || sources.is_empty() {
                continue;
            }
            let sources: Vec<String> = sources.iter().map(|s| escape_path(s)).collect();
            let _ = writeln!(out, "build {}: phony {}", escape_path(target), sources.join(" "));
            wrote_phony = true;
        }
        if wrote_phony {
            out.push('\n');
        }

        let targets: Vec<String> = graph.targets().map(escape_path).collect();
        if targets.is_empty() {
            out.push_str("build all: phony\n");
        } else {
            let _ = writeln!(out, "build all: phony {}", targets.join(" "));
        }
        out.push_str("default all\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_edges_become_implicit_inputs() {
        let mut graph = TargetGraph::new();
        graph
            .set_command(["obj/a.fst.verified.tmp"], ["obj/a.fst"], "verify obj/a.fst")
            .unwrap();
        graph.add_dependency(["obj/a.fst.verified.tmp"], ["obj/b.fst.verified"]);
        let text = NinjaEmitter::new().emit(&graph);
        assert!(text
            .contains("build obj/a.fst.verified.tmp: cmd obj/a.fst | obj/b.fst.verified\n"));
    }

    #[test]
    fn test_orphan_ordering_target_is_phony() {
        let mut graph = TargetGraph::new();
        graph.add_dependency(["group"], ["obj/x.verified"]);
        let text = NinjaEmitter::new().emit(&graph);
        assert!(text.contains("build group: phony obj/x.verified\n"));
    }

    #[test]
    fn test_umbrella_lists_every_target_and_is_default() {
        let mut graph = TargetGraph::new();
        graph.copy("b", "a").unwrap();
        graph.add_dependency(["c"], ["b"]);
        let text = NinjaEmitter::new().emit(&graph);
        assert!(text.contains("build all: phony b c\n"));
        assert!(text.ends_with("default all\n"));
    }

    #[test]
    fn test_dollar_is_escaped() {
        let mut graph = TargetGraph::new();
        graph
            .set_command(["out"], ["in"], "tool --flag=$HOME in")
            .unwrap();
        let text = NinjaEmitter::new().emit(&graph);
        assert!(text.contains("cmd = tool --flag=$$HOME in"));
    }
}
