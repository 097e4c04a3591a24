//! Makefile backend
//!
//! Multi-output commands become a recipe on the primary target with the
//! remaining targets chained off it, which is how make is told that one
//! invocation produces several artifacts.

use crate::emit::Emitter;
use crate::graph::TargetGraph;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, Default)]
pub struct MakeEmitter;

impl MakeEmitter {
    pub fn new() -> Self {
        Self
    }
}

impl Emitter for MakeEmitter {
    fn default_file_name(&self) -> &'static str {
        "Makefile"
    }

    fn emit(&self, graph: &TargetGraph) -> String {
        let mut out = String::new();
        out.push_str("# Generated build description; do not edit.\n\n");

        for rule in graph.command_rules() {
            let sources: Vec<&str> = rule.sources.iter().map(String::as_str).collect();
            let _ = writeln!(out, "{} : {}", rule.targets[0], sources.join(" "));
            let _ = writeln!(out, "\t{}", rule.command);
            for extra in &rule.targets[1..] {
                let _ = writeln!(out, "{} : {}", extra, rule.targets[0]);
            }
            out.push('\n');
        }

        for (target, source) in graph.copy_rules() {
            let _ = writeln!(out, "{target} : {source}");
            let _ = writeln!(out, "\tcp {source} {target}");
            out.push('\n');
        }

        for (target, sources) in graph.ordering_rules() {
            if sources.is_empty() {
                continue;
            }
            let sources: Vec<&str> = sources.iter().map(String::as_str).collect();
            let _ = writeln!(out, "{} : {}", target, sources.join(" "));
            out.push('\n');
        }

        out.push_str(".PHONY : all\n");
        let targets: Vec<&str> = graph.targets().collect();
        if targets.is_empty() {
            out.push_str("all :\n");
        } else {
            out.push_str("all : \\\n");
            for (i, target) in targets.iter().enumerate() {
                if i + 1 == targets.len() {
                    let _ = writeln!(out, "\t{target}");
                } else {
                    let _ = writeln!(out, "\t{target} \\");
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_graph_still_has_umbrella() {
        let graph = TargetGraph::new();
        let text = MakeEmitter::new().emit(&graph);
        assert!(text.contains(".PHONY : all"));
        assert!(text.contains("all :"));
    }

    #[test]
    fn test_multi_output_chains_extra_targets() {
        let mut graph = TargetGraph::new();
        graph
            .set_command(
                ["obj/x.fst", "obj/x.fsti"],
                ["code/x.meta"],
                "translate code/x.meta",
            )
            .unwrap();
        let text = MakeEmitter::new().emit(&graph);
        assert!(text.contains("obj/x.fst : code/x.meta\n\ttranslate code/x.meta\n"));
        assert!(text.contains("obj/x.fsti : obj/x.fst\n"));
    }

    #[test]
    fn test_copy_rule_shape() {
        let mut graph = TargetGraph::new();
        graph.copy("obj/a.verified", "obj/a.verified.tmp").unwrap();
        let text = MakeEmitter::new().emit(&graph);
        assert!(text.contains("obj/a.verified : obj/a.verified.tmp\n\tcp obj/a.verified.tmp obj/a.verified\n"));
    }

    #[test]
    fn test_ordering_rule_has_no_recipe() {
        let mut graph = TargetGraph::new();
        graph.add_dependency(["obj/a.verified.tmp"], ["obj/b.verified"]);
        let text = MakeEmitter::new().emit(&graph);
        assert!(text.contains("obj/a.verified.tmp : obj/b.verified\n"));
        assert!(!text.contains("obj/a.verified.tmp : obj/b.verified\n\t"));
    }
}
