//! Build target store with single-command-per-target consistency
//!
//! Targets are artifact paths (normalized, `/`-separated strings). A target
//! carries zero or one command plus any number of pure ordering edges.
//! Declaration order is irrelevant to output: every accessor iterates in
//! sorted order so downstream emitters are deterministic.

use crate::error::{GraphError, GraphResult};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Command associated with a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetCommand {
    /// Arbitrary tool invocation producing the target(s).
    Exec(String),
    /// Duplication of `source` into the target.
    Copy { source: String },
}

impl fmt::Display for TargetCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exec(cmd) => write!(f, "{cmd}"),
            Self::Copy { source } => write!(f, "copy of {source}"),
        }
    }
}

/// One command producing one or more targets.
///
/// The first target is the primary one; in backends without native
/// multi-output rules the remaining targets are chained off the primary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRule {
    pub targets: Vec<String>,
    pub sources: BTreeSet<String>,
    pub command: String,
}

/// Backend-agnostic store of build targets, commands, and ordering edges.
#[derive(Debug, Clone, Default)]
pub struct TargetGraph {
    /// Per-target command, the consistency domain.
    commands: BTreeMap<String, TargetCommand>,
    /// Primary target -> command rule.
    rules: BTreeMap<String, CommandRule>,
    /// Copy target -> copied source.
    copies: BTreeMap<String, String>,
    /// Target -> pure ordering sources.
    edges: BTreeMap<String, BTreeSet<String>>,
    /// Every declared target, commands and ordering alike.
    targets: BTreeSet<String>,
}

impl TargetGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a pure ordering edge: every target waits for every source.
    ///
    /// Carries no command. Re-declaring an identical edge is a no-op.
    pub fn add_dependency<T, S>(&mut self, targets: T, sources: S)
    where
        T: IntoIterator,
        T::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        let sources: BTreeSet<String> = sources.into_iter().map(Into::into).collect();
        for target in targets {
            let target = target.into();
            self.targets.insert(target.clone());
            self.edges
                .entry(target)
                .or_default()
                .extend(sources.iter().cloned());
        }
    }

    /// Register a command producing the given targets from the given sources.
    ///
    /// Registering the identical command again is a no-op; registering a
    /// different command for an already-produced target is fatal. Returns the
    /// target paths for chaining.
    pub fn set_command<T, S>(
        &mut self,
        targets: T,
        sources: S,
        command: impl Into<String>,
    ) -> GraphResult<Vec<String>>
    where
        T: IntoIterator,
        T::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        let targets: Vec<String> = targets.into_iter().map(Into::into).collect();
        if targets.is_empty() {
            return Ok(targets);
        }
        let command = command.into();
        let requested = TargetCommand::Exec(command.clone());
        for target in &targets {
            if let Some(existing) = self.commands.get(target) {
                if *existing == requested {
                    return Ok(targets);
                }
                return Err(GraphError::conflict(target, existing, &requested));
            }
        }
        let sources: BTreeSet<String> = sources.into_iter().map(Into::into).collect();
        for target in &targets {
            self.targets.insert(target.clone());
            self.commands.insert(target.clone(), requested.clone());
        }
        self.rules.insert(
            targets[0].clone(),
            CommandRule {
                targets: targets.clone(),
                sources,
                command,
            },
        );
        Ok(targets)
    }

    /// Register an artifact duplication: `target` is a byte copy of `source`.
    pub fn copy(
        &mut self,
        target: impl Into<String>,
        source: impl Into<String>,
    ) -> GraphResult<String> {
        let target = target.into();
        let source = source.into();
        let requested = TargetCommand::Copy {
            source: source.clone(),
        };
        if let Some(existing) = self.commands.get(&target) {
            if *existing == requested {
                return Ok(target);
            }
            return Err(GraphError::conflict(&target, existing, &requested));
        }
        self.targets.insert(target.clone());
        self.commands.insert(target.clone(), requested);
        self.copies.insert(target.clone(), source);
        Ok(target)
    }

    /// Every declared target, sorted.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.targets.iter().map(String::as_str)
    }

    /// Command rules sorted by primary target.
    pub fn command_rules(&self) -> impl Iterator<Item = &CommandRule> {
        self.rules.values()
    }

    /// Copy rules as (target, source), sorted by target.
    pub fn copy_rules(&self) -> impl Iterator<Item = (&str, &str)> {
        self.copies.iter().map(|(t, s)| (t.as_str(), s.as_str()))
    }

    /// Pure ordering edges as (target, sources), sorted by target.
    pub fn ordering_rules(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.edges.iter().map(|(t, s)| (t.as_str(), s))
    }

    /// Ordering sources declared for a target, if any.
    pub fn dependencies_of(&self, target: &str) -> Option<&BTreeSet<String>> {
        self.edges.get(target)
    }

    /// The command registered for a target, if any.
    pub fn command_of(&self, target: &str) -> Option<&TargetCommand> {
        self.commands.get(target)
    }

    pub fn contains(&self, target: &str) -> bool {
        self.targets.contains(target)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_add_dependency_declares_targets() {
        let mut graph = TargetGraph::new();
        graph.add_dependency(["a.verified"], ["b.verified"]);
        assert!(graph.contains("a.verified"));
        assert!(!graph.contains("b.verified"));
        let deps = graph.dependencies_of("a.verified").unwrap();
        assert!(deps.contains("b.verified"));
    }

    #[test]
    fn test_add_dependency_is_idempotent() {
        let mut graph = TargetGraph::new();
        graph.add_dependency(["a"], ["b", "c"]);
        graph.add_dependency(["a"], ["b"]);
        assert_eq!(graph.dependencies_of("a").unwrap().len(), 2);
    }

    #[test]
    fn test_set_command_registers_all_targets() {
        let mut graph = TargetGraph::new();
        let targets = graph
            .set_command(["x.fst", "x.fsti"], ["x.meta"], "translate x.meta")
            .unwrap();
        assert_eq!(targets, vec!["x.fst", "x.fsti"]);
        assert!(graph.command_of("x.fsti").is_some());
        assert_eq!(graph.command_rules().count(), 1);
    }

    #[test]
    fn test_identical_command_reregistration_is_noop() {
        let mut graph = TargetGraph::new();
        graph.set_command(["t"], ["s"], "produce t").unwrap();
        graph.set_command(["t"], ["s"], "produce t").unwrap();
        assert_eq!(graph.command_rules().count(), 1);
    }

    #[test]
    fn test_conflicting_command_is_fatal() {
        let mut graph = TargetGraph::new();
        graph.set_command(["t"], ["s"], "produce t").unwrap();
        let err = graph.set_command(["t"], ["s"], "produce t differently");
        match err {
            Err(GraphError::CommandConflict { target, .. }) => assert_eq!(target, "t"),
            other => panic!("expected CommandConflict, got {other:?}"),
        }
    }

    #[test]
    fn test_copy_conflicts_with_command() {
        let mut graph = TargetGraph::new();
        graph.copy("t", "s").unwrap();
        graph.copy("t", "s").unwrap();
        assert!(graph.copy("t", "other").is_err());
        assert!(graph.set_command(["t"], ["s"], "cmd").is_err());
    }

    #[test]
    fn test_empty_target_list_is_noop() {
        let mut graph = TargetGraph::new();
        let targets = graph
            .set_command(Vec::<String>::new(), ["s"], "cmd")
            .unwrap();
        assert!(targets.is_empty());
        assert!(graph.is_empty());
    }

    #[test]
    fn test_targets_iterate_sorted() {
        let mut graph = TargetGraph::new();
        graph.add_dependency(["z"], ["s"]);
        graph.add_dependency(["a"], ["s"]);
        graph.copy("m", "s").unwrap();
        let targets: Vec<&str> = graph.targets().collect();
        assert_eq!(targets, vec!["a", "m", "z"]);
    }
}
