//! Type-export topological ordering
//!
//! Each meta-source file consumes one `.types` artifact produced by the
//! external type-import tool from an ordered list of dump artifacts: its own
//! dump references plus those of every meta-source file it includes,
//! transitively, expanded depth-first so each dump's dependencies appear
//! before the dump itself. The traversal tracks the active stack explicitly;
//! a revisit of a node still on the stack is a cycle and fails instead of
//! recursing forever or silently truncating.

use crate::builder::GraphBuilder;
use crate::error::{BuildError, BuildResult};
use crate::source;
use std::collections::{BTreeMap, BTreeSet};

impl GraphBuilder {
    /// Emit one type-import command per meta-source file.
    pub(crate) fn compute_export_orders(&mut self) -> BuildResult<()> {
        let metas: Vec<String> = self.meta_dump_deps.keys().cloned().collect();
        for meta in metas {
            let seeds = self.export_seeds(&meta)?;
            let order = collect_dump_order(&seeds, &self.dump_deps)?;
            let obj_base = source::drop_extension(&self.layout.to_obj(&meta));
            let types = source::types_artifact(&obj_base);
            self.graph
                .add_dependency([types.clone()], order.iter().cloned());
            let mut command = self.manifest.tools.import_types.clone();
            for dump in &order {
                command.push_str(" -in ");
                command.push_str(dump);
            }
            command.push_str(" -out ");
            command.push_str(&types);
            self.graph.set_command([types], order.clone(), command)?;
            self.export_orders.insert(meta, order);
        }
        Ok(())
    }

    /// Seed dump set for a meta-source file: its own dump references plus
    /// those inherited over the transitive closure of its includes.
    fn export_seeds(&self, meta: &str) -> BuildResult<BTreeSet<String>> {
        let mut seeds = BTreeSet::new();
        let mut done = BTreeSet::new();
        let mut stack = Vec::new();
        self.collect_meta_closure(meta, &mut done, &mut stack, &mut seeds)?;
        Ok(seeds)
    }

    fn collect_meta_closure(
        &self,
        meta: &str,
        done: &mut BTreeSet<String>,
        stack: &mut Vec<String>,
        seeds: &mut BTreeSet<String>,
    ) -> BuildResult<()> {
        if done.contains(meta) {
            return Ok(());
        }
        if let Some(position) = stack.iter().position(|m| m == meta) {
            return Err(BuildError::CyclicDependency {
                cycle: cycle_string(&stack[position..], meta),
            });
        }
        stack.push(meta.to_string());
        if let Some(includes) = self.meta_file_deps.get(meta) {
            for included in includes {
                self.collect_meta_closure(included, done, stack, seeds)?;
            }
        }
        stack.pop();
        done.insert(meta.to_string());
        if let Some(dumps) = self.meta_dump_deps.get(meta) {
            seeds.extend(dumps.iter().cloned());
        }
        Ok(())
    }
}

/// Post-order emission over dump dependencies: every dependency appears
/// before its dependent, each node exactly once.
pub(crate) fn collect_dump_order(
    seeds: &BTreeSet<String>,
    deps: &BTreeMap<String, BTreeSet<String>>,
) -> BuildResult<Vec<String>> {
    let mut done = BTreeSet::new();
    let mut stack = Vec::new();
    let mut order = Vec::new();
    for seed in seeds {
        visit(seed, deps, &mut done, &mut stack, &mut order)?;
    }
    Ok(order)
}

fn visit(
    node: &str,
    deps: &BTreeMap<String, BTreeSet<String>>,
    done: &mut BTreeSet<String>,
    stack: &mut Vec<String>,
    order: &mut Vec<String>,
) -> BuildResult<()> {
    if done.contains(node) {
        return Ok(());
    }
    if let Some(position) = stack.iter().position(|n| n == node) {
        return Err(BuildError::CyclicDependency {
            cycle: cycle_string(&stack[position..], node),
        });
    }
    stack.push(node.to_string());
    if let Some(children) = deps.get(node) {
        for child in children {
            visit(child, deps, done, stack, order)?;
        }
    }
    stack.pop();
    done.insert(node.to_string());
    order.push(node.to_string());
    Ok(())
}

fn cycle_string(stack: &[String], node: &str) -> String {
    let mut cycle = stack.join(" -> ");
    cycle.push_str(" -> ");
    cycle.push_str(node);
    cycle
}
