//! Tracing: deciding which inputs a change reaches.
//!
//! Tracing walks use edges outward from a set of seed nodes. Every node is
//! visited at most once per wave; the traced set carries that memory. At a
//! wave boundary the driver clears the flag for the nodes that actually
//! changed so their uses are examined again.

use super::{key::DependencyKey, Aspect, InputHandle, ModuleDepGraph, NodeIndex};
use std::collections::BTreeSet;
use std::path::Path;

impl ModuleDepGraph {
    /// The inputs to recompile when everything in `input`'s summary may have
    /// changed, e.g. because the source file itself was edited.
    ///
    /// The result is the reflexive-transitive closure over use edges seeded
    /// with every node the input owns.
    pub fn find_inputs_invalidated_by(&mut self, input: InputHandle) -> BTreeSet<InputHandle> {
        let seeds: Vec<NodeIndex> = self.finder.nodes_owned_by(Some(input)).collect();
        let mut found = self.trace_uses(seeds);
        found.insert(input);
        found
    }

    /// The inputs to recompile because exactly `nodes` changed, as reported
    /// by an integration step.
    ///
    /// The changed nodes are untraced first so uses visited in an earlier
    /// wave are revisited; the result always contains the owners of `nodes`.
    pub fn find_inputs_invalidated_by_nodes(
        &mut self,
        nodes: &BTreeSet<NodeIndex>,
    ) -> BTreeSet<InputHandle> {
        for idx in nodes {
            self.traced.remove(idx);
        }
        let mut found = self.trace_uses(nodes.iter().copied().collect());
        found.extend(nodes.iter().filter_map(|&idx| self.node(idx).owner));
        found
    }

    /// Maps a set of handles back to their input paths, in input order.
    pub fn input_paths<'a>(
        &'a self,
        handles: impl IntoIterator<Item = &'a InputHandle>,
    ) -> Vec<&'a Path> {
        handles.into_iter().map(|&handle| self.input_path(handle)).collect()
    }

    /// Invokes `callback` for every input with an untraced use of the
    /// interface of the external file at `path`.
    pub fn for_each_untraced_use_of_external(
        &self,
        path: &Path,
        mut callback: impl FnMut(InputHandle),
    ) {
        let key = DependencyKey::external(path);
        debug_assert_eq!(key.aspect, Aspect::Interface);
        for user in self.finder.users_of(&key) {
            let untraced = self
                .finder
                .nodes_owned_by(Some(user))
                .any(|idx| !self.traced.contains(&idx));
            if untraced {
                callback(user);
            }
        }
    }

    /// Walks use edges from `seeds`, visiting previously-untraced nodes only.
    ///
    /// Visiting a node adds its owner to the result; reaching a using input
    /// continues the walk through every node that input owns.
    fn trace_uses(&mut self, mut worklist: Vec<NodeIndex>) -> BTreeSet<InputHandle> {
        let mut found = BTreeSet::new();
        while let Some(idx) = worklist.pop() {
            if !self.traced.insert(idx) {
                continue;
            }
            if let Some(owner) = self.node(idx).owner {
                found.insert(owner);
            }
            let users: Vec<InputHandle> =
                self.finder.users_of(&self.node(idx).key).collect();
            for user in users {
                if found.insert(user) {
                    worklist.extend(self.finder.nodes_owned_by(Some(user)));
                }
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depgraph::{SourceFileSummary, SummaryDefine};

    fn define(name: &str, fingerprint: &str) -> SummaryDefine {
        SummaryDefine {
            key: DependencyKey::top_level(name),
            fingerprint: Some(fingerprint.to_string()),
        }
    }

    fn uses(name: &str) -> DependencyKey {
        DependencyKey::top_level(name)
    }

    /// a defines `foo`; b uses `foo` and defines `bar`; c uses `bar`.
    fn chain_graph() -> (ModuleDepGraph, InputHandle, InputHandle, InputHandle) {
        let mut graph = ModuleDepGraph::new(true);
        let a = graph.register_input("a.swift", "a.swiftdeps").unwrap();
        let b = graph.register_input("b.swift", "b.swiftdeps").unwrap();
        let c = graph.register_input("c.swift", "c.swiftdeps").unwrap();

        graph
            .integrate(&SourceFileSummary::new(vec![define("foo", "f1")], vec![]), a)
            .unwrap();
        graph
            .integrate(
                &SourceFileSummary::new(vec![define("bar", "b1")], vec![uses("foo")]),
                b,
            )
            .unwrap();
        graph
            .integrate(&SourceFileSummary::new(vec![], vec![uses("bar")]), c)
            .unwrap();
        (graph, a, b, c)
    }

    #[test]
    fn empty_seed_set_invalidates_nothing() {
        let (mut graph, _, _, _) = chain_graph();
        let found = graph.find_inputs_invalidated_by_nodes(&BTreeSet::new());
        assert!(found.is_empty());
    }

    #[test]
    fn whole_summary_invalidation_is_transitive_and_reflexive() {
        let (mut graph, a, b, c) = chain_graph();
        let found = graph.find_inputs_invalidated_by(a);
        assert_eq!(found, BTreeSet::from([a, b, c]));
    }

    #[test]
    fn leaf_invalidation_stays_local() {
        let (mut graph, _, _, c) = chain_graph();
        let found = graph.find_inputs_invalidated_by(c);
        assert_eq!(found, BTreeSet::from([c]));
    }

    #[test]
    fn node_invalidation_contains_owners() {
        let (mut graph, a, b, _) = chain_graph();
        let foo = graph.node_for(Some(a), &DependencyKey::top_level("foo")).unwrap();
        let found = graph.find_inputs_invalidated_by_nodes(&BTreeSet::from([foo]));
        assert!(found.contains(&a), "owners of the seeds are always included");
        assert!(found.contains(&b));
    }

    #[test]
    fn tracing_is_monotonic_within_a_wave() {
        let (mut graph, a, b, _) = chain_graph();
        let foo = graph.node_for(Some(a), &DependencyKey::top_level("foo")).unwrap();

        let first = graph.find_inputs_invalidated_by(a);
        assert!(first.contains(&b));
        assert!(graph.is_traced(foo));

        // a second query in the same wave sees everything already traced and
        // only reports the reflexive owner
        let second = graph.find_inputs_invalidated_by(a);
        assert_eq!(second, BTreeSet::from([a]));
    }

    #[test]
    fn changed_nodes_are_untraced_at_wave_boundaries() {
        let (mut graph, a, b, c) = chain_graph();
        let first_wave = graph.find_inputs_invalidated_by(a);
        assert!(first_wave.contains(&c));

        // the second wave integrates a's refreshed summary; `foo` changed
        let changes = graph
            .integrate(&SourceFileSummary::new(vec![define("foo", "f2")], vec![]), a)
            .unwrap();
        assert!(!changes.is_empty());
        let found = graph.find_inputs_invalidated_by_nodes(&changes);
        assert!(found.contains(&b), "uses of a changed node are revisited");
        // c's dependency on b did not change and c was already captured by
        // the first wave, so the walk stops at b's traced nodes
        assert!(!found.contains(&c));
    }

    #[test]
    fn external_uses_are_reported_while_untraced() {
        let mut graph = ModuleDepGraph::new(true);
        let a = graph.register_input("a.swift", "a.swiftdeps").unwrap();
        graph
            .integrate(
                &SourceFileSummary::new(
                    vec![define("foo", "f1")],
                    vec![DependencyKey::external("/sdk/Swift.swiftmodule")],
                ),
                a,
            )
            .unwrap();

        let mut reported = Vec::new();
        graph.for_each_untraced_use_of_external(Path::new("/sdk/Swift.swiftmodule"), |input| {
            reported.push(input)
        });
        assert_eq!(reported, vec![a]);

        // once a's nodes are traced the callback stays quiet
        let _ = graph.find_inputs_invalidated_by(a);
        let mut reported = Vec::new();
        graph.for_each_untraced_use_of_external(Path::new("/sdk/Swift.swiftmodule"), |input| {
            reported.push(input)
        });
        assert!(reported.is_empty());
    }
}
