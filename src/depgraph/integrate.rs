//! Integration of per-input dependency summaries into the graph.

use super::{
    key::DependencyKey, summary::SourceFileSummary, InputHandle, ModuleDepGraph, Node, NodeIndex,
};
use crate::error::Result;
use std::{collections::BTreeSet, path::Path};

/// The nodes an integration step touched: fingerprints that changed, nodes
/// newly added, nodes removed, and external interfaces whose first use edge
/// appeared.
pub type Changes = BTreeSet<NodeIndex>;

impl ModuleDepGraph {
    /// Reads the summary at `path` and integrates it for `input`.
    ///
    /// `Ok(None)` means the summary was missing or malformed; the caller is
    /// expected to force-compile the input. `Err` is reserved for graph
    /// defects surfaced by verification.
    pub fn integrate_summary_file(
        &mut self,
        path: &Path,
        input: InputHandle,
    ) -> Result<Option<Changes>> {
        let summary = match SourceFileSummary::read(path) {
            Ok(summary) => summary,
            Err(err) => {
                warn!("unusable dependency summary at \"{}\": {err}", path.display());
                return Ok(None);
            }
        };
        self.integrate(&summary, input).map(Some)
    }

    /// Integrates one summary, replacing whatever the graph knew about
    /// `input` before.
    ///
    /// Integrating the same summary twice yields an empty change set.
    pub fn integrate(
        &mut self,
        summary: &SourceFileSummary,
        input: InputHandle,
    ) -> Result<Changes> {
        let mut changes = Changes::new();

        // definitions: insert new ones, refresh fingerprints on existing ones
        let mut defined: BTreeSet<&DependencyKey> = BTreeSet::new();
        for define in &summary.provides {
            defined.insert(&define.key);
            match self.finder.find(Some(input), &define.key) {
                None => {
                    let idx = self.insert_node(Node {
                        key: define.key.clone(),
                        fingerprint: define.fingerprint.clone(),
                        owner: Some(input),
                    });
                    changes.insert(idx);
                }
                Some(idx) => {
                    let node = &mut self.nodes[idx.0];
                    if node.fingerprint != define.fingerprint {
                        node.fingerprint = define.fingerprint.clone();
                        changes.insert(idx);
                    }
                }
            }
        }

        // definitions that disappeared from the summary are retired; their
        // handles stay valid so the change set can refer to them
        let stale: Vec<DependencyKey> = self
            .finder
            .keys_owned_by(Some(input))
            .filter(|key| !defined.contains(key))
            .cloned()
            .collect();
        for key in stale {
            if let Some(idx) = self.finder.remove(Some(input), &key) {
                trace!("\"{}\" no longer defines {key}", self.input_path(input).display());
                changes.insert(idx);
            }
        }

        // uses: record edges; external interfaces get an ownerless node the
        // first time they are seen
        for key in &summary.depends {
            let newly_recorded = self.finder.record_use(key.clone(), input);
            if let Some(path) = key.external_path() {
                self.external_dependencies.insert(path.clone());
                let idx = match self.finder.find(None, key) {
                    Some(idx) => idx,
                    None => self.insert_node(Node {
                        key: key.clone(),
                        fingerprint: None,
                        owner: None,
                    }),
                };
                if newly_recorded {
                    changes.insert(idx);
                }
            }
        }

        if self.verify_after_integration {
            self.verify()?;
        }

        trace!(
            "integrated \"{}\": {} nodes changed",
            self.input_path(input).display(),
            changes.len()
        );
        Ok(changes)
    }

    fn insert_node(&mut self, node: Node) -> NodeIndex {
        debug_assert!(self.finder.find(node.owner, &node.key).is_none());
        let idx = NodeIndex(self.nodes.len());
        let owner = node.owner;
        let key = node.key.clone();
        self.nodes.push(node);
        self.finder.insert(owner, key, idx);
        idx
    }
}
