//! The fine-grained module dependency graph driving incremental compilation.
//!
//! The graph owns one struct of data — the node arena, the [`NodeFinder`]
//! indices, the traced set and the external-dependency set — and the
//! algorithmic aspects (integration, tracing) are free functions over it in
//! the sibling modules.

use crate::{
    diagnostics::{Diag, Diagnostics},
    error::{DriverError, Result},
    output_file_map::OutputFileMap,
};
use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    path::{Path, PathBuf},
};

pub mod key;
mod integrate;
mod summary;
mod trace;

pub use key::{Aspect, DependencyKey, Designator};
pub use summary::{SourceFileSummary, SummaryDefine};

/// Handle of a registered source input. Stable for the lifetime of one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InputHandle(pub(crate) usize);

/// Handle of a node in the arena. Stable for the lifetime of one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIndex(pub(crate) usize);

/// A tracked definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub key: DependencyKey,
    /// Content hash over the definition, used to detect semantic changes.
    pub fingerprint: Option<String>,
    /// Absent for nodes representing purely external interfaces.
    pub owner: Option<InputHandle>,
}

/// The two lock-step indices over the nodes.
///
/// All mutation goes through the methods here so the indices cannot drift
/// apart.
#[derive(Debug, Default)]
pub struct NodeFinder {
    /// owner (`None` holds the external interfaces) → key → node
    by_owner: HashMap<Option<InputHandle>, HashMap<DependencyKey, NodeIndex>>,
    /// definition key → inputs that use it
    uses_by_def: HashMap<DependencyKey, BTreeSet<InputHandle>>,
}

impl NodeFinder {
    fn find(&self, owner: Option<InputHandle>, key: &DependencyKey) -> Option<NodeIndex> {
        self.by_owner.get(&owner)?.get(key).copied()
    }

    fn insert(&mut self, owner: Option<InputHandle>, key: DependencyKey, idx: NodeIndex) {
        self.by_owner.entry(owner).or_default().insert(key, idx);
    }

    fn remove(&mut self, owner: Option<InputHandle>, key: &DependencyKey) -> Option<NodeIndex> {
        self.by_owner.get_mut(&owner)?.remove(key)
    }

    /// Records that `user` depends on the definition behind `key`.
    ///
    /// Edges form a set; re-recording is a no-op and reported as such.
    fn record_use(&mut self, key: DependencyKey, user: InputHandle) -> bool {
        self.uses_by_def.entry(key).or_default().insert(user)
    }

    fn users_of(&self, key: &DependencyKey) -> impl Iterator<Item = InputHandle> + '_ {
        self.uses_by_def.get(key).into_iter().flatten().copied()
    }

    fn nodes_owned_by(
        &self,
        owner: Option<InputHandle>,
    ) -> impl Iterator<Item = NodeIndex> + '_ {
        self.by_owner.get(&owner).into_iter().flat_map(|keys| keys.values().copied())
    }

    fn keys_owned_by(
        &self,
        owner: Option<InputHandle>,
    ) -> impl Iterator<Item = &DependencyKey> + '_ {
        self.by_owner.get(&owner).into_iter().flat_map(|keys| keys.keys())
    }
}

/// The bidirectional map between source inputs and their summary files.
///
/// Both directions are injective; an insert that would alias either side is
/// rejected.
#[derive(Debug, Default)]
pub struct SummaryFileMap {
    by_input: BTreeMap<PathBuf, PathBuf>,
    by_summary: BTreeMap<PathBuf, PathBuf>,
}

impl SummaryFileMap {
    fn insert(&mut self, input: PathBuf, summary: PathBuf) -> Result<()> {
        match (self.by_input.get(&input), self.by_summary.get(&summary)) {
            (None, None) => {
                self.by_input.insert(input.clone(), summary.clone());
                self.by_summary.insert(summary, input);
                Ok(())
            }
            (Some(existing), _) if *existing == summary => Ok(()),
            _ => Err(DriverError::internal(format!(
                "summary file mapping for \"{}\" is not one-to-one",
                input.display()
            ))),
        }
    }

    pub fn summary_for(&self, input: &Path) -> Option<&Path> {
        self.by_input.get(input).map(PathBuf::as_path)
    }

    pub fn input_for(&self, summary: &Path) -> Option<&Path> {
        self.by_summary.get(summary).map(PathBuf::as_path)
    }
}

/// The in-memory dependency graph for one driver run.
#[derive(Debug, Default)]
pub struct ModuleDepGraph {
    nodes: Vec<Node>,
    finder: NodeFinder,
    /// Nodes already visited in the current wave.
    traced: HashSet<NodeIndex>,
    /// Every external file some input depends on.
    external_dependencies: BTreeSet<PathBuf>,
    inputs: Vec<PathBuf>,
    input_handles: HashMap<PathBuf, InputHandle>,
    summary_files: SummaryFileMap,
    /// Re-check the graph invariants after every integration.
    verify_after_integration: bool,
}

impl ModuleDepGraph {
    pub fn new(verify_after_integration: bool) -> Self {
        Self { verify_after_integration, ..Default::default() }
    }

    /// Registers a source input together with its summary file location.
    pub fn register_input(
        &mut self,
        input: impl Into<PathBuf>,
        summary: impl Into<PathBuf>,
    ) -> Result<InputHandle> {
        let input = input.into();
        if let Some(&handle) = self.input_handles.get(&input) {
            return Ok(handle);
        }
        let handle = InputHandle(self.inputs.len());
        self.summary_files.insert(input.clone(), summary.into())?;
        self.input_handles.insert(input.clone(), handle);
        self.inputs.push(input);
        Ok(handle)
    }

    pub fn handle_for(&self, input: &Path) -> Option<InputHandle> {
        self.input_handles.get(input).copied()
    }

    pub fn input_path(&self, handle: InputHandle) -> &Path {
        &self.inputs[handle.0]
    }

    /// The summary file registered for `handle`.
    pub fn summary_path(&self, handle: InputHandle) -> &Path {
        self.summary_files
            .summary_for(&self.inputs[handle.0])
            .expect("registered input without a summary file")
    }

    pub fn node(&self, idx: NodeIndex) -> &Node {
        &self.nodes[idx.0]
    }

    /// All external files any input depends on.
    pub fn external_dependencies(&self) -> impl Iterator<Item = &Path> {
        self.external_dependencies.iter().map(PathBuf::as_path)
    }

    /// Builds the graph for an incremental session by replaying the summaries
    /// left behind by the previous build.
    ///
    /// Returns `None` when any input has no summary location, which disables
    /// incremental compilation entirely. Inputs whose prior summary is
    /// missing or malformed are returned so the driver can force-compile
    /// them; inputs new to this build have nothing to replay and are skipped.
    pub fn build_initial(
        inputs: &[&Path],
        previous_inputs: &BTreeSet<PathBuf>,
        output_file_map: &OutputFileMap,
        verify_after_integration: bool,
        diags: &mut Diagnostics,
    ) -> Result<Option<(Self, Vec<InputHandle>)>> {
        let mut graph = Self::new(verify_after_integration);

        for &input in inputs {
            let Some(summary) = output_file_map.swift_deps_for(input) else {
                diags.emit(Diag::MissingDependenciesEntry {
                    input: input.display().to_string(),
                });
                return Ok(None);
            };
            graph.register_input(input, summary)?;
        }

        let mut unreadable = Vec::new();
        for &input in inputs {
            if !previous_inputs.contains(input) {
                trace!("\"{}\" is new to this build, nothing to replay", input.display());
                continue;
            }
            let handle = graph
                .handle_for(input)
                .ok_or_else(|| DriverError::internal("unregistered input"))?;
            let summary = graph.summary_path(handle).to_path_buf();
            if graph.integrate_summary_file(&summary, handle)?.is_none() {
                unreadable.push(handle);
            }
        }

        Ok(Some((graph, unreadable)))
    }

    /// Walks both indices and asserts the graph invariants.
    pub fn verify(&self) -> Result<()> {
        for (&owner, keys) in &self.finder.by_owner {
            for (key, &idx) in keys {
                let node = self
                    .nodes
                    .get(idx.0)
                    .ok_or_else(|| DriverError::internal("index points past the arena"))?;
                if node.owner != owner {
                    return Err(DriverError::internal(format!(
                        "node for {key} is filed under the wrong owner"
                    )));
                }
                if node.key != *key {
                    return Err(DriverError::internal(format!(
                        "node for {key} carries key {}",
                        node.key
                    )));
                }
            }
        }
        for users in self.finder.uses_by_def.values() {
            for user in users {
                if user.0 >= self.inputs.len() {
                    return Err(DriverError::internal("use edge names an unknown input"));
                }
            }
        }
        for (input, summary) in &self.summary_files.by_input {
            if self.summary_files.by_summary.get(summary) != Some(input) {
                return Err(DriverError::internal(
                    "summary file map is not a bidirectional injection",
                ));
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn node_for(
        &self,
        owner: Option<InputHandle>,
        key: &DependencyKey,
    ) -> Option<NodeIndex> {
        self.finder.find(owner, key)
    }

    #[cfg(test)]
    pub(crate) fn is_traced(&self, idx: NodeIndex) -> bool {
        self.traced.contains(&idx)
    }
}
