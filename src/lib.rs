#![doc = include_str!("../README.md")]
#![warn(rustdoc::all)]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![deny(unused_must_use, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[macro_use]
extern crate tracing;

pub mod error;

pub mod diagnostics;
pub use diagnostics::{Diag, Diagnostics, Severity};

pub mod filetype;
pub use filetype::FileType;

pub mod options;
pub use options::{ArgumentParser, OptionId, ParsedOptions};

pub mod plan;
pub use plan::{CompilationPlan, CompilerMode, DriverKind};

pub mod output_file_map;
pub use output_file_map::OutputFileMap;

pub mod record;
pub use record::{BuildRecord, BuildRecordStore, JobOutcome};

pub mod depgraph;
pub use depgraph::ModuleDepGraph;

pub mod utils;

use crate::{
    depgraph::InputHandle,
    error::{DriverError, Result},
    plan::derive_plan,
    record::options_hash,
};
use semver::Version;
use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

/// How a single frontend job ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobStatus {
    Succeeded,
    Failed,
}

/// The collaborator that actually runs frontend jobs.
///
/// The driver hands over one input at a time and consumes completions
/// sequentially; a successful job is expected to have refreshed the input's
/// dependency summary on disk before returning.
pub trait JobExecutor {
    fn compile(&mut self, input: &Path) -> JobStatus;
}

/// What a driver run amounted to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// `-help` / `-help-hidden`: the embedding binary renders usage.
    HelpRequested { include_hidden: bool },
    /// A non-compiler persona: exec `tool` with `arguments`.
    ToolDelegation { tool: &'static str, arguments: Vec<String> },
    /// A compile session ran (or was planned to run) to completion.
    Build(BuildSummary),
}

/// The outcome of a compile session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Inputs a frontend job ran for, in scheduling order.
    pub compiled: Vec<PathBuf>,
    /// Inputs skipped because they were up to date.
    pub skipped: Vec<PathBuf>,
    /// Whether the session used the incremental engine.
    pub incremental: bool,
    /// `false` as soon as any job failed or any error was diagnosed.
    pub success: bool,
}

#[derive(Debug)]
enum Invocation {
    Help { include_hidden: bool },
    Delegate { kind: DriverKind, arguments: Vec<String> },
    Compile { plan: CompilationPlan, parsed: ParsedOptions },
}

/// The driver facade: parses argv once, derives the plan, and runs the
/// build against a [`JobExecutor`].
#[derive(Debug)]
pub struct Driver {
    version: Version,
    invocation: Invocation,
    diagnostics: Diagnostics,
    /// Monotonic counter naming temporary files for this run.
    temporary_counter: u64,
}

impl Driver {
    /// Creates a driver for the full argv vector, stamping build records
    /// with this crate's version.
    pub fn new<S: AsRef<str>>(argv: &[S]) -> Result<Self> {
        let version = Version::parse(env!("CARGO_PKG_VERSION"))?;
        Self::with_version(argv, version)
    }

    /// Creates a driver that stamps build records with `version`.
    pub fn with_version<S: AsRef<str>>(argv: &[S], version: Version) -> Result<Self> {
        let (argv0, tail) = argv
            .split_first()
            .ok_or_else(|| DriverError::InvalidDriverName(String::new()))?;
        let tail: Vec<String> = tail.iter().map(|arg| arg.as_ref().to_string()).collect();

        let kind = plan::derive_driver_kind(argv0.as_ref(), &tail)?;
        if !kind.is_compiler() {
            return Ok(Self {
                version,
                invocation: Invocation::Delegate { kind, arguments: tail },
                diagnostics: Diagnostics::new(),
                temporary_counter: 0,
            });
        }

        let parsed = ArgumentParser::parse(&tail)?;
        if parsed.contains_any(&[OptionId::Help, OptionId::HelpHidden]) {
            return Ok(Self {
                version,
                invocation: Invocation::Help {
                    include_hidden: parsed.contains(OptionId::HelpHidden),
                },
                diagnostics: Diagnostics::new(),
                temporary_counter: 0,
            });
        }

        let mut diagnostics = Diagnostics::new();
        let plan = derive_plan(kind, parsed.clone(), &mut diagnostics)?;
        Ok(Self {
            version,
            invocation: Invocation::Compile { plan, parsed },
            diagnostics,
            temporary_counter: 0,
        })
    }

    /// The derived plan, when this invocation compiles.
    pub fn plan(&self) -> Option<&CompilationPlan> {
        match &self.invocation {
            Invocation::Compile { plan, .. } => Some(plan),
            _ => None,
        }
    }

    /// Everything diagnosed so far.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// A fresh name for a temporary output of type `ty`, unique within this
    /// run.
    pub fn temporary_file_name(&mut self, prefix: &str, ty: FileType) -> String {
        let n = self.temporary_counter;
        self.temporary_counter += 1;
        format!("{prefix}-{n}.{}", ty.extension())
    }

    /// Runs the invocation to completion.
    ///
    /// Any error diagnostic emitted during plan derivation refuses to
    /// schedule jobs and surfaces as a single aggregated failure.
    pub fn run(&mut self, executor: &mut dyn JobExecutor) -> Result<RunOutcome> {
        match &self.invocation {
            Invocation::Help { include_hidden } => {
                Ok(RunOutcome::HelpRequested { include_hidden: *include_hidden })
            }
            Invocation::Delegate { kind, arguments } => Ok(RunOutcome::ToolDelegation {
                tool: kind.tool_name(),
                arguments: arguments.clone(),
            }),
            Invocation::Compile { plan, parsed } => {
                if self.diagnostics.has_errors() {
                    return Err(DriverError::PlanDiagnostics(self.diagnostics.error_count()));
                }
                let summary =
                    run_compile(&self.version, plan, parsed, &mut self.diagnostics, executor)?;
                Ok(RunOutcome::Build(summary))
            }
        }
    }
}

fn run_compile(
    version: &Version,
    plan: &CompilationPlan,
    parsed: &ParsedOptions,
    diags: &mut Diagnostics,
    executor: &mut dyn JobExecutor,
) -> Result<BuildSummary> {
    if plan.compiler_mode.is_interactive() {
        // repl/immediate sessions route elsewhere; there are no jobs to plan
        return Ok(BuildSummary { success: !diags.has_errors(), ..Default::default() });
    }

    let want_incremental = parsed.contains(OptionId::Incremental)
        && matches!(
            plan.compiler_mode,
            CompilerMode::StandardCompile | CompilerMode::BatchCompile
        );

    if want_incremental {
        if let Some(summary) = run_incremental(version, plan, parsed, diags, executor)? {
            return Ok(summary);
        }
        // incremental was disabled along the way; fall back to a clean build
    }

    Ok(run_clean(plan, diags, executor))
}

/// Compiles every Swift source input.
fn run_clean(
    plan: &CompilationPlan,
    diags: &Diagnostics,
    executor: &mut dyn JobExecutor,
) -> BuildSummary {
    let mut compiled = Vec::new();
    let mut any_failed = false;
    for input in plan.swift_source_inputs() {
        compiled.push(input.to_path_buf());
        if executor.compile(input) == JobStatus::Failed {
            any_failed = true;
        }
    }
    BuildSummary {
        compiled,
        skipped: Vec::new(),
        incremental: false,
        success: !any_failed && !diags.has_errors(),
    }
}

/// Runs the incremental session; `Ok(None)` means incremental compilation
/// had to be disabled and the caller should run clean.
fn run_incremental(
    version: &Version,
    plan: &CompilationPlan,
    parsed: &ParsedOptions,
    diags: &mut Diagnostics,
    executor: &mut dyn JobExecutor,
) -> Result<Option<BuildSummary>> {
    let Some(store) = BuildRecordStore::from_output_file_map(plan.output_file_map.as_ref())
    else {
        diags.emit(Diag::IncrementalRequiresBuildRecordEntry);
        return Ok(None);
    };
    let Some(map) = plan.output_file_map.as_ref() else {
        return Ok(None);
    };

    let hash = options_hash(parsed);
    let prior = if store.path().exists() {
        match store.load(version, &hash) {
            Ok(record) => Some(record),
            Err(rejection) => {
                diags.emit(Diag::UnusableBuildRecord { reason: rejection.to_string() });
                None
            }
        }
    } else {
        trace!("no previous build record at \"{}\"", store.path().display());
        None
    };

    let inputs: Vec<&Path> = plan.swift_source_inputs().collect();
    let previous_inputs: BTreeSet<PathBuf> = prior
        .as_ref()
        .map(|record| record.inputs.keys().cloned().collect())
        .unwrap_or_default();

    let verify = parsed.contains(OptionId::DriverVerifyDependencyGraph);
    let show_incremental = parsed.contains(OptionId::DriverShowIncremental);

    let Some((mut graph, unreadable)) =
        ModuleDepGraph::build_initial(&inputs, &previous_inputs, map, verify, diags)?
    else {
        return Ok(None);
    };

    let build_start_time = now_millis();
    let mut modification_dates: BTreeMap<PathBuf, u64> = BTreeMap::new();
    for &input in &inputs {
        let mtime = utils::read_last_modification_date(input).unwrap_or_default();
        modification_dates.insert(input.to_path_buf(), mtime);
    }

    // seed the first wave from modification times and unreplayable summaries
    let mut first_wave: BTreeSet<InputHandle> = BTreeSet::new();
    for &input in &inputs {
        let handle = graph
            .handle_for(input)
            .ok_or_else(|| DriverError::internal("unregistered input"))?;
        let changed = match &prior {
            None => true,
            Some(record) => match record.inputs.get(input) {
                None => true,
                Some(entry) => {
                    entry.outcome == JobOutcome::Failed
                        || entry.last_modification_date != modification_dates[input]
                }
            },
        };
        if changed {
            if show_incremental {
                debug!("scheduling \"{}\": out of date", input.display());
            }
            first_wave.extend(graph.find_inputs_invalidated_by(handle));
        }
    }
    for handle in unreadable {
        if show_incremental {
            debug!(
                "scheduling \"{}\": unusable dependency summary",
                graph.input_path(handle).display()
            );
        }
        first_wave.extend(graph.find_inputs_invalidated_by(handle));
    }

    let mut record = BuildRecord::new(version.clone(), hash, build_start_time);
    let mut scheduled = first_wave.clone();
    let mut pending: VecDeque<InputHandle> = first_wave.into_iter().collect();
    let mut compiled = Vec::new();
    let mut any_failed = false;

    while let Some(handle) = pending.pop_front() {
        let input = graph.input_path(handle).to_path_buf();
        let mtime = modification_dates.get(&input).copied().unwrap_or_default();
        compiled.push(input.clone());

        match executor.compile(&input) {
            JobStatus::Failed => {
                any_failed = true;
                record.record_input(&input, mtime, JobOutcome::Failed);
            }
            JobStatus::Succeeded => {
                record.record_input(&input, mtime, JobOutcome::Succeeded);
                let summary_path = graph.summary_path(handle).to_path_buf();
                match graph.integrate_summary_file(&summary_path, handle)? {
                    None => {
                        // the next build will force-compile this input
                        warn!(
                            "frontend produced no usable summary for \"{}\"",
                            input.display()
                        );
                    }
                    Some(changes) => {
                        for next in graph.find_inputs_invalidated_by_nodes(&changes) {
                            if next != handle && scheduled.insert(next) {
                                if show_incremental {
                                    debug!(
                                        "scheduling \"{}\": depends on \"{}\"",
                                        graph.input_path(next).display(),
                                        input.display()
                                    );
                                }
                                pending.push_back(next);
                            }
                        }
                    }
                }
            }
        }
    }

    let mut skipped = Vec::new();
    for &input in &inputs {
        let handle = graph
            .handle_for(input)
            .ok_or_else(|| DriverError::internal("unregistered input"))?;
        if !scheduled.contains(&handle) {
            let mtime = modification_dates.get(input).copied().unwrap_or_default();
            record.record_input(input, mtime, JobOutcome::Skipped);
            skipped.push(input.to_path_buf());
        }
    }

    if let Err(err) = store.write(&record) {
        diags.emit(Diag::UnwritableBuildRecord { reason: err.to_string() });
    }

    Ok(Some(BuildSummary {
        compiled,
        skipped,
        incremental: true,
        success: !any_failed && !diags.has_errors(),
    }))
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
