//! The persisted build record and the store that admits or rejects it.
//!
//! The record summarizes the previous build: which tool produced it, which
//! incremental-affecting options were present, when the build started, and
//! what happened to each input. The store decides whether the previous record
//! may seed an incremental build and writes the new record at shutdown.

use crate::{
    error::Result,
    options::{option_def, ParsedOptions},
    output_file_map::OutputFileMap,
    utils,
};
use semver::Version;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

/// Format version of the build-record file.
const RECORD_FORMAT_VERSION: &str = "swift-build-record-1";

/// What happened to an input in the recorded build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobOutcome {
    Succeeded,
    Failed,
    /// The input was up to date and no job ran for it.
    Skipped,
}

/// Per-input state captured at the time of the recorded build.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputEntry {
    /// Modification time of the source at the start of the recorded build,
    /// in milliseconds since the epoch.
    pub last_modification_date: u64,
    pub outcome: JobOutcome,
}

/// A serialized summary of one build.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRecord {
    #[serde(rename = "_format")]
    pub format: String,
    /// The tool version that produced the record.
    pub version: Version,
    /// Hash over the incremental-affecting options; older tools did not
    /// record one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options_hash: Option<String>,
    /// When the recorded build started, in milliseconds since the epoch.
    pub build_start_time: u64,
    pub inputs: BTreeMap<PathBuf, InputEntry>,
}

impl BuildRecord {
    /// Starts a fresh record for the current build.
    pub fn new(version: Version, options_hash: String, build_start_time: u64) -> Self {
        Self {
            format: RECORD_FORMAT_VERSION.to_string(),
            version,
            options_hash: Some(options_hash),
            build_start_time,
            inputs: BTreeMap::new(),
        }
    }

    /// Appends the outcome for one input.
    pub fn record_input(
        &mut self,
        input: impl Into<PathBuf>,
        last_modification_date: u64,
        outcome: JobOutcome,
    ) {
        self.inputs
            .insert(input.into(), InputEntry { last_modification_date, outcome });
    }

    /// The inputs that were skipped in the recorded build.
    pub fn skipped_inputs(&self) -> impl Iterator<Item = &Path> {
        self.inputs
            .iter()
            .filter(|(_, entry)| entry.outcome == JobOutcome::Skipped)
            .map(|(path, _)| path.as_path())
    }

    /// The recorded modification time for `input`, if it was part of the
    /// recorded build.
    pub fn modification_date(&self, input: &Path) -> Option<u64> {
        self.inputs.get(input).map(|entry| entry.last_modification_date)
    }

    pub fn contains_input(&self, input: &Path) -> bool {
        self.inputs.contains_key(input)
    }
}

/// Why a previous build record cannot seed this build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordRejection {
    /// "compiler version mismatch"
    VersionMismatch,
    /// "different arguments"
    DifferentArguments,
    /// The file was unreadable or malformed.
    Malformed(String),
}

impl std::fmt::Display for RecordRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VersionMismatch => f.write_str("compiler version mismatch"),
            Self::DifferentArguments => f.write_str("different arguments"),
            Self::Malformed(reason) => write!(f, "malformed build record: {reason}"),
        }
    }
}

/// Computes the hash over the spellings of all non-input options that affect
/// the incremental build.
///
/// The hash covers presence, not values; sorting makes it invariant under
/// reordering of the command line.
pub fn options_hash(parsed: &ParsedOptions) -> String {
    let mut spellings: Vec<&str> = parsed
        .iter()
        .filter_map(|entry| entry.option_id())
        .map(|id| option_def(id))
        .filter(|def| def.affects_incremental_build)
        .map(|def| def.spelling)
        .collect();
    spellings.sort_unstable();

    let mut hasher = Sha256::new();
    for spelling in spellings {
        hasher.update(spelling.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Locates, loads and writes the build record.
#[derive(Clone, Debug)]
pub struct BuildRecordStore {
    path: PathBuf,
}

impl BuildRecordStore {
    /// Resolves the record path from the output file map's whole-module
    /// dependencies entry.
    ///
    /// Returns `None` when no entry exists; the caller downgrades to a clean
    /// build in that case.
    pub fn from_output_file_map(map: Option<&OutputFileMap>) -> Option<Self> {
        let path = map?.build_record_path()?;
        Some(Self { path: path.to_path_buf() })
    }

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the previous record and checks it against the current tool
    /// version and options hash.
    ///
    /// Admission is deterministic: the same record, version and hash always
    /// produce the same result.
    pub fn load(
        &self,
        current_version: &Version,
        current_options_hash: &str,
    ) -> Result<BuildRecord, RecordRejection> {
        let record: BuildRecord = utils::read_json_file(&self.path)
            .map_err(|err| RecordRejection::Malformed(err.to_string()))?;

        if record.format != RECORD_FORMAT_VERSION {
            return Err(RecordRejection::Malformed(format!(
                "unrecognized format \"{}\"",
                record.format
            )));
        }
        if record.version != *current_version {
            trace!(
                "rejecting build record from version {} (current {})",
                record.version,
                current_version
            );
            return Err(RecordRejection::VersionMismatch);
        }
        match record.options_hash.as_deref() {
            // records from before hashing are tolerated
            None => {}
            Some(hash) if hash == current_options_hash => {}
            Some(_) => return Err(RecordRejection::DifferentArguments),
        }
        Ok(record)
    }

    /// Writes the record, preserving the previous file as `<name>~`.
    ///
    /// The write is atomic: the record is serialized to a sibling temporary
    /// file first and renamed into place.
    pub fn write(&self, record: &BuildRecord) -> Result<()> {
        if self.path.exists() {
            let mut backup = self.path.clone().into_os_string();
            backup.push("~");
            // preserving the old record is best-effort
            let _ = fs::rename(&self.path, PathBuf::from(backup));
        }

        utils::create_parent_dir_all(&self.path)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        utils::write_json_file(record, &tmp)?;
        fs::rename(&tmp, &self.path).map_err(|err| crate::error::DriverError::io(err, &self.path))?;
        trace!("wrote build record with {} inputs to \"{}\"", record.inputs.len(), self.path.display());
        Ok(())
    }
}
