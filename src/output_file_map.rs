//! The output file map: where each input's products are written.

use crate::{error::Result, filetype::FileType, utils};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// The key under which whole-module outputs are recorded.
pub const WHOLE_MODULE_ENTRY: &str = "";

/// A mapping from `(input, output type)` to the output path, loaded from the
/// JSON file named by `-output-file-map`.
///
/// The map is queried, never mutated, after loading. Outputs that apply to
/// the whole module rather than a single input live under the empty-string
/// sentinel entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputFileMap {
    entries: BTreeMap<PathBuf, BTreeMap<FileType, PathBuf>>,
}

impl OutputFileMap {
    /// Reads the map from the given JSON file.
    pub fn read(path: &Path) -> Result<Self> {
        trace!("reading output file map at \"{}\"", path.display());
        let map: Self = utils::read_json_file(path)?;
        trace!("read output file map with {} entries", map.entries.len());
        Ok(map)
    }

    /// The output path of `ty` for the given input.
    pub fn output_for(&self, input: &Path, ty: FileType) -> Option<&Path> {
        self.entries.get(input)?.get(&ty).map(PathBuf::as_path)
    }

    /// The whole-module output path of `ty`.
    pub fn whole_module_output(&self, ty: FileType) -> Option<&Path> {
        self.entries.get(Path::new(WHOLE_MODULE_ENTRY))?.get(&ty).map(PathBuf::as_path)
    }

    /// The path of the build record, recorded as the whole-module
    /// dependencies entry.
    pub fn build_record_path(&self) -> Option<&Path> {
        self.whole_module_output(FileType::SwiftDeps)
    }

    /// The dependency-summary path for a single input.
    pub fn swift_deps_for(&self, input: &Path) -> Option<&Path> {
        self.output_for(input, FileType::SwiftDeps)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
