//! Keys identifying the semantic entities the dependency graph tracks.

use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf};

/// Which face of an entity a dependency touches.
///
/// Uses of the interface propagate to downstream files; uses of the
/// implementation stay within the defining file's rebuild.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Aspect {
    Interface,
    Implementation,
}

/// What kind of entity a dependency names.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Designator {
    /// A top-level name in the module.
    TopLevel { name: String },
    /// A nominal type, identified by its mangled name.
    Nominal { context: String },
    /// Any member of the given nominal type.
    PotentialMember { context: String },
    /// A specific member of a nominal type.
    Member { context: String, name: String },
    /// A name looked up via `AnyObject` dynamic lookup.
    DynamicLookup { name: String },
    /// The source file itself, as seen by other files.
    SourceFileProvide { name: String },
    /// An entity defined outside the module, identified by the file that
    /// declares it.
    ExternalDepend { path: PathBuf },
}

/// The pair a graph node is keyed by.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DependencyKey {
    pub aspect: Aspect,
    pub designator: Designator,
}

impl DependencyKey {
    pub fn new(aspect: Aspect, designator: Designator) -> Self {
        Self { aspect, designator }
    }

    /// The interface aspect of a top-level name.
    pub fn top_level(name: impl Into<String>) -> Self {
        Self::new(Aspect::Interface, Designator::TopLevel { name: name.into() })
    }

    /// The interface aspect of an external dependency.
    pub fn external(path: impl Into<PathBuf>) -> Self {
        Self::new(Aspect::Interface, Designator::ExternalDepend { path: path.into() })
    }

    pub fn is_external(&self) -> bool {
        matches!(self.designator, Designator::ExternalDepend { .. })
    }

    /// The external file this key names, if it is an external dependency.
    pub fn external_path(&self) -> Option<&PathBuf> {
        match &self.designator {
            Designator::ExternalDepend { path } => Some(path),
            _ => None,
        }
    }
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let aspect = match self.aspect {
            Aspect::Interface => "interface",
            Aspect::Implementation => "implementation",
        };
        match &self.designator {
            Designator::TopLevel { name } => write!(f, "{aspect} of top-level {name}"),
            Designator::Nominal { context } => write!(f, "{aspect} of type {context}"),
            Designator::PotentialMember { context } => {
                write!(f, "{aspect} of potential members of {context}")
            }
            Designator::Member { context, name } => {
                write!(f, "{aspect} of member {context}.{name}")
            }
            Designator::DynamicLookup { name } => {
                write!(f, "{aspect} of AnyObject member {name}")
            }
            Designator::SourceFileProvide { name } => {
                write!(f, "{aspect} of source file {name}")
            }
            Designator::ExternalDepend { path } => {
                write!(f, "{aspect} of external module \"{}\"", path.display())
            }
        }
    }
}
