//! Diagnostic sink used during plan derivation and the incremental session.
//!
//! The driver never formats diagnostics for humans itself; it records them
//! here and the embedding frontend renders them. The sink also answers the
//! one question the core cares about: did any error occur.

use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    #[default]
    Error,
    Warning,
    Remark,
}

impl Severity {
    /// Returns `true` if the severity is `Error`.
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    /// Returns the string representation of the severity.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Remark => "remark",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every diagnostic the planning pipeline can emit.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Diag {
    /// `-static` may not be combined with `-emit-executable`
    StaticEmitExecutableDisallowed,
    /// `-debug-info-format` was given without any `-g` option
    OptionMissingRequiredArgument { option: String, required: String },
    /// two options are mutually exclusive, e.g. codeview with `-gdwarf-types`
    ArgumentNotAllowedWith { option: String, other: String },
    /// emitting a module is meaningless under repl/immediate modes
    ModeCannotEmitModule,
    /// the derived module name is not a valid identifier
    BadModuleName { name: String },
    /// the module name `Swift` is reserved for the standard library
    StdlibModuleName,
    /// an option value was not one of the recognized spellings
    InvalidArgValue { option: String, value: String },
    /// the output file map has no build-record entry for the whole module
    IncrementalRequiresBuildRecordEntry,
    /// the previous build record could not be used
    UnusableBuildRecord { reason: String },
    /// the new build record could not be written
    UnwritableBuildRecord { reason: String },
    /// an input has no dependencies-file entry in the output file map
    MissingDependenciesEntry { input: String },
}

impl Diag {
    pub const fn severity(&self) -> Severity {
        match self {
            Self::StaticEmitExecutableDisallowed
            | Self::OptionMissingRequiredArgument { .. }
            | Self::ArgumentNotAllowedWith { .. }
            | Self::ModeCannotEmitModule
            | Self::BadModuleName { .. }
            | Self::StdlibModuleName
            | Self::InvalidArgValue { .. } => Severity::Error,
            Self::IncrementalRequiresBuildRecordEntry
            | Self::UnusableBuildRecord { .. }
            | Self::UnwritableBuildRecord { .. } => Severity::Warning,
            Self::MissingDependenciesEntry { .. } => Severity::Remark,
        }
    }

    /// Returns `true` if this diagnostic is fatal to plan derivation.
    pub const fn is_error(&self) -> bool {
        self.severity().is_error()
    }
}

impl fmt::Display for Diag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaticEmitExecutableDisallowed => {
                f.write_str("-static may not be used with -emit-executable")
            }
            Self::OptionMissingRequiredArgument { option, required } => {
                write!(f, "option '{option}' is missing a required argument ({required})")
            }
            Self::ArgumentNotAllowedWith { option, other } => {
                write!(f, "argument '{option}' is not allowed with '{other}'")
            }
            Self::ModeCannotEmitModule => {
                f.write_str("this mode does not support emitting modules")
            }
            Self::BadModuleName { name } => {
                write!(f, "module name \"{name}\" is not a valid identifier")
            }
            Self::StdlibModuleName => {
                f.write_str("module name \"Swift\" is reserved for the standard library")
            }
            Self::InvalidArgValue { option, value } => {
                write!(f, "invalid value '{value}' in '{option}'")
            }
            Self::IncrementalRequiresBuildRecordEntry => f.write_str(
                "ignoring -incremental (currently requires an output file map with a build-record entry)",
            ),
            Self::UnusableBuildRecord { reason } => {
                write!(f, "unable to load the previous build record: {reason}")
            }
            Self::UnwritableBuildRecord { reason } => {
                write!(f, "unable to write the build record: {reason}")
            }
            Self::MissingDependenciesEntry { input } => {
                write!(f, "incremental compilation is disabled: no dependencies file for \"{input}\"")
            }
        }
    }
}

/// Accumulates diagnostics emitted while deriving a plan or running a build.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    emitted: Vec<Diag>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the diagnostic and logs it.
    pub fn emit(&mut self, diag: Diag) {
        match diag.severity() {
            Severity::Error => error!("{diag}"),
            Severity::Warning => warn!("{diag}"),
            Severity::Remark => debug!("{diag}"),
        }
        self.emitted.push(diag);
    }

    /// All diagnostics in emission order.
    pub fn all(&self) -> &[Diag] {
        &self.emitted
    }

    /// Returns `true` if any error-severity diagnostic was emitted.
    pub fn has_errors(&self) -> bool {
        self.emitted.iter().any(Diag::is_error)
    }

    /// Number of error-severity diagnostics.
    pub fn error_count(&self) -> usize {
        self.emitted.iter().filter(|d| d.is_error()).count()
    }

    /// Returns `true` if the exact diagnostic was emitted.
    pub fn contains(&self, diag: &Diag) -> bool {
        self.emitted.contains(diag)
    }
}
