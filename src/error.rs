use std::{
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub type Result<T, E = DriverError> = std::result::Result<T, E>;

/// Various error types
#[derive(Debug, Error)]
pub enum DriverError {
    /// Errors related to the filesystem
    #[error(transparent)]
    Io(#[from] DriverIoError),
    /// argv[0] does not name a recognized driver persona
    #[error("invalid driver name: \"{0}\"")]
    InvalidDriverName(String),
    /// A token starting with `-` did not match any option spelling
    #[error("unknown argument: \"{0}\"")]
    UnknownOption(String),
    /// A separate-value option reached the end of argv
    #[error("missing argument value for \"{0}\"")]
    MissingValue(String),
    /// The option exists but not under the invoked driver persona
    #[error("option \"{option}\" is not supported by \"{driver}\"")]
    UnsupportedOption { option: String, driver: &'static str },
    /// Plan derivation emitted at least one error diagnostic
    #[error("{0} error(s) were emitted while deriving the compilation plan")]
    PlanDiagnostics(usize),
    /// Deserialization of a persisted file failed
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
    #[error(transparent)]
    SemverError(#[from] semver::Error),
    /// An internal invariant was violated; loud by design
    #[error("internal driver error: {0}")]
    Internal(String),
    #[error("{0}")]
    Message(String),
}

impl DriverError {
    pub fn io(err: io::Error, path: impl Into<PathBuf>) -> Self {
        DriverIoError::new(err, path).into()
    }

    pub fn internal(msg: impl std::fmt::Display) -> Self {
        DriverError::Internal(msg.to_string())
    }

    pub fn msg(msg: impl std::fmt::Display) -> Self {
        DriverError::Message(msg.to_string())
    }
}

#[derive(Debug, Error)]
#[error("\"{}\": {}", .path.display(), .io)]
pub struct DriverIoError {
    io: io::Error,
    path: PathBuf,
}

impl DriverIoError {
    pub fn new(io: io::Error, path: impl Into<PathBuf>) -> Self {
        Self { io, path: path.into() }
    }

    /// The path at which the error occurred
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The underlying `io::Error`
    pub fn io_error(&self) -> &io::Error {
        &self.io
    }
}

impl From<DriverIoError> for io::Error {
    fn from(err: DriverIoError) -> Self {
        err.io
    }
}
