//! Utility functions

use crate::error::{DriverError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::UNIX_EPOCH,
};

/// A regex that matches a Swift module identifier: a leading letter or
/// underscore followed by letters, digits or underscores.
pub static RE_MODULE_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Returns `true` if `name` is a valid Swift module identifier.
pub fn is_valid_module_name(name: &str) -> bool {
    RE_MODULE_IDENTIFIER.is_match(name)
}

/// Reads the json file and deserialize it into the provided type
pub fn read_json_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let file = fs::File::open(path).map_err(|err| DriverError::io(err, path))?;
    let file = std::io::BufReader::new(file);
    let val: T = serde_json::from_reader(file)?;
    Ok(val)
}

/// Writes serializes the provided value to JSON and writes it to a file
pub fn write_json_file<T: Serialize>(value: &T, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = fs::File::create(path).map_err(|err| DriverError::io(err, path))?;
    let writer = std::io::BufWriter::new(file);
    serde_json::to_writer_pretty(writer, value)?;
    Ok(())
}

/// Creates the parent directory of the `file` and all its ancestors if it does not exist
pub fn create_parent_dir_all(file: impl AsRef<Path>) -> Result<()> {
    let file = file.as_ref();
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent).map_err(|err| {
            DriverError::msg(format!(
                "Failed to create artifact parent folder \"{}\": {}",
                parent.display(),
                err
            ))
        })?;
    }
    Ok(())
}

/// Reads the modification timestamp of `file` as milliseconds since the epoch.
pub fn read_last_modification_date(file: impl AsRef<Path>) -> Result<u64> {
    let file = file.as_ref();
    let last_modification_date = fs::metadata(file)
        .map_err(|err| DriverError::io(err, file))?
        .modified()
        .map_err(|err| DriverError::io(err, file))?
        .duration_since(UNIX_EPOCH)
        .map_err(DriverError::msg)?
        .as_millis() as u64;
    Ok(last_modification_date)
}

/// Returns the file name of `path` with any extension stripped.
pub fn file_stem(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|stem| stem.to_str())
}

/// Attempts to resolve `path` to an absolute path against `base`.
///
/// Already-absolute paths are returned unchanged.
pub fn absolutize(base: &Path, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Canonicalizes `path`, resolving it against the process working directory if
/// it is relative.
///
/// On platforms where `canonicalize` yields UNC paths this uses `dunce` to
/// return the simplified form.
pub fn canonicalize_working_directory(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        let cwd = std::env::current_dir().map_err(|err| DriverError::io(err, path))?;
        cwd.join(path)
    };
    // the directory is allowed to not exist yet, in which case the lexical
    // absolute form is used as is
    Ok(dunce::canonicalize(&absolute).unwrap_or(absolute))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_validate_module_names() {
        assert!(is_valid_module_name("Foo"));
        assert!(is_valid_module_name("_Foo2"));
        assert!(is_valid_module_name("main"));
        assert!(!is_valid_module_name("123"));
        assert!(!is_valid_module_name("foo-bar"));
        assert!(!is_valid_module_name(""));
    }

    #[test]
    fn can_absolutize() {
        let base = Path::new("/work");
        assert_eq!(absolutize(base, "a.swift"), PathBuf::from("/work/a.swift"));
        assert_eq!(absolutize(base, "/abs/a.swift"), PathBuf::from("/abs/a.swift"));
    }
}
