//! Reader for the per-input dependency summary the frontend writes next to
//! each compiled source file.

use super::key::DependencyKey;
use crate::{error::Result, utils};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Format version of the summary file.
const SUMMARY_FORMAT_VERSION: &str = "swift-dependencies-1";

/// An entity the input defines, with the content hash the frontend computed
/// over its declaration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryDefine {
    #[serde(flatten)]
    pub key: DependencyKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

/// Everything one input defines and uses, as serialized by the frontend.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFileSummary {
    #[serde(rename = "_format", default)]
    pub format: String,
    pub provides: Vec<SummaryDefine>,
    pub depends: Vec<DependencyKey>,
}

impl SourceFileSummary {
    /// Reads and validates a summary file.
    ///
    /// Any read or decode failure is reported as an error; the integrator
    /// treats it as a malformed summary.
    pub fn read(path: &Path) -> Result<Self> {
        let summary: Self = utils::read_json_file(path)?;
        if summary.format != SUMMARY_FORMAT_VERSION {
            return Err(crate::error::DriverError::msg(format!(
                "unrecognized dependency summary format \"{}\" in \"{}\"",
                summary.format,
                path.display()
            )));
        }
        Ok(summary)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        utils::create_parent_dir_all(path)?;
        utils::write_json_file(self, path)
    }

    /// A summary with the current format tag.
    pub fn new(provides: Vec<SummaryDefine>, depends: Vec<DependencyKey>) -> Self {
        Self { format: SUMMARY_FORMAT_VERSION.to_string(), provides, depends }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depgraph::key::{Aspect, Designator};
    use pretty_assertions::assert_eq;

    #[test]
    fn summary_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.swiftdeps");
        let summary = SourceFileSummary::new(
            vec![SummaryDefine {
                key: DependencyKey::top_level("foo"),
                fingerprint: Some("abc123".to_string()),
            }],
            vec![
                DependencyKey::new(
                    Aspect::Interface,
                    Designator::Member { context: "4main3BarV".to_string(), name: "baz".to_string() },
                ),
                DependencyKey::external("/sdk/Swift.swiftmodule"),
            ],
        );
        summary.write(&path).unwrap();
        assert_eq!(SourceFileSummary::read(&path).unwrap(), summary);
    }

    #[test]
    fn rejects_foreign_formats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.swiftdeps");
        std::fs::write(&path, r#"{"_format": "who-knows", "provides": [], "depends": []}"#)
            .unwrap();
        assert!(SourceFileSummary::read(&path).is_err());
    }

    #[test]
    fn rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.swiftdeps");
        std::fs::write(&path, "swiftdeps but not really").unwrap();
        assert!(SourceFileSummary::read(&path).is_err());
    }
}
