//! The file types the driver plans around.

use serde::{Deserialize, Serialize};
use std::{fmt, path::Path, str::FromStr};

/// A type of file an input can have or a job can produce.
///
/// Unknown input extensions default to [`FileType::Object`] so that object
/// files produced by other toolchains can be handed straight to the linker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum FileType {
    /// A Swift source file, the primary input language.
    Swift,
    /// Canonical SIL.
    Sil,
    /// SIL as produced by SILGen, before mandatory passes.
    RawSil,
    /// A serialized SIL module.
    Sib,
    /// A serialized SIL module before mandatory passes.
    RawSib,
    /// Textual LLVM IR.
    LlvmIr,
    /// LLVM bitcode.
    LlvmBc,
    Assembly,
    Object,
    /// A compiled Swift module interface.
    SwiftModule,
    /// The per-input dependency summary consumed by the incremental engine.
    SwiftDeps,
    /// A precompiled bridging header.
    Pch,
    /// A precompiled Clang module.
    ClangModule,
    ImportedModules,
    AstDump,
    /// A migration remapping produced by `-update-code`.
    Remapping,
    IndexData,
    /// Modes such as `-typecheck` that produce no output file.
    Nothing,
}

impl FileType {
    /// Derives the type from the file extension of `path`.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("swift") => Self::Swift,
            Some("sil") => Self::Sil,
            Some("sib") => Self::Sib,
            Some("ll") => Self::LlvmIr,
            Some("bc") => Self::LlvmBc,
            Some("s") => Self::Assembly,
            Some("swiftmodule") => Self::SwiftModule,
            Some("swiftdeps") => Self::SwiftDeps,
            Some("pch") => Self::Pch,
            Some("pcm") => Self::ClangModule,
            Some("remap") => Self::Remapping,
            _ => Self::Object,
        }
    }

    /// The extension used when the driver makes up a file name itself.
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Swift => "swift",
            Self::Sil | Self::RawSil => "sil",
            Self::Sib | Self::RawSib => "sib",
            Self::LlvmIr => "ll",
            Self::LlvmBc => "bc",
            Self::Assembly => "s",
            Self::Object => "o",
            Self::SwiftModule => "swiftmodule",
            Self::SwiftDeps => "swiftdeps",
            Self::Pch => "pch",
            Self::ClangModule => "pcm",
            Self::ImportedModules => "importedmodules",
            Self::AstDump => "ast",
            Self::Remapping => "remap",
            Self::IndexData => "indexdata",
            Self::Nothing => "",
        }
    }

    /// The name used for this type in the output file map.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Swift => "swift",
            Self::Sil => "sil",
            Self::RawSil => "raw-sil",
            Self::Sib => "sib",
            Self::RawSib => "raw-sib",
            Self::LlvmIr => "llvm-ir",
            Self::LlvmBc => "llvm-bc",
            Self::Assembly => "assembly",
            Self::Object => "object",
            Self::SwiftModule => "swiftmodule",
            Self::SwiftDeps => "swift-dependencies",
            Self::Pch => "pch",
            Self::ClangModule => "pcm",
            Self::ImportedModules => "imported-modules",
            Self::AstDump => "ast-dump",
            Self::Remapping => "remap",
            Self::IndexData => "index-data",
            Self::Nothing => "none",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "swift" => Ok(Self::Swift),
            "sil" => Ok(Self::Sil),
            "raw-sil" => Ok(Self::RawSil),
            "sib" => Ok(Self::Sib),
            "raw-sib" => Ok(Self::RawSib),
            "llvm-ir" => Ok(Self::LlvmIr),
            "llvm-bc" => Ok(Self::LlvmBc),
            "assembly" => Ok(Self::Assembly),
            "object" => Ok(Self::Object),
            "swiftmodule" => Ok(Self::SwiftModule),
            "swift-dependencies" => Ok(Self::SwiftDeps),
            "pch" => Ok(Self::Pch),
            "pcm" => Ok(Self::ClangModule),
            "imported-modules" => Ok(Self::ImportedModules),
            "ast-dump" => Ok(Self::AstDump),
            "remap" => Ok(Self::Remapping),
            "index-data" => Ok(Self::IndexData),
            "none" => Ok(Self::Nothing),
            s => Err(format!("unknown file type: {s}")),
        }
    }
}

impl TryFrom<String> for FileType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<FileType> for &'static str {
    fn from(ty: FileType) -> Self {
        ty.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_derive_type_from_extension() {
        assert_eq!(FileType::from_path(Path::new("a.swift")), FileType::Swift);
        assert_eq!(FileType::from_path(Path::new("lib/a.o")), FileType::Object);
        assert_eq!(FileType::from_path(Path::new("a.swiftdeps")), FileType::SwiftDeps);
        // unknown extensions are treated as objects
        assert_eq!(FileType::from_path(Path::new("a.weird")), FileType::Object);
        assert_eq!(FileType::from_path(Path::new("noext")), FileType::Object);
    }

    #[test]
    fn file_type_names_round_trip() {
        for ty in [
            FileType::Swift,
            FileType::Object,
            FileType::SwiftModule,
            FileType::SwiftDeps,
            FileType::RawSil,
            FileType::IndexData,
        ] {
            assert_eq!(ty.as_str().parse::<FileType>().unwrap(), ty);
        }
    }
}
