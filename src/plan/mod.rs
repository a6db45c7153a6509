//! Derivation of the [`CompilationPlan`] from the parsed options.
//!
//! Each step is a pure function over [`ParsedOptions`]; the only filesystem
//! access is loading the output file map and resolving the working directory.
//! Once derived, a plan is never mutated.

use crate::{
    diagnostics::Diagnostics,
    error::{DriverError, Result},
    filetype::FileType,
    options::{option_def, OptionId, OptionValue, ParsedOptionId, ParsedOptions, STDIN_SENTINEL},
    output_file_map::OutputFileMap,
    utils,
};
use std::path::{Path, PathBuf};

mod module_name;
mod outputs;

pub use module_name::{derive_module_name, BAD_MODULE_NAME, REPL_MODULE_NAME};
pub use outputs::{
    derive_compiler_mode, derive_debug_info, derive_module_output_kind, derive_output_types,
    CompilerMode, DebugInfo, DebugInfoFormat, DebugInfoLevel, LinkOutputType, ModuleOutputKind,
    OutputTypes,
};

/// The persona the driver adopts based on how it was invoked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DriverKind {
    /// `swift`: run code interactively or immediately.
    Interactive,
    /// `swiftc`: compile and link.
    Batch,
    /// `swift-autolink-extract`: delegate to the autolink tool.
    AutolinkExtract,
    /// `-frontend` escape: delegate to a frontend invocation.
    Frontend,
    /// `-modulewrap` escape: delegate to the module wrapper.
    Modulewrap,
}

impl DriverKind {
    /// Resolves a driver name as used by argv[0] or `--driver-mode=`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "swift" => Some(Self::Interactive),
            "swiftc" => Some(Self::Batch),
            "swift-autolink-extract" => Some(Self::AutolinkExtract),
            _ => None,
        }
    }

    /// The kinds the planning pipeline itself handles.
    pub const fn is_compiler(&self) -> bool {
        matches!(self, Self::Interactive | Self::Batch)
    }

    pub const fn is_interactive(&self) -> bool {
        matches!(self, Self::Interactive)
    }

    /// The tool image a delegating kind hands the invocation to.
    pub const fn tool_name(&self) -> &'static str {
        match self {
            Self::Interactive => "swift",
            Self::Batch => "swiftc",
            Self::AutolinkExtract => "swift-autolink-extract",
            Self::Frontend => "swift-frontend",
            Self::Modulewrap => "swift-modulewrap",
        }
    }
}

/// Determines the driver kind from argv[0] and the argv tail.
///
/// `-frontend` and `-modulewrap` in leading position escape to the
/// corresponding tool; otherwise the basename decides, with `--driver-mode=`
/// taking precedence (last occurrence wins).
pub fn derive_driver_kind(argv0: &str, tail: &[String]) -> Result<DriverKind> {
    match tail.first().map(String::as_str) {
        Some("-frontend") => return Ok(DriverKind::Frontend),
        Some("-modulewrap") => return Ok(DriverKind::Modulewrap),
        _ => {}
    }

    let mut name = Path::new(argv0)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(argv0)
        .to_string();

    for token in tail {
        if token == "--driver-mode" {
            return Err(DriverError::MissingValue("--driver-mode=".to_string()));
        }
        if let Some(value) = token.strip_prefix("--driver-mode=") {
            name = value.to_string();
        }
    }

    DriverKind::from_name(&name).ok_or(DriverError::InvalidDriverName(name))
}

/// Where an input comes from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FileRef {
    Path(PathBuf),
    Stdin,
}

impl FileRef {
    /// The path, for file-backed inputs.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path),
            Self::Stdin => None,
        }
    }
}

impl std::fmt::Display for FileRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Stdin => f.write_str("<stdin>"),
        }
    }
}

/// A classified input.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InputFile {
    pub file: FileRef,
    pub file_type: FileType,
}

impl InputFile {
    /// Classifies an input token; standard input is typed as Swift source.
    pub fn from_token(token: &str) -> Self {
        if token == STDIN_SENTINEL {
            Self { file: FileRef::Stdin, file_type: FileType::Swift }
        } else {
            let path = PathBuf::from(token);
            let file_type = FileType::from_path(&path);
            Self { file: FileRef::Path(path), file_type }
        }
    }

    pub fn is_swift_source(&self) -> bool {
        self.file_type == FileType::Swift
    }
}

/// The fully derived, immutable description of what this driver run builds.
#[derive(Clone, Debug)]
pub struct CompilationPlan {
    pub driver_kind: DriverKind,
    pub compiler_mode: CompilerMode,
    pub inputs: Vec<InputFile>,
    pub output_file_map: Option<OutputFileMap>,
    pub compiler_output_type: Option<FileType>,
    pub linker_output_type: Option<LinkOutputType>,
    pub debug_info_level: Option<DebugInfoLevel>,
    pub debug_info_format: DebugInfoFormat,
    pub module_output_kind: Option<ModuleOutputKind>,
    pub module_name: String,
    pub working_directory: Option<PathBuf>,
}

impl CompilationPlan {
    /// The Swift source inputs, the only inputs the incremental engine
    /// schedules.
    pub fn swift_source_inputs(&self) -> impl Iterator<Item = &Path> {
        self.inputs
            .iter()
            .filter(|input| input.is_swift_source())
            .filter_map(|input| input.file.path())
    }
}

/// Resolves `-working-directory` and rewrites every path-valued option and
/// input in place.
///
/// Applying the pass twice is a no-op: rewritten values are absolute and
/// absolute values are left alone.
pub fn apply_working_directory(
    parsed: &mut ParsedOptions,
) -> Result<Option<PathBuf>> {
    let Some(dir) = parsed.last_value(OptionId::WorkingDirectory) else {
        return Ok(None);
    };
    let dir = utils::canonicalize_working_directory(dir)?;
    trace!("resolving relative paths against \"{}\"", dir.display());

    let rewrite = |value: &mut String| {
        if value.as_str() == STDIN_SENTINEL {
            return;
        }
        let path = Path::new(value.as_str());
        if path.is_relative() {
            *value = utils::absolutize(&dir, path).to_string_lossy().into_owned();
        }
    };

    parsed.for_each_modifying(|entry| {
        let is_path = match entry.id {
            ParsedOptionId::Input => true,
            ParsedOptionId::Opt(id) => option_def(id).argument_is_path,
        };
        if !is_path {
            return;
        }
        match &mut entry.value {
            OptionValue::None => {}
            OptionValue::Single(value) => rewrite(value),
            OptionValue::Multiple(values) => values.iter_mut().for_each(rewrite),
        }
    });

    Ok(Some(dir))
}

/// Collects the inputs in argv order.
pub fn collect_inputs(parsed: &ParsedOptions) -> Vec<InputFile> {
    parsed.inputs().map(InputFile::from_token).collect()
}

/// Runs the whole derivation pipeline over an already-parsed option log.
pub fn derive_plan(
    driver_kind: DriverKind,
    mut parsed: ParsedOptions,
    diags: &mut Diagnostics,
) -> Result<CompilationPlan> {
    reject_unsupported_options(driver_kind, &parsed)?;

    let working_directory = apply_working_directory(&mut parsed)?;
    let inputs = collect_inputs(&parsed);

    let compiler_mode = derive_compiler_mode(&parsed, driver_kind, !inputs.is_empty());
    let output_types = derive_output_types(&parsed, driver_kind, diags)?;
    let debug_info = derive_debug_info(&parsed, diags);
    let module_output_kind =
        derive_module_output_kind(&parsed, compiler_mode, debug_info, diags);
    let module_name = derive_module_name(
        &parsed,
        compiler_mode,
        output_types.compiler,
        output_types.linker,
        diags,
    );

    let output_file_map = match parsed.last_value(OptionId::OutputFileMap) {
        Some(path) => Some(OutputFileMap::read(Path::new(path))?),
        None => None,
    };

    Ok(CompilationPlan {
        driver_kind,
        compiler_mode,
        inputs,
        output_file_map,
        compiler_output_type: output_types.compiler,
        linker_output_type: output_types.linker,
        debug_info_level: debug_info.level,
        debug_info_format: debug_info.format,
        module_output_kind,
        module_name,
        working_directory,
    })
}

/// Rejects options whose schema entry excludes the interactive persona.
fn reject_unsupported_options(driver_kind: DriverKind, parsed: &ParsedOptions) -> Result<()> {
    if !driver_kind.is_interactive() {
        return Ok(());
    }
    for entry in parsed.iter() {
        if let Some(id) = entry.option_id() {
            let def = option_def(id);
            if def.no_interactive {
                return Err(DriverError::UnsupportedOption {
                    option: def.spelling.to_string(),
                    driver: driver_kind.tool_name(),
                });
            }
        }
    }
    Ok(())
}
