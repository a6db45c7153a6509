//! Pure derivations from the parsed options to the output shape of the plan:
//! compiler mode, primary output types, debug info and module emission.

use crate::{
    diagnostics::{Diag, Diagnostics},
    error::{DriverError, Result},
    filetype::FileType,
    options::{OptionGroup, OptionId, ParsedOptions},
    plan::DriverKind,
};

/// How frontend invocations are distributed over the inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompilerMode {
    /// One frontend invocation per input.
    StandardCompile,
    /// A single frontend invocation covering all inputs.
    SingleCompile,
    /// Inputs partitioned into batches, one invocation per batch.
    BatchCompile,
    /// Compiling a Clang module into a `.pcm`.
    CompilePcm,
    Repl,
    /// Interpret the inputs immediately.
    Immediate,
}

impl CompilerMode {
    /// Returns `true` for the interactive modes that never produce files.
    pub const fn is_interactive(&self) -> bool {
        matches!(self, Self::Repl | Self::Immediate)
    }
}

/// The product the linker is asked for, when linking happens at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LinkOutputType {
    Executable,
    DynamicLibrary,
    StaticLibrary,
}

impl LinkOutputType {
    pub const fn is_library(&self) -> bool {
        matches!(self, Self::DynamicLibrary | Self::StaticLibrary)
    }
}

/// How much debug information the frontend is asked to emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DebugInfoLevel {
    /// Line tables only.
    LineTables,
    /// Line tables plus variable and type information for the debugger.
    DwarfTypes,
    /// Full debug info including AST-level type information.
    AstTypes,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DebugInfoFormat {
    #[default]
    Dwarf,
    CodeView,
}

/// Why a module file is part of the plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModuleOutputKind {
    /// The user explicitly asked for an emitted module.
    TopLevel,
    /// Another output (debug info) requires a module implicitly.
    Auxiliary,
}

/// The primary output types derived from the mode option group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OutputTypes {
    pub compiler: Option<FileType>,
    pub linker: Option<LinkOutputType>,
}

/// Determines the compiler mode from the mode group, the driver persona and
/// the whole-module options.
pub fn derive_compiler_mode(
    parsed: &ParsedOptions,
    driver_kind: DriverKind,
    has_inputs: bool,
) -> CompilerMode {
    if parsed.contains_any(&[
        OptionId::EmitPch,
        OptionId::EmitImportedModules,
        OptionId::IndexFile,
    ]) {
        return CompilerMode::SingleCompile;
    }
    if parsed.contains(OptionId::EmitPcm) {
        return CompilerMode::CompilePcm;
    }
    if let Some(mode) = parsed.last_in_group(OptionGroup::Modes) {
        if matches!(
            mode.option_id(),
            Some(
                OptionId::Repl
                    | OptionId::DeprecatedIntegratedRepl
                    | OptionId::LldbRepl
            )
        ) {
            return CompilerMode::Repl;
        }
    }
    if driver_kind.is_interactive() {
        return if has_inputs { CompilerMode::Immediate } else { CompilerMode::Repl };
    }
    if parsed.contains(OptionId::WholeModuleOptimization) {
        return CompilerMode::SingleCompile;
    }
    if parsed.contains(OptionId::EnableBatchMode) {
        return CompilerMode::BatchCompile;
    }
    CompilerMode::StandardCompile
}

/// Maps the mode option group to `(compiler output type, linker output type)`.
pub fn derive_output_types(
    parsed: &ParsedOptions,
    driver_kind: DriverKind,
    diags: &mut Diagnostics,
) -> Result<OutputTypes> {
    let Some(mode) = parsed.last_in_group(OptionGroup::Modes) else {
        if parsed.contains_any(&[OptionId::EmitModule, OptionId::EmitModulePath]) {
            // an explicit module request without a mode option compiles just
            // the module
            return Ok(OutputTypes { compiler: Some(FileType::SwiftModule), linker: None });
        }
        if driver_kind.is_interactive() {
            return Ok(OutputTypes::default());
        }
        return Ok(OutputTypes {
            compiler: Some(FileType::Object),
            linker: Some(LinkOutputType::Executable),
        });
    };

    let id = mode.option_id().ok_or_else(|| DriverError::internal("input in mode group"))?;
    let types = match id {
        OptionId::EmitExecutable => {
            if parsed.contains(OptionId::Static) {
                diags.emit(Diag::StaticEmitExecutableDisallowed);
            }
            OutputTypes {
                compiler: Some(FileType::Object),
                linker: Some(LinkOutputType::Executable),
            }
        }
        OptionId::EmitLibrary => {
            let linker = if parsed.contains(OptionId::Static) {
                LinkOutputType::StaticLibrary
            } else {
                LinkOutputType::DynamicLibrary
            };
            OutputTypes { compiler: Some(FileType::Object), linker: Some(linker) }
        }
        OptionId::EmitObject => OutputTypes { compiler: Some(FileType::Object), linker: None },
        OptionId::EmitAssembly => {
            OutputTypes { compiler: Some(FileType::Assembly), linker: None }
        }
        OptionId::EmitSil => OutputTypes { compiler: Some(FileType::Sil), linker: None },
        OptionId::EmitSilgen => OutputTypes { compiler: Some(FileType::RawSil), linker: None },
        OptionId::EmitSib => OutputTypes { compiler: Some(FileType::Sib), linker: None },
        OptionId::EmitSibgen => OutputTypes { compiler: Some(FileType::RawSib), linker: None },
        OptionId::EmitIr => OutputTypes { compiler: Some(FileType::LlvmIr), linker: None },
        OptionId::EmitBc => OutputTypes { compiler: Some(FileType::LlvmBc), linker: None },
        OptionId::EmitPch => OutputTypes { compiler: Some(FileType::Pch), linker: None },
        OptionId::EmitPcm => OutputTypes { compiler: Some(FileType::ClangModule), linker: None },
        OptionId::EmitImportedModules => {
            OutputTypes { compiler: Some(FileType::ImportedModules), linker: None }
        }
        OptionId::IndexFile => OutputTypes { compiler: Some(FileType::IndexData), linker: None },
        OptionId::UpdateCode => OutputTypes { compiler: Some(FileType::Remapping), linker: None },
        OptionId::DumpAst => OutputTypes { compiler: Some(FileType::AstDump), linker: None },
        OptionId::Parse
        | OptionId::ResolveImports
        | OptionId::Typecheck
        | OptionId::DumpParse
        | OptionId::EmitSyntax
        | OptionId::PrintAst
        | OptionId::DumpTypeRefinementContexts
        | OptionId::DumpScopeMaps
        | OptionId::DumpInterfaceHash
        | OptionId::DumpTypeInfo
        | OptionId::VerifyDebugInfo => {
            OutputTypes { compiler: Some(FileType::Nothing), linker: None }
        }
        OptionId::Repl | OptionId::DeprecatedIntegratedRepl | OptionId::LldbRepl => {
            OutputTypes::default()
        }
        other => {
            // a mode option that reaches this point is a schema defect
            return Err(DriverError::internal(format!("unhandled mode option {other:?}")));
        }
    };
    Ok(types)
}

/// The derived debug-info shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DebugInfo {
    pub level: Option<DebugInfoLevel>,
    pub format: DebugInfoFormat,
}

/// Derives the debug-info level from the `-g` group and the format from
/// `-debug-info-format=`.
pub fn derive_debug_info(parsed: &ParsedOptions, diags: &mut Diagnostics) -> DebugInfo {
    let level_opt = parsed.last_in_group(OptionGroup::DebugInfo);
    let level = level_opt.and_then(|entry| match entry.option_id() {
        Some(OptionId::G) => Some(DebugInfoLevel::AstTypes),
        Some(OptionId::GlineTablesOnly) => Some(DebugInfoLevel::LineTables),
        Some(OptionId::GdwarfTypes) => Some(DebugInfoLevel::DwarfTypes),
        _ => None,
    });

    let mut format = DebugInfoFormat::Dwarf;
    if let Some(value) = parsed.last_value(OptionId::DebugInfoFormat) {
        format = match value {
            "dwarf" => DebugInfoFormat::Dwarf,
            "codeview" => DebugInfoFormat::CodeView,
            other => {
                diags.emit(Diag::InvalidArgValue {
                    option: "-debug-info-format=".to_string(),
                    value: other.to_string(),
                });
                DebugInfoFormat::Dwarf
            }
        };
        if level_opt.is_none() {
            diags.emit(Diag::OptionMissingRequiredArgument {
                option: "-debug-info-format=".to_string(),
                required: "-g".to_string(),
            });
        }
    }

    if format == DebugInfoFormat::CodeView {
        if let Some(id @ (OptionId::GlineTablesOnly | OptionId::GdwarfTypes)) =
            level_opt.and_then(|entry| entry.option_id())
        {
            let spelling = crate::options::option_def(id).spelling;
            diags.emit(Diag::ArgumentNotAllowedWith {
                option: spelling.to_string(),
                other: "-debug-info-format=codeview".to_string(),
            });
        }
    }

    DebugInfo { level, format }
}

/// Determines whether a module is emitted and why.
pub fn derive_module_output_kind(
    parsed: &ParsedOptions,
    compiler_mode: CompilerMode,
    debug_info: DebugInfo,
    diags: &mut Diagnostics,
) -> Option<ModuleOutputKind> {
    let kind = if parsed.contains_any(&[OptionId::EmitModule, OptionId::EmitModulePath]) {
        Some(ModuleOutputKind::TopLevel)
    } else if debug_info.level == Some(DebugInfoLevel::AstTypes) {
        // full debug info needs the module to reconstruct types
        Some(ModuleOutputKind::Auxiliary)
    } else {
        None
    };

    if kind.is_some() && compiler_mode.is_interactive() {
        diags.emit(Diag::ModeCannotEmitModule);
        return None;
    }
    kind
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ArgumentParser;

    fn parse(args: &[&str]) -> ParsedOptions {
        ArgumentParser::parse(args.iter().copied()).unwrap()
    }

    #[test]
    fn default_batch_outputs_are_executables() {
        let parsed = parse(&["a.swift"]);
        let mut diags = Diagnostics::new();
        let types = derive_output_types(&parsed, DriverKind::Batch, &mut diags).unwrap();
        assert_eq!(types.compiler, Some(FileType::Object));
        assert_eq!(types.linker, Some(LinkOutputType::Executable));
        assert!(!diags.has_errors());
    }

    #[test]
    fn static_library_selection() {
        let parsed = parse(&["-emit-library", "-static", "a.swift"]);
        let mut diags = Diagnostics::new();
        let types = derive_output_types(&parsed, DriverKind::Batch, &mut diags).unwrap();
        assert_eq!(types.linker, Some(LinkOutputType::StaticLibrary));
    }

    #[test]
    fn static_executable_is_rejected() {
        let parsed = parse(&["-emit-executable", "-static", "a.swift"]);
        let mut diags = Diagnostics::new();
        derive_output_types(&parsed, DriverKind::Batch, &mut diags).unwrap();
        assert!(diags.contains(&Diag::StaticEmitExecutableDisallowed));
    }

    #[test]
    fn last_mode_option_wins() {
        let parsed = parse(&["-emit-object", "-typecheck", "a.swift"]);
        let mut diags = Diagnostics::new();
        let types = derive_output_types(&parsed, DriverKind::Batch, &mut diags).unwrap();
        assert_eq!(types.compiler, Some(FileType::Nothing));
        assert_eq!(types.linker, None);
    }

    #[test]
    fn wmo_selects_single_compile() {
        let parsed = parse(&["-whole-module-optimization", "a.swift", "b.swift"]);
        let mode = derive_compiler_mode(&parsed, DriverKind::Batch, true);
        assert_eq!(mode, CompilerMode::SingleCompile);
    }

    #[test]
    fn interactive_mode_depends_on_inputs() {
        let parsed = parse(&[]);
        assert_eq!(
            derive_compiler_mode(&parsed, DriverKind::Interactive, false),
            CompilerMode::Repl
        );
        let parsed = parse(&["a.swift"]);
        assert_eq!(
            derive_compiler_mode(&parsed, DriverKind::Interactive, true),
            CompilerMode::Immediate
        );
    }

    #[test]
    fn pch_implies_single_compile() {
        let parsed = parse(&["-emit-pch", "bridging.h"]);
        assert_eq!(
            derive_compiler_mode(&parsed, DriverKind::Batch, true),
            CompilerMode::SingleCompile
        );
    }

    #[test]
    fn debug_format_requires_debug_level() {
        let parsed = parse(&["-debug-info-format=codeview", "a.swift"]);
        let mut diags = Diagnostics::new();
        let info = derive_debug_info(&parsed, &mut diags);
        assert_eq!(info.format, DebugInfoFormat::CodeView);
        assert!(diags.has_errors());
    }

    #[test]
    fn codeview_rejects_partial_debug_levels() {
        let parsed = parse(&["-gline-tables-only", "-debug-info-format=codeview", "a.swift"]);
        let mut diags = Diagnostics::new();
        derive_debug_info(&parsed, &mut diags);
        assert!(diags.contains(&Diag::ArgumentNotAllowedWith {
            option: "-gline-tables-only".to_string(),
            other: "-debug-info-format=codeview".to_string(),
        }));
    }

    #[test]
    fn unknown_debug_format_falls_back_to_dwarf() {
        let parsed = parse(&["-g", "-debug-info-format=stabs", "a.swift"]);
        let mut diags = Diagnostics::new();
        let info = derive_debug_info(&parsed, &mut diags);
        assert_eq!(info.format, DebugInfoFormat::Dwarf);
        assert!(diags.has_errors());
    }

    #[test]
    fn debug_info_implies_auxiliary_module() {
        let parsed = parse(&["-g", "a.swift"]);
        let mut diags = Diagnostics::new();
        let info = derive_debug_info(&parsed, &mut diags);
        let kind = derive_module_output_kind(
            &parsed,
            CompilerMode::StandardCompile,
            info,
            &mut diags,
        );
        assert_eq!(kind, Some(ModuleOutputKind::Auxiliary));
    }

    #[test]
    fn repl_cannot_emit_module() {
        let parsed = parse(&["-repl", "-emit-module"]);
        let mut diags = Diagnostics::new();
        let info = DebugInfo::default();
        let kind = derive_module_output_kind(&parsed, CompilerMode::Repl, info, &mut diags);
        assert_eq!(kind, None);
        assert!(diags.contains(&Diag::ModeCannotEmitModule));
    }
}
