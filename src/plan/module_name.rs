//! Module-name derivation.

use crate::{
    diagnostics::{Diag, Diagnostics},
    filetype::FileType,
    options::{OptionId, ParsedOptions, STDIN_SENTINEL},
    plan::{outputs::LinkOutputType, CompilerMode},
    utils,
};
use std::path::Path;

/// The name substituted when the derived module name is not an identifier.
pub const BAD_MODULE_NAME: &str = "__bad__";

/// The module name of every REPL session.
pub const REPL_MODULE_NAME: &str = "REPL";

/// Derives the module name from the options; the first rule that yields a
/// nonempty name wins.
///
/// A configuration that reaches the end of the rules without a name keeps the
/// empty string, mirroring the long-standing fallback for multi-input builds
/// that produce neither an executable nor a named output.
pub fn derive_module_name(
    parsed: &ParsedOptions,
    compiler_mode: CompilerMode,
    compiler_output_type: Option<FileType>,
    linker_output_type: Option<LinkOutputType>,
    diags: &mut Diagnostics,
) -> String {
    let name = raw_module_name(parsed, compiler_mode, compiler_output_type, linker_output_type);
    validate(name, parsed, diags)
}

fn raw_module_name(
    parsed: &ParsedOptions,
    compiler_mode: CompilerMode,
    compiler_output_type: Option<FileType>,
    linker_output_type: Option<LinkOutputType>,
) -> String {
    if let Some(name) = parsed.last_value(OptionId::ModuleName) {
        return name.to_string();
    }

    if compiler_mode == CompilerMode::Repl {
        return REPL_MODULE_NAME.to_string();
    }

    if let Some(output) = parsed.last_value(OptionId::Output) {
        if let Some(name) = name_from_output_path(output, linker_output_type) {
            return name;
        }
    }

    let inputs: Vec<_> = parsed.inputs().collect();
    if let [input] = inputs[..] {
        if input != STDIN_SENTINEL {
            if let Some(stem) = utils::file_stem(Path::new(input)) {
                if !stem.is_empty() {
                    return stem.to_string();
                }
            }
        }
    }

    if compiler_output_type.is_none()
        || is_building_executable(parsed, linker_output_type, inputs.len())
    {
        return "main".to_string();
    }

    String::new()
}

/// Extracts a module name from the `-o` path.
///
/// `libFoo.dylib` names the module `Foo` when a library is being linked.
fn name_from_output_path(output: &str, linker_output_type: Option<LinkOutputType>) -> Option<String> {
    let path = Path::new(output);
    let basename = path.file_name()?.to_str()?;
    let stem = utils::file_stem(path)?;
    let is_library = linker_output_type.is_some_and(|ty| ty.is_library());
    let name = if is_library && Path::new(basename).extension().is_some() {
        stem.strip_prefix("lib").unwrap_or(stem)
    } else {
        stem
    };
    (!name.is_empty()).then(|| name.to_string())
}

/// The executable tie-break: an explicit linker product decides; otherwise a
/// single input without the library parsing options builds an executable.
fn is_building_executable(
    parsed: &ParsedOptions,
    linker_output_type: Option<LinkOutputType>,
    input_count: usize,
) -> bool {
    match linker_output_type {
        Some(LinkOutputType::Executable) => true,
        Some(LinkOutputType::DynamicLibrary | LinkOutputType::StaticLibrary) => false,
        None => {
            !parsed.contains_any(&[OptionId::ParseAsLibrary, OptionId::ParseStdlib])
                && input_count == 1
        }
    }
}

/// Rejects names that are not identifiers and reserves `Swift` for builds of
/// the standard library itself.
fn validate(name: String, parsed: &ParsedOptions, diags: &mut Diagnostics) -> String {
    if name.is_empty() {
        return name;
    }
    if !utils::is_valid_module_name(&name) {
        diags.emit(Diag::BadModuleName { name });
        return BAD_MODULE_NAME.to_string();
    }
    if name == "Swift" && !parsed.contains(OptionId::ParseStdlib) {
        diags.emit(Diag::StdlibModuleName);
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ArgumentParser;

    fn parse(args: &[&str]) -> ParsedOptions {
        ArgumentParser::parse(args.iter().copied()).unwrap()
    }

    fn derive(
        args: &[&str],
        mode: CompilerMode,
        compiler: Option<FileType>,
        linker: Option<LinkOutputType>,
    ) -> (String, Diagnostics) {
        let parsed = parse(args);
        let mut diags = Diagnostics::new();
        let name = derive_module_name(&parsed, mode, compiler, linker, &mut diags);
        (name, diags)
    }

    #[test]
    fn explicit_name_wins() {
        let (name, diags) = derive(
            &["-module-name", "M", "-o", "libM.dylib", "a.swift"],
            CompilerMode::SingleCompile,
            Some(FileType::Object),
            Some(LinkOutputType::DynamicLibrary),
        );
        assert_eq!(name, "M");
        assert!(!diags.has_errors());
    }

    #[test]
    fn repl_is_named_repl() {
        let (name, _) = derive(&[], CompilerMode::Repl, None, None);
        assert_eq!(name, REPL_MODULE_NAME);
    }

    #[test]
    fn library_output_strips_lib_prefix() {
        let (name, _) = derive(
            &["-emit-library", "-o", "libGreeter.dylib", "a.swift", "b.swift"],
            CompilerMode::StandardCompile,
            Some(FileType::Object),
            Some(LinkOutputType::DynamicLibrary),
        );
        assert_eq!(name, "Greeter");
    }

    #[test]
    fn bad_name_from_output_is_replaced() {
        let (name, diags) = derive(
            &["-emit-library", "-o", "lib123.dylib", "a.swift"],
            CompilerMode::StandardCompile,
            Some(FileType::Object),
            Some(LinkOutputType::DynamicLibrary),
        );
        assert_eq!(name, BAD_MODULE_NAME);
        assert!(diags.contains(&Diag::BadModuleName { name: "123".to_string() }));
    }

    #[test]
    fn single_input_names_the_module() {
        let (name, _) = derive(
            &["a.swift"],
            CompilerMode::StandardCompile,
            Some(FileType::Object),
            Some(LinkOutputType::Executable),
        );
        assert_eq!(name, "a");
    }

    #[test]
    fn executables_default_to_main() {
        let (name, _) = derive(
            &["a.swift", "b.swift"],
            CompilerMode::StandardCompile,
            Some(FileType::Object),
            Some(LinkOutputType::Executable),
        );
        assert_eq!(name, "main");
    }

    #[test]
    fn multi_input_library_falls_back_to_empty() {
        let (name, diags) = derive(
            &["-emit-object", "-parse-as-library", "a.swift", "b.swift"],
            CompilerMode::StandardCompile,
            Some(FileType::Object),
            None,
        );
        assert_eq!(name, "");
        assert!(!diags.has_errors());
    }

    #[test]
    fn stdlib_name_requires_parse_stdlib() {
        let (name, diags) = derive(
            &["-module-name", "Swift", "a.swift"],
            CompilerMode::StandardCompile,
            Some(FileType::Object),
            None,
        );
        assert_eq!(name, "Swift");
        assert!(diags.contains(&Diag::StdlibModuleName));

        let (_, diags) = derive(
            &["-module-name", "Swift", "-parse-stdlib", "a.swift"],
            CompilerMode::StandardCompile,
            Some(FileType::Object),
            None,
        );
        assert!(!diags.has_errors());
    }
}
