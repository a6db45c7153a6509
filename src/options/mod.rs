//! The static option schema the argument parser resolves argv against.
//!
//! Every option the driver recognizes is described by an [`OptionDef`] in
//! [`OPTIONS`]: its user-visible spelling, how it consumes argv tokens
//! ([`OptionKind`]), the group it competes in ([`OptionGroup`]) and a handful
//! of boolean attributes the later pipeline stages consult. Aliases carry the
//! canonical option in `alias_of` and resolve at parse time.

use once_cell::sync::Lazy;
use std::collections::HashMap;

mod parse;
pub use parse::{
    ArgumentParser, OptionValue, ParsedOption, ParsedOptionId, ParsedOptions, STDIN_SENTINEL,
};

/// Identity of a recognized option, independent of its spelling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OptionId {
    // mode selection
    EmitExecutable,
    EmitLibrary,
    EmitObject,
    EmitAssembly,
    EmitSil,
    EmitSilgen,
    EmitSib,
    EmitSibgen,
    EmitIr,
    EmitBc,
    EmitPch,
    EmitPcm,
    EmitImportedModules,
    IndexFile,
    UpdateCode,
    DumpAst,
    Parse,
    ResolveImports,
    Typecheck,
    DumpParse,
    EmitSyntax,
    PrintAst,
    DumpTypeRefinementContexts,
    DumpScopeMaps,
    DumpInterfaceHash,
    DumpTypeInfo,
    VerifyDebugInfo,
    Repl,
    DeprecatedIntegratedRepl,
    LldbRepl,
    // module emission
    EmitModule,
    EmitModulePath,
    ModuleName,
    // debug info
    G,
    GlineTablesOnly,
    GdwarfTypes,
    Gnone,
    DebugInfoFormat,
    // optimization
    O,
    Onone,
    // outputs and paths
    Output,
    OutputFileMap,
    WorkingDirectory,
    // build shape
    Static,
    WholeModuleOptimization,
    EnableBatchMode,
    Incremental,
    ParseAsLibrary,
    ParseStdlib,
    Immediate,
    // driver persona
    DriverMode,
    Frontend,
    Modulewrap,
    DriverShowIncremental,
    DriverVerifyDependencyGraph,
    Help,
    HelpHidden,
    /// `--`: everything after it is an input
    DashDash,
}

/// How an option consumes argv tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OptionKind {
    /// The spelling alone, no argument.
    Flag,
    /// The value is the remainder of the same token.
    Joined,
    /// The value is the next argv token.
    Separate,
    /// Joined when the token extends past the spelling, separate otherwise.
    JoinedOrSeparate,
    /// Consumes the rest of argv as a multi-value.
    RemainingArgs,
}

/// Groups in which only the last-appearing option wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OptionGroup {
    /// The compiler mode options (`-emit-object`, `-typecheck`, ...).
    Modes,
    /// The `-g` family.
    DebugInfo,
    /// The `-O` family.
    Optimization,
}

/// A single entry in the option schema.
#[derive(Clone, Copy, Debug)]
pub struct OptionDef {
    pub id: OptionId,
    pub spelling: &'static str,
    pub kind: OptionKind,
    pub group: Option<OptionGroup>,
    /// The canonical option this spelling is an alias for.
    pub alias_of: Option<OptionId>,
    /// The option's value is a path and participates in the
    /// working-directory rewrite.
    pub argument_is_path: bool,
    /// The option's presence is folded into the incremental options hash.
    pub affects_incremental_build: bool,
    /// The option is rejected under the interactive driver persona.
    pub no_interactive: bool,
}

impl OptionDef {
    const fn new(id: OptionId, spelling: &'static str, kind: OptionKind) -> Self {
        Self {
            id,
            spelling,
            kind,
            group: None,
            alias_of: None,
            argument_is_path: false,
            affects_incremental_build: true,
            no_interactive: false,
        }
    }

    const fn group(mut self, group: OptionGroup) -> Self {
        self.group = Some(group);
        self
    }

    const fn alias_of(mut self, canonical: OptionId) -> Self {
        self.alias_of = Some(canonical);
        self
    }

    const fn path(mut self) -> Self {
        self.argument_is_path = true;
        self
    }

    const fn does_not_affect_incremental(mut self) -> Self {
        self.affects_incremental_build = false;
        self
    }

    const fn no_interactive(mut self) -> Self {
        self.no_interactive = true;
        self
    }

    /// The option this definition stands for once aliases are resolved.
    pub fn canonical_id(&self) -> OptionId {
        self.alias_of.unwrap_or(self.id)
    }
}

use OptionGroup::*;
use OptionId::*;
use OptionKind::*;

/// The complete option schema.
///
/// Spellings are unique; the parser picks the longest spelling that prefixes
/// an argv token.
pub static OPTIONS: &[OptionDef] = &[
    OptionDef::new(EmitExecutable, "-emit-executable", Flag).group(Modes).no_interactive(),
    OptionDef::new(EmitLibrary, "-emit-library", Flag).group(Modes).no_interactive(),
    OptionDef::new(EmitObject, "-emit-object", Flag).group(Modes).no_interactive(),
    OptionDef::new(EmitObject, "-c", Flag).group(Modes).alias_of(EmitObject).no_interactive(),
    OptionDef::new(EmitAssembly, "-emit-assembly", Flag).group(Modes).no_interactive(),
    OptionDef::new(EmitAssembly, "-S", Flag).group(Modes).alias_of(EmitAssembly).no_interactive(),
    OptionDef::new(EmitSil, "-emit-sil", Flag).group(Modes),
    OptionDef::new(EmitSilgen, "-emit-silgen", Flag).group(Modes),
    OptionDef::new(EmitSib, "-emit-sib", Flag).group(Modes),
    OptionDef::new(EmitSibgen, "-emit-sibgen", Flag).group(Modes),
    OptionDef::new(EmitIr, "-emit-ir", Flag).group(Modes),
    OptionDef::new(EmitBc, "-emit-bc", Flag).group(Modes),
    OptionDef::new(EmitPch, "-emit-pch", Flag).group(Modes),
    OptionDef::new(EmitPcm, "-emit-pcm", Flag).group(Modes),
    OptionDef::new(EmitImportedModules, "-emit-imported-modules", Flag).group(Modes),
    OptionDef::new(IndexFile, "-index-file", Flag).group(Modes),
    OptionDef::new(UpdateCode, "-update-code", Flag).group(Modes),
    OptionDef::new(DumpAst, "-dump-ast", Flag).group(Modes),
    OptionDef::new(Parse, "-parse", Flag).group(Modes),
    OptionDef::new(ResolveImports, "-resolve-imports", Flag).group(Modes),
    OptionDef::new(Typecheck, "-typecheck", Flag).group(Modes),
    OptionDef::new(DumpParse, "-dump-parse", Flag).group(Modes),
    OptionDef::new(EmitSyntax, "-emit-syntax", Flag).group(Modes),
    OptionDef::new(PrintAst, "-print-ast", Flag).group(Modes),
    OptionDef::new(DumpTypeRefinementContexts, "-dump-type-refinement-contexts", Flag)
        .group(Modes),
    OptionDef::new(DumpScopeMaps, "-dump-scope-maps", Flag).group(Modes),
    OptionDef::new(DumpInterfaceHash, "-dump-interface-hash", Flag).group(Modes),
    OptionDef::new(DumpTypeInfo, "-dump-type-info", Flag).group(Modes),
    OptionDef::new(VerifyDebugInfo, "-verify-debug-info", Flag).group(Modes),
    OptionDef::new(Repl, "-repl", Flag).group(Modes),
    OptionDef::new(DeprecatedIntegratedRepl, "-deprecated-integrated-repl", Flag).group(Modes),
    OptionDef::new(LldbRepl, "-lldb-repl", Flag).group(Modes),
    OptionDef::new(EmitModule, "-emit-module", Flag),
    OptionDef::new(EmitModulePath, "-emit-module-path", JoinedOrSeparate).path(),
    OptionDef::new(EmitModulePath, "-emit-module-path=", Joined)
        .path()
        .alias_of(EmitModulePath),
    OptionDef::new(ModuleName, "-module-name", Separate),
    OptionDef::new(G, "-g", Flag).group(DebugInfo),
    OptionDef::new(GlineTablesOnly, "-gline-tables-only", Flag).group(DebugInfo),
    OptionDef::new(GdwarfTypes, "-gdwarf-types", Flag).group(DebugInfo),
    OptionDef::new(Gnone, "-gnone", Flag).group(DebugInfo),
    OptionDef::new(DebugInfoFormat, "-debug-info-format=", Joined),
    OptionDef::new(O, "-O", Flag).group(Optimization),
    OptionDef::new(Onone, "-Onone", Flag).group(Optimization),
    OptionDef::new(Output, "-o", JoinedOrSeparate).path().does_not_affect_incremental(),
    OptionDef::new(OutputFileMap, "-output-file-map", Separate)
        .path()
        .does_not_affect_incremental(),
    OptionDef::new(WorkingDirectory, "-working-directory", Separate)
        .does_not_affect_incremental(),
    OptionDef::new(Static, "-static", Flag).no_interactive(),
    OptionDef::new(WholeModuleOptimization, "-whole-module-optimization", Flag),
    OptionDef::new(EnableBatchMode, "-enable-batch-mode", Flag).no_interactive(),
    OptionDef::new(Incremental, "-incremental", Flag).does_not_affect_incremental(),
    OptionDef::new(ParseAsLibrary, "-parse-as-library", Flag),
    OptionDef::new(ParseStdlib, "-parse-stdlib", Flag),
    OptionDef::new(Immediate, "-i", Flag).does_not_affect_incremental(),
    OptionDef::new(DriverMode, "--driver-mode=", Joined).does_not_affect_incremental(),
    OptionDef::new(Frontend, "-frontend", Flag).does_not_affect_incremental(),
    OptionDef::new(Modulewrap, "-modulewrap", Flag).does_not_affect_incremental(),
    OptionDef::new(DriverShowIncremental, "-driver-show-incremental", Flag)
        .does_not_affect_incremental(),
    OptionDef::new(DriverVerifyDependencyGraph, "-driver-verify-dependency-graph", Flag)
        .does_not_affect_incremental(),
    OptionDef::new(Help, "-help", Flag).does_not_affect_incremental(),
    OptionDef::new(HelpHidden, "-help-hidden", Flag).does_not_affect_incremental(),
    OptionDef::new(DashDash, "--", RemainingArgs).path().does_not_affect_incremental(),
];

/// Index over [`OPTIONS`] for O(1) exact-spelling lookup.
static BY_SPELLING: Lazy<HashMap<&'static str, &'static OptionDef>> =
    Lazy::new(|| OPTIONS.iter().map(|def| (def.spelling, def)).collect());

/// Index from canonical [`OptionId`] to its defining entry.
static BY_ID: Lazy<HashMap<OptionId, &'static OptionDef>> = Lazy::new(|| {
    OPTIONS.iter().filter(|def| def.alias_of.is_none()).map(|def| (def.id, def)).collect()
});

/// Looks up an option by its exact spelling.
pub fn option_by_spelling(spelling: &str) -> Option<&'static OptionDef> {
    BY_SPELLING.get(spelling).copied()
}

/// Returns the canonical definition of `id`.
///
/// Every canonical id has a defining entry, so the lookup cannot fail for ids
/// produced by the parser.
pub fn option_def(id: OptionId) -> &'static OptionDef {
    BY_ID.get(&id).expect("canonical option without a table entry")
}

/// Picks the longest option whose spelling prefixes `token`.
pub(crate) fn longest_prefix_match(token: &str) -> Option<&'static OptionDef> {
    OPTIONS
        .iter()
        .filter(|def| token.starts_with(def.spelling))
        .max_by_key(|def| def.spelling.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spellings_are_unique() {
        let mut seen = HashMap::new();
        for def in OPTIONS {
            assert!(
                seen.insert(def.spelling, def.id).is_none(),
                "duplicate spelling {}",
                def.spelling
            );
        }
    }

    #[test]
    fn aliases_resolve_to_canonical_entries() {
        for def in OPTIONS.iter().filter(|def| def.alias_of.is_some()) {
            let canonical = option_def(def.canonical_id());
            assert!(canonical.alias_of.is_none());
        }
    }

    #[test]
    fn can_look_up_by_exact_spelling() {
        assert_eq!(option_by_spelling("-emit-library").unwrap().id, OptionId::EmitLibrary);
        assert_eq!(
            option_by_spelling("-c").unwrap().canonical_id(),
            OptionId::EmitObject
        );
        assert!(option_by_spelling("-emit").is_none());
    }

    #[test]
    fn longest_prefix_prefers_the_more_specific_spelling() {
        assert_eq!(longest_prefix_match("-gnone").unwrap().id, OptionId::Gnone);
        assert_eq!(longest_prefix_match("-g").unwrap().id, OptionId::G);
        assert_eq!(
            longest_prefix_match("-emit-module-path=/tmp/M.swiftmodule").unwrap().spelling,
            "-emit-module-path="
        );
        assert_eq!(longest_prefix_match("-o/tmp/out").unwrap().id, OptionId::Output);
        assert!(longest_prefix_match("-not-an-option").is_none());
    }
}
