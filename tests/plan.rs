//! End-to-end plan derivation scenarios.

use swift_driver::{
    plan::{DebugInfoFormat, LinkOutputType, ModuleOutputKind},
    CompilerMode, Diag, Driver, DriverKind, FileType, JobExecutor, JobStatus, RunOutcome,
};
use pretty_assertions::assert_eq;
use std::path::Path;

/// An executor for invocations that must not schedule any job.
struct NoJobs;

impl JobExecutor for NoJobs {
    fn compile(&mut self, input: &Path) -> JobStatus {
        panic!("unexpected frontend job for {}", input.display())
    }
}

#[test]
fn help_short_circuits_planning() {
    let mut driver = Driver::new(&["swift", "-help"]).unwrap();
    assert!(driver.plan().is_none());
    assert_eq!(
        driver.run(&mut NoJobs).unwrap(),
        RunOutcome::HelpRequested { include_hidden: false }
    );

    let mut driver = Driver::new(&["swiftc", "-help-hidden"]).unwrap();
    assert_eq!(
        driver.run(&mut NoJobs).unwrap(),
        RunOutcome::HelpRequested { include_hidden: true }
    );
}

#[test]
fn bare_swift_is_a_repl() {
    let mut driver = Driver::new(&["swift"]).unwrap();
    {
        let plan = driver.plan().unwrap();
        assert_eq!(plan.driver_kind, DriverKind::Interactive);
        assert_eq!(plan.compiler_mode, CompilerMode::Repl);
        assert_eq!(plan.module_name, "REPL");
        assert_eq!(plan.module_output_kind, None);
        assert_eq!(plan.linker_output_type, None);
        assert!(plan.inputs.is_empty());
    }

    let outcome = driver.run(&mut NoJobs).unwrap();
    let RunOutcome::Build(summary) = outcome else { panic!("expected a build outcome") };
    assert!(summary.success);
    assert!(summary.compiled.is_empty());
}

#[test]
fn single_input_object_build() {
    let driver = Driver::new(&["swiftc", "a.swift"]).unwrap();
    let plan = driver.plan().unwrap();
    assert_eq!(plan.driver_kind, DriverKind::Batch);
    assert_eq!(plan.compiler_mode, CompilerMode::StandardCompile);
    assert_eq!(plan.compiler_output_type, Some(FileType::Object));
    assert_eq!(plan.linker_output_type, Some(LinkOutputType::Executable));
    assert_eq!(plan.debug_info_format, DebugInfoFormat::Dwarf);
    assert_eq!(plan.module_name, "a");
    assert!(!driver.diagnostics().has_errors());
}

#[test]
fn whole_module_library_with_explicit_name() {
    let driver = Driver::new(&[
        "swiftc",
        "-whole-module-optimization",
        "-module-name",
        "M",
        "a.swift",
        "b.swift",
        "-o",
        "libM.dylib",
        "-emit-library",
    ])
    .unwrap();
    let plan = driver.plan().unwrap();
    assert_eq!(plan.compiler_mode, CompilerMode::SingleCompile);
    assert_eq!(plan.linker_output_type, Some(LinkOutputType::DynamicLibrary));
    // the explicit name wins over the `libM` -> `M` rule
    assert_eq!(plan.module_name, "M");
    assert!(!driver.diagnostics().has_errors());
}

#[test]
fn bad_module_name_from_output_path() {
    let mut driver =
        Driver::new(&["swiftc", "-emit-library", "-o", "lib123.dylib", "a.swift"]).unwrap();
    {
        let plan = driver.plan().unwrap();
        assert_eq!(plan.module_name, "__bad__");
    }
    assert!(driver
        .diagnostics()
        .contains(&Diag::BadModuleName { name: "123".to_string() }));

    // the fatal diagnostic refuses to schedule any job
    assert!(driver.run(&mut NoJobs).is_err());
}

#[test]
fn emit_module_without_mode_compiles_the_module() {
    let driver = Driver::new(&["swiftc", "-emit-module", "a.swift", "b.swift"]).unwrap();
    let plan = driver.plan().unwrap();
    assert_eq!(plan.compiler_output_type, Some(FileType::SwiftModule));
    assert_eq!(plan.linker_output_type, None);
    assert_eq!(plan.module_output_kind, Some(ModuleOutputKind::TopLevel));
}

#[test]
fn auxiliary_tools_delegate() {
    let mut driver = Driver::new(&["swift-autolink-extract", "a.o", "b.o"]).unwrap();
    assert!(driver.plan().is_none());
    assert_eq!(
        driver.run(&mut NoJobs).unwrap(),
        RunOutcome::ToolDelegation {
            tool: "swift-autolink-extract",
            arguments: vec!["a.o".to_string(), "b.o".to_string()],
        }
    );
}

#[test]
fn frontend_escape_delegates() {
    let mut driver =
        Driver::new(&["swiftc", "-frontend", "-typecheck", "a.swift"]).unwrap();
    let outcome = driver.run(&mut NoJobs).unwrap();
    let RunOutcome::ToolDelegation { tool, arguments } = outcome else {
        panic!("expected delegation")
    };
    assert_eq!(tool, "swift-frontend");
    assert_eq!(arguments[0], "-frontend");
}

#[test]
fn driver_mode_override_applies() {
    let driver = Driver::new(&["swift", "--driver-mode=swiftc", "a.swift"]).unwrap();
    let plan = driver.plan().unwrap();
    assert_eq!(plan.driver_kind, DriverKind::Batch);
    assert_eq!(plan.compiler_mode, CompilerMode::StandardCompile);
}

#[test]
fn immediate_mode_for_interactive_inputs() {
    let driver = Driver::new(&["swift", "script.swift"]).unwrap();
    let plan = driver.plan().unwrap();
    assert_eq!(plan.compiler_mode, CompilerMode::Immediate);
    // a single input would normally name the module, and immediate mode
    // keeps that
    assert_eq!(plan.module_name, "script");
}

#[test]
fn temporary_names_are_unique_per_run() {
    let mut driver = Driver::new(&["swiftc", "a.swift"]).unwrap();
    let first = driver.temporary_file_name("a", FileType::Object);
    let second = driver.temporary_file_name("a", FileType::Object);
    assert_eq!(first, "a-0.o");
    assert_eq!(second, "a-1.o");
}
