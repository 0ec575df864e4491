//! Module Runner
//!
//! Compiles every planned entry in parallel, then runs the modules one at a
//! time, each inside a fresh `TestContext`:
//!
//! ```text
//! entries ──par_iter──► compile ──► binaries (entry order kept)
//!                                        │ sequential
//!                                        ▼
//!            write artifacts ──► instantiate ──► TestContext::run ──► SuiteResult
//! ```
//!
//! A module that fails to compile, instantiate or register is recorded as a
//! `ModuleError`; the remaining modules still run.

use crate::entries::EntryPlan;
use crate::toolchain::{CompileError, CompileOutput, Compiler, CompilerFlags, Runtime, companion_imports};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use wasmjig_core::{PerformanceConfig, StackFilter, SuiteResult, Timer};
use wasmjig_host::TestContext;
use wasmjig_report::{ModuleError, ModuleErrorKind, Report, Reporter, RunSummary};

/// Settings shared by every module in a run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Process-wide performance defaults
    pub defaults: PerformanceConfig,
    /// Stack frame filter
    pub filter: StackFilter,
    /// Compiler flags
    pub flags: CompilerFlags,
    /// Imports file for entries without a `<stem>.imports.*` companion
    pub imports: Option<PathBuf>,
}

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Completed modules, in entry order
    pub suites: Vec<SuiteResult>,
    /// Modules that never produced results
    pub errors: Vec<ModuleError>,
    /// Wall-clock time of the whole run
    pub duration_ms: f64,
}

impl RunOutcome {
    /// Totals across the run
    pub fn summary(&self) -> RunSummary {
        RunSummary::from_suites(&self.suites, &self.errors, self.duration_ms)
    }

    /// Every module completed and passed
    pub fn success(&self) -> bool {
        self.summary().success() && self.suites.iter().all(|suite| suite.pass)
    }

    /// Consume into a serializable report
    pub fn into_report(self) -> Report {
        Report::new(self.suites, self.errors, self.duration_ms)
    }
}

/// Compile and run every entry in the plan
pub fn run_modules<C, R, P>(
    plan: &EntryPlan,
    options: &RunOptions,
    compiler: &C,
    runtime: &R,
    reporter: &mut P,
) -> RunOutcome
where
    C: Compiler + ?Sized,
    R: Runtime + ?Sized,
    P: Reporter + ?Sized,
{
    let timer = Timer::start();

    let compiled: Vec<(&PathBuf, Result<CompileOutput, CompileError>)> = plan
        .entries
        .par_iter()
        .map(|entry| (entry, compiler.compile(entry, &plan.added, &options.flags)))
        .collect();

    let mut suites = Vec::new();
    let mut errors = Vec::new();
    for (entry, output) in compiled {
        match run_module(entry, output, options, runtime, reporter) {
            Ok(suite) => suites.push(suite),
            Err(error) => {
                tracing::warn!(file = %error.file, kind = ?error.kind, "{}", error.message);
                errors.push(error);
            }
        }
    }

    RunOutcome {
        suites,
        errors,
        duration_ms: timer.elapsed_ms(),
    }
}

fn run_module<R, P>(
    entry: &Path,
    output: Result<CompileOutput, CompileError>,
    options: &RunOptions,
    runtime: &R,
    reporter: &mut P,
) -> Result<SuiteResult, ModuleError>
where
    R: Runtime + ?Sized,
    P: Reporter + ?Sized,
{
    let file = entry.display().to_string();
    let error = |kind, message: String| ModuleError {
        file: file.clone(),
        kind,
        message,
    };

    let output = output.map_err(|err| {
        let kind = match err {
            CompileError::Failed { .. } => ModuleErrorKind::Compile,
            CompileError::MissingBinary { .. } => ModuleErrorKind::MissingBinary,
        };
        error(kind, err.to_string())
    })?;

    write_artifacts(entry, &output);

    let imports = companion_imports(entry).or_else(|| options.imports.clone());
    let mut guest = runtime
        .instantiate(entry, &output.binary, imports.as_deref())
        .map_err(|err| error(ModuleErrorKind::Instantiate, format!("{:#}", err)))?;

    tracing::debug!(
        file = %file,
        bytes = output.binary.len(),
        imports = ?imports,
        "Running module"
    );
    TestContext::new(file.clone(), options.defaults)
        .with_stack_filter(options.filter.clone())
        .run(&mut guest, reporter)
        .map_err(|err| error(ModuleErrorKind::Context, err.to_string()))
}

/// Side outputs land next to the entry; a failed write does not stop the module
fn write_artifacts(entry: &Path, output: &CompileOutput) {
    for artifact in &output.artifacts {
        let path = artifact.path_for(entry);
        match std::fs::write(&path, &artifact.contents) {
            Ok(()) => tracing::debug!(path = %path.display(), "Wrote compiler output"),
            Err(err) => tracing::warn!(path = %path.display(), "Could not write compiler output: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use wasmjig_core::GuestTrap;
    use wasmjig_host::{GuestModule, ScriptedGuest};
    use wasmjig_report::{EmptyReporter, EventLog};

    /// Compiles an entry to its own file name
    fn name_compiler(
        entry: &Path,
        _added: &[PathBuf],
        _flags: &CompilerFlags,
    ) -> Result<Vec<u8>, CompileError> {
        let name = entry.to_string_lossy().into_owned();
        if name.contains("broken") {
            return Err(CompileError::Failed {
                message: "syntax error".into(),
            });
        }
        if name.contains("empty") {
            return Err(CompileError::MissingBinary {
                entry: entry.to_path_buf(),
            });
        }
        Ok(name.into_bytes())
    }

    /// One test that passes unless the binary names a failing module
    fn scripted_runtime(
        _entry: &Path,
        binary: &[u8],
        _imports: Option<&Path>,
    ) -> anyhow::Result<Box<dyn GuestModule>> {
        let name = String::from_utf8(binary.to_vec())?;
        if name.contains("unloadable") {
            anyhow::bail!("bad magic number");
        }
        let mut guest = ScriptedGuest::new();
        let test_name = guest.alloc_string("works");
        let body = if name.contains("failing") {
            guest.function(|_, _| Err(GuestTrap::new("nope")))
        } else {
            guest.function(|_, _| Ok(()))
        };
        if name.contains("unclosed") {
            let group = guest.alloc_string("open");
            guest.on_start(move |host, view| {
                host.report_describe(view, group)?;
                host.report_test(view, test_name, body)?;
                Ok(())
            });
        } else {
            guest.on_start(move |host, view| {
                host.report_test(view, test_name, body)?;
                Ok(())
            });
        }
        Ok(Box::new(guest))
    }

    fn plan(entries: &[&str]) -> EntryPlan {
        EntryPlan {
            entries: entries.iter().map(PathBuf::from).collect(),
            added: Vec::new(),
        }
    }

    #[test]
    fn test_all_modules_pass() {
        let outcome = run_modules(
            &plan(&["a.spec.ts", "b.spec.ts"]),
            &RunOptions::default(),
            &name_compiler,
            &scripted_runtime,
            &mut EmptyReporter,
        );

        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.suites.len(), 2);
        assert_eq!(outcome.suites[0].file, "a.spec.ts");
        assert_eq!(outcome.suites[1].file, "b.spec.ts");
        assert!(outcome.success());
        assert_eq!(outcome.summary().passed, 2);
    }

    #[test]
    fn test_failing_test_fails_run() {
        let outcome = run_modules(
            &plan(&["a.spec.ts", "failing.spec.ts"]),
            &RunOptions::default(),
            &name_compiler,
            &scripted_runtime,
            &mut EmptyReporter,
        );

        assert_eq!(outcome.suites.len(), 2);
        assert!(!outcome.success());
        assert_eq!(outcome.summary().failed, 1);
    }

    #[test]
    fn test_module_errors_are_recorded() {
        let outcome = run_modules(
            &plan(&[
                "broken.spec.ts",
                "empty.spec.ts",
                "unloadable.spec.ts",
                "unclosed.spec.ts",
                "ok.spec.ts",
            ]),
            &RunOptions::default(),
            &name_compiler,
            &scripted_runtime,
            &mut EmptyReporter,
        );

        let kinds: Vec<_> = outcome.errors.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ModuleErrorKind::Compile,
                ModuleErrorKind::MissingBinary,
                ModuleErrorKind::Instantiate,
                ModuleErrorKind::Context,
            ]
        );
        assert_eq!(outcome.errors[0].message, "compilation failed: syntax error");
        assert!(outcome.errors[2].message.contains("bad magic number"));

        // The healthy module still ran
        assert_eq!(outcome.suites.len(), 1);
        assert_eq!(outcome.suites[0].file, "ok.spec.ts");
        assert!(!outcome.success());

        let report = outcome.into_report();
        assert_eq!(report.summary.files, 5);
        assert_eq!(report.summary.errors, 4);
    }

    #[test]
    fn test_reporter_sees_each_module() {
        let mut log = EventLog::default();
        run_modules(
            &plan(&["a.spec.ts", "broken.spec.ts", "b.spec.ts"]),
            &RunOptions::default(),
            &name_compiler,
            &scripted_runtime,
            &mut log,
        );

        let starts: Vec<_> = log
            .events
            .iter()
            .filter(|e| e.starts_with("start:"))
            .cloned()
            .collect();
        assert_eq!(starts, vec!["start:a.spec.ts", "start:b.spec.ts"]);
    }

    #[test]
    fn test_imports_prefer_companion_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let with_companion = root.join("a.spec.ts");
        let without = root.join("b.spec.ts");
        let companion = root.join("a.spec.imports.js");
        let shared = root.join("shared.imports.js");
        std::fs::write(&companion, "").unwrap();

        let seen = RefCell::new(Vec::new());
        let runtime = |entry: &Path, binary: &[u8], imports: Option<&Path>| {
            seen.borrow_mut()
                .push((entry.to_path_buf(), imports.map(Path::to_path_buf)));
            scripted_runtime(entry, binary, imports)
        };
        let options = RunOptions {
            imports: Some(shared.clone()),
            ..Default::default()
        };
        let plan = EntryPlan {
            entries: vec![with_companion.clone(), without.clone()],
            added: Vec::new(),
        };

        let outcome = run_modules(&plan, &options, &name_compiler, &runtime, &mut EmptyReporter);
        assert!(outcome.success());
        assert_eq!(
            seen.into_inner(),
            vec![(with_companion, Some(companion)), (without, Some(shared))]
        );
    }

    #[test]
    fn test_no_imports_without_companion_or_config() {
        let seen = RefCell::new(Vec::new());
        let runtime = |entry: &Path, binary: &[u8], imports: Option<&Path>| {
            seen.borrow_mut().push(imports.map(Path::to_path_buf));
            scripted_runtime(entry, binary, imports)
        };
        run_modules(
            &plan(&["a.spec.ts"]),
            &RunOptions::default(),
            &name_compiler,
            &runtime,
            &mut EmptyReporter,
        );
        assert_eq!(seen.into_inner(), vec![None]);
    }

    #[test]
    fn test_artifacts_written_next_to_entry() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("tests");
        std::fs::create_dir_all(&nested).unwrap();
        let entry = nested.join("math.spec.ts");

        let compiler = |entry: &Path, _: &[PathBuf], _: &CompilerFlags| {
            let name = entry.to_string_lossy().into_owned();
            Ok::<_, CompileError>(
                CompileOutput::from(name.into_bytes())
                    .with_artifact("wat", "(module)")
                    .with_artifact("wasm.map", "{}"),
            )
        };
        let plan = EntryPlan {
            entries: vec![entry],
            added: Vec::new(),
        };

        let outcome = run_modules(
            &plan,
            &RunOptions::default(),
            &compiler,
            &scripted_runtime,
            &mut EmptyReporter,
        );
        assert!(outcome.success());
        assert_eq!(
            std::fs::read_to_string(nested.join("math.spec.wat")).unwrap(),
            "(module)"
        );
        assert_eq!(
            std::fs::read_to_string(nested.join("math.spec.wasm.map")).unwrap(),
            "{}"
        );
    }

    #[test]
    fn test_unwritable_artifact_does_not_fail_module() {
        let compiler = |entry: &Path, _: &[PathBuf], _: &CompilerFlags| {
            let name = entry.to_string_lossy().into_owned();
            Ok::<_, CompileError>(CompileOutput::from(name.into_bytes()).with_artifact("wat", ""))
        };
        let outcome = run_modules(
            &plan(&["missing-dir/a.spec.ts"]),
            &RunOptions::default(),
            &compiler,
            &scripted_runtime,
            &mut EmptyReporter,
        );
        assert!(outcome.errors.is_empty());
        assert!(outcome.success());
    }
}
