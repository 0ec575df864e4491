#![warn(missing_docs)]
//! # wasmjig
//!
//! Host-side test harness for WebAssembly guest modules.
//!
//! Guest code registers groups, hooks and tests through imported host
//! functions; wasmjig runs them in declaration order and reports results:
//! - **Orchestration**: groups run flat in declaration order with `beforeAll`/`afterAll`/`beforeEach`/`afterEach` hooks
//! - **Guarded Calls**: traps, aborts and panics become test failures with a filtered stack
//! - **Value Capture**: actual/expected values and logs are copied out of guest memory during the call
//! - **Performance Sampling**: repeated runs bounded by a sample cap and a time budget, reduced to mean, median, variance and extrema
//! - **Reporters**: human-readable, summary and JSON output
//!
//! ## Quick Start
//!
//! The embedding binary supplies a compiler and a runtime whose instantiated
//! modules route every import to [`Host::invoke`]:
//!
//! ```ignore
//! fn main() -> anyhow::Result<()> {
//!     wasmjig::run(&my_compiler, &my_runtime)
//! }
//! ```
//!
//! ## Driving a Module Directly
//!
//! ```ignore
//! use wasmjig::prelude::*;
//!
//! let suite = TestContext::new("math.spec.ts", PerformanceConfig::default())
//!     .run(&mut guest, &mut DefaultReporter::new(std::io::stdout()))?;
//! assert!(suite.pass);
//! ```

// Re-export core types
pub use wasmjig_core::{
    ActualValue, CallbackRef, CapturedValue, GuestTrap, GuestView, HookKind, LinearMemory,
    LogValue, PerformanceConfig, PerformanceOption, PerformanceOverrides, PerformanceStats,
    StackFilter, StackTrace, SuiteResult, TestGroup, TestResult, Warning, WarningKind,
};

// Re-export the engine
pub use wasmjig_host::{
    AbiError, AbiValue, ContextError, GuestModule, GuestValue, Host, IMPORTS, ScriptedGuest,
    TestContext,
};

// Re-export reporting
pub use wasmjig_report::{
    DefaultReporter, EmptyReporter, Report, Reporter, ReporterKind, RunSummary, SummaryReporter,
    generate_json_report,
};

// Re-export stats
pub use wasmjig_stats::{SummaryStatistics, compute_summary, round_to};

// Re-export the runner seams
pub use wasmjig_cli::{
    Artifact, Cli, CompileError, CompileOutput, Compiler, CompilerFlags, RunOutcome, Runtime,
    WasmjigConfig,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        AbiValue, CallbackRef, DefaultReporter, GuestModule, GuestTrap, GuestValue, Host,
        PerformanceConfig, Reporter, SuiteResult, TestContext,
    };
}

/// Run the wasmjig CLI harness.
///
/// Call this from your runner binary's `main()`:
/// ```ignore
/// fn main() {
///     wasmjig::run(&compiler, &runtime).unwrap();
/// }
/// ```
pub use wasmjig_cli::run;
