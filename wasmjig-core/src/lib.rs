#![warn(missing_docs)]
//! wasmjig Core - Test Model
//!
//! Data shared by the orchestration engine, reporters and the CLI:
//! - Captured guest values (`CapturedValue`, `LogValue`, `ActualValue`)
//! - Bounded, copy-out reads of guest linear memory (`GuestView`, `LinearMemory`)
//! - Stack-trace filtering for guest frames
//! - Sparse per-scope performance overrides and their resolution
//! - Test results, groups and whole-module suite results
//! - The performance sampling loop and its timer

mod group;
mod guest;
mod measure;
mod memory;
mod performance;
mod result;
mod sampling;
mod suite;
mod trace;
mod value;

pub use group::{HookKind, Hooks, RegisteredTest, TestGroup};
pub use guest::{CallbackRef, GuestTrap};
pub use measure::Timer;
pub use memory::{GuestView, LinearMemory, MemoryError, STRING_HEADER_SIZE, encode_string};
pub use performance::{PerformanceConfig, PerformanceOption, PerformanceOverrides};
pub use result::{PerformanceStats, TestResult};
pub use sampling::{SamplingOutcome, StopReason, run_sampling_loop};
pub use suite::{SuiteResult, Warning, WarningKind};
pub use trace::{DEFAULT_FRAME_FILTER, StackFilter, StackTrace};
pub use value::{ActualValue, CapturedValue, LogTarget, LogValue};

/// Message attached to a negated test whose body completed without trapping
pub const DEFAULT_NEGATED_MESSAGE: &str = "Expected the test to throw, but it completed normally.";

/// Message used when a guest call fails without an abort message or trap description
pub const GENERIC_TRAP_MESSAGE: &str = "The guest function trapped.";
