#![warn(missing_docs)]
//! wasmjig Host - Orchestration Engine
//!
//! Turns the flat stream of calls a guest module makes into grouped,
//! reported test results:
//! - `Host`: state behind every guest import, with name-based dispatch
//! - `TestContext`: registration, then hook-ordered execution and sampling
//! - Guarded calls that turn traps, aborts and panics into failures
//! - `GuestModule`: the seam an embedding runtime implements
//! - `ScriptedGuest`: an in-process guest built from closures

mod abi;
mod context;
mod error;
mod guard;
mod module;
mod run_context;
mod scripted;

pub use abi::{AbiValue, GuestValue, Host, IMPORTS, Predicate};
pub use context::TestContext;
pub use error::{AbiError, ContextError};
pub use guard::{CallFailure, guarded};
pub use module::GuestModule;
pub use run_context::RunContext;
pub use scripted::{GuestFn, ScriptedGuest};
