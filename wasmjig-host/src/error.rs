//! Host Error Types

use thiserror::Error;
use wasmjig_core::{GuestTrap, MemoryError, StackTrace};

/// Failure of a single ABI import, surfaced to the guest as a trap
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AbiError {
    /// A pointer argument could not be read
    #[error(transparent)]
    Memory(#[from] MemoryError),

    /// `reportEndDescribe` with only the root group open
    #[error("reportEndDescribe called without a matching reportDescribe")]
    UnbalancedClose,

    /// Import name the host does not provide
    #[error("Unknown import: {0}")]
    UnknownImport(String),

    /// Wrong arity or argument type
    #[error("Bad arguments to {import}: {reason}")]
    BadArguments { import: String, reason: String },

    /// Registration import called while tests were running
    #[error("{import} is only valid while tests are being registered")]
    RegistrationClosed { import: &'static str },

    /// The guest called `abort`
    #[error("{message}")]
    Aborted { message: String },
}

impl From<AbiError> for GuestTrap {
    fn from(err: AbiError) -> Self {
        GuestTrap::new(err.to_string())
    }
}

/// Fatal error for one module: no results are produced
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContextError {
    /// More closes than opens
    #[error("reportEndDescribe was called more times than reportDescribe")]
    UnbalancedClose,

    /// Groups still open when the start code returned
    #[error("{depth} describe block(s) were never closed")]
    UnclosedGroups { depth: usize },

    /// The start code trapped outside any test
    #[error("Top-level module evaluation failed: {message}")]
    StartTrapped { message: String, stack: StackTrace },
}
