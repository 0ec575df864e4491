//! Guest Call Handles
//!
//! Hooks and test bodies are guest function-table indices. The engine stores
//! and later invokes them through the embedding runtime; it never looks
//! inside.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque reference to a guest function taking no arguments and returning nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackRef(u32);

impl CallbackRef {
    /// Wrap a function-table index
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// The function-table index
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl From<u32> for CallbackRef {
    fn from(index: u32) -> Self {
        Self(index)
    }
}

/// A guest-side fatal error (trap, abort, unreachable) observed by the host
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct GuestTrap {
    /// Runtime description of the trap
    pub message: String,
    /// Raw, unfiltered frames captured when the trap unwound, innermost first
    pub frames: Vec<String>,
}

impl GuestTrap {
    /// Create a trap without frame information
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            frames: Vec::new(),
        }
    }

    /// Attach the frames the runtime captured
    pub fn with_frames(mut self, frames: Vec<String>) -> Self {
        self.frames = frames;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_ref_roundtrip() {
        let callback = CallbackRef::from(7);
        assert_eq!(callback.index(), 7);
        assert_eq!(callback, CallbackRef::new(7));
    }

    #[test]
    fn test_trap_display() {
        let trap = GuestTrap::new("unreachable").with_frames(vec!["wasm-function[1]".into()]);
        assert_eq!(trap.to_string(), "unreachable");
        assert_eq!(trap.frames.len(), 1);
    }
}
