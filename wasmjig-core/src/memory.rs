//! Guest Linear Memory Access
//!
//! The guest owns its memory between host calls and may grow or reuse it at
//! any time, so the host only ever copies out of it while a call is in
//! progress. `GuestView` is the borrow the embedding runtime hands to each
//! import; nothing borrowed from it can outlive the call.
//!
//! ## Managed string layout
//!
//! ```text
//!            ptr - 4          ptr
//!              │               │
//!              ▼               ▼
//!  ... ┌───────────────┬──────────────────────────┐ ...
//!      │ byte len (LE) │ UTF-16LE code units      │
//!      └───────────────┴──────────────────────────┘
//! ```

use thiserror::Error;

/// Size of the length header preceding a managed string
pub const STRING_HEADER_SIZE: u32 = 4;

/// Errors from reading guest memory
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("Null pointer passed where a string was expected")]
    NullPointer,

    #[error("Read of {len} bytes at {ptr:#x} exceeds guest memory of {size} bytes")]
    OutOfBounds { ptr: u32, len: u64, size: usize },

    #[error("String at {ptr:#x} has odd byte length {len}")]
    OddStringLength { ptr: u32, len: u32 },
}

/// Read access to guest state for the duration of one host call
pub trait GuestView {
    /// Decode the managed string whose payload starts at `ptr`
    fn read_string(&self, ptr: u32) -> Result<String, MemoryError>;

    /// Copy `len` raw bytes starting at `ptr`
    fn read_bytes(&self, ptr: u32, len: u32) -> Result<Vec<u8>, MemoryError>;

    /// Frames of the guest call stack at this point, innermost first.
    ///
    /// Runtimes without stack introspection return nothing.
    fn backtrace(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Bounds-checked view over a guest's linear memory
#[derive(Debug, Clone)]
pub struct LinearMemory<'a> {
    bytes: &'a [u8],
    frames: Vec<String>,
}

impl<'a> LinearMemory<'a> {
    /// Wrap the current contents of a guest memory
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            frames: Vec::new(),
        }
    }

    /// Attach the call stack the runtime observed for this call
    pub fn with_backtrace(mut self, frames: Vec<String>) -> Self {
        self.frames = frames;
        self
    }

    /// Current memory size in bytes
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    fn slice(&self, ptr: u32, len: u32) -> Result<&'a [u8], MemoryError> {
        let start = ptr as usize;
        let end = start.checked_add(len as usize);
        match end {
            Some(end) if end <= self.bytes.len() => Ok(&self.bytes[start..end]),
            _ => Err(MemoryError::OutOfBounds {
                ptr,
                len: len as u64,
                size: self.bytes.len(),
            }),
        }
    }
}

impl GuestView for LinearMemory<'_> {
    fn read_string(&self, ptr: u32) -> Result<String, MemoryError> {
        if ptr == 0 {
            return Err(MemoryError::NullPointer);
        }

        let header_ptr = ptr
            .checked_sub(STRING_HEADER_SIZE)
            .ok_or(MemoryError::OutOfBounds {
                ptr,
                len: STRING_HEADER_SIZE as u64,
                size: self.bytes.len(),
            })?;
        let header = self.slice(header_ptr, STRING_HEADER_SIZE)?;
        let len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);

        if len % 2 != 0 {
            return Err(MemoryError::OddStringLength { ptr, len });
        }

        let units: Vec<u16> = self
            .slice(ptr, len)?
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        Ok(String::from_utf16_lossy(&units))
    }

    fn read_bytes(&self, ptr: u32, len: u32) -> Result<Vec<u8>, MemoryError> {
        self.slice(ptr, len).map(<[u8]>::to_vec)
    }

    fn backtrace(&self) -> Vec<String> {
        self.frames.clone()
    }
}

/// Encode `value` in the managed string layout (header followed by payload).
///
/// The string pointer is the offset of the returned block plus
/// [`STRING_HEADER_SIZE`].
pub fn encode_string(value: &str) -> Vec<u8> {
    let units: Vec<u16> = value.encode_utf16().collect();
    let byte_len = (units.len() * 2) as u32;

    let mut block = Vec::with_capacity(STRING_HEADER_SIZE as usize + units.len() * 2);
    block.extend_from_slice(&byte_len.to_le_bytes());
    for unit in units {
        block.extend_from_slice(&unit.to_le_bytes());
    }
    block
}
