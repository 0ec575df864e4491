//! Scripted Guest
//!
//! An in-process [`GuestModule`]: Rust closures stand in for guest functions
//! and a byte vector stands in for linear memory. Strings and byte blocks are
//! laid out exactly as a compiled guest would lay them out, so every import
//! goes through the same decoding path as a real module.

use crate::abi::Host;
use crate::module::GuestModule;
use wasmjig_core::{CallbackRef, GuestTrap, LinearMemory, STRING_HEADER_SIZE, encode_string};

/// A guest function: receives the host and a view of the guest's memory
pub type GuestFn = Box<dyn FnMut(&mut Host, &LinearMemory<'_>) -> Result<(), GuestTrap>>;

/// Bytes kept free at the start of memory so that pointer 0 stays null
const RESERVED: usize = 8;

/// Closure-backed guest module
pub struct ScriptedGuest {
    memory: Vec<u8>,
    table: Vec<GuestFn>,
    start: Option<GuestFn>,
    backtrace: Vec<String>,
}

impl ScriptedGuest {
    /// Empty guest with no functions
    pub fn new() -> Self {
        Self {
            memory: vec![0; RESERVED],
            table: Vec::new(),
            start: None,
            backtrace: Vec::new(),
        }
    }

    /// Frames every view reports and every frameless trap carries
    pub fn with_backtrace<I, S>(mut self, frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.backtrace = frames.into_iter().map(Into::into).collect();
        self
    }

    /// Store a managed string and return its pointer
    pub fn alloc_string(&mut self, value: &str) -> u32 {
        self.align();
        let block = encode_string(value);
        let ptr = self.memory.len() as u32 + STRING_HEADER_SIZE;
        self.memory.extend(block);
        ptr
    }

    /// Store a raw byte block and return its pointer
    pub fn alloc_bytes(&mut self, bytes: &[u8]) -> u32 {
        self.align();
        let ptr = self.memory.len() as u32;
        self.memory.extend_from_slice(bytes);
        ptr
    }

    /// Add a function to the table
    pub fn function<F>(&mut self, f: F) -> CallbackRef
    where
        F: FnMut(&mut Host, &LinearMemory<'_>) -> Result<(), GuestTrap> + 'static,
    {
        self.table.push(Box::new(f));
        CallbackRef::new(self.table.len() as u32 - 1)
    }

    /// Set the top-level code run by [`GuestModule::start`]
    pub fn on_start<F>(&mut self, f: F)
    where
        F: FnMut(&mut Host, &LinearMemory<'_>) -> Result<(), GuestTrap> + 'static,
    {
        self.start = Some(Box::new(f));
    }

    /// Current memory contents
    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    fn align(&mut self) {
        let padded = self.memory.len().next_multiple_of(4);
        self.memory.resize(padded, 0);
    }

    fn attach_frames(&self, trap: GuestTrap) -> GuestTrap {
        if trap.frames.is_empty() {
            trap.with_frames(self.backtrace.clone())
        } else {
            trap
        }
    }
}

impl Default for ScriptedGuest {
    fn default() -> Self {
        Self::new()
    }
}

impl GuestModule for ScriptedGuest {
    fn start(&mut self, host: &mut Host) -> Result<(), GuestTrap> {
        let view = LinearMemory::new(&self.memory).with_backtrace(self.backtrace.clone());
        let result = match self.start.as_mut() {
            Some(f) => f(host, &view),
            None => Ok(()),
        };
        result.map_err(|trap| self.attach_frames(trap))
    }

    fn call(&mut self, host: &mut Host, callback: CallbackRef) -> Result<(), GuestTrap> {
        let view = LinearMemory::new(&self.memory).with_backtrace(self.backtrace.clone());
        let result = match self.table.get_mut(callback.index() as usize) {
            Some(f) => f(host, &view),
            None => Err(GuestTrap::new(format!(
                "indirect call to missing table entry {}",
                callback.index()
            ))),
        };
        result.map_err(|trap| self.attach_frames(trap))
    }
}
