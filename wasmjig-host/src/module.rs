//! Guest Module Seam
//!
//! The embedding runtime implements [`GuestModule`] for an instantiated
//! binary whose imports are wired to [`Host::invoke`].

use crate::abi::Host;
use wasmjig_core::{CallbackRef, GuestTrap};

/// An instantiated guest
pub trait GuestModule {
    /// Run the module's top-level code; called exactly once
    fn start(&mut self, host: &mut Host) -> Result<(), GuestTrap>;

    /// Invoke a function-table entry taking no arguments
    fn call(&mut self, host: &mut Host, callback: CallbackRef) -> Result<(), GuestTrap>;
}

impl<G: GuestModule + ?Sized> GuestModule for Box<G> {
    fn start(&mut self, host: &mut Host) -> Result<(), GuestTrap> {
        (**self).start(host)
    }

    fn call(&mut self, host: &mut Host, callback: CallbackRef) -> Result<(), GuestTrap> {
        (**self).call(host, callback)
    }
}
