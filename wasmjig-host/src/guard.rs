//! Guarded Calls
//!
//! A guest trap, an explicit abort or a panic inside the runtime all become a
//! [`CallFailure`] instead of ending the run.

use crate::abi::Host;
use std::panic::{AssertUnwindSafe, catch_unwind};
use wasmjig_core::{GENERIC_TRAP_MESSAGE, GuestTrap, StackTrace};

/// Why a guarded call failed
#[derive(Debug, Clone, PartialEq)]
pub struct CallFailure {
    /// Abort message if the guest provided one, else the trap description
    pub message: String,
    /// Trap frames after filtering
    pub stack: StackTrace,
}

/// Run `call` with the host, converting every failure mode into a [`CallFailure`]
pub fn guarded<F>(host: &mut Host, call: F) -> Result<(), CallFailure>
where
    F: FnOnce(&mut Host) -> Result<(), GuestTrap>,
{
    host.clear_abort();

    let trap = match catch_unwind(AssertUnwindSafe(|| call(&mut *host))) {
        Ok(Ok(())) => return Ok(()),
        Ok(Err(trap)) => trap,
        Err(panic) => {
            let message = if let Some(s) = panic.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            GuestTrap::new(message)
        }
    };

    let message = host
        .take_abort_message()
        .or_else(|| Some(trap.message.clone()).filter(|m| !m.is_empty()))
        .unwrap_or_else(|| GENERIC_TRAP_MESSAGE.to_string());
    let stack = host.stack_filter().filter(&trap.frames);

    Err(CallFailure { message, stack })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasmjig_core::{LinearMemory, PerformanceConfig, StackFilter, encode_string};

    fn host() -> Host {
        Host::new(PerformanceConfig::default(), StackFilter::default())
    }

    #[test]
    fn test_success() {
        let mut host = host();
        assert_eq!(guarded(&mut host, |_| Ok(())), Ok(()));
    }

    #[test]
    fn test_trap_message_and_filtered_stack() {
        let mut host = host();
        let failure = guarded(&mut host, |_| {
            Err(GuestTrap::new("unreachable").with_frames(vec![
                "wasm-function[7]:0x99".into(),
                "host::guard".into(),
            ]))
        })
        .unwrap_err();

        assert_eq!(failure.message, "unreachable");
        assert_eq!(failure.stack.frames(), ["wasm-function[7]:0x99"]);
    }

    #[test]
    fn test_abort_message_wins() {
        let mut bytes = vec![0u8; 4];
        bytes.extend(encode_string("custom failure"));
        let mut host = host();

        let failure = guarded(&mut host, |host| {
            let view = LinearMemory::new(&bytes);
            host.abort(&view, 8, 0, 1, 1)?;
            Ok(())
        })
        .unwrap_err();

        assert_eq!(failure.message, "custom failure");
    }

    #[test]
    fn test_empty_trap_uses_generic_message() {
        let mut host = host();
        let failure = guarded(&mut host, |_| Err(GuestTrap::new(""))).unwrap_err();
        assert_eq!(failure.message, GENERIC_TRAP_MESSAGE);
    }

    #[test]
    fn test_panic_is_contained() {
        let mut host = host();
        let failure = guarded(&mut host, |_| panic!("runtime bug")).unwrap_err();
        assert_eq!(failure.message, "runtime bug");
    }

    #[test]
    fn test_stale_abort_message_is_cleared() {
        let mut bytes = vec![0u8; 4];
        bytes.extend(encode_string("first"));
        let mut host = host();

        let _ = guarded(&mut host, |host| {
            let view = LinearMemory::new(&bytes);
            host.abort(&view, 8, 0, 0, 0)?;
            Ok(())
        });
        let failure = guarded(&mut host, |_| Err(GuestTrap::new("second"))).unwrap_err();

        assert_eq!(failure.message, "second");
    }
}
