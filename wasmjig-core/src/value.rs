//! Captured Guest Values
//!
//! Snapshots of values the guest reported through the ABI, either as log
//! entries or as the actual/expected pair of an assertion. Every payload is
//! owned: the guest memory it came from is gone by the time a reporter
//! sees it.

use crate::trace::StackTrace;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single typed value copied out of the guest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CapturedValue {
    /// Numeric value (every guest numeric type widens to `f64`)
    Number(f64),
    /// Decoded managed string
    String(String),
    /// Raw bytes of a referenced block
    Bytes(Vec<u8>),
    /// The guest reported null
    Null,
    /// Nothing was reported, only a description (truthy, falsy, finite)
    Absent,
}

impl fmt::Display for CapturedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapturedValue::Number(n) => write!(f, "{n}"),
            CapturedValue::String(s) => write!(f, "{s:?}"),
            CapturedValue::Bytes(bytes) => {
                f.write_str("[")?;
                for (i, byte) in bytes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{byte:02x}")?;
                }
                f.write_str("]")
            }
            CapturedValue::Null => f.write_str("null"),
            CapturedValue::Absent => Ok(()),
        }
    }
}

/// Anything that accumulates log entries (a running test or a group)
pub trait LogTarget {
    /// Logs recorded so far, in call order
    fn logs(&self) -> &[LogValue];

    /// Append a log entry
    fn push_log(&mut self, value: LogValue);
}

/// A value the guest logged, with the guest stack at the point of logging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogValue {
    /// The logged value
    pub value: CapturedValue,
    /// Rendered description of the value
    pub message: String,
    /// Filtered stack at the log call
    pub stack: StackTrace,
}

impl LogValue {
    /// Capture a value, rendering its message from the value itself
    pub fn new(value: CapturedValue, stack: StackTrace) -> Self {
        let message = match &value {
            // Logged strings are shown verbatim, without quoting
            CapturedValue::String(s) => s.clone(),
            CapturedValue::Bytes(_) => format!("Reference Value: {value}"),
            other => other.to_string(),
        };
        Self {
            value,
            message,
            stack,
        }
    }
}

/// A reported actual or expected value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActualValue {
    /// The reported value
    pub value: CapturedValue,
    /// Rendered description
    pub message: String,
    /// Filtered stack at the report call
    pub stack: StackTrace,
    /// Whether the expectation was negated (`expect(x).not...`)
    pub negated: bool,
}

impl ActualValue {
    /// Capture a reported value
    pub fn new(value: CapturedValue, negated: bool, stack: StackTrace) -> Self {
        let message = value.to_string();
        Self {
            value,
            message,
            stack,
            negated,
        }
    }

    /// Capture an expectation that carries only a description (truthy, falsy, finite)
    pub fn described(message: impl Into<String>, negated: bool, stack: StackTrace) -> Self {
        Self {
            value: CapturedValue::Absent,
            message: message.into(),
            stack,
            negated,
        }
    }
}

impl fmt::Display for ActualValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "not {}", self.message)
        } else {
            f.write_str(&self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_display() {
        assert_eq!(CapturedValue::Number(42.0).to_string(), "42");
        assert_eq!(CapturedValue::Number(-1.5).to_string(), "-1.5");
    }

    #[test]
    fn test_bytes_display() {
        let value = CapturedValue::Bytes(vec![0x00, 0x1f, 0xff]);
        assert_eq!(value.to_string(), "[00 1f ff]");
        assert_eq!(CapturedValue::Bytes(Vec::new()).to_string(), "[]");
    }

    #[test]
    fn test_log_messages() {
        let stack = StackTrace::default();
        assert_eq!(
            LogValue::new(CapturedValue::String("hi".into()), stack.clone()).message,
            "hi"
        );
        assert_eq!(LogValue::new(CapturedValue::Null, stack.clone()).message, "null");
        assert_eq!(
            LogValue::new(CapturedValue::Bytes(vec![1, 2]), stack).message,
            "Reference Value: [01 02]"
        );
    }

    #[test]
    fn test_actual_value_display() {
        let stack = StackTrace::default();
        let expected = ActualValue::new(CapturedValue::String("a".into()), true, stack.clone());
        assert_eq!(expected.to_string(), "not \"a\"");

        let truthy = ActualValue::described("truthy", false, stack);
        assert_eq!(truthy.value, CapturedValue::Absent);
        assert_eq!(truthy.to_string(), "truthy");
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(CapturedValue::Number(3.0)).unwrap();
        assert_eq!(json["kind"], "number");
        assert_eq!(json["value"], 3.0);

        let json = serde_json::to_value(CapturedValue::Null).unwrap();
        assert_eq!(json["kind"], "null");
    }
}
