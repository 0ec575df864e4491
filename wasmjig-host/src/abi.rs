//! Host ABI
//!
//! Every function the guest imports lands on [`Host`]. Registration calls
//! build the group tree; value and log calls copy data out of guest memory
//! while the call is still in progress.
//!
//! ```text
//!  guest import ──▶ Host::invoke(view, name, args)
//!                         │ decode args
//!                         ▼
//!                   typed method ──▶ registration state / pending values / logs
//! ```
//!
//! Pointers are only dereferenced through the `GuestView` passed with the
//! call; nothing keeps an offset past the call.

use crate::error::{AbiError, ContextError};
use wasmjig_core::{
    ActualValue, CallbackRef, CapturedValue, GENERIC_TRAP_MESSAGE, GuestView, HookKind, LogTarget,
    LogValue, PerformanceConfig, PerformanceOption, PerformanceOverrides, RegisteredTest,
    StackFilter, StackTrace, TestGroup, Warning, WarningKind,
};

/// Every import name [`Host::invoke`] understands
pub const IMPORTS: &[&str] = &[
    "reportDescribe",
    "reportEndDescribe",
    "reportBeforeAll",
    "reportAfterAll",
    "reportBeforeEach",
    "reportAfterEach",
    "reportTest",
    "reportNegatedTest",
    "reportTodo",
    "performanceEnabled",
    "maxSamples",
    "maxTestRunTime",
    "roundDecimalPlaces",
    "reportAverage",
    "reportMedian",
    "reportStdDev",
    "reportMax",
    "reportMin",
    "reportVariance",
    "setPerformanceOption",
    "setTestPerformanceOption",
    "clearExpected",
    "reportActualNull",
    "reportExpectedNull",
    "reportActualValue",
    "reportExpectedValue",
    "reportActualString",
    "reportExpectedString",
    "reportActualReference",
    "reportExpectedReference",
    "reportExpectedTruthy",
    "reportExpectedFalsy",
    "reportExpectedFinite",
    "reportInvalidExpectCall",
    "logString",
    "logReference",
    "logValue",
    "logNull",
    "abort",
    "debug",
];

/// A raw import argument
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AbiValue {
    /// 32-bit integer: pointers, lengths, flags, callback indices
    I32(i32),
    /// 64-bit float: reported numbers
    F64(f64),
}

/// A value as the guest passes it, before it is copied out
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GuestValue {
    /// Null
    Null,
    /// A number
    Number(f64),
    /// Managed string at a pointer; a null pointer reads as `Null`
    String(u32),
    /// Raw block of `len` bytes at `ptr`; a null pointer reads as `Null`
    Reference {
        /// Start of the block
        ptr: u32,
        /// Length in bytes
        len: u32,
    },
}

/// Expectations that carry no payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// `toBeTruthy`
    Truthy,
    /// `toBeFalsy`
    Falsy,
    /// `toBeFinite`
    Finite,
}

impl Predicate {
    fn description(self) -> &'static str {
        match self {
            Predicate::Truthy => "Truthy",
            Predicate::Falsy => "Falsy",
            Predicate::Finite => "Finite",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Registration,
    Execution,
}

/// Host-side state behind the guest's imports for one module
#[derive(Debug)]
pub struct Host {
    defaults: PerformanceConfig,
    filter: StackFilter,
    phase: Phase,
    groups: Vec<TestGroup>,
    stack: Vec<usize>,
    next_test: PerformanceOverrides,
    actual: Option<ActualValue>,
    expected: Option<ActualValue>,
    abort_message: Option<String>,
    logs: Vec<LogValue>,
    warnings: Vec<Warning>,
    unbalanced: bool,
    running_test: bool,
}

impl Host {
    /// Fresh state with only the implicit root group open
    pub fn new(defaults: PerformanceConfig, filter: StackFilter) -> Self {
        Self {
            defaults,
            filter,
            phase: Phase::Registration,
            groups: vec![TestGroup::root()],
            stack: vec![0],
            next_test: PerformanceOverrides::default(),
            actual: None,
            expected: None,
            abort_message: None,
            logs: Vec::new(),
            warnings: Vec::new(),
            unbalanced: false,
            running_test: false,
        }
    }

    /// Dispatch an import by name
    pub fn invoke(
        &mut self,
        view: &dyn GuestView,
        name: &str,
        values: &[AbiValue],
    ) -> Result<(), AbiError> {
        tracing::trace!(import = name, ?values, "abi call");
        let args = Args { import: name, values };

        match name {
            "reportDescribe" => {
                args.arity(1)?;
                self.report_describe(view, args.ptr(0)?)
            }
            "reportEndDescribe" => {
                args.arity(0)?;
                self.report_end_describe()
            }
            "reportBeforeAll" => self.hook_import(&args, HookKind::BeforeAll),
            "reportAfterAll" => self.hook_import(&args, HookKind::AfterAll),
            "reportBeforeEach" => self.hook_import(&args, HookKind::BeforeEach),
            "reportAfterEach" => self.hook_import(&args, HookKind::AfterEach),
            "reportTest" => {
                args.arity(2)?;
                self.report_test(view, args.ptr(0)?, args.callback(1)?)
            }
            "reportNegatedTest" => {
                args.arity(3)?;
                self.report_negated_test(view, args.ptr(0)?, args.callback(1)?, args.ptr(2)?)
            }
            "reportTodo" => {
                args.arity(1)?;
                self.report_todo(view, args.ptr(0)?)
            }
            "performanceEnabled" => self.option_import(&args, 0),
            "maxSamples" => self.option_import(&args, 1),
            "maxTestRunTime" => self.option_import(&args, 2),
            "roundDecimalPlaces" => self.option_import(&args, 3),
            "reportAverage" => self.option_import(&args, 4),
            "reportMedian" => self.option_import(&args, 5),
            "reportStdDev" => self.option_import(&args, 6),
            "reportMax" => self.option_import(&args, 7),
            "reportMin" => self.option_import(&args, 8),
            "reportVariance" => self.option_import(&args, 9),
            "setPerformanceOption" => {
                args.arity(2)?;
                let option = args.option(0, 1)?;
                self.set_performance_option(option)
            }
            "setTestPerformanceOption" => {
                args.arity(2)?;
                let option = args.option(0, 1)?;
                self.set_test_performance_option(option)
            }
            "clearExpected" => {
                args.arity(0)?;
                self.clear_expected();
                Ok(())
            }
            "reportActualNull" => {
                args.arity(0)?;
                self.report_actual(view, GuestValue::Null)
            }
            "reportExpectedNull" => {
                args.arity(1)?;
                self.report_expected(view, GuestValue::Null, args.flag(0)?)
            }
            "reportActualValue" => {
                args.arity(1)?;
                self.report_actual(view, GuestValue::Number(args.number(0)?))
            }
            "reportExpectedValue" => {
                args.arity(2)?;
                self.report_expected(view, GuestValue::Number(args.number(0)?), args.flag(1)?)
            }
            "reportActualString" => {
                args.arity(1)?;
                self.report_actual(view, GuestValue::String(args.ptr(0)?))
            }
            "reportExpectedString" => {
                args.arity(2)?;
                self.report_expected(view, GuestValue::String(args.ptr(0)?), args.flag(1)?)
            }
            "reportActualReference" => {
                args.arity(2)?;
                let value = GuestValue::Reference {
                    ptr: args.ptr(0)?,
                    len: args.ptr(1)?,
                };
                self.report_actual(view, value)
            }
            "reportExpectedReference" => {
                args.arity(3)?;
                let value = GuestValue::Reference {
                    ptr: args.ptr(0)?,
                    len: args.ptr(1)?,
                };
                self.report_expected(view, value, args.flag(2)?)
            }
            "reportExpectedTruthy" => self.predicate_import(view, &args, Predicate::Truthy),
            "reportExpectedFalsy" => self.predicate_import(view, &args, Predicate::Falsy),
            "reportExpectedFinite" => self.predicate_import(view, &args, Predicate::Finite),
            "reportInvalidExpectCall" => {
                args.arity(0)?;
                self.report_invalid_expect_call(view);
                Ok(())
            }
            "logString" => {
                args.arity(1)?;
                self.log(view, GuestValue::String(args.ptr(0)?))
            }
            "logReference" => {
                args.arity(2)?;
                let value = GuestValue::Reference {
                    ptr: args.ptr(0)?,
                    len: args.ptr(1)?,
                };
                self.log(view, value)
            }
            "logValue" => {
                args.arity(1)?;
                self.log(view, GuestValue::Number(args.number(0)?))
            }
            "logNull" => {
                args.arity(0)?;
                self.log(view, GuestValue::Null)
            }
            "abort" => {
                args.arity(4)?;
                self.abort(view, args.ptr(0)?, args.ptr(1)?, args.int(2)?, args.int(3)?)
            }
            "debug" => {
                args.arity(0)?;
                self.debug();
                Ok(())
            }
            _ => Err(AbiError::UnknownImport(name.to_string())),
        }
    }

    fn hook_import(&mut self, args: &Args<'_>, kind: HookKind) -> Result<(), AbiError> {
        args.arity(1)?;
        self.register_hook(kind, args.callback(0)?)
    }

    fn option_import(&mut self, args: &Args<'_>, id: i32) -> Result<(), AbiError> {
        args.arity(1)?;
        let value = args.number(0)?;
        match PerformanceOption::from_id(id, value) {
            Some(option) => self.set_performance_option(option),
            None => Err(args.bad(format!("unknown performance option id {id}"))),
        }
    }

    fn predicate_import(
        &mut self,
        view: &dyn GuestView,
        args: &Args<'_>,
        predicate: Predicate,
    ) -> Result<(), AbiError> {
        args.arity(1)?;
        self.report_expected_predicate(view, predicate, args.flag(0)?)
    }

    // Registration

    /// Open a group named by the string at `name_ptr`
    pub fn report_describe(&mut self, view: &dyn GuestView, name_ptr: u32) -> Result<(), AbiError> {
        self.require_registration("reportDescribe")?;
        let name = view.read_string(name_ptr)?;

        let parent = self.top();
        let index = self.groups.len();
        let depth = self.stack.len();
        tracing::debug!(group = %name, depth, "describe");

        self.groups.push(TestGroup::new(name, Some(parent), depth));
        self.stack.push(index);
        Ok(())
    }

    /// Close the innermost open group
    pub fn report_end_describe(&mut self) -> Result<(), AbiError> {
        self.require_registration("reportEndDescribe")?;
        if self.stack.len() <= 1 {
            self.unbalanced = true;
            return Err(AbiError::UnbalancedClose);
        }

        if let Some(closed) = self.stack.pop() {
            let parent = self.top();
            self.groups[parent].children.push(closed);
        }
        Ok(())
    }

    /// Store a hook on the innermost open group
    pub fn register_hook(&mut self, kind: HookKind, callback: CallbackRef) -> Result<(), AbiError> {
        self.require_registration("hook registration")?;
        let top = self.top();
        self.groups[top].hooks.set(kind, callback);
        Ok(())
    }

    /// Register a test that is expected to pass
    pub fn report_test(
        &mut self,
        view: &dyn GuestView,
        name_ptr: u32,
        callback: CallbackRef,
    ) -> Result<(), AbiError> {
        self.require_registration("reportTest")?;
        let name = view.read_string(name_ptr)?;
        self.push_test(name, callback, false, None);
        Ok(())
    }

    /// Register a test that is expected to throw; `message_ptr` of 0 uses the default message
    pub fn report_negated_test(
        &mut self,
        view: &dyn GuestView,
        name_ptr: u32,
        callback: CallbackRef,
        message_ptr: u32,
    ) -> Result<(), AbiError> {
        self.require_registration("reportNegatedTest")?;
        let name = view.read_string(name_ptr)?;
        let message = match message_ptr {
            0 => None,
            ptr => Some(view.read_string(ptr)?),
        };
        self.push_test(name, callback, true, message);
        Ok(())
    }

    fn push_test(&mut self, name: String, callback: CallbackRef, negated: bool, message: Option<String>) {
        let layers = std::iter::once(&self.next_test)
            .chain(self.stack.iter().rev().map(|&i| &self.groups[i].performance));
        let performance = PerformanceOverrides::resolve(layers, &self.defaults);
        self.next_test = PerformanceOverrides::default();

        tracing::debug!(test = %name, negated, sampled = performance.enabled, "register test");
        let top = self.top();
        self.groups[top].tests.push(RegisteredTest {
            name,
            callback,
            negated,
            message,
            performance,
        });
    }

    /// Add a todo to the innermost open group
    pub fn report_todo(&mut self, view: &dyn GuestView, description_ptr: u32) -> Result<(), AbiError> {
        self.require_registration("reportTodo")?;
        let description = view.read_string(description_ptr)?;
        let top = self.top();
        self.groups[top].todos.push(description);
        Ok(())
    }

    /// Override a setting for every test registered afterwards in the innermost group and its descendants
    pub fn set_performance_option(&mut self, option: PerformanceOption) -> Result<(), AbiError> {
        self.require_registration("setPerformanceOption")?;
        let top = self.top();
        self.groups[top].performance.set(option);
        Ok(())
    }

    /// Override a setting for the next registered test only
    pub fn set_test_performance_option(&mut self, option: PerformanceOption) -> Result<(), AbiError> {
        self.require_registration("setTestPerformanceOption")?;
        self.next_test.set(option);
        Ok(())
    }

    // Values

    /// Forget the pending actual/expected pair after a passing assertion
    pub fn clear_expected(&mut self) {
        self.actual = None;
        self.expected = None;
    }

    /// Record the actual side of an assertion
    pub fn report_actual(&mut self, view: &dyn GuestView, value: GuestValue) -> Result<(), AbiError> {
        if self.outside_test(view, "reportActual") {
            return Ok(());
        }
        let captured = capture(view, value)?;
        self.actual = Some(ActualValue::new(captured, false, self.stack_of(view)));
        Ok(())
    }

    /// Record the expected side of an assertion
    pub fn report_expected(
        &mut self,
        view: &dyn GuestView,
        value: GuestValue,
        negated: bool,
    ) -> Result<(), AbiError> {
        if self.outside_test(view, "reportExpected") {
            return Ok(());
        }
        let captured = capture(view, value)?;
        self.expected = Some(ActualValue::new(captured, negated, self.stack_of(view)));
        Ok(())
    }

    /// Record a payload-free expectation (truthy, falsy, finite)
    pub fn report_expected_predicate(
        &mut self,
        view: &dyn GuestView,
        predicate: Predicate,
        negated: bool,
    ) -> Result<(), AbiError> {
        if self.outside_test(view, "reportExpected") {
            return Ok(());
        }
        self.expected = Some(ActualValue::described(
            predicate.description(),
            negated,
            self.stack_of(view),
        ));
        Ok(())
    }

    /// The guest detected an expectation outside of a test on its own
    pub fn report_invalid_expect_call(&mut self, view: &dyn GuestView) {
        self.warn_invalid_expect(view, "expect");
    }

    // Logging

    /// Attach a value to the running test, or to the innermost group while registering
    pub fn log(&mut self, view: &dyn GuestView, value: GuestValue) -> Result<(), AbiError> {
        let entry = LogValue::new(capture(view, value)?, self.stack_of(view));
        match self.phase {
            Phase::Registration => {
                let top = self.top();
                self.groups[top].push_log(entry);
            }
            Phase::Execution => self.logs.push(entry),
        }
        Ok(())
    }

    // Other

    /// Record the abort message and trap the guest
    pub fn abort(
        &mut self,
        view: &dyn GuestView,
        message_ptr: u32,
        file_ptr: u32,
        line: i32,
        column: i32,
    ) -> Result<(), AbiError> {
        let message = match message_ptr {
            0 => None,
            ptr => view.read_string(ptr).ok(),
        };
        let file = match file_ptr {
            0 => None,
            ptr => view.read_string(ptr).ok(),
        };
        tracing::debug!(?message, ?file, line, column, "guest abort");

        self.abort_message = message.clone();
        Err(AbiError::Aborted {
            message: message.unwrap_or_else(|| GENERIC_TRAP_MESSAGE.to_string()),
        })
    }

    /// Breakpoint hook; does nothing
    pub fn debug(&self) {
        tracing::debug!("guest debugger breakpoint");
    }

    // Inspection

    /// Number of groups currently open below the root
    pub fn depth(&self) -> usize {
        self.stack.len().saturating_sub(1)
    }

    /// Groups registered so far
    pub fn groups(&self) -> &[TestGroup] {
        &self.groups
    }

    /// Warnings raised so far
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Frame filter applied to every captured stack
    pub fn stack_filter(&self) -> &StackFilter {
        &self.filter
    }

    // Engine side

    /// Validate registration and hand the groups over for execution
    pub(crate) fn finish_registration(&mut self) -> Result<Vec<TestGroup>, ContextError> {
        if self.unbalanced {
            return Err(ContextError::UnbalancedClose);
        }
        if self.stack.len() != 1 {
            return Err(ContextError::UnclosedGroups {
                depth: self.depth(),
            });
        }
        self.phase = Phase::Execution;
        Ok(std::mem::take(&mut self.groups))
    }

    /// Reset per-test state before a test's hooks and body run
    pub(crate) fn begin_test(&mut self) {
        self.clear_expected();
        self.logs.clear();
        self.abort_message = None;
        self.running_test = true;
    }

    /// Leave the test scope; later value reports are invalid until the next test
    pub(crate) fn end_test(&mut self) {
        self.running_test = false;
    }

    pub(crate) fn unbalanced(&self) -> bool {
        self.unbalanced
    }

    pub(crate) fn clear_abort(&mut self) {
        self.abort_message = None;
    }

    pub(crate) fn take_abort_message(&mut self) -> Option<String> {
        self.abort_message.take()
    }

    pub(crate) fn take_values(&mut self) -> (Option<ActualValue>, Option<ActualValue>) {
        (self.actual.take(), self.expected.take())
    }

    pub(crate) fn take_logs(&mut self) -> Vec<LogValue> {
        std::mem::take(&mut self.logs)
    }

    pub(crate) fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    fn top(&self) -> usize {
        self.stack.last().copied().unwrap_or(0)
    }

    fn stack_of(&self, view: &dyn GuestView) -> StackTrace {
        self.filter.filter(view.backtrace())
    }

    fn require_registration(&self, import: &'static str) -> Result<(), AbiError> {
        match self.phase {
            Phase::Registration => Ok(()),
            Phase::Execution => Err(AbiError::RegistrationClosed { import }),
        }
    }

    /// Value reports are only meaningful while a test runs; any other one becomes a warning
    fn outside_test(&mut self, view: &dyn GuestView, import: &str) -> bool {
        if self.running_test {
            return false;
        }
        self.warn_invalid_expect(view, import);
        true
    }

    fn warn_invalid_expect(&mut self, view: &dyn GuestView, import: &str) {
        let warning = Warning {
            kind: WarningKind::InvalidExpectCall,
            message: format!("{import} was called outside of a test. Expectations must run inside test bodies."),
            stack: self.stack_of(view),
        };
        tracing::warn!(message = %warning.message, "invalid expect call");
        self.warnings.push(warning);
    }
}

fn capture(view: &dyn GuestView, value: GuestValue) -> Result<CapturedValue, AbiError> {
    Ok(match value {
        GuestValue::Null | GuestValue::String(0) | GuestValue::Reference { ptr: 0, .. } => {
            CapturedValue::Null
        }
        GuestValue::Number(n) => CapturedValue::Number(n),
        GuestValue::String(ptr) => CapturedValue::String(view.read_string(ptr)?),
        GuestValue::Reference { ptr, len } => CapturedValue::Bytes(view.read_bytes(ptr, len)?),
    })
}

struct Args<'a> {
    import: &'a str,
    values: &'a [AbiValue],
}

impl Args<'_> {
    fn bad(&self, reason: String) -> AbiError {
        AbiError::BadArguments {
            import: self.import.to_string(),
            reason,
        }
    }

    fn arity(&self, expected: usize) -> Result<(), AbiError> {
        if self.values.len() == expected {
            Ok(())
        } else {
            Err(self.bad(format!("expected {expected} argument(s), got {}", self.values.len())))
        }
    }

    fn get(&self, index: usize) -> Result<AbiValue, AbiError> {
        self.values
            .get(index)
            .copied()
            .ok_or_else(|| self.bad(format!("missing argument {index}")))
    }

    fn int(&self, index: usize) -> Result<i32, AbiError> {
        match self.get(index)? {
            AbiValue::I32(v) => Ok(v),
            AbiValue::F64(v) => Err(self.bad(format!("argument {index} must be an integer, got {v}"))),
        }
    }

    fn ptr(&self, index: usize) -> Result<u32, AbiError> {
        self.int(index).map(|v| v as u32)
    }

    fn callback(&self, index: usize) -> Result<CallbackRef, AbiError> {
        self.ptr(index).map(CallbackRef::new)
    }

    fn flag(&self, index: usize) -> Result<bool, AbiError> {
        self.number(index).map(|v| v != 0.0)
    }

    fn number(&self, index: usize) -> Result<f64, AbiError> {
        Ok(match self.get(index)? {
            AbiValue::I32(v) => f64::from(v),
            AbiValue::F64(v) => v,
        })
    }

    fn option(&self, id_index: usize, value_index: usize) -> Result<PerformanceOption, AbiError> {
        let id = self.int(id_index)?;
        let value = self.number(value_index)?;
        PerformanceOption::from_id(id, value)
            .ok_or_else(|| self.bad(format!("unknown performance option id {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasmjig_core::{LinearMemory, MemoryError, encode_string};

    /// Memory holding `strings` back to back; returns the memory and each string pointer
    fn memory_with(strings: &[&str]) -> (Vec<u8>, Vec<u32>) {
        let mut bytes = vec![0u8; 8];
        let mut ptrs = Vec::new();
        for s in strings {
            let block = encode_string(s);
            ptrs.push(bytes.len() as u32 + 4);
            bytes.extend(block);
        }
        (bytes, ptrs)
    }

    fn host() -> Host {
        Host::new(PerformanceConfig::default(), StackFilter::keep_all())
    }

    #[test]
    fn test_imports_are_unique() {
        let mut names = IMPORTS.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), IMPORTS.len());
    }

    #[test]
    fn test_describe_nesting() {
        let (bytes, ptrs) = memory_with(&["outer", "inner"]);
        let view = LinearMemory::new(&bytes);
        let mut host = host();

        host.invoke(&view, "reportDescribe", &[AbiValue::I32(ptrs[0] as i32)]).unwrap();
        host.invoke(&view, "reportDescribe", &[AbiValue::I32(ptrs[1] as i32)]).unwrap();
        assert_eq!(host.depth(), 2);
        host.invoke(&view, "reportEndDescribe", &[]).unwrap();
        host.invoke(&view, "reportEndDescribe", &[]).unwrap();
        assert_eq!(host.depth(), 0);

        let groups = host.groups();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[1].name, "outer");
        assert_eq!(groups[2].parent, Some(1));
        assert_eq!(groups[2].depth, 2);
        assert_eq!(groups[1].children, vec![2]);
        assert_eq!(groups[0].children, vec![1]);
    }

    #[test]
    fn test_unbalanced_close_is_fatal() {
        let view = LinearMemory::new(&[]);
        let mut host = host();

        let err = host.invoke(&view, "reportEndDescribe", &[]).unwrap_err();
        assert_eq!(err, AbiError::UnbalancedClose);
        assert_eq!(
            host.finish_registration().unwrap_err(),
            ContextError::UnbalancedClose
        );
    }

    #[test]
    fn test_unclosed_group_is_fatal() {
        let (bytes, ptrs) = memory_with(&["open"]);
        let view = LinearMemory::new(&bytes);
        let mut host = host();
        host.report_describe(&view, ptrs[0]).unwrap();

        assert_eq!(
            host.finish_registration().unwrap_err(),
            ContextError::UnclosedGroups { depth: 1 }
        );
    }

    #[test]
    fn test_registration_closes_after_finish() {
        let (bytes, ptrs) = memory_with(&["late"]);
        let view = LinearMemory::new(&bytes);
        let mut host = host();
        host.finish_registration().unwrap();

        let err = host.report_describe(&view, ptrs[0]).unwrap_err();
        assert!(matches!(err, AbiError::RegistrationClosed { .. }));
    }

    #[test]
    fn test_group_option_applies_prospectively() {
        let (bytes, ptrs) = memory_with(&["before", "after"]);
        let view = LinearMemory::new(&bytes);
        let mut host = host();

        host.report_test(&view, ptrs[0], CallbackRef::new(0)).unwrap();
        host.invoke(&view, "performanceEnabled", &[AbiValue::I32(1)]).unwrap();
        host.invoke(&view, "maxSamples", &[AbiValue::F64(12.0)]).unwrap();
        host.report_test(&view, ptrs[1], CallbackRef::new(1)).unwrap();

        let tests = &host.groups()[0].tests;
        assert!(!tests[0].performance.enabled);
        assert!(tests[1].performance.enabled);
        assert_eq!(tests[1].performance.max_samples, 12);
    }

    #[test]
    fn test_child_group_inherits_and_overrides() {
        let (bytes, ptrs) = memory_with(&["child", "t"]);
        let view = LinearMemory::new(&bytes);
        let mut host = host();

        host.set_performance_option(PerformanceOption::Enabled(true)).unwrap();
        host.set_performance_option(PerformanceOption::RoundDecimalPlaces(1)).unwrap();
        host.report_describe(&view, ptrs[0]).unwrap();
        host.set_performance_option(PerformanceOption::RoundDecimalPlaces(5)).unwrap();
        host.report_test(&view, ptrs[1], CallbackRef::new(0)).unwrap();
        host.report_end_describe().unwrap();

        let resolved = host.groups()[1].tests[0].performance;
        assert!(resolved.enabled);
        assert_eq!(resolved.round_decimal_places, 5);
        assert_eq!(resolved.max_samples, 10_000);
    }

    #[test]
    fn test_test_option_consumed_by_next_test() {
        let (bytes, ptrs) = memory_with(&["first", "second"]);
        let view = LinearMemory::new(&bytes);
        let mut host = host();

        host.invoke(
            &view,
            "setTestPerformanceOption",
            &[AbiValue::I32(0), AbiValue::F64(1.0)],
        )
        .unwrap();
        host.report_test(&view, ptrs[0], CallbackRef::new(0)).unwrap();
        host.report_test(&view, ptrs[1], CallbackRef::new(1)).unwrap();

        let tests = &host.groups()[0].tests;
        assert!(tests[0].performance.enabled);
        assert!(!tests[1].performance.enabled);
    }

    #[test]
    fn test_negated_test_message() {
        let (bytes, ptrs) = memory_with(&["throws", "should have thrown"]);
        let view = LinearMemory::new(&bytes);
        let mut host = host();

        host.invoke(
            &view,
            "reportNegatedTest",
            &[AbiValue::I32(ptrs[0] as i32), AbiValue::I32(4), AbiValue::I32(ptrs[1] as i32)],
        )
        .unwrap();
        host.invoke(
            &view,
            "reportNegatedTest",
            &[AbiValue::I32(ptrs[0] as i32), AbiValue::I32(5), AbiValue::I32(0)],
        )
        .unwrap();

        let tests = &host.groups()[0].tests;
        assert!(tests[0].negated);
        assert_eq!(tests[0].callback, CallbackRef::new(4));
        assert_eq!(tests[0].message.as_deref(), Some("should have thrown"));
        assert_eq!(tests[1].message, None);
    }

    #[test]
    fn test_hook_and_todo_registration() {
        let (bytes, ptrs) = memory_with(&["write docs"]);
        let view = LinearMemory::new(&bytes);
        let mut host = host();

        host.invoke(&view, "reportBeforeEach", &[AbiValue::I32(3)]).unwrap();
        host.invoke(&view, "reportBeforeEach", &[AbiValue::I32(9)]).unwrap();
        host.invoke(&view, "reportTodo", &[AbiValue::I32(ptrs[0] as i32)]).unwrap();

        let root = &host.groups()[0];
        assert_eq!(root.hooks.get(HookKind::BeforeEach), Some(CallbackRef::new(9)));
        assert_eq!(root.todos, vec!["write docs".to_string()]);
    }

    #[test]
    fn test_value_report_during_registration_warns() {
        let view = LinearMemory::new(&[]);
        let mut host = host();

        host.invoke(&view, "reportActualValue", &[AbiValue::F64(1.0)]).unwrap();
        host.invoke(&view, "reportExpectedTruthy", &[AbiValue::I32(0)]).unwrap();

        assert_eq!(host.warnings().len(), 2);
        assert_eq!(host.warnings()[0].kind, WarningKind::InvalidExpectCall);
        assert_eq!(host.take_values(), (None, None));
    }

    #[test]
    fn test_value_capture_copies_out() {
        let (mut bytes, ptrs) = memory_with(&["hello"]);
        bytes.extend_from_slice(&[1, 2, 3]);
        let block = bytes.len() as u32 - 3;
        let mut host = host();
        host.finish_registration().unwrap();
        host.begin_test();

        {
            let view = LinearMemory::new(&bytes);
            host.report_actual(&view, GuestValue::String(ptrs[0])).unwrap();
            host.report_expected(&view, GuestValue::Reference { ptr: block, len: 3 }, true)
                .unwrap();
        }
        // The guest may reuse its memory once the call returns
        bytes.fill(0);

        let (actual, expected) = host.take_values();
        assert_eq!(actual.unwrap().value, CapturedValue::String("hello".into()));
        let expected = expected.unwrap();
        assert_eq!(expected.value, CapturedValue::Bytes(vec![1, 2, 3]));
        assert!(expected.negated);
    }

    #[test]
    fn test_value_report_between_tests_warns() {
        let view = LinearMemory::new(&[]);
        let mut host = host();
        host.finish_registration().unwrap();

        // Execution has started but no test is running
        host.invoke(&view, "reportActualValue", &[AbiValue::F64(1.0)]).unwrap();
        assert_eq!(host.warnings().len(), 1);

        host.begin_test();
        host.invoke(&view, "reportActualValue", &[AbiValue::F64(2.0)]).unwrap();
        assert_eq!(host.warnings().len(), 1);

        host.end_test();
        host.invoke(&view, "reportExpectedFalsy", &[AbiValue::I32(0)]).unwrap();
        assert_eq!(host.warnings().len(), 2);
        assert!(host.warnings().iter().all(|w| w.kind == WarningKind::InvalidExpectCall));
    }

    #[test]
    fn test_clear_expected() {
        let view = LinearMemory::new(&[]);
        let mut host = host();
        host.finish_registration().unwrap();
        host.begin_test();

        host.invoke(&view, "reportActualValue", &[AbiValue::F64(1.0)]).unwrap();
        host.invoke(&view, "reportExpectedValue", &[AbiValue::F64(1.0), AbiValue::I32(0)])
            .unwrap();
        host.invoke(&view, "clearExpected", &[]).unwrap();

        assert_eq!(host.take_values(), (None, None));
    }

    #[test]
    fn test_logs_route_by_phase() {
        let (bytes, ptrs) = memory_with(&["during registration"]);
        let view = LinearMemory::new(&bytes);
        let mut host = host();

        host.invoke(&view, "logString", &[AbiValue::I32(ptrs[0] as i32)]).unwrap();
        let groups = host.finish_registration().unwrap();
        assert_eq!(groups[0].logs[0].message, "during registration");

        host.invoke(&view, "logValue", &[AbiValue::F64(42.0)]).unwrap();
        host.invoke(&view, "logNull", &[]).unwrap();
        let logs = host.take_logs();
        let messages: Vec<_> = logs.iter().map(|l| l.message.as_str()).collect();
        assert_eq!(messages, vec!["42", "null"]);
    }

    #[test]
    fn test_abort_records_message() {
        let (bytes, ptrs) = memory_with(&["Expected 1 to equal 2", "math.spec.ts"]);
        let view = LinearMemory::new(&bytes);
        let mut host = host();

        let err = host
            .invoke(
                &view,
                "abort",
                &[
                    AbiValue::I32(ptrs[0] as i32),
                    AbiValue::I32(ptrs[1] as i32),
                    AbiValue::I32(10),
                    AbiValue::I32(3),
                ],
            )
            .unwrap_err();

        assert_eq!(
            err,
            AbiError::Aborted {
                message: "Expected 1 to equal 2".into()
            }
        );
        assert_eq!(host.take_abort_message().as_deref(), Some("Expected 1 to equal 2"));
    }

    #[test]
    fn test_bad_calls() {
        let view = LinearMemory::new(&[]);
        let mut host = host();

        assert!(matches!(
            host.invoke(&view, "reportTest", &[AbiValue::I32(1)]),
            Err(AbiError::BadArguments { .. })
        ));
        assert!(matches!(
            host.invoke(&view, "setPerformanceOption", &[AbiValue::I32(42), AbiValue::F64(1.0)]),
            Err(AbiError::BadArguments { .. })
        ));
        assert_eq!(
            host.invoke(&view, "nope", &[]),
            Err(AbiError::UnknownImport("nope".into()))
        );
        assert_eq!(
            host.invoke(&view, "reportDescribe", &[AbiValue::I32(0)]),
            Err(AbiError::Memory(MemoryError::NullPointer))
        );
    }
}
