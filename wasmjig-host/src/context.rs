//! Test Context - The Orchestration Engine
//!
//! Runs one guest module in two phases:
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ registration: guest.start()  │  describe / test / hooks / options recorded
//! └──────────────┬───────────────┘  nothing executes
//!                │ balanced groups, no warnings
//!                ▼
//! ┌──────────────────────────────┐
//! │ execution, per group (flat,  │  beforeAll
//! │ declaration order)           │    per test: beforeEach, body | sampling loop, afterEach
//! │                              │  afterAll, todos
//! └──────────────┬───────────────┘
//!                ▼
//!           SuiteResult
//! ```
//!
//! Hooks guard only their own group's tests. Every guest call is guarded, so
//! a failing test or hook never stops its siblings.

use crate::abi::Host;
use crate::error::ContextError;
use crate::guard::guarded;
use crate::module::GuestModule;
use crate::run_context::RunContext;
use wasmjig_core::{
    DEFAULT_NEGATED_MESSAGE, HookKind, PerformanceConfig, RegisteredTest, StackFilter, SuiteResult,
    TestGroup, TestResult, Timer, run_sampling_loop,
};
use wasmjig_report::Reporter;

/// Runs one guest module and produces its [`SuiteResult`]
#[derive(Debug, Clone)]
pub struct TestContext {
    file: String,
    defaults: PerformanceConfig,
    filter: StackFilter,
}

impl TestContext {
    /// A context for the module built from `file`
    pub fn new(file: impl Into<String>, defaults: PerformanceConfig) -> Self {
        Self {
            file: file.into(),
            defaults,
            filter: StackFilter::default(),
        }
    }

    /// Replace the frame filter applied to every captured stack
    pub fn with_stack_filter(mut self, filter: StackFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Register and execute every test in `guest`, streaming events to `reporter`.
    ///
    /// Fails without results when registration is malformed or the module's
    /// top-level code traps.
    pub fn run<G, R>(self, guest: &mut G, reporter: &mut R) -> Result<SuiteResult, ContextError>
    where
        G: GuestModule + ?Sized,
        R: Reporter + ?Sized,
    {
        let timer = Timer::start();
        let mut host = Host::new(self.defaults, self.filter);
        tracing::debug!(file = %self.file, "registering tests");

        let started = guarded(&mut host, |host| guest.start(host));
        if let Err(failure) = started {
            if host.unbalanced() {
                return Err(ContextError::UnbalancedClose);
            }
            return Err(ContextError::StartTrapped {
                message: failure.message,
                stack: failure.stack,
            });
        }

        let mut suite = SuiteResult::new(self.file);
        suite.groups = host.finish_registration()?;
        suite.warnings = host.take_warnings();
        reporter.on_start(&suite);

        if suite.warnings.is_empty() {
            for group in &mut suite.groups {
                run_group(&mut host, guest, reporter, group);
            }
        } else {
            tracing::warn!(
                file = %suite.file,
                warnings = suite.warnings.len(),
                "invalid expect calls during registration, tests not executed"
            );
        }

        suite.warnings.extend(host.take_warnings());
        suite.run_time = timer.elapsed_ms();
        suite.settle();
        tracing::debug!(
            file = %suite.file,
            passed = suite.passed(),
            failed = suite.failed(),
            pass = suite.pass,
            "module finished"
        );
        reporter.on_finish(&suite);
        Ok(suite)
    }
}

fn run_group<G, R>(host: &mut Host, guest: &mut G, reporter: &mut R, group: &mut TestGroup)
where
    G: GuestModule + ?Sized,
    R: Reporter + ?Sized,
{
    let mut context = RunContext::start();
    reporter.on_group_start(group);
    tracing::debug!(group = %group.name, tests = group.tests.len(), "group start");

    if !group.tests.is_empty() {
        let mut setup_failure = None;
        if let Some(callback) = group.hooks.get(HookKind::BeforeAll) {
            if let Err(failure) = guarded(host, |host| guest.call(host, callback)) {
                tracing::warn!(group = %group.name, message = %failure.message, "beforeAll failed");
                let reason = format!("{} hook failed: {}", HookKind::BeforeAll, failure.message);
                context.fail(&reason);
                setup_failure = Some(reason);
            }
            group.logs.extend(host.take_logs());
        }

        for index in 0..group.tests.len() {
            let test = group.tests[index].clone();
            let result = match &setup_failure {
                Some(reason) => skipped_result(reporter, group, &test, reason.clone()),
                None => {
                    let (result, hook_failure) = run_test(host, guest, reporter, group, &test);
                    if let Some(reason) = hook_failure {
                        context.fail(reason);
                    }
                    result
                }
            };
            group.results.push(result);
        }

        if let Some(callback) = group.hooks.get(HookKind::AfterAll) {
            if let Err(failure) = guarded(host, |host| guest.call(host, callback)) {
                tracing::warn!(group = %group.name, message = %failure.message, "afterAll failed");
                context.fail(format!("{} hook failed: {}", HookKind::AfterAll, failure.message));
            }
            group.logs.extend(host.take_logs());
        }
    }

    for todo in &group.todos {
        reporter.on_todo(group, todo);
    }

    if let Some(reason) = context.failure() {
        group.fail(reason);
    }
    group.settle();
    group.run_time = context.elapsed_ms();
    tracing::debug!(group = %group.name, pass = group.pass, "group finish");
    reporter.on_group_finish(group);
}

/// A test whose group setup failed: reported failed, never run
fn skipped_result<R>(reporter: &mut R, group: &TestGroup, test: &RegisteredTest, reason: String) -> TestResult
where
    R: Reporter + ?Sized,
{
    let mut result = TestResult::new(&test.name, test.negated, test.performance);
    reporter.on_test_start(group, &result);
    result.fail(reason, None);
    reporter.on_test_finish(group, &result);
    result
}

/// Run one test with its per-test hooks; also returns a hook failure, if any
fn run_test<G, R>(
    host: &mut Host,
    guest: &mut G,
    reporter: &mut R,
    group: &TestGroup,
    test: &RegisteredTest,
) -> (TestResult, Option<String>)
where
    G: GuestModule + ?Sized,
    R: Reporter + ?Sized,
{
    let mut context = RunContext::start();
    let mut result = TestResult::new(&test.name, test.negated, test.performance);
    host.begin_test();
    reporter.on_test_start(group, &result);

    let ready = match group.hooks.get(HookKind::BeforeEach) {
        Some(callback) => match guarded(host, |host| guest.call(host, callback)) {
            Ok(()) => true,
            Err(failure) => {
                let reason = format!("{} hook failed: {}", HookKind::BeforeEach, failure.message);
                result.fail(&reason, Some(failure.stack));
                context.fail(reason);
                false
            }
        },
        None => true,
    };

    if ready {
        run_body(host, guest, test, &mut result);
    }

    if let Some(callback) = group.hooks.get(HookKind::AfterEach) {
        if let Err(failure) = guarded(host, |host| guest.call(host, callback)) {
            let reason = format!("{} hook failed: {}", HookKind::AfterEach, failure.message);
            if result.pass {
                result.fail(&reason, Some(failure.stack));
            }
            context.fail(reason);
        }
    }

    host.end_test();
    let (actual, expected) = host.take_values();
    if !result.pass {
        result.actual = actual;
        result.expected = expected;
    }
    result.logs = host.take_logs();
    result.run_time = context.elapsed_ms();

    tracing::debug!(test = %result.name, pass = result.pass, samples = result.times.len(), "test finish");
    reporter.on_test_finish(group, &result);
    (result, context.failure().map(str::to_string))
}

fn run_body<G>(host: &mut Host, guest: &mut G, test: &RegisteredTest, result: &mut TestResult)
where
    G: GuestModule + ?Sized,
{
    let callback = test.callback;

    if test.negated {
        match guarded(host, |host| guest.call(host, callback)) {
            Ok(()) => {
                let message = test.message.as_deref().unwrap_or(DEFAULT_NEGATED_MESSAGE);
                result.fail(message, None);
            }
            Err(failure) => {
                tracing::debug!(test = %test.name, message = %failure.message, "negated test threw");
                host.clear_expected();
            }
        }
        return;
    }

    if test.performance.enabled {
        let mut failure = None;
        let outcome = run_sampling_loop(
            test.performance.max_samples,
            test.performance.max_test_run_time,
            || match guarded(host, |host| guest.call(host, callback)) {
                Ok(()) => true,
                Err(err) => {
                    failure = Some(err);
                    false
                }
            },
        );
        result.record_samples(outcome.times);
        if let Some(failure) = failure {
            result.fail(failure.message, Some(failure.stack));
        }
    } else if let Err(failure) = guarded(host, |host| guest.call(host, callback)) {
        result.fail(failure.message, Some(failure.stack));
    }
}
