//! Reporter Contract
//!
//! Lifecycle events for one guest module, in the order the engine emits them:
//!
//! ```text
//! on_start
//!   ├─ on_group_start            (every group, declaration order)
//!   │    ├─ on_test_start ─ on_test_finish   (every test)
//!   │    ├─ on_todo                          (every todo)
//!   │    └─ on_group_finish
//!   └─ ...
//! on_finish
//! ```
//!
//! Reporters only observe: every argument is a shared borrow.

use wasmjig_core::{SuiteResult, TestGroup, TestResult};

/// Sink for lifecycle events. Every event defaults to doing nothing.
pub trait Reporter {
    /// Registration finished; `suite.groups` holds every registered group
    fn on_start(&mut self, _suite: &SuiteResult) {}

    /// A group is about to run
    fn on_group_start(&mut self, _group: &TestGroup) {}

    /// A group ran; results and pass flag are final
    fn on_group_finish(&mut self, _group: &TestGroup) {}

    /// A test is about to run
    fn on_test_start(&mut self, _group: &TestGroup, _result: &TestResult) {}

    /// A test ran; the result is final
    fn on_test_finish(&mut self, _group: &TestGroup, _result: &TestResult) {}

    /// A todo placeholder was reached
    fn on_todo(&mut self, _group: &TestGroup, _todo: &str) {}

    /// The module finished; the suite is final
    fn on_finish(&mut self, _suite: &SuiteResult) {}
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn on_start(&mut self, suite: &SuiteResult) {
        (**self).on_start(suite);
    }

    fn on_group_start(&mut self, group: &TestGroup) {
        (**self).on_group_start(group);
    }

    fn on_group_finish(&mut self, group: &TestGroup) {
        (**self).on_group_finish(group);
    }

    fn on_test_start(&mut self, group: &TestGroup, result: &TestResult) {
        (**self).on_test_start(group, result);
    }

    fn on_test_finish(&mut self, group: &TestGroup, result: &TestResult) {
        (**self).on_test_finish(group, result);
    }

    fn on_todo(&mut self, group: &TestGroup, todo: &str) {
        (**self).on_todo(group, todo);
    }

    fn on_finish(&mut self, suite: &SuiteResult) {
        (**self).on_finish(suite);
    }
}

/// Ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyReporter;

impl Reporter for EmptyReporter {}

/// Records event names in order; useful for asserting the event sequence
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    /// One entry per event, e.g. `test_finish:math/adds`
    pub events: Vec<String>,
}

impl Reporter for EventLog {
    fn on_start(&mut self, suite: &SuiteResult) {
        self.events.push(format!("start:{}", suite.file));
    }

    fn on_group_start(&mut self, group: &TestGroup) {
        self.events.push(format!("group_start:{}", group.name));
    }

    fn on_group_finish(&mut self, group: &TestGroup) {
        self.events.push(format!("group_finish:{}", group.name));
    }

    fn on_test_start(&mut self, group: &TestGroup, result: &TestResult) {
        self.events
            .push(format!("test_start:{}/{}", group.name, result.name));
    }

    fn on_test_finish(&mut self, group: &TestGroup, result: &TestResult) {
        self.events
            .push(format!("test_finish:{}/{}", group.name, result.name));
    }

    fn on_todo(&mut self, group: &TestGroup, todo: &str) {
        self.events.push(format!("todo:{}/{}", group.name, todo));
    }

    fn on_finish(&mut self, suite: &SuiteResult) {
        self.events.push(format!("finish:{}", suite.file));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive<R: Reporter>(mut reporter: R, suite: &SuiteResult, group: &TestGroup) {
        reporter.on_start(suite);
        reporter.on_todo(group, "divide");
        reporter.on_finish(suite);
    }

    #[test]
    fn test_event_log_through_mut_ref() {
        let mut log = EventLog::default();
        let suite = SuiteResult::new("a.spec.ts");
        let group = TestGroup::new("math", Some(0), 1);

        drive(&mut log, &suite, &group);

        assert_eq!(
            log.events,
            vec!["start:a.spec.ts", "todo:math/divide", "finish:a.spec.ts"]
        );
    }

    #[test]
    fn test_empty_reporter_accepts_everything() {
        let mut reporter = EmptyReporter;
        let suite = SuiteResult::new("a.spec.ts");
        reporter.on_start(&suite);
        reporter.on_finish(&suite);
    }
}
