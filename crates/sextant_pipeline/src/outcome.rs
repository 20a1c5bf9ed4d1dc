//! Outcome classification and outcome-driven callback dispatch.
//!
//! Every execution ends in exactly one [`Outcome`]. Once recorded it never
//! changes: callbacks, the global exception hook and message providers may
//! all fail, but their failures are logged and contained.
//!
//! | Outcome | Callbacks dispatched |
//! |---------|----------------------|
//! | `Success` | `success` |
//! | `Failure` | `error`, then `failure` |
//! | `Exception` | `error`, then `exception`, then the global hook |
//!
//! An early completion ([`Halt::Complete`]) is not an outcome. The classifier
//! hands it back untouched and the executor turns it into a success.

use core::fmt;
use std::time::Instant;

use sextant_action::resolver::CallbackResolver;
use sextant_action::{Action, CallbackEvent, Completion, Exception, Halt};

use crate::descriptor::ActionType;
use crate::executor::{ExceptionContext, ExecutorConfig};
use crate::field::redact;
use crate::hooks::Pipeline;

/// The classification of a finished execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The pipeline completed, normally or early.
    Success,
    /// The action signaled a business failure.
    Failure,
    /// An unexpected error escaped the pipeline.
    Exception,
}

impl Outcome {
    /// Returns `true` for [`Outcome::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    /// Returns the outcome name used in logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
            Outcome::Exception => "exception",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Execution
// ─────────────────────────────────────────────────────────────────────────────

/// State of one in-flight execution.
#[derive(Debug)]
pub struct Execution {
    id: String,
    action: Action,
    outcome: Outcome,
    exception: Option<Exception>,
    completion: Option<Completion>,
    started: Instant,
}

impl Execution {
    /// Starts tracking an execution of `action`.
    #[must_use]
    pub fn new(id: impl Into<String>, action: Action) -> Self {
        Self {
            id: id.into(),
            action,
            outcome: Outcome::Success,
            exception: None,
            completion: None,
            started: Instant::now(),
        }
    }

    /// Returns the execution id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the action instance.
    #[must_use]
    pub fn action(&self) -> &Action {
        &self.action
    }

    /// Returns the action instance mutably.
    pub fn action_mut(&mut self) -> &mut Action {
        &mut self.action
    }

    /// Returns the recorded outcome.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Returns the triggering exception, if the outcome is not a success.
    #[must_use]
    pub fn exception(&self) -> Option<&Exception> {
        self.exception.as_ref()
    }

    /// Returns the early completion signal, if the pipeline completed early.
    #[must_use]
    pub fn completion(&self) -> Option<&Completion> {
        self.completion.as_ref()
    }

    /// Returns when the execution started.
    #[must_use]
    pub fn started(&self) -> Instant {
        self.started
    }

    /// Records a non-success outcome.
    pub(crate) fn record(&mut self, outcome: Outcome, exception: Exception) {
        self.outcome = outcome;
        self.exception = Some(exception);
    }

    /// Consumes the execution and returns the action instance.
    #[must_use]
    pub fn into_action(self) -> Action {
        self.action
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// OutcomeClassifier
// ─────────────────────────────────────────────────────────────────────────────

/// Runs a pipeline, classifies how it ended, and dispatches callbacks.
#[derive(Debug, Clone, Copy)]
pub struct OutcomeClassifier<'a> {
    action_type: &'a ActionType,
    config: &'a ExecutorConfig,
}

impl<'a> OutcomeClassifier<'a> {
    /// Creates a classifier for executions of `action_type`.
    #[must_use]
    pub fn new(action_type: &'a ActionType, config: &'a ExecutorConfig) -> Self {
        Self {
            action_type,
            config,
        }
    }

    /// Runs `pipeline` and records the outcome on `execution`.
    ///
    /// # Errors
    ///
    /// Returns the [`Completion`] if the pipeline completed early. Nothing has
    /// been recorded or dispatched for it yet; pass it to
    /// [`complete`](Self::complete) to finish the execution as a success.
    pub fn run(&self, pipeline: &Pipeline, execution: &mut Execution) -> Result<(), Completion> {
        match pipeline.run(&mut execution.action) {
            Ok(()) => {
                self.succeed(execution);
                Ok(())
            }
            Err(Halt::Complete(completion)) => Err(completion),
            Err(Halt::Fail(failure)) => {
                execution.record(Outcome::Failure, Exception::new(failure));
                self.dispatch_failure(execution);
                Ok(())
            }
            // A `Failure` wrapped directly in `Halt::Error` is still a business failure.
            Err(Halt::Error(exception)) if exception.is_failure() => {
                execution.record(Outcome::Failure, exception);
                self.dispatch_failure(execution);
                Ok(())
            }
            Err(Halt::Error(exception)) => {
                execution.record(Outcome::Exception, exception);
                self.dispatch_exception(execution);
                Ok(())
            }
        }
    }

    /// Finishes an early-completed execution as a success.
    pub fn complete(&self, execution: &mut Execution, completion: Completion) {
        tracing::debug!(
            action = %self.action_type.name(),
            completion = completion.message(),
            "pipeline completed early"
        );
        execution.completion = Some(completion);
        self.succeed(execution);
    }

    fn succeed(&self, execution: &mut Execution) {
        execution.outcome = Outcome::Success;
        self.dispatch(CallbackEvent::Success, execution);
    }

    fn dispatch_failure(&self, execution: &mut Execution) {
        self.dispatch(CallbackEvent::Error, execution);
        self.dispatch(CallbackEvent::Failure, execution);
    }

    fn dispatch_exception(&self, execution: &mut Execution) {
        self.dispatch(CallbackEvent::Error, execution);
        self.dispatch(CallbackEvent::Exception, execution);
        self.notify_global_hook(execution);
    }

    fn dispatch(&self, event: CallbackEvent, execution: &mut Execution) {
        let entries = self.action_type.callback_entries(event);
        if entries.is_empty() {
            return;
        }
        CallbackResolver::new(event, &entries)
            .execute(&mut execution.action, execution.exception.as_ref());
    }

    fn notify_global_hook(&self, execution: &Execution) {
        let (Some(hook), Some(exception)) = (self.config.exception_hook(), &execution.exception)
        else {
            return;
        };
        let context = ExceptionContext {
            execution_id: execution.id.clone(),
            action_name: self.action_type.name().to_owned(),
            inputs: redact(execution.action.inputs(), &self.action_type.expected_fields()),
        };
        if let Err(error) = hook(exception, &execution.action, &context) {
            tracing::warn!(
                action = %self.action_type.name(),
                operation = "global exception hook",
                error = %error,
                "global exception hook raised; ignoring"
            );
        }
    }
}
