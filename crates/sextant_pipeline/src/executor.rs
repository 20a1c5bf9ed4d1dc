//! Action execution engine.
//!
//! [`ActionExecutor`] runs one action type against validated inputs:
//!
//! 1. snapshot the composed [`Pipeline`](crate::hooks::Pipeline)
//! 2. run it inside the [`OutcomeClassifier`], which dispatches callbacks
//! 3. resolve the success or error message
//! 4. build the [`ActionResult`]
//!
//! Business failures and unexpected errors are returned as data inside the
//! result; `run` itself never fails.
//!
//! # Configuration
//!
//! Process-wide behavior (the global exception hook, log level, fallback
//! messages) is injected through [`ExecutorConfig`] when the executor is
//! built and is read-only afterwards.
//!
//! # Example
//!
//! ```
//! use sextant_pipeline::descriptor::ActionType;
//! use sextant_pipeline::executor::ActionExecutor;
//! use sextant_action::{Fields, Halt};
//!
//! let reserve = ActionType::builder("ReserveStock")
//!     .declare(|d| {
//!         d.call(|action| {
//!             let quantity: u32 = action.input_as("quantity")?;
//!             if quantity > 3 {
//!                 return Err(Halt::fail("Not enough stock"));
//!             }
//!             Ok(())
//!         });
//!     })
//!     .build();
//!
//! let mut inputs = Fields::new();
//! inputs.insert("quantity".into(), 5.into());
//!
//! let result = ActionExecutor::new().run(&reserve, inputs);
//! assert!(!result.is_ok());
//! assert_eq!(result.message(), "Not enough stock");
//! ```

use core::fmt;
use std::sync::Arc;

use sextant_action::error::BoxError;
use sextant_action::invoker::is_present;
use sextant_action::resolver::MessageResolver;
use sextant_action::{Action, Completion, Exception, Fields, MessageEvent};
use tracing::Level;

use crate::descriptor::ActionType;
use crate::field::redact;
use crate::outcome::{Execution, Outcome, OutcomeClassifier};
use crate::result::ActionResult;

/// Global hook invoked once per execution that ends in an unexpected error.
pub type ExceptionHook =
    Arc<dyn Fn(&Exception, &Action, &ExceptionContext) -> Result<(), BoxError> + Send + Sync>;

/// Context handed to the global exception hook.
#[derive(Debug, Clone)]
pub struct ExceptionContext {
    /// Id of the failing execution.
    pub execution_id: String,
    /// Name of the failing action type.
    pub action_name: String,
    /// The execution's inputs, with sensitive values filtered.
    pub inputs: Fields,
}

// ─────────────────────────────────────────────────────────────────────────────
// ExecutorConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration injected into an [`ActionExecutor`].
#[derive(Clone)]
pub struct ExecutorConfig {
    on_exception: Option<ExceptionHook>,
    log_level: Option<Level>,
    success_fallback: String,
    error_fallback: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            on_exception: None,
            log_level: Some(Level::INFO),
            success_fallback: MessageEvent::Success.fallback().to_owned(),
            error_fallback: MessageEvent::Error.fallback().to_owned(),
        }
    }
}

impl ExecutorConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the global exception hook.
    ///
    /// The hook runs after the type's own `exception` callbacks. Errors it
    /// returns are logged and ignored.
    #[must_use]
    pub fn with_exception_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Exception, &Action, &ExceptionContext) -> Result<(), BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.on_exception = Some(Arc::new(hook));
        self
    }

    /// Sets the level of the start and finish log lines.
    #[must_use]
    pub fn with_log_level(mut self, level: Level) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Disables the start and finish log lines.
    #[must_use]
    pub fn without_logging(mut self) -> Self {
        self.log_level = None;
        self
    }

    /// Sets the success message used when no provider yields one.
    #[must_use]
    pub fn with_success_fallback(mut self, message: impl Into<String>) -> Self {
        self.success_fallback = message.into();
        self
    }

    /// Sets the error message used when no provider yields one.
    #[must_use]
    pub fn with_error_fallback(mut self, message: impl Into<String>) -> Self {
        self.error_fallback = message.into();
        self
    }

    /// Returns the global exception hook.
    #[must_use]
    pub fn exception_hook(&self) -> Option<&ExceptionHook> {
        self.on_exception.as_ref()
    }

    /// Returns the start and finish log level, if enabled.
    #[must_use]
    pub fn log_level(&self) -> Option<Level> {
        self.log_level
    }

    /// Returns the fallback message for `event`.
    #[must_use]
    pub fn fallback(&self, event: MessageEvent) -> &str {
        match event {
            MessageEvent::Success => &self.success_fallback,
            MessageEvent::Error => &self.error_fallback,
        }
    }
}

impl fmt::Debug for ExecutorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorConfig")
            .field("on_exception", &self.on_exception.is_some())
            .field("log_level", &self.log_level)
            .field("success_fallback", &self.success_fallback)
            .field("error_fallback", &self.error_fallback)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ActionExecutor
// ─────────────────────────────────────────────────────────────────────────────

/// Runs actions and builds their results.
#[derive(Debug, Clone, Default)]
pub struct ActionExecutor {
    config: ExecutorConfig,
}

/// Emits an event at a level chosen at runtime.
macro_rules! event_at {
    ($level:expr, $($arg:tt)+) => {{
        let level: Level = $level;
        if level == Level::ERROR {
            tracing::error!($($arg)+);
        } else if level == Level::WARN {
            tracing::warn!($($arg)+);
        } else if level == Level::INFO {
            tracing::info!($($arg)+);
        } else if level == Level::DEBUG {
            tracing::debug!($($arg)+);
        } else {
            tracing::trace!($($arg)+);
        }
    }};
}

impl ActionExecutor {
    /// Creates an executor with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an executor with the given configuration.
    #[must_use]
    pub fn with_config(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// Returns the executor's configuration.
    #[must_use]
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Runs `action_type` with already-validated inputs.
    ///
    /// Always returns a result; failures are recorded in it.
    pub fn run(&self, action_type: &Arc<ActionType>, inputs: Fields) -> ActionResult {
        let id = nanoid::nanoid!();
        let span = tracing::info_span!("action", action = %action_type.name(), execution_id = %id);
        let _enter = span.enter();

        let pipeline = action_type.pipeline();
        let expected = action_type.expected_fields();
        if let Some(level) = self.config.log_level {
            event_at!(
                level,
                inputs = %serde_json::Value::Object(redact(&inputs, &expected)),
                "action started"
            );
        }

        let mut execution = Execution::new(id, action_type.instantiate(inputs));
        let classifier = OutcomeClassifier::new(action_type, &self.config);
        if let Err(completion) = classifier.run(&pipeline, &mut execution) {
            classifier.complete(&mut execution, completion);
        }

        let result = self.finish(action_type, execution);
        self.log_finish(&result);
        result
    }

    /// Builds the result for inputs that failed validation.
    ///
    /// The pipeline is not entered: no hooks or callbacks run and the global
    /// exception hook is not called. Only the error message is resolved.
    pub fn reject(
        &self,
        action_type: &Arc<ActionType>,
        inputs: Fields,
        exception: Exception,
    ) -> ActionResult {
        let id = nanoid::nanoid!();
        let span = tracing::info_span!("action", action = %action_type.name(), execution_id = %id);
        let _enter = span.enter();

        let outcome = if exception.is_failure() {
            Outcome::Failure
        } else {
            Outcome::Exception
        };
        let mut action = action_type.instantiate(inputs);
        let message = self.error_message(action_type, &mut action, &exception);
        let result = ActionResult::new(
            action_type.name(),
            id,
            outcome,
            message,
            Some(exception),
            action_type.exposed_fields(),
            action.outputs(),
            core::time::Duration::ZERO,
        );
        self.log_finish(&result);
        result
    }

    fn finish(&self, action_type: &ActionType, mut execution: Execution) -> ActionResult {
        let elapsed = execution.started().elapsed();
        let outcome = execution.outcome();
        let exception = execution.exception().cloned();

        let completion_message = execution
            .completion()
            .and_then(Completion::message)
            .filter(|message| is_present(message))
            .map(str::to_owned);
        let message = match (&exception, completion_message) {
            (Some(exception), _) => {
                self.error_message(action_type, execution.action_mut(), exception)
            }
            (None, Some(message)) => message,
            (None, None) => self.success_message(action_type, execution.action_mut()),
        };

        let id = execution.id().to_owned();
        let action = execution.into_action();
        ActionResult::new(
            action_type.name(),
            id,
            outcome,
            message,
            exception,
            action_type.exposed_fields(),
            action.outputs(),
            elapsed,
        )
    }

    fn success_message(&self, action_type: &ActionType, action: &mut Action) -> String {
        let entries = action_type.message_entries(MessageEvent::Success);
        MessageResolver::new(MessageEvent::Success, &entries)
            .with_fallback(self.config.fallback(MessageEvent::Success))
            .resolve_message(action, None)
    }

    /// Registered providers first, then the business failure's own message,
    /// then the configured fallback.
    fn error_message(
        &self,
        action_type: &ActionType,
        action: &mut Action,
        exception: &Exception,
    ) -> String {
        let entries = action_type.message_entries(MessageEvent::Error);
        let resolver = MessageResolver::new(MessageEvent::Error, &entries);
        if let Some(message) = resolver.find_message(action, Some(exception)) {
            return message;
        }
        match exception.failure() {
            Some(failure) if is_present(failure.message()) => failure.message().to_owned(),
            _ => self.config.fallback(MessageEvent::Error).to_owned(),
        }
    }

    fn log_finish(&self, result: &ActionResult) {
        let Some(level) = self.config.log_level else {
            return;
        };
        let elapsed_ms = result.elapsed().as_secs_f64() * 1000.0;
        match result.exception() {
            Some(exception) => event_at!(
                level,
                outcome = %result.outcome(),
                elapsed_ms,
                error = %exception,
                "action finished"
            ),
            None => event_at!(
                level,
                outcome = %result.outcome(),
                elapsed_ms,
                "action finished"
            ),
        }
    }
}
