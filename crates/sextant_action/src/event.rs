//! Event types keying the message and callback registries.

use core::fmt;

/// Events that callback handlers can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackEvent {
    /// An unexpected exception escaped the pipeline.
    Exception,
    /// The action signaled a business failure.
    Failure,
    /// Any non-success outcome.
    Error,
    /// The pipeline completed successfully.
    Success,
}

impl CallbackEvent {
    /// Returns the event name used in logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CallbackEvent::Exception => "exception",
            CallbackEvent::Failure => "failure",
            CallbackEvent::Error => "error",
            CallbackEvent::Success => "success",
        }
    }
}

impl fmt::Display for CallbackEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events that message providers are registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageEvent {
    /// Message shown when the action succeeds.
    Success,
    /// Message shown when the action fails for any reason.
    Error,
}

impl MessageEvent {
    /// Fixed message used when no registered provider yields one.
    #[must_use]
    pub fn fallback(&self) -> &'static str {
        match self {
            MessageEvent::Success => "Action completed successfully",
            MessageEvent::Error => "Something went wrong",
        }
    }

    /// Returns the event name used in logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageEvent::Success => "success",
            MessageEvent::Error => "error",
        }
    }
}

impl fmt::Display for MessageEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
