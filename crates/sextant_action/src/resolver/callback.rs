use std::sync::Arc;

use crate::action::Action;
use crate::error::Exception;
use crate::event::CallbackEvent;
use crate::invoker::Invoker;
use crate::registry::CallbackEntry;

/// Runs every matching callback for one [`CallbackEvent`].
#[derive(Debug, Clone, Copy)]
pub struct CallbackResolver<'a> {
    event: CallbackEvent,
    entries: &'a [Arc<CallbackEntry>],
}

impl<'a> CallbackResolver<'a> {
    /// Creates a resolver over `entries`, most recent first.
    #[must_use]
    pub fn new(event: CallbackEvent, entries: &'a [Arc<CallbackEntry>]) -> Self {
        Self { event, entries }
    }

    /// Runs each matching callback in order and returns how many ran.
    ///
    /// A callback that halts is logged and the remaining callbacks still run.
    pub fn execute(&self, action: &mut Action, exception: Option<&Exception>) -> usize {
        let operation = format!("{} callback", self.event);
        let mut ran = 0;
        for entry in self.entries {
            let applies = match &entry.matcher {
                Some(matcher) => matcher.matches(action, exception),
                None => true,
            };
            if applies {
                Invoker::call(action, &entry.handler, exception, &operation);
                ran += 1;
            }
        }
        tracing::debug!(action = %action.name(), event = %self.event, ran, "callbacks dispatched");
        ran
    }
}
