use std::sync::Arc;

use crate::action::Action;
use crate::error::Exception;
use crate::event::MessageEvent;
use crate::handler::Handler;
use crate::invoker::{Invoker, is_present, value_to_text};
use crate::registry::MessageEntry;

/// Finds the user-facing message for one [`MessageEvent`].
///
/// For each matching entry the body is computed as follows:
///
/// 1. the entry's handler, when it has one;
/// 2. otherwise the triggering exception's message;
/// 3. otherwise the *default* message, searched among the other static
///    entries that carry a handler.
///
/// A prefix is prepended when the entry has one and a body was found. The
/// first non-blank result wins.
#[derive(Debug, Clone, Copy)]
pub struct MessageResolver<'a> {
    event: MessageEvent,
    entries: &'a [Arc<MessageEntry>],
    fallback: &'a str,
}

impl<'a> MessageResolver<'a> {
    /// Creates a resolver over `entries`, most recent first.
    #[must_use]
    pub fn new(event: MessageEvent, entries: &'a [Arc<MessageEntry>]) -> Self {
        Self {
            event,
            entries,
            fallback: event.fallback(),
        }
    }

    /// Replaces the fixed text returned when nothing matches.
    #[must_use]
    pub fn with_fallback(mut self, fallback: &'a str) -> Self {
        self.fallback = fallback;
        self
    }

    /// Returns the resolved message, or the fallback if no entry yields one.
    pub fn resolve_message(&self, action: &mut Action, exception: Option<&Exception>) -> String {
        match self.find_message(action, exception) {
            Some(message) => message,
            None => {
                tracing::debug!(
                    action = %action.name(),
                    event = %self.event,
                    "no message provider matched; using fallback"
                );
                self.fallback.to_owned()
            }
        }
    }

    /// Returns the first non-blank message from a matching entry.
    pub fn find_message(
        &self,
        action: &mut Action,
        exception: Option<&Exception>,
    ) -> Option<String> {
        for (index, entry) in self.entries.iter().enumerate() {
            let applies = match &entry.matcher {
                Some(matcher) => matcher.matches(action, exception),
                None => true,
            };
            if !applies {
                continue;
            }
            if let Some(message) = self.compose(index, entry, action, exception) {
                return Some(message);
            }
        }
        None
    }

    /// Returns the baseline message from static entries with a handler.
    ///
    /// Conditional entries and prefix-only entries are ignored, so the result
    /// does not depend on which business failure triggered the error.
    pub fn resolve_default_message(
        &self,
        action: &mut Action,
        exception: Option<&Exception>,
    ) -> Option<String> {
        self.default_message(None, action, exception)
    }

    fn default_message(
        &self,
        exclude: Option<usize>,
        action: &mut Action,
        exception: Option<&Exception>,
    ) -> Option<String> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(index, entry)| {
                Some(*index) != exclude && entry.is_static() && entry.handler.is_some()
            })
            .find_map(|(index, entry)| self.compose(index, entry, action, exception))
    }

    fn compose(
        &self,
        index: usize,
        entry: &MessageEntry,
        action: &mut Action,
        exception: Option<&Exception>,
    ) -> Option<String> {
        let body = match (&entry.handler, exception) {
            (Some(handler), _) => self.text(action, handler, exception, "message"),
            (None, Some(exception)) => Some(exception.message()),
            // Only entries with a handler are searched here, so this cannot recurse.
            (None, None) => self.default_message(Some(index), action, exception),
        }
        .filter(|body| is_present(body))?;

        let message = match &entry.prefix {
            Some(prefix) => match self.text(action, prefix, exception, "message prefix") {
                Some(prefix) => format!("{prefix}{body}"),
                None => body,
            },
            None => body,
        };
        Some(message)
    }

    fn text(
        &self,
        action: &mut Action,
        handler: &Handler,
        exception: Option<&Exception>,
        what: &str,
    ) -> Option<String> {
        let operation = format!("{} {what}", self.event);
        Invoker::call(action, handler, exception, &operation).and_then(value_to_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Fields;
    use crate::error::{Failure, Halt};
    use crate::handler::{Method, MethodTable};
    use crate::matcher::Matcher;
    use crate::registry::Registry;

    fn sample() -> Action {
        let mut table = MethodTable::new();
        table.insert("vip", Method::niladic(|_| Ok(true)));
        table.insert("salutation", Method::niladic(|_| Ok("Dear customer, ")));
        Action::with_table("Sample", table, Fields::new())
    }

    fn resolve(
        registry: &Registry<MessageEvent, MessageEntry>,
        event: MessageEvent,
        exception: Option<&Exception>,
    ) -> String {
        let mut action = sample();
        MessageResolver::new(event, registry.for_event(event))
            .resolve_message(&mut action, exception)
    }

    #[test]
    fn falls_back_per_event() {
        let registry = Registry::new();

        assert_eq!(
            resolve(&registry, MessageEvent::Success, None),
            "Action completed successfully"
        );
        assert_eq!(resolve(&registry, MessageEvent::Error, None), "Something went wrong");
    }

    #[test]
    fn custom_fallback() {
        let registry: Registry<MessageEvent, MessageEntry> = Registry::new();
        let mut action = sample();

        let message =
            MessageResolver::new(MessageEvent::Error, registry.for_event(MessageEvent::Error))
                .with_fallback("Try again later")
                .resolve_message(&mut action, None);

        assert_eq!(message, "Try again later");
    }

    #[test]
    fn most_recent_matching_entry_wins() {
        let registry = Registry::new()
            .register(MessageEvent::Success, MessageEntry::new("first"))
            .register(MessageEvent::Success, MessageEntry::new("second"));

        assert_eq!(resolve(&registry, MessageEvent::Success, None), "second");
    }

    #[test]
    fn non_matching_and_blank_entries_are_skipped() {
        let registry = Registry::new()
            .register(MessageEvent::Success, MessageEntry::new("static"))
            .register(MessageEvent::Success, MessageEntry::new("   "))
            .register(
                MessageEvent::Success,
                MessageEntry::new("never").when(Matcher::not(Matcher::method("vip"))),
            );

        assert_eq!(resolve(&registry, MessageEvent::Success, None), "static");
    }

    #[test]
    fn failing_handler_is_skipped() {
        let registry = Registry::new()
            .register(MessageEvent::Error, MessageEntry::new("Please retry"))
            .register(
                MessageEvent::Error,
                MessageEntry::new(Handler::niladic(|_| Err::<(), _>(Halt::msg("bug")))),
            );

        assert_eq!(resolve(&registry, MessageEvent::Error, None), "Please retry");
    }

    #[test]
    fn handler_sees_exception() {
        let registry = Registry::new().register(
            MessageEvent::Error,
            MessageEntry::new(Handler::positional(|_, e: Option<&Exception>| {
                Ok(e.map(|e| format!("Out of: {e}")))
            })),
        );
        let exception = Exception::new(Failure::new("no stock"));

        assert_eq!(
            resolve(&registry, MessageEvent::Error, Some(&exception)),
            "Out of: no stock"
        );
    }

    #[test]
    fn error_type_matcher_selects_entry() {
        #[derive(Debug, thiserror::Error)]
        #[error("gateway timed out")]
        struct Timeout;

        let registry = Registry::new()
            .register(MessageEvent::Error, MessageEntry::new("Generic"))
            .register(
                MessageEvent::Error,
                MessageEntry::new("Payment provider is slow").when(Matcher::error::<Timeout>()),
            );

        let timeout = Exception::new(Timeout);
        let other = Exception::msg("boom");

        assert_eq!(
            resolve(&registry, MessageEvent::Error, Some(&timeout)),
            "Payment provider is slow"
        );
        assert_eq!(resolve(&registry, MessageEvent::Error, Some(&other)), "Generic");
    }

    #[test]
    fn prefix_composes_with_handler_body() {
        let registry = Registry::new().register(
            MessageEvent::Success,
            MessageEntry::new("your order shipped").with_prefix(Handler::method("salutation")),
        );

        assert_eq!(
            resolve(&registry, MessageEvent::Success, None),
            "Dear customer, your order shipped"
        );
    }

    #[test]
    fn prefix_only_uses_exception_message() {
        let registry = Registry::new()
            .register(MessageEvent::Error, MessageEntry::prefix_only("Checkout failed: "));
        let exception = Exception::new(Failure::new("card declined"));

        assert_eq!(
            resolve(&registry, MessageEvent::Error, Some(&exception)),
            "Checkout failed: card declined"
        );
    }

    #[test]
    fn prefix_only_uses_default_message_without_exception() {
        let registry = Registry::new()
            .register(MessageEvent::Success, MessageEntry::new("Order placed"))
            .register(MessageEvent::Success, MessageEntry::prefix_only("Thanks! "));

        assert_eq!(resolve(&registry, MessageEvent::Success, None), "Thanks! Order placed");
    }

    #[test]
    fn prefix_only_without_any_body_yields_nothing() {
        let registry = Registry::new()
            .register(MessageEvent::Success, MessageEntry::prefix_only("A: "))
            .register(MessageEvent::Success, MessageEntry::prefix_only("B: "));
        let mut action = sample();

        let resolver =
            MessageResolver::new(MessageEvent::Success, registry.for_event(MessageEvent::Success));

        assert_eq!(resolver.find_message(&mut action, None), None);
        assert_eq!(
            resolver.resolve_message(&mut action, None),
            "Action completed successfully"
        );
    }

    #[test]
    fn default_message_ignores_conditional_entries() {
        let registry = Registry::new()
            .register(MessageEvent::Error, MessageEntry::new("Baseline"))
            .register(
                MessageEvent::Error,
                MessageEntry::new("Conditional").when(Matcher::method("vip")),
            );
        let mut action = sample();

        let resolver =
            MessageResolver::new(MessageEvent::Error, registry.for_event(MessageEvent::Error));

        assert_eq!(resolver.resolve_message(&mut action, None), "Conditional");
        assert_eq!(
            resolver.resolve_default_message(&mut action, None).as_deref(),
            Some("Baseline")
        );
    }

    #[test]
    fn non_string_values_are_rendered() {
        let entry = MessageEntry::new(Handler::literal(42));
        let registry = Registry::new().register(MessageEvent::Success, entry);

        assert_eq!(resolve(&registry, MessageEvent::Success, None), "42");
    }
}
