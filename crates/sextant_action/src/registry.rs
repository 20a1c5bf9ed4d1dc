//! Immutable, event-keyed handler storage.
//!
//! A [`Registry`] is never mutated in place. [`register`](Registry::register)
//! returns a new registry with the entry prepended to its event's list, so a
//! registry shared with a running execution is never observed half-updated.
//! Lists are stored most-recent-first.

use core::fmt;
use core::hash::Hash;
use std::sync::Arc;

use hashbrown::HashMap;

use crate::handler::Handler;
use crate::matcher::Matcher;

/// Copy-on-write map from event to an ordered list of entries.
pub struct Registry<K, T> {
    entries: HashMap<K, Arc<[Arc<T>]>>,
}

impl<K, T> Registry<K, T>
where
    K: Copy + Eq + Hash,
{
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Returns a new registry with `entry` at the front of `event`'s list.
    ///
    /// `self` is left unchanged.
    #[must_use]
    pub fn register(&self, event: K, entry: T) -> Self {
        self.register_shared(event, Arc::new(entry))
    }

    fn register_shared(&self, event: K, entry: Arc<T>) -> Self {
        let mut entries = self.entries.clone();
        let list: Arc<[Arc<T>]> = match self.entries.get(&event) {
            Some(existing) => core::iter::once(entry)
                .chain(existing.iter().cloned())
                .collect(),
            None => Arc::from([entry]),
        };
        entries.insert(event, list);
        Self { entries }
    }

    /// Returns a new registry holding `other`'s entries on top of this one's.
    ///
    /// The result is as if every entry of `other` had been registered after
    /// every entry of `self`, in `other`'s own registration order.
    #[must_use]
    pub fn register_all(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        for (event, list) in &other.entries {
            // Lists are newest-first; replay oldest-first to keep their order.
            for entry in list.iter().rev() {
                merged = merged.register_shared(*event, Arc::clone(entry));
            }
        }
        merged
    }

    /// Returns `event`'s entries, most recent first.
    ///
    /// An event with no entries yields an empty slice.
    #[must_use]
    pub fn for_event(&self, event: K) -> &[Arc<T>] {
        match self.entries.get(&event) {
            Some(list) => &list[..],
            None => &[],
        }
    }

    /// Returns `true` if no entries are registered for any event.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, T> Clone for Registry<K, T>
where
    K: Clone,
{
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<K, T> Default for Registry<K, T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K, T> fmt::Debug for Registry<K, T>
where
    K: fmt::Debug,
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Entries
// ─────────────────────────────────────────────────────────────────────────────

/// A message provider registered for a [`MessageEvent`](crate::MessageEvent).
///
/// An entry with a prefix and no handler is *prefix-only*: the body comes
/// from the exception or from the default message.
#[derive(Debug, Clone)]
pub struct MessageEntry {
    /// Condition under which the entry applies; `None` means always.
    pub matcher: Option<Matcher>,
    /// Produces the message body.
    pub handler: Option<Handler>,
    /// Produces text placed before the body.
    pub prefix: Option<Handler>,
}

impl MessageEntry {
    /// An entry that always applies and produces its body with `handler`.
    #[must_use]
    pub fn new(handler: impl Into<Handler>) -> Self {
        Self {
            matcher: None,
            handler: Some(handler.into()),
            prefix: None,
        }
    }

    /// An entry with only a prefix.
    #[must_use]
    pub fn prefix_only(prefix: impl Into<Handler>) -> Self {
        Self {
            matcher: None,
            handler: None,
            prefix: Some(prefix.into()),
        }
    }

    /// Restricts the entry to executions where `matcher` applies.
    #[must_use]
    pub fn when(mut self, matcher: Matcher) -> Self {
        self.matcher = Some(matcher);
        self
    }

    /// Adds a prefix to the entry.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<Handler>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Returns `true` if the entry has no matcher.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.matcher.is_none()
    }
}

/// A callback registered for a [`CallbackEvent`](crate::CallbackEvent).
#[derive(Debug, Clone)]
pub struct CallbackEntry {
    /// Condition under which the callback runs; `None` means always.
    pub matcher: Option<Matcher>,
    /// The callback itself.
    pub handler: Handler,
}

impl CallbackEntry {
    /// A callback that always runs.
    #[must_use]
    pub fn new(handler: impl Into<Handler>) -> Self {
        Self {
            matcher: None,
            handler: handler.into(),
        }
    }

    /// Restricts the callback to executions where `matcher` applies.
    #[must_use]
    pub fn when(mut self, matcher: Matcher) -> Self {
        self.matcher = Some(matcher);
        self
    }
}
