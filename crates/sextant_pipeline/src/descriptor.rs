//! Action type descriptors.
//!
//! An [`ActionType`] is a node in a type tree. Each node holds only what was
//! declared on it locally; everything inherited is resolved by walking the
//! tree whenever it is needed. That keeps resolution late-bound: a hook or
//! handler declared on an ancestor after a subtype was built is still seen by
//! the subtype's next execution.
//!
//! # Resolution Order
//!
//! | What | Order |
//! |------|-------|
//! | hooks | oldest ancestor first, declaration order within a type |
//! | messages, callbacks | most-derived type first, most recent first within a type |
//! | methods, body | most-derived declaration wins |
//! | fields | oldest ancestor first; a redeclaration replaces the earlier one |
//!
//! # Example
//!
//! ```
//! use sextant_pipeline::descriptor::ActionType;
//! use sextant_pipeline::field::Field;
//!
//! let base = ActionType::builder("Base")
//!     .declare(|d| {
//!         d.before(|action| action.expose("audited", true))
//!             .error_message("Something went wrong, please retry");
//!     })
//!     .build();
//!
//! let checkout = ActionType::builder("Checkout")
//!     .parent(&base)
//!     .declare(|d| {
//!         d.expects(Field::new("card").sensitive())
//!             .exposes(Field::new("order_id"))
//!             .call(|action| action.expose("order_id", 7));
//!     })
//!     .build();
//!
//! assert_eq!(checkout.ancestry().len(), 2);
//! ```

use core::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use sextant_action::handler::{Handler, Method, MethodTable, Next};
use sextant_action::matcher::Matcher;
use sextant_action::registry::{CallbackEntry, MessageEntry, Registry};
use sextant_action::{Action, CallbackEvent, Fields, Halt, MessageEvent, MethodLookup};

use crate::field::{self, Field};
use crate::hooks::{Body, Hook, HookKind, HookSource, Pipeline};

// ─────────────────────────────────────────────────────────────────────────────
// Declarations
// ─────────────────────────────────────────────────────────────────────────────

/// Everything declared locally on one action type or extension.
///
/// Declaration methods return `&mut Self` so they can be chained.
#[derive(Clone, Default)]
pub struct Declarations {
    body: Option<Body>,
    hooks: Vec<Hook>,
    methods: MethodTable,
    messages: Registry<MessageEvent, MessageEntry>,
    callbacks: Registry<CallbackEvent, CallbackEntry>,
    expects: Vec<Field>,
    exposes: Vec<Field>,
}

impl Declarations {
    /// Creates empty declarations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the action body, replacing any earlier one.
    pub fn call<F>(&mut self, body: F) -> &mut Self
    where
        F: Fn(&mut Action) -> Result<(), Halt> + Send + Sync + 'static,
    {
        self.body = Some(Arc::new(body));
        self
    }

    // ── Hooks ────────────────────────────────────────────────────────────────

    /// Registers a hook from a method reference, a callable, or both.
    ///
    /// When both are given the method runs first.
    pub fn register_hook(
        &mut self,
        kind: HookKind,
        method: Option<&str>,
        callable: Option<HookSource>,
    ) -> &mut Self {
        if let Some(name) = method {
            self.hooks.push(Hook::new(kind, HookSource::method(name)));
        }
        if let Some(source) = callable {
            self.hooks.push(Hook::new(kind, source));
        }
        self
    }

    /// Runs `f` before the body.
    pub fn before<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut Action) -> Result<(), Halt> + Send + Sync + 'static,
    {
        self.register_hook(HookKind::Before, None, Some(HookSource::step(f)))
    }

    /// Runs `f` after the body.
    pub fn after<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut Action) -> Result<(), Halt> + Send + Sync + 'static,
    {
        self.register_hook(HookKind::After, None, Some(HookSource::step(f)))
    }

    /// Wraps the rest of the pipeline with `f`.
    pub fn around<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut Action, Next<'_>) -> Result<(), Halt> + Send + Sync + 'static,
    {
        self.register_hook(HookKind::Around, None, Some(HookSource::wrap(f)))
    }

    /// Runs the named method before the body.
    pub fn before_method(&mut self, name: &str) -> &mut Self {
        self.register_hook(HookKind::Before, Some(name), None)
    }

    /// Runs the named method after the body.
    pub fn after_method(&mut self, name: &str) -> &mut Self {
        self.register_hook(HookKind::After, Some(name), None)
    }

    /// Wraps the rest of the pipeline with the named method.
    pub fn around_method(&mut self, name: &str) -> &mut Self {
        self.register_hook(HookKind::Around, Some(name), None)
    }

    // ── Methods ──────────────────────────────────────────────────────────────

    /// Declares a named method.
    pub fn method(&mut self, name: &str, method: Method) -> &mut Self {
        self.methods.insert(name, method);
        self
    }

    // ── Messages ─────────────────────────────────────────────────────────────

    /// Registers a message entry.
    pub fn message(&mut self, event: MessageEvent, entry: MessageEntry) -> &mut Self {
        self.messages = self.messages.register(event, entry);
        self
    }

    /// Registers an unconditional success message.
    pub fn success_message(&mut self, handler: impl Into<Handler>) -> &mut Self {
        self.message(MessageEvent::Success, MessageEntry::new(handler))
    }

    /// Registers an unconditional error message.
    pub fn error_message(&mut self, handler: impl Into<Handler>) -> &mut Self {
        self.message(MessageEvent::Error, MessageEntry::new(handler))
    }

    // ── Callbacks ────────────────────────────────────────────────────────────

    /// Registers a callback entry.
    pub fn callback(&mut self, event: CallbackEvent, entry: CallbackEntry) -> &mut Self {
        self.callbacks = self.callbacks.register(event, entry);
        self
    }

    /// Runs `handler` after a successful execution.
    pub fn on_success(&mut self, handler: impl Into<Handler>) -> &mut Self {
        self.callback(CallbackEvent::Success, CallbackEntry::new(handler))
    }

    /// Runs `handler` after any unsuccessful execution.
    pub fn on_error(&mut self, handler: impl Into<Handler>) -> &mut Self {
        self.callback(CallbackEvent::Error, CallbackEntry::new(handler))
    }

    /// Runs `handler` after a business failure.
    pub fn on_failure(&mut self, handler: impl Into<Handler>) -> &mut Self {
        self.callback(CallbackEvent::Failure, CallbackEntry::new(handler))
    }

    /// Runs `handler` after an unexpected exception.
    pub fn on_exception(&mut self, handler: impl Into<Handler>) -> &mut Self {
        self.callback(CallbackEvent::Exception, CallbackEntry::new(handler))
    }

    /// Runs `handler` after an unexpected exception that `matcher` accepts.
    pub fn on_exception_when(
        &mut self,
        matcher: Matcher,
        handler: impl Into<Handler>,
    ) -> &mut Self {
        self.callback(
            CallbackEvent::Exception,
            CallbackEntry::new(handler).when(matcher),
        )
    }

    // ── Fields ───────────────────────────────────────────────────────────────

    /// Declares an expected input.
    pub fn expects(&mut self, field: impl Into<Field>) -> &mut Self {
        field::declare(&mut self.expects, field.into());
        self
    }

    /// Declares an exposed output.
    pub fn exposes(&mut self, field: impl Into<Field>) -> &mut Self {
        field::declare(&mut self.exposes, field.into());
        self
    }

    // ── Composition ──────────────────────────────────────────────────────────

    /// Merges an extension's declarations as if they were declared here.
    pub fn include(&mut self, extension: &Extension) -> &mut Self {
        tracing::debug!(extension = %extension.name, "including extension");
        self.merge(&extension.declarations);
        self
    }

    fn merge(&mut self, other: &Declarations) {
        if let Some(body) = &other.body {
            self.body = Some(Arc::clone(body));
        }
        self.hooks.extend(other.hooks.iter().cloned());
        self.methods.merge(&other.methods);
        self.messages = self.messages.register_all(&other.messages);
        self.callbacks = self.callbacks.register_all(&other.callbacks);
        for field in &other.expects {
            field::declare(&mut self.expects, field.clone());
        }
        for field in &other.exposes {
            field::declare(&mut self.exposes, field.clone());
        }
    }
}

impl fmt::Debug for Declarations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Declarations")
            .field("body", &self.body.is_some())
            .field("hooks", &self.hooks)
            .field("methods", &self.methods)
            .field("expects", &self.expects)
            .field("exposes", &self.exposes)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Extension
// ─────────────────────────────────────────────────────────────────────────────

/// A reusable bundle of declarations that action types can include.
#[derive(Debug, Clone)]
pub struct Extension {
    name: Arc<str>,
    declarations: Declarations,
}

impl Extension {
    /// Builds an extension by running `declare` once.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>, declare: impl FnOnce(&mut Declarations)) -> Self {
        let mut declarations = Declarations::new();
        declare(&mut declarations);
        Self {
            name: name.into(),
            declarations,
        }
    }

    /// Returns the extension name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ActionType
// ─────────────────────────────────────────────────────────────────────────────

/// A declared action type.
pub struct ActionType {
    name: Arc<str>,
    parent: Option<Arc<ActionType>>,
    local: RwLock<Declarations>,
}

impl ActionType {
    /// Starts building a new action type.
    #[must_use]
    pub fn builder(name: impl Into<Arc<str>>) -> ActionTypeBuilder {
        ActionTypeBuilder {
            name: name.into(),
            parent: None,
            local: Declarations::new(),
        }
    }

    /// Returns the type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the direct parent type.
    #[must_use]
    pub fn parent(&self) -> Option<&Arc<ActionType>> {
        self.parent.as_ref()
    }

    /// Adds declarations to this type.
    ///
    /// Subtypes see the additions on their next execution. Intended for the
    /// declaration phase; executions already running keep their snapshot.
    ///
    /// `declare` fills a fresh [`Declarations`] that is merged afterwards, so
    /// it may read this type without holding its lock.
    pub fn declare(&self, declare: impl FnOnce(&mut Declarations)) {
        let mut additions = Declarations::new();
        declare(&mut additions);
        self.local.write().merge(&additions);
    }

    /// Returns this type and its ancestors, oldest ancestor first.
    #[must_use]
    pub fn ancestry(&self) -> Vec<&ActionType> {
        let mut chain: Vec<&ActionType> =
            core::iter::successors(Some(self), |node| node.parent.as_deref()).collect();
        chain.reverse();
        chain
    }

    /// Returns `true` if `other` is this type or one of its ancestors.
    #[must_use]
    pub fn is_a(&self, other: &ActionType) -> bool {
        core::iter::successors(Some(self), |node| node.parent.as_deref())
            .any(|node| core::ptr::eq(node, other))
    }

    /// Composes the pipeline from the current declarations of the whole chain.
    #[must_use]
    pub fn pipeline(&self) -> Pipeline {
        let chain = self.ancestry();
        let body = chain
            .iter()
            .rev()
            .find_map(|node| node.local.read().body.clone());
        let mut pipeline = Pipeline::new(body);
        for node in chain {
            for hook in &node.local.read().hooks {
                pipeline.push(hook);
            }
        }
        pipeline
    }

    /// Returns message entries for `event`, most-derived type first.
    #[must_use]
    pub fn message_entries(&self, event: MessageEvent) -> Vec<Arc<MessageEntry>> {
        let mut entries = Vec::new();
        for node in self.ancestry().into_iter().rev() {
            entries.extend(node.local.read().messages.for_event(event).iter().cloned());
        }
        entries
    }

    /// Returns callback entries for `event`, most-derived type first.
    #[must_use]
    pub fn callback_entries(&self, event: CallbackEvent) -> Vec<Arc<CallbackEntry>> {
        let mut entries = Vec::new();
        for node in self.ancestry().into_iter().rev() {
            entries.extend(node.local.read().callbacks.for_event(event).iter().cloned());
        }
        entries
    }

    /// Returns the declared inputs of the whole chain.
    #[must_use]
    pub fn expected_fields(&self) -> Vec<Field> {
        self.collect_fields(|local| &local.expects)
    }

    /// Returns the declared outputs of the whole chain.
    #[must_use]
    pub fn exposed_fields(&self) -> Vec<Field> {
        self.collect_fields(|local| &local.exposes)
    }

    fn collect_fields(&self, select: impl Fn(&Declarations) -> &Vec<Field>) -> Vec<Field> {
        let mut fields = Vec::new();
        for node in self.ancestry() {
            let local = node.local.read();
            for field in select(&local) {
                field::declare(&mut fields, field.clone());
            }
        }
        fields
    }

    /// Creates a fresh action instance of this type.
    #[must_use]
    pub fn instantiate(self: &Arc<Self>, inputs: Fields) -> Action {
        Action::with_methods(Arc::clone(self) as Arc<dyn MethodLookup>, inputs)
    }
}

impl MethodLookup for ActionType {
    fn action_name(&self) -> &str {
        &self.name
    }

    fn lookup_method(&self, name: &str) -> Option<Method> {
        core::iter::successors(Some(self), |node| node.parent.as_deref())
            .find_map(|node| node.local.read().methods.get(name).cloned())
    }
}

impl fmt::Debug for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionType")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|parent| parent.name()))
            .field("local", &*self.local.read())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ActionTypeBuilder
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for [`ActionType`].
///
/// Extensions and `declare` blocks are applied in call order.
#[derive(Debug)]
pub struct ActionTypeBuilder {
    name: Arc<str>,
    parent: Option<Arc<ActionType>>,
    local: Declarations,
}

impl ActionTypeBuilder {
    /// Inherits from `parent`.
    #[must_use]
    pub fn parent(mut self, parent: &Arc<ActionType>) -> Self {
        self.parent = Some(Arc::clone(parent));
        self
    }

    /// Includes an extension.
    #[must_use]
    pub fn extend(mut self, extension: &Extension) -> Self {
        self.local.include(extension);
        self
    }

    /// Adds local declarations.
    #[must_use]
    pub fn declare(mut self, declare: impl FnOnce(&mut Declarations)) -> Self {
        declare(&mut self.local);
        self
    }

    /// Finishes the type.
    #[must_use]
    pub fn build(self) -> Arc<ActionType> {
        tracing::debug!(
            action = %self.name,
            parent = self.parent.as_ref().map(|parent| parent.name()),
            "action type declared"
        );
        Arc::new(ActionType {
            name: self.name,
            parent: self.parent,
            local: RwLock::new(self.local),
        })
    }
}
