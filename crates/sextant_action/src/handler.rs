//! Handler shapes, method shapes, and the pipeline continuation.
//!
//! Every message provider, callback, prefix and method reference is stored as
//! an explicit, closed shape chosen when it is registered. The [`Invoker`]
//! matches on that shape at call time; nothing is inspected per call.
//!
//! | Shape | Receives |
//! |-------|----------|
//! | [`Handler::Literal`] | nothing, the value is returned as-is |
//! | [`Handler::Method`] | whatever the named [`Method`] declares |
//! | [`Handler::Niladic`] | the action only |
//! | [`Handler::Positional`] | the action and the exception |
//! | [`Handler::Named`] | the action and [`HandlerArgs`] |
//!
//! [`Invoker`]: crate::invoker::Invoker

use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use serde_json::Value;

use crate::action::Action;
use crate::error::{Exception, Halt, HandlerError};

/// Result of calling a handler or method.
pub type HandlerResult = Result<Value, Halt>;

/// Arguments passed by name to [`Handler::Named`] and [`Method::Named`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HandlerArgs<'a> {
    /// The triggering exception, if any.
    pub exception: Option<&'a Exception>,
}

type NiladicFn = dyn Fn(&Action) -> HandlerResult + Send + Sync;
type PositionalFn = dyn Fn(&Action, Option<&Exception>) -> HandlerResult + Send + Sync;
type NamedFn = dyn Fn(&Action, HandlerArgs<'_>) -> HandlerResult + Send + Sync;

// ─────────────────────────────────────────────────────────────────────────────
// Handler
// ─────────────────────────────────────────────────────────────────────────────

/// A message provider, callback, or prefix.
#[derive(Clone)]
pub enum Handler {
    /// A fixed value.
    Literal(Value),
    /// A method declared on the action type, resolved at call time.
    Method(Arc<str>),
    /// A callable that takes no exception.
    Niladic(Arc<NiladicFn>),
    /// A callable that takes the exception positionally.
    Positional(Arc<PositionalFn>),
    /// A callable that takes the exception by name.
    Named(Arc<NamedFn>),
}

/// The shape tag of a [`Handler`] or [`Method`], for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerShape {
    /// [`Handler::Literal`].
    Literal,
    /// [`Handler::Method`].
    Method,
    /// Takes no exception.
    Niladic,
    /// Takes the exception positionally.
    Positional,
    /// Takes the exception by name.
    Named,
    /// [`Method::Around`].
    Around,
}

impl Handler {
    /// A fixed value.
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Handler::Literal(value.into())
    }

    /// A reference to a method declared on the action type.
    #[must_use]
    pub fn method(name: impl Into<Arc<str>>) -> Self {
        Handler::Method(name.into())
    }

    /// A callable that does not want the exception.
    #[must_use]
    pub fn niladic<F, R>(f: F) -> Self
    where
        F: Fn(&Action) -> Result<R, Halt> + Send + Sync + 'static,
        R: Into<Value>,
    {
        Handler::Niladic(Arc::new(move |action: &Action| f(action).map(Into::into)))
    }

    /// A callable that takes the exception positionally.
    #[must_use]
    pub fn positional<F, R>(f: F) -> Self
    where
        F: Fn(&Action, Option<&Exception>) -> Result<R, Halt> + Send + Sync + 'static,
        R: Into<Value>,
    {
        Handler::Positional(Arc::new(
            move |action: &Action, exception: Option<&Exception>| {
                f(action, exception).map(Into::into)
            },
        ))
    }

    /// A callable that takes the exception by name.
    #[must_use]
    pub fn named<F, R>(f: F) -> Self
    where
        F: Fn(&Action, HandlerArgs<'_>) -> Result<R, Halt> + Send + Sync + 'static,
        R: Into<Value>,
    {
        Handler::Named(Arc::new(move |action: &Action, args: HandlerArgs<'_>| {
            f(action, args).map(Into::into)
        }))
    }

    /// Returns the handler's shape tag.
    #[must_use]
    pub fn shape(&self) -> HandlerShape {
        match self {
            Handler::Literal(_) => HandlerShape::Literal,
            Handler::Method(_) => HandlerShape::Method,
            Handler::Niladic(_) => HandlerShape::Niladic,
            Handler::Positional(_) => HandlerShape::Positional,
            Handler::Named(_) => HandlerShape::Named,
        }
    }
}

impl From<&str> for Handler {
    fn from(text: &str) -> Self {
        Handler::literal(text)
    }
}

impl From<String> for Handler {
    fn from(text: String) -> Self {
        Handler::literal(text)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Handler::Method(name) => f.debug_tuple("Method").field(name).finish(),
            other => f.debug_tuple("Handler").field(&other.shape()).finish(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Next
// ─────────────────────────────────────────────────────────────────────────────

/// Continuation handed to wrapping hooks: "the rest of the pipeline".
///
/// A wrapping hook must call [`run`](Self::run) to proceed. It is consumed on
/// use, so the rest of the pipeline runs at most once per wrap.
pub struct Next<'a> {
    rest: &'a dyn Fn(&mut Action) -> Result<(), Halt>,
}

impl<'a> Next<'a> {
    /// Wraps the remainder of a pipeline.
    #[must_use]
    pub fn new(rest: &'a dyn Fn(&mut Action) -> Result<(), Halt>) -> Self {
        Self { rest }
    }

    /// Runs the rest of the pipeline.
    ///
    /// # Errors
    ///
    /// Propagates whatever the remaining hooks or body halt with.
    pub fn run(self, action: &mut Action) -> Result<(), Halt> {
        (self.rest)(action)
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next").finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Method
// ─────────────────────────────────────────────────────────────────────────────

type MethodNiladicFn = dyn Fn(&mut Action) -> HandlerResult + Send + Sync;
type MethodPositionalFn = dyn Fn(&mut Action, Option<&Exception>) -> HandlerResult + Send + Sync;
type MethodNamedFn = dyn Fn(&mut Action, HandlerArgs<'_>) -> HandlerResult + Send + Sync;
type MethodAroundFn = dyn Fn(&mut Action, Next<'_>) -> Result<(), Halt> + Send + Sync;

/// A named method declared on an action type.
///
/// Methods receive the action mutably, so they can serve as `before`/`after`
/// hooks as well as handlers. Only [`Method::Around`] can wrap the pipeline.
#[derive(Clone)]
pub enum Method {
    /// Declares no exception parameter.
    Niladic(Arc<MethodNiladicFn>),
    /// Declares the exception as a positional parameter.
    Positional(Arc<MethodPositionalFn>),
    /// Declares the exception as a named parameter.
    Named(Arc<MethodNamedFn>),
    /// Wraps the rest of the pipeline.
    Around(Arc<MethodAroundFn>),
}

impl Method {
    /// A method without an exception parameter.
    #[must_use]
    pub fn niladic<F, R>(f: F) -> Self
    where
        F: Fn(&mut Action) -> Result<R, Halt> + Send + Sync + 'static,
        R: Into<Value>,
    {
        Method::Niladic(Arc::new(move |action: &mut Action| f(action).map(Into::into)))
    }

    /// A method taking the exception positionally.
    #[must_use]
    pub fn positional<F, R>(f: F) -> Self
    where
        F: Fn(&mut Action, Option<&Exception>) -> Result<R, Halt> + Send + Sync + 'static,
        R: Into<Value>,
    {
        Method::Positional(Arc::new(
            move |action: &mut Action, exception: Option<&Exception>| {
                f(action, exception).map(Into::into)
            },
        ))
    }

    /// A method taking the exception by name.
    #[must_use]
    pub fn named<F, R>(f: F) -> Self
    where
        F: Fn(&mut Action, HandlerArgs<'_>) -> Result<R, Halt> + Send + Sync + 'static,
        R: Into<Value>,
    {
        Method::Named(Arc::new(move |action: &mut Action, args: HandlerArgs<'_>| {
            f(action, args).map(Into::into)
        }))
    }

    /// A method wrapping the rest of the pipeline.
    #[must_use]
    pub fn around<F>(f: F) -> Self
    where
        F: Fn(&mut Action, Next<'_>) -> Result<(), Halt> + Send + Sync + 'static,
    {
        Method::Around(Arc::new(f))
    }

    /// Returns the method's shape tag.
    #[must_use]
    pub fn shape(&self) -> HandlerShape {
        match self {
            Method::Niladic(_) => HandlerShape::Niladic,
            Method::Positional(_) => HandlerShape::Positional,
            Method::Named(_) => HandlerShape::Named,
            Method::Around(_) => HandlerShape::Around,
        }
    }

    /// Calls the method, passing the exception only if it declares one.
    ///
    /// # Errors
    ///
    /// Propagates the method's own halt. Calling an [`Method::Around`] this way
    /// halts with [`HandlerError::NotCallable`].
    pub fn call(
        &self,
        name: &str,
        action: &mut Action,
        exception: Option<&Exception>,
    ) -> HandlerResult {
        match self {
            Method::Niladic(f) => f(action),
            Method::Positional(f) => f(action, exception),
            Method::Named(f) => f(action, HandlerArgs { exception }),
            Method::Around(_) => Err(Halt::error(HandlerError::NotCallable {
                method: name.to_owned(),
            })),
        }
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Method").field(&self.shape()).finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MethodTable
// ─────────────────────────────────────────────────────────────────────────────

/// Methods declared locally on one action type.
#[derive(Clone, Default)]
pub struct MethodTable {
    methods: HashMap<Arc<str>, Method>,
}

impl MethodTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a method, returning the one it replaces.
    pub fn insert(&mut self, name: impl Into<Arc<str>>, method: Method) -> Option<Method> {
        self.methods.insert(name.into(), method)
    }

    /// Returns a method by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    /// Returns `true` if a method with this name is declared.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Copies every method of `other` into this table; `other` wins on clashes.
    pub fn merge(&mut self, other: &MethodTable) {
        for (name, method) in &other.methods {
            self.methods.insert(Arc::clone(name), method.clone());
        }
    }

    /// Returns the number of declared methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Returns `true` if no methods are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.methods.iter().map(|(name, method)| (name, method.shape())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Fields;
    use serde_json::json;

    #[test]
    fn handler_constructors_record_shape() {
        assert_eq!(Handler::literal("x").shape(), HandlerShape::Literal);
        assert_eq!(Handler::method("m").shape(), HandlerShape::Method);
        assert_eq!(
            Handler::niladic(|_| Ok("x")).shape(),
            HandlerShape::Niladic
        );
        assert_eq!(
            Handler::positional(|_, _| Ok("x")).shape(),
            HandlerShape::Positional
        );
        assert_eq!(
            Handler::named(|_, _| Ok("x")).shape(),
            HandlerShape::Named
        );
    }

    #[test]
    fn method_passes_exception_only_when_declared() {
        let mut action = Action::new("Sample", Fields::new());
        let exception = Exception::msg("boom");

        let niladic = Method::niladic(|_| Ok("no args"));
        let positional = Method::positional(|_, exception: Option<&Exception>| {
            Ok(exception.map(Exception::message))
        });
        let named = Method::named(|_, args: HandlerArgs<'_>| {
            Ok(args.exception.map(|e| format!("named {e}")))
        });

        assert_eq!(
            niladic.call("a", &mut action, Some(&exception)).unwrap(),
            json!("no args")
        );
        assert_eq!(
            positional.call("b", &mut action, Some(&exception)).unwrap(),
            json!("boom")
        );
        assert_eq!(
            named.call("c", &mut action, Some(&exception)).unwrap(),
            json!("named boom")
        );
        assert_eq!(named.call("c", &mut action, None).unwrap(), Value::Null);
    }

    #[test]
    fn around_method_cannot_be_called_directly() {
        let mut action = Action::new("Sample", Fields::new());
        let around = Method::around(|action, next| next.run(action));

        let halt = around.call("wrap", &mut action, None).unwrap_err();
        let exception = halt.into_exception().unwrap();
        assert_eq!(
            exception.downcast_ref::<HandlerError>(),
            Some(&HandlerError::NotCallable {
                method: "wrap".to_owned()
            })
        );
    }

    #[test]
    fn next_runs_rest_of_pipeline() {
        let mut action = Action::new("Sample", Fields::new());
        let rest = |action: &mut Action| action.expose("ran", true);

        Next::new(&rest).run(&mut action).unwrap();

        assert_eq!(action.output("ran"), Some(&json!(true)));
    }

    #[test]
    fn method_table_merge_prefers_incoming() {
        let mut base = MethodTable::new();
        base.insert("greeting", Method::niladic(|_| Ok("base")));
        base.insert("farewell", Method::niladic(|_| Ok("bye")));

        let mut overlay = MethodTable::new();
        overlay.insert("greeting", Method::niladic(|_| Ok("overlay")));

        base.merge(&overlay);

        let mut action = Action::new("Sample", Fields::new());
        let greeting = base.get("greeting").unwrap().call("greeting", &mut action, None);
        assert_eq!(greeting.unwrap(), json!("overlay"));
        assert_eq!(base.len(), 2);
    }
}
