//! Lifecycle hooks and pipeline composition.
//!
//! A [`Pipeline`] is assembled from the hooks of every type in an action's
//! ancestry, oldest ancestor first, and runs the body inside them:
//!
//! ```text
//! around-pre(1..N) -> before(1..N) -> body -> after(1..N) -> around-post(N..1)
//! ```
//!
//! `before` and `after` hooks share one flat, ancestor-first order. `around`
//! hooks nest, the first collected being outermost, so their post-continuation
//! code runs in reverse as a consequence of nesting.
//!
//! # Failure Semantics
//!
//! A hook or body that halts unwinds through every enclosing `around` hook.
//! An `around` hook only runs cleanup after its continuation if it inspects
//! the continuation's result itself; nothing is rolled back automatically.
//!
//! Hooks are not run through the [`Invoker`](sextant_action::invoker::Invoker).
//! Their halts, including [`Halt::Complete`], always propagate.

use core::fmt;
use std::sync::Arc;

use sextant_action::error::HandlerError;
use sextant_action::handler::{Method, Next};
use sextant_action::{Action, Halt};

/// A pipeline step that receives the action.
pub type StepFn = dyn Fn(&mut Action) -> Result<(), Halt> + Send + Sync;

/// A pipeline step that wraps the rest of the pipeline.
pub type WrapFn = dyn Fn(&mut Action, Next<'_>) -> Result<(), Halt> + Send + Sync;

/// An action body.
pub type Body = Arc<StepFn>;

// ─────────────────────────────────────────────────────────────────────────────
// HookKind
// ─────────────────────────────────────────────────────────────────────────────

/// Where a hook runs relative to the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// Wraps everything declared beneath it and must call its continuation.
    Around,
    /// Runs before the body.
    Before,
    /// Runs after the body.
    After,
}

impl HookKind {
    /// Returns the kind name used in logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HookKind::Around => "around",
            HookKind::Before => "before",
            HookKind::After => "after",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HookSource
// ─────────────────────────────────────────────────────────────────────────────

/// What a hook calls.
#[derive(Clone)]
pub enum HookSource {
    /// A method declared on the action type, resolved when the hook runs.
    Method(Arc<str>),
    /// A callable step.
    Step(Arc<StepFn>),
    /// A callable that wraps the rest of the pipeline.
    Wrap(Arc<WrapFn>),
}

impl HookSource {
    /// A callable step.
    #[must_use]
    pub fn step<F>(f: F) -> Self
    where
        F: Fn(&mut Action) -> Result<(), Halt> + Send + Sync + 'static,
    {
        HookSource::Step(Arc::new(f))
    }

    /// A callable wrapping the rest of the pipeline.
    #[must_use]
    pub fn wrap<F>(f: F) -> Self
    where
        F: Fn(&mut Action, Next<'_>) -> Result<(), Halt> + Send + Sync + 'static,
    {
        HookSource::Wrap(Arc::new(f))
    }

    /// A method reference.
    #[must_use]
    pub fn method(name: impl Into<Arc<str>>) -> Self {
        HookSource::Method(name.into())
    }

    /// Runs the source as a `before` or `after` step.
    ///
    /// A wrapping source is given a continuation that does nothing.
    fn run_step(&self, action: &mut Action) -> Result<(), Halt> {
        match self {
            HookSource::Step(f) => f(action),
            HookSource::Wrap(f) => f(action, Next::new(&noop)),
            HookSource::Method(name) => match resolve(action, name)? {
                Method::Around(f) => f(action, Next::new(&noop)),
                method => method.call(name, action, None).map(drop),
            },
        }
    }

    /// Runs the source as an `around` hook wrapping `next`.
    ///
    /// A plain step runs first and then continues.
    fn run_wrap(&self, action: &mut Action, next: Next<'_>) -> Result<(), Halt> {
        match self {
            HookSource::Wrap(f) => f(action, next),
            HookSource::Step(f) => {
                f(action)?;
                next.run(action)
            }
            HookSource::Method(name) => match resolve(action, name)? {
                Method::Around(f) => f(action, next),
                method => {
                    method.call(name, action, None)?;
                    next.run(action)
                }
            },
        }
    }
}

impl fmt::Debug for HookSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookSource::Method(name) => f.debug_tuple("Method").field(name).finish(),
            HookSource::Step(_) => f.write_str("Step(..)"),
            HookSource::Wrap(_) => f.write_str("Wrap(..)"),
        }
    }
}

fn noop(_: &mut Action) -> Result<(), Halt> {
    Ok(())
}

fn resolve(action: &Action, name: &str) -> Result<Method, Halt> {
    action.method(name).ok_or_else(|| {
        Halt::error(HandlerError::UnknownMethod {
            action: action.name().to_owned(),
            method: name.to_owned(),
        })
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Hook
// ─────────────────────────────────────────────────────────────────────────────

/// A hook declared on one action type.
#[derive(Debug, Clone)]
pub struct Hook {
    /// Where the hook runs.
    pub kind: HookKind,
    /// What the hook calls.
    pub source: HookSource,
}

impl Hook {
    /// Creates a hook.
    #[must_use]
    pub fn new(kind: HookKind, source: HookSource) -> Self {
        Self { kind, source }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pipeline
// ─────────────────────────────────────────────────────────────────────────────

/// The composed hooks and body of one execution.
///
/// A pipeline is a snapshot: hooks declared after it was built do not affect
/// it, but they are picked up by the next pipeline built for the type.
#[derive(Clone, Default)]
pub struct Pipeline {
    arounds: Vec<HookSource>,
    befores: Vec<HookSource>,
    afters: Vec<HookSource>,
    body: Option<Body>,
}

impl Pipeline {
    /// Creates a pipeline with no hooks around `body`.
    ///
    /// A missing body does nothing.
    #[must_use]
    pub fn new(body: Option<Body>) -> Self {
        Self {
            body,
            ..Self::default()
        }
    }

    /// Appends a hook. Hooks must be pushed oldest ancestor first.
    pub fn push(&mut self, hook: &Hook) {
        let list = match hook.kind {
            HookKind::Around => &mut self.arounds,
            HookKind::Before => &mut self.befores,
            HookKind::After => &mut self.afters,
        };
        list.push(hook.source.clone());
    }

    /// Returns the number of hooks of the given kind.
    #[must_use]
    pub fn count(&self, kind: HookKind) -> usize {
        match kind {
            HookKind::Around => self.arounds.len(),
            HookKind::Before => self.befores.len(),
            HookKind::After => self.afters.len(),
        }
    }

    /// Runs the pipeline against `action`.
    ///
    /// # Errors
    ///
    /// Returns the first halt raised by a hook or the body.
    pub fn run(&self, action: &mut Action) -> Result<(), Halt> {
        self.run_from(0, action)
    }

    fn run_from(&self, depth: usize, action: &mut Action) -> Result<(), Halt> {
        match self.arounds.get(depth) {
            Some(around) => {
                let rest = |action: &mut Action| self.run_from(depth + 1, action);
                around.run_wrap(action, Next::new(&rest))
            }
            None => self.run_core(action),
        }
    }

    fn run_core(&self, action: &mut Action) -> Result<(), Halt> {
        for before in &self.befores {
            before.run_step(action)?;
        }
        if let Some(body) = &self.body {
            body(action)?;
        }
        for after in &self.afters {
            after.run_step(action)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("arounds", &self.arounds)
            .field("befores", &self.befores)
            .field("afters", &self.afters)
            .field("body", &self.body.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sextant_action::Fields;
    use sextant_action::handler::MethodTable;
    use std::sync::Mutex;

    type Trace = Arc<Mutex<Vec<String>>>;

    fn emit(trace: &Trace, label: &str) -> HookSource {
        let trace = Arc::clone(trace);
        let label = label.to_owned();
        HookSource::step(move |_| {
            trace.lock().unwrap().push(label.clone());
            Ok(())
        })
    }

    fn wrap(trace: &Trace, label: &str) -> HookSource {
        let trace = Arc::clone(trace);
        let label = label.to_owned();
        HookSource::wrap(move |action, next| {
            trace.lock().unwrap().push(format!("{label}-pre"));
            next.run(action)?;
            trace.lock().unwrap().push(format!("{label}-post"));
            Ok(())
        })
    }

    fn body(trace: &Trace) -> Body {
        let trace = Arc::clone(trace);
        Arc::new(move |_: &mut Action| {
            trace.lock().unwrap().push("body".to_owned());
            Ok(())
        })
    }

    fn entries(trace: &Trace) -> Vec<String> {
        trace.lock().unwrap().clone()
    }

    #[test]
    fn before_body_after() {
        let trace = Trace::default();
        let mut pipeline = Pipeline::new(Some(body(&trace)));
        pipeline.push(&Hook::new(HookKind::After, emit(&trace, "a")));
        pipeline.push(&Hook::new(HookKind::Before, emit(&trace, "b")));

        pipeline.run(&mut Action::new("Sample", Fields::new())).unwrap();

        assert_eq!(entries(&trace), ["b", "body", "a"]);
    }

    #[test]
    fn arounds_nest_first_outermost() {
        let trace = Trace::default();
        let mut pipeline = Pipeline::new(Some(body(&trace)));
        pipeline.push(&Hook::new(HookKind::Around, wrap(&trace, "outer")));
        pipeline.push(&Hook::new(HookKind::Around, wrap(&trace, "inner")));
        pipeline.push(&Hook::new(HookKind::Before, emit(&trace, "b")));

        pipeline.run(&mut Action::new("Sample", Fields::new())).unwrap();

        assert_eq!(
            entries(&trace),
            ["outer-pre", "inner-pre", "b", "body", "inner-post", "outer-post"]
        );
    }

    #[test]
    fn halt_skips_rest_and_unwinds() {
        let trace = Trace::default();
        let mut pipeline = Pipeline::new(Some(body(&trace)));
        pipeline.push(&Hook::new(HookKind::Around, wrap(&trace, "wrap")));
        pipeline.push(&Hook::new(
            HookKind::Before,
            HookSource::step(|_| Err(Halt::fail("stop"))),
        ));

        let halt = pipeline
            .run(&mut Action::new("Sample", Fields::new()))
            .unwrap_err();

        assert!(halt.is_fail());
        assert_eq!(entries(&trace), ["wrap-pre"]);
    }

    #[test]
    fn method_sources_resolve_on_action() {
        let trace = Trace::default();
        let mut table = MethodTable::new();
        let t = Arc::clone(&trace);
        table.insert(
            "audit",
            Method::niladic(move |_| {
                t.lock().unwrap().push("audit".to_owned());
                Ok(())
            }),
        );
        let t = Arc::clone(&trace);
        table.insert(
            "timed",
            Method::around(move |action, next| {
                t.lock().unwrap().push("start".to_owned());
                let result = next.run(action);
                t.lock().unwrap().push("stop".to_owned());
                result
            }),
        );

        let mut pipeline = Pipeline::new(Some(body(&trace)));
        pipeline.push(&Hook::new(HookKind::Around, HookSource::method("timed")));
        pipeline.push(&Hook::new(HookKind::Before, HookSource::method("audit")));
        pipeline.push(&Hook::new(HookKind::Around, HookSource::method("audit")));

        let mut action = Action::with_table("Sample", table, Fields::new());
        pipeline.run(&mut action).unwrap();

        assert_eq!(
            entries(&trace),
            ["start", "audit", "audit", "body", "stop"]
        );
    }

    #[test]
    fn wrap_used_as_step_gets_noop_continuation() {
        let trace = Trace::default();
        let mut pipeline = Pipeline::new(Some(body(&trace)));
        pipeline.push(&Hook::new(HookKind::Before, wrap(&trace, "w")));

        pipeline.run(&mut Action::new("Sample", Fields::new())).unwrap();

        assert_eq!(entries(&trace), ["w-pre", "w-post", "body"]);
    }

    #[test]
    fn unknown_method_hook_is_an_error() {
        let mut pipeline = Pipeline::new(None);
        pipeline.push(&Hook::new(HookKind::Before, HookSource::method("missing")));

        let halt = pipeline
            .run(&mut Action::new("Sample", Fields::new()))
            .unwrap_err();

        let exception = halt.into_exception().unwrap();
        assert!(exception.is::<HandlerError>());
        assert_eq!(pipeline.count(HookKind::Before), 1);
    }
}
