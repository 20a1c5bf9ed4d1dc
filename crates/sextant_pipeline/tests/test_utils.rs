//! Shared test utilities for `sextant_pipeline` integration tests.
//!
//! Import via `mod test_utils;` in test files.

#![allow(
    dead_code,
    missing_docs,
    reason = "shared test utilities: not every item is used by every test binary"
)]

use std::sync::{Arc, Mutex};

use sextant_pipeline::prelude::*;

// ═══════════════════════════════════════════════════════════════════════════════
// TRACE RECORDER
// ═══════════════════════════════════════════════════════════════════════════════

/// Records labels in the order hooks, bodies and handlers emit them.
#[derive(Clone, Default)]
pub struct Trace {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, label: impl Into<String>) {
        self.entries.lock().unwrap().push(label.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn count(&self, label: &str) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| *entry == label)
            .count()
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    /// A step that emits `label`.
    pub fn step(
        &self,
        label: &str,
    ) -> impl Fn(&mut Action) -> Result<(), Halt> + Send + Sync + 'static {
        let trace = self.clone();
        let label = label.to_owned();
        move |_: &mut Action| {
            trace.emit(label.clone());
            Ok(())
        }
    }

    /// A wrapping hook that emits `{label}-pre` and `{label}-post` around its continuation.
    pub fn wrap(
        &self,
        label: &str,
    ) -> impl Fn(&mut Action, Next<'_>) -> Result<(), Halt> + Send + Sync + 'static {
        let trace = self.clone();
        let label = label.to_owned();
        move |action: &mut Action, next: Next<'_>| {
            trace.emit(format!("{label}-pre"));
            next.run(action)?;
            trace.emit(format!("{label}-post"));
            Ok(())
        }
    }

    /// A callback handler that emits `label`.
    pub fn handler(&self, label: &str) -> Handler {
        let trace = self.clone();
        let label = label.to_owned();
        Handler::niladic(move |_| {
            trace.emit(label.clone());
            Ok(())
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ACTION HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Builds a `Fields` map from a JSON object literal.
pub fn inputs(value: serde_json::Value) -> Fields {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("inputs must be a JSON object, got {other}"),
    }
}

/// An executor that does not emit start/finish logs.
pub fn quiet_executor() -> ActionExecutor {
    ActionExecutor::with_config(ExecutorConfig::new().without_logging())
}

/// Builds a chain of `depth` types, each declaring one `around`, `before`
/// and `after` hook labelled with its 1-based position, and the leaf a body.
pub fn traced_chain(trace: &Trace, depth: usize) -> Vec<Arc<ActionType>> {
    let mut chain: Vec<Arc<ActionType>> = Vec::with_capacity(depth);
    for level in 1..=depth {
        let mut builder = ActionType::builder(format!("Level{level}"));
        if let Some(parent) = chain.last() {
            builder = builder.parent(parent);
        }
        let action_type = builder
            .declare(|d| {
                d.around(trace.wrap(&format!("around{level}")))
                    .before(trace.step(&format!("before{level}")))
                    .after(trace.step(&format!("after{level}")));
                if level == depth {
                    d.call(trace.step("body"));
                }
            })
            .build();
        chain.push(action_type);
    }
    chain
}

/// The trace the hook order law predicts for a chain of `depth` types.
pub fn predicted_trace(depth: usize) -> Vec<String> {
    let levels = 1..=depth;
    levels
        .clone()
        .map(|level| format!("around{level}-pre"))
        .chain(levels.clone().map(|level| format!("before{level}")))
        .chain(core::iter::once("body".to_owned()))
        .chain(levels.clone().map(|level| format!("after{level}")))
        .chain(levels.rev().map(|level| format!("around{level}-post")))
        .collect()
}
