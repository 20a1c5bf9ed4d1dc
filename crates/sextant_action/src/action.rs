//! The per-invocation action instance.
//!
//! An [`Action`] is created at the start of every execution and discarded once
//! the result has been built. It carries the validated inputs, the outputs
//! exposed so far, and a typed extension store that hooks can use to share
//! state (for example an `around` hook recording a start time).

use core::any::{Any, TypeId};
use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Halt, InputError};
use crate::handler::{Method, MethodTable};

/// Named field values: validated inputs or exposed outputs.
pub type Fields = serde_json::Map<String, Value>;

/// Resolves named methods against an action's type.
///
/// Layer 2 implements this on its action types so that method references are
/// late-bound to the type hierarchy: the most-derived declaration wins.
pub trait MethodLookup: Send + Sync {
    /// Returns the action type name.
    fn action_name(&self) -> &str;

    /// Resolves a method by name.
    fn lookup_method(&self, name: &str) -> Option<Method>;
}

/// Method lookup for actions built outside any type hierarchy.
struct Standalone {
    name: Arc<str>,
    methods: MethodTable,
}

impl MethodLookup for Standalone {
    fn action_name(&self) -> &str {
        &self.name
    }

    fn lookup_method(&self, name: &str) -> Option<Method> {
        self.methods.get(name).cloned()
    }
}

/// A running action.
pub struct Action {
    methods: Arc<dyn MethodLookup>,
    inputs: Fields,
    outputs: Fields,
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Action {
    /// Creates a standalone action with no methods.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>, inputs: Fields) -> Self {
        Self::with_table(name, MethodTable::new(), inputs)
    }

    /// Creates a standalone action backed by a fixed method table.
    #[must_use]
    pub fn with_table(name: impl Into<Arc<str>>, methods: MethodTable, inputs: Fields) -> Self {
        let lookup = Standalone {
            name: name.into(),
            methods,
        };
        Self::with_methods(Arc::new(lookup), inputs)
    }

    /// Creates an action whose methods resolve through `methods`.
    #[must_use]
    pub fn with_methods(methods: Arc<dyn MethodLookup>, inputs: Fields) -> Self {
        Self {
            methods,
            inputs,
            outputs: Fields::new(),
            extensions: HashMap::new(),
        }
    }

    /// Returns the action type name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.methods.action_name()
    }

    /// Resolves a named method against the action's type.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<Method> {
        self.methods.lookup_method(name)
    }

    /// Builds a business failure for `return Err(action.fail(..))`.
    #[must_use]
    pub fn fail(&self, message: impl Into<String>) -> Halt {
        Halt::fail(message)
    }

    /// Builds an early completion for `return Err(action.complete())`.
    #[must_use]
    pub fn complete(&self) -> Halt {
        Halt::complete()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Inputs
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns all inputs.
    #[must_use]
    pub fn inputs(&self) -> &Fields {
        &self.inputs
    }

    /// Returns a single input value.
    #[must_use]
    pub fn input(&self, name: &str) -> Option<&Value> {
        self.inputs.get(name)
    }

    /// Decodes an input into `T`.
    ///
    /// # Errors
    ///
    /// Returns a [`Halt::Error`] carrying an [`InputError`] if the input is
    /// missing or has an unexpected shape.
    pub fn input_as<T: DeserializeOwned>(&self, name: &str) -> Result<T, Halt> {
        let value = self.inputs.get(name).ok_or_else(|| InputError::Missing {
            field: name.to_owned(),
        })?;
        let decoded = T::deserialize(value).map_err(|source| InputError::Decode {
            field: name.to_owned(),
            source,
        })?;
        Ok(decoded)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Outputs
    // ─────────────────────────────────────────────────────────────────────────

    /// Records an output field, replacing any earlier value.
    ///
    /// # Errors
    ///
    /// Returns a [`Halt::Error`] if the value cannot be serialized.
    pub fn expose(&mut self, name: impl Into<String>, value: impl Serialize) -> Result<(), Halt> {
        let value = serde_json::to_value(value)?;
        self.outputs.insert(name.into(), value);
        Ok(())
    }

    /// Returns a single output value.
    #[must_use]
    pub fn output(&self, name: &str) -> Option<&Value> {
        self.outputs.get(name)
    }

    /// Returns all outputs exposed so far.
    #[must_use]
    pub fn outputs(&self) -> &Fields {
        &self.outputs
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Extensions
    // ─────────────────────────────────────────────────────────────────────────

    /// Stores a typed value, returning the previous value of that type.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.extensions
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|previous| previous.downcast::<T>().ok())
            .map(|previous| *previous)
    }

    /// Returns a stored value of type `T`.
    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    /// Returns a mutable reference to a stored value of type `T`.
    pub fn get_mut<T: Send + Sync + 'static>(&mut self) -> Option<&mut T> {
        self.extensions
            .get_mut(&TypeId::of::<T>())
            .and_then(|value| value.downcast_mut::<T>())
    }

    /// Removes and returns a stored value of type `T`.
    pub fn remove<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|value| value.downcast::<T>().ok())
            .map(|value| *value)
    }

    /// Returns `true` if a value of type `T` is stored.
    #[must_use]
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name())
            .field("inputs", &self.inputs.keys().collect::<Vec<_>>())
            .field("outputs", &self.outputs.keys().collect::<Vec<_>>())
            .field("extensions", &self.extensions.len())
            .finish()
    }
}
