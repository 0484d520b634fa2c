//! Method registry: the named handlers a dispatcher may route to.
//!
//! Every entry carries an explicit [`Visibility`]. Only public entries are
//! reachable from the wire; private ones exist so handlers can share code
//! through [`DispatchContext::delegate`](crate::DispatchContext::delegate).
//! Independently of the flag, a name starting with [`PRIVATE_SENTINEL`] is
//! never resolved for an inbound request.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::dispatch::DispatchContext;
use crate::error::{MethodError, ValidationError};

/// Leading character that marks a method name as private.
pub const PRIVATE_SENTINEL: char = '_';

/// Positional parameters handed to a method.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(Vec<Value>);

impl Params {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Deserialize the parameter at `index`. A missing parameter is read as
    /// `null`, so `Option<T>` accepts it.
    pub fn parse<T: DeserializeOwned>(&self, index: usize) -> Result<T, MethodError> {
        let value = self.0.get(index).cloned().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|e| {
            MethodError::invalid_params(format!("parameter {}: {}", index, e))
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<Value> {
        self.0
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

/// A method a dispatcher can invoke.
///
/// The method answers through `ctx` (`respond`/`fail`), either before
/// returning or later from a task that owns a clone of the context. Returning
/// `Err` or panicking without having answered produces a `"Runtime error"`
/// response.
#[async_trait]
pub trait RpcMethod: Send + Sync {
    async fn call(&self, ctx: DispatchContext, params: Params) -> Result<(), MethodError>;
}

#[async_trait]
impl<F, Fut> RpcMethod for F
where
    F: Fn(DispatchContext, Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), MethodError>> + Send + 'static,
{
    async fn call(&self, ctx: DispatchContext, params: Params) -> Result<(), MethodError> {
        (self)(ctx, params).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    /// Visibility implied by a name alone.
    pub fn for_name(name: &str) -> Self {
        if name.starts_with(PRIVATE_SENTINEL) {
            Visibility::Private
        } else {
            Visibility::Public
        }
    }
}

#[derive(Clone)]
pub struct MethodEntry {
    method: Arc<dyn RpcMethod>,
    visibility: Visibility,
}

impl MethodEntry {
    pub fn method(&self) -> Arc<dyn RpcMethod> {
        Arc::clone(&self.method)
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }
}

/// Name → handler map shared read-only by every dispatch session.
#[derive(Clone, Default)]
pub struct MethodRegistry {
    entries: HashMap<String, MethodEntry>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a method. Names starting with `_` are stored as private.
    pub fn register<M>(&mut self, name: impl Into<String>, method: M) -> &mut Self
    where
        M: RpcMethod + 'static,
    {
        let name = name.into();
        let visibility = Visibility::for_name(&name);
        self.insert(name, Arc::new(method), visibility)
    }

    /// Register a method that is only reachable through delegation.
    pub fn register_private<M>(&mut self, name: impl Into<String>, method: M) -> &mut Self
    where
        M: RpcMethod + 'static,
    {
        self.insert(name.into(), Arc::new(method), Visibility::Private)
    }

    pub fn with_method<M>(mut self, name: impl Into<String>, method: M) -> Self
    where
        M: RpcMethod + 'static,
    {
        self.register(name, method);
        self
    }

    pub fn with_private_method<M>(mut self, name: impl Into<String>, method: M) -> Self
    where
        M: RpcMethod + 'static,
    {
        self.register_private(name, method);
        self
    }

    fn insert(
        &mut self,
        name: String,
        method: Arc<dyn RpcMethod>,
        visibility: Visibility,
    ) -> &mut Self {
        debug!(method = %name, ?visibility, "Registering RPC method");
        self.entries.insert(name, MethodEntry { method, visibility });
        self
    }

    pub fn get(&self, name: &str) -> Option<&MethodEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Resolve a method for an inbound request, applying the visibility rule.
    pub fn resolve_public(&self, name: &str) -> Result<Arc<dyn RpcMethod>, ValidationError> {
        if name.is_empty() {
            return Err(ValidationError::MissingMethod);
        }
        if name.starts_with(PRIVATE_SENTINEL) {
            return Err(ValidationError::PrivateMethod(name.to_string()));
        }
        match self.entries.get(name) {
            Some(entry) if entry.visibility == Visibility::Public => Ok(entry.method()),
            Some(_) => Err(ValidationError::PrivateMethod(name.to_string())),
            None => Err(ValidationError::UnknownMethod(name.to_string())),
        }
    }

    /// Names reachable from the wire, sorted.
    pub fn public_methods(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.visibility == Visibility::Public)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<(&String, Visibility)> = self
            .entries
            .iter()
            .map(|(name, entry)| (name, entry.visibility))
            .collect();
        names.sort_by(|a, b| a.0.cmp(b.0));
        f.debug_struct("MethodRegistry").field("entries", &names).finish()
    }
}
