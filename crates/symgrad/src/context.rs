//! Evaluation context: bindings from placeholders to concrete values.

use crate::graph::TensorId;
use std::collections::HashMap;

/// Caller-supplied bindings for free leaves.
///
/// A context must bind every placeholder reachable from the tensor being
/// evaluated. Bindings for tensors that already carry a value are ignored.
///
/// # Example
///
/// ```
/// use symgrad::{Context, Graph};
///
/// let mut graph: Graph<f64> = Graph::new();
/// let a = graph.placeholder("a");
/// let b = graph.placeholder("b");
///
/// let ctx = Context::new().with(a, 1.0).with(b, 2.0);
/// assert_eq!(ctx.get(b), Some(&2.0));
/// assert_eq!(ctx.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Context<V> {
    bindings: HashMap<TensorId, V>,
}

impl<V> Context<V> {
    /// Create an empty context.
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Bind `tensor` to `value`, returning the previous binding.
    pub fn bind(&mut self, tensor: TensorId, value: V) -> Option<V> {
        self.bindings.insert(tensor, value)
    }

    /// Builder-style [`bind`](Self::bind).
    pub fn with(mut self, tensor: TensorId, value: V) -> Self {
        self.bind(tensor, value);
        self
    }

    /// Get the binding for `tensor`.
    pub fn get(&self, tensor: TensorId) -> Option<&V> {
        self.bindings.get(&tensor)
    }

    /// Check if `tensor` is bound.
    pub fn contains(&self, tensor: TensorId) -> bool {
        self.bindings.contains_key(&tensor)
    }

    /// Remove and return the binding for `tensor`.
    pub fn unbind(&mut self, tensor: TensorId) -> Option<V> {
        self.bindings.remove(&tensor)
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if no bindings are stored.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Iterate over all bindings.
    pub fn iter(&self) -> impl Iterator<Item = (&TensorId, &V)> {
        self.bindings.iter()
    }
}

impl<V> Default for Context<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> FromIterator<(TensorId, V)> for Context<V> {
    fn from_iter<I: IntoIterator<Item = (TensorId, V)>>(iter: I) -> Self {
        Self {
            bindings: iter.into_iter().collect(),
        }
    }
}

impl<V> Extend<(TensorId, V)> for Context<V> {
    fn extend<I: IntoIterator<Item = (TensorId, V)>>(&mut self, iter: I) {
        self.bindings.extend(iter);
    }
}
