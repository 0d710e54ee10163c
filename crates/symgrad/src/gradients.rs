//! Gradient storage container.

use crate::error::GraphError;
use crate::graph::{Graph, TensorId};
use crate::value::Value;
use std::collections::HashMap;

/// Symbolic gradients of one output with respect to the tensors it depends on.
///
/// Each entry maps a tensor to the graph node holding `d(target)/d(tensor)`.
/// Contributions arriving along several paths are summed with
/// [`Graph::add`].
#[derive(Debug, Clone)]
pub struct Gradients {
    target: TensorId,
    grads: HashMap<TensorId, TensorId>,
}

impl Gradients {
    /// Create an empty container for gradients of `target`.
    pub fn new(target: TensorId) -> Self {
        Self {
            target,
            grads: HashMap::new(),
        }
    }

    /// The differentiated tensor.
    pub fn target(&self) -> TensorId {
        self.target
    }

    /// Accumulate a gradient contribution for a tensor.
    ///
    /// If a gradient already exists, the stored node becomes `existing + grad`.
    pub fn accumulate<V: Value>(
        &mut self,
        graph: &mut Graph<V>,
        id: TensorId,
        grad: TensorId,
    ) -> Result<(), GraphError> {
        let total = match self.grads.get(&id) {
            Some(&existing) => graph.add(existing, grad)?,
            None => grad,
        };
        self.grads.insert(id, total);
        Ok(())
    }

    /// Get the gradient node for a tensor.
    pub fn get(&self, id: TensorId) -> Option<TensorId> {
        self.grads.get(&id).copied()
    }

    /// Check if gradient exists for a tensor.
    pub fn contains(&self, id: TensorId) -> bool {
        self.grads.contains_key(&id)
    }

    /// Number of stored gradients.
    pub fn len(&self) -> usize {
        self.grads.len()
    }

    /// Check if no gradients stored.
    pub fn is_empty(&self) -> bool {
        self.grads.is_empty()
    }

    /// Iterate over `(tensor, gradient)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (TensorId, TensorId)> + '_ {
        self.grads.iter().map(|(&id, &grad)| (id, grad))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;

    #[test]
    fn test_gradients_new() {
        let grads = Gradients::new(TensorId::new_for_test(3));
        assert!(grads.is_empty());
        assert_eq!(grads.len(), 0);
        assert_eq!(grads.target(), TensorId::new_for_test(3));
    }

    #[test]
    fn test_gradients_accumulate_single() {
        let mut graph: Graph<f64> = Graph::new();
        let x = graph.placeholder("x");
        let g = graph.constant(2.0, "g");
        let mut grads = Gradients::new(x);

        grads.accumulate(&mut graph, x, g).unwrap();

        assert!(grads.contains(x));
        assert_eq!(grads.get(x), Some(g));
    }

    #[test]
    fn test_gradients_accumulate_multiple() {
        let mut graph: Graph<f64> = Graph::new();
        let x = graph.placeholder("x");
        let g1 = graph.constant(2.0, "g1");
        let g2 = graph.constant(5.0, "g2");
        let mut grads = Gradients::new(x);

        grads.accumulate(&mut graph, x, g1).unwrap();
        grads.accumulate(&mut graph, x, g2).unwrap();

        let total = grads.get(x).unwrap();
        assert_ne!(total, g1);
        assert_eq!(graph.evaluate(total, &Context::new()).unwrap(), 7.0);
    }

    #[test]
    fn test_gradients_multiple_nodes() {
        let mut graph: Graph<f64> = Graph::new();
        let a = graph.placeholder("a");
        let b = graph.placeholder("b");
        let one = graph.constant(1.0, "one");
        let mut grads = Gradients::new(a);

        grads.accumulate(&mut graph, a, one).unwrap();
        grads.accumulate(&mut graph, b, one).unwrap();

        assert_eq!(grads.len(), 2);
        let mut pairs: Vec<_> = grads.iter().collect();
        pairs.sort();
        assert_eq!(pairs, vec![(a, one), (b, one)]);
    }
}
