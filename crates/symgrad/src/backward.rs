//! Reverse-mode differentiation.

use crate::context::Context;
use crate::error::GraphError;
use crate::gradients::Gradients;
use crate::graph::{Graph, Operand, TensorId};
use crate::ops::GradientOp;
use crate::value::Value;
use log::{debug, trace};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

impl<V: Value> Graph<V> {
    /// Build symbolic gradients of `y` with respect to every tensor it depends on.
    ///
    /// `y` is seeded with the literal `1`. Nodes are visited in reverse
    /// topological order, so each op propagates its fully accumulated
    /// gradient exactly once. A tensor reached along several paths (e.g. both
    /// inputs of `x * x`) receives the sum of all contributions.
    ///
    /// # Errors
    /// - [`GraphError::UnknownTensor`] if `y` is not in this graph
    /// - [`GraphError::ArityMismatch`] if an op returns a different number of
    ///   local gradients than it has inputs
    pub fn gradients(&mut self, y: TensorId) -> Result<Gradients, GraphError> {
        self.node(y)?;

        let order = reverse_topological_order(self, y);

        let mut gradients = Gradients::new(y);
        let seed = self.convert(1.0)?;
        gradients.accumulate(self, y, seed)?;

        for id in order {
            let Some(grad) = gradients.get(id) else {
                continue;
            };

            let Some(op_id) = self.tensors[id.index()].op() else {
                // Leaf: nothing further to propagate.
                continue;
            };

            let op = &self.ops[op_id.index()];
            let operation = op.shared_operation();
            let inputs = op.inputs().to_vec();
            let name = op.name().to_string();
            trace!("backward through {}(\"{}\") with gradient {}", operation.kind(), name, grad);

            let local_grads = operation.gradient(self, &inputs, grad)?;
            if local_grads.len() != inputs.len() {
                return Err(GraphError::ArityMismatch {
                    kind: operation.kind(),
                    name,
                    expected: inputs.len(),
                    actual: local_grads.len(),
                });
            }

            for (input, local_grad) in inputs.into_iter().zip(local_grads) {
                gradients.accumulate(self, input, local_grad)?;
            }
        }

        Ok(gradients)
    }

    /// Create a gradient node whose value is `dy/dx`.
    ///
    /// The returned tensor evaluates to the derivative, broadcast to the shape
    /// of `x`. If `x` is not reachable from `y` the derivative is zero, and
    /// the node evaluates to zeros shaped like `x`.
    ///
    /// The node takes `x` as an input to learn its runtime shape, so `x` must
    /// be bound when the node is evaluated, even when it is unreachable.
    ///
    /// # Example
    ///
    /// ```
    /// use symgrad::{Context, Graph};
    ///
    /// let mut graph: Graph<f64> = Graph::new();
    /// let a = graph.placeholder("a");
    /// let b = graph.placeholder("b");
    /// let y = graph.div(a, b).unwrap();
    /// let dy_db = graph.gradient(y, b).unwrap();
    ///
    /// let ctx = Context::new().with(a, 6.0).with(b, 3.0);
    /// let value = graph.evaluate(dy_db, &ctx).unwrap();
    /// assert!((value + 2.0 / 3.0).abs() < 1e-12);
    /// ```
    pub fn gradient(&mut self, y: TensorId, x: TensorId) -> Result<TensorId, GraphError> {
        let y_node = self.node(y)?;
        let x_node = self.node(x)?;
        debug!("computing the derivative of {} w.r.t. {}", y_node, x_node);
        let name = format!("grad_{}", x_node.name());

        let gradients = self.gradients(y)?;
        let derivative = match gradients.get(x) {
            Some(derivative) => derivative,
            None => {
                debug!("{} is not reachable from {}; gradient is zero", x, y);
                self.convert(0.0)?
            }
        };

        let inputs = [Operand::Tensor(x), Operand::Tensor(derivative)];
        self.apply(Rc::new(GradientOp::new(y, x)), inputs, Some(&name))
    }

    /// Evaluate every gradient in `gradients` numerically.
    pub fn evaluate_gradients(
        &self,
        gradients: &Gradients,
        context: &Context<V>,
    ) -> Result<HashMap<TensorId, V>, GraphError> {
        let mut memo = HashMap::new();
        gradients
            .iter()
            .map(|(id, grad)| Ok((id, self.evaluate_into(grad, context, &mut memo)?)))
            .collect()
    }
}

/// Tensors reachable from `start`, ordered outputs-first.
///
/// Inputs always have smaller handles than the tensors they feed, so sorting
/// the reachable set by descending handle yields a reverse topological order.
fn reverse_topological_order<V: Value>(graph: &Graph<V>, start: TensorId) -> Vec<TensorId> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();

    queue.push_back(start);

    while let Some(id) = queue.pop_front() {
        if !visited.insert(id) {
            continue;
        }

        if let Some(op_id) = graph.tensors[id.index()].op() {
            for &input in graph.ops[op_id.index()].inputs() {
                if !visited.contains(&input) {
                    queue.push_back(input);
                }
            }
        }
    }

    let mut order: Vec<TensorId> = visited.into_iter().collect();
    order.sort_unstable_by(|a, b| b.cmp(a));
    order
}
