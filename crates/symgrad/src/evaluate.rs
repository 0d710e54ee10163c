//! Forward evaluation of graph nodes.

use crate::context::Context;
use crate::error::GraphError;
use crate::graph::{Graph, TensorId};
use crate::value::Value;
use log::trace;
use std::collections::HashMap;

impl<V: Value> Graph<V> {
    /// Evaluate `tensor` given bindings for free leaves.
    ///
    /// Bound values are returned as-is, op outputs are computed from their
    /// evaluated inputs, and placeholders are looked up in `context`.
    /// Evaluation does not mutate the graph, so repeated calls with the same
    /// context return identical results.
    ///
    /// Uses an explicit stack, so graph depth is not limited by the native
    /// call stack. Shared sub-expressions are computed once per call.
    ///
    /// # Errors
    /// - [`GraphError::UnknownTensor`] if `tensor` is not in this graph
    /// - [`GraphError::UnboundVariable`] if a reachable placeholder is missing
    ///   from `context`
    /// - any error raised by an op's computation (e.g. shape mismatches)
    pub fn evaluate(&self, tensor: TensorId, context: &Context<V>) -> Result<V, GraphError> {
        let mut memo = HashMap::new();
        self.evaluate_into(tensor, context, &mut memo)
    }

    /// Evaluate several tensors, sharing work between them.
    pub fn evaluate_many(
        &self,
        tensors: &[TensorId],
        context: &Context<V>,
    ) -> Result<Vec<V>, GraphError> {
        let mut memo = HashMap::new();
        tensors
            .iter()
            .map(|&tensor| self.evaluate_into(tensor, context, &mut memo))
            .collect()
    }

    pub(crate) fn evaluate_into(
        &self,
        target: TensorId,
        context: &Context<V>,
        memo: &mut HashMap<TensorId, V>,
    ) -> Result<V, GraphError> {
        self.node(target)?;

        // (tensor, inputs already scheduled)
        let mut stack = vec![(target, false)];

        while let Some((id, expanded)) = stack.pop() {
            if memo.contains_key(&id) {
                continue;
            }

            let node = &self.tensors[id.index()];
            if let Some(value) = node.value() {
                memo.insert(id, value.clone());
                continue;
            }

            let Some(op_id) = node.op() else {
                let value = context
                    .get(id)
                    .ok_or_else(|| GraphError::UnboundVariable {
                        id,
                        name: node.name().to_string(),
                    })?;
                memo.insert(id, value.clone());
                continue;
            };

            let op = &self.ops[op_id.index()];
            if !expanded {
                stack.push((id, true));
                for &input in op.inputs().iter().rev() {
                    if !memo.contains_key(&input) {
                        stack.push((input, false));
                    }
                }
                continue;
            }

            trace!("evaluating {} -> {}", op, id);
            let value = {
                let inputs = op
                    .inputs()
                    .iter()
                    .map(|input| memo.get(input).ok_or(GraphError::UnknownTensor(*input)))
                    .collect::<Result<Vec<&V>, _>>()?;
                op.operation()
                    .compute(&inputs)
                    .map_err(|err| match err {
                        GraphError::ArityMismatch {
                            kind,
                            expected,
                            actual,
                            ..
                        } => GraphError::ArityMismatch {
                            kind,
                            name: op.name().to_string(),
                            expected,
                            actual,
                        },
                        other => other,
                    })?
            };
            memo.insert(id, value);
        }

        memo.get(&target)
            .cloned()
            .ok_or(GraphError::UnknownTensor(target))
    }
}
