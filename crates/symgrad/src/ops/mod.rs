//! Graph operations.
//!
//! Each operation knows how to compute its output from concrete input values
//! and how to express the local gradients of its inputs as new graph nodes.

mod arithmetic;
mod gradient;

pub use arithmetic::{AddOp, DivOp, MulOp, SquareOp, SubOp};
pub use gradient::GradientOp;

use crate::error::GraphError;
use crate::graph::{Graph, TensorId};
use crate::shape::{Shape, broadcast_shapes, scalar_shape};
use crate::value::Value;
use std::fmt::Debug;

/// Operation trait.
///
/// Implementors have a fixed arity and exactly one output. Custom operations
/// can be attached with [`Graph::apply`].
pub trait Operation<V: Value>: Debug {
    /// Variant name used in diagnostics, e.g. `"Add"`.
    fn kind(&self) -> &'static str;

    /// Number of inputs.
    fn arity(&self) -> usize;

    /// Output shape given input shapes. Defaults to broadcasting all inputs.
    fn infer_shape(&self, inputs: &[&Shape]) -> Result<Shape, GraphError> {
        inputs.iter().try_fold(scalar_shape(), |acc, shape| {
            broadcast_shapes(&acc, shape).ok_or_else(|| GraphError::ShapeMismatch {
                lhs: acc.clone(),
                rhs: (*shape).clone(),
            })
        })
    }

    /// Compute the output value from input values, in input order.
    fn compute(&self, inputs: &[&V]) -> Result<V, GraphError>;

    /// Build local gradient expressions.
    ///
    /// Given the symbolic gradient `grad` of the output, return one tensor per
    /// input representing `d(output)/d(input_i) * grad`. New nodes are created
    /// through `graph`, so the result is itself differentiable.
    fn gradient(
        &self,
        graph: &mut Graph<V>,
        inputs: &[TensorId],
        grad: TensorId,
    ) -> Result<Vec<TensorId>, GraphError>;
}

/// View `items` as a fixed-size array, or report an arity mismatch for `kind`.
///
/// The error carries `kind` as its name; evaluation replaces it with the name
/// of the failing op node.
pub(crate) fn fixed<'a, T, const N: usize>(
    kind: &'static str,
    items: &'a [T],
) -> Result<&'a [T; N], GraphError> {
    items.try_into().map_err(|_| GraphError::ArityMismatch {
        kind,
        name: kind.to_string(),
        expected: N,
        actual: items.len(),
    })
}
