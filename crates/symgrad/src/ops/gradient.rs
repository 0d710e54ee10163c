//! Gradient node: the derivative of one tensor with respect to another.

use super::{Operation, fixed};
use crate::error::GraphError;
use crate::graph::{Graph, TensorId};
use crate::shape::Shape;
use crate::value::Value;

/// Op whose output is `dy/dx`.
///
/// Created by [`Graph::gradient`]. Its inputs are `[x, derivative]`, where
/// `derivative` is the symbolic expression built by the backward pass.
/// Computing it broadcasts the derivative to the shape of `x`, summing over
/// any axes where the derivative is wider than `x`, so the value always has
/// the shape of `x`. The op is differentiable, so gradients of gradients
/// compose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradientOp {
    y: TensorId,
    x: TensorId,
}

impl GradientOp {
    pub(crate) fn new(y: TensorId, x: TensorId) -> Self {
        Self { y, x }
    }

    /// Differentiated tensor.
    pub fn y(&self) -> TensorId {
        self.y
    }

    /// Tensor the derivative is taken with respect to.
    pub fn x(&self) -> TensorId {
        self.x
    }
}

impl<V: Value> Operation<V> for GradientOp {
    fn kind(&self) -> &'static str {
        "Gradient"
    }

    fn arity(&self) -> usize {
        2
    }

    fn infer_shape(&self, inputs: &[&Shape]) -> Result<Shape, GraphError> {
        let [x, _] = fixed::<_, 2>("Gradient", inputs)?;
        Ok((*x).clone())
    }

    fn compute(&self, inputs: &[&V]) -> Result<V, GraphError> {
        let [x, derivative] = fixed::<_, 2>("Gradient", inputs)?;
        x.zeros_like()
            .try_add(derivative)?
            .sum_to_shape(&x.shape())
    }

    fn gradient(
        &self,
        graph: &mut Graph<V>,
        _inputs: &[TensorId],
        grad: TensorId,
    ) -> Result<Vec<TensorId>, GraphError> {
        // x only contributes its shape.
        let zero = graph.convert(0.0)?;
        Ok(vec![zero, grad])
    }
}
