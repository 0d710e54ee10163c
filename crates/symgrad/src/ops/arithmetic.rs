//! Elementwise arithmetic operations.
//!
//! | Op     | compute  | local gradients given `g` |
//! |--------|----------|---------------------------|
//! | Add    | a + b    | g, g                      |
//! | Sub    | a - b    | g, -g                     |
//! | Mul    | a * b    | b*g, a*g                  |
//! | Div    | a / b    | g/b, g*(-a/b²)            |
//! | Square | a²       | 2a*g                      |

use super::{Operation, fixed};
use crate::error::GraphError;
use crate::graph::{Graph, TensorId};
use crate::value::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct AddOp;

impl<V: Value> Operation<V> for AddOp {
    fn kind(&self) -> &'static str {
        "Add"
    }

    fn arity(&self) -> usize {
        2
    }

    fn compute(&self, inputs: &[&V]) -> Result<V, GraphError> {
        let [a, b] = fixed::<_, 2>("Add", inputs)?;
        a.try_add(b)
    }

    fn gradient(
        &self,
        _graph: &mut Graph<V>,
        _inputs: &[TensorId],
        grad: TensorId,
    ) -> Result<Vec<TensorId>, GraphError> {
        Ok(vec![grad, grad])
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SubOp;

impl<V: Value> Operation<V> for SubOp {
    fn kind(&self) -> &'static str {
        "Sub"
    }

    fn arity(&self) -> usize {
        2
    }

    fn compute(&self, inputs: &[&V]) -> Result<V, GraphError> {
        let [a, b] = fixed::<_, 2>("Sub", inputs)?;
        a.try_sub(b)
    }

    fn gradient(
        &self,
        graph: &mut Graph<V>,
        _inputs: &[TensorId],
        grad: TensorId,
    ) -> Result<Vec<TensorId>, GraphError> {
        Ok(vec![grad, graph.neg(grad)?])
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MulOp;

impl<V: Value> Operation<V> for MulOp {
    fn kind(&self) -> &'static str {
        "Mul"
    }

    fn arity(&self) -> usize {
        2
    }

    fn compute(&self, inputs: &[&V]) -> Result<V, GraphError> {
        let [a, b] = fixed::<_, 2>("Mul", inputs)?;
        a.try_mul(b)
    }

    fn gradient(
        &self,
        graph: &mut Graph<V>,
        inputs: &[TensorId],
        grad: TensorId,
    ) -> Result<Vec<TensorId>, GraphError> {
        let &[a, b] = fixed::<_, 2>("Mul", inputs)?;
        Ok(vec![graph.mul(b, grad)?, graph.mul(a, grad)?])
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DivOp;

impl<V: Value> Operation<V> for DivOp {
    fn kind(&self) -> &'static str {
        "Div"
    }

    fn arity(&self) -> usize {
        2
    }

    fn compute(&self, inputs: &[&V]) -> Result<V, GraphError> {
        let [a, b] = fixed::<_, 2>("Div", inputs)?;
        a.try_div(b)
    }

    fn gradient(
        &self,
        graph: &mut Graph<V>,
        inputs: &[TensorId],
        grad: TensorId,
    ) -> Result<Vec<TensorId>, GraphError> {
        let &[a, b] = fixed::<_, 2>("Div", inputs)?;
        let grad_a = graph.div(grad, b)?;

        // d(a/b)/db = -a / b²
        let b_squared = graph.square(b)?;
        let ratio = graph.div(a, b_squared)?;
        let neg_ratio = graph.neg(ratio)?;
        let grad_b = graph.mul(grad, neg_ratio)?;

        Ok(vec![grad_a, grad_b])
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SquareOp;

impl<V: Value> Operation<V> for SquareOp {
    fn kind(&self) -> &'static str {
        "Square"
    }

    fn arity(&self) -> usize {
        1
    }

    fn compute(&self, inputs: &[&V]) -> Result<V, GraphError> {
        let [a] = fixed::<_, 1>("Square", inputs)?;
        Ok(a.powi(2))
    }

    fn gradient(
        &self,
        graph: &mut Graph<V>,
        inputs: &[TensorId],
        grad: TensorId,
    ) -> Result<Vec<TensorId>, GraphError> {
        let &[a] = fixed::<_, 1>("Square", inputs)?;
        let two_a = graph.mul(2.0, a)?;
        Ok(vec![graph.mul(two_a, grad)?])
    }
}
