//! Computation graph: the arena that owns every tensor and op.
//!
//! Tensors and ops are appended, never removed, and addressed by integer
//! handles. An op's inputs are always converted before its output is
//! allocated, so every input handle is smaller than the handle of the tensor
//! it feeds. Descending handle order is therefore a valid reverse
//! topological order, which the backward pass relies on.

use crate::error::GraphError;
use crate::ops::{AddOp, DivOp, MulOp, Operation, SquareOp, SubOp};
use crate::shape::{Shape, scalar_shape};
use crate::value::Value;
use smallvec::SmallVec;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

// 0 is never handed out, so test handles belong to no graph.
static NEXT_GRAPH_ID: AtomicU32 = AtomicU32::new(1);

fn next_graph_id() -> u32 {
    NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed)
}

/// Handle to a tensor in a [`Graph`].
///
/// Handles remember the graph that issued them; passing one to another graph
/// fails with [`GraphError::UnknownTensor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TensorId {
    graph: u32,
    index: usize,
}

impl TensorId {
    /// Get the internal index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Create a TensorId for testing purposes.
    #[cfg(test)]
    pub(crate) fn new_for_test(index: usize) -> Self {
        Self { graph: 0, index }
    }
}

impl fmt::Display for TensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.index)
    }
}

/// Handle to an op in a [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpId {
    graph: u32,
    index: usize,
}

impl OpId {
    /// Get the internal index.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// A tensor node.
///
/// Leaves have no producing op: a leaf with a value is a constant, a leaf
/// without one is a placeholder that must be bound in a
/// [`Context`](crate::Context) at evaluation time.
#[derive(Debug, Clone)]
pub struct TensorNode<V> {
    value: Option<V>,
    shape: Shape,
    op: Option<OpId>,
    name: String,
}

impl<V> TensorNode<V> {
    /// Bound value, if any.
    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    /// Declared or inferred shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Op that produced this tensor (None for leaves).
    pub fn op(&self) -> Option<OpId> {
        self.op
    }

    /// Diagnostic name, not necessarily unique.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if this tensor has no producing op.
    pub fn is_leaf(&self) -> bool {
        self.op.is_none()
    }

    /// Check if this is a free leaf awaiting a context binding.
    pub fn is_placeholder(&self) -> bool {
        self.op.is_none() && self.value.is_none()
    }
}

impl<V> fmt::Display for TensorNode<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor(\"{}\", shape={:?})", self.name, self.shape.as_slice())
    }
}

/// An op node: one operation applied to fixed-arity inputs, with exactly one output.
#[derive(Debug)]
pub struct OpNode<V: Value> {
    op: Rc<dyn Operation<V>>,
    inputs: SmallVec<[TensorId; 2]>,
    output: TensorId,
    name: String,
}

impl<V: Value> OpNode<V> {
    /// The operation rule.
    pub fn operation(&self) -> &dyn Operation<V> {
        self.op.as_ref()
    }

    pub(crate) fn shared_operation(&self) -> Rc<dyn Operation<V>> {
        Rc::clone(&self.op)
    }

    /// Variant name, e.g. `"Mul"`.
    pub fn kind(&self) -> &'static str {
        self.op.kind()
    }

    /// Ordered input tensors.
    pub fn inputs(&self) -> &[TensorId] {
        &self.inputs
    }

    /// The single output tensor.
    pub fn output(&self) -> TensorId {
        self.output
    }

    /// Diagnostic name, defaulting to the kind.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<V: Value> fmt::Display for OpNode<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(\"{}\")", self.kind(), self.name)
    }
}

/// Input to a factory method: an existing tensor or a literal to promote.
#[derive(Debug, Clone)]
pub enum Operand<V> {
    Tensor(TensorId),
    Literal(V),
}

impl<V> From<TensorId> for Operand<V> {
    fn from(id: TensorId) -> Self {
        Operand::Tensor(id)
    }
}

impl<V: Value> From<f64> for Operand<V> {
    fn from(value: f64) -> Self {
        Operand::Literal(V::from_scalar(value))
    }
}

#[cfg(feature = "ndarray")]
impl From<ndarray::ArrayD<f64>> for Operand<ndarray::ArrayD<f64>> {
    fn from(value: ndarray::ArrayD<f64>) -> Self {
        Operand::Literal(value)
    }
}

/// Owning registry of all tensors and ops for one computation.
///
/// Every node is created through the factory methods here; operator sugar in
/// [`Scope`](crate::Scope) routes through the same methods.
///
/// # Example
///
/// ```
/// use symgrad::{Context, Graph};
///
/// let mut graph: Graph<f64> = Graph::new();
/// let x = graph.placeholder("x");
/// let y = graph.mul(x, x).unwrap();
/// let dy_dx = graph.gradient(y, x).unwrap();
///
/// let ctx = Context::new().with(x, 3.0);
/// assert_eq!(graph.evaluate(y, &ctx).unwrap(), 9.0);
/// assert_eq!(graph.evaluate(dy_dx, &ctx).unwrap(), 6.0);
/// ```
pub struct Graph<V: Value> {
    id: u32,
    pub(crate) tensors: Vec<TensorNode<V>>,
    pub(crate) ops: Vec<OpNode<V>>,
}

impl<V: Value> Graph<V> {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self {
            id: next_graph_id(),
            tensors: Vec::new(),
            ops: Vec::new(),
        }
    }

    /// Create and register a leaf tensor.
    ///
    /// The shape is taken from `value` when present, else from `shape`, else
    /// it defaults to the scalar shape.
    pub fn tensor(&mut self, value: Option<V>, shape: Option<&[usize]>, name: &str) -> TensorId {
        let shape = match (&value, shape) {
            (Some(v), _) => v.shape(),
            (None, Some(s)) => Shape::from_slice(s),
            (None, None) => scalar_shape(),
        };
        self.push_tensor(value, shape, None, name.to_string())
    }

    /// Create a scalar-shaped placeholder.
    pub fn placeholder(&mut self, name: &str) -> TensorId {
        self.tensor(None, None, name)
    }

    /// Create a placeholder with a declared shape.
    pub fn placeholder_with_shape(&mut self, name: &str, shape: &[usize]) -> TensorId {
        self.tensor(None, Some(shape), name)
    }

    /// Create a constant leaf.
    pub fn constant(&mut self, value: V, name: &str) -> TensorId {
        self.tensor(Some(value), None, name)
    }

    /// Turn an operand into a tensor of this graph.
    ///
    /// Tensors are returned unchanged; literals become new constants.
    pub fn convert(&mut self, operand: impl Into<Operand<V>>) -> Result<TensorId, GraphError> {
        let operand: Operand<V> = operand.into();
        match operand {
            Operand::Tensor(id) => {
                self.node(id)?;
                Ok(id)
            }
            Operand::Literal(value) => Ok(self.constant(value, "Const")),
        }
    }

    /// Apply an operation to inputs, returning its output tensor.
    ///
    /// Inputs are converted first. The op is named `name` (or its kind) and
    /// the output `"<name>:0"`.
    ///
    /// # Errors
    /// Returns [`GraphError::ArityMismatch`] if the input count differs from
    /// `op.arity()`, and [`GraphError::ShapeMismatch`] if the input shapes are
    /// incompatible.
    pub fn apply<I>(
        &mut self,
        op: Rc<dyn Operation<V>>,
        inputs: I,
        name: Option<&str>,
    ) -> Result<TensorId, GraphError>
    where
        I: IntoIterator<Item = Operand<V>>,
    {
        let name = name.unwrap_or(op.kind()).to_string();
        let operands: Vec<Operand<V>> = inputs.into_iter().collect();
        if operands.len() != op.arity() {
            return Err(GraphError::ArityMismatch {
                kind: op.kind(),
                name,
                expected: op.arity(),
                actual: operands.len(),
            });
        }

        let inputs = operands
            .into_iter()
            .map(|operand| self.convert(operand))
            .collect::<Result<SmallVec<[TensorId; 2]>, _>>()?;

        let shapes: Vec<&Shape> = inputs.iter().map(|id| &self.tensors[id.index].shape).collect();
        let shape = op.infer_shape(&shapes)?;

        let op_id = OpId {
            graph: self.id,
            index: self.ops.len(),
        };
        let output = self.push_tensor(None, shape, Some(op_id), format!("{name}:0"));
        self.ops.push(OpNode {
            op,
            inputs,
            output,
            name,
        });

        Ok(output)
    }

    /// `a + b`
    pub fn add(
        &mut self,
        a: impl Into<Operand<V>>,
        b: impl Into<Operand<V>>,
    ) -> Result<TensorId, GraphError> {
        let inputs: [Operand<V>; 2] = [a.into(), b.into()];
        self.apply(Rc::new(AddOp), inputs, None)
    }

    /// `a - b`
    pub fn sub(
        &mut self,
        a: impl Into<Operand<V>>,
        b: impl Into<Operand<V>>,
    ) -> Result<TensorId, GraphError> {
        let inputs: [Operand<V>; 2] = [a.into(), b.into()];
        self.apply(Rc::new(SubOp), inputs, None)
    }

    /// `a * b`
    pub fn mul(
        &mut self,
        a: impl Into<Operand<V>>,
        b: impl Into<Operand<V>>,
    ) -> Result<TensorId, GraphError> {
        let inputs: [Operand<V>; 2] = [a.into(), b.into()];
        self.apply(Rc::new(MulOp), inputs, None)
    }

    /// `a / b`
    pub fn div(
        &mut self,
        a: impl Into<Operand<V>>,
        b: impl Into<Operand<V>>,
    ) -> Result<TensorId, GraphError> {
        let inputs: [Operand<V>; 2] = [a.into(), b.into()];
        self.apply(Rc::new(DivOp), inputs, None)
    }

    /// `a * a`
    pub fn square(&mut self, a: impl Into<Operand<V>>) -> Result<TensorId, GraphError> {
        let inputs: [Operand<V>; 1] = [a.into()];
        self.apply(Rc::new(SquareOp), inputs, None)
    }

    /// `-a`, lowered to `0 - a`.
    pub fn neg(&mut self, a: impl Into<Operand<V>>) -> Result<TensorId, GraphError> {
        let inputs: [Operand<V>; 2] = [Operand::Literal(V::from_scalar(0.0)), a.into()];
        self.apply(Rc::new(SubOp), inputs, Some("Neg"))
    }

    // === Accessors ===

    /// Get a tensor node.
    pub fn node(&self, id: TensorId) -> Result<&TensorNode<V>, GraphError> {
        if id.graph != self.id {
            return Err(GraphError::UnknownTensor(id));
        }
        self.tensors.get(id.index).ok_or(GraphError::UnknownTensor(id))
    }

    /// Get an op node.
    pub fn op(&self, id: OpId) -> Option<&OpNode<V>> {
        if id.graph != self.id {
            return None;
        }
        self.ops.get(id.index)
    }

    /// Get the op that produced `id`, or None for leaves.
    pub fn producing_op(&self, id: TensorId) -> Result<Option<&OpNode<V>>, GraphError> {
        Ok(self.node(id)?.op.and_then(|op| self.op(op)))
    }

    /// Check if `id` refers to a tensor of this graph.
    pub fn contains(&self, id: TensorId) -> bool {
        id.graph == self.id && id.index < self.tensors.len()
    }

    /// Iterate over all tensors in creation order.
    pub fn tensors(&self) -> impl Iterator<Item = (TensorId, &TensorNode<V>)> {
        self.tensors
            .iter()
            .enumerate()
            .map(|(index, node)| {
                let id = TensorId {
                    graph: self.id,
                    index,
                };
                (id, node)
            })
    }

    /// Number of tensors.
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    /// Check if graph has no tensors.
    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Number of ops.
    pub fn num_ops(&self) -> usize {
        self.ops.len()
    }

    fn push_tensor(
        &mut self,
        value: Option<V>,
        shape: Shape,
        op: Option<OpId>,
        name: String,
    ) -> TensorId {
        let id = TensorId {
            graph: self.id,
            index: self.tensors.len(),
        };
        self.tensors.push(TensorNode {
            value,
            shape,
            op,
            name,
        });
        id
    }
}

impl<V: Value> Default for Graph<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Value> fmt::Debug for Graph<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("num_tensors", &self.tensors.len())
            .field("num_ops", &self.ops.len())
            .finish()
    }
}
