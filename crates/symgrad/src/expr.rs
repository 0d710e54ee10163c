//! Operator sugar for building graphs.
//!
//! [`Expr`] handles implement `+ - * /` and unary `-` by calling the factory
//! methods of the [`Graph`] owned by their [`Scope`], so every expression is
//! lowered into graph nodes rather than computed eagerly.

use crate::context::Context;
use crate::error::GraphError;
use crate::graph::{Graph, Operand, TensorId};
use crate::value::Value;
use std::cell::{Ref, RefCell};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Owner of a graph that hands out [`Expr`] handles.
///
/// # Example
///
/// ```
/// use symgrad::{Context, Scope};
///
/// let scope: Scope<f64> = Scope::new();
/// let x = scope.placeholder("x");
/// let y = (x + 1.0) * (x + 1.0);
/// let dy_dx = scope.gradient(y, x).unwrap();
///
/// let ctx = Context::new().with(x.id(), 2.0);
/// assert_eq!(scope.evaluate(y, &ctx).unwrap(), 9.0);
/// assert_eq!(scope.evaluate(dy_dx, &ctx).unwrap(), 6.0);
/// ```
pub struct Scope<V: Value> {
    graph: RefCell<Graph<V>>,
}

impl<V: Value> Scope<V> {
    /// Create a scope with an empty graph.
    pub fn new() -> Self {
        Self::from_graph(Graph::new())
    }

    /// Wrap an existing graph.
    pub fn from_graph(graph: Graph<V>) -> Self {
        Self {
            graph: RefCell::new(graph),
        }
    }

    /// Create a scalar-shaped placeholder.
    pub fn placeholder(&self, name: &str) -> Expr<'_, V> {
        let id = self.graph.borrow_mut().placeholder(name);
        self.wrap(id)
    }

    /// Create a placeholder with a declared shape.
    pub fn placeholder_with_shape(&self, name: &str, shape: &[usize]) -> Expr<'_, V> {
        let id = self.graph.borrow_mut().placeholder_with_shape(name, shape);
        self.wrap(id)
    }

    /// Create a constant leaf.
    pub fn constant(&self, value: V, name: &str) -> Expr<'_, V> {
        let id = self.graph.borrow_mut().constant(value, name);
        self.wrap(id)
    }

    /// Wrap a tensor of this scope's graph.
    pub fn expr(&self, id: TensorId) -> Result<Expr<'_, V>, GraphError> {
        self.graph.borrow().node(id)?;
        Ok(self.wrap(id))
    }

    /// `a * a`
    pub fn square(&self, a: Expr<'_, V>) -> Expr<'_, V> {
        self.check_owner(a);
        let id = self
            .graph
            .borrow_mut()
            .square(a.id)
            .expect("square of a scope tensor");
        self.wrap(id)
    }

    /// Gradient node for `dy/dx`. See [`Graph::gradient`].
    pub fn gradient(&self, y: Expr<'_, V>, x: Expr<'_, V>) -> Result<Expr<'_, V>, GraphError> {
        self.check_owner(y);
        self.check_owner(x);
        let id = self.graph.borrow_mut().gradient(y.id, x.id)?;
        Ok(self.wrap(id))
    }

    /// Evaluate an expression. See [`Graph::evaluate`].
    pub fn evaluate(&self, expr: Expr<'_, V>, context: &Context<V>) -> Result<V, GraphError> {
        self.check_owner(expr);
        self.graph.borrow().evaluate(expr.id, context)
    }

    /// Borrow the underlying graph.
    pub fn graph(&self) -> Ref<'_, Graph<V>> {
        self.graph.borrow()
    }

    /// Run `f` with mutable access to the underlying graph.
    pub fn with_graph<R>(&self, f: impl FnOnce(&mut Graph<V>) -> R) -> R {
        f(&mut self.graph.borrow_mut())
    }

    /// Consume the scope, returning its graph.
    pub fn into_graph(self) -> Graph<V> {
        self.graph.into_inner()
    }

    fn wrap(&self, id: TensorId) -> Expr<'_, V> {
        Expr { id, scope: self }
    }

    fn check_owner(&self, expr: Expr<'_, V>) {
        assert!(
            std::ptr::eq(self, expr.scope),
            "expression {} belongs to a different scope",
            expr.id
        );
    }

    fn binary(
        &self,
        a: Operand<V>,
        b: Operand<V>,
        build: fn(&mut Graph<V>, Operand<V>, Operand<V>) -> Result<TensorId, GraphError>,
    ) -> Expr<'_, V> {
        let id = build(&mut self.graph.borrow_mut(), a, b)
            .unwrap_or_else(|err| panic!("cannot build expression: {err}"));
        self.wrap(id)
    }
}

impl<V: Value> Default for Scope<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Value> fmt::Debug for Scope<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("graph", &*self.graph.borrow())
            .finish()
    }
}

/// Tensor handle bound to a [`Scope`].
///
/// # Panics
/// Arithmetic panics when the operands come from different scopes or their
/// declared shapes cannot be broadcast. Use the [`Graph`] factory methods
/// directly to handle those cases as errors.
pub struct Expr<'s, V: Value> {
    id: TensorId,
    scope: &'s Scope<V>,
}

// Manual impls: deriving would require `V: Copy`.
impl<V: Value> Clone for Expr<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V: Value> Copy for Expr<'_, V> {}

impl<'s, V: Value> Expr<'s, V> {
    /// The underlying tensor handle.
    pub fn id(&self) -> TensorId {
        self.id
    }

    /// The owning scope.
    pub fn scope(&self) -> &'s Scope<V> {
        self.scope
    }

    /// `self * self`
    pub fn square(self) -> Self {
        self.scope.square(self)
    }
}

impl<V: Value> fmt::Debug for Expr<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scope.graph.borrow().node(self.id) {
            Ok(node) => write!(f, "{} {}", self.id, node),
            Err(_) => write!(f, "{}", self.id),
        }
    }
}

impl<V: Value> From<Expr<'_, V>> for Operand<V> {
    fn from(expr: Expr<'_, V>) -> Self {
        Operand::Tensor(expr.id)
    }
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident) => {
        impl<'s, V: Value> $trait for Expr<'s, V> {
            type Output = Expr<'s, V>;

            fn $method(self, rhs: Expr<'s, V>) -> Self::Output {
                self.scope.check_owner(rhs);
                self.scope
                    .binary(self.into(), rhs.into(), |g, a, b| g.$method(a, b))
            }
        }

        impl<'s, V: Value> $trait<f64> for Expr<'s, V> {
            type Output = Expr<'s, V>;

            fn $method(self, rhs: f64) -> Self::Output {
                self.scope
                    .binary(self.into(), rhs.into(), |g, a, b| g.$method(a, b))
            }
        }

        impl<'s, V: Value> $trait<Expr<'s, V>> for f64 {
            type Output = Expr<'s, V>;

            fn $method(self, rhs: Expr<'s, V>) -> Self::Output {
                rhs.scope
                    .binary(self.into(), rhs.into(), |g, a, b| g.$method(a, b))
            }
        }
    };
}

impl_binary_op!(Add, add);
impl_binary_op!(Sub, sub);
impl_binary_op!(Mul, mul);
impl_binary_op!(Div, div);

impl<'s, V: Value> Neg for Expr<'s, V> {
    type Output = Expr<'s, V>;

    fn neg(self) -> Self::Output {
        let id = self
            .scope
            .graph
            .borrow_mut()
            .neg(self.id)
            .expect("negation of a scope tensor");
        self.scope.wrap(id)
    }
}
