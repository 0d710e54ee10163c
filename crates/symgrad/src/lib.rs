//! symgrad - symbolic computation graphs with reverse-mode differentiation
//!
//! Users build an expression graph of tensor-valued nodes, evaluate any node
//! given bindings for its free variables, and ask for the gradient of one
//! node with respect to another. Gradients are themselves graph nodes, so
//! they can be evaluated, combined and differentiated again.
//!
//! # Architecture
//!
//! ```text
//! Scope<V> ── Expr (+ - * / neg) ──► Graph<V> factory (add, sub, mul, div, square, neg)
//!                                          │
//!                                          ▼
//!                       Vec<TensorNode<V>>  +  Vec<OpNode<V>>   (arena, TensorId / OpId)
//!                                                   │
//!                                                   ▼
//!                                     Rc<dyn Operation<V>>: compute + gradient
//!
//! Graph::evaluate(t, &Context)   forward pass, explicit worklist
//! Graph::gradient(y, x)          backward pass → GradientOp node
//! ```
//!
//! Numbers are supplied by any type implementing [`Value`]: `f64`, and
//! `ndarray::ArrayD<f64>` with the `ndarray` feature (on by default).
//!
//! # Example
//!
//! ```
//! use symgrad::{Context, Graph};
//!
//! let mut graph: Graph<f64> = Graph::new();
//! let a = graph.placeholder("a");
//! let b = graph.placeholder("b");
//!
//! // y = a / b + a²
//! let ratio = graph.div(a, b).unwrap();
//! let a_sq = graph.square(a).unwrap();
//! let y = graph.add(ratio, a_sq).unwrap();
//!
//! let dy_da = graph.gradient(y, a).unwrap();
//! let dy_db = graph.gradient(y, b).unwrap();
//!
//! let ctx = Context::new().with(a, 6.0).with(b, 3.0);
//! assert_eq!(graph.evaluate(y, &ctx).unwrap(), 38.0);
//!
//! // dy/da = 1/b + 2a, dy/db = -a/b²
//! let grads = graph.evaluate_many(&[dy_da, dy_db], &ctx).unwrap();
//! assert!((grads[0] - (1.0 / 3.0 + 12.0)).abs() < 1e-12);
//! assert!((grads[1] + 2.0 / 3.0).abs() < 1e-12);
//! ```

mod backward;
pub mod context;
pub mod error;
mod evaluate;
pub mod expr;
pub mod gradients;
pub mod graph;
pub mod ops;
pub mod shape;
pub mod value;

pub use context::Context;
pub use error::GraphError;
pub use expr::{Expr, Scope};
pub use gradients::Gradients;
pub use graph::{Graph, OpId, OpNode, Operand, TensorId, TensorNode};
pub use ops::{AddOp, DivOp, GradientOp, MulOp, Operation, SquareOp, SubOp};
pub use shape::Shape;
pub use value::Value;
