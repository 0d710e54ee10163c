//! Array-valued graphs backed by `ndarray`.

#![cfg(feature = "ndarray")]

use approx::assert_relative_eq;
use ndarray::{ArrayD, IxDyn, arr1, arr2};
use symgrad::{Context, Graph, GraphError, Scope};

fn vector(data: &[f64]) -> ArrayD<f64> {
    arr1(data).into_dyn()
}

#[test]
fn test_elementwise_forward() {
    let mut graph: Graph<ArrayD<f64>> = Graph::new();
    let a = graph.placeholder_with_shape("a", &[3]);
    let b = graph.placeholder_with_shape("b", &[3]);
    let q = graph.div(a, b).unwrap();
    let y = graph.sub(q, 1.0).unwrap();

    let ctx = Context::new()
        .with(a, vector(&[2.0, 9.0, -4.0]))
        .with(b, vector(&[1.0, 3.0, 2.0]));
    assert_eq!(graph.evaluate(y, &ctx).unwrap(), vector(&[1.0, 2.0, -3.0]));
    assert_eq!(graph.node(y).unwrap().shape().as_slice(), &[3]);
}

#[test]
fn test_gradient_of_product_with_itself() {
    let mut graph: Graph<ArrayD<f64>> = Graph::new();
    let x = graph.placeholder_with_shape("x", &[3]);
    let y = graph.mul(x, x).unwrap();
    let dy_dx = graph.gradient(y, x).unwrap();

    let ctx = Context::new().with(x, vector(&[3.0, -2.0, 0.5]));
    assert_eq!(graph.evaluate(dy_dx, &ctx).unwrap(), vector(&[6.0, -4.0, 1.0]));
}

#[test]
fn test_gradient_takes_shape_of_target() {
    // dy/da of a + b is 1 everywhere, shaped like a.
    let mut graph: Graph<ArrayD<f64>> = Graph::new();
    let a = graph.placeholder_with_shape("a", &[2, 2]);
    let b = graph.placeholder_with_shape("b", &[2, 2]);
    let y = graph.add(a, b).unwrap();
    let dy_da = graph.gradient(y, a).unwrap();

    let ctx = Context::new()
        .with(a, arr2(&[[1.0, 2.0], [3.0, 4.0]]).into_dyn())
        .with(b, arr2(&[[5.0, 6.0], [7.0, 8.0]]).into_dyn());
    assert_eq!(
        graph.evaluate(dy_da, &ctx).unwrap(),
        ArrayD::from_elem(IxDyn(&[2, 2]), 1.0)
    );
}

#[test]
fn test_gradient_of_quotient() {
    let scope: Scope<ArrayD<f64>> = Scope::new();
    let a = scope.placeholder_with_shape("a", &[2]);
    let b = scope.placeholder_with_shape("b", &[2]);
    let y = a / b;
    let dy_db = scope.gradient(y, b).unwrap();

    let ctx = Context::new()
        .with(a.id(), vector(&[6.0, 1.0]))
        .with(b.id(), vector(&[3.0, 2.0]));
    let grad = scope.evaluate(dy_db, &ctx).unwrap();
    assert_relative_eq!(grad[[0]], -2.0 / 3.0);
    assert_relative_eq!(grad[[1]], -0.25);
}

#[test]
fn test_array_literal_promotion() {
    let mut graph: Graph<ArrayD<f64>> = Graph::new();
    let x = graph.placeholder_with_shape("x", &[2]);
    let w = graph.convert(vector(&[10.0, 100.0])).unwrap();
    let y = graph.mul(x, w).unwrap();
    let dy_dx = graph.gradient(y, x).unwrap();

    assert_eq!(graph.node(w).unwrap().shape().as_slice(), &[2]);

    let ctx = Context::new().with(x, vector(&[1.0, 2.0]));
    assert_eq!(graph.evaluate(y, &ctx).unwrap(), vector(&[10.0, 200.0]));
    assert_eq!(graph.evaluate(dy_dx, &ctx).unwrap(), vector(&[10.0, 100.0]));
}

#[test]
fn test_gradient_sums_over_broadcast_axes() {
    // A scalar weight scaling a vector: the gradient stays scalar.
    let mut graph: Graph<ArrayD<f64>> = Graph::new();
    let x = graph.placeholder("x");
    let y = graph.mul(x, vector(&[10.0, 20.0])).unwrap();
    let dy_dx = graph.gradient(y, x).unwrap();

    assert!(graph.node(dy_dx).unwrap().shape().is_empty());

    let ctx = Context::new().with(x, ArrayD::from_elem(IxDyn(&[]), 3.0));
    let grad = graph.evaluate(dy_dx, &ctx).unwrap();
    assert!(grad.shape().is_empty());
    assert_relative_eq!(grad.sum(), 30.0);
}

#[test]
fn test_gradient_sums_over_unit_axis() {
    let mut graph: Graph<ArrayD<f64>> = Graph::new();
    let x = graph.placeholder_with_shape("x", &[2, 1]);
    let w = graph.placeholder_with_shape("w", &[2, 3]);
    let y = graph.mul(x, w).unwrap();
    let dy_dx = graph.gradient(y, x).unwrap();

    assert_eq!(graph.node(dy_dx).unwrap().shape().as_slice(), &[2, 1]);

    let ctx = Context::new()
        .with(x, arr2(&[[1.0], [2.0]]).into_dyn())
        .with(w, arr2(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).into_dyn());
    assert_eq!(
        graph.evaluate(dy_dx, &ctx).unwrap(),
        arr2(&[[6.0], [15.0]]).into_dyn()
    );
}

#[test]
fn test_disconnected_target_is_zeros() {
    let mut graph: Graph<ArrayD<f64>> = Graph::new();
    let x = graph.placeholder_with_shape("x", &[2]);
    let w = graph.placeholder_with_shape("w", &[3]);
    let y = graph.square(x).unwrap();
    let dy_dw = graph.gradient(y, w).unwrap();

    let ctx = Context::new()
        .with(x, vector(&[1.0, 2.0]))
        .with(w, vector(&[1.0, 1.0, 1.0]));
    assert_eq!(graph.evaluate(dy_dw, &ctx).unwrap(), ArrayD::zeros(IxDyn(&[3])));
}

#[test]
fn test_declared_shape_mismatch() {
    let mut graph: Graph<ArrayD<f64>> = Graph::new();
    let a = graph.placeholder_with_shape("a", &[2]);
    let b = graph.placeholder_with_shape("b", &[3]);
    let err = graph.add(a, b).unwrap_err();
    assert!(matches!(err, GraphError::ShapeMismatch { .. }));
}

#[test]
fn test_bound_shape_mismatch() {
    // Undeclared placeholders default to scalar shape, so the mismatch only
    // shows up once values are bound.
    let mut graph: Graph<ArrayD<f64>> = Graph::new();
    let a = graph.placeholder("a");
    let b = graph.placeholder("b");
    let y = graph.mul(a, b).unwrap();

    let ctx = Context::new()
        .with(a, vector(&[1.0, 2.0]))
        .with(b, vector(&[1.0, 2.0, 3.0]));
    let err = graph.evaluate(y, &ctx).unwrap_err();
    assert!(matches!(err, GraphError::ShapeMismatch { .. }));
}
