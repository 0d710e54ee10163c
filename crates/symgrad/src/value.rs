//! Value trait - the numeric capability consumed by the graph.
//!
//! The graph never inspects numbers itself. Everything it needs from a
//! concrete numeric type is listed here: elementwise arithmetic, negation,
//! integer powers and shape introspection.

use crate::error::GraphError;
use crate::shape::{Shape, scalar_shape};
use std::fmt::Debug;

/// Numeric value that can be bound to a tensor.
///
/// Binary operations broadcast NumPy-style and report incompatible shapes as
/// [`GraphError::ShapeMismatch`] instead of panicking.
pub trait Value: Clone + Debug + 'static {
    /// Promote a numeric literal.
    fn from_scalar(value: f64) -> Self;

    /// Shape of this value.
    fn shape(&self) -> Shape;

    /// Elementwise `self + rhs`.
    fn try_add(&self, rhs: &Self) -> Result<Self, GraphError>;

    /// Elementwise `self - rhs`.
    fn try_sub(&self, rhs: &Self) -> Result<Self, GraphError>;

    /// Elementwise `self * rhs`.
    fn try_mul(&self, rhs: &Self) -> Result<Self, GraphError>;

    /// Elementwise `self / rhs`.
    fn try_div(&self, rhs: &Self) -> Result<Self, GraphError>;

    /// Elementwise `-self`.
    fn negate(&self) -> Self;

    /// Elementwise integer power.
    fn powi(&self, exp: i32) -> Self;

    /// Zeros with the shape of `self`.
    fn zeros_like(&self) -> Self;

    /// Sum over the axes along which `shape` was broadcast to produce `self`.
    ///
    /// Fails with [`GraphError::ShapeMismatch`] if `self` is not a broadcast
    /// of `shape`.
    fn sum_to_shape(&self, shape: &[usize]) -> Result<Self, GraphError>;
}

impl Value for f64 {
    fn from_scalar(value: f64) -> Self {
        value
    }

    fn shape(&self) -> Shape {
        scalar_shape()
    }

    fn try_add(&self, rhs: &Self) -> Result<Self, GraphError> {
        Ok(self + rhs)
    }

    fn try_sub(&self, rhs: &Self) -> Result<Self, GraphError> {
        Ok(self - rhs)
    }

    fn try_mul(&self, rhs: &Self) -> Result<Self, GraphError> {
        Ok(self * rhs)
    }

    fn try_div(&self, rhs: &Self) -> Result<Self, GraphError> {
        Ok(self / rhs)
    }

    fn negate(&self) -> Self {
        -self
    }

    fn powi(&self, exp: i32) -> Self {
        f64::powi(*self, exp)
    }

    fn zeros_like(&self) -> Self {
        0.0
    }

    fn sum_to_shape(&self, shape: &[usize]) -> Result<Self, GraphError> {
        if !shape.is_empty() {
            return Err(GraphError::ShapeMismatch {
                lhs: scalar_shape(),
                rhs: Shape::from_slice(shape),
            });
        }
        Ok(*self)
    }
}

#[cfg(feature = "ndarray")]
mod array {
    use super::Value;
    use crate::error::GraphError;
    use crate::shape::{Shape, broadcast_shapes};
    use ndarray::{ArrayD, Axis, IxDyn};

    fn check_broadcast(lhs: &ArrayD<f64>, rhs: &ArrayD<f64>) -> Result<(), GraphError> {
        match broadcast_shapes(lhs.shape(), rhs.shape()) {
            Some(_) => Ok(()),
            None => Err(GraphError::ShapeMismatch {
                lhs: Shape::from_slice(lhs.shape()),
                rhs: Shape::from_slice(rhs.shape()),
            }),
        }
    }

    impl Value for ArrayD<f64> {
        fn from_scalar(value: f64) -> Self {
            ArrayD::from_elem(IxDyn(&[]), value)
        }

        fn shape(&self) -> Shape {
            Shape::from_slice(self.shape())
        }

        fn try_add(&self, rhs: &Self) -> Result<Self, GraphError> {
            check_broadcast(self, rhs)?;
            Ok(self + rhs)
        }

        fn try_sub(&self, rhs: &Self) -> Result<Self, GraphError> {
            check_broadcast(self, rhs)?;
            Ok(self - rhs)
        }

        fn try_mul(&self, rhs: &Self) -> Result<Self, GraphError> {
            check_broadcast(self, rhs)?;
            Ok(self * rhs)
        }

        fn try_div(&self, rhs: &Self) -> Result<Self, GraphError> {
            check_broadcast(self, rhs)?;
            Ok(self / rhs)
        }

        fn negate(&self) -> Self {
            -self
        }

        fn powi(&self, exp: i32) -> Self {
            self.mapv(|x| x.powi(exp))
        }

        fn zeros_like(&self) -> Self {
            ArrayD::zeros(self.raw_dim())
        }

        fn sum_to_shape(&self, shape: &[usize]) -> Result<Self, GraphError> {
            let mismatch = || GraphError::ShapeMismatch {
                lhs: Shape::from_slice(self.shape()),
                rhs: Shape::from_slice(shape),
            };
            if self.ndim() < shape.len() {
                return Err(mismatch());
            }

            let mut out = self.clone();
            for _ in 0..self.ndim() - shape.len() {
                out = out.sum_axis(Axis(0));
            }
            for (axis, &dim) in shape.iter().enumerate() {
                if dim == 1 && out.shape()[axis] != 1 {
                    out = out.sum_axis(Axis(axis)).insert_axis(Axis(axis));
                }
            }

            if out.shape() != shape {
                return Err(mismatch());
            }
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f64_arithmetic() {
        assert_eq!(2.0f64.try_add(&3.0).unwrap(), 5.0);
        assert_eq!(2.0f64.try_sub(&3.0).unwrap(), -1.0);
        assert_eq!(2.0f64.try_mul(&3.0).unwrap(), 6.0);
        assert_eq!(6.0f64.try_div(&3.0).unwrap(), 2.0);
        assert_eq!(Value::negate(&4.0f64), -4.0);
        assert_eq!(Value::powi(&-3.0f64, 2), 9.0);
    }

    #[test]
    fn test_f64_is_scalar() {
        assert!(Value::shape(&1.5f64).is_empty());
        assert_eq!(Value::zeros_like(&1.5f64), 0.0);
        assert_eq!(<f64 as Value>::from_scalar(7.0), 7.0);
        assert_eq!(2.5f64.sum_to_shape(&[]).unwrap(), 2.5);
        assert!(2.5f64.sum_to_shape(&[2]).is_err());
    }

    #[cfg(feature = "ndarray")]
    mod array {
        use super::super::Value;
        use crate::error::GraphError;
        use ndarray::{ArrayD, IxDyn, arr1, arr2};

        #[test]
        fn test_array_broadcasts_scalar() {
            let a = arr1(&[1.0, 2.0, 3.0]).into_dyn();
            let one = <ArrayD<f64> as Value>::from_scalar(1.0);
            let sum = a.try_add(&one).unwrap();
            assert_eq!(sum, arr1(&[2.0, 3.0, 4.0]).into_dyn());
        }

        #[test]
        fn test_array_shape_and_zeros() {
            let a = arr2(&[[1.0, 2.0], [3.0, 4.0]]).into_dyn();
            assert_eq!(Value::shape(&a).as_slice(), &[2, 2]);
            assert_eq!(Value::zeros_like(&a), ArrayD::zeros(IxDyn(&[2, 2])));
            assert_eq!(Value::powi(&a, 2), arr2(&[[1.0, 4.0], [9.0, 16.0]]).into_dyn());
        }

        #[test]
        fn test_sum_to_shape_reduces_broadcast_axes() {
            let a = arr2(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).into_dyn();

            let scalar = a.sum_to_shape(&[]).unwrap();
            assert_eq!(scalar, ArrayD::from_elem(IxDyn(&[]), 21.0));

            let rows = a.sum_to_shape(&[3]).unwrap();
            assert_eq!(rows, arr1(&[5.0, 7.0, 9.0]).into_dyn());

            let cols = a.sum_to_shape(&[2, 1]).unwrap();
            assert_eq!(cols, arr2(&[[6.0], [15.0]]).into_dyn());

            assert_eq!(a.sum_to_shape(&[2, 3]).unwrap(), a);
        }

        #[test]
        fn test_sum_to_shape_rejects_non_broadcast() {
            let a = arr1(&[1.0, 2.0, 3.0]).into_dyn();
            assert!(matches!(
                a.sum_to_shape(&[2]),
                Err(GraphError::ShapeMismatch { .. })
            ));
            assert!(a.sum_to_shape(&[1, 3, 1]).is_err());
        }

        #[test]
        fn test_array_incompatible_shapes() {
            let a = arr1(&[1.0, 2.0]).into_dyn();
            let b = arr1(&[1.0, 2.0, 3.0]).into_dyn();
            let err = a.try_mul(&b).unwrap_err();
            assert!(matches!(err, GraphError::ShapeMismatch { .. }));
        }
    }
}
