//! Tensor shapes and broadcasting.

use smallvec::SmallVec;

/// Dimensions of a tensor value. The empty shape is a scalar.
pub type Shape = SmallVec<[usize; 4]>;

/// The rank-0 scalar shape.
pub fn scalar_shape() -> Shape {
    Shape::new()
}

/// Broadcast two shapes following NumPy rules.
///
/// Dimensions are aligned from the right; each pair must be equal or one of
/// them must be 1. Returns `None` when the shapes are incompatible.
///
/// # Example
///
/// ```
/// use symgrad::shape::broadcast_shapes;
///
/// let out = broadcast_shapes(&[2, 1, 4], &[3, 1]).unwrap();
/// assert_eq!(out.as_slice(), &[2, 3, 4]);
/// assert!(broadcast_shapes(&[2], &[3]).is_none());
/// ```
pub fn broadcast_shapes(lhs: &[usize], rhs: &[usize]) -> Option<Shape> {
    let ndim = lhs.len().max(rhs.len());
    let mut out: Shape = SmallVec::with_capacity(ndim);

    for i in 0..ndim {
        // Missing leading dims behave as 1.
        let a = dim_from_right(lhs, ndim - 1 - i);
        let b = dim_from_right(rhs, ndim - 1 - i);
        let d = match (a, b) {
            (a, b) if a == b => a,
            (1, b) => b,
            (a, 1) => a,
            _ => return None,
        };
        out.push(d);
    }

    Some(out)
}

fn dim_from_right(shape: &[usize], offset: usize) -> usize {
    if offset < shape.len() {
        shape[shape.len() - 1 - offset]
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_broadcasts_with_anything() {
        assert_eq!(broadcast_shapes(&[], &[]).unwrap().as_slice(), &[] as &[usize]);
        assert_eq!(broadcast_shapes(&[], &[2, 3]).unwrap().as_slice(), &[2, 3]);
        assert_eq!(broadcast_shapes(&[5], &[]).unwrap().as_slice(), &[5]);
    }

    #[test]
    fn test_broadcast_ones() {
        assert_eq!(broadcast_shapes(&[3, 1], &[1, 4]).unwrap().as_slice(), &[3, 4]);
        assert_eq!(broadcast_shapes(&[1], &[7]).unwrap().as_slice(), &[7]);
    }

    #[test]
    fn test_broadcast_incompatible() {
        assert!(broadcast_shapes(&[2, 3], &[4]).is_none());
        assert!(broadcast_shapes(&[2, 3], &[3, 3]).is_none());
    }

    #[test]
    fn test_scalar_shape_is_rank_zero() {
        assert!(scalar_shape().is_empty());
    }
}
