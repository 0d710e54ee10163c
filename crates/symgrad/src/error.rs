//! Error types for symgrad.

use crate::graph::TensorId;
use crate::shape::Shape;
use thiserror::Error;

/// Errors that can occur while building or evaluating a graph.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// Evaluation reached a free leaf with no binding in the context.
    #[error("unbound variable: placeholder \"{name}\" ({id}) has no binding in the context")]
    UnboundVariable { id: TensorId, name: String },

    /// An op received (or produced) the wrong number of inputs or local gradients.
    #[error("arity mismatch in {kind}(\"{name}\"): expected {expected}, got {actual}")]
    ArityMismatch {
        kind: &'static str,
        name: String,
        expected: usize,
        actual: usize,
    },

    /// Tensor handle does not refer to a node of this graph.
    #[error("tensor {0} does not belong to this graph")]
    UnknownTensor(TensorId),

    /// Operand shapes cannot be broadcast together.
    #[error("cannot broadcast shapes {lhs:?} and {rhs:?}")]
    ShapeMismatch { lhs: Shape, rhs: Shape },
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn test_unbound_variable_message() {
        let err = GraphError::UnboundVariable {
            id: TensorId::new_for_test(3),
            name: "z".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unbound variable: placeholder \"z\" (t3) has no binding in the context"
        );
    }

    #[test]
    fn test_arity_mismatch_names_op() {
        let err = GraphError::ArityMismatch {
            kind: "Div",
            name: "ratio".to_string(),
            expected: 2,
            actual: 1,
        };
        assert_eq!(
            err.to_string(),
            "arity mismatch in Div(\"ratio\"): expected 2, got 1"
        );
    }

    #[test]
    fn test_shape_mismatch_message() {
        let err = GraphError::ShapeMismatch {
            lhs: smallvec![2, 3],
            rhs: smallvec![4],
        };
        assert_eq!(err.to_string(), "cannot broadcast shapes [2, 3] and [4]");
    }
}
