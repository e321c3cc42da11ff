use super::{BinaryOp, Operand, Predicate};

/// A binary comparison between a named field and an operand.
///
/// The left-hand side is always a field of the queried entity; the grammar
/// cannot express a handle on the left.
#[derive(Debug, Clone, PartialEq)]
pub struct PredicateBinaryOp {
    /// The field being compared.
    pub field: String,

    /// The operator to apply.
    pub op: BinaryOp,

    /// The right-hand side operand.
    pub operand: Operand,
}

impl Predicate {
    pub fn binary_op(field: impl Into<String>, op: BinaryOp, operand: impl Into<Operand>) -> Self {
        PredicateBinaryOp {
            field: field.into(),
            op,
            operand: operand.into(),
        }
        .into()
    }

    pub fn eq(field: impl Into<String>, operand: impl Into<Operand>) -> Self {
        Self::binary_op(field, BinaryOp::Eq, operand)
    }

    pub fn ne(field: impl Into<String>, operand: impl Into<Operand>) -> Self {
        Self::binary_op(field, BinaryOp::Ne, operand)
    }

    pub fn lt(field: impl Into<String>, operand: impl Into<Operand>) -> Self {
        Self::binary_op(field, BinaryOp::Lt, operand)
    }

    pub fn gt(field: impl Into<String>, operand: impl Into<Operand>) -> Self {
        Self::binary_op(field, BinaryOp::Gt, operand)
    }
}

impl From<PredicateBinaryOp> for Predicate {
    fn from(value: PredicateBinaryOp) -> Self {
        Self::BinaryOp(value)
    }
}
