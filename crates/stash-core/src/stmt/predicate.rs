use super::PredicateBinaryOp;

/// A typed predicate tree.
///
/// Backends only ever see predicates whose operands are literals; the
/// translator rewrites handle operands before dispatch.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Predicate {
    /// Matches every record.
    #[default]
    True,

    /// A single field comparison.
    BinaryOp(PredicateBinaryOp),

    /// All sub-predicates must match.
    And(Vec<Predicate>),

    /// At least one sub-predicate must match.
    Or(Vec<Predicate>),

    /// Negation.
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn and_from_vec(operands: Vec<Predicate>) -> Self {
        Self::And(operands)
    }

    pub fn or_from_vec(operands: Vec<Predicate>) -> Self {
        Self::Or(operands)
    }

    pub fn not(operand: Predicate) -> Self {
        Self::Not(Box::new(operand))
    }

    pub fn is_true(&self) -> bool {
        matches!(self, Self::True)
    }

    /// Returns true if any comparison in the tree has a handle operand.
    pub fn contains_handle(&self) -> bool {
        match self {
            Self::True => false,
            Self::BinaryOp(binary_op) => binary_op.operand.is_handle(),
            Self::And(operands) | Self::Or(operands) => {
                operands.iter().any(|operand| operand.contains_handle())
            }
            Self::Not(operand) => operand.contains_handle(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EntityId;
    use crate::stmt::{BinaryOp, Handle, Operand};

    #[test]
    fn true_contains_no_handle() {
        assert!(!Predicate::True.contains_handle());
    }

    #[test]
    fn literal_comparison_contains_no_handle() {
        let predicate = Predicate::eq("name", "Ann");
        assert!(!predicate.contains_handle());
    }

    #[test]
    fn handle_comparison_is_detected() {
        let handle = Handle::new(EntityId(0), 7);
        let predicate = Predicate::eq("friend", handle);
        assert!(predicate.contains_handle());
    }

    #[test]
    fn handle_under_combinator_is_detected() {
        let handle = Handle::new(EntityId(0), 7);
        let predicate = Predicate::and_from_vec(vec![
            Predicate::eq("name", "Ann"),
            Predicate::not(Predicate::eq("friend", handle)),
        ]);
        assert!(predicate.contains_handle());
    }

    #[test]
    fn eq_builds_expected_node() {
        let predicate = Predicate::eq("age", 42i64);
        let Predicate::BinaryOp(binary_op) = predicate else {
            panic!("expected a binary op node");
        };
        assert_eq!(binary_op.field, "age");
        assert_eq!(binary_op.op, BinaryOp::Eq);
        assert!(matches!(binary_op.operand, Operand::Literal(_)));
    }
}
