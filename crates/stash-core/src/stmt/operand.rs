use super::{Handle, Value};

/// The right-hand side of a predicate comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A literal scalar, understood by remote and durable backends as-is.
    Literal(Value),

    /// A locally-issued object handle. Backends never see handles; the
    /// translator rewrites this into the governing resource id first.
    Handle(Handle),
}

impl Operand {
    pub fn is_handle(&self) -> bool {
        matches!(self, Self::Handle(_))
    }
}

impl From<Handle> for Operand {
    fn from(value: Handle) -> Self {
        Self::Handle(value)
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

impl From<&str> for Operand {
    fn from(value: &str) -> Self {
        Self::Literal(value.into())
    }
}

impl From<String> for Operand {
    fn from(value: String) -> Self {
        Self::Literal(value.into())
    }
}

impl From<i64> for Operand {
    fn from(value: i64) -> Self {
        Self::Literal(value.into())
    }
}

impl From<bool> for Operand {
    fn from(value: bool) -> Self {
        Self::Literal(value.into())
    }
}
