/// The type an attribute's values evaluate to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Type {
    Bool,
    I64,
    String,
}
