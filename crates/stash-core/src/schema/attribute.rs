use crate::stmt;

/// A scalar field of an entity.
#[derive(Debug, Clone)]
pub struct Attribute {
    /// The attribute name, as known to both the remote source and the mirror.
    pub name: String,

    /// The type values of this attribute evaluate to.
    pub ty: stmt::Type,
}
