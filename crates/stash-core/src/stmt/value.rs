use super::ResourceId;
use crate::Result;

/// A scalar (or resource-id list) value stored in a value map.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum Value {
    /// Boolean value
    Bool(bool),

    /// Signed 64-bit integer
    I64(i64),

    /// Null value
    #[default]
    Null,

    /// String value. Relationship entries store the destination resource id
    /// in this form.
    String(String),

    /// A list of values of the same type. To-many relationship entries are a
    /// list of resource-id strings.
    List(Vec<Value>),
}

impl Value {
    pub const fn null() -> Self {
        Self::Null
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    pub fn to_bool(self) -> Result<bool> {
        match self {
            Self::Bool(v) => Ok(v),
            _ => crate::bail!("cannot convert value to bool; value={self:#?}"),
        }
    }

    pub fn to_i64(self) -> Result<i64> {
        match self {
            Self::I64(v) => Ok(v),
            _ => crate::bail!("cannot convert value to i64; value={self:#?}"),
        }
    }

    pub fn to_string(self) -> Result<String> {
        match self {
            Self::String(v) => Ok(v),
            _ => crate::bail!("cannot convert value to String; value={self:#?}"),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Reads the value as a set of resource ids, per relationship storage
    /// conventions: a string for to-one, a list of strings for to-many.
    pub fn to_resource_ids(&self) -> Result<Vec<ResourceId>> {
        match self {
            Self::Null => Ok(vec![]),
            Self::String(v) => Ok(vec![ResourceId::from(v.as_str())]),
            Self::List(items) => items
                .iter()
                .map(|item| match item {
                    Self::String(v) => Ok(ResourceId::from(v.as_str())),
                    _ => crate::bail!("relationship entry is not a resource id; value={item:#?}"),
                })
                .collect(),
            _ => crate::bail!("value does not hold resource ids; value={self:#?}"),
        }
    }
}

impl From<bool> for Value {
    fn from(src: bool) -> Self {
        Self::Bool(src)
    }
}

impl From<i64> for Value {
    fn from(src: i64) -> Self {
        Self::I64(src)
    }
}

impl From<&str> for Value {
    fn from(src: &str) -> Self {
        Self::String(src.to_string())
    }
}

impl From<String> for Value {
    fn from(src: String) -> Self {
        Self::String(src)
    }
}

impl From<&ResourceId> for Value {
    fn from(src: &ResourceId) -> Self {
        Self::String(src.as_str().to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(src: Vec<Value>) -> Self {
        Self::List(src)
    }
}

impl<V: Into<Value>> From<Option<V>> for Value {
    fn from(src: Option<V>) -> Self {
        match src {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}
