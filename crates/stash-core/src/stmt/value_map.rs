use super::Value;

use indexmap::IndexMap;

/// A record's field values, keyed by attribute/relationship name.
///
/// Merges replace the whole map for a handle; it is never partially updated.
pub type ValueMap = IndexMap<String, Value>;

/// Builds a [`ValueMap`] from `name => value` pairs.
#[macro_export]
macro_rules! value_map {
    ( $( $name:expr => $value:expr ),* $(,)? ) => {{
        #[allow(unused_mut)]
        let mut map = $crate::stmt::ValueMap::new();
        $( map.insert($name.to_string(), $crate::stmt::Value::from($value)); )*
        map
    }};
}
