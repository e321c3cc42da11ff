use rusqlite::{
    types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef},
    Row,
};
use stash_core::{stmt, Result};

/// Bridges `stmt::Value` to SQLite bind parameters.
///
/// Lists never reach this layer; to-many relationship sets are serialized
/// to JSON text before binding.
#[derive(Debug)]
pub(crate) struct Value<'a>(pub(crate) &'a stmt::Value);

impl ToSql for Value<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        use stmt::Value::*;

        match self.0 {
            Bool(true) => Ok(ToSqlOutput::Owned(SqlValue::Integer(1))),
            Bool(false) => Ok(ToSqlOutput::Owned(SqlValue::Integer(0))),
            I64(v) => Ok(ToSqlOutput::Owned(SqlValue::Integer(*v))),
            String(v) => Ok(ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes()))),
            Null => Ok(ToSqlOutput::Owned(SqlValue::Null)),
            List(_) => Err(rusqlite::Error::ToSqlConversionFailure(
                "lists must be serialized before binding".into(),
            )),
        }
    }
}

/// Reads a typed attribute column. `None` for SQL NULL.
pub(crate) fn attribute_from_sql(
    row: &Row<'_>,
    index: usize,
    ty: stmt::Type,
) -> Result<Option<stmt::Value>> {
    let value = match ty {
        stmt::Type::Bool => row
            .get::<_, Option<i64>>(index)
            .map(|v| v.map(|v| stmt::Value::Bool(v != 0))),
        stmt::Type::I64 => row
            .get::<_, Option<i64>>(index)
            .map(|v| v.map(stmt::Value::I64)),
        stmt::Type::String => row
            .get::<_, Option<String>>(index)
            .map(|v| v.map(stmt::Value::String)),
    };
    value.map_err(|err| anyhow::Error::from(err).into())
}

/// Reads a relationship column: a resource-id string for to-one, a JSON
/// array of resource-id strings for to-many.
pub(crate) fn relation_from_sql(
    row: &Row<'_>,
    index: usize,
    to_many: bool,
) -> Result<Option<stmt::Value>> {
    let raw = row
        .get::<_, Option<String>>(index)
        .map_err(|err| stash_core::Error::from(anyhow::Error::from(err)))?;
    let Some(raw) = raw else {
        return Ok(None);
    };

    if !to_many {
        return Ok(Some(stmt::Value::String(raw)));
    }

    let ids: Vec<String> =
        serde_json::from_str(&raw).map_err(|err| anyhow::Error::from(err))?;
    Ok(Some(stmt::Value::List(
        ids.into_iter().map(stmt::Value::String).collect(),
    )))
}

/// Serializes a to-many relationship entry to its stored JSON form.
pub(crate) fn relation_to_json(ids: &[stash_core::stmt::ResourceId]) -> Result<String> {
    let ids: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
    serde_json::to_string(&ids).map_err(|err| anyhow::Error::from(err).into())
}
