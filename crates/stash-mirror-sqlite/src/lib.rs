mod value;
use value::{attribute_from_sql, relation_from_sql, relation_to_json, Value};

use rusqlite::{Connection, OptionalExtension};
use stash_core::{
    async_trait, err,
    mirror::Mirror,
    schema::{Entity, EntityId, Schema},
    source::Records,
    stmt::{self, Operand, Predicate, ResourceId, SortKey, ValueMap},
    Error, Result,
};

use std::{
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};
use tracing::debug;

/// Internal join key between durable rows and remote records. Never exposed
/// to the remote source or to client code. Doubles as the primary key, which
/// gives it the index the existence checks rely on.
const RESOURCE_ID_COLUMN: &str = "__resource_id__";

/// Durable mirror backed by a SQLite database.
///
/// One file per registered store, holding the full entity schema plus the
/// resource-id column per entity. To-one relationship columns store the
/// destination resource id as text; to-many columns store a JSON array of
/// resource ids.
#[derive(Debug)]
pub struct SqliteMirror {
    connection: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteMirror {
    /// An in-memory mirror, for tests and throwaway stores.
    pub fn in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory().map_err(sql_err)?;
        Ok(Self {
            connection: Mutex::new(connection),
            path: None,
        })
    }

    /// Opens (or creates) a mirror database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let connection = Connection::open(&path).map_err(sql_err)?;
        Ok(Self {
            connection: Mutex::new(connection),
            path: Some(path),
        })
    }

    /// Opens the durable file for a store identifier: `<dir>/<store_id>.sqlite`.
    pub fn for_store(dir: impl AsRef<Path>, store_id: &str) -> Result<Self> {
        Self::open(dir.as_ref().join(format!("{store_id}.sqlite")))
    }

    /// The durable file path, if this mirror is file-backed.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| err!("mirror connection poisoned"))
    }
}

#[async_trait]
impl Mirror for SqliteMirror {
    async fn register_schema(&mut self, schema: &Schema) -> Result<()> {
        let connection = self.connection()?;
        for entity in schema.entities() {
            let mut columns = vec![format!("{} TEXT PRIMARY KEY", quote(RESOURCE_ID_COLUMN))];
            for attribute in &entity.attributes {
                columns.push(format!(
                    "{} {}",
                    quote(&attribute.name),
                    storage_type(attribute.ty)
                ));
            }
            for relation in &entity.relations {
                columns.push(format!("{} TEXT", quote(&relation.name)));
            }

            let sql = format!(
                "CREATE TABLE IF NOT EXISTS {} ({})",
                quote(&entity.name),
                columns.join(", ")
            );
            connection.execute(&sql, []).map_err(sql_err)?;
        }
        debug!(entities = schema.entities.len(), "registered mirror schema");
        Ok(())
    }

    async fn query(
        &self,
        schema: &Schema,
        entity: EntityId,
        predicate: &Predicate,
        sort: &[SortKey],
    ) -> Result<Records> {
        let entity = schema.entity(entity);

        let mut sql = format!(
            "SELECT {} FROM {}",
            column_list(entity),
            quote(&entity.name)
        );
        let mut params = vec![];
        if !predicate.is_true() {
            let clause = predicate_sql(entity, predicate, &mut params)?;
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }
        if !sort.is_empty() {
            let mut keys = vec![];
            for key in sort {
                if !entity.has_field(&key.field) {
                    return Err(err!(
                        "unknown sort field `{}` on entity `{}`",
                        key.field,
                        entity.name
                    ));
                }
                keys.push(format!("{} {}", quote(&key.field), key.direction.as_sql()));
            }
            sql.push_str(" ORDER BY ");
            sql.push_str(&keys.join(", "));
        }

        let connection = self.connection()?;
        let mut statement = connection.prepare(&sql).map_err(sql_err)?;
        let mut rows = statement
            .query(rusqlite::params_from_iter(params.iter().map(Value)))
            .map_err(sql_err)?;

        let mut records = Records::new();
        while let Some(row) = rows.next().map_err(sql_err)? {
            let (resource_id, values) = row_values(row, entity)?;
            records.insert(resource_id, values);
        }
        Ok(records)
    }

    async fn exists(
        &self,
        schema: &Schema,
        entity: EntityId,
        resource_id: &ResourceId,
    ) -> Result<bool> {
        let entity = schema.entity(entity);
        let sql = format!(
            "SELECT 1 FROM {} WHERE {} = ? LIMIT 1",
            quote(&entity.name),
            quote(RESOURCE_ID_COLUMN)
        );

        let connection = self.connection()?;
        let found = connection
            .query_row(&sql, [resource_id.as_str()], |_| Ok(()))
            .optional()
            .map_err(sql_err)?;
        Ok(found.is_some())
    }

    async fn merge(&self, schema: &Schema, entity: EntityId, records: &Records) -> Result<()> {
        let entity = schema.entity(entity);

        let mut connection = self.connection()?;
        let transaction = connection
            .transaction()
            .map_err(|err| Error::durable_write_failed(err.to_string()))?;

        let mut stubs = 0;
        for (resource_id, values) in records {
            stubs += upsert_record(&transaction, schema, entity, resource_id, values)?;
        }

        transaction
            .commit()
            .map_err(|err| Error::durable_write_failed(err.to_string()))?;
        debug!(
            entity = %entity.name,
            merged = records.len(),
            stubs,
            "durable merge committed"
        );
        Ok(())
    }
}

/// Writes one record's full column set, creating stub rows for any
/// referenced-but-unseen destination resource ids. Returns the number of
/// stub inserts attempted.
fn upsert_record(
    transaction: &rusqlite::Transaction<'_>,
    schema: &Schema,
    entity: &Entity,
    resource_id: &ResourceId,
    values: &ValueMap,
) -> Result<usize> {
    let mut params: Vec<stmt::Value> = vec![stmt::Value::String(resource_id.as_str().to_string())];
    let mut stubs = 0;

    for attribute in &entity.attributes {
        params.push(values.get(&attribute.name).cloned().unwrap_or_default());
    }

    for relation in &entity.relations {
        let target = schema.entity(relation.target);
        match values.get(&relation.name) {
            None | Some(stmt::Value::Null) => params.push(stmt::Value::Null),
            Some(value) => {
                let ids = value
                    .to_resource_ids()
                    .map_err(|err| Error::durable_write_failed(err.to_string()))?;
                for id in &ids {
                    stub_row(transaction, target, id)?;
                    stubs += 1;
                }
                if relation.is_to_many() {
                    params.push(stmt::Value::String(relation_to_json(&ids)?));
                } else {
                    let Some(id) = ids.first() else {
                        return Err(Error::durable_write_failed(format!(
                            "to-one relationship `{}` holds no resource id",
                            relation.name
                        )));
                    };
                    params.push(stmt::Value::String(id.as_str().to_string()));
                }
            }
        }
    }

    let placeholders = vec!["?"; params.len()].join(", ");
    let updates = entity
        .attributes
        .iter()
        .map(|attribute| attribute.name.as_str())
        .chain(entity.relations.iter().map(|relation| relation.name.as_str()))
        .map(|name| format!("{} = excluded.{}", quote(name), quote(name)))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = if updates.is_empty() {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT({}) DO NOTHING",
            quote(&entity.name),
            column_list(entity),
            placeholders,
            quote(RESOURCE_ID_COLUMN)
        )
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT({}) DO UPDATE SET {}",
            quote(&entity.name),
            column_list(entity),
            placeholders,
            quote(RESOURCE_ID_COLUMN),
            updates
        )
    };

    transaction
        .execute(&sql, rusqlite::params_from_iter(params.iter().map(Value)))
        .map_err(|err| Error::durable_write_failed(err.to_string()))?;
    Ok(stubs)
}

/// Materializes a referenced-but-unseen record as a row holding only its
/// resource id, to be filled by a later merge.
fn stub_row(
    transaction: &rusqlite::Transaction<'_>,
    target: &Entity,
    resource_id: &ResourceId,
) -> Result<()> {
    let sql = format!(
        "INSERT OR IGNORE INTO {} ({}) VALUES (?)",
        quote(&target.name),
        quote(RESOURCE_ID_COLUMN)
    );
    transaction
        .execute(&sql, [resource_id.as_str()])
        .map_err(|err| Error::durable_write_failed(err.to_string()))?;
    Ok(())
}

/// Reads one row into a record. NULL columns are skipped, so stub rows read
/// back with no attributes set.
fn row_values(row: &rusqlite::Row<'_>, entity: &Entity) -> Result<(ResourceId, ValueMap)> {
    let resource_id: String = row.get(0).map_err(sql_err)?;

    let mut values = ValueMap::new();
    let mut index = 1;
    for attribute in &entity.attributes {
        if let Some(value) = attribute_from_sql(row, index, attribute.ty)? {
            values.insert(attribute.name.clone(), value);
        }
        index += 1;
    }
    for relation in &entity.relations {
        if let Some(value) = relation_from_sql(row, index, relation.is_to_many())? {
            values.insert(relation.name.clone(), value);
        }
        index += 1;
    }
    Ok((ResourceId::from(resource_id), values))
}

/// Renders a translated predicate as a WHERE clause, pushing bind
/// parameters left to right.
fn predicate_sql(
    entity: &Entity,
    predicate: &Predicate,
    params: &mut Vec<stmt::Value>,
) -> Result<String> {
    match predicate {
        Predicate::True => Ok("1 = 1".to_string()),
        Predicate::BinaryOp(binary_op) => {
            if !entity.has_field(&binary_op.field) {
                return Err(err!(
                    "unknown field `{}` on entity `{}`",
                    binary_op.field,
                    entity.name
                ));
            }
            match &binary_op.operand {
                Operand::Literal(value) => {
                    if value.is_list() {
                        return Err(Error::unsupported_predicate_shape(
                            "list literals cannot be compared",
                        ));
                    }
                    params.push(value.clone());
                    Ok(format!(
                        "{} {} ?",
                        quote(&binary_op.field),
                        binary_op.op.as_sql()
                    ))
                }
                Operand::Handle(_) => Err(Error::unsupported_predicate_shape(
                    "durable mirror cannot evaluate handle operands; translate first",
                )),
            }
        }
        Predicate::And(operands) => combine(entity, operands, " AND ", "1 = 1", params),
        Predicate::Or(operands) => combine(entity, operands, " OR ", "1 = 0", params),
        Predicate::Not(operand) => {
            let inner = predicate_sql(entity, operand, params)?;
            Ok(format!("NOT ({inner})"))
        }
    }
}

fn combine(
    entity: &Entity,
    operands: &[Predicate],
    separator: &str,
    empty: &str,
    params: &mut Vec<stmt::Value>,
) -> Result<String> {
    if operands.is_empty() {
        return Ok(empty.to_string());
    }
    let clauses = operands
        .iter()
        .map(|operand| Ok(format!("({})", predicate_sql(entity, operand, params)?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(clauses.join(separator))
}

/// Select-list column order: resource id, attributes, relations.
fn column_list(entity: &Entity) -> String {
    let mut columns = vec![quote(RESOURCE_ID_COLUMN)];
    for attribute in &entity.attributes {
        columns.push(quote(&attribute.name));
    }
    for relation in &entity.relations {
        columns.push(quote(&relation.name));
    }
    columns.join(", ")
}

fn storage_type(ty: stmt::Type) -> &'static str {
    match ty {
        stmt::Type::Bool | stmt::Type::I64 => "INTEGER",
        stmt::Type::String => "TEXT",
    }
}

fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn sql_err(err: rusqlite::Error) -> Error {
    Error::from(anyhow::Error::from(err))
}
