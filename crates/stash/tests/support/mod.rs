#![allow(dead_code)]

use stash::{
    schema::Schema,
    source::{Records, RelationValue, Relationships, RemoteSource},
    stmt::{BinaryOp, Operand, Predicate, ResourceId, SortKey, Type, Value, ValueMap},
    Error, Result,
};
use stash_core::async_trait;

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

/// Person has a to-one `friend` and a to-many `friends`, both self-typed.
pub fn person_schema() -> Schema {
    let mut builder = Schema::builder();
    builder
        .entity("Person")
        .attribute("name", Type::String)
        .attribute("age", Type::I64)
        .to_one("friend", "Person")
        .to_many("friends", "Person");
    builder.build().unwrap()
}

/// In-process remote source with canned records and call accounting.
///
/// Clones share state, so a test can keep one clone for assertions after
/// handing another to the store builder.
#[derive(Debug, Clone, Default)]
pub struct FakeSource {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    records: Mutex<HashMap<String, Records>>,
    fetch_calls: AtomicUsize,
    resolve_calls: AtomicUsize,
    update_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    saves: Mutex<Vec<(ResourceId, ValueMap, Relationships)>>,
    last_predicate: Mutex<Option<Predicate>>,
    fail_fetches: AtomicBool,
    next_id: AtomicU64,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_record(&self, entity: &str, resource_id: &str, values: ValueMap) {
        self.inner
            .records
            .lock()
            .unwrap()
            .entry(entity.to_string())
            .or_default()
            .insert(ResourceId::from(resource_id), values);
    }

    /// When set, fetches fail with `RemoteUnavailable`.
    pub fn fail_fetches(&self, fail: bool) {
        self.inner.fail_fetches.store(fail, Ordering::SeqCst);
    }

    pub fn fetch_calls(&self) -> usize {
        self.inner.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn resolve_calls(&self) -> usize {
        self.inner.resolve_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.inner.update_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.inner.delete_calls.load(Ordering::SeqCst)
    }

    /// Arguments of every `save_record` call, in order.
    pub fn saves(&self) -> Vec<(ResourceId, ValueMap, Relationships)> {
        self.inner.saves.lock().unwrap().clone()
    }

    /// The predicate most recently seen by a fetch.
    pub fn last_predicate(&self) -> Option<Predicate> {
        self.inner.last_predicate.lock().unwrap().clone()
    }

    fn matching(&self, entity: &str, predicate: &Predicate) -> Records {
        self.inner
            .records
            .lock()
            .unwrap()
            .get(entity)
            .map(|records| {
                records
                    .iter()
                    .filter(|(_, values)| eval(predicate, values))
                    .map(|(id, values)| (id.clone(), values.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn check_available(&self) -> Result<()> {
        if self.inner.fail_fetches.load(Ordering::SeqCst) {
            return Err(Error::remote_unavailable("fake source is offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteSource for FakeSource {
    async fn fetch_records(
        &self,
        entity: &str,
        predicate: &Predicate,
        _sort: &[SortKey],
    ) -> Result<Records> {
        self.check_available()?;
        self.inner.fetch_calls.fetch_add(1, Ordering::SeqCst);
        *self.inner.last_predicate.lock().unwrap() = Some(predicate.clone());
        Ok(self.matching(entity, predicate))
    }

    async fn fetch_record_ids(
        &self,
        entity: &str,
        predicate: &Predicate,
        _sort: &[SortKey],
    ) -> Result<Vec<ResourceId>> {
        self.check_available()?;
        self.inner.fetch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.matching(entity, predicate).into_keys().collect())
    }

    async fn save_record(
        &self,
        resource_id: &ResourceId,
        attributes: &ValueMap,
        relationships: &Relationships,
    ) -> Result<()> {
        self.inner.saves.lock().unwrap().push((
            resource_id.clone(),
            attributes.clone(),
            relationships.clone(),
        ));
        Ok(())
    }

    async fn update_record(
        &self,
        _resource_id: &ResourceId,
        _attributes: &ValueMap,
        _relationships: &Relationships,
    ) -> Result<()> {
        self.inner.update_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_record(&self, _resource_id: &ResourceId) -> Result<()> {
        self.inner.delete_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn new_resource_id(&self, _entity: &str) -> Result<ResourceId> {
        let n = self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ResourceId::from(format!("gen-{n}")))
    }

    fn translate_predicate(&self, text: &str) -> Result<Predicate> {
        // Accepts the single form `field = value`.
        let Some((field, value)) = text.split_once('=') else {
            return Err(Error::unsupported_predicate_shape(format!(
                "cannot parse {text:?}"
            )));
        };
        Ok(Predicate::eq(field.trim(), value.trim()))
    }

    async fn resolve_relationship(
        &self,
        resource_id: &ResourceId,
        relationship: &str,
    ) -> Result<RelationValue> {
        self.inner.resolve_calls.fetch_add(1, Ordering::SeqCst);
        let records = self.inner.records.lock().unwrap();
        let value = records
            .values()
            .find_map(|records| records.get(resource_id))
            .and_then(|values| values.get(relationship))
            .cloned()
            .ok_or_else(|| Error::remote_unavailable("no such relationship"))?;
        match value {
            Value::String(id) => Ok(RelationValue::One(ResourceId::from(id))),
            Value::List(items) => Ok(RelationValue::Many(
                items
                    .into_iter()
                    .filter_map(|item| item.as_str().map(ResourceId::from))
                    .collect(),
            )),
            _ => Err(Error::remote_unavailable("relationship holds no ids")),
        }
    }
}

/// Literal-only predicate evaluation over a value map.
fn eval(predicate: &Predicate, values: &ValueMap) -> bool {
    match predicate {
        Predicate::True => true,
        Predicate::BinaryOp(binary_op) => {
            let Operand::Literal(operand) = &binary_op.operand else {
                // Handle operands must be translated before they reach a
                // backend; treating them as non-matching surfaces the bug.
                return false;
            };
            let Some(value) = values.get(&binary_op.field) else {
                return false;
            };
            match binary_op.op {
                BinaryOp::Eq => value == operand,
                BinaryOp::Ne => value != operand,
                BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                    let ordering = match (value, operand) {
                        (Value::I64(a), Value::I64(b)) => a.cmp(b),
                        (Value::String(a), Value::String(b)) => a.cmp(b),
                        _ => return false,
                    };
                    match binary_op.op {
                        BinaryOp::Lt => ordering.is_lt(),
                        BinaryOp::Le => ordering.is_le(),
                        BinaryOp::Gt => ordering.is_gt(),
                        BinaryOp::Ge => ordering.is_ge(),
                        _ => unreachable!(),
                    }
                }
            }
        }
        Predicate::And(operands) => operands.iter().all(|operand| eval(operand, values)),
        Predicate::Or(operands) => operands.iter().any(|operand| eval(operand, values)),
        Predicate::Not(operand) => !eval(operand, values),
    }
}
