use crate::identity::IdentityCache;

use stash_core::{
    stmt::{Operand, Predicate, Value},
    Error, Result,
};

/// Rewrites handle-valued comparisons into resource-id comparisons the
/// remote source and the durable mirror understand.
///
/// Supported grammar: a predicate with no handle operands passes through
/// unchanged (whatever its shape), and a sole top-level equality against a
/// handle is rewritten against the same field name. Handle operands under
/// boolean combinators or with non-equality operators are a known
/// limitation and fail with `UnsupportedPredicateShape` rather than being
/// silently mis-evaluated.
pub(crate) fn translate(predicate: &Predicate, cache: &IdentityCache) -> Result<Predicate> {
    if !predicate.contains_handle() {
        return Ok(predicate.clone());
    }

    match predicate {
        Predicate::BinaryOp(binary_op) if binary_op.op.is_eq() => {
            let Operand::Handle(handle) = &binary_op.operand else {
                // contains_handle() rules this arm out for literal operands
                unreachable!();
            };
            let Some(resource_id) = cache.resource_id(*handle) else {
                return Err(Error::not_found(format!(
                    "no resource id registered for {handle:?}"
                )));
            };
            Ok(Predicate::eq(
                binary_op.field.clone(),
                Value::from(resource_id),
            ))
        }
        Predicate::BinaryOp(binary_op) => Err(Error::unsupported_predicate_shape(format!(
            "handle operands require equality; got `{}` on field `{}`",
            binary_op.op, binary_op.field
        ))),
        _ => Err(Error::unsupported_predicate_shape(
            "handle comparisons under boolean combinators are not translated",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stash_core::schema::EntityId;
    use stash_core::stmt::{BinaryOp, ResourceId};

    const ENTITY: EntityId = EntityId(0);

    #[test]
    fn handle_free_predicate_passes_through() {
        let cache = IdentityCache::new();
        let predicate = Predicate::and_from_vec(vec![
            Predicate::eq("name", "Ann"),
            Predicate::gt("age", 18i64),
        ]);

        let translated = translate(&predicate, &cache).unwrap();
        assert_eq!(translated, predicate);
    }

    #[test]
    fn handle_equality_is_rewritten_to_resource_id() {
        let mut cache = IdentityCache::new();
        let r1 = ResourceId::from("r1");
        let (handle, _) = cache.ensure_handle(ENTITY, &r1);

        let translated = translate(&Predicate::eq("friend", handle), &cache).unwrap();
        assert_eq!(translated, Predicate::eq("friend", "r1"));
    }

    #[test]
    fn round_trip_resolves_to_registered_resource_id() {
        let mut cache = IdentityCache::new();
        let r1 = ResourceId::from("r7");
        let (handle, _) = cache.ensure_handle(ENTITY, &r1);

        let Predicate::BinaryOp(binary_op) =
            translate(&Predicate::eq("friend", handle), &cache).unwrap()
        else {
            panic!("expected a binary op node");
        };
        let Operand::Literal(Value::String(rewritten)) = binary_op.operand else {
            panic!("expected a string literal operand");
        };
        assert_eq!(&ResourceId::from(rewritten.as_str()), cache.resource_id(handle).unwrap());
    }

    #[test]
    fn unknown_handle_is_not_found() {
        let cache = IdentityCache::new();
        let foreign = stash_core::stmt::Handle::new(ENTITY, 42);

        let err = translate(&Predicate::eq("friend", foreign), &cache).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn non_equality_handle_comparison_is_unsupported() {
        let mut cache = IdentityCache::new();
        let (handle, _) = cache.ensure_handle(ENTITY, &ResourceId::from("r1"));

        let predicate = Predicate::binary_op("friend", BinaryOp::Ne, handle);
        let err = translate(&predicate, &cache).unwrap_err();
        assert!(err.is_unsupported_predicate_shape());
    }

    #[test]
    fn handle_under_combinator_is_unsupported() {
        let mut cache = IdentityCache::new();
        let (handle, _) = cache.ensure_handle(ENTITY, &ResourceId::from("r1"));

        let predicate = Predicate::and_from_vec(vec![
            Predicate::eq("name", "Ann"),
            Predicate::eq("friend", handle),
        ]);
        let err = translate(&predicate, &cache).unwrap_err();
        assert!(err.is_unsupported_predicate_shape());
    }
}
