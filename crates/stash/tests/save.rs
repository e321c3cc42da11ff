mod support;

use support::{person_schema, FakeSource};

use stash::{
    source::RelationValue,
    stmt::{Predicate, ResourceId},
    Related, Store,
};
use stash_core::value_map;

use indexmap::IndexMap;

async fn store_with(source: &FakeSource) -> Store {
    Store::builder()
        .schema(person_schema())
        .source(source.clone())
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn insert_resolves_relationship_handles_to_resource_ids() {
    let source = FakeSource::new();
    source.put_record("Person", "r1", value_map!("name" => "Ann"));

    let store = store_with(&source).await;
    let ann = store
        .fetch("Person", Predicate::default(), vec![])
        .await
        .unwrap()[0];

    let mut relationships = IndexMap::new();
    relationships.insert("friend".to_string(), Related::One(ann));

    let bo = store
        .insert("Person", value_map!("name" => "Bo"), relationships)
        .await
        .unwrap();
    assert_ne!(ann, bo);

    let saves = source.saves();
    assert_eq!(1, saves.len());
    let (resource_id, attributes, relationships) = &saves[0];
    assert_eq!(&ResourceId::from("gen-1"), resource_id);
    assert_eq!(&value_map!("name" => "Bo"), attributes);
    assert_eq!(
        Some(&RelationValue::One(ResourceId::from("r1"))),
        relationships.get("friend")
    );
}

#[tokio::test]
async fn inserted_handle_is_usable_before_any_fetch() {
    let source = FakeSource::new();
    let store = store_with(&source).await;

    let ann = store
        .insert("Person", value_map!("name" => "Ann"), IndexMap::new())
        .await
        .unwrap();

    // The handle maps to the allocated id as soon as insert returns, so it
    // can appear in a predicate right away.
    source.put_record("Person", "r9", value_map!("friend" => "gen-1"));
    store
        .fetch("Person", Predicate::eq("friend", ann), vec![])
        .await
        .unwrap();
    assert_eq!(Some(Predicate::eq("friend", "gen-1")), source.last_predicate());
}

#[tokio::test]
async fn to_many_relationships_are_saved_in_order() {
    let source = FakeSource::new();
    source.put_record("Person", "r1", value_map!("name" => "Ann"));
    source.put_record("Person", "r2", value_map!("name" => "Bo"));

    let store = store_with(&source).await;
    let handles = store
        .fetch("Person", Predicate::default(), vec![])
        .await
        .unwrap();

    let mut relationships = IndexMap::new();
    relationships.insert("friends".to_string(), Related::Many(handles));

    store
        .insert("Person", value_map!("name" => "Cy"), relationships)
        .await
        .unwrap();

    let saves = source.saves();
    assert_eq!(
        Some(&RelationValue::Many(vec![
            ResourceId::from("r1"),
            ResourceId::from("r2"),
        ])),
        saves[0].2.get("friends")
    );
}

#[tokio::test]
async fn unregistered_relationship_handle_fails_the_insert() {
    let source = FakeSource::new();
    let other = FakeSource::new();
    other.put_record("Person", "r1", value_map!("name" => "Ann"));
    other.put_record("Person", "r2", value_map!("name" => "Bo"));

    let store = store_with(&source).await;
    let other_store = store_with(&other).await;
    let foreign = other_store
        .fetch("Person", Predicate::default(), vec![])
        .await
        .unwrap()[1];

    let mut relationships = IndexMap::new();
    relationships.insert("friend".to_string(), Related::One(foreign));

    let err = store
        .insert("Person", value_map!("name" => "Bo"), relationships)
        .await
        .unwrap_err();
    assert!(err.is_unresolved_relationship(), "{err}");
    assert!(source.saves().is_empty());
}

#[tokio::test]
async fn relationship_payloads_are_checked_against_the_schema() {
    let source = FakeSource::new();
    source.put_record("Person", "r1", value_map!("name" => "Ann"));

    let store = store_with(&source).await;
    let ann = store
        .fetch("Person", Predicate::default(), vec![])
        .await
        .unwrap()[0];

    // Unknown relationship name.
    let mut relationships = IndexMap::new();
    relationships.insert("enemy".to_string(), Related::One(ann));
    assert!(store
        .insert("Person", value_map!(), relationships)
        .await
        .is_err());

    // Cardinality mismatch: `friend` is to-one.
    let mut relationships = IndexMap::new();
    relationships.insert("friend".to_string(), Related::Many(vec![ann]));
    assert!(store
        .insert("Person", value_map!(), relationships)
        .await
        .is_err());

    assert!(source.saves().is_empty());
}

#[tokio::test]
async fn update_and_delete_forward_to_the_source() {
    let source = FakeSource::new();
    source.put_record("Person", "r1", value_map!("name" => "Ann"));

    let store = store_with(&source).await;
    let ann = store
        .fetch("Person", Predicate::default(), vec![])
        .await
        .unwrap()[0];

    store
        .update(ann, value_map!("name" => "Anne"), IndexMap::new())
        .await
        .unwrap();
    assert_eq!(1, source.update_calls());

    store.delete(ann).await.unwrap();
    assert_eq!(1, source.delete_calls());
}
