mod common;

use std::sync::Arc;

use common::{follows_descriptor, harness, person_descriptor, person_repository, Follows, Person};
use umbra::{AccessError, RelationshipRepository};

#[test]
fn create_relation_links_saved_nodes() {
    let (_engine, template) = harness();
    let repository = person_repository(&template);
    let alice = repository.save(&Person::new("Alice", 1)).unwrap();
    let bob = repository.save(&Person::new("Bob", 2)).unwrap();

    let created = repository
        .create_relation(&alice, &bob, &Follows::new("alice_bob", &alice, &bob, 2020))
        .unwrap();

    assert_eq!(created.from.name, "Alice");
    assert_eq!(created.to.name, "Bob");
    assert_eq!(created.since, 2020);
}

#[test]
fn create_relation_fails_when_an_endpoint_is_missing() {
    let (_engine, template) = harness();
    let repository = person_repository(&template);
    let alice = repository.save(&Person::new("Alice", 1)).unwrap();
    let ghost = Person::new("Ghost", 0);

    let result =
        repository.create_relation(&alice, &ghost, &Follows::new("r", &alice, &ghost, 2020));

    assert!(matches!(result, Err(AccessError::EmptyWriteResult(_))));
}

#[test]
fn recreating_with_the_same_identity_updates_instead_of_duplicating() {
    let (engine, template) = harness();
    let repository = person_repository(&template);
    let alice = repository.save(&Person::new("Alice", 30)).unwrap();
    let bob = repository.save(&Person::new("Bob", 25)).unwrap();

    repository
        .create_relation(&alice, &bob, &Follows::new("alice_bob", &alice, &bob, 2020))
        .unwrap();
    let all = repository.find_all_relations().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].from.name, "Alice");
    assert_eq!(all[0].to.name, "Bob");
    assert_eq!(all[0].since, 2020);

    repository
        .create_relation(&alice, &bob, &Follows::new("alice_bob", &alice, &bob, 2021))
        .unwrap();

    let all = repository.find_all_relations().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].since, 2021);
    assert_eq!(engine.relationship_count("FOLLOWS"), 1);
}

#[test]
fn find_relations_by_source_filters_on_the_source_node() {
    let (_engine, template) = harness();
    let repository = person_repository(&template);
    let alice = repository.save(&Person::new("Alice", 1)).unwrap();
    let bob = repository.save(&Person::new("Bob", 2)).unwrap();
    let charlie = repository.save(&Person::new("Charlie", 3)).unwrap();

    repository
        .create_relation(&alice, &bob, &Follows::new("a_b", &alice, &bob, 2019))
        .unwrap();
    repository
        .create_relation(&alice, &charlie, &Follows::new("a_c", &alice, &charlie, 2020))
        .unwrap();
    repository
        .create_relation(&bob, &charlie, &Follows::new("b_c", &bob, &charlie, 2021))
        .unwrap();

    let from_alice = repository.find_relations_by_source(&alice).unwrap();
    assert_eq!(from_alice.len(), 2);
    assert!(from_alice.iter().all(|rel| rel.from.name == "Alice"));
}

#[test]
fn find_relation_by_id_matches_the_identity_property() {
    let (_engine, template) = harness();
    let repository = person_repository(&template);
    let alice = repository.save(&Person::new("Alice", 1)).unwrap();
    let bob = repository.save(&Person::new("Bob", 2)).unwrap();
    repository
        .create_relation(&alice, &bob, &Follows::new("a_b", &alice, &bob, 2020))
        .unwrap();

    let found = repository.find_relation_by_id("a_b").unwrap();
    assert_eq!(found.map(|rel| rel.since), Some(2020));

    assert_eq!(repository.find_relation_by_id("nope").unwrap(), None);
}

#[test]
fn delete_relation_removes_it() {
    let (engine, template) = harness();
    let repository = person_repository(&template);
    let alice = repository.save(&Person::new("Alice", 1)).unwrap();
    let bob = repository.save(&Person::new("Bob", 2)).unwrap();
    let rel = repository
        .create_relation(&alice, &bob, &Follows::new("a_b", &alice, &bob, 2020))
        .unwrap();

    repository.delete_relation(&rel).unwrap();

    assert!(repository.find_all_relations().unwrap().is_empty());
    assert_eq!(engine.relationship_count("FOLLOWS"), 0);
}

#[test]
fn delete_relation_by_source_removes_only_outgoing_edges() {
    let (_engine, template) = harness();
    let repository = person_repository(&template);
    let alice = repository.save(&Person::new("Alice", 1)).unwrap();
    let bob = repository.save(&Person::new("Bob", 2)).unwrap();
    let charlie = repository.save(&Person::new("Charlie", 3)).unwrap();

    repository
        .create_relation(&alice, &bob, &Follows::new("a_b", &alice, &bob, 1))
        .unwrap();
    repository
        .create_relation(&bob, &charlie, &Follows::new("b_c", &bob, &charlie, 2))
        .unwrap();

    repository.delete_relation_by_source(&alice).unwrap();

    let remaining = repository.find_all_relations().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].from.name, "Bob");
}

#[test]
fn relationship_repository_supports_heterogeneous_queries() {
    let (_engine, template) = harness();
    let nodes = person_repository(&template);
    let alice = nodes.save(&Person::new("Alice", 1)).unwrap();
    let bob = nodes.save(&Person::new("Bob", 2)).unwrap();
    let charlie = nodes.save(&Person::new("Charlie", 3)).unwrap();

    let relationships: RelationshipRepository<Follows, Person, Person> = RelationshipRepository::new(
        Arc::clone(&template),
        follows_descriptor(),
        person_descriptor(),
        person_descriptor(),
    );

    relationships
        .create(&alice, &bob, &Follows::new("a_b", &alice, &bob, 2019))
        .unwrap();
    relationships
        .create(&charlie, &bob, &Follows::new("c_b", &charlie, &bob, 2020))
        .unwrap();

    let to_bob = relationships.find_by_target(&bob).unwrap();
    assert_eq!(to_bob.len(), 2);

    let between = relationships.find_between(&alice, &bob).unwrap();
    assert_eq!(between.len(), 1);
    assert_eq!(between[0].name, "a_b");

    assert_eq!(relationships.find_all().unwrap().len(), 2);
    assert_eq!(
        relationships
            .find_by_id("c_b")
            .unwrap()
            .map(|rel| rel.since),
        Some(2020)
    );

    relationships.delete_between(&alice, &bob).unwrap();
    assert_eq!(relationships.find_all().unwrap().len(), 1);

    relationships.delete_by_id("c_b").unwrap();
    assert!(relationships.find_all().unwrap().is_empty());
}

#[test]
fn unresolved_endpoints_fail_fast_for_relationship_operations() {
    use umbra::{FieldDef, PropertyMap, RelationshipDescriptor, RelationshipMetadata, Value};

    #[derive(Debug, Clone)]
    struct Dangling {
        weight: i64,
    }

    let (_engine, template) = harness();
    // No endpoint markers and no conventionally named fields: the type name
    // still derives, but data operations must refuse to run.
    let metadata = RelationshipMetadata::derive::<Dangling>(&[FieldDef::new("weight")]);
    assert_eq!(metadata.type_name(), "DANGLING");

    let descriptor = RelationshipDescriptor::new(
        metadata,
        |row| {
            Ok(Dangling {
                weight: row.int("weight")?,
            })
        },
        |rel| PropertyMap::from([("weight".to_string(), Value::from(rel.weight))]),
        |_| Value::Null,
        |_| Value::Null,
    );
    let repository: umbra::NodeRepository<Person, Dangling> = umbra::NodeRepository::new(
        template,
        person_descriptor(),
        descriptor,
    );

    let alice = Person::new("Alice", 1);
    let bob = Person::new("Bob", 2);
    let result = repository.create_relation(&alice, &bob, &Dangling { weight: 1 });
    assert!(matches!(result, Err(AccessError::UnresolvedMetadata(_))));
}
