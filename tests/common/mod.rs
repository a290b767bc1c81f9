#![allow(dead_code)]

use std::sync::Arc;

use umbra::testkit::MemoryEngine;
use umbra::{
    EntityDescriptor, FieldDef, GraphTemplate, NodeMetadata, NodeRepository, PropertyMap,
    RelationshipDescriptor, RelationshipMetadata, SimpleConnectionFactory, Value,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub name: String,
    pub age: i64,
}

impl Person {
    pub fn new(name: &str, age: i64) -> Self {
        Self {
            name: name.to_string(),
            age,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Follows {
    pub name: String,
    pub from: Person,
    pub to: Person,
    pub since: i64,
}

impl Follows {
    pub fn new(name: &str, from: &Person, to: &Person, since: i64) -> Self {
        Self {
            name: name.to_string(),
            from: from.clone(),
            to: to.clone(),
            since,
        }
    }
}

pub fn person_descriptor() -> EntityDescriptor<Person> {
    EntityDescriptor::new(
        NodeMetadata::derive::<Person>(&[FieldDef::id("name"), FieldDef::new("age")]),
        |row| {
            Ok(Person {
                name: row.string("name")?,
                age: row.int("age")?,
            })
        },
        |person| PropertyMap::from([("age".to_string(), Value::from(person.age))]),
        |person| Value::from(person.name.clone()),
    )
}

pub fn follows_descriptor() -> RelationshipDescriptor<Follows> {
    RelationshipDescriptor::new(
        RelationshipMetadata::derive::<Follows>(&[
            FieldDef::id("name"),
            FieldDef::source("from"),
            FieldDef::target("to"),
            FieldDef::new("since"),
        ]),
        |row| {
            Ok(Follows {
                name: row.string("name")?,
                from: Person {
                    name: row.string("from")?,
                    age: 0,
                },
                to: Person {
                    name: row.string("to")?,
                    age: 0,
                },
                since: row.int("since")?,
            })
        },
        |follows| PropertyMap::from([("since".to_string(), Value::from(follows.since))]),
        |follows| Value::from(follows.from.name.clone()),
        |follows| Value::from(follows.to.name.clone()),
    )
    .with_identity(|follows| Value::from(follows.name.clone()))
}

pub fn harness() -> (Arc<MemoryEngine>, Arc<GraphTemplate>) {
    let engine = Arc::new(MemoryEngine::new());
    let factory = Arc::new(SimpleConnectionFactory::new(
        Arc::clone(&engine) as Arc<dyn umbra::engine::GraphEngine>
    ));
    let template = Arc::new(GraphTemplate::new(factory));
    (engine, template)
}

pub fn person_repository(template: &Arc<GraphTemplate>) -> NodeRepository<Person, Follows> {
    NodeRepository::new(
        Arc::clone(template),
        person_descriptor(),
        follows_descriptor(),
    )
}
