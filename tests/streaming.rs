mod common;

use std::sync::Arc;
use std::time::Duration;

use common::harness;
use umbra::engine::GraphEngine;
use umbra::testkit::MemoryEngine;
use umbra::{
    AccessError, GraphTemplate, PoolConfig, PooledConnectionFactory, Statement,
};

fn merge_person(name: &str, age: i64) -> Statement {
    Statement::new(
        "MERGE (p:Person {name: $id}) SET p.age = $p_age RETURN p.name AS name, p.age AS age",
    )
    .bind("id", name)
    .bind("p_age", age)
}

const ALL_PEOPLE: &str = "MATCH (p:Person) RETURN p.name AS name, p.age AS age";

#[test]
fn exhausting_the_sequence_releases_every_handle() {
    let (engine, template) = harness();
    for (name, age) in [("A", 1), ("B", 2), ("C", 3)] {
        template.execute(&merge_person(name, age)).unwrap();
    }

    let names: Vec<String> = template
        .query_iter(&Statement::new(ALL_PEOPLE), |row| Ok(row.string("name")?))
        .unwrap()
        .collect::<umbra::Result<_>>()
        .unwrap();
    assert_eq!(names.len(), 3);

    let counters = engine.counters();
    assert_eq!(counters.open_cursors(), 0);
    assert_eq!(counters.open_statements(), 0);
    assert_eq!(counters.open_connections(), 0);
}

#[test]
fn handles_stay_open_while_the_sequence_is_live() {
    let (engine, template) = harness();
    template.execute(&merge_person("A", 1)).unwrap();
    template.execute(&merge_person("B", 2)).unwrap();

    let mut rows = template
        .query_iter(&Statement::new(ALL_PEOPLE), |row| Ok(row.string("name")?))
        .unwrap();
    rows.next().unwrap().unwrap();

    let counters = engine.counters();
    assert_eq!(counters.open_cursors(), 1);
    assert_eq!(counters.open_statements(), 1);
    assert_eq!(counters.open_connections(), 1);
    assert_eq!(rows.rows_read(), 1);

    drop(rows);
    assert_eq!(counters.open_cursors(), 0);
    assert_eq!(counters.open_statements(), 0);
    assert_eq!(counters.open_connections(), 0);
}

#[test]
fn breaking_out_early_still_cleans_up() {
    let (engine, template) = harness();
    for (name, age) in [("A", 1), ("B", 2), ("C", 3), ("D", 4)] {
        template.execute(&merge_person(name, age)).unwrap();
    }

    let mut seen = Vec::new();
    for item in template
        .query_iter(&Statement::new(ALL_PEOPLE), |row| Ok(row.string("name")?))
        .unwrap()
    {
        seen.push(item.unwrap());
        if seen.len() == 2 {
            break;
        }
    }
    assert_eq!(seen.len(), 2);

    let counters = engine.counters();
    assert_eq!(counters.open_cursors(), 0);
    assert_eq!(counters.open_statements(), 0);
    assert_eq!(counters.open_connections(), 0);
}

#[test]
fn a_reader_failure_releases_handles_before_propagating() {
    let (engine, template) = harness();
    template.execute(&merge_person("A", 1)).unwrap();
    template.execute(&merge_person("B", 2)).unwrap();

    let mut rows = template
        .query_iter(&Statement::new(ALL_PEOPLE), |row| {
            if row.string("name")? == "B" {
                Err("reader exploded".into())
            } else {
                Ok(row.string("name")?)
            }
        })
        .unwrap();

    assert!(rows.next().unwrap().is_ok());
    let failure = rows.next().unwrap();
    assert!(matches!(failure, Err(AccessError::Mapping { row: 1, .. })));

    // Handles were released the moment the failure surfaced, before drop.
    let counters = engine.counters();
    assert_eq!(counters.open_cursors(), 0);
    assert_eq!(counters.open_statements(), 0);
    assert_eq!(counters.open_connections(), 0);

    // The sequence is fused after a failure.
    assert!(rows.next().is_none());
}

#[test]
fn pool_counters_return_to_baseline_after_streaming() {
    let engine = Arc::new(MemoryEngine::new());
    let pool = PooledConnectionFactory::new(
        Arc::clone(&engine) as Arc<dyn GraphEngine>,
        PoolConfig {
            max_total: 2,
            eviction_interval: Duration::ZERO,
            ..PoolConfig::default()
        },
    );
    let template = GraphTemplate::new(pool.clone());
    for (name, age) in [("A", 1), ("B", 2), ("C", 3)] {
        template.execute(&merge_person(name, age)).unwrap();
    }
    let baseline_idle = pool.idle();

    let rows = template
        .query_iter(&Statement::new(ALL_PEOPLE), |row| Ok(row.string("name")?))
        .unwrap();
    assert_eq!(pool.active(), 1);
    drop(rows);

    assert_eq!(pool.active(), 0);
    assert_eq!(pool.idle(), baseline_idle);
    assert_eq!(engine.counters().open_cursors(), 0);
    assert_eq!(engine.counters().open_statements(), 0);
}
