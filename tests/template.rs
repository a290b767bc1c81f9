mod common;

use common::harness;
use umbra::{AccessError, Statement, Value};

fn merge_person(name: &str, age: i64) -> Statement {
    Statement::new(
        "MERGE (p:Person {name: $id}) SET p.age = $p_age RETURN p.name AS name, p.age AS age",
    )
    .bind("id", name)
    .bind("p_age", age)
}

const ALL_PEOPLE: &str = "MATCH (p:Person) RETURN p.name AS name, p.age AS age";

#[test]
fn execute_runs_write_statements() {
    let (engine, template) = harness();
    template.execute(&merge_person("Alice", 30)).unwrap();

    assert_eq!(engine.node_count("Person"), 1);
    let names = template
        .query_strings(&Statement::new("MATCH (p:Person) RETURN p.name AS name"), "name")
        .unwrap();
    assert_eq!(names, vec!["Alice".to_string()]);
}

#[test]
fn query_maps_rows_with_the_reader() {
    let (_engine, template) = harness();
    template.execute(&merge_person("Bob", 25)).unwrap();
    template.execute(&merge_person("Charlie", 35)).unwrap();

    let mut people: Vec<(String, i64)> = template
        .query(&Statement::new(ALL_PEOPLE), |row| {
            Ok((row.string("name")?, row.int("age")?))
        })
        .unwrap();
    people.sort();

    assert_eq!(
        people,
        vec![("Bob".to_string(), 25), ("Charlie".to_string(), 35)]
    );
}

#[test]
fn query_one_returns_single_result() {
    let (_engine, template) = harness();
    template.execute(&merge_person("David", 40)).unwrap();

    let found = template
        .query_one(
            &Statement::new(
                "MATCH (p:Person {name: $id}) RETURN p.name AS name, p.age AS age",
            )
            .bind("id", "David"),
            |row| Ok((row.string("name")?, row.int("age")?)),
        )
        .unwrap();

    assert_eq!(found, Some(("David".to_string(), 40)));
}

#[test]
fn query_one_returns_none_when_nothing_matches() {
    let (_engine, template) = harness();

    let found = template
        .query_one(
            &Statement::new(
                "MATCH (p:Person {name: $id}) RETURN p.name AS name, p.age AS age",
            )
            .bind("id", "NonExistent"),
            |row| Ok(row.string("name")?),
        )
        .unwrap();

    assert_eq!(found, None);
}

#[test]
fn query_one_takes_the_first_of_many() {
    let (_engine, template) = harness();
    template.execute(&merge_person("Eve", 28)).unwrap();
    template.execute(&merge_person("Frank", 33)).unwrap();

    // Succeeds with the first row; the over-match is only a warning.
    let found = template
        .query_one(&Statement::new(ALL_PEOPLE), |row| Ok(row.string("name")?))
        .unwrap();
    assert!(found.is_some());
}

#[test]
fn mapping_failures_carry_the_row_index() {
    let (engine, template) = harness();
    template.execute(&merge_person("G1", 1)).unwrap();
    template.execute(&merge_person("G2", 2)).unwrap();

    let result: umbra::Result<Vec<String>> = template.query(&Statement::new(ALL_PEOPLE), |row| {
        if row.string("name")? == "G2" {
            Err("boom".into())
        } else {
            Ok(row.string("name")?)
        }
    });

    match result {
        Err(AccessError::Mapping { row, .. }) => assert_eq!(row, 1),
        other => panic!("expected mapping error, got {other:?}"),
    }
    // Cleanup ran despite the failure.
    let counters = engine.counters();
    assert_eq!(counters.open_statements(), 0);
    assert_eq!(counters.open_cursors(), 0);
    assert_eq!(counters.open_connections(), 0);
}

#[test]
fn engine_rejections_propagate() {
    let (_engine, template) = harness();
    let result = template.execute(&Statement::new("CREATE (p:Person)"));
    assert!(matches!(result, Err(AccessError::Engine(_))));
}

#[test]
fn missing_parameters_are_engine_errors() {
    let (_engine, template) = harness();
    let result = template.execute(&Statement::new(
        "MERGE (p:Person {name: $id}) RETURN p.name AS name",
    ));
    assert!(matches!(result, Err(AccessError::Engine(_))));
}

#[test]
fn unknown_columns_surface_as_mapping_errors() {
    let (_engine, template) = harness();
    template.execute(&merge_person("Henry", 50)).unwrap();

    let result: umbra::Result<Vec<String>> =
        template.query(&Statement::new(ALL_PEOPLE), |row| Ok(row.string("missing")?));
    assert!(matches!(result, Err(AccessError::Mapping { row: 0, .. })));
}

#[test]
fn parameter_values_round_trip_types() {
    let (_engine, template) = harness();
    template
        .execute(
            &Statement::new(
                "MERGE (p:Person {name: $id}) SET p.age = $p_age, p.active = $p_active \
                 RETURN p.name AS name",
            )
            .bind("id", "Iris")
            .bind("p_age", 41i64)
            .bind("p_active", true),
        )
        .unwrap();

    let row = template
        .query_one(
            &Statement::new(
                "MATCH (p:Person {name: $id}) RETURN p.age AS age, p.active AS active",
            )
            .bind("id", "Iris"),
            |row| Ok((row.int("age")?, row.bool("active")?)),
        )
        .unwrap();
    assert_eq!(row, Some((41, true)));
}

#[test]
fn null_is_projected_for_absent_properties() {
    let (_engine, template) = harness();
    template
        .execute(
            &Statement::new("MERGE (p:Person {name: $id}) RETURN p.name AS name").bind("id", "Jo"),
        )
        .unwrap();

    let age = template
        .query_one(
            &Statement::new("MATCH (p:Person {name: $id}) RETURN p.age AS age").bind("id", "Jo"),
            |row| Ok(row.get("age")?.clone()),
        )
        .unwrap();
    assert_eq!(age, Some(Value::Null));
}
