//! Parameterized statements and the metadata-driven statement builders.
//!
//! Query text never embeds values: every user-supplied value is bound as a
//! named parameter and shipped out-of-band, which is what makes the generated
//! statements safe to log and immune to injection through entity data.

use crate::error::Result;
use crate::metadata::{NodeMetadata, RelationshipMetadata};
use crate::value::{PropertyMap, Value};

/// A piece of query text plus its named parameters.
#[derive(Debug, Clone)]
pub struct Statement {
    text: String,
    parameters: PropertyMap,
}

impl Statement {
    /// Creates a statement from raw query text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parameters: PropertyMap::new(),
        }
    }

    /// Binds a named parameter, replacing any previous binding of that name.
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// The query text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The bound parameters.
    pub fn parameters(&self) -> &PropertyMap {
        &self.parameters
    }
}

fn node_projection(meta: &NodeMetadata) -> String {
    meta.property_names()
        .iter()
        .map(|p| format!("n.{p} AS {p}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Projection for relationship reads: the relationship's own properties plus
/// the endpoint identities aliased to the declared endpoint field names.
fn relationship_projection(
    rel: &RelationshipMetadata,
    source: &NodeMetadata,
    target: &NodeMetadata,
) -> Result<String> {
    let source_field = rel.require_source_field()?;
    let target_field = rel.require_target_field()?;
    let source_id = source.require_id_property()?;
    let target_id = target.require_id_property()?;

    let mut items: Vec<String> = rel
        .value_property_names()
        .into_iter()
        .map(|p| format!("r.{p} AS {p}"))
        .collect();
    items.push(format!("s.{source_id} AS {source_field}"));
    items.push(format!("t.{target_id} AS {target_field}"));
    Ok(items.join(", "))
}

fn set_clause(var: &str, properties: &PropertyMap) -> String {
    if properties.is_empty() {
        return String::new();
    }
    let assignments = properties
        .keys()
        .map(|p| format!("{var}.{p} = $p_{p}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(" SET {assignments}")
}

fn bind_properties(mut statement: Statement, properties: &PropertyMap) -> Statement {
    for (name, value) in properties {
        statement = statement.bind(format!("p_{name}"), value.clone());
    }
    statement
}

/// Conditional upsert: merge on the identity property, then set all
/// writer-provided properties and read the node back.
pub(crate) fn merge_node(
    meta: &NodeMetadata,
    id: Value,
    properties: &PropertyMap,
) -> Result<Statement> {
    let id_property = meta.require_id_property()?;
    let text = format!(
        "MERGE (n:{label} {{{id_property}: $id}}){set} RETURN {projection}",
        label = meta.label(),
        set = set_clause("n", properties),
        projection = node_projection(meta),
    );
    Ok(bind_properties(Statement::new(text).bind("id", id), properties))
}

pub(crate) fn match_node_by_id(meta: &NodeMetadata, id: Value) -> Result<Statement> {
    let id_property = meta.require_id_property()?;
    let text = format!(
        "MATCH (n:{label} {{{id_property}: $id}}) RETURN {projection}",
        label = meta.label(),
        projection = node_projection(meta),
    );
    Ok(Statement::new(text).bind("id", id))
}

pub(crate) fn match_all_nodes(meta: &NodeMetadata) -> Statement {
    Statement::new(format!(
        "MATCH (n:{label}) RETURN {projection}",
        label = meta.label(),
        projection = node_projection(meta),
    ))
}

pub(crate) fn count_nodes(meta: &NodeMetadata) -> Statement {
    Statement::new(format!(
        "MATCH (n:{label}) RETURN count(n) AS count",
        label = meta.label(),
    ))
}

/// Detach-deletes by identity. Detaching is required: the property graph
/// forbids deleting a node with live relationships.
pub(crate) fn delete_node_by_id(meta: &NodeMetadata, id: Value) -> Result<Statement> {
    let id_property = meta.require_id_property()?;
    let text = format!(
        "MATCH (n:{label} {{{id_property}: $id}}) DETACH DELETE n",
        label = meta.label(),
    );
    Ok(Statement::new(text).bind("id", id))
}

pub(crate) fn delete_all_nodes(meta: &NodeMetadata) -> Statement {
    Statement::new(format!(
        "MATCH (n:{label}) DETACH DELETE n",
        label = meta.label(),
    ))
}

/// Merges a typed relationship between two identity-matched endpoints.
///
/// When the relationship type resolves an identity property the merge keys on
/// it, so re-invocation updates the existing relationship instead of touching
/// only endpoint-pair matches.
pub(crate) fn merge_relationship(
    rel: &RelationshipMetadata,
    source: &NodeMetadata,
    target: &NodeMetadata,
    source_id: Value,
    target_id: Value,
    rel_id: Option<Value>,
    properties: &PropertyMap,
) -> Result<Statement> {
    let projection = relationship_projection(rel, source, target)?;
    let source_id_property = source.require_id_property()?;
    let target_id_property = target.require_id_property()?;

    let rel_pattern = match (&rel_id, rel.id_property()) {
        (Some(_), Some(id_property)) => {
            format!("[r:{} {{{id_property}: $rel_id}}]", rel.type_name())
        }
        _ => format!("[r:{}]", rel.type_name()),
    };
    let text = format!(
        "MATCH (s:{source_label} {{{source_id_property}: $source_id}}), \
         (t:{target_label} {{{target_id_property}: $target_id}}) \
         MERGE (s)-{rel_pattern}->(t){set} RETURN {projection}",
        source_label = source.label(),
        target_label = target.label(),
        set = set_clause("r", properties),
    );
    let mut statement = Statement::new(text)
        .bind("source_id", source_id)
        .bind("target_id", target_id);
    if let Some(id) = rel_id {
        statement = statement.bind("rel_id", id);
    }
    Ok(bind_properties(statement, properties))
}

pub(crate) fn relations_by_source(
    rel: &RelationshipMetadata,
    source: &NodeMetadata,
    target: &NodeMetadata,
    source_id: Value,
) -> Result<Statement> {
    let projection = relationship_projection(rel, source, target)?;
    let source_id_property = source.require_id_property()?;
    let text = format!(
        "MATCH (s:{source_label} {{{source_id_property}: $source_id}})-[r:{rel_type}]->\
         (t:{target_label}) RETURN {projection}",
        source_label = source.label(),
        rel_type = rel.type_name(),
        target_label = target.label(),
    );
    Ok(Statement::new(text).bind("source_id", source_id))
}

pub(crate) fn relations_by_target(
    rel: &RelationshipMetadata,
    source: &NodeMetadata,
    target: &NodeMetadata,
    target_id: Value,
) -> Result<Statement> {
    let projection = relationship_projection(rel, source, target)?;
    let target_id_property = target.require_id_property()?;
    let text = format!(
        "MATCH (s:{source_label})-[r:{rel_type}]->\
         (t:{target_label} {{{target_id_property}: $target_id}}) RETURN {projection}",
        source_label = source.label(),
        rel_type = rel.type_name(),
        target_label = target.label(),
    );
    Ok(Statement::new(text).bind("target_id", target_id))
}

pub(crate) fn relations_between(
    rel: &RelationshipMetadata,
    source: &NodeMetadata,
    target: &NodeMetadata,
    source_id: Value,
    target_id: Value,
) -> Result<Statement> {
    let projection = relationship_projection(rel, source, target)?;
    let source_id_property = source.require_id_property()?;
    let target_id_property = target.require_id_property()?;
    let text = format!(
        "MATCH (s:{source_label} {{{source_id_property}: $source_id}})-[r:{rel_type}]->\
         (t:{target_label} {{{target_id_property}: $target_id}}) RETURN {projection}",
        source_label = source.label(),
        rel_type = rel.type_name(),
        target_label = target.label(),
    );
    Ok(Statement::new(text)
        .bind("source_id", source_id)
        .bind("target_id", target_id))
}

pub(crate) fn all_relations(
    rel: &RelationshipMetadata,
    source: &NodeMetadata,
    target: &NodeMetadata,
) -> Result<Statement> {
    let projection = relationship_projection(rel, source, target)?;
    let text = format!(
        "MATCH (s:{source_label})-[r:{rel_type}]->(t:{target_label}) RETURN {projection}",
        source_label = source.label(),
        rel_type = rel.type_name(),
        target_label = target.label(),
    );
    Ok(Statement::new(text))
}

pub(crate) fn relation_by_id(
    rel: &RelationshipMetadata,
    source: &NodeMetadata,
    target: &NodeMetadata,
    id: Value,
) -> Result<Statement> {
    let projection = relationship_projection(rel, source, target)?;
    let id_property = rel.require_id_property()?;
    let text = format!(
        "MATCH (s:{source_label})-[r:{rel_type} {{{id_property}: $id}}]->(t:{target_label}) \
         RETURN {projection}",
        source_label = source.label(),
        rel_type = rel.type_name(),
        target_label = target.label(),
    );
    Ok(Statement::new(text).bind("id", id))
}

pub(crate) fn delete_relation_by_id(
    rel: &RelationshipMetadata,
    source: &NodeMetadata,
    target: &NodeMetadata,
    id: Value,
) -> Result<Statement> {
    let id_property = rel.require_id_property()?;
    let text = format!(
        "MATCH (s:{source_label})-[r:{rel_type} {{{id_property}: $id}}]->(t:{target_label}) \
         DELETE r",
        source_label = source.label(),
        rel_type = rel.type_name(),
        target_label = target.label(),
    );
    Ok(Statement::new(text).bind("id", id))
}

pub(crate) fn delete_relations_by_source(
    rel: &RelationshipMetadata,
    source: &NodeMetadata,
    target: &NodeMetadata,
    source_id: Value,
) -> Result<Statement> {
    let source_id_property = source.require_id_property()?;
    let text = format!(
        "MATCH (s:{source_label} {{{source_id_property}: $source_id}})-[r:{rel_type}]->\
         (t:{target_label}) DELETE r",
        source_label = source.label(),
        rel_type = rel.type_name(),
        target_label = target.label(),
    );
    Ok(Statement::new(text).bind("source_id", source_id))
}

pub(crate) fn delete_relations_between(
    rel: &RelationshipMetadata,
    source: &NodeMetadata,
    target: &NodeMetadata,
    source_id: Value,
    target_id: Value,
) -> Result<Statement> {
    let source_id_property = source.require_id_property()?;
    let target_id_property = target.require_id_property()?;
    let text = format!(
        "MATCH (s:{source_label} {{{source_id_property}: $source_id}})-[r:{rel_type}]->\
         (t:{target_label} {{{target_id_property}: $target_id}}) DELETE r",
        source_label = source.label(),
        rel_type = rel.type_name(),
        target_label = target.label(),
    );
    Ok(Statement::new(text)
        .bind("source_id", source_id)
        .bind("target_id", target_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::FieldDef;

    struct Person;
    struct Follows;

    fn person_meta() -> NodeMetadata {
        NodeMetadata::derive::<Person>(&[FieldDef::id("name"), FieldDef::new("age")])
    }

    fn follows_meta() -> RelationshipMetadata {
        RelationshipMetadata::derive::<Follows>(&[
            FieldDef::id("name"),
            FieldDef::source("from"),
            FieldDef::target("to"),
            FieldDef::new("since"),
        ])
    }

    #[test]
    fn merge_node_binds_id_and_properties() {
        let mut props = PropertyMap::new();
        props.insert("age".to_string(), Value::from(30i64));
        let stmt = merge_node(&person_meta(), Value::from("Alice"), &props).unwrap();
        assert_eq!(
            stmt.text(),
            "MERGE (n:Person {name: $id}) SET n.age = $p_age RETURN n.name AS name, n.age AS age"
        );
        assert_eq!(stmt.parameters().get("id"), Some(&Value::from("Alice")));
        assert_eq!(stmt.parameters().get("p_age"), Some(&Value::from(30i64)));
    }

    #[test]
    fn merge_node_without_properties_has_no_set_clause() {
        let stmt = merge_node(&person_meta(), Value::from("Alice"), &PropertyMap::new()).unwrap();
        assert!(!stmt.text().contains("SET"));
    }

    #[test]
    fn count_uses_count_projection() {
        let stmt = count_nodes(&person_meta());
        assert_eq!(stmt.text(), "MATCH (n:Person) RETURN count(n) AS count");
    }

    #[test]
    fn merge_relationship_keys_on_identity_when_present() {
        let meta = person_meta();
        let mut props = PropertyMap::new();
        props.insert("since".to_string(), Value::from(2020i64));
        let stmt = merge_relationship(
            &follows_meta(),
            &meta,
            &meta,
            Value::from("Alice"),
            Value::from("Bob"),
            Some(Value::from("alice_bob")),
            &props,
        )
        .unwrap();
        assert!(stmt.text().contains("MERGE (s)-[r:FOLLOWS {name: $rel_id}]->(t)"));
        assert!(stmt.text().contains("s.name AS from, t.name AS to"));
        assert_eq!(
            stmt.parameters().get("rel_id"),
            Some(&Value::from("alice_bob"))
        );
    }

    #[test]
    fn merge_relationship_without_identity_keys_on_endpoints() {
        let meta = person_meta();
        let rel = RelationshipMetadata::derive::<Follows>(&[
            FieldDef::source("from"),
            FieldDef::target("to"),
            FieldDef::new("since"),
        ]);
        let stmt = merge_relationship(
            &rel,
            &meta,
            &meta,
            Value::from("Alice"),
            Value::from("Bob"),
            None,
            &PropertyMap::new(),
        )
        .unwrap();
        assert!(stmt.text().contains("MERGE (s)-[r:FOLLOWS]->(t)"));
    }

    #[test]
    fn unresolved_identity_fails_fast() {
        let meta = NodeMetadata::derive::<Person>(&[FieldDef::new("age")]);
        assert!(merge_node(&meta, Value::Null, &PropertyMap::new()).is_err());
    }
}
