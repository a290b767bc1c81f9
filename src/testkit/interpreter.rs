//! Interpreter for the statement shapes the builders emit.
//!
//! This is deliberately not a query-language implementation. It recognizes
//! exactly the MATCH/MERGE/SET/RETURN/DELETE statement family generated by
//! [`crate::statement`] and evaluates it against the in-memory store, which
//! is all the tests need.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::{AccessError, Result};
use crate::value::{PropertyMap, Value};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NodeRef {
    pub label: String,
    pub key_property: String,
    pub key: Value,
}

#[derive(Debug)]
pub(crate) struct StoredRelationship {
    pub rel_type: String,
    pub source: NodeRef,
    pub target: NodeRef,
    pub properties: PropertyMap,
}

/// Labeled nodes and typed relationships.
#[derive(Debug, Default)]
pub(crate) struct GraphStore {
    pub nodes: FxHashMap<String, Vec<PropertyMap>>,
    pub relationships: Vec<StoredRelationship>,
}

/// Materialized result of one statement.
pub(crate) struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<SmallVec<[Value; 8]>>,
}

impl ResultSet {
    fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Symbol(char),
}

fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
        } else if ch.is_alphanumeric() || ch == '_' {
            let mut ident = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_alphanumeric() || c == '_' {
                    ident.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Ident(ident));
        } else if "(){}[]:,.$=->".contains(ch) {
            tokens.push(Token::Symbol(ch));
            chars.next();
        } else {
            return Err(AccessError::Engine(format!(
                "unexpected character {ch:?} in statement"
            )));
        }
    }
    Ok(tokens)
}

#[derive(Debug, Clone)]
struct NodePattern {
    var: String,
    label: Option<String>,
    filter: Option<Filter>,
}

#[derive(Debug, Clone)]
struct RelPattern {
    var: String,
    rel_type: String,
    filter: Option<Filter>,
}

#[derive(Debug, Clone)]
struct Filter {
    property: String,
    parameter: String,
}

#[derive(Debug)]
enum Projection {
    Property {
        var: String,
        property: String,
        alias: String,
    },
    Count {
        alias: String,
    },
}

#[derive(Debug)]
struct SetItem {
    var: String,
    property: String,
    parameter: String,
}

#[derive(Debug)]
enum Pattern {
    Node(NodePattern),
    Path {
        left: NodePattern,
        rel: RelPattern,
        right: NodePattern,
    },
}

#[derive(Debug)]
enum Action {
    Return(Vec<Projection>),
    Delete { var: String },
}

#[derive(Debug)]
enum Query {
    Match {
        patterns: Vec<Pattern>,
        action: Action,
    },
    MergeNode {
        node: NodePattern,
        sets: Vec<SetItem>,
        returns: Vec<Projection>,
    },
    MatchMergeRel {
        left: NodePattern,
        right: NodePattern,
        rel: RelPattern,
        sets: Vec<SetItem>,
        returns: Vec<Projection>,
    },
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(text: &str) -> Result<Self> {
        Ok(Self {
            tokens: tokenize(text)?,
            pos: 0,
        })
    }

    fn error(&self, message: &str) -> AccessError {
        AccessError::Engine(format!("statement parse error: {message}"))
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect_symbol(&mut self, symbol: char) -> Result<()> {
        match self.next() {
            Some(Token::Symbol(s)) if s == symbol => Ok(()),
            other => Err(self.error(&format!("expected {symbol:?}, found {other:?}"))),
        }
    }

    fn expect_ident(&mut self) -> Result<String> {
        match self.next() {
            Some(Token::Ident(ident)) => Ok(ident),
            other => Err(self.error(&format!("expected identifier, found {other:?}"))),
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        let ident = self.expect_ident()?;
        if ident == keyword {
            Ok(())
        } else {
            Err(self.error(&format!("expected {keyword}, found {ident}")))
        }
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(i)) if i == keyword)
    }

    fn at_symbol(&self, symbol: char) -> bool {
        matches!(self.peek(), Some(Token::Symbol(s)) if *s == symbol)
    }

    fn parse(mut self) -> Result<Query> {
        let keyword = self.expect_ident()?;
        let query = match keyword.as_str() {
            "MERGE" => {
                let node = self.parse_node_pattern()?;
                let sets = self.parse_optional_sets()?;
                self.expect_keyword("RETURN")?;
                let returns = self.parse_projections()?;
                Query::MergeNode {
                    node,
                    sets,
                    returns,
                }
            }
            "MATCH" => self.parse_match()?,
            other => return Err(self.error(&format!("unsupported statement {other}"))),
        };
        if self.peek().is_some() {
            return Err(self.error("trailing tokens after statement"));
        }
        Ok(query)
    }

    fn parse_match(&mut self) -> Result<Query> {
        let mut patterns = vec![self.parse_pattern()?];
        while self.at_symbol(',') {
            self.next();
            patterns.push(self.parse_pattern()?);
        }

        if self.at_keyword("MERGE") {
            self.next();
            let (left_var, rel, right_var) = self.parse_bare_path()?;
            let left = self
                .node_pattern(&patterns, &left_var)
                .ok_or_else(|| self.error(&format!("unknown pattern variable {left_var}")))?;
            let right = self
                .node_pattern(&patterns, &right_var)
                .ok_or_else(|| self.error(&format!("unknown pattern variable {right_var}")))?;
            let sets = self.parse_optional_sets()?;
            self.expect_keyword("RETURN")?;
            let returns = self.parse_projections()?;
            return Ok(Query::MatchMergeRel {
                left,
                right,
                rel,
                sets,
                returns,
            });
        }

        let action = if self.at_keyword("RETURN") {
            self.next();
            Action::Return(self.parse_projections()?)
        } else if self.at_keyword("DETACH") {
            self.next();
            self.expect_keyword("DELETE")?;
            Action::Delete {
                var: self.expect_ident()?,
            }
        } else if self.at_keyword("DELETE") {
            self.next();
            Action::Delete {
                var: self.expect_ident()?,
            }
        } else {
            return Err(self.error("expected RETURN, DELETE, DETACH DELETE, or MERGE"));
        };
        Ok(Query::Match { patterns, action })
    }

    fn node_pattern(&self, patterns: &[Pattern], var: &str) -> Option<NodePattern> {
        patterns.iter().find_map(|p| match p {
            Pattern::Node(node) if node.var == var => Some(node.clone()),
            _ => None,
        })
    }

    fn parse_pattern(&mut self) -> Result<Pattern> {
        let left = self.parse_node_pattern()?;
        if self.at_symbol('-') {
            let rel = self.parse_rel_arrow()?;
            let right = self.parse_node_pattern()?;
            Ok(Pattern::Path { left, rel, right })
        } else {
            Ok(Pattern::Node(left))
        }
    }

    /// `(s)-[r:TYPE {prop: $param}]->(t)` with bare variable references.
    fn parse_bare_path(&mut self) -> Result<(String, RelPattern, String)> {
        self.expect_symbol('(')?;
        let left = self.expect_ident()?;
        self.expect_symbol(')')?;
        let rel = self.parse_rel_arrow()?;
        self.expect_symbol('(')?;
        let right = self.expect_ident()?;
        self.expect_symbol(')')?;
        Ok((left, rel, right))
    }

    fn parse_rel_arrow(&mut self) -> Result<RelPattern> {
        self.expect_symbol('-')?;
        self.expect_symbol('[')?;
        let var = self.expect_ident()?;
        self.expect_symbol(':')?;
        let rel_type = self.expect_ident()?;
        let filter = self.parse_optional_filter()?;
        self.expect_symbol(']')?;
        self.expect_symbol('-')?;
        self.expect_symbol('>')?;
        Ok(RelPattern {
            var,
            rel_type,
            filter,
        })
    }

    fn parse_node_pattern(&mut self) -> Result<NodePattern> {
        self.expect_symbol('(')?;
        let var = self.expect_ident()?;
        let label = if self.at_symbol(':') {
            self.next();
            Some(self.expect_ident()?)
        } else {
            None
        };
        let filter = self.parse_optional_filter()?;
        self.expect_symbol(')')?;
        Ok(NodePattern { var, label, filter })
    }

    fn parse_optional_filter(&mut self) -> Result<Option<Filter>> {
        if !self.at_symbol('{') {
            return Ok(None);
        }
        self.next();
        let property = self.expect_ident()?;
        self.expect_symbol(':')?;
        self.expect_symbol('$')?;
        let parameter = self.expect_ident()?;
        self.expect_symbol('}')?;
        Ok(Some(Filter {
            property,
            parameter,
        }))
    }

    fn parse_optional_sets(&mut self) -> Result<Vec<SetItem>> {
        let mut sets = Vec::new();
        if !self.at_keyword("SET") {
            return Ok(sets);
        }
        self.next();
        loop {
            let var = self.expect_ident()?;
            self.expect_symbol('.')?;
            let property = self.expect_ident()?;
            self.expect_symbol('=')?;
            self.expect_symbol('$')?;
            let parameter = self.expect_ident()?;
            sets.push(SetItem {
                var,
                property,
                parameter,
            });
            if self.at_symbol(',') {
                self.next();
            } else {
                break;
            }
        }
        Ok(sets)
    }

    fn parse_projections(&mut self) -> Result<Vec<Projection>> {
        let mut projections = Vec::new();
        loop {
            let ident = self.expect_ident()?;
            let projection = if ident == "count" && self.at_symbol('(') {
                self.next();
                let _var = self.expect_ident()?;
                self.expect_symbol(')')?;
                self.expect_keyword("AS")?;
                Projection::Count {
                    alias: self.expect_ident()?,
                }
            } else {
                self.expect_symbol('.')?;
                let property = self.expect_ident()?;
                self.expect_keyword("AS")?;
                Projection::Property {
                    var: ident,
                    property,
                    alias: self.expect_ident()?,
                }
            };
            projections.push(projection);
            if self.at_symbol(',') {
                self.next();
            } else {
                break;
            }
        }
        Ok(projections)
    }
}

fn parameter<'p>(parameters: &'p PropertyMap, name: &str) -> Result<&'p Value> {
    parameters
        .get(name)
        .ok_or_else(|| AccessError::Engine(format!("missing parameter ${name}")))
}

fn node_matches(node: &PropertyMap, filter: &Option<Filter>, parameters: &PropertyMap) -> Result<bool> {
    match filter {
        Some(filter) => {
            let expected = parameter(parameters, &filter.parameter)?;
            Ok(node.get(&filter.property) == Some(expected))
        }
        None => Ok(true),
    }
}

fn node_ref(pattern: &NodePattern, parameters: &PropertyMap) -> Result<NodeRef> {
    let label = pattern
        .label
        .clone()
        .ok_or_else(|| AccessError::Engine("endpoint pattern requires a label".into()))?;
    let filter = pattern
        .filter
        .as_ref()
        .ok_or_else(|| AccessError::Engine("endpoint pattern requires an identity filter".into()))?;
    Ok(NodeRef {
        label,
        key_property: filter.property.clone(),
        key: parameter(parameters, &filter.parameter)?.clone(),
    })
}

fn resolve_ref<'s>(store: &'s GraphStore, reference: &NodeRef) -> Option<&'s PropertyMap> {
    store
        .nodes
        .get(&reference.label)?
        .iter()
        .find(|node| node.get(&reference.key_property) == Some(&reference.key))
}

fn project(
    projections: &[Projection],
    scopes: &FxHashMap<&str, &PropertyMap>,
) -> SmallVec<[Value; 8]> {
    projections
        .iter()
        .map(|projection| match projection {
            Projection::Property { var, property, .. } => scopes
                .get(var.as_str())
                .and_then(|props| props.get(property))
                .cloned()
                .unwrap_or(Value::Null),
            Projection::Count { .. } => Value::Null,
        })
        .collect()
}

fn columns(projections: &[Projection]) -> Vec<String> {
    projections
        .iter()
        .map(|projection| match projection {
            Projection::Property { alias, .. } | Projection::Count { alias } => alias.clone(),
        })
        .collect()
}

/// Parses and evaluates one statement against the store.
pub(crate) fn run(
    store: &mut GraphStore,
    text: &str,
    parameters: &PropertyMap,
) -> Result<ResultSet> {
    let query = Parser::new(text)?.parse()?;
    match query {
        Query::MergeNode {
            node,
            sets,
            returns,
        } => eval_merge_node(store, &node, &sets, &returns, parameters),
        Query::MatchMergeRel {
            left,
            right,
            rel,
            sets,
            returns,
        } => eval_merge_rel(store, &left, &right, &rel, &sets, &returns, parameters),
        Query::Match { patterns, action } => match patterns.as_slice() {
            [Pattern::Node(node)] => eval_match_node(store, node, &action, parameters),
            [Pattern::Path { left, rel, right }] => {
                eval_match_path(store, left, rel, right, &action, parameters)
            }
            _ => Err(AccessError::Engine(
                "unsupported pattern combination".into(),
            )),
        },
    }
}

fn eval_merge_node(
    store: &mut GraphStore,
    pattern: &NodePattern,
    sets: &[SetItem],
    returns: &[Projection],
    parameters: &PropertyMap,
) -> Result<ResultSet> {
    let reference = node_ref(pattern, parameters)?;
    let nodes = store.nodes.entry(reference.label.clone()).or_default();
    let index = match nodes
        .iter()
        .position(|node| node.get(&reference.key_property) == Some(&reference.key))
    {
        Some(index) => index,
        None => {
            let mut node = PropertyMap::new();
            node.insert(reference.key_property.clone(), reference.key.clone());
            nodes.push(node);
            nodes.len() - 1
        }
    };
    for set in sets {
        let value = parameter(parameters, &set.parameter)?.clone();
        nodes[index].insert(set.property.clone(), value);
    }

    let node = &nodes[index];
    let mut scopes: FxHashMap<&str, &PropertyMap> = FxHashMap::default();
    scopes.insert(pattern.var.as_str(), node);
    Ok(ResultSet {
        columns: columns(returns),
        rows: vec![project(returns, &scopes)],
    })
}

fn eval_match_node(
    store: &mut GraphStore,
    pattern: &NodePattern,
    action: &Action,
    parameters: &PropertyMap,
) -> Result<ResultSet> {
    let label = pattern
        .label
        .clone()
        .ok_or_else(|| AccessError::Engine("node pattern requires a label".into()))?;

    match action {
        Action::Return(projections) => {
            let empty = Vec::new();
            let nodes = store.nodes.get(&label).unwrap_or(&empty);
            let mut matched = Vec::new();
            for node in nodes {
                if node_matches(node, &pattern.filter, parameters)? {
                    matched.push(node);
                }
            }
            if matches!(projections.as_slice(), [Projection::Count { .. }]) {
                return Ok(ResultSet {
                    columns: columns(projections),
                    rows: vec![SmallVec::from_vec(vec![Value::Int(matched.len() as i64)])],
                });
            }
            let mut rows = Vec::with_capacity(matched.len());
            for node in matched {
                let mut scopes: FxHashMap<&str, &PropertyMap> = FxHashMap::default();
                scopes.insert(pattern.var.as_str(), node);
                rows.push(project(projections, &scopes));
            }
            Ok(ResultSet {
                columns: columns(projections),
                rows,
            })
        }
        Action::Delete { .. } => {
            let mut removed = Vec::new();
            if let Some(nodes) = store.nodes.get_mut(&label) {
                let mut kept = Vec::with_capacity(nodes.len());
                for node in nodes.drain(..) {
                    if node_matches(&node, &pattern.filter, parameters)? {
                        removed.push(node);
                    } else {
                        kept.push(node);
                    }
                }
                *nodes = kept;
            }
            // Detach: drop relationships incident to any removed node.
            store.relationships.retain(|rel| {
                let references_removed = |reference: &NodeRef| {
                    reference.label == label
                        && removed
                            .iter()
                            .any(|node| node.get(&reference.key_property) == Some(&reference.key))
                };
                !references_removed(&rel.source) && !references_removed(&rel.target)
            });
            Ok(ResultSet::empty())
        }
    }
}

fn eval_match_path(
    store: &mut GraphStore,
    left: &NodePattern,
    rel: &RelPattern,
    right: &NodePattern,
    action: &Action,
    parameters: &PropertyMap,
) -> Result<ResultSet> {
    let mut matched_indices = Vec::new();
    for (index, stored) in store.relationships.iter().enumerate() {
        if stored.rel_type != rel.rel_type {
            continue;
        }
        if let Some(filter) = &rel.filter {
            let expected = parameter(parameters, &filter.parameter)?;
            if stored.properties.get(&filter.property) != Some(expected) {
                continue;
            }
        }
        if let Some(label) = &left.label {
            if &stored.source.label != label {
                continue;
            }
        }
        if let Some(label) = &right.label {
            if &stored.target.label != label {
                continue;
            }
        }
        let source = match resolve_ref(store, &stored.source) {
            Some(node) => node,
            None => continue,
        };
        let target = match resolve_ref(store, &stored.target) {
            Some(node) => node,
            None => continue,
        };
        if !node_matches(source, &left.filter, parameters)?
            || !node_matches(target, &right.filter, parameters)?
        {
            continue;
        }
        matched_indices.push(index);
    }

    match action {
        Action::Return(projections) => {
            let mut rows = Vec::with_capacity(matched_indices.len());
            for index in matched_indices {
                let stored = &store.relationships[index];
                let source = resolve_ref(store, &stored.source);
                let target = resolve_ref(store, &stored.target);
                let (Some(source), Some(target)) = (source, target) else {
                    continue;
                };
                let mut scopes: FxHashMap<&str, &PropertyMap> = FxHashMap::default();
                scopes.insert(rel.var.as_str(), &stored.properties);
                scopes.insert(left.var.as_str(), source);
                scopes.insert(right.var.as_str(), target);
                rows.push(project(projections, &scopes));
            }
            Ok(ResultSet {
                columns: columns(projections),
                rows,
            })
        }
        Action::Delete { .. } => {
            let mut index = 0usize;
            store.relationships.retain(|_| {
                let delete = matched_indices.contains(&index);
                index += 1;
                !delete
            });
            Ok(ResultSet::empty())
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn eval_merge_rel(
    store: &mut GraphStore,
    left: &NodePattern,
    right: &NodePattern,
    rel: &RelPattern,
    sets: &[SetItem],
    returns: &[Projection],
    parameters: &PropertyMap,
) -> Result<ResultSet> {
    let source_ref = node_ref(left, parameters)?;
    let target_ref = node_ref(right, parameters)?;
    // MATCH semantics: if either endpoint does not exist, the statement
    // matches nothing and the merge never runs.
    if resolve_ref(store, &source_ref).is_none() || resolve_ref(store, &target_ref).is_none() {
        return Ok(ResultSet {
            columns: columns(returns),
            rows: Vec::new(),
        });
    }

    let rel_filter_value = match &rel.filter {
        Some(filter) => Some((
            filter.property.clone(),
            parameter(parameters, &filter.parameter)?.clone(),
        )),
        None => None,
    };

    let position = store.relationships.iter().position(|stored| {
        stored.rel_type == rel.rel_type
            && stored.source == source_ref
            && stored.target == target_ref
            && match &rel_filter_value {
                Some((property, value)) => stored.properties.get(property) == Some(value),
                None => true,
            }
    });
    let index = match position {
        Some(index) => index,
        None => {
            let mut properties = PropertyMap::new();
            if let Some((property, value)) = &rel_filter_value {
                properties.insert(property.clone(), value.clone());
            }
            store.relationships.push(StoredRelationship {
                rel_type: rel.rel_type.clone(),
                source: source_ref.clone(),
                target: target_ref.clone(),
                properties,
            });
            store.relationships.len() - 1
        }
    };
    for set in sets {
        let value = parameter(parameters, &set.parameter)?.clone();
        store.relationships[index]
            .properties
            .insert(set.property.clone(), value);
    }

    let stored = &store.relationships[index];
    let source = resolve_ref(store, &stored.source);
    let target = resolve_ref(store, &stored.target);
    let (Some(source), Some(target)) = (source, target) else {
        return Ok(ResultSet {
            columns: columns(returns),
            rows: Vec::new(),
        });
    };
    let mut scopes: FxHashMap<&str, &PropertyMap> = FxHashMap::default();
    scopes.insert(rel.var.as_str(), &stored.properties);
    scopes.insert(left.var.as_str(), source);
    scopes.insert(right.var.as_str(), target);
    Ok(ResultSet {
        columns: columns(returns),
        rows: vec![project(returns, &scopes)],
    })
}

/// Shared column index for a result set, reused across its rows.
pub(crate) fn column_index(names: &[String]) -> Arc<FxHashMap<String, usize>> {
    Arc::new(
        names
            .iter()
            .enumerate()
            .map(|(index, name)| (name.clone(), index))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(entries: &[(&str, Value)]) -> PropertyMap {
        entries
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn merge_creates_then_updates() {
        let mut store = GraphStore::default();
        let text =
            "MERGE (n:Person {name: $id}) SET n.age = $p_age RETURN n.name AS name, n.age AS age";
        let result = run(
            &mut store,
            text,
            &params(&[("id", Value::from("Alice")), ("p_age", Value::from(30i64))]),
        )
        .unwrap();
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0][1], Value::Int(30));

        run(
            &mut store,
            text,
            &params(&[("id", Value::from("Alice")), ("p_age", Value::from(31i64))]),
        )
        .unwrap();
        assert_eq!(store.nodes["Person"].len(), 1);
        assert_eq!(
            store.nodes["Person"][0].get("age"),
            Some(&Value::Int(31))
        );
    }

    #[test]
    fn count_projects_single_row() {
        let mut store = GraphStore::default();
        run(
            &mut store,
            "MERGE (n:Person {name: $id}) RETURN n.name AS name",
            &params(&[("id", Value::from("Alice"))]),
        )
        .unwrap();
        let result = run(
            &mut store,
            "MATCH (n:Person) RETURN count(n) AS count",
            &PropertyMap::new(),
        )
        .unwrap();
        assert_eq!(result.rows, vec![SmallVec::from_vec(vec![Value::Int(1)])]);
    }

    #[test]
    fn detach_delete_removes_incident_relationships() {
        let mut store = GraphStore::default();
        for name in ["Alice", "Bob"] {
            run(
                &mut store,
                "MERGE (n:Person {name: $id}) RETURN n.name AS name",
                &params(&[("id", Value::from(name))]),
            )
            .unwrap();
        }
        run(
            &mut store,
            "MATCH (s:Person {name: $source_id}), (t:Person {name: $target_id}) \
             MERGE (s)-[r:FOLLOWS]->(t) RETURN s.name AS from, t.name AS to",
            &params(&[
                ("source_id", Value::from("Alice")),
                ("target_id", Value::from("Bob")),
            ]),
        )
        .unwrap();
        assert_eq!(store.relationships.len(), 1);

        run(
            &mut store,
            "MATCH (n:Person {name: $id}) DETACH DELETE n",
            &params(&[("id", Value::from("Alice"))]),
        )
        .unwrap();
        assert!(store.relationships.is_empty());
        assert_eq!(store.nodes["Person"].len(), 1);
    }

    #[test]
    fn merge_rel_against_missing_endpoint_matches_nothing() {
        let mut store = GraphStore::default();
        let result = run(
            &mut store,
            "MATCH (s:Person {name: $source_id}), (t:Person {name: $target_id}) \
             MERGE (s)-[r:FOLLOWS]->(t) RETURN s.name AS from, t.name AS to",
            &params(&[
                ("source_id", Value::from("Ghost")),
                ("target_id", Value::from("Nobody")),
            ]),
        )
        .unwrap();
        assert!(result.rows.is_empty());
        assert!(store.relationships.is_empty());
    }

    #[test]
    fn unknown_statements_are_rejected() {
        let mut store = GraphStore::default();
        assert!(run(&mut store, "CREATE (n:Person)", &PropertyMap::new()).is_err());
    }
}
