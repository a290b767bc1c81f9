//! Repository for relationship entities with heterogeneous endpoints.

use std::sync::Arc;

use tracing::debug;

use crate::context::WorkContext;
use crate::descriptor::{EntityDescriptor, RelationshipDescriptor};
use crate::error::{AccessError, BoxError, Result};
use crate::row::Row;
use crate::statement;
use crate::template::GraphTemplate;
use crate::value::Value;

/// Repository over a relationship type `R` connecting source nodes `S` to
/// target nodes `T`.
pub struct RelationshipRepository<R, S, T> {
    template: Arc<GraphTemplate>,
    relationship: RelationshipDescriptor<R>,
    source: EntityDescriptor<S>,
    target: EntityDescriptor<T>,
    context: WorkContext,
}

impl<R: 'static, S: 'static, T: 'static> RelationshipRepository<R, S, T> {
    /// Creates a repository from explicit descriptors.
    pub fn new(
        template: Arc<GraphTemplate>,
        relationship: RelationshipDescriptor<R>,
        source: EntityDescriptor<S>,
        target: EntityDescriptor<T>,
    ) -> Self {
        debug!(
            rel_type = relationship.metadata().type_name(),
            source_label = source.metadata().label(),
            target_label = target.metadata().label(),
            "created relationship repository"
        );
        Self {
            template,
            relationship,
            source,
            target,
            context: WorkContext::new(),
        }
    }

    /// Returns a repository running every call on the given unit-of-work
    /// context.
    pub fn with_context(&self, context: &WorkContext) -> Self {
        Self {
            template: Arc::clone(&self.template),
            relationship: self.relationship.clone(),
            source: self.source.clone(),
            target: self.target.clone(),
            context: context.clone(),
        }
    }

    /// Merges a relationship between the given endpoints, keyed by the
    /// relationship identity when one resolved.
    pub fn create(&self, source: &S, target: &T, relationship: &R) -> Result<R> {
        let rel_meta = self.relationship.metadata();
        rel_meta.require_source_field()?;
        rel_meta.require_target_field()?;
        debug!(rel_type = rel_meta.type_name(), "creating relationship");

        let mut properties = self.relationship.write(relationship);
        if let Some(field) = rel_meta.source_field() {
            properties.remove(field);
        }
        if let Some(field) = rel_meta.target_field() {
            properties.remove(field);
        }

        let stmt = statement::merge_relationship(
            rel_meta,
            self.source.metadata(),
            self.target.metadata(),
            self.source.id_of(source),
            self.target.id_of(target),
            self.relationship.identity_of(relationship),
            &properties,
        )?;
        self.template
            .query_one_in(&self.context, &stmt, self.reader())?
            .ok_or_else(|| {
                AccessError::EmptyWriteResult(format!(
                    "failed to create relationship {}; are both endpoints saved?",
                    rel_meta.type_name()
                ))
            })
    }

    /// Finds a relationship by its identity property.
    pub fn find_by_id(&self, id: impl Into<Value>) -> Result<Option<R>> {
        let stmt = statement::relation_by_id(
            self.relationship.metadata(),
            self.source.metadata(),
            self.target.metadata(),
            id.into(),
        )?;
        self.template
            .query_one_in(&self.context, &stmt, self.reader())
    }

    /// Finds all relationships originating from the given source node.
    pub fn find_by_source(&self, source: &S) -> Result<Vec<R>> {
        let stmt = statement::relations_by_source(
            self.relationship.metadata(),
            self.source.metadata(),
            self.target.metadata(),
            self.source.id_of(source),
        )?;
        self.template.query_in(&self.context, &stmt, self.reader())
    }

    /// Finds all relationships pointing to the given target node.
    pub fn find_by_target(&self, target: &T) -> Result<Vec<R>> {
        let stmt = statement::relations_by_target(
            self.relationship.metadata(),
            self.source.metadata(),
            self.target.metadata(),
            self.target.id_of(target),
        )?;
        self.template.query_in(&self.context, &stmt, self.reader())
    }

    /// Finds all relationships between the given endpoints.
    pub fn find_between(&self, source: &S, target: &T) -> Result<Vec<R>> {
        let stmt = statement::relations_between(
            self.relationship.metadata(),
            self.source.metadata(),
            self.target.metadata(),
            self.source.id_of(source),
            self.target.id_of(target),
        )?;
        self.template.query_in(&self.context, &stmt, self.reader())
    }

    /// Finds all relationships of this type.
    pub fn find_all(&self) -> Result<Vec<R>> {
        let stmt = statement::all_relations(
            self.relationship.metadata(),
            self.source.metadata(),
            self.target.metadata(),
        )?;
        self.template.query_in(&self.context, &stmt, self.reader())
    }

    /// Deletes the given relationship, addressed by identity when one
    /// resolved, otherwise by the endpoint pair.
    pub fn delete(&self, relationship: &R) -> Result<()> {
        let rel_meta = self.relationship.metadata();
        let stmt = match self.relationship.identity_of(relationship) {
            Some(id) => statement::delete_relation_by_id(
                rel_meta,
                self.source.metadata(),
                self.target.metadata(),
                id,
            )?,
            None => {
                rel_meta.require_source_field()?;
                rel_meta.require_target_field()?;
                statement::delete_relations_between(
                    rel_meta,
                    self.source.metadata(),
                    self.target.metadata(),
                    self.relationship.source_id_of(relationship),
                    self.relationship.target_id_of(relationship),
                )?
            }
        };
        self.template.execute_in(&self.context, &stmt)
    }

    /// Deletes a relationship by its identity property.
    pub fn delete_by_id(&self, id: impl Into<Value>) -> Result<()> {
        let stmt = statement::delete_relation_by_id(
            self.relationship.metadata(),
            self.source.metadata(),
            self.target.metadata(),
            id.into(),
        )?;
        self.template.execute_in(&self.context, &stmt)
    }

    /// Deletes all relationships between the given endpoints.
    pub fn delete_between(&self, source: &S, target: &T) -> Result<()> {
        let stmt = statement::delete_relations_between(
            self.relationship.metadata(),
            self.source.metadata(),
            self.target.metadata(),
            self.source.id_of(source),
            self.target.id_of(target),
        )?;
        self.template.execute_in(&self.context, &stmt)
    }

    fn reader(&self) -> impl FnMut(&Row) -> std::result::Result<R, BoxError> + Send + 'static {
        let reader = self.relationship.reader();
        move |row: &Row| reader(row)
    }
}
