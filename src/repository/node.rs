//! CRUD repository for node entities, with same-label relationship support.

use std::sync::Arc;

use tracing::debug;

use crate::context::WorkContext;
use crate::descriptor::{EntityDescriptor, EntityRegistry, RelationshipDescriptor};
use crate::error::{AccessError, BoxError, Result};
use crate::row::Row;
use crate::statement;
use crate::template::GraphTemplate;
use crate::value::Value;

/// Repository over a node entity type `T` and a relationship type `R`
/// connecting `T` nodes to `T` nodes.
///
/// `save` is a conditional upsert: merge on the identity property, set all
/// writer-declared properties, and read the node back through the reader.
/// Deletes detach incident relationships first, since the property graph
/// forbids deleting a node with live relationships.
pub struct NodeRepository<T, R> {
    template: Arc<GraphTemplate>,
    descriptor: EntityDescriptor<T>,
    relationship: RelationshipDescriptor<R>,
    context: WorkContext,
}

impl<T: 'static, R: 'static> NodeRepository<T, R> {
    /// Creates a repository from explicit descriptors.
    ///
    /// Calls run in auto-commit mode; use
    /// [`NodeRepository::with_context`] to participate in a transaction.
    pub fn new(
        template: Arc<GraphTemplate>,
        descriptor: EntityDescriptor<T>,
        relationship: RelationshipDescriptor<R>,
    ) -> Self {
        debug!(
            entity_type = descriptor.metadata().entity_type_name(),
            label = descriptor.metadata().label(),
            "created node repository"
        );
        Self {
            template,
            descriptor,
            relationship,
            context: WorkContext::new(),
        }
    }

    /// Creates a repository from descriptors registered in the registry.
    pub fn from_registry(template: Arc<GraphTemplate>, registry: &EntityRegistry) -> Result<Self> {
        let descriptor = registry.node_descriptor::<T>().ok_or_else(|| {
            AccessError::InvalidArgument("no node descriptor registered for entity type".into())
        })?;
        let relationship = registry.relationship_descriptor::<R>().ok_or_else(|| {
            AccessError::InvalidArgument(
                "no relationship descriptor registered for relationship type".into(),
            )
        })?;
        Ok(Self::new(template, descriptor, relationship))
    }

    /// Returns a repository running every call on the given unit-of-work
    /// context, so calls made inside a transaction reuse its connection.
    pub fn with_context(&self, context: &WorkContext) -> Self {
        Self {
            template: Arc::clone(&self.template),
            descriptor: self.descriptor.clone(),
            relationship: self.relationship.clone(),
            context: context.clone(),
        }
    }

    /// Upserts an entity and returns the stored state read back from the
    /// engine.
    pub fn save(&self, entity: &T) -> Result<T> {
        debug!(
            label = self.descriptor.metadata().label(),
            "saving node entity"
        );
        let id = self.descriptor.id_of(entity);
        let properties = self.descriptor.write(entity);
        let stmt = statement::merge_node(self.descriptor.metadata(), id, &properties)?;
        self.template
            .query_one_in(&self.context, &stmt, self.node_reader())?
            .ok_or_else(|| {
                AccessError::EmptyWriteResult(format!(
                    "failed to save node entity of type {}",
                    self.descriptor.metadata().entity_type_name()
                ))
            })
    }

    /// Saves every entity, returning the stored states in order.
    pub fn save_all<'a>(&self, entities: impl IntoIterator<Item = &'a T>) -> Result<Vec<T>>
    where
        T: 'a,
    {
        entities.into_iter().map(|e| self.save(e)).collect()
    }

    /// Finds an entity by identity.
    pub fn find_by_id(&self, id: impl Into<Value>) -> Result<Option<T>> {
        let stmt = statement::match_node_by_id(self.descriptor.metadata(), id.into())?;
        self.template
            .query_one_in(&self.context, &stmt, self.node_reader())
    }

    /// Whether an entity with the given identity exists.
    pub fn exists_by_id(&self, id: impl Into<Value>) -> Result<bool> {
        Ok(self.find_by_id(id)?.is_some())
    }

    /// Returns all entities carrying this type's label.
    pub fn find_all(&self) -> Result<Vec<T>> {
        debug!(
            label = self.descriptor.metadata().label(),
            "finding all nodes"
        );
        let stmt = statement::match_all_nodes(self.descriptor.metadata());
        self.template
            .query_in(&self.context, &stmt, self.node_reader())
    }

    /// Finds the entities matching the given identities; missing identities
    /// are skipped.
    pub fn find_all_by_id(
        &self,
        ids: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Result<Vec<T>> {
        let mut found = Vec::new();
        for id in ids {
            if let Some(entity) = self.find_by_id(id)? {
                found.push(entity);
            }
        }
        Ok(found)
    }

    /// Counts the entities carrying this type's label.
    pub fn count(&self) -> Result<u64> {
        let stmt = statement::count_nodes(self.descriptor.metadata());
        let count = self
            .template
            .query_one_in(&self.context, &stmt, |row: &Row| {
                Ok::<_, BoxError>(row.int("count")?)
            })?
            .ok_or_else(|| {
                AccessError::Engine(format!(
                    "count returned no rows for label {}",
                    self.descriptor.metadata().label()
                ))
            })?;
        Ok(count.max(0) as u64)
    }

    /// Detaches and deletes the entity with the given identity.
    pub fn delete_by_id(&self, id: impl Into<Value>) -> Result<()> {
        let stmt = statement::delete_node_by_id(self.descriptor.metadata(), id.into())?;
        self.template.execute_in(&self.context, &stmt)
    }

    /// Detaches and deletes the given entity, addressed by identity.
    pub fn delete(&self, entity: &T) -> Result<()> {
        self.descriptor.metadata().require_id_property()?;
        self.delete_by_id(self.descriptor.id_of(entity))
    }

    /// Deletes every entity matching the given identities.
    pub fn delete_all_by_id(&self, ids: impl IntoIterator<Item = impl Into<Value>>) -> Result<()> {
        for id in ids {
            self.delete_by_id(id)?;
        }
        Ok(())
    }

    /// Detaches and deletes every entity carrying this type's label.
    pub fn delete_all(&self) -> Result<()> {
        debug!(
            label = self.descriptor.metadata().label(),
            "deleting all nodes"
        );
        let stmt = statement::delete_all_nodes(self.descriptor.metadata());
        self.template.execute_in(&self.context, &stmt)
    }

    /// Merges a typed relationship between two saved entities.
    ///
    /// Both endpoints are matched by identity. Writer-declared properties
    /// are set on the relationship, except the endpoint fields themselves,
    /// which are structural. When the relationship type has an identity
    /// property, the merge keys on it, so re-invoking with the same identity
    /// updates the existing relationship instead of duplicating it.
    pub fn create_relation(&self, source: &T, target: &T, relationship: &R) -> Result<R> {
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
            self.descriptor.metadata(),
            self.descriptor.metadata(),
            self.descriptor.id_of(source),
            self.descriptor.id_of(target),
            self.relationship.identity_of(relationship),
            &properties,
        )?;
        self.template
            .query_one_in(&self.context, &stmt, self.relationship_reader())?
            .ok_or_else(|| {
                AccessError::EmptyWriteResult(format!(
                    "failed to create relationship {}; are both endpoints saved?",
                    rel_meta.type_name()
                ))
            })
    }

    /// Finds all relationships originating from the given source entity.
    pub fn find_relations_by_source(&self, source: &T) -> Result<Vec<R>> {
        let stmt = statement::relations_by_source(
            self.relationship.metadata(),
            self.descriptor.metadata(),
            self.descriptor.metadata(),
            self.descriptor.id_of(source),
        )?;
        self.template
            .query_in(&self.context, &stmt, self.relationship_reader())
    }

    /// Finds all relationships of this type.
    pub fn find_all_relations(&self) -> Result<Vec<R>> {
        let stmt = statement::all_relations(
            self.relationship.metadata(),
            self.descriptor.metadata(),
            self.descriptor.metadata(),
        )?;
        self.template
            .query_in(&self.context, &stmt, self.relationship_reader())
    }

    /// Finds a relationship by its identity property.
    pub fn find_relation_by_id(&self, id: impl Into<Value>) -> Result<Option<R>> {
        let stmt = statement::relation_by_id(
            self.relationship.metadata(),
            self.descriptor.metadata(),
            self.descriptor.metadata(),
            id.into(),
        )?;
        self.template
            .query_one_in(&self.context, &stmt, self.relationship_reader())
    }

    /// Deletes the given relationship.
    ///
    /// Addressed by the relationship identity when one resolved, otherwise
    /// by the endpoint pair.
    pub fn delete_relation(&self, relationship: &R) -> Result<()> {
        let rel_meta = self.relationship.metadata();
        let node_meta = self.descriptor.metadata();
        let stmt = match self.relationship.identity_of(relationship) {
            Some(id) => statement::delete_relation_by_id(rel_meta, node_meta, node_meta, id)?,
            None => {
                rel_meta.require_source_field()?;
                rel_meta.require_target_field()?;
                statement::delete_relations_between(
                    rel_meta,
                    node_meta,
                    node_meta,
                    self.relationship.source_id_of(relationship),
                    self.relationship.target_id_of(relationship),
                )?
            }
        };
        self.template.execute_in(&self.context, &stmt)
    }

    /// Deletes all relationships originating from the given source entity.
    pub fn delete_relation_by_source(&self, source: &T) -> Result<()> {
        let stmt = statement::delete_relations_by_source(
            self.relationship.metadata(),
            self.descriptor.metadata(),
            self.descriptor.metadata(),
            self.descriptor.id_of(source),
        )?;
        self.template.execute_in(&self.context, &stmt)
    }

    fn node_reader(&self) -> impl FnMut(&Row) -> std::result::Result<T, BoxError> + Send + 'static {
        let reader = self.descriptor.reader();
        move |row: &Row| reader(row)
    }

    fn relationship_reader(
        &self,
    ) -> impl FnMut(&Row) -> std::result::Result<R, BoxError> + Send + 'static {
        let reader = self.relationship.reader();
        move |row: &Row| reader(row)
    }
}
