//! Entity descriptors and the type registry.
//!
//! A descriptor is the statically-checked replacement for runtime type
//! inspection: the reader, writer, and identity accessors are supplied once
//! per domain type, paired with the derived metadata, and cached for the
//! life of the process.

use std::any::{Any, TypeId};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::BoxError;
use crate::metadata::{NodeMetadata, RelationshipMetadata};
use crate::row::Row;
use crate::value::{PropertyMap, Value};

/// Converts a result row into a domain object.
pub type Reader<T> = Arc<dyn Fn(&Row) -> Result<T, BoxError> + Send + Sync>;

/// Decomposes a domain object into its property map.
pub type Writer<T> = Arc<dyn Fn(&T) -> PropertyMap + Send + Sync>;

/// Extracts an identity (or endpoint identity) value from a domain object.
pub type Accessor<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;

/// Descriptor for a node entity type: metadata plus the reader/writer/
/// identity triple.
pub struct EntityDescriptor<T> {
    metadata: NodeMetadata,
    reader: Reader<T>,
    writer: Writer<T>,
    id: Accessor<T>,
}

impl<T> EntityDescriptor<T> {
    /// Builds a descriptor.
    pub fn new(
        metadata: NodeMetadata,
        reader: impl Fn(&Row) -> Result<T, BoxError> + Send + Sync + 'static,
        writer: impl Fn(&T) -> PropertyMap + Send + Sync + 'static,
        id: impl Fn(&T) -> Value + Send + Sync + 'static,
    ) -> Self {
        Self {
            metadata,
            reader: Arc::new(reader),
            writer: Arc::new(writer),
            id: Arc::new(id),
        }
    }

    /// The derived metadata.
    pub fn metadata(&self) -> &NodeMetadata {
        &self.metadata
    }

    /// The row reader.
    pub fn reader(&self) -> Reader<T> {
        Arc::clone(&self.reader)
    }

    /// Decomposes an entity into its writer-declared properties.
    pub fn write(&self, entity: &T) -> PropertyMap {
        (self.writer)(entity)
    }

    /// The entity's identity value.
    pub fn id_of(&self, entity: &T) -> Value {
        (self.id)(entity)
    }
}

impl<T> Clone for EntityDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            metadata: self.metadata.clone(),
            reader: Arc::clone(&self.reader),
            writer: Arc::clone(&self.writer),
            id: Arc::clone(&self.id),
        }
    }
}

/// Descriptor for a relationship entity type.
///
/// Endpoint accessors return the identity of the source/target node held by
/// the relationship entity; they are only invoked after the corresponding
/// endpoint field resolved, so an unresolved endpoint fails fast in metadata
/// before any accessor runs.
pub struct RelationshipDescriptor<R> {
    metadata: RelationshipMetadata,
    reader: Reader<R>,
    writer: Writer<R>,
    id: Option<Accessor<R>>,
    source_id: Accessor<R>,
    target_id: Accessor<R>,
}

impl<R> RelationshipDescriptor<R> {
    /// Builds a descriptor without a relationship identity accessor.
    pub fn new(
        metadata: RelationshipMetadata,
        reader: impl Fn(&Row) -> Result<R, BoxError> + Send + Sync + 'static,
        writer: impl Fn(&R) -> PropertyMap + Send + Sync + 'static,
        source_id: impl Fn(&R) -> Value + Send + Sync + 'static,
        target_id: impl Fn(&R) -> Value + Send + Sync + 'static,
    ) -> Self {
        Self {
            metadata,
            reader: Arc::new(reader),
            writer: Arc::new(writer),
            id: None,
            source_id: Arc::new(source_id),
            target_id: Arc::new(target_id),
        }
    }

    /// Adds the relationship identity accessor; required for merge-by-
    /// identity updates and id-addressed relationship operations.
    pub fn with_identity(mut self, id: impl Fn(&R) -> Value + Send + Sync + 'static) -> Self {
        self.id = Some(Arc::new(id));
        self
    }

    /// The derived metadata.
    pub fn metadata(&self) -> &RelationshipMetadata {
        &self.metadata
    }

    /// The row reader.
    pub fn reader(&self) -> Reader<R> {
        Arc::clone(&self.reader)
    }

    /// Decomposes a relationship into its writer-declared properties.
    pub fn write(&self, relationship: &R) -> PropertyMap {
        (self.writer)(relationship)
    }

    /// The relationship's own identity value, when the type resolves an
    /// identity property and an accessor was supplied.
    pub fn identity_of(&self, relationship: &R) -> Option<Value> {
        match (&self.id, self.metadata.id_property()) {
            (Some(accessor), Some(_)) => Some(accessor(relationship)),
            _ => None,
        }
    }

    /// Identity of the source node held by the relationship.
    pub fn source_id_of(&self, relationship: &R) -> Value {
        (self.source_id)(relationship)
    }

    /// Identity of the target node held by the relationship.
    pub fn target_id_of(&self, relationship: &R) -> Value {
        (self.target_id)(relationship)
    }
}

impl<R> Clone for RelationshipDescriptor<R> {
    fn clone(&self) -> Self {
        Self {
            metadata: self.metadata.clone(),
            reader: Arc::clone(&self.reader),
            writer: Arc::clone(&self.writer),
            id: self.id.clone(),
            source_id: Arc::clone(&self.source_id),
            target_id: Arc::clone(&self.target_id),
        }
    }
}

/// Registry of descriptors, one per domain type.
///
/// Registrations normally happen at startup; lookups are concurrent and
/// lock-light. Registering the same type again replaces the previous
/// descriptor (last registration wins, no merge).
#[derive(Default)]
pub struct EntityRegistry {
    nodes: RwLock<FxHashMap<TypeId, Box<dyn Any + Send + Sync>>>,
    relationships: RwLock<FxHashMap<TypeId, Box<dyn Any + Send + Sync>>>,
}

impl EntityRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a node descriptor for `T`.
    pub fn register_node<T: 'static>(&self, descriptor: EntityDescriptor<T>) {
        self.nodes
            .write()
            .insert(TypeId::of::<T>(), Box::new(descriptor));
    }

    /// Looks up the node descriptor registered for `T`.
    pub fn node_descriptor<T: 'static>(&self) -> Option<EntityDescriptor<T>> {
        self.nodes
            .read()
            .get(&TypeId::of::<T>())
            .and_then(|d| d.downcast_ref::<EntityDescriptor<T>>())
            .cloned()
    }

    /// Registers a relationship descriptor for `R`.
    pub fn register_relationship<R: 'static>(&self, descriptor: RelationshipDescriptor<R>) {
        self.relationships
            .write()
            .insert(TypeId::of::<R>(), Box::new(descriptor));
    }

    /// Looks up the relationship descriptor registered for `R`.
    pub fn relationship_descriptor<R: 'static>(&self) -> Option<RelationshipDescriptor<R>> {
        self.relationships
            .read()
            .get(&TypeId::of::<R>())
            .and_then(|d| d.downcast_ref::<RelationshipDescriptor<R>>())
            .cloned()
    }
}
