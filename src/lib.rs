//! # umbra
//!
//! Typed entity mapping and connection management for embedded graph
//! databases. Application code declares repository operations (save, find,
//! relate, delete) against strongly-typed node and relationship entities;
//! umbra generates the pattern-matching statements, binds parameters
//! out-of-band, manages pooled connections, and maps result rows back into
//! domain objects.
//!
//! ## Architecture
//!
//! - **Engine boundary** ([`engine`]): object-safe traits the embedded
//!   engine is consumed through; all handles release on drop
//! - **Connections** ([`connection`]): simple and pooled factories; the pool
//!   bounds live connections and is the write-concurrency control point
//! - **Execution** ([`template`]): transaction-aware statement execution
//!   with lazy, resource-safe row streaming
//! - **Mapping** ([`metadata`], [`descriptor`]): structure derived once per
//!   entity type from explicit field declarations, cached in descriptors
//! - **Repositories** ([`repository`]): metadata-generated CRUD and
//!   relationship operations
//! - **Transactions** ([`transaction`]): connection scoping over an
//!   auto-committing engine; see the module docs for the consistency gap
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use umbra::testkit::MemoryEngine;
//! use umbra::{
//!     EntityDescriptor, FieldDef, GraphTemplate, NodeMetadata, NodeRepository, PropertyMap,
//!     RelationshipDescriptor, RelationshipMetadata, SimpleConnectionFactory, Value,
//! };
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Person {
//!     name: String,
//!     age: i64,
//! }
//!
//! #[derive(Debug, Clone)]
//! struct Follows {
//!     name: String,
//!     from: Person,
//!     to: Person,
//!     since: i64,
//! }
//!
//! # fn main() -> umbra::Result<()> {
//! let factory = Arc::new(SimpleConnectionFactory::new(Arc::new(MemoryEngine::new())));
//! let template = Arc::new(GraphTemplate::new(factory));
//!
//! let person = EntityDescriptor::new(
//!     NodeMetadata::derive::<Person>(&[FieldDef::id("name"), FieldDef::new("age")]),
//!     |row| {
//!         Ok(Person {
//!             name: row.string("name")?,
//!             age: row.int("age")?,
//!         })
//!     },
//!     |p| PropertyMap::from([("age".to_string(), Value::from(p.age))]),
//!     |p| Value::from(p.name.clone()),
//! );
//! let follows = RelationshipDescriptor::new(
//!     RelationshipMetadata::derive::<Follows>(&[
//!         FieldDef::id("name"),
//!         FieldDef::source("from"),
//!         FieldDef::target("to"),
//!         FieldDef::new("since"),
//!     ]),
//!     |row| {
//!         Ok(Follows {
//!             name: row.string("name")?,
//!             from: Person { name: row.string("from")?, age: 0 },
//!             to: Person { name: row.string("to")?, age: 0 },
//!             since: row.int("since")?,
//!         })
//!     },
//!     |f| PropertyMap::from([("since".to_string(), Value::from(f.since))]),
//!     |f| Value::from(f.from.name.clone()),
//!     |f| Value::from(f.to.name.clone()),
//! )
//! .with_identity(|f| Value::from(f.name.clone()));
//!
//! let repository = NodeRepository::new(template, person, follows);
//! let alice = repository.save(&Person { name: "Alice".into(), age: 30 })?;
//! assert_eq!(repository.find_by_id("Alice")?, Some(alice));
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod context;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod repository;
pub mod row;
pub mod statement;
pub mod stream;
pub mod template;
pub mod testkit;
pub mod transaction;
pub mod value;

pub use connection::{
    ConnectionFactory, FactoryKey, ManagedConnection, PoolConfig, PooledConnectionFactory,
    SimpleConnectionFactory,
};
pub use context::{ConnectionHolder, WorkContext};
pub use descriptor::{EntityDescriptor, EntityRegistry, RelationshipDescriptor};
pub use error::{AccessError, BoxError, Result};
pub use metadata::{FieldDef, FieldMarker, NodeMetadata, RelationshipMetadata};
pub use repository::{NodeRepository, RelationshipRepository};
pub use row::{Row, RowError};
pub use statement::Statement;
pub use stream::RowIter;
pub use template::GraphTemplate;
pub use transaction::{Transaction, TransactionManager, TxState};
pub use value::{PropertyMap, Value};
