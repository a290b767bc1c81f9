//! Generated repositories.
//!
//! Repositories compose the template, metadata, and descriptors into the
//! standard save/find/relate/delete operations. Statements are generated
//! from metadata, never hand-written per entity type. Engine failures always
//! propagate; no repository method swallows them.

mod node;
mod relationship;

pub use node::NodeRepository;
pub use relationship::RelationshipRepository;
