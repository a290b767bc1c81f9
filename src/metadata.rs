//! Structural metadata for entity types.
//!
//! Metadata is derived once when a descriptor is built and cached for the
//! life of the process. Field declarations are explicit [`FieldDef`] lists;
//! the derivation rules (identity fallback to a field named `id`, endpoint
//! fallbacks to `source`/`from` and `target`/`to`, label and type-name
//! conventions) resolve them into the shape statements are generated from.
//!
//! A node type may be registered without a resolvable identity, but every
//! identity-addressed operation against it fails fast with
//! [`AccessError::UnresolvedMetadata`]. The same applies to relationship
//! endpoints: type-name derivation still works, data operations do not.

use crate::error::{AccessError, Result};

/// Marker attached to a declared entity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMarker {
    /// Plain property field.
    None,
    /// Identity (primary key) field.
    Id,
    /// Relationship source endpoint.
    Source,
    /// Relationship target endpoint.
    Target,
}

/// A declared entity field.
#[derive(Debug, Clone)]
pub struct FieldDef {
    name: &'static str,
    marker: FieldMarker,
}

impl FieldDef {
    /// Declares a plain property field.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            marker: FieldMarker::None,
        }
    }

    /// Declares the identity field.
    pub fn id(name: &'static str) -> Self {
        Self {
            name,
            marker: FieldMarker::Id,
        }
    }

    /// Declares the source endpoint field of a relationship type.
    pub fn source(name: &'static str) -> Self {
        Self {
            name,
            marker: FieldMarker::Source,
        }
    }

    /// Declares the target endpoint field of a relationship type.
    pub fn target(name: &'static str) -> Self {
        Self {
            name,
            marker: FieldMarker::Target,
        }
    }

    /// Field name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Field marker.
    pub fn marker(&self) -> FieldMarker {
        self.marker
    }
}

/// The simple name of a type: the last path segment, generics stripped.
fn simple_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

fn resolve_id(fields: &[FieldDef]) -> Option<String> {
    fields
        .iter()
        .find(|f| f.marker == FieldMarker::Id)
        .or_else(|| fields.iter().find(|f| f.name == "id"))
        .map(|f| f.name.to_string())
}

/// Metadata for a node entity type.
#[derive(Debug, Clone)]
pub struct NodeMetadata {
    type_name: String,
    label: String,
    id_property: Option<String>,
    property_names: Vec<String>,
}

impl NodeMetadata {
    /// Derives metadata for `T`, deriving the label from the type name.
    ///
    /// A trailing `Entity` suffix is stripped: `UserEntity` maps to the
    /// label `User`.
    pub fn derive<T>(fields: &[FieldDef]) -> Self {
        let type_name = simple_type_name::<T>().to_string();
        let label = Self::derive_label(&type_name);
        Self::build(type_name, label, fields)
    }

    /// Derives metadata for `T` with an explicit label.
    pub fn with_label<T>(label: impl Into<String>, fields: &[FieldDef]) -> Self {
        let type_name = simple_type_name::<T>().to_string();
        Self::build(type_name, label.into(), fields)
    }

    fn build(type_name: String, label: String, fields: &[FieldDef]) -> Self {
        Self {
            type_name,
            label,
            id_property: resolve_id(fields),
            property_names: fields.iter().map(|f| f.name.to_string()).collect(),
        }
    }

    fn derive_label(type_name: &str) -> String {
        match type_name.strip_suffix("Entity") {
            Some(base) if !base.is_empty() => base.to_string(),
            _ => type_name.to_string(),
        }
    }

    /// The simple name of the mapped type.
    pub fn entity_type_name(&self) -> &str {
        &self.type_name
    }

    /// The node label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The identity property name, if one resolved.
    pub fn id_property(&self) -> Option<&str> {
        self.id_property.as_deref()
    }

    /// The identity property name, or [`AccessError::UnresolvedMetadata`].
    pub fn require_id_property(&self) -> Result<&str> {
        self.id_property().ok_or_else(|| {
            AccessError::UnresolvedMetadata(format!(
                "no identity field resolved for node type {}",
                self.type_name
            ))
        })
    }

    /// All declared property names, in declaration order.
    pub fn property_names(&self) -> &[String] {
        &self.property_names
    }
}

/// Metadata for a relationship entity type.
#[derive(Debug, Clone)]
pub struct RelationshipMetadata {
    entity_type_name: String,
    type_name: String,
    id_property: Option<String>,
    source_field: Option<String>,
    target_field: Option<String>,
    property_names: Vec<String>,
}

impl RelationshipMetadata {
    /// Derives metadata for `R`, deriving the relationship type name from the
    /// type name.
    ///
    /// `Relationship` and `Rel` suffixes are stripped, then mixed case is
    /// converted to upper snake case: `FollowedBy` maps to `FOLLOWED_BY`,
    /// `LikesRelationship` to `LIKES`.
    pub fn derive<R>(fields: &[FieldDef]) -> Self {
        let entity_type_name = simple_type_name::<R>().to_string();
        let type_name = Self::derive_type_name(&entity_type_name);
        Self::build(entity_type_name, type_name, fields)
    }

    /// Derives metadata for `R` with an explicit relationship type name.
    pub fn with_type<R>(type_name: impl Into<String>, fields: &[FieldDef]) -> Self {
        let entity_type_name = simple_type_name::<R>().to_string();
        Self::build(entity_type_name, type_name.into(), fields)
    }

    fn build(entity_type_name: String, type_name: String, fields: &[FieldDef]) -> Self {
        Self {
            entity_type_name,
            type_name,
            id_property: resolve_id(fields),
            source_field: Self::resolve_endpoint(fields, FieldMarker::Source, &["source", "from"]),
            target_field: Self::resolve_endpoint(fields, FieldMarker::Target, &["target", "to"]),
            property_names: fields.iter().map(|f| f.name.to_string()).collect(),
        }
    }

    fn resolve_endpoint(
        fields: &[FieldDef],
        marker: FieldMarker,
        fallbacks: &[&str],
    ) -> Option<String> {
        if let Some(field) = fields.iter().find(|f| f.marker == marker) {
            return Some(field.name.to_string());
        }
        for fallback in fallbacks {
            if let Some(field) = fields.iter().find(|f| f.name == *fallback) {
                return Some(field.name.to_string());
            }
        }
        None
    }

    fn derive_type_name(entity_type_name: &str) -> String {
        let base = entity_type_name
            .strip_suffix("Relationship")
            .or_else(|| entity_type_name.strip_suffix("Rel"))
            .filter(|b| !b.is_empty())
            .unwrap_or(entity_type_name);

        let mut out = String::with_capacity(base.len() + 4);
        let mut prev_lower = false;
        for ch in base.chars() {
            if ch.is_uppercase() && prev_lower {
                out.push('_');
            }
            prev_lower = ch.is_lowercase();
            out.extend(ch.to_uppercase());
        }
        out
    }

    /// The simple name of the mapped type.
    pub fn entity_type_name(&self) -> &str {
        &self.entity_type_name
    }

    /// The relationship type name used in patterns.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The identity property name, if one resolved.
    pub fn id_property(&self) -> Option<&str> {
        self.id_property.as_deref()
    }

    /// The identity property name, or [`AccessError::UnresolvedMetadata`].
    pub fn require_id_property(&self) -> Result<&str> {
        self.id_property().ok_or_else(|| {
            AccessError::UnresolvedMetadata(format!(
                "no identity field resolved for relationship type {}",
                self.entity_type_name
            ))
        })
    }

    /// The source endpoint field name, if one resolved.
    pub fn source_field(&self) -> Option<&str> {
        self.source_field.as_deref()
    }

    /// The target endpoint field name, if one resolved.
    pub fn target_field(&self) -> Option<&str> {
        self.target_field.as_deref()
    }

    /// The source endpoint field, or [`AccessError::UnresolvedMetadata`].
    pub fn require_source_field(&self) -> Result<&str> {
        self.source_field().ok_or_else(|| {
            AccessError::UnresolvedMetadata(format!(
                "no source endpoint field resolved for relationship type {}",
                self.entity_type_name
            ))
        })
    }

    /// The target endpoint field, or [`AccessError::UnresolvedMetadata`].
    pub fn require_target_field(&self) -> Result<&str> {
        self.target_field().ok_or_else(|| {
            AccessError::UnresolvedMetadata(format!(
                "no target endpoint field resolved for relationship type {}",
                self.entity_type_name
            ))
        })
    }

    /// All declared property names, in declaration order.
    pub fn property_names(&self) -> &[String] {
        &self.property_names
    }

    /// Declared property names minus the endpoint fields.
    ///
    /// Endpoints are structural, not properties; they never appear in SET
    /// clauses or relationship projections.
    pub fn value_property_names(&self) -> Vec<&str> {
        self.property_names
            .iter()
            .map(String::as_str)
            .filter(|p| {
                Some(*p) != self.source_field.as_deref() && Some(*p) != self.target_field.as_deref()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Person;
    struct UserEntity;
    struct NoId;
    struct FollowedBy;
    struct LikesRelationship;

    #[test]
    fn label_is_simple_type_name() {
        let meta = NodeMetadata::derive::<Person>(&[FieldDef::id("name")]);
        assert_eq!(meta.label(), "Person");
    }

    #[test]
    fn label_strips_entity_suffix() {
        let meta = NodeMetadata::derive::<UserEntity>(&[FieldDef::id("id")]);
        assert_eq!(meta.label(), "User");
    }

    #[test]
    fn explicit_label_wins() {
        let meta = NodeMetadata::with_label::<Person>("CustomLabel", &[FieldDef::id("id")]);
        assert_eq!(meta.label(), "CustomLabel");
    }

    #[test]
    fn id_marker_resolves_first() {
        let meta = NodeMetadata::derive::<Person>(&[FieldDef::new("id"), FieldDef::id("name")]);
        assert_eq!(meta.id_property(), Some("name"));
    }

    #[test]
    fn id_falls_back_to_conventional_name() {
        let meta = NodeMetadata::derive::<Person>(&[FieldDef::new("id"), FieldDef::new("age")]);
        assert_eq!(meta.id_property(), Some("id"));
    }

    #[test]
    fn missing_id_is_allowed_but_required_ops_fail() {
        let meta = NodeMetadata::derive::<NoId>(&[FieldDef::new("name")]);
        assert_eq!(meta.id_property(), None);
        assert!(matches!(
            meta.require_id_property(),
            Err(AccessError::UnresolvedMetadata(_))
        ));
    }

    #[test]
    fn type_name_converts_camel_case() {
        let meta = RelationshipMetadata::derive::<FollowedBy>(&[]);
        assert_eq!(meta.type_name(), "FOLLOWED_BY");
    }

    #[test]
    fn type_name_strips_relationship_suffix() {
        let meta = RelationshipMetadata::derive::<LikesRelationship>(&[]);
        assert_eq!(meta.type_name(), "LIKES");
    }

    #[test]
    fn explicit_type_name_wins() {
        let meta = RelationshipMetadata::with_type::<FollowedBy>("CUSTOM_TYPE", &[]);
        assert_eq!(meta.type_name(), "CUSTOM_TYPE");
    }

    #[test]
    fn endpoint_markers_resolve() {
        let meta = RelationshipMetadata::derive::<FollowedBy>(&[
            FieldDef::source("from"),
            FieldDef::target("to"),
        ]);
        assert_eq!(meta.source_field(), Some("from"));
        assert_eq!(meta.target_field(), Some("to"));
    }

    #[test]
    fn endpoints_fall_back_to_conventional_names() {
        let meta = RelationshipMetadata::derive::<FollowedBy>(&[
            FieldDef::new("source"),
            FieldDef::new("target"),
        ]);
        assert_eq!(meta.source_field(), Some("source"));
        assert_eq!(meta.target_field(), Some("target"));

        let meta =
            RelationshipMetadata::derive::<FollowedBy>(&[FieldDef::new("from"), FieldDef::new("to")]);
        assert_eq!(meta.source_field(), Some("from"));
        assert_eq!(meta.target_field(), Some("to"));
    }

    #[test]
    fn unresolved_endpoints_fail_on_require() {
        let meta = RelationshipMetadata::derive::<FollowedBy>(&[FieldDef::new("weight")]);
        assert_eq!(meta.type_name(), "FOLLOWED_BY");
        assert!(meta.require_source_field().is_err());
        assert!(meta.require_target_field().is_err());
    }

    #[test]
    fn value_properties_exclude_endpoints() {
        let meta = RelationshipMetadata::derive::<FollowedBy>(&[
            FieldDef::id("name"),
            FieldDef::source("from"),
            FieldDef::target("to"),
            FieldDef::new("since"),
        ]);
        assert_eq!(meta.value_property_names(), vec!["name", "since"]);
    }
}
