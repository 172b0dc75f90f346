//! Immutable relation registry
//!
//! Built once from descriptors, then shared read-only. Default projections
//! are computed at build time so lookups never allocate.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use super::descriptor::{Cardinality, EntityDescriptor, RelationDescriptor};
use crate::config::{read_json, ConfigResult};
use crate::errors::{ShapeError, ShapeResult};
use crate::observability::{log_event, Event};
use crate::projection::{ProjectionSpec, SpecNode};

/// Registry file layout
#[derive(Debug, Deserialize)]
struct RegistryDocument {
    types: BTreeMap<String, EntityDescriptor>,
}

#[derive(Debug, Clone)]
struct RegisteredType {
    descriptor: EntityDescriptor,
    default_spec: ProjectionSpec,
}

/// Collects descriptors and validates them into a [`RelationRegistry`]
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    types: BTreeMap<String, EntityDescriptor>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type; names must be unique
    pub fn register(&mut self, descriptor: EntityDescriptor) -> ShapeResult<()> {
        if descriptor.name.is_empty() {
            return Err(ShapeError::invalid_document("entity type name is empty"));
        }
        if self.types.contains_key(&descriptor.name) {
            return Err(ShapeError::invalid_document(format!(
                "entity type '{}' registered twice",
                descriptor.name
            )));
        }
        self.types.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    /// Chaining form of [`register`](Self::register)
    pub fn with(mut self, descriptor: EntityDescriptor) -> ShapeResult<Self> {
        self.register(descriptor)?;
        Ok(self)
    }

    /// Validates every descriptor and freezes the registry
    pub fn build(self) -> ShapeResult<RelationRegistry> {
        let mut normalized = BTreeMap::new();
        for (name, mut descriptor) in self.types {
            if !descriptor.has_field(&descriptor.primary_key) {
                descriptor.fields.insert(0, descriptor.primary_key.clone());
            }
            if let Some(ref label) = descriptor.label_field {
                if !descriptor.has_field(label) {
                    return Err(ShapeError::unknown_field(&name, label).within("label"));
                }
            }
            for field in descriptor.relations.keys() {
                if descriptor.has_field(field) {
                    return Err(ShapeError::invalid_document(format!(
                        "'{}.{}' is declared both as a field and a relation",
                        name, field
                    )));
                }
                if field.starts_with('_') {
                    return Err(ShapeError::invalid_document(format!(
                        "relation '{}.{}' must not start with '_'",
                        name, field
                    )));
                }
            }
            normalized.insert(name, descriptor);
        }

        for (name, descriptor) in &normalized {
            for (field, relation) in &descriptor.relations {
                if !normalized.contains_key(&relation.target_type) {
                    return Err(ShapeError::invalid_document(format!(
                        "relation '{}.{}' targets unknown type '{}'",
                        name, field, relation.target_type
                    )));
                }
            }
        }

        let mut types = BTreeMap::new();
        for (name, descriptor) in &normalized {
            let default_spec = match descriptor.default_shape {
                Some(ref shape) => {
                    let spec = ProjectionSpec::parse(shape).map_err(|e| e.within(name))?;
                    check_default_shape(&normalized, name, &spec).map_err(|e| e.within(name))?;
                    spec
                }
                None => generated_default(descriptor),
            };
            types.insert(
                name.clone(),
                RegisteredType {
                    descriptor: descriptor.clone(),
                    default_spec,
                },
            );
        }

        Ok(RelationRegistry { types })
    }
}

/// Every scalar field, plus every to-one relation as its primary key
fn generated_default(descriptor: &EntityDescriptor) -> ProjectionSpec {
    let spec = descriptor
        .fields
        .iter()
        .fold(ProjectionSpec::new(), |spec, field| spec.include(field.as_str()));
    descriptor
        .relations
        .iter()
        .filter(|(_, r)| r.cardinality == Cardinality::One)
        .fold(spec, |spec, (field, _)| spec.with(field.as_str(), SpecNode::AsId))
}

/// Declared default shapes must name relations explicitly.
///
/// A relation left as `true` would expand into its target's default shape,
/// which could lead back here.
fn check_default_shape(
    types: &BTreeMap<String, EntityDescriptor>,
    entity_type: &str,
    spec: &ProjectionSpec,
) -> ShapeResult<()> {
    let descriptor = &types[entity_type];
    for (field, node) in spec.fields() {
        match (descriptor.relation(field), node) {
            (Some(_), SpecNode::Include) | (Some(_), SpecNode::Exclude) => {
                return Err(ShapeError::ambiguous_structure(format!(
                    "default shape must give relation '{}' as AS_ID, AS_LABEL or an object",
                    field
                ))
                .within(field));
            }
            (Some(relation), SpecNode::Nested(inner)) => {
                check_default_shape(types, &relation.target_type, inner)
                    .map_err(|e| e.within(field))?;
            }
            (Some(_), _) => {}
            (None, SpecNode::AsId) | (None, SpecNode::AsLabel) if descriptor.has_field(field) => {
                return Err(ShapeError::ambiguous_structure(format!(
                    "'{}' is not a relation",
                    field
                ))
                .within(field));
            }
            (None, _) if descriptor.has_field(field) => {}
            (None, _) => return Err(ShapeError::unknown_field(entity_type, field).within(field)),
        }
    }
    Ok(())
}

/// Read-only lookup of entity types and their relations
#[derive(Debug, Clone)]
pub struct RelationRegistry {
    types: BTreeMap<String, RegisteredType>,
}

impl RelationRegistry {
    /// Builds a registry from a registry document:
    /// `{"types": {"<name>": {...descriptor...}}}`
    pub fn from_json(value: &Value) -> ShapeResult<Self> {
        let doc: RegistryDocument = serde_json::from_value(value.clone())
            .map_err(|e| ShapeError::invalid_document(format!("Invalid registry: {}", e)))?;

        let mut builder = RegistryBuilder::new();
        for (name, mut descriptor) in doc.types {
            descriptor.name = name;
            builder.register(descriptor)?;
        }
        builder.build()
    }

    /// Reads and builds a registry file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let registry = Self::from_json(&read_json(path)?)?;
        log_event(
            Event::RegistryLoaded,
            &[
                ("path", path.display().to_string().as_str()),
                ("types", registry.len().to_string().as_str()),
            ],
        );
        Ok(registry)
    }

    /// Relation descriptor for `field` on `entity_type`, if it is a relation
    pub fn describe(&self, entity_type: &str, field: &str) -> Option<&RelationDescriptor> {
        self.types
            .get(entity_type)
            .and_then(|t| t.descriptor.relation(field))
    }

    /// Descriptor for a type
    pub fn entity(&self, entity_type: &str) -> Option<&EntityDescriptor> {
        self.types.get(entity_type).map(|t| &t.descriptor)
    }

    /// Descriptor for a type, or an error naming it
    pub fn require(&self, entity_type: &str) -> ShapeResult<&EntityDescriptor> {
        self.entity(entity_type).ok_or_else(|| {
            ShapeError::unresolved_path(format!("Unknown entity type '{}'", entity_type))
        })
    }

    pub fn contains(&self, entity_type: &str) -> bool {
        self.types.contains_key(entity_type)
    }

    pub fn is_relation(&self, entity_type: &str, field: &str) -> bool {
        self.describe(entity_type, field).is_some()
    }

    /// Spec used when a relation to this type is projected with `true`
    pub fn default_spec(&self, entity_type: &str) -> ShapeResult<&ProjectionSpec> {
        self.types
            .get(entity_type)
            .map(|t| &t.default_spec)
            .ok_or_else(|| {
                ShapeError::unresolved_path(format!("Unknown entity type '{}'", entity_type))
            })
    }

    /// Registered type names, sorted
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ShapeErrorCode;
    use serde_json::json;

    fn library() -> RelationRegistry {
        RegistryBuilder::new()
            .with(
                EntityDescriptor::new("author")
                    .fields(["name", "born"])
                    .with_label("name")
                    .to_many("books", "book"),
            )
            .unwrap()
            .with(
                EntityDescriptor::new("book")
                    .fields(["title"])
                    .to_one("author", "author"),
            )
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_describe() {
        let registry = library();
        assert_eq!(
            registry.describe("book", "author"),
            Some(&RelationDescriptor::one("author"))
        );
        assert!(registry.describe("book", "title").is_none());
        assert!(registry.describe("missing", "author").is_none());
        assert!(registry.is_relation("author", "books"));
    }

    #[test]
    fn test_primary_key_is_declared() {
        let registry = library();
        assert_eq!(registry.entity("book").unwrap().fields, vec!["id", "title"]);
    }

    #[test]
    fn test_generated_default_spec() {
        let registry = library();
        let spec = registry.default_spec("book").unwrap();
        assert_eq!(
            spec.to_json(),
            json!({"id": true, "title": true, "author": "AS_ID"})
        );

        let spec = registry.default_spec("author").unwrap();
        assert!(spec.get("books").is_none());
    }

    #[test]
    fn test_dangling_target_rejected() {
        let err = RegistryBuilder::new()
            .with(EntityDescriptor::new("book").to_one("author", "author"))
            .unwrap()
            .build()
            .unwrap_err();
        assert_eq!(err.code(), ShapeErrorCode::InvalidDocument);
    }

    #[test]
    fn test_duplicate_type_rejected() {
        let mut builder = RegistryBuilder::new();
        builder.register(EntityDescriptor::new("a")).unwrap();
        assert!(builder.register(EntityDescriptor::new("a")).is_err());
    }

    #[test]
    fn test_unknown_label_field_rejected() {
        let err = RegistryBuilder::new()
            .with(EntityDescriptor::new("a").with_label("name"))
            .unwrap()
            .build()
            .unwrap_err();
        assert_eq!(err.code(), ShapeErrorCode::UnknownField);
    }

    #[test]
    fn test_default_shape_must_name_relations() {
        let err = RegistryBuilder::new()
            .with(
                EntityDescriptor::new("node")
                    .to_one("parent", "node")
                    .with_default_shape(json!({"id": true, "parent": true})),
            )
            .unwrap()
            .build()
            .unwrap_err();
        assert_eq!(err.code(), ShapeErrorCode::AmbiguousStructure);

        let registry = RegistryBuilder::new()
            .with(
                EntityDescriptor::new("node")
                    .to_one("parent", "node")
                    .with_default_shape(json!({"id": true, "parent": {"id": true, "parent": "AS_ID"}})),
            )
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(registry.default_spec("node").unwrap().depth(), 2);
    }

    #[test]
    fn test_from_json() {
        let registry = RelationRegistry::from_json(&json!({
            "types": {
                "author": {"fields": ["name"], "label": "name",
                           "relations": {"books": {"target": "book", "cardinality": "many"}}},
                "book": {"primary_key": "isbn", "fields": ["title"],
                         "relations": {"author": {"target": "author", "cardinality": "one"}}}
            }
        }))
        .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.entity("book").unwrap().primary_key, "isbn");
        assert_eq!(registry.type_names().collect::<Vec<_>>(), vec!["author", "book"]);
    }

    #[test]
    fn test_registry_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RelationRegistry>();
    }
}
