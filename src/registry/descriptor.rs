//! Entity and relation descriptors

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Relation cardinality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    /// To-one
    One,
    /// To-many
    Many,
}

/// Describes one relation field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDescriptor {
    /// Related entity type
    #[serde(rename = "target")]
    pub target_type: String,
    pub cardinality: Cardinality,
}

impl RelationDescriptor {
    /// To-one relation to `target`
    pub fn one(target: impl Into<String>) -> Self {
        Self {
            target_type: target.into(),
            cardinality: Cardinality::One,
        }
    }

    /// To-many relation to `target`
    pub fn many(target: impl Into<String>) -> Self {
        Self {
            target_type: target.into(),
            cardinality: Cardinality::Many,
        }
    }

    pub fn is_many(&self) -> bool {
        self.cardinality == Cardinality::Many
    }
}

fn default_primary_key() -> String {
    "id".to_string()
}

/// Describes one entity type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    /// Type name; taken from the registry map key when loaded from a file
    #[serde(default, skip_serializing)]
    pub name: String,

    /// Primary key field (default "id")
    #[serde(default = "default_primary_key")]
    pub primary_key: String,

    /// Field rendered for AS_LABEL
    #[serde(default, rename = "label")]
    pub label_field: Option<String>,

    /// Declared scalar fields, in declaration order
    #[serde(default)]
    pub fields: Vec<String>,

    /// Relation fields
    #[serde(default)]
    pub relations: BTreeMap<String, RelationDescriptor>,

    /// Projection used when a relation is projected with `true`
    #[serde(default)]
    pub default_shape: Option<Value>,
}

impl EntityDescriptor {
    /// Descriptor with primary key "id" and no other fields
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: default_primary_key(),
            label_field: None,
            fields: Vec::new(),
            relations: BTreeMap::new(),
            default_shape: None,
        }
    }

    pub fn with_primary_key(mut self, field: impl Into<String>) -> Self {
        self.primary_key = field.into();
        self
    }

    pub fn with_label(mut self, field: impl Into<String>) -> Self {
        self.label_field = Some(field.into());
        self
    }

    /// Declares a scalar field
    pub fn field(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.fields.contains(&name) {
            self.fields.push(name);
        }
        self
    }

    /// Declares several scalar fields
    pub fn fields<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().fold(self, |d, n| d.field(n))
    }

    /// Declares a to-one relation
    pub fn to_one(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.relations.insert(name.into(), RelationDescriptor::one(target));
        self
    }

    /// Declares a to-many relation
    pub fn to_many(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.relations.insert(name.into(), RelationDescriptor::many(target));
        self
    }

    /// Sets the default projection document
    pub fn with_default_shape(mut self, shape: Value) -> Self {
        self.default_shape = Some(shape);
        self
    }

    /// Returns true if `name` is a declared scalar field
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }

    /// Relation descriptor for `name`
    pub fn relation(&self, name: &str) -> Option<&RelationDescriptor> {
        self.relations.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let d = EntityDescriptor::new("book")
            .fields(["id", "title", "title"])
            .with_label("title")
            .to_one("author", "author")
            .to_many("reviews", "review");

        assert_eq!(d.fields, vec!["id", "title"]);
        assert!(d.has_field("title"));
        assert!(!d.has_field("author"));
        assert_eq!(d.relation("author"), Some(&RelationDescriptor::one("author")));
        assert!(d.relation("reviews").unwrap().is_many());
    }

    #[test]
    fn test_deserialize_defaults() {
        let d: EntityDescriptor = serde_json::from_value(json!({
            "fields": ["name"],
            "relations": {"books": {"target": "book", "cardinality": "many"}}
        }))
        .unwrap();

        assert_eq!(d.primary_key, "id");
        assert_eq!(d.label_field, None);
        assert_eq!(d.relation("books"), Some(&RelationDescriptor::many("book")));
    }
}
