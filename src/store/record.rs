//! Stored records

use std::collections::BTreeMap;

use crate::model::FieldValue;

/// Keys of the records a relation points at
#[derive(Debug, Clone, PartialEq)]
pub enum Link {
    One(Option<String>),
    Many(Vec<String>),
}

impl Link {
    /// Linked keys in order
    pub fn keys(&self) -> Vec<&str> {
        match self {
            Link::One(key) => key.iter().map(String::as_str).collect(),
            Link::Many(keys) => keys.iter().map(String::as_str).collect(),
        }
    }
}

/// One stored record: scalar fields plus relation links by key
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    key: String,
    fields: BTreeMap<String, FieldValue>,
    links: BTreeMap<String, Link>,
}

impl Record {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            fields: BTreeMap::new(),
            links: BTreeMap::new(),
        }
    }

    /// Sets a scalar field
    pub fn set(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Links a to-one relation
    pub fn link_one(mut self, relation: impl Into<String>, key: impl Into<String>) -> Self {
        self.links
            .insert(relation.into(), Link::One(Some(key.into())));
        self
    }

    /// Sets a to-one relation to null
    pub fn unlink(mut self, relation: impl Into<String>) -> Self {
        self.links.insert(relation.into(), Link::One(None));
        self
    }

    /// Links a to-many relation
    pub fn link_many<I, S>(mut self, relation: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.links.insert(
            relation.into(),
            Link::Many(keys.into_iter().map(Into::into).collect()),
        );
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn link(&self, relation: &str) -> Option<&Link> {
        self.links.get(relation)
    }

    pub(crate) fn fields(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    pub(crate) fn links(&self) -> impl Iterator<Item = (&String, &Link)> {
        self.links.iter()
    }
}
