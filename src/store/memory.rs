//! In-memory entity store
//!
//! Holds records per entity type in insertion order. Records are checked
//! against the registry on insert; links are checked once every record is in.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use super::record::{Link, Record};
use crate::errors::{ShapeError, ShapeResult};
use crate::model::{Entity, FieldValue, Relation};
use crate::registry::{EntityDescriptor, RelationRegistry};

#[derive(Debug, Default)]
struct Table {
    records: Vec<Record>,
    index: BTreeMap<String, usize>,
}

/// Records of every registered type
#[derive(Debug)]
pub struct MemoryStore {
    registry: Arc<RelationRegistry>,
    tables: BTreeMap<String, Table>,
}

impl MemoryStore {
    /// Empty store over `registry`
    pub fn new(registry: Arc<RelationRegistry>) -> Self {
        Self {
            registry,
            tables: BTreeMap::new(),
        }
    }

    /// Loads a dataset document:
    /// `{"<type>": [{"<pk>": ..., "<field>": ..., "<relation>": key | [keys]}]}`
    pub fn from_json(registry: Arc<RelationRegistry>, dataset: &Value) -> ShapeResult<Self> {
        let types = dataset.as_object().ok_or_else(|| {
            ShapeError::invalid_document("dataset must be an object keyed by entity type")
        })?;

        let mut store = Self::new(registry);
        for (entity_type, rows) in types {
            let rows = rows.as_array().ok_or_else(|| {
                ShapeError::invalid_document(format!("'{}' must be a list of records", entity_type))
            })?;
            for (i, row) in rows.iter().enumerate() {
                store
                    .record_from_json(entity_type, row)
                    .and_then(|record| store.insert(entity_type, record))
                    .map_err(|e| e.within(&i.to_string()).within(entity_type))?;
            }
        }
        store.validate_links()?;
        Ok(store)
    }

    fn record_from_json(&self, entity_type: &str, row: &Value) -> ShapeResult<Record> {
        let descriptor = self.registry.require(entity_type)?;
        let row = row
            .as_object()
            .ok_or_else(|| ShapeError::invalid_document("record must be an object"))?;

        let key = match row.get(&descriptor.primary_key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(ShapeError::invalid_document(format!(
                    "record has no usable primary key '{}'",
                    descriptor.primary_key
                )))
            }
        };

        let mut record = Record::new(key);
        for (name, value) in row {
            match descriptor.relation(name) {
                Some(relation) if relation.is_many() => {
                    let keys = value.as_array().ok_or_else(|| {
                        ShapeError::invalid_document("to-many link must be a list of keys")
                            .within(name)
                    })?;
                    let keys = keys
                        .iter()
                        .map(link_key)
                        .collect::<ShapeResult<Vec<_>>>()
                        .map_err(|e| e.within(name))?;
                    record = record.link_many(name.as_str(), keys);
                }
                Some(_) if value.is_null() => record = record.unlink(name.as_str()),
                Some(_) => {
                    let key = link_key(value).map_err(|e| e.within(name))?;
                    record = record.link_one(name.as_str(), key);
                }
                None => record = record.set(name.as_str(), FieldValue::from_json(value)),
            }
        }
        Ok(record)
    }

    /// Adds a record; keys are unique per type
    pub fn insert(&mut self, entity_type: &str, record: Record) -> ShapeResult<()> {
        let descriptor = self.registry.require(entity_type)?;

        for (name, _) in record.fields() {
            if !descriptor.has_field(name) {
                return Err(ShapeError::unknown_field(entity_type, name).at(name.as_str()));
            }
        }
        for (name, link) in record.links() {
            let relation = descriptor
                .relation(name)
                .ok_or_else(|| ShapeError::unknown_field(entity_type, name).at(name.as_str()))?;
            if relation.is_many() != matches!(link, Link::Many(_)) {
                return Err(ShapeError::ambiguous_structure(format!(
                    "link cardinality does not match relation '{}.{}'",
                    entity_type, name
                ))
                .at(name.as_str()));
            }
        }

        let table = self.tables.entry(entity_type.to_string()).or_default();
        if table.index.contains_key(record.key()) {
            return Err(ShapeError::invalid_document(format!(
                "duplicate key '{}' for type '{}'",
                record.key(),
                entity_type
            )));
        }
        table.index.insert(record.key().to_string(), table.records.len());
        table.records.push(record);
        Ok(())
    }

    /// Rejects links to keys that are not stored
    pub fn validate_links(&self) -> ShapeResult<()> {
        for (entity_type, table) in &self.tables {
            let descriptor = self.registry.require(entity_type)?;
            for record in &table.records {
                for (name, link) in record.links() {
                    let Some(relation) = descriptor.relation(name) else {
                        continue;
                    };
                    for key in link.keys() {
                        if self.get(&relation.target_type, key).is_none() {
                            return Err(ShapeError::invalid_document(format!(
                                "'{}' {} links to missing '{}' {}",
                                entity_type,
                                record.key(),
                                relation.target_type,
                                key
                            ))
                            .at(name.as_str()));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Record of `entity_type` with `key`
    pub fn get(&self, entity_type: &str, key: &str) -> Option<RecordRef<'_>> {
        let descriptor = self.registry.entity(entity_type)?;
        let table = self.tables.get(entity_type)?;
        let record = &table.records[*table.index.get(key)?];
        Some(RecordRef {
            store: self,
            descriptor,
            record,
        })
    }

    /// All records of `entity_type`, in insertion order
    pub fn all(&self, entity_type: &str) -> ShapeResult<Vec<RecordRef<'_>>> {
        let descriptor = self.registry.require(entity_type)?;
        Ok(self
            .tables
            .get(entity_type)
            .map(|table| {
                table
                    .records
                    .iter()
                    .map(|record| RecordRef {
                        store: self,
                        descriptor,
                        record,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Number of records of `entity_type`
    pub fn count(&self, entity_type: &str) -> usize {
        self.tables.get(entity_type).map_or(0, |t| t.records.len())
    }

    pub fn registry(&self) -> &Arc<RelationRegistry> {
        &self.registry
    }
}

fn link_key(value: &Value) -> ShapeResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(ShapeError::invalid_document(format!(
            "link key must be a string or number, got {}",
            crate::filter::json_type_name(other)
        ))),
    }
}

/// Borrowed view of a stored record
#[derive(Debug, Clone, Copy)]
pub struct RecordRef<'s> {
    store: &'s MemoryStore,
    descriptor: &'s EntityDescriptor,
    record: &'s Record,
}

impl<'s> RecordRef<'s> {
    pub fn key(&self) -> &'s str {
        self.record.key()
    }

    fn resolve(&self, target_type: &str, key: &str) -> Option<RecordRef<'s>> {
        self.store.get(target_type, key)
    }
}

impl<'s> Entity for RecordRef<'s> {
    fn entity_type(&self) -> &str {
        &self.descriptor.name
    }

    fn primary_key(&self) -> FieldValue {
        match self.record.field(&self.descriptor.primary_key) {
            Some(value) if !value.is_null() => value.clone(),
            _ => FieldValue::Text(self.record.key().to_string()),
        }
    }

    fn label(&self) -> String {
        self.descriptor
            .label_field
            .as_deref()
            .and_then(|field| self.record.field(field))
            .filter(|value| !value.is_null())
            .map(FieldValue::as_text)
            .unwrap_or_else(|| format!("<{} pk={}>", self.descriptor.name, self.record.key()))
    }

    fn get_field(&self, name: &str) -> Option<FieldValue> {
        if name == self.descriptor.primary_key {
            return Some(self.primary_key());
        }
        if !self.descriptor.has_field(name) {
            return None;
        }
        Some(self.record.field(name).cloned().unwrap_or(FieldValue::Null))
    }

    fn get_relation(&self, name: &str) -> Option<Relation<Self>> {
        let relation = self.descriptor.relation(name)?;
        let keys = self.record.link(name).map(Link::keys).unwrap_or_default();
        let mut related = keys
            .into_iter()
            .filter_map(|key| self.resolve(&relation.target_type, key));
        Some(if relation.is_many() {
            Relation::Many(related.collect())
        } else {
            Relation::One(related.next())
        })
    }
}
