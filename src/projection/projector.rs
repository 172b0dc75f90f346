//! Structured projection engine
//!
//! Walks a [`ProjectionSpec`] against an [`Entity`], resolving relations
//! through the registry. Recursion follows the projection spec only: every nested
//! call consumes one level of the spec, so cyclic data cannot loop.

use serde_json::{Map, Value};

use super::pick::pick;
use super::spec::{ProjectionSpec, SpecNode};
use crate::config::EngineLimits;
use crate::errors::{ShapeError, ShapeResult};
use crate::executor::{InMemoryExecutor, PredicateExecutor};
use crate::filter::FilterCompiler;
use crate::model::{Entity, Relation};
use crate::observability::{log_event, Event};
use crate::path::FieldPath;
use crate::registry::{Cardinality, RelationDescriptor, RelationRegistry};

/// Supplies a value for a field the entity does not expose.
/// Called with the entity type and the field name.
pub type DefaultResolver = Box<dyn Fn(&str, &str) -> Value + Send + Sync>;

/// Shapes entities into JSON documents
pub struct Projector<'r, X: PredicateExecutor = InMemoryExecutor> {
    registry: &'r RelationRegistry,
    executor: X,
    compiler: FilterCompiler,
    max_depth: Option<usize>,
    default_resolver: Option<DefaultResolver>,
}

impl<'r> Projector<'r> {
    /// Projector evaluating relation filters in memory
    pub fn new(registry: &'r RelationRegistry) -> Self {
        Self::with_executor(registry, InMemoryExecutor::new())
    }
}

impl<'r, X: PredicateExecutor> Projector<'r, X> {
    /// Projector applying relation filters through `executor`
    pub fn with_executor(registry: &'r RelationRegistry, executor: X) -> Self {
        Self {
            registry,
            executor,
            compiler: FilterCompiler::new(),
            max_depth: None,
            default_resolver: None,
        }
    }

    /// Enforces the configured spec and filter depths
    pub fn with_limits(mut self, limits: &EngineLimits) -> Self {
        self.compiler = FilterCompiler::with_limits(limits);
        self.max_depth = Some(limits.max_spec_depth);
        self
    }

    /// Uses `resolver` for fields the entity does not expose
    pub fn with_default_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&str, &str) -> Value + Send + Sync + 'static,
    {
        self.default_resolver = Some(Box::new(resolver));
        self
    }

    /// Projects one entity by `spec`
    pub fn project<E: Entity>(&self, entity: &E, spec: &ProjectionSpec) -> ShapeResult<Value> {
        self.check_depth(spec)?;
        self.registry.require(entity.entity_type())?;

        let value = self.project_entity(entity, spec)?;
        log_event(
            Event::ProjectionComplete,
            &[
                ("entity_type", entity.entity_type()),
                ("fields", spec.len().to_string().as_str()),
            ],
        );
        Ok(value)
    }

    /// Projects one entity by its type's default spec
    pub fn project_default<E: Entity>(&self, entity: &E) -> ShapeResult<Value> {
        let spec = self.registry.default_spec(entity.entity_type())?;
        self.project(entity, spec)
    }

    /// Projects every entity by `spec`, in order
    pub fn project_all<E: Entity>(&self, entities: &[E], spec: &ProjectionSpec) -> ShapeResult<Vec<Value>> {
        entities
            .iter()
            .map(|entity| self.project(entity, spec))
            .collect()
    }

    fn check_depth(&self, spec: &ProjectionSpec) -> ShapeResult<()> {
        if let Some(max) = self.max_depth {
            let depth = spec.depth();
            if depth > max {
                return Err(ShapeError::limit_exceeded("projection", depth, max));
            }
        }
        Ok(())
    }

    fn project_entity<E: Entity>(&self, entity: &E, spec: &ProjectionSpec) -> ShapeResult<Value> {
        let mut out = Map::new();
        for (field, node) in spec.fields() {
            let projected = match self.registry.describe(entity.entity_type(), field) {
                Some(relation) => self.project_relation(entity, field, relation, node).map(Some),
                None => self.project_scalar(entity, field, node),
            };
            if let Some(value) = projected.map_err(|e| e.within(field))? {
                out.insert(field.to_string(), value);
            }
        }
        Ok(Value::Object(out))
    }

    fn read_field<E: Entity>(&self, entity: &E, field: &str) -> ShapeResult<Value> {
        if let Some(value) = entity.get_field(field) {
            return Ok(value.to_json());
        }
        match self.default_resolver {
            Some(ref resolve) => Ok(resolve(entity.entity_type(), field)),
            None => Err(ShapeError::unknown_field(entity.entity_type(), field)),
        }
    }

    /// `None` when the field is omitted
    fn project_scalar<E: Entity>(
        &self,
        entity: &E,
        field: &str,
        node: &SpecNode,
    ) -> ShapeResult<Option<Value>> {
        match node {
            SpecNode::Exclude => Ok(None),
            SpecNode::Include => self.read_field(entity, field).map(Some),
            SpecNode::AsId | SpecNode::AsLabel => Err(ShapeError::ambiguous_structure(format!(
                "'{}' is not a relation of '{}'; AS_ID and AS_LABEL apply to relations",
                field,
                entity.entity_type()
            ))),
            SpecNode::Nested(inner) => match self.read_field(entity, field)? {
                Value::Null => Ok(Some(Value::Null)),
                value @ (Value::Object(_) | Value::Array(_)) => pick(&value, inner).map(Some),
                _ => Err(ShapeError::ambiguous_structure(format!(
                    "'{}' is a scalar field and has no sub-fields to select",
                    field
                ))),
            },
        }
    }

    fn project_relation<E: Entity>(
        &self,
        entity: &E,
        field: &str,
        relation: &RelationDescriptor,
        node: &SpecNode,
    ) -> ShapeResult<Value> {
        if let SpecNode::Exclude = node {
            return Err(ShapeError::ambiguous_structure(format!(
                "relation '{}' cannot be projected with false; use AS_ID, AS_LABEL or an object",
                field
            )));
        }

        let related = entity
            .get_relation(field)
            .ok_or_else(|| ShapeError::unknown_field(entity.entity_type(), field))?;

        match (relation.cardinality, related) {
            (Cardinality::One, Relation::One(None)) => Ok(Value::Null),
            (Cardinality::One, Relation::One(Some(target))) => {
                self.project_related(&target, &relation.target_type, node)
            }
            (Cardinality::Many, Relation::Many(items)) => {
                let items = match node {
                    SpecNode::Nested(inner) => match inner.filter() {
                        Some(filter) => {
                            let predicate = self.compiler.compile(filter, &FieldPath::root())?;
                            self.executor.execute(&predicate, items)?
                        }
                        None => items,
                    },
                    _ => items,
                };
                items
                    .iter()
                    .map(|target| self.project_related(target, &relation.target_type, node))
                    .collect::<ShapeResult<Vec<_>>>()
                    .map(Value::Array)
            }
            (cardinality, related) => Err(ShapeError::ambiguous_structure(format!(
                "relation '{}' is declared to-{} but the entity returned {} related value(s) as {}",
                field,
                match cardinality {
                    Cardinality::One => "one",
                    Cardinality::Many => "many",
                },
                related.len(),
                match &related {
                    Relation::One(_) => "one",
                    Relation::Many(_) => "a list",
                }
            ))),
        }
    }

    fn project_related<E: Entity>(&self, target: &E, target_type: &str, node: &SpecNode) -> ShapeResult<Value> {
        match node {
            SpecNode::AsId => Ok(target.primary_key().to_json()),
            SpecNode::AsLabel => Ok(Value::String(target.label())),
            SpecNode::Nested(inner) => self.project_entity(target, inner),
            SpecNode::Include => {
                let spec = self.registry.default_spec(target_type)?;
                self.project_entity(target, spec)
            }
            SpecNode::Exclude => Err(ShapeError::ambiguous_structure(
                "relation cannot be projected with false",
            )),
        }
    }
}
