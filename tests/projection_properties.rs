//! Projection Engine Property Tests
//!
//! End-to-end checks of the projector through the public API:
//! - Default-spec projection round-trips scalar values
//! - AS_ID yields the bare primary key
//! - `__filter` on a to-many relation keeps matching entities in order
//! - Self-referential data projects in finite time under a finite spec
//! - Malformed specs fail with exactly one error and no partial output

use std::sync::Arc;

use serde_json::{json, Value};
use shapekit::errors::ShapeErrorCode;
use shapekit::projection::{pick, ProjectionSpec, Projector};
use shapekit::registry::{EntityDescriptor, RegistryBuilder, RelationRegistry};
use shapekit::store::MemoryStore;

// =============================================================================
// Helper Functions
// =============================================================================

const SHELF_ID: &str = "6f1c2a1e-8d4b-4c7e-9a55-3b2f0d9e7c11";

fn library() -> MemoryStore {
    let registry = RegistryBuilder::new()
        .with(
            EntityDescriptor::new("shelf")
                .fields(["id", "room", "opened_at"])
                .with_label("room")
                .to_many("books", "book"),
        )
        .unwrap()
        .with(
            EntityDescriptor::new("book")
                .fields(["id", "title", "year", "price", "tags", "published", "extra"])
                .with_label("title")
                .to_one("shelf", "shelf"),
        )
        .unwrap()
        .build()
        .unwrap();

    MemoryStore::from_json(
        Arc::new(registry),
        &json!({
            "shelf": [
                {"id": SHELF_ID, "room": "Reading Room", "opened_at": "2021-03-04T09:30:00Z",
                 "books": [3, 1, 2]}
            ],
            "book": [
                {"id": 1, "title": "Kindred", "year": 1979, "price": 12.5,
                 "tags": ["sf", "classic"], "published": "1979-06-01",
                 "extra": {"isbn": "978-0807083697", "signed": false}, "shelf": SHELF_ID},
                {"id": 2, "title": "Dawn", "year": 1987, "price": 9.0,
                 "tags": [], "published": null, "extra": null, "shelf": SHELF_ID},
                {"id": 3, "title": "Parable of the Sower", "year": 1993, "price": 14.25,
                 "tags": ["sf"], "published": "1993-10-01", "extra": {}, "shelf": SHELF_ID}
            ]
        }),
    )
    .unwrap()
}

fn spec(value: Value) -> ProjectionSpec {
    ProjectionSpec::parse(&value).unwrap()
}

fn project(store: &MemoryStore, entity_type: &str, key: &str, shape: Value) -> Value {
    let registry: &RelationRegistry = store.registry();
    Projector::new(registry)
        .project(&store.get(entity_type, key).unwrap(), &spec(shape))
        .unwrap()
}

// =============================================================================
// Round Trip Tests
// =============================================================================

/// Every scalar field comes back exactly as it was loaded.
#[test]
fn test_default_projection_round_trips_scalars() {
    let store = library();
    let registry: &RelationRegistry = store.registry();
    let projector = Projector::new(registry);

    let book = store.get("book", "1").unwrap();
    let out = projector.project_default(&book).unwrap();
    let reparsed: Value = serde_json::from_str(&out.to_string()).unwrap();

    assert_eq!(reparsed["id"], json!(1));
    assert_eq!(reparsed["title"], json!("Kindred"));
    assert_eq!(reparsed["year"], json!(1979));
    assert_eq!(reparsed["price"], json!(12.5));
    assert_eq!(reparsed["tags"], json!(["sf", "classic"]));
    assert_eq!(reparsed["published"], json!("1979-06-01"));
    assert_eq!(reparsed["extra"], json!({"isbn": "978-0807083697", "signed": false}));
    // To-one relations default to their primary key
    assert_eq!(reparsed["shelf"], json!(SHELF_ID));

    let shelf = store.get("shelf", SHELF_ID).unwrap();
    let out = projector.project_default(&shelf).unwrap();
    assert_eq!(
        out,
        json!({"id": SHELF_ID, "room": "Reading Room", "opened_at": "2021-03-04T09:30:00Z"})
    );
}

/// Null and empty values survive the trip as null and empty.
#[test]
fn test_nulls_and_empties_preserved() {
    let store = library();
    let out = project(&store, "book", "2", json!({"tags": true, "published": true, "extra": true}));
    assert_eq!(out, json!({"tags": [], "published": null, "extra": null}));
}

// =============================================================================
// Relation Projection Tests
// =============================================================================

/// AS_ID on a to-one relation is the bare key, never an object.
#[test]
fn test_as_id_yields_primary_key() {
    let store = library();
    let out = project(&store, "book", "3", json!({"shelf": "AS_ID"}));
    assert_eq!(out, json!({"shelf": SHELF_ID}));
    assert!(out["shelf"].is_string());

    let out = project(&store, "shelf", SHELF_ID, json!({"books": "AS_ID"}));
    assert_eq!(out, json!({"books": [3, 1, 2]}));
}

#[test]
fn test_as_label_uses_label_field() {
    let store = library();
    let out = project(&store, "book", "1", json!({"shelf": "AS_LABEL"}));
    assert_eq!(out, json!({"shelf": "Reading Room"}));
}

/// `__filter` keeps only matching books in collection order.
#[test]
fn test_filter_keeps_natural_order() {
    let store = library();
    let out = project(
        &store,
        "shelf",
        SHELF_ID,
        json!({"books": {"id": true, "__filter": {"tags": {"_contains": "sf"}}}}),
    );
    assert_eq!(out, json!({"books": [{"id": 3}, {"id": 1}]}));

    let out = project(
        &store,
        "shelf",
        SHELF_ID,
        json!({"books": {"title": true, "__filter": {"year": {"_gt": 2000}}}}),
    );
    assert_eq!(out, json!({"books": []}));
}

/// The list shorthand is the same as a nested spec.
#[test]
fn test_list_shorthand() {
    let store = library();
    let long = project(&store, "shelf", SHELF_ID, json!({"books": {"year": true}}));
    let short = project(&store, "shelf", SHELF_ID, json!({"books": [{"year": true}]}));
    assert_eq!(long, short);
    assert_eq!(long, json!({"books": [{"year": 1993}, {"year": 1979}, {"year": 1987}]}));
}

// =============================================================================
// Cyclic Data Tests
// =============================================================================

fn cyclic_registry() -> RelationRegistry {
    RegistryBuilder::new()
        .with(
            EntityDescriptor::new("node")
                .fields(["id", "name"])
                .with_label("name")
                .to_one("next", "node")
                .to_many("peers", "node"),
        )
        .unwrap()
        .build()
        .unwrap()
}

/// Recursion follows the spec, so a cycle in the data is harmless.
#[test]
fn test_cyclic_data_projects_finitely() {
    let store = MemoryStore::from_json(
        Arc::new(cyclic_registry()),
        &json!({
            "node": [
                {"id": "a", "name": "A", "next": "b", "peers": ["a", "b"]},
                {"id": "b", "name": "B", "next": "a", "peers": ["a"]}
            ]
        }),
    )
    .unwrap();

    let out = project(
        &store,
        "node",
        "a",
        json!({"name": true, "next": {"next": {"next": "AS_LABEL"}}, "peers": true}),
    );
    assert_eq!(
        out,
        json!({
            "name": "A",
            "next": {"next": {"next": "B"}},
            "peers": [
                {"id": "a", "name": "A", "next": "b"},
                {"id": "b", "name": "B", "next": "a"}
            ]
        })
    );
}

// =============================================================================
// Error Tests
// =============================================================================

#[test]
fn test_false_on_relation_is_ambiguous() {
    let store = library();
    let registry: &RelationRegistry = store.registry();
    let book = store.get("book", "1").unwrap();

    let err = Projector::new(registry)
        .project(&book, &spec(json!({"title": true, "shelf": false})))
        .unwrap_err();
    assert_eq!(err.code(), ShapeErrorCode::AmbiguousStructure);
    assert_eq!(err.path(), Some("shelf"));
}

#[test]
fn test_unknown_nested_field_reports_path() {
    let store = library();
    let registry: &RelationRegistry = store.registry();
    let shelf = store.get("shelf", SHELF_ID).unwrap();

    let err = Projector::new(registry)
        .project(&shelf, &spec(json!({"books": {"isbn": true}})))
        .unwrap_err();
    assert_eq!(err.code(), ShapeErrorCode::UnknownField);
    assert_eq!(err.path(), Some("books__isbn"));
}

#[test]
fn test_bad_spec_values_rejected() {
    for bad in [json!({"title": 1}), json!([true])] {
        let err = ProjectionSpec::parse(&bad).unwrap_err();
        assert_eq!(err.code(), ShapeErrorCode::InvalidDocument, "{}", bad);
    }

    let err = ProjectionSpec::parse(&json!({"title": "AS_NAME"})).unwrap_err();
    assert_eq!(err.code(), ShapeErrorCode::AmbiguousStructure);
    assert_eq!(err.path(), Some("title"));
}

// =============================================================================
// Document Picker Tests
// =============================================================================

#[test]
fn test_pick_plain_document() {
    let doc = json!({
        "name": "Kindred",
        "meta": {"pages": 264, "lang": "en"},
        "editions": [{"year": 1979, "isbn": "a"}, {"year": 2003, "isbn": "b"}]
    });
    let out = pick(&doc, &spec(json!({"name": true, "meta": {"lang": true}, "editions": {"year": true}})))
        .unwrap();
    assert_eq!(
        out,
        json!({"name": "Kindred", "meta": {"lang": "en"}, "editions": [{"year": 1979}, {"year": 2003}]})
    );

    let err = pick(&doc, &spec(json!({"meta": {"author": true}}))).unwrap_err();
    assert_eq!(err.path(), Some("meta__author"));
}
