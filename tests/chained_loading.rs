//! Integration tests for chained inclusions.
//!
//! Schemas used for inclusions may themselves declare inclusions. These
//! are loaded all the way down, merged with inclusions of the same entity
//! type found elsewhere, and fetched once per entity type.

mod common;

use common::TestApp;
use pretty_assertions::assert_eq;
use serde_json::json;
use sideload::engine::memory::Record;
use sideload::prelude::*;
use sideload::schema::InclusionStrategy;

fn a_b_c(app: &TestApp) {
    app.insert(Record::new("testapp.A", 1));
    app.insert(Record::new("testapp.B", 1).reference("a", 1));
    app.insert(Record::new("testapp.C", 1).reference("b", 1));
}

#[test]
fn test_direct_nested_inclusion() {
    let app = TestApp::empty();
    a_b_c(&app);
    for renderer in common::renderers() {
        let body = app.render(&renderer, app.list("CInclusionSchema", "testapp.C"), Some("*"));
        assert_eq!(
            body,
            json!({
                "data": [{"id": 1, "b": 1}],
                "inclusions": {
                    "testapp.A": [{"id": 1}],
                    "testapp.B": [{"id": 1, "a": 1}]
                }
            })
        );
    }
}

#[test]
fn test_indirect_inclusion() {
    let app = TestApp::empty();
    a_b_c(&app);
    for renderer in common::renderers() {
        let body = app.render(&renderer, app.page("CSchema", "testapp.C"), Some("*"));
        assert_eq!(
            body,
            json!({
                "count": 1,
                "previous": null,
                "next": null,
                "data": [{"id": 1, "b": {"id": 1, "a": 1}}],
                "inclusions": {"testapp.A": [{"id": 1}]}
            })
        );
    }
}

#[test]
fn test_inclusions_same_datamodel_different_levels() {
    let app = TestApp::empty();
    app.insert(Record::new("testapp.Tag", 1).value("name", "tag1"));
    app.insert(Record::new("testapp.Tag", 2).value("name", "tag2"));
    app.insert(Record::new("testapp.Tag", 3).value("name", "tag3"));
    app.insert(
        Record::new("testapp.Parent", 1)
            .value("name", "parent")
            .references("tags", [1])
            .null("favourite_child"),
    );
    app.insert(
        Record::new("testapp.Child", 1)
            .value("name", "child")
            .reference("parent", 1)
            .references("tags", [2]),
    );

    for renderer in common::renderers() {
        let body = app.render(&renderer, app.page("ChildSchema2", "testapp.Child"), Some("*"));
        assert_eq!(
            body,
            json!({
                "count": 1,
                "previous": null,
                "next": null,
                "data": [{"id": 1, "parent": 1, "tags": [2]}],
                "inclusions": {
                    "testapp.Parent": [
                        {"id": 1, "name": "parent", "tags": [1], "favourite_child": null}
                    ],
                    "testapp.Tag": [
                        {"id": 1, "name": "tag1"},
                        {"id": 2, "name": "tag2"}
                    ]
                }
            })
        );
    }
}

#[test]
fn test_circular_references() {
    let app = TestApp::empty();
    app.insert(
        Record::new("testapp.Parent", 1)
            .value("name", "parent")
            .reference("favourite_child", 1),
    );
    app.insert(Record::new("testapp.Child", 1).value("name", "child1").reference("parent", 1));
    app.insert(Record::new("testapp.Child", 2).value("name", "child2").reference("parent", 1));

    for renderer in common::renderers() {
        let body = app.render(
            &renderer,
            app.detail("ChildSchema3", "testapp.Child", 2),
            Some("*"),
        );
        assert_eq!(
            body,
            json!({
                "data": {"id": 2, "parent": 1},
                "inclusions": {
                    "testapp.Parent": [{"id": 1, "favourite_child": 1}],
                    "testapp.Child": [{"id": 1, "parent": 1}]
                }
            })
        );
    }
}

#[test]
fn test_same_inclusion_schema_different_paths() {
    let app = TestApp::empty();
    app.insert(Record::new("testapp.Tag", 1).value("name", "tag 1"));
    app.insert(Record::new("testapp.Tag", 2).value("name", "tag 2"));
    app.insert(Record::new("testapp.Tag", 3).value("name", "tag 3"));
    app.insert(
        Record::new("testapp.D", 1)
            .references("tags1", [1])
            .references("tags2", [1, 3]),
    );
    app.insert(Record::new("testapp.E", 1).reference("d", 1));

    for renderer in common::renderers() {
        let body = app.render(&renderer, app.page("ESchema", "testapp.E"), Some("*"));
        assert_eq!(
            body,
            json!({
                "count": 1,
                "previous": null,
                "next": null,
                "data": [{"id": 1, "d": 1}],
                "inclusions": {
                    "testapp.D": [{"id": 1, "tags1": [1], "tags2": [1, 3]}],
                    "testapp.Tag": [
                        {"id": 1, "name": "tag 1"},
                        {"id": 3, "name": "tag 3"}
                    ]
                }
            })
        );
    }
}

#[test]
fn test_hoisting_fetches_each_entity_type_once() {
    let app = TestApp::empty();
    app.insert(Record::new("testapp.Tag", 1).value("name", "tag 1"));
    app.insert(Record::new("testapp.Tag", 3).value("name", "tag 3"));
    app.insert(
        Record::new("testapp.D", 1)
            .references("tags1", [1])
            .references("tags2", [1, 3]),
    );
    app.insert(Record::new("testapp.E", 1).reference("d", 1));
    app.insert(Record::new("testapp.E", 2).reference("d", 1));

    let renderer = InclusionRenderer::new().strategy(InclusionStrategy::Resolved);
    app.render(&renderer, app.list("ESchema", "testapp.E"), Some("*"));

    // hoisting fetches D and Tag once each
    let hoisted: Vec<_> = app
        .store
        .fetch_log()
        .into_iter()
        .rev()
        .take(2)
        .map(|(source, pks)| (source.entity.to_string(), pks.len()))
        .collect();
    assert_eq!(
        hoisted,
        vec![("testapp.Tag".to_string(), 2), ("testapp.D".to_string(), 1)]
    );
}

#[test]
fn test_definitions_are_cached_per_schema() {
    let app = TestApp::empty();
    a_b_c(&app);
    let renderer = InclusionRenderer::new().strategy(InclusionStrategy::Resolved);

    app.render(&renderer, app.list("CInclusionSchema", "testapp.C"), Some("*"));
    app.render(&renderer, app.list("CInclusionSchema", "testapp.C"), Some("b"));

    assert_eq!(renderer.cache().len(), 1);
    assert_eq!(renderer.cache().stats().hits, 1);
}

#[test]
fn test_self_referential_chain_includes_one_level() {
    let app = TestApp::empty();
    app.registry
        .register(
            Schema::builder("NodeSchema", "testapp.Node")
                .scalars(["id"])
                .field(Field::reference("next", Reference::to("testapp.Node")))
                .include("next", SchemaRef::named("NodeSchema"))
                .build()
                .unwrap(),
        )
        .unwrap();
    let length: i64 = 2_000;
    for pk in 1..length {
        app.insert(Record::new("testapp.Node", pk).reference("next", pk + 1));
    }
    app.insert(Record::new("testapp.Node", length).null("next"));

    for renderer in common::renderers() {
        let body = app.render(&renderer, app.detail("NodeSchema", "testapp.Node", 1), Some("*"));
        assert_eq!(
            body,
            json!({
                "data": {"id": 1, "next": 2},
                "inclusions": {"testapp.Node": [{"id": 2, "next": 3}]}
            })
        );
    }
}
