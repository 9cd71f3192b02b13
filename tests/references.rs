//! Integration tests for inclusions of references.
//!
//! These tests render the shared test app through both strategies and check
//! the complete response bodies, including:
//! - Empty inclusions when nothing is requested
//! - Paths through nested schemas
//! - Wildcards on details and lists
//! - Pass-through of errors, raw payloads and custom actions

mod common;

use common::TestApp;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use sideload::prelude::*;

fn parent1() -> Value {
    json!({"id": 1, "name": "Papa Johns", "tags": [1, 2], "favourite_child": 2})
}

fn parent2() -> Value {
    json!({"id": 2, "name": "Papa Roach", "tags": [2], "favourite_child": null})
}

fn tags(ids: &[i64]) -> Value {
    let names = ["you", "are", "it"];
    ids.iter()
        .map(|&id| json!({"id": id, "name": names[id as usize - 1]}))
        .collect()
}

fn child1() -> Value {
    json!({
        "id": 1,
        "parent": parent1(),
        "name": "Children of Bodom",
        "childprops": null,
        "tags": [3]
    })
}

fn child2() -> Value {
    json!({
        "id": 2,
        "parent": parent1(),
        "name": "Children of Men",
        "childprops": 1,
        "tags": []
    })
}

#[test]
fn test_tag_list() {
    let app = TestApp::with_references();
    for renderer in common::renderers() {
        let body = app.render(&renderer, app.list("TagSchema", "testapp.Tag"), None);
        assert_eq!(body, json!({"data": tags(&[1, 2, 3]), "inclusions": {}}));
    }
}

#[test]
fn test_tag_detail() {
    let app = TestApp::with_references();
    for renderer in common::renderers() {
        let body = app.render(&renderer, app.detail("TagSchema", "testapp.Tag", 1), None);
        assert_eq!(body, json!({"data": {"id": 1, "name": "you"}, "inclusions": {}}));
    }
}

#[test]
fn test_custom_action_without_inclusions_is_passed_through() {
    let app = TestApp::with_references();
    for renderer in common::renderers() {
        let response = app
            .list("TagSchema", "testapp.Tag")
            .action(Action::custom("custom_action"));
        let body = app.render(&renderer, response, Some("*"));
        assert_eq!(body, tags(&[1, 2, 3]));
    }
}

#[test]
fn test_custom_action_with_inclusions() {
    let app = TestApp::with_references();
    app.insert(sideload::engine::memory::Record::new("testapp.C", 1).null("b"));
    for renderer in common::renderers() {
        let response = app
            .detail("CSchema", "testapp.C", 1)
            .action(Action::custom("custom_action"));
        let body = app.render(&renderer, response, None);
        assert_eq!(body, json!({"data": {"id": 1, "b": null}, "inclusions": {}}));
    }
}

#[test]
fn test_parent_list() {
    let app = TestApp::with_references();
    for renderer in common::renderers() {
        let body = app.render(&renderer, app.page("ParentSchema", "testapp.Parent"), None);
        assert_eq!(
            body,
            json!({
                "count": 2,
                "previous": null,
                "next": null,
                "data": [parent1(), parent2()],
                "inclusions": {}
            })
        );
    }
}

#[test]
fn test_parent_list_include_tags() {
    let app = TestApp::with_references();
    for renderer in common::renderers() {
        let body = app.render(
            &renderer,
            app.page("ParentSchema", "testapp.Parent"),
            Some("tags"),
        );
        assert_eq!(
            body,
            json!({
                "count": 2,
                "previous": null,
                "next": null,
                "data": [parent1(), parent2()],
                "inclusions": {"testapp.Tag": tags(&[1, 2])}
            })
        );
    }
}

#[test]
fn test_parent_detail_with_include() {
    let app = TestApp::with_references();
    for renderer in common::renderers() {
        let body = app.render(
            &renderer,
            app.detail("ParentSchema", "testapp.Parent", 2),
            Some("*"),
        );
        assert_eq!(
            body,
            json!({"data": parent2(), "inclusions": {"testapp.Tag": tags(&[2])}})
        );
    }
}

#[test]
fn test_nested_include() {
    let app = TestApp::with_references();
    for renderer in common::renderers() {
        let body = app.render(
            &renderer,
            app.detail("ChildSchema", "testapp.Child", 2),
            Some("parent.tags"),
        );
        assert_eq!(
            body,
            json!({"data": child2(), "inclusions": {"testapp.Tag": tags(&[1, 2])}})
        );
    }
}

#[test]
fn test_include_all_detail() {
    let app = TestApp::with_references();
    for renderer in common::renderers() {
        let body = app.render(
            &renderer,
            app.detail("ChildSchema", "testapp.Child", 2),
            Some("*"),
        );
        assert_eq!(
            body,
            json!({
                "data": child2(),
                "inclusions": {
                    "testapp.Tag": tags(&[1, 2]),
                    "testapp.ChildProps": [{"id": 1, "child": 2}]
                }
            })
        );
    }
}

#[test]
fn test_include_all_list() {
    let app = TestApp::with_references();
    for renderer in common::renderers() {
        let body = app.render(&renderer, app.page("ChildSchema", "testapp.Child"), Some("*"));
        assert_eq!(
            body,
            json!({
                "count": 2,
                "next": null,
                "previous": null,
                "data": [child1(), child2()],
                "inclusions": {
                    "testapp.Tag": tags(&[1, 2, 3]),
                    "testapp.ChildProps": [{"id": 1, "child": 2}]
                }
            })
        );
    }
}

#[test]
fn test_include_fk_field() {
    let app = TestApp::with_references();
    for renderer in common::renderers() {
        let body = app.render(
            &renderer,
            app.detail("ChildSchema", "testapp.Child", 2),
            Some("childprops"),
        );
        assert_eq!(
            body,
            json!({
                "data": child2(),
                "inclusions": {"testapp.ChildProps": [{"id": 1, "child": 2}]}
            })
        );
    }
}

#[test]
fn test_flattened_inclusions() {
    let app = TestApp::with_references();
    for renderer in common::renderers() {
        let body = app.render(
            &renderer,
            app.detail("ChildSchema", "testapp.Child", 1),
            Some("tags,parent.tags"),
        );
        assert_eq!(
            body,
            json!({"data": child1(), "inclusions": {"testapp.Tag": tags(&[1, 2, 3])}})
        );
    }
}

#[test]
fn test_nested_include_multiple_from_same_child() {
    let app = TestApp::with_references();
    app.insert(
        sideload::engine::memory::Record::new("testapp.Child", 2)
            .value("name", "Children of Men")
            .reference("parent", 1)
            .reference("childprops", 1)
            .references("tags", [1]),
    );
    for renderer in common::renderers() {
        let body = app.render(
            &renderer,
            app.detail("ChildPropsSchema2", "testapp.ChildProps", 1),
            Some("child.tags,child.parent"),
        );
        assert_eq!(
            body,
            json!({
                "data": {"id": 1, "child": {"id": 2, "parent": 1, "tags": [1]}},
                "inclusions": {
                    "testapp.Tag": tags(&[1, 2]),
                    "testapp.Parent": [parent1()]
                }
            })
        );
    }
}

#[test]
fn test_many() {
    let app = TestApp::with_references();
    for renderer in common::renderers() {
        let body = app.render(
            &renderer,
            app.detail("ContainerSchema", "testapp.Container", 1),
            Some("entries.tags"),
        );
        assert_eq!(
            body,
            json!({
                "data": {
                    "id": 1,
                    "name": "container 1",
                    "entries": [
                        {"id": 1, "name": "A", "tags": [1]},
                        {"id": 2, "name": "B", "tags": [3]}
                    ]
                },
                "inclusions": {"testapp.Tag": tags(&[1, 3])}
            })
        );
    }
}

#[test]
fn test_created_response_is_wrapped() {
    let app = TestApp::with_references();
    for renderer in common::renderers() {
        let response = app
            .detail("ParentSchema", "testapp.Parent", 2)
            .status(201)
            .action(Action::standard("create"));
        let body = app.render(&renderer, response, None);
        assert_eq!(body, json!({"data": parent2(), "inclusions": {}}));
    }
}

#[test]
fn test_error_responses_are_not_wrapped() {
    let app = TestApp::with_references();
    for renderer in common::renderers() {
        let errors = json!({
            "name": ["This field is required."],
            "tags": ["This field is required."]
        });
        let response = RenderResponse::raw(errors.clone())
            .status(400)
            .action(Action::standard("create"));
        assert_eq!(app.render(&renderer, response, Some("*")), errors);

        // serialized bodies of error responses render plainly too
        let response = app.detail("ParentSchema", "testapp.Parent", 2).status(409);
        assert_eq!(app.render(&renderer, response, Some("*")), parent2());
    }
}

#[test]
fn test_action_payloads_are_passed_through() {
    let app = TestApp::with_references();
    for renderer in common::renderers() {
        for action in [Action::custom("check"), Action::custom("check2")] {
            let response = RenderResponse::raw(json!({"arbitrary": "content"})).action(action);
            assert_eq!(
                app.render(&renderer, response, None),
                json!({"arbitrary": "content"})
            );
        }
    }
}

#[test]
fn test_unnamed_action_is_passed_through() {
    let app = TestApp::with_references();
    for renderer in common::renderers() {
        let response = app
            .detail("ParentSchema", "testapp.Parent", 2)
            .action(Action::Unnamed);
        assert_eq!(app.render(&renderer, response, Some("*")), parent2());
    }
}

#[test]
fn test_read_only_inclusions() {
    let app = TestApp::with_references();
    for renderer in common::renderers() {
        let body = app.render(
            &renderer,
            app.page("EntryReadOnlyTagsSchema", "testapp.Entry"),
            Some("tags"),
        );
        assert_eq!(
            body,
            json!({
                "count": 2,
                "previous": null,
                "next": null,
                "data": [
                    {"id": 1, "name": "A", "tags": [1]},
                    {"id": 2, "name": "B", "tags": [3]}
                ],
                "inclusions": {"testapp.Tag": tags(&[1, 3])}
            })
        );
    }
}

#[test]
fn test_nullable_relation() {
    use sideload::engine::memory::Record;

    let app = TestApp::with_references();
    app.insert(Record::new("testapp.A", 1));
    app.insert(Record::new("testapp.B", 1).null("a"));
    app.insert(Record::new("testapp.C", 1).null("b"));
    app.insert(Record::new("testapp.B", 2).reference("a", 1));
    app.insert(Record::new("testapp.C", 2).reference("b", 2));
    app.insert(Record::new("testapp.C", 3).reference("b", 1));

    for renderer in common::renderers() {
        let body = app.render(&renderer, app.page("CSchema", "testapp.C"), Some("b.a"));
        assert_eq!(
            body,
            json!({
                "count": 3,
                "previous": null,
                "next": null,
                "data": [
                    {"id": 1, "b": null},
                    {"id": 2, "b": {"id": 2, "a": 1}},
                    {"id": 3, "b": {"id": 1, "a": null}}
                ],
                "inclusions": {"testapp.A": [{"id": 1}]}
            })
        );
    }
}

#[test]
fn test_reverse_relation() {
    use sideload::engine::memory::Record;

    let app = TestApp::with_references();
    app.insert(Record::new("testapp.MainObject", 1).references("relatedobject_set", Vec::<i64>::new()));

    for renderer in common::renderers() {
        let body = app.render(
            &renderer,
            app.list("MainObjectSchema", "testapp.MainObject"),
            Some("*"),
        );
        assert_eq!(
            body,
            json!({"data": [{"id": 1, "relatedobject_set": []}], "inclusions": {}})
        );
    }
}
