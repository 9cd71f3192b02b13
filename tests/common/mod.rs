//! Shared test app for the integration tests.
//!
//! Mirrors a small relational app (companies, tags, parents and children,
//! containers with entries, chains of A/B/C and D/E) stored in a
//! [`MemoryStore`] and the schemas rendering it.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{Map, Value, json};
use sideload::prelude::*;
use sideload::engine::memory::{MemoryStore, Record, RecordSerializer};
use sideload::schema::{Field, InclusionStrategy, Reference, Schema, SchemaRef, SchemaRegistry};

pub type Object = Arc<Record>;

/// Both collection strategies, to run every scenario against each.
pub fn renderers() -> Vec<InclusionRenderer> {
    vec![
        InclusionRenderer::new().strategy(InclusionStrategy::Eager),
        InclusionRenderer::new().strategy(InclusionStrategy::Resolved),
    ]
}

fn schema(builder: sideload::schema::SchemaBuilder) -> Schema {
    builder.build().expect("valid test schema")
}

/// Register every schema of the test app.
pub fn registry() -> SchemaRegistry {
    let registry = SchemaRegistry::new();
    let named = SchemaRef::named;

    let schemas = vec![
        schema(Schema::builder("TagSchema", "testapp.Tag").scalars(["id", "name"])),
        schema(Schema::builder("CompanySchema", "testapp.Company").scalars(["id", "name"])),
        schema(
            Schema::builder("BasicSchema", "testapp.Basic")
                .scalars(["name"])
                .field(Field::reference("company", Reference::to("testapp.Company")))
                .include("company", named("CompanySchema")),
        ),
        schema(
            Schema::builder("BasicM2MSchema", "testapp.BasicM2M")
                .scalars(["name"])
                .field(Field::references("tags", Reference::to("testapp.Tag")))
                .include("tags", named("TagSchema")),
        ),
        schema(
            Schema::builder("ParentSchema", "testapp.Parent")
                .scalars(["id", "name"])
                .field(Field::references("tags", Reference::to("testapp.Tag")))
                .field(Field::reference("favourite_child", Reference::to("testapp.Child")))
                .include("tags", named("TagSchema")),
        ),
        schema(
            Schema::builder("ParentSchema2", "testapp.Parent")
                .scalars(["id"])
                .field(Field::reference("favourite_child", Reference::to("testapp.Child")))
                .include("favourite_child", named("ChildSchema3")),
        ),
        schema(
            Schema::builder("ChildPropsSchema", "testapp.ChildProps")
                .scalars(["id"])
                .field(Field::reference("child", Reference::to("testapp.Child"))),
        ),
        schema(
            Schema::builder("ChildSchema", "testapp.Child")
                .scalars(["id"])
                .field(Field::nested("parent", named("ParentSchema")))
                .scalars(["name"])
                .field(Field::reference(
                    "childprops",
                    Reference::to("testapp.ChildProps").read_only(),
                ))
                .field(Field::references("tags", Reference::to("testapp.Tag")))
                .include("childprops", named("ChildPropsSchema"))
                .include("tags", named("TagSchema")),
        ),
        schema(
            Schema::builder("ChildSchema2", "testapp.Child")
                .scalars(["id"])
                .field(Field::reference("parent", Reference::to("testapp.Parent")))
                .field(Field::references("tags", Reference::to("testapp.Tag")))
                .include("parent", named("ParentSchema"))
                .include("tags", named("TagSchema")),
        ),
        schema(
            Schema::builder("ChildSchema3", "testapp.Child")
                .scalars(["id"])
                .field(Field::reference("parent", Reference::to("testapp.Parent")))
                .include("parent", named("ParentSchema2")),
        ),
        schema(
            Schema::builder("ChildPropsSchema2", "testapp.ChildProps")
                .scalars(["id"])
                .field(Field::nested("child", named("ChildSchema2"))),
        ),
        schema(
            Schema::builder("EntrySchema", "testapp.Entry")
                .scalars(["id", "name"])
                .field(Field::references("tags", Reference::to("testapp.Tag")))
                .include("tags", named("TagSchema")),
        ),
        schema(
            Schema::builder("EntryReadOnlyTagsSchema", "testapp.Entry")
                .scalars(["id", "name"])
                .field(Field::references("tags", Reference::to("testapp.Tag").read_only()))
                .include("tags", named("TagSchema")),
        ),
        schema(
            Schema::builder("ContainerSchema", "testapp.Container")
                .scalars(["id", "name"])
                .field(Field::nested_many("entries", named("EntrySchema")).source("entry_set")),
        ),
        schema(Schema::builder("ASchema", "testapp.A").scalars(["id"])),
        schema(
            Schema::builder("BSchema", "testapp.B")
                .scalars(["id"])
                .field(Field::reference("a", Reference::to("testapp.A")))
                .include("a", named("ASchema")),
        ),
        schema(
            Schema::builder("CSchema", "testapp.C")
                .scalars(["id"])
                .field(Field::nested("b", named("BSchema"))),
        ),
        schema(
            Schema::builder("CInclusionSchema", "testapp.C")
                .scalars(["id"])
                .field(Field::reference("b", Reference::to("testapp.B")))
                .include("b", named("BSchema")),
        ),
        schema(
            Schema::builder("SecondLevelRelatedObjectSchema", "testapp.SecondLevelRelatedObject")
                .scalars(["id"]),
        ),
        schema(
            Schema::builder("RelatedObjectSchema", "testapp.RelatedObject")
                .scalars(["id"])
                .field(Field::reference("a", Reference::to("testapp.A")))
                .field(Field::nested_many(
                    "secondlevelrelatedobject_set",
                    named("SecondLevelRelatedObjectSchema"),
                ))
                .include("a", named("ASchema")),
        ),
        schema(
            Schema::builder("MainObjectSchema", "testapp.MainObject")
                .scalars(["id"])
                .field(Field::nested_many("relatedobject_set", named("RelatedObjectSchema"))),
        ),
        schema(
            Schema::builder("DSchema", "testapp.D")
                .scalars(["id"])
                .field(Field::references("tags1", Reference::to("testapp.Tag")))
                .field(Field::references("tags2", Reference::to("testapp.Tag")))
                .include("tags1", named("TagSchema"))
                .include("tags2", named("TagSchema")),
        ),
        schema(
            Schema::builder("ESchema", "testapp.E")
                .scalars(["id"])
                .field(Field::reference("d", Reference::to("testapp.D")))
                .include("d", named("DSchema")),
        ),
        schema(
            Schema::builder("ModelWithPropertySchema", "testapp.ModelWithProperty")
                .field(Field::nested_many("basics", named("BasicSchema")))
                .field(Field::nested_many("basics_list", named("BasicSchema")))
                .include("companies", named("CompanySchema")),
        ),
        schema(Schema::builder("SubSubSchema", "testapp.SubSub").scalars(["name"])),
        schema(
            Schema::builder("SubSchema", "testapp.Sub")
                .scalars(["name"])
                .field(Field::reference("company", Reference::to("testapp.Company")))
                .field(Field::nested("sub_sub", named("SubSubSchema")))
                .include("company", named("CompanySchema")),
        ),
        schema(
            Schema::builder("ModelWithOptionalSubSchema", "testapp.ModelWithOptionalSub")
                .field(Field::nested("sub", named("SubSchema"))),
        ),
    ];

    for schema in schemas {
        registry.register(schema).expect("unique schema names");
    }
    registry
}

/// A test app: schemas plus the records of one test.
pub struct TestApp {
    pub registry: SchemaRegistry,
    pub store: MemoryStore,
}

impl TestApp {
    /// An app without records.
    pub fn empty() -> Self {
        Self {
            registry: registry(),
            store: MemoryStore::new(),
        }
    }

    /// The tags, parents, children and containers most reference tests use.
    ///
    /// - tags 1 `you`, 2 `are`, 3 `it`
    /// - parent 1 `Papa Johns` tagged 1, 2 whose favourite child is child 2
    /// - parent 2 `Papa Roach` tagged 2
    /// - child 1 `Children of Bodom` tagged 3, child 2 `Children of Men`
    /// - child props 1 of child 2
    /// - container 1 with entry 1 `A` tagged 1 and entry 2 `B` tagged 3
    pub fn with_references() -> Self {
        let app = Self::empty();
        let store = &app.store;
        store.insert(Record::new("testapp.Tag", 1).value("name", "you"));
        store.insert(Record::new("testapp.Tag", 2).value("name", "are"));
        store.insert(Record::new("testapp.Tag", 3).value("name", "it"));

        store.insert(
            Record::new("testapp.Parent", 1)
                .value("name", "Papa Johns")
                .references("tags", [1, 2])
                .reference("favourite_child", 2),
        );
        store.insert(
            Record::new("testapp.Parent", 2)
                .value("name", "Papa Roach")
                .references("tags", [2])
                .null("favourite_child"),
        );

        store.insert(
            Record::new("testapp.Child", 1)
                .value("name", "Children of Bodom")
                .reference("parent", 1)
                .null("childprops")
                .references("tags", [3]),
        );
        store.insert(
            Record::new("testapp.Child", 2)
                .value("name", "Children of Men")
                .reference("parent", 1)
                .reference("childprops", 1)
                .references("tags", Vec::<i64>::new()),
        );
        store.insert(Record::new("testapp.ChildProps", 1).reference("child", 2));

        store.insert(
            Record::new("testapp.Container", 1)
                .value("name", "container 1")
                .references("entry_set", [1, 2]),
        );
        store.insert(Record::new("testapp.Entry", 1).value("name", "A").references("tags", [1]));
        store.insert(Record::new("testapp.Entry", 2).value("name", "B").references("tags", [3]));
        app
    }

    /// Insert a record.
    pub fn insert(&self, record: Record) -> Object {
        self.store.insert(record)
    }

    /// Get a registered schema.
    pub fn schema(&self, name: &str) -> Arc<Schema> {
        self.registry.get(name).expect("registered schema")
    }

    /// Get a stored record.
    pub fn object(&self, entity: &str, pk: i64) -> Object {
        self.store
            .get(entity, &pk.into())
            .unwrap_or_else(|| panic!("no {} {}", entity, pk))
    }

    /// A detail response.
    pub fn detail(&self, schema: &str, entity: &str, pk: i64) -> RenderResponse<Object> {
        RenderResponse::serialized(self.schema(schema), Instance::One(self.object(entity, pk)))
            .action(Action::standard("retrieve"))
    }

    /// An unpaginated list response of every record of `entity`.
    pub fn list(&self, schema: &str, entity: &str) -> RenderResponse<Object> {
        RenderResponse::serialized(self.schema(schema), Instance::Many(self.store.all(entity)))
            .action(Action::standard("list"))
    }

    /// A single page holding every record of `entity`.
    pub fn page(&self, schema: &str, entity: &str) -> RenderResponse<Object> {
        let objects = self.store.all(entity);
        let mut page = Map::new();
        page.insert("count".to_string(), json!(objects.len()));
        page.insert("next".to_string(), Value::Null);
        page.insert("previous".to_string(), Value::Null);
        RenderResponse::paginated(self.schema(schema), objects, page)
            .action(Action::standard("list"))
    }

    /// Render a response with the given `include` parameter.
    pub fn try_render(
        &self,
        renderer: &InclusionRenderer,
        response: RenderResponse<Object>,
        include: Option<&str>,
    ) -> InclusionResult<Value> {
        let serializer = RecordSerializer::new(&self.store, &self.registry);
        let ctx = Context::new(&self.registry, &self.store, &serializer);
        renderer.render(ctx, &IncludeRequest::parse(include), response)
    }

    /// Render a response, panicking on errors.
    pub fn render(
        &self,
        renderer: &InclusionRenderer,
        response: RenderResponse<Object>,
        include: Option<&str>,
    ) -> Value {
        self.try_render(renderer, response, include)
            .expect("render succeeds")
    }
}
