//! Shared test app for the inclusion unit tests.

use sideload_schema::{Field, Reference, Schema, SchemaRef, SchemaRegistry};

use crate::memory::{MemoryStore, Record};

pub(crate) fn registry() -> SchemaRegistry {
    let registry = SchemaRegistry::new();
    registry.register_with("TagSchema", || {
        Schema::builder("TagSchema", "app.Tag").scalars(["id", "name"]).build()
    });
    registry.register_with("ParentSchema", || {
        Schema::builder("ParentSchema", "app.Parent")
            .scalars(["id", "name"])
            .field(Field::references("tags", Reference::to("app.Tag")))
            .field(Field::reference("favourite_child", Reference::to("app.Child")))
            .include("tags", SchemaRef::named("TagSchema"))
            .build()
    });
    registry.register_with("ChildPropsSchema", || {
        Schema::builder("ChildPropsSchema", "app.ChildProps")
            .scalars(["id"])
            .field(Field::reference("child", Reference::to("app.Child")))
            .build()
    });
    registry.register_with("ChildSchema", || {
        Schema::builder("ChildSchema", "app.Child")
            .scalars(["id"])
            .field(Field::nested("parent", SchemaRef::named("ParentSchema")))
            .scalars(["name"])
            .field(Field::reference("childprops", Reference::to("app.ChildProps").read_only()))
            .field(Field::references("tags", Reference::to("app.Tag")))
            .include("childprops", SchemaRef::named("ChildPropsSchema"))
            .include("tags", SchemaRef::named("TagSchema"))
            .build()
    });
    registry.register_with("ChildSchema2", || {
        Schema::builder("ChildSchema2", "app.Child")
            .scalars(["id"])
            .field(Field::reference("parent", Reference::to("app.Parent")))
            .field(Field::references("tags", Reference::to("app.Tag")))
            .include("parent", SchemaRef::named("ParentSchema"))
            .include("tags", SchemaRef::named("TagSchema"))
            .build()
    });
    registry.register_with("ParentSchema2", || {
        Schema::builder("ParentSchema2", "app.Parent")
            .scalars(["id"])
            .field(Field::reference("favourite_child", Reference::to("app.Child")))
            .include("favourite_child", SchemaRef::named("ChildSchema3"))
            .build()
    });
    registry.register_with("ChildSchema3", || {
        Schema::builder("ChildSchema3", "app.Child")
            .scalars(["id"])
            .field(Field::reference("parent", Reference::to("app.Parent")))
            .include("parent", SchemaRef::named("ParentSchema2"))
            .build()
    });
    registry
}

/// Tags 1..=3, one parent tagged 1 and 2, two children of that parent.
pub(crate) fn store() -> MemoryStore {
    let store = MemoryStore::new();
    store.insert(Record::new("app.Tag", 1).value("name", "you"));
    store.insert(Record::new("app.Tag", 2).value("name", "are"));
    store.insert(Record::new("app.Tag", 3).value("name", "it"));
    store.insert(
        Record::new("app.Parent", 1)
            .value("name", "Papa Johns")
            .references("tags", [1, 2])
            .reference("favourite_child", 1),
    );
    store.insert(
        Record::new("app.Child", 1)
            .value("name", "Children of Bodom")
            .reference("parent", 1)
            .reference("childprops", 1)
            .references("tags", [3]),
    );
    store.insert(
        Record::new("app.Child", 2)
            .value("name", "Little Big Town")
            .reference("parent", 1)
            .null("childprops")
            .references("tags", [1]),
    );
    store.insert(Record::new("app.ChildProps", 1).reference("child", 1));
    store
}
