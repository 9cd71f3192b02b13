//! Serializer schema definitions.

use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::debug;

use crate::error::{SchemaError, SchemaResult};
use crate::field::{Field, FieldKind, SchemaRef};
use crate::types::{DataSource, EntityType};

/// A serializer schema: the ordered output fields for one entity type, plus
/// the fields whose related objects may be included in responses.
#[derive(Debug, Clone)]
pub struct Schema {
    name: SmolStr,
    entity: EntityType,
    fields: IndexMap<SmolStr, Field>,
    inclusions: IndexMap<SmolStr, SchemaRef>,
}

impl Schema {
    /// Start building a schema.
    ///
    /// `name` identifies the schema (two schemas rendering the same entity
    /// differently have different names); `entity` is the backing type.
    pub fn builder(name: impl Into<SmolStr>, entity: impl Into<EntityType>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            entity: entity.into(),
            fields: Vec::new(),
            inclusions: Vec::new(),
        }
    }

    /// Get the schema name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the backing entity type.
    pub fn entity(&self) -> &EntityType {
        &self.entity
    }

    /// Default collection of the backing entity type.
    pub fn default_source(&self) -> DataSource {
        DataSource::default_for(self.entity.clone())
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(SmolStr::as_str)
    }

    /// Get a field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Get the schema used to include the objects referenced by `field`.
    pub fn inclusion(&self, field: &str) -> Option<&SchemaRef> {
        self.inclusions.get(field)
    }

    /// Check if this schema itself declares any inclusions.
    pub fn has_inclusions(&self) -> bool {
        !self.inclusions.is_empty()
    }
}

/// Builder for [`Schema`].
#[derive(Debug)]
pub struct SchemaBuilder {
    name: SmolStr,
    entity: EntityType,
    fields: Vec<Field>,
    inclusions: Vec<(SmolStr, SchemaRef)>,
}

impl SchemaBuilder {
    /// Add a field.
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Add several scalar fields.
    pub fn scalars<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.fields.extend(names.into_iter().map(Field::scalar));
        self
    }

    /// Declare that objects referenced by `field` can be included, rendered
    /// with `schema`.
    pub fn include(mut self, field: impl Into<SmolStr>, schema: impl Into<SchemaRef>) -> Self {
        self.inclusions.push((field.into(), schema.into()));
        self
    }

    /// Validate and build the schema.
    pub fn build(self) -> SchemaResult<Schema> {
        let mut fields = IndexMap::with_capacity(self.fields.len());
        for field in self.fields {
            if fields.contains_key(&field.name) {
                return Err(SchemaError::DuplicateField {
                    schema: self.name.to_string(),
                    field: field.name.to_string(),
                });
            }
            fields.insert(field.name.clone(), field);
        }

        let mut inclusions = IndexMap::with_capacity(self.inclusions.len());
        for (name, target) in self.inclusions {
            match fields.get(&name).map(|f| &f.kind) {
                Some(FieldKind::SingleReference(_) | FieldKind::MultiReference(_)) => {}
                Some(FieldKind::Scalar) => {
                    return Err(SchemaError::invalid_inclusion(
                        self.name.as_str(),
                        name.as_str(),
                        "only reference fields can be included",
                    ));
                }
                Some(FieldKind::Nested(_)) => {
                    return Err(SchemaError::invalid_inclusion(
                        self.name.as_str(),
                        name.as_str(),
                        "nested fields already embed their data",
                    ));
                }
                None => {
                    debug!(schema = %self.name, field = %name, "Inclusion declared for undeclared field");
                }
            }
            inclusions.insert(name, target);
        }

        Ok(Schema {
            name: self.name,
            entity: self.entity,
            fields,
            inclusions,
        })
    }
}
