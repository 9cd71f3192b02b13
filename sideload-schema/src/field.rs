//! Field definitions of a serializer schema.

use std::sync::Arc;

use smol_str::SmolStr;

use crate::schema::Schema;
use crate::types::{DataSource, EntityType};

/// A reference to a schema, either held directly or looked up by name.
///
/// Named references let a schema point at one that is registered later,
/// which is the only way to express cyclic schema graphs.
#[derive(Debug, Clone)]
pub enum SchemaRef {
    /// The schema itself.
    Inline(Arc<Schema>),
    /// Name of a schema in the [`SchemaRegistry`](crate::SchemaRegistry).
    Named(SmolStr),
}

impl SchemaRef {
    /// Reference a registered schema by name.
    pub fn named(name: impl Into<SmolStr>) -> Self {
        Self::Named(name.into())
    }

    /// Name of the referenced schema.
    pub fn name(&self) -> &str {
        match self {
            Self::Inline(schema) => schema.name(),
            Self::Named(name) => name,
        }
    }
}

impl From<Arc<Schema>> for SchemaRef {
    fn from(schema: Arc<Schema>) -> Self {
        Self::Inline(schema)
    }
}

impl From<Schema> for SchemaRef {
    fn from(schema: Schema) -> Self {
        Self::Inline(Arc::new(schema))
    }
}

impl From<&Arc<Schema>> for SchemaRef {
    fn from(schema: &Arc<Schema>) -> Self {
        Self::Inline(Arc::clone(schema))
    }
}

/// A primary-key style reference to another entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Entity type the reference points at.
    pub target: EntityType,
    /// Collection the related objects are read from. `None` for read-only
    /// references, which fall back to the default collection of whatever
    /// schema renders the inclusion.
    pub source: Option<DataSource>,
}

impl Reference {
    /// Reference the default collection of `target`.
    pub fn to(target: impl Into<EntityType>) -> Self {
        let target = target.into();
        Self {
            source: Some(DataSource::default_for(target.clone())),
            target,
        }
    }

    /// Read the related objects from a named subset of the target's rows.
    pub fn scoped(mut self, scope: impl Into<SmolStr>) -> Self {
        self.source = Some(DataSource::scoped(self.target.clone(), scope));
        self
    }

    /// Mark the reference read-only: it carries no collection of its own.
    pub fn read_only(mut self) -> Self {
        self.source = None;
        self
    }
}

/// A sub-schema embedded inline in its parent's output.
#[derive(Debug, Clone)]
pub struct Nested {
    /// Schema rendering the embedded object(s).
    pub schema: SchemaRef,
    /// Whether the field holds a list of objects.
    pub many: bool,
}

/// The closed set of field kinds the inclusion engine understands.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Plain value: numbers, strings, dates. Never included.
    Scalar,
    /// Identifier of one related object (or null).
    SingleReference(Reference),
    /// Identifiers of several related objects.
    MultiReference(Reference),
    /// Related data rendered inline by a sub-schema.
    Nested(Nested),
}

impl FieldKind {
    /// Check if this is a reference field.
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::SingleReference(_) | Self::MultiReference(_))
    }

    /// Get the reference, if this is a reference field.
    pub fn reference(&self) -> Option<&Reference> {
        match self {
            Self::SingleReference(r) | Self::MultiReference(r) => Some(r),
            Self::Scalar | Self::Nested(_) => None,
        }
    }
}

/// A declared field of a schema.
#[derive(Debug, Clone)]
pub struct Field {
    /// Output key.
    pub name: SmolStr,
    /// Attribute read from the object, usually the same as `name`.
    pub attribute: SmolStr,
    /// What kind of value the field renders.
    pub kind: FieldKind,
}

impl Field {
    fn new(name: impl Into<SmolStr>, kind: FieldKind) -> Self {
        let name = name.into();
        Self {
            attribute: name.clone(),
            name,
            kind,
        }
    }

    /// A scalar field.
    pub fn scalar(name: impl Into<SmolStr>) -> Self {
        Self::new(name, FieldKind::Scalar)
    }

    /// A single-valued reference field.
    pub fn reference(name: impl Into<SmolStr>, reference: Reference) -> Self {
        Self::new(name, FieldKind::SingleReference(reference))
    }

    /// A multi-valued reference field.
    pub fn references(name: impl Into<SmolStr>, reference: Reference) -> Self {
        Self::new(name, FieldKind::MultiReference(reference))
    }

    /// A nested sub-schema holding one object.
    pub fn nested(name: impl Into<SmolStr>, schema: impl Into<SchemaRef>) -> Self {
        Self::new(
            name,
            FieldKind::Nested(Nested {
                schema: schema.into(),
                many: false,
            }),
        )
    }

    /// A nested sub-schema holding a list of objects.
    pub fn nested_many(name: impl Into<SmolStr>, schema: impl Into<SchemaRef>) -> Self {
        Self::new(
            name,
            FieldKind::Nested(Nested {
                schema: schema.into(),
                many: true,
            }),
        )
    }

    /// Read the value from a differently named attribute.
    pub fn source(mut self, attribute: impl Into<SmolStr>) -> Self {
        self.attribute = attribute.into();
        self
    }

    /// Get the field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if this field holds several values.
    pub fn is_many(&self) -> bool {
        match &self.kind {
            FieldKind::MultiReference(_) => true,
            FieldKind::Nested(nested) => nested.many,
            FieldKind::Scalar | FieldKind::SingleReference(_) => false,
        }
    }
}
