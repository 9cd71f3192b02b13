//! Identity types shared by schemas and the inclusion engine.

use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;

/// Stable key naming the backing type of an entity, e.g. `"app.Company"`.
///
/// The same backing type must use the same key in every schema that can emit
/// it as an inclusion; it is the key of the `inclusions` mapping in responses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityType(SmolStr);

impl EntityType {
    /// Create a new entity type key.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self(name.into())
    }

    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The namespace part (`app` in `app.Company`), if any.
    pub fn namespace(&self) -> Option<&str> {
        self.0.rsplit_once('.').map(|(ns, _)| ns)
    }

    /// The type name part (`Company` in `app.Company`).
    pub fn type_name(&self) -> &str {
        self.0.rsplit_once('.').map_or(self.as_str(), |(_, name)| name)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for EntityType {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl AsRef<str> for EntityType {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for EntityType {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

/// Primary key of an entity.
///
/// Integer keys sort before string keys; within a kind the natural order
/// applies. Unsigned keys only hold values above `i64::MAX` (build them with
/// `Pk::from(u64)`), so every integer key has exactly one representation and
/// integers keep their numeric order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Pk {
    /// Integer key.
    Int(i64),
    /// Integer key above `i64::MAX` (snowflake-style ids).
    UInt(u64),
    /// String key (UUIDs, slugs, urls).
    Str(SmolStr),
}

impl Pk {
    /// Read a key from a rendered JSON value.
    ///
    /// Returns `None` for anything that is not an integer or a string,
    /// including `null`; callers decide whether that is an absent relation or
    /// a type confusion.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_u64().map(Self::UInt)),
            Value::String(s) => Some(Self::Str(SmolStr::new(s))),
            _ => None,
        }
    }

    /// Render the key as JSON.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Int(i) => Value::from(*i),
            Self::UInt(u) => Value::from(*u),
            Self::Str(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for Pk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{}", i),
            Self::UInt(u) => write!(f, "{}", u),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Pk {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Pk {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u64> for Pk {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or(Self::UInt(value), Self::Int)
    }
}

impl From<&str> for Pk {
    fn from(value: &str) -> Self {
        Self::Str(SmolStr::new(value))
    }
}

impl From<String> for Pk {
    fn from(value: String) -> Self {
        Self::Str(SmolStr::from(value))
    }
}

/// Ordered set of primary keys. Ordering keeps fetches deterministic.
pub type PkSet = BTreeSet<Pk>;

/// Handle for the collection a reference fetches its objects from.
///
/// Two references with equal sources read the same rows, which is what makes
/// their inclusions mergeable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataSource {
    /// Entity type stored in the source.
    pub entity: EntityType,
    /// Named subset of the entity's rows, `None` for the default collection.
    pub scope: Option<SmolStr>,
}

impl DataSource {
    /// The default collection of an entity type.
    pub fn default_for(entity: impl Into<EntityType>) -> Self {
        Self {
            entity: entity.into(),
            scope: None,
        }
    }

    /// A named subset of an entity type's rows.
    pub fn scoped(entity: impl Into<EntityType>, scope: impl Into<SmolStr>) -> Self {
        Self {
            entity: entity.into(),
            scope: Some(scope.into()),
        }
    }

    /// Check if this is the default collection.
    pub fn is_default(&self) -> bool {
        self.scope.is_none()
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "{}[{}]", self.entity, scope),
            None => write!(f, "{}", self.entity),
        }
    }
}
