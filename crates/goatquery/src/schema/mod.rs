//! Record schema description.
//!
//! Queries address record fields by their external (wire) names. Rust has no
//! runtime reflection, so each record type describes itself through the
//! [`Entity`] trait: a static [`EntityType`] listing its fields and their
//! [`FieldKind`]s, and a [`Fields`] accessor returning a field's runtime
//! [`Value`] by internal name.
//!
//! # Example
//!
//! ```
//! use goatquery_rs::schema::{Entity, EntityType, FieldKind, Fields, ScalarKind, Value};
//!
//! struct Company {
//!     name: String,
//! }
//!
//! struct Person {
//!     first_name: String,
//!     age: i32,
//!     employer: Option<Company>,
//! }
//!
//! impl Fields for Company {
//!     fn field(&self, name: &str) -> Option<Value<'_>> {
//!         match name {
//!             "Name" => Some(Value::from(&self.name)),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! impl Entity for Company {
//!     fn entity_type() -> EntityType {
//!         EntityType::new("Company").field("Name", ScalarKind::String)
//!     }
//! }
//!
//! impl Fields for Person {
//!     fn field(&self, name: &str) -> Option<Value<'_>> {
//!         match name {
//!             "FirstName" => Some(Value::from(&self.first_name)),
//!             "Age" => Some(Value::from(self.age)),
//!             "Employer" => Some(Value::optional_entity(self.employer.as_ref())),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! impl Entity for Person {
//!     fn entity_type() -> EntityType {
//!         EntityType::new("Person")
//!             .renamed_field("FirstName", "first_name", ScalarKind::String)
//!             .field("Age", ScalarKind::I32)
//!             .field("Employer", FieldKind::optional(FieldKind::entity::<Company>()))
//!     }
//! }
//! ```

pub mod mapping;
mod value;

use std::any::TypeId;
use std::fmt;

pub use mapping::{PropertyMappingNode, PropertyMappingTree};
pub use value::Value;

/// Runtime access to a record's fields by internal name.
///
/// Returns `None` when the record has no field with that name. A field that
/// exists but holds no value returns `Some(Value::Null)`.
pub trait Fields {
    /// Returns the value of the field with the given internal name.
    fn field(&self, name: &str) -> Option<Value<'_>>;
}

/// A record type that can be queried.
pub trait Entity: Fields + 'static {
    /// Describes the fields of this record type.
    fn entity_type() -> EntityType;
}

/// The type of a primitive field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    /// `bool`
    Bool,
    /// `i8`
    I8,
    /// `i16`
    I16,
    /// `i32`
    I32,
    /// `i64`
    I64,
    /// `u8`
    U8,
    /// `u16`
    U16,
    /// `u32`
    U32,
    /// `u64`
    U64,
    /// `f32`
    F32,
    /// `f64`
    F64,
    /// [`rust_decimal::Decimal`]
    Decimal,
    /// Text
    String,
    /// [`uuid::Uuid`]
    Guid,
    /// [`chrono::DateTime<Utc>`](chrono::DateTime)
    DateTime,
    /// [`chrono::NaiveDate`]
    Date,
    /// A fieldless enum, identified by its variant names.
    Enum(&'static [&'static str]),
}

impl ScalarKind {
    /// Returns true for the integer kinds.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ScalarKind::I8
                | ScalarKind::I16
                | ScalarKind::I32
                | ScalarKind::I64
                | ScalarKind::U8
                | ScalarKind::U16
                | ScalarKind::U32
                | ScalarKind::U64
        )
    }

    /// Returns the display name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::I8 => "i8",
            ScalarKind::I16 => "i16",
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::U8 => "u8",
            ScalarKind::U16 => "u16",
            ScalarKind::U32 => "u32",
            ScalarKind::U64 => "u64",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
            ScalarKind::Decimal => "decimal",
            ScalarKind::String => "string",
            ScalarKind::Guid => "guid",
            ScalarKind::DateTime => "datetime",
            ScalarKind::Date => "date",
            ScalarKind::Enum(_) => "enum",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A reference to a nested record type.
#[derive(Debug, Clone, Copy)]
pub struct EntityRef {
    name: &'static str,
    type_id: TypeId,
    describe: fn() -> EntityType,
}

impl EntityRef {
    /// Creates a reference to the record type `T`.
    pub fn of<T: Entity>() -> Self {
        Self {
            name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
            describe: T::entity_type,
        }
    }

    /// Returns the Rust type name of the referenced record type.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the identity of the referenced record type.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Describes the referenced record type.
    pub fn describe(&self) -> EntityType {
        (self.describe)()
    }
}

impl PartialEq for EntityRef {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for EntityRef {}

/// The type of a record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// A primitive value.
    Scalar(ScalarKind),
    /// A value that may be absent.
    Optional(Box<FieldKind>),
    /// A nested record.
    Entity(EntityRef),
    /// A value of an opaque or abstract type. Never navigated.
    Abstract(&'static str),
    /// A sequence of elements of the inner kind.
    Collection(Box<FieldKind>),
}

impl FieldKind {
    /// Creates an optional field kind.
    pub fn optional(inner: impl Into<FieldKind>) -> Self {
        FieldKind::Optional(Box::new(inner.into()))
    }

    /// Creates a collection field kind.
    pub fn collection(element: impl Into<FieldKind>) -> Self {
        FieldKind::Collection(Box::new(element.into()))
    }

    /// Creates a nested record field kind.
    pub fn entity<T: Entity>() -> Self {
        FieldKind::Entity(EntityRef::of::<T>())
    }

    /// Returns true if the field may hold no value.
    pub fn is_nullable(&self) -> bool {
        matches!(self, FieldKind::Optional(_))
    }

    /// Returns the kind with any optional wrapper removed.
    pub fn unwrap_optional(&self) -> &FieldKind {
        match self {
            FieldKind::Optional(inner) => inner.unwrap_optional(),
            other => other,
        }
    }

    /// Returns the scalar kind, looking through optional wrappers.
    pub fn scalar(&self) -> Option<ScalarKind> {
        match self.unwrap_optional() {
            FieldKind::Scalar(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Returns the element kind if this field is a collection.
    pub fn element(&self) -> Option<&FieldKind> {
        match self.unwrap_optional() {
            FieldKind::Collection(element) => Some(element),
            _ => None,
        }
    }

    /// Returns the nested record type, looking through optional wrappers.
    pub fn entity_ref(&self) -> Option<EntityRef> {
        match self.unwrap_optional() {
            FieldKind::Entity(entity) => Some(*entity),
            _ => None,
        }
    }

    /// Returns true if the field holds a primitive value.
    pub fn is_primitive(&self) -> bool {
        self.scalar().is_some()
    }
}

impl From<ScalarKind> for FieldKind {
    fn from(kind: ScalarKind) -> Self {
        FieldKind::Scalar(kind)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Scalar(kind) => write!(f, "{}", kind),
            FieldKind::Optional(inner) => write!(f, "{}?", inner),
            FieldKind::Entity(entity) => f.write_str(entity.name()),
            FieldKind::Abstract(name) => f.write_str(name),
            FieldKind::Collection(element) => write!(f, "[{}]", element),
        }
    }
}

/// Description of one record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// The internal field name passed to [`Fields::field`].
    pub name: &'static str,
    /// The external name, when it differs from the internal one.
    pub rename: Option<&'static str>,
    /// The field type.
    pub kind: FieldKind,
}

impl FieldDef {
    /// Returns the name queries use for this field.
    pub fn wire_name(&self) -> &'static str {
        self.rename.unwrap_or(self.name)
    }
}

/// Description of a record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityType {
    name: &'static str,
    fields: Vec<FieldDef>,
}

impl EntityType {
    /// Creates a record type description with no fields.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    /// Adds a field queried by its own name.
    pub fn field(mut self, name: &'static str, kind: impl Into<FieldKind>) -> Self {
        self.fields.push(FieldDef {
            name,
            rename: None,
            kind: kind.into(),
        });
        self
    }

    /// Adds a field queried by an explicit external name.
    pub fn renamed_field(
        mut self,
        name: &'static str,
        wire_name: &'static str,
        kind: impl Into<FieldKind>,
    ) -> Self {
        self.fields.push(FieldDef {
            name,
            rename: Some(wire_name),
            kind: kind.into(),
        });
        self
    }

    /// Returns the record type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the field descriptions in declaration order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Node;

    impl Fields for Node {
        fn field(&self, _name: &str) -> Option<Value<'_>> {
            None
        }
    }

    impl Entity for Node {
        fn entity_type() -> EntityType {
            EntityType::new("Node")
                .field("Parent", FieldKind::optional(FieldKind::entity::<Node>()))
                .renamed_field("Label", "label_text", ScalarKind::String)
        }
    }

    #[test]
    fn test_wire_name_prefers_rename() {
        let ty = Node::entity_type();
        assert_eq!(ty.fields()[0].wire_name(), "Parent");
        assert_eq!(ty.fields()[1].wire_name(), "label_text");
        assert_eq!(ty.fields()[1].name, "Label");
    }

    #[test]
    fn test_field_kind_helpers() {
        let kind = FieldKind::optional(FieldKind::collection(ScalarKind::String));
        assert!(kind.is_nullable());
        assert_eq!(
            kind.element(),
            Some(&FieldKind::Scalar(ScalarKind::String))
        );
        assert_eq!(kind.scalar(), None);

        let kind = FieldKind::optional(ScalarKind::Decimal);
        assert_eq!(kind.scalar(), Some(ScalarKind::Decimal));
        assert!(kind.is_primitive());
    }

    #[test]
    fn test_entity_ref_identity() {
        let a = EntityRef::of::<Node>();
        let b = FieldKind::entity::<Node>().entity_ref().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.describe().name(), "Node");
    }

    #[test]
    fn test_field_kind_display() {
        assert_eq!(FieldKind::optional(ScalarKind::I32).to_string(), "i32?");
        assert_eq!(
            FieldKind::collection(ScalarKind::String).to_string(),
            "[string]"
        );
    }
}
