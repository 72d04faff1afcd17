//! Case-insensitive map from wire names to field descriptions.
//!
//! A [`PropertyMappingTree`] is built once per record type and describes every
//! field reachable from it, nesting into record-typed fields and collection
//! element types. Self-referential types (a user whose manager is a user) are
//! cut off once a type occurs `max_depth` times along one navigation path.

use std::any::TypeId;
use std::collections::BTreeMap;

use tracing::trace;

use super::{Entity, EntityRef, EntityType, FieldDef, FieldKind};
use crate::error::{QueryError, QueryOutcome};

/// Default limit on how often a type may recur along one navigation path.
pub const DEFAULT_MAX_PROPERTY_MAPPING_DEPTH: usize = 5;

/// Navigable description of a record type's fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyMappingTree {
    source: &'static str,
    properties: BTreeMap<String, PropertyMappingNode>,
}

/// Description of one field within a [`PropertyMappingTree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyMappingNode {
    wire_name: &'static str,
    field_name: &'static str,
    kind: FieldKind,
    element_kind: Option<FieldKind>,
    nested: Option<PropertyMappingTree>,
}

impl PropertyMappingTree {
    /// Builds the tree for record type `T`.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidOptions` if `max_depth` is zero.
    pub fn build<T: Entity>(max_depth: usize) -> QueryOutcome<Self> {
        Self::build_for(EntityRef::of::<T>(), max_depth)
    }

    /// Builds the tree for the referenced record type.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidOptions` if `max_depth` is zero.
    pub fn build_for(entity: EntityRef, max_depth: usize) -> QueryOutcome<Self> {
        if max_depth == 0 {
            return Err(QueryError::InvalidOptions(
                "max property mapping depth must be greater than 0".to_string(),
            ));
        }

        trace!(entity = entity.name(), max_depth, "building property mapping tree");
        let mut type_path = Vec::new();
        Ok(Self::build_internal(
            &entity.describe(),
            entity.type_id(),
            max_depth,
            0,
            &mut type_path,
        ))
    }

    fn build_internal(
        entity_type: &EntityType,
        type_id: TypeId,
        max_depth: usize,
        current_depth: usize,
        type_path: &mut Vec<TypeId>,
    ) -> Self {
        let mut tree = Self {
            source: entity_type.name(),
            properties: BTreeMap::new(),
        };

        if current_depth >= max_depth {
            return tree;
        }

        type_path.push(type_id);
        for field in entity_type.fields() {
            let node = PropertyMappingNode::from_field(field, max_depth, current_depth, type_path);
            tree.properties.insert(node.wire_name.to_lowercase(), node);
        }
        type_path.pop();

        tree
    }

    /// Looks up a field by wire name, ignoring case.
    pub fn try_get(&self, name: &str) -> Option<&PropertyMappingNode> {
        if name.is_empty() {
            return None;
        }
        self.properties.get(&name.to_lowercase())
    }

    /// Returns the name of the record type this tree describes.
    pub fn source(&self) -> &'static str {
        self.source
    }

    /// Returns the wire names of all fields, ordered case-insensitively.
    pub fn wire_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.properties.values().map(|node| node.wire_name)
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Returns true if the tree has no fields.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl PropertyMappingNode {
    fn from_field(
        field: &FieldDef,
        max_depth: usize,
        current_depth: usize,
        type_path: &mut Vec<TypeId>,
    ) -> Self {
        let element_kind = field.kind.element().cloned();
        let target = element_kind.as_ref().unwrap_or(&field.kind);

        let nested = target.entity_ref().and_then(|entity| {
            let occurrences = type_path.iter().filter(|id| **id == entity.type_id()).count();
            if occurrences >= max_depth {
                return None;
            }
            Some(PropertyMappingTree::build_internal(
                &entity.describe(),
                entity.type_id(),
                max_depth,
                current_depth + 1,
                type_path,
            ))
        });

        Self {
            wire_name: field.wire_name(),
            field_name: field.name,
            kind: field.kind.clone(),
            element_kind,
            nested,
        }
    }

    /// Returns the external name queries use.
    pub fn wire_name(&self) -> &'static str {
        self.wire_name
    }

    /// Returns the internal field name.
    pub fn field_name(&self) -> &'static str {
        self.field_name
    }

    /// Returns the field type.
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Returns true if the field is a collection.
    pub fn is_collection(&self) -> bool {
        self.element_kind.is_some()
    }

    /// Returns the element type of a collection field.
    pub fn element_kind(&self) -> Option<&FieldKind> {
        self.element_kind.as_ref()
    }

    /// Returns the nested tree of a record-typed field or collection element.
    pub fn nested(&self) -> Option<&PropertyMappingTree> {
        self.nested.as_ref()
    }

    /// Returns true if the field has a nested tree.
    pub fn has_nested_mapping(&self) -> bool {
        self.nested.is_some()
    }
}
