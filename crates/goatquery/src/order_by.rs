//! Multi-key sorting from order-by expressions.

use std::cmp::Ordering;
use std::fmt;

use tracing::trace;

use crate::error::{QueryError, QueryOutcome};
use crate::filter::evaluator::walk;
use crate::filter::{Accessor, OrderByStatement, OrderDirection, QueryParser};
use crate::schema::{Fields, PropertyMappingTree};

/// One resolved sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    accessor: Accessor,
    direction: OrderDirection,
}

impl SortKey {
    /// Returns the accessor for the key value.
    pub fn accessor(&self) -> &Accessor {
        &self.accessor
    }

    /// Returns the sort direction.
    pub fn direction(&self) -> OrderDirection {
        self.direction
    }

    fn compare(&self, a: &dyn Fields, b: &dyn Fields) -> Ordering {
        let ordering = self.accessor.read(a).sort_cmp(&self.accessor.read(b));
        match self.direction {
            OrderDirection::Ascending => ordering,
            OrderDirection::Descending => ordering.reverse(),
        }
    }
}

/// A composite sort: primary key first, later keys break ties.
///
/// Null values (including those behind a missing nested record) sort
/// before any other value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderBy {
    keys: Vec<SortKey>,
}

impl OrderBy {
    /// Parses and resolves an order-by expression.
    ///
    /// # Errors
    ///
    /// Returns an error if the expression is malformed or names a field
    /// that does not exist or cannot be ordered.
    pub fn parse(input: &str, tree: &PropertyMappingTree) -> QueryOutcome<Self> {
        let statements = QueryParser::parse_order_by(input)?;
        Self::compile(&statements, tree)
    }

    /// Resolves parsed order-by terms against the schema.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::UnknownProperty` for a name that does not resolve
    /// and `QueryError::Unsortable` for a record or collection property.
    pub fn compile(
        statements: &[OrderByStatement],
        tree: &PropertyMappingTree,
    ) -> QueryOutcome<Self> {
        let keys = statements
            .iter()
            .map(|statement| {
                let segments = statement.path.segments();
                let resolved = walk(tree, 0, segments, statement.path.to_string())?;
                if !resolved.kind.is_primitive() {
                    return Err(QueryError::Unsortable {
                        name: resolved.name,
                    });
                }
                Ok(SortKey {
                    accessor: resolved.accessor,
                    direction: statement.direction,
                })
            })
            .collect::<QueryOutcome<Vec<_>>>()?;

        trace!(source = tree.source(), keys = keys.len(), "compiled order-by");
        Ok(Self { keys })
    }

    /// Returns the sort keys, primary first.
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    /// Returns true if there are no sort keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Compares two records key by key.
    pub fn compare(&self, a: &dyn Fields, b: &dyn Fields) -> Ordering {
        self.keys
            .iter()
            .map(|key| key.compare(a, b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self
            .keys
            .iter()
            .map(|key| match key.direction {
                OrderDirection::Ascending => format!("{} asc", key.accessor),
                OrderDirection::Descending => format!("{} desc", key.accessor),
            })
            .collect();
        f.write_str(&keys.join(", "))
    }
}
