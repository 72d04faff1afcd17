//! The query pipeline.
//!
//! Steps run in a fixed order: page-size check, filter, search, count,
//! order-by, skip, top. The first failing step ends the query; later steps
//! never run.

use tracing::debug;

use crate::error::{QueryError, QueryOutcome};
use crate::filter::{FilterEvaluator, QueryParser};
use crate::options::{Query, QueryOptions, QueryResult};
use crate::order_by::OrderBy;
use crate::schema::PropertyMappingTree;
use crate::search::SearchBinder;
use crate::sequence::Sequence;

/// Applies a query to a sequence.
///
/// The schema of `S::Item` is expanded once per call when the query has a
/// filter or an order-by.
///
/// # Errors
///
/// Returns the error of the first failing step:
/// - `QueryError::TopExceedsMaximum` when `top` is above `options.max_top`
/// - any parse, resolution or coercion error from the filter or order-by
/// - `QueryError::SearchBinding` when the binder refuses the search text
/// - `QueryError::InvalidOptions` when `options` are out of range
pub fn apply<S: Sequence>(
    sequence: S,
    query: &Query,
    options: &QueryOptions,
    search_binder: Option<&dyn SearchBinder<S::Item>>,
) -> QueryOutcome<QueryResult<S>> {
    let result = run(sequence, query, options, search_binder);
    if let Err(err) = &result {
        debug!(error = %err, kind = ?err.kind(), "query rejected");
    }
    result
}

fn run<S: Sequence>(
    mut sequence: S,
    query: &Query,
    options: &QueryOptions,
    search_binder: Option<&dyn SearchBinder<S::Item>>,
) -> QueryOutcome<QueryResult<S>> {
    if let (Some(top), Some(max_top)) = (query.top, options.max_top) {
        if top > max_top {
            return Err(QueryError::TopExceedsMaximum { top, max_top });
        }
    }
    options.validate()?;

    let filter = query.filter.as_deref().filter(|text| !text.is_empty());
    let order_by = query.order_by.as_deref().filter(|text| !text.is_empty());

    let tree = if filter.is_some() || order_by.is_some() {
        Some(PropertyMappingTree::build::<S::Item>(
            options.max_property_mapping_depth,
        )?)
    } else {
        None
    };

    if let (Some(text), Some(tree)) = (filter, tree.as_ref()) {
        let statement = QueryParser::parse_filter(text)?;
        let predicate = FilterEvaluator::new(tree)
            .with_max_depth(options.max_property_mapping_depth)
            .evaluate(&statement)?;
        sequence = sequence.filter(&predicate);
        debug!(filter = text, "applied filter");
    }

    if let (Some(binder), Some(text)) = (search_binder, query.search.as_deref()) {
        if !text.is_empty() {
            let predicate = binder.bind(text).ok_or(QueryError::SearchBinding)?;
            sequence = sequence.search(&predicate);
            debug!(search = text, "applied search");
        }
    }

    let count = if query.count {
        let count = sequence.count();
        debug!(count, "counted records");
        Some(count)
    } else {
        None
    };

    if let (Some(text), Some(tree)) = (order_by, tree.as_ref()) {
        let order = OrderBy::parse(text, tree)?;
        sequence = sequence.order_by(&order);
        debug!(order_by = text, "applied order-by");
    }

    if let Some(skip) = query.skip.filter(|&n| n > 0) {
        sequence = sequence.skip(skip);
        debug!(skip, "applied skip");
    }

    match (query.top.filter(|&n| n > 0), options.max_top) {
        (Some(top), _) => {
            sequence = sequence.take(top);
            debug!(top, "applied top");
        }
        (None, Some(max_top)) => {
            sequence = sequence.take(max_top);
            debug!(max_top, "applied implicit top");
        }
        (None, None) => {}
    }

    Ok(QueryResult {
        value: sequence,
        count,
    })
}

/// Method-call form of [`apply()`] for any [`Sequence`].
///
/// ```
/// use goatquery_rs::prelude::*;
///
/// struct Item {
///     n: i32,
/// }
///
/// impl Fields for Item {
///     fn field(&self, name: &str) -> Option<Value<'_>> {
///         match name {
///             "N" => Some(Value::from(self.n)),
///             _ => None,
///         }
///     }
/// }
///
/// impl Entity for Item {
///     fn entity_type() -> EntityType {
///         EntityType::new("Item").field("N", ScalarKind::I32)
///     }
/// }
///
/// let items: Vec<Item> = (1..=10).map(|n| Item { n }).collect();
/// let query = Query::new().with_filter("n gt 3").with_order_by("n desc").with_top(2);
/// let result = items.apply_query(&query, &QueryOptions::default()).unwrap();
/// let ns: Vec<i32> = result.value.iter().map(|item| item.n).collect();
/// assert_eq!(ns, vec![10, 9]);
/// ```
pub trait QueryableExt: Sequence {
    /// Applies a query without search.
    ///
    /// # Errors
    ///
    /// See [`apply()`].
    fn apply_query(
        self,
        query: &Query,
        options: &QueryOptions,
    ) -> QueryOutcome<QueryResult<Self>> {
        apply(self, query, options, None)
    }

    /// Applies a query, binding its search text with `binder`.
    ///
    /// # Errors
    ///
    /// See [`apply()`].
    fn apply_query_with_search(
        self,
        query: &Query,
        options: &QueryOptions,
        binder: &dyn SearchBinder<Self::Item>,
    ) -> QueryOutcome<QueryResult<Self>> {
        apply(self, query, options, Some(binder))
    }
}

impl<S: Sequence> QueryableExt for S {}
