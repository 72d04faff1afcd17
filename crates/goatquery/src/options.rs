//! Query parameters, engine options and results.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryOutcome};
use crate::schema::mapping::DEFAULT_MAX_PROPERTY_MAPPING_DEPTH;

/// The parameters of one query.
///
/// Every step is optional. Field names accept both the plain form
/// (`filter`, `orderby`) and the OData `$`-prefixed form (`$filter`).
///
/// ```
/// use goatquery_rs::Query;
///
/// let query = Query::from_query_string("?$filter=age%20gt%2030&$top=5&$count=true").unwrap();
/// assert_eq!(query.filter.as_deref(), Some("age gt 30"));
/// assert_eq!(query.top, Some(5));
/// assert!(query.count);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Query {
    /// Filter expression.
    #[serde(alias = "$filter", skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Comma-separated sort terms, each `path [asc|desc]`.
    #[serde(
        alias = "$orderby",
        alias = "orderby",
        alias = "$orderBy",
        skip_serializing_if = "Option::is_none"
    )]
    pub order_by: Option<String>,

    /// Number of records to drop after sorting.
    #[serde(alias = "$skip", skip_serializing_if = "Option::is_none")]
    pub skip: Option<usize>,

    /// Page size.
    #[serde(alias = "$top", skip_serializing_if = "Option::is_none")]
    pub top: Option<usize>,

    /// Whether to count the records matching the filter and search.
    #[serde(alias = "$count")]
    pub count: bool,

    /// Free-text search, bound by a caller-supplied binder.
    #[serde(alias = "$search", skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl Query {
    /// Creates an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a URL query string. A leading `?` is ignored.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidQueryString` if a parameter has the wrong type.
    pub fn from_query_string(input: &str) -> QueryOutcome<Self> {
        let input = input.strip_prefix('?').unwrap_or(input);
        serde_urlencoded::from_str(input)
            .map_err(|e| QueryError::InvalidQueryString(e.to_string()))
    }

    /// Encodes the query as a URL query string with plain parameter names.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidQueryString` if encoding fails.
    pub fn to_query_string(&self) -> QueryOutcome<String> {
        serde_urlencoded::to_string(self).map_err(|e| QueryError::InvalidQueryString(e.to_string()))
    }

    /// Sets the filter expression.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Sets the order-by expression.
    pub fn with_order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    /// Sets the number of records to skip.
    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Sets the page size.
    pub fn with_top(mut self, top: usize) -> Self {
        self.top = Some(top);
        self
    }

    /// Requests a count.
    pub fn with_count(mut self, count: bool) -> Self {
        self.count = count;
        self
    }

    /// Sets the search text.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }
}

/// Engine options, shared by every query against a resource.
///
/// Loadable from TOML:
///
/// ```toml
/// max_top = 100
/// max_property_mapping_depth = 5
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// Largest page size a query may request. Also caps queries that ask
    /// for no page size. `None` disables both. `Some(0)` would cap every
    /// result at zero records and is rejected by [`QueryOptions::validate`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_top: Option<usize>,

    /// How many times one record type may recur along a path when the
    /// schema is expanded.
    pub max_property_mapping_depth: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            max_top: None,
            max_property_mapping_depth: DEFAULT_MAX_PROPERTY_MAPPING_DEPTH,
        }
    }
}

impl QueryOptions {
    /// Creates the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum page size.
    pub fn with_max_top(mut self, max_top: usize) -> Self {
        self.max_top = Some(max_top);
        self
    }

    /// Sets the schema recursion limit.
    pub fn with_max_property_mapping_depth(mut self, depth: usize) -> Self {
        self.max_property_mapping_depth = depth;
        self
    }

    /// Parses options from TOML text and validates them.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidOptions` if the text does not parse or
    /// the values are out of range.
    pub fn from_toml_str(content: &str) -> QueryOutcome<Self> {
        let options: QueryOptions = toml::from_str(content)
            .map_err(|e| QueryError::InvalidOptions(format!("Failed to parse options: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    /// Loads options from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidOptions` if the file cannot be read or
    /// its contents are invalid.
    pub fn load(path: impl AsRef<Path>) -> QueryOutcome<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| QueryError::InvalidOptions(format!("Failed to read options: {}", e)))?;
        Self::from_toml_str(&content)
    }

    /// Checks that the values are usable.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidOptions` for a zero mapping depth or a
    /// zero maximum page size.
    pub fn validate(&self) -> QueryOutcome<()> {
        if self.max_property_mapping_depth == 0 {
            return Err(QueryError::InvalidOptions(
                "max property mapping depth must be greater than 0".to_string(),
            ));
        }
        if self.max_top == Some(0) {
            return Err(QueryError::InvalidOptions(
                "max top must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// The records left after a query, plus the count if one was requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryResult<S> {
    /// The filtered, sorted and paged records.
    pub value: S,

    /// Records matching the filter and search, before paging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl<S> QueryResult<S> {
    /// Consumes the result and returns the records.
    pub fn into_value(self) -> S {
        self.value
    }
}
