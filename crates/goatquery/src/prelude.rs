//! Prelude module for convenient imports.
//!
//! ```
//! use goatquery_rs::prelude::*;
//!
//! // Now you have access to:
//! // - Query, QueryOptions, QueryResult (query parameters and results)
//! // - apply, QueryableExt (the pipeline)
//! // - QueryError, QueryOutcome (error handling)
//! // - Entity, Fields, EntityType, FieldKind, ScalarKind, Value (record schema)
//! // - Sequence, SearchBinder, SearchPredicate (providers and hooks)
//! ```

// Pipeline
pub use crate::apply::{apply, QueryableExt};
pub use crate::options::{Query, QueryOptions, QueryResult};

// Error types
pub use crate::error::{ErrorKind, QueryError, QueryOutcome};

// Record schema
pub use crate::schema::{Entity, EntityType, FieldKind, Fields, ScalarKind, Value};

// Providers and hooks
pub use crate::search::{SearchBinder, SearchPredicate};
pub use crate::sequence::Sequence;
