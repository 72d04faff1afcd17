//! OData-style querying for typed record sequences.
//!
//! A [`Query`] carries optional filter, search, count, order-by, skip and
//! top parameters. [`apply()`] compiles them against the schema a record type
//! declares through [`Entity`](schema::Entity) and hands the compiled steps
//! to a [`Sequence`](sequence::Sequence).
//!
//! # Quick Start
//!
//! For convenient imports, use the prelude:
//!
//! ```
//! use goatquery_rs::prelude::*;
//! ```
//!
//! The lower layers are public too: [`filter`] exposes the lexer, parser
//! and evaluator, and [`order_by`] the sort compiler.

pub mod apply;
pub mod error;
pub mod filter;
pub mod options;
pub mod order_by;
pub mod prelude;
pub mod schema;
pub mod search;
pub mod sequence;

pub use apply::{apply, QueryableExt};
pub use error::{ErrorKind, QueryError, QueryOutcome};
pub use options::{Query, QueryOptions, QueryResult};
