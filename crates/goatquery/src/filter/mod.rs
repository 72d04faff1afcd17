//! Filter expression lexer, parser and evaluator.
//!
//! Filters are OData-style boolean expressions over the fields of a record
//! type. They are parsed into an AST by [`QueryParser`] and compiled against
//! a [`PropertyMappingTree`](crate::schema::PropertyMappingTree) into a
//! [`Predicate`] by [`FilterEvaluator`].
//!
//! # Supported Syntax
//!
//! ## Comparisons
//! - `eq`, `ne` - Equality (any type, including `null`)
//! - `lt`, `lte`, `gt`, `gte` - Ordering (numbers, dates and date-times)
//! - `contains` - Case-insensitive substring match (strings)
//!
//! ## Literals
//! - `'text'` - String
//! - `42`, `42l` - Integer
//! - `1.5f`, `1.5m`, `1.5d` - Float, decimal and double
//! - `2000-01-01` - Date (compares against the date part of date-time fields)
//! - `2000-01-01T12:00:00Z` - Date-time
//! - `e4c7772b-8947-4e46-98ed-644b417d2a08` - GUID
//! - `true`, `false`, `null`
//! - `Active` - Enum variant (unquoted)
//!
//! ## Navigation
//! - `manager/firstName` - Nested field; records with a missing manager never match
//! - `tags/any(t: t eq 'vip')` - Some element matches
//! - `addresses/all(a: a/city/name eq 'Boston')` - Collection is non-empty and every element matches
//!
//! ## Boolean Operators
//! - `and` - binds tighter than `or`
//! - `or`
//! - `()` - Grouping
//!
//! # Example
//!
//! ```
//! use goatquery_rs::filter::{Expression, Operator, QueryParser};
//!
//! let statement = QueryParser::parse_filter("manager/age gt 30 and tags/any(t: t eq 'vip')").unwrap();
//! assert_eq!(statement.expression.operator, Operator::And);
//! assert!(matches!(*statement.expression.left, Expression::Infix(_)));
//! ```

mod ast;
pub(crate) mod evaluator;
mod lexer;
mod parser;
mod predicate;

pub use ast::{
    Expression, ExpressionStatement, InfixExpression, LambdaExpression, LambdaFunction, Literal,
    Operator, OrderByStatement, OrderDirection, PropertyPath,
};
pub use evaluator::FilterEvaluator;
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{QueryParser, MAX_EXPRESSION_DEPTH};
pub use predicate::{Accessor, Comparison, Predicate};

#[cfg(test)]
mod tests;
