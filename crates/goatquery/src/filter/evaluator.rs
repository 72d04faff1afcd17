//! Compiles parsed filters into predicates.
//!
//! The [`FilterEvaluator`] walks an [`ExpressionStatement`] against a
//! [`PropertyMappingTree`], resolving every property reference to internal
//! field names and coercing every literal to the type of the field it is
//! compared with. The result is a [`Predicate`] that can be tested against
//! any number of records.
//!
//! # Example
//!
//! ```
//! use goatquery_rs::filter::{FilterEvaluator, QueryParser};
//! use goatquery_rs::schema::{Entity, EntityType, Fields, PropertyMappingTree, ScalarKind, Value};
//!
//! struct Person {
//!     age: i32,
//! }
//!
//! impl Fields for Person {
//!     fn field(&self, name: &str) -> Option<Value<'_>> {
//!         match name {
//!             "Age" => Some(Value::from(self.age)),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! impl Entity for Person {
//!     fn entity_type() -> EntityType {
//!         EntityType::new("Person").field("Age", ScalarKind::I32)
//!     }
//! }
//!
//! let tree = PropertyMappingTree::build::<Person>(5).unwrap();
//! let statement = QueryParser::parse_filter("age gt 17").unwrap();
//! let predicate = FilterEvaluator::new(&tree).evaluate(&statement).unwrap();
//!
//! assert!(predicate.matches(&Person { age: 30 }));
//! assert!(!predicate.matches(&Person { age: 12 }));
//! ```

use std::borrow::Cow;

use rust_decimal::Decimal;
use tracing::trace;

use super::ast::{
    Expression, ExpressionStatement, InfixExpression, LambdaExpression, LambdaFunction, Literal,
    Operator,
};
use super::predicate::{Accessor, Comparison, Predicate};
use crate::error::{QueryError, QueryOutcome};
use crate::schema::mapping::DEFAULT_MAX_PROPERTY_MAPPING_DEPTH;
use crate::schema::{FieldKind, PropertyMappingTree, ScalarKind, Value};

/// A lambda variable binding.
#[derive(Debug)]
struct LambdaScope {
    parameter: String,
    slot: usize,
    element_kind: FieldKind,
    /// Fields of the element type; `None` for primitive elements.
    tree: Option<PropertyMappingTree>,
}

/// Evaluation state for one filter: the root schema and the lambda scopes
/// currently open, innermost last.
#[derive(Debug)]
pub(crate) struct EvaluationContext<'t> {
    root: &'t PropertyMappingTree,
    scopes: Vec<LambdaScope>,
}

impl<'t> EvaluationContext<'t> {
    fn new(root: &'t PropertyMappingTree) -> Self {
        Self {
            root,
            scopes: Vec::new(),
        }
    }

    /// Returns the number of open lambda scopes.
    fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Finds the innermost scope binding `parameter`.
    fn find_scope(&self, parameter: &str) -> Option<&LambdaScope> {
        self.scopes.iter().rev().find(|scope| scope.parameter == parameter)
    }

    /// Runs `body` with `scope` pushed. The scope is popped on every exit path.
    fn with_scope<T>(
        &mut self,
        scope: LambdaScope,
        body: impl FnOnce(&mut Self) -> QueryOutcome<T>,
    ) -> QueryOutcome<T> {
        self.scopes.push(scope);
        let result = body(self);
        self.scopes.pop();
        result
    }
}

/// A property reference resolved against the schema.
pub(crate) struct Resolved {
    pub(crate) accessor: Accessor,
    /// One accessor per intermediate record traversed.
    pub(crate) guards: Vec<Accessor>,
    pub(crate) kind: FieldKind,
    /// The reference as written, for messages.
    pub(crate) name: String,
}

/// Compiles filter statements against a record schema.
#[derive(Debug, Clone, Copy)]
pub struct FilterEvaluator<'t> {
    tree: &'t PropertyMappingTree,
    max_depth: usize,
}

impl<'t> FilterEvaluator<'t> {
    /// Creates an evaluator for the given root schema.
    pub fn new(tree: &'t PropertyMappingTree) -> Self {
        Self {
            tree,
            max_depth: DEFAULT_MAX_PROPERTY_MAPPING_DEPTH,
        }
    }

    /// Sets the depth used when building schemas for collection elements.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Compiles a parsed filter into a predicate.
    ///
    /// # Errors
    ///
    /// Returns the first resolution or coercion error encountered.
    pub fn evaluate(&self, statement: &ExpressionStatement) -> QueryOutcome<Predicate> {
        let mut context = EvaluationContext::new(self.tree);
        let predicate = self.evaluate_infix(&mut context, &statement.expression)?;
        trace!(source = self.tree.source(), predicate = %predicate, "compiled filter");
        Ok(predicate)
    }

    fn evaluate_expression(
        &self,
        context: &mut EvaluationContext<'_>,
        expression: &Expression,
    ) -> QueryOutcome<Predicate> {
        match expression {
            Expression::Infix(infix) => self.evaluate_infix(context, infix),
            Expression::Lambda(lambda) => self.evaluate_lambda(context, lambda),
            other => Err(QueryError::InvalidValueType {
                found: other.to_string(),
            }),
        }
    }

    fn evaluate_infix(
        &self,
        context: &mut EvaluationContext<'_>,
        infix: &InfixExpression,
    ) -> QueryOutcome<Predicate> {
        match infix.operator {
            Operator::And => {
                let left = self.evaluate_expression(context, &infix.left)?;
                let right = self.evaluate_expression(context, &infix.right)?;
                Ok(Predicate::and(left, right))
            }
            Operator::Or => {
                let left = self.evaluate_expression(context, &infix.left)?;
                let right = self.evaluate_expression(context, &infix.right)?;
                Ok(Predicate::or(left, right))
            }
            Operator::Complete => self.evaluate_expression(context, &infix.left),
            operator => {
                let resolved = match infix.left.as_ref() {
                    Expression::Identifier(name) => {
                        self.resolve(context, std::slice::from_ref(name))?
                    }
                    Expression::PropertyPath(path) => self.resolve(context, path.segments())?,
                    other => {
                        return Err(QueryError::unexpected_token(other.to_string(), 0));
                    }
                };
                let Expression::Literal(literal) = infix.right.as_ref() else {
                    return Err(QueryError::InvalidValueType {
                        found: infix.right.to_string(),
                    });
                };
                compile_comparison(resolved, operator, literal)
            }
        }
    }

    fn evaluate_lambda(
        &self,
        context: &mut EvaluationContext<'_>,
        lambda: &LambdaExpression,
    ) -> QueryOutcome<Predicate> {
        let collection = self.resolve(context, lambda.collection.segments())?;
        let element_kind = collection
            .kind
            .element()
            .cloned()
            .ok_or_else(|| QueryError::NotACollection {
                name: collection.name.clone(),
            })?;

        let tree = element_kind
            .entity_ref()
            .map(|entity| PropertyMappingTree::build_for(entity, self.max_depth))
            .transpose()?;

        let scope = LambdaScope {
            parameter: lambda.parameter.clone(),
            slot: context.depth() + 1,
            element_kind,
            tree,
        };

        let body = context.with_scope(scope, |context| {
            self.evaluate_expression(context, &lambda.body)
        })?;

        let body = Box::new(body);
        let predicate = match lambda.function {
            LambdaFunction::Any => Predicate::Any {
                collection: collection.accessor,
                body,
            },
            LambdaFunction::All => Predicate::All {
                collection: collection.accessor,
                body,
            },
        };

        Ok(predicate.guarded(collection.guards))
    }

    /// Resolves a property reference.
    ///
    /// A reference whose first segment names a lambda variable is rebased
    /// onto that variable's element. Otherwise a single name resolves
    /// against the innermost lambda element (or the root record outside any
    /// lambda), and a longer path resolves against the root record.
    fn resolve(
        &self,
        context: &EvaluationContext<'_>,
        segments: &[String],
    ) -> QueryOutcome<Resolved> {
        let name = segments.join("/");
        let Some((first, rest)) = segments.split_first() else {
            return Err(QueryError::InvalidPropertyPath);
        };

        if let Some(scope) = context.find_scope(first) {
            if rest.is_empty() {
                if !scope.element_kind.is_primitive() {
                    return Err(QueryError::NonPrimitiveLambdaParameter {
                        parameter: scope.parameter.clone(),
                    });
                }
                return Ok(Resolved {
                    accessor: Accessor::new(scope.slot, Vec::new()),
                    guards: Vec::new(),
                    kind: scope.element_kind.clone(),
                    name,
                });
            }

            let tree = scope
                .tree
                .as_ref()
                .ok_or_else(|| QueryError::NotNavigable { name: first.clone() })?;
            return walk(tree, scope.slot, rest, name);
        }

        if rest.is_empty() {
            if let Some(scope) = context.scopes.last() {
                return match &scope.tree {
                    Some(tree) => walk(tree, scope.slot, segments, name),
                    None => Err(QueryError::unknown_property(
                        first.clone(),
                        std::iter::empty::<&str>(),
                    )),
                };
            }
        }

        walk(context.root, 0, segments, name)
    }
}

/// Walks `segments` through `tree`, collecting a guard per intermediate record.
pub(crate) fn walk(
    tree: &PropertyMappingTree,
    slot: usize,
    segments: &[String],
    name: String,
) -> QueryOutcome<Resolved> {
    let mut tree = tree;
    let mut path = Vec::with_capacity(segments.len());
    let mut guards = Vec::new();

    for (index, segment) in segments.iter().enumerate() {
        let node = tree
            .try_get(segment)
            .ok_or_else(|| QueryError::unknown_property(segment.clone(), tree.wire_names()))?;
        path.push(node.field_name());

        if index + 1 == segments.len() {
            return Ok(Resolved {
                accessor: Accessor::new(slot, path),
                guards,
                kind: node.kind().clone(),
                name,
            });
        }

        if node.is_collection() {
            return Err(QueryError::CollectionComparison {
                name: segment.clone(),
            });
        }
        tree = node.nested().ok_or_else(|| QueryError::NotNavigable {
            name: segment.clone(),
        })?;
        guards.push(Accessor::new(slot, path.clone()));
    }

    Err(QueryError::InvalidPropertyPath)
}

/// Builds the predicate for `reference operator literal`.
fn compile_comparison(
    resolved: Resolved,
    operator: Operator,
    literal: &Literal,
) -> QueryOutcome<Predicate> {
    let Resolved {
        accessor,
        guards,
        kind,
        name,
    } = resolved;

    if kind.element().is_some() {
        return Err(QueryError::CollectionComparison { name });
    }

    if matches!(literal, Literal::Null) {
        let predicate = match operator {
            Operator::Eq => Predicate::IsNull(accessor),
            Operator::Ne => Predicate::NotNull(accessor),
            other => {
                return Err(QueryError::invalid_operand(
                    other.as_str(),
                    format!("cannot compare null using '{}'", other),
                ))
            }
        };
        return Ok(predicate.guarded(guards));
    }

    let scalar = kind.scalar().ok_or_else(|| {
        QueryError::type_mismatch(describe_literal(literal), name.as_str(), kind.to_string())
    })?;

    if operator == Operator::Contains {
        let Literal::String(text) = literal else {
            return Err(QueryError::invalid_operand(
                operator.as_str(),
                "value must be a string when using 'contains' operand",
            ));
        };
        if scalar != ScalarKind::String {
            return Err(QueryError::type_mismatch(
                describe_literal(literal),
                name,
                scalar.name(),
            ));
        }
        let predicate = Predicate::and(
            Predicate::NotNull(accessor.clone()),
            Predicate::Contains {
                accessor,
                needle: text.to_lowercase(),
            },
        );
        return Ok(predicate.guarded(guards));
    }

    let comparison = Comparison::from_operator(operator).ok_or_else(|| {
        QueryError::invalid_operand(
            operator.as_str(),
            format!("'{}' is not a comparison operator", operator),
        )
    })?;

    if let (Literal::Date(date), ScalarKind::DateTime) = (literal, scalar) {
        let compare = Predicate::CompareDate {
            accessor: accessor.clone(),
            comparison,
            date: *date,
        };
        let predicate = match (kind.is_nullable(), comparison) {
            (false, _) => compare,
            (true, Comparison::Ne) => Predicate::or(Predicate::IsNull(accessor), compare),
            (true, _) => Predicate::and(Predicate::NotNull(accessor), compare),
        };
        return Ok(predicate.guarded(guards));
    }

    let value = coerce_literal(literal, scalar, &name)?;
    let compare = Predicate::Compare {
        accessor: accessor.clone(),
        comparison,
        value,
    };
    let predicate = if kind.is_nullable() {
        Predicate::and(Predicate::NotNull(accessor), compare)
    } else {
        compare
    };

    Ok(predicate.guarded(guards))
}

fn describe_literal(literal: &Literal) -> String {
    format!("{} {}", literal.kind_name(), literal)
}

/// Narrows an integer literal to an integer field type.
fn narrow_integer(value: i64, target: ScalarKind) -> Option<Value<'static>> {
    let narrowed = match target {
        ScalarKind::I8 => Value::I8(i8::try_from(value).ok()?),
        ScalarKind::I16 => Value::I16(i16::try_from(value).ok()?),
        ScalarKind::I32 => Value::I32(i32::try_from(value).ok()?),
        ScalarKind::I64 => Value::I64(value),
        ScalarKind::U8 => Value::U8(u8::try_from(value).ok()?),
        ScalarKind::U16 => Value::U16(u16::try_from(value).ok()?),
        ScalarKind::U32 => Value::U32(u32::try_from(value).ok()?),
        ScalarKind::U64 => Value::U64(u64::try_from(value).ok()?),
        _ => return None,
    };
    Some(narrowed)
}

/// Converts a literal to a value of the field's scalar type.
///
/// # Errors
///
/// Returns `QueryError::Overflow` when an integer does not fit,
/// `QueryError::UnknownEnumValue` for an unknown variant, and
/// `QueryError::TypeMismatch` for any other incompatible pairing.
fn coerce_literal(
    literal: &Literal,
    target: ScalarKind,
    property: &str,
) -> QueryOutcome<Value<'static>> {
    let value = match (literal, target) {
        (Literal::Integer(v), target) if target.is_integer() => {
            narrow_integer(*v, target).ok_or_else(|| QueryError::Overflow {
                value: *v,
                target: target.name().to_string(),
            })?
        }
        (Literal::Integer(v), ScalarKind::F32) => Value::F32(*v as f32),
        (Literal::Integer(v), ScalarKind::F64) => Value::F64(*v as f64),
        (Literal::Integer(v), ScalarKind::Decimal) => Value::Decimal(Decimal::from(*v)),
        (Literal::Float(v), ScalarKind::F32) => Value::F32(*v),
        (Literal::Float(v), ScalarKind::F64) => Value::F64(f64::from(*v)),
        (Literal::Double(v), ScalarKind::F64) => Value::F64(*v),
        (Literal::Decimal(v), ScalarKind::Decimal) => Value::Decimal(*v),
        (Literal::String(s), ScalarKind::String) => Value::String(Cow::Owned(s.clone())),
        (Literal::String(s) | Literal::Enum(s), ScalarKind::Enum(variants)) => variants
            .iter()
            .find(|variant| variant.eq_ignore_ascii_case(s))
            .map(|variant| Value::Enum(*variant))
            .ok_or_else(|| QueryError::UnknownEnumValue {
                value: s.clone(),
                property: property.to_string(),
            })?,
        (Literal::Boolean(b), ScalarKind::Bool) => Value::Bool(*b),
        (Literal::Guid(g), ScalarKind::Guid) => Value::Guid(*g),
        (Literal::DateTime(dt), ScalarKind::DateTime) => Value::DateTime(*dt),
        (Literal::Date(d), ScalarKind::Date) => Value::Date(*d),
        (literal, target) => {
            return Err(QueryError::type_mismatch(
                describe_literal(literal),
                property,
                target.name(),
            ))
        }
    };

    Ok(value)
}

#[cfg(test)]
#[path = "evaluator_tests.rs"]
mod tests;
