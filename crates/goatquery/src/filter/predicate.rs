//! Compiled predicate plan.
//!
//! The evaluator lowers a filter AST into a [`Predicate`]: a small tree of
//! typed tests over field [`Accessor`]s that is interpreted per record. Field
//! names are already resolved to internal names and literals are already
//! coerced to the field types, so matching does no lookups in the schema.
//!
//! Accessors address a binding slot: slot 0 is the record being tested and
//! slot *n* is the element bound by the *n*-th nested `any`/`all`.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;

use crate::filter::ast::Operator;
use crate::schema::{Fields, Value};

/// Path from a binding slot to a field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accessor {
    slot: usize,
    path: Vec<&'static str>,
}

impl Accessor {
    /// Creates an accessor following the internal field names in `path`.
    pub fn new(slot: usize, path: Vec<&'static str>) -> Self {
        Self { slot, path }
    }

    /// Returns the binding slot.
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Returns the internal field names, outermost first.
    pub fn path(&self) -> &[&'static str] {
        &self.path
    }

    /// Reads the addressed value from a record bound to slot 0.
    pub fn read<'a>(&self, record: &'a dyn Fields) -> Value<'a> {
        self.resolve(&[Value::Entity(record)])
    }

    /// Reads the addressed value. Missing records and fields read as null.
    fn resolve<'a>(&self, bindings: &[Value<'a>]) -> Value<'a> {
        let Some(mut current) = bindings.get(self.slot).cloned() else {
            return Value::Null;
        };

        for name in &self.path {
            current = match current {
                Value::Entity(entity) => entity.field(name).unwrap_or(Value::Null),
                _ => return Value::Null,
            };
        }

        current
    }
}

/// Comparison applied by [`Predicate::Compare`] and [`Predicate::CompareDate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Comparison {
    /// Maps a comparison operator. Returns `None` for `contains` and logical operators.
    pub fn from_operator(operator: Operator) -> Option<Self> {
        let comparison = match operator {
            Operator::Eq => Comparison::Eq,
            Operator::Ne => Comparison::Ne,
            Operator::Lt => Comparison::Lt,
            Operator::Lte => Comparison::Lte,
            Operator::Gt => Comparison::Gt,
            Operator::Gte => Comparison::Gte,
            Operator::Contains | Operator::And | Operator::Or | Operator::Complete => {
                return None
            }
        };
        Some(comparison)
    }

    fn test(self, ordering: Ordering) -> bool {
        match self {
            Comparison::Eq => ordering == Ordering::Equal,
            Comparison::Ne => ordering != Ordering::Equal,
            Comparison::Lt => ordering == Ordering::Less,
            Comparison::Lte => ordering != Ordering::Greater,
            Comparison::Gt => ordering == Ordering::Greater,
            Comparison::Gte => ordering != Ordering::Less,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
            Comparison::Lt => "<",
            Comparison::Lte => "<=",
            Comparison::Gt => ">",
            Comparison::Gte => ">=",
        }
    }
}

/// A compiled boolean test over one record.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Both sides hold. The right side is skipped when the left fails.
    And(Box<Predicate>, Box<Predicate>),
    /// Either side holds. The right side is skipped when the left holds.
    Or(Box<Predicate>, Box<Predicate>),
    /// The value is null.
    IsNull(Accessor),
    /// The value is not null.
    NotNull(Accessor),
    /// The value compares to a literal of the same kind.
    Compare {
        accessor: Accessor,
        comparison: Comparison,
        value: Value<'static>,
    },
    /// The lowercased string value contains `needle` (already lowercased).
    Contains { accessor: Accessor, needle: String },
    /// The date component of a date-time value compares to a date.
    CompareDate {
        accessor: Accessor,
        comparison: Comparison,
        date: NaiveDate,
    },
    /// Some element of the collection satisfies `body`.
    Any {
        collection: Accessor,
        body: Box<Predicate>,
    },
    /// The collection is non-empty and every element satisfies `body`.
    All {
        collection: Accessor,
        body: Box<Predicate>,
    },
}

impl Predicate {
    /// Creates a conjunction.
    pub fn and(left: Predicate, right: Predicate) -> Self {
        Predicate::And(Box::new(left), Box::new(right))
    }

    /// Creates a disjunction.
    pub fn or(left: Predicate, right: Predicate) -> Self {
        Predicate::Or(Box::new(left), Box::new(right))
    }

    /// Prefixes `self` with a not-null test for each guard, outermost first.
    pub fn guarded(self, guards: Vec<Accessor>) -> Self {
        guards
            .into_iter()
            .rev()
            .fold(self, |inner, guard| Predicate::and(Predicate::NotNull(guard), inner))
    }

    /// Returns true if the record satisfies this predicate.
    pub fn matches(&self, record: &dyn Fields) -> bool {
        let mut bindings = vec![Value::Entity(record)];
        self.eval(&mut bindings)
    }

    fn eval<'a>(&self, bindings: &mut Vec<Value<'a>>) -> bool {
        match self {
            Predicate::And(left, right) => left.eval(bindings) && right.eval(bindings),
            Predicate::Or(left, right) => left.eval(bindings) || right.eval(bindings),
            Predicate::IsNull(accessor) => accessor.resolve(bindings).is_null(),
            Predicate::NotNull(accessor) => !accessor.resolve(bindings).is_null(),
            Predicate::Compare {
                accessor,
                comparison,
                value,
            } => accessor
                .resolve(bindings)
                .compare(value)
                .is_some_and(|ordering| comparison.test(ordering)),
            Predicate::Contains { accessor, needle } => accessor
                .resolve(bindings)
                .as_str()
                .is_some_and(|text| text.to_lowercase().contains(needle.as_str())),
            Predicate::CompareDate {
                accessor,
                comparison,
                date,
            } => {
                let value = match accessor.resolve(bindings) {
                    Value::DateTime(dt) => dt.date_naive(),
                    Value::Date(d) => d,
                    _ => return false,
                };
                comparison.test(value.cmp(date))
            }
            Predicate::Any { collection, body } => match collection.resolve(bindings) {
                Value::List(items) => items
                    .into_iter()
                    .any(|item| eval_bound(body, bindings, item)),
                _ => false,
            },
            Predicate::All { collection, body } => match collection.resolve(bindings) {
                Value::List(items) => {
                    !items.is_empty()
                        && items
                            .into_iter()
                            .all(|item| eval_bound(body, bindings, item))
                }
                _ => false,
            },
        }
    }
}

/// Evaluates a lambda body with `item` bound to the next slot.
fn eval_bound<'a>(body: &Predicate, bindings: &mut Vec<Value<'a>>, item: Value<'a>) -> bool {
    bindings.push(item);
    let result = body.eval(bindings);
    bindings.pop();
    result
}

impl fmt::Display for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.slot)?;
        for name in &self.path {
            write!(f, ".{}", name)?;
        }
        Ok(())
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::And(left, right) => write!(f, "({} && {})", left, right),
            Predicate::Or(left, right) => write!(f, "({} || {})", left, right),
            Predicate::IsNull(accessor) => write!(f, "{} == null", accessor),
            Predicate::NotNull(accessor) => write!(f, "{} != null", accessor),
            Predicate::Compare {
                accessor,
                comparison,
                value,
            } => write!(f, "{} {} {}", accessor, comparison.symbol(), value),
            Predicate::Contains { accessor, needle } => {
                write!(f, "{}.contains('{}')", accessor, needle)
            }
            Predicate::CompareDate {
                accessor,
                comparison,
                date,
            } => write!(f, "{}.date {} {}", accessor, comparison.symbol(), date),
            Predicate::Any { collection, body } => write!(f, "{}.any({})", collection, body),
            Predicate::All { collection, body } => write!(f, "{}.all({})", collection, body),
        }
    }
}
