//! Abstract Syntax Tree (AST) for filter and order-by expressions.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// A node of a parsed filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A single field name, resolved against the current scope.
    Identifier(String),

    /// A `/`-separated navigation path.
    PropertyPath(PropertyPath),

    /// A typed value.
    Literal(Literal),

    /// A comparison, a logical combination, or a wrapped lambda.
    Infix(InfixExpression),

    /// An `any`/`all` quantifier. Only ever the left side of an
    /// [`Operator::Complete`] infix.
    Lambda(LambdaExpression),
}

/// A typed literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    // ==================== Numeric ====================
    /// Plain or `l`-suffixed integer.
    Integer(i64),
    /// `f`-suffixed number.
    Float(f32),
    /// `m`-suffixed number.
    Decimal(Decimal),
    /// `d`-suffixed number.
    Double(f64),

    // ==================== Text ====================
    /// Single-quoted string.
    String(String),
    /// Unquoted identifier on the right-hand side, matched against enum variants.
    Enum(String),

    // ==================== Other ====================
    /// `true` or `false`.
    Boolean(bool),
    /// A GUID.
    Guid(Uuid),
    /// A `yyyy-MM-dd` date.
    Date(NaiveDate),
    /// An ISO 8601 date-time.
    DateTime(DateTime<Utc>),
    /// `null`.
    Null,
}

impl Literal {
    /// Returns a short description of the literal kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Literal::Integer(_) => "integer",
            Literal::Float(_) => "float",
            Literal::Decimal(_) => "decimal",
            Literal::Double(_) => "double",
            Literal::String(_) => "string",
            Literal::Enum(_) => "identifier",
            Literal::Boolean(_) => "boolean",
            Literal::Guid(_) => "guid",
            Literal::Date(_) => "date",
            Literal::DateTime(_) => "datetime",
            Literal::Null => "null",
        }
    }
}

/// Infix operators, keyed case-insensitively in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Contains,
    Lt,
    Lte,
    Gt,
    Gte,
    And,
    Or,
    /// Marks an infix whose left side is a self-contained lambda.
    Complete,
}

impl Operator {
    /// Parses a comparison keyword.
    pub fn comparison(keyword: &str) -> Option<Self> {
        let op = match keyword.to_ascii_lowercase().as_str() {
            "eq" => Operator::Eq,
            "ne" => Operator::Ne,
            "contains" => Operator::Contains,
            "lt" => Operator::Lt,
            "lte" => Operator::Lte,
            "gt" => Operator::Gt,
            "gte" => Operator::Gte,
            _ => return None,
        };
        Some(op)
    }

    /// Parses a logical keyword.
    pub fn logical(keyword: &str) -> Option<Self> {
        if keyword.eq_ignore_ascii_case("and") {
            Some(Operator::And)
        } else if keyword.eq_ignore_ascii_case("or") {
            Some(Operator::Or)
        } else {
            None
        }
    }

    /// Binding power of a logical operator; `and` binds tighter than `or`.
    pub fn precedence(&self) -> u8 {
        match self {
            Operator::And => 2,
            Operator::Or => 1,
            _ => 0,
        }
    }

    /// Returns true for `lt`, `lte`, `gt` and `gte`.
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            Operator::Lt | Operator::Lte | Operator::Gt | Operator::Gte
        )
    }

    /// Returns the keyword as written in a filter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Contains => "contains",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Complete => "",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A binary node.
#[derive(Debug, Clone, PartialEq)]
pub struct InfixExpression {
    pub left: Box<Expression>,
    pub operator: Operator,
    pub right: Box<Expression>,
}

impl InfixExpression {
    /// Creates an infix node.
    pub fn new(left: Expression, operator: Operator, right: Expression) -> Self {
        Self {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    /// Wraps a lambda as a complete expression that needs no operator or value.
    pub fn complete(lambda: LambdaExpression) -> Self {
        Self::new(
            Expression::Lambda(lambda),
            Operator::Complete,
            Expression::Literal(Literal::Null),
        )
    }
}

/// Quantifier applied to a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LambdaFunction {
    /// At least one element satisfies the body.
    Any,
    /// The collection is non-empty and every element satisfies the body.
    All,
}

impl LambdaFunction {
    /// Parses `any` or `all`, ignoring case.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        if keyword.eq_ignore_ascii_case("any") {
            Some(LambdaFunction::Any)
        } else if keyword.eq_ignore_ascii_case("all") {
            Some(LambdaFunction::All)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LambdaFunction::Any => "any",
            LambdaFunction::All => "all",
        }
    }
}

/// `collection/any(parameter: body)` or `collection/all(parameter: body)`.
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaExpression {
    /// Path to the collection, excluding the function segment.
    pub collection: PropertyPath,
    pub function: LambdaFunction,
    /// The bound variable name.
    pub parameter: String,
    pub body: Box<Expression>,
}

/// A non-empty list of path segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath {
    segments: Vec<String>,
}

impl PropertyPath {
    /// Creates a path, or `None` if `segments` is empty.
    pub fn new(segments: Vec<String>) -> Option<Self> {
        if segments.is_empty() {
            None
        } else {
            Some(Self { segments })
        }
    }

    /// Creates a single-segment path.
    pub fn single(segment: impl Into<String>) -> Self {
        Self {
            segments: vec![segment.into()],
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the first segment.
    pub fn first(&self) -> &str {
        // A path always has at least one segment.
        self.segments.first().map(String::as_str).unwrap_or_default()
    }

    /// Returns true if the path has exactly one segment.
    pub fn is_single(&self) -> bool {
        self.segments.len() == 1
    }
}

/// The root of a parsed filter.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStatement {
    pub expression: InfixExpression,
}

/// Sort direction of an order-by term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderDirection {
    #[default]
    Ascending,
    Descending,
}

/// One `field [asc|desc]` term of an order-by expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderByStatement {
    pub path: PropertyPath,
    pub direction: OrderDirection,
}

// ==================== Display ====================

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(v) => write!(f, "{}", v),
            Literal::Float(v) => write!(f, "{}f", v),
            Literal::Decimal(v) => write!(f, "{}m", v),
            Literal::Double(v) => write!(f, "{}d", v),
            Literal::String(v) => write!(f, "'{}'", v),
            Literal::Enum(v) => f.write_str(v),
            Literal::Boolean(v) => write!(f, "{}", v),
            Literal::Guid(v) => write!(f, "{}", v),
            Literal::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Literal::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%dT%H:%M:%S%.fZ")),
            Literal::Null => f.write_str("null"),
        }
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl fmt::Display for LambdaExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}({}: {})",
            self.collection,
            self.function.as_str(),
            self.parameter,
            self.body
        )
    }
}

impl fmt::Display for InfixExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operator {
            Operator::Complete => write!(f, "{}", self.left),
            Operator::And | Operator::Or => {
                write!(f, "({} {} {})", self.left, self.operator, self.right)
            }
            _ => write!(f, "{} {} {}", self.left, self.operator, self.right),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Identifier(name) => f.write_str(name),
            Expression::PropertyPath(path) => write!(f, "{}", path),
            Expression::Literal(literal) => write!(f, "{}", literal),
            Expression::Infix(infix) => write!(f, "{}", infix),
            Expression::Lambda(lambda) => write!(f, "{}", lambda),
        }
    }
}

impl fmt::Display for ExpressionStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)
    }
}

impl fmt::Display for OrderByStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            OrderDirection::Ascending => write!(f, "{} asc", self.path),
            OrderDirection::Descending => write!(f, "{} desc", self.path),
        }
    }
}
