//! Error types for query compilation and application.

use strsim::levenshtein;
use thiserror::Error;

/// A specialized Result type for query operations.
pub type QueryOutcome<T> = Result<T, QueryError>;

/// Maximum Levenshtein distance to consider a property name as a suggestion.
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Broad classification of a [`QueryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The filter or order-by text is malformed.
    Syntax,
    /// A name in the query does not resolve against the record schema.
    Resolution,
    /// A literal cannot be converted to the type of the field it is compared with.
    Coercion,
    /// A pipeline step refused the query (page size, search binding).
    Pipeline,
    /// Options or query parameters could not be loaded.
    Configuration,
}

/// Errors that can occur while compiling or applying a query.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    // ==================== Syntax ====================
    /// The filter expression is empty.
    #[error("filter expression is empty")]
    EmptyExpression,

    /// An unexpected token was encountered during parsing.
    #[error("unexpected token '{token}' at position {position}")]
    UnexpectedToken {
        /// The literal text of the unexpected token.
        token: String,
        /// Byte offset of the token in the input.
        position: usize,
    },

    /// A grouped expression was not closed.
    #[error("expected closing parenthesis")]
    UnclosedParenthesis,

    /// A property path segment was not an identifier.
    #[error("expected identifier after '/' in property path")]
    InvalidPropertyPath,

    /// A comparison was not followed by a known operator.
    #[error("invalid conjunction within filter: '{found}'")]
    InvalidConjunction {
        /// What was found where an operator was expected.
        found: String,
    },

    /// The right-hand side of a comparison is not a literal.
    #[error("invalid value type within filter: '{found}'")]
    InvalidValueType {
        /// What was found where a value was expected.
        found: String,
    },

    /// An operator was paired with a value type it cannot accept.
    #[error("{message}")]
    InvalidOperand {
        /// The operator that rejected its operand.
        operator: String,
        /// Description of the violation.
        message: String,
    },

    /// A lambda expression is malformed.
    #[error("{0}")]
    InvalidLambda(String),

    /// Groups, lambdas or `and`/`or` chains nest past the parser's limit.
    #[error("filter expression nests deeper than {max} levels")]
    NestingTooDeep {
        /// The maximum nesting depth.
        max: usize,
    },

    /// A literal token could not be converted to its typed value.
    #[error("invalid {kind} literal '{literal}'")]
    InvalidLiteral {
        /// The literal kind the lexer assigned.
        kind: String,
        /// The raw literal text.
        literal: String,
    },

    // ==================== Resolution ====================
    /// A property name does not exist on the record type.
    #[error("invalid property '{name}' within filter{}", suggestion_suffix(suggestion.as_deref()))]
    UnknownProperty {
        /// The name as written in the query.
        name: String,
        /// A similarly spelled property, when one exists.
        suggestion: Option<String>,
    },

    /// A path navigates through a property that has no nested fields.
    #[error("property '{name}' has no navigable properties")]
    NotNavigable {
        /// The property that cannot be navigated.
        name: String,
    },

    /// `any`/`all` was applied to a property that is not a collection.
    #[error("property '{name}' is not a collection")]
    NotACollection {
        /// The offending property.
        name: String,
    },

    /// A collection property was compared directly.
    #[error("collection property '{name}' can only be filtered with any/all")]
    CollectionComparison {
        /// The collection property.
        name: String,
    },

    /// An order-by term names a record or collection property.
    #[error("property '{name}' cannot be used for ordering")]
    Unsortable {
        /// The offending property.
        name: String,
    },

    /// A lambda's bound variable was compared directly while its element type is not primitive.
    #[error("lambda parameter '{parameter}' refers to a non-primitive element and cannot be compared directly")]
    NonPrimitiveLambdaParameter {
        /// The bound variable name.
        parameter: String,
    },

    // ==================== Coercion ====================
    /// An integer literal does not fit the target field type.
    #[error("value {value} is too large for type {target}")]
    Overflow {
        /// The literal value.
        value: i64,
        /// Name of the target numeric type.
        target: String,
    },

    /// A literal cannot be compared with a field of the given type.
    #[error("cannot compare {literal} with property '{property}' of type {target}")]
    TypeMismatch {
        /// Description of the literal.
        literal: String,
        /// The property name.
        property: String,
        /// Name of the property type.
        target: String,
    },

    /// A value is not one of an enum's variants.
    #[error("'{value}' is not a valid value for property '{property}'")]
    UnknownEnumValue {
        /// The value as written.
        value: String,
        /// The enum property.
        property: String,
    },

    // ==================== Pipeline ====================
    /// The requested page size is larger than the configured maximum.
    #[error("the value supplied for the query parameter 'Top' ({top}) was greater than the maximum top allowed for this resource ({max_top})")]
    TopExceedsMaximum {
        /// Requested page size.
        top: usize,
        /// Configured maximum.
        max_top: usize,
    },

    /// The search binder produced no predicate.
    #[error("cannot parse search binder expression")]
    SearchBinding,

    // ==================== Configuration ====================
    /// Query options are invalid.
    #[error("invalid query options: {0}")]
    InvalidOptions(String),

    /// Query parameters could not be decoded.
    #[error("invalid query parameters: {0}")]
    InvalidQueryString(String),
}

fn suggestion_suffix(suggestion: Option<&str>) -> String {
    match suggestion {
        Some(s) => format!(". Did you mean '{}'?", s),
        None => String::new(),
    }
}

impl QueryError {
    /// Creates an unexpected token error.
    pub fn unexpected_token(token: impl Into<String>, position: usize) -> Self {
        QueryError::UnexpectedToken {
            token: token.into(),
            position,
        }
    }

    /// Creates an invalid operand error.
    pub fn invalid_operand(operator: impl Into<String>, message: impl Into<String>) -> Self {
        QueryError::InvalidOperand {
            operator: operator.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid literal error.
    pub fn invalid_literal(kind: impl Into<String>, literal: impl Into<String>) -> Self {
        QueryError::InvalidLiteral {
            kind: kind.into(),
            literal: literal.into(),
        }
    }

    /// Creates an unknown property error, suggesting the closest candidate name.
    pub fn unknown_property<'a>(
        name: impl Into<String>,
        candidates: impl Iterator<Item = &'a str>,
    ) -> Self {
        let name = name.into();
        let suggestion = find_similar_name(&name, candidates);
        QueryError::UnknownProperty { name, suggestion }
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(
        literal: impl Into<String>,
        property: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        QueryError::TypeMismatch {
            literal: literal.into(),
            property: property.into(),
            target: target.into(),
        }
    }

    /// Returns the broad classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::EmptyExpression
            | QueryError::UnexpectedToken { .. }
            | QueryError::UnclosedParenthesis
            | QueryError::InvalidPropertyPath
            | QueryError::InvalidConjunction { .. }
            | QueryError::InvalidValueType { .. }
            | QueryError::InvalidOperand { .. }
            | QueryError::InvalidLambda(_)
            | QueryError::NestingTooDeep { .. } => ErrorKind::Syntax,
            QueryError::UnknownProperty { .. }
            | QueryError::NotNavigable { .. }
            | QueryError::NotACollection { .. }
            | QueryError::CollectionComparison { .. }
            | QueryError::Unsortable { .. }
            | QueryError::NonPrimitiveLambdaParameter { .. } => ErrorKind::Resolution,
            QueryError::InvalidLiteral { .. }
            | QueryError::Overflow { .. }
            | QueryError::TypeMismatch { .. }
            | QueryError::UnknownEnumValue { .. } => ErrorKind::Coercion,
            QueryError::TopExceedsMaximum { .. } | QueryError::SearchBinding => {
                ErrorKind::Pipeline
            }
            QueryError::InvalidOptions(_) | QueryError::InvalidQueryString(_) => {
                ErrorKind::Configuration
            }
        }
    }

    /// Returns the human-readable messages carried by this error.
    ///
    /// Compilation stops at the first failure, so the list always holds
    /// exactly one message.
    pub fn messages(&self) -> Vec<String> {
        vec![self.to_string()]
    }
}

/// Finds the best matching name from a list of candidates using Levenshtein distance.
///
/// Returns the best match if its edit distance is within the threshold,
/// otherwise returns `None`.
pub(crate) fn find_similar_name<'a>(
    query: &str,
    candidates: impl Iterator<Item = &'a str>,
) -> Option<String> {
    let query_lower = query.to_lowercase();

    let (best_match, best_distance) = candidates
        .filter(|name| !name.is_empty())
        .map(|name| {
            let distance = levenshtein(&query_lower, &name.to_lowercase());
            (name.to_string(), distance)
        })
        .min_by_key(|(_, d)| *d)?;

    if best_distance > 0 && best_distance <= MAX_SUGGESTION_DISTANCE {
        Some(best_match)
    } else {
        None
    }
}
