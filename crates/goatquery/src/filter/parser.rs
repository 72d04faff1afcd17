//! Precedence-climbing parser for filter and order-by expressions.

use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::trace;
use uuid::Uuid;

use super::ast::{
    Expression, ExpressionStatement, InfixExpression, LambdaExpression, LambdaFunction, Literal,
    Operator, OrderByStatement, OrderDirection, PropertyPath,
};
use super::lexer::{parse_date, parse_datetime, Lexer, Token, TokenKind};
use crate::error::{QueryError, QueryOutcome};

/// Deepest nesting of groups, lambdas and `and`/`or` chains a filter may use.
pub const MAX_EXPRESSION_DEPTH: usize = 100;

/// Parser for filter and order-by expressions.
///
/// # Grammar
///
/// ```text
/// expression ::= term (("and" | "or") term)*
/// term       ::= "(" expression ")" | lambda | comparison
/// comparison ::= path OPERATOR literal
/// lambda     ::= IDENT ("/" IDENT)* "/" ("any" | "all") "(" IDENT ":" expression ")"
/// path       ::= IDENT ("/" IDENT)*
/// order_by   ::= (path ["asc" | "desc"])*
/// ```
///
/// `and` binds tighter than `or`; both are left-associative. Keywords and
/// operators are case-insensitive.
///
/// Parentheses and lambdas may nest at most [`MAX_EXPRESSION_DEPTH`] levels,
/// and the parsed tree may be at most that deep. A chain of `n` terms joined
/// by `and`/`or` is `n` levels deep.
///
/// # Example
///
/// ```
/// use goatquery_rs::filter::{Operator, QueryParser};
///
/// let statement = QueryParser::parse_filter("age eq 1 and firstname eq 'Harry' or age eq 2").unwrap();
/// assert_eq!(statement.expression.operator, Operator::Or);
/// ```
pub struct QueryParser {
    tokens: Vec<Token>,
    position: usize,
    end: Token,
    nesting: usize,
}

impl QueryParser {
    fn new(input: &str) -> Self {
        let tokens = Lexer::new(input).tokenize();
        let end = Token {
            kind: TokenKind::Eof,
            literal: String::new(),
            position: input.len(),
        };
        Self {
            tokens,
            position: 0,
            end,
            nesting: 0,
        }
    }

    /// Parses a filter expression.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::EmptyExpression` if the input is blank, or the
    /// first syntax or literal error encountered.
    pub fn parse_filter(input: &str) -> QueryOutcome<ExpressionStatement> {
        if input.trim().is_empty() {
            return Err(QueryError::EmptyExpression);
        }

        let mut parser = Self::new(input);
        let (expression, _) = parser.parse_expression(0)?;

        if !parser.at_end() {
            let token = parser.peek();
            return Err(QueryError::unexpected_token(token.describe(), token.position));
        }

        trace!(filter = input, "parsed filter expression");
        Ok(ExpressionStatement { expression })
    }

    /// Parses an order-by expression into its terms, in order.
    ///
    /// Tokens that cannot start a term (such as separating commas) are skipped.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidPropertyPath` if a `/` is not followed by a name.
    pub fn parse_order_by(input: &str) -> QueryOutcome<Vec<OrderByStatement>> {
        let mut parser = Self::new(input);
        let mut statements = Vec::new();

        while !parser.at_end() {
            if !parser.check(TokenKind::Ident) {
                parser.advance();
                continue;
            }

            let path = parser.parse_path()?;
            let direction = if parser.peek().is_keyword("desc") {
                parser.advance();
                OrderDirection::Descending
            } else {
                if parser.peek().is_keyword("asc") {
                    parser.advance();
                }
                OrderDirection::Ascending
            };

            statements.push(OrderByStatement { path, direction });
        }

        trace!(order_by = input, terms = statements.len(), "parsed order-by expression");
        Ok(statements)
    }

    // ==================== Token Cursor ====================

    /// Returns the current token without consuming it.
    fn peek(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&self.end)
    }

    /// Consumes and returns the current token.
    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.position < self.tokens.len() {
            self.position += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn at_end(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    /// Returns the logical operator at the cursor, if any.
    fn peek_logical(&self) -> Option<Operator> {
        let token = self.peek();
        if token.kind == TokenKind::Ident {
            Operator::logical(&token.literal)
        } else {
            None
        }
    }

    // ==================== Expressions ====================

    /// Parses an expression, returning it with the depth of its tree.
    fn parse_expression(&mut self, precedence: u8) -> QueryOutcome<(InfixExpression, usize)> {
        self.nesting += 1;
        if self.nesting > MAX_EXPRESSION_DEPTH {
            return Err(QueryError::NestingTooDeep {
                max: MAX_EXPRESSION_DEPTH,
            });
        }

        let (mut left, mut depth) = if self.check(TokenKind::LParen) {
            self.parse_grouped_expression()?
        } else {
            self.parse_filter_statement()?
        };

        while let Some(operator) = self.peek_logical() {
            if operator.precedence() <= precedence {
                break;
            }
            self.advance();

            let (right, right_depth) = self.parse_expression(operator.precedence())?;
            depth = depth.max(right_depth) + 1;
            if depth > MAX_EXPRESSION_DEPTH {
                return Err(QueryError::NestingTooDeep {
                    max: MAX_EXPRESSION_DEPTH,
                });
            }
            left = InfixExpression::new(Expression::Infix(left), operator, Expression::Infix(right));
        }

        self.nesting -= 1;
        Ok((left, depth))
    }

    fn parse_grouped_expression(&mut self) -> QueryOutcome<(InfixExpression, usize)> {
        self.advance(); // consume '('

        let inner = self.parse_expression(0)?;
        if !self.check(TokenKind::RParen) {
            return Err(QueryError::UnclosedParenthesis);
        }
        self.advance(); // consume ')'

        Ok(inner)
    }

    /// Parses a comparison, or a lambda wrapped as a complete expression.
    fn parse_filter_statement(&mut self) -> QueryOutcome<(InfixExpression, usize)> {
        let start = self.advance();
        if start.kind != TokenKind::Ident {
            return Err(match start.kind {
                TokenKind::Eof => QueryError::EmptyExpression,
                _ => QueryError::unexpected_token(start.describe(), start.position),
            });
        }

        let left = if self.check(TokenKind::Slash) {
            let mut segments = vec![start.literal];

            while self.check(TokenKind::Slash) {
                self.advance(); // consume '/'

                let segment = self.advance();
                if segment.kind != TokenKind::Ident {
                    return Err(QueryError::InvalidPropertyPath);
                }

                if let Some(function) = LambdaFunction::from_keyword(&segment.literal) {
                    if self.check(TokenKind::LParen) {
                        let collection =
                            PropertyPath::new(segments).ok_or(QueryError::InvalidPropertyPath)?;
                        let (lambda, depth) =
                            self.parse_lambda_expression(collection, function)?;
                        return Ok((InfixExpression::complete(lambda), depth + 1));
                    }
                }

                segments.push(segment.literal);
            }

            let path = PropertyPath::new(segments).ok_or(QueryError::InvalidPropertyPath)?;
            Expression::PropertyPath(path)
        } else {
            Expression::Identifier(start.literal)
        };

        let operator_token = self.advance();
        let operator = match operator_token.kind {
            TokenKind::Ident => Operator::comparison(&operator_token.literal),
            _ => None,
        }
        .ok_or_else(|| QueryError::InvalidConjunction {
            found: operator_token.describe(),
        })?;

        let value = self.advance();
        if !is_value_kind(value.kind) {
            return Err(QueryError::InvalidValueType {
                found: value.describe(),
            });
        }

        validate_operand(operator, &value)?;
        let literal = parse_literal(&value)?;

        Ok((
            InfixExpression::new(left, operator, Expression::Literal(literal)),
            1,
        ))
    }

    fn parse_lambda_expression(
        &mut self,
        collection: PropertyPath,
        function: LambdaFunction,
    ) -> QueryOutcome<(LambdaExpression, usize)> {
        if !self.check(TokenKind::LParen) {
            return Err(QueryError::InvalidLambda(
                "expected '(' after lambda function".to_string(),
            ));
        }
        self.advance(); // consume '('

        let parameter = self.advance();
        if parameter.kind != TokenKind::Ident {
            return Err(QueryError::InvalidLambda(
                "expected parameter name in lambda expression".to_string(),
            ));
        }

        if !self.check(TokenKind::Colon) {
            return Err(QueryError::InvalidLambda(
                "expected ':' after lambda parameter".to_string(),
            ));
        }
        self.advance(); // consume ':'

        let (body, depth) = self.parse_expression(0)?;

        if !self.check(TokenKind::RParen) {
            return Err(QueryError::InvalidLambda(
                "expected ')' to close lambda expression".to_string(),
            ));
        }
        self.advance(); // consume ')'

        let lambda = LambdaExpression {
            collection,
            function,
            parameter: parameter.literal,
            body: Box::new(Expression::Infix(body)),
        };
        Ok((lambda, depth))
    }

    /// Parses `IDENT ("/" IDENT)*` starting at the cursor.
    fn parse_path(&mut self) -> QueryOutcome<PropertyPath> {
        let mut segments = vec![self.advance().literal];

        while self.check(TokenKind::Slash) {
            self.advance(); // consume '/'

            let segment = self.advance();
            if segment.kind != TokenKind::Ident {
                return Err(QueryError::InvalidPropertyPath);
            }
            segments.push(segment.literal);
        }

        PropertyPath::new(segments).ok_or(QueryError::InvalidPropertyPath)
    }
}

/// Token kinds accepted on the right-hand side of a comparison.
fn is_value_kind(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::String
            | TokenKind::Integer
            | TokenKind::Guid
            | TokenKind::DateTime
            | TokenKind::Decimal
            | TokenKind::Float
            | TokenKind::Double
            | TokenKind::Date
            | TokenKind::Null
            | TokenKind::Boolean
            | TokenKind::Ident
    )
}

/// Checks operator/value compatibility before the literal is built.
fn validate_operand(operator: Operator, value: &Token) -> QueryOutcome<()> {
    if operator == Operator::Contains {
        if value.kind == TokenKind::Null {
            return Err(QueryError::invalid_operand(
                operator.as_str(),
                "cannot use 'contains' operand with null value",
            ));
        }
        if value.kind != TokenKind::String {
            return Err(QueryError::invalid_operand(
                operator.as_str(),
                "value must be a string when using 'contains' operand",
            ));
        }
    }

    if operator.is_ordering()
        && !matches!(
            value.kind,
            TokenKind::Integer
                | TokenKind::Decimal
                | TokenKind::Float
                | TokenKind::Double
                | TokenKind::DateTime
                | TokenKind::Date
        )
    {
        return Err(QueryError::invalid_operand(
            operator.as_str(),
            format!(
                "value must be a numeric or date type when using '{}' operand",
                operator
            ),
        ));
    }

    Ok(())
}

/// Strips one trailing type suffix, in either case.
fn strip_suffix(literal: &str, suffix: char) -> &str {
    literal
        .strip_suffix(suffix.to_ascii_lowercase())
        .or_else(|| literal.strip_suffix(suffix.to_ascii_uppercase()))
        .unwrap_or(literal)
}

/// Converts a value token into a typed literal.
///
/// # Errors
///
/// Returns `QueryError::InvalidLiteral` if the token text does not parse as
/// its kind.
pub(crate) fn parse_literal(token: &Token) -> QueryOutcome<Literal> {
    let text = token.literal.as_str();
    let invalid = || QueryError::invalid_literal(token.kind.describe(), text);

    let literal = match token.kind {
        TokenKind::String => Literal::String(token.literal.clone()),
        TokenKind::Ident => Literal::Enum(token.literal.clone()),
        TokenKind::Null => Literal::Null,
        TokenKind::Boolean => Literal::Boolean(text.eq_ignore_ascii_case("true")),
        TokenKind::Integer => strip_suffix(text, 'l')
            .parse::<i64>()
            .map(Literal::Integer)
            .map_err(|_| invalid())?,
        TokenKind::Float => strip_suffix(text, 'f')
            .parse::<f32>()
            .map(Literal::Float)
            .map_err(|_| invalid())?,
        TokenKind::Decimal => Decimal::from_str(strip_suffix(text, 'm'))
            .map(Literal::Decimal)
            .map_err(|_| invalid())?,
        TokenKind::Double => strip_suffix(text, 'd')
            .parse::<f64>()
            .map(Literal::Double)
            .map_err(|_| invalid())?,
        TokenKind::Guid => Uuid::try_parse(text)
            .map(Literal::Guid)
            .map_err(|_| invalid())?,
        TokenKind::Date => parse_date(text).map(Literal::Date).ok_or_else(invalid)?,
        TokenKind::DateTime => parse_datetime(text)
            .map(Literal::DateTime)
            .ok_or_else(invalid)?,
        _ => {
            return Err(QueryError::InvalidValueType {
                found: token.describe(),
            })
        }
    };

    Ok(literal)
}
