//! Tests for the filter and order-by parsers.

use super::*;
use crate::error::{ErrorKind, QueryError};

fn parse(input: &str) -> InfixExpression {
    QueryParser::parse_filter(input).unwrap().expression
}

fn literal(expression: &Expression) -> &Literal {
    match expression {
        Expression::Literal(literal) => literal,
        other => panic!("expected literal, got {:?}", other),
    }
}

fn infix(expression: &Expression) -> &InfixExpression {
    match expression {
        Expression::Infix(infix) => infix,
        other => panic!("expected infix, got {:?}", other),
    }
}

fn lambda(expression: &InfixExpression) -> &LambdaExpression {
    assert_eq!(expression.operator, Operator::Complete);
    match expression.left.as_ref() {
        Expression::Lambda(lambda) => lambda,
        other => panic!("expected lambda, got {:?}", other),
    }
}

fn path(segments: &[&str]) -> PropertyPath {
    PropertyPath::new(segments.iter().map(|s| s.to_string()).collect()).unwrap()
}

// ==================== Comparisons ====================

#[test]
fn test_parse_simple_comparison() {
    let expression = parse("Name eq 'John'");
    assert_eq!(*expression.left, Expression::Identifier("Name".to_string()));
    assert_eq!(expression.operator, Operator::Eq);
    assert_eq!(literal(&expression.right), &Literal::String("John".to_string()));
}

#[test]
fn test_parse_operators_case_insensitive() {
    assert_eq!(parse("age EQ 21").operator, Operator::Eq);
    assert_eq!(parse("age Ne 10").operator, Operator::Ne);
    assert_eq!(parse("name CONTAINS 'x'").operator, Operator::Contains);
    assert_eq!(parse("age lt 99").operator, Operator::Lt);
    assert_eq!(parse("age lte 99").operator, Operator::Lte);
    assert_eq!(parse("age gt 99").operator, Operator::Gt);
    assert_eq!(parse("age gte 99").operator, Operator::Gte);
}

#[test]
fn test_parse_literal_types() {
    assert_eq!(literal(&parse("age eq 21").right), &Literal::Integer(21));
    assert_eq!(literal(&parse("age eq 21L").right), &Literal::Integer(21));
    assert_eq!(literal(&parse("x eq 3.5f").right), &Literal::Float(3.5));
    assert_eq!(literal(&parse("x eq 3.5d").right), &Literal::Double(3.5));
    assert_eq!(
        literal(&parse("x eq 3.14159265359m").right),
        &Literal::Decimal("3.14159265359".parse().unwrap())
    );
    assert_eq!(literal(&parse("x eq true").right), &Literal::Boolean(true));
    assert_eq!(literal(&parse("x eq FALSE").right), &Literal::Boolean(false));
    assert_eq!(literal(&parse("name eq NULL").right), &Literal::Null);
    assert_eq!(
        literal(&parse("status eq Active").right),
        &Literal::Enum("Active".to_string())
    );
}

#[test]
fn test_parse_guid_literal() {
    let expression = parse("Id eq e4c7772b-8947-4e46-98ed-644b417d2a08");
    assert_eq!(
        literal(&expression.right),
        &Literal::Guid("e4c7772b-8947-4e46-98ed-644b417d2a08".parse().unwrap())
    );
}

#[test]
fn test_parse_date_literals() {
    let expression = parse("dateOfBirth lt 2000-01-01");
    assert_eq!(
        literal(&expression.right),
        &Literal::Date(chrono::NaiveDate::from_ymd_opt(2000, 1, 1).unwrap())
    );

    let expression = parse("dateOfBirth eq 2023-01-30T09:29:55.1750906Z");
    assert!(matches!(literal(&expression.right), Literal::DateTime(_)));
}

#[test]
fn test_parse_string_with_spaces() {
    let expression = parse("firstName eq 'Manager 01'");
    assert_eq!(
        literal(&expression.right),
        &Literal::String("Manager 01".to_string())
    );
}

// ==================== Precedence ====================

#[test]
fn test_parse_and() {
    let expression = parse("Name eq 'John' and Age eq 10");
    assert_eq!(expression.operator, Operator::And);
    assert_eq!(infix(&expression.left).operator, Operator::Eq);
    assert_eq!(infix(&expression.right).operator, Operator::Eq);
}

#[test]
fn test_and_binds_tighter_than_or() {
    let expression = parse("age eq 1 and firstName eq 'Harry' or Age eq 2");
    assert_eq!(expression.operator, Operator::Or);
    assert_eq!(infix(&expression.left).operator, Operator::And);

    let expression = parse("age eq 1 or firstName eq 'Harry' and Age eq 2");
    assert_eq!(expression.operator, Operator::Or);
    assert_eq!(infix(&expression.right).operator, Operator::And);
}

#[test]
fn test_operators_are_left_associative() {
    let expression = parse("a eq 1 or b eq 2 or c eq 3");
    assert_eq!(expression.operator, Operator::Or);
    assert_eq!(infix(&expression.left).operator, Operator::Or);
    assert_eq!(infix(&expression.right).operator, Operator::Eq);
}

#[test]
fn test_parse_grouping() {
    let expression = parse("(Name eq 'John' or Name eq 'Jane') and Age eq 10");
    assert_eq!(expression.operator, Operator::And);
    assert_eq!(infix(&expression.left).operator, Operator::Or);
}

#[test]
fn test_parse_is_deterministic() {
    let input = "(age eq 1 or tags/any(t: t eq 'x')) and manager/firstName ne null";
    let first = QueryParser::parse_filter(input).unwrap();
    let second = QueryParser::parse_filter(input).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.to_string(), second.to_string());
}

// ==================== Property Paths ====================

#[test]
fn test_parse_property_path() {
    let expression = parse("manager/manager/firstName eq 'John'");
    assert_eq!(
        *expression.left,
        Expression::PropertyPath(path(&["manager", "manager", "firstName"]))
    );
}

#[test]
fn test_parse_invalid_property_paths() {
    assert_eq!(
        QueryParser::parse_filter("manager//firstName eq 'John'").unwrap_err(),
        QueryError::InvalidPropertyPath
    );
    assert!(matches!(
        QueryParser::parse_filter("/manager eq 'John'").unwrap_err(),
        QueryError::UnexpectedToken { position: 0, .. }
    ));
    assert!(QueryParser::parse_filter("manager/ eq 'John'").is_err());
}

// ==================== Lambdas ====================

#[test]
fn test_parse_lambda() {
    let expression = parse("tags/any(t: t eq 'tag 2')");
    let lambda = lambda(&expression);
    assert_eq!(lambda.collection, path(&["tags"]));
    assert_eq!(lambda.function, LambdaFunction::Any);
    assert_eq!(lambda.parameter, "t");

    let body = infix(&lambda.body);
    assert_eq!(*body.left, Expression::Identifier("t".to_string()));
    assert_eq!(literal(&body.right), &Literal::String("tag 2".to_string()));
}

#[test]
fn test_parse_lambda_with_nested_property() {
    let expression = parse("addresses/all(address: address/city eq 'New York')");
    let lambda = lambda(&expression);
    assert_eq!(lambda.function, LambdaFunction::All);
    assert_eq!(
        *infix(&lambda.body).left,
        Expression::PropertyPath(path(&["address", "city"]))
    );
}

#[test]
fn test_parse_lambda_on_nested_collection() {
    let expression = parse("manager/addresses/ANY(a: a/city eq 'Boston')");
    let lambda = lambda(&expression);
    assert_eq!(lambda.collection, path(&["manager", "addresses"]));
    assert_eq!(lambda.function, LambdaFunction::Any);
}

#[test]
fn test_parse_lambda_with_logical_body() {
    let expression = parse("items/all(i: i/price gt 100 or i/discount lt 0.1d)");
    let body = infix(&lambda(&expression).body);
    assert_eq!(body.operator, Operator::Or);
}

#[test]
fn test_parse_lambda_with_logical_operators() {
    assert_eq!(
        parse("name eq 'John' and tags/any(t: t eq 'important')").operator,
        Operator::And
    );
    assert_eq!(
        parse("age gt 18 or categories/all(c: c ne null)").operator,
        Operator::Or
    );
    assert_eq!(
        parse("tags/any(t: t contains 'work') and status eq 'active'").operator,
        Operator::And
    );
}

#[test]
fn test_parse_invalid_lambdas() {
    for input in [
        "tags/any(t: t eq)",
        "tags/any(t t eq 'test')",
        "tags/any( : t eq 'test')",
        "tags/any(t:)",
        "tags/any",
        "tags/any()",
        "tags/invalid(t: t eq 'test')",
        "tags/any(t: t eq 'test'",
    ] {
        assert!(
            QueryParser::parse_filter(input).is_err(),
            "expected {:?} to fail",
            input
        );
    }
}

#[test]
fn test_parse_lambda_error_messages() {
    assert_eq!(
        QueryParser::parse_filter("tags/any(t t eq 'test')").unwrap_err(),
        QueryError::InvalidLambda("expected ':' after lambda parameter".to_string())
    );
    assert_eq!(
        QueryParser::parse_filter("tags/any(: t eq 'test')").unwrap_err(),
        QueryError::InvalidLambda("expected parameter name in lambda expression".to_string())
    );
    assert_eq!(
        QueryParser::parse_filter("tags/any(t: t eq 'test'").unwrap_err(),
        QueryError::InvalidLambda("expected ')' to close lambda expression".to_string())
    );
}

// ==================== Errors ====================

#[test]
fn test_parse_empty() {
    assert_eq!(
        QueryParser::parse_filter("").unwrap_err(),
        QueryError::EmptyExpression
    );
    assert_eq!(
        QueryParser::parse_filter("   ").unwrap_err(),
        QueryError::EmptyExpression
    );
}

#[test]
fn test_parse_invalid_filters() {
    for input in [
        "Name",
        "eq nee",
        "name nee 10",
        "id contains 10",
        "id contaiins '10'",
        "id eq       John'",
        "name contains null",
        "age lt null",
        "age gt null",
        "age lte null",
        "age gte null",
        "age lt 'ten'",
    ] {
        assert!(
            QueryParser::parse_filter(input).is_err(),
            "expected {:?} to fail",
            input
        );
    }
}

#[test]
fn test_parse_invalid_conjunction() {
    assert_eq!(
        QueryParser::parse_filter("name nee 10").unwrap_err(),
        QueryError::InvalidConjunction {
            found: "nee".to_string()
        }
    );
}

#[test]
fn test_parse_operand_messages() {
    assert_eq!(
        QueryParser::parse_filter("name contains null")
            .unwrap_err()
            .to_string(),
        "cannot use 'contains' operand with null value"
    );
    assert_eq!(
        QueryParser::parse_filter("id contains 10")
            .unwrap_err()
            .to_string(),
        "value must be a string when using 'contains' operand"
    );
    assert_eq!(
        QueryParser::parse_filter("age gte null")
            .unwrap_err()
            .to_string(),
        "value must be a numeric or date type when using 'gte' operand"
    );
}

#[test]
fn test_parse_unclosed_parenthesis() {
    assert_eq!(
        QueryParser::parse_filter("(age eq 1").unwrap_err(),
        QueryError::UnclosedParenthesis
    );
}

#[test]
fn test_parse_trailing_tokens() {
    assert!(matches!(
        QueryParser::parse_filter("age eq 1 age eq 2").unwrap_err(),
        QueryError::UnexpectedToken { .. }
    ));
    assert!(matches!(
        QueryParser::parse_filter("age eq 1)").unwrap_err(),
        QueryError::UnexpectedToken { .. }
    ));
}

#[test]
fn test_parse_invalid_literal_fails_fast() {
    assert_eq!(
        QueryParser::parse_filter("age eq 2000-13").unwrap_err(),
        QueryError::InvalidLiteral {
            kind: "integer".to_string(),
            literal: "2000-13".to_string()
        }
    );
}

// ==================== Nesting Limits ====================

fn nested_groups(levels: usize) -> String {
    format!("{}age eq 1{}", "(".repeat(levels), ")".repeat(levels))
}

fn or_chain(terms: usize) -> String {
    vec!["age eq 1"; terms].join(" or ")
}

#[test]
fn test_parse_deeply_nested_groups_fails() {
    let err = QueryParser::parse_filter(&nested_groups(10_000)).unwrap_err();
    assert_eq!(
        err,
        QueryError::NestingTooDeep {
            max: MAX_EXPRESSION_DEPTH
        }
    );
    assert_eq!(err.kind(), ErrorKind::Syntax);
}

#[test]
fn test_parse_long_or_chain_fails() {
    assert_eq!(
        QueryParser::parse_filter(&or_chain(10_000)).unwrap_err(),
        QueryError::NestingTooDeep {
            max: MAX_EXPRESSION_DEPTH
        }
    );
}

#[test]
fn test_parse_deeply_nested_lambdas_fails() {
    let levels = 10_000;
    let input = format!(
        "{}x eq 1{}",
        "tags/any(x: ".repeat(levels),
        ")".repeat(levels)
    );
    assert!(matches!(
        QueryParser::parse_filter(&input).unwrap_err(),
        QueryError::NestingTooDeep { .. }
    ));
}

#[test]
fn test_parse_nesting_up_to_limit() {
    assert!(QueryParser::parse_filter(&nested_groups(MAX_EXPRESSION_DEPTH - 1)).is_ok());
    assert!(QueryParser::parse_filter(&nested_groups(MAX_EXPRESSION_DEPTH)).is_err());

    assert!(QueryParser::parse_filter(&or_chain(MAX_EXPRESSION_DEPTH)).is_ok());
    assert!(QueryParser::parse_filter(&or_chain(MAX_EXPRESSION_DEPTH + 1)).is_err());
}

// ==================== Order By ====================

#[test]
fn test_parse_order_by() {
    let statements = QueryParser::parse_order_by("age desc, firstname").unwrap();
    assert_eq!(
        statements,
        vec![
            OrderByStatement {
                path: path(&["age"]),
                direction: OrderDirection::Descending,
            },
            OrderByStatement {
                path: path(&["firstname"]),
                direction: OrderDirection::Ascending,
            },
        ]
    );
}

#[test]
fn test_parse_order_by_keywords_case_insensitive() {
    let statements = QueryParser::parse_order_by("age DESC firstname ASC").unwrap();
    assert_eq!(statements.len(), 2);
    assert_eq!(statements[0].direction, OrderDirection::Descending);
    assert_eq!(statements[1].direction, OrderDirection::Ascending);
}

#[test]
fn test_parse_order_by_nested_path() {
    let statements = QueryParser::parse_order_by("manager/age desc").unwrap();
    assert_eq!(statements[0].path, path(&["manager", "age"]));
    assert_eq!(statements[0].to_string(), "manager/age desc");
}

#[test]
fn test_parse_order_by_skips_stray_tokens() {
    let statements = QueryParser::parse_order_by(", ( age ) ,").unwrap();
    assert_eq!(statements.len(), 1);
    assert_eq!(statements[0].path, path(&["age"]));
}

#[test]
fn test_parse_order_by_empty() {
    assert!(QueryParser::parse_order_by("").unwrap().is_empty());
}

#[test]
fn test_parse_order_by_invalid_path() {
    assert_eq!(
        QueryParser::parse_order_by("manager/, age").unwrap_err(),
        QueryError::InvalidPropertyPath
    );
}
