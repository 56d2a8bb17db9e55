//! Tests for the filter parser.

use super::*;

fn ident(path: &str) -> Operand {
    Operand::identifier(path)
}

fn int(value: i64) -> Operand {
    Operand::Literal(Literal::Integer(value))
}

// ==================== Comparison Tests ====================

#[test]
fn test_parse_simple_comparison() {
    let expr = FilterParser::parse("test1 > 1").unwrap();
    assert_eq!(expr, Expr::compare(ident("test1"), CompareOp::Gt, int(1)));
}

#[test]
fn test_parse_all_comparison_operators() {
    let cases = [
        ("a = 1", CompareOp::Eq),
        ("a != 1", CompareOp::Neq),
        ("a > 1", CompareOp::Gt),
        ("a >= 1", CompareOp::Gte),
        ("a < 1", CompareOp::Lt),
        ("a <= 1", CompareOp::Lte),
        ("a ~ 1", CompareOp::Like),
        ("a !~ 1", CompareOp::NotLike),
    ];

    for (input, op) in cases {
        assert_eq!(
            FilterParser::parse(input).unwrap(),
            Expr::compare(ident("a"), op, int(1)),
            "input: {input}"
        );
    }
}

#[test]
fn test_parse_without_whitespace() {
    assert_eq!(
        FilterParser::parse("a>=-1").unwrap(),
        Expr::compare(ident("a"), CompareOp::Gte, int(-1))
    );
    assert_eq!(
        FilterParser::parse("a!~'x'").unwrap(),
        Expr::compare(ident("a"), CompareOp::NotLike, Operand::text("x"))
    );
}

#[test]
fn test_parse_nested_field_path() {
    let expr = FilterParser::parse("test4.sub = 'x'").unwrap();
    assert_eq!(
        expr,
        Expr::compare(ident("test4.sub"), CompareOp::Eq, Operand::text("x"))
    );
}

#[test]
fn test_parse_literal_on_left() {
    let expr = FilterParser::parse("'lorem' ~ test1").unwrap();
    assert_eq!(
        expr,
        Expr::compare(Operand::text("lorem"), CompareOp::Like, ident("test1"))
    );
}

// ==================== Literal Tests ====================

#[test]
fn test_parse_string_literals() {
    let expr = FilterParser::parse(r#"a = "double" && b = 'it\'s'"#).unwrap();
    assert_eq!(
        expr,
        Expr::and(
            Expr::compare(ident("a"), CompareOp::Eq, Operand::text("double")),
            Expr::compare(ident("b"), CompareOp::Eq, Operand::text("it's")),
        )
    );
}

#[test]
fn test_parse_numbers() {
    let parse_right = |input: &str| match FilterParser::parse(input).unwrap() {
        Expr::Comparison { right, .. } => right,
        other => panic!("expected comparison, got {other:?}"),
    };

    assert_eq!(parse_right("a = 42"), int(42));
    assert_eq!(parse_right("a = -7"), int(-7));
    assert_eq!(parse_right("a = +3"), int(3));
    assert_eq!(
        parse_right("a = 123.456"),
        Operand::Literal(Literal::Real(123.456))
    );
    assert_eq!(parse_right("a = .5"), Operand::Literal(Literal::Real(0.5)));
    assert_eq!(
        parse_right("a = 99999999999999999999"),
        Operand::Literal(Literal::Real(1e20))
    );
}

#[test]
fn test_parse_keywords_case_insensitive() {
    let expr = FilterParser::parse("a = TRUE && b = False && c = NULL").unwrap();
    assert_eq!(
        expr,
        Expr::and(
            Expr::and(
                Expr::compare(ident("a"), CompareOp::Eq, Operand::Literal(Literal::Bool(true))),
                Expr::compare(ident("b"), CompareOp::Eq, Operand::Literal(Literal::Bool(false))),
            ),
            Expr::compare(ident("c"), CompareOp::Eq, Operand::Literal(Literal::Null)),
        )
    );
}

#[test]
fn test_parse_macro_and_placeholder() {
    let expr = FilterParser::parse("created > @todayStart && title = {:title}").unwrap();
    assert_eq!(
        expr,
        Expr::and(
            Expr::compare(ident("created"), CompareOp::Gt, Operand::Macro(Macro::TodayStart)),
            Expr::compare(
                ident("title"),
                CompareOp::Eq,
                Operand::Placeholder("title".to_string())
            ),
        )
    );
}

// ==================== Boolean Operator Tests ====================

#[test]
fn test_parse_and_binds_tighter_than_or() {
    let expr = FilterParser::parse("a = 1 || b = 2 && c = 3").unwrap();
    assert_eq!(
        expr,
        Expr::or(
            Expr::compare(ident("a"), CompareOp::Eq, int(1)),
            Expr::and(
                Expr::compare(ident("b"), CompareOp::Eq, int(2)),
                Expr::compare(ident("c"), CompareOp::Eq, int(3)),
            ),
        )
    );
}

#[test]
fn test_parse_or_chain_is_flat() {
    let expr = FilterParser::parse("a = 1 || b = 2 || c = 3").unwrap();
    assert_eq!(
        expr,
        Expr::or(
            Expr::or(
                Expr::compare(ident("a"), CompareOp::Eq, int(1)),
                Expr::compare(ident("b"), CompareOp::Eq, int(2)),
            ),
            Expr::compare(ident("c"), CompareOp::Eq, int(3)),
        )
    );
}

#[test]
fn test_parse_grouping_overrides_precedence() {
    let expr = FilterParser::parse("(a = 1 || b = 2) && c = 3").unwrap();
    assert_eq!(
        expr,
        Expr::and(
            Expr::group(Expr::or(
                Expr::compare(ident("a"), CompareOp::Eq, int(1)),
                Expr::compare(ident("b"), CompareOp::Eq, int(2)),
            )),
            Expr::compare(ident("c"), CompareOp::Eq, int(3)),
        )
    );
}

#[test]
fn test_parse_nested_groups() {
    let expr = FilterParser::parse("((a = 1))").unwrap();
    assert_eq!(
        expr,
        Expr::group(Expr::group(Expr::compare(ident("a"), CompareOp::Eq, int(1))))
    );
}

#[test]
fn test_parse_multiline_input() {
    let expr = FilterParser::parse("\n\ta = 1 ||\n\tb = 2\n").unwrap();
    assert!(matches!(
        expr,
        Expr::Logical {
            op: LogicalOp::Or,
            ..
        }
    ));
}

// ==================== Error Tests ====================

#[test]
fn test_parse_empty_input() {
    assert_eq!(FilterParser::parse(""), Err(FilterError::EmptyExpression));
    assert_eq!(FilterParser::parse("  \t\n "), Err(FilterError::EmptyExpression));
}

#[test]
fn test_parse_unbalanced_parenthesis() {
    assert_eq!(
        FilterParser::parse("(test1 > 1"),
        Err(FilterError::UnclosedParenthesis)
    );
    assert_eq!(
        FilterParser::parse("test1 > 1)"),
        Err(FilterError::unexpected_token(")", 9))
    );
    assert!(FilterParser::parse("()").unwrap_err().is_syntax());
}

#[test]
fn test_parse_unsupported_operator() {
    let err = FilterParser::parse("test1 + 123").unwrap_err();
    assert_eq!(err, FilterError::unsupported_operator("+", 6));
    assert_eq!(err.kind(), FilterErrorKind::UnsupportedOperator);

    for input in ["a == 1", "a & b", "a | b", "a => 1", "a * 2"] {
        assert_eq!(
            FilterParser::parse(input).unwrap_err().kind(),
            FilterErrorKind::UnsupportedOperator,
            "input: {input}"
        );
    }
}

#[test]
fn test_parse_missing_operator() {
    assert_eq!(
        FilterParser::parse("test1"),
        Err(FilterError::UnexpectedEndOfInput)
    );
    assert_eq!(
        FilterParser::parse("test1 test2"),
        Err(FilterError::unexpected_token("test2", 6))
    );
}

#[test]
fn test_parse_missing_operand() {
    assert_eq!(
        FilterParser::parse("test1 >"),
        Err(FilterError::UnexpectedEndOfInput)
    );
    assert_eq!(
        FilterParser::parse("a = 1 &&"),
        Err(FilterError::UnexpectedEndOfInput)
    );
    assert_eq!(
        FilterParser::parse("&& a = 1"),
        Err(FilterError::unexpected_token("&&", 0))
    );
}

#[test]
fn test_parse_duplicate_operator() {
    assert_eq!(
        FilterParser::parse("a > > 1"),
        Err(FilterError::unexpected_token(">", 4))
    );
}

#[test]
fn test_parse_lexer_errors_propagate() {
    assert_eq!(
        FilterParser::parse("a = 'open"),
        Err(FilterError::UnterminatedString { position: 4 })
    );
    assert_eq!(
        FilterParser::parse("a = #1"),
        Err(FilterError::UnexpectedCharacter {
            character: '#',
            position: 4
        })
    );
}

#[test]
fn test_parse_unknown_macro() {
    assert_eq!(
        FilterParser::parse("a > @yesterday"),
        Err(FilterError::unknown_macro("yesterday"))
    );
    // Macro names are case-sensitive
    assert_eq!(
        FilterParser::parse("a > @NOW"),
        Err(FilterError::unknown_macro("NOW"))
    );
}

#[test]
fn test_parse_errors_are_syntax_kind() {
    for input in ["", "(a = 1", "a", "a = 'x", "a = @nope", "a = {:}"] {
        let err = FilterParser::parse(input).unwrap_err();
        assert!(err.is_syntax(), "input: {input}, error: {err}");
    }
}

#[test]
fn test_parse_identifiers_not_validated() {
    // Any identifier parses; validation happens at compile time.
    assert!(FilterParser::parse("anything.at.all = 1").is_ok());
}

// ==================== Size Limit Tests ====================

#[test]
fn test_parse_nesting_at_limit() {
    let depth = MAX_NESTING_DEPTH;
    let input = format!("{}a = 1{}", "(".repeat(depth), ")".repeat(depth));
    assert!(FilterParser::parse(&input).is_ok());
}

#[test]
fn test_parse_nesting_too_deep() {
    let depth = MAX_NESTING_DEPTH + 1;
    let input = format!("{}a = 1{}", "(".repeat(depth), ")".repeat(depth));
    assert_eq!(
        FilterParser::parse(&input),
        Err(FilterError::NestingTooDeep {
            max_depth: MAX_NESTING_DEPTH,
            position: MAX_NESTING_DEPTH,
        })
    );
}

#[test]
fn test_parse_deep_nesting_fails_without_overflow() {
    let input = format!("{}a = 1{}", "(".repeat(10_000), ")".repeat(10_000));
    let err = FilterParser::parse(&input).unwrap_err();
    assert!(matches!(err, FilterError::NestingTooDeep { .. }));
    assert!(err.is_syntax());

    // Unbalanced input hits the limit before the missing parentheses.
    let unbalanced = format!("{}a = 1", "(".repeat(10_000));
    assert!(matches!(
        FilterParser::parse(&unbalanced),
        Err(FilterError::NestingTooDeep { .. })
    ));
}

#[test]
fn test_parse_long_chain_is_one_node() {
    let input = vec!["a = 1"; 100_000].join(" && ");
    match FilterParser::parse(&input).unwrap() {
        Expr::Logical { op, operands } => {
            assert_eq!(op, LogicalOp::And);
            assert_eq!(operands.len(), 100_000);
        }
        other => panic!("expected logical, got {other:?}"),
    }
}

#[test]
fn test_parse_mixed_chain_nests_once() {
    let input = vec!["a = 1 && b = 2"; 1_000].join(" || ");
    match FilterParser::parse(&input).unwrap() {
        Expr::Logical { op, operands } => {
            assert_eq!(op, LogicalOp::Or);
            assert_eq!(operands.len(), 1_000);
            assert!(operands.iter().all(|e| matches!(
                e,
                Expr::Logical {
                    op: LogicalOp::And,
                    operands
                } if operands.len() == 2
            )));
        }
        other => panic!("expected logical, got {other:?}"),
    }
}
