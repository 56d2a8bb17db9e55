//! Recursive descent parser for filter expressions.

use super::ast::{CompareOp, Expr, Literal, LogicalOp, Operand};
use super::error::{FilterError, FilterResult};
use super::lexer::{Lexer, Token, TokenKind};
use super::macros::Macro;

/// Parser for filter expressions.
///
/// # Grammar
///
/// ```text
/// expression ::= or_expr
/// or_expr    ::= and_expr ("||" and_expr)*
/// and_expr   ::= comparison ("&&" comparison)*
/// comparison ::= "(" expression ")" | operand compare_op operand
/// operand    ::= literal | identifier | macro | placeholder
/// compare_op ::= "=" | "!=" | ">" | ">=" | "<" | "<=" | "~" | "!~"
/// ```
///
/// # Operator Precedence (highest to lowest)
///
/// 1. comparison operators
/// 2. `&&` (AND)
/// 3. `||` (OR)
///
/// A run of the same connector becomes one [`Expr::Logical`] node, so the
/// tree only grows deeper with parentheses, which are limited to
/// [`MAX_NESTING_DEPTH`] levels.
///
/// Identifiers are not validated here; that happens at compile time against
/// whatever resolver the caller supplies.
///
/// # Example
///
/// ```
/// use filterql_rs::filter::{Expr, FilterParser};
///
/// let expr = FilterParser::parse("status = 'active' && votes > 10").unwrap();
/// assert!(matches!(expr, Expr::Logical { .. }));
/// ```
pub struct FilterParser {
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
}

/// Deepest parenthesis nesting [`FilterParser::parse`] accepts.
pub const MAX_NESTING_DEPTH: usize = 128;

impl FilterParser {
    /// Parses a filter expression string into an [`Expr`] tree.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::EmptyExpression` if the input is empty or whitespace.
    ///
    /// Returns `FilterError::UnsupportedOperator` if an operator-like token is
    /// not a comparison operator.
    ///
    /// Returns `FilterError::NestingTooDeep` if parentheses nest deeper than
    /// [`MAX_NESTING_DEPTH`].
    ///
    /// Returns another syntax error variant for any other malformed input.
    pub fn parse(input: &str) -> FilterResult<Expr> {
        if input.trim().is_empty() {
            return Err(FilterError::EmptyExpression);
        }

        let tokens = Lexer::new(input).tokenize()?;
        tracing::trace!(count = tokens.len(), "Tokenized filter expression");

        let mut parser = Self {
            tokens,
            position: 0,
            depth: 0,
        };
        let expr = parser.parse_expression()?;

        // Check that we consumed all tokens
        let remaining = parser.peek();
        if remaining.kind != TokenKind::Eof {
            return Err(FilterError::unexpected_token(
                remaining.text.clone(),
                remaining.position,
            ));
        }

        Ok(expr)
    }

    /// Returns the current token without consuming it.
    ///
    /// The token list always ends with `Eof`, which is never consumed.
    fn peek(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.position.min(last)]
    }

    /// Consumes and returns the current token.
    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    /// Checks if the current token is of the expected kind.
    fn check(&self, expected: TokenKind) -> bool {
        self.peek().kind == expected
    }

    /// Parses the top-level expression (OR expression).
    fn parse_expression(&mut self) -> FilterResult<Expr> {
        self.parse_or_expr()
    }

    /// Parses OR expressions: `and_expr ("||" and_expr)*`
    fn parse_or_expr(&mut self) -> FilterResult<Expr> {
        let mut operands = vec![self.parse_and_expr()?];

        while self.check(TokenKind::LogicalOr) {
            self.advance(); // consume '||'
            operands.push(self.parse_and_expr()?);
        }

        Self::join(LogicalOp::Or, operands)
    }

    /// Parses AND expressions: `comparison ("&&" comparison)*`
    fn parse_and_expr(&mut self) -> FilterResult<Expr> {
        let mut operands = vec![self.parse_comparison()?];

        while self.check(TokenKind::LogicalAnd) {
            self.advance(); // consume '&&'
            operands.push(self.parse_comparison()?);
        }

        Self::join(LogicalOp::And, operands)
    }

    fn join(op: LogicalOp, operands: Vec<Expr>) -> FilterResult<Expr> {
        Expr::logical(op, operands).ok_or(FilterError::UnexpectedEndOfInput)
    }

    /// Parses `"(" expression ")" | operand compare_op operand`.
    fn parse_comparison(&mut self) -> FilterResult<Expr> {
        if self.check(TokenKind::LeftParen) {
            let open = self.advance(); // consume '('
            if self.depth >= MAX_NESTING_DEPTH {
                return Err(FilterError::NestingTooDeep {
                    max_depth: MAX_NESTING_DEPTH,
                    position: open.position,
                });
            }

            self.depth += 1;
            let inner = self.parse_expression()?;
            self.depth -= 1;

            if !self.check(TokenKind::RightParen) {
                return Err(FilterError::UnclosedParenthesis);
            }
            self.advance(); // consume ')'
            return Ok(Expr::group(inner));
        }

        let left = self.parse_operand()?;
        let op = self.parse_compare_op()?;
        let right = self.parse_operand()?;

        Ok(Expr::compare(left, op, right))
    }

    /// Parses a comparison operator.
    fn parse_compare_op(&mut self) -> FilterResult<CompareOp> {
        let token = self.advance();
        match token.kind {
            TokenKind::Operator => CompareOp::from_symbol(&token.text)
                .ok_or_else(|| FilterError::unsupported_operator(token.text, token.position)),
            TokenKind::Eof => Err(FilterError::UnexpectedEndOfInput),
            _ => Err(FilterError::unexpected_token(token.text, token.position)),
        }
    }

    /// Parses a single operand.
    fn parse_operand(&mut self) -> FilterResult<Operand> {
        let token = self.advance();

        match token.kind {
            TokenKind::Identifier => Ok(Operand::Identifier(token.text)),
            TokenKind::QuotedString => Ok(Operand::Literal(Literal::Text(token.text))),
            TokenKind::Number => parse_number(&token.text).map(Operand::Literal),
            TokenKind::Bool => Ok(Operand::Literal(Literal::Bool(
                token.text.eq_ignore_ascii_case("true"),
            ))),
            TokenKind::Null => Ok(Operand::Literal(Literal::Null)),
            TokenKind::Macro => Macro::from_name(&token.text)
                .map(Operand::Macro)
                .ok_or_else(|| FilterError::unknown_macro(token.text)),
            TokenKind::Placeholder => Ok(Operand::Placeholder(token.text)),

            TokenKind::Eof => Err(FilterError::UnexpectedEndOfInput),
            TokenKind::Operator
            | TokenKind::LeftParen
            | TokenKind::RightParen
            | TokenKind::LogicalAnd
            | TokenKind::LogicalOr => Err(FilterError::unexpected_token(token.text, token.position)),
        }
    }
}

/// Parses number text as an integer when possible, otherwise as a float.
fn parse_number(text: &str) -> FilterResult<Literal> {
    if let Ok(i) = text.parse::<i64>() {
        return Ok(Literal::Integer(i));
    }
    match text.parse::<f64>() {
        Ok(f) if f.is_finite() => Ok(Literal::Real(f)),
        _ => Err(FilterError::InvalidNumber {
            literal: text.to_string(),
        }),
    }
}
