//! Abstract Syntax Tree (AST) for filter expressions.

use std::fmt;

use serde::Serialize;

use super::macros::Macro;

/// Represents a parsed filter expression.
///
/// The tree owns its children exclusively; identifiers are kept as opaque
/// path text until a resolver is applied at compile time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expr {
    /// A parenthesized sub-expression.
    Group {
        /// The grouped expression.
        inner: Box<Expr>,
    },

    /// A single `left op right` comparison.
    Comparison {
        /// Left-hand operand.
        left: Operand,
        /// Comparison operator.
        op: CompareOp,
        /// Right-hand operand.
        right: Operand,
    },

    /// A chain of two or more expressions joined by one connector.
    ///
    /// `a && b && c` is a single node with three operands, so long chains
    /// stay one level deep.
    Logical {
        /// The connector.
        op: LogicalOp,
        /// The joined expressions, in source order.
        operands: Vec<Expr>,
    },
}

impl Expr {
    /// Creates a comparison expression.
    ///
    /// # Example
    ///
    /// ```
    /// use filterql_rs::filter::{CompareOp, Expr, Literal, Operand};
    ///
    /// let expr = Expr::compare(
    ///     Operand::identifier("title"),
    ///     CompareOp::Eq,
    ///     Operand::Literal(Literal::Text("draft".to_string())),
    /// );
    /// assert!(matches!(expr, Expr::Comparison { .. }));
    /// ```
    pub fn compare(left: Operand, op: CompareOp, right: Operand) -> Self {
        Expr::Comparison { left, op, right }
    }

    /// Creates an AND expression from two expressions.
    ///
    /// An AND chain on the left is extended rather than nested.
    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::chain(LogicalOp::And, left, right)
    }

    /// Creates an OR expression from two expressions.
    ///
    /// An OR chain on the left is extended rather than nested.
    pub fn or(left: Expr, right: Expr) -> Self {
        Expr::chain(LogicalOp::Or, left, right)
    }

    /// Joins expressions with `op`.
    ///
    /// Returns the single operand unchanged when there is only one, and
    /// `None` when there are none.
    pub fn logical(op: LogicalOp, mut operands: Vec<Expr>) -> Option<Self> {
        match operands.len() {
            0 => None,
            1 => operands.pop(),
            _ => Some(Expr::Logical { op, operands }),
        }
    }

    fn chain(op: LogicalOp, left: Expr, right: Expr) -> Self {
        match left {
            Expr::Logical {
                op: left_op,
                mut operands,
            } if left_op == op => {
                operands.push(right);
                Expr::Logical { op, operands }
            }
            left => Expr::Logical {
                op,
                operands: vec![left, right],
            },
        }
    }

    /// Wraps an expression in a group.
    pub fn group(inner: Expr) -> Self {
        Expr::Group {
            inner: Box::new(inner),
        }
    }
}

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Operand {
    /// An inline literal value.
    Literal(Literal),
    /// A dotted field path, validated by the resolver at compile time.
    Identifier(String),
    /// A time macro such as `@now`.
    Macro(Macro),
    /// A `{:name}` named replacement supplied by the caller.
    Placeholder(String),
}

impl Operand {
    /// Creates an identifier operand.
    pub fn identifier(path: impl Into<String>) -> Self {
        Operand::Identifier(path.into())
    }

    /// Creates a text literal operand.
    pub fn text(value: impl Into<String>) -> Self {
        Operand::Literal(Literal::Text(value.into()))
    }
}

/// Inline literal values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Literal {
    /// Quoted text.
    Text(String),
    /// Integer number.
    Integer(i64),
    /// Floating point number.
    Real(f64),
    /// `true` / `false`.
    Bool(bool),
    /// `null`.
    Null,
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompareOp {
    /// `=`
    #[serde(rename = "=")]
    Eq,
    /// `!=`
    #[serde(rename = "!=")]
    Neq,
    /// `>`
    #[serde(rename = ">")]
    Gt,
    /// `>=`
    #[serde(rename = ">=")]
    Gte,
    /// `<`
    #[serde(rename = "<")]
    Lt,
    /// `<=`
    #[serde(rename = "<=")]
    Lte,
    /// `~` (contains / LIKE)
    #[serde(rename = "~")]
    Like,
    /// `!~` (does not contain / NOT LIKE)
    #[serde(rename = "!~")]
    NotLike,
}

impl CompareOp {
    /// Parses an operator from its filter syntax.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" => Some(CompareOp::Eq),
            "!=" => Some(CompareOp::Neq),
            ">" => Some(CompareOp::Gt),
            ">=" => Some(CompareOp::Gte),
            "<" => Some(CompareOp::Lt),
            "<=" => Some(CompareOp::Lte),
            "~" => Some(CompareOp::Like),
            "!~" => Some(CompareOp::NotLike),
            _ => None,
        }
    }

    /// Returns the filter syntax of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Neq => "!=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Like => "~",
            CompareOp::NotLike => "!~",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Logical connectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOp {
    /// `&&`
    And,
    /// `||`
    Or,
}

impl LogicalOp {
    /// Returns the SQL keyword for the connector.
    pub fn sql(self) -> &'static str {
        match self {
            LogicalOp::And => "AND",
            LogicalOp::Or => "OR",
        }
    }
}
