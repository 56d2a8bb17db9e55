//! Compilation of parsed filters into parameterized SQL.
//!
//! The output uses two placeholder conventions understood by the downstream
//! query builder: `[[column]]` for quoted column references and `{:name}` for
//! bound parameters. No literal operand is ever copied into the SQL text; only
//! the fixed fragments `1`, `0`, `''` and `NULL` are written inline.
//!
//! # Example
//!
//! ```
//! use filterql_rs::filter::{compile, BoundValue, Replacements};
//! use filterql_rs::resolver::StaticResolver;
//!
//! let resolver = StaticResolver::new(["votes", "title"]);
//! let compiled = compile("votes > 10 && title ~ 'rust'", &Replacements::new(), &resolver).unwrap();
//!
//! assert_eq!(compiled.sql, r"([[votes]] > {:p0} AND [[title]] LIKE {:p1} ESCAPE '\')");
//! assert_eq!(compiled.params["p0"], BoundValue::Integer(10));
//! assert_eq!(compiled.params["p1"], BoundValue::Text("%rust%".to_string()));
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};

use super::ast::{CompareOp, Expr, Literal, LogicalOp, Operand};
use super::binder::{is_valid_prefix, ParamBinder, DEFAULT_PARAM_PREFIX};
use super::error::{FilterError, FilterResult};
use super::macros::MacroClock;
use super::parser::FilterParser;
use super::value::{BoundValue, Replacements, Value};
use crate::resolver::{FieldResolver, ResolvedField};

/// The result of compiling a filter.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpression {
    /// SQL boolean expression with `[[column]]` and `{:name}` placeholders.
    pub sql: String,
    /// Values for every `{:name}` placeholder in `sql`.
    pub params: BTreeMap<String, BoundValue>,
    /// Resolved fields referenced by the expression, in order of first use.
    pub fields: Vec<ResolvedField>,
}

impl CompiledExpression {
    /// Returns `sql` with every bound placeholder replaced by an SQL literal.
    ///
    /// Intended for logs and debugging output; execute `sql` with `params` instead.
    pub fn render_inline(&self) -> String {
        let mut out = String::with_capacity(self.sql.len());
        let mut rest = self.sql.as_str();

        while let Some(start) = rest.find("{:") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let bound = after
                .find('}')
                .and_then(|end| self.params.get(&after[..end]).map(|value| (end, value)));
            match bound {
                Some((end, value)) => {
                    out.push_str(&value.to_sql_literal());
                    rest = &after[end + 1..];
                }
                None => {
                    out.push_str("{:");
                    rest = after;
                }
            }
        }

        out.push_str(rest);
        out
    }

    /// Returns true if any referenced field is multi-valued.
    pub fn has_multi_valued_fields(&self) -> bool {
        self.fields.iter().any(|f| f.multi_valued)
    }
}

impl fmt::Display for CompiledExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Compiles `filter` against `resolver` with the given named replacements.
///
/// Shorthand for [`FilterCompiler`] with default options.
pub fn compile(
    filter: &str,
    replacements: &Replacements,
    resolver: &dyn FieldResolver,
) -> FilterResult<CompiledExpression> {
    FilterCompiler::new(resolver)
        .replacements(replacements)
        .compile(filter)
}

/// Configurable filter compiler.
///
/// Holds no state between calls, so one instance can compile any number of
/// filters, including from several threads at once.
#[derive(Clone, Copy)]
pub struct FilterCompiler<'a> {
    resolver: &'a dyn FieldResolver,
    replacements: Option<&'a Replacements>,
    now: Option<DateTime<Utc>>,
    param_prefix: &'a str,
}

impl<'a> FilterCompiler<'a> {
    /// Creates a compiler using `resolver` for every identifier.
    pub fn new(resolver: &'a dyn FieldResolver) -> Self {
        Self {
            resolver,
            replacements: None,
            now: None,
            param_prefix: DEFAULT_PARAM_PREFIX,
        }
    }

    /// Sets the values for `{:name}` placeholders.
    pub fn replacements(mut self, replacements: &'a Replacements) -> Self {
        self.replacements = Some(replacements);
        self
    }

    /// Fixes the instant macros expand against. Defaults to the system time
    /// at the start of each compile call.
    pub fn now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    /// Sets the prefix of generated parameter names (default `p`).
    ///
    /// Use distinct prefixes when several compiled filters end up in one query.
    /// The prefix must be ASCII letters, digits or `_`; anything else fails
    /// at compile time with `FilterError::InvalidParamPrefix`.
    pub fn param_prefix(mut self, prefix: &'a str) -> Self {
        self.param_prefix = prefix;
        self
    }

    /// Parses and compiles a filter string.
    pub fn compile(&self, filter: &str) -> FilterResult<CompiledExpression> {
        let expr = FilterParser::parse(filter)?;
        self.compile_expr(&expr)
    }

    /// Compiles an already parsed expression.
    pub fn compile_expr(&self, expr: &Expr) -> FilterResult<CompiledExpression> {
        if !is_valid_prefix(self.param_prefix) {
            return Err(FilterError::InvalidParamPrefix {
                prefix: self.param_prefix.to_string(),
            });
        }

        let empty = Replacements::new();
        let replacements = self.replacements.unwrap_or(&empty);
        let clock = self.now.map_or_else(MacroClock::system, MacroClock::new);

        let mut compilation = Compilation {
            resolver: self.resolver,
            replacements,
            clock,
            binder: ParamBinder::new(self.param_prefix, replacements),
            fields: Vec::new(),
            seen: HashSet::new(),
        };

        let sql = compilation.compile_node(expr)?;
        let params = compilation.binder.finish();
        let fields = compilation.fields;

        tracing::debug!(
            sql_len = sql.len(),
            params = params.len(),
            fields = fields.len(),
            "Compiled filter expression"
        );

        Ok(CompiledExpression {
            sql,
            params,
            fields,
        })
    }
}

impl fmt::Debug for FilterCompiler<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterCompiler")
            .field("replacements", &self.replacements.map(|r| r.len()))
            .field("now", &self.now)
            .field("param_prefix", &self.param_prefix)
            .finish_non_exhaustive()
    }
}

/// A compiled operand, before it is written into the SQL text.
///
/// Binding is deferred so LIKE can rewrite a value before it gets a name.
#[derive(Debug, Clone)]
enum Term {
    /// A resolved column.
    Column(ResolvedField),
    /// A value to bind; `name` is set for caller-supplied replacements.
    Value {
        value: BoundValue,
        name: Option<String>,
    },
    /// A fixed inline fragment (`1` / `0`).
    Inline(&'static str),
    /// The empty string or null sentinel.
    Blank { null: bool },
}

impl Term {
    fn from_value(value: &Value, name: Option<&str>) -> Self {
        match value {
            Value::Null => Term::Blank { null: true },
            Value::Bool(b) => Term::Inline(if *b { "1" } else { "0" }),
            other => Term::Value {
                value: other.to_bound(),
                name: name.map(str::to_string),
            },
        }
    }

    fn is_blank(&self) -> bool {
        matches!(self, Term::Blank { .. })
    }

    fn is_column(&self) -> bool {
        matches!(self, Term::Column(_))
    }
}

/// State of a single compile call.
struct Compilation<'a> {
    resolver: &'a dyn FieldResolver,
    replacements: &'a Replacements,
    clock: MacroClock,
    binder: ParamBinder<'a>,
    fields: Vec<ResolvedField>,
    seen: HashSet<ResolvedField>,
}

impl Compilation<'_> {
    /// Compiles a node that stands on its own.
    ///
    /// Logical chains get one pair of parentheses; a group around a single
    /// comparison adds nothing.
    fn compile_node(&mut self, expr: &Expr) -> FilterResult<String> {
        match expr {
            Expr::Comparison { left, op, right } => self.compile_comparison(left, *op, right),
            Expr::Group { inner } => self.compile_node(inner),
            Expr::Logical { op, operands } => {
                let mut sql = String::from("(");
                self.compile_chain(*op, operands, &mut sql)?;
                sql.push(')');
                Ok(sql)
            }
        }
    }

    /// Appends the members of a logical chain to `out` without extra parentheses.
    ///
    /// A child chain is flattened into its parent when SQL precedence keeps
    /// the meaning: same connector, or AND inside OR.
    fn compile_chain(
        &mut self,
        op: LogicalOp,
        operands: &[Expr],
        out: &mut String,
    ) -> FilterResult<()> {
        for (i, operand) in operands.iter().enumerate() {
            if i > 0 {
                out.push(' ');
                out.push_str(op.sql());
                out.push(' ');
            }
            match operand {
                Expr::Logical {
                    op: inner,
                    operands,
                } if *inner == op || *inner == LogicalOp::And => {
                    self.compile_chain(*inner, operands, out)?;
                }
                other => out.push_str(&self.compile_node(other)?),
            }
        }
        Ok(())
    }

    fn compile_comparison(
        &mut self,
        left: &Operand,
        op: CompareOp,
        right: &Operand,
    ) -> FilterResult<String> {
        let left = self.term(left)?;
        let right = self.term(right)?;

        let sql = match op {
            CompareOp::Eq => self.compile_equality(left, right, false),
            CompareOp::Neq => self.compile_equality(left, right, true),
            CompareOp::Like => self.compile_like(left, right, false),
            CompareOp::NotLike => self.compile_like(left, right, true),
            CompareOp::Gt | CompareOp::Gte | CompareOp::Lt | CompareOp::Lte => {
                let left = self.render(left);
                let right = self.render(right);
                format!("{left} {op} {right}")
            }
        };

        tracing::trace!(%sql, "Compiled comparison");
        Ok(sql)
    }

    /// `=` / `!=` with empty-or-null equivalence for the sentinel literals.
    fn compile_equality(&mut self, left: Term, right: Term, negated: bool) -> String {
        let (eq, join, null_check) = if negated {
            ("!=", "AND", "IS NOT NULL")
        } else {
            ("=", "OR", "IS NULL")
        };

        match (left.is_blank(), right.is_blank()) {
            (true, true) => format!("'' {eq} ''"),
            (true, false) => {
                let right = self.render(right);
                format!("('' {eq} {right} {join} {right} {null_check})")
            }
            (false, true) => {
                let left = self.render(left);
                format!("({left} {eq} '' {join} {left} {null_check})")
            }
            (false, false) if left.is_column() && right.is_column() => {
                let left = self.render(left);
                let right = self.render(right);
                format!("COALESCE({left}, '') {eq} COALESCE({right}, '')")
            }
            (false, false) => {
                let left = self.render(left);
                let right = self.render(right);
                format!("{left} {eq} {right}")
            }
        }
    }

    /// `~` / `!~` as LIKE with an explicit escape character.
    ///
    /// A bound right-hand value is wrapped in `%` unless it already contains
    /// one; any other right-hand operand is wrapped by concatenation.
    fn compile_like(&mut self, left: Term, right: Term, negated: bool) -> String {
        let op = if negated { "NOT LIKE" } else { "LIKE" };
        let left = self.render(left);

        let right = match right {
            Term::Value { value, name } => {
                let text = value.to_text();
                if text.contains('%') {
                    self.render(Term::Value {
                        value: BoundValue::Text(text),
                        name,
                    })
                } else {
                    self.binder.bind(BoundValue::Text(format!("%{text}%")))
                }
            }
            other => format!("('%' || {} || '%')", self.render(other)),
        };

        format!("{left} {op} {right} ESCAPE '\\'")
    }

    /// Writes a term into SQL text, binding values as needed.
    fn render(&mut self, term: Term) -> String {
        match term {
            Term::Column(field) => field.sql(),
            Term::Value {
                value,
                name: Some(name),
            } => self.binder.bind_named(&name, value),
            Term::Value { value, name: None } => self.binder.bind(value),
            Term::Inline(fragment) => fragment.to_string(),
            Term::Blank { null: false } => "''".to_string(),
            Term::Blank { null: true } => "NULL".to_string(),
        }
    }

    fn term(&mut self, operand: &Operand) -> FilterResult<Term> {
        match operand {
            Operand::Identifier(path) => self.resolve(path).map(Term::Column),
            Operand::Literal(literal) => Ok(match literal {
                Literal::Text(s) if s.is_empty() => Term::Blank { null: false },
                Literal::Text(s) => Term::Value {
                    value: BoundValue::Text(s.clone()),
                    name: None,
                },
                Literal::Integer(i) => Term::Value {
                    value: BoundValue::Integer(*i),
                    name: None,
                },
                Literal::Real(f) => Term::Value {
                    value: BoundValue::Real(*f),
                    name: None,
                },
                Literal::Bool(b) => Term::from_value(&Value::Bool(*b), None),
                Literal::Null => Term::Blank { null: true },
            }),
            Operand::Macro(m) => Ok(Term::from_value(&self.clock.expand(*m), None)),
            Operand::Placeholder(name) => {
                let value = self
                    .replacements
                    .get(name)
                    .ok_or_else(|| FilterError::missing_placeholder(name.as_str()))?;
                Ok(Term::from_value(value, Some(name)))
            }
        }
    }

    fn resolve(&mut self, path: &str) -> FilterResult<ResolvedField> {
        let field = self.resolver.resolve(path).map_err(|e| {
            tracing::debug!(field = %path, "Rejected unknown filter field");
            FilterError::from(e)
        })?;

        if field.multi_valued {
            tracing::debug!(
                field = %path,
                column = %field.column,
                "Multi-valued field compiled with scalar comparison"
            );
        }
        if self.seen.insert(field.clone()) {
            self.fields.push(field.clone());
        }

        Ok(field)
    }
}
