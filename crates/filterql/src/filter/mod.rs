//! Filter expression parser and SQL compiler.
//!
//! This module parses the filter language used by list endpoints and compiles
//! it into a parameterized SQL `WHERE` fragment. Field names are checked
//! against a caller-supplied [`FieldResolver`](crate::resolver::FieldResolver);
//! literal values never appear in the generated SQL text.
//!
//! # Supported Syntax
//!
//! ## Operands
//! - `'text'`, `"text"` - String literals (a backslash escapes the enclosing quote)
//! - `10`, `-1.5`, `.5` - Numbers
//! - `true`, `false`, `null` - Keywords (case-insensitive)
//! - `title`, `author.name` - Field identifiers
//! - `@now`, `@todayStart`, ... - Date/time macros
//! - `{:name}` - Named placeholders filled from caller replacements
//!
//! ## Comparison Operators
//! - `=`, `!=` - Equality; `''` and `null` also match empty values
//! - `>`, `>=`, `<`, `<=` - Ordering
//! - `~`, `!~` - Contains / does not contain (SQL `LIKE`)
//!
//! ## Boolean Operators
//! - `&&` - AND
//! - `||` - OR
//! - `()` - Grouping
//!
//! # Example
//!
//! ```
//! use filterql_rs::filter::{FilterCompiler, Replacements, Value};
//! use filterql_rs::resolver::StaticResolver;
//!
//! let resolver = StaticResolver::new(["status", "created"]);
//! let mut replacements = Replacements::new();
//! replacements.insert("status".to_string(), Value::from("active"));
//!
//! let compiled = FilterCompiler::new(&resolver)
//!     .replacements(&replacements)
//!     .compile("status = {:status} && created <= @now")
//!     .unwrap();
//!
//! assert!(compiled.sql.starts_with("([[status]] = {:status} AND [[created]] <= {:p"));
//! assert_eq!(compiled.params.len(), 2);
//! ```

mod ast;
mod binder;
mod compiler;
mod error;
mod lexer;
mod macros;
mod parser;
mod value;

pub use ast::{CompareOp, Expr, Literal, LogicalOp, Operand};
pub use binder::{is_valid_prefix, placeholder, ParamBinder, DEFAULT_PARAM_PREFIX};
pub use compiler::{compile, CompiledExpression, FilterCompiler};
pub use error::{FilterError, FilterErrorKind, FilterResult};
pub use lexer::{Lexer, Token, TokenKind};
pub use macros::{Macro, MacroClock};
pub use parser::{FilterParser, MAX_NESTING_DEPTH};
pub use value::{format_timestamp, BoundValue, Replacements, Value, TIMESTAMP_FORMAT};

#[cfg(test)]
mod tests;
