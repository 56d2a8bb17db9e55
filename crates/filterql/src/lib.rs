//! Filter expression language compiled to parameterized SQL.
//!
//! A filter such as `title ~ 'rust' && created > @todayStart` is parsed into an
//! [`Expr`] tree, every identifier is checked by a [`FieldResolver`], and the
//! result is a [`CompiledExpression`]: an SQL boolean expression with
//! `[[column]]` and `{:name}` placeholders plus the values bound to them.
//!
//! ```
//! use filterql_rs::{compile, Replacements, StaticResolver};
//!
//! let resolver = StaticResolver::new(["title"]);
//! let compiled = compile("title = ''", &Replacements::new(), &resolver).unwrap();
//! assert_eq!(compiled.sql, "([[title]] = '' OR [[title]] IS NULL)");
//! assert!(compiled.params.is_empty());
//! ```

pub mod filter;
pub mod resolver;

pub use filter::{
    compile, BoundValue, CompiledExpression, Expr, FilterCompiler, FilterError, FilterErrorKind,
    FilterParser, FilterResult, Replacements, Value,
};
pub use resolver::{
    FieldResolver, FieldResolverExt, MappedResolver, PatternResolver, ResolvedField,
    SimpleResolver, StaticResolver, UnknownFieldError,
};
