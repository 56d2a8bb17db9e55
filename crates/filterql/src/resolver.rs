//! Field resolvers: validation and mapping of filter identifiers to columns.
//!
//! The compiler never inspects a schema itself. Every identifier in a filter
//! goes through a [`FieldResolver`], which either maps it to a column or
//! rejects it with an [`UnknownFieldError`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use regex::Regex;
use strsim::levenshtein;
use thiserror::Error;

/// Maximum Levenshtein distance to consider a name as a suggestion.
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// A resolved identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedField {
    /// Column reference placed inside `[[...]]` in the compiled SQL.
    pub column: String,
    /// True if the field holds several values per record (e.g. a relation list).
    pub multi_valued: bool,
}

impl ResolvedField {
    /// Creates a single-valued field.
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            multi_valued: false,
        }
    }

    /// Creates a multi-valued field.
    pub fn multi_valued(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            multi_valued: true,
        }
    }

    /// Returns the bracket-quoted column reference, e.g. `[[title]]`.
    pub fn sql(&self) -> String {
        format!("[[{}]]", self.column)
    }
}

/// Error returned when an identifier is not accepted by a resolver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", not_found_message(.field, .suggestion.as_deref()))]
pub struct UnknownFieldError {
    /// The identifier as written in the filter.
    pub field: String,
    /// A close known name, if any.
    pub suggestion: Option<String>,
}

impl UnknownFieldError {
    /// Creates an error without a suggestion.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            suggestion: None,
        }
    }

    /// Creates an error with a suggestion picked from `candidates`.
    pub fn with_candidates<'a>(
        field: impl Into<String>,
        candidates: impl Iterator<Item = &'a str>,
    ) -> Self {
        let field = field.into();
        let suggestion = find_similar_name(&field, candidates);
        Self { field, suggestion }
    }
}

fn not_found_message(field: &str, suggestion: Option<&str>) -> String {
    match suggestion {
        Some(s) => format!("unknown field '{field}'. Did you mean '{s}'?"),
        None => format!("unknown field '{field}'"),
    }
}

/// Finds the best matching name from a list of candidates using Levenshtein distance.
///
/// Returns the best match if its edit distance is within the threshold,
/// otherwise returns `None`. Ties go to the name that sorts first.
fn find_similar_name<'a>(query: &str, candidates: impl Iterator<Item = &'a str>) -> Option<String> {
    let query_lower = query.to_lowercase();

    let (best_match, best_distance) = candidates
        .filter(|name| !name.is_empty())
        .map(|name| (name, levenshtein(&query_lower, &name.to_lowercase())))
        .min_by_key(|&(name, d)| (d, name))?;

    // Only suggest if the distance is within threshold and not an exact match
    if best_distance > 0 && best_distance <= MAX_SUGGESTION_DISTANCE {
        Some(best_match.to_string())
    } else {
        None
    }
}

/// Validates and maps filter identifiers.
///
/// Implementations are shared between concurrent compile calls and must not
/// rely on interior mutation for resolution.
pub trait FieldResolver: Send + Sync {
    /// Resolves a dotted identifier path such as `title` or `meta.author`.
    fn resolve(&self, path: &str) -> Result<ResolvedField, UnknownFieldError>;
}

impl<R: FieldResolver + ?Sized> FieldResolver for &R {
    fn resolve(&self, path: &str) -> Result<ResolvedField, UnknownFieldError> {
        (**self).resolve(path)
    }
}

impl<R: FieldResolver + ?Sized> FieldResolver for Box<R> {
    fn resolve(&self, path: &str) -> Result<ResolvedField, UnknownFieldError> {
        (**self).resolve(path)
    }
}

impl<R: FieldResolver + ?Sized> FieldResolver for Arc<R> {
    fn resolve(&self, path: &str) -> Result<ResolvedField, UnknownFieldError> {
        (**self).resolve(path)
    }
}

/// Combinators available on every resolver.
pub trait FieldResolverExt: FieldResolver + Sized {
    /// Tries `self` first and falls back to `other`.
    fn or<B: FieldResolver>(self, other: B) -> Chain<Self, B> {
        Chain {
            first: self,
            second: other,
        }
    }
}

impl<R: FieldResolver> FieldResolverExt for R {}

/// Resolver that accepts an identifier if either inner resolver does.
#[derive(Debug, Clone)]
pub struct Chain<A, B> {
    first: A,
    second: B,
}

impl<A: FieldResolver, B: FieldResolver> FieldResolver for Chain<A, B> {
    fn resolve(&self, path: &str) -> Result<ResolvedField, UnknownFieldError> {
        match self.first.resolve(path) {
            Ok(field) => Ok(field),
            Err(first_err) => self.second.resolve(path).map_err(|second_err| {
                if first_err.suggestion.is_some() {
                    first_err
                } else {
                    second_err
                }
            }),
        }
    }
}

/// Resolver backed by a closure.
pub struct FnResolver<F>(F);

/// Wraps a closure as a [`FieldResolver`].
///
/// ```
/// use filterql_rs::resolver::{from_fn, FieldResolver, ResolvedField, UnknownFieldError};
///
/// let resolver = from_fn(|path: &str| {
///     if path.starts_with("data.") {
///         Ok(ResolvedField::new(path))
///     } else {
///         Err(UnknownFieldError::new(path))
///     }
/// });
/// assert!(resolver.resolve("data.x").is_ok());
/// assert!(resolver.resolve("secret").is_err());
/// ```
pub fn from_fn<F>(f: F) -> FnResolver<F>
where
    F: Fn(&str) -> Result<ResolvedField, UnknownFieldError> + Send + Sync,
{
    FnResolver(f)
}

impl<F> FieldResolver for FnResolver<F>
where
    F: Fn(&str) -> Result<ResolvedField, UnknownFieldError> + Send + Sync,
{
    fn resolve(&self, path: &str) -> Result<ResolvedField, UnknownFieldError> {
        (self.0)(path)
    }
}

/// Resolver that accepts an exact, fixed set of names.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    names: BTreeSet<String>,
}

impl StaticResolver {
    /// Creates a resolver accepting exactly the given names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the accepted names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl FieldResolver for StaticResolver {
    fn resolve(&self, path: &str) -> Result<ResolvedField, UnknownFieldError> {
        if self.names.contains(path) {
            Ok(ResolvedField::new(path))
        } else {
            Err(UnknownFieldError::with_candidates(path, self.names()))
        }
    }
}

/// Resolver that accepts identifiers fully matching any of a set of regexes.
#[derive(Debug, Clone, Default)]
pub struct PatternResolver {
    patterns: Vec<Regex>,
}

impl PatternResolver {
    /// Compiles the patterns. Each pattern must match the whole identifier;
    /// `^`/`$` anchors are optional.
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| Regex::new(&format!("^(?:{})$", p.as_ref())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Returns the number of patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns true if there are no patterns.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl FieldResolver for PatternResolver {
    fn resolve(&self, path: &str) -> Result<ResolvedField, UnknownFieldError> {
        if self.patterns.iter().any(|re| re.is_match(path)) {
            Ok(ResolvedField::new(path))
        } else {
            Err(UnknownFieldError::new(path))
        }
    }
}

/// Resolver built from a single list mixing exact names and regexes.
///
/// Entries that start with `^` and end with `$` are regexes; everything else
/// is an exact name.
///
/// ```
/// use filterql_rs::resolver::{FieldResolver, SimpleResolver};
///
/// let resolver = SimpleResolver::new(["title", r"^meta\.\w+$"]).unwrap();
/// assert!(resolver.resolve("title").is_ok());
/// assert!(resolver.resolve("meta.author").is_ok());
/// assert!(resolver.resolve("meta").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SimpleResolver {
    names: StaticResolver,
    patterns: PatternResolver,
}

impl SimpleResolver {
    /// Splits the entries into names and patterns.
    pub fn new<I, S>(entries: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (patterns, names): (Vec<String>, Vec<String>) = entries
            .into_iter()
            .map(|e| e.as_ref().to_string())
            .partition(|e| e.len() > 1 && e.starts_with('^') && e.ends_with('$'));

        Ok(Self {
            names: StaticResolver::new(names),
            patterns: PatternResolver::new(patterns)?,
        })
    }
}

impl FieldResolver for SimpleResolver {
    fn resolve(&self, path: &str) -> Result<ResolvedField, UnknownFieldError> {
        match self.names.resolve(path) {
            Ok(field) => Ok(field),
            Err(err) => self.patterns.resolve(path).map_err(|_| err),
        }
    }
}

/// Resolver backed by an explicit name-to-field mapping, for callers that own
/// a schema and need to rename columns or flag multi-valued fields.
#[derive(Debug, Clone, Default)]
pub struct MappedResolver {
    fields: BTreeMap<String, ResolvedField>,
}

impl MappedResolver {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field mapping and returns the resolver.
    pub fn with_field(mut self, name: impl Into<String>, field: ResolvedField) -> Self {
        self.insert(name, field);
        self
    }

    /// Adds or replaces a field mapping.
    pub fn insert(&mut self, name: impl Into<String>, field: ResolvedField) {
        self.fields.insert(name.into(), field);
    }
}

impl FieldResolver for MappedResolver {
    fn resolve(&self, path: &str) -> Result<ResolvedField, UnknownFieldError> {
        self.fields.get(path).cloned().ok_or_else(|| {
            UnknownFieldError::with_candidates(path, self.fields.keys().map(String::as_str))
        })
    }
}
