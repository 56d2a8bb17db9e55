//! Parameter binding for compiled expressions.

use std::collections::BTreeMap;

use super::value::{BoundValue, Replacements};

/// Default prefix of generated parameter names.
pub const DEFAULT_PARAM_PREFIX: &str = "p";

/// Allocates parameter names and collects bound values for one compile call.
///
/// Generated names are `{prefix}{n}` with `n` counting up from zero, skipping
/// any name the caller already uses for a named replacement. Caller names are
/// bound as-is.
#[derive(Debug)]
pub struct ParamBinder<'a> {
    prefix: &'a str,
    next: usize,
    reserved: &'a Replacements,
    params: BTreeMap<String, BoundValue>,
}

impl<'a> ParamBinder<'a> {
    /// Creates a binder that never generates names present in `reserved`.
    pub fn new(prefix: &'a str, reserved: &'a Replacements) -> Self {
        Self {
            prefix,
            next: 0,
            reserved,
            params: BTreeMap::new(),
        }
    }

    /// Binds a value under a freshly generated name and returns its placeholder.
    pub fn bind(&mut self, value: BoundValue) -> String {
        let name = self.next_name();
        let placeholder = placeholder(&name);
        self.params.insert(name, value);
        placeholder
    }

    /// Binds a caller-supplied value under the caller's own name.
    ///
    /// Binding the same name again keeps the first value.
    pub fn bind_named(&mut self, name: &str, value: BoundValue) -> String {
        self.params.entry(name.to_string()).or_insert(value);
        placeholder(name)
    }

    /// Returns the number of bound parameters so far.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns true if nothing has been bound yet.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Consumes the binder and returns the bound parameters.
    pub fn finish(self) -> BTreeMap<String, BoundValue> {
        self.params
    }

    fn next_name(&mut self) -> String {
        loop {
            let name = format!("{}{}", self.prefix, self.next);
            self.next += 1;
            if !self.reserved.contains_key(&name) && !self.params.contains_key(&name) {
                return name;
            }
        }
    }
}

/// Returns true if `prefix` can start a generated parameter name.
///
/// Names must stay within `[A-Za-z0-9_]` so `{:name}` placeholders remain
/// parseable by the query builder.
pub fn is_valid_prefix(prefix: &str) -> bool {
    !prefix.is_empty()
        && prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Formats a parameter name as a `{:name}` placeholder.
pub fn placeholder(name: &str) -> String {
    format!("{{:{name}}}")
}
