//! Error types for filter parsing and compilation.

use thiserror::Error;

use crate::resolver::UnknownFieldError;

/// A specialized Result type for filter operations.
pub type FilterResult<T> = Result<T, FilterError>;

/// Broad classification of a [`FilterError`].
///
/// Callers that translate errors into client responses usually only need
/// this coarse kind rather than the individual variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterErrorKind {
    /// Malformed, empty or unbalanced filter text.
    Syntax,
    /// An identifier rejected by the field resolver.
    UnknownField,
    /// An operator-like token that is not a supported comparison.
    UnsupportedOperator,
}

/// Errors that can occur while tokenizing, parsing or compiling a filter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterError {
    /// The filter expression is empty or whitespace only.
    #[error("filter expression is empty")]
    EmptyExpression,

    /// A character that cannot start any token.
    #[error("unexpected character '{character}' at position {position}")]
    UnexpectedCharacter {
        /// The offending character.
        character: char,
        /// Byte offset of the character.
        position: usize,
    },

    /// A quoted string without its closing quote.
    #[error("unterminated quoted string starting at position {position}")]
    UnterminatedString {
        /// Byte offset of the opening quote.
        position: usize,
    },

    /// An unexpected token was encountered during parsing.
    #[error("unexpected token '{token}' at position {position}")]
    UnexpectedToken {
        /// The unexpected token text.
        token: String,
        /// Byte offset of the token.
        position: usize,
    },

    /// The expression ended where an operand or operator was required.
    #[error("unexpected end of expression")]
    UnexpectedEndOfInput,

    /// An opening parenthesis without a matching closing one.
    #[error("unclosed parenthesis")]
    UnclosedParenthesis,

    /// Parentheses nested deeper than the parser accepts.
    #[error("parentheses nested deeper than {max_depth} levels at position {position}")]
    NestingTooDeep {
        /// The deepest nesting accepted.
        max_depth: usize,
        /// Byte offset of the parenthesis that went over the limit.
        position: usize,
    },

    /// A generated parameter name prefix that cannot appear inside `{:name}`.
    #[error("invalid parameter prefix '{prefix}': expected ASCII letters, digits or '_'")]
    InvalidParamPrefix {
        /// The prefix as given.
        prefix: String,
    },

    /// A number literal that does not fit any numeric type.
    #[error("invalid number: {literal}")]
    InvalidNumber {
        /// The literal as written.
        literal: String,
    },

    /// A `@name` token outside the macro vocabulary.
    #[error("unknown macro: @{name}")]
    UnknownMacro {
        /// The macro name without the `@` prefix.
        name: String,
    },

    /// A `{:name}` placeholder with no replacement value.
    #[error("missing replacement for placeholder {{:{name}}}")]
    MissingPlaceholder {
        /// The placeholder name.
        name: String,
    },

    /// An operator token that is not one of the comparison operators.
    #[error("unsupported operator '{operator}' at position {position}")]
    UnsupportedOperator {
        /// The operator as written.
        operator: String,
        /// Byte offset of the operator.
        position: usize,
    },

    /// An identifier the field resolver does not accept.
    #[error(transparent)]
    UnknownField(#[from] UnknownFieldError),
}

impl FilterError {
    /// Creates an unexpected token error.
    pub fn unexpected_token(token: impl Into<String>, position: usize) -> Self {
        FilterError::UnexpectedToken {
            token: token.into(),
            position,
        }
    }

    /// Creates an unknown macro error.
    pub fn unknown_macro(name: impl Into<String>) -> Self {
        FilterError::UnknownMacro { name: name.into() }
    }

    /// Creates a missing placeholder error.
    pub fn missing_placeholder(name: impl Into<String>) -> Self {
        FilterError::MissingPlaceholder { name: name.into() }
    }

    /// Creates an unsupported operator error.
    pub fn unsupported_operator(operator: impl Into<String>, position: usize) -> Self {
        FilterError::UnsupportedOperator {
            operator: operator.into(),
            position,
        }
    }

    /// Returns the coarse classification of this error.
    pub fn kind(&self) -> FilterErrorKind {
        match self {
            FilterError::UnknownField(_) => FilterErrorKind::UnknownField,
            FilterError::UnsupportedOperator { .. } => FilterErrorKind::UnsupportedOperator,
            _ => FilterErrorKind::Syntax,
        }
    }

    /// Returns true if this error comes from malformed filter text.
    pub fn is_syntax(&self) -> bool {
        self.kind() == FilterErrorKind::Syntax
    }
}
