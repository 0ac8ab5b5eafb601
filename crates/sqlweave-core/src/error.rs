//! Error types for SQLWeave operations.

use std::fmt;

/// The primary error type for all SQLWeave operations.
#[derive(Debug)]
pub enum Error {
    /// Expression compilation errors
    Expression(ExpressionError),
    /// Type conversion errors
    Type(TypeError),
    /// Configuration errors
    Config(ConfigError),
    /// Custom error with message
    Custom(String),
}

/// An error raised while turning an expression tree into SQL text.
#[derive(Debug, Clone)]
pub struct ExpressionError {
    pub kind: ExpressionErrorKind,
    /// The variant, operator token or placeholder the failure is about
    pub subject: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionErrorKind {
    /// No builder is registered for a variant, or an operator token is unknown
    UnsupportedExpression,
    /// Structurally malformed input
    InvalidArgument,
    /// Placeholder renaming could not resolve a collision
    AmbiguousPlaceholder,
}

impl ExpressionErrorKind {
    /// Get the name of this kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            ExpressionErrorKind::UnsupportedExpression => "unsupported expression",
            ExpressionErrorKind::InvalidArgument => "invalid argument",
            ExpressionErrorKind::AmbiguousPlaceholder => "ambiguous placeholder",
        }
    }
}

#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub rust_type: Option<&'static str>,
}

#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Dispatch found no builder for a variant or operator token.
    pub fn unsupported(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Expression(ExpressionError {
            kind: ExpressionErrorKind::UnsupportedExpression,
            subject: Some(subject.into()),
            message: message.into(),
        })
    }

    /// Structurally malformed input.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::Expression(ExpressionError {
            kind: ExpressionErrorKind::InvalidArgument,
            subject: None,
            message: message.into(),
        })
    }

    /// A placeholder could not be made unique.
    pub fn ambiguous_placeholder(name: impl Into<String>) -> Self {
        let name = name.into();
        Error::Expression(ExpressionError {
            kind: ExpressionErrorKind::AmbiguousPlaceholder,
            message: format!("placeholder ':{name}' could not be resolved to a unique name"),
            subject: Some(name),
        })
    }

    /// Get the expression error kind, if this is an expression error.
    pub fn expression_kind(&self) -> Option<ExpressionErrorKind> {
        match self {
            Error::Expression(e) => Some(e.kind),
            _ => None,
        }
    }

    /// Is this an `UnsupportedExpression` error?
    pub fn is_unsupported(&self) -> bool {
        self.expression_kind() == Some(ExpressionErrorKind::UnsupportedExpression)
    }

    /// Is this an `InvalidArgument` error?
    pub fn is_invalid_argument(&self) -> bool {
        self.expression_kind() == Some(ExpressionErrorKind::InvalidArgument)
    }

    /// Get the subject (variant, operator or placeholder) of an expression error.
    pub fn subject(&self) -> Option<&str> {
        match self {
            Error::Expression(e) => e.subject.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Expression(e) => write!(f, "Expression error: {}", e),
            Error::Type(e) => write!(f, "Type error: {}", e),
            Error::Config(e) => write!(f, "Configuration error: {}", e.message),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl fmt::Display for ExpressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subject {
            Some(subject) => write!(f, "{} '{}': {}", self.kind.as_str(), subject, self.message),
            None => write!(f, "{}: {}", self.kind.as_str(), self.message),
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(rust_type) = self.rust_type {
            write!(
                f,
                "expected {} for {}, found {}",
                self.expected, rust_type, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<ExpressionError> for Error {
    fn from(err: ExpressionError) -> Self {
        Error::Expression(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

/// Result type alias for SQLWeave operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_kind_helpers() {
        let err = Error::unsupported("Structured", "no builder registered");
        assert!(err.is_unsupported());
        assert!(!err.is_invalid_argument());
        assert_eq!(err.subject(), Some("Structured"));

        let err = Error::invalid_argument("CASE requires at least one WHEN clause");
        assert_eq!(
            err.expression_kind(),
            Some(ExpressionErrorKind::InvalidArgument)
        );
        assert_eq!(err.subject(), None);
    }

    #[test]
    fn test_display() {
        let err = Error::unsupported("FOO", "unknown operator");
        assert_eq!(
            err.to_string(),
            "Expression error: unsupported expression 'FOO': unknown operator"
        );

        let err = Error::ambiguous_placeholder("qp0");
        assert_eq!(
            err.to_string(),
            "Expression error: ambiguous placeholder 'qp0': placeholder ':qp0' could not be resolved to a unique name"
        );
    }

    #[test]
    fn test_config_source() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = Error::Config(ConfigError {
            message: "bad config".to_string(),
            source: Some(Box::new(parse_err)),
        });
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.expression_kind(), None);
    }
}
