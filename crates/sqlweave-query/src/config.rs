//! Compiler configuration.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlweave_core::error::ConfigError;
use sqlweave_core::{Error, Result};

use crate::dialect::LikeEscape;

/// Default placeholder prefix (`:qp0`, `:qp1`, ...).
pub const DEFAULT_PARAM_PREFIX: &str = "qp";

/// Default maximum expression nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Options shared by every compile of one [`Compiler`](crate::Compiler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Placeholder name prefix
    pub param_prefix: String,
    /// Maximum expression nesting depth
    pub max_depth: usize,
    /// LIKE escaping; the dialect default when absent
    pub like_escape: Option<LikeEscape>,
    /// Force booleans inline (`1`/`0`) or bound; the dialect decides when absent
    pub inline_booleans: Option<bool>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            param_prefix: DEFAULT_PARAM_PREFIX.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            like_escape: None,
            inline_booleans: None,
        }
    }
}

impl CompilerConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the placeholder name prefix.
    #[must_use]
    pub fn param_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.param_prefix = prefix.into();
        self
    }

    /// Set the maximum nesting depth.
    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Override the dialect's LIKE escaping.
    #[must_use]
    pub fn like_escape(mut self, escape: LikeEscape) -> Self {
        self.like_escape = Some(escape);
        self
    }

    /// Override the dialect's boolean formatting.
    #[must_use]
    pub fn inline_booleans(mut self, inline: bool) -> Self {
        self.inline_booleans = Some(inline);
        self
    }

    /// Parse a configuration from JSON and validate it.
    ///
    /// Missing fields take their default values.
    ///
    /// # Example
    /// ```
    /// use sqlweave_query::CompilerConfig;
    ///
    /// let config = CompilerConfig::from_json(r#"{"param_prefix": "p", "max_depth": 16}"#).unwrap();
    /// assert_eq!(config.param_prefix, "p");
    /// assert_eq!(config.max_depth, 16);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            Error::Config(ConfigError {
                message: format!("invalid compiler configuration: {e}"),
                source: Some(Box::new(e)),
            })
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the compiler cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !param_prefix_regex()?.is_match(&self.param_prefix) {
            return Err(config_error(format!(
                "param_prefix {:?} must start with a letter or underscore and contain only \
                 letters, digits and underscores",
                self.param_prefix
            )));
        }
        if self.max_depth == 0 {
            return Err(config_error("max_depth must be at least 1".to_string()));
        }
        if let Some(escape) = &self.like_escape {
            escape.validate().map_err(config_error)?;
        }
        Ok(())
    }
}

fn config_error(message: String) -> Error {
    Error::Config(ConfigError {
        message,
        source: None,
    })
}

fn param_prefix_regex() -> Result<&'static Regex> {
    static PREFIX: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
    PREFIX
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$"))
        .as_ref()
        .map_err(|e| Error::Custom(format!("invalid placeholder prefix pattern: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CompilerConfig::default();
        assert_eq!(config.param_prefix, "qp");
        assert_eq!(config.max_depth, 128);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_setters() {
        let config = CompilerConfig::new()
            .param_prefix("p")
            .max_depth(4)
            .inline_booleans(true)
            .like_escape(LikeEscape::none());
        assert_eq!(config.param_prefix, "p");
        assert_eq!(config.max_depth, 4);
        assert_eq!(config.inline_booleans, Some(true));
        assert_eq!(config.like_escape, Some(LikeEscape::none()));
    }

    #[test]
    fn test_from_json_partial() {
        let config = CompilerConfig::from_json(r#"{"inline_booleans": false}"#).unwrap();
        assert_eq!(config.param_prefix, "qp");
        assert_eq!(config.inline_booleans, Some(false));
    }

    #[test]
    fn test_from_json_like_escape() {
        let config = CompilerConfig::from_json(
            r#"{"like_escape": {"map": {"%": "!%", "!": "!!"}, "escape_char": "!"}}"#,
        )
        .unwrap();
        let escape = config.like_escape.unwrap();
        assert_eq!(escape.escape("5%"), "5!%");
        assert_eq!(escape.clause(), " ESCAPE '!'");
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = CompilerConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(CompilerConfig::new().max_depth(0).validate().is_err());
        assert!(CompilerConfig::new().param_prefix("1x").validate().is_err());
        assert!(CompilerConfig::new().param_prefix("a-b").validate().is_err());
        assert!(CompilerConfig::from_json(r#"{"like_escape": {"map": {"ab": "x"}}}"#).is_err());
    }
}
