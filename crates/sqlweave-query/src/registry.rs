//! Builder registry.
//!
//! Maps each [`ExprKind`] to the builder that compiles it. Dialects install
//! overrides on top of the defaults while the compiler is being built; the
//! registry is frozen behind an `Arc` afterwards and shared across threads.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use sqlweave_core::{Error, Result};

use crate::builders;
use crate::compiler::BuildContext;
use crate::expr::{ExprKind, Expression};

/// Compiles one expression variant to SQL text.
pub trait ExpressionBuilder: fmt::Debug + Send + Sync {
    /// Compile `expr`, binding any values through `ctx`.
    fn build(&self, expr: &Expression, ctx: &mut BuildContext<'_>) -> Result<String>;
}

/// Typed builder table with per-dialect overrides.
#[derive(Clone, Default)]
pub struct BuilderRegistry {
    defaults: HashMap<ExprKind, Arc<dyn ExpressionBuilder>>,
    overrides: HashMap<ExprKind, Arc<dyn ExpressionBuilder>>,
}

impl BuilderRegistry {
    /// A registry with no builders at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry seeded with the default builders.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        builders::register_defaults(&mut registry);
        registry
    }

    /// Register the default builder for a variant.
    pub fn register_default(
        &mut self,
        kind: ExprKind,
        builder: impl ExpressionBuilder + 'static,
    ) -> &mut Self {
        self.defaults.insert(kind, Arc::new(builder));
        self
    }

    /// Register a dialect override for a variant.
    pub fn register_override(
        &mut self,
        kind: ExprKind,
        builder: impl ExpressionBuilder + 'static,
    ) -> &mut Self {
        self.overrides.insert(kind, Arc::new(builder));
        self
    }

    /// Register an already shared override.
    pub fn register_override_arc(
        &mut self,
        kind: ExprKind,
        builder: Arc<dyn ExpressionBuilder>,
    ) -> &mut Self {
        self.overrides.insert(kind, builder);
        self
    }

    /// Check whether a dialect override is installed for a variant.
    pub fn has_override(&self, kind: ExprKind) -> bool {
        self.overrides.contains_key(&kind)
    }

    /// Check whether any builder handles a variant.
    pub fn supports(&self, kind: ExprKind) -> bool {
        self.lookup(kind).is_some()
    }

    /// Find the builder for a variant: the override first, then the default.
    pub fn lookup(&self, kind: ExprKind) -> Option<&dyn ExpressionBuilder> {
        self.overrides
            .get(&kind)
            .or_else(|| self.defaults.get(&kind))
            .map(|builder| &**builder)
    }
}

impl fmt::Debug for BuilderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut defaults: Vec<_> = self.defaults.keys().map(|k| k.name()).collect();
        let mut overrides: Vec<_> = self.overrides.keys().map(|k| k.name()).collect();
        defaults.sort_unstable();
        overrides.sort_unstable();
        f.debug_struct("BuilderRegistry")
            .field("defaults", &defaults)
            .field("overrides", &overrides)
            .finish()
    }
}

/// Error for a builder handed a variant it does not compile.
pub(crate) fn mismatched(builder: &str, expr: &Expression) -> Error {
    Error::unsupported(
        expr.kind().name(),
        format!("{builder} cannot compile a {} expression", expr.kind()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Fixed(&'static str);

    impl ExpressionBuilder for Fixed {
        fn build(&self, _expr: &Expression, _ctx: &mut BuildContext<'_>) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_defaults_cover_core_variants() {
        let registry = BuilderRegistry::with_defaults();
        for kind in ExprKind::ALL {
            if kind == ExprKind::Structured {
                assert!(!registry.supports(kind));
            } else {
                assert!(registry.supports(kind), "missing default for {kind}");
            }
        }
    }

    #[test]
    fn test_override_takes_precedence() {
        let mut registry = BuilderRegistry::empty();
        registry
            .register_default(ExprKind::Column, Fixed("default"))
            .register_override(ExprKind::Column, Fixed("override"));
        assert!(registry.has_override(ExprKind::Column));
        let debug = format!("{:?}", registry.lookup(ExprKind::Column));
        assert!(debug.contains("override"));
    }

    #[test]
    fn test_empty_registry_has_nothing() {
        let registry = BuilderRegistry::empty();
        assert!(registry.lookup(ExprKind::Compare).is_none());
    }
}
