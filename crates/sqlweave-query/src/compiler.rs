//! Expression compiler and per-compile build context.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use sqlweave_core::{Error, Result, SqlType, Value};

use crate::condition::{Condition, parse_condition};
use crate::config::CompilerConfig;
use crate::dialect::{Dialect, LikeEscape, SqlDialect};
use crate::expr::{ExprKind, Expression};
use crate::params::{BoundParam, ParamTable, rename_placeholders};
use crate::registry::{BuilderRegistry, ExpressionBuilder};

/// Compiles expression trees for one dialect.
///
/// A compiler is immutable once built and cheap to clone; it can be shared
/// across threads as long as each compile uses its own [`ParamTable`].
#[derive(Clone)]
pub struct Compiler {
    dialect: Arc<dyn SqlDialect>,
    registry: Arc<BuilderRegistry>,
    config: CompilerConfig,
    like_escape: LikeEscape,
}

impl Compiler {
    /// Create a compiler for a dialect with the default configuration.
    pub fn new(dialect: impl SqlDialect + 'static) -> Self {
        let dialect: Arc<dyn SqlDialect> = Arc::new(dialect);
        let mut registry = BuilderRegistry::with_defaults();
        dialect.register_builders(&mut registry);
        let like_escape = dialect.like_escape();
        Self {
            dialect,
            registry: Arc::new(registry),
            config: CompilerConfig::default(),
            like_escape,
        }
    }

    /// Create a compiler for a built-in dialect.
    pub fn for_dialect(dialect: Dialect) -> Self {
        Self::new(dialect)
    }

    /// Start configuring a compiler.
    pub fn builder(dialect: impl SqlDialect + 'static) -> CompilerBuilder {
        CompilerBuilder {
            dialect: Arc::new(dialect),
            config: CompilerConfig::default(),
            overrides: Vec::new(),
        }
    }

    /// The target dialect.
    pub fn dialect(&self) -> &dyn SqlDialect {
        &*self.dialect
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn registry(&self) -> &BuilderRegistry {
        &self.registry
    }

    /// LIKE escaping in effect (configuration override or dialect default).
    pub fn like_escape(&self) -> &LikeEscape {
        &self.like_escape
    }

    /// Open a build context over a caller-owned parameter table.
    pub fn context<'a>(&'a self, params: &'a mut ParamTable) -> BuildContext<'a> {
        BuildContext {
            compiler: self,
            params,
            depth: 0,
        }
    }

    /// Compile an expression, appending bound values to `params`.
    #[tracing::instrument(level = "trace", skip(self, expr, params), fields(dialect = self.dialect.name()))]
    pub fn compile(&self, expr: &Expression, params: &mut ParamTable) -> Result<String> {
        self.context(params).compile(expr)
    }

    /// Compile a shorthand condition, appending bound values to `params`.
    #[tracing::instrument(level = "trace", skip(self, condition, params), fields(dialect = self.dialect.name()))]
    pub fn compile_condition(&self, condition: &Condition, params: &mut ParamTable) -> Result<String> {
        self.context(params).compile_condition(condition)
    }

    /// Compile an expression into SQL text and a fresh parameter table.
    pub fn build(&self, expr: &Expression) -> Result<(String, ParamTable)> {
        let mut params = ParamTable::new();
        let sql = self.compile(expr, &mut params)?;
        Ok((sql, params))
    }

    /// Compile a shorthand condition into SQL text and a fresh parameter table.
    pub fn build_condition(&self, condition: &Condition) -> Result<(String, ParamTable)> {
        let mut params = ParamTable::new();
        let sql = self.compile_condition(condition, &mut params)?;
        Ok((sql, params))
    }
}

impl fmt::Debug for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler")
            .field("dialect", &self.dialect)
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}

// ==================== Compiler Builder ====================

/// Builder for a [`Compiler`] with custom configuration or builders.
#[derive(Debug)]
pub struct CompilerBuilder {
    dialect: Arc<dyn SqlDialect>,
    config: CompilerConfig,
    overrides: Vec<(ExprKind, Arc<dyn ExpressionBuilder>)>,
}

impl CompilerBuilder {
    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the placeholder name prefix.
    #[must_use]
    pub fn param_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.param_prefix = prefix.into();
        self
    }

    /// Set the maximum nesting depth.
    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    /// Override the dialect's LIKE escaping.
    #[must_use]
    pub fn like_escape(mut self, escape: LikeEscape) -> Self {
        self.config.like_escape = Some(escape);
        self
    }

    /// Override the dialect's boolean formatting.
    #[must_use]
    pub fn inline_booleans(mut self, inline: bool) -> Self {
        self.config.inline_booleans = Some(inline);
        self
    }

    /// Install a builder ahead of the dialect's own overrides.
    #[must_use]
    pub fn override_builder(mut self, kind: ExprKind, builder: impl ExpressionBuilder + 'static) -> Self {
        self.overrides.push((kind, Arc::new(builder)));
        self
    }

    /// Validate the configuration and freeze the registry.
    pub fn build(self) -> Result<Compiler> {
        self.config.validate()?;
        let mut registry = BuilderRegistry::with_defaults();
        self.dialect.register_builders(&mut registry);
        for (kind, builder) in self.overrides {
            tracing::debug!(kind = kind.name(), "installing caller builder override");
            registry.register_override_arc(kind, builder);
        }
        let like_escape = self
            .config
            .like_escape
            .clone()
            .unwrap_or_else(|| self.dialect.like_escape());
        Ok(Compiler {
            dialect: self.dialect,
            registry: Arc::new(registry),
            config: self.config,
            like_escape,
        })
    }
}

// ==================== Build Context ====================

/// State threaded through one top-level compile.
///
/// Builders receive the context by exclusive reference, so the parameter
/// table is never aliased while a tree is being compiled.
pub struct BuildContext<'a> {
    compiler: &'a Compiler,
    params: &'a mut ParamTable,
    depth: usize,
}

impl BuildContext<'_> {
    /// Compile a nested expression through the registry.
    pub fn compile(&mut self, expr: &Expression) -> Result<String> {
        let max_depth = self.compiler.config.max_depth;
        if self.depth >= max_depth {
            return Err(Error::invalid_argument(format!(
                "expression nesting exceeds the maximum depth of {max_depth}"
            )));
        }

        let kind = expr.kind();
        let compiler = self.compiler;
        let Some(builder) = compiler.registry.lookup(kind) else {
            return Err(Error::unsupported(
                kind.name(),
                format!(
                    "no builder is registered for {kind} expressions in the {} dialect",
                    compiler.dialect.name()
                ),
            ));
        };

        self.depth += 1;
        let result = builder.build(expr, self);
        self.depth -= 1;

        let sql = result?;
        tracing::trace!(
            kind = kind.name(),
            overridden = compiler.registry.has_override(kind),
            depth = self.depth,
            sql = %sql,
            "compiled fragment"
        );
        Ok(sql)
    }

    /// Compile a shorthand condition, normalizing it first.
    pub fn compile_condition(&mut self, condition: &Condition) -> Result<String> {
        match condition {
            Condition::Expr(expr) => self.compile(expr),
            other => {
                let expr = parse_condition(other)?;
                self.compile(&expr)
            }
        }
    }

    /// Bind a value, returning its placeholder token or inline literal.
    ///
    /// NULL and DEFAULT are emitted as keywords; array and JSON values must
    /// be wrapped in their own expressions.
    pub fn bind_value(&mut self, value: &Value, sql_type: Option<&SqlType>) -> Result<String> {
        if !value.is_scalar() {
            return match value {
                Value::Null => Ok("NULL".to_string()),
                Value::Default => Ok("DEFAULT".to_string()),
                _ => Err(Error::invalid_argument(format!(
                    "{} value cannot be bound as a scalar",
                    value.type_name()
                ))),
            };
        }

        if let Some(literal) = self.inline_literal(value) {
            return Ok(literal);
        }

        let param = match sql_type {
            Some(sql_type) => BoundParam::typed(value.clone(), sql_type.clone()),
            None => BoundParam::new(value.clone()),
        };
        let name = self.params.bind(&self.compiler.config.param_prefix, param);
        Ok(format!(":{name}"))
    }

    fn inline_literal(&self, value: &Value) -> Option<String> {
        if let Value::Bool(b) = value {
            match self.compiler.config.inline_booleans {
                Some(true) => return Some(if *b { "1" } else { "0" }.to_string()),
                Some(false) => return None,
                None => {}
            }
        }
        self.compiler.dialect.inline_literal(value)
    }

    /// Bind a literal operand, or compile any other expression.
    pub fn bind(&mut self, operand: &Expression) -> Result<String> {
        match operand {
            Expression::Literal { value, sql_type } => self.bind_value(value, sql_type.as_ref()),
            other => self.compile(other),
        }
    }

    /// Compile an operand in column position.
    ///
    /// Bare column names are quoted; anything else is compiled.
    pub fn column(&mut self, operand: &Expression) -> Result<String> {
        match operand {
            Expression::Column(name) => Ok(self.quote_column(name)),
            other => self.compile(other),
        }
    }

    /// Merge a raw fragment's parameters, renaming collisions.
    ///
    /// Returns the SQL text with renamed placeholders rewritten.
    pub fn merge_params(&mut self, sql: &str, params: &[(String, Value)]) -> Result<String> {
        let mut seen = HashSet::with_capacity(params.len());
        for (name, _) in params {
            if !seen.insert(name.as_str()) {
                return Err(Error::ambiguous_placeholder(name.clone()));
            }
        }

        let mut renames = HashMap::new();
        for (name, value) in params {
            let stored = self.params.insert_unique(name, BoundParam::new(value.clone()));
            if &stored != name {
                tracing::debug!(from = %name, to = %stored, "renamed colliding placeholder");
                renames.insert(name.clone(), stored);
            }
        }
        Ok(rename_placeholders(sql, &renames, self.dialect()))
    }

    pub fn quote_column(&self, name: &str) -> String {
        self.compiler.dialect.quote_column(name)
    }

    pub fn quote_table(&self, name: &str) -> String {
        self.compiler.dialect.quote_table(name)
    }

    pub fn dialect(&self) -> &dyn SqlDialect {
        &*self.compiler.dialect
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.compiler.config
    }

    pub fn like_escape(&self) -> &LikeEscape {
        &self.compiler.like_escape
    }

    /// Read access to the parameters bound so far.
    pub fn params(&self) -> &ParamTable {
        self.params
    }
}

impl fmt::Debug for BuildContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildContext")
            .field("dialect", &self.compiler.dialect.name())
            .field("params", &self.params.len())
            .field("depth", &self.depth)
            .finish()
    }
}
