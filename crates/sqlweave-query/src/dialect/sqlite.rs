//! SQLite dialect overrides.

use crate::builders::InBuilder;
use crate::dialect::LikeEscape;
use crate::expr::ExprKind;
use crate::registry::BuilderRegistry;

/// SQLite has no default LIKE escape character.
pub(super) fn like_escape() -> LikeEscape {
    LikeEscape::backslash().with_escape_char('\\')
}

pub(super) fn register(registry: &mut BuilderRegistry) {
    registry.register_override(ExprKind::In, InBuilder::expanded());
}
