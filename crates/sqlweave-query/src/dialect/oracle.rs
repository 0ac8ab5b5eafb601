//! Oracle dialect overrides.

use crate::builders::InBuilder;
use crate::dialect::LikeEscape;
use crate::expr::ExprKind;
use crate::registry::BuilderRegistry;

/// Oracle rejects IN lists with more than 1000 expressions (ORA-01795).
pub const MAX_IN_LIST_SIZE: usize = 1000;

pub(super) fn like_escape() -> LikeEscape {
    LikeEscape::new([('%', "!%"), ('_', "!_"), ('!', "!!")]).with_escape_char('!')
}

pub(super) fn register(registry: &mut BuilderRegistry) {
    registry.register_override(
        ExprKind::In,
        InBuilder {
            max_list_size: Some(MAX_IN_LIST_SIZE),
            ..InBuilder::default()
        },
    );
}
