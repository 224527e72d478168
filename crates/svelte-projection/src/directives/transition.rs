//! `transition:`, `in:`, `out:` and `animate:`

use super::action::invoke_with_element;
use super::RuleContext;
use source_map::BufferError;

pub(super) fn project_transition(ctx: &mut RuleContext<'_, '_>) -> Result<(), BufferError> {
    if ctx.node.is_component() {
        return ctx.degrade("transitions can only be applied to DOM elements");
    }
    invoke_with_element(ctx, "__sveltets_1_ensureTransition", "")
}

pub(super) fn project_animation(ctx: &mut RuleContext<'_, '_>) -> Result<(), BufferError> {
    if ctx.node.is_component() {
        return ctx.degrade("animations can only be applied to DOM elements");
    }
    invoke_with_element(
        ctx,
        "__sveltets_1_ensureAnimation",
        "__sveltets_1_AnimationMove,",
    )
}
