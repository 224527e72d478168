//! `on:event`

use super::RuleContext;
use crate::markup::DirectiveValue;
use source_map::BufferError;

pub(super) fn project_event(ctx: &mut RuleContext<'_, '_>) -> Result<(), BufferError> {
    if matches!(ctx.directive.value, DirectiveValue::Text(_)) {
        return ctx.degrade("event handlers need an expression");
    }
    if ctx.node.is_component() {
        project_component_event(ctx)
    } else {
        project_element_event(ctx)
    }
}

/// `on:click|preventDefault={handler}` becomes the JSX attribute `onclick={handler}`.
fn project_element_event(ctx: &mut RuleContext<'_, '_>) -> Result<(), BufferError> {
    let directive = ctx.directive;
    ctx.buffer
        .overwrite(directive.span.start, directive.name_span.start, "on")?;
    ctx.remove_modifiers()?;
    match directive.expression() {
        Some(_) => {
            ctx.strip_opening_quote()?;
            ctx.strip_trailing_quote()
        }
        // Bubbling: `on:click` forwards the event.
        None => ctx.buffer.insert_after(directive.span.end, "={undefined}"),
    }
}

/// Component events are checked against the component's declared events.
fn project_component_event(ctx: &mut RuleContext<'_, '_>) -> Result<(), BufferError> {
    let directive = ctx.directive;
    let instance = format!("__sveltets_1_instanceOf({})", ctx.node.name);
    match directive.expression() {
        Some(expr) => {
            ctx.buffer.overwrite(
                directive.span.start,
                expr.span.start,
                format!(
                    "{{...__sveltets_1_onComponentEvent({instance}, '{}', (",
                    directive.name
                ),
            )?;
            ctx.buffer.insert_after(expr.span.end, "))")?;
            ctx.strip_trailing_quote()
        }
        None => ctx.buffer.overwrite(
            directive.span.start,
            directive.span.end,
            format!(
                "{{...__sveltets_1_bubbleComponentEvent({instance}, '{}')}}",
                directive.name
            ),
        ),
    }
}
