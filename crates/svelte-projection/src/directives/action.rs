//! `use:action`

use super::RuleContext;
use crate::markup::DirectiveValue;
use source_map::BufferError;

pub(super) fn project_action(ctx: &mut RuleContext<'_, '_>) -> Result<(), BufferError> {
    if ctx.node.is_component() {
        return ctx.degrade("actions can only be applied to DOM elements");
    }
    invoke_with_element(ctx, "__sveltets_1_ensureAction", "")
}

/// Rewrites `prefix:name={expr}` into `{...wrapper(name(element,extra(expr)))}`.
///
/// `extra` is spliced between the element token and the expression, e.g. the
/// animation move argument followed by a comma. Without an expression only
/// `name(element)` is called. Modifiers are dropped.
pub(super) fn invoke_with_element(
    ctx: &mut RuleContext<'_, '_>,
    wrapper: &str,
    extra: &str,
) -> Result<(), BufferError> {
    let directive = ctx.directive;
    if matches!(directive.value, DirectiveValue::Text(_)) {
        return ctx.degrade("expected an expression, found a text value");
    }

    let token = ctx.element_token();
    ctx.buffer.overwrite(
        directive.span.start,
        directive.name_span.start,
        format!("{{...{wrapper}("),
    )?;

    match &directive.value {
        DirectiveValue::Expression(expr) => {
            ctx.buffer.overwrite(
                directive.name_span.end,
                expr.span.start,
                format!("({token},{extra}("),
            )?;
            ctx.buffer.insert_after(expr.span.end, ")))")?;
            ctx.strip_trailing_quote()
        }
        _ => {
            ctx.remove_modifiers()?;
            let args = match extra.strip_suffix(',') {
                Some(extra) => format!("{token},{extra}"),
                None => token,
            };
            ctx.buffer.insert_after(directive.span.end, format!("({args}))}}"))
        }
    }
}
