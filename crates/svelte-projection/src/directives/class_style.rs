//! `class:name` and `style:property`

use super::RuleContext;
use crate::markup::DirectiveValue;
use crate::types::is_identifier;
use source_map::BufferError;

pub(super) fn project_class(ctx: &mut RuleContext<'_, '_>) -> Result<(), BufferError> {
    if ctx.node.is_component() {
        return ctx.degrade("class directives can only be applied to DOM elements");
    }
    if matches!(ctx.directive.value, DirectiveValue::Text(_)) {
        return ctx.degrade("class directives need an expression");
    }
    wrap_value(ctx, "{...__sveltets_1_ensureType(Boolean, !!(", "))")
}

pub(super) fn project_style(ctx: &mut RuleContext<'_, '_>) -> Result<(), BufferError> {
    if ctx.node.is_component() {
        return ctx.degrade("style directives can only be applied to DOM elements");
    }
    if matches!(ctx.directive.value, DirectiveValue::Text(_)) {
        // A literal style value carries nothing to check.
        let span = ctx.directive.span;
        return ctx.buffer.remove(span.start, span.end);
    }
    wrap_value(ctx, "{...__sveltets_1_ensureType(String, Number, (", "))")
}

/// Wraps the expression (or the shorthand name) in `open` … `close}`.
fn wrap_value(ctx: &mut RuleContext<'_, '_>, open: &str, close: &str) -> Result<(), BufferError> {
    let directive = ctx.directive;
    match directive.expression() {
        Some(expr) => {
            ctx.buffer
                .overwrite(directive.span.start, expr.span.start, open)?;
            ctx.buffer.insert_after(expr.span.end, close)?;
            ctx.strip_trailing_quote()
        }
        None => {
            if !is_identifier(&directive.name) {
                return ctx.degrade("shorthand needs an identifier name");
            }
            ctx.buffer
                .overwrite(directive.span.start, directive.name_span.start, open)?;
            ctx.remove_modifiers()?;
            ctx.buffer
                .insert_after(directive.span.end, format!("{close}}}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::directives::test_util::project_first;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_class_directive() {
        let (text, _) = project_first("<li class:active={current === id}></li>");
        assert_eq!(
            text,
            "<li {...__sveltets_1_ensureType(Boolean, !!(current === id))}></li>"
        );

        let (shorthand, _) = project_first("<li class:active></li>");
        assert_eq!(
            shorthand,
            "<li {...__sveltets_1_ensureType(Boolean, !!(active))}></li>"
        );
    }

    #[test]
    fn test_style_directive() {
        let (text, _) = project_first("<p style:color|important=\"{color}\"></p>");
        assert_eq!(
            text,
            "<p {...__sveltets_1_ensureType(String, Number, (color))}></p>"
        );

        let (literal, degraded) = project_first("<p style:color=\"red\"></p>");
        assert_eq!(literal, "<p ></p>");
        assert!(degraded.is_empty());
    }

    #[test]
    fn test_shorthand_with_invalid_name_degrades() {
        let (text, degraded) = project_first("<p class:is-active style:--gap></p>");
        assert_eq!(text, "<p  ></p>");
        assert_eq!(degraded.len(), 2);
    }
}
