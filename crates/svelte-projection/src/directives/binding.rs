//! `bind:property`

use super::{element_class, RuleContext};
use crate::markup::DirectiveValue;
use crate::types::is_identifier;
use source_map::BufferError;

/// Bindings that only flow from the element to the variable.
const ONE_WAY_BINDINGS: &[&str] = &[
    "clientWidth",
    "clientHeight",
    "offsetWidth",
    "offsetHeight",
    "duration",
    "buffered",
    "seekable",
    "seeking",
    "played",
    "ended",
    "readyState",
    "naturalWidth",
    "naturalHeight",
];

pub(super) fn project_binding(ctx: &mut RuleContext<'_, '_>) -> Result<(), BufferError> {
    let directive = ctx.directive;
    match &directive.value {
        DirectiveValue::Text(_) => return ctx.degrade("bindings need an expression"),
        DirectiveValue::Shorthand if !is_identifier(&directive.name) || directive.name == "this" => {
            return ctx.degrade("shorthand binding needs an identifier name");
        }
        _ => {}
    }

    if directive.name == "this" {
        project_this(ctx)
    } else if !ctx.node.is_component() && ONE_WAY_BINDINGS.contains(&directive.name.as_str()) {
        project_one_way(ctx)
    } else {
        project_two_way(ctx)
    }
}

/// `bind:this={el}` checks that `el` can hold the element or component instance.
fn project_this(ctx: &mut RuleContext<'_, '_>) -> Result<(), BufferError> {
    let directive = ctx.directive;
    let Some(expr) = directive.expression() else {
        return Ok(());
    };
    let node = ctx.node;
    let class = if node.is_component() {
        node.name.as_str()
    } else {
        element_class(&node.name)
    };
    ctx.buffer.overwrite(
        directive.span.start,
        expr.span.start,
        format!("{{...__sveltets_1_ensureType({class}, "),
    )?;
    ctx.buffer.overwrite(expr.span.end, directive.span.end, ")}")
}

/// `bind:clientWidth={w}` assigns the element property to `w`.
fn project_one_way(ctx: &mut RuleContext<'_, '_>) -> Result<(), BufferError> {
    let directive = ctx.directive;
    let read = format!(
        "=__sveltets_1_instanceOf({}).{})}}",
        element_class(&ctx.node.name),
        directive.name
    );
    match directive.expression() {
        Some(expr) => {
            ctx.buffer
                .overwrite(directive.span.start, expr.span.start, "{...__sveltets_1_empty(")?;
            ctx.buffer.overwrite(expr.span.end, directive.span.end, read)
        }
        None => {
            ctx.buffer
                .overwrite(directive.span.start, directive.name_span.start, "{...__sveltets_1_empty(")?;
            ctx.buffer.insert_after(directive.span.end, read)
        }
    }
}

/// `bind:value={v}` becomes the plain prop `value={v}`.
fn project_two_way(ctx: &mut RuleContext<'_, '_>) -> Result<(), BufferError> {
    let directive = ctx.directive;
    ctx.buffer.remove(directive.span.start, directive.name_span.start)?;
    match directive.expression() {
        Some(_) => {
            ctx.strip_opening_quote()?;
            ctx.strip_trailing_quote()
        }
        None => ctx
            .buffer
            .insert_after(directive.span.end, format!("={{{}}}", directive.name)),
    }
}

#[cfg(test)]
mod tests {
    use crate::directives::test_util::project_first;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_two_way_binding() {
        let (text, _) = project_first("<input bind:value={name}>");
        assert_eq!(text, "<input value={name}>");

        let (quoted, _) = project_first("<input bind:value=\"{name}\">");
        assert_eq!(quoted, "<input value={name}>");

        let (shorthand, _) = project_first("<input bind:value>");
        assert_eq!(shorthand, "<input value={value}>");

        let (spaced, _) = project_first("<input bind:value= '{name}'>");
        assert_eq!(spaced, "<input value= {name}>");
    }

    #[test]
    fn test_bind_this() {
        let (element, _) = project_first("<div bind:this={el}></div>");
        assert_eq!(
            element,
            "<div {...__sveltets_1_ensureType(HTMLDivElement, el)}></div>"
        );

        let (component, _) = project_first("<Modal bind:this=\"{modal}\" />");
        assert_eq!(
            component,
            "<Modal {...__sveltets_1_ensureType(Modal, modal)} />"
        );
    }

    #[test]
    fn test_one_way_binding() {
        let (text, _) = project_first("<div bind:clientWidth={w}></div>");
        assert_eq!(
            text,
            "<div {...__sveltets_1_empty(w=__sveltets_1_instanceOf(HTMLDivElement).clientWidth)}></div>"
        );

        let (shorthand, _) = project_first("<video bind:duration></video>");
        assert_eq!(
            shorthand,
            "<video {...__sveltets_1_empty(duration=__sveltets_1_instanceOf(HTMLVideoElement).duration)}></video>"
        );
    }

    #[test]
    fn test_component_binding_is_a_prop() {
        let (text, _) = project_first("<Slider bind:duration={d} />");
        assert_eq!(text, "<Slider duration={d} />");
    }

    #[test]
    fn test_malformed_bindings_degrade() {
        let (text, degraded) = project_first("<input bind:value=\"name\" bind:this>");
        assert_eq!(text, "<input  >");
        assert_eq!(degraded.len(), 2);
    }
}
