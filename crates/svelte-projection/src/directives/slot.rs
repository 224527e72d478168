//! `let:name` (slot props)

use super::RuleContext;
use crate::markup::DirectiveValue;
use source_map::BufferError;

/// Removes the directive and wraps the node's children in a scope that
/// destructures the slot props it names.
pub(super) fn project_let(ctx: &mut RuleContext<'_, '_>) -> Result<(), BufferError> {
    let directive = ctx.directive;
    let node = ctx.node;
    let Some(content) = node.content_span else {
        return ctx.degrade("slot props need content to scope");
    };

    let (component, slot) = if node.is_component() {
        (node.name.as_str(), "default")
    } else {
        match ctx.parent_component {
            Some(parent) => (
                parent.name.as_str(),
                node.text_attribute("slot").unwrap_or("default"),
            ),
            None => return ctx.degrade("slot props outside of a component"),
        }
    };

    let binding = match &directive.value {
        DirectiveValue::Shorthand => directive.name.as_str(),
        DirectiveValue::Expression(expr) => expr.span.slice(ctx.source).unwrap_or(&expr.expression),
        DirectiveValue::Text(_) => return ctx.degrade("slot props need a binding pattern"),
    };
    let open = format!(
        "{{() => {{ let {{{}: {binding}}} = __sveltets_1_slotProps(__sveltets_1_instanceOf({component}), '{slot}'); return <>",
        directive.name
    );

    ctx.buffer.remove(directive.span.start, directive.span.end)?;
    if content.is_empty() {
        ctx.buffer.insert_before(content.start, open)?;
        ctx.buffer.insert_before(content.start, "</>}}")
    } else {
        ctx.buffer.insert_before(content.start, open)?;
        ctx.buffer.insert_after(content.end, "</>}}")
    }
}

#[cfg(test)]
mod tests {
    use crate::directives::test_util::project_first;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_let_on_component() {
        let (text, _) = project_first("<List let:item={row}><b>{row}</b></List>");
        assert_eq!(
            text,
            "<List >{() => { let {item: row} = __sveltets_1_slotProps(__sveltets_1_instanceOf(List), 'default'); return <><b>{row}</b></>}}</List>"
        );
    }

    #[test]
    fn test_let_on_named_slot_element() {
        let (text, _) = project_first("<Table><tr slot=\"row\" let:cells>x</tr></Table>");
        assert_eq!(
            text,
            "<Table><tr slot=\"row\" >{() => { let {cells: cells} = __sveltets_1_slotProps(__sveltets_1_instanceOf(Table), 'row'); return <>x</>}}</tr></Table>"
        );
    }

    #[test]
    fn test_let_with_empty_content_keeps_order() {
        let (text, _) = project_first("<List let:item></List>");
        assert_eq!(
            text,
            "<List >{() => { let {item: item} = __sveltets_1_slotProps(__sveltets_1_instanceOf(List), 'default'); return <></>}}</List>"
        );
    }

    #[test]
    fn test_let_on_self_closing_degrades() {
        let (text, degraded) = project_first("<List let:item />");
        assert_eq!(text, "<List  />");
        assert_eq!(degraded.len(), 1);
    }
}
