//! Directive transform rules.
//!
//! Each [`DirectiveKind`] has exactly one rule, looked up through [`rule_for`].
//! A rule rewrites a single directive attribute in place through the buffer,
//! turning it into a TSX expression that keeps the types the checker needs
//! (element type, component type, event name).
//!
//! Rules never fail on malformed markup. A directive that cannot be projected
//! is removed and recorded as a [`DegradedDirective`]; only buffer contract
//! violations are returned as errors.

mod action;
mod binding;
mod class_style;
mod event;
mod slot;
mod transition;

use crate::markup::{Directive, DirectiveKind, DirectiveValue, MarkupNode};
use source_map::{BufferError, MappedBuffer, Span};
use text_size::TextSize;
use tracing::warn;

/// The shared signature of every rule.
pub type TransformRule = fn(&mut RuleContext<'_, '_>) -> Result<(), BufferError>;

/// Returns the rule for a directive kind.
pub fn rule_for(kind: DirectiveKind) -> TransformRule {
    match kind {
        DirectiveKind::Action => action::project_action,
        DirectiveKind::Binding => binding::project_binding,
        DirectiveKind::EventHandler => event::project_event,
        DirectiveKind::Transition => transition::project_transition,
        DirectiveKind::Animation => transition::project_animation,
        DirectiveKind::Class => class_style::project_class,
        DirectiveKind::Style => class_style::project_style,
        DirectiveKind::Let => slot::project_let,
    }
}

/// A directive that was projected without type information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegradedDirective {
    pub span: Span,
    pub kind: DirectiveKind,
    pub reason: &'static str,
}

/// Everything a rule may look at or edit.
pub struct RuleContext<'buf, 'src> {
    pub source: &'src str,
    pub buffer: &'buf mut MappedBuffer<'src>,
    pub directive: &'buf Directive,
    /// The element or component carrying the directive.
    pub node: &'buf MarkupNode,
    /// The closest component enclosing `node`, excluding `node` itself.
    pub parent_component: Option<&'buf MarkupNode>,
    pub degraded: &'buf mut Vec<DegradedDirective>,
}

impl RuleContext<'_, '_> {
    /// Drops the whole attribute and records why.
    fn degrade(&mut self, reason: &'static str) -> Result<(), BufferError> {
        let directive = self.directive;
        warn!(
            kind = ?directive.kind,
            name = %directive.name,
            start = u32::from(directive.span.start),
            reason,
            "projecting directive without type information"
        );
        self.buffer.remove(directive.span.start, directive.span.end)?;
        self.degraded.push(DegradedDirective {
            span: directive.span,
            kind: directive.kind,
            reason,
        });
        Ok(())
    }

    /// Removes `|modifier` suffixes after the name.
    fn remove_modifiers(&mut self) -> Result<(), BufferError> {
        self.buffer
            .remove(self.directive.name_span.end, self.directive.head_end())
    }

    /// Removes the quote before the closing attribute boundary of `name="{expr}"`.
    fn strip_trailing_quote(&mut self) -> Result<(), BufferError> {
        if self.is_quoted() {
            let end = self.directive.span.end;
            self.buffer.remove(end - TextSize::from(1), end)?;
        }
        Ok(())
    }

    /// Removes the quote after `=` in `name="{expr}"`. Whitespace may
    /// surround the `=`.
    fn strip_opening_quote(&mut self) -> Result<(), BufferError> {
        let directive = self.directive;
        let Some(expr) = directive.expression() else {
            return Ok(());
        };
        let Some(quote) = expr.quote else {
            return Ok(());
        };
        let head_end = usize::from(directive.head_end());
        let found = self
            .source
            .get(head_end..usize::from(expr.span.start))
            .and_then(|between| between.rfind(quote));
        if let Some(index) = found {
            let at = TextSize::from((head_end + index) as u32);
            self.buffer.remove(at, at + TextSize::from(1))?;
        }
        Ok(())
    }

    fn is_quoted(&self) -> bool {
        matches!(&self.directive.value, DirectiveValue::Expression(expr) if expr.quote.is_some())
    }

    /// The expression naming the element type, for actions and transitions.
    fn element_token(&self) -> String {
        element_token(&self.node.name)
    }
}

/// Maps a tag name to an expression whose type is the element's DOM type.
pub fn element_token(tag: &str) -> String {
    match tag {
        "svelte:window" => "__sveltets_1_mapWindowTag()".to_string(),
        "svelte:document" => "__sveltets_1_mapDocumentTag()".to_string(),
        "svelte:body" => "__sveltets_1_mapElementTag('body')".to_string(),
        _ => format!("__sveltets_1_mapElementTag('{tag}')"),
    }
}

/// Maps a tag name to the DOM interface used for `bind:this` and one-way bindings.
pub fn element_class(tag: &str) -> &'static str {
    match tag {
        "a" => "HTMLAnchorElement",
        "audio" => "HTMLAudioElement",
        "button" => "HTMLButtonElement",
        "canvas" => "HTMLCanvasElement",
        "dialog" => "HTMLDialogElement",
        "div" => "HTMLDivElement",
        "form" => "HTMLFormElement",
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => "HTMLHeadingElement",
        "iframe" => "HTMLIFrameElement",
        "img" => "HTMLImageElement",
        "input" => "HTMLInputElement",
        "label" => "HTMLLabelElement",
        "li" => "HTMLLIElement",
        "ol" => "HTMLOListElement",
        "option" => "HTMLOptionElement",
        "p" => "HTMLParagraphElement",
        "select" => "HTMLSelectElement",
        "span" => "HTMLSpanElement",
        "svg" => "SVGSVGElement",
        "table" => "HTMLTableElement",
        "textarea" => "HTMLTextAreaElement",
        "ul" => "HTMLUListElement",
        "video" => "HTMLVideoElement",
        "svelte:body" => "HTMLBodyElement",
        _ => "HTMLElement",
    }
}

/// Runs the rule for one directive.
pub fn apply(ctx: &mut RuleContext<'_, '_>) -> Result<(), BufferError> {
    rule_for(ctx.directive.kind)(ctx)
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::*;
    use crate::testing::scan;

    /// Projects every directive of the first node in `markup` and returns the text.
    pub fn project_first(markup: &str) -> (String, Vec<DegradedDirective>) {
        let document = scan(markup);
        let mut buffer = MappedBuffer::new(markup);
        let mut degraded = Vec::new();
        let (node, parent) = first_with_directives(&document.nodes, None)
            .expect("fixture has a node with directives");
        for attr in &node.attributes {
            let crate::markup::Attribute::Directive(directive) = attr else {
                continue;
            };
            let mut ctx = RuleContext {
                source: markup,
                buffer: &mut buffer,
                directive,
                node,
                parent_component: parent,
                degraded: &mut degraded,
            };
            apply(&mut ctx).unwrap();
        }
        (buffer.finalize().text, degraded)
    }

    fn first_with_directives<'a>(
        nodes: &'a [MarkupNode],
        parent: Option<&'a MarkupNode>,
    ) -> Option<(&'a MarkupNode, Option<&'a MarkupNode>)> {
        for node in nodes {
            if node
                .attributes
                .iter()
                .any(|a| matches!(a, crate::markup::Attribute::Directive(_)))
            {
                return Some((node, parent));
            }
            let next_parent = if node.is_component() { Some(node) } else { parent };
            if let Some(found) = first_with_directives(&node.children, next_parent) {
                return Some(found);
            }
        }
        None
    }
}
