//! A minimal markup scanner for tests.
//!
//! Real markup parsing is done outside this crate. This scanner understands
//! just enough (tags, attributes, directives, script and style blocks) to build
//! [`MarkupDocument`]s from short fixtures.

use crate::markup::{
    Attribute, AttributeValue, Directive, DirectiveKind, DirectiveValue, ExpressionValue,
    MarkupDocument, MarkupNode, NodeKind, NormalAttribute, ScriptBlock, TextValue,
};
use smol_str::SmolStr;
use source_map::Span;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Scans `source` into a markup tree. Panics on input it cannot handle.
pub fn scan(source: &str) -> MarkupDocument {
    let mut scanner = Scanner { source, pos: 0 };
    let mut document = MarkupDocument::default();
    let mut stack: Vec<MarkupNode> = Vec::new();

    while scanner.pos < source.len() {
        let rest = scanner.rest();
        if rest.starts_with("<!--") {
            let end = rest.find("-->").expect("unterminated comment");
            scanner.pos += end + 3;
        } else if rest.starts_with("</") {
            let close = rest.find('>').expect("unterminated end tag");
            scanner.pos += close + 1;
            let mut node = stack.pop().expect("unbalanced end tag");
            let content_start = node.content_span.map_or(node.span.end, |span| span.start);
            let content_end = scanner.pos - close - 1;
            node.content_span = Some(Span::new(content_start, content_end as u32));
            node.span.end = (scanner.pos as u32).into();
            push_node(&mut document, &mut stack, node);
        } else if rest.starts_with('<') {
            let start = scanner.pos;
            scanner.pos += 1;
            let name = scanner.take_while(|c| !c.is_whitespace() && c != '>' && c != '/');
            if name == "script" || name == "style" {
                scanner.raw_block(&mut document, start, name);
                continue;
            }
            let attributes = scanner.attributes();
            let self_closing = scanner.rest().starts_with("/>");
            scanner.pos += if self_closing { 2 } else { 1 };

            let kind = if name.starts_with(|c: char| c.is_ascii_uppercase()) || name.contains('.') {
                NodeKind::Component
            } else {
                NodeKind::Element
            };
            let mut node = MarkupNode {
                kind,
                name: name.into(),
                span: Span::from_usize(start, scanner.pos),
                content_span: None,
                attributes,
                children: Vec::new(),
            };
            if self_closing || VOID_ELEMENTS.contains(&name) {
                push_node(&mut document, &mut stack, node);
            } else {
                // Remember where the content starts until the end tag shows up.
                node.content_span = Some(Span::empty(scanner.pos as u32));
                stack.push(node);
            }
        } else if rest.starts_with('{') {
            scanner.pos += 1;
            scanner.skip_braced();
        } else {
            scanner.pos += rest.chars().next().map_or(1, char::len_utf8);
        }
    }

    assert!(stack.is_empty(), "unclosed element in fixture");
    document
}

fn push_node(document: &mut MarkupDocument, stack: &mut [MarkupNode], node: MarkupNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => document.nodes.push(node),
    }
}

struct Scanner<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn take_while(&mut self, f: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|c: char| !f(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }

    /// Skips to just past the `}` matching an already consumed `{`.
    fn skip_braced(&mut self) -> usize {
        let mut depth = 1;
        let mut quote: Option<char> = None;
        for (i, c) in self.rest().char_indices() {
            match (quote, c) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '"' | '\'' | '`') => quote = Some(c),
                (None, '{') => depth += 1,
                (None, '}') => {
                    depth -= 1;
                    if depth == 0 {
                        let end = self.pos + i;
                        self.pos = end + 1;
                        return end;
                    }
                }
                _ => {}
            }
        }
        panic!("unterminated braces in fixture");
    }

    fn raw_block(&mut self, document: &mut MarkupDocument, start: usize, name: &str) {
        let attributes = self.attributes();
        self.pos += 1;
        let content_start = self.pos;
        let close = format!("</{name}>");
        let content_end = content_start + self.rest().find(&close).expect("unterminated block");
        self.pos = content_end + close.len();
        let span = Span::from_usize(start, self.pos);

        if name == "style" {
            document.styles.push(span);
            return;
        }

        let text_attr = |wanted: &str| {
            attributes.iter().find_map(|attr| match attr {
                Attribute::Normal(NormalAttribute {
                    name,
                    value: AttributeValue::Text(text),
                    ..
                }) if name == wanted => Some(SmolStr::new(&text.value)),
                _ => None,
            })
        };
        let block = ScriptBlock {
            span,
            content_span: Span::from_usize(content_start, content_end),
            lang: text_attr("lang").or_else(|| text_attr("type")),
        };
        if text_attr("context").as_deref() == Some("module") {
            document.module_script = Some(block);
        } else {
            document.instance_script = Some(block);
        }
    }

    fn attributes(&mut self) -> Vec<Attribute> {
        let mut attributes = Vec::new();
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() || rest.starts_with('>') || rest.starts_with("/>") {
                return attributes;
            }
            attributes.push(self.attribute());
        }
    }

    fn attribute(&mut self) -> Attribute {
        let start = self.pos;
        let full_name = self.take_while(|c| !c.is_whitespace() && !matches!(c, '=' | '>' | '/'));

        let name_end = self.pos;
        self.skip_whitespace();
        let value = if self.rest().starts_with('=') {
            self.pos += 1;
            self.skip_whitespace();
            self.value()
        } else {
            self.pos = name_end;
            None
        };
        let span = Span::from_usize(start, self.pos);

        let directive = full_name
            .split_once(':')
            .and_then(|(prefix, rest)| Some((DirectiveKind::from_prefix(prefix)?, prefix, rest)));
        let Some((kind, prefix, rest)) = directive else {
            return Attribute::Normal(NormalAttribute {
                span,
                name: full_name.into(),
                value: match value {
                    None => AttributeValue::True,
                    Some(DirectiveValue::Expression(expr)) => AttributeValue::Expression(expr),
                    Some(DirectiveValue::Text(text)) => AttributeValue::Text(text),
                    Some(DirectiveValue::Shorthand) => AttributeValue::True,
                },
            });
        };

        let mut parts = rest.split('|');
        let name = parts.next().unwrap_or_default();
        let name_start = start + prefix.len() + 1;
        Attribute::Directive(Directive {
            span,
            kind,
            name: name.into(),
            name_span: Span::from_usize(name_start, name_start + name.len()),
            modifiers: parts.map(SmolStr::new).collect(),
            value: value.unwrap_or(DirectiveValue::Shorthand),
        })
    }

    fn value(&mut self) -> Option<DirectiveValue> {
        let rest = self.rest();
        let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'');
        if quote.is_some() {
            self.pos += 1;
        }
        if self.rest().starts_with('{') {
            self.pos += 1;
            let expr_start = self.pos;
            let expr_end = self.skip_braced();
            if quote.is_some() {
                self.pos += 1;
            }
            return Some(DirectiveValue::Expression(ExpressionValue {
                span: Span::from_usize(expr_start, expr_end),
                expression: self.source[expr_start..expr_end].to_string(),
                quote,
            }));
        }

        let text_start = self.pos;
        let text = match quote {
            Some(q) => {
                let text = self.take_while(|c| c != q);
                self.pos += 1;
                text
            }
            None => self.take_while(|c| !c.is_whitespace() && c != '>'),
        };
        Some(DirectiveValue::Text(TextValue {
            span: Span::from_usize(text_start, text_start + text.len()),
            value: text.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scan_nested_component_with_directives() {
        let source = r#"<script lang="ts">let a = 1;</script>
<List items={xs} let:item><li on:click|once="{go}">{item}</li></List>
<style>li {}</style>"#;
        let document = scan(source);

        let script = document.instance_script.unwrap();
        assert!(script.is_typescript());
        assert_eq!(script.content_span.slice(source), Some("let a = 1;"));
        assert_eq!(document.styles.len(), 1);

        let list = &document.nodes[0];
        assert!(list.is_component());
        assert_eq!(list.content_span.unwrap().slice(source), Some(r#"<li on:click|once="{go}">{item}</li>"#));

        let li = &list.children[0];
        let Attribute::Directive(on) = &li.attributes[0] else {
            panic!("expected a directive");
        };
        assert_eq!(on.kind, DirectiveKind::EventHandler);
        assert_eq!(on.name_span.slice(source), Some("click"));
        assert_eq!(on.modifiers, vec![SmolStr::new("once")]);
        assert_eq!(on.span.slice(source), Some(r#"on:click|once="{go}""#));
        let expr = on.expression().unwrap();
        assert_eq!(expr.expression, "go");
        assert_eq!(expr.quote, Some('"'));
    }
}
