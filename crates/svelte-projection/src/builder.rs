//! Builds the TSX projection of one component.

use camino::Utf8PathBuf;
use rustc_hash::FxHashSet;
use source_map::{MappedBuffer, MappedText, PositionMap, Span};
use tracing::debug;

use crate::directives::{self, DegradedDirective, RuleContext};
use crate::error::ProjectionError;
use crate::markup::{Attribute, MarkupDocument, MarkupNode, ScriptBlock};
use crate::script::{project_script, Declaration, DeclarationKind, ScriptRole};
use crate::types::{component_name_from_path, ScriptKind};

const HEADER: &str = "///<reference types=\"svelte\" />\n";
const MARKUP_OPEN: &str = ";() => (<>";
const MARKUP_CLOSE: &str = "</>);";

/// Options for projection.
#[derive(Debug, Clone, Default)]
pub struct ProjectionOptions {
    /// The component's file path, used to name the exported class.
    pub filename: Option<Utf8PathBuf>,
}

/// The projected text of one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub text: String,
    pub map: PositionMap,
    pub script_kind: ScriptKind,
    /// Top-level script declarations in source order.
    pub declarations: Vec<Declaration>,
    /// Directives that were projected without type information.
    pub degraded: Vec<DegradedDirective>,
}

/// Projects a parsed component into TSX.
///
/// The layout is:
/// - a reference to the shim declarations,
/// - script contents at module level, without their tags,
/// - every markup region wrapped in an arrow function returning a fragment,
/// - a footer exporting a component class typed from the collected props.
///
/// Style blocks are dropped. The result only depends on `source` and `document`.
pub fn project(
    source: &str,
    document: &MarkupDocument,
    options: &ProjectionOptions,
) -> Result<Projection, ProjectionError> {
    let mut buffer = MappedBuffer::new(source);
    buffer
        .insert_before(0u32, HEADER)
        .map_err(ProjectionError::layout("header"))?;

    let mut declarations = Vec::new();
    let mut known_names = FxHashSet::default();
    // The module script goes first: its names are visible to the instance script.
    let scripts = [
        (&document.module_script, ScriptRole::Module),
        (&document.instance_script, ScriptRole::Instance),
    ];
    for (block, role) in scripts {
        let Some(block) = block else {
            continue;
        };
        buffer
            .remove(block.span.start, block.content_span.start)
            .and_then(|()| buffer.remove(block.content_span.end, block.span.end))
            .map_err(ProjectionError::layout("script tags"))?;
        declarations.extend(
            project_script(&mut buffer, source, block, role, &mut known_names)
                .map_err(ProjectionError::layout("script"))?,
        );
    }
    declarations.sort_by_key(|declaration| declaration.original.start);

    for style in &document.styles {
        buffer
            .remove(style.start, style.end)
            .map_err(ProjectionError::layout("style"))?;
    }

    wrap_markup_regions(&mut buffer, source, document)?;

    let mut degraded = Vec::new();
    project_nodes(&mut buffer, source, &document.nodes, None, &mut degraded)?;

    let component_name = options
        .filename
        .as_deref()
        .map(component_name_from_path)
        .unwrap_or_else(|| "Component".to_string());
    buffer
        .insert_after(source.len() as u32, footer(&component_name, &declarations))
        .map_err(ProjectionError::layout("footer"))?;

    let MappedText { text, map } = buffer.finalize();
    for declaration in &mut declarations {
        declaration.generated = generated_span(&map, declaration.original);
    }

    let typescript = document
        .instance_script
        .iter()
        .chain(&document.module_script)
        .any(ScriptBlock::is_typescript);

    debug!(
        component = %component_name,
        declarations = declarations.len(),
        degraded = degraded.len(),
        "projected component"
    );

    Ok(Projection {
        text,
        map,
        script_kind: ScriptKind::for_component(typescript),
        declarations,
        degraded,
    })
}

/// Wraps each non-blank stretch of markup between script and style blocks.
fn wrap_markup_regions(
    buffer: &mut MappedBuffer<'_>,
    source: &str,
    document: &MarkupDocument,
) -> Result<(), ProjectionError> {
    let mut blocks: Vec<Span> = document
        .instance_script
        .iter()
        .chain(&document.module_script)
        .map(|block| block.span)
        .chain(document.styles.iter().copied())
        .collect();
    blocks.sort();

    let mut region_start = 0usize;
    let region_ends = blocks
        .iter()
        .map(|block| (block.range().start, block.range().end))
        .chain(std::iter::once((source.len(), source.len())));
    for (region_end, next_start) in region_ends {
        let region = &source[region_start..region_end.max(region_start)];
        let trimmed = region.trim_start();
        if !trimmed.trim_end().is_empty() {
            let start = region_start + (region.len() - trimmed.len());
            let end = start + trimmed.trim_end().len();
            buffer
                .insert_before(start as u32, MARKUP_OPEN)
                .and_then(|()| buffer.insert_after(end as u32, MARKUP_CLOSE))
                .map_err(ProjectionError::layout("markup"))?;
        }
        region_start = next_start;
    }
    Ok(())
}

/// Runs directive rules depth-first in source order.
fn project_nodes<'src>(
    buffer: &mut MappedBuffer<'src>,
    source: &'src str,
    nodes: &[MarkupNode],
    parent_component: Option<&MarkupNode>,
    degraded: &mut Vec<DegradedDirective>,
) -> Result<(), ProjectionError> {
    for node in nodes {
        for attribute in &node.attributes {
            let Attribute::Directive(directive) = attribute else {
                continue;
            };
            let mut ctx = RuleContext {
                source,
                buffer: &mut *buffer,
                directive,
                node,
                parent_component,
                degraded: &mut *degraded,
            };
            directives::apply(&mut ctx).map_err(|source| ProjectionError::Directive {
                kind: directive.kind,
                span: directive.span,
                source,
            })?;
        }

        let parent = if node.is_component() {
            Some(node)
        } else {
            parent_component
        };
        project_nodes(buffer, source, &node.children, parent, degraded)?;
    }
    Ok(())
}

fn footer(component_name: &str, declarations: &[Declaration]) -> String {
    let props = declarations
        .iter()
        .filter(|declaration| declaration.kind == DeclarationKind::Prop)
        .map(|declaration| format!("{0}: {0}", declaration.name))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "\n;const __sveltets_1_render = {{ props: {{{props}}}, slots: {{}}, events: {{}} }};\n\
         export default class {component_name}__SvelteComponent_ extends \
         __sveltets_1_createSvelte2TsxComponent(__sveltets_1_render) {{\n}}\n"
    )
}

/// Finds a declaration's identifier in the projection when it was copied verbatim.
fn generated_span(map: &PositionMap, original: Span) -> Option<Span> {
    let start = map.generated_position(original.start)?;
    let segment = map.segment_at(start)?;
    let generated = Span::new(start, start + original.len());
    (segment.is_exact() && segment.generated.contains_span(generated)).then_some(generated)
}
