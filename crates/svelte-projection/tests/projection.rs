//! End-to-end projection tests.
//!
//! These tests check the projected text of whole components and that
//! positions in it map back to the right places in the component source.

use source_map::{ByteOffset, LineIndex};
use svelte_projection::testing::scan;
use svelte_projection::{project, Projection, ProjectionOptions, ScriptKind};

fn project_file(filename: &str, source: &str) -> Projection {
    let options = ProjectionOptions {
        filename: Some(filename.into()),
    };
    project(source, &scan(source), &options).unwrap()
}

/// Asserts that the first `generated_pattern` in the projection maps back to
/// `expected_line` (1-indexed) of the source.
fn verify_line_mapping(source: &str, generated_pattern: &str, expected_line: u32) {
    let projection = project_file("Test.svelte", source);
    let generated_offset = projection
        .text
        .find(generated_pattern)
        .unwrap_or_else(|| panic!("pattern '{generated_pattern}' not found in:\n{}", projection.text));

    let original = projection
        .map
        .original_position(ByteOffset::from(generated_offset as u32))
        .unwrap_or_else(|| panic!("no mapping for pattern '{generated_pattern}'"));
    let line = LineIndex::new(source).line_col(original).unwrap().line + 1;
    assert_eq!(
        line, expected_line,
        "pattern '{generated_pattern}' maps to line {line}, expected {expected_line}"
    );
}

#[test]
fn test_slot_props_and_directives() {
    let source = "<script>
  export let items;
</script>

<List {items} let:item>
  <li use:tooltip={item.label} class:active={item.on}>{item.name}</li>
</List>
";
    let projection = project_file("Test.svelte", source);
    assert_eq!(projection.script_kind, ScriptKind::Jsx);
    assert!(projection.degraded.is_empty());
    insta::assert_snapshot!(projection.text, @r#"
///<reference types="svelte" />

  let items;


;() => (<><List {items} >{() => { let {item: item} = __sveltets_1_slotProps(__sveltets_1_instanceOf(List), 'default'); return <>
  <li {...__sveltets_1_ensureAction(tooltip(__sveltets_1_mapElementTag('li'),(item.label)))} {...__sveltets_1_ensureType(Boolean, !!(item.on))}>{item.name}</li>
</>}}</List></>);

;const __sveltets_1_render = { props: {items: items}, slots: {}, events: {} };
export default class Test__SvelteComponent_ extends __sveltets_1_createSvelte2TsxComponent(__sveltets_1_render) {
}
"#);
}

#[test]
fn test_component_name_from_route_file() {
    let projection = project_file("src/routes/+page.svelte", "<h1>hi</h1>");
    assert!(projection
        .text
        .contains("export default class Page__SvelteComponent_ extends"));
}

#[test]
fn test_expression_line_numbers() {
    let source = "<script>
  let a = 1;
  let b = 2;
</script>

<p>{a}</p>
<div>
  <span>{b}</span>
</div>";
    verify_line_mapping(source, "{a}", 6);
    verify_line_mapping(source, "{b}", 8);
    verify_line_mapping(source, "let b", 3);
}

#[test]
fn test_directive_line_numbers() {
    let source = "<div
  use:draggable={opts}
  on:click={toggle}
  transition:fade
>x</div>";
    verify_line_mapping(source, "opts", 2);
    verify_line_mapping(source, "click={toggle}", 3);
    verify_line_mapping(source, "toggle", 3);
    verify_line_mapping(source, "fade", 4);
}

#[test]
fn test_reactive_statements_map_to_their_lines() {
    let source = "<script>
  export let n;
  $: doubled = n * 2;
  $: console.log(doubled);
</script>
{doubled}";
    verify_line_mapping(source, "doubled =", 3);
    verify_line_mapping(source, "console.log", 4);
    verify_line_mapping(source, "{doubled}", 6);
}
