//! Ambient declarations for the helpers projections call.
//!
//! The shims are served from memory under a virtual directory and listed
//! among every project's script files.

use camino::{Utf8Path, Utf8PathBuf};

/// Virtual directory holding the shim files.
pub const SHIMS_DIR: &str = "/__svelte_shims__";

const SVELTE_SHIMS_DTS: &str = r#"// Helpers referenced by projected components.

declare type __sveltets_1_Constructor<T> = new (...args: any[]) => T;

declare const __sveltets_1_AnimationMove: { from: DOMRect; to: DOMRect };

declare function __sveltets_1_ensureAction<T>(action: T): {};
declare function __sveltets_1_ensureTransition<T>(transition: T): {};
declare function __sveltets_1_ensureAnimation<T>(animation: T): {};

declare function __sveltets_1_ensureType<T>(type: __sveltets_1_Constructor<T>, value: T): {};
declare function __sveltets_1_ensureType<T1, T2>(
  type1: __sveltets_1_Constructor<T1>,
  type2: __sveltets_1_Constructor<T2>,
  value: T1 | T2
): {};

declare function __sveltets_1_empty(...expressions: any[]): {};
declare function __sveltets_1_instanceOf<T>(type: __sveltets_1_Constructor<T>): T;
declare function __sveltets_1_invalidate<T>(getValue: () => T): T;

declare function __sveltets_1_mapElementTag<K extends keyof HTMLElementTagNameMap>(
  tag: K
): HTMLElementTagNameMap[K];
declare function __sveltets_1_mapElementTag<K extends keyof SVGElementTagNameMap>(
  tag: K
): SVGElementTagNameMap[K];
declare function __sveltets_1_mapElementTag(tag: string): HTMLElement;
declare function __sveltets_1_mapWindowTag(): Window;
declare function __sveltets_1_mapDocumentTag(): Document;

declare function __sveltets_1_onComponentEvent<C extends { $on(event: any, handler: any): any }>(
  component: C,
  event: Parameters<C["$on"]>[0],
  handler: Parameters<C["$on"]>[1]
): {};
declare function __sveltets_1_bubbleComponentEvent<C extends { $on(event: any, handler: any): any }>(
  component: C,
  event: Parameters<C["$on"]>[0]
): {};

declare function __sveltets_1_slotProps<C extends { $$slot_def: Record<string, any> }, S extends keyof C["$$slot_def"]>(
  component: C,
  slot: S
): C["$$slot_def"][S];

declare type __sveltets_1_Render = {
  props: Record<string, any>;
  slots: Record<string, any>;
  events: Record<string, any>;
};

declare function __sveltets_1_createSvelte2TsxComponent<R extends __sveltets_1_Render>(
  render: R
): new (options: { target: Element; props?: Partial<R["props"]> }) => {
  $$prop_def: R["props"];
  $$slot_def: R["slots"];
  $$events_def: R["events"];
  $on<K extends keyof R["events"] & string>(event: K, handler: (e: R["events"][K]) => any): () => void;
  $set(props: Partial<R["props"]>): void;
  $destroy(): void;
};
"#;

const SVELTE_JSX_DTS: &str = r#"// Element typing for projected markup.

declare namespace JSX {
  type Element = any;

  interface ElementClass {
    $$prop_def: any;
  }

  interface ElementAttributesProperty {
    $$prop_def: any;
  }

  interface IntrinsicAttributes {
    slot?: string;
  }

  interface IntrinsicElements {
    [name: string]: { [attribute: string]: any };
  }
}
"#;

const SHIMS: [(&str, &str); 2] = [
    ("svelte-shims.d.ts", SVELTE_SHIMS_DTS),
    ("svelte-jsx.d.ts", SVELTE_JSX_DTS),
];

/// Paths of all shim files.
pub fn shim_paths() -> impl Iterator<Item = Utf8PathBuf> {
    SHIMS
        .iter()
        .map(|(name, _)| Utf8Path::new(SHIMS_DIR).join(name))
}

/// Returns the text of the shim at `path`, if it is one.
pub fn shim_text(path: &Utf8Path) -> Option<&'static str> {
    let name = path.strip_prefix(SHIMS_DIR).ok()?;
    SHIMS
        .iter()
        .find(|(shim, _)| name.as_str() == *shim)
        .map(|(_, text)| *text)
}
