//! Script kinds and component naming.

use camino::Utf8Path;

/// How the checking engine should parse a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptKind {
    Js,
    Jsx,
    Ts,
    Tsx,
}

impl ScriptKind {
    /// Picks the kind for a plain host-language file from its extension.
    pub fn from_path(path: &Utf8Path) -> Self {
        let name = path.file_name().unwrap_or_default();
        if name.ends_with(".d.ts") {
            return Self::Ts;
        }
        match path.extension() {
            Some("ts" | "mts" | "cts") => Self::Ts,
            Some("tsx") => Self::Tsx,
            Some("jsx") => Self::Jsx,
            _ => Self::Js,
        }
    }

    /// The kind of a projected component.
    pub fn for_component(typescript: bool) -> Self {
        if typescript {
            Self::Tsx
        } else {
            Self::Jsx
        }
    }

    pub fn is_typescript(self) -> bool {
        matches!(self, Self::Ts | Self::Tsx)
    }
}

/// Returns true if `path` names a component file.
pub fn is_component_path(path: &Utf8Path) -> bool {
    path.extension() == Some("svelte")
}

/// Extracts a component name from a file path.
///
/// Given `/path/to/Counter.svelte`, returns `"Counter"`. The result is a valid
/// PascalCase identifier, falling back to `"Component"`.
pub fn component_name_from_path(path: &Utf8Path) -> String {
    sanitize_component_name(path.file_stem().unwrap_or_default())
}

/// - Drops leading non-alphabetic characters (the `+` in `+page`)
/// - Capitalizes after `-` and `.`
/// - Skips anything that cannot appear in an identifier
fn sanitize_component_name(name: &str) -> String {
    let name = name.trim_start_matches(|c: char| !c.is_alphabetic());

    let mut result = String::with_capacity(name.len());
    let mut capitalize_next = true;
    for c in name.chars() {
        if c.is_alphanumeric() || c == '_' {
            if capitalize_next {
                result.push(c.to_ascii_uppercase());
                capitalize_next = false;
            } else {
                result.push(c);
            }
        } else if c == '-' || c == '.' {
            capitalize_next = true;
        }
    }

    if result.is_empty() {
        "Component".to_string()
    } else {
        result
    }
}

/// Returns true if `name` is a plain JavaScript identifier.
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_kind_from_path() {
        assert_eq!(ScriptKind::from_path(Utf8Path::new("a/b.ts")), ScriptKind::Ts);
        assert_eq!(ScriptKind::from_path(Utf8Path::new("types.d.ts")), ScriptKind::Ts);
        assert_eq!(ScriptKind::from_path(Utf8Path::new("App.tsx")), ScriptKind::Tsx);
        assert_eq!(ScriptKind::from_path(Utf8Path::new("x.jsx")), ScriptKind::Jsx);
        assert_eq!(ScriptKind::from_path(Utf8Path::new("x.mjs")), ScriptKind::Js);
    }

    #[test]
    fn test_component_name_from_path() {
        assert_eq!(component_name_from_path(Utf8Path::new("Counter.svelte")), "Counter");
        assert_eq!(
            component_name_from_path(Utf8Path::new("/src/my-component.svelte")),
            "MyComponent"
        );
        assert_eq!(component_name_from_path(Utf8Path::new("+page.svelte")), "Page");
        assert_eq!(component_name_from_path(Utf8Path::new("+++.svelte")), "Component");
        assert_eq!(component_name_from_path(Utf8Path::new("")), "Component");
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("$store"));
        assert!(is_identifier("_value1"));
        assert!(!is_identifier("is-active"));
        assert!(!is_identifier("--color"));
        assert!(!is_identifier(""));
    }
}
