//! The host view the checking engine reads files through.
//!
//! Components are served as their projections, shims are served from memory,
//! and everything else falls through to the file system. Deleted paths stay
//! missing until a new snapshot is set for them.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use svelte_projection::{is_component_path, ScriptKind, Snapshot, SnapshotOrigin};
use tracing::{debug, trace, warn};

use crate::config::ConfigurationScope;
use crate::factory::SnapshotFactory;
use crate::fs::{normalize_path, FileSystem};
use crate::manager::SnapshotManager;
use crate::shims::{shim_paths, shim_text};

const TS_EXTENSIONS: [&str; 4] = [".ts", ".tsx", ".d.ts", ".svelte"];
const JS_EXTENSIONS: [&str; 2] = [".js", ".jsx"];

/// (specifier, directory of the importing file)
type ResolutionKey = (String, Utf8PathBuf);

#[derive(Debug, Default, Deserialize)]
struct PackageManifest {
    types: Option<String>,
    typings: Option<String>,
    svelte: Option<String>,
    main: Option<String>,
}

/// Serves one project's files to its checking session.
pub struct ResolutionOverlay {
    scope: ConfigurationScope,
    snapshots: SnapshotManager,
    factory: SnapshotFactory,
    fs: Arc<dyn FileSystem>,
    resolutions: Mutex<FxHashMap<ResolutionKey, Option<Utf8PathBuf>>>,
}

impl ResolutionOverlay {
    pub fn new(scope: ConfigurationScope, factory: SnapshotFactory, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            snapshots: SnapshotManager::new(scope.declared_files.iter().cloned()),
            scope,
            factory,
            fs,
            resolutions: Mutex::default(),
        }
    }

    pub fn scope(&self) -> &ConfigurationScope {
        &self.scope
    }

    pub fn snapshots(&self) -> &SnapshotManager {
        &self.snapshots
    }

    pub fn factory(&self) -> &SnapshotFactory {
        &self.factory
    }

    /// Returns the current snapshot for `path`, projecting a component from
    /// disk if none exists yet.
    pub fn snapshot(&self, path: &Utf8Path) -> Option<Arc<Snapshot>> {
        if let Some(snapshot) = self.snapshots.get(path) {
            return Some(snapshot);
        }
        if !is_component_path(path) || self.snapshots.is_deleted(path) {
            return None;
        }

        let document = self.factory.open(path)?;
        match self.factory.build(document, SnapshotOrigin::Disk) {
            Ok(snapshot) => self.snapshots.insert_if_absent(Arc::new(snapshot)),
            Err(err) => {
                warn!(path = %path, error = %err, "cannot project component");
                None
            }
        }
    }

    pub fn file_exists(&self, path: &Utf8Path) -> bool {
        if shim_text(path).is_some() {
            return true;
        }
        if self.snapshot(path).is_some() {
            return true;
        }
        !self.snapshots.is_deleted(path) && !is_component_path(path) && self.fs.file_exists(path)
    }

    /// Returns the text the engine should see: the projection for components,
    /// the file contents otherwise.
    pub fn read_file(&self, path: &Utf8Path) -> Option<String> {
        if let Some(text) = shim_text(path) {
            return Some(text.to_string());
        }
        if let Some(snapshot) = self.snapshot(path) {
            return Some(snapshot.projected_text().to_string());
        }
        if self.snapshots.is_deleted(path) || is_component_path(path) {
            return None;
        }
        self.fs.read_file(path)
    }

    pub fn script_kind(&self, path: &Utf8Path) -> ScriptKind {
        match self.snapshot(path) {
            Some(snapshot) => snapshot.script_kind(),
            None if is_component_path(path) => ScriptKind::for_component(false),
            None => ScriptKind::from_path(path),
        }
    }

    /// The version of the snapshot for `path`. Files read straight from disk
    /// have no version.
    pub fn script_version(&self, path: &Utf8Path) -> Option<i32> {
        self.snapshot(path).map(|snapshot| snapshot.version())
    }

    /// Shims, declared project files, then every other file seen so far.
    pub fn script_file_names(&self) -> Vec<Utf8PathBuf> {
        shim_paths().chain(self.snapshots.file_names()).collect()
    }

    /// Resolves an import specifier from `containing_file`. Results, including
    /// failures, are cached until invalidated.
    pub fn resolve_module(&self, specifier: &str, containing_file: &Utf8Path) -> Option<Utf8PathBuf> {
        let dir = containing_file
            .parent()
            .map(Utf8Path::to_path_buf)
            .unwrap_or_default();
        let key = (specifier.to_string(), dir);
        if let Some(cached) = self.resolutions.lock().get(&key) {
            return cached.clone();
        }

        let resolved = self.resolve_uncached(specifier, &key.1);
        trace!(specifier, from = %key.1, resolved = ?resolved, "resolved module");
        self.resolutions.lock().insert(key, resolved.clone());
        resolved
    }

    /// Drops cached resolutions that point at `path`.
    pub fn invalidate_path(&self, path: &Utf8Path) {
        let mut resolutions = self.resolutions.lock();
        let before = resolutions.len();
        resolutions.retain(|_, resolved| resolved.as_deref() != Some(path));
        debug!(%path, dropped = before - resolutions.len(), "invalidated resolutions");
    }

    /// Drops cached failures that `path` might now satisfy.
    pub fn invalidate_unresolved(&self, path: &Utf8Path) {
        let mut resolutions = self.resolutions.lock();
        let before = resolutions.len();
        resolutions
            .retain(|(specifier, _), resolved| resolved.is_some() || !may_resolve_to(specifier, path));
        debug!(%path, dropped = before - resolutions.len(), "invalidated failed resolutions");
    }

    fn resolve_uncached(&self, specifier: &str, dir: &Utf8Path) -> Option<Utf8PathBuf> {
        if is_relative(specifier) {
            return self.resolve_candidate(&normalize_path(&dir.join(specifier)));
        }
        if Utf8Path::new(specifier).is_absolute() {
            return self.resolve_candidate(&normalize_path(Utf8Path::new(specifier)));
        }
        if let Some(resolved) = self.resolve_alias(specifier) {
            return Some(resolved);
        }
        if let Some(base_url) = &self.scope.settings.base_url {
            if let Some(resolved) = self.resolve_candidate(&normalize_path(&base_url.join(specifier))) {
                return Some(resolved);
            }
        }
        self.resolve_package(specifier, dir)
    }

    /// Applies `paths` aliases, trying each target in order.
    fn resolve_alias(&self, specifier: &str) -> Option<Utf8PathBuf> {
        let settings = &self.scope.settings;
        let base = settings.base_url.as_deref().unwrap_or(&self.scope.root);
        for (pattern, targets) in &settings.paths {
            let Some(captured) = match_alias(pattern, specifier) else {
                continue;
            };
            for target in targets {
                let candidate = normalize_path(&base.join(target.replacen('*', captured, 1)));
                if let Some(resolved) = self.resolve_candidate(&candidate) {
                    return Some(resolved);
                }
            }
        }
        None
    }

    fn resolve_package(&self, specifier: &str, dir: &Utf8Path) -> Option<Utf8PathBuf> {
        let (package, subpath) = split_package(specifier)?;
        for ancestor in dir.ancestors() {
            let modules = ancestor.join("node_modules");
            let package_dirs = [
                modules.join(package),
                modules.join("@types").join(types_package_name(package)),
            ];
            for package_dir in package_dirs {
                let resolved = match subpath {
                    Some(subpath) => self.resolve_candidate(&package_dir.join(subpath)),
                    None => self.resolve_package_entry(&package_dir),
                };
                if resolved.is_some() {
                    return resolved;
                }
            }
        }
        None
    }

    fn resolve_package_entry(&self, package_dir: &Utf8Path) -> Option<Utf8PathBuf> {
        let manifest = self
            .fs
            .read_file(&package_dir.join("package.json"))
            .and_then(|text| serde_json::from_str::<PackageManifest>(&text).ok());
        if let Some(manifest) = manifest {
            let entries = [manifest.types, manifest.typings, manifest.svelte, manifest.main];
            for entry in entries.into_iter().flatten() {
                if let Some(resolved) = self.resolve_candidate(&normalize_path(&package_dir.join(entry))) {
                    return Some(resolved);
                }
            }
        }
        self.resolve_candidate(&package_dir.join("index"))
    }

    /// Tries `candidate` as a file, with each extension, with a script
    /// extension swapped for its typed counterpart, then as a directory index.
    fn resolve_candidate(&self, candidate: &Utf8Path) -> Option<Utf8PathBuf> {
        if candidate.extension().is_some() && self.file_exists(candidate) {
            return Some(candidate.to_path_buf());
        }

        let mut extensions = TS_EXTENSIONS.to_vec();
        if self.scope.settings.allow_js {
            extensions.extend(JS_EXTENSIONS);
        }

        let with_extension = |base: &str| {
            extensions
                .iter()
                .map(|ext| Utf8PathBuf::from(format!("{base}{ext}")))
                .find(|path| self.file_exists(path))
        };

        if let Some(stem) = [".js", ".jsx", ".mjs", ".cjs"]
            .iter()
            .find_map(|ext| candidate.as_str().strip_suffix(ext))
        {
            if let Some(resolved) = with_extension(stem) {
                return Some(resolved);
            }
        }
        with_extension(candidate.as_str())
            .or_else(|| with_extension(candidate.join("index").as_str()))
    }
}

fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// Matches `specifier` against a `paths` pattern with at most one `*`,
/// returning what the star captured.
fn match_alias<'a>(pattern: &str, specifier: &'a str) -> Option<&'a str> {
    match pattern.split_once('*') {
        Some((prefix, suffix)) => specifier.strip_prefix(prefix)?.strip_suffix(suffix),
        None => (pattern == specifier).then_some(""),
    }
}

/// Splits `@scope/name/sub/path` into the package name and the subpath.
fn split_package(specifier: &str) -> Option<(&str, Option<&str>)> {
    let name_end = if specifier.starts_with('@') {
        let scope_end = specifier.find('/')?;
        specifier[scope_end + 1..]
            .find('/')
            .map(|end| scope_end + 1 + end)
    } else {
        specifier.find('/')
    };
    let (package, subpath) = match name_end {
        Some(end) => (&specifier[..end], Some(&specifier[end + 1..])),
        None => (specifier, None),
    };
    (!package.is_empty()).then_some((package, subpath.filter(|s| !s.is_empty())))
}

/// `@scope/name` is published as `@types/scope__name`.
fn types_package_name(package: &str) -> String {
    match package.strip_prefix('@') {
        Some(scoped) => scoped.replacen('/', "__", 1),
        None => package.to_string(),
    }
}

/// The part of a file name before its first dot.
fn module_stem(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

/// Returns true if a specifier could name `path`. Errs on the side of yes.
fn may_resolve_to(specifier: &str, path: &Utf8Path) -> bool {
    let wanted = module_stem(specifier.rsplit('/').next().unwrap_or(specifier));
    if wanted.is_empty() {
        return true;
    }
    let stem = module_stem(path.file_name().unwrap_or_default());
    stem == wanted
        || (stem == "index"
            && path
                .parent()
                .and_then(Utf8Path::file_name)
                .is_some_and(|dir| dir == wanted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_match_alias() {
        assert_eq!(match_alias("$lib/*", "$lib/util"), Some("util"));
        assert_eq!(match_alias("$lib", "$lib"), Some(""));
        assert_eq!(match_alias("$lib/*", "$app/util"), None);
        assert_eq!(match_alias("*.svelte", "Button.svelte"), Some("Button"));
    }

    #[test]
    fn test_split_package() {
        assert_eq!(split_package("svelte"), Some(("svelte", None)));
        assert_eq!(split_package("svelte/store"), Some(("svelte", Some("store"))));
        assert_eq!(split_package("@sveltejs/kit"), Some(("@sveltejs/kit", None)));
        assert_eq!(
            split_package("@sveltejs/kit/vite"),
            Some(("@sveltejs/kit", Some("vite")))
        );
        assert_eq!(split_package(""), None);
    }

    #[test]
    fn test_types_package_name() {
        assert_eq!(types_package_name("@scope/pkg"), "scope__pkg");
        assert_eq!(types_package_name("node"), "node");
    }

    #[test]
    fn test_may_resolve_to() {
        assert!(may_resolve_to("./Button.svelte", Utf8Path::new("/app/Button.svelte")));
        assert!(may_resolve_to("./utils", Utf8Path::new("/app/utils/index.ts")));
        assert!(may_resolve_to("./types", Utf8Path::new("/app/types.d.ts")));
        assert!(!may_resolve_to("./Card.svelte", Utf8Path::new("/app/Button.svelte")));
    }
}
