//! Project configuration discovery.
//!
//! A project is identified by the `tsconfig.json` (or `jsconfig.json`) that
//! governs it. Files with no configuration above them share one inferred
//! project with default settings.

use std::fmt;

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use globset::{Glob, GlobSet, GlobSetBuilder};
use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::ConfigError;
use crate::fs::normalize_path;

const CONFIG_FILE_NAMES: [&str; 2] = ["tsconfig.json", "jsconfig.json"];

/// Identifies a project: the path of its configuration file, or none for
/// the inferred project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ScopeId(Option<Utf8PathBuf>);

impl ScopeId {
    pub fn config(path: impl Into<Utf8PathBuf>) -> Self {
        Self(Some(path.into()))
    }

    pub fn inferred() -> Self {
        Self(None)
    }

    pub fn config_path(&self) -> Option<&Utf8Path> {
        self.0.as_deref()
    }

    pub fn is_inferred(&self) -> bool {
        self.0.is_none()
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(path) => write!(f, "{path}"),
            None => f.write_str("<inferred project>"),
        }
    }
}

/// Compiler settings handed to the checking engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerSettings {
    pub target: Option<String>,
    pub module: Option<String>,
    pub strict: bool,
    pub allow_js: bool,
    pub check_js: bool,
    /// Absolute base directory for non-relative imports.
    pub base_url: Option<Utf8PathBuf>,
    /// Path aliases in declaration order, e.g. `$lib/*` -> `["src/lib/*"]`.
    pub paths: IndexMap<String, Vec<String>>,
}

impl CompilerSettings {
    /// Defaults for files outside any configured project.
    pub fn inferred() -> Self {
        Self {
            target: Some("ESNext".to_string()),
            module: Some("ESNext".to_string()),
            strict: false,
            allow_js: true,
            check_js: true,
            base_url: None,
            paths: IndexMap::new(),
        }
    }

    fn from_options(options: &CompilerOptions, root: &Utf8Path, is_jsconfig: bool) -> Self {
        Self {
            target: options.target.clone(),
            module: options.module.clone(),
            strict: options.strict,
            allow_js: options.allow_js.unwrap_or(is_jsconfig),
            check_js: options.check_js.unwrap_or(is_jsconfig),
            base_url: options
                .base_url
                .as_deref()
                .map(|base_url| normalize_path(&root.join(base_url))),
            paths: options.paths.clone(),
        }
    }
}

/// Everything a service container needs to know about its project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationScope {
    pub id: ScopeId,
    /// Directory that relative settings are resolved against.
    pub root: Utf8PathBuf,
    pub settings: CompilerSettings,
    /// Files the configuration declares as part of the project.
    pub declared_files: Vec<Utf8PathBuf>,
}

impl ConfigurationScope {
    /// A scope with default settings and no declared files.
    pub fn fallback(id: ScopeId, root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            id,
            root: root.into(),
            settings: CompilerSettings::inferred(),
            declared_files: Vec::new(),
        }
    }
}

/// Finds and loads project configurations.
#[async_trait]
pub trait ConfigDiscovery: Send + Sync {
    /// Returns the scope governing `file`. Never looks above the workspace
    /// root that contains `file`.
    fn find_config(&self, file: &Utf8Path, workspace_roots: &[Utf8PathBuf]) -> ScopeId;

    /// Loads a scope. `fallback_root` is the root used for the inferred project.
    async fn load(
        &self,
        id: &ScopeId,
        fallback_root: &Utf8Path,
    ) -> Result<ConfigurationScope, ConfigError>;
}

/// Discovers `tsconfig.json` and `jsconfig.json` files on disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsConfigDiscovery;

#[async_trait]
impl ConfigDiscovery for FsConfigDiscovery {
    fn find_config(&self, file: &Utf8Path, workspace_roots: &[Utf8PathBuf]) -> ScopeId {
        let boundary = workspace_roots
            .iter()
            .filter(|root| file.starts_with(root))
            .max_by_key(|root| root.as_str().len());

        for dir in file.ancestors().skip(1) {
            if dir.as_str().is_empty() {
                break;
            }
            for name in CONFIG_FILE_NAMES {
                let candidate = dir.join(name);
                if candidate.is_file() {
                    return ScopeId::config(candidate);
                }
            }
            if boundary.is_some_and(|root| root == dir) {
                break;
            }
        }
        ScopeId::inferred()
    }

    async fn load(
        &self,
        id: &ScopeId,
        fallback_root: &Utf8Path,
    ) -> Result<ConfigurationScope, ConfigError> {
        let Some(path) = id.config_path() else {
            return Ok(ConfigurationScope::fallback(id.clone(), fallback_root));
        };

        // TODO: follow `extends` chains; only the leaf configuration is read today.
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_owned(),
                source,
            })?;
        let config = TsConfig::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;

        let root = path
            .parent()
            .map(Utf8Path::to_path_buf)
            .unwrap_or_else(|| fallback_root.to_path_buf());
        let is_jsconfig = path.file_name() == Some("jsconfig.json");
        let settings = CompilerSettings::from_options(&config.compiler_options, &root, is_jsconfig);

        let declared_files = {
            let root = root.clone();
            let allow_js = settings.allow_js;
            tokio::task::spawn_blocking(move || config.declared_files(&root, allow_js))
                .await
                .map_err(|err| ConfigError::Walk(err.to_string()))??
        };

        debug!(
            config = %path,
            files = declared_files.len(),
            "loaded project configuration"
        );

        Ok(ConfigurationScope {
            id: id.clone(),
            root,
            settings,
            declared_files,
        })
    }
}

/// The parts of a `tsconfig.json` that matter here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TsConfig {
    #[serde(default)]
    compiler_options: CompilerOptions,

    files: Option<Vec<String>>,

    include: Option<Vec<String>>,

    #[serde(default)]
    exclude: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompilerOptions {
    target: Option<String>,

    module: Option<String>,

    #[serde(default)]
    strict: bool,

    allow_js: Option<bool>,

    check_js: Option<bool>,

    base_url: Option<String>,

    #[serde(default)]
    paths: IndexMap<String, Vec<String>>,
}

impl TsConfig {
    /// Parses JSON with comments and trailing commas.
    fn parse(content: &str) -> Result<Self, serde_json::Error> {
        let content = remove_trailing_commas(&remove_json_comments(content));
        serde_json::from_str(&content)
    }

    /// Lists the files matched by `files` and `include`, minus `exclude`.
    ///
    /// Without `files` or `include` everything under `root` is included.
    /// `node_modules` is never walked.
    fn declared_files(&self, root: &Utf8Path, allow_js: bool) -> Result<Vec<Utf8PathBuf>, ConfigError> {
        let mut declared = IndexSet::new();
        for file in self.files.iter().flatten() {
            declared.insert(normalize_path(&root.join(file)));
        }

        let include = match (&self.include, &self.files) {
            (Some(include), _) => include.clone(),
            (None, Some(_)) => Vec::new(),
            (None, None) => vec!["**/*".to_string()],
        };
        if include.is_empty() {
            return Ok(declared.into_iter().collect());
        }

        let include = build_glob_set(&include)?;
        let exclude = build_glob_set(&self.exclude)?;
        let entries = WalkDir::new(root)
            .into_iter()
            .filter_entry(|entry| entry.file_name() != "node_modules")
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file());
        for entry in entries {
            let Ok(path) = Utf8PathBuf::from_path_buf(entry.into_path()) else {
                continue;
            };
            if !is_source_file(&path, allow_js) {
                continue;
            }
            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            if include.is_match(relative) && !exclude.is_match(relative) {
                declared.insert(path);
            }
        }
        Ok(declared.into_iter().collect())
    }
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = glob_pattern(pattern);
        let glob = Glob::new(&pattern).map_err(|source| ConfigError::Glob {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| ConfigError::Glob {
        pattern: patterns.join(", "),
        source,
    })
}

/// Turns a tsconfig pattern into a glob. A bare directory name matches
/// everything below it.
fn glob_pattern(pattern: &str) -> String {
    let pattern = pattern.trim_start_matches("./").trim_end_matches('/');
    let last = pattern.rsplit('/').next().unwrap_or(pattern);
    if last.contains('*') || last.contains('.') {
        pattern.to_string()
    } else {
        format!("{pattern}/**/*")
    }
}

fn is_source_file(path: &Utf8Path, allow_js: bool) -> bool {
    match path.extension() {
        Some("svelte" | "ts" | "tsx" | "mts" | "cts") => true,
        Some("js" | "jsx" | "mjs" | "cjs") => allow_js,
        _ => false,
    }
}

/// Removes JavaScript-style comments from JSON.
fn remove_json_comments(json: &str) -> String {
    let mut result = String::with_capacity(json.len());
    let mut chars = json.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            result.push(c);
            if c == '"' {
                in_string = false;
            } else if c == '\\' {
                if let Some(next) = chars.next() {
                    result.push(next);
                }
            }
        } else if c == '"' {
            result.push(c);
            in_string = true;
        } else if c == '/' {
            match chars.peek() {
                Some('/') => {
                    while chars.peek().is_some_and(|next| *next != '\n') {
                        chars.next();
                    }
                }
                Some('*') => {
                    chars.next();
                    while let Some(next) = chars.next() {
                        if next == '*' && chars.peek() == Some(&'/') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => result.push(c),
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Drops commas directly before a closing `}` or `]`.
fn remove_trailing_commas(json: &str) -> String {
    let mut result = String::with_capacity(json.len());
    let mut chars = json.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            result.push(c);
            if c == '"' {
                in_string = false;
            } else if c == '\\' {
                if let Some(next) = chars.next() {
                    result.push(next);
                }
            }
        } else if c == '"' {
            result.push(c);
            in_string = true;
        } else if c == ',' {
            let mut ahead = chars.clone();
            while ahead.peek().is_some_and(|next| next.is_whitespace()) {
                ahead.next();
            }
            if !matches!(ahead.peek(), Some('}' | ']')) {
                result.push(c);
            }
        } else {
            result.push(c);
        }
    }

    result
}
