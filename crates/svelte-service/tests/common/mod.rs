//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use source_map::{ByteOffset, Span};
use svelte_projection::markup::MarkupDocument;
use svelte_projection::testing::scan;
use svelte_service::{
    CheckDiagnostic, CheckingEngine, CheckingSession, CompilerSettings, Completion, ConfigDiscovery,
    ConfigError, ConfigurationScope, FileSystem, FsDocumentFactory, MarkupParser,
    ResolutionOverlay, ScopeId, ServiceContainer, ServiceContext, Severity, SnapshotFactory,
    SymbolLocation,
};

/// Files held in memory.
#[derive(Default)]
pub struct MemoryFs {
    files: RwLock<FxHashMap<Utf8PathBuf, String>>,
}

impl MemoryFs {
    pub fn new(files: &[(&str, &str)]) -> Arc<Self> {
        let fs = Self::default();
        for (path, text) in files {
            fs.write(path, text);
        }
        Arc::new(fs)
    }

    pub fn write(&self, path: &str, text: &str) {
        self.files.write().insert(path.into(), text.to_string());
    }

    pub fn remove(&self, path: &str) {
        self.files.write().remove(Utf8Path::new(path));
    }
}

impl FileSystem for MemoryFs {
    fn file_exists(&self, path: &Utf8Path) -> bool {
        self.files.read().contains_key(path)
    }

    fn read_file(&self, path: &Utf8Path) -> Option<String> {
        self.files.read().get(path).cloned()
    }
}

/// Parses with the fixture scanner. Text containing `<<` is rejected.
pub struct ScanParser;

impl MarkupParser for ScanParser {
    fn parse(&self, _path: &Utf8Path, text: &str) -> Result<MarkupDocument, String> {
        if text.contains("<<") {
            return Err("unexpected `<`".to_string());
        }
        Ok(scan(text))
    }
}

/// Records every session it creates.
#[derive(Default)]
pub struct FakeEngine {
    sessions: Mutex<Vec<Arc<FakeSession>>>,
}

impl FakeEngine {
    pub fn created(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn session(&self, index: usize) -> Arc<FakeSession> {
        Arc::clone(&self.sessions.lock()[index])
    }
}

impl CheckingEngine for FakeEngine {
    fn create_session(
        &self,
        host: Arc<ResolutionOverlay>,
        settings: &CompilerSettings,
    ) -> Arc<dyn CheckingSession> {
        let session = Arc::new(FakeSession {
            host,
            settings: settings.clone(),
            disposed: AtomicBool::new(false),
            forgotten: Mutex::default(),
        });
        self.sessions.lock().push(Arc::clone(&session));
        session
    }
}

/// Reports every `oops` in a file as an error, plus one error on the
/// generated header.
pub struct FakeSession {
    pub host: Arc<ResolutionOverlay>,
    pub settings: CompilerSettings,
    disposed: AtomicBool,
    forgotten: Mutex<Vec<Utf8PathBuf>>,
}

impl FakeSession {
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    pub fn forgotten(&self) -> Vec<Utf8PathBuf> {
        self.forgotten.lock().clone()
    }
}

impl CheckingSession for FakeSession {
    fn diagnostics(&self, path: &Utf8Path) -> Vec<CheckDiagnostic> {
        let text = self.host.read_file(path).unwrap_or_default();
        let header = CheckDiagnostic {
            span: Span::new(0u32, 3u32),
            message: "generated".to_string(),
            code: Some(1),
            severity: Severity::Warning,
        };
        std::iter::once(header)
            .chain(text.match_indices("oops").map(|(start, word)| CheckDiagnostic {
                span: Span::from_usize(start, start + word.len()),
                message: "Cannot find name 'oops'.".to_string(),
                code: Some(2304),
                severity: Severity::Error,
            }))
            .collect()
    }

    fn completions(&self, _path: &Utf8Path, offset: ByteOffset) -> Vec<Completion> {
        vec![
            Completion {
                label: "here".to_string(),
                replace: Some(Span::empty(offset)),
            },
            Completion {
                label: "header".to_string(),
                replace: Some(Span::new(0u32, 3u32)),
            },
        ]
    }

    fn definition(&self, path: &Utf8Path, offset: ByteOffset) -> Vec<SymbolLocation> {
        vec![
            SymbolLocation {
                path: path.to_path_buf(),
                span: Span::new(offset, offset + ByteOffset::from(1)),
            },
            SymbolLocation {
                path: path.to_path_buf(),
                span: Span::new(0u32, 3u32),
            },
        ]
    }

    fn forget(&self, path: &Utf8Path) {
        self.forgotten.lock().push(path.to_path_buf());
    }

    fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
    }
}

/// Serves fixed scopes after a short delay.
#[derive(Default)]
pub struct FakeDiscovery {
    scopes: Vec<ConfigurationScope>,
    loads: AtomicUsize,
    fail: bool,
}

impl FakeDiscovery {
    pub fn new(scopes: Vec<ConfigurationScope>) -> Self {
        Self {
            scopes,
            ..Default::default()
        }
    }

    pub fn failing(scopes: Vec<ConfigurationScope>) -> Self {
        Self {
            scopes,
            fail: true,
            ..Default::default()
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigDiscovery for FakeDiscovery {
    fn find_config(&self, file: &Utf8Path, _workspace_roots: &[Utf8PathBuf]) -> ScopeId {
        self.scopes
            .iter()
            .filter(|scope| file.starts_with(&scope.root))
            .max_by_key(|scope| scope.root.as_str().len())
            .map(|scope| scope.id.clone())
            .unwrap_or_else(ScopeId::inferred)
    }

    async fn load(
        &self,
        id: &ScopeId,
        fallback_root: &Utf8Path,
    ) -> Result<ConfigurationScope, ConfigError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        if self.fail {
            return Err(ConfigError::Walk("disk on fire".to_string()));
        }
        Ok(self
            .scopes
            .iter()
            .find(|scope| &scope.id == id)
            .cloned()
            .unwrap_or_else(|| ConfigurationScope::fallback(id.clone(), fallback_root)))
    }
}

/// Routes service logs to the test output. Filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A configured scope rooted at `root` with default settings.
pub fn scope(root: &str, declared: &[&str]) -> ConfigurationScope {
    ConfigurationScope {
        id: ScopeId::config(format!("{root}/tsconfig.json")),
        root: root.into(),
        settings: CompilerSettings::inferred(),
        declared_files: declared.iter().map(Utf8PathBuf::from).collect(),
    }
}

pub fn context(
    fs: Arc<MemoryFs>,
    discovery: Arc<FakeDiscovery>,
    engine: Arc<FakeEngine>,
) -> ServiceContext {
    init_tracing();
    ServiceContext {
        parser: Arc::new(ScanParser),
        engine,
        documents: Arc::new(FsDocumentFactory::new(fs.clone())),
        discovery,
        fs,
    }
}

pub fn container(
    scope: ConfigurationScope,
    fs: Arc<MemoryFs>,
    engine: Arc<FakeEngine>,
) -> ServiceContainer {
    init_tracing();
    let factory = SnapshotFactory::new(
        Arc::new(ScanParser),
        Arc::new(FsDocumentFactory::new(fs.clone())),
    );
    ServiceContainer::new(scope, factory, fs, engine)
}
