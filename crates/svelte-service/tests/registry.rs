//! Routing files to project containers.

mod common;

use std::sync::Arc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use common::{context, scope, FakeDiscovery, FakeEngine, MemoryFs};
use pretty_assertions::assert_eq;
use svelte_service::{
    CompilerSettings, ContainerState, Document, FileChangeKind, ScopeId, ScopeState, ServiceError,
    ServiceRegistry,
};

const APP: &str = "/work/app/src/App.svelte";
const WIDGET: &str = "/work/app/src/Widget.svelte";
const LIB: &str = "/work/lib/index.ts";

struct Fixture {
    registry: ServiceRegistry,
    discovery: Arc<FakeDiscovery>,
    engine: Arc<FakeEngine>,
    fs: Arc<MemoryFs>,
}

fn fixture(discovery: FakeDiscovery) -> Fixture {
    let fs = MemoryFs::new(&[
        (APP, "<script>let n = 1;</script>\n<p>{n}</p>"),
        (WIDGET, "<div />"),
        (LIB, "export const lib = 1;"),
    ]);
    let discovery = Arc::new(discovery);
    let engine = Arc::new(FakeEngine::default());
    let registry = ServiceRegistry::new(
        context(Arc::clone(&fs), Arc::clone(&discovery), Arc::clone(&engine)),
        vec![Utf8PathBuf::from("/work")],
    );
    Fixture {
        registry,
        discovery,
        engine,
        fs,
    }
}

fn two_projects() -> FakeDiscovery {
    FakeDiscovery::new(vec![scope("/work/app", &[APP]), scope("/work/lib", &[LIB])])
}

#[tokio::test]
async fn test_concurrent_requests_create_one_container() {
    let Fixture {
        registry,
        discovery,
        engine,
        ..
    } = fixture(two_projects());

    let (first, second) = tokio::join!(
        registry.service_for(Utf8Path::new(APP)),
        registry.service_for(Utf8Path::new(WIDGET)),
    );

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(discovery.loads(), 1);
    assert_eq!(engine.created(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_tasks_create_one_container() {
    let Fixture {
        registry, engine, ..
    } = fixture(two_projects());
    let registry = Arc::new(registry);

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.service_for(Utf8Path::new(APP)).await })
        })
        .collect();
    let mut containers = Vec::new();
    for task in tasks {
        containers.push(task.await.unwrap());
    }

    assert!(containers.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    assert_eq!(engine.created(), 1);
}

#[tokio::test]
async fn test_files_route_to_their_project() {
    let Fixture { registry, .. } = fixture(two_projects());

    let app = registry.service_for(Utf8Path::new(APP)).await;
    let lib = registry.service_for(Utf8Path::new(LIB)).await;
    let loose = registry.service_for(Utf8Path::new("/work/scratch.ts")).await;

    assert!(!Arc::ptr_eq(&app, &lib));
    assert_eq!(app.scope().id, ScopeId::config("/work/app/tsconfig.json"));
    assert_eq!(lib.scope().declared_files, vec![Utf8PathBuf::from(LIB)]);
    assert!(loose.scope().id.is_inferred());
    assert_eq!(loose.scope().root, Utf8PathBuf::from("/work"));
    assert_eq!(registry.containers().len(), 3);
}

#[tokio::test]
async fn test_failed_configuration_falls_back_to_defaults() {
    let Fixture { registry, .. } = fixture(FakeDiscovery::failing(vec![scope("/work/app", &[APP])]));

    let container = registry.service_for(Utf8Path::new(APP)).await;
    assert_eq!(container.scope().id, ScopeId::config("/work/app/tsconfig.json"));
    assert_eq!(container.scope().settings, CompilerSettings::inferred());
    assert!(container.scope().declared_files.is_empty());
    assert_eq!(container.state(), ContainerState::Ready);
}

#[tokio::test]
async fn test_update_and_delete_route_to_the_owning_container() {
    let Fixture {
        registry, engine, ..
    } = fixture(two_projects());

    let snapshot = registry
        .update_snapshot(Document::new(APP, "<p>{x}</p>", 2))
        .await
        .unwrap();
    assert_eq!(snapshot.version(), 2);

    let session = registry.get_service(Utf8Path::new(WIDGET)).await;
    assert!(Arc::ptr_eq(
        &session,
        &registry.service_for(Utf8Path::new(APP)).await.session()
    ));

    assert!(registry.delete_snapshot(Utf8Path::new(APP)));
    assert!(engine.session(0).forgotten().contains(&Utf8PathBuf::from(APP)));

    // No container exists for the library yet, and deleting does not create one.
    assert!(!registry.delete_snapshot(Utf8Path::new(LIB)));
    assert_eq!(
        registry.state(&ScopeId::config("/work/lib/tsconfig.json")),
        ScopeState::Uninitialized
    );
}

#[tokio::test]
async fn test_file_events_reach_live_containers() {
    let Fixture { registry, fs, .. } = fixture(two_projects());
    let container = registry.service_for(Utf8Path::new(APP)).await;
    let card = Utf8Path::new("/work/app/src/Card.svelte");

    assert_eq!(container.overlay().resolve_module("./Card.svelte", Utf8Path::new(APP)), None);
    fs.write(card.as_str(), "<div />");
    registry.file_changed(card, FileChangeKind::Created);
    assert_eq!(
        container.overlay().resolve_module("./Card.svelte", Utf8Path::new(APP)),
        Some(card.to_path_buf())
    );
}

#[tokio::test]
async fn test_dispose_all() {
    let Fixture {
        registry, engine, ..
    } = fixture(two_projects());
    let id = ScopeId::config("/work/app/tsconfig.json");
    assert_eq!(registry.state(&id), ScopeState::Uninitialized);

    let container = registry.service_for(Utf8Path::new(APP)).await;
    assert_eq!(registry.state(&id), ScopeState::Ready);

    registry.dispose_all();
    assert_eq!(container.state(), ContainerState::Disposed);
    assert!(engine.session(0).is_disposed());
    assert_eq!(registry.state(&id), ScopeState::Uninitialized);
    assert!(matches!(
        container.update_snapshot(svelte_service::SnapshotInput::Path(APP.into())),
        Err(ServiceError::Disposed(_))
    ));

    let fresh = registry.service_for(Utf8Path::new(APP)).await;
    assert!(!Arc::ptr_eq(&container, &fresh));
    assert_eq!(engine.created(), 2);
}

#[tokio::test]
async fn test_dispose_all_during_initialization() {
    let Fixture {
        registry, engine, ..
    } = fixture(two_projects());
    let id = ScopeId::config("/work/app/tsconfig.json");

    let (container, ()) = tokio::join!(registry.service_for(Utf8Path::new(APP)), async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(registry.state(&id), ScopeState::Initializing);
        registry.dispose_all();
        assert_eq!(registry.state(&id), ScopeState::Uninitialized);
    });

    // The container created for the torn-down scope is disposed, and the
    // caller gets the one created afterwards.
    assert_eq!(engine.created(), 2);
    assert!(engine.session(0).is_disposed());
    assert!(!engine.session(1).is_disposed());
    assert_eq!(container.state(), ContainerState::Ready);
    assert_eq!(registry.state(&id), ScopeState::Ready);
    assert!(Arc::ptr_eq(
        &container,
        &registry.service_for(Utf8Path::new(APP)).await
    ));
}
