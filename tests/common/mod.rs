//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use visit_counter::backend::{
    BackendHandle, BackendSlot, CounterCache, MemoryCache, MemoryVisitLog, VisitLog,
};
use visit_counter::config::AppConfig;
use visit_counter::http::HttpServer;
use visit_counter::lifecycle::startup::{CACHE_NAME, DATABASE_NAME};
use visit_counter::lifecycle::{AppContext, Shutdown};
use visit_counter::node::NodeIdentity;

/// Which in-memory backends a test server gets.
#[derive(Clone, Copy)]
pub struct Backends {
    pub cache: bool,
    pub store: bool,
}

impl Backends {
    pub const BOTH: Backends = Backends { cache: true, store: true };
    pub const NONE: Backends = Backends { cache: false, store: false };
}

/// A running server plus handles on its in-memory backends.
#[allow(dead_code)]
pub struct TestApp {
    pub addr: SocketAddr,
    pub cache: MemoryCache,
    pub store: MemoryVisitLog,
    pub shutdown: Shutdown,
    pub task: JoinHandle<Result<(), std::io::Error>>,
}

#[allow(dead_code)]
impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = self.task.await;
    }
}

/// Start the real server on an ephemeral port with in-memory backends.
pub async fn spawn_app(hostname: &str, backends: Backends) -> TestApp {
    let cache = MemoryCache::new();
    let store = MemoryVisitLog::new();

    let cache_slot = if backends.cache {
        let backend: Arc<dyn CounterCache> = Arc::new(cache.clone());
        BackendSlot::Ready(Arc::new(BackendHandle::establish(CACHE_NAME, backend).await))
    } else {
        BackendSlot::NotConfigured
    };
    let store_slot = if backends.store {
        let backend: Arc<dyn VisitLog> = Arc::new(store.clone());
        BackendSlot::Ready(Arc::new(BackendHandle::establish(DATABASE_NAME, backend).await))
    } else {
        BackendSlot::NotConfigured
    };

    let mut config = AppConfig::default();
    config.counter.key = "visits".to_string();
    config.health.refresh_enabled = false;

    let context = AppContext::assemble(config, NodeIdentity::new(hostname), cache_slot, store_slot);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(context);
    let task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestApp { addr, cache, store, shutdown, task }
}
