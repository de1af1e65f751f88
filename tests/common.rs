//! Shared helpers for integration tests.
//!
//! `TestHost` runs a full `App` on an ephemeral port and exposes a small HTTP
//! client. `ProbeBackend` wraps the memory backend to count closes, fail pings
//! on demand, and slow down reads.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use order_api::app::{App, LifecycleError, LifecycleState};
use order_api::store::{
    Commit, KvBackend, KvStore, MemoryBackend, ScanPage, StoreError, StoreOp,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Memory backend with hooks for lifecycle tests.
#[derive(Clone, Default)]
pub struct ProbeBackend {
    inner: MemoryBackend,
    closes: Arc<AtomicUsize>,
    fail_ping: Arc<AtomicBool>,
    read_delay: Option<Duration>,
}

impl ProbeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend whose ping fails from the start.
    pub fn unreachable() -> Self {
        let backend = Self::default();
        backend.set_fail_ping(true);
        backend
    }

    /// Backend whose `get` sleeps for `delay` first.
    pub fn slow_reads(delay: Duration) -> Self {
        Self {
            read_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn set_fail_ping(&self, fail: bool) {
        self.fail_ping.store(fail, Ordering::SeqCst);
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KvBackend for ProbeBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.inner.set(key, value).await
    }

    async fn set_if_absent(&self, key: &str, value: Vec<u8>) -> Result<bool, StoreError> {
        self.inner.set_if_absent(key, value).await
    }

    async fn set_if_present(&self, key: &str, value: Vec<u8>) -> Result<bool, StoreError> {
        self.inner.set_if_present(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.inner.delete(key).await
    }

    async fn add_to_set(&self, set: &str, member: &str) -> Result<bool, StoreError> {
        self.inner.add_to_set(set, member).await
    }

    async fn remove_from_set(&self, set: &str, member: &str) -> Result<bool, StoreError> {
        self.inner.remove_from_set(set, member).await
    }

    async fn is_member(&self, set: &str, member: &str) -> Result<bool, StoreError> {
        self.inner.is_member(set, member).await
    }

    async fn scan_set(
        &self,
        set: &str,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> Result<ScanPage, StoreError> {
        self.inner.scan_set(set, cursor, pattern, count).await
    }

    async fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>, StoreError> {
        self.inner.multi_get(keys).await
    }

    async fn atomic(&self, ops: Vec<StoreOp>) -> Result<Commit, StoreError> {
        self.inner.atomic(ops).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        if self.fail_ping.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("ping refused".to_string()));
        }
        self.inner.ping().await
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.close().await
    }
}

/// Builder for [`TestHost`].
pub struct TestHostBuilder {
    store: KvStore,
    grace: Duration,
    page_size: Option<usize>,
}

impl TestHostBuilder {
    pub fn store(mut self, store: KvStore) -> Self {
        self.store = store;
        self
    }

    pub fn grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Start the app on `127.0.0.1:0` and wait until it is serving.
    pub async fn start(self) -> Result<TestHost> {
        let addr: SocketAddr = "127.0.0.1:0".parse()?;
        let mut app = App::new(self.store.clone(), addr).with_shutdown_grace(self.grace);
        if let Some(page_size) = self.page_size {
            app = app.with_page_size(page_size);
        }

        let mut states = app.subscribe();
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(app.start(shutdown.clone()));

        let state = *tokio::time::timeout(
            Duration::from_secs(5),
            states.wait_for(|s| matches!(s, LifecycleState::Serving(_) | LifecycleState::Stopped)),
        )
        .await
        .context("app did not start within 5s")?
        .context("lifecycle channel closed")?;

        let Some(addr) = state.serving_addr() else {
            bail!("app stopped during startup: {:?}", handle.await);
        };

        Ok(TestHost {
            addr,
            client: reqwest::Client::new(),
            shutdown,
            handle: Some(handle),
            states,
        })
    }
}

/// A running order service.
pub struct TestHost {
    pub addr: SocketAddr,
    client: reqwest::Client,
    shutdown: CancellationToken,
    handle: Option<JoinHandle<Result<(), LifecycleError>>>,
    pub states: watch::Receiver<LifecycleState>,
}

impl TestHost {
    pub fn builder() -> TestHostBuilder {
        TestHostBuilder {
            store: KvStore::memory(),
            grace: Duration::from_secs(5),
            page_size: None,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client.get(self.url(path)).send().await
    }

    pub async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> reqwest::Result<reqwest::Response> {
        self.client.post(self.url(path)).json(body).send().await
    }

    pub async fn put_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> reqwest::Result<reqwest::Response> {
        self.client.put(self.url(path)).json(body).send().await
    }

    pub async fn delete(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client.delete(self.url(path)).send().await
    }

    /// Request shutdown without waiting for it.
    pub fn cancel(&self) {
        self.shutdown.cancel();
    }

    /// Request shutdown and wait for the lifecycle result.
    pub async fn stop(mut self) -> Result<Result<(), LifecycleError>> {
        self.shutdown.cancel();
        let handle = self.handle.take().context("host already stopped")?;
        Ok(handle.await?)
    }
}

impl Drop for TestHost {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// An address nothing is listening on.
pub fn unused_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}
