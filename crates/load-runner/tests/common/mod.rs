//! テスト用の共通部品
#![allow(dead_code)]

use async_trait::async_trait;
use domain::TodoRoutes;
use load_runner::{Behavior, HttpRequest, HttpResponse, HttpTransport, Method, Pacer, ScenarioContext};
use shared::{AppError, RunMetrics};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

pub const BASE: &str = "http://todos.test";

/// VU が外部に対して行った操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Request {
        method: Method,
        url: String,
        content_type: Option<String>,
        body: Option<String>,
    },
    Pause(Duration),
}

type Responder = dyn Fn(&HttpRequest) -> Result<HttpResponse, AppError> + Send + Sync;

/// リクエストと一時停止を順番どおりに記録する偽物
///
/// 一時停止は記録するだけで実際には待たない。
pub struct RecordingDriver {
    journal: Mutex<Vec<Event>>,
    responder: Box<Responder>,
}

impl RecordingDriver {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse, AppError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            journal: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        })
    }

    /// 絶対 URL には `status` と `body` で応答し、それ以外は reqwest と同じく不正 URL とする
    pub fn responding(status: u16, body: &str) -> Arc<Self> {
        let body = body.to_string();
        Self::new(move |request| {
            if request.url.starts_with("http://") || request.url.starts_with("https://") {
                Ok(HttpResponse {
                    status,
                    body: body.clone(),
                })
            } else {
                Err(AppError::InvalidUrl(request.url.clone()))
            }
        })
    }

    pub fn events(&self) -> Vec<Event> {
        self.journal.lock().unwrap().clone()
    }

    pub fn requests(&self) -> Vec<(Method, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Request { method, url, .. } => Some((method, url)),
                Event::Pause(_) => None,
            })
            .collect()
    }

    pub fn pauses(&self) -> Vec<Duration> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Pause(d) => Some(d),
                Event::Request { .. } => None,
            })
            .collect()
    }
}

#[async_trait]
impl HttpTransport for RecordingDriver {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, AppError> {
        self.journal.lock().unwrap().push(Event::Request {
            method: request.method,
            url: request.url.clone(),
            content_type: request.header("Content-Type").map(str::to_string),
            body: request.body.clone(),
        });
        (self.responder)(&request)
    }
}

#[async_trait]
impl Pacer for RecordingDriver {
    async fn pause(&self, duration: Duration) {
        self.journal.lock().unwrap().push(Event::Pause(duration));
    }
}

pub fn context(
    name: &str,
    driver: Arc<RecordingDriver>,
    behavior: Arc<dyn Behavior>,
    base: &str,
) -> ScenarioContext {
    ScenarioContext {
        name: name.to_string(),
        behavior,
        transport: driver.clone(),
        pacer: driver,
        metrics: RunMetrics::new().unwrap(),
        routes: TodoRoutes::new(base),
    }
}

/// 同時実行数を観測するだけのビヘイビア（tokio の時間で `work` だけ眠る）
pub struct GaugeBehavior {
    pub work: Duration,
    pub active: AtomicU32,
    pub max_active: AtomicU32,
    pub calls: AtomicU64,
    pub seen_vus: Mutex<Vec<u32>>,
    /// イテレーション開始時刻（`epoch` からの経過）と VU ID
    pub starts: Mutex<Vec<(Duration, u32)>>,
    epoch: Instant,
}

impl GaugeBehavior {
    pub fn new(work: Duration) -> Arc<Self> {
        Arc::new(Self {
            work,
            active: AtomicU32::new(0),
            max_active: AtomicU32::new(0),
            calls: AtomicU64::new(0),
            seen_vus: Mutex::new(Vec::new()),
            starts: Mutex::new(Vec::new()),
            epoch: Instant::now(),
        })
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> u32 {
        self.max_active.load(Ordering::SeqCst)
    }
}

/// イテレーションが打ち切られても active を戻すためのガード
struct ActiveGuard<'a>(&'a AtomicU32);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Behavior for GaugeBehavior {
    fn exec_name(&self) -> &'static str {
        "gauge"
    }

    async fn iteration(&self, vu: &load_runner::VirtualUser) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_vus.lock().unwrap().push(vu.id());
        self.starts
            .lock()
            .unwrap()
            .push((self.epoch.elapsed(), vu.id()));
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        let _guard = ActiveGuard(&self.active);

        tokio::time::sleep(self.work).await;
    }
}
