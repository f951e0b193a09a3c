//! 仮想ユーザー（VU）の実行コンテキスト

use crate::behaviors::Behavior;
use crate::pacer::Pacer;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
use domain::TodoRoutes;
use shared::{AppError, RequestSample, RunMetrics};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// ステータスが 200 かどうかのチェック名
pub const IS_STATUS_200: &str = "is status 200";

/// 1シナリオ分の共有部品。VU はここから生成する。
#[derive(Clone)]
pub struct ScenarioContext {
    pub name: String,
    pub behavior: Arc<dyn Behavior>,
    pub transport: Arc<dyn HttpTransport>,
    pub pacer: Arc<dyn Pacer>,
    pub metrics: RunMetrics,
    pub routes: TodoRoutes,
}

impl ScenarioContext {
    pub fn virtual_user(&self, id: u32) -> VirtualUser {
        VirtualUser {
            scenario: self.name.clone(),
            id,
            transport: self.transport.clone(),
            pacer: self.pacer.clone(),
            metrics: self.metrics.clone(),
            routes: self.routes.clone(),
        }
    }

    /// VU の1イテレーションを実行
    pub async fn run_iteration(&self, vu: &VirtualUser) {
        self.behavior.iteration(vu).await;
    }
}

/// 1人の仮想ユーザー
///
/// リクエスト・チェック・一時停止はすべてここを経由し、メトリクスに記録される。
pub struct VirtualUser {
    scenario: String,
    id: u32,
    transport: Arc<dyn HttpTransport>,
    pacer: Arc<dyn Pacer>,
    metrics: RunMetrics,
    routes: TodoRoutes,
}

impl VirtualUser {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn routes(&self) -> &TodoRoutes {
        &self.routes
    }

    /// リクエストを送信して結果を記録する。失敗してもイテレーションは続く。
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse, AppError> {
        let method = request.method;
        let url = request.url.clone();
        let started = Instant::now();

        let result = self.transport.send(request).await;

        let duration = started.elapsed();
        let (status, error_code) = match &result {
            Ok(response) => (Some(response.status), None),
            Err(e) => (None, Some(e.code())),
        };
        self.metrics.record_request(&RequestSample {
            method: method.as_str(),
            status,
            duration,
            error_code,
        });

        if let Err(e) = &result {
            debug!(
                scenario = %self.scenario,
                vu = self.id,
                method = method.as_str(),
                url = %url,
                error = %e,
                "request failed"
            );
        }

        result
    }

    /// 名前付きチェックを評価して記録する。結果は返すだけで処理は止めない。
    pub fn check<F>(
        &self,
        name: &str,
        outcome: &Result<HttpResponse, AppError>,
        predicate: F,
    ) -> bool
    where
        F: Fn(&HttpResponse) -> bool,
    {
        let passed = outcome.as_ref().map(predicate).unwrap_or(false);
        self.metrics.record_check(name, passed);

        if !passed {
            debug!(
                scenario = %self.scenario,
                vu = self.id,
                check = name,
                status = ?outcome.as_ref().ok().map(|r| r.status),
                "check failed"
            );
        }

        passed
    }

    /// `is status 200`
    pub fn check_status_200(&self, outcome: &Result<HttpResponse, AppError>) -> bool {
        self.check(IS_STATUS_200, outcome, |r| r.status == 200)
    }

    pub async fn pause(&self, duration: Duration) {
        self.pacer.pause(duration).await;
    }
}
