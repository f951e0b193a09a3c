//! 実行全体のメトリクス集計
//!
//! チェック結果・HTTP リクエスト・イテレーション・VU 数を1か所に集める。
//! すべての VU タスクから複製して共有する。

use crate::errors::AppError;
use hdrhistogram::Histogram;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// 1回の HTTP リクエストの記録
#[derive(Debug, Clone)]
pub struct RequestSample<'a> {
    pub method: &'a str,
    /// 応答がなかった場合は `None`
    pub status: Option<u16>,
    pub duration: Duration,
    /// リクエスト自体が失敗した場合のエラーコード
    pub error_code: Option<&'a str>,
}

impl RequestSample<'_> {
    /// 応答なし、または 200〜399 以外のステータス
    pub fn is_failed(&self) -> bool {
        !matches!(self.status, Some(200..=399))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckTally {
    pub passes: u64,
    pub fails: u64,
}

impl CheckTally {
    pub fn total(&self) -> u64 {
        self.passes + self.fails
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.passes as f64 / self.total() as f64 * 100.0
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationTally {
    pub completed: u64,
    pub interrupted: u64,
}

/// レイテンシ統計（ミリ秒）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    pub count: u64,
    pub min: f64,
    pub mean: f64,
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
    pub max: f64,
}

/// ある時点の集計結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub elapsed_secs: f64,
    pub checks: BTreeMap<String, CheckTally>,
    pub http_reqs: u64,
    pub http_req_failed: u64,
    pub requests_by_method: BTreeMap<String, u64>,
    pub request_errors: BTreeMap<String, u64>,
    pub http_req_duration: LatencyStats,
    pub iterations: BTreeMap<String, IterationTally>,
    pub vus: u64,
    pub vus_max: u64,
}

impl MetricsSnapshot {
    pub fn total_checks(&self) -> CheckTally {
        self.checks
            .values()
            .fold(CheckTally::default(), |acc, t| CheckTally {
                passes: acc.passes + t.passes,
                fails: acc.fails + t.fails,
            })
    }

    pub fn total_iterations(&self) -> u64 {
        self.iterations.values().map(|t| t.completed).sum()
    }
}

/// 記録できるレイテンシの上限（1時間、マイクロ秒）。超えた値は上限に丸める。
const MAX_TRACKED_MICROS: u64 = 3_600_000_000;

struct MetricsState {
    checks: BTreeMap<String, CheckTally>,
    http_reqs: u64,
    http_req_failed: u64,
    requests_by_method: BTreeMap<String, u64>,
    request_errors: BTreeMap<String, u64>,
    // マイクロ秒で記録
    durations: Histogram<u64>,
    iterations: BTreeMap<String, IterationTally>,
    vus: u64,
    vus_max: u64,
}

#[derive(Clone)]
pub struct RunMetrics {
    state: Arc<Mutex<MetricsState>>,
    started_at: Instant,
}

impl RunMetrics {
    pub fn new() -> Result<Self, AppError> {
        let durations = Histogram::new_with_bounds(1, MAX_TRACKED_MICROS, 3)
            .map_err(|e| AppError::Internal(format!("failed to create histogram: {e}")))?;

        Ok(Self {
            state: Arc::new(Mutex::new(MetricsState {
                checks: BTreeMap::new(),
                http_reqs: 0,
                http_req_failed: 0,
                requests_by_method: BTreeMap::new(),
                request_errors: BTreeMap::new(),
                durations,
                iterations: BTreeMap::new(),
                vus: 0,
                vus_max: 0,
            })),
            started_at: Instant::now(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, MetricsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record_check(&self, name: &str, passed: bool) {
        let mut state = self.lock();
        let tally = state.checks.entry(name.to_string()).or_default();
        if passed {
            tally.passes += 1;
        } else {
            tally.fails += 1;
        }
    }

    pub fn record_request(&self, sample: &RequestSample<'_>) {
        let mut state = self.lock();
        state.http_reqs += 1;
        if sample.is_failed() {
            state.http_req_failed += 1;
        }
        *state
            .requests_by_method
            .entry(sample.method.to_string())
            .or_default() += 1;
        if let Some(code) = sample.error_code {
            *state.request_errors.entry(code.to_string()).or_default() += 1;
        }
        // 応答のないリクエストはレイテンシに含めない
        if sample.status.is_some() {
            let micros = u64::try_from(sample.duration.as_micros()).unwrap_or(u64::MAX);
            state.durations.saturating_record(micros);
        }
    }

    pub fn iteration_completed(&self, scenario: &str) {
        self.lock()
            .iterations
            .entry(scenario.to_string())
            .or_default()
            .completed += 1;
    }

    pub fn iteration_interrupted(&self, scenario: &str) {
        self.lock()
            .iterations
            .entry(scenario.to_string())
            .or_default()
            .interrupted += 1;
    }

    pub fn vu_started(&self) {
        let mut state = self.lock();
        state.vus += 1;
        state.vus_max = state.vus_max.max(state.vus);
    }

    pub fn vu_stopped(&self) {
        let mut state = self.lock();
        state.vus = state.vus.saturating_sub(1);
    }

    /// 計測開始からの経過時間
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let state = self.lock();
        let hist = &state.durations;
        let to_ms = |micros: u64| micros as f64 / 1000.0;

        let http_req_duration = if hist.len() == 0 {
            LatencyStats::default()
        } else {
            LatencyStats {
                count: hist.len(),
                min: to_ms(hist.min()),
                mean: hist.mean() / 1000.0,
                p50: to_ms(hist.value_at_quantile(0.50)),
                p90: to_ms(hist.value_at_quantile(0.90)),
                p95: to_ms(hist.value_at_quantile(0.95)),
                p99: to_ms(hist.value_at_quantile(0.99)),
                max: to_ms(hist.max()),
            }
        };

        MetricsSnapshot {
            elapsed_secs: self.elapsed().as_secs_f64(),
            checks: state.checks.clone(),
            http_reqs: state.http_reqs,
            http_req_failed: state.http_req_failed,
            requests_by_method: state.requests_by_method.clone(),
            request_errors: state.request_errors.clone(),
            http_req_duration,
            iterations: state.iterations.clone(),
            vus: state.vus,
            vus_max: state.vus_max,
        }
    }
}
