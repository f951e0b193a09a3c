//! 実行中の進捗ログと終了時のサマリー

use shared::{MetricsSnapshot, RunMetrics};
use std::fmt::Write;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

/// 一定間隔で進捗を info ログに出す。実行終了時に `abort` すること。
pub fn spawn_progress_logger(metrics: RunMetrics, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // 最初の tick は即時なので読み飛ばす
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let snapshot = metrics.snapshot();
            let checks = snapshot.total_checks();
            info!(
                elapsed_secs = snapshot.elapsed_secs.round() as u64,
                vus = snapshot.vus,
                http_reqs = snapshot.http_reqs,
                http_req_failed = snapshot.http_req_failed,
                iterations = snapshot.total_iterations(),
                checks_passed = checks.passes,
                checks_failed = checks.fails,
                "progress"
            );
        }
    })
}

fn dotted(label: &str) -> String {
    format!("{label:.<32}:")
}

fn rate(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// 終了時サマリーを文字列に整形
pub fn render_summary(snapshot: &MetricsSnapshot) -> String {
    let mut out = String::new();

    let _ = writeln!(out);
    let _ = writeln!(out, "     running ({:.1}s)", snapshot.elapsed_secs);
    let _ = writeln!(out);

    for (name, tally) in &snapshot.checks {
        let mark = if tally.fails == 0 { '✓' } else { '✗' };
        let _ = writeln!(
            out,
            "     {mark} {name}  ({:.2}% ✓ {} ✗ {})",
            tally.pass_rate(),
            tally.passes,
            tally.fails
        );
    }
    if !snapshot.checks.is_empty() {
        let _ = writeln!(out);
    }

    let checks = snapshot.total_checks();
    let _ = writeln!(
        out,
        "     {} {:.2}% ✓ {} ✗ {}",
        dotted("checks"),
        checks.pass_rate(),
        checks.passes,
        checks.fails
    );

    let latency = &snapshot.http_req_duration;
    let _ = writeln!(
        out,
        "     {} avg={:.2}ms min={:.2}ms med={:.2}ms max={:.2}ms p(90)={:.2}ms p(95)={:.2}ms p(99)={:.2}ms",
        dotted("http_req_duration"),
        latency.mean,
        latency.min,
        latency.p50,
        latency.max,
        latency.p90,
        latency.p95,
        latency.p99
    );
    let _ = writeln!(
        out,
        "     {} {:.2}% ✓ {} ✗ {}",
        dotted("http_req_failed"),
        rate(snapshot.http_req_failed, snapshot.http_reqs),
        snapshot.http_req_failed,
        snapshot.http_reqs.saturating_sub(snapshot.http_req_failed)
    );
    let _ = writeln!(out, "     {} {}", dotted("http_reqs"), snapshot.http_reqs);
    for (method, count) in &snapshot.requests_by_method {
        let _ = writeln!(out, "     {} {}", dotted(&format!("  {method}")), count);
    }
    for (code, count) in &snapshot.request_errors {
        let _ = writeln!(out, "     {} {}", dotted(&format!("request_errors{{{code}}}")), count);
    }

    let _ = writeln!(out, "     {} {}", dotted("iterations"), snapshot.total_iterations());
    for (scenario, tally) in &snapshot.iterations {
        let _ = writeln!(
            out,
            "     {} {} complete, {} interrupted",
            dotted(&format!("  {scenario}")),
            tally.completed,
            tally.interrupted
        );
    }
    let _ = writeln!(out, "     {} {}", dotted("vus_max"), snapshot.vus_max);

    out
}

/// 終了時サマリーを標準出力へ
pub fn print_summary(snapshot: &MetricsSnapshot) {
    print!("{}", render_summary(snapshot));
}
