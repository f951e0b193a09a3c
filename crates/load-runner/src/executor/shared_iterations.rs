use crate::vu::ScenarioContext;
use domain::SharedIterations;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{error, info, warn};

/// `vus` 個の VU が共有カウンターから合計 `iterations` 回を取り合う
///
/// `max_duration` を過ぎると新しいイテレーションは始めず、実行中のものは
/// `graceful_stop` まで待ってから打ち切る。
pub async fn run(ctx: Arc<ScenarioContext>, plan: &SharedIterations, graceful_stop: Duration) {
    let next = Arc::new(AtomicU64::new(0));
    let deadline = Instant::now() + plan.max_duration;
    let hard_deadline = deadline + graceful_stop;

    info!(
        scenario = %ctx.name,
        vus = plan.vus,
        iterations = plan.iterations,
        "shared-iterations started"
    );

    let mut handles = Vec::with_capacity(plan.vus as usize);
    for index in 0..plan.vus {
        let ctx = ctx.clone();
        let next = next.clone();
        let total = plan.iterations;

        handles.push(tokio::spawn(async move {
            let vu = ctx.virtual_user(index + 1);
            ctx.metrics.vu_started();

            loop {
                if Instant::now() >= deadline {
                    break;
                }
                if next.fetch_add(1, Ordering::SeqCst) >= total {
                    break;
                }

                match timeout_at(hard_deadline, ctx.run_iteration(&vu)).await {
                    Ok(()) => ctx.metrics.iteration_completed(&ctx.name),
                    Err(_) => {
                        ctx.metrics.iteration_interrupted(&ctx.name);
                        break;
                    }
                }
            }

            ctx.metrics.vu_stopped();
        }));
    }

    for (index, handle) in handles.into_iter().enumerate() {
        if let Err(e) = handle.await {
            error!(scenario = %ctx.name, vu = index + 1, error = %e, "VU task panicked");
        }
    }

    let started = next.load(Ordering::SeqCst).min(plan.iterations);
    if started < plan.iterations {
        warn!(
            scenario = %ctx.name,
            started,
            iterations = plan.iterations,
            "maxDuration reached before all iterations started"
        );
    }
    info!(scenario = %ctx.name, "shared-iterations finished");
}
