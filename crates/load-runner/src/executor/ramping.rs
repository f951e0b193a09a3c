use crate::vu::ScenarioContext;
use domain::RampingVus;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, sleep, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

/// コントローラーから VU へ配信する状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Phase {
    target: u32,
    finished: bool,
}

/// ステージに沿って VU を起動・退役させる
///
/// VU `i`（0 始まり）は `i < target` の間だけイテレーションを開始する。
/// 退役した VU の実行中イテレーションは `graceful_ramp_down` 経過後に打ち切る。
pub async fn run(
    ctx: Arc<ScenarioContext>,
    plan: &RampingVus,
    graceful_stop: Duration,
    tick: Duration,
) {
    let total = plan.total_duration();
    let (tx, _) = watch::channel(Phase {
        target: plan.target_at(Duration::ZERO),
        finished: false,
    });

    info!(
        scenario = %ctx.name,
        peak_vus = plan.peak_vus(),
        duration_secs = total.as_secs_f64(),
        "ramping-vus started"
    );

    let started = Instant::now();
    let mut ticker = interval(tick.max(super::MIN_RAMP_TICK));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut handles = Vec::new();
    let mut last_target = None;

    loop {
        ticker.tick().await;
        let elapsed = started.elapsed();
        let target = plan.target_at(elapsed);

        // 目標が変わったときだけ VU を起こす
        tx.send_if_modified(|phase| {
            let changed = phase.target != target;
            phase.target = target;
            changed
        });

        // 一度起動した VU は退役しても待機し続けるので、不足分だけ追加する
        while (handles.len() as u32) < target {
            let index = handles.len() as u32;
            let vu_ctx = ctx.clone();
            let rx = tx.subscribe();
            let ramp_down = plan.graceful_ramp_down;
            handles.push(tokio::spawn(async move {
                run_vu(vu_ctx, index, rx, ramp_down, graceful_stop).await;
            }));
        }

        if last_target != Some(target) {
            debug!(scenario = %ctx.name, target, "target vus changed");
            last_target = Some(target);
        }

        if elapsed >= total {
            break;
        }
    }

    tx.send_replace(Phase {
        target: 0,
        finished: true,
    });

    for (index, handle) in handles.into_iter().enumerate() {
        if let Err(e) = handle.await {
            error!(scenario = %ctx.name, vu = index + 1, error = %e, "VU task panicked");
        }
    }

    info!(scenario = %ctx.name, "ramping-vus finished");
}

async fn run_vu(
    ctx: Arc<ScenarioContext>,
    index: u32,
    mut rx: watch::Receiver<Phase>,
    graceful_ramp_down: Duration,
    graceful_stop: Duration,
) {
    let vu = ctx.virtual_user(index + 1);
    ctx.metrics.vu_started();

    loop {
        // 自分の番が来るか、シナリオが終わるまで待機
        let finished = rx
            .wait_for(|p| p.finished || p.target > index)
            .await
            .map(|p| p.finished)
            .unwrap_or(true);
        if finished {
            break;
        }

        let retired = wait_until_retired(rx.clone(), index, graceful_ramp_down, graceful_stop);
        tokio::select! {
            _ = ctx.run_iteration(&vu) => ctx.metrics.iteration_completed(&ctx.name),
            _ = retired => {
                debug!(scenario = %ctx.name, vu = index + 1, "iteration interrupted");
                ctx.metrics.iteration_interrupted(&ctx.name);
            }
        }
    }

    ctx.metrics.vu_stopped();
}

/// 退役（またはシナリオ終了）後、猶予時間が過ぎたら完了する
async fn wait_until_retired(
    mut rx: watch::Receiver<Phase>,
    index: u32,
    graceful_ramp_down: Duration,
    graceful_stop: Duration,
) {
    let finished = rx
        .wait_for(|p| p.finished || p.target <= index)
        .await
        .map(|p| p.finished)
        .unwrap_or(true);

    sleep(if finished {
        graceful_stop
    } else {
        graceful_ramp_down
    })
    .await;
}
