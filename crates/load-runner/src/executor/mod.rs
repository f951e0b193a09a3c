//! VU のスケジューリング
//!
//! - `ramping-vus`: ステージに沿って VU 数を増減
//! - `shared-iterations`: 固定数の VU が合計イテレーション数を分け合う

pub mod ramping;
pub mod shared_iterations;

use crate::vu::ScenarioContext;
use domain::{Executor, Scenario};
use std::sync::Arc;
use std::time::Duration;

/// ramping-vus が目標 VU 数を見直す間隔
pub const DEFAULT_RAMP_TICK: Duration = Duration::from_millis(100);

/// 見直し間隔の下限
pub const MIN_RAMP_TICK: Duration = Duration::from_millis(1);

/// シナリオの executor を最後まで実行する
pub async fn run_scenario(ctx: Arc<ScenarioContext>, scenario: &Scenario, ramp_tick: Duration) {
    match &scenario.executor {
        Executor::RampingVus(plan) => {
            ramping::run(ctx, plan, scenario.graceful_stop, ramp_tick).await;
        }
        Executor::SharedIterations(plan) => {
            shared_iterations::run(ctx, plan, scenario.graceful_stop).await;
        }
    }
}
