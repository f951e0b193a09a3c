//! シナリオ一式の並行実行

use crate::behaviors::{resolve_behavior, PlannerDelete, KNOWN_EXECS};
use crate::executor::{run_scenario, DEFAULT_RAMP_TICK, MIN_RAMP_TICK};
use crate::pacer::Pacer;
use crate::transport::HttpTransport;
use crate::vu::ScenarioContext;
use domain::{ScenarioOptions, TodoRoutes};
use shared::{AppError, MetricsSnapshot, RunMetrics};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info};

pub struct Runner {
    options: ScenarioOptions,
    transport: Arc<dyn HttpTransport>,
    pacer: Arc<dyn Pacer>,
    metrics: RunMetrics,
    routes: TodoRoutes,
    planner_delete: PlannerDelete,
    ramp_tick: Duration,
}

impl Runner {
    pub fn new(
        options: ScenarioOptions,
        transport: Arc<dyn HttpTransport>,
        pacer: Arc<dyn Pacer>,
        metrics: RunMetrics,
        routes: TodoRoutes,
    ) -> Self {
        Self {
            options,
            transport,
            pacer,
            metrics,
            routes,
            planner_delete: PlannerDelete::default(),
            ramp_tick: DEFAULT_RAMP_TICK,
        }
    }

    pub fn with_planner_delete(mut self, planner_delete: PlannerDelete) -> Self {
        self.planner_delete = planner_delete;
        self
    }

    /// ramping-vus の目標見直し間隔。`MIN_RAMP_TICK` 未満は切り上げる。
    pub fn with_ramp_tick(mut self, ramp_tick: Duration) -> Self {
        self.ramp_tick = ramp_tick.max(MIN_RAMP_TICK);
        self
    }

    /// すべてのシナリオを `startTime` に従って並行に実行し、終了後の集計を返す
    ///
    /// 定義の検証は VU を1つも起動する前に行う。
    pub async fn run(&self) -> Result<MetricsSnapshot, AppError> {
        self.options.validate(KNOWN_EXECS)?;

        let mut contexts = Vec::with_capacity(self.options.scenarios.len());
        for (name, scenario) in &self.options.scenarios {
            let behavior = resolve_behavior(&scenario.exec, self.planner_delete)?;
            let ctx = Arc::new(ScenarioContext {
                name: name.clone(),
                behavior,
                transport: self.transport.clone(),
                pacer: self.pacer.clone(),
                metrics: self.metrics.clone(),
                routes: self.routes.clone(),
            });
            contexts.push((ctx, scenario.clone()));
        }

        let mut handles = Vec::with_capacity(contexts.len());
        for (ctx, scenario) in contexts {
            let ramp_tick = self.ramp_tick;
            handles.push(tokio::spawn(async move {
                if !scenario.start_time.is_zero() {
                    sleep(scenario.start_time).await;
                }
                info!(
                    scenario = %ctx.name,
                    exec = ctx.behavior.exec_name(),
                    executor = scenario.executor.kind(),
                    max_vus = scenario.executor.max_vus(),
                    "scenario starting"
                );
                run_scenario(ctx, &scenario, ramp_tick).await;
            }));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "scenario task panicked");
            }
        }

        Ok(self.metrics.snapshot())
    }
}
