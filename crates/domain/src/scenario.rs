//! シナリオ定義（k6 の `options.scenarios` と同じ形）
//!
//! ここは宣言だけを持つ。VU の起動・退役・イテレーション配分は
//! load-runner の executor が担当する。

use crate::duration::serde_str;
use crate::errors::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// ToDo 一覧を眺めて作業する学生
pub const STUDYING_STUDENT: &str = "studyingStudent";
/// ToDo を作ってはすぐ消す計画者
pub const INDECISIVE_PLANNER: &str = "indecisivePlanner";

fn default_graceful() -> Duration {
    Duration::from_secs(30)
}

fn default_start_vus() -> u32 {
    1
}

fn default_max_duration() -> Duration {
    Duration::from_secs(600)
}

/// シナリオ一式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOptions {
    pub scenarios: BTreeMap<String, Scenario>,
}

/// 1つのシナリオ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// 実行するビヘイビア名
    pub exec: String,
    #[serde(flatten)]
    pub executor: Executor,
    #[serde(default, with = "serde_str")]
    pub start_time: Duration,
    #[serde(default = "default_graceful", with = "serde_str")]
    pub graceful_stop: Duration,
}

/// スケジューリング方式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "executor", rename_all = "kebab-case")]
pub enum Executor {
    RampingVus(RampingVus),
    SharedIterations(SharedIterations),
}

/// 段階的に目標 VU 数へ近づける
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RampingVus {
    #[serde(rename = "startVUs", default = "default_start_vus")]
    pub start_vus: u32,
    pub stages: Vec<Stage>,
    #[serde(
        rename = "gracefulRampDown",
        default = "default_graceful",
        with = "serde_str"
    )]
    pub graceful_ramp_down: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    #[serde(with = "serde_str")]
    pub duration: Duration,
    pub target: u32,
}

impl Stage {
    pub fn new(duration: Duration, target: u32) -> Self {
        Self { duration, target }
    }
}

/// 固定数の VU が合計イテレーション数を分け合う
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedIterations {
    pub vus: u32,
    pub iterations: u64,
    #[serde(
        rename = "maxDuration",
        default = "default_max_duration",
        with = "serde_str"
    )]
    pub max_duration: Duration,
}

impl RampingVus {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self {
            start_vus: default_start_vus(),
            stages,
            graceful_ramp_down: default_graceful(),
        }
    }

    /// 全ステージの合計時間
    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.duration).sum()
    }

    /// 到達しうる最大 VU 数
    pub fn peak_vus(&self) -> u32 {
        self.stages
            .iter()
            .map(|s| s.target)
            .fold(self.start_vus, u32::max)
    }

    /// 経過時間における目標 VU 数
    ///
    /// 直前の目標値からステージの目標値へ線形補間する。端数は直前の値の側に切り捨てる。
    /// 最終ステージ以降は最後の目標値を返す。
    pub fn target_at(&self, elapsed: Duration) -> u32 {
        let mut from = self.start_vus;
        let mut stage_start = Duration::ZERO;

        for stage in &self.stages {
            let stage_end = stage_start + stage.duration;
            if elapsed < stage_end {
                let into = (elapsed - stage_start).as_millis() as i128;
                let span = stage.duration.as_millis() as i128;
                let delta = stage.target as i128 - from as i128;
                let value = from as i128 + delta * into / span;
                return value.clamp(0, u32::MAX as i128) as u32;
            }
            from = stage.target;
            stage_start = stage_end;
        }

        from
    }
}

impl SharedIterations {
    pub fn new(vus: u32, iterations: u64) -> Self {
        Self {
            vus,
            iterations,
            max_duration: default_max_duration(),
        }
    }
}

impl Executor {
    pub fn kind(&self) -> &'static str {
        match self {
            Executor::RampingVus(_) => "ramping-vus",
            Executor::SharedIterations(_) => "shared-iterations",
        }
    }

    pub fn max_vus(&self) -> u32 {
        match self {
            Executor::RampingVus(ramping) => ramping.peak_vus(),
            Executor::SharedIterations(shared) => shared.vus,
        }
    }
}

impl Scenario {
    pub fn new(exec: &str, executor: Executor) -> Self {
        Self {
            exec: exec.to_string(),
            executor,
            start_time: Duration::ZERO,
            graceful_stop: default_graceful(),
        }
    }

    /// パラメータの整合性を検証
    pub fn validate(&self, name: &str, known_execs: &[&str]) -> Result<(), DomainError> {
        if !known_execs.contains(&self.exec.as_str()) {
            return Err(DomainError::UnknownExec(self.exec.clone()));
        }

        match &self.executor {
            Executor::RampingVus(ramping) => {
                if ramping.stages.is_empty() {
                    return Err(DomainError::invalid_scenario(name, "stages must not be empty"));
                }
                if ramping.total_duration().is_zero() {
                    return Err(DomainError::invalid_scenario(
                        name,
                        "total stage duration must be greater than zero",
                    ));
                }
            }
            Executor::SharedIterations(shared) => {
                if shared.vus == 0 {
                    return Err(DomainError::invalid_scenario(
                        name,
                        "vus must be greater than zero",
                    ));
                }
                if shared.iterations < u64::from(shared.vus) {
                    return Err(DomainError::invalid_scenario(
                        name,
                        format!(
                            "iterations ({}) must be at least vus ({})",
                            shared.iterations, shared.vus
                        ),
                    ));
                }
                if shared.max_duration.is_zero() {
                    return Err(DomainError::invalid_scenario(
                        name,
                        "maxDuration must be greater than zero",
                    ));
                }
            }
        }

        Ok(())
    }
}

impl ScenarioOptions {
    /// 学生と計画者の2シナリオ
    pub fn todo_scenarios() -> Self {
        let mut scenarios = BTreeMap::new();

        scenarios.insert(
            "studier".to_string(),
            Scenario::new(
                STUDYING_STUDENT,
                Executor::RampingVus(RampingVus::new(vec![
                    Stage::new(Duration::from_secs(60), 1500),
                    Stage::new(Duration::from_secs(180), 7500),
                    Stage::new(Duration::from_secs(120), 0),
                ])),
            ),
        );

        scenarios.insert(
            "planner".to_string(),
            Scenario::new(
                INDECISIVE_PLANNER,
                Executor::SharedIterations(SharedIterations::new(20, 400)),
            ),
        );

        Self { scenarios }
    }

    pub fn from_json(json: &str) -> Result<Self, DomainError> {
        serde_json::from_str(json).map_err(|e| DomainError::Validation(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String, DomainError> {
        serde_json::to_string_pretty(self).map_err(|e| DomainError::Validation(e.to_string()))
    }

    pub fn validate(&self, known_execs: &[&str]) -> Result<(), DomainError> {
        if self.scenarios.is_empty() {
            return Err(DomainError::Validation("no scenarios defined".to_string()));
        }
        for (name, scenario) in &self.scenarios {
            scenario.validate(name, known_execs)?;
        }
        Ok(())
    }

    /// 名前で絞り込んだシナリオ一式を返す。空の指定なら全体。
    pub fn select(&self, names: &[String]) -> Result<Self, DomainError> {
        if names.is_empty() {
            return Ok(self.clone());
        }

        let mut scenarios = BTreeMap::new();
        for name in names {
            let scenario = self
                .scenarios
                .get(name)
                .ok_or_else(|| DomainError::UnknownScenario(name.clone()))?;
            scenarios.insert(name.clone(), scenario.clone());
        }
        Ok(Self { scenarios })
    }
}
