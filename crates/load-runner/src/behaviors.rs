//! VU が繰り返し実行するビヘイビア
//!
//! どちらも1回の呼び出しで完結し、失敗しても途中で打ち切らない。

use crate::pacer::random_think_time;
use crate::transport::{HttpRequest, HttpResponse};
use crate::vu::VirtualUser;
use async_trait::async_trait;
use domain::{
    created_todo_id, DomainError, NewTodo, TodoRoutes, INDECISIVE_PLANNER, STUDYING_STUDENT,
    UNINTERPOLATED_DELETE_TARGET,
};
use shared::AppError;
use std::sync::Arc;
use std::time::Duration;

/// 実行可能なビヘイビア名
pub const KNOWN_EXECS: &[&str] = &[STUDYING_STUDENT, INDECISIVE_PLANNER];

#[async_trait]
pub trait Behavior: Send + Sync {
    fn exec_name(&self) -> &'static str;

    async fn iteration(&self, vu: &VirtualUser);
}

/// ToDo 一覧を確認し、次の作業に 100〜140 秒取り組む学生
#[derive(Debug, Clone, Copy)]
pub struct StudyingStudent {
    pub min_think_secs: u64,
    pub max_think_secs: u64,
}

impl Default for StudyingStudent {
    fn default() -> Self {
        Self {
            min_think_secs: 100,
            max_think_secs: 140,
        }
    }
}

#[async_trait]
impl Behavior for StudyingStudent {
    fn exec_name(&self) -> &'static str {
        STUDYING_STUDENT
    }

    async fn iteration(&self, vu: &VirtualUser) {
        let outcome = vu.send(HttpRequest::get(vu.routes().collection())).await;
        vu.check_status_200(&outcome);

        let think = random_think_time(
            &mut rand::thread_rng(),
            self.min_think_secs,
            self.max_think_secs,
        );
        vu.pause(think).await;
    }
}

/// 計画者の DELETE 先の決め方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum PlannerDelete {
    /// 補間されない `${url}/${wrongId}` をそのまま送る
    #[default]
    Literal,
    /// 作成レスポンスの `id` から `{ENDPOINT}/api/v1/todos/{id}` を組み立てる
    CreatedId,
}

impl PlannerDelete {
    /// DELETE 先の URL。`None` のときは DELETE を送らない。
    pub fn target(
        &self,
        routes: &TodoRoutes,
        created: &Result<HttpResponse, AppError>,
    ) -> Option<String> {
        match self {
            PlannerDelete::Literal => Some(UNINTERPOLATED_DELETE_TARGET.to_string()),
            PlannerDelete::CreatedId => created
                .as_ref()
                .ok()
                .and_then(|response| created_todo_id(&response.body))
                .map(|id| routes.item(&id)),
        }
    }
}

/// ToDo を作っては消す、迷える計画者
#[derive(Debug, Clone, Copy)]
pub struct IndecisivePlanner {
    pub delete: PlannerDelete,
    pub think_time: Duration,
}

impl IndecisivePlanner {
    pub fn new(delete: PlannerDelete) -> Self {
        Self {
            delete,
            think_time: Duration::from_secs(10),
        }
    }
}

impl Default for IndecisivePlanner {
    fn default() -> Self {
        Self::new(PlannerDelete::default())
    }
}

#[async_trait]
impl Behavior for IndecisivePlanner {
    fn exec_name(&self) -> &'static str {
        INDECISIVE_PLANNER
    }

    async fn iteration(&self, vu: &VirtualUser) {
        let payload = NewTodo::indecisive_plan()
            .map_err(AppError::from)
            .and_then(|todo| todo.to_json().map_err(AppError::from));
        let created = match payload {
            Ok(payload) => {
                vu.send(HttpRequest::post_json(vu.routes().collection(), payload))
                    .await
            }
            Err(e) => Err(e),
        };
        vu.check_status_200(&created);

        vu.pause(self.think_time).await;

        let deleted = match self.delete.target(vu.routes(), &created) {
            Some(url) => vu.send(HttpRequest::delete(url)).await,
            None => Err(AppError::Internal(
                "creation response carried no todo id".to_string(),
            )),
        };
        vu.check_status_200(&deleted);

        vu.pause(self.think_time).await;
    }
}

/// exec 名からビヘイビアを解決
pub fn resolve_behavior(
    exec: &str,
    planner_delete: PlannerDelete,
) -> Result<Arc<dyn Behavior>, DomainError> {
    match exec {
        STUDYING_STUDENT => Ok(Arc::new(StudyingStudent::default())),
        INDECISIVE_PLANNER => Ok(Arc::new(IndecisivePlanner::new(planner_delete))),
        other => Err(DomainError::UnknownExec(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created(body: &str) -> Result<HttpResponse, AppError> {
        Ok(HttpResponse {
            status: 200,
            body: body.to_string(),
        })
    }

    #[test]
    fn test_resolve_behavior() {
        assert_eq!(
            resolve_behavior(STUDYING_STUDENT, PlannerDelete::Literal)
                .unwrap()
                .exec_name(),
            STUDYING_STUDENT
        );
        assert_eq!(
            resolve_behavior(INDECISIVE_PLANNER, PlannerDelete::Literal)
                .unwrap()
                .exec_name(),
            INDECISIVE_PLANNER
        );
        assert!(matches!(
            resolve_behavior("default", PlannerDelete::Literal),
            Err(DomainError::UnknownExec(_))
        ));
    }

    #[test]
    fn test_literal_target_ignores_created_id() {
        let routes = TodoRoutes::new("http://localhost:8080");
        let response = created(r#"{"id":"abc"}"#);
        let target = PlannerDelete::Literal.target(&routes, &response).unwrap();

        assert_eq!(target, "${url}/${wrongId}");
        assert_ne!(target, routes.item("abc"));
    }

    #[test]
    fn test_created_id_target_uses_response_id() {
        let routes = TodoRoutes::new("http://localhost:8080");
        let target = PlannerDelete::CreatedId
            .target(&routes, &created(r#"{"id":"abc","title":"x"}"#))
            .unwrap();
        assert_eq!(target, "http://localhost:8080/api/v1/todos/abc");
    }

    #[test]
    fn test_created_id_target_without_id() {
        let routes = TodoRoutes::new("http://localhost:8080");
        assert_eq!(PlannerDelete::CreatedId.target(&routes, &created("{}")), None);
        assert_eq!(
            PlannerDelete::CreatedId.target(&routes, &Err(AppError::Network("down".to_string()))),
            None
        );
    }
}
