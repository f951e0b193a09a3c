//! 学生（一覧取得）と計画者（作成して削除）の2種類の仮想ユーザーで
//! ToDo API に負荷をかける。

pub mod behaviors;
pub mod cli;
pub mod executor;
pub mod pacer;
pub mod reporter;
pub mod runner;
pub mod transport;
pub mod vu;

pub use behaviors::{
    resolve_behavior, Behavior, IndecisivePlanner, PlannerDelete, StudyingStudent, KNOWN_EXECS,
};
pub use pacer::{Pacer, TokioPacer};
pub use runner::Runner;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport};
pub use vu::{ScenarioContext, VirtualUser, IS_STATUS_200};
