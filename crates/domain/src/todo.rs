use crate::errors::DomainError;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// ToDo コレクションのパス
pub const TODOS_PATH: &str = "/api/v1/todos";

/// 補間されないまま送信される削除先
///
/// テンプレート文字列として評価されない `${url}/${wrongId}` がそのまま URL になる。
pub const UNINTERPOLATED_DELETE_TARGET: &str = "${url}/${wrongId}";

/// `deadline_at` のワイヤ形式（タイムゾーンなし ISO-8601）
const DEADLINE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// POST /api/v1/todos のリクエストボディ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTodo {
    pub title: String,
    pub completed: bool,
    pub description: String,
    #[serde(with = "deadline_format")]
    pub deadline_at: NaiveDateTime,
}

impl NewTodo {
    /// 迷える計画者が毎回作成する ToDo（締め切りは 2025-09-05T15:00:00）
    pub fn indecisive_plan() -> Result<Self, DomainError> {
        let deadline_at = NaiveDate::from_ymd_opt(2025, 9, 5)
            .and_then(|date| date.and_hms_opt(15, 0, 0))
            .ok_or_else(|| DomainError::Validation("invalid planner deadline".to_string()))?;

        Ok(Self {
            title: "CSSE6400 Clout Assignment".to_string(),
            completed: false,
            description: String::new(),
            deadline_at,
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

mod deadline_format {
    use super::DEADLINE_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &NaiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(DEADLINE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, DEADLINE_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// 作成レスポンスから ToDo の ID を取り出す
///
/// `id` が文字列でも数値でも受け付ける。JSON でない本文や `id` のない本文は `None`。
pub fn created_todo_id(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("id")? {
        serde_json::Value::String(id) if !id.is_empty() => Some(id.clone()),
        serde_json::Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// ベース URL から ToDo API の URL を組み立てる
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoRoutes {
    base: String,
}

impl TodoRoutes {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    /// `{base}/api/v1/todos`
    pub fn collection(&self) -> String {
        format!("{}{}", self.base, TODOS_PATH)
    }

    /// `{base}/api/v1/todos/{id}`
    pub fn item(&self, id: &str) -> String {
        format!("{}/{}", self.collection(), id)
    }
}
