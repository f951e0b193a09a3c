use crate::errors::AppError;
use std::env;
use std::time::Duration;

/// ログ出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// 負荷をかける API のベース URL（末尾の `/` は除去済み）
    pub endpoint: String,
    pub http_timeout: Duration,
    pub user_agent: String,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// 任意の変数ソースから設定を読み込む
    pub fn from_vars<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = lookup("ENDPOINT")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                AppError::Configuration(
                    "ENDPOINT must be set to the base URL of the todos API".to_string(),
                )
            })?;

        let http_timeout = match lookup("LOAD_HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    AppError::Configuration(format!(
                        "LOAD_HTTP_TIMEOUT_SECS must be a whole number of seconds, got '{raw}'"
                    ))
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(60),
        };

        let user_agent = lookup("LOAD_USER_AGENT")
            .unwrap_or_else(|| format!("todo-load/{}", env!("CARGO_PKG_VERSION")));

        let log_format = match lookup("LOAD_LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(AppError::Configuration(format!(
                    "LOAD_LOG_FORMAT must be 'pretty' or 'json', got '{other}'"
                )))
            }
        };

        Ok(Config {
            endpoint,
            http_timeout,
            user_agent,
            log_format,
        })
    }
}
