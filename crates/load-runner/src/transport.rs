//! HTTP 送信の抽象
//!
//! ビヘイビアは [`HttpTransport`] だけを通して外へ出る。本番は reqwest、
//! テストは記録用の実装を差し込む。

use async_trait::async_trait;
use shared::{AppError, Config};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post_json(url: impl Into<String>, body: String) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Some(body),
        }
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self {
            method: Method::Delete,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// リクエストを1件送り、応答を返す
///
/// ステータスコードの良し悪しは判定しない。応答が得られなかった場合のみ `Err`。
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, AppError>;
}

/// reqwest による実装
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| AppError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

fn map_reqwest_error(error: reqwest::Error) -> AppError {
    if error.is_timeout() {
        AppError::Timeout(error.to_string())
    } else if error.is_builder() {
        AppError::InvalidUrl(error.to_string())
    } else {
        AppError::Network(error.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, AppError> {
        let url = reqwest::Url::parse(&request.url)
            .map_err(|e| AppError::InvalidUrl(format!("'{}': {e}", request.url)))?;

        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Delete => self.client.delete(url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_reqwest_error)?;

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::UNINTERPOLATED_DELETE_TARGET;
    use std::time::Duration;

    fn transport() -> ReqwestTransport {
        let config = Config {
            endpoint: "http://127.0.0.1:9".to_string(),
            http_timeout: Duration::from_secs(1),
            user_agent: "todo-load-test".to_string(),
            log_format: shared::LogFormat::Pretty,
        };
        ReqwestTransport::new(&config).unwrap()
    }

    #[test]
    fn test_post_json_sets_content_type() {
        let request = HttpRequest::post_json("http://x/api/v1/todos", "{}".to_string());
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.body.as_deref(), Some("{}"));
    }

    #[test]
    fn test_method_names() {
        assert_eq!(Method::Get.as_str(), "GET");
        assert_eq!(Method::Post.as_str(), "POST");
        assert_eq!(Method::Delete.as_str(), "DELETE");
    }

    #[tokio::test]
    async fn test_uninterpolated_target_is_invalid_url() {
        let result = transport()
            .send(HttpRequest::delete(UNINTERPOLATED_DELETE_TARGET))
            .await;
        assert!(matches!(result, Err(AppError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_relative_url_is_invalid() {
        let result = transport().send(HttpRequest::get("/api/v1/todos")).await;
        let err = result.unwrap_err();
        assert!(err.is_request_failure());
        assert_eq!(err.code(), "INVALID_URL");
    }
}
