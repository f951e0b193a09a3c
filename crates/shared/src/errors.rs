use thiserror::Error;

/// アプリケーション全体で使用されるエラー型
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    // ドメインエラー
    #[error("Domain error: {0}")]
    Domain(#[from] domain::DomainError),

    // 設定エラー
    #[error("Configuration error: {0}")]
    Configuration(String),

    // リクエストエラー
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout occurred: {0}")]
    Timeout(String),

    // システムエラー
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// エラーの分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 起動時に検出される設定・定義の誤り
    Setup,
    /// 1回の HTTP リクエストの失敗（イテレーションは継続）
    Request,
    /// それ以外
    System,
}

impl AppError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::Domain(_) | AppError::Configuration(_) => ErrorCategory::Setup,
            AppError::InvalidUrl(_) | AppError::Network(_) | AppError::Timeout(_) => {
                ErrorCategory::Request
            }
            AppError::Serialization(_) | AppError::Io(_) | AppError::Internal(_) => {
                ErrorCategory::System
            }
        }
    }

    /// エラーコード（ログとサマリーで使用）
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Domain(_) => "DOMAIN_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::InvalidUrl(_) => "INVALID_URL",
            AppError::Network(_) => "NETWORK_ERROR",
            AppError::Timeout(_) => "TIMEOUT",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn is_request_failure(&self) -> bool {
        self.category() == ErrorCategory::Request
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}
