use crate::config::LogFormat;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// トレーシングサブスクライバーを初期化
///
/// `RUST_LOG` が設定されていればそれを優先し、なければ `default_level` を使う。
pub fn init_tracing(
    format: LogFormat,
    default_level: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match format {
        // 構造化ログ出力（ログ収集基盤向け）
        LogFormat::Json => tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_target(false).json())
            .with(filter)
            .try_init()?,
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .with(filter)
            .try_init()?,
    }

    Ok(())
}
