//! シンクタイム（VU の一時停止）

use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;

/// VU を指定時間だけ止める。他の VU には影響しない。
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// tokio のタイマーで実際に待つ
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// `min_secs..=max_secs` から一様に選んだ整数秒
pub fn random_think_time<R: Rng + ?Sized>(rng: &mut R, min_secs: u64, max_secs: u64) -> Duration {
    Duration::from_secs(rng.gen_range(min_secs..=max_secs))
}
