use crate::errors::StoreError;
use shared::Config;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// リトライ設定
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// 最大試行回数（初回を含む）
    pub max_attempts: u32,
    /// 初期待機時間（ミリ秒）
    pub initial_delay_ms: u64,
    /// 指数バックオフの倍率
    pub backoff_multiplier: f64,
    /// 最大待機時間（ミリ秒）
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 50,
            backoff_multiplier: 2.0,
            max_delay_ms: 2000,
        }
    }
}

impl From<&Config> for RetryConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_attempts: config.persist_retry_max_attempts.max(1),
            initial_delay_ms: config.persist_retry_initial_delay_ms,
            ..Self::default()
        }
    }
}

impl RetryConfig {
    /// 次の待機時間（上限で頭打ち）
    fn next_delay(&self, delay_ms: u64) -> u64 {
        let next = (delay_ms as f64 * self.backoff_multiplier) as u64;
        next.min(self.max_delay_ms)
    }
}

/// ストアへの書き込みを指数バックオフで再試行する
///
/// 一時的なI/Oエラー（`StoreError::is_transient`）だけを再試行し、
/// シリアライズ失敗や権限エラーはそのまま返す。
pub async fn retry_store_write<F, Fut, T>(
    path: &Path,
    operation: F,
    config: &RetryConfig,
) -> Result<T, StoreError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay_ms;

    loop {
        attempt += 1;
        debug!(
            path = %path.display(),
            attempt,
            max_attempts = config.max_attempts,
            "書き込み中"
        );

        let error = match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    info!(path = %path.display(), attempt, "再試行で書き込みに成功しました");
                }
                return Ok(result);
            }
            Err(error) => error,
        };

        let kind = error.io_kind();
        if !error.is_transient() {
            debug!(path = %path.display(), kind = ?kind, error = %error, "再試行できないエラーです");
            return Err(error);
        }

        if attempt >= config.max_attempts {
            warn!(
                path = %path.display(),
                kind = ?kind,
                attempts = attempt,
                error = %error,
                "再試行の上限に達しました"
            );
            return Err(error);
        }

        warn!(
            path = %path.display(),
            kind = ?kind,
            delay_ms = delay,
            error = %error,
            "一時的なI/Oエラーのため再試行します"
        );
        sleep(Duration::from_millis(delay)).await;
        delay = config.next_delay(delay);
    }
}
