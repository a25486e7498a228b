use domain::{Notifier, Severity};
use tracing::{info, warn};

/// 通知を構造化ログとして出力する
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Success => info!(notification = %message, "操作が完了しました"),
            Severity::Error => warn!(notification = %message, "操作が拒否されました"),
        }
    }
}
