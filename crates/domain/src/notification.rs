use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// 通知の重要度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Success,
    Error,
}

/// 変更の成功や削除の拒否を受け取る通知先
///
/// 通知は観測のみ。集約は通知の結果に依存しない。
pub trait Notifier: Send + Sync {
    fn notify(&self, severity: Severity, message: &str);
}

/// 何もしない通知先
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _severity: Severity, _message: &str) {}
}

/// 受け取った通知を保持する（テスト用）
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    notifications: Arc<Mutex<Vec<(Severity, String)>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<(Severity, String)> {
        self.notifications
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<(Severity, String)> {
        self.notifications().pop()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        if let Ok(mut notifications) = self.notifications.lock() {
            notifications.push((severity, message.to_string()));
        }
    }
}
