use domain::{DomainError, FarmError, IntegrityError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// アプリケーション全体で使用される包括的なエラー型
#[derive(Debug, Clone, Error)]
pub enum AppError {
    // ドメインエラー
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // 永続化エラー
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // システムエラー
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<FarmError> for AppError {
    fn from(error: FarmError) -> Self {
        match error {
            FarmError::Integrity(e) => AppError::Integrity(e),
            FarmError::Domain(e) => AppError::Domain(e),
            e @ FarmError::NotFound { .. } => AppError::NotFound(e.to_string()),
            FarmError::IdGeneration(msg) => AppError::Internal(msg),
        }
    }
}

/// エラーの分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 入力や操作対象に起因するエラー
    Client,
    /// サーバー側の恒久的なエラー
    Server,
    /// 一時的なエラー（リトライ可能）
    Transient,
}

/// エラーの重要度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl ErrorSeverity {
    /// ログ出力用の名前
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSeverity::Info => "info",
            ErrorSeverity::Warning => "warning",
            ErrorSeverity::Error => "error",
            ErrorSeverity::Critical => "critical",
        }
    }

    /// 運用者の対応が必要な重要度か
    pub fn needs_attention(&self) -> bool {
        matches!(self, ErrorSeverity::Error | ErrorSeverity::Critical)
    }
}

/// エラーメタデータ
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    /// エラーコード
    pub code: String,
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    /// リトライ可能フラグ
    pub retryable: bool,
    /// 追加コンテキスト
    pub context: HashMap<String, String>,
}

impl ErrorMetadata {
    fn new(code: &str, category: ErrorCategory, severity: ErrorSeverity) -> Self {
        Self {
            code: code.to_string(),
            category,
            severity,
            retryable: category == ErrorCategory::Transient,
            context: HashMap::new(),
        }
    }
}

impl AppError {
    /// エラーメタデータを取得
    pub fn metadata(&self) -> ErrorMetadata {
        match self {
            AppError::Domain(DomainError::Validation(_)) => ErrorMetadata::new(
                "VALIDATION_ERROR",
                ErrorCategory::Client,
                ErrorSeverity::Info,
            ),
            AppError::Domain(_) => {
                ErrorMetadata::new("DOMAIN_ERROR", ErrorCategory::Client, ErrorSeverity::Error)
            }
            AppError::Integrity(e) => {
                let mut metadata = ErrorMetadata::new(
                    "INTEGRITY_VIOLATION",
                    ErrorCategory::Client,
                    ErrorSeverity::Warning,
                );
                metadata
                    .context
                    .insert("entity".to_string(), e.entity.to_string());
                metadata.context.insert("id".to_string(), e.id.clone());
                metadata
                    .context
                    .insert("reason".to_string(), e.reason.code().to_string());
                metadata
            }
            AppError::NotFound(_) => {
                ErrorMetadata::new("NOT_FOUND", ErrorCategory::Client, ErrorSeverity::Info)
            }
            AppError::Persistence(_) => ErrorMetadata::new(
                "PERSISTENCE_ERROR",
                ErrorCategory::Transient,
                ErrorSeverity::Error,
            ),
            AppError::Serialization(_) => ErrorMetadata::new(
                "SERIALIZATION_ERROR",
                ErrorCategory::Server,
                ErrorSeverity::Error,
            ),
            AppError::Configuration(_) => ErrorMetadata::new(
                "CONFIGURATION_ERROR",
                ErrorCategory::Server,
                ErrorSeverity::Critical,
            ),
            AppError::Internal(_) => ErrorMetadata::new(
                "INTERNAL_ERROR",
                ErrorCategory::Server,
                ErrorSeverity::Critical,
            ),
        }
    }

    /// ユーザー向けメッセージを取得
    pub fn user_message(&self) -> String {
        match self {
            AppError::Domain(DomainError::Validation(msg)) => msg.clone(),
            AppError::Domain(_) => "The submitted data is invalid".to_string(),
            AppError::Integrity(e) => e.to_string(),
            AppError::NotFound(_) => "The requested record was not found".to_string(),
            AppError::Persistence(_) => {
                "Farm data could not be saved. Please try again".to_string()
            }
            AppError::Configuration(_) => "The application is misconfigured".to_string(),
            _ => "An unexpected error occurred".to_string(),
        }
    }
}

/// 標準化されたエラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// エラーコード
    pub code: String,
    /// ユーザー向けメッセージ
    pub message: String,
    /// 詳細情報（開発環境のみ）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub timestamp: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, String>,
}

impl ErrorResponse {
    pub fn from_app_error(error: &AppError, include_details: bool) -> Self {
        let metadata = error.metadata();

        Self {
            code: metadata.code,
            message: error.user_message(),
            details: include_details.then(|| error.to_string()),
            timestamp: chrono::Utc::now().to_rfc3339(),
            context: metadata.context,
        }
    }

    pub fn to_json(&self) -> Result<String, AppError> {
        serde_json::to_string(self).map_err(|e| AppError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{EntityKind, IntegrityReason};

    #[test]
    fn test_error_metadata() {
        let error = AppError::NotFound("animal not found: 9".to_string());
        let metadata = error.metadata();

        assert_eq!(metadata.code, "NOT_FOUND");
        assert_eq!(metadata.category, ErrorCategory::Client);
        assert!(!metadata.retryable);
    }

    #[test]
    fn test_error_severity() {
        // 利用者の操作ミスは対応不要、設定や内部の異常は要対応
        let severity = AppError::NotFound("birth not found: 9".to_string())
            .metadata()
            .severity;
        assert_eq!(severity, ErrorSeverity::Info);
        assert_eq!(severity.as_str(), "info");
        assert!(!severity.needs_attention());

        let severity = AppError::Domain(DomainError::Validation("name is required".to_string()))
            .metadata()
            .severity;
        assert!(!severity.needs_attention());

        let severity = AppError::Persistence("disk full".to_string()).metadata().severity;
        assert_eq!(severity, ErrorSeverity::Error);
        assert!(severity.needs_attention());

        let severity = AppError::Configuration("bad period".to_string())
            .metadata()
            .severity;
        assert_eq!(severity, ErrorSeverity::Critical);
        assert_eq!(severity.as_str(), "critical");
        assert!(severity.needs_attention());
    }

    #[test]
    fn test_persistence_retryable() {
        let metadata = AppError::Persistence("disk full".to_string()).metadata();
        assert_eq!(metadata.category, ErrorCategory::Transient);
        assert!(metadata.retryable);
    }

    #[test]
    fn test_from_farm_error() {
        let error: AppError = FarmError::not_found(EntityKind::Birth, "42").into();
        assert!(matches!(error, AppError::NotFound(ref msg) if msg == "birth not found: 42"));

        let error: AppError =
            FarmError::from(DomainError::Validation("name is required".to_string())).into();
        assert_eq!(error.metadata().code, "VALIDATION_ERROR");
        assert_eq!(error.user_message(), "name is required");

        let error: AppError = FarmError::IdGeneration("overflow".to_string()).into();
        assert_eq!(error.metadata().code, "INTERNAL_ERROR");
    }

    #[test]
    fn test_integrity_context() {
        let error: AppError = FarmError::from(IntegrityError::new(
            EntityKind::Animal,
            "1",
            IntegrityReason::HasMilkRecords,
        ))
        .into();
        let metadata = error.metadata();

        assert_eq!(metadata.code, "INTEGRITY_VIOLATION");
        assert_eq!(metadata.context.get("reason").unwrap(), "HAS_MILK_RECORDS");
        assert_eq!(metadata.context.get("entity").unwrap(), "animal");
        assert_eq!(
            error.user_message(),
            "Cannot delete animal 1: it has milk production records"
        );
    }

    #[test]
    fn test_error_response_creation() {
        let error = AppError::NotFound("milk record not found: m1".to_string());
        let response = ErrorResponse::from_app_error(&error, false);

        assert_eq!(response.code, "NOT_FOUND");
        assert_eq!(response.message, "The requested record was not found");
        assert!(response.details.is_none());

        let json = ErrorResponse::from_app_error(&error, true).to_json().unwrap();
        assert!(json.contains("milk record not found: m1"));
        assert!(!json.contains("context"));
    }
}
