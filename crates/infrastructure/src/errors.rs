use domain::DomainError;
use shared::AppError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// 永続化コンポーネントのエラー
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid stored data: {0}")]
    InvalidData(#[from] DomainError),
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    /// I/Oエラーの種類（I/O以外は `None`）
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            StoreError::Io { source, .. } => Some(source.kind()),
            _ => None,
        }
    }

    /// 再試行で解消する可能性のあるI/Oエラーか
    pub fn is_transient(&self) -> bool {
        matches!(
            self.io_kind(),
            Some(
                io::ErrorKind::Interrupted
                    | io::ErrorKind::WouldBlock
                    | io::ErrorKind::TimedOut
            )
        )
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Io { .. } => AppError::Persistence(error.to_string()),
            StoreError::Serialization(e) => AppError::Serialization(e.to_string()),
            StoreError::InvalidData(e) => AppError::Domain(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_detection() {
        let error = StoreError::io("state.json", io::Error::from(io::ErrorKind::Interrupted));
        assert!(error.is_transient());

        let error = StoreError::io("state.json", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(!error.is_transient());
        assert_eq!(error.io_kind(), Some(io::ErrorKind::PermissionDenied));

        // I/O以外は再試行しない
        let error: StoreError = serde_json::from_str::<u32>("oops").unwrap_err().into();
        assert_eq!(error.io_kind(), None);
        assert!(!error.is_transient());
    }

    #[test]
    fn test_into_app_error() {
        let error = StoreError::io("state.json", io::Error::from(io::ErrorKind::TimedOut));
        let app_error: AppError = error.into();
        assert!(app_error.metadata().retryable);
        assert!(app_error.to_string().contains("state.json"));

        let error: StoreError = serde_json::from_str::<u32>("oops").unwrap_err().into();
        assert_eq!(AppError::from(error).metadata().code, "SERIALIZATION_ERROR");
    }
}
