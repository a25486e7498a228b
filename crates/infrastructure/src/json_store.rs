use crate::errors::StoreError;
use crate::retry::{retry_store_write, RetryConfig};
use crate::seed::SeedDataSource;
use crate::store::StateStore;
use domain::FarmSnapshot;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// 全状態を1つのJSONファイルに保存するストア
///
/// 書き込みは一時ファイルへ書いてから置き換えるため、
/// 途中で失敗しても既存のファイルは壊れない。
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    seed: Option<SeedDataSource>,
    retry: RetryConfig,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seed: None,
            retry: RetryConfig::default(),
        }
    }

    /// ファイルが存在しないときにサンプルデータから始める
    pub fn with_seed(mut self, seed: SeedDataSource) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn write_atomic(&self, bytes: &[u8]) -> Result<(), StoreError> {
        let temp = self.temp_path();
        tokio::fs::write(&temp, bytes)
            .await
            .map_err(|e| StoreError::io(&temp, e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))
    }
}

impl StateStore for JsonFileStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load_initial_state(&self) -> Result<FarmSnapshot, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let snapshot: FarmSnapshot = serde_json::from_str(&contents)?;
                info!(
                    animals = snapshot.animals.len(),
                    births = snapshot.births.len(),
                    milk_records = snapshot.milk_records.len(),
                    "保存済みの状態を読み込みました"
                );
                Ok(snapshot)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => match &self.seed {
                Some(seed) => {
                    info!("データファイルが存在しないためサンプルデータから開始します");
                    seed.load_initial_state().await
                }
                None => {
                    info!("データファイルが存在しないため空の状態から開始します");
                    Ok(FarmSnapshot::default())
                }
            },
            Err(e) => Err(StoreError::io(&self.path, e)),
        }
    }

    #[instrument(skip(self, snapshot), fields(path = %self.path.display()))]
    async fn save(&self, snapshot: &FarmSnapshot) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;

        retry_store_write(&self.path, || self.write_atomic(&bytes), &self.retry).await?;

        debug!(bytes = bytes.len(), "状態を保存しました");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_temp_path_is_sibling() {
        let store = JsonFileStore::new("/var/lib/farm/state.json");
        assert_eq!(
            store.temp_path(),
            PathBuf::from("/var/lib/farm/state.json.tmp")
        );
    }

    #[tokio::test]
    async fn test_missing_file_without_seed() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("state.json"));

        let snapshot = store.load_initial_state().await.unwrap();
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_with_seed() {
        let dir = tempfile::tempdir().unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let store =
            JsonFileStore::new(dir.path().join("state.json")).with_seed(SeedDataSource::new(today));

        let snapshot = store.load_initial_state().await.unwrap();
        assert_eq!(snapshot.animals.len(), 7);
        // 読み込みだけではファイルは作られない
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = JsonFileStore::new(&path).load_initial_state().await;
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_save_into_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("missing").join("state.json"));

        let result = store.save(&FarmSnapshot::default()).await;
        assert!(matches!(result, Err(StoreError::Io { .. })));
    }
}
