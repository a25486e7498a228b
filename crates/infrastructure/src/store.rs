use crate::errors::StoreError;
use domain::FarmSnapshot;
use std::future::Future;

/// 集約の初期状態の読み込みと保存を担う
pub trait StateStore: Send + Sync + 'static {
    fn load_initial_state(&self) -> impl Future<Output = Result<FarmSnapshot, StoreError>> + Send;

    fn save(&self, snapshot: &FarmSnapshot) -> impl Future<Output = Result<(), StoreError>> + Send;
}
