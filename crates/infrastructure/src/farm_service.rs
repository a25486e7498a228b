use crate::errors::StoreError;
use crate::store::StateStore;
use domain::{
    Animal, AnimalId, Birth, BirthId, Dashboard, FarmAggregate, FarmResult, FarmSnapshot,
    HerdReport, LactationCurve, MilkProductionRecord, MilkRecordId, NewAnimal, NewBirth,
    NewMilkProductionRecord, ProductionReport, ProductionStats, ReportPeriod,
};
use shared::TracingNotifier;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error};

/// 複数のクライアントから共有される農場サービス
///
/// 読み取りは読み取りロック、変更は書き込みロックの下で行う（後勝ち）。
/// 変更が成功するたびにスナップショットをバックグラウンドで保存し、
/// 保存の失敗はログに残すだけで呼び出し元には返さない。
pub struct FarmService<S: StateStore> {
    farm: Arc<RwLock<FarmAggregate>>,
    store: Arc<S>,
    /// 変更のたびに増える版数
    revision: Arc<AtomicU64>,
    /// 保存済みの版数（保存処理の直列化も兼ねる）
    persisted: Arc<Mutex<u64>>,
}

impl<S: StateStore> Clone for FarmService<S> {
    fn clone(&self) -> Self {
        Self {
            farm: self.farm.clone(),
            store: self.store.clone(),
            revision: self.revision.clone(),
            persisted: self.persisted.clone(),
        }
    }
}

impl<S: StateStore> FarmService<S> {
    pub fn new(farm: FarmAggregate, store: S) -> Self {
        Self {
            farm: Arc::new(RwLock::new(farm)),
            store: Arc::new(store),
            revision: Arc::new(AtomicU64::new(0)),
            persisted: Arc::new(Mutex::new(0)),
        }
    }

    /// ストアの初期状態から集約を作成する（通知はログに出力）
    pub async fn load(store: S) -> Result<Self, StoreError> {
        let snapshot = store.load_initial_state().await?;
        let farm = FarmAggregate::new(snapshot).with_notifier(Arc::new(TracingNotifier));
        Ok(Self::new(farm, store))
    }

    /// 読み取りロックの下で問い合わせを実行する
    pub async fn read<R>(&self, query: impl FnOnce(&FarmAggregate) -> R) -> R {
        let farm = self.farm.read().await;
        query(&*farm)
    }

    /// 書き込みロックの下で変更を実行し、成功したら保存を予約する
    pub async fn mutate<R>(
        &self,
        change: impl FnOnce(&mut FarmAggregate) -> FarmResult<R>,
    ) -> FarmResult<R> {
        let (result, revision, snapshot) = {
            let mut farm = self.farm.write().await;
            let result = change(&mut *farm)?;
            let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
            (result, revision, farm.snapshot())
        };

        let store = self.store.clone();
        let persisted = self.persisted.clone();
        tokio::spawn(async move {
            if let Err(e) = persist(store.as_ref(), &persisted, revision, snapshot).await {
                error!(revision, error = %e, "状態の保存に失敗しました");
            }
        });

        Ok(result)
    }

    /// 現在の状態をすぐに保存する
    ///
    /// 先に予約された古い版の保存は、これ以降はスキップされる。
    pub async fn flush(&self) -> Result<(), StoreError> {
        let (revision, snapshot) = {
            let farm = self.farm.read().await;
            (self.revision.load(Ordering::SeqCst), farm.snapshot())
        };
        persist(self.store.as_ref(), &self.persisted, revision, snapshot).await
    }

    pub async fn snapshot(&self) -> FarmSnapshot {
        self.read(|farm| farm.snapshot()).await
    }

    // ---- 変更 ----

    pub async fn add_animal(&self, new_animal: NewAnimal) -> FarmResult<Animal> {
        self.mutate(|farm| farm.add_animal(new_animal)).await
    }

    pub async fn update_animal(&self, animal: Animal) -> FarmResult<()> {
        self.mutate(|farm| farm.update_animal(animal)).await
    }

    pub async fn delete_animal(&self, id: &AnimalId) -> FarmResult<Animal> {
        self.mutate(|farm| farm.delete_animal(id)).await
    }

    pub async fn add_birth(&self, new_birth: NewBirth) -> FarmResult<Birth> {
        self.mutate(|farm| farm.add_birth(new_birth)).await
    }

    pub async fn update_birth(&self, birth: Birth) -> FarmResult<()> {
        self.mutate(|farm| farm.update_birth(birth)).await
    }

    pub async fn delete_birth(&self, id: &BirthId) -> FarmResult<Birth> {
        self.mutate(|farm| farm.delete_birth(id)).await
    }

    pub async fn add_milk_record(
        &self,
        new_record: NewMilkProductionRecord,
    ) -> FarmResult<MilkProductionRecord> {
        self.mutate(|farm| farm.add_milk_record(new_record)).await
    }

    pub async fn update_milk_record(&self, record: MilkProductionRecord) -> FarmResult<()> {
        self.mutate(|farm| farm.update_milk_record(record)).await
    }

    pub async fn delete_milk_record(&self, id: &MilkRecordId) -> FarmResult<MilkProductionRecord> {
        self.mutate(|farm| farm.delete_milk_record(id)).await
    }

    // ---- 問い合わせ ----

    pub async fn production_stats(&self) -> ProductionStats {
        self.read(|farm| farm.production_stats()).await
    }

    pub async fn lactation_curve(
        &self,
        animal_id: &AnimalId,
        birth_id: &BirthId,
    ) -> Option<LactationCurve> {
        self.read(|farm| farm.lactation_curve(animal_id, birth_id))
            .await
    }

    pub async fn dashboard(&self) -> Dashboard {
        self.read(|farm| farm.dashboard()).await
    }

    pub async fn herd_report(&self) -> HerdReport {
        self.read(|farm| farm.herd_report()).await
    }

    pub async fn production_report(&self, period: ReportPeriod) -> ProductionReport {
        self.read(|farm| farm.production_report(period)).await
    }
}

/// 保存済みの版より新しい場合だけ保存する
async fn persist<S: StateStore>(
    store: &S,
    persisted: &Mutex<u64>,
    revision: u64,
    snapshot: FarmSnapshot,
) -> Result<(), StoreError> {
    let mut saved = persisted.lock().await;
    if *saved >= revision && revision > 0 {
        debug!(revision, saved = *saved, "より新しい版が保存済みのためスキップします");
        return Ok(());
    }

    store.save(&snapshot).await?;
    *saved = revision;
    debug!(revision, "状態を保存しました");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::SeedDataSource;
    use chrono::NaiveDate;
    use domain::{AnimalStatus, FarmError, Gender, IntegrityReason, SequentialIdGenerator};

    fn service() -> FarmService<SeedDataSource> {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let seed = SeedDataSource::new(today);
        let farm = FarmAggregate::new(seed.snapshot().unwrap())
            .with_id_generator(SequentialIdGenerator::starting_at(100));
        FarmService::new(farm, seed)
    }

    fn new_animal(name: &str) -> NewAnimal {
        NewAnimal {
            name: name.to_string(),
            code: "VC900".to_string(),
            breed: "Holstein".to_string(),
            gender: Gender::Female,
            birth_date: NaiveDate::from_ymd_opt(2023, 2, 1).unwrap(),
            status: AnimalStatus::Active,
            mother_id: None,
            father_id: None,
            notes: None,
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_mutations_are_visible_to_clones() {
        let service = service();
        let other = service.clone();

        let added = service.add_animal(new_animal("Canela")).await.unwrap();
        assert_eq!(added.id.as_str(), "100");

        let name = other.read(|farm| farm.animal_name(Some(&added.id))).await;
        assert_eq!(name, "Canela");
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_state_unchanged() {
        let service = service();
        let before = service.snapshot().await;

        let error = service
            .delete_animal(&AnimalId::from_string("1").unwrap())
            .await
            .unwrap_err();
        assert_eq!(error.integrity_reason(), Some(IntegrityReason::HasMilkRecords));
        assert_eq!(service.snapshot().await, before);
        assert_eq!(service.revision.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_concurrent_adds_get_unique_ids() {
        let service = service();

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .add_animal(new_animal(&format!("Ternera {i}")))
                        .await
                })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().id);
        }
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 10);
        assert_eq!(service.read(|farm| farm.animals().len()).await, 17);
    }

    #[tokio::test]
    async fn test_not_found_through_service() {
        let service = service();
        let result = service
            .delete_milk_record(&MilkRecordId::from_string("missing").unwrap())
            .await;
        assert!(matches!(result, Err(FarmError::NotFound { .. })));
    }
}
