use crate::animal::{validate_required, Animal, NewAnimal};
use crate::birth::{Birth, NewBirth};
use crate::clock::{Clock, SystemClock};
use crate::errors::{DomainError, EntityKind, FarmError, FarmResult, IntegrityError};
use crate::identifiers::{AnimalId, BirthId, IdGenerator, MilkRecordId, UlidIdGenerator};
use crate::integrity::{animal_dependency, birth_dependency};
use crate::lactation::{lactation_curve, LactationCurve};
use crate::milk::{MilkProductionRecord, NewMilkProductionRecord};
use crate::notification::{NoopNotifier, Notifier, Severity};
use crate::stats::{self, AnimalTotal, DailyTotal, ProductionStats};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// 参照先が解決できないときの表示名
pub const UNKNOWN_NAME: &str = "N/A";

/// ID発行がすでに使われているIDを返し続けたときに諦めるまでの回数
const MAX_ID_ATTEMPTS: usize = 16;

/// 3つのコレクションの内容
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmSnapshot {
    #[serde(default)]
    pub animals: Vec<Animal>,
    #[serde(default)]
    pub births: Vec<Birth>,
    #[serde(default)]
    pub milk_records: Vec<MilkProductionRecord>,
}

impl FarmSnapshot {
    pub fn is_empty(&self) -> bool {
        self.animals.is_empty() && self.births.is_empty() && self.milk_records.is_empty()
    }
}

/// 農場集約
///
/// 動物・分娩・搾乳記録の3コレクションを所有し、
/// 追加・更新・削除（削除時の参照整合性チェック付き）と統計の問い合わせを提供する。
/// 他のコンポーネントはこの集約の操作を通してのみコレクションにアクセスする。
pub struct FarmAggregate {
    pub(crate) animals: Vec<Animal>,
    pub(crate) births: Vec<Birth>,
    pub(crate) milk_records: Vec<MilkProductionRecord>,
    id_generator: Box<dyn IdGenerator>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for FarmAggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FarmAggregate")
            .field("animals", &self.animals.len())
            .field("births", &self.births.len())
            .field("milk_records", &self.milk_records.len())
            .finish()
    }
}

impl Default for FarmAggregate {
    fn default() -> Self {
        Self::new(FarmSnapshot::default())
    }
}

impl FarmAggregate {
    /// スナップショットから集約を作成
    pub fn new(snapshot: FarmSnapshot) -> Self {
        Self {
            animals: snapshot.animals,
            births: snapshot.births,
            milk_records: snapshot.milk_records,
            id_generator: Box::new(UlidIdGenerator::new()),
            notifier: Arc::new(NoopNotifier),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_id_generator(mut self, id_generator: impl IdGenerator + 'static) -> Self {
        self.id_generator = Box::new(id_generator);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 現在の内容を複製して返す
    pub fn snapshot(&self) -> FarmSnapshot {
        FarmSnapshot {
            animals: self.animals.clone(),
            births: self.births.clone(),
            milk_records: self.milk_records.clone(),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn notify_success(&self, message: &str) {
        self.notifier.notify(Severity::Success, message);
    }

    fn reject_delete(&self, error: IntegrityError) -> FarmError {
        self.notifier.notify(Severity::Error, &error.to_string());
        FarmError::Integrity(error)
    }

    // ---- 動物 ----

    pub fn animals(&self) -> &[Animal] {
        &self.animals
    }

    pub fn animal_by_id(&self, id: &AnimalId) -> Option<&Animal> {
        self.animals.iter().find(|a| &a.id == id)
    }

    /// 動物名を取得（IDなし・未登録は "N/A"）
    pub fn animal_name(&self, id: Option<&AnimalId>) -> String {
        id.and_then(|id| self.animal_by_id(id))
            .map(|a| a.name.clone())
            .unwrap_or_else(|| UNKNOWN_NAME.to_string())
    }

    pub fn add_animal(&mut self, new_animal: NewAnimal) -> FarmResult<Animal> {
        let animals = &self.animals;
        let id = fresh_id(self.id_generator.as_mut(), |id| {
            animals.iter().any(|a| a.id.as_str() == id)
        })?;
        let animal = new_animal.into_animal(AnimalId::from_string(id)?);
        animal.validate()?;

        self.animals.push(animal.clone());
        self.notify_success("Animal added successfully");
        Ok(animal)
    }

    /// IDが一致する動物を丸ごと置き換える
    pub fn update_animal(&mut self, animal: Animal) -> FarmResult<()> {
        animal.validate()?;
        let slot = self
            .animals
            .iter_mut()
            .find(|a| a.id == animal.id)
            .ok_or_else(|| FarmError::not_found(EntityKind::Animal, animal.id.as_str()))?;
        *slot = animal;
        self.notify_success("Animal updated successfully");
        Ok(())
    }

    /// 依存するレコードがなければ動物を削除する
    pub fn delete_animal(&mut self, id: &AnimalId) -> FarmResult<Animal> {
        let position = self
            .animals
            .iter()
            .position(|a| &a.id == id)
            .ok_or_else(|| FarmError::not_found(EntityKind::Animal, id.as_str()))?;

        if let Some(reason) = animal_dependency(id, &self.animals, &self.births, &self.milk_records)
        {
            return Err(self.reject_delete(IntegrityError::new(
                EntityKind::Animal,
                id.as_str(),
                reason,
            )));
        }

        let removed = self.animals.remove(position);
        self.notify_success("Animal deleted successfully");
        Ok(removed)
    }

    pub fn active_animal_count(&self) -> usize {
        self.animals.iter().filter(|a| a.is_active()).count()
    }

    // ---- 分娩 ----

    pub fn births(&self) -> &[Birth] {
        &self.births
    }

    pub fn birth_by_id(&self, id: &BirthId) -> Option<&Birth> {
        self.births.iter().find(|b| &b.id == id)
    }

    /// 母牛の分娩記録
    pub fn births_by_animal(&self, mother_id: &AnimalId) -> Vec<Birth> {
        self.births
            .iter()
            .filter(|b| &b.mother_id == mother_id)
            .cloned()
            .collect()
    }

    /// 分娩を登録する
    ///
    /// 分娩番号は登録時点での母牛の分娩記録数 + 1。後から編集・削除しても振り直さない。
    pub fn add_birth(&mut self, new_birth: NewBirth) -> FarmResult<Birth> {
        validate_required("mother_id", new_birth.mother_id.as_str())?;
        let previous = self
            .births
            .iter()
            .filter(|b| b.mother_id == new_birth.mother_id)
            .count();
        let birth_number = u32::try_from(previous + 1)
            .map_err(|_| DomainError::Validation("birth number overflow".to_string()))?;

        let births = &self.births;
        let id = fresh_id(self.id_generator.as_mut(), |id| {
            births.iter().any(|b| b.id.as_str() == id)
        })?;
        let birth = new_birth.into_birth(BirthId::from_string(id)?, birth_number);
        birth.validate()?;

        self.births.push(birth.clone());
        self.notify_success("Birth registered successfully");
        Ok(birth)
    }

    pub fn update_birth(&mut self, birth: Birth) -> FarmResult<()> {
        birth.validate()?;
        let slot = self
            .births
            .iter_mut()
            .find(|b| b.id == birth.id)
            .ok_or_else(|| FarmError::not_found(EntityKind::Birth, birth.id.as_str()))?;
        *slot = birth;
        self.notify_success("Birth record updated successfully");
        Ok(())
    }

    pub fn delete_birth(&mut self, id: &BirthId) -> FarmResult<Birth> {
        let position = self
            .births
            .iter()
            .position(|b| &b.id == id)
            .ok_or_else(|| FarmError::not_found(EntityKind::Birth, id.as_str()))?;

        if let Some(reason) = birth_dependency(id, &self.milk_records) {
            return Err(self.reject_delete(IntegrityError::new(
                EntityKind::Birth,
                id.as_str(),
                reason,
            )));
        }

        let removed = self.births.remove(position);
        self.notify_success("Birth record deleted successfully");
        Ok(removed)
    }

    pub fn total_births(&self) -> usize {
        self.births.len()
    }

    // ---- 搾乳記録 ----

    pub fn milk_records(&self) -> &[MilkProductionRecord] {
        &self.milk_records
    }

    pub fn milk_record_by_id(&self, id: &MilkRecordId) -> Option<&MilkProductionRecord> {
        self.milk_records.iter().find(|r| &r.id == id)
    }

    /// 動物の搾乳記録（日付の昇順）
    pub fn production_by_animal(&self, animal_id: &AnimalId) -> Vec<MilkProductionRecord> {
        let mut records: Vec<MilkProductionRecord> = self
            .milk_records
            .iter()
            .filter(|r| &r.animal_id == animal_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.date);
        records
    }

    /// 搾乳記録を登録する（動物の性別・状態は検証しない）
    pub fn add_milk_record(
        &mut self,
        new_record: NewMilkProductionRecord,
    ) -> FarmResult<MilkProductionRecord> {
        validate_required("animal_id", new_record.animal_id.as_str())?;
        let records = &self.milk_records;
        let id = fresh_id(self.id_generator.as_mut(), |id| {
            records.iter().any(|r| r.id.as_str() == id)
        })?;
        let record = new_record.into_record(MilkRecordId::from_string(id)?);
        record.validate()?;

        self.milk_records.push(record.clone());
        self.notify_success("Milk production recorded successfully");
        Ok(record)
    }

    pub fn update_milk_record(&mut self, record: MilkProductionRecord) -> FarmResult<()> {
        record.validate()?;
        let slot = self
            .milk_records
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| FarmError::not_found(EntityKind::MilkRecord, record.id.as_str()))?;
        *slot = record;
        self.notify_success("Production record updated successfully");
        Ok(())
    }

    /// 搾乳記録は他から参照されないため無条件に削除できる
    pub fn delete_milk_record(&mut self, id: &MilkRecordId) -> FarmResult<MilkProductionRecord> {
        let position = self
            .milk_records
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| FarmError::not_found(EntityKind::MilkRecord, id.as_str()))?;

        let removed = self.milk_records.remove(position);
        self.notify_success("Production record deleted successfully");
        Ok(removed)
    }

    // ---- 統計 ----

    /// 時計の現在時刻を基準にした期間別生産量
    pub fn production_stats(&self) -> ProductionStats {
        self.production_stats_at(self.now())
    }

    pub fn production_stats_at(&self, now: DateTime<Utc>) -> ProductionStats {
        stats::production_stats(&self.milk_records, now)
    }

    pub fn aggregate_by_date(&self, records: &[MilkProductionRecord]) -> Vec<DailyTotal> {
        stats::aggregate_by_date(records)
    }

    /// 動物ごとの合計（動物名は集約から解決）
    pub fn aggregate_by_animal(&self, records: &[MilkProductionRecord]) -> Vec<AnimalTotal> {
        stats::aggregate_by_animal(records, |id| self.animal_name(Some(id)))
    }

    /// 泌乳曲線。分娩が見つからない場合は None（データなし）
    pub fn lactation_curve(
        &self,
        animal_id: &AnimalId,
        birth_id: &BirthId,
    ) -> Option<LactationCurve> {
        self.birth_by_id(birth_id)
            .map(|birth| lactation_curve(animal_id, birth, &self.milk_records))
    }
}

/// コレクション内で未使用のIDを発行する
fn fresh_id(
    id_generator: &mut dyn IdGenerator,
    in_use: impl Fn(&str) -> bool,
) -> FarmResult<String> {
    for _ in 0..MAX_ID_ATTEMPTS {
        let id = id_generator.next_id()?;
        if !in_use(&id) {
            return Ok(id);
        }
    }
    Err(FarmError::IdGeneration(format!(
        "no unused id after {MAX_ID_ATTEMPTS} attempts"
    )))
}
