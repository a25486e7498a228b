use crate::errors::StoreError;
use crate::store::StateStore;
use chrono::{Duration, NaiveDate};
use domain::{
    round_one_decimal, Animal, AnimalId, BirthId, FarmSnapshot, MilkProductionRecord,
    MilkRecordId,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

/// サンプルの牛群（動物7頭・分娩4件）
const HERD_JSON: &str = include_str!("../seed/herd.json");

/// 搾乳記録を生成する日数（今日を含む）
const MILK_HISTORY_DAYS: i64 = 30;

/// 乳量のばらつき（±リットル）
const DAILY_VARIATION: f64 = 2.0;

/// 搾乳記録を泌乳期に紐づける牛とその分娩
const LINKED_COW: &str = "1";
const LINKED_BIRTH: &str = "2";

/// サンプルデータの供給元
///
/// 牛群は固定、搾乳記録は `today` から遡る30日分をシード付き乱数で生成するため、
/// 同じ日付とシードからは常に同じデータができる。
#[derive(Debug, Clone)]
pub struct SeedDataSource {
    today: NaiveDate,
    seed: u64,
}

impl SeedDataSource {
    pub const DEFAULT_SEED: u64 = 305;

    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            seed: Self::DEFAULT_SEED,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn snapshot(&self) -> Result<FarmSnapshot, StoreError> {
        let mut snapshot: FarmSnapshot = serde_json::from_str(HERD_JSON)?;
        snapshot.milk_records = self.milk_history(&snapshot.animals)?;
        Ok(snapshot)
    }

    /// 在籍中の雌牛ごとに1日1件の搾乳記録を生成する
    fn milk_history(&self, animals: &[Animal]) -> Result<Vec<MilkProductionRecord>, StoreError> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let cows: Vec<&Animal> = animals
            .iter()
            .filter(|a| a.is_female() && a.is_active())
            .collect();

        let mut records = Vec::with_capacity(cows.len() * MILK_HISTORY_DAYS as usize);
        for days_ago in 0..MILK_HISTORY_DAYS {
            let date = self.today - Duration::days(days_ago);
            for cow in &cows {
                let variation: f64 = rng.gen_range(-DAILY_VARIATION..DAILY_VARIATION);
                let base = base_production(cow.id.as_str(), days_ago);
                let birth_id = if cow.id.as_str() == LINKED_COW {
                    Some(BirthId::from_string(LINKED_BIRTH)?)
                } else {
                    None
                };

                records.push(MilkProductionRecord {
                    id: MilkRecordId::from_string(format!("{}-{}", cow.id, date))?,
                    animal_id: AnimalId::from_string(cow.id.as_str())?,
                    date,
                    liters: round_one_decimal((base + variation).max(0.0)),
                    birth_id,
                });
            }
        }

        debug!(records = records.len(), "サンプルの搾乳記録を生成しました");
        Ok(records)
    }
}

/// 牛ごとの泌乳段階を模した基準乳量
fn base_production(cow_id: &str, days_ago: i64) -> f64 {
    match cow_id {
        // 最盛期
        "1" => 28.0,
        // 泌乳初期（増加中）
        "2" => 22.0 + (days_ago % 7) as f64,
        // 泌乳後期（減少中）
        "4" => (20.0 - (days_ago % 8) as f64).max(12.0),
        // 泌乳中期（安定）
        "5" => 24.0,
        // 分娩直後
        "6" => 18.0 + (days_ago % 5) as f64,
        _ => 0.0,
    }
}

impl StateStore for SeedDataSource {
    async fn load_initial_state(&self) -> Result<FarmSnapshot, StoreError> {
        let snapshot = self.snapshot()?;
        info!(
            animals = snapshot.animals.len(),
            births = snapshot.births.len(),
            milk_records = snapshot.milk_records.len(),
            "サンプルデータを読み込みました"
        );
        Ok(snapshot)
    }

    /// メモリ上のみで動作するため保存はしない
    async fn save(&self, _snapshot: &FarmSnapshot) -> Result<(), StoreError> {
        debug!("保存先が設定されていないため保存をスキップします");
        Ok(())
    }
}
