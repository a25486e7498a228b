use crate::errors::DomainError;
use crate::identifiers::AnimalId;
use crate::milk::MilkProductionRecord;
use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// 期間別の生産量（リットル、小数第1位で丸め）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductionStats {
    pub daily: f64,
    pub weekly: f64,
    pub monthly: f64,
    pub annual: f64,
}

/// 日付ごとの合計
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total_liters: f64,
}

/// 動物ごとの合計
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimalTotal {
    pub animal_id: AnimalId,
    pub animal_name: String,
    pub total_liters: f64,
}

/// 搾乳記録一覧の表示期間（日数で遡る）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeRange {
    Last7Days,
    #[default]
    Last30Days,
    Last90Days,
    Last365Days,
}

impl TimeRange {
    pub fn days(&self) -> i64 {
        match self {
            TimeRange::Last7Days => 7,
            TimeRange::Last30Days => 30,
            TimeRange::Last90Days => 90,
            TimeRange::Last365Days => 365,
        }
    }

    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.days())
    }
}

/// レポートの集計期間（暦の月で遡る）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReportPeriod {
    #[default]
    Month,
    Quarter,
    Year,
}

impl ReportPeriod {
    pub fn from_string(period: &str) -> Result<Self, DomainError> {
        match period.to_lowercase().as_str() {
            "month" => Ok(ReportPeriod::Month),
            "quarter" => Ok(ReportPeriod::Quarter),
            "year" => Ok(ReportPeriod::Year),
            _ => Err(DomainError::Validation(format!(
                "Invalid report period: {period}"
            ))),
        }
    }

    pub fn months(&self) -> u32 {
        match self {
            ReportPeriod::Month => 1,
            ReportPeriod::Quarter => 3,
            ReportPeriod::Year => 12,
        }
    }

    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        months_before(now, self.months())
    }
}

/// 暦の上でNか月前（月末は有効な最終日に丸められる）
pub fn months_before(now: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// 小数第1位で丸める
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// 合計リットル（空のときは +0.0。`Sum` は -0.0 から始まる）
pub(crate) fn total_liters<'a>(records: impl Iterator<Item = &'a MilkProductionRecord>) -> f64 {
    records.fold(0.0, |total, r| total + r.liters)
}

/// 記録日が [start, end] に入る記録
pub fn records_between(
    records: &[MilkProductionRecord],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<MilkProductionRecord> {
    records
        .iter()
        .filter(|r| {
            let instant = r.instant();
            instant >= start && instant <= end
        })
        .cloned()
        .collect()
}

/// 日次・週次・月次・年次の生産量
///
/// 日次は `now` の日付と一致する記録、それ以外は `[now - 期間, now]` に入る記録の合計。
pub fn production_stats(records: &[MilkProductionRecord], now: DateTime<Utc>) -> ProductionStats {
    let today = now.date_naive();
    let within = |start: DateTime<Utc>| {
        total_liters(records.iter().filter(move |r| {
            let instant = r.instant();
            instant >= start && instant <= now
        }))
    };

    ProductionStats {
        daily: round_one_decimal(total_liters(records.iter().filter(|r| r.date == today))),
        weekly: round_one_decimal(within(now - Duration::days(7))),
        monthly: round_one_decimal(within(months_before(now, 1))),
        annual: round_one_decimal(within(months_before(now, 12))),
    }
}

/// 日付ごとに合計し、日付の昇順で返す
pub fn aggregate_by_date(records: &[MilkProductionRecord]) -> Vec<DailyTotal> {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for record in records {
        *totals.entry(record.date).or_insert(0.0) += record.liters;
    }
    totals
        .into_iter()
        .map(|(date, total_liters)| DailyTotal { date, total_liters })
        .collect()
}

/// 動物ごとに合計し、合計の降順で返す（同値は最初に現れた順）
pub fn aggregate_by_animal<F>(records: &[MilkProductionRecord], animal_name: F) -> Vec<AnimalTotal>
where
    F: Fn(&AnimalId) -> String,
{
    let mut index: HashMap<&AnimalId, usize> = HashMap::new();
    let mut totals: Vec<AnimalTotal> = Vec::new();

    for record in records {
        match index.get(&record.animal_id) {
            Some(&i) => totals[i].total_liters += record.liters,
            None => {
                index.insert(&record.animal_id, totals.len());
                totals.push(AnimalTotal {
                    animal_id: record.animal_id.clone(),
                    animal_name: animal_name(&record.animal_id),
                    total_liters: record.liters,
                });
            }
        }
    }

    totals.sort_by(|a, b| b.total_liters.total_cmp(&a.total_liters));
    totals
}
