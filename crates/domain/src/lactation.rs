use crate::birth::Birth;
use crate::identifiers::{AnimalId, BirthId};
use crate::milk::MilkProductionRecord;
use crate::stats::total_liters;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// 標準泌乳期間（日）
pub const LACTATION_DAYS: i64 = 305;

/// 泌乳曲線上の1点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LactationPoint {
    pub record: MilkProductionRecord,
    pub days_since_birth: i64,
}

/// 1回の分娩に対応する泌乳曲線
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LactationCurve {
    pub animal_id: AnimalId,
    pub birth_id: BirthId,
    pub birth_number: u32,
    pub points: Vec<LactationPoint>,
    pub total_liters: f64,
    /// 305日までの単純平均による見込み総量
    pub projected_total: f64,
    pub peak_liters: f64,
}

impl LactationCurve {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 泌乳期間が終わっていない（見込みが実績と異なる）か
    pub fn is_projected(&self) -> bool {
        self.projected_total != self.total_liters
    }
}

/// 泌乳期間の終了日（分娩日 + 305日、当日を含む）
pub fn lactation_end(birth_date: NaiveDate) -> NaiveDate {
    birth_date
        .checked_add_signed(Duration::days(LACTATION_DAYS))
        .unwrap_or(NaiveDate::MAX)
}

/// 分娩に紐づく搾乳記録から泌乳曲線を計算する
///
/// 対象は動物・分娩が一致し、記録日が泌乳期間内の記録のみ。
/// 見込み総量は「実績合計 + 記録あたり平均 × 残り日数」の線形推定で、
/// 最後の記録が305日目より前のときだけ計算する。
pub fn lactation_curve(
    animal_id: &AnimalId,
    birth: &Birth,
    records: &[MilkProductionRecord],
) -> LactationCurve {
    let start = birth.date;
    let end = lactation_end(start);

    let mut matching: Vec<&MilkProductionRecord> = records
        .iter()
        .filter(|r| {
            &r.animal_id == animal_id
                && r.birth_id.as_ref() == Some(&birth.id)
                && r.date >= start
                && r.date <= end
        })
        .collect();
    matching.sort_by_key(|r| r.date);

    let points: Vec<LactationPoint> = matching
        .into_iter()
        .map(|r| LactationPoint {
            days_since_birth: (r.date - start).num_days(),
            record: r.clone(),
        })
        .collect();

    let total_liters = total_liters(points.iter().map(|p| &p.record));
    let peak_liters = points
        .iter()
        .map(|p| p.record.liters)
        .fold(0.0_f64, f64::max);

    let projected_total = match points.last() {
        Some(last) if last.days_since_birth < LACTATION_DAYS => {
            let average = total_liters / points.len() as f64;
            total_liters + average * (LACTATION_DAYS - last.days_since_birth) as f64
        }
        _ => total_liters,
    };

    LactationCurve {
        animal_id: animal_id.clone(),
        birth_id: birth.id.clone(),
        birth_number: birth.birth_number,
        points,
        total_liters,
        projected_total,
        peak_liters,
    }
}
