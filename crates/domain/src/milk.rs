use crate::animal::validate_non_negative;
use crate::errors::DomainError;
use crate::identifiers::{AnimalId, BirthId, MilkRecordId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// 搾乳記録の登録内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMilkProductionRecord {
    pub animal_id: AnimalId,
    pub date: NaiveDate,
    pub liters: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_id: Option<BirthId>,
}

impl NewMilkProductionRecord {
    pub fn into_record(self, id: MilkRecordId) -> MilkProductionRecord {
        MilkProductionRecord {
            id,
            animal_id: self.animal_id,
            date: self.date,
            liters: self.liters,
            birth_id: self.birth_id,
        }
    }
}

/// 搾乳記録
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilkProductionRecord {
    pub id: MilkRecordId,
    pub animal_id: AnimalId,
    pub date: NaiveDate,
    pub liters: f64,
    /// 泌乳期を特定する分娩
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_id: Option<BirthId>,
}

impl MilkProductionRecord {
    /// 記録日をUTCの0時として扱った時刻
    pub fn instant(&self) -> DateTime<Utc> {
        date_start_utc(self.date)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        validate_non_negative("liters", self.liters)
    }
}

pub(crate) fn date_start_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}
