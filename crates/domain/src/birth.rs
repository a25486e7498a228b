use crate::animal::{validate_non_negative, Gender};
use crate::errors::DomainError;
use crate::identifiers::{AnimalId, BirthId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 分娩の登録内容
///
/// 分娩番号は登録時に集約が母牛ごとに採番するため含まない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBirth {
    pub mother_id: AnimalId,
    pub date: NaiveDate,
    pub mother_weight: f64,
    pub calf_weight: f64,
    pub calf_gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calf_id: Option<AnimalId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father_id: Option<AnimalId>,
}

impl NewBirth {
    pub fn into_birth(self, id: BirthId, birth_number: u32) -> Birth {
        Birth {
            id,
            mother_id: self.mother_id,
            birth_number,
            date: self.date,
            mother_weight: self.mother_weight,
            calf_weight: self.calf_weight,
            calf_gender: self.calf_gender,
            calf_id: self.calf_id,
            father_id: self.father_id,
        }
    }
}

/// 分娩記録
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Birth {
    pub id: BirthId,
    pub mother_id: AnimalId,
    /// 母牛ごとの分娩番号（1始まり）
    pub birth_number: u32,
    pub date: NaiveDate,
    /// 分娩時の母牛体重（kg）
    pub mother_weight: f64,
    /// 子牛の体重（kg）
    pub calf_weight: f64,
    pub calf_gender: Gender,
    /// 子牛として登録された動物
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calf_id: Option<AnimalId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father_id: Option<AnimalId>,
}

impl Birth {
    /// 指定された動物を子牛または父親として参照しているか
    pub fn links_animal(&self, id: &AnimalId) -> bool {
        self.calf_id.as_ref() == Some(id) || self.father_id.as_ref() == Some(id)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.birth_number == 0 {
            return Err(DomainError::Validation(
                "birth_number must be positive".to_string(),
            ));
        }
        validate_non_negative("mother_weight", self.mother_weight)?;
        validate_non_negative("calf_weight", self.calf_weight)
    }
}
