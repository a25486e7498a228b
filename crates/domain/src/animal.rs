use crate::errors::DomainError;
use crate::identifiers::AnimalId;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 性別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn from_string(gender: &str) -> Result<Self, DomainError> {
        match gender.to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            _ => Err(DomainError::InvalidGender(format!("Invalid gender: {gender}"))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 在籍状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimalStatus {
    Active,
    Sold,
}

impl AnimalStatus {
    pub fn from_string(status: &str) -> Result<Self, DomainError> {
        match status.to_lowercase().as_str() {
            "active" => Ok(AnimalStatus::Active),
            "sold" => Ok(AnimalStatus::Sold),
            _ => Err(DomainError::InvalidAnimalStatus(format!(
                "Invalid status: {status}"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnimalStatus::Active => "Active",
            AnimalStatus::Sold => "Sold",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, AnimalStatus::Active)
    }
}

impl fmt::Display for AnimalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 動物の登録内容（ID以外の全項目）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAnimal {
    pub name: String,
    /// 耳標などの農場内コード（一意性は保証しない）
    pub code: String,
    pub breed: String,
    pub gender: Gender,
    pub birth_date: NaiveDate,
    pub status: AnimalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mother_id: Option<AnimalId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father_id: Option<AnimalId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl NewAnimal {
    pub fn into_animal(self, id: AnimalId) -> Animal {
        Animal {
            id,
            name: self.name,
            code: self.code,
            breed: self.breed,
            gender: self.gender,
            birth_date: self.birth_date,
            status: self.status,
            mother_id: self.mother_id,
            father_id: self.father_id,
            notes: self.notes,
            image_url: self.image_url,
        }
    }
}

/// 動物
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Animal {
    pub id: AnimalId,
    pub name: String,
    pub code: String,
    pub breed: String,
    pub gender: Gender,
    pub birth_date: NaiveDate,
    pub status: AnimalStatus,
    /// 母親（参照のみ。存在しなくてもよい）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mother_id: Option<AnimalId>,
    /// 父親（参照のみ。存在しなくてもよい）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father_id: Option<AnimalId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Animal {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn is_female(&self) -> bool {
        self.gender == Gender::Female
    }

    /// 指定された動物IDを母親または父親として参照しているか
    pub fn has_parent(&self, id: &AnimalId) -> bool {
        self.mother_id.as_ref() == Some(id) || self.father_id.as_ref() == Some(id)
    }

    /// 満年齢（今年の誕生日前なら1歳引く）
    pub fn age_in_years(&self, today: NaiveDate) -> i32 {
        let mut years = today.year() - self.birth_date.year();
        let before_birthday = today.month() < self.birth_date.month()
            || (today.month() == self.birth_date.month() && today.day() < self.birth_date.day());
        if before_birthday {
            years -= 1;
        }
        years
    }

    /// 必須項目の検証
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_required("name", &self.name)?;
        validate_required("code", &self.code)?;
        validate_required("breed", &self.breed)
    }
}

pub(crate) fn validate_required(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

pub(crate) fn validate_non_negative(field: &str, value: f64) -> Result<(), DomainError> {
    if !value.is_finite() || value < 0.0 {
        return Err(DomainError::Validation(format!(
            "{field} must be a non-negative number, got {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_animal() -> Animal {
        Animal {
            id: AnimalId::from_string("1").unwrap(),
            name: "Lucero".to_string(),
            code: "VC001".to_string(),
            breed: "Holstein".to_string(),
            gender: Gender::Female,
            birth_date: NaiveDate::from_ymd_opt(2020, 4, 15).unwrap(),
            status: AnimalStatus::Active,
            mother_id: None,
            father_id: Some(AnimalId::from_string("3").unwrap()),
            notes: None,
            image_url: None,
        }
    }

    #[test]
    fn test_gender_from_string() {
        assert_eq!(Gender::from_string("female").unwrap(), Gender::Female);
        assert_eq!(Gender::from_string("MALE").unwrap(), Gender::Male);
        assert!(Gender::from_string("cow").is_err());
    }

    #[test]
    fn test_status_from_string() {
        assert_eq!(AnimalStatus::from_string("Sold").unwrap(), AnimalStatus::Sold);
        assert!(AnimalStatus::from_string("Active").unwrap().is_active());
        assert!(AnimalStatus::from_string("lost").is_err());
    }

    #[test]
    fn test_age_in_years() {
        let animal = sample_animal();
        // 誕生日の前日
        assert_eq!(
            animal.age_in_years(NaiveDate::from_ymd_opt(2024, 4, 14).unwrap()),
            3
        );
        assert_eq!(
            animal.age_in_years(NaiveDate::from_ymd_opt(2024, 4, 15).unwrap()),
            4
        );
    }

    #[test]
    fn test_validate_required_fields() {
        let mut animal = sample_animal();
        assert!(animal.validate().is_ok());

        animal.breed = "  ".to_string();
        assert!(matches!(animal.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_has_parent() {
        let animal = sample_animal();
        assert!(animal.has_parent(&AnimalId::from_string("3").unwrap()));
        assert!(!animal.has_parent(&AnimalId::from_string("5").unwrap()));
    }

    #[test]
    fn test_animal_json_shape() {
        let json = serde_json::to_value(sample_animal()).unwrap();
        assert_eq!(json["birthDate"], "2020-04-15");
        assert_eq!(json["gender"], "Female");
        assert_eq!(json["fatherId"], "3");
        assert!(json.get("motherId").is_none());
    }
}
