use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("Invalid AnimalId: {0}")]
    InvalidAnimalId(String),

    #[error("Invalid BirthId: {0}")]
    InvalidBirthId(String),

    #[error("Invalid MilkRecordId: {0}")]
    InvalidMilkRecordId(String),

    #[error("Invalid gender: {0}")]
    InvalidGender(String),

    #[error("Invalid animal status: {0}")]
    InvalidAnimalStatus(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// 集約が扱うエンティティの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Animal,
    Birth,
    MilkRecord,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Animal => "animal",
            EntityKind::Birth => "birth",
            EntityKind::MilkRecord => "milk record",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 削除を妨げている依存関係
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntegrityReason {
    /// 搾乳記録が動物を参照している
    HasMilkRecords,
    /// 他の動物の母親または父親として参照されている
    IsParent,
    /// 分娩記録の子牛または父親として参照されている
    IsBirthLinked,
    /// 搾乳記録が分娩を参照している
    IsProductionLinked,
}

impl IntegrityReason {
    pub fn code(&self) -> &'static str {
        match self {
            IntegrityReason::HasMilkRecords => "HAS_MILK_RECORDS",
            IntegrityReason::IsParent => "IS_PARENT",
            IntegrityReason::IsBirthLinked => "IS_BIRTH_LINKED",
            IntegrityReason::IsProductionLinked => "IS_PRODUCTION_LINKED",
        }
    }

    /// ユーザー向けの説明
    pub fn describe(&self) -> &'static str {
        match self {
            IntegrityReason::HasMilkRecords => "it has milk production records",
            IntegrityReason::IsParent => "it is registered as the mother or father of another animal",
            IntegrityReason::IsBirthLinked => "it is linked to a birth as calf or father",
            IntegrityReason::IsProductionLinked => "it is linked to milk production records",
        }
    }
}

impl fmt::Display for IntegrityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// 参照整合性違反で削除が拒否されたことを表す
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot delete {entity} {id}: {}", .reason.describe())]
pub struct IntegrityError {
    pub entity: EntityKind,
    pub id: String,
    pub reason: IntegrityReason,
}

impl IntegrityError {
    pub fn new(entity: EntityKind, id: impl Into<String>, reason: IntegrityReason) -> Self {
        Self {
            entity,
            id: id.into(),
            reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FarmError {
    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: String },

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Id generation failed: {0}")]
    IdGeneration(String),
}

impl FarmError {
    pub fn not_found(entity: EntityKind, id: impl Into<String>) -> Self {
        FarmError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// 整合性違反の理由を取得（整合性エラー以外は None）
    pub fn integrity_reason(&self) -> Option<IntegrityReason> {
        match self {
            FarmError::Integrity(e) => Some(e.reason),
            _ => None,
        }
    }
}

pub type FarmResult<T> = Result<T, FarmError>;
