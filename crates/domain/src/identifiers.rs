use crate::errors::{DomainError, FarmError};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $error:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// 文字列からIDを作成（空文字列はエラー）
            pub fn from_string(id: impl Into<String>) -> Result<Self, DomainError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(DomainError::$error(format!(
                        "{} cannot be empty",
                        stringify!($name)
                    )));
                }
                Ok(Self(id))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_string(s)
            }
        }
    };
}

string_id!(
    /// 動物ID
    AnimalId,
    InvalidAnimalId
);
string_id!(
    /// 分娩ID
    BirthId,
    InvalidBirthId
);
string_id!(
    /// 搾乳記録ID
    MilkRecordId,
    InvalidMilkRecordId
);

/// 新規レコードのID発行元
///
/// 一つのプロセスが動いている間、発行したIDが重複しないことを保証する。
pub trait IdGenerator: Send + Sync {
    fn next_id(&mut self) -> Result<String, FarmError>;
}

/// ULIDによるID発行（同一ミリ秒内でも単調増加）
pub struct UlidIdGenerator {
    inner: ulid::Generator,
}

impl UlidIdGenerator {
    pub fn new() -> Self {
        Self {
            inner: ulid::Generator::new(),
        }
    }
}

impl Default for UlidIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for UlidIdGenerator {
    fn next_id(&mut self) -> Result<String, FarmError> {
        self.inner
            .generate()
            .map(|ulid| ulid.to_string())
            .map_err(|e| FarmError::IdGeneration(e.to_string()))
    }
}

/// 連番によるID発行（テストや決定的なデータ生成用）
#[derive(Debug, Clone)]
pub struct SequentialIdGenerator {
    next: u64,
}

impl SequentialIdGenerator {
    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&mut self) -> Result<String, FarmError> {
        let id = self.next;
        self.next = self
            .next
            .checked_add(1)
            .ok_or_else(|| FarmError::IdGeneration("sequence exhausted".to_string()))?;
        Ok(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_id_from_string() {
        let id = AnimalId::from_string("42").unwrap();
        assert_eq!(id.as_str(), "42");
        assert_eq!(id.to_string(), "42");

        // 空文字列はエラー
        assert!(matches!(
            AnimalId::from_string(""),
            Err(DomainError::InvalidAnimalId(_))
        ));
        assert!(BirthId::from_string("  ").is_err());
        assert!("7".parse::<MilkRecordId>().is_ok());
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let id = BirthId::from_string("b-1").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"b-1\"");
    }

    #[test]
    fn test_ulid_generator_is_unique() {
        let mut generator = UlidIdGenerator::new();
        let ids: HashSet<String> = (0..1000).map(|_| generator.next_id().unwrap()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_sequential_generator() {
        let mut generator = SequentialIdGenerator::starting_at(8);
        assert_eq!(generator.next_id().unwrap(), "8");
        assert_eq!(generator.next_id().unwrap(), "9");
    }
}
