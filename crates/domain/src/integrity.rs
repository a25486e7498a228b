//! 削除前の参照整合性チェック
//!
//! 呼び出しのたびに現在のコレクションを走査する。依存関係のキャッシュは持たない。

use crate::animal::Animal;
use crate::birth::Birth;
use crate::errors::IntegrityReason;
use crate::identifiers::{AnimalId, BirthId};
use crate::milk::MilkProductionRecord;

/// 動物の削除を妨げる最初の依存関係を返す
///
/// 判定順: 搾乳記録 → 親としての参照 → 分娩記録（子牛・父親）
pub fn animal_dependency(
    animal_id: &AnimalId,
    animals: &[Animal],
    births: &[Birth],
    milk_records: &[MilkProductionRecord],
) -> Option<IntegrityReason> {
    if milk_records.iter().any(|r| &r.animal_id == animal_id) {
        return Some(IntegrityReason::HasMilkRecords);
    }
    if animals
        .iter()
        .any(|a| &a.id != animal_id && a.has_parent(animal_id))
    {
        return Some(IntegrityReason::IsParent);
    }
    if births.iter().any(|b| b.links_animal(animal_id)) {
        return Some(IntegrityReason::IsBirthLinked);
    }
    None
}

pub fn animal_has_dependents(
    animal_id: &AnimalId,
    animals: &[Animal],
    births: &[Birth],
    milk_records: &[MilkProductionRecord],
) -> bool {
    animal_dependency(animal_id, animals, births, milk_records).is_some()
}

pub fn birth_dependency(
    birth_id: &BirthId,
    milk_records: &[MilkProductionRecord],
) -> Option<IntegrityReason> {
    milk_records
        .iter()
        .any(|r| r.birth_id.as_ref() == Some(birth_id))
        .then_some(IntegrityReason::IsProductionLinked)
}

pub fn birth_has_dependents(birth_id: &BirthId, milk_records: &[MilkProductionRecord]) -> bool {
    birth_dependency(birth_id, milk_records).is_some()
}
