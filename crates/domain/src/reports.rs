use crate::animal::{Animal, AnimalStatus, Gender};
use crate::birth::Birth;
use crate::farm::FarmAggregate;
use crate::identifiers::{AnimalId, BirthId};
use crate::milk::MilkProductionRecord;
use crate::stats::{
    self, AnimalTotal, DailyTotal, ProductionStats, ReportPeriod, TimeRange,
};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// ダッシュボードに表示する最近の分娩の件数
pub const RECENT_BIRTHS_LIMIT: usize = 5;

/// レポートに表示する上位生産牛の件数
pub const TOP_PRODUCERS_LIMIT: usize = 5;

/// 在庫一覧のタブ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnimalTab {
    #[default]
    All,
    /// 雌のみ
    Cows,
    /// 雄のみ
    Bulls,
}

impl AnimalTab {
    fn matches(&self, gender: Gender) -> bool {
        match self {
            AnimalTab::All => true,
            AnimalTab::Cows => gender == Gender::Female,
            AnimalTab::Bulls => gender == Gender::Male,
        }
    }
}

/// 動物一覧の絞り込み条件
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimalFilter {
    /// 名前またはコードの部分一致（大文字小文字を区別しない）
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub status: Option<AnimalStatus>,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default)]
    pub tab: AnimalTab,
}

/// 分娩一覧の絞り込み条件（母牛名または子牛名の部分一致）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BirthFilter {
    #[serde(default)]
    pub search: String,
}

/// 搾乳記録一覧の絞り込み条件
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionFilter {
    /// 動物名の部分一致
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub animal_id: Option<AnimalId>,
    #[serde(default)]
    pub range: TimeRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCount {
    /// 1 = 1月 … 12 = 12月
    pub month: u32,
    pub count: usize,
}

/// 牛群と分娩のレポート
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HerdReport {
    pub animals_by_breed: Vec<CategoryCount>,
    pub animals_by_gender: Vec<CategoryCount>,
    pub active_animals: usize,
    /// 在籍中の雌（搾乳対象）
    pub cows_in_production: usize,
    pub bulls: usize,
    pub total_births: usize,
    pub births_by_month: Vec<MonthlyCount>,
    pub male_calves: usize,
    pub female_calves: usize,
}

/// 生産量レポート
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionReport {
    pub period: ReportPeriod,
    pub stats: ProductionStats,
    pub trend: Vec<DailyTotal>,
    pub top_producers: Vec<AnimalTotal>,
}

/// ダッシュボード
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub active_animals: usize,
    pub total_births: usize,
    pub production: ProductionStats,
    pub recent_births: Vec<Birth>,
    pub trend: Vec<DailyTotal>,
}

/// 親子関係の性別の不整合（登録時には拒否しない）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParentageIssue {
    MotherNotFemale {
        animal_id: AnimalId,
        mother_id: AnimalId,
    },
    FatherNotMale {
        animal_id: AnimalId,
        father_id: AnimalId,
    },
    BirthFatherNotMale {
        birth_id: BirthId,
        father_id: AnimalId,
    },
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// 最初に現れた順を保ったまま件数を数える
fn count_by<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<CategoryCount> {
    let mut counts: Vec<CategoryCount> = Vec::new();
    for label in labels {
        match counts.iter_mut().find(|c| c.label == label) {
            Some(c) => c.count += 1,
            None => counts.push(CategoryCount {
                label: label.to_string(),
                count: 1,
            }),
        }
    }
    counts
}

impl FarmAggregate {
    pub fn filter_animals(&self, filter: &AnimalFilter) -> Vec<Animal> {
        self.animals
            .iter()
            .filter(|a| {
                (contains_ignore_case(&a.name, &filter.search)
                    || contains_ignore_case(&a.code, &filter.search))
                    && filter.gender.map_or(true, |g| a.gender == g)
                    && filter.status.map_or(true, |s| a.status == s)
                    && filter.breed.as_ref().map_or(true, |b| &a.breed == b)
                    && filter.tab.matches(a.gender)
            })
            .cloned()
            .collect()
    }

    pub fn filter_births(&self, filter: &BirthFilter) -> Vec<Birth> {
        self.births
            .iter()
            .filter(|b| {
                contains_ignore_case(&self.animal_name(Some(&b.mother_id)), &filter.search)
                    || contains_ignore_case(&self.animal_name(b.calf_id.as_ref()), &filter.search)
            })
            .cloned()
            .collect()
    }

    /// 期間・動物・名前で絞り込んだ搾乳記録（日付の降順）
    pub fn filter_production(&self, filter: &ProductionFilter) -> Vec<MilkProductionRecord> {
        let now = self.now();
        let mut records: Vec<MilkProductionRecord> =
            stats::records_between(&self.milk_records, filter.range.start(now), now)
                .into_iter()
                .filter(|r| {
                    filter.animal_id.as_ref().map_or(true, |id| &r.animal_id == id)
                        && contains_ignore_case(&self.animal_name(Some(&r.animal_id)), &filter.search)
                })
                .collect();
        records.sort_by(|a, b| b.date.cmp(&a.date));
        records
    }

    /// 分娩記録の子牛として選べる動物（分娩日以降に生まれ、性別が一致）
    pub fn candidate_calves(&self, birth_date: NaiveDate, calf_gender: Gender) -> Vec<Animal> {
        self.animals
            .iter()
            .filter(|a| a.birth_date >= birth_date && a.gender == calf_gender)
            .cloned()
            .collect()
    }

    /// 日付の新しい順に分娩を返す
    pub fn recent_births(&self, limit: usize) -> Vec<Birth> {
        let mut births = self.births.clone();
        births.sort_by(|a, b| b.date.cmp(&a.date));
        births.truncate(limit);
        births
    }

    pub fn herd_report(&self) -> HerdReport {
        let mut births_by_month: Vec<MonthlyCount> = (1..=12)
            .map(|month| MonthlyCount { month, count: 0 })
            .collect();
        for birth in &self.births {
            births_by_month[birth.date.month0() as usize].count += 1;
        }

        HerdReport {
            animals_by_breed: count_by(self.animals.iter().map(|a| a.breed.as_str())),
            animals_by_gender: count_by(self.animals.iter().map(|a| a.gender.as_str())),
            active_animals: self.active_animal_count(),
            cows_in_production: self
                .animals
                .iter()
                .filter(|a| a.is_female() && a.is_active())
                .count(),
            bulls: self
                .animals
                .iter()
                .filter(|a| a.gender == Gender::Male)
                .count(),
            total_births: self.total_births(),
            births_by_month,
            male_calves: self
                .births
                .iter()
                .filter(|b| b.calf_gender == Gender::Male)
                .count(),
            female_calves: self
                .births
                .iter()
                .filter(|b| b.calf_gender == Gender::Female)
                .count(),
        }
    }

    /// 集計期間内の推移と上位生産牛
    pub fn production_report(&self, period: ReportPeriod) -> ProductionReport {
        let now = self.now();
        let records = stats::records_between(&self.milk_records, period.start(now), now);
        let mut top_producers = self.aggregate_by_animal(&records);
        top_producers.truncate(TOP_PRODUCERS_LIMIT);

        ProductionReport {
            period,
            stats: self.production_stats_at(now),
            trend: self.aggregate_by_date(&records),
            top_producers,
        }
    }

    pub fn dashboard(&self) -> Dashboard {
        let now = self.now();
        let recent =
            stats::records_between(&self.milk_records, TimeRange::Last30Days.start(now), now);

        Dashboard {
            active_animals: self.active_animal_count(),
            total_births: self.total_births(),
            production: self.production_stats_at(now),
            recent_births: self.recent_births(RECENT_BIRTHS_LIMIT),
            trend: self.aggregate_by_date(&recent),
        }
    }

    /// 参照先が存在し、かつ性別が合わない親子関係を列挙する
    pub fn parentage_issues(&self) -> Vec<ParentageIssue> {
        let mut issues = Vec::new();
        let gender_of = |id: &AnimalId| self.animal_by_id(id).map(|a| a.gender);

        for animal in &self.animals {
            if let Some(mother_id) = &animal.mother_id {
                if gender_of(mother_id) == Some(Gender::Male) {
                    issues.push(ParentageIssue::MotherNotFemale {
                        animal_id: animal.id.clone(),
                        mother_id: mother_id.clone(),
                    });
                }
            }
            if let Some(father_id) = &animal.father_id {
                if gender_of(father_id) == Some(Gender::Female) {
                    issues.push(ParentageIssue::FatherNotMale {
                        animal_id: animal.id.clone(),
                        father_id: father_id.clone(),
                    });
                }
            }
        }

        for birth in &self.births {
            if let Some(father_id) = &birth.father_id {
                if gender_of(father_id) == Some(Gender::Female) {
                    issues.push(ParentageIssue::BirthFatherNotMale {
                        birth_id: birth.id.clone(),
                        father_id: father_id.clone(),
                    });
                }
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::farm::FarmSnapshot;
    use crate::identifiers::MilkRecordId;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn animal(id: &str, name: &str, breed: &str, gender: Gender, status: AnimalStatus) -> Animal {
        Animal {
            id: AnimalId::from_string(id).unwrap(),
            name: name.to_string(),
            code: format!("VC{id:0>3}"),
            breed: breed.to_string(),
            gender,
            birth_date: date(2020, 1, 1),
            status,
            mother_id: None,
            father_id: None,
            notes: None,
            image_url: None,
        }
    }

    fn birth(id: &str, mother: &str, on: NaiveDate, calf_gender: Gender) -> Birth {
        Birth {
            id: BirthId::from_string(id).unwrap(),
            mother_id: AnimalId::from_string(mother).unwrap(),
            birth_number: 1,
            date: on,
            mother_weight: 500.0,
            calf_weight: 35.0,
            calf_gender,
            calf_id: None,
            father_id: None,
        }
    }

    fn record(id: &str, animal: &str, on: NaiveDate, liters: f64) -> MilkProductionRecord {
        MilkProductionRecord {
            id: MilkRecordId::from_string(id).unwrap(),
            animal_id: AnimalId::from_string(animal).unwrap(),
            date: on,
            liters,
            birth_id: None,
        }
    }

    fn farm() -> FarmAggregate {
        let snapshot = FarmSnapshot {
            animals: vec![
                animal("1", "Lucero", "Holstein", Gender::Female, AnimalStatus::Active),
                animal("2", "Estrella", "Jersey", Gender::Female, AnimalStatus::Active),
                animal("3", "Roble", "Holstein", Gender::Male, AnimalStatus::Active),
                animal("7", "Trueno", "Jersey", Gender::Male, AnimalStatus::Sold),
            ],
            births: vec![
                birth("1", "1", date(2022, 5, 20), Gender::Female),
                birth("2", "1", date(2023, 6, 15), Gender::Female),
                birth("3", "2", date(2022, 2, 10), Gender::Male),
                birth("4", "5", date(2021, 4, 25), Gender::Female),
                birth("5", "2", date(2023, 5, 2), Gender::Male),
                birth("6", "2", date(2020, 5, 2), Gender::Male),
            ],
            milk_records: vec![
                record("m1", "1", date(2024, 3, 9), 28.0),
                record("m2", "2", date(2024, 3, 9), 22.0),
                record("m3", "1", date(2024, 3, 1), 27.5),
                record("m4", "2", date(2024, 1, 15), 40.0),
                record("m5", "2", date(2023, 1, 15), 40.0),
            ],
        };
        FarmAggregate::new(snapshot).with_clock(Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap(),
        )))
    }

    #[test]
    fn test_filter_animals() {
        let farm = farm();

        let by_code = farm.filter_animals(&AnimalFilter {
            search: "vc002".to_string(),
            ..Default::default()
        });
        assert_eq!(by_code.len(), 1);
        assert_eq!(by_code[0].name, "Estrella");

        let bulls = farm.filter_animals(&AnimalFilter {
            tab: AnimalTab::Bulls,
            status: Some(AnimalStatus::Active),
            ..Default::default()
        });
        assert_eq!(bulls.len(), 1);
        assert_eq!(bulls[0].name, "Roble");

        let jerseys = farm.filter_animals(&AnimalFilter {
            breed: Some("Jersey".to_string()),
            ..Default::default()
        });
        assert_eq!(jerseys.len(), 2);
    }

    #[test]
    fn test_filter_births_by_mother_name() {
        let farm = farm();
        let births = farm.filter_births(&BirthFilter {
            search: "ESTRE".to_string(),
        });
        assert_eq!(births.len(), 3);

        // 未登録の母牛は "N/A" として検索される
        let births = farm.filter_births(&BirthFilter {
            search: "n/a".to_string(),
        });
        assert!(births.iter().any(|b| b.id.as_str() == "4"));
    }

    #[test]
    fn test_filter_production() {
        let farm = farm();
        let records = farm.filter_production(&ProductionFilter {
            range: TimeRange::Last7Days,
            ..Default::default()
        });
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2"]);

        let records = farm.filter_production(&ProductionFilter {
            search: "luc".to_string(),
            range: TimeRange::Last30Days,
            ..Default::default()
        });
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m3"]);

        let records = farm.filter_production(&ProductionFilter {
            animal_id: Some(AnimalId::from_string("2").unwrap()),
            range: TimeRange::Last90Days,
            ..Default::default()
        });
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_recent_births() {
        let farm = farm();
        let recent = farm.recent_births(RECENT_BIRTHS_LIMIT);
        let ids: Vec<&str> = recent.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "5", "1", "3", "4"]);
    }

    #[test]
    fn test_herd_report() {
        let report = farm().herd_report();

        assert_eq!(
            report.animals_by_breed,
            vec![
                CategoryCount {
                    label: "Holstein".to_string(),
                    count: 2
                },
                CategoryCount {
                    label: "Jersey".to_string(),
                    count: 2
                },
            ]
        );
        assert_eq!(report.active_animals, 3);
        assert_eq!(report.cows_in_production, 2);
        assert_eq!(report.bulls, 2);
        assert_eq!(report.total_births, 6);
        assert_eq!(report.births_by_month.len(), 12);
        assert_eq!(report.births_by_month[4].count, 3); // 5月
        assert_eq!(report.births_by_month[0].count, 0);
        assert_eq!(report.male_calves, 3);
        assert_eq!(report.female_calves, 3);
    }

    #[test]
    fn test_production_report() {
        let farm = farm();
        let report = farm.production_report(ReportPeriod::Quarter);

        assert_eq!(report.trend.len(), 3);
        assert_eq!(report.top_producers[0].animal_name, "Estrella");
        assert_eq!(report.top_producers[0].total_liters, 62.0);
        assert_eq!(report.top_producers[1].total_liters, 55.5);

        let report = farm.production_report(ReportPeriod::Month);
        assert_eq!(report.trend.len(), 2);
    }

    #[test]
    fn test_dashboard() {
        let dashboard = farm().dashboard();
        assert_eq!(dashboard.active_animals, 3);
        assert_eq!(dashboard.total_births, 6);
        assert_eq!(dashboard.production.daily, 0.0);
        assert_eq!(dashboard.production.weekly, 50.0);
        assert_eq!(dashboard.recent_births.len(), RECENT_BIRTHS_LIMIT);
        assert_eq!(dashboard.trend.len(), 2);
    }

    #[test]
    fn test_candidate_calves() {
        let farm = farm();
        let calves = farm.candidate_calves(date(2019, 12, 1), Gender::Male);
        assert_eq!(calves.len(), 2);
        assert!(farm.candidate_calves(date(2020, 1, 2), Gender::Male).is_empty());
    }

    #[test]
    fn test_parentage_issues() {
        let mut snapshot = farm().snapshot();
        snapshot.animals[1].mother_id = Some(AnimalId::from_string("3").unwrap());
        snapshot.animals[1].father_id = Some(AnimalId::from_string("404").unwrap());
        snapshot.births[0].father_id = Some(AnimalId::from_string("2").unwrap());
        let farm = FarmAggregate::new(snapshot);

        let issues = farm.parentage_issues();
        assert_eq!(
            issues,
            vec![
                ParentageIssue::MotherNotFemale {
                    animal_id: AnimalId::from_string("2").unwrap(),
                    mother_id: AnimalId::from_string("3").unwrap(),
                },
                ParentageIssue::BirthFatherNotMale {
                    birth_id: BirthId::from_string("1").unwrap(),
                    father_id: AnimalId::from_string("2").unwrap(),
                },
            ]
        );
    }
}
