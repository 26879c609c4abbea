use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;

use crate::time_entry::ValidEntry;

/// 車両/作業者ごとの集計結果。
#[derive(Clone, Debug, PartialEq)]
pub struct GroupSummary {
    pub worker_id: String,
    pub distinct_dates: BTreeSet<NaiveDate>,
    pub total_hours: f64,
    pub total_amount: f64,
    pub entries: Vec<ValidEntry>,
}

impl GroupSummary {
    fn new(worker_id: &str) -> Self {
        Self {
            worker_id: worker_id.to_string(),
            distinct_dates: BTreeSet::new(),
            total_hours: 0.0,
            total_amount: 0.0,
            entries: Vec::new(),
        }
    }
}

/// プロジェクト全体の集計結果。
///
/// `groups`は車両/作業者が最初に現れた順に並ぶ。
#[derive(Clone, Debug, PartialEq)]
pub struct Aggregation {
    pub groups: Vec<GroupSummary>,
    pub total_hours: f64,
    pub total_amount: f64,
    /// 全記録の日付の和集合の要素数。グループごとの日数の合計ではない。
    pub distinct_days: usize,
}

impl Aggregation {
    /// グループ数を返す。
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

/// 検証済みの記録を車両/作業者ごとに集計する。
///
/// 合計は丸めずに加算する。丸めは表示時にのみ行う。
///
/// # Arguments
///
/// * `entries` - 集計する記録
pub fn aggregate(entries: &[ValidEntry]) -> Aggregation {
    let mut groups: Vec<GroupSummary> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut all_dates = BTreeSet::new();

    for entry in entries {
        let position = *positions
            .entry(entry.worker_id.as_str())
            .or_insert_with(|| {
                groups.push(GroupSummary::new(&entry.worker_id));
                groups.len() - 1
            });
        let group = &mut groups[position];
        group.distinct_dates.insert(entry.date);
        group.total_hours += entry.total_hours();
        group.total_amount += entry.amount();
        group.entries.push(entry.clone());

        all_dates.insert(entry.date);
    }

    let total_hours = groups.iter().map(|group| group.total_hours).sum();
    let total_amount = groups.iter().map(|group| group.total_amount).sum();

    Aggregation {
        groups,
        total_hours,
        total_amount,
        distinct_days: all_dates.len(),
    }
}
