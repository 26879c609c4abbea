use chrono::{NaiveDate, NaiveTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::aggregate::{aggregate, Aggregation};
use crate::error::ValidationError;
use crate::report::ReportHeader;
use crate::time_entry::{RawEntry, ValidEntry, DATE_FORMAT, TIME_FORMAT};

/// プロジェクトの開始日が未選択であることを表す値。
pub const UNSET_PROJECT_START: &str = "开始日期";
/// プロジェクトの終了日が未選択であることを表す値。
pub const UNSET_PROJECT_END: &str = "结束日期";

/// プロジェクト名をキーとしたプロジェクトの一覧。作成した順に並ぶ。
pub type ProjectMap = IndexMap<String, Project>;

/// 工数記録をまとめるプロジェクト。
///
/// 開始日と終了日は表示用の文字列で、前後関係は検証しない。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default = "default_start_date")]
    pub start_date: String,
    #[serde(default = "default_end_date")]
    pub end_date: String,
    #[serde(rename = "records", alias = "entries", default)]
    pub entries: Vec<RawEntry>,
}

fn default_start_date() -> String {
    UNSET_PROJECT_START.to_string()
}

fn default_end_date() -> String {
    UNSET_PROJECT_END.to_string()
}

impl Default for Project {
    fn default() -> Self {
        Self {
            start_date: default_start_date(),
            end_date: default_end_date(),
            entries: Vec::new(),
        }
    }
}

impl Project {
    /// 集計対象となる記録だけを返す。
    pub fn valid_entries(&self) -> Vec<ValidEntry> {
        self.entries.iter().filter_map(RawEntry::validate).collect()
    }

    /// 記録を集計する。
    pub fn aggregate(&self) -> Aggregation {
        aggregate(&self.valid_entries())
    }

    /// 帳票の見出しを返す。
    pub fn report_header<'a>(&'a self, name: &'a str) -> ReportHeader<'a> {
        ReportHeader {
            project_name: name,
            start_date: &self.start_date,
            end_date: &self.end_date,
        }
    }

    /// 記録を追加し、そのインデックスを返す。
    pub fn add_entry(&mut self, update: &EntryUpdate) -> usize {
        let mut entry = RawEntry::default();
        update.apply(&mut entry);
        self.entries.push(entry);
        self.entries.len() - 1
    }

    /// 最後の記録に単価を設定する。
    ///
    /// 記録がない場合は`false`を返す。
    pub fn apply_rate_to_last(&mut self, rate: f64) -> bool {
        match self.entries.last_mut() {
            Some(entry) => {
                EntryUpdate {
                    rate: Some(rate),
                    ..Default::default()
                }
                .apply(entry);
                true
            }
            None => false,
        }
    }
}

/// 記録の変更内容。`None`の項目は変更しない。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntryUpdate {
    pub date: Option<NaiveDate>,
    pub worker_id: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub overtime: Option<f64>,
    pub rate: Option<f64>,
}

impl EntryUpdate {
    /// 記録に変更を反映し、表示用の金額を再計算する。
    pub fn apply(&self, entry: &mut RawEntry) {
        if let Some(date) = self.date {
            entry.date = date.format(DATE_FORMAT).to_string();
        }
        if let Some(worker_id) = &self.worker_id {
            entry.worker_id = worker_id.trim().to_string();
        }
        if let Some(start_time) = self.start_time {
            entry.start_time = start_time.format(TIME_FORMAT).to_string();
        }
        if let Some(end_time) = self.end_time {
            entry.end_time = end_time.format(TIME_FORMAT).to_string();
        }
        if let Some(overtime) = self.overtime {
            entry.overtime = overtime.to_string();
        }
        if let Some(rate) = self.rate {
            entry.rate = rate.to_string();
        }
        entry.refresh_amount();
    }
}

/// 全プロジェクトを保持するアプリケーションの状態。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjectBook {
    projects: ProjectMap,
}

impl ProjectBook {
    /// 読み込んだプロジェクトから新しい`ProjectBook`を返す。
    pub fn new(projects: ProjectMap) -> Self {
        Self { projects }
    }

    /// 保存用のプロジェクト一覧を返す。
    pub fn projects(&self) -> &ProjectMap {
        &self.projects
    }

    /// プロジェクトが1件もないかどうか。
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// プロジェクトを作成し、前後の空白を除いた名前を返す。
    ///
    /// 名前が空、または既に存在する場合はエラーを返す。
    pub fn create(&mut self, name: &str) -> Result<String, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyProjectName);
        }
        if self.projects.contains_key(name) {
            return Err(ValidationError::DuplicateProject(name.to_string()));
        }

        self.projects.insert(name.to_string(), Project::default());
        Ok(name.to_string())
    }

    /// プロジェクトを取得する。
    pub fn get(&self, name: &str) -> Result<&Project, ValidationError> {
        self.projects
            .get(name)
            .ok_or_else(|| ValidationError::UnknownProject(name.to_string()))
    }

    /// 変更用にプロジェクトを取得する。
    pub fn get_mut(&mut self, name: &str) -> Result<&mut Project, ValidationError> {
        self.projects
            .get_mut(name)
            .ok_or_else(|| ValidationError::UnknownProject(name.to_string()))
    }

    /// 変更用に記録を取得する。
    pub fn entry_mut(&mut self, name: &str, index: usize) -> Result<&mut RawEntry, ValidationError> {
        let project = self.get_mut(name)?;
        let len = project.entries.len();
        project
            .entries
            .get_mut(index)
            .ok_or_else(|| ValidationError::EntryOutOfRange {
                project: name.to_string(),
                index,
                len,
            })
    }

    /// プロジェクトを作成した順に返す。
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Project)> {
        self.projects.iter()
    }
}
