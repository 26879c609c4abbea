use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Subcommand;
use log::info;

use crate::aggregate::Aggregation;
use crate::project::{Project, ProjectBook, ProjectMap};
use crate::store::ProjectStore;
use crate::time_entry::{parse_date, DATE_FORMAT};

/// `project`サブコマンドの引数を表す構造体。
#[derive(Debug, clap::Args)]
pub struct ProjectArgs {
    #[clap(subcommand)]
    pub action: ProjectAction,
}

/// プロジェクトに対する操作。
#[derive(Debug, Subcommand)]
pub enum ProjectAction {
    /// Create a new project
    New { name: String },
    /// List all projects
    List,
    /// Set the date range shown in the report
    Dates(DatesArgs),
    /// Show all entries and totals of a project
    Show { name: String },
}

/// `project dates`の引数。
#[derive(Debug, clap::Args)]
pub struct DatesArgs {
    pub name: String,

    #[clap(
        short = 's',
        long = "start",
        help = "Sets the start date in the format YYYY-MM-DD",
        parse(try_from_str = parse_date),
    )]
    pub start: Option<NaiveDate>,

    #[clap(
        short = 'e',
        long = "end",
        help = "Sets the end date in the format YYYY-MM-DD",
        parse(try_from_str = parse_date),
    )]
    pub end: Option<NaiveDate>,
}

pub struct ProjectCommand<'a, T: ProjectStore> {
    store: &'a T,
}

impl<'a, T: ProjectStore> ProjectCommand<'a, T> {
    /// 新しい`ProjectCommand`を返す。
    ///
    /// # Arguments
    /// * `store` - プロジェクトを永続化するストア
    pub fn new(store: &'a T) -> Self {
        Self { store }
    }

    /// プロジェクトを作成して保存する。
    ///
    /// 名前が空、または既に存在する場合は何も保存せずにエラーを返す。
    pub fn create(&self, name: &str) -> Result<String> {
        let mut book = ProjectBook::new(self.store.load_projects());
        let name = book.create(name)?;
        self.store
            .save_projects(book.projects())
            .with_context(|| format!("Failed to save new project: {}", name))?;
        info!("Project created: {}", name);

        Ok(name)
    }

    /// 全プロジェクトを返す。
    pub fn list(&self) -> ProjectMap {
        self.store.load_projects()
    }

    /// プロジェクトの日付範囲を設定する。
    pub fn set_dates(&self, args: DatesArgs) -> Result<()> {
        let mut book = ProjectBook::new(self.store.load_projects());
        let project = book.get_mut(&args.name)?;
        if let Some(start) = args.start {
            project.start_date = start.format(DATE_FORMAT).to_string();
        }
        if let Some(end) = args.end {
            project.end_date = end.format(DATE_FORMAT).to_string();
        }
        info!(
            "Date range of {}: {} - {}",
            args.name, project.start_date, project.end_date
        );

        self.store
            .save_projects(book.projects())
            .with_context(|| format!("Failed to save project: {}", args.name))
    }

    /// プロジェクトと、その集計結果を返す。
    pub fn show(&self, name: &str) -> Result<(Project, Aggregation)> {
        let book = ProjectBook::new(self.store.load_projects());
        let project = book.get(name)?.clone();
        let totals = project.aggregate();

        Ok((project, totals))
    }
}
