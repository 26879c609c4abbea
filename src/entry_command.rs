use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use clap::Subcommand;
use log::info;

use crate::error::ValidationError;
use crate::project::{EntryUpdate, ProjectBook};
use crate::store::{ProjectStore, RatePresets};
use crate::time_entry::{parse_date, parse_time};

/// `entry`サブコマンドの引数を表す構造体。
#[derive(Debug, clap::Args)]
pub struct EntryArgs {
    #[clap(subcommand)]
    pub action: EntryAction,
}

/// 記録に対する操作。
#[derive(Debug, Subcommand)]
pub enum EntryAction {
    /// Append an entry to a project
    Add(AddArgs),
    /// Change fields of an existing entry
    Edit(EditArgs),
}

/// `entry add`の引数。
#[derive(Debug, clap::Args)]
pub struct AddArgs {
    pub project: String,

    #[clap(flatten)]
    pub fields: EntryFields,
}

/// `entry edit`の引数。
#[derive(Debug, clap::Args)]
pub struct EditArgs {
    pub project: String,

    #[clap(help = "Index of the entry as shown by `project show`")]
    pub index: usize,

    #[clap(flatten)]
    pub fields: EntryFields,
}

/// 記録の各項目。指定しなかった項目は変更しない。
#[derive(Debug, Default, clap::Args)]
pub struct EntryFields {
    #[clap(
        short = 'd',
        long = "date",
        help = "Sets the date in the format YYYY-MM-DD",
        parse(try_from_str = parse_date),
    )]
    pub date: Option<NaiveDate>,

    #[clap(short = 'w', long = "worker", help = "Sets the plate number or worker name")]
    pub worker: Option<String>,

    #[clap(
        short = 's',
        long = "start",
        help = "Sets the start time in the format HH:MM:SS",
        parse(try_from_str = parse_time),
    )]
    pub start: Option<NaiveTime>,

    #[clap(
        short = 'e',
        long = "end",
        help = "Sets the end time in the format HH:MM:SS",
        parse(try_from_str = parse_time),
    )]
    pub end: Option<NaiveTime>,

    #[clap(short = 'o', long = "overtime", help = "Sets the overtime in hours")]
    pub overtime: Option<f64>,

    #[clap(
        short = 'r',
        long = "rate",
        help = "Sets the hourly rate",
        conflicts_with = "preset"
    )]
    pub rate: Option<f64>,

    #[clap(short = 'p', long = "preset", help = "Takes the rate from a saved preset")]
    pub preset: Option<String>,
}

impl EntryFields {
    /// 記録の変更内容に変換する。
    ///
    /// 単価のプリセットが見つからない場合はエラーを返す。
    fn to_update(&self, rates: &RatePresets) -> Result<EntryUpdate, ValidationError> {
        let rate = match &self.preset {
            Some(name) => Some(
                *rates
                    .get(name)
                    .ok_or_else(|| ValidationError::UnknownRate(name.clone()))?,
            ),
            None => self.rate,
        };

        Ok(EntryUpdate {
            date: self.date,
            worker_id: self.worker.clone(),
            start_time: self.start,
            end_time: self.end,
            overtime: self.overtime,
            rate,
        })
    }
}

pub struct EntryCommand<'a, T: ProjectStore> {
    store: &'a T,
}

impl<'a, T: ProjectStore> EntryCommand<'a, T> {
    /// 新しい`EntryCommand`を返す。
    ///
    /// # Arguments
    /// * `store` - プロジェクトを永続化するストア
    pub fn new(store: &'a T) -> Self {
        Self { store }
    }

    /// 記録を追加して保存し、追加した記録のインデックスを返す。
    pub fn add(&self, args: AddArgs) -> Result<usize> {
        let update = args.fields.to_update(&self.rates_for(&args.fields))?;
        let mut book = ProjectBook::new(self.store.load_projects());
        let index = book.get_mut(&args.project)?.add_entry(&update);

        self.store
            .save_projects(book.projects())
            .with_context(|| format!("Failed to save project: {}", args.project))?;
        info!("Entry {} added to {}", index, args.project);

        Ok(index)
    }

    /// 記録を変更して保存する。
    pub fn edit(&self, args: EditArgs) -> Result<()> {
        let update = args.fields.to_update(&self.rates_for(&args.fields))?;
        let mut book = ProjectBook::new(self.store.load_projects());
        update.apply(book.entry_mut(&args.project, args.index)?);

        self.store
            .save_projects(book.projects())
            .with_context(|| format!("Failed to save project: {}", args.project))?;
        info!("Entry {} of {} updated", args.index, args.project);

        Ok(())
    }

    /// プリセットを指定した場合だけ単価の設定を読み込む。
    fn rates_for(&self, fields: &EntryFields) -> RatePresets {
        if fields.preset.is_some() {
            self.store.load_rates()
        } else {
            RatePresets::new()
        }
    }
}
