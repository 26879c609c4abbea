use anyhow::{Context, Result};
use clap::Subcommand;
use log::{info, warn};

use crate::error::ValidationError;
use crate::project::ProjectBook;
use crate::store::{ProjectStore, RatePresets};

/// `rate`サブコマンドの引数を表す構造体。
#[derive(Debug, clap::Args)]
pub struct RateArgs {
    #[clap(subcommand)]
    pub action: RateAction,
}

/// 単価の設定に対する操作。
#[derive(Debug, Subcommand)]
pub enum RateAction {
    /// List all rate presets
    List,
    /// Create or overwrite a rate preset
    Set { name: String, rate: f64 },
    /// Rename a rate preset and change its rate
    Update {
        old_name: String,
        new_name: String,
        rate: f64,
    },
    /// Remove a rate preset
    Remove { name: String },
    /// Apply a rate preset to the last entry of a project
    Apply { project: String, name: String },
}

pub struct RateCommand<'a, T: ProjectStore> {
    store: &'a T,
}

impl<'a, T: ProjectStore> RateCommand<'a, T> {
    /// 新しい`RateCommand`を返す。
    ///
    /// # Arguments
    /// * `store` - 単価の設定を永続化するストア
    pub fn new(store: &'a T) -> Self {
        Self { store }
    }

    /// 単価の設定を返す。
    pub fn list(&self) -> RatePresets {
        self.store.load_rates()
    }

    /// 単価を作成、または上書きする。
    pub fn set(&self, name: &str, rate: f64) -> Result<()> {
        let name = non_empty_name(name)?;
        let mut rates = self.store.load_rates();
        rates.insert(name.to_string(), rate);
        self.save(&rates)?;
        info!("Rate preset {} set to {}", name, rate);

        Ok(())
    }

    /// 単価の名前と値を変更する。
    ///
    /// 名前が変わった場合は古い名前を削除し、新しい名前を末尾に追加する。
    /// 名前が同じ場合は並び順を変えない。
    pub fn update(&self, old_name: &str, new_name: &str, rate: f64) -> Result<()> {
        let new_name = non_empty_name(new_name)?;
        let mut rates = self.store.load_rates();
        if !rates.contains_key(old_name) {
            return Err(ValidationError::UnknownRate(old_name.to_string()).into());
        }
        if old_name != new_name {
            rates.shift_remove(old_name);
        }
        rates.insert(new_name.to_string(), rate);
        self.save(&rates)?;
        info!("Rate preset {} updated to {}: {}", old_name, new_name, rate);

        Ok(())
    }

    /// 単価を削除する。
    pub fn remove(&self, name: &str) -> Result<()> {
        let mut rates = self.store.load_rates();
        if rates.shift_remove(name).is_none() {
            return Err(ValidationError::UnknownRate(name.to_string()).into());
        }
        self.save(&rates)?;
        info!("Rate preset {} removed", name);

        Ok(())
    }

    /// プロジェクトの最後の記録に単価を適用する。
    ///
    /// 記録がない場合は何もせず`false`を返す。
    pub fn apply(&self, project: &str, name: &str) -> Result<bool> {
        let rates = self.store.load_rates();
        let rate = *rates
            .get(name)
            .ok_or_else(|| ValidationError::UnknownRate(name.to_string()))?;

        let mut book = ProjectBook::new(self.store.load_projects());
        if !book.get_mut(project)?.apply_rate_to_last(rate) {
            warn!("Project {} has no entries to apply rate {} to", project, name);
            return Ok(false);
        }

        self.store
            .save_projects(book.projects())
            .with_context(|| format!("Failed to save project: {}", project))?;
        info!("Rate preset {} applied to the last entry of {}", name, project);

        Ok(true)
    }

    fn save(&self, rates: &RatePresets) -> Result<()> {
        self.store
            .save_rates(rates)
            .context("Failed to save rate presets")
    }
}

fn non_empty_name(name: &str) -> Result<&str, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyRateName);
    }

    Ok(name)
}
