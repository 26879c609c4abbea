use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::{debug, info, warn};
#[cfg(test)]
use mockall::automock;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::project::ProjectMap;

/// プロジェクトを保存するファイル名。
pub const PROJECTS_FILE: &str = "projects.json";
/// 単価の設定を保存するファイル名。
pub const RATES_FILE: &str = "rate_settings.json";

/// 名前をキーとした単価の設定。登録した順に並ぶ。
pub type RatePresets = IndexMap<String, f64>;

/// プロジェクトと単価の設定を永続化するためのtrait。
///
/// 読み込みに失敗した場合は空として扱い、呼び出し元にはエラーを返さない。
#[cfg_attr(test, automock)]
pub trait ProjectStore {
    /// 全プロジェクトを読み込む。
    fn load_projects(&self) -> ProjectMap;

    /// 全プロジェクトを保存する。
    fn save_projects(&self, projects: &ProjectMap) -> Result<()>;

    /// 単価の設定を読み込む。
    fn load_rates(&self) -> RatePresets;

    /// 単価の設定を保存する。
    fn save_rates(&self, rates: &RatePresets) -> Result<()>;
}

/// JSONファイルに保存する`ProjectStore`。
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    /// 新しい`JsonFileStore`を返す。
    ///
    /// # Arguments
    ///
    /// * `data_dir` - JSONファイルを保存するディレクトリ
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn path(&self, file_name: &str) -> PathBuf {
        self.data_dir.join(file_name)
    }
}

impl ProjectStore for JsonFileStore {
    fn load_projects(&self) -> ProjectMap {
        load_or_default(&self.path(PROJECTS_FILE))
    }

    fn save_projects(&self, projects: &ProjectMap) -> Result<()> {
        save_json(&self.path(PROJECTS_FILE), projects).context("Failed to save projects")
    }

    fn load_rates(&self) -> RatePresets {
        load_or_default(&self.path(RATES_FILE))
    }

    fn save_rates(&self, rates: &RatePresets) -> Result<()> {
        save_json(&self.path(RATES_FILE), rates).context("Failed to save rate settings")
    }
}

/// JSONファイルを読み込む。失敗した場合はログを出力して既定値を返す。
fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    if !path.exists() {
        debug!("{} does not exist yet", path.display());
        return T::default();
    }

    match load_json(path) {
        Ok(value) => value,
        Err(err) => {
            warn!("Failed to load {}, starting empty: {:#}", path.display(), err);
            T::default()
        }
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON: {}", path.display()))?;

    Ok(value)
}

/// ファイル全体を上書きして保存する。
fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;
    fs::write(path, content).with_context(|| format!("Failed to write file: {}", path.display()))?;
    info!("Saved {}", path.display());

    Ok(())
}
