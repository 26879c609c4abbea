use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use crate::datetime;
use crate::error::ValidationError;
use crate::project::{Project, ProjectBook};
use crate::report::{build_sheet, unique_report_path};
use crate::store::ProjectStore;
use crate::time_entry::ValidEntry;
use crate::xlsx::XlsxReportWriter;

/// `export`サブコマンドの引数を表す構造体。
#[derive(Debug, clap::Args)]
pub struct ExportArgs {
    #[clap(required_unless_present = "all", help = "Project to export")]
    pub project: Option<String>,

    #[clap(long = "all", conflicts_with = "project", help = "Export every project")]
    pub all: bool,
}

/// `preview`サブコマンドの引数を表す構造体。
#[derive(Debug, clap::Args)]
pub struct PreviewArgs {
    pub project: String,
}

pub struct ExportCommand<'a, T: ProjectStore> {
    store: &'a T,
    output_dir: &'a Path,
    writer: XlsxReportWriter,
}

impl<'a, T: ProjectStore> ExportCommand<'a, T> {
    /// 新しい`ExportCommand`を返す。
    ///
    /// # Arguments
    /// * `store` - プロジェクトを読み込むストア
    /// * `output_dir` - 帳票の出力先
    pub fn new(store: &'a T, output_dir: &'a Path) -> Self {
        Self {
            store,
            output_dir,
            writer: XlsxReportWriter::new(),
        }
    }

    /// `export`サブコマンドの処理を行い、出力したファイルを返す。
    pub fn run(&self, args: ExportArgs) -> Result<Vec<PathBuf>> {
        match args.project {
            Some(project) if !args.all => Ok(vec![self.export(&project)?]),
            _ => self.export_all(),
        }
    }

    /// 帳票に出力される記録を返す。
    ///
    /// 記録がない、または有効な記録がない場合はエラーを返す。
    pub fn preview(&self, args: PreviewArgs) -> Result<Vec<ValidEntry>> {
        let book = ProjectBook::new(self.store.load_projects());
        let project = book.get(&args.project)?;

        reportable_entries(&args.project, project)
    }

    /// 1つのプロジェクトの帳票を出力する。
    pub fn export(&self, name: &str) -> Result<PathBuf> {
        let book = ProjectBook::new(self.store.load_projects());
        let project = book.get(name)?;
        reportable_entries(name, project)?;

        self.write_report(name, project)
    }

    /// 全プロジェクトの帳票を出力する。
    ///
    /// 有効な記録がないプロジェクトは出力しない。
    pub fn export_all(&self) -> Result<Vec<PathBuf>> {
        let book = ProjectBook::new(self.store.load_projects());
        if book.is_empty() {
            return Err(ValidationError::NoProjects.into());
        }

        let mut paths = Vec::new();
        for (name, project) in book.iter() {
            if project.valid_entries().is_empty() {
                info!("Skip project without valid entries: {}", name);
                continue;
            }
            paths.push(self.write_report(name, project)?);
        }
        info!("{} report(s) exported", paths.len());

        Ok(paths)
    }

    /// 集計して帳票を書き出す。
    fn write_report(&self, name: &str, project: &Project) -> Result<PathBuf> {
        let aggregation = project.aggregate();
        let sheet = build_sheet(&project.report_header(name), &aggregation);

        fs::create_dir_all(self.output_dir).with_context(|| {
            format!(
                "Failed to create output directory: {}",
                self.output_dir.display()
            )
        })?;
        let path = unique_report_path(self.output_dir, name, &datetime::now());
        self.writer
            .write(&sheet, &path)
            .with_context(|| format!("Failed to export project: {}", name))?;

        Ok(path)
    }
}

/// 帳票に出力できる記録を返す。
fn reportable_entries(name: &str, project: &Project) -> Result<Vec<ValidEntry>> {
    if project.entries.is_empty() {
        return Err(ValidationError::NoEntries(name.to_string()).into());
    }
    let entries = project.valid_entries();
    if entries.is_empty() {
        return Err(ValidationError::NoValidEntries(name.to_string()).into());
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use chrono::{Local, NaiveDate, NaiveTime, TimeZone};

    use super::{ExportArgs, ExportCommand, PreviewArgs};
    use crate::datetime::mock_datetime;
    use crate::error::ValidationError;
    use crate::project::{EntryUpdate, Project, ProjectMap};
    use crate::store::MockProjectStore;

    fn valid_update(worker: &str) -> EntryUpdate {
        EntryUpdate {
            date: NaiveDate::from_ymd_opt(2024, 5, 1),
            worker_id: Some(worker.to_string()),
            start_time: NaiveTime::from_hms_opt(9, 0, 0),
            end_time: NaiveTime::from_hms_opt(17, 0, 0),
            overtime: Some(0.0),
            rate: Some(10.0),
        }
    }

    fn project_with(updates: &[EntryUpdate]) -> Project {
        let mut project = Project::default();
        for update in updates {
            project.add_entry(update);
        }
        project
    }

    fn store_with(projects: ProjectMap) -> MockProjectStore {
        let mut store = MockProjectStore::new();
        store
            .expect_load_projects()
            .returning(move || projects.clone());
        store
    }

    #[test]
    fn test_export_writes_timestamped_file() {
        let dir = tempfile::tempdir().unwrap();
        let _clock = mock_datetime::freeze(Local.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap());
        let store = store_with(ProjectMap::from([(
            "工地".to_string(),
            project_with(&[valid_update("A")]),
        )]));

        let command = ExportCommand::new(&store, dir.path());
        let paths = command
            .run(ExportArgs {
                project: Some("工地".to_string()),
                all: false,
            })
            .unwrap();

        assert_eq!(paths, vec![dir.path().join("工地_20240506_070809.xlsx")]);
        assert!(paths[0].exists());
    }

    /// 同じ秒に2回出力しても上書きしない。
    #[test]
    fn test_export_twice_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let _clock = mock_datetime::freeze(Local.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap());
        let store = store_with(ProjectMap::from([(
            "P".to_string(),
            project_with(&[valid_update("A")]),
        )]));

        let command = ExportCommand::new(&store, dir.path());
        let first = command.export("P").unwrap();
        let second = command.export("P").unwrap();

        assert_ne!(first, second);
        assert!(first.exists());
        assert!(second.exists());
    }

    #[test]
    fn test_export_without_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(ProjectMap::from([("P".to_string(), Project::default())]));

        let command = ExportCommand::new(&store, dir.path());
        let err = command.export("P").unwrap_err();

        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::NoEntries("P".to_string()))
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_export_without_valid_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(ProjectMap::from([(
            "P".to_string(),
            project_with(&[EntryUpdate::default()]),
        )]));

        let command = ExportCommand::new(&store, dir.path());
        let err = command.export("P").unwrap_err();

        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::NoValidEntries("P".to_string()))
        );
    }

    #[test]
    fn test_export_all_skips_projects_without_valid_entries() {
        let dir = tempfile::tempdir().unwrap();
        let _clock = mock_datetime::freeze(Local.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap());
        let store = store_with(ProjectMap::from([
            ("C".to_string(), project_with(&[valid_update("x")])),
            ("B".to_string(), Project::default()),
            ("A".to_string(), project_with(&[valid_update("y")])),
        ]));

        let command = ExportCommand::new(&store, dir.path());
        let paths = command
            .run(ExportArgs {
                project: None,
                all: true,
            })
            .unwrap();

        assert_eq!(
            paths,
            vec![
                dir.path().join("C_20240506_070809.xlsx"),
                dir.path().join("A_20240506_070809.xlsx"),
            ]
        );
    }

    #[test]
    fn test_export_all_without_projects() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(ProjectMap::new());

        let command = ExportCommand::new(&store, dir.path());
        let err = command.export_all().unwrap_err();

        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::NoProjects)
        );
    }

    #[test]
    fn test_preview_returns_valid_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(ProjectMap::from([(
            "P".to_string(),
            project_with(&[valid_update("A"), EntryUpdate::default(), valid_update("B")]),
        )]));

        let command = ExportCommand::new(&store, dir.path());
        let entries = command
            .preview(PreviewArgs {
                project: "P".to_string(),
            })
            .unwrap();

        let workers: Vec<_> = entries.iter().map(|e| e.worker_id.as_str()).collect();
        assert_eq!(workers, vec!["A", "B"]);
    }
}
