use std::io::Write;

use anyhow::{Context, Result};

use crate::aggregate::Aggregation;
use crate::project::{Project, ProjectMap};
use crate::report::HEADERS;
use crate::store::RatePresets;
use crate::time_entry::{ValidEntry, DATE_FORMAT};

/// Consoleに表示するためのtrait。
pub trait ConsolePresenter {
    /// 集計対象の記録をプレビュー用に表示する。
    ///
    /// # Arguments
    ///
    /// * `entries` - 表示する記録
    fn show_preview(&mut self, entries: &[ValidEntry]) -> Result<()>;

    /// プロジェクトの一覧を表示する。
    fn show_projects(&mut self, projects: &ProjectMap) -> Result<()>;

    /// プロジェクトの全記録と合計を表示する。
    fn show_project(&mut self, name: &str, project: &Project, totals: &Aggregation) -> Result<()>;

    /// 単価の設定を表示する。
    fn show_rates(&mut self, rates: &RatePresets) -> Result<()>;
}

/// Markdown形式で表示する。
pub struct ConsoleMarkdown<'a, W: Write> {
    writer: &'a mut W,
}

impl<'a, W: Write> ConsoleMarkdown<'a, W> {
    /// 新しい`ConsoleMarkdown`を返す。
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }
}

impl<'a, W: Write> ConsolePresenter for ConsoleMarkdown<'a, W> {
    // 記録をtable形式で表示する。数値は小数点以下2桁で表示する。
    fn show_preview(&mut self, entries: &[ValidEntry]) -> Result<()> {
        writeln!(self.writer, "| {} |", HEADERS.join(" | ")).context("Failed to write header")?;
        writeln!(self.writer, "|{}", "---|".repeat(HEADERS.len()))
            .context("Failed to write header")?;

        for entry in entries {
            writeln!(
                self.writer,
                "| {} | {} | {:.2} | {:.2} | {:.2} | {} | {:.2} |",
                entry.date.format(DATE_FORMAT),
                entry.worker_id,
                entry.work_hours(),
                entry.overtime,
                entry.total_hours(),
                entry.rate,
                entry.amount(),
            )
            .with_context(|| format!("Failed to write entry: {:?}", entry))?;
        }

        Ok(())
    }

    fn show_projects(&mut self, projects: &ProjectMap) -> Result<()> {
        for (name, project) in projects {
            writeln!(
                self.writer,
                "- {}: {} ~ {} ({} entries)",
                name,
                project.start_date,
                project.end_date,
                project.entries.len()
            )
            .with_context(|| format!("Failed to write project: {}", name))?;
        }

        Ok(())
    }

    fn show_project(&mut self, name: &str, project: &Project, totals: &Aggregation) -> Result<()> {
        writeln!(
            self.writer,
            "## {} ({} ~ {})",
            name, project.start_date, project.end_date
        )
        .context("Failed to write project header")?;

        for (index, entry) in project.entries.iter().enumerate() {
            writeln!(
                self.writer,
                "{}. {} {} {} ~ {} overtime: {} rate: {} amount: {}",
                index,
                entry.date,
                entry.worker_id,
                entry.start_time,
                entry.end_time,
                entry.overtime,
                entry.rate,
                entry.amount
            )
            .with_context(|| format!("Failed to write entry: {:?}", entry))?;
        }

        writeln!(
            self.writer,
            "- days: {}\n- hours: {:.2}\n- amount: {:.2}",
            totals.distinct_days, totals.total_hours, totals.total_amount
        )
        .context("Failed to write totals")?;

        Ok(())
    }

    fn show_rates(&mut self, rates: &RatePresets) -> Result<()> {
        for (name, rate) in rates {
            writeln!(self.writer, "- {}: {}", name, rate)
                .with_context(|| format!("Failed to write rate: {}", name))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};
    use rstest::rstest;

    use super::ConsoleMarkdown;
    use super::ConsolePresenter;
    use crate::project::{EntryUpdate, Project, ProjectMap};
    use crate::store::RatePresets;
    use crate::time_entry::ValidEntry;

    const PREVIEW_HEADER: &str = "| 日期 | 车牌/姓名 | 工作时间 | 加班时间 | 总时间 | 单价 | 金额 |\n\
                                  |---|---|---|---|---|---|---|\n";

    /// テスト用にダミーの記録を作成する。
    fn dummy_entry(pattern: u8) -> ValidEntry {
        match pattern {
            1 => ValidEntry {
                date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                worker_id: "A".to_string(),
                start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
                overtime: 1.0,
                rate: 20.0,
            },
            2 => ValidEntry {
                date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
                worker_id: "B".to_string(),
                start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(9, 20, 0).unwrap(),
                overtime: 0.0,
                rate: 12.5,
            },
            _ => panic!("Invalid pattern: {}", pattern),
        }
    }

    /// 正常系のテスト。
    #[rstest]
    #[case::no_entry(&[], "")]
    #[case::single(&[dummy_entry(1)], "| 2024-05-01 | A | 8.00 | 1.00 | 9.00 | 20 | 180.00 |\n")]
    #[case::rounded(&[dummy_entry(2)], "| 2024-05-02 | B | 0.33 | 0.00 | 0.33 | 12.5 | 4.17 |\n")]
    #[case::keeps_order(
        &[dummy_entry(2), dummy_entry(1)],
        "| 2024-05-02 | B | 0.33 | 0.00 | 0.33 | 12.5 | 4.17 |\n\
         | 2024-05-01 | A | 8.00 | 1.00 | 9.00 | 20 | 180.00 |\n",
    )]
    fn test_show_preview(#[case] input: &[ValidEntry], #[case] expected_rows: &str) {
        let mut writer = Vec::new();
        let mut presenter = ConsoleMarkdown::new(&mut writer);

        presenter.show_preview(input).unwrap();

        assert_eq!(
            String::from_utf8(writer).unwrap(),
            format!("{}{}", PREVIEW_HEADER, expected_rows)
        );
    }

    #[test]
    fn test_show_projects() {
        let mut projects = ProjectMap::new();
        projects.insert("P".to_string(), Project::default());
        let mut writer = Vec::new();

        ConsoleMarkdown::new(&mut writer)
            .show_projects(&projects)
            .unwrap();

        assert_eq!(
            String::from_utf8(writer).unwrap(),
            "- P: 开始日期 ~ 结束日期 (0 entries)\n"
        );
    }

    #[test]
    fn test_show_project() {
        let mut project = Project::default();
        project.add_entry(&EntryUpdate {
            date: NaiveDate::from_ymd_opt(2024, 5, 1),
            worker_id: Some("A".to_string()),
            start_time: NaiveTime::from_hms_opt(9, 0, 0),
            end_time: NaiveTime::from_hms_opt(17, 0, 0),
            overtime: Some(1.0),
            rate: Some(20.0),
        });
        project.add_entry(&EntryUpdate::default());
        let totals = project.aggregate();
        let mut writer = Vec::new();

        ConsoleMarkdown::new(&mut writer)
            .show_project("P", &project, &totals)
            .unwrap();

        assert_eq!(
            String::from_utf8(writer).unwrap(),
            "## P (开始日期 ~ 结束日期)\n\
             0. 2024-05-01 A 09:00:00 ~ 17:00:00 overtime: 1 rate: 20 amount: 180.00\n\
             1. 选择日期  开始时间 ~ 结束时间 overtime: 0 rate: 0 amount: 0\n\
             - days: 1\n\
             - hours: 9.00\n\
             - amount: 180.00\n"
        );
    }

    #[test]
    fn test_show_rates() {
        let rates = RatePresets::from([("夜班".to_string(), 25.5), ("白班".to_string(), 20.0)]);
        let mut writer = Vec::new();

        ConsoleMarkdown::new(&mut writer).show_rates(&rates).unwrap();

        let output = String::from_utf8(writer).unwrap();
        assert!(output.contains("- 夜班: 25.5\n"));
        assert!(output.contains("- 白班: 20\n"));
    }
}
