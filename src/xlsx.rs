use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use rust_xlsxwriter::{ColNum, Format, FormatAlign, RowNum, Workbook, Worksheet};

use crate::report::{Cell, ReportRow, ReportSheet, RowKind, COLUMN_COUNT, SHEET_NAME};

const TITLE_FONT_SIZE: u8 = 16;
const GRAND_TOTAL_FONT_SIZE: u8 = 14;

/// 帳票のレイアウトをxlsxファイルに書き出す。
pub struct XlsxReportWriter {
    title: Format,
    subtitle: Format,
    header: Format,
    plain: Format,
    subtotal: Format,
    grand_total: Format,
}

impl Default for XlsxReportWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl XlsxReportWriter {
    /// 新しい`XlsxReportWriter`を返す。
    pub fn new() -> Self {
        let centered = Format::new()
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter);

        Self {
            title: centered
                .clone()
                .set_bold()
                .set_font_size(TITLE_FONT_SIZE),
            subtitle: centered.clone(),
            header: centered.clone().set_bold(),
            plain: Format::new(),
            subtotal: centered.clone().set_bold(),
            grand_total: centered.set_bold().set_font_size(GRAND_TOTAL_FONT_SIZE),
        }
    }

    /// 帳票を指定したパスに保存する。
    ///
    /// # Arguments
    ///
    /// * `sheet` - 書き出す帳票
    /// * `path` - 保存先
    pub fn write(&self, sheet: &ReportSheet, path: &Path) -> Result<()> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(SHEET_NAME)
            .context("Failed to set worksheet name")?;

        for (index, row) in sheet.rows.iter().enumerate() {
            let row_num = RowNum::try_from(index).context("Too many rows for a worksheet")?;
            self.write_row(worksheet, row_num, row)
                .with_context(|| format!("Failed to write row {}", index + 1))?;
        }

        for (col, width) in sheet.column_widths.iter().enumerate() {
            worksheet
                .set_column_width(col as ColNum, *width)
                .with_context(|| format!("Failed to set width of column {}", col + 1))?;
        }

        workbook
            .save(path)
            .with_context(|| format!("Failed to save report: {}", path.display()))?;
        info!("Report saved: {}", path.display());

        Ok(())
    }

    /// 1行を書き出す。
    fn write_row(&self, worksheet: &mut Worksheet, row_num: RowNum, row: &ReportRow) -> Result<()> {
        let last_col = (COLUMN_COUNT - 1) as ColNum;
        match row.kind {
            RowKind::Blank => {}
            RowKind::Title | RowKind::Subtitle => {
                let format = if row.kind == RowKind::Title {
                    &self.title
                } else {
                    &self.subtitle
                };
                let text = row.cells.first().map(Cell::display).unwrap_or_default();
                worksheet.merge_range(row_num, 0, row_num, last_col, &text, format)?;
            }
            RowKind::Header | RowKind::Entry | RowKind::Subtotal | RowKind::GrandTotal => {
                let format = match row.kind {
                    RowKind::Header => &self.header,
                    RowKind::Subtotal => &self.subtotal,
                    RowKind::GrandTotal => &self.grand_total,
                    _ => &self.plain,
                };
                for (col, cell) in row.cells.iter().enumerate() {
                    let col = col as ColNum;
                    match cell {
                        Cell::Empty => {
                            worksheet.write_blank(row_num, col, format)?;
                        }
                        Cell::Text(text) => {
                            worksheet.write_string_with_format(row_num, col, text, format)?;
                        }
                        Cell::Number(number) => {
                            worksheet.write_number_with_format(row_num, col, *number, format)?;
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::Read;
    use std::path::Path;

    use chrono::{NaiveDate, NaiveTime};

    use super::XlsxReportWriter;
    use crate::aggregate::aggregate;
    use crate::report::{build_sheet, ReportHeader};
    use crate::time_entry::ValidEntry;

    /// xlsxファイル内のXMLを読み込む。
    fn read_part(path: &Path, name: &str) -> String {
        let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut content = String::new();
        archive
            .by_name(name)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        content
    }

    fn write_sample(path: &Path) {
        let entries = vec![ValidEntry {
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            worker_id: "粤A12345".to_string(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            overtime: 1.0,
            rate: 20.0,
        }];
        let header = ReportHeader {
            project_name: "工地",
            start_date: "开始日期",
            end_date: "结束日期",
        };
        let sheet = build_sheet(&header, &aggregate(&entries));

        XlsxReportWriter::new().write(&sheet, path).unwrap();
    }

    #[test]
    fn test_write_merges_title_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");

        write_sample(&path);

        let sheet = read_part(&path, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains(r#"<mergeCell ref="A1:G1"/>"#));
        assert!(sheet.contains(r#"<mergeCell ref="A2:G2"/>"#));
        // 空行は書き出さない
        assert!(!sheet.contains(r#"<row r="3""#));
        assert!(sheet.contains(r#"<row r="4""#));
    }

    #[test]
    fn test_write_sets_column_widths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");

        write_sample(&path);

        let sheet = read_part(&path, "xl/worksheets/sheet1.xml");
        // 1列目は上限の25
        assert!(sheet.contains(r#"<col min="1" max="1" width="25."#));
        assert!(sheet.contains(r#"customWidth="1""#));
    }

    #[test]
    fn test_write_sheet_name_and_fonts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");

        write_sample(&path);

        let workbook = read_part(&path, "xl/workbook.xml");
        assert!(workbook.contains(r#"<sheet name="工时统计""#));
        let styles = read_part(&path, "xl/styles.xml");
        assert!(styles.contains(r#"<sz val="16"/>"#));
        assert!(styles.contains(r#"<sz val="14"/>"#));
        assert!(styles.contains("<b/>"));
    }
}
