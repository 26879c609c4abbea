use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::aggregate::Aggregation;
use crate::datetime::report_timestamp;
use crate::time_entry::DATE_FORMAT;

/// 列数。日付、車両/作業者、作業時間、残業時間、合計時間、単価、金額。
pub const COLUMN_COUNT: usize = 7;

/// 表頭。
pub const HEADERS: [&str; COLUMN_COUNT] = [
    "日期",
    "车牌/姓名",
    "工作时间",
    "加班时间",
    "总时间",
    "单价",
    "金额",
];

/// シート名。
pub const SHEET_NAME: &str = "工时统计";

/// 出力ファイルの拡張子。
pub const FILE_EXTENSION: &str = "xlsx";

const SUBTOTAL_LABEL: &str = "小计";
const GRAND_TOTAL_LABEL: &str = "总计";
const MAX_COLUMN_WIDTH: f64 = 25.0;
const WIDTH_PADDING: usize = 2;
const WIDTH_SCALE: f64 = 1.2;
/// 値を持たないセル(空行、結合されたセルの残り)を測るときの文字列。
const ABSENT_CELL_TEXT: &str = "None";

/// 表のセル。
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    /// 列幅の計算に利用する表示文字列を返す。
    ///
    /// 数値は整数でも小数部を付ける(`8.0`)。
    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(text) => text.clone(),
            Cell::Number(number) => format!("{:?}", number),
        }
    }
}

/// 行の種類。書式はこれで決まる。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowKind {
    /// 全列を結合したタイトル行。
    Title,
    /// 全列を結合した日付範囲の行。
    Subtitle,
    Blank,
    Header,
    Entry,
    Subtotal,
    GrandTotal,
}

/// 表の1行。
#[derive(Clone, Debug, PartialEq)]
pub struct ReportRow {
    pub kind: RowKind,
    pub cells: Vec<Cell>,
}

impl ReportRow {
    fn blank() -> Self {
        Self {
            kind: RowKind::Blank,
            cells: Vec::new(),
        }
    }

    fn merged(kind: RowKind, text: String) -> Self {
        Self {
            kind,
            cells: vec![Cell::Text(text)],
        }
    }
}

/// 帳票の見出しに使う情報。
#[derive(Clone, Debug)]
pub struct ReportHeader<'a> {
    pub project_name: &'a str,
    pub start_date: &'a str,
    pub end_date: &'a str,
}

/// 出力形式に依存しない帳票のレイアウト。
#[derive(Clone, Debug, PartialEq)]
pub struct ReportSheet {
    pub rows: Vec<ReportRow>,
    pub column_widths: [f64; COLUMN_COUNT],
}

/// 集計結果から帳票のレイアウトを作成する。
///
/// 時間と金額はこの時点で小数点以下2桁に丸める。
///
/// # Arguments
///
/// * `header` - プロジェクト名と日付範囲
/// * `aggregation` - 集計結果
pub fn build_sheet(header: &ReportHeader, aggregation: &Aggregation) -> ReportSheet {
    let mut rows = vec![
        ReportRow::merged(
            RowKind::Title,
            format!("{} 工时统计报表", header.project_name),
        ),
        ReportRow::merged(
            RowKind::Subtitle,
            format!("日期范围: {} - {}", header.start_date, header.end_date),
        ),
        ReportRow::blank(),
        ReportRow {
            kind: RowKind::Header,
            cells: HEADERS.iter().map(|h| Cell::Text(h.to_string())).collect(),
        },
    ];

    for group in &aggregation.groups {
        for entry in &group.entries {
            rows.push(ReportRow {
                kind: RowKind::Entry,
                cells: vec![
                    Cell::Text(entry.date.format(DATE_FORMAT).to_string()),
                    Cell::Text(entry.worker_id.clone()),
                    Cell::Number(round2(entry.work_hours())),
                    Cell::Number(round2(entry.overtime)),
                    Cell::Number(round2(entry.total_hours())),
                    Cell::Number(round2(entry.rate)),
                    Cell::Number(round2(entry.amount())),
                ],
            });
        }
        rows.push(ReportRow {
            kind: RowKind::Subtotal,
            cells: vec![
                Cell::Text(SUBTOTAL_LABEL.to_string()),
                Cell::Text(group.worker_id.clone()),
                Cell::Empty,
                Cell::Empty,
                Cell::Number(round2(group.total_hours)),
                Cell::Empty,
                Cell::Number(round2(group.total_amount)),
            ],
        });
        rows.push(ReportRow::blank());
    }

    rows.push(ReportRow::blank());
    rows.push(ReportRow {
        kind: RowKind::GrandTotal,
        cells: vec![
            Cell::Text(GRAND_TOTAL_LABEL.to_string()),
            Cell::Text(format!("{}人", aggregation.group_count())),
            Cell::Empty,
            Cell::Empty,
            Cell::Number(round2(aggregation.total_hours)),
            Cell::Empty,
            Cell::Number(round2(aggregation.total_amount)),
        ],
    });

    let column_widths = column_widths(&rows);
    ReportSheet {
        rows,
        column_widths,
    }
}

/// 各列の最長の文字列から列幅を計算する。
///
/// 空行と結合セルの2列目以降は`ABSENT_CELL_TEXT`の長さで数える。
fn column_widths(rows: &[ReportRow]) -> [f64; COLUMN_COUNT] {
    let absent = ABSENT_CELL_TEXT.chars().count();
    let mut longest = [0usize; COLUMN_COUNT];
    for row in rows {
        for (col, len) in longest.iter_mut().enumerate() {
            let cell_len = row
                .cells
                .get(col)
                .map_or(absent, |cell| cell.display().chars().count());
            *len = (*len).max(cell_len);
        }
    }
    longest.map(|len| ((len + WIDTH_PADDING) as f64 * WIDTH_SCALE).min(MAX_COLUMN_WIDTH))
}

/// 小数点以下2桁に丸める。ちょうど半分の値は偶数側に丸める。
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// 帳票のファイル名を返す。
///
/// 生成時刻を秒単位で含める。
pub fn report_file_name(project_name: &str, generated_at: &DateTime<Local>) -> String {
    format!(
        "{}_{}.{}",
        project_name,
        report_timestamp(generated_at),
        FILE_EXTENSION
    )
}

/// 既存のファイルを上書きしない出力先を返す。
///
/// 同名のファイルがある場合は`_1`、`_2`…を付ける。
pub fn unique_report_path(
    output_dir: &Path,
    project_name: &str,
    generated_at: &DateTime<Local>,
) -> PathBuf {
    let path = output_dir.join(report_file_name(project_name, generated_at));
    if !path.exists() {
        return path;
    }

    let stem = format!("{}_{}", project_name, report_timestamp(generated_at));
    (1..)
        .map(|n| output_dir.join(format!("{}_{}.{}", stem, n, FILE_EXTENSION)))
        .find(|candidate| !candidate.exists())
        .unwrap_or(path)
}
