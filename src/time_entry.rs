use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use log::debug;
use serde::{Deserialize, Serialize};

/// 日付が未選択であることを表す値。
pub const UNSET_DATE: &str = "选择日期";
/// 開始時刻が未選択であることを表す値。
pub const UNSET_START_TIME: &str = "开始时间";
/// 終了時刻が未選択であることを表す値。
pub const UNSET_END_TIME: &str = "结束时间";

/// 日付の入出力形式。
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// 時刻の入出力形式。
pub const TIME_FORMAT: &str = "%H:%M:%S";

const SECONDS_PER_HOUR: f64 = 3600.0;

/// 保存されている工数記録。
///
/// 値は全て表示用の文字列で、未設定の項目はセンチネル値を持つ。
/// 集計時には毎回[`RawEntry::validate`]で型付きの値に変換する。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawEntry {
    #[serde(default = "default_date")]
    pub date: String,
    #[serde(rename = "plate_name", alias = "worker_id", default)]
    pub worker_id: String,
    #[serde(default = "default_start_time")]
    pub start_time: String,
    #[serde(default = "default_end_time")]
    pub end_time: String,
    #[serde(default = "default_zero")]
    pub overtime: String,
    #[serde(default = "default_zero")]
    pub rate: String,
    #[serde(default = "default_zero")]
    pub amount: String,
}

fn default_date() -> String {
    UNSET_DATE.to_string()
}

fn default_start_time() -> String {
    UNSET_START_TIME.to_string()
}

fn default_end_time() -> String {
    UNSET_END_TIME.to_string()
}

fn default_zero() -> String {
    "0".to_string()
}

impl Default for RawEntry {
    fn default() -> Self {
        Self {
            date: default_date(),
            worker_id: String::new(),
            start_time: default_start_time(),
            end_time: default_end_time(),
            overtime: default_zero(),
            rate: default_zero(),
            amount: default_zero(),
        }
    }
}

impl RawEntry {
    /// 集計に利用できる記録かどうかを判定し、型付きの記録に変換する。
    ///
    /// 以下のいずれかに該当する場合は`None`を返す。エラーにはしない。
    ///
    /// - 日付が未選択、または日付として解釈できない
    /// - 車両/作業者が空文字列
    /// - 開始時刻・終了時刻が未選択、または時刻として解釈できない
    /// - 単価が数値として解釈できない
    ///
    /// 残業時間が数値でない場合は0として扱う。
    pub fn validate(&self) -> Option<ValidEntry> {
        if self.date == UNSET_DATE {
            debug!("Skip entry without date: {:?}", self);
            return None;
        }
        if self.worker_id.is_empty() {
            debug!("Skip entry without worker: {:?}", self);
            return None;
        }
        if self.start_time == UNSET_START_TIME || self.end_time == UNSET_END_TIME {
            debug!("Skip entry without start or end time: {:?}", self);
            return None;
        }

        let date = match parse_date(&self.date) {
            Ok(date) => date,
            Err(err) => {
                debug!("Skip entry: {:#}", err);
                return None;
            }
        };
        let (start_time, end_time) =
            match (parse_time(&self.start_time), parse_time(&self.end_time)) {
                (Ok(start), Ok(end)) => (start, end),
                (Err(err), _) | (_, Err(err)) => {
                    debug!("Skip entry: {:#}", err);
                    return None;
                }
            };
        let rate = match parse_number(&self.rate) {
            Ok(rate) => rate,
            Err(err) => {
                debug!("Skip entry: {:#}", err);
                return None;
            }
        };
        let overtime = parse_number(&self.overtime).unwrap_or(0.0);

        Some(ValidEntry {
            date,
            worker_id: self.worker_id.clone(),
            start_time,
            end_time,
            overtime,
            rate,
        })
    }

    /// 表示用の金額を再計算する。
    ///
    /// 時刻と単価が有効な場合のみ更新し、それ以外は現在の値を残す。
    pub fn refresh_amount(&mut self) {
        if self.start_time == UNSET_START_TIME || self.end_time == UNSET_END_TIME {
            return;
        }
        let (Ok(start), Ok(end)) = (parse_time(&self.start_time), parse_time(&self.end_time))
        else {
            return;
        };
        let Ok(rate) = parse_number(&self.rate) else {
            return;
        };
        let overtime = parse_number(&self.overtime).unwrap_or(0.0);
        let amount = (hours_between(start, end) + overtime) * rate;
        self.amount = format!("{:.2}", amount);
    }
}

/// 集計対象として検証済みの工数記録。
#[derive(Clone, Debug, PartialEq)]
pub struct ValidEntry {
    pub date: NaiveDate,
    pub worker_id: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub overtime: f64,
    pub rate: f64,
}

impl ValidEntry {
    /// 開始時刻から終了時刻までの時間を返す。
    ///
    /// 日付をまたぐ記録は考慮しないため、終了が開始より前の場合は負の値になる。
    pub fn work_hours(&self) -> f64 {
        hours_between(self.start_time, self.end_time)
    }

    /// 残業時間を含めた合計時間を返す。
    pub fn total_hours(&self) -> f64 {
        self.work_hours() + self.overtime
    }

    /// 金額を返す。丸めは行わない。
    pub fn amount(&self) -> f64 {
        self.total_hours() * self.rate
    }
}

fn hours_between(start: NaiveTime, end: NaiveTime) -> f64 {
    (end - start).num_seconds() as f64 / SECONDS_PER_HOUR
}

/// 日付をパースする。
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .with_context(|| format!("Failed to parse date: {}", s))
}

/// 時刻をパースする。
pub fn parse_time(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), TIME_FORMAT)
        .with_context(|| format!("Failed to parse time: {}", s))
}

/// 数値をパースする。
pub fn parse_number(s: &str) -> Result<f64> {
    s.trim()
        .parse::<f64>()
        .with_context(|| format!("Failed to parse number: {}", s))
}
