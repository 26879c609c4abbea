use chrono::{DateTime, Local};

/// 帳票のファイル名に含める生成時刻の書式。秒単位。
pub const REPORT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// 帳票の生成時刻として現在のローカル時刻を返す。
#[cfg(not(test))]
pub fn now() -> DateTime<Local> {
    Local::now()
}

/// 生成時刻をファイル名に使う文字列にする。
pub fn report_timestamp(generated_at: &DateTime<Local>) -> String {
    generated_at.format(REPORT_TIMESTAMP_FORMAT).to_string()
}


#[cfg(test)]
pub use mock_datetime::now;
