use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;

/// ログ出力を初期化する。
///
/// 標準エラー出力には色付きで、`log_file`が指定された場合はファイルにも色なしで出力する。
/// ログレベルは`verbose`の回数で上げられ、指定がなければ`RUST_LOG`、それもなければinfoとする。
///
/// # Arguments
///
/// * `verbose` - `-v`の指定回数
/// * `log_file` - ログを追記するファイル
pub fn init(verbose: u64, log_file: Option<&Path>) -> Result<()> {
    let level = level_filter(verbose, env::var("RUST_LOG").ok().as_deref());
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Cyan)
        .trace(Color::BrightBlack);

    let stderr = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .chain(std::io::stderr());

    let mut dispatch = fern::Dispatch::new().level(level).chain(stderr);

    if let Some(path) = log_file {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
        }
        let file = fern::log_file(path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;
        dispatch = dispatch.chain(
            fern::Dispatch::new()
                .format(|out, message, record| {
                    out.finish(format_args!(
                        "[{} {} {}] {}",
                        Local::now().format("%Y-%m-%d %H:%M:%S"),
                        record.level(),
                        record.target(),
                        message
                    ))
                })
                .chain(file),
        );
    }

    dispatch.apply().context("Failed to initialize logger")?;

    Ok(())
}

/// ログレベルを決定する。
fn level_filter(verbose: u64, rust_log: Option<&str>) -> LevelFilter {
    match verbose {
        0 => rust_log
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(LevelFilter::Info),
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

#[cfg(test)]
mod tests {
    use log::LevelFilter;
    use rstest::rstest;

    use super::level_filter;

    #[rstest]
    #[case::default(0, None, LevelFilter::Info)]
    #[case::rust_log(0, Some("warn"), LevelFilter::Warn)]
    #[case::invalid_rust_log(0, Some("loud"), LevelFilter::Info)]
    #[case::verbose(1, Some("warn"), LevelFilter::Debug)]
    #[case::very_verbose(3, None, LevelFilter::Trace)]
    fn test_level_filter(
        #[case] verbose: u64,
        #[case] rust_log: Option<&str>,
        #[case] expected: LevelFilter,
    ) {
        assert_eq!(level_filter(verbose, rust_log), expected);
    }
}
