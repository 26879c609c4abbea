use std::env;
use std::path::PathBuf;

/// データディレクトリを指定する環境変数。
pub const DATA_DIR_ENV: &str = "WORKTIME_DATA_DIR";
/// 帳票の出力先を指定する環境変数。
pub const OUTPUT_DIR_ENV: &str = "WORKTIME_OUTPUT_DIR";

const APP_DIR_NAME: &str = "worktime";

/// 実行時の設定。
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// `projects.json`と`rate_settings.json`を置くディレクトリ。
    pub data_dir: PathBuf,
    /// 帳票を出力するディレクトリ。
    pub output_dir: PathBuf,
}

impl Config {
    /// コマンドライン引数と環境変数から設定を作成する。
    ///
    /// 優先順位はコマンドライン引数、環境変数、既定値の順。
    /// データディレクトリの既定値はOSのデータディレクトリ配下、出力先の既定値はカレントディレクトリ。
    pub fn resolve(data_dir: Option<PathBuf>, output_dir: Option<PathBuf>) -> Self {
        let data_dir = data_dir
            .or_else(|| env::var_os(DATA_DIR_ENV).map(PathBuf::from))
            .or_else(|| dirs::data_dir().map(|dir| dir.join(APP_DIR_NAME)))
            .unwrap_or_else(|| PathBuf::from("."));
        let output_dir = output_dir
            .or_else(|| env::var_os(OUTPUT_DIR_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            data_dir,
            output_dir,
        }
    }

    /// ログファイルのパスを返す。
    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join(format!("{}.log", APP_DIR_NAME))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::Config;

    /// 引数で指定したディレクトリが優先される。
    #[test]
    fn test_resolve_with_arguments() {
        let config = Config::resolve(Some(PathBuf::from("/data")), Some(PathBuf::from("/out")));

        assert_eq!(config.data_dir, PathBuf::from("/data"));
        assert_eq!(config.output_dir, PathBuf::from("/out"));
        assert_eq!(config.log_file(), PathBuf::from("/data/worktime.log"));
    }
}
