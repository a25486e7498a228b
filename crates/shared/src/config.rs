use crate::errors::AppError;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// 状態を保存するJSONファイル（未指定ならサンプルデータのみで動作）
    pub data_file: Option<PathBuf>,
    pub environment: String,
    /// データファイルが存在しないときにサンプルデータから始めるか
    pub seed_on_empty: bool,
    pub persist_retry_max_attempts: u32,
    pub persist_retry_initial_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: None,
            environment: "dev".to_string(),
            seed_on_empty: true,
            persist_retry_max_attempts: 3,
            persist_retry_initial_delay_ms: 50,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 任意の取得関数から設定を読み込む
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        Ok(Config {
            data_file: lookup("FARM_DATA_FILE")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
            environment: lookup("FARM_ENVIRONMENT").unwrap_or(defaults.environment),
            seed_on_empty: match lookup("FARM_SEED_ON_EMPTY") {
                Some(value) => parse_bool("FARM_SEED_ON_EMPTY", &value)?,
                None => defaults.seed_on_empty,
            },
            persist_retry_max_attempts: match lookup("FARM_PERSIST_RETRY_MAX_ATTEMPTS") {
                Some(value) => parse_number("FARM_PERSIST_RETRY_MAX_ATTEMPTS", &value)?,
                None => defaults.persist_retry_max_attempts,
            },
            persist_retry_initial_delay_ms: match lookup("FARM_PERSIST_RETRY_INITIAL_DELAY_MS") {
                Some(value) => parse_number("FARM_PERSIST_RETRY_INITIAL_DELAY_MS", &value)?,
                None => defaults.persist_retry_initial_delay_ms,
            },
        })
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, AppError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(AppError::Configuration(format!(
            "{key} must be true or false, got {value:?}"
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, AppError> {
    value.trim().parse().map_err(|_| {
        AppError::Configuration(format!("{key} must be a non-negative integer, got {value:?}"))
    })
}
