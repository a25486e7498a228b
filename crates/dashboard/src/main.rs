use anyhow::{anyhow, Result};
use chrono::Utc;
use domain::{Dashboard, HerdReport, ParentageIssue, ProductionReport, ReportPeriod};
use infrastructure::{FarmService, JsonFileStore, RetryConfig, SeedDataSource, StateStore};
use serde::Serialize;
use shared::{init_tracing, AppError, Config, ErrorResponse};
use tracing::{error, info, warn};

/// 標準出力に書き出すレポート
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FarmReport {
    dashboard: Dashboard,
    herd: HerdReport,
    production: ProductionReport,
    parentage_issues: Vec<ParentageIssue>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing().map_err(|e| anyhow!(e))?;

    let config = Config::from_env().map_err(|e| report_error(e, true))?;
    let include_details = config.environment == "dev";

    let period = match std::env::args().nth(1) {
        Some(arg) => ReportPeriod::from_string(&arg)
            .map_err(|e| report_error(e.into(), include_details))?,
        None => ReportPeriod::default(),
    };

    run(&config, period)
        .await
        .map_err(|e| report_error(e, include_details))
}

async fn run(config: &Config, period: ReportPeriod) -> Result<(), AppError> {
    let seed = SeedDataSource::new(Utc::now().date_naive());

    match &config.data_file {
        Some(path) => {
            info!(path = %path.display(), environment = %config.environment, "データファイルから読み込みます");
            let mut store = JsonFileStore::new(path).with_retry(RetryConfig::from(config));
            if config.seed_on_empty {
                store = store.with_seed(seed);
            }
            print_report(FarmService::load(store).await?, period).await
        }
        None => {
            info!(environment = %config.environment, "データファイル未指定のためサンプルデータで動作します");
            print_report(FarmService::load(seed).await?, period).await
        }
    }
}

async fn print_report<S: StateStore>(
    service: FarmService<S>,
    period: ReportPeriod,
) -> Result<(), AppError> {
    let report = FarmReport {
        dashboard: service.dashboard().await,
        herd: service.herd_report().await,
        production: service.production_report(period).await,
        parentage_issues: service.read(|farm| farm.parentage_issues()).await,
    };

    if !report.parentage_issues.is_empty() {
        warn!(
            issues = report.parentage_issues.len(),
            "親子関係に性別の不整合があります"
        );
    }

    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| AppError::Serialization(e.to_string()))?;
    println!("{json}");
    Ok(())
}

/// エラーを標準エラー出力に書き出し、終了用のエラーに変換する
fn report_error(error: AppError, include_details: bool) -> anyhow::Error {
    let metadata = error.metadata();
    let severity = metadata.severity.as_str();
    if metadata.severity.needs_attention() {
        error!(code = %metadata.code, severity, retryable = metadata.retryable, "処理に失敗しました: {}", error);
    } else {
        warn!(code = %metadata.code, severity, retryable = metadata.retryable, "処理に失敗しました: {}", error);
    }

    match ErrorResponse::from_app_error(&error, include_details).to_json() {
        Ok(json) => eprintln!("{json}"),
        Err(e) => eprintln!("{e}"),
    }
    anyhow::Error::new(error)
}
