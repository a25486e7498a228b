use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// トレーシングサブスクライバーを初期化
///
/// ログレベルは `RUST_LOG` で指定する。二重初期化はエラーとして返す。
pub fn init_tracing() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .json(), // 標準出力はレポート用に空けておく
        )
        .with(EnvFilter::from_default_env())
        .try_init()?;

    Ok(())
}
