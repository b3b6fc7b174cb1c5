use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::Config;

/// 初始化日志：控制台输出到stderr，同时追加写入logs目录下的app.log
///
/// 过滤级别优先读取`RUST_LOG`，否则为info，verbose时为debug。
/// 全局subscriber已存在时保持原样。
pub fn init(config: &Config) -> Result<()> {
    fs::create_dir_all(&config.logs_path).context(format!(
        "Failed to create logs directory {}",
        config.logs_path.display()
    ))?;
    let log_path = config.app_log_path();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .context(format!("Failed to open log file {}", log_path.display()))?;

    let default_level = if config.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_log_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            logs_path: temp_dir.path().join("logs"),
            ..Default::default()
        };

        init(&config).unwrap();
        // 重复初始化不报错
        init(&config).unwrap();

        assert!(config.app_log_path().exists());
    }
}
