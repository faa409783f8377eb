//! Fieldops - Bootstrap Entry Point
//!
//! Loads configuration, brings the SDKs up in parallel and loads the first
//! page of the personnel list. Usage: `fieldops [config.toml]`

use anyhow::Context;
use fieldops::api::{OrganizationApi, Personnel};
use fieldops::config::{AppConfig, LogConfig};
use fieldops::helpers::{get_or_create_log_dir, is_development};
use fieldops::http::{HttpClient, SessionToken, notice_channel};
use fieldops::list::RefreshList;
use fieldops::sdk::{HeadlessBridge, HttpScriptHost, SdkRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

fn init_tracing(config: &LogConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let level = config.level.as_deref().unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let log_dir = match config.dir.as_deref().filter(|d| !d.is_empty()) {
        Some(dir) => Some(PathBuf::from(dir)),
        None if !is_development() => Some(get_or_create_log_dir()?),
        None => None,
    };

    let Some(log_dir) = log_dir else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return Ok(None);
    };

    let appender = tracing_appender::rolling::daily(&log_dir, "fieldops.log");
    let (file, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr.and(file))
        .with_ansi(false)
        .init();
    Ok(Some(guard))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref()).context("failed to load configuration")?;
    let _guard = init_tracing(&config.log).context("failed to initialize logging")?;

    tracing::info!("Starting fieldops (router mode: {:?})", config.router_mode);

    let (notice_tx, notices) = notice_channel();
    let http = HttpClient::new(&config.api, SessionToken::new())?.with_notices(notice_tx);

    let scripts = Arc::new(HttpScriptHost::new(Duration::from_millis(config.sdk.timeout_ms))?);
    let registry = SdkRegistry::from_config(&config, http.clone(), scripts, Arc::new(HeadlessBridge::new()))?;

    // A failed SDK must not stop startup
    let report = registry.bootstrap().await;
    tracing::info!("SDKs ready: map={} wecom={}", report.map, report.wecom);

    let personnel = RefreshList::<Personnel>::new(OrganizationApi::new(http))
        .with_page_size(config.list.page_size);
    let outcome = personnel.load_more().await;
    let snapshot = personnel.snapshot();
    tracing::info!(
        "Personnel first page: {:?} ({} of {} loaded, exhausted={})",
        outcome,
        snapshot.len,
        snapshot.total_count,
        snapshot.is_exhausted
    );

    for notice in notices.try_iter() {
        if notice.is_loading_event() {
            tracing::debug!("loading indicator: {:?}", notice.level);
        } else {
            tracing::warn!("[{:?}] {}", notice.level, notice.message);
        }
    }

    Ok(())
}
