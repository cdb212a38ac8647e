#![allow(clippy::cognitive_complexity)]
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};

mod startup_health;

use dash_core::{
    config::{
        cli::{self, Parser},
        trace,
    },
    tokio::{self, runtime::Builder, signal},
    tracing::*,
};
use dashboard::{Dashboard, Health};
use host_registry::{FileStore, HostRegistry};
use startup_health::verify_background_task_running;
use sys_actions::{Actions, ActionsConfig, SystemRunner};

#[cfg(not(target_env = "musl"))]
use jemallocator::Jemalloc;
use tokio_util::sync::CancellationToken;

#[cfg(not(target_env = "musl"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn main() -> Result<()> {
    // .env must be in the environment before clap reads it
    let dotenv_res = dotenv::dotenv();
    // parses from cli or environment var
    let config = cli::Config::parse();
    let trace_config = trace::Config::parse(&config.dash_log, Some(config.log_file.as_path()))?;
    debug!(?config, ?trace_config);
    match dotenv_res {
        Ok(path) => debug!(path = %path.display(), "loaded .env file"),
        Err(err) => debug!(?err, ".env file not loaded"),
    }

    let mut builder = Builder::new_multi_thread();
    // configure thread name & enable IO/time
    builder.thread_name(&config.thread_name).enable_all();
    // default num threads will be num logical CPUs
    // if we have a configured value here, set it
    if let Some(num) = config.threads {
        builder.worker_threads(num);
    }
    // build the runtime
    let rt = builder.build()?;

    rt.block_on(async move {
        match tokio::spawn(async move { start(config).await }).await {
            Err(err) => error!(?err, "failed to start dashboard"),
            Ok(Err(err)) => error!(?err, "exited with error"),
            Ok(_) => debug!("exiting..."),
        }
    });

    Ok(())
}

fn actions_config(config: &cli::Config) -> ActionsConfig {
    ActionsConfig {
        service: config.service_name.clone(),
        conf_path: config.conf_path.clone(),
        wpa_conf_path: config.wpa_conf_path.clone(),
        wifi_interface: config.wifi_interface.clone(),
        wifi_country: config.wifi_country.clone(),
        wifi_poll_attempts: config.wifi_poll_attempts,
        ..ActionsConfig::default()
    }
}

async fn start(config: cli::Config) -> Result<()> {
    info!(conf_path = %config.conf_path.display(), "using dnsmasq config");
    if !config.conf_path.exists() {
        warn!(
            conf_path = %config.conf_path.display(),
            "dnsmasq config not found, no hosts will be listed until it exists"
        );
    }

    let registry = Arc::new(HostRegistry::new(FileStore::new(&config.conf_path)));
    let actions = Arc::new(Actions::new(
        SystemRunner::new(config.use_sudo()),
        actions_config(&config),
    ));
    info!(sudo = config.use_sudo(), service = %config.service_name, "system actions ready");

    let dash = Dashboard::new(config.bind_addr, registry, actions, &config.log_file);

    let token = CancellationToken::new();
    let dash_sender = dash.sender();
    let mut dash_task = dash.start(token.clone());

    // Keep health BAD until the dashboard is confirmed running.
    if let Err(err) = verify_background_task_running("dashboard", &mut dash_task)
        .await
        .context("startup check failed")
    {
        token.cancel();
        return Err(err);
    }

    debug!("changing health to good after startup checks passed");
    dash_sender
        .send(Health::Good)
        .await
        .context("error occurred in changing health status to Good")?;

    if let Err(err) = shutdown_signal(token.clone()).await {
        error!(?err, "error waiting for shutdown signal");
    }
    info!("shutting down");
    if let Err(err) = dash_task.await {
        error!(?err, "error waiting for dashboard");
    }
    Ok(())
}

async fn shutdown_signal(token: CancellationToken) -> Result<()> {
    let ret = signal::ctrl_c().await.map_err(|err| anyhow!(err));
    token.cancel();
    ret
}
