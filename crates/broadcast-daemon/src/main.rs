//! # broadcast-daemon
//!
//! Broadcast service binary: loads settings, builds the transport and
//! dispatcher, starts the session janitor and serves HTTP until signalled.

#![deny(unsafe_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use broadcast_dispatch::{DelayWindow, DispatchConfig, Dispatcher};
use broadcast_janitor::{JanitorTask, SessionJanitor};
use broadcast_server::{BroadcastServer, ServerConfig};
use broadcast_settings::{BroadcastSettings, DispatchSettings, ServerSettings};
use broadcast_transport::{HttpTransport, RecordingTransport, Transport};
use clap::Parser;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Bulk message broadcast service.
#[derive(Parser, Debug)]
#[command(name = "broadcast-daemon", about = "Bulk message broadcast service")]
struct Cli {
    /// Settings file (defaults to `~/.broadcast/settings.json`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides settings, 0 for auto-assign).
    #[arg(long)]
    port: Option<u16>,

    /// Record sends in memory instead of calling the messaging gateway.
    #[arg(long)]
    dry_run: bool,

    /// Emit JSON log lines.
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn load_settings(&self) -> Result<BroadcastSettings> {
        let path = self
            .config
            .clone()
            .unwrap_or_else(broadcast_settings::settings_path);
        let mut settings = broadcast_settings::load_settings_from_path(&path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?;

        if let Some(host) = &self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if self.log_json {
            settings.logging.json = true;
        }
        Ok(settings)
    }
}

fn server_config(settings: &ServerSettings) -> ServerConfig {
    ServerConfig {
        host: settings.host.clone(),
        port: settings.port,
        allowed_origins: settings.allowed_origins.clone(),
        max_body_bytes: settings.max_body_bytes,
        upload_dir: settings.upload_dir.clone(),
        upload_stem: settings.upload_stem.clone(),
        qr_path: settings.qr_path.clone(),
    }
}

fn dispatch_config(settings: &DispatchSettings) -> DispatchConfig {
    DispatchConfig {
        country_code: settings.country_code.clone(),
        address_suffix: settings.address_suffix.clone(),
        delay: DelayWindow::new(settings.min_delay_ms, settings.max_delay_ms),
    }
}

fn build_transport(settings: &BroadcastSettings, dry_run: bool) -> Result<Arc<dyn Transport>> {
    if dry_run {
        warn!("dry run: sends are recorded, nothing reaches the gateway");
        return Ok(Arc::new(RecordingTransport::new()));
    }
    let transport = HttpTransport::new(
        settings.transport.base_url.clone(),
        Duration::from_millis(settings.transport.timeout_ms),
    )
    .context("Failed to build messaging gateway client")?;
    info!(base_url = transport.base_url(), "messaging gateway configured");
    Ok(Arc::new(transport))
}

/// A started service: the server plus the background tasks to drain on exit.
struct Service {
    server: BroadcastServer,
    addr: SocketAddr,
    handles: Vec<JoinHandle<()>>,
}

impl Service {
    async fn start(settings: &BroadcastSettings, dry_run: bool) -> Result<Self> {
        let transport = build_transport(settings, dry_run)?;
        let dispatcher = Dispatcher::new(transport, dispatch_config(&settings.dispatch));
        let policy = dispatcher.config();
        info!(
            country_code = %policy.country_code,
            min_delay_ms = policy.delay.min_ms(),
            max_delay_ms = policy.delay.max_ms(),
            "dispatcher configured"
        );

        let mut server = BroadcastServer::new(server_config(&settings.server), dispatcher);
        match broadcast_server::metrics::install_recorder() {
            Ok(handle) => server = server.with_metrics(handle),
            Err(e) => warn!(error = %e, "metrics disabled"),
        }

        let (addr, server_handle) = server.listen().await.context("Failed to bind server")?;
        let mut handles = vec![server_handle];

        if settings.janitor.enabled {
            let janitor = SessionJanitor::new(
                settings.janitor.session_dir.clone(),
                settings.janitor.extension.clone(),
                settings.janitor.protected.clone(),
            );
            let task = JanitorTask::spawn(
                Arc::new(janitor),
                settings.janitor.interval(),
                settings.janitor.run_on_start,
                server.shutdown().token(),
            );
            handles.push(task.into_handle());
        } else {
            info!("session janitor disabled");
        }

        Ok(Self {
            server,
            addr,
            handles,
        })
    }

    async fn stop(self) {
        if self.server.dispatcher().cancel_campaign() {
            info!("cancelled running campaign");
        }
        self.server
            .shutdown()
            .graceful_shutdown(self.handles, None)
            .await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let settings = args.load_settings()?;

    if settings.logging.json {
        broadcast_core::logging::init_json_subscriber(&settings.logging.level);
    } else {
        broadcast_core::logging::init_subscriber(&settings.logging.level);
    }

    let service = Service::start(&settings, args.dry_run).await?;
    info!("broadcast service listening on http://{}", service.addr);

    service.server.shutdown().wait_for_signal().await;
    service.stop().await;

    info!("shutdown complete");
    Ok(())
}
