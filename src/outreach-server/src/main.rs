//! Outreach Engine — lead outreach campaign manager.
//!
//! Main entry point: wires the store, providers, and scheduled tasks
//! together and starts the API server.

use clap::Parser;
use outreach_ai::{ClaudeConfig, ClaudeGenerator};
use outreach_api::{api_router, AppState};
use outreach_core::config::AppConfig;
use outreach_dispatch::CampaignDispatcher;
use outreach_performance::PerformanceEvaluator;
use outreach_store::{OutreachStore, SenderIdentity};
use outreach_tracking::EngagementProcessor;
use outreach_transport::{ResendConfig, ResendTransport};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "outreach-server")]
#[command(about = "Lead outreach campaign manager")]
#[command(version)]
struct Cli {
    /// HTTP port (overrides config)
    #[arg(long, env = "OUTREACH__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Dispatch loop period in seconds (overrides config)
    #[arg(long, env = "OUTREACH__SCHEDULER__DISPATCH_INTERVAL_SECS")]
    dispatch_interval: Option<u64>,

    /// Skip the scheduled tasks (API-only mode; cron endpoints still work)
    #[arg(long, default_value_t = false)]
    api_only: bool,

    /// Seed demo leads, a template, and a draft campaign at startup
    #[arg(long, default_value_t = false)]
    seed_demo: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "outreach=info,outreach_server=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("Outreach Engine starting up");

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(secs) = cli.dispatch_interval {
        config.scheduler.dispatch_interval_secs = secs;
    }

    info!(
        http_port = config.api.http_port,
        dispatch_interval_secs = config.scheduler.dispatch_interval_secs,
        sender = %config.sender.email,
        "Configuration loaded"
    );

    let store = Arc::new(OutreachStore::new());
    if cli.seed_demo {
        let demo_user = uuid::Uuid::new_v4();
        store.seed_demo_data(demo_user);
        info!(user_id = %demo_user, "Demo data seeded");
    }

    let sender = SenderIdentity {
        name: config.sender.name.clone(),
        email: config.sender.email.clone(),
        public_url: config.sender.public_url.clone(),
    };
    let transport = Arc::new(ResendTransport::new(ResendConfig {
        api_key: config.transport.api_key.clone(),
    }));
    let generator = Arc::new(ClaudeGenerator::new(ClaudeConfig {
        api_key: config.ai.api_key.clone(),
        model: config.ai.model.clone(),
    }));

    let dispatcher = Arc::new(CampaignDispatcher::new(
        store.clone(),
        transport,
        sender.clone(),
        Duration::from_millis(config.transport.send_timeout_ms),
    ));
    let evaluator = Arc::new(PerformanceEvaluator::new(store.clone()));
    let processor = Arc::new(EngagementProcessor::new(store.clone()));

    // Start metrics exporter
    let metrics_addr = SocketAddr::new(config.api.host.parse()?, config.api.metrics_port);
    if let Err(e) = metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
    {
        error!(error = %e, "Failed to start metrics exporter");
    } else {
        info!(port = config.api.metrics_port, "Metrics exporter started");
    }

    // Spawn the scheduled tasks (unless API-only mode)
    if !cli.api_only {
        let dispatch_task = dispatcher.clone();
        let dispatch_period = Duration::from_secs(config.scheduler.dispatch_interval_secs);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(dispatch_period);
            loop {
                interval.tick().await;
                let report = dispatch_task.run_once(chrono::Utc::now()).await;
                if report.total_sent() > 0 || !report.completed.is_empty() {
                    info!(
                        sent = report.total_sent(),
                        completed = report.completed.len(),
                        "Scheduled dispatch run finished"
                    );
                }
            }
        });

        let evaluator_task = evaluator.clone();
        let evaluation_period = Duration::from_secs(config.scheduler.performance_interval_secs);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(evaluation_period);
            // The first tick fires immediately; an evaluation at startup
            // is harmless and keeps the loop simple.
            loop {
                interval.tick().await;
                let report = evaluator_task.run_once();
                info!(
                    updated = report.variations_updated,
                    winners = report.winners_marked,
                    "Scheduled performance evaluation finished"
                );
            }
        });
    } else {
        info!("Running in API-only mode (no scheduled tasks)");
    }

    // Start HTTP server (blocks until shutdown)
    let app = api_router(AppState {
        store,
        dispatcher,
        evaluator,
        processor,
        generator,
        sender,
    });
    let addr = SocketAddr::new(config.api.host.parse()?, config.api.http_port);
    info!(addr = %addr, "Outreach Engine is ready to serve traffic");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
