//! OCPP Gateway
//!
//! Device-facing OCPP-J WebSocket gateway for a multi-tenant charging
//! station backend. Reads configuration from a TOML file
//! (`$OCPP_GATEWAY_CONFIG` or ~/.config/ocpp-gateway/config.toml).

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use ocpp_gateway::application::charging::dispatch::{CommandDispatcher, HandlerRegistry};
use ocpp_gateway::application::charging::services::ChargingStationService;
use ocpp_gateway::application::charging::session::{HostAffinity, SessionRegistry, SessionServices};
use ocpp_gateway::application::charging::LoggingMessageTracer;
use ocpp_gateway::application::locking::LockingManager;
use ocpp_gateway::application::scheduler::{CheckChargingStationTemplateTask, TenantScheduler};
use ocpp_gateway::config::LoggingConfig;
use ocpp_gateway::domain::RepositoryProvider;
use ocpp_gateway::infrastructure::StaticTemplateResolver;
use ocpp_gateway::shared::shutdown::ShutdownSignal;
use ocpp_gateway::{
    config_path_from_env, init_database, run_migrations, AppConfig, OcppServer,
    SeaOrmRepositoryProvider,
};

fn init_logging(cfg: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.level));
    if cfg.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // ── Load configuration ─────────────────────────────────────
    let config_path = config_path_from_env();
    let app_cfg = match AppConfig::load(&config_path) {
        Ok(cfg) => {
            init_logging(&cfg.logging);
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            init_logging(&LoggingConfig::default());
            error!(error = %e, "Failed to load config. Using defaults.");
            AppConfig::default()
        }
    };

    info!("Starting OCPP gateway...");

    // ── Prometheus metrics recorder (must be installed before any metrics calls) ──
    if app_cfg.metrics.enabled {
        let listen: SocketAddr = app_cfg.metrics.listen.parse()?;
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(listen)
            .install()?;
        info!(%listen, "📊 Prometheus exporter listening");
    }

    // ── Database ───────────────────────────────────────────────
    let db_config = app_cfg.database.clone().with_env_override();
    let db = match init_database(&db_config).await {
        Ok(db) => db,
        Err(e) => {
            error!(error = %e, "Failed to connect to database");
            return Err(e.into());
        }
    };
    if let Err(e) = run_migrations(&db).await {
        error!(error = %e, "Failed to run migrations");
        return Err(e.into());
    }

    let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db.clone()));
    let tenants = repos.tenants().find_all().await?;
    if tenants.is_empty() {
        warn!("No tenants configured, every connection will be refused");
    } else {
        info!(count = tenants.len(), "Tenants loaded");
    }

    // ── Charging station core ──────────────────────────────────
    let stations = Arc::new(
        ChargingStationService::new(repos.clone())
            .with_heartbeat_interval(app_cfg.server.heartbeat_interval),
    );
    let handlers = Arc::new(HandlerRegistry::v16_defaults(stations.clone())?);
    info!(handlers = handlers.len(), "OCPP 1.6 handlers bound");
    let dispatcher = Arc::new(CommandDispatcher::new(
        handlers,
        Arc::new(LoggingMessageTracer::new()),
    ));
    let services = SessionServices {
        dispatcher,
        stations,
        host: HostAffinity {
            ip: app_cfg.server.instance_ip.clone(),
            name: app_cfg.server.instance_name.clone(),
        },
        monitoring: app_cfg.metrics.enabled,
    };

    // Initialize shutdown signal
    let shutdown = ShutdownSignal::new();
    shutdown.listen_for_os_signals();

    // ── Fleet maintenance ──────────────────────────────────────
    let scheduler_handle = if app_cfg.scheduler.enabled {
        let host_name = app_cfg
            .server
            .instance_name
            .clone()
            .unwrap_or_else(|| "ocpp-gateway".to_string());
        let locking = Arc::new(
            LockingManager::new(repos.clone(), app_cfg.locking.expiry_secs).with_host_name(host_name),
        );
        let resolver = Arc::new(StaticTemplateResolver::new(app_cfg.templates.clone()));
        info!(templates = resolver.len(), "📋 Static templates loaded");

        let template_task = CheckChargingStationTemplateTask::new(repos.clone(), locking, resolver)
            .with_page_size(app_cfg.scheduler.batch_page_size);
        let scheduler = Arc::new(TenantScheduler::new(repos.clone()).with_task(Arc::new(template_task)));
        Some(scheduler.start(app_cfg.scheduler.interval_secs, shutdown.clone()))
    } else {
        info!("Scheduler disabled");
        None
    };

    // ── WebSocket server ───────────────────────────────────────
    let server = OcppServer::new(&app_cfg.server, services, repos, SessionRegistry::shared())
        .with_shutdown(shutdown.clone());

    info!("🚀 Gateway started. Press Ctrl+C to shutdown gracefully.");
    match tokio::spawn(async move { server.run().await }).await {
        Ok(Ok(())) => info!("WebSocket server stopped"),
        Ok(Err(e)) => error!(error = %e, "WebSocket server error"),
        Err(e) => error!(error = %e, "WebSocket server task panicked"),
    }

    // Server errors also stop the scheduler
    shutdown.trigger();
    if let Some(handle) = scheduler_handle {
        if let Err(e) = handle.await {
            warn!(error = %e, "Scheduler task ended abnormally");
        }
    }

    // Perform final cleanup
    info!("🧹 Performing final cleanup...");
    if let Err(e) = db.close().await {
        warn!(error = %e, "Error closing database connection");
    } else {
        info!("✅ Database connection closed");
    }

    info!("👋 OCPP gateway shutdown complete");
    Ok(())
}
