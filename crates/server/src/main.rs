//! Cafe Tutor Server Entry Point

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use tutor_config::{load_settings, Settings};
use tutor_server::{
    build_orchestrator, check_credentials, create_router, init_metrics, probe_completion,
    AppState, StartupError,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Priority: env vars > config/{env}.* > config/default.* > defaults
    let env = std::env::var("CAFE_TUTOR_ENV").ok();
    let config = match load_settings(env.as_deref()) {
        Ok(settings) => {
            // Tracing not yet initialized, use eprintln for early logging
            eprintln!(
                "Loaded configuration from files (env: {})",
                env.as_deref().unwrap_or("default")
            );
            settings
        }
        Err(e) => {
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            let mut settings = Settings::default();
            settings.apply_credential_fallback();
            settings
        }
    };

    init_tracing(&config);

    tracing::info!("Starting Cafe Tutor Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        environment = ?config.environment,
        config_path = env.as_deref().unwrap_or("default"),
        completion_model = %config.completion.model,
        speech_model = %config.speech.model,
        "Configuration loaded"
    );

    if let Err(e) = check_credentials(&config) {
        abort(e);
    }

    let orchestrator = match build_orchestrator(&config) {
        Ok(orchestrator) => Arc::new(orchestrator),
        Err(e) => abort(e),
    };

    if config.startup.probe_enabled {
        if let Err(e) = probe_completion(orchestrator.llm().as_ref(), &config.startup).await {
            abort(e);
        }
    } else {
        tracing::warn!("Connectivity probe disabled");
    }

    if config.observability.metrics_enabled && init_metrics().is_some() {
        tracing::info!("Initialized Prometheus metrics at /metrics");
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, orchestrator).with_env(env);
    let cleanup_shutdown = state.sessions.start_cleanup_task();

    let app = create_router(state);

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = cleanup_shutdown.send(true);
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Report a fatal startup condition and exit before serving anything
fn abort(error: StartupError) -> ! {
    tracing::error!(error = %error, "Startup check failed");
    eprintln!("{}", error.user_message());
    std::process::exit(1);
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.observability.log_level;
        format!("tutor={},tower_http=debug", level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}
