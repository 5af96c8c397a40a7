use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use log::*;

use k8s_username_injector::config::{InjectionSpec, InjectionTarget, ServerConfig};
use k8s_username_injector::mutation::MutationServer;
use k8s_username_injector::mutation_handler;

/// How long in-flight reviews may take to finish after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() {
    // Initialize logging, defaulting to info
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    info!("Starting k8s-username-injector");

    // Initialize rustls crypto provider
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install crypto provider"))?;

    let server_config = ServerConfig::from_env();

    // check that the cert and key files exist
    if !Path::new(&server_config.cert_path).exists() {
        bail!("TLS certificate file does not exist: {}", server_config.cert_path);
    }
    if !Path::new(&server_config.key_path).exists() {
        bail!("TLS key file does not exist: {}", server_config.key_path);
    }

    let tls_config = RustlsConfig::from_pem_file(&server_config.cert_path, &server_config.key_path)
        .await
        .context("failed to load TLS configuration")?;

    let spec = InjectionSpec::from_env();
    info!(
        "Injecting key '{}' (annotations: {}, labels: {})",
        spec.key(),
        spec.injects(InjectionTarget::Annotation),
        spec.injects(InjectionTarget::Label),
    );

    let app = mutation_handler::router(MutationServer::new(spec));

    let handle = Handle::new();
    tokio::spawn(shutdown_on_signal(handle.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], server_config.port));
    info!("Starting TLS server on {}", addr);

    axum_server::bind_rustls(addr, tls_config)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .context("server error")?;

    info!("Webhook server stopped");
    Ok(())
}

async fn shutdown_on_signal(handle: Handle) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for ctrl-c: {}", e);
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
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Got shutdown signal, shutting down webhook server gracefully...");
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}
