//! TrustCart smoke binary.
//!
//! Headless configuration and connectivity check: validates the environment,
//! constructs the identity gate and backend client, and (when smoke
//! credentials are configured) signs in and runs the backend liveness probe.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trustcart::backend::{BackendApi, HttpBackendClient};
use trustcart::config::Args;
use trustcart::identity::{IdentityGate, SupabaseAuth};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("trustcart={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  TrustCart - marketplace client");
    info!("======================================");
    info!("Client ID: {}", args.client_id);
    info!("Backend: {}", args.api_base_url);
    info!(
        "Identity provider: {}",
        args.provider_url().unwrap_or("(unconfigured, dev mode)")
    );
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("======================================");

    let Some(provider_url) = args.provider_url() else {
        info!("No identity provider configured; configuration check only");
        return Ok(());
    };
    let Some(anon_key) = args.supabase_anon_key.as_deref() else {
        info!("No provider key configured; configuration check only");
        return Ok(());
    };

    let timeout = Duration::from_millis(args.request_timeout_ms);
    let provider = Arc::new(SupabaseAuth::new(provider_url, anon_key, timeout)?);
    let gate = Arc::new(IdentityGate::new(provider));
    let backend = HttpBackendClient::new(&args.api_base_url, gate.clone(), timeout)?;

    let (Some(email), Some(password)) = (&args.smoke_email, &args.smoke_password) else {
        info!("No smoke credentials configured; skipping sign-in probe");
        return Ok(());
    };

    match gate.sign_in(email, password).await {
        Ok(session) => {
            info!(user = %session.user.email, "sign-in probe succeeded");
        }
        Err(e) => {
            warn!(error = %e, "sign-in probe failed");
            return Ok(());
        }
    }

    match backend.liveness().await {
        Ok(payload) => info!(%payload, "backend liveness probe succeeded"),
        Err(e) => warn!(error = %e, "backend liveness probe failed"),
    }

    gate.sign_out().await;
    Ok(())
}
