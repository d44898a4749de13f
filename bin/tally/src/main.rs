//! Tally - wallet transaction history service.
//!
//! # Usage
//!
//! ```bash
//! # Start against devnet with default config
//! tally
//!
//! # Start with environment overrides
//! RPC_URL=https://api.mainnet-beta.solana.com CLUSTER=mainnet tally
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::signal;
use tokio::sync::watch;
use tracing::{Instrument, debug, error, info, info_span, warn};
use tracing_subscriber::{EnvFilter, fmt};

use tally_core::error::{TallyError, TallyResult};
use tally_core::metrics::init_metrics;
use tally_core::models::{Cluster, NATIVE_TOKEN};
use tally_core::ports::{LedgerSource, MAX_HISTORY_LIMIT};
use tally_core::services::{HistoryConfig, HistoryService};
use tally_graphql::{SchemaConfig, ServerConfig, SharedHistoryService, build_schema, serve_with_shutdown};
use tally_solana::{Commitment, SolanaClientConfig, SolanaRpcClient};

/// Tally CLI - wallet transaction history.
#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(about = "Tally - Solana wallet transaction history service")]
#[command(version)]
struct Cli {
    /// Solana JSON-RPC endpoint.
    #[arg(long, env = "RPC_URL", default_value = "https://api.devnet.solana.com")]
    rpc_url: String,

    /// Per-request RPC timeout in seconds.
    #[arg(long, env = "RPC_TIMEOUT_SECS", default_value = "30")]
    rpc_timeout_secs: u64,

    /// Commitment level: confirmed or finalized.
    #[arg(long, env = "COMMITMENT", default_value = "confirmed", value_parser = parse_commitment)]
    commitment: Commitment,

    /// Cluster used for explorer links: mainnet, devnet or testnet.
    #[arg(long, env = "CLUSTER", default_value = "devnet", value_parser = parse_cluster)]
    cluster: Cluster,

    /// Transactions per page when the client does not ask for a size.
    #[arg(long, env = "HISTORY_LIMIT", default_value = "20")]
    history_limit: usize,

    /// Transaction details fetched in parallel per request.
    #[arg(long, env = "MAX_CONCURRENT_FETCHES", default_value = "4")]
    max_concurrent_fetches: usize,

    /// Serve synthetic history when a wallet has no decodable transactions.
    #[arg(long, env = "FALLBACK_ON_EMPTY")]
    fallback_on_empty: bool,

    /// GraphQL server port.
    #[arg(long, env = "GRAPHQL_PORT", default_value = "4000")]
    graphql_port: u16,

    /// Prometheus metrics port.
    #[arg(long, env = "METRICS_PORT", default_value = "9090")]
    metrics_port: u16,

    /// Enable JSON log output.
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

fn parse_commitment(s: &str) -> Result<Commitment, String> {
    s.parse().map_err(|e: tally_core::error::DomainError| e.to_string())
}

fn parse_cluster(s: &str) -> Result<Cluster, String> {
    s.parse().map_err(|e: tally_core::error::DomainError| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);

    // Prometheus metrics exporter (optional - failures don't crash the app)
    let metrics_enabled = match format!("0.0.0.0:{}", cli.metrics_port).parse::<std::net::SocketAddr>() {
        Ok(metrics_addr) => {
            match PrometheusBuilder::new()
                .with_http_listener(metrics_addr)
                .install()
            {
                Ok(()) => {
                    init_metrics();
                    true
                }
                Err(e) => {
                    warn!("⚠️  Failed to start metrics exporter: {}. Continuing without metrics.", e);
                    false
                }
            }
        }
        Err(e) => {
            warn!("⚠️  Invalid metrics address: {}. Continuing without metrics.", e);
            false
        }
    };

    // ─────────────────────────────────────────────────────────────────────────
    // 🚀 STARTUP
    // ─────────────────────────────────────────────────────────────────────────
    info!("🚀 Starting Tally");
    debug!(rpc_url = %mask_credentials(&cli.rpc_url), commitment = %cli.commitment, "Solana endpoint");

    // ─────────────────────────────────────────────────────────────────────────
    // 📡 SOLANA RPC
    // ─────────────────────────────────────────────────────────────────────────
    let history_config = history_config(&cli).context("Invalid history settings")?;
    let client = ledger_client(&cli).context("Failed to build Solana RPC client")?;

    // An unreachable node is not fatal: history requests fall back to
    // synthetic data until it comes back.
    match client.current_slot().await {
        Ok(slot) => info!(slot, cluster = ?cli.cluster, "🔗 Ledger reachable"),
        Err(e) => warn!(error = %e, "⚠️  Ledger unreachable, history will be synthetic until it recovers"),
    }

    let source: Arc<dyn LedgerSource> = Arc::new(client);

    let service: SharedHistoryService = Arc::new(HistoryService::new(history_config, source));

    // ─────────────────────────────────────────────────────────────────────────
    // ⚡ SERVICES START
    // ─────────────────────────────────────────────────────────────────────────
    let (shutdown_tx, mut graphql_shutdown_rx) = watch::channel(false);

    let graphql_config = ServerConfig {
        host: "0.0.0.0".to_string(),
        port: cli.graphql_port,
        enable_playground: true,
    };

    // Includes DoS protection: depth limit, complexity limit
    let schema = build_schema(
        service,
        SchemaConfig {
            cluster: cli.cluster,
            default_page_size: cli.history_limit,
        },
    );

    let graphql_port = cli.graphql_port;
    let graphql_handle = tokio::spawn(
        async move {
            let shutdown_signal = async move {
                while !*graphql_shutdown_rx.borrow() {
                    if graphql_shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
            };

            if let Err(e) = serve_with_shutdown(schema, graphql_config, shutdown_signal).await {
                error!(error = %e, "❌ Server error");
            }
            debug!("Server stopped");
        }
        .instrument(info_span!("graphql")),
    );

    // ─────────────────────────────────────────────────────────────────────────
    // ✅ READY
    // ─────────────────────────────────────────────────────────────────────────
    info!("✅ Tally ready");
    info!("   ⚡ GraphQL:  http://localhost:{}/graphql", graphql_port);
    if metrics_enabled {
        info!(
            "   📊 Metrics:  http://localhost:{}/metrics",
            cli.metrics_port
        );
    } else {
        info!("   📊 Metrics:  disabled");
    }
    info!("   Press Ctrl+C to stop");

    shutdown_signal().await;

    // ─────────────────────────────────────────────────────────────────────────
    // 🛑 SHUTDOWN
    // ─────────────────────────────────────────────────────────────────────────
    info!("🛑 Shutting down...");
    let _ = shutdown_tx.send(true);

    match tokio::time::timeout(Duration::from_secs(10), graphql_handle).await {
        Ok(_) => debug!("GraphQL stopped"),
        Err(_) => warn!("⚠️  GraphQL shutdown timed out"),
    }

    info!("🛑 Shutdown complete");
    Ok(())
}

/// Solana client from CLI settings.
fn ledger_client(cli: &Cli) -> TallyResult<SolanaRpcClient> {
    if cli.rpc_timeout_secs == 0 {
        return Err(TallyError::ConfigError(
            "--rpc-timeout-secs must be at least 1".to_string(),
        ));
    }

    Ok(SolanaRpcClient::new(SolanaClientConfig {
        rpc_url: cli.rpc_url.clone(),
        timeout: Duration::from_secs(cli.rpc_timeout_secs),
        commitment: cli.commitment,
    })?)
}

/// History service settings from CLI settings.
fn history_config(cli: &Cli) -> TallyResult<HistoryConfig> {
    if cli.history_limit == 0 || cli.history_limit > MAX_HISTORY_LIMIT {
        return Err(TallyError::ConfigError(format!(
            "--history-limit must be between 1 and {}",
            MAX_HISTORY_LIMIT
        )));
    }
    if cli.max_concurrent_fetches == 0 {
        return Err(TallyError::ConfigError(
            "--max-concurrent-fetches must be at least 1".to_string(),
        ));
    }

    Ok(HistoryConfig {
        native_token: NATIVE_TOKEN.to_string(),
        max_concurrent_fetches: cli.max_concurrent_fetches,
        fallback_on_empty: cli.fallback_on_empty,
    })
}

/// Initialize tracing subscriber.
fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    }
}

/// Mask credentials in an RPC URL for logging (paid endpoints embed keys).
fn mask_credentials(url_str: &str) -> String {
    match url::Url::parse(url_str) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("****"));
            }
            let has_key = url.query_pairs().any(|(k, _)| k == "api-key");
            if has_key {
                let pairs: Vec<(String, String)> = url
                    .query_pairs()
                    .map(|(k, v)| {
                        let v = if k == "api-key" { "****".into() } else { v.into_owned() };
                        (k.into_owned(), v)
                    })
                    .collect();
                url.query_pairs_mut().clear().extend_pairs(pairs);
            }
            url.to_string()
        }
        Err(_) => url_str.to_string(),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
