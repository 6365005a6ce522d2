// # ddnsd - DDNS Daemon
//
// This is a THIN integration layer. All discovery, selection and update
// logic lives in ddns-core and the source/provider crates.
//
// The ddnsd daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Wiring the IPv4 source, IPv6 source and provider into the engine
// 4. Running the engine until SIGTERM/SIGINT
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Required
// - `DOMAIN`: Domain name submitted on every update
// - `TOKEN`: Provider token (sent as the `token` query parameter)
// - `API_URL`: Base URL of the provider's update endpoint
//
// ### Optional
// - `DDNS_INTERVAL_SECS`: Seconds between iterations (default 60)
// - `DDNS_IPV6_PREFIX`: Required textual prefix of the IPv6 address (default "240", empty = any)
// - `DDNS_IPV4_ECHO_URL`: IPv4 echo service (default https://ddns.oray.com/checkip)
// - `DDNS_USER_AGENT`: User-Agent sent to the echo service
// - `DDNS_HTTP_TIMEOUT_SECS`: Per-request timeout (default 10)
// - `DDNS_IPV4_ERROR_POLICY`: unusable | skip-iteration (default unusable)
// - `DDNS_DRY_RUN`: Log updates instead of sending them (default false)
// - `DDNS_LOG_LEVEL`: trace | debug | info | warn | error (default info)
//
// ## Example
//
// ```bash
// export DOMAIN=home.example.com
// export TOKEN=your_token
// export API_URL=https://dns.example.net/update
//
// ddnsd
// ```

use anyhow::Result;
use ddns_core::{DdnsConfig, DdnsEngine};
use ddns_ip_http::HttpIpSource;
use ddns_ip_local::LocalIpv6Source;
use ddns_provider_callback::CallbackProvider;
use std::env;
use std::process::ExitCode;
use tokio::sync::oneshot;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

const ENV_LOG_LEVEL: &str = "DDNS_LOG_LEVEL";

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Parse a log level name
fn parse_log_level(value: &str) -> Result<Level> {
    match value.trim().to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "{} '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            ENV_LOG_LEVEL,
            value
        ),
    }
}

fn main() -> ExitCode {
    // Initialize tracing first so configuration errors go through the same output
    let log_level = match parse_log_level(
        &env::var(ENV_LOG_LEVEL).unwrap_or_else(|_| "info".to_string()),
    ) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    // Load and validate configuration before any network activity
    let config = match DdnsConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    info!("Starting ddnsd daemon");
    info!(
        domain = %config.credential.domain,
        interval_secs = config.interval.as_secs(),
        ipv6_prefix = %config.ipv6_prefix,
        "Configuration loaded"
    );

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {}", e);
            DdnsExitCode::RuntimeError
        } else {
            DdnsExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: DdnsConfig) -> Result<()> {
    let ipv4_source = HttpIpSource::from_config(&config)?;
    let ipv6_source = LocalIpv6Source::from_config(&config);
    let provider = CallbackProvider::from_config(&config)?;

    if provider.is_dry_run() {
        warn!("Dry-run mode: DNS updates will be logged, not sent");
    }

    // Nobody subscribes to engine events here; the engine logs on its own
    let (engine, _) = DdnsEngine::new(
        Box::new(ipv4_source),
        Box::new(ipv6_source),
        Box::new(provider),
        &config,
    )?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    tokio::spawn(async move {
        match wait_for_shutdown_signal().await {
            Ok(signal) => info!("Received shutdown signal: {}", signal),
            Err(e) => {
                // Without signal handling the process runs until killed
                error!("Shutdown signal error: {}", e);
                std::future::pending::<()>().await;
            }
        }
        let _ = shutdown_tx.send(());
    });

    info!("Starting DDNS engine");
    engine.run_with_shutdown(shutdown_rx).await?;
    info!("Shutting down daemon");

    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };

    Ok(signal)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
