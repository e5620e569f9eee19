// # dnsdriftd - DNS drift monitoring daemon
//
// This is a THIN integration layer only. All monitoring logic lives in
// dnsdrift-core; the daemon is responsible for:
//
// 1. Reading configuration from environment variables
// 2. Loading the records file
// 3. Registering resolver/notifier/store backends
// 4. Starting the monitor engine and handling signals
//
// ## Configuration
//
// All daemon configuration is via environment variables:
//
// ### Records
// - `DNSDRIFT_RECORDS_PATH`: JSON records file (default "dnsdrift-records.json").
//   Format: `[{"fqdn": "example.com", "type": "A", "expected_values": ["1.1.1.1"]}]`
//
// ### Resolver
// - `DNSDRIFT_DNS_SERVER`: primary upstream as "ip:port" (required)
// - `DNSDRIFT_DNS_SERVER_2`: secondary upstream, tried when the primary fails
// - `DNSDRIFT_DNS_TIMEOUT_SECS`: per-query timeout (default 2)
// - `DNSDRIFT_USE_IPV4` / `DNSDRIFT_USE_IPV6`: eligible upstream address
//   families (defaults: IPv4 on, IPv6 off)
// - `DNSDRIFT_USE_TCP`: query over TCP instead of UDP (default off)
//
// ### Intervals
// - `DNSDRIFT_CHECK_INTERVAL_SECS`: seconds between evaluation cycles (default 60)
// - `DNSDRIFT_REFRESH_INTERVAL_SECS`: seconds between snapshot refreshes (default 1)
//
// ### Baseline store
// - `DNSDRIFT_STORE_TYPE`: disabled, memory or file (default disabled)
// - `DNSDRIFT_STORE_PATH`: baseline file path (required for file store)
// - `DNSDRIFT_STORE_KEY_PREFIX`: optional entry key namespace
//
// ### Notifier
// - `DNSDRIFT_NOTIFIER_TYPE`: log or webhook (default log)
// - `DNSDRIFT_WEBHOOK_URL`: endpoint URL (required for webhook)
//
// ### Normalization
// - `DNSDRIFT_EXPAND_TABS`: expand tabs in answer values (default off)
// - `DNSDRIFT_TAB_WIDTH`: spaces per tab when expanding (default 4)
// - `DNSDRIFT_IMPRECISE_MATCH`: strip a trailing root dot (default off)
//
// ### Logging
// - `DNSDRIFT_LOG_LEVEL`: trace, debug, info, warn or error (default info)
// - `DNSDRIFT_LOG_RECORDS`: log detector inputs per record (default off)
//
// ## Example
//
// ```bash
// export DNSDRIFT_DNS_SERVER=9.9.9.9:53
// export DNSDRIFT_DNS_SERVER_2=149.112.112.112:53
// export DNSDRIFT_RECORDS_PATH=/etc/dnsdrift/records.json
// export DNSDRIFT_STORE_TYPE=file
// export DNSDRIFT_STORE_PATH=/var/lib/dnsdrift/baseline.json
// export DNSDRIFT_NOTIFIER_TYPE=webhook
// export DNSDRIFT_WEBHOOK_URL=https://hooks.example.com/dnsdrift
//
// dnsdriftd
// ```

use anyhow::Result;
use std::env;
use std::process::ExitCode;
use tracing::{Level, debug, error, info, trace, warn};
use tracing_subscriber::FmtSubscriber;

use dnsdrift_core::config::{
    EngineConfig, MonitorConfig, NormalizeConfig, NotifierConfig, RecordConfig, ResolverConfig,
    StoreConfig,
};
use dnsdrift_core::engine::{EngineEvent, MonitorEngine};
use dnsdrift_core::registry::ComponentRegistry;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DaemonExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DaemonExitCode> for ExitCode {
    fn from(code: DaemonExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Daemon configuration, straight from the environment
struct Config {
    records_path: String,
    dns_server: String,
    dns_server_2: Option<String>,
    dns_timeout_secs: u64,
    use_ipv4: bool,
    use_ipv6: bool,
    use_tcp: bool,
    check_interval_secs: u64,
    refresh_interval_secs: u64,
    store_type: String,
    store_path: Option<String>,
    store_key_prefix: Option<String>,
    notifier_type: String,
    webhook_url: Option<String>,
    expand_tabs: bool,
    tab_width: usize,
    imprecise_match: bool,
    log_level: String,
    log_records: bool,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            records_path: env::var("DNSDRIFT_RECORDS_PATH")
                .unwrap_or_else(|_| "dnsdrift-records.json".to_string()),
            dns_server: env::var("DNSDRIFT_DNS_SERVER").map_err(|_| {
                anyhow::anyhow!(
                    "DNSDRIFT_DNS_SERVER is required. \
                    Set it via: export DNSDRIFT_DNS_SERVER=9.9.9.9:53"
                )
            })?,
            dns_server_2: env::var("DNSDRIFT_DNS_SERVER_2").ok(),
            dns_timeout_secs: parse_env_or("DNSDRIFT_DNS_TIMEOUT_SECS", 2),
            use_ipv4: parse_env_or("DNSDRIFT_USE_IPV4", true),
            use_ipv6: parse_env_or("DNSDRIFT_USE_IPV6", false),
            use_tcp: parse_env_or("DNSDRIFT_USE_TCP", false),
            check_interval_secs: parse_env_or("DNSDRIFT_CHECK_INTERVAL_SECS", 60),
            refresh_interval_secs: parse_env_or("DNSDRIFT_REFRESH_INTERVAL_SECS", 1),
            store_type: env::var("DNSDRIFT_STORE_TYPE").unwrap_or_else(|_| "disabled".to_string()),
            store_path: env::var("DNSDRIFT_STORE_PATH").ok(),
            store_key_prefix: env::var("DNSDRIFT_STORE_KEY_PREFIX").ok(),
            notifier_type: env::var("DNSDRIFT_NOTIFIER_TYPE").unwrap_or_else(|_| "log".to_string()),
            webhook_url: env::var("DNSDRIFT_WEBHOOK_URL").ok(),
            expand_tabs: parse_env_or("DNSDRIFT_EXPAND_TABS", false),
            tab_width: parse_env_or("DNSDRIFT_TAB_WIDTH", 4),
            imprecise_match: parse_env_or("DNSDRIFT_IMPRECISE_MATCH", false),
            log_level: env::var("DNSDRIFT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_records: parse_env_or("DNSDRIFT_LOG_RECORDS", false),
        })
    }

    /// Validate the daemon-level configuration
    ///
    /// The assembled MonitorConfig gets its own validation pass in the
    /// engine; this catches the daemon-specific mistakes early with
    /// actionable messages.
    fn validate(&self) -> Result<()> {
        match self.store_type.as_str() {
            "disabled" | "memory" => {}
            "file" => {
                if self.store_path.as_ref().is_none_or(|p| p.is_empty()) {
                    anyhow::bail!(
                        "DNSDRIFT_STORE_PATH is required when DNSDRIFT_STORE_TYPE=file. \
                        Set it via: export DNSDRIFT_STORE_PATH=/var/lib/dnsdrift/baseline.json"
                    );
                }

                if let Some(path) = &self.store_path
                    && let Some(parent) = std::path::Path::new(path).parent()
                    && !parent.as_os_str().is_empty()
                    && !parent.exists()
                {
                    anyhow::bail!(
                        "DNSDRIFT_STORE_PATH parent directory does not exist: {}. \
                        Create it first: mkdir -p {}",
                        parent.display(),
                        parent.display()
                    );
                }
            }
            other => anyhow::bail!(
                "DNSDRIFT_STORE_TYPE '{other}' is not supported. \
                Supported types: disabled, memory, file"
            ),
        }

        match self.notifier_type.as_str() {
            "log" => {}
            "webhook" => {
                if self.webhook_url.as_ref().is_none_or(|u| u.is_empty()) {
                    anyhow::bail!(
                        "DNSDRIFT_WEBHOOK_URL is required when DNSDRIFT_NOTIFIER_TYPE=webhook"
                    );
                }
            }
            other => anyhow::bail!(
                "DNSDRIFT_NOTIFIER_TYPE '{other}' is not supported. \
                Supported types: log, webhook"
            ),
        }

        if !(1..=3600).contains(&self.check_interval_secs) {
            anyhow::bail!(
                "DNSDRIFT_CHECK_INTERVAL_SECS must be between 1 and 3600. Got: {}",
                self.check_interval_secs
            );
        }

        if !(1..=60).contains(&self.dns_timeout_secs) {
            anyhow::bail!(
                "DNSDRIFT_DNS_TIMEOUT_SECS must be between 1 and 60. Got: {}",
                self.dns_timeout_secs
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => anyhow::bail!(
                "DNSDRIFT_LOG_LEVEL '{other}' is not valid. \
                Valid levels: trace, debug, info, warn, error"
            ),
        }

        Ok(())
    }

    /// Load the records file and assemble the monitor configuration
    fn into_monitor_config(self) -> Result<MonitorConfig> {
        let raw = std::fs::read_to_string(&self.records_path).map_err(|e| {
            anyhow::anyhow!("unable to read records file {}: {e}", self.records_path)
        })?;

        let records: Vec<RecordConfig> = serde_json::from_str(&raw).map_err(|e| {
            anyhow::anyhow!("unable to parse records file {}: {e}", self.records_path)
        })?;

        info!("read {} record(s) to process", records.len());

        let store = match self.store_type.as_str() {
            "memory" => StoreConfig::Memory,
            "file" => StoreConfig::File {
                path: self.store_path.clone().unwrap_or_default(),
                key_prefix: self.store_key_prefix.clone(),
            },
            _ => StoreConfig::Disabled,
        };

        let notifier = match self.notifier_type.as_str() {
            "webhook" => NotifierConfig::Webhook {
                url: self.webhook_url.clone().unwrap_or_default(),
                timeout_secs: 10,
            },
            _ => NotifierConfig::Log,
        };

        Ok(MonitorConfig {
            resolver: ResolverConfig::Hickory {
                primary: self.dns_server.clone(),
                secondary: self.dns_server_2.clone(),
            },
            notifier,
            store,
            records,
            engine: EngineConfig {
                check_interval_secs: self.check_interval_secs,
                refresh_interval_secs: self.refresh_interval_secs,
                dns_timeout_secs: self.dns_timeout_secs,
                use_ipv4: self.use_ipv4,
                use_ipv6: self.use_ipv6,
                use_tcp: self.use_tcp,
                log_record_processing: self.log_records,
                ..EngineConfig::default()
            },
            normalize: NormalizeConfig {
                expand_tabs: self.expand_tabs,
                tab_width: self.tab_width,
                imprecise_match: self.imprecise_match,
            },
        })
    }
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return DaemonExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {e}");
        return DaemonExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
        return DaemonExitCode::ConfigError.into();
    }

    info!("starting dnsdriftd");

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("failed to create tokio runtime: {e}");
            return DaemonExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run_daemon(config).await {
            Ok(()) => DaemonExitCode::CleanShutdown,
            Err(e) => {
                error!("daemon error: {e}");
                // monitor configuration problems surface here, before any
                // scheduling begins
                if e.downcast_ref::<dnsdrift_core::Error>()
                    .is_some_and(|err| matches!(err, dnsdrift_core::Error::Config(_)))
                {
                    DaemonExitCode::ConfigError
                } else {
                    DaemonExitCode::RuntimeError
                }
            }
        }
    })
    .into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let monitor_config = config.into_monitor_config()?;

    // Register backends
    let registry = ComponentRegistry::with_builtins();
    dnsdrift_resolver_hickory::register(&registry);
    dnsdrift_notify_webhook::register(&registry);

    debug!(
        "registered backends: resolvers={:?} notifiers={:?} stores={:?}",
        registry.list_resolvers(),
        registry.list_notifiers(),
        registry.list_stores()
    );

    // Build components from configuration
    let resolver = registry.create_resolver(&monitor_config.resolver)?;
    let notifier = registry.create_notifier(&monitor_config.notifier)?;
    let store = registry.create_store(&monitor_config.store)?;

    info!(
        "resolver={} notifier={} store={}",
        monitor_config.resolver.type_name(),
        monitor_config.notifier.type_name(),
        monitor_config.store.type_name()
    );

    let (engine, mut event_rx) = MonitorEngine::new(resolver, notifier, store, monitor_config)?;

    // Snapshot consumer: reads the record table on refresh events and logs
    // engine activity
    let table = engine.table();
    let consumer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                EngineEvent::Started { records_count } => {
                    info!("monitoring {records_count} record(s)");
                }
                EngineEvent::RecordChanged {
                    fqdn,
                    record_type,
                    observed,
                    baseline,
                    notified,
                } => {
                    info!(
                        "drift detected for {fqdn}:{record_type}: now {observed:?}, \
                        was {baseline:?} (notified: {notified})"
                    );
                }
                EngineEvent::RecordErrored { fqdn, record_type } => {
                    warn!("unable to fetch record data for {fqdn} {record_type}");
                }
                EngineEvent::CycleCompleted { changed, errored } => {
                    debug!("cycle complete: {changed} changed, {errored} errored");
                }
                EngineEvent::Refresh => {
                    for state in table.snapshot() {
                        trace!(
                            "{}:{} current={:?} prior={:?} changed={} notified={} \
                            errored={} processing={}",
                            state.fqdn,
                            state.record_type,
                            state.current_values,
                            state.prior_values,
                            state.changed,
                            state.notified,
                            state.errored,
                            state.processing
                        );
                    }
                }
                EngineEvent::Stopped { reason } => {
                    info!("engine stopped: {reason}");
                }
            }
        }
    });

    // Translate process signals into a cooperative engine shutdown: future
    // ticks stop, the in-flight cycle finishes
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => info!("received {signal}"),
            Err(e) => error!("signal handler error: {e}"),
        }
        let _ = shutdown_tx.send(());
    });

    engine.run_with_shutdown(Some(shutdown_rx)).await?;

    consumer.abort();
    info!("shutting down daemon");
    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to setup SIGTERM handler: {e}"))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to setup SIGINT handler: {e}"))?;

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
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("failed to wait for CTRL-C: {e}"))?;
    Ok("SIGINT")
}
