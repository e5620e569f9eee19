//! Configuration types for the dnsdrift system
//!
//! This module defines all configuration structures used throughout the
//! crate. Capability sections (resolver, notifier, store) are tagged enums so
//! backends can be selected from serialized configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;

use crate::error::Error;

/// Main monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Resolver backend configuration
    pub resolver: ResolverConfig,

    /// Notifier backend configuration
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Baseline store backend configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// DNS records to monitor
    pub records: Vec<RecordConfig>,

    /// Engine settings (intervals, network preferences)
    #[serde(default)]
    pub engine: EngineConfig,

    /// Answer-value normalization settings
    #[serde(default)]
    pub normalize: NormalizeConfig,
}

impl MonitorConfig {
    /// Validate the configuration
    ///
    /// Configuration errors are fatal: the daemon exits before any
    /// scheduling begins.
    pub fn validate(&self) -> Result<(), Error> {
        if self.records.is_empty() {
            return Err(Error::config("no records configured"));
        }

        for record in &self.records {
            validate_fqdn(&record.fqdn)?;
        }

        self.engine.validate()?;
        self.normalize.validate()?;
        self.resolver.validate(&self.engine)?;
        self.notifier.validate()?;
        self.store.validate()?;

        Ok(())
    }
}

/// DNS record type of a monitored record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    A,
    Aaaa,
    Txt,
    Mx,
    Caa,
    Cname,
    Ns,
    Ptr,
    Soa,
    Srv,
}

impl RecordType {
    /// The record type mnemonic as it appears in zone files and store keys
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Txt => "TXT",
            RecordType::Mx => "MX",
            RecordType::Caa => "CAA",
            RecordType::Cname => "CNAME",
            RecordType::Ns => "NS",
            RecordType::Ptr => "PTR",
            RecordType::Soa => "SOA",
            RecordType::Srv => "SRV",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A monitored record definition
///
/// Immutable after load. Identity is the `(fqdn, record_type)` pair; the
/// `expected_values` are the static comparison fallback used when the
/// baseline store has nothing for the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordConfig {
    /// Fully qualified domain name (e.g. "example.com")
    pub fqdn: String,

    /// Record type to query
    #[serde(rename = "type")]
    pub record_type: RecordType,

    /// Statically configured expected answer values
    #[serde(default)]
    pub expected_values: Vec<String>,
}

impl RecordConfig {
    /// Create a new record definition
    pub fn new(fqdn: impl Into<String>, record_type: RecordType) -> Self {
        Self {
            fqdn: fqdn.into(),
            record_type,
            expected_values: Vec::new(),
        }
    }

    /// Set the expected answer values
    pub fn with_expected_values(mut self, values: Vec<String>) -> Self {
        self.expected_values = values;
        self
    }

    /// The identity key of this definition
    pub fn key(&self) -> crate::state::RecordKey {
        crate::state::RecordKey::new(self.fqdn.clone(), self.record_type)
    }
}

/// Resolver backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolverConfig {
    /// hickory-resolver backed DNS client
    Hickory {
        /// Primary upstream resolver address ("ip:port")
        primary: String,
        /// Secondary upstream, tried when the primary fails
        secondary: Option<String>,
    },

    /// Custom resolver backend
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ResolverConfig {
    /// Validate the resolver configuration against the engine's network
    /// preferences
    pub fn validate(&self, engine: &EngineConfig) -> Result<(), Error> {
        match self {
            ResolverConfig::Hickory { primary, secondary } => {
                let mut upstreams = vec![("primary", primary.as_str())];
                if let Some(secondary) = secondary {
                    upstreams.push(("secondary", secondary.as_str()));
                }

                let mut eligible = 0usize;
                for (label, addr) in upstreams {
                    let parsed: SocketAddr = addr.parse().map_err(|_| {
                        Error::config(format!(
                            "{label} resolver address '{addr}' is not a valid ip:port"
                        ))
                    })?;
                    let allowed = match parsed {
                        SocketAddr::V4(_) => engine.use_ipv4,
                        SocketAddr::V6(_) => engine.use_ipv6,
                    };
                    if allowed {
                        eligible += 1;
                    }
                }
                if eligible == 0 {
                    return Err(Error::config(
                        "no upstream resolver address matches the enabled address families",
                    ));
                }
                Ok(())
            }
            ResolverConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(Error::config("custom resolver factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(Error::config("custom resolver config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Get the resolver type name
    pub fn type_name(&self) -> &str {
        match self {
            ResolverConfig::Hickory { .. } => "hickory",
            ResolverConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Notifier backend configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotifierConfig {
    /// Webhook notifier posting change reports as JSON
    Webhook {
        /// Endpoint URL
        url: String,
        /// Request timeout in seconds
        #[serde(default = "default_webhook_timeout_secs")]
        timeout_secs: u64,
    },

    /// Log-only notifier (reports are written to the process log)
    #[default]
    Log,

    /// Custom notifier backend
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl NotifierConfig {
    /// Validate the notifier configuration
    pub fn validate(&self) -> Result<(), Error> {
        match self {
            NotifierConfig::Webhook { url, timeout_secs } => {
                if url.is_empty() {
                    return Err(Error::config("webhook URL cannot be empty"));
                }
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(Error::config(format!(
                        "webhook URL must use http or https scheme, got: {url}"
                    )));
                }
                if *timeout_secs == 0 {
                    return Err(Error::config("webhook timeout must be > 0"));
                }
                Ok(())
            }
            NotifierConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(Error::config("custom notifier factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(Error::config("custom notifier config cannot be null"));
                }
                Ok(())
            }
            NotifierConfig::Log => Ok(()),
        }
    }

    /// Get the notifier type name
    pub fn type_name(&self) -> &str {
        match self {
            NotifierConfig::Webhook { .. } => "webhook",
            NotifierConfig::Log => "log",
            NotifierConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Baseline store backend configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// File-backed baseline store
    File {
        /// Path to the baseline file
        path: String,
        /// Optional prefix prepended to every entry key
        #[serde(default)]
        key_prefix: Option<String>,
    },

    /// In-memory baseline store (not persistent)
    Memory,

    /// No baseline store: comparisons always fall back to expected values
    #[default]
    Disabled,

    /// Custom store backend
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl StoreConfig {
    /// Validate the store configuration
    pub fn validate(&self) -> Result<(), Error> {
        match self {
            StoreConfig::File { path, .. } => {
                if path.is_empty() {
                    return Err(Error::config("baseline store path cannot be empty"));
                }
                Ok(())
            }
            StoreConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(Error::config("custom store factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(Error::config("custom store config cannot be null"));
                }
                Ok(())
            }
            StoreConfig::Memory | StoreConfig::Disabled => Ok(()),
        }
    }

    /// Get the store type name
    pub fn type_name(&self) -> &str {
        match self {
            StoreConfig::File { .. } => "file",
            StoreConfig::Memory => "memory",
            StoreConfig::Disabled => "disabled",
            StoreConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds between evaluation cycles
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,

    /// Seconds between snapshot refresh events
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// Per-query DNS timeout in seconds
    #[serde(default = "default_dns_timeout_secs")]
    pub dns_timeout_secs: u64,

    /// Allow IPv4 upstream resolver addresses
    #[serde(default = "default_use_ipv4")]
    pub use_ipv4: bool,

    /// Allow IPv6 upstream resolver addresses
    #[serde(default)]
    pub use_ipv6: bool,

    /// Use TCP instead of UDP for DNS queries
    #[serde(default)]
    pub use_tcp: bool,

    /// Capacity of the internal event channel
    ///
    /// When full, new events are dropped with a warning log so the engine
    /// never blocks on a slow consumer.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Log the detector inputs and outcome for every processed record
    #[serde(default)]
    pub log_record_processing: bool,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), Error> {
        if self.check_interval_secs == 0 {
            return Err(Error::config("check interval must be > 0"));
        }
        if self.refresh_interval_secs == 0 {
            return Err(Error::config("refresh interval must be > 0"));
        }
        if self.dns_timeout_secs == 0 {
            return Err(Error::config("DNS timeout must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(Error::config("event channel capacity must be > 0"));
        }
        if !self.use_ipv4 && !self.use_ipv6 {
            return Err(Error::config(
                "at least one of IPv4 and IPv6 must be enabled",
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: default_check_interval_secs(),
            refresh_interval_secs: default_refresh_interval_secs(),
            dns_timeout_secs: default_dns_timeout_secs(),
            use_ipv4: default_use_ipv4(),
            use_ipv6: false,
            use_tcp: false,
            event_channel_capacity: default_event_channel_capacity(),
            log_record_processing: false,
        }
    }
}

/// Answer-value normalization configuration
///
/// Applied to every resolved answer value before comparison or storage.
/// Expand mode takes precedence over imprecise matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Replace tab characters with a fixed-width run of spaces
    #[serde(default)]
    pub expand_tabs: bool,

    /// Width of the space run used by expand mode
    #[serde(default = "default_tab_width")]
    pub tab_width: usize,

    /// Strip a single trailing "." (DNS root label) from answer values
    #[serde(default)]
    pub imprecise_match: bool,
}

impl NormalizeConfig {
    /// Validate the normalization configuration
    pub fn validate(&self) -> Result<(), Error> {
        if self.expand_tabs && self.tab_width == 0 {
            return Err(Error::config("tab width must be > 0 when expand is enabled"));
        }
        Ok(())
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            expand_tabs: false,
            tab_width: default_tab_width(),
            imprecise_match: false,
        }
    }
}

/// Validate that a string is a plausible DNS name
///
/// Basic RFC 1035 label validation; underscores are allowed for service
/// labels (e.g. "_dmarc.example.com"). A single trailing root dot is
/// accepted.
pub fn validate_fqdn(fqdn: &str) -> Result<(), Error> {
    let name = fqdn.strip_suffix('.').unwrap_or(fqdn);

    if name.is_empty() {
        return Err(Error::config("record name cannot be empty"));
    }

    if name.len() > 253 {
        return Err(Error::config(format!(
            "record name too long: {} chars (max 253): {fqdn}",
            name.len()
        )));
    }

    for label in name.split('.') {
        if label.is_empty() {
            return Err(Error::config(format!("record name has empty label: '{fqdn}'")));
        }

        if label.len() > 63 {
            return Err(Error::config(format!(
                "record label too long: {} chars (max 63): '{label}'",
                label.len()
            )));
        }

        if !label.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_') {
            return Err(Error::config(format!(
                "record label contains invalid characters: '{label}'"
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::config(format!(
                "record label cannot start or end with hyphen: '{label}'"
            )));
        }
    }

    Ok(())
}

fn default_check_interval_secs() -> u64 {
    60
}

fn default_refresh_interval_secs() -> u64 {
    1
}

fn default_dns_timeout_secs() -> u64 {
    2
}

fn default_use_ipv4() -> bool {
    true
}

fn default_event_channel_capacity() -> usize {
    1000
}

fn default_tab_width() -> usize {
    4
}

fn default_webhook_timeout_secs() -> u64 {
    10
}
