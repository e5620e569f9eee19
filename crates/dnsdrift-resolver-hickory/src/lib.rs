// # hickory Record Resolver
//
// This crate provides the hickory-resolver backed RecordResolver for the
// dnsdrift system.
//
// ## Behavior
//
// - One resolution attempt per upstream: the primary address is tried
//   first, the secondary (when configured) only after the primary fails
// - The engine's network preferences select which configured upstream
//   addresses are eligible (an upstream's address family decides the
//   transport family) and whether queries go over UDP or TCP
// - Every query gets exactly one attempt per upstream, bounded by the
//   caller-supplied timeout; answer caching is disabled so each cycle sees
//   the live zone content
//
// ## Answer extraction
//
// Each resource record contributes its natural presentation value: A/AAAA
// the address text, CNAME/NS/PTR the target name, MX the exchange host,
// SRV the target, TXT one value per character-string, everything else the
// full presentation text.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::Resolver;
use hickory_resolver::config::{NameServerConfig, ResolveHosts, ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::rr::{RData, RecordType as HickoryRecordType};
use hickory_resolver::proto::xfer::Protocol;
use tracing::warn;

use dnsdrift_core::config::{RecordType, ResolverConfig as CoreResolverConfig};
use dnsdrift_core::error::{Error, Result};
use dnsdrift_core::registry::ComponentRegistry;
use dnsdrift_core::traits::{RecordResolver, ResolveOptions, ResolverFactory};

/// hickory-resolver backed record resolver
pub struct HickoryRecordResolver {
    /// Configured upstream addresses, primary first
    upstreams: Vec<SocketAddr>,
}

impl HickoryRecordResolver {
    /// Create a resolver over a primary and optional secondary upstream
    pub fn new(primary: SocketAddr, secondary: Option<SocketAddr>) -> Self {
        let mut upstreams = vec![primary];
        upstreams.extend(secondary);
        Self { upstreams }
    }

    /// Query one upstream for a record
    async fn lookup_via(
        &self,
        upstream: SocketAddr,
        fqdn: &str,
        record_type: RecordType,
        options: &ResolveOptions,
    ) -> Result<Vec<String>> {
        let protocol = if options.use_tcp {
            Protocol::Tcp
        } else {
            Protocol::Udp
        };

        let mut config = ResolverConfig::new();
        config.add_name_server(NameServerConfig::new(upstream, protocol));

        let mut opts = ResolverOpts::default();
        opts.timeout = options.timeout;
        opts.attempts = 1;
        opts.use_hosts_file = ResolveHosts::Never;
        // no answer caching: every cycle must observe the live zone content
        opts.positive_max_ttl = Some(Duration::ZERO);
        opts.negative_max_ttl = Some(Duration::ZERO);

        let resolver = Resolver::builder_with_config(config, TokioConnectionProvider::default())
            .with_options(opts)
            .build();

        // queries are always absolute, like the zone names being watched
        let name = if fqdn.ends_with('.') {
            fqdn.to_string()
        } else {
            format!("{fqdn}.")
        };

        let lookup = resolver
            .lookup(name.as_str(), to_hickory_type(record_type))
            .await
            .map_err(|e| Error::resolver(format!("{upstream}: {e}")))?;

        Ok(lookup.iter().flat_map(rdata_values).collect())
    }
}

#[async_trait]
impl RecordResolver for HickoryRecordResolver {
    async fn resolve(
        &self,
        fqdn: &str,
        record_type: RecordType,
        options: &ResolveOptions,
    ) -> Result<Vec<String>> {
        let eligible: Vec<SocketAddr> = self
            .upstreams
            .iter()
            .copied()
            .filter(|addr| family_allowed(*addr, options))
            .collect();

        if eligible.is_empty() {
            return Err(Error::resolver(
                "no upstream matches the enabled address families",
            ));
        }

        let mut last_error = None;
        for upstream in eligible {
            match self.lookup_via(upstream, fqdn, record_type, options).await {
                Ok(values) => return Ok(values),
                Err(e) => {
                    warn!("error asking {upstream} for {fqdn} {record_type}: {e}");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::resolver("no upstream answered")))
    }

    fn resolver_name(&self) -> &'static str {
        "hickory"
    }
}

fn family_allowed(addr: SocketAddr, options: &ResolveOptions) -> bool {
    match addr {
        SocketAddr::V4(_) => options.use_ipv4,
        SocketAddr::V6(_) => options.use_ipv6,
    }
}

fn to_hickory_type(record_type: RecordType) -> HickoryRecordType {
    match record_type {
        RecordType::A => HickoryRecordType::A,
        RecordType::Aaaa => HickoryRecordType::AAAA,
        RecordType::Txt => HickoryRecordType::TXT,
        RecordType::Mx => HickoryRecordType::MX,
        RecordType::Caa => HickoryRecordType::CAA,
        RecordType::Cname => HickoryRecordType::CNAME,
        RecordType::Ns => HickoryRecordType::NS,
        RecordType::Ptr => HickoryRecordType::PTR,
        RecordType::Soa => HickoryRecordType::SOA,
        RecordType::Srv => HickoryRecordType::SRV,
    }
}

/// Extract the answer value(s) a resource record contributes
fn rdata_values(rdata: &RData) -> Vec<String> {
    match rdata {
        RData::A(a) => vec![a.to_string()],
        RData::AAAA(aaaa) => vec![aaaa.to_string()],
        RData::CNAME(cname) => vec![cname.to_string()],
        RData::MX(mx) => vec![mx.exchange().to_string()],
        RData::TXT(txt) => txt
            .iter()
            .map(|data| String::from_utf8_lossy(data).to_string())
            .collect(),
        RData::NS(ns) => vec![ns.to_string()],
        RData::PTR(ptr) => vec![ptr.to_string()],
        RData::SRV(srv) => vec![srv.target().to_string()],
        other => vec![other.to_string()],
    }
}

/// Factory for hickory record resolvers
pub struct HickoryResolverFactory;

impl ResolverFactory for HickoryResolverFactory {
    fn create(&self, config: &CoreResolverConfig) -> Result<Box<dyn RecordResolver>> {
        match config {
            CoreResolverConfig::Hickory { primary, secondary } => {
                let primary: SocketAddr = primary.parse().map_err(|_| {
                    Error::config(format!("primary resolver address '{primary}' is invalid"))
                })?;
                let secondary = secondary
                    .as_ref()
                    .map(|s| {
                        s.parse::<SocketAddr>().map_err(|_| {
                            Error::config(format!("secondary resolver address '{s}' is invalid"))
                        })
                    })
                    .transpose()?;

                Ok(Box::new(HickoryRecordResolver::new(primary, secondary)))
            }
            other => Err(Error::config(format!(
                "hickory resolver factory cannot build '{}' resolver",
                other.type_name()
            ))),
        }
    }
}

/// Register this backend with a component registry
pub fn register(registry: &ComponentRegistry) {
    registry.register_resolver("hickory", Box::new(HickoryResolverFactory));
}
