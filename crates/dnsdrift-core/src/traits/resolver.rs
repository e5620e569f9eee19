// # Record Resolver Trait
//
// Defines the interface for resolving a monitored record's current answer
// values.
//
// ## Implementations
//
// - hickory-resolver backed: `dnsdrift-resolver-hickory` crate
//
// ## Trust boundary
//
// Resolver implementations are untrusted collaborators: they perform the
// actual DNS exchange and nothing else. In particular they must not:
//
// - retry beyond the primary/secondary fallback described below (the engine
//   gives each record exactly one resolution attempt per cycle)
// - touch the baseline store or record state
// - normalize answer values (owned by the engine's string processor)
//
// A resolver MUST try a secondary configured upstream when the primary
// fails, and only then report failure. It MUST honor the caller-supplied
// timeout and fail closed rather than hang.

use async_trait::async_trait;
use std::time::Duration;

use crate::config::RecordType;
use crate::error::Result;

/// Network preferences and timeout for a single resolution attempt
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Allow IPv4 upstream addresses
    pub use_ipv4: bool,
    /// Allow IPv6 upstream addresses
    pub use_ipv6: bool,
    /// Use TCP instead of UDP
    pub use_tcp: bool,
    /// Per-query timeout
    pub timeout: Duration,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            use_ipv4: true,
            use_ipv6: false,
            use_tcp: false,
            timeout: Duration::from_secs(2),
        }
    }
}

/// Trait for resolver implementations
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait RecordResolver: Send + Sync {
    /// Resolve the current answer values for a record
    ///
    /// # Returns
    ///
    /// - `Ok(values)`: the raw answer values, one per resource record
    ///   (TXT records contribute one value per character-string). An empty
    ///   vector means the name exists but returned no data; the engine
    ///   treats it the same as a failure.
    /// - `Err(Error)`: both upstreams failed, or the query timed out
    async fn resolve(
        &self,
        fqdn: &str,
        record_type: RecordType,
        options: &ResolveOptions,
    ) -> Result<Vec<String>>;

    /// Get the resolver name (for logging/debugging)
    fn resolver_name(&self) -> &'static str;
}

/// Helper trait for constructing resolvers from configuration
pub trait ResolverFactory: Send + Sync {
    /// Create a resolver instance from configuration
    fn create(&self, config: &crate::config::ResolverConfig) -> Result<Box<dyn RecordResolver>>;
}
