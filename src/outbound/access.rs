//! Pre-dispatch access control.
//!
//! # Design
//!
//! - **Capability**: [`AccessPolicy`] answers "may this request be sent?" and
//!   nothing else. The executor fails closed on an evaluation error.
//! - **Null object**: [`Unrestricted`] allows everything.
//! - **Network policy**: [`NetworkAccessPolicy`] denies hosts by name pattern
//!   and by the IP networks they resolve to, guarding against the executor
//!   being used to reach internal services.

use std::fmt;
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use regex::Regex;
use url::Host;

use super::{AccessError, HttpRequest};

/// Decides whether a request target may be contacted.
pub trait AccessPolicy: Send + Sync {
    /// Returns `Ok(true)` if the request may be dispatched, `Ok(false)` if it
    /// is denied.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError`] if the policy cannot reach a decision.
    fn allow(&self, request: &HttpRequest)
    -> impl Future<Output = Result<bool, AccessError>> + Send;
}

/// Policy that allows every request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Unrestricted;

impl AccessPolicy for Unrestricted {
    async fn allow(&self, _request: &HttpRequest) -> Result<bool, AccessError> {
        Ok(true)
    }
}

// ============================================================================
// IpNetwork - CIDR block
// ============================================================================

/// An IP network in CIDR notation, e.g. `10.0.0.0/8` or `fe80::/10`.
///
/// A bare address parses as a single-host network (`/32` or `/128`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpNetwork {
    addr: IpAddr,
    prefix: u8,
}

/// Error returned when parsing an [`IpNetwork`] fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid network '{0}': expected ADDRESS or ADDRESS/PREFIX")]
pub struct ParseNetworkError(String);

impl IpNetwork {
    /// Creates a network, returning `None` if `prefix` is too long for the
    /// address family.
    #[must_use]
    pub const fn new(addr: IpAddr, prefix: u8) -> Option<Self> {
        let max = match addr {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        if prefix > max {
            return None;
        }
        Some(Self { addr, prefix })
    }

    const fn v4(a: u8, b: u8, c: u8, d: u8, prefix: u8) -> Self {
        Self {
            addr: IpAddr::V4(Ipv4Addr::new(a, b, c, d)),
            prefix,
        }
    }

    const fn v6(first: u16, second: u16, prefix: u8) -> Self {
        Self {
            addr: IpAddr::V6(Ipv6Addr::new(first, second, 0, 0, 0, 0, 0, 0)),
            prefix,
        }
    }

    /// Returns true if `ip` lies within this network.
    ///
    /// IPv6 addresses that embed an IPv4 address, either mapped
    /// (`::ffff:a.b.c.d`) or the deprecated compatible form (`::a.b.c.d`),
    /// are also matched against IPv4 networks.
    #[must_use]
    pub fn contains(&self, ip: IpAddr) -> bool {
        let embedded = match ip {
            IpAddr::V6(v6) => v6.to_ipv4(),
            IpAddr::V4(_) => None,
        };

        self.contains_same_family(ip)
            || embedded.is_some_and(|v4| self.contains_same_family(IpAddr::V4(v4)))
    }

    fn contains_same_family(&self, ip: IpAddr) -> bool {
        match (self.addr, ip) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                let mask = u32::MAX.checked_shl(32 - u32::from(self.prefix)).unwrap_or(0);
                u32::from(net) & mask == u32::from(ip) & mask
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                let mask = u128::MAX
                    .checked_shl(128 - u32::from(self.prefix))
                    .unwrap_or(0);
                u128::from(net) & mask == u128::from(ip) & mask
            }
            _ => false,
        }
    }
}

impl FromStr for IpNetwork {
    type Err = ParseNetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseNetworkError(s.to_string());
        let (addr, prefix) = match s.trim().split_once('/') {
            Some((addr, prefix)) => {
                let addr: IpAddr = addr.parse().map_err(|_| err())?;
                let prefix: u8 = prefix.parse().map_err(|_| err())?;
                (addr, prefix)
            }
            None => {
                let addr: IpAddr = s.trim().parse().map_err(|_| err())?;
                let prefix = if addr.is_ipv4() { 32 } else { 128 };
                (addr, prefix)
            }
        };
        Self::new(addr, prefix).ok_or_else(err)
    }
}

impl fmt::Display for IpNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix)
    }
}

/// Networks that should never be reachable from an outbound caller.
///
/// Covers unspecified, loopback, private (RFC 1918), shared (RFC 6598),
/// link-local (including cloud metadata at 169.254.169.254), IETF protocol
/// assignments, benchmarking, multicast and reserved space (which includes
/// broadcast), plus the IPv6 counterparts and the NAT64 prefix.
#[must_use]
pub fn private_networks() -> Vec<IpNetwork> {
    vec![
        IpNetwork::v4(0, 0, 0, 0, 8),
        IpNetwork::v4(10, 0, 0, 0, 8),
        IpNetwork::v4(100, 64, 0, 0, 10),
        IpNetwork::v4(127, 0, 0, 0, 8),
        IpNetwork::v4(169, 254, 0, 0, 16),
        IpNetwork::v4(172, 16, 0, 0, 12),
        IpNetwork::v4(192, 0, 0, 0, 24),
        IpNetwork::v4(192, 168, 0, 0, 16),
        IpNetwork::v4(198, 18, 0, 0, 15),
        IpNetwork::v4(224, 0, 0, 0, 4),
        IpNetwork::v4(240, 0, 0, 0, 4),
        IpNetwork::v6(0, 0, 128),
        IpNetwork {
            addr: IpAddr::V6(Ipv6Addr::LOCALHOST),
            prefix: 128,
        },
        IpNetwork::v6(0x64, 0xff9b, 96),
        IpNetwork::v6(0xfc00, 0, 7),
        IpNetwork::v6(0xfe80, 0, 10),
        IpNetwork::v6(0xff00, 0, 8),
    ]
}

// ============================================================================
// NetworkAccessPolicy
// ============================================================================

/// Denies requests by host name pattern and by target IP network.
///
/// Evaluation order:
/// 1. A host matching any denied pattern is denied.
/// 2. An IP literal host is denied if it lies in a denied network.
/// 3. A domain host is resolved (when networks are configured) and denied
///    if any resolved address lies in a denied network.
///
/// # Example
///
/// ```
/// use httpx_exec::outbound::{AccessPolicy, HttpRequest, NetworkAccessPolicy};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let policy = NetworkAccessPolicy::private();
/// let url = url::Url::parse("http://169.254.169.254/latest/meta-data").unwrap();
///
/// assert!(!policy.allow(&HttpRequest::get(url)).await.unwrap());
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct NetworkAccessPolicy {
    denied_networks: Vec<IpNetwork>,
    denied_hosts: Vec<Regex>,
}

impl NetworkAccessPolicy {
    /// Creates a policy that denies nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a policy denying [`private_networks`].
    #[must_use]
    pub fn private() -> Self {
        Self::new().with_networks(private_networks())
    }

    /// Adds a denied network.
    #[must_use]
    pub fn with_network(mut self, network: IpNetwork) -> Self {
        self.denied_networks.push(network);
        self
    }

    /// Adds several denied networks.
    #[must_use]
    pub fn with_networks(mut self, networks: impl IntoIterator<Item = IpNetwork>) -> Self {
        self.denied_networks.extend(networks);
        self
    }

    /// Adds a denied host name pattern (matched against the lowercase host).
    #[must_use]
    pub fn with_host_pattern(mut self, pattern: Regex) -> Self {
        self.denied_hosts.push(pattern);
        self
    }

    /// Returns the denied networks.
    #[must_use]
    pub fn networks(&self) -> &[IpNetwork] {
        &self.denied_networks
    }

    /// Returns the number of denied host patterns.
    #[must_use]
    pub fn host_pattern_count(&self) -> usize {
        self.denied_hosts.len()
    }

    /// Returns true if this policy denies nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.denied_networks.is_empty() && self.denied_hosts.is_empty()
    }

    fn ip_denied(&self, ip: IpAddr) -> bool {
        self.denied_networks.iter().any(|net| net.contains(ip))
    }

    async fn domain_denied(&self, domain: &str, port: u16) -> Result<bool, AccessError> {
        if self.denied_networks.is_empty() {
            return Ok(false);
        }

        let addrs = tokio::net::lookup_host((domain, port))
            .await
            .map_err(|source| AccessError::Resolve {
                host: domain.to_string(),
                source,
            })?;

        for addr in addrs {
            if self.ip_denied(addr.ip()) {
                tracing::debug!(host = domain, ip = %addr.ip(), "Host resolves to denied network");
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl AccessPolicy for NetworkAccessPolicy {
    async fn allow(&self, request: &HttpRequest) -> Result<bool, AccessError> {
        let url = &request.url;
        let host = url
            .host()
            .ok_or_else(|| AccessError::MissingHost(url.to_string()))?;

        let name = request.host().unwrap_or_default().to_ascii_lowercase();
        if self.denied_hosts.iter().any(|re| re.is_match(&name)) {
            return Ok(false);
        }

        let denied = match host {
            Host::Ipv4(ip) => self.ip_denied(IpAddr::V4(ip)),
            Host::Ipv6(ip) => self.ip_denied(IpAddr::V6(ip)),
            Host::Domain(domain) => {
                let port = url.port_or_known_default().unwrap_or(80);
                self.domain_denied(domain, port).await?
            }
        };

        Ok(!denied)
    }
}
