//! # URL Validation
//!
//! Optional guard against fetching pages and icons served from private
//! networks. Hosts are resolved and every address must be globally reachable

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use thiserror::Error;
use url::{Host, Url};

/// Domain resolution, swapped for a fixed mapping in tests
pub(crate) trait DomainResolver {
    async fn resolve_domain(
        host: &str,
        port: u16,
    ) -> std::io::Result<impl Iterator<Item = SocketAddr>>;
}

/// Resolves domains through the system resolver
pub(crate) struct TokioDomainResolver;

impl DomainResolver for TokioDomainResolver {
    async fn resolve_domain(
        host: &str,
        port: u16,
    ) -> std::io::Result<impl Iterator<Item = SocketAddr>> {
        tokio::net::lookup_host(format!("{host}:{port}")).await
    }
}

const ALLOWED_SCHEMES: &[&str] = &["http", "https"];

/// Reasons a URL is not allowed to be fetched
#[derive(Debug, Error)]
pub enum DisallowedUrlReason {
    /// Scheme other than http or https
    #[error("scheme {0:?} is not allowed")]
    Scheme(String),

    /// URL does not have a host
    #[error("url has no host")]
    MissingHost,

    /// Port could not be determined for the URL
    #[error("unable to determine the port")]
    UnknownPort,

    /// Host is an IP address rather than a domain
    #[error("ip address hosts are not allowed")]
    IpAddressHost,

    /// Host could not be resolved
    #[error("failed to resolve host: {0}")]
    Resolution(std::io::Error),

    /// Host resolved to an address that is not globally reachable
    #[error("host resolved to non-global address {0}")]
    NonGlobalAddress(IpAddr),

    /// Host resolved to no addresses at all
    #[error("host did not resolve to any address")]
    NoAddresses,
}

/// Checks that `url` is allowed to be fetched when private networks are
/// denied
///
/// - The URL scheme is in [ALLOWED_SCHEMES]
/// - The URL host portion is a domain NOT a IP address
/// - Every resolved IP of the domain is a globally reachable address
pub(crate) async fn check_allowed_url<D: DomainResolver>(
    url: &Url,
) -> Result<(), DisallowedUrlReason> {
    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return Err(DisallowedUrlReason::Scheme(url.scheme().to_string()));
    }

    let host = url.host().ok_or(DisallowedUrlReason::MissingHost)?;
    let port = url
        .port_or_known_default()
        .ok_or(DisallowedUrlReason::UnknownPort)?;

    let domain = match host {
        Host::Domain(domain) => domain,
        Host::Ipv4(_) | Host::Ipv6(_) => return Err(DisallowedUrlReason::IpAddressHost),
    };

    let addresses = D::resolve_domain(domain, port)
        .await
        .map_err(DisallowedUrlReason::Resolution)?;

    let mut any_valid = false;

    for addr in addresses {
        let ip = addr.ip();
        let global = match ip {
            IpAddr::V4(addr) => is_ipv4_global(addr),
            IpAddr::V6(addr) => is_ipv6_global(addr),
        };

        if !global {
            return Err(DisallowedUrlReason::NonGlobalAddress(ip));
        }

        any_valid = true;
    }

    if !any_valid {
        return Err(DisallowedUrlReason::NoAddresses);
    }

    Ok(())
}

/// Sourced from the unstable rust standard library [Ipv4Addr::is_global]
///
/// Used to check if the provided IPv4 address is globally reachable
fn is_ipv4_global(addr: Ipv4Addr) -> bool {
    !(addr.octets()[0] == 0 // "This network"
            || addr.is_private()
            // Returns [`true`] if this address is part of the Shared Address Space defined in
            // [IETF RFC 6598] (`100.64.0.0/10`).
            || (addr.octets()[0] == 100 && (addr.octets()[1] & 0b1100_0000 == 0b0100_0000))
            || addr.is_loopback()
            || addr.is_link_local()
            // addresses reserved for future protocols (`192.0.0.0/24`)
            // .9 and .10 are documented as globally reachable so they're excluded
            || (
                addr.octets()[0] == 192 && addr.octets()[1] == 0 && addr.octets()[2] == 0
                && addr.octets()[3] != 9 && addr.octets()[3] != 10
            )
            || addr.is_documentation()
            // Returns [`true`] if this address part of the `198.18.0.0/15` range, which is reserved for
            // network devices benchmarking.
            || (addr.octets()[0] == 198 && (addr.octets()[1] & 0xfe) == 18)
            // Returns [`true`] if this address is reserved by IANA for future use.
            || (addr.octets()[0] & 240 == 240 && !addr.is_broadcast())
            || addr.is_broadcast())
}

/// Sourced from the unstable rust standard library [Ipv6Addr::is_global]
///
/// Used to check if the provided IPv6 address is globally reachable
fn is_ipv6_global(addr: Ipv6Addr) -> bool {
    !(addr.is_unspecified()
            || addr.is_loopback()
            // IPv4-mapped Address (`::ffff:0:0/96`)
            || matches!(addr.segments(), [0, 0, 0, 0, 0, 0xffff, _, _])
            // IPv4-IPv6 Translat. (`64:ff9b:1::/48`)
            || matches!(addr.segments(), [0x64, 0xff9b, 1, _, _, _, _, _])
            // Discard-Only Address Block (`100::/64`)
            || matches!(addr.segments(), [0x100, 0, 0, 0, _, _, _, _])
            // IETF Protocol Assignments (`2001::/23`)
            || (matches!(addr.segments(), [0x2001, b, _, _, _, _, _, _] if b < 0x200)
                && !(
                    // Port Control Protocol Anycast (`2001:1::1`)
                    u128::from_be_bytes(addr.octets()) == 0x2001_0001_0000_0000_0000_0000_0000_0001
                    // Traversal Using Relays around NAT Anycast (`2001:1::2`)
                    || u128::from_be_bytes(addr.octets()) == 0x2001_0001_0000_0000_0000_0000_0000_0002
                    // AMT (`2001:3::/32`)
                    || matches!(addr.segments(), [0x2001, 3, _, _, _, _, _, _])
                    // AS112-v6 (`2001:4:112::/48`)
                    || matches!(addr.segments(), [0x2001, 4, 0x112, _, _, _, _, _])
                    // ORCHIDv2 (`2001:20::/28`)
                    // Drone Remote ID Protocol Entity Tags (DETs) Prefix (`2001:30::/28`)`
                    || matches!(addr.segments(), [0x2001, b, _, _, _, _, _, _] if (0x20..=0x3F).contains(&b))
                ))
            // 6to4 (`2002::/16`), it's not explicitly documented as globally reachable,
            // IANA says N/A.
            || matches!(addr.segments(), [0x2002, _, _, _, _, _, _, _])
            // if this is an address reserved for documentation
            || matches!(addr.segments(), [0x2001, 0xdb8, ..] | [0x3fff, 0..=0x0fff, ..])
            // Segment Routing (SRv6) SIDs (`5f00::/16`)
            || matches!(addr.segments(), [0x5f00, ..])
            || addr.is_unique_local()
            || addr.is_unicast_link_local())
}
