//! Socket address helpers for the signaling and media plumbing
//!
//! Everything here works on `std::net` types. Comparison treats a
//! V4-mapped-in-V6 address as equal to its plain V4 form, since phones
//! behind dual-stack sockets report both spellings for the same endpoint.

use std::cmp::Ordering;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::ops::BitOr;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{Result, SccpError};

/// Address family selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    V4,
    V6,
}

impl AddressFamily {
    pub fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => Self::V4,
            IpAddr::V6(_) => Self::V6,
        }
    }
}

/// Whether the address is the wildcard for its family
pub fn is_any_addr(addr: &SocketAddr) -> bool {
    addr.ip().is_unspecified()
}

/// Whether the address is an IPv6 spelling of an IPv4 address
pub fn is_mapped_ipv4(addr: &IpAddr) -> bool {
    matches!(addr, IpAddr::V6(v6) if v6.to_ipv4_mapped().is_some())
}

/// Unwrap a V4-mapped-V6 address to its IPv4 form
pub fn mapped_ipv4(addr: &IpAddr) -> Option<Ipv4Addr> {
    match addr {
        IpAddr::V6(v6) => v6.to_ipv4_mapped(),
        IpAddr::V4(_) => None,
    }
}

fn normalize(addr: IpAddr) -> IpAddr {
    match mapped_ipv4(&addr) {
        Some(v4) => IpAddr::V4(v4),
        None => addr,
    }
}

/// Order two addresses, ignoring ports.
///
/// V4-mapped addresses are normalized first so `::ffff:10.0.0.1` compares
/// equal to `10.0.0.1`. Across families, V4 sorts before V6.
pub fn cmp_addr(a: &SocketAddr, b: &SocketAddr) -> Ordering {
    match (normalize(a.ip()), normalize(b.ip())) {
        (IpAddr::V4(x), IpAddr::V4(y)) => x.octets().cmp(&y.octets()),
        (IpAddr::V6(x), IpAddr::V6(y)) => x.octets().cmp(&y.octets()),
        (IpAddr::V4(_), IpAddr::V6(_)) => Ordering::Less,
        (IpAddr::V6(_), IpAddr::V4(_)) => Ordering::Greater,
    }
}

/// Order two addresses by port only
pub fn cmp_port(a: &SocketAddr, b: &SocketAddr) -> Ordering {
    a.port().cmp(&b.port())
}

/// What `split_host_port` should do about a port component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortPolicy {
    /// Port may or may not be present
    Ignore,
    /// Port must be present
    Require,
    /// Port must be absent
    Forbid,
}

/// Split `host`, `host:port`, `[v6]`, `[v6]:port` or a bare IPv6 literal.
///
/// A string with more than one colon and no brackets is taken as a bare
/// IPv6 host; there is no way to attach a port to one without brackets.
pub fn split_host_port(input: &str, policy: PortPolicy) -> Result<(&str, Option<u16>)> {
    let input_trim = input.trim();
    if input_trim.is_empty() {
        return Err(SccpError::InvalidHostPort {
            input: input.to_string(),
        });
    }

    let (host, port_str) = if let Some(rest) = input_trim.strip_prefix('[') {
        let Some(end) = rest.find(']') else {
            return Err(SccpError::InvalidHostPort {
                input: input.to_string(),
            });
        };
        let host = &rest[..end];
        match &rest[end + 1..] {
            "" => (host, None),
            tail => match tail.strip_prefix(':') {
                Some(p) => (host, Some(p)),
                None => {
                    return Err(SccpError::InvalidHostPort {
                        input: input.to_string(),
                    })
                }
            },
        }
    } else if input_trim.matches(':').count() > 1 {
        // bare IPv6 literal
        (input_trim, None)
    } else {
        match input_trim.split_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (input_trim, None),
        }
    };

    if host.is_empty() {
        return Err(SccpError::InvalidHostPort {
            input: input.to_string(),
        });
    }

    let port = match port_str {
        None => None,
        Some(p) => Some(p.parse::<u16>().map_err(|_| SccpError::InvalidHostPort {
            input: input.to_string(),
        })?),
    };

    match (policy, port) {
        (PortPolicy::Require, None) => Err(SccpError::MissingPort {
            input: input.to_string(),
        }),
        (PortPolicy::Forbid, Some(_)) => Err(SccpError::UnexpectedPort {
            input: input.to_string(),
        }),
        _ => Ok((host, port)),
    }
}

/// Formatting selector for [`format_addr`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddrFormat(u8);

impl AddrFormat {
    /// Include the address
    pub const ADDR: Self = Self(1 << 0);
    /// Include the port
    pub const PORT: Self = Self(1 << 1);
    /// Bracket an IPv6 address even without a port
    pub const BRACKETS: Self = Self(1 << 2);
    /// Render for a remote peer: drop the IPv6 scope id
    pub const REMOTE: Self = Self(1 << 3);

    /// `addr:port`, the common logging form
    pub const DEFAULT: Self = Self(1 << 0 | 1 << 1);
    /// Address only
    pub const HOST: Self = Self(1 << 0);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for AddrFormat {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Render an address per the selected format flags.
pub fn format_addr(addr: &SocketAddr, fmt: AddrFormat) -> String {
    let with_addr = fmt.contains(AddrFormat::ADDR);
    let with_port = fmt.contains(AddrFormat::PORT);

    let host = match addr {
        SocketAddr::V4(v4) => v4.ip().to_string(),
        SocketAddr::V6(v6) => {
            let ip = v6.ip().to_string();
            if v6.scope_id() != 0 && !fmt.contains(AddrFormat::REMOTE) {
                format!("{}%{}", ip, v6.scope_id())
            } else {
                ip
            }
        }
    };

    let bracketed = addr.is_ipv6()
        && with_addr
        && (fmt.contains(AddrFormat::BRACKETS) || with_port);

    match (with_addr, with_port) {
        (true, true) => {
            if bracketed {
                format!("[{}]:{}", host, addr.port())
            } else {
                format!("{}:{}", host, addr.port())
            }
        }
        (true, false) => {
            if bracketed {
                format!("[{}]", host)
            } else {
                host
            }
        }
        (false, true) => addr.port().to_string(),
        (false, false) => String::new(),
    }
}

/// Expiry-based cache for an externally visible hostname.
///
/// Resolution is injected so this type never blocks on DNS itself; the
/// caller supplies whatever resolver its runtime provides. A cached entry
/// is reused until its refresh interval elapses.
#[derive(Debug)]
pub struct ExternHostCache {
    host: String,
    refresh: Duration,
    v4: Option<(Ipv4Addr, Instant)>,
    v6: Option<(IpAddr, Instant)>,
}

impl ExternHostCache {
    pub fn new(host: impl Into<String>, refresh: Duration) -> Self {
        Self {
            host: host.into(),
            refresh,
            v4: None,
            v6: None,
        }
    }

    /// Hostname this cache resolves
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Resolve the host for one family, refreshing through `resolver` only
    /// when the cached entry is absent or expired.
    pub fn resolve<R>(&mut self, family: AddressFamily, mut resolver: R) -> Option<IpAddr>
    where
        R: FnMut(&str) -> Vec<IpAddr>,
    {
        let now = Instant::now();
        match family {
            AddressFamily::V4 => {
                if let Some((addr, fetched)) = self.v4 {
                    if now.duration_since(fetched) < self.refresh {
                        return Some(IpAddr::V4(addr));
                    }
                }
                let fresh = resolver(&self.host).into_iter().find_map(|a| match a {
                    IpAddr::V4(v4) => Some(v4),
                    IpAddr::V6(v6) => v6.to_ipv4_mapped(),
                });
                if let Some(v4) = fresh {
                    debug!(host = %self.host, addr = %v4, "refreshed external IPv4 address");
                    self.v4 = Some((v4, now));
                }
                self.v4.map(|(a, _)| IpAddr::V4(a))
            }
            AddressFamily::V6 => {
                if let Some((addr, fetched)) = self.v6 {
                    if now.duration_since(fetched) < self.refresh {
                        return Some(addr);
                    }
                }
                let fresh = resolver(&self.host)
                    .into_iter()
                    .find(|a| matches!(a, IpAddr::V6(_)));
                if let Some(v6) = fresh {
                    debug!(host = %self.host, addr = %v6, "refreshed external IPv6 address");
                    self.v6 = Some((v6, now));
                }
                self.v6.map(|(a, _)| a)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv6Addr;

    fn sa(s: &str) -> SocketAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_mapped_ipv4_detection() {
        let mapped: IpAddr = "::ffff:10.1.2.3".parse().unwrap();
        assert!(is_mapped_ipv4(&mapped));
        assert_eq!(mapped_ipv4(&mapped), Some(Ipv4Addr::new(10, 1, 2, 3)));

        let plain: IpAddr = "2001:db8::1".parse().unwrap();
        assert!(!is_mapped_ipv4(&plain));
        assert_eq!(mapped_ipv4(&plain), None);
    }

    #[test]
    fn test_cmp_addr_normalizes_mapped() {
        let a = sa("10.1.2.3:2000");
        let b = sa("[::ffff:10.1.2.3]:5060");
        assert_eq!(cmp_addr(&a, &b), Ordering::Equal);
    }

    #[test]
    fn test_cmp_addr_family_order() {
        let v4 = sa("255.255.255.255:1");
        let v6 = sa("[::1]:1");
        assert_eq!(cmp_addr(&v4, &v6), Ordering::Less);
        assert_eq!(cmp_addr(&v6, &v4), Ordering::Greater);
    }

    #[test]
    fn test_cmp_port() {
        assert_eq!(cmp_port(&sa("1.1.1.1:80"), &sa("2.2.2.2:443")), Ordering::Less);
        assert_eq!(cmp_port(&sa("1.1.1.1:80"), &sa("2.2.2.2:80")), Ordering::Equal);
    }

    #[test]
    fn test_is_any_addr() {
        assert!(is_any_addr(&sa("0.0.0.0:0")));
        assert!(is_any_addr(&sa("[::]:2000")));
        assert!(!is_any_addr(&sa("127.0.0.1:2000")));
    }

    #[test]
    fn test_split_host_port_basic() {
        assert_eq!(
            split_host_port("phone.example.com:2000", PortPolicy::Ignore).unwrap(),
            ("phone.example.com", Some(2000))
        );
        assert_eq!(
            split_host_port("phone.example.com", PortPolicy::Ignore).unwrap(),
            ("phone.example.com", None)
        );
    }

    #[test]
    fn test_split_host_port_ipv6() {
        assert_eq!(
            split_host_port("[2001:db8::1]:2000", PortPolicy::Ignore).unwrap(),
            ("2001:db8::1", Some(2000))
        );
        assert_eq!(
            split_host_port("[2001:db8::1]", PortPolicy::Ignore).unwrap(),
            ("2001:db8::1", None)
        );
        // bare v6 literal, colons are not a port separator here
        assert_eq!(
            split_host_port("2001:db8::1", PortPolicy::Ignore).unwrap(),
            ("2001:db8::1", None)
        );
    }

    #[test]
    fn test_split_host_port_policies() {
        assert!(matches!(
            split_host_port("host", PortPolicy::Require),
            Err(SccpError::MissingPort { .. })
        ));
        assert!(matches!(
            split_host_port("host:2000", PortPolicy::Forbid),
            Err(SccpError::UnexpectedPort { .. })
        ));
        assert!(split_host_port("host:2000", PortPolicy::Require).is_ok());
    }

    #[test]
    fn test_split_host_port_rejects_garbage() {
        for bad in ["", ":2000", "host:", "host:notaport", "[2001:db8::1", "[::1]x"] {
            assert!(split_host_port(bad, PortPolicy::Ignore).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn test_format_addr_v4() {
        let addr = sa("10.0.0.1:2000");
        assert_eq!(format_addr(&addr, AddrFormat::DEFAULT), "10.0.0.1:2000");
        assert_eq!(format_addr(&addr, AddrFormat::HOST), "10.0.0.1");
        assert_eq!(format_addr(&addr, AddrFormat::PORT), "2000");
    }

    #[test]
    fn test_format_addr_v6_brackets() {
        let addr = sa("[2001:db8::1]:2000");
        assert_eq!(format_addr(&addr, AddrFormat::DEFAULT), "[2001:db8::1]:2000");
        assert_eq!(format_addr(&addr, AddrFormat::HOST), "2001:db8::1");
        assert_eq!(
            format_addr(&addr, AddrFormat::HOST | AddrFormat::BRACKETS),
            "[2001:db8::1]"
        );
    }

    #[test]
    fn test_format_addr_scope_id() {
        let addr = SocketAddr::V6(std::net::SocketAddrV6::new(
            "fe80::1".parse::<Ipv6Addr>().unwrap(),
            2000,
            0,
            4,
        ));
        assert_eq!(format_addr(&addr, AddrFormat::DEFAULT), "[fe80::1%4]:2000");
        assert_eq!(
            format_addr(&addr, AddrFormat::DEFAULT | AddrFormat::REMOTE),
            "[fe80::1]:2000"
        );
    }

    #[test]
    fn test_extern_host_cache_refreshes_only_when_expired() {
        let mut cache = ExternHostCache::new("pbx.example.com", Duration::from_secs(60));
        let mut calls = 0;
        let resolver = |_: &str| {
            vec![IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10))]
        };

        let first = cache.resolve(AddressFamily::V4, |h| {
            calls += 1;
            resolver(h)
        });
        assert_eq!(first, Some("192.0.2.10".parse().unwrap()));

        let second = cache.resolve(AddressFamily::V4, |h| {
            calls += 1;
            resolver(h)
        });
        assert_eq!(second, first);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_extern_host_cache_zero_ttl_always_refreshes() {
        let mut cache = ExternHostCache::new("pbx.example.com", Duration::ZERO);
        let mut calls = 0;
        for _ in 0..3 {
            cache.resolve(AddressFamily::V4, |_| {
                calls += 1;
                vec![IpAddr::V4(Ipv4Addr::new(192, 0, 2, 11))]
            });
        }
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_extern_host_cache_family_filter() {
        let mut cache = ExternHostCache::new("pbx.example.com", Duration::from_secs(60));
        let answers = vec![
            "192.0.2.12".parse::<IpAddr>().unwrap(),
            "2001:db8::12".parse::<IpAddr>().unwrap(),
        ];
        let v4 = cache.resolve(AddressFamily::V4, |_| answers.clone());
        let v6 = cache.resolve(AddressFamily::V6, |_| answers.clone());
        assert_eq!(v4, Some("192.0.2.12".parse().unwrap()));
        assert_eq!(v6, Some("2001:db8::12".parse().unwrap()));
    }
}
