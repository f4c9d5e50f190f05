use ipnetwork::IpNetwork;
use maxminddb::{geoip2, Reader};
use std::net::IpAddr;
use std::path::Path;
use tracing::{debug, warn};

// Addresses in these ranges can never resolve to a country and are
// skipped before touching the database.
const RESERVED_NETWORKS: &[&str] = &[
    "10.0.0.0/8",
    "172.16.0.0/12",
    "192.168.0.0/16",
    "127.0.0.0/8",
    "169.254.0.0/16",
    "100.64.0.0/10",
    "::1/128",
    "fc00::/7",
    "fe80::/10",
];

/// Resolves client IPs to ISO 3166-1 alpha-2 country codes. A missing
/// or unreadable database degrades to "no country" rather than failing
/// ingestion.
pub struct CountryResolver {
    reader: Option<Reader<Vec<u8>>>,
    reserved: Vec<IpNetwork>,
}

impl CountryResolver {
    pub fn new(country_db_path: Option<&str>) -> Self {
        let reader = if let Some(path) = country_db_path {
            if Path::new(path).exists() {
                match Reader::open_readfile(path) {
                    Ok(reader) => {
                        debug!("Loaded GeoIP country database from {}", path);
                        Some(reader)
                    }
                    Err(e) => {
                        warn!("Failed to load GeoIP country database: {}", e);
                        None
                    }
                }
            } else {
                warn!("GeoIP country database not found at {}", path);
                None
            }
        } else {
            None
        };

        let reserved = RESERVED_NETWORKS
            .iter()
            .filter_map(|cidr| cidr.parse().ok())
            .collect();

        Self { reader, reserved }
    }

    /// Resolve an IP in textual form. Returns `None` for unparseable
    /// addresses, reserved ranges, and addresses the database does not
    /// cover.
    pub fn lookup(&self, ip: &str) -> Option<String> {
        let addr: IpAddr = ip.parse().ok()?;

        if self.reserved.iter().any(|net| net.contains(addr)) {
            return None;
        }

        let reader = self.reader.as_ref()?;
        let result = reader.lookup(addr).ok()?;
        let country = result.decode::<geoip2::Country>().ok()??;
        country.country.iso_code.map(|code| code.to_string())
    }

    pub fn is_available(&self) -> bool {
        self.reader.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolver_without_db() {
        let resolver = CountryResolver::new(None);
        assert!(!resolver.is_available());
        assert_eq!(resolver.lookup("8.8.8.8"), None);
    }

    #[test]
    fn test_resolver_with_nonexistent_path() {
        let resolver = CountryResolver::new(Some("/nonexistent/GeoLite2-Country.mmdb"));
        assert!(!resolver.is_available());
    }

    #[test]
    fn test_lookup_invalid_ip() {
        let resolver = CountryResolver::new(None);
        assert_eq!(resolver.lookup("not-an-ip"), None);
        assert_eq!(resolver.lookup(""), None);
    }

    #[test]
    fn test_reserved_ranges_parse() {
        let resolver = CountryResolver::new(None);
        assert_eq!(resolver.reserved.len(), RESERVED_NETWORKS.len());
    }

    #[test]
    fn test_private_ips_never_resolve() {
        let resolver = CountryResolver::new(None);
        for ip in ["10.1.2.3", "172.16.0.1", "192.168.1.1", "127.0.0.1", "::1"] {
            assert_eq!(resolver.lookup(ip), None, "{ip} should not resolve");
        }
    }

    #[test]
    fn test_public_ipv6_parses() {
        // Valid public address, no database loaded
        let resolver = CountryResolver::new(None);
        assert_eq!(resolver.lookup("2001:4860:4860::8888"), None);
    }
}
