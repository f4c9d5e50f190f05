//! Site scoping: a query for `example.com` should answer for the root
//! domain and every subdomain (`www.example.com`, `app.example.com`, ...).

/// Strip a single leading `www.` label so queries match all subdomains
/// of the root.
pub fn root_domain(site: &str) -> &str {
    site.strip_prefix("www.").unwrap_or(site)
}

/// A normalized site scope usable as a hit filter.
///
/// Matches a candidate hostname iff it equals the root domain or ends
/// with `"." + root`. An empty scope matches nothing; callers treat it
/// as "no scope" and return zero results instead of querying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteScope {
    root: String,
}

impl SiteScope {
    pub fn new(site: &str) -> Self {
        Self {
            root: root_domain(site.trim()).to_string(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn matches(&self, candidate: &str) -> bool {
        if self.root.is_empty() {
            return false;
        }
        candidate == self.root || candidate.ends_with(&format!(".{}", self.root))
    }

    /// SQL `LIKE` pattern matching any subdomain of the root.
    pub fn subdomain_pattern(&self) -> String {
        format!("%.{}", self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_domain_strips_www() {
        assert_eq!(root_domain("www.example.com"), "example.com");
        assert_eq!(root_domain("example.com"), "example.com");
        assert_eq!(root_domain("app.example.com"), "app.example.com");
    }

    #[test]
    fn test_root_domain_strips_only_one_www() {
        assert_eq!(root_domain("www.www.example.com"), "www.example.com");
    }

    #[test]
    fn test_scope_matches_root_and_subdomains() {
        let scope = SiteScope::new("example.com");
        assert!(scope.matches("example.com"));
        assert!(scope.matches("www.example.com"));
        assert!(scope.matches("app.example.com"));
        assert!(scope.matches("deep.app.example.com"));
    }

    #[test]
    fn test_scope_from_www_site_is_normalized() {
        let scope = SiteScope::new("www.example.com");
        assert_eq!(scope.root(), "example.com");
        assert!(scope.matches("example.com"));
        assert!(scope.matches("www.example.com"));
        assert!(scope.matches("app.example.com"));
    }

    #[test]
    fn test_scope_rejects_lookalike_domains() {
        let scope = SiteScope::new("example.com");
        assert!(!scope.matches("notexample.com"));
        assert!(!scope.matches("example.com.evil.net"));
        assert!(!scope.matches("example.org"));
    }

    #[test]
    fn test_empty_scope_matches_nothing() {
        let scope = SiteScope::new("");
        assert!(scope.is_empty());
        assert!(!scope.matches("example.com"));
        assert!(!scope.matches(""));
    }

    #[test]
    fn test_subdomain_pattern() {
        let scope = SiteScope::new("www.example.com");
        assert_eq!(scope.subdomain_pattern(), "%.example.com");
    }

    #[test]
    fn test_scope_trims_whitespace() {
        let scope = SiteScope::new("  example.com  ");
        assert_eq!(scope.root(), "example.com");
    }
}
