use moka::sync::Cache;
use std::time::Duration;

use crate::config::Settings;
use crate::ua::{self, UaProfile};

#[derive(Clone)]
pub struct AppCache {
    /// Cache for user-agent classification (raw UA string -> profile).
    /// Classification is pure, so entries never go stale; the TTL only
    /// bounds memory held for UAs no longer seen in traffic.
    pub ua_profiles: Cache<String, UaProfile>,
}

impl AppCache {
    pub fn new(settings: &Settings) -> Self {
        Self {
            ua_profiles: Cache::builder()
                .max_capacity(settings.cache_max_entries)
                .time_to_live(Duration::from_secs(settings.cache_ttl_secs))
                .build(),
        }
    }

    /// Classify a user agent, memoizing by the raw string.
    pub fn profile(&self, ua: &str) -> UaProfile {
        if let Some(profile) = self.ua_profiles.get(ua) {
            return profile;
        }
        let profile = ua::classify(ua);
        self.ua_profiles.insert(ua.to_string(), profile);
        profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DeviceType;

    fn test_settings() -> Settings {
        Settings {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: None,
            database_path: None,
            api_token: None,
            maxmind_country_db: None,
            cache_max_entries: 100,
            cache_ttl_secs: 60,
        }
    }

    #[test]
    fn test_profile_matches_direct_classification() {
        let cache = AppCache::new(&test_settings());
        let ua = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/91.0 Safari/537.36";
        assert_eq!(cache.profile(ua), ua::classify(ua));
    }

    #[test]
    fn test_profile_is_cached() {
        let cache = AppCache::new(&test_settings());
        let ua = "Mozilla/5.0 (iPhone; CPU iPhone OS 14_6 like Mac OS X) Mobile Safari";

        assert!(cache.ua_profiles.get(ua).is_none());
        let profile = cache.profile(ua);
        assert_eq!(profile.device_type, DeviceType::Mobile);
        assert_eq!(cache.ua_profiles.get(ua), Some(profile));
    }

    #[test]
    fn test_profile_repeated_lookups_agree() {
        let cache = AppCache::new(&test_settings());
        let ua = "curl/7.79.1";
        assert_eq!(cache.profile(ua), cache.profile(ua));
    }
}
