//! Pure metric computations over hit sets fetched from the event store.
//!
//! Every session-derived metric (entry pages, exit pages, bounce rates,
//! session duration) runs on the output of one shared [`sessionize`]
//! pass instead of re-deriving the grouping per metric. Nothing in this
//! module does I/O.

use std::collections::{HashMap, HashSet};

use crate::domain::{
    BounceRate, DeviceBreakdown, DeviceType, EntryPageCount, ExitPageCount, FamilyCount,
    SessionDuration, SessionHit,
};
use crate::ua::UaProfile;

/// Paths under this prefix are assets, not pages; they are excluded
/// from bounce-rate reporting.
pub const STATIC_ASSET_PREFIX: &str = "/static/";

/// A path needs at least this many sessions before its bounce rate is
/// statistically worth reporting.
pub const MIN_BOUNCE_SESSIONS: i64 = 3;

/// One visitor session reconstructed from the hit log: all hits sharing
/// a non-empty session token within the queried site scope.
///
/// First and last hits are chosen by `(ts, id)` ordering, so the result
/// is independent of the order hits are fed in, even when timestamps tie.
#[derive(Debug, Clone)]
pub struct SessionGroup {
    pub first_ts: i64,
    pub first_id: i64,
    pub first_path: String,
    pub last_ts: i64,
    pub last_id: i64,
    pub last_path: String,
    pub hit_count: i64,
    pub paths: HashSet<String>,
}

/// Group raw hits into sessions. Hits with an empty session token cannot
/// be attributed to a visitor and are skipped.
pub fn sessionize(hits: &[SessionHit]) -> HashMap<String, SessionGroup> {
    let mut groups: HashMap<String, SessionGroup> = HashMap::new();

    for hit in hits {
        if hit.session.is_empty() {
            continue;
        }
        match groups.get_mut(&hit.session) {
            Some(group) => {
                if (hit.ts, hit.id) < (group.first_ts, group.first_id) {
                    group.first_ts = hit.ts;
                    group.first_id = hit.id;
                    group.first_path = hit.path.clone();
                }
                if (hit.ts, hit.id) > (group.last_ts, group.last_id) {
                    group.last_ts = hit.ts;
                    group.last_id = hit.id;
                    group.last_path = hit.path.clone();
                }
                group.hit_count += 1;
                group.paths.insert(hit.path.clone());
            }
            None => {
                let mut paths = HashSet::new();
                paths.insert(hit.path.clone());
                groups.insert(
                    hit.session.clone(),
                    SessionGroup {
                        first_ts: hit.ts,
                        first_id: hit.id,
                        first_path: hit.path.clone(),
                        last_ts: hit.ts,
                        last_id: hit.id,
                        last_path: hit.path.clone(),
                        hit_count: 1,
                        paths,
                    },
                );
            }
        }
    }

    groups
}

/// Top pages sessions started on.
pub fn entry_pages(groups: &HashMap<String, SessionGroup>, limit: usize) -> Vec<EntryPageCount> {
    let counts = count_by(groups.values().map(|g| g.first_path.as_str()));
    ranked(counts, limit)
        .into_iter()
        .map(|(path, entries)| EntryPageCount { path, entries })
        .collect()
}

/// Top pages sessions ended on.
pub fn exit_pages(groups: &HashMap<String, SessionGroup>, limit: usize) -> Vec<ExitPageCount> {
    let counts = count_by(groups.values().map(|g| g.last_path.as_str()));
    ranked(counts, limit)
        .into_iter()
        .map(|(path, exits)| ExitPageCount { path, exits })
        .collect()
}

/// Per-page bounce rate: of the sessions that visited a page at all, the
/// percentage that visited only that page and nothing else.
pub fn bounce_rates(groups: &HashMap<String, SessionGroup>, limit: usize) -> Vec<BounceRate> {
    let mut totals: HashMap<&str, i64> = HashMap::new();
    let mut bounces: HashMap<&str, i64> = HashMap::new();

    for group in groups.values() {
        for path in &group.paths {
            *totals.entry(path.as_str()).or_insert(0) += 1;
        }
        if group.hit_count == 1 {
            *bounces.entry(group.first_path.as_str()).or_insert(0) += 1;
        }
    }

    let mut rates: Vec<BounceRate> = totals
        .into_iter()
        .filter(|(path, total)| {
            !path.starts_with(STATIC_ASSET_PREFIX) && *total >= MIN_BOUNCE_SESSIONS
        })
        .map(|(path, total)| {
            let bounced = bounces.get(path).copied().unwrap_or(0);
            BounceRate {
                path: path.to_string(),
                total_sessions: total,
                bounce_rate: round1(100.0 * bounced as f64 / total as f64),
            }
        })
        .collect();

    // Rate descending, path ascending on ties
    rates.sort_by(|a, b| {
        b.bounce_rate
            .partial_cmp(&a.bounce_rate)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.path.cmp(&b.path))
    });
    rates.truncate(limit);
    rates
}

/// Average session length in seconds. Single-hit sessions have no
/// defined duration and are excluded from both the average and the count.
pub fn session_duration(groups: &HashMap<String, SessionGroup>) -> SessionDuration {
    let durations: Vec<i64> = groups
        .values()
        .filter(|g| g.hit_count > 1)
        .map(|g| g.last_ts - g.first_ts)
        .collect();

    if durations.is_empty() {
        return SessionDuration::default();
    }

    let total: i64 = durations.iter().sum();
    SessionDuration {
        avg_seconds: round1(total as f64 / durations.len() as f64),
        sessions: durations.len() as i64,
    }
}

/// Hit counts per device type over classified user agents.
pub fn device_breakdown(profiles: &[UaProfile]) -> DeviceBreakdown {
    let mut breakdown = DeviceBreakdown::default();
    for profile in profiles {
        match profile.device_type {
            DeviceType::Mobile => breakdown.mobile += 1,
            DeviceType::Tablet => breakdown.tablet += 1,
            DeviceType::Desktop => breakdown.desktop += 1,
            DeviceType::Unknown => breakdown.unknown += 1,
        }
    }
    breakdown
}

/// Hit counts per browser family, descending.
pub fn browser_breakdown(profiles: &[UaProfile], limit: usize) -> Vec<FamilyCount> {
    family_counts(profiles.iter().map(|p| p.browser), limit)
}

/// Hit counts per OS family, descending.
pub fn os_breakdown(profiles: &[UaProfile], limit: usize) -> Vec<FamilyCount> {
    family_counts(profiles.iter().map(|p| p.os), limit)
}

fn family_counts<'a>(names: impl Iterator<Item = &'a str>, limit: usize) -> Vec<FamilyCount> {
    ranked(count_by(names), limit)
        .into_iter()
        .map(|(name, views)| FamilyCount { name, views })
        .collect()
}

fn count_by<'a>(keys: impl Iterator<Item = &'a str>) -> HashMap<&'a str, i64> {
    let mut counts = HashMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

/// Count descending, key ascending on ties: the documented stable order
/// for every top-N list computed in-process.
fn ranked(counts: HashMap<&str, i64>, limit: usize) -> Vec<(String, i64)> {
    let mut items: Vec<(String, i64)> = counts
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    items.truncate(limit);
    items
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ua;

    fn hit(id: i64, ts: i64, session: &str, path: &str) -> SessionHit {
        SessionHit {
            id,
            ts,
            session: session.to_string(),
            path: path.to_string(),
        }
    }

    #[test]
    fn test_sessionize_groups_by_token() {
        let hits = vec![
            hit(1, 100, "a", "/"),
            hit(2, 110, "a", "/about"),
            hit(3, 105, "b", "/"),
        ];
        let groups = sessionize(&hits);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["a"].hit_count, 2);
        assert_eq!(groups["b"].hit_count, 1);
    }

    #[test]
    fn test_sessionize_skips_empty_tokens() {
        let hits = vec![hit(1, 100, "", "/"), hit(2, 110, "a", "/")];
        let groups = sessionize(&hits);
        assert_eq!(groups.len(), 1);
        assert!(groups.contains_key("a"));
    }

    #[test]
    fn test_sessionize_first_and_last_by_timestamp() {
        let hits = vec![
            hit(5, 200, "a", "/exit"),
            hit(3, 100, "a", "/entry"),
            hit(4, 150, "a", "/middle"),
        ];
        let groups = sessionize(&hits);
        let g = &groups["a"];
        assert_eq!(g.first_path, "/entry");
        assert_eq!(g.last_path, "/exit");
        assert_eq!(g.first_ts, 100);
        assert_eq!(g.last_ts, 200);
    }

    #[test]
    fn test_sessionize_ties_broken_by_id_regardless_of_input_order() {
        // Two hits with identical timestamps: the smaller id is the
        // entry, the larger the exit, however the input is ordered.
        let forward = vec![hit(1, 100, "a", "/first"), hit(2, 100, "a", "/second")];
        let reversed = vec![hit(2, 100, "a", "/second"), hit(1, 100, "a", "/first")];

        for hits in [forward, reversed] {
            let groups = sessionize(&hits);
            let g = &groups["a"];
            assert_eq!(g.first_path, "/first");
            assert_eq!(g.last_path, "/second");
        }
    }

    #[test]
    fn test_entry_and_exit_pages() {
        let hits = vec![
            hit(1, 100, "a", "/home"),
            hit(2, 150, "a", "/pricing"),
            hit(3, 100, "b", "/home"),
            hit(4, 130, "b", "/docs"),
            hit(5, 100, "c", "/blog"),
        ];
        let groups = sessionize(&hits);

        let entries = entry_pages(&groups, 10);
        assert_eq!(entries[0].path, "/home");
        assert_eq!(entries[0].entries, 2);
        assert_eq!(entries[1].path, "/blog");

        let exits = exit_pages(&groups, 10);
        assert_eq!(exits.len(), 3);
        assert!(exits
            .iter()
            .all(|e| ["/pricing", "/docs", "/blog"].contains(&e.path.as_str())));
    }

    #[test]
    fn test_entry_pages_truncates_to_limit() {
        let hits = vec![
            hit(1, 100, "a", "/one"),
            hit(2, 100, "b", "/two"),
            hit(3, 100, "c", "/three"),
        ];
        let groups = sessionize(&hits);
        assert_eq!(entry_pages(&groups, 2).len(), 2);
    }

    #[test]
    fn test_bounce_rate_two_of_three() {
        // /landing seen by 3 sessions; 2 of them saw nothing else
        let hits = vec![
            hit(1, 100, "a", "/landing"),
            hit(2, 100, "b", "/landing"),
            hit(3, 100, "c", "/landing"),
            hit(4, 160, "c", "/other"),
        ];
        let groups = sessionize(&hits);
        let rates = bounce_rates(&groups, 10);

        let landing = rates.iter().find(|r| r.path == "/landing").unwrap();
        assert_eq!(landing.total_sessions, 3);
        assert_eq!(landing.bounce_rate, 66.7);
    }

    #[test]
    fn test_bounce_rate_excludes_thin_paths() {
        // Only 2 sessions saw the page: below the reporting threshold
        let hits = vec![hit(1, 100, "a", "/rare"), hit(2, 100, "b", "/rare")];
        let groups = sessionize(&hits);
        assert!(bounce_rates(&groups, 10).is_empty());
    }

    #[test]
    fn test_bounce_rate_excludes_static_assets() {
        let hits = vec![
            hit(1, 100, "a", "/static/app.css"),
            hit(2, 100, "b", "/static/app.css"),
            hit(3, 100, "c", "/static/app.css"),
        ];
        let groups = sessionize(&hits);
        assert!(bounce_rates(&groups, 10).is_empty());
    }

    #[test]
    fn test_bounce_rate_repeat_views_of_same_page_are_not_bounces() {
        // Session refreshed the page: 2 hits, not a bounce
        let hits = vec![
            hit(1, 100, "a", "/p"),
            hit(2, 110, "a", "/p"),
            hit(3, 100, "b", "/p"),
            hit(4, 100, "c", "/p"),
        ];
        let groups = sessionize(&hits);
        let rates = bounce_rates(&groups, 10);
        assert_eq!(rates[0].total_sessions, 3);
        assert_eq!(rates[0].bounce_rate, 66.7);
    }

    #[test]
    fn test_session_duration_excludes_single_hit_sessions() {
        let hits = vec![
            hit(1, 100, "a", "/"),
            hit(2, 160, "a", "/about"),
            hit(3, 500, "b", "/"),
        ];
        let groups = sessionize(&hits);
        let duration = session_duration(&groups);
        assert_eq!(duration.sessions, 1);
        assert_eq!(duration.avg_seconds, 60.0);
    }

    #[test]
    fn test_session_duration_empty_when_no_multi_hit_sessions() {
        let hits = vec![hit(1, 100, "a", "/")];
        let groups = sessionize(&hits);
        assert_eq!(session_duration(&groups), SessionDuration::default());
    }

    #[test]
    fn test_session_duration_averages() {
        let hits = vec![
            hit(1, 100, "a", "/"),
            hit(2, 160, "a", "/x"),
            hit(3, 100, "b", "/"),
            hit(4, 220, "b", "/y"),
        ];
        let groups = sessionize(&hits);
        let duration = session_duration(&groups);
        assert_eq!(duration.sessions, 2);
        assert_eq!(duration.avg_seconds, 90.0);
    }

    #[test]
    fn test_device_breakdown() {
        let profiles = vec![
            ua::classify("Mozilla/5.0 (iPhone; CPU iPhone OS 14_6 like Mac OS X) Mobile Safari"),
            ua::classify("Mozilla/5.0 (iPad; CPU OS 14_6 like Mac OS X) Mobile Safari"),
            ua::classify("Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/91.0 Safari/537.36"),
            ua::classify(""),
        ];
        let breakdown = device_breakdown(&profiles);
        assert_eq!(breakdown.mobile, 1);
        assert_eq!(breakdown.tablet, 1);
        assert_eq!(breakdown.desktop, 1);
        assert_eq!(breakdown.unknown, 1);
    }

    #[test]
    fn test_browser_breakdown_sorted_with_stable_ties() {
        let profiles = vec![
            ua::classify("Mozilla/5.0 (Windows NT 10.0) Chrome/91.0 Safari/537.36"),
            ua::classify("Mozilla/5.0 (Windows NT 10.0) Chrome/91.0 Safari/537.36"),
            ua::classify("Mozilla/5.0 (Windows NT 10.0; rv:89.0) Gecko/20100101 Firefox/89.0"),
            ua::classify("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) Safari/605.1.15"),
        ];
        let counts = browser_breakdown(&profiles, 10);
        assert_eq!(counts[0].name, "Chrome");
        assert_eq!(counts[0].views, 2);
        // Tie between Firefox and Safari resolves lexicographically
        assert_eq!(counts[1].name, "Firefox");
        assert_eq!(counts[2].name, "Safari");
    }

    #[test]
    fn test_os_breakdown_catch_all() {
        let profiles = vec![ua::classify("curl/7.79.1")];
        let counts = os_breakdown(&profiles, 10);
        assert_eq!(counts[0].name, "other");
        assert_eq!(counts[0].views, 1);
    }
}
