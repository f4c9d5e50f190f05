use serde::{Deserialize, Serialize};

/// Input to the single write path. Hits are append-only: never mutated
/// or deleted by this crate. `ts` is assigned by the ingestion
/// boundary, `country` by the geo resolver.
#[derive(Debug, Clone, Default)]
pub struct NewHit {
    pub ts: i64,
    pub site: String,
    pub path: String,
    pub referrer: String,
    pub ua: String,
    pub lang: String,
    pub w: Option<i64>,
    pub session: String,
    pub country: Option<String>,
}

/// Minimal hit projection consumed by the sessionization routine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHit {
    pub id: i64,
    pub ts: i64,
    pub session: String,
    pub path: String,
}

// Metric responses. Field names follow the wire format of the beacon
// parameters (`ref`, `lang`, `w`) where the metric exposes them.

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PageviewTotals {
    pub views: i64,
    pub sessions: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathCount {
    pub path: String,
    pub views: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferrerCount {
    #[serde(rename = "ref")]
    pub referrer: String,
    pub views: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeBucket {
    pub bucket: String,
    pub views: i64,
    pub sessions: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeviceBreakdown {
    pub mobile: i64,
    pub tablet: i64,
    pub desktop: i64,
    pub unknown: i64,
}

/// Browser or OS family count; open category set with an "other"
/// catch-all.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FamilyCount {
    pub name: String,
    pub views: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageCount {
    pub lang: String,
    pub views: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryCount {
    pub country: String,
    pub views: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostnameCount {
    pub site: String,
    pub views: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenWidthCount {
    pub width: i64,
    pub views: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourCount {
    pub hour: i64,
    pub views: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveCountry {
    pub country: String,
    pub sessions: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveVisitors {
    pub active: i64,
    pub window_seconds: i64,
    pub countries: Vec<ActiveCountry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntryPageCount {
    pub path: String,
    pub entries: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExitPageCount {
    pub path: String,
    pub exits: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BounceRate {
    pub path: String,
    pub total_sessions: i64,
    pub bounce_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SessionDuration {
    pub avg_seconds: f64,
    pub sessions: i64,
}
