use serde::{Deserialize, Serialize};
use std::fmt;

/// Surrogate key of one hit row; monotonically increasing insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HitId(pub i64);

impl fmt::Display for HitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Mobile,
    Tablet,
    Desktop,
    #[default]
    Unknown,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Tablet => "tablet",
            Self::Desktop => "desktop",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time-series bucket size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Granularity {
    #[default]
    Day,
    Hour,
}

impl Granularity {
    /// Lenient parse of the `granularity` query parameter; anything not
    /// recognizably hourly falls back to daily.
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("hour") | Some("hourly") => Self::Hour,
            _ => Self::Day,
        }
    }

    /// SQLite expression turning a Unix-seconds `ts` column into the
    /// UTC bucket key.
    pub fn bucket_expr(&self) -> &'static str {
        match self {
            Self::Day => "date(ts, 'unixepoch')",
            Self::Hour => "strftime('%Y-%m-%d %H:00', ts, 'unixepoch')",
        }
    }
}
