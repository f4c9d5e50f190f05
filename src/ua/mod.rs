//! User-agent classification by ordered heuristic matching.
//!
//! The order of the checks is load-bearing: many tablet UAs also carry
//! mobile markers, and every Chrome-derived browser embeds "Chrome" and
//! "Safari" in its UA string. First match wins.

use serde::Serialize;

use crate::domain::DeviceType;

// Checked before the mobile markers; Android tablets omit "Mobile" from
// their UA while Android phones include it.
const TABLET_MARKERS: &[&str] = &["ipad", "tablet", "playbook", "silk"];

const MOBILE_MARKERS: &[&str] = &[
    "mobi",
    "android",
    "iphone",
    "ipod",
    "blackberry",
    "iemobile",
    "opera mini",
];

/// Classification of one raw user-agent string. All fields derive from
/// pure substring heuristics, so results are safe to cache by UA string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UaProfile {
    pub device_type: DeviceType,
    pub browser: &'static str,
    pub os: &'static str,
}

pub fn classify(ua: &str) -> UaProfile {
    UaProfile {
        device_type: device_type(ua),
        browser: browser_family(ua),
        os: os_family(ua),
    }
}

pub fn device_type(ua: &str) -> DeviceType {
    if ua.is_empty() {
        return DeviceType::Unknown;
    }
    let lower = ua.to_ascii_lowercase();
    if TABLET_MARKERS.iter().any(|m| lower.contains(m))
        || (lower.contains("android") && !lower.contains("mobile"))
    {
        return DeviceType::Tablet;
    }
    if MOBILE_MARKERS.iter().any(|m| lower.contains(m)) {
        return DeviceType::Mobile;
    }
    DeviceType::Desktop
}

/// Browser family from raw substring tests. Edge/Opera/Samsung must be
/// checked before Chrome, and Chrome before Safari, because each later
/// engine string is embedded in the earlier browsers' UAs.
pub fn browser_family(ua: &str) -> &'static str {
    if ua.contains("Edg") {
        "Edge"
    } else if ua.contains("OPR") || ua.contains("Opera") {
        "Opera"
    } else if ua.contains("SamsungBrowser") {
        "Samsung Internet"
    } else if ua.contains("Firefox") {
        "Firefox"
    } else if ua.contains("Chrome") {
        "Chrome"
    } else if ua.contains("Safari") {
        "Safari"
    } else {
        "other"
    }
}

pub fn os_family(ua: &str) -> &'static str {
    if ua.contains("iPhone") || ua.contains("iPad") || ua.contains("iPod") {
        "iOS"
    } else if ua.contains("Android") {
        "Android"
    } else if ua.contains("Windows") {
        "Windows"
    } else if ua.contains("Mac OS X") || ua.contains("Macintosh") {
        "macOS"
    } else if ua.contains("Linux") {
        "Linux"
    } else {
        "other"
    }
}
