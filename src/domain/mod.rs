pub mod models;
pub mod types;

pub use models::{
    ActiveCountry, ActiveVisitors, BounceRate, CountryCount, DeviceBreakdown, EntryPageCount,
    ExitPageCount, FamilyCount, HostnameCount, HourCount, LanguageCount, NewHit,
    PageviewTotals, PathCount, ReferrerCount, ScreenWidthCount, SessionDuration, SessionHit,
    TimeBucket,
};
pub use types::{DeviceType, Granularity, HitId};
