//! Hard caps enforced by the store before anything reaches the change log.

pub const MAX_RESOURCES: usize = 10_000;
pub const MAX_EVENTS_PER_RESOURCE: usize = 100_000;
pub const MAX_NAME_LEN: usize = 256;
pub const MAX_TITLE_LEN: usize = 512;
pub const MAX_COLOR_LEN: usize = 64;
/// Longest span a single event may cover, in days.
pub const MAX_EVENT_DAYS: i64 = 366;
pub const MAX_SEED_RESOURCES: usize = 26;
