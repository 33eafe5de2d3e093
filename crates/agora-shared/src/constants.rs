/// Application name
pub const APP_NAME: &str = "agora";

/// Page size used when a caller does not supply a limit
pub const DEFAULT_PAGE_LIMIT: u32 = 100;

/// Upper bound accepted for a single page
pub const MAX_PAGE_LIMIT: u32 = 10_000;

/// Parent id that marks a top-level post
pub const ROOT_PARENT: i64 = 0;
