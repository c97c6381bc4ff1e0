//! Application constants
//!
//! Centralized location for the fixed strings and limits shared by the
//! projector, the label rules and the reconciliation engine.

// Body projection
pub const MAX_BODY_CHARS: usize = 30_000;
pub const TRUNCATION_NOTICE: &str =
    "\n\nNotice: The entered text is too long. It exceeds the allowed limit of 30,000 characters.";
pub const DISPLAY_TIME_FORMAT: &str = "%H:%M %p, %B %-d %Y";
pub const DEFAULT_DISPLAY_TIMEZONE: &str = "Asia/Shanghai";

// Target issue defaults
pub const SOURCE_LABEL: &str = "github";
pub const FALLBACK_COMPONENT: &str = "general";

// Workflow names
pub const TRANSITION_DONE: &str = "Done";
pub const TRANSITION_TODO: &str = "To Do";
pub const STATUS_CATEGORY_DONE: &str = "Done";

// Reconciliation window
pub const WATERMARK_OVERLAP_DAYS: i64 = 1;
pub const DEFAULT_LOOKBACK_MONTHS: u32 = 3;
pub const SOURCE_PAGE_SIZE: u32 = 100;

// Defaults for the process configuration
pub const DEFAULT_LISTEN_PORT: u16 = 8080;
pub const DEFAULT_WATERMARK_PATH: &str = "last_sync_time.txt";
pub const DEFAULT_GITHUB_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_MARKDOWN_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CORRELATION_ATTEMPTS: u32 = 5;
pub const DEFAULT_CORRELATION_INITIAL_DELAY_MS: u64 = 1_000;
pub const DEFAULT_CORRELATION_MAX_DELAY_MS: u64 = 10_000;
pub const DEFAULT_ISSUE_CONCURRENCY: usize = 32;
