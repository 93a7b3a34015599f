use std::num::{NonZeroU32, NonZeroUsize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Page size requested from the events endpoint.
pub const DEFAULT_LIMIT: NonZeroU32 = unsafe { NonZeroU32::new_unchecked(1000) };

/// Virtual users per scenario.
pub const DEFAULT_VUS: NonZeroUsize = unsafe { NonZeroUsize::new_unchecked(4) };

pub const DEFAULT_DURATION: Duration = Duration::from_secs(20);

/// Safety cap on pages per flow, guards against a server that never stops paginating.
pub const DEFAULT_MAX_PAGES: NonZeroU32 = unsafe { NonZeroU32::new_unchecked(1000) };

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub const EVENTS_PATH: &str = "disputes/events";

/// Name of the check recorded for every page request.
pub const STATUS_CHECK: &str = "200";
