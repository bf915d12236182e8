//! Cloud timestamps.

use chrono::{DateTime, Utc};

/// UTC timestamp used for `last_connection` and similar cloud fields.
pub type Timestamp = DateTime<Utc>;
