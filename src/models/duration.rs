use std::fmt;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

/// Format a duration as `"<h>u <m>m <s>s"`.
///
/// Zero units are left out; seconds are shown when non-zero or when every
/// unit is zero. Negative durations format as `"0s"`.
///
/// ```
/// use chrono::TimeDelta;
/// use timetrack::models::format_duration;
///
/// assert_eq!(format_duration(TimeDelta::seconds(3661)), "1u 1m 1s");
/// assert_eq!(format_duration(TimeDelta::seconds(90)), "1m 30s");
/// assert_eq!(format_duration(TimeDelta::zero()), "0s");
/// ```
pub fn format_duration(duration: TimeDelta) -> String {
    let total = duration.num_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    let mut parts = Vec::with_capacity(3);
    if hours > 0 {
        parts.push(format!("{}u", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    if seconds > 0 || parts.is_empty() {
        parts.push(format!("{}s", seconds));
    }
    parts.join(" ")
}

/// Elapsed time of a work session together with whether it is still running.
///
/// `Display` renders only the formatted duration; marking a running session
/// is up to whoever presents it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDuration {
    #[serde(with = "seconds")]
    pub elapsed: TimeDelta,
    pub active: bool,
}

impl SessionDuration {
    pub fn label(&self) -> String {
        format_duration(self.elapsed)
    }
}

impl fmt::Display for SessionDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

mod seconds {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimeDelta, D::Error> {
        i64::deserialize(deserializer).map(TimeDelta::seconds)
    }
}
