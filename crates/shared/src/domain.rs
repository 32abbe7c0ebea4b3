use std::{fmt, time::Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Started,
    Stopped,
    Reset,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 3] = [
        NotificationKind::Started,
        NotificationKind::Stopped,
        NotificationKind::Reset,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Started => "started",
            NotificationKind::Stopped => "stopped",
            NotificationKind::Reset => "reset",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fire-and-forget message emitted on a stopwatch state transition.
///
/// `elapsed` is the elapsed time observed when the notification was built,
/// so observers of a Stopped notification get the exact total without
/// parsing `message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub elapsed: Duration,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            kind,
            message: message.into(),
            elapsed,
        }
    }
}

/// Formats a duration as `HH:MM:SS`, dropping sub-second precision.
/// Hours are not wrapped at 24.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_zero_as_all_zero_fields() {
        assert_eq!(format_elapsed(Duration::ZERO), "00:00:00");
    }

    #[test]
    fn formats_hours_minutes_and_seconds() {
        assert_eq!(format_elapsed(Duration::from_secs(3 * 3600 + 25 * 60 + 7)), "03:25:07");
    }

    #[test]
    fn truncates_sub_second_precision() {
        assert_eq!(format_elapsed(Duration::from_millis(59_999)), "00:00:59");
    }

    #[test]
    fn does_not_wrap_past_a_day() {
        assert_eq!(format_elapsed(Duration::from_secs(100 * 3600)), "100:00:00");
    }
}
