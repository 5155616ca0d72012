//! Wall-clock timestamps and inclusive epoch windows.

use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch (or any fixed origin the caller picks).
pub type Millis = i64;

pub const SECOND_MS: Millis = 1_000;
pub const MINUTE_MS: Millis = 60 * SECOND_MS;

/// Inclusive time range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: Millis,
    pub end: Millis,
}

impl Window {
    pub fn new(start: Millis, end: Millis) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, t: Millis) -> bool {
        t >= self.start && t <= self.end
    }

    pub fn len(&self) -> Millis {
        (self.end - self.start).max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Format a remaining duration as `m:ss`, clamping negatives to zero.
pub fn format_countdown(ms: Millis) -> String {
    let total_secs = ms.max(0) / SECOND_MS;
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_inclusive_bounds() {
        let w = Window::new(100, 200);
        assert!(w.contains(100));
        assert!(w.contains(200));
        assert!(!w.contains(99));
        assert!(!w.contains(201));
        assert_eq!(w.len(), 100);
    }

    #[test]
    fn test_countdown_format() {
        assert_eq!(format_countdown(0), "0:00");
        assert_eq!(format_countdown(65_400), "1:05");
        assert_eq!(format_countdown(300_000), "5:00");
        assert_eq!(format_countdown(-5), "0:00");
    }
}
