//! Rendering options and configuration.

use chrono::{DateTime, Utc};

/// Options for writing the output package.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Value written to `dcterms:modified` in the core properties.
    /// `None` leaves the template's value untouched.
    pub timestamp: Option<DateTime<Utc>>,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp the output with a modification time.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Stamp the output with the current time.
    pub fn stamped_now(self) -> Self {
        self.with_timestamp(Utc::now())
    }

    /// Keep the template's modification time.
    pub fn without_timestamp(mut self) -> Self {
        self.timestamp = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_builder() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let opts = RenderOptions::new().with_timestamp(ts);
        assert_eq!(opts.timestamp, Some(ts));
        assert!(opts.without_timestamp().timestamp.is_none());
        assert!(RenderOptions::default().timestamp.is_none());
    }
}
