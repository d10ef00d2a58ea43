//! Elapsed-time feedback against the recording ceiling.

use serde::Serialize;

/// UI severity for the recording progress bar.
///
/// Thresholds are fractions of the 60-second ceiling: below 60% is nominal,
/// 60-80% warns, above 80% is critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProgressLevel {
    Nominal,
    Warning,
    Critical,
}

impl ProgressLevel {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio < 0.6 {
            ProgressLevel::Nominal
        } else if ratio <= 0.8 {
            ProgressLevel::Warning
        } else {
            ProgressLevel::Critical
        }
    }
}

/// Format elapsed seconds as the M:SS timer display.
pub fn format_elapsed(elapsed_secs: u64) -> String {
    format!("{}:{:02}", elapsed_secs / 60, elapsed_secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_thresholds() {
        assert_eq!(ProgressLevel::from_ratio(0.0), ProgressLevel::Nominal);
        assert_eq!(ProgressLevel::from_ratio(0.59), ProgressLevel::Nominal);
        assert_eq!(ProgressLevel::from_ratio(0.6), ProgressLevel::Warning);
        assert_eq!(ProgressLevel::from_ratio(0.8), ProgressLevel::Warning);
        assert_eq!(ProgressLevel::from_ratio(0.81), ProgressLevel::Critical);
        assert_eq!(ProgressLevel::from_ratio(1.0), ProgressLevel::Critical);
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "0:00");
        assert_eq!(format_elapsed(9), "0:09");
        assert_eq!(format_elapsed(59), "0:59");
        assert_eq!(format_elapsed(60), "1:00");
    }
}
