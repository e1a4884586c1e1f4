//! Utility functions for the rating service

use chrono::{DateTime, Utc};

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Format a rating with an explicit sign and two decimals
pub fn format_rating(rating: f64) -> String {
    format!("{:+.2}", rating)
}

/// Compare two floats within an absolute tolerance
pub fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_rating() {
        assert_eq!(format_rating(0.14), "+0.14");
        assert_eq!(format_rating(-1.236), "-1.24");
        assert_eq!(format_rating(0.0), "+0.00");
    }

    #[test]
    fn test_approx_eq() {
        assert!(approx_eq(0.1 + 0.2, 0.3, 1e-12));
        assert!(!approx_eq(1.0, 1.1, 0.01));
    }

    #[test]
    fn test_timestamps_advance() {
        let first = current_timestamp();
        let second = current_timestamp();
        assert!(second >= first);
    }
}
