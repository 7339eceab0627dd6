//! Human-readable renderings of durations and 500 m splits.
//!
//! Inputs are raw seconds as stored in the database. Negative or non-finite
//! values render as a placeholder rather than an error.

/// `M:SS.cc`, centiseconds truncated. Invalid input renders as `00:00.00`.
pub fn format_duration_ms(total_seconds: Option<f64>) -> String {
    let total = match total_seconds {
        Some(s) if s.is_finite() && s >= 0.0 => s,
        _ => return "00:00.00".to_string(),
    };

    let minutes = (total / 60.0).floor() as i64;
    let remainder = total % 60.0;
    let seconds = remainder.floor() as i64;
    let centiseconds = ((remainder - seconds as f64) * 100.0) as i64;

    format!("{}:{:02}.{:02}", minutes, seconds, centiseconds)
}

/// `Xd:HHh:MMm:SSs`, dropping leading zero components. Hours are shown
/// whenever days are.
pub fn format_total_seconds_human_readable(total_seconds: Option<f64>) -> String {
    let total = match total_seconds {
        Some(s) if s.is_finite() && s >= 0.0 => s,
        _ => return "N/A".to_string(),
    };

    let days = (total / 86_400.0).floor() as i64;
    let after_days = total % 86_400.0;
    let hours = (after_days / 3600.0).floor() as i64;
    let after_hours = after_days % 3600.0;
    let minutes = (after_hours / 60.0).floor() as i64;
    let seconds = (after_hours % 60.0).floor() as i64;

    let mut parts = Vec::with_capacity(4);
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        if days > 0 {
            parts.push(format!("{:02}h", hours));
        } else {
            parts.push(format!("{}h", hours));
        }
    } else if days > 0 {
        parts.push("00h".to_string());
    }
    parts.push(format!("{:02}m", minutes));
    parts.push(format!("{:02}s", seconds));

    parts.join(":")
}

/// Split per 500 m as `M:SS.t`, tenths truncated. Zero or negative splits
/// mean "no pace" and render as `N/A`.
pub fn format_split_short(split_seconds: Option<f64>) -> String {
    let split = match split_seconds {
        Some(s) if s.is_finite() && s > 0.0 => s,
        _ => return "N/A".to_string(),
    };

    let minutes = (split / 60.0).floor() as i64;
    let tenths_total = ((split % 60.0) * 10.0) as i64;
    let seconds = tenths_total / 10;
    let tenths = tenths_total % 10;

    format!("{}:{:02}.{}", minutes, seconds, tenths)
}

/// `Hh MMm SSs`, or `MMm SSs` under an hour.
pub fn format_seconds_to_hms(total_seconds: Option<f64>) -> String {
    let total = match total_seconds {
        Some(s) if s.is_finite() && s >= 0.0 => s,
        _ => return "N/A".to_string(),
    };

    let hours = (total / 3600.0).floor() as i64;
    let after_hours = total % 3600.0;
    let minutes = (after_hours / 60.0).floor() as i64;
    let seconds = (after_hours % 60.0).floor() as i64;

    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, minutes, seconds)
    } else {
        format!("{:02}m {:02}s", minutes, seconds)
    }
}

/// Whole-second pace label (`m:ss`) used for chart annotations.
pub fn format_pace_label(split_seconds: f64) -> String {
    let rounded = split_seconds.round().max(0.0) as i64;
    format!("{}:{:02}", rounded / 60, rounded % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration_ms() {
        assert_eq!(format_duration_ms(Some(0.0)), "0:00.00");
        assert_eq!(format_duration_ms(Some(125.5)), "2:05.50");
        assert_eq!(format_duration_ms(Some(-1.0)), "00:00.00");
        assert_eq!(format_duration_ms(None), "00:00.00");
    }

    #[test]
    fn test_format_total_seconds_human_readable() {
        assert_eq!(format_total_seconds_human_readable(Some(0.0)), "00m:00s");
        assert_eq!(format_total_seconds_human_readable(Some(3725.0)), "1h:02m:05s");
        assert_eq!(format_total_seconds_human_readable(Some(86_400.0 + 65.0)), "1d:00h:01m:05s");
        assert_eq!(format_total_seconds_human_readable(Some(2.0 * 86_400.0 + 3.0 * 3600.0)), "2d:03h:00m:00s");
        assert_eq!(format_total_seconds_human_readable(None), "N/A");
    }

    #[test]
    fn test_format_split_short() {
        assert_eq!(format_split_short(Some(125.37)), "2:05.3");
        assert_eq!(format_split_short(Some(90.0)), "1:30.0");
        assert_eq!(format_split_short(Some(0.0)), "N/A");
        assert_eq!(format_split_short(Some(f64::NAN)), "N/A");
    }

    #[test]
    fn test_format_seconds_to_hms() {
        assert_eq!(format_seconds_to_hms(Some(59.9)), "00m 59s");
        assert_eq!(format_seconds_to_hms(Some(3661.0)), "1h 01m 01s");
    }

    #[test]
    fn test_format_pace_label_carries_rounded_minute() {
        assert_eq!(format_pace_label(125.4), "2:05");
        assert_eq!(format_pace_label(119.6), "2:00");
    }
}
