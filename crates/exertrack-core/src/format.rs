//! Display formatting for elapsed time and metrics.

use std::time::Duration;

/// Placeholder shown for a metric with no data yet.
pub const EMPTY_METRIC: &str = "--";

/// Format an elapsed active duration for the watch face.
///
/// `with_tenths` adds a tenths-of-a-second suffix for the fast foreground
/// chronometer; the reduced-power display omits it since it only redraws
/// about once a minute.
pub fn format_elapsed(duration: Duration, with_tenths: bool) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    let mut out = if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    };
    if with_tenths {
        let tenths = duration.subsec_millis() / 100;
        out.push_str(&format!(".{tenths}"));
    }
    out
}

/// Format a total distance in meters as kilometers with two decimals.
pub fn format_distance_km(meters: f64) -> String {
    format!("{:.2}", meters / 1000.0)
}

/// Format a heart rate sample as a whole number of beats per minute.
pub fn format_heart_rate(bpm: f64) -> String {
    format!("{}", bpm.round() as i64)
}

/// Format a step count.
pub fn format_steps(steps: u64) -> String {
    steps.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_under_an_hour() {
        assert_eq!(format_elapsed(Duration::from_secs(0), false), "00:00");
        assert_eq!(format_elapsed(Duration::from_secs(61), false), "01:01");
        assert_eq!(format_elapsed(Duration::from_secs(599), false), "09:59");
    }

    #[test]
    fn elapsed_with_hours() {
        assert_eq!(format_elapsed(Duration::from_secs(3600), false), "1:00:00");
        assert_eq!(format_elapsed(Duration::from_secs(3723), false), "1:02:03");
    }

    #[test]
    fn elapsed_with_tenths() {
        assert_eq!(format_elapsed(Duration::from_millis(1_500), true), "00:01.5");
        assert_eq!(format_elapsed(Duration::from_millis(90), true), "00:00.0");
    }

    #[test]
    fn distance_km() {
        assert_eq!(format_distance_km(0.0), "0.00");
        assert_eq!(format_distance_km(1234.0), "1.23");
        assert_eq!(format_distance_km(5000.0), "5.00");
    }

    #[test]
    fn heart_rate_rounds() {
        assert_eq!(format_heart_rate(71.4), "71");
        assert_eq!(format_heart_rate(71.5), "72");
    }
}
