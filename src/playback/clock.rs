// Elapsed/total time readout helpers

/// Length of a session in seconds once the rate multiplier is applied
pub fn effective_duration(native_seconds: f64, rate: f64) -> f64 {
    if rate <= 0.0 {
        return native_seconds;
    }
    native_seconds / rate
}

/// `m:ss`, minutes unpadded and seconds zero-padded
pub fn format_clock(total_seconds: u64) -> String {
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_padded_seconds() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(9), "0:09");
        assert_eq!(format_clock(65), "1:05");
        assert_eq!(format_clock(240), "4:00");
        assert_eq!(format_clock(3725), "62:05");
    }

    #[test]
    fn slower_rates_stretch_the_duration() {
        assert_eq!(effective_duration(120.0, 0.5), 240.0);
        assert_eq!(effective_duration(100.0, 1.25), 80.0);
        assert!((effective_duration(100.0, 0.8) - 125.0).abs() < 1e-9);
    }
}
