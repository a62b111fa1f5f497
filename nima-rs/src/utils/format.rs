//! Formatting utilities

use humansize::{DECIMAL, format_size};

/// Format file size in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, DECIMAL)
}

/// Format a duration in seconds
pub fn format_seconds(seconds: f32) -> String {
    format!("{seconds:.3}s")
}

/// Format a 2D point
pub fn format_point(x: f32, y: f32) -> String {
    format!("({x:.3}, {y:.3})")
}

/// Format an angle given in radians as degrees
pub fn format_degrees(radians: f32) -> String {
    format!("{:.1}°", radians.to_degrees())
}

/// Format a yes/no flag
pub fn format_flag(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1024), "1.02 kB");
        assert_eq!(format_bytes(1048576), "1.05 MB");
    }

    #[test]
    fn test_format_numbers() {
        assert_eq!(format_seconds(1.25), "1.250s");
        assert_eq!(format_point(1.0, -2.5), "(1.000, -2.500)");
        assert_eq!(format_degrees(std::f32::consts::PI), "180.0°");
        assert_eq!(format_flag(true), "yes");
    }
}
