//! Human-readable size formatting used by progress output, grounded in
//! genozip's `strings.c::str_size`.

/// Formats a byte count as e.g. `"1.3 MB"`, `"512 B"`, `"4.0 GB"`.
pub fn human_size(bytes: u64) -> String {
    const UNITS: &[(&str, u64)] = &[("GB", 1 << 30), ("MB", 1 << 20), ("KB", 1 << 10)];
    for (name, scale) in UNITS {
        if bytes >= *scale {
            return format!("{:.1} {}", bytes as f64 / *scale as f64, name);
        }
    }
    format!("{} B", bytes)
}

/// Formats a compression ratio as a percentage string, guarding against
/// division by zero on empty input.
pub fn ratio_pct(compressed: u64, original: u64) -> f64 {
    if original == 0 {
        0.0
    } else {
        compressed as f64 / original as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_size_units() {
        assert_eq!(human_size(500), "500 B");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(5 * (1 << 20)), "5.0 MB");
    }

    #[test]
    fn ratio_pct_zero_original() {
        assert_eq!(ratio_pct(10, 0), 0.0);
    }

    #[test]
    fn ratio_pct_half() {
        assert!((ratio_pct(50, 100) - 50.0).abs() < 1e-9);
    }
}
