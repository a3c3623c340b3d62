//! Human-readable sizes (`"10MB"`, `"1.5 GB"`), 1024-based.

use crate::error::SizeParseError;

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Parses a size such as `"10MB"`, `"1.5 gb"`, `"512K"` or `"2048"` into bytes.
pub fn parse_size(input: &str) -> Result<u64, SizeParseError> {
    let err = |reason| SizeParseError {
        input: input.to_string(),
        reason,
    };

    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(err("empty"));
    }

    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);
    let value: f64 = number.parse().map_err(|_| err("not a number"))?;

    let exponent = match unit.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 0,
        "K" | "KB" => 1,
        "M" | "MB" => 2,
        "G" | "GB" => 3,
        "T" | "TB" => 4,
        _ => return Err(err("unknown unit")),
    };

    Ok((value * 1024f64.powi(exponent)).round() as u64)
}

/// Formats bytes for display: `"512 B"`, `"1.5 KB"`, `"20 MB"`.
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        return format!("{bytes} B");
    }
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{} {}", rounded as u64, UNITS[unit])
    } else {
        format!("{rounded:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_units() {
        assert_eq!(parse_size("2048").unwrap(), 2048);
        assert_eq!(parse_size("10B").unwrap(), 10);
        assert_eq!(parse_size("1KB").unwrap(), 1024);
        assert_eq!(parse_size("10MB").unwrap(), 10 * 1024 * 1024);
        assert_eq!(parse_size(" 1.5 gb ").unwrap(), 1536 * 1024 * 1024);
        assert_eq!(parse_size("512k").unwrap(), 512 * 1024);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_size("").unwrap_err().reason, "empty");
        assert_eq!(parse_size("MB").unwrap_err().reason, "not a number");
        assert_eq!(parse_size("10 parsecs").unwrap_err().reason, "unknown unit");
    }

    #[test]
    fn formats_sizes() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1024), "1 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(20 * 1024 * 1024), "20 MB");
    }
}
