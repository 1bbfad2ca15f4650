//! Human-readable byte sizes ("2GB", "512MB").

use thiserror::Error;

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;
const GB: u64 = 1024 * MB;
const TB: u64 = 1024 * GB;

/// Error parsing a size string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid size '{input}' - expected format like '2GB', '512MB', or '1024KB'")]
pub struct SizeParseError {
    input: String,
}

/// Parse a size string into bytes.
///
/// Accepts a bare byte count or a number followed by `K`, `M`, `G`, or `T`
/// (with optional `B`), case-insensitive, with optional whitespace.
///
/// ```
/// use stagecache::config::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("4 GB").unwrap(), 4 * 1024 * 1024 * 1024);
/// assert_eq!(parse_size("512m").unwrap(), 512 * 1024 * 1024);
/// ```
pub fn parse_size(input: &str) -> Result<u64, SizeParseError> {
    let invalid = || SizeParseError {
        input: input.to_string(),
    };

    let trimmed = input.trim();
    let upper = trimmed.to_ascii_uppercase();
    let without_b = upper.strip_suffix('B').unwrap_or(&upper);

    let (digits, multiplier) = match without_b.chars().last() {
        Some('K') => (&without_b[..without_b.len() - 1], KB),
        Some('M') => (&without_b[..without_b.len() - 1], MB),
        Some('G') => (&without_b[..without_b.len() - 1], GB),
        Some('T') => (&without_b[..without_b.len() - 1], TB),
        Some(_) => (without_b, 1),
        None => return Err(invalid()),
    };

    let value: u64 = digits.trim().parse().map_err(|_| invalid())?;
    value.checked_mul(multiplier).ok_or_else(invalid)
}

/// Format a byte count using the largest unit that divides it exactly.
///
/// ```
/// use stagecache::config::format_size;
///
/// assert_eq!(format_size(2 * 1024 * 1024 * 1024), "2GB");
/// assert_eq!(format_size(1536), "1536");
/// ```
pub fn format_size(bytes: u64) -> String {
    for (unit, suffix) in [(TB, "TB"), (GB, "GB"), (MB, "MB"), (KB, "KB")] {
        if bytes >= unit && bytes % unit == 0 {
            return format!("{}{}", bytes / unit, suffix);
        }
    }
    bytes.to_string()
}
