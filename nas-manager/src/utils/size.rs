//! Human-readable byte sizes (`100G`, `1.5T`, `512M`).

use crate::{NasError, Result};

/// Parse a size with an optional binary suffix (K, M, G, T, P; a trailing
/// `B`/`iB` is accepted). A bare number is bytes.
pub fn parse_size(raw: &str) -> Result<u64> {
    let trimmed = raw.trim();
    let upper = trimmed.to_ascii_uppercase();
    let unit_less = upper
        .strip_suffix("IB")
        .or_else(|| upper.strip_suffix('B'))
        .unwrap_or(&upper);

    let (number, shift) = match unit_less.chars().last() {
        Some('K') => (&unit_less[..unit_less.len() - 1], 10),
        Some('M') => (&unit_less[..unit_less.len() - 1], 20),
        Some('G') => (&unit_less[..unit_less.len() - 1], 30),
        Some('T') => (&unit_less[..unit_less.len() - 1], 40),
        Some('P') => (&unit_less[..unit_less.len() - 1], 50),
        _ => (unit_less, 0),
    };

    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| NasError::InvalidInput(format!("invalid size '{}'", trimmed)))?;
    if !value.is_finite() || value < 0.0 {
        return Err(NasError::InvalidInput(format!("invalid size '{}'", trimmed)));
    }

    Ok((value * (1u64 << shift) as f64).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size_suffixes() {
        assert_eq!(parse_size("512").unwrap(), 512);
        assert_eq!(parse_size("4K").unwrap(), 4096);
        assert_eq!(parse_size("100G").unwrap(), 100 * 1024 * 1024 * 1024);
        assert_eq!(parse_size("1.5t").unwrap(), 3 * (1u64 << 39));
        assert_eq!(parse_size("2GiB").unwrap(), 2 * (1u64 << 30));
        assert_eq!(parse_size(" 10MB ").unwrap(), 10 * (1u64 << 20));
    }

    #[test]
    fn test_parse_size_rejects_garbage() {
        assert!(matches!(parse_size("lots"), Err(NasError::InvalidInput(_))));
        assert!(parse_size("-1G").is_err());
        assert!(parse_size("").is_err());
    }
}
