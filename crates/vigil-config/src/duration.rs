use std::time::Duration;

/// Parse a spec-suffixed duration string: "30s", "5m", "24h", "30d".
///
/// `serde_yaml` has no native duration type, and pulling in `humantime` for
/// four suffix characters isn't worth the dependency, so we parse it
/// directly.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration".to_string());
    }
    let (digits, suffix) = s.split_at(s.len() - 1);
    let multiplier = match suffix {
        "s" => 1u64,
        "m" => 60,
        "h" => 3600,
        "d" => 86400,
        _ => return Err(format!("unknown duration suffix in '{}'", s)),
    };
    let count: u64 = digits
        .parse()
        .map_err(|_| format!("invalid duration '{}'", s))?;
    Ok(Duration::from_secs(count * multiplier))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_suffix() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("24h").unwrap(), Duration::from_secs(86400));
        assert_eq!(parse_duration("30d").unwrap(), Duration::from_secs(30 * 86400));
    }

    #[test]
    fn rejects_missing_suffix() {
        assert!(parse_duration("30").is_err());
    }

    #[test]
    fn rejects_unknown_suffix() {
        assert!(parse_duration("30x").is_err());
    }
}
