use chrono::{DateTime, NaiveDateTime, Utc};

/// The scheduler compares stored delivery timestamps against this clock.
/// Stored values are naive timestamps holding UTC wall-clock time.
pub fn reference_now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

pub fn format_timestamp(dt: NaiveDateTime) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Parse a delivery timestamp supplied by a client. Accepts RFC 3339
/// (normalized to UTC) as well as plain `Y-m-d H:M:S` with or without
/// fractional seconds.
pub fn parse_timestamp(raw: &str) -> anyhow::Result<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc).naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(dt);
    }
    anyhow::bail!("Could not parse timestamp: {}", raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_plain_format() {
        let dt = parse_timestamp("2031-05-20 14:30:00").unwrap();
        assert_eq!(dt.year(), 2031);
        assert_eq!(dt.hour(), 14);
    }

    #[test]
    fn parses_fractional_seconds() {
        let dt = parse_timestamp("2031-05-20 14:30:00.123456").unwrap();
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn parses_rfc3339_and_normalizes_to_utc() {
        let dt = parse_timestamp("2031-05-20T14:30:00+02:00").unwrap();
        assert_eq!(dt.hour(), 12);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("next tuesday").is_err());
        assert!(parse_timestamp("").is_err());
    }
}
