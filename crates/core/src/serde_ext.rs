//! Field-level serde helpers shared by the JSON and XML codecs

use serde::{Deserialize, Deserializer};

/// Empty strings decode to `None` rather than `Some("")`.
pub fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// Fixed textual date encoding: `2024-03-01T08:30:00.000`.
///
/// Parsing is lenient about the fractional part, accepts a bare date, a space
/// separator, and RFC 3339 timestamps with an offset (normalised to UTC).
pub mod date_format {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

    const PARSE_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];

    pub fn format(date: &NaiveDateTime) -> String {
        date.format(FORMAT).to_string()
    }

    pub fn parse(input: &str) -> Option<NaiveDateTime> {
        let input = input.trim();

        for fmt in PARSE_FORMATS {
            if let Ok(date) = NaiveDateTime::parse_from_str(input, fmt) {
                return Some(date);
            }
        }

        if let Ok(date) = DateTime::parse_from_rfc3339(input) {
            return Some(date.naive_utc());
        }

        NaiveDate::parse_from_str(input, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    }

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_str(&format(date)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => parse(&s)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("unparseable date: {}", s))),
        }
    }
}
