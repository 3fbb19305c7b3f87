use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

pub fn to_epoch_millis(dt: &DateTime<Utc>) -> i64 {
    dt.timestamp_millis()
}

pub fn from_epoch_millis(t: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(t).single()
}

pub fn deserialize_epoch_millis<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let t: i64 = Deserialize::deserialize(deserializer)?;
    from_epoch_millis(t)
        .ok_or_else(|| serde::de::Error::custom(format!("Incorrect timestamp: {}", t)))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlexibleDateTime {
    Millis(i64),
    Text(DateTime<Utc>),
}

/// Accepts either epoch milliseconds or an RFC 3339 string.
pub fn deserialize_flexible_datetime<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    match FlexibleDateTime::deserialize(deserializer)? {
        FlexibleDateTime::Millis(t) => from_epoch_millis(t)
            .ok_or_else(|| serde::de::Error::custom(format!("Incorrect timestamp: {}", t))),
        FlexibleDateTime::Text(dt) => Ok(dt),
    }
}

pub fn deserialize_option_flexible_datetime<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "deserialize_flexible_datetime")] DateTime<Utc>);
    let value: Option<Wrapper> = Deserialize::deserialize(deserializer)?;
    Ok(value.map(|Wrapper(dt)| dt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_millis() {
        let dt = from_epoch_millis(1685611360000).unwrap();
        assert_eq!(dt.to_rfc3339(), "2023-06-01T09:22:40+00:00");
        assert_eq!(to_epoch_millis(&dt), 1685611360000);
        assert!(from_epoch_millis(i64::MAX).is_none());
    }

    #[test]
    fn test_flexible_datetime() {
        #[derive(Deserialize)]
        struct Row {
            #[serde(deserialize_with = "deserialize_flexible_datetime")]
            at: DateTime<Utc>,
            #[serde(default, deserialize_with = "deserialize_option_flexible_datetime")]
            until: Option<DateTime<Utc>>,
        }
        let row: Row = serde_json::from_str(r#"{"at": 1685611360000}"#).unwrap();
        assert_eq!(row.at.to_rfc3339(), "2023-06-01T09:22:40+00:00");
        assert!(row.until.is_none());
        let row: Row =
            serde_json::from_str(r#"{"at": "2023-06-01T09:22:40Z", "until": 1685611360000}"#)
                .unwrap();
        assert_eq!(row.until, Some(row.at));
    }
}
