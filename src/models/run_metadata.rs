use serde::Serialize;
use time::macros::format_description;
use time::OffsetDateTime;

/// Placeholder identity used when the invoking login cannot be resolved.
pub const UNKNOWN_IDENTITY: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunMetadata {
    /// UTC, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    pub identity: String,
    pub organization: String,
    pub search_string: String,
    pub worker_count: usize,
}

/// A metadata value as it is written to the report.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Text(String),
    Number(f64),
}

impl RunMetadata {
    pub fn new(
        started_at: OffsetDateTime,
        identity: impl Into<String>,
        organization: impl Into<String>,
        search_string: impl Into<String>,
        worker_count: usize,
    ) -> Self {
        Self {
            timestamp: format_utc(started_at),
            identity: identity.into(),
            organization: organization.into(),
            search_string: search_string.into(),
            worker_count,
        }
    }

    /// Key/value pairs in report order.
    pub fn entries(&self) -> Vec<(&'static str, MetadataValue)> {
        vec![
            (
                "Current Date and Time (UTC - YYYY-MM-DD HH:MM:SS formatted)",
                MetadataValue::Text(self.timestamp.clone()),
            ),
            (
                "Current User's Login",
                MetadataValue::Text(self.identity.clone()),
            ),
            (
                "Organization",
                MetadataValue::Text(self.organization.clone()),
            ),
            (
                "Search String",
                MetadataValue::Text(self.search_string.clone()),
            ),
            (
                "Worker Count",
                MetadataValue::Number(self.worker_count as f64),
            ),
        ]
    }
}

pub fn format_utc(at: OffsetDateTime) -> String {
    let at = at.to_offset(time::UtcOffset::UTC);
    at.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    ))
    .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn timestamp_is_formatted_in_utc() {
        let local = datetime!(2024-03-05 10:04:09 +02:00);
        assert_eq!(format_utc(local), "2024-03-05 08:04:09");
    }

    #[test]
    fn entries_follow_report_order() {
        let metadata = RunMetadata::new(
            datetime!(2024-03-05 08:04:09 UTC),
            "octocat",
            "acme",
            "TODO_SECRET",
            7,
        );
        let keys: Vec<_> = metadata.entries().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys.len(), 5);
        assert_eq!(keys[1], "Current User's Login");
        assert_eq!(keys[4], "Worker Count");
        assert_eq!(metadata.entries()[4].1, MetadataValue::Number(7.0));
    }
}
