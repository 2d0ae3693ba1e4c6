use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of the one backend submission made per session.
///
/// `total_count` is always 0: the backend contract for it is unconfirmed, so
/// crossing totals are not reported through it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub log_id: Option<String>,
    pub box_id: Option<String>,
    pub item_type: Option<String>,
    pub user_id: Option<String>,
    pub total_count: u64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub full_log_file: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn serializes_with_backend_field_names() {
        let summary = SessionSummary {
            log_id: Some("L1".to_string()),
            box_id: Some("B1".to_string()),
            item_type: None,
            user_id: Some("U1".to_string()),
            total_count: 0,
            start_time: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            end_time: Utc.with_ymd_and_hms(2024, 1, 2, 3, 14, 5).unwrap(),
            full_log_file: String::new(),
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["logId"], "L1");
        assert_eq!(json["boxId"], "B1");
        assert!(json["itemType"].is_null());
        assert_eq!(json["userId"], "U1");
        assert_eq!(json["totalCount"], 0);
        assert_eq!(json["startTime"], "2024-01-02T03:04:05Z");
        assert_eq!(json["endTime"], "2024-01-02T03:14:05Z");
        assert_eq!(json["fullLogFile"], "");
    }
}
