use crate::models::TimeWindow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub id: String,
    pub user_ids: Vec<String>,
    pub device_ids: Vec<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Grant request as submitted by the dashboard, times may still be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionDraft {
    #[serde(default)]
    pub user_ids: Vec<String>,
    #[serde(default)]
    pub device_ids: Vec<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

impl PermissionDraft {
    /// Checks the selection and returns the granted window.
    pub fn validate(&self) -> Result<TimeWindow, String> {
        if self.user_ids.is_empty() || self.device_ids.is_empty() {
            return Err("Select at least one user and one device".to_string());
        }
        let (Some(start), Some(end)) = (self.start_time, self.end_time) else {
            return Err("Both start time and end time are required".to_string());
        };
        if start >= end {
            return Err("End time must be after start time".to_string());
        }
        Ok(TimeWindow { start, end })
    }
}
