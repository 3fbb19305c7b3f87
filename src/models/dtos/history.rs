use crate::models::HistoryEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQueryDto {
    #[serde(default)]
    pub user_ids: Vec<String>,
    #[serde(default)]
    pub device_ids: Vec<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExpandQueryDto {
    pub expand: Option<String>,
}

impl ExpandQueryDto {
    pub fn names(&self) -> bool {
        self.expand
            .as_deref()
            .is_some_and(|it| it.split(',').any(|part| part.trim() == "names"))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRowDto {
    #[serde(flatten)]
    pub entry: HistoryEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponseDto {
    pub seq: u64,
    pub entries: Vec<HistoryRowDto>,
}
