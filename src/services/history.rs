//! Entry/exit history assembled from two independently owned halves.
//!
//! User-side records carry who, device-side telemetry carries where and how; the
//! `histId` both sides report is the only thing tying them together.

use crate::common::{ApiError, ApiResult};
use crate::config::JoinMode;
use crate::gateways::{GatewayResult, TelemetrySource, UserHistorySource};
use crate::models::{DeviceEvent, HistoryEntry, TimeWindow, UserEvent};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;

pub struct HistoryService {
    users: Arc<dyn UserHistorySource>,
    telemetry: Arc<dyn TelemetrySource>,
    join_mode: JoinMode,
    sort_by_timestamp: bool,
}

/// Flattens per-id results, a failed fetch counts as an empty one.
fn collect_isolated<T>(side: &str, ids: &[String], results: Vec<GatewayResult<Vec<T>>>) -> Vec<T> {
    ids.iter()
        .zip(results)
        .flat_map(|(id, result)| match result {
            Ok(items) => items,
            Err(err) => {
                tracing::warn!(id = %id, "Failed to fetch {} history: {}", side, err);
                Vec::new()
            }
        })
        .collect()
}

/// Joins user-side records to the first device-side record sharing their `histId`.
///
/// Output follows the order of `user_events`.
pub fn join(user_events: Vec<UserEvent>, device_events: &[DeviceEvent], mode: JoinMode) -> Vec<HistoryEntry> {
    let mut by_hist_id: HashMap<&str, &DeviceEvent> = HashMap::new();
    for event in device_events {
        by_hist_id.entry(event.hist_id.as_str()).or_insert(event);
    }
    user_events
        .into_iter()
        .filter_map(|user_event| match by_hist_id.get(user_event.hist_id.as_str()) {
            Some(device_event) => Some(HistoryEntry {
                id: user_event.hist_id,
                user_id: user_event.user_id,
                device_id: Some(device_event.device_id.clone()),
                timestamp: Some(device_event.timestamp),
                kind: Some(device_event.kind),
                status: Some(device_event.status),
            }),
            None if mode == JoinMode::Left => Some(HistoryEntry {
                id: user_event.hist_id,
                user_id: user_event.user_id,
                device_id: None,
                timestamp: user_event.timestamp,
                kind: None,
                status: None,
            }),
            None => None,
        })
        .collect()
}

impl HistoryService {
    pub fn new(
        users: Arc<dyn UserHistorySource>,
        telemetry: Arc<dyn TelemetrySource>,
        join_mode: JoinMode,
        sort_by_timestamp: bool,
    ) -> Self {
        Self {
            users,
            telemetry,
            join_mode,
            sort_by_timestamp,
        }
    }

    pub async fn reconcile(
        &self,
        user_ids: &[String],
        device_ids: &[String],
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> ApiResult<Vec<HistoryEntry>> {
        let (Some(start), Some(end)) = (start, end) else {
            return Err(ApiError::MissingTimeRange);
        };
        let window = TimeWindow { start, end };

        let user_side = join_all(user_ids.iter().map(|id| self.users.user_events(id, &window)));
        let device_side =
            join_all(device_ids.iter().map(|id| self.telemetry.device_events(id, &window)));
        let (user_results, device_results) = futures::join!(user_side, device_side);

        let user_events = collect_isolated("user", user_ids, user_results);
        let device_events = collect_isolated("device", device_ids, device_results);
        tracing::debug!(
            "Joining {} user-side records with {} device-side records",
            user_events.len(),
            device_events.len()
        );

        let mut entries = join(user_events, &device_events, self.join_mode);
        if self.sort_by_timestamp {
            // entries without a timestamp sort first
            entries.sort_by_key(|entry| entry.timestamp);
        }
        Ok(entries)
    }
}
