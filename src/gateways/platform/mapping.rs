//! Translation between the platform's wire records and local entities.

use crate::models::{
    Device, DeviceDraft, DeviceEvent, DeviceProfile, EntryKind, EntryStatus, Profile,
    SensorStates, UserEvent,
};
use crate::utils::from_epoch_millis;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};

pub(crate) const STATUS_KEY: &str = "status";
pub(crate) const HIST_ID_KEY: &str = "histId";
pub(crate) const TYPE_KEY: &str = "type";

#[derive(Debug, Deserialize)]
pub(crate) struct EntityId {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PageData<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_next: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeviceRecord {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub r#type: Option<String>,
    #[serde(default)]
    pub device_profile_name: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeviceProfileInfo {
    pub id: EntityId,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlatformUser {
    pub id: EntityId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub authority: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeviceCredentials {
    pub credentials_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TimeseriesPoint {
    pub ts: i64,
    pub value: Value,
}

pub(crate) type Timeseries = HashMap<String, Vec<TimeseriesPoint>>;

pub(crate) fn device_from_record(record: DeviceRecord, fallback: &str) -> Device {
    let mut device = Device {
        id: record.id.id,
        name: record.name,
        r#type: record
            .device_profile_name
            .or(record.r#type)
            .unwrap_or_default(),
        location: record
            .label
            .filter(|it| !it.trim().is_empty())
            .unwrap_or_else(|| crate::models::device::UNKNOWN_LOCATION.to_string()),
        status: String::new(),
        cam_status: String::new(),
        rfid_status: String::new(),
        finger_print_status: String::new(),
    };
    device.apply_states(SensorStates::uniform(fallback));
    device
}

pub(crate) fn device_to_wire(id: Option<&str>, draft: &DeviceDraft) -> Value {
    let mut body = json!({
        "name": draft.name.trim(),
        "type": draft.r#type.trim(),
        "label": draft.location_or_default(),
    });
    if let Some(id) = id {
        body["id"] = json!({ "entityType": "DEVICE", "id": id });
    }
    body
}

pub(crate) fn profile_from_wire(info: DeviceProfileInfo) -> DeviceProfile {
    DeviceProfile {
        id: info.id.id,
        name: info.name,
    }
}

pub(crate) fn profile_from_user(user: PlatformUser) -> Profile {
    let full_name = [user.first_name.as_deref(), user.last_name.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|it| !it.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let username = user.email.clone().unwrap_or_else(|| user.id.id.clone());
    Profile {
        id: user.id.id,
        name: if full_name.is_empty() {
            username.clone()
        } else {
            full_name
        },
        username,
        email: user.email,
        authority: user.authority,
    }
}

/// Sensor states chosen by the operator, in the shape the device reports them.
pub(crate) fn sensor_states_to_wire(draft: &DeviceDraft) -> Value {
    let mut states = Map::new();
    for (key, value) in [
        ("door_status", &draft.status),
        ("cam_status", &draft.cam_status),
        ("rfid_status", &draft.rfid_status),
        ("finger_printer_status", &draft.finger_print_status),
    ] {
        if let Some(value) = value {
            states.insert(key.to_string(), Value::String(value.trim().to_lowercase()));
        }
    }
    json!({ STATUS_KEY: Value::Object(states) })
}

pub(crate) fn latest_value(series: &mut Timeseries, key: &str) -> Option<Value> {
    series
        .remove(key)?
        .into_iter()
        .max_by_key(|point| point.ts)
        .map(|point| point.value)
}

fn point_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Rebuilds device-side events from `histId`/`type`/`status` series reported at the same ts.
pub(crate) fn device_events_from_series(device_id: &str, series: Timeseries) -> Vec<DeviceEvent> {
    #[derive(Default)]
    struct Slot {
        hist_id: Option<String>,
        kind: Option<String>,
        status: Option<String>,
    }
    let mut slots: BTreeMap<i64, Slot> = BTreeMap::new();
    for (key, points) in series {
        for point in points {
            let slot = slots.entry(point.ts).or_default();
            let text = point_text(&point.value);
            match key.as_str() {
                HIST_ID_KEY => slot.hist_id = Some(text),
                TYPE_KEY => slot.kind = Some(text),
                STATUS_KEY => slot.status = Some(text),
                _ => {}
            }
        }
    }
    slots
        .into_iter()
        .filter_map(|(ts, slot)| {
            let hist_id = slot.hist_id?;
            let kind = slot.kind?.parse::<EntryKind>().ok()?;
            let status = slot.status?.parse::<EntryStatus>().ok()?;
            let timestamp = from_epoch_millis(ts)?;
            Some(DeviceEvent {
                hist_id,
                device_id: device_id.to_string(),
                timestamp,
                kind,
                status,
            })
        })
        .collect()
}

pub(crate) fn user_events_from_series(user_id: &str, mut series: Timeseries) -> Vec<UserEvent> {
    let mut points = series.remove(HIST_ID_KEY).unwrap_or_default();
    points.sort_by_key(|point| point.ts);
    points
        .into_iter()
        .map(|point| UserEvent {
            hist_id: point_text(&point.value),
            user_id: user_id.to_string(),
            timestamp: from_epoch_millis(point.ts),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(value: Value) -> Timeseries {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn device_record_defaults() {
        let record: DeviceRecord = serde_json::from_value(json!({
            "id": { "entityType": "DEVICE", "id": "d1" },
            "name": "Main Entrance",
            "type": "Fingerprint Scanner",
            "label": null
        }))
        .unwrap();
        let device = device_from_record(record, "Unknown");
        assert_eq!(device.id, "d1");
        assert_eq!(device.r#type, "Fingerprint Scanner");
        assert_eq!(device.location, "Unknown");
        assert_eq!(device.cam_status, "Unknown");
    }

    #[test]
    fn update_body_carries_id() {
        let draft = DeviceDraft {
            name: "Back Door".into(),
            r#type: "RFID Reader".into(),
            location: Some("Parking".into()),
            ..Default::default()
        };
        let body = device_to_wire(Some("d9"), &draft);
        assert_eq!(body["id"]["id"], "d9");
        assert_eq!(body["label"], "Parking");
        assert!(device_to_wire(None, &draft).get("id").is_none());
    }

    #[test]
    fn groups_device_events_by_ts() {
        let events = device_events_from_series(
            "d1",
            series(json!({
                "histId": [{ "ts": 1000, "value": "h1" }, { "ts": 2000, "value": "h2" }],
                "type": [{ "ts": 1000, "value": "entry" }, { "ts": 2000, "value": "exit" }],
                "status": [
                    { "ts": 1000, "value": "success" },
                    { "ts": 2000, "value": "failed" },
                    { "ts": 3000, "value": "{\"door_status\":\"open\"}" }
                ]
            })),
        );
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].hist_id, "h1");
        assert_eq!(events[0].kind, EntryKind::Entry);
        assert_eq!(events[1].status, EntryStatus::Failed);
        assert_eq!(events[1].device_id, "d1");
    }

    #[test]
    fn reads_user_history_ids() {
        let events = user_events_from_series(
            "u1",
            series(json!({ "histId": [{ "ts": 2000, "value": "h2" }, { "ts": 1000, "value": "h1" }] })),
        );
        assert_eq!(
            events.iter().map(|it| it.hist_id.as_str()).collect::<Vec<_>>(),
            vec!["h1", "h2"]
        );
        assert!(events.iter().all(|it| it.user_id == "u1"));
    }

    #[test]
    fn profile_name_falls_back_to_email() {
        let profile = profile_from_user(PlatformUser {
            id: EntityId { id: "p1".into() },
            email: Some("tenant@thingsboard.org".into()),
            first_name: None,
            last_name: Some(" ".into()),
            authority: Some("TENANT_ADMIN".into()),
        });
        assert_eq!(profile.name, "tenant@thingsboard.org");
        assert_eq!(profile.username, "tenant@thingsboard.org");
    }

    #[test]
    fn sensor_states_are_lowercased() {
        let draft = DeviceDraft {
            status: Some("Closed".into()),
            rfid_status: Some("Inactive".into()),
            ..Default::default()
        };
        let wire = sensor_states_to_wire(&draft);
        assert_eq!(wire["status"]["door_status"], "closed");
        assert_eq!(wire["status"]["rfid_status"], "inactive");
        assert!(wire["status"].get("cam_status").is_none());
    }
}
