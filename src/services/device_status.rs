use crate::gateways::TelemetrySource;
use crate::models::{Device, SensorStates};
use futures::future::join_all;
use serde_json::Value;

const DOOR_KEY: &str = "door_status";
const CAM_KEY: &str = "cam_status";
const RFID_KEY: &str = "rfid_status";
const FINGER_PRINT_KEY: &str = "finger_printer_status";

fn door_state(raw: &str) -> &'static str {
    if raw.eq_ignore_ascii_case("closed") {
        "Closed"
    } else {
        "Open"
    }
}

fn sensor_state(raw: &str) -> &'static str {
    if raw.eq_ignore_ascii_case("inactive") {
        "Inactive"
    } else {
        "Active"
    }
}

/// The payload is reported either as an object or as a JSON document inside a string.
fn payload_object(payload: &Value) -> Option<serde_json::Map<String, Value>> {
    match payload {
        Value::Object(map) => Some(map.clone()),
        Value::String(text) => match serde_json::from_str(text) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        },
        _ => None,
    }
}

/// Maps a raw `status` telemetry value onto display states.
pub fn normalize(payload: Option<&Value>, fallback: &str) -> SensorStates {
    let Some(fields) = payload.and_then(payload_object) else {
        return SensorStates::uniform(fallback);
    };
    let field = |key: &str, state: fn(&str) -> &'static str| {
        fields
            .get(key)
            .and_then(Value::as_str)
            .map(|raw| state(raw.trim()).to_string())
            .unwrap_or_else(|| fallback.to_string())
    };
    SensorStates {
        door: field(DOOR_KEY, door_state),
        cam: field(CAM_KEY, sensor_state),
        rfid: field(RFID_KEY, sensor_state),
        finger_print: field(FINGER_PRINT_KEY, sensor_state),
    }
}

/// Fetches the latest status of every device concurrently and fills in its states.
///
/// A failed fetch only degrades that device to the fallback states.
pub async fn resolve_statuses(
    telemetry: &dyn TelemetrySource,
    devices: Vec<Device>,
    fallback: &str,
) -> Vec<Device> {
    let lookups = devices.iter().map(|device| telemetry.latest_status(&device.id));
    let payloads = join_all(lookups).await;
    devices
        .into_iter()
        .zip(payloads)
        .map(|(mut device, payload)| {
            let states = match payload {
                Ok(payload) => normalize(payload.as_ref(), fallback),
                Err(err) => {
                    tracing::warn!(device_id = %device.id, "Failed to fetch device status: {}", err);
                    SensorStates::uniform(fallback)
                }
            };
            device.apply_states(states);
            device
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateways::{GatewayError, GatewayResult};
    use crate::models::{DeviceEvent, TimeWindow};
    use async_trait::async_trait;
    use serde_json::json;

    #[test]
    fn normalizes_each_field() {
        let payload = json!({
            "door_status": "CLOSED",
            "cam_status": "inactive",
            "rfid_status": "active",
            "finger_printer_status": "whatever"
        });
        let states = normalize(Some(&payload), "Unknown");
        assert_eq!(states.door, "Closed");
        assert_eq!(states.cam, "Inactive");
        assert_eq!(states.rfid, "Active");
        assert_eq!(states.finger_print, "Active");
    }

    #[test]
    fn parses_string_payload_and_falls_back_per_field() {
        let payload = json!(r#"{"door_status":"open"}"#);
        let states = normalize(Some(&payload), "Unknown");
        assert_eq!(states.door, "Open");
        assert_eq!(states.cam, "Unknown");
        assert_eq!(states.finger_print, "Unknown");
    }

    #[test]
    fn unparsable_or_missing_payload_falls_back() {
        assert_eq!(
            normalize(Some(&json!("{not json")), "N/A"),
            SensorStates::uniform("N/A")
        );
        assert_eq!(normalize(None, "Unknown"), SensorStates::uniform("Unknown"));
    }

    struct FlakyTelemetry;

    #[async_trait]
    impl TelemetrySource for FlakyTelemetry {
        async fn latest_status(&self, device_id: &str) -> GatewayResult<Option<Value>> {
            match device_id {
                "x" => Err(GatewayError::transport("device status", "connection reset")),
                _ => Ok(Some(json!({ "door_status": "closed", "cam_status": "active" }))),
            }
        }

        async fn device_events(&self, _: &str, _: &TimeWindow) -> GatewayResult<Vec<DeviceEvent>> {
            Ok(vec![])
        }
    }

    fn device(id: &str) -> Device {
        Device {
            id: id.into(),
            name: format!("Door {id}"),
            r#type: "RFID Reader".into(),
            location: "Lobby".into(),
            status: String::new(),
            cam_status: String::new(),
            rfid_status: String::new(),
            finger_print_status: String::new(),
        }
    }

    #[tokio::test]
    async fn one_failed_fetch_keeps_the_listing() {
        let devices = vec![device("x"), device("y"), device("z")];
        let resolved = resolve_statuses(&FlakyTelemetry, devices, "Unknown").await;
        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved[0].id, "x");
        assert_eq!(resolved[0].status, "Unknown");
        assert_eq!(resolved[0].cam_status, "Unknown");
        for device in &resolved[1..] {
            assert_eq!(device.status, "Closed");
            assert_eq!(device.cam_status, "Active");
            assert_eq!(device.rfid_status, "Unknown");
        }
    }
}
