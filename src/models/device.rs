use serde::{Deserialize, Serialize};

pub const UNKNOWN_LOCATION: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    pub name: String,
    pub r#type: String,
    pub location: String,
    pub status: String,
    pub cam_status: String,
    pub rfid_status: String,
    pub finger_print_status: String,
}

impl Device {
    pub fn apply_states(&mut self, states: SensorStates) {
        self.status = states.door;
        self.cam_status = states.cam;
        self.rfid_status = states.rfid;
        self.finger_print_status = states.finger_print;
    }
}

/// Display states of one device, derived from its latest `status` telemetry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorStates {
    pub door: String,
    pub cam: String,
    pub rfid: String,
    pub finger_print: String,
}

impl SensorStates {
    pub fn uniform(value: &str) -> Self {
        Self {
            door: value.to_string(),
            cam: value.to_string(),
            rfid: value.to_string(),
            finger_print: value.to_string(),
        }
    }
}

/// Body of a device create or update.
///
/// The sensor fields are optional, when any of them is present the chosen
/// states are published to the device as telemetry after the registry write.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDraft {
    pub name: String,
    pub r#type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cam_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rfid_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finger_print_status: Option<String>,
}

impl DeviceDraft {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Field 'name' is required".to_string());
        }
        if self.r#type.trim().is_empty() {
            return Err("Field 'type' is required".to_string());
        }
        Ok(())
    }

    pub fn has_sensor_states(&self) -> bool {
        self.status.is_some()
            || self.cam_status.is_some()
            || self.rfid_status.is_some()
            || self.finger_print_status.is_some()
    }

    pub fn location_or_default(&self) -> String {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|it| !it.is_empty())
            .unwrap_or(UNKNOWN_LOCATION)
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub id: String,
    pub name: String,
}
