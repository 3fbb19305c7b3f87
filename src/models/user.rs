use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: String,
    pub user_id: String,
    pub device_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub name: String,
    pub id_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finger_print: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Vec<Schedule>>,
}

/// Body of a user creation, the id is assigned remotely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDraft {
    pub username: String,
    pub name: String,
    pub id_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finger_print: Option<String>,
}

impl UserDraft {
    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("username", &self.username),
            ("name", &self.name),
            ("idNumber", &self.id_number),
        ] {
            if value.trim().is_empty() {
                return Err(format!("Field '{field}' is required"));
            }
        }
        Ok(())
    }
}

/// Partial update, absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finger_print: Option<String>,
}

impl UserPatch {
    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("username", &self.username),
            ("name", &self.name),
            ("idNumber", &self.id_number),
        ] {
            if value.as_ref().is_some_and(|it| it.trim().is_empty()) {
                return Err(format!("Field '{field}' must not be blank"));
            }
        }
        Ok(())
    }

    pub fn apply(self, user: &mut User) {
        if let Some(username) = self.username {
            user.username = username;
        }
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(id_number) = self.id_number {
            user.id_number = id_number;
        }
        if self.face_image.is_some() {
            user.face_image = self.face_image;
        }
        if self.finger_print.is_some() {
            user.finger_print = self.finger_print;
        }
    }
}
