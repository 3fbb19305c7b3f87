//! Wire shapes of the custom backend.
//!
//! The backend has served several shapes for the same entities over time
//! (`_id` vs `id`, bare vs `{data}` bodies, ms vs RFC 3339 times); they are all
//! absorbed here so the rest of the crate only sees local entities.

use crate::models::{Permission, Schedule, User, UserEvent};
use crate::utils::{deserialize_flexible_datetime, deserialize_option_flexible_datetime};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    pub(crate) fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(data) => data,
        }
    }
}

/// An entity stored by the backend under its own collection.
pub(crate) trait BackendResource: Sized {
    const COLLECTION: &'static str;
    const NAME: &'static str;
    type Wire: DeserializeOwned;

    fn from_wire(wire: Self::Wire) -> Self;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserWire {
    #[serde(alias = "_id")]
    id: String,
    username: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(alias = "id_number")]
    id_number: String,
    #[serde(default, alias = "face_image")]
    face_image: Option<String>,
    #[serde(default, alias = "fingerprint", alias = "finger_print")]
    finger_print: Option<String>,
    #[serde(default)]
    schedule: Option<Vec<Schedule>>,
}

impl BackendResource for User {
    const COLLECTION: &'static str = "/users";
    const NAME: &'static str = "user";
    type Wire = UserWire;

    fn from_wire(wire: UserWire) -> Self {
        User {
            name: wire
                .name
                .filter(|it| !it.trim().is_empty())
                .unwrap_or_else(|| wire.username.clone()),
            id: wire.id,
            username: wire.username,
            id_number: wire.id_number,
            face_image: wire.face_image.filter(|it| !it.is_empty()),
            finger_print: wire.finger_print.filter(|it| !it.is_empty()),
            schedule: wire.schedule,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PermissionWire {
    #[serde(alias = "_id")]
    id: String,
    #[serde(alias = "users", alias = "user_ids")]
    user_ids: Vec<String>,
    #[serde(alias = "devices", alias = "device_ids")]
    device_ids: Vec<String>,
    #[serde(alias = "start_time", deserialize_with = "deserialize_flexible_datetime")]
    start_time: DateTime<Utc>,
    #[serde(alias = "end_time", deserialize_with = "deserialize_flexible_datetime")]
    end_time: DateTime<Utc>,
    #[serde(alias = "created_at", deserialize_with = "deserialize_flexible_datetime")]
    created_at: DateTime<Utc>,
}

impl BackendResource for Permission {
    const COLLECTION: &'static str = "/permissions";
    const NAME: &'static str = "permission";
    type Wire = PermissionWire;

    fn from_wire(wire: PermissionWire) -> Self {
        Permission {
            id: wire.id,
            user_ids: wire.user_ids,
            device_ids: wire.device_ids,
            start_time: wire.start_time,
            end_time: wire.end_time,
            created_at: wire.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HistoryWire {
    #[serde(alias = "hist_id")]
    hist_id: String,
    #[serde(alias = "user_id")]
    user_id: String,
    #[serde(default, deserialize_with = "deserialize_option_flexible_datetime")]
    timestamp: Option<DateTime<Utc>>,
}

impl From<HistoryWire> for UserEvent {
    fn from(wire: HistoryWire) -> Self {
        UserEvent {
            hist_id: wire.hist_id,
            user_id: wire.user_id,
            timestamp: wire.timestamp,
        }
    }
}
