//! In-process stand-in for both external systems.
//!
//! Backs the demo mode and the tests; every trait is served from one shared
//! state so that a user created here shows up in history lookups as well.

use crate::gateways::{
    Authenticator, DeviceRepository, GatewayError, GatewayResult, PermissionRepository,
    TelemetrySource, UserHistorySource, UserRepository,
};
use crate::models::{
    DEVICE_IMPORT_COLUMNS, Device, DeviceDraft, DeviceEvent, DeviceProfile, ImportFile,
    Permission, PermissionDraft, Profile, TimeWindow, USER_IMPORT_COLUMNS, User,
    UserDraft, UserEvent, UserPatch,
};
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct OperatorCredentials {
    pub username: String,
    pub password: String,
    pub profile: Profile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemoryFixture {
    pub operator: Option<OperatorCredentials>,
    pub users: Vec<User>,
    pub devices: Vec<Device>,
    pub profiles: Vec<DeviceProfile>,
    pub permissions: Vec<Permission>,
    pub user_events: Vec<UserEvent>,
    pub device_events: Vec<DeviceEvent>,
    pub statuses: HashMap<String, Value>,
}

pub struct MemoryStore {
    operator: Option<OperatorCredentials>,
    state: RwLock<MemoryFixture>,
}

fn not_found(kind: &str) -> GatewayError {
    GatewayError::NotFound(format!("{kind} not found"))
}

fn rejected(message: String) -> GatewayError {
    GatewayError::Remote {
        status: 400,
        message,
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::from_fixture(MemoryFixture::default())
    }

    pub fn from_fixture(mut fixture: MemoryFixture) -> Self {
        Self {
            operator: fixture.operator.take(),
            state: RwLock::new(fixture),
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read memory fixture: {}", path.display()))?;
        let fixture: MemoryFixture = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse memory fixture: {}", path.display()))?;
        Ok(Self::from_fixture(fixture))
    }

    pub fn push_user_event(&self, event: UserEvent) {
        self.write().user_events.push(event);
    }

    pub fn push_device_event(&self, event: DeviceEvent) {
        self.write().device_events.push(event);
    }

    pub fn set_status(&self, device_id: &str, payload: Value) {
        self.write().statuses.insert(device_id.to_string(), payload);
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryFixture> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryFixture> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Splits a CSV upload into rows of trimmed cells, skipping blank lines and the header.
///
/// Records spanning several lines are not supported.
fn csv_rows(file: &ImportFile, columns: &[&str]) -> GatewayResult<Vec<(usize, Vec<String>)>> {
    let text = std::str::from_utf8(&file.bytes)
        .map_err(|_| rejected(format!("File '{}' is not UTF-8 text", file.file_name)))?;
    Ok(text
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, csv_cells(line)))
        .filter(|(_, cells)| cells.iter().any(|it| !it.is_empty()))
        .filter(|(_, cells)| !cells[0].eq_ignore_ascii_case(columns[0]))
        .collect())
}

/// Cells of one CSV line. A quoted cell may hold commas, `""` inside quotes is a literal quote.
fn csv_cells(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' if quoted && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' if quoted => quoted = false,
            '"' if current.trim().is_empty() => {
                current.clear();
                quoted = true;
            }
            ',' if !quoted => cells.push(std::mem::take(&mut current).trim().to_string()),
            ch => current.push(ch),
        }
    }
    cells.push(current.trim().to_string());
    cells
}

/// Rejects `id_number` when a user other than `except` already holds it.
fn ensure_id_number_free(users: &[User], id_number: &str, except: Option<&str>) -> GatewayResult<()> {
    let taken = users
        .iter()
        .any(|it| it.id_number == id_number && Some(it.id.as_str()) != except);
    if taken {
        return Err(GatewayError::Remote {
            status: 409,
            message: format!("ID number '{id_number}' is already enrolled"),
        });
    }
    Ok(())
}

fn cell(cells: &[String], index: usize) -> Option<String> {
    cells.get(index).filter(|it| !it.is_empty()).cloned()
}

#[async_trait]
impl Authenticator for MemoryStore {
    async fn login(&self, username: &str, password: &str) -> GatewayResult<(String, Profile)> {
        let operator = self.operator.as_ref().ok_or_else(|| GatewayError::Remote {
            status: 401,
            message: "No operator is configured for the memory store".to_string(),
        })?;
        if operator.username != username || operator.password != password {
            return Err(GatewayError::Remote {
                status: 401,
                message: "Invalid username or password".to_string(),
            });
        }
        Ok((format!("memory-{}", new_id()), operator.profile.clone()))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn list(&self) -> GatewayResult<Vec<User>> {
        Ok(self.read().users.clone())
    }

    async fn get(&self, id: &str) -> GatewayResult<User> {
        self.read()
            .users
            .iter()
            .find(|it| it.id == id)
            .cloned()
            .ok_or_else(|| not_found("User"))
    }

    async fn create(&self, draft: UserDraft) -> GatewayResult<User> {
        let mut state = self.write();
        ensure_id_number_free(&state.users, &draft.id_number, None)?;
        let user = User {
            id: new_id(),
            username: draft.username,
            name: draft.name,
            id_number: draft.id_number,
            face_image: draft.face_image,
            finger_print: draft.finger_print,
            schedule: None,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, id: &str, patch: UserPatch) -> GatewayResult<User> {
        let mut state = self.write();
        if let Some(id_number) = &patch.id_number {
            ensure_id_number_free(&state.users, id_number, Some(id))?;
        }
        let user = state
            .users
            .iter_mut()
            .find(|it| it.id == id)
            .ok_or_else(|| not_found("User"))?;
        patch.apply(user);
        Ok(user.clone())
    }

    async fn delete(&self, id: &str) -> GatewayResult<()> {
        let mut state = self.write();
        let index = state
            .users
            .iter()
            .position(|it| it.id == id)
            .ok_or_else(|| not_found("User"))?;
        state.users.remove(index);
        Ok(())
    }

    async fn import(&self, file: ImportFile) -> GatewayResult<()> {
        let mut drafts = Vec::new();
        for (line, cells) in csv_rows(&file, &USER_IMPORT_COLUMNS)? {
            let draft = UserDraft {
                username: cell(&cells, 0).unwrap_or_default(),
                name: cell(&cells, 1).unwrap_or_default(),
                id_number: cell(&cells, 2).unwrap_or_default(),
                face_image: cell(&cells, 3),
                finger_print: cell(&cells, 4),
            };
            draft
                .validate()
                .map_err(|err| rejected(format!("Line {line}: {err}")))?;
            drafts.push(draft);
        }
        for draft in drafts {
            UserRepository::create(self, draft).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceRepository for MemoryStore {
    async fn list(&self) -> GatewayResult<Vec<Device>> {
        Ok(self.read().devices.clone())
    }

    async fn get(&self, id: &str) -> GatewayResult<Device> {
        self.read()
            .devices
            .iter()
            .find(|it| it.id == id)
            .cloned()
            .ok_or_else(|| not_found("Device"))
    }

    async fn create(&self, draft: DeviceDraft) -> GatewayResult<Device> {
        let device = Device {
            id: new_id(),
            name: draft.name.trim().to_string(),
            r#type: draft.r#type.trim().to_string(),
            location: draft.location_or_default(),
            status: String::new(),
            cam_status: String::new(),
            rfid_status: String::new(),
            finger_print_status: String::new(),
        };
        let mut state = self.write();
        if draft.has_sensor_states() {
            state
                .statuses
                .insert(device.id.clone(), status_payload(&draft));
        }
        state.devices.push(device.clone());
        Ok(device)
    }

    async fn update(&self, id: &str, draft: DeviceDraft) -> GatewayResult<Device> {
        let mut state = self.write();
        let device = state
            .devices
            .iter_mut()
            .find(|it| it.id == id)
            .ok_or_else(|| not_found("Device"))?;
        device.name = draft.name.trim().to_string();
        device.r#type = draft.r#type.trim().to_string();
        device.location = draft.location_or_default();
        let device = device.clone();
        if draft.has_sensor_states() {
            state.statuses.insert(id.to_string(), status_payload(&draft));
        }
        Ok(device)
    }

    async fn delete(&self, id: &str) -> GatewayResult<()> {
        let mut state = self.write();
        let index = state
            .devices
            .iter()
            .position(|it| it.id == id)
            .ok_or_else(|| not_found("Device"))?;
        state.devices.remove(index);
        state.statuses.remove(id);
        Ok(())
    }

    async fn profiles(&self) -> GatewayResult<Vec<DeviceProfile>> {
        Ok(self.read().profiles.clone())
    }

    async fn import(&self, file: ImportFile) -> GatewayResult<()> {
        let mut drafts = Vec::new();
        for (line, cells) in csv_rows(&file, &DEVICE_IMPORT_COLUMNS)? {
            let draft = DeviceDraft {
                name: cell(&cells, 0).unwrap_or_default(),
                r#type: cell(&cells, 1).unwrap_or_default(),
                location: cell(&cells, 2),
                ..Default::default()
            };
            draft
                .validate()
                .map_err(|err| rejected(format!("Line {line}: {err}")))?;
            drafts.push(draft);
        }
        for draft in drafts {
            DeviceRepository::create(self, draft).await?;
        }
        Ok(())
    }
}

fn status_payload(draft: &DeviceDraft) -> Value {
    crate::gateways::platform::mapping::sensor_states_to_wire(draft)["status"].clone()
}

#[async_trait]
impl PermissionRepository for MemoryStore {
    async fn list(&self) -> GatewayResult<Vec<Permission>> {
        Ok(self.read().permissions.clone())
    }

    async fn create(&self, draft: PermissionDraft, window: TimeWindow) -> GatewayResult<Permission> {
        let permission = Permission {
            id: new_id(),
            user_ids: draft.user_ids,
            device_ids: draft.device_ids,
            start_time: window.start,
            end_time: window.end,
            created_at: chrono::Utc::now(),
        };
        self.write().permissions.push(permission.clone());
        Ok(permission)
    }

    async fn update(
        &self,
        id: &str,
        draft: PermissionDraft,
        window: TimeWindow,
    ) -> GatewayResult<Permission> {
        let mut state = self.write();
        let permission = state
            .permissions
            .iter_mut()
            .find(|it| it.id == id)
            .ok_or_else(|| not_found("Permission"))?;
        permission.user_ids = draft.user_ids;
        permission.device_ids = draft.device_ids;
        permission.start_time = window.start;
        permission.end_time = window.end;
        Ok(permission.clone())
    }

    async fn delete(&self, id: &str) -> GatewayResult<()> {
        let mut state = self.write();
        let index = state
            .permissions
            .iter()
            .position(|it| it.id == id)
            .ok_or_else(|| not_found("Permission"))?;
        state.permissions.remove(index);
        Ok(())
    }
}

#[async_trait]
impl UserHistorySource for MemoryStore {
    async fn user_events(&self, user_id: &str, window: &TimeWindow) -> GatewayResult<Vec<UserEvent>> {
        Ok(self
            .read()
            .user_events
            .iter()
            .filter(|it| it.user_id == user_id)
            .filter(|it| it.timestamp.is_none_or(|ts| window.contains(&ts)))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TelemetrySource for MemoryStore {
    async fn latest_status(&self, device_id: &str) -> GatewayResult<Option<Value>> {
        Ok(self.read().statuses.get(device_id).cloned())
    }

    async fn device_events(
        &self,
        device_id: &str,
        window: &TimeWindow,
    ) -> GatewayResult<Vec<DeviceEvent>> {
        Ok(self
            .read()
            .device_events
            .iter()
            .filter(|it| it.device_id == device_id && window.contains(&it.timestamp))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn csv(content: &str) -> ImportFile {
        ImportFile {
            file_name: "import.csv".into(),
            content_type: Some("text/csv".into()),
            bytes: content.as_bytes().to_vec(),
        }
    }

    #[tokio::test]
    async fn user_round_trip() {
        let store = MemoryStore::new();
        let created = UserRepository::create(
            &store,
            UserDraft {
                username: "john.doe".into(),
                name: "John Doe".into(),
                id_number: "ID001".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let listed = UserRepository::list(&store).await.unwrap();
        assert_eq!(listed, vec![created.clone()]);

        UserRepository::delete(&store, &created.id).await.unwrap();
        let err = UserRepository::delete(&store, &created.id).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[tokio::test]
    async fn duplicate_id_number_is_rejected() {
        let store = MemoryStore::new();
        let draft = UserDraft {
            username: "a".into(),
            name: "A".into(),
            id_number: "ID001".into(),
            ..Default::default()
        };
        UserRepository::create(&store, draft.clone()).await.unwrap();
        let err = UserRepository::create(&store, draft).await.unwrap_err();
        assert!(matches!(err, GatewayError::Remote { status: 409, .. }));
    }

    #[tokio::test]
    async fn update_cannot_take_enrolled_id_number() {
        let store = MemoryStore::new();
        for (username, id_number) in [("a", "ID001"), ("b", "ID002")] {
            UserRepository::create(
                &store,
                UserDraft {
                    username: username.into(),
                    name: username.to_uppercase(),
                    id_number: id_number.into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }
        let users = UserRepository::list(&store).await.unwrap();
        let patch = |id_number: &str| UserPatch {
            id_number: Some(id_number.into()),
            ..Default::default()
        };

        let err = UserRepository::update(&store, &users[1].id, patch("ID001"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Remote { status: 409, .. }));
        assert_eq!(UserRepository::get(&store, &users[1].id).await.unwrap().id_number, "ID002");

        let kept = UserRepository::update(&store, &users[0].id, patch("ID001"))
            .await
            .unwrap();
        assert_eq!(kept.id_number, "ID001");
    }

    #[test]
    fn quoted_cells_keep_commas() {
        assert_eq!(
            csv_cells(r#"Main Entrance,"Scanner, Fingerprint", "Lobby ""A""" "#),
            vec!["Main Entrance", "Scanner, Fingerprint", r#"Lobby "A""#]
        );
        assert_eq!(csv_cells("a,,b"), vec!["a", "", "b"]);
        assert_eq!(csv_cells(""), vec![""]);
    }

    #[tokio::test]
    async fn imports_quoted_device_csv() {
        let store = MemoryStore::new();
        DeviceRepository::import(
            &store,
            csv("name,type,location\n\"Gate, North\",RFID Reader,\"Lobby, East\"\n"),
        )
        .await
        .unwrap();
        let devices = DeviceRepository::list(&store).await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].name, "Gate, North");
        assert_eq!(devices[0].location, "Lobby, East");
    }

    #[tokio::test]
    async fn imports_device_csv() {
        let store = MemoryStore::new();
        DeviceRepository::import(
            &store,
            csv("name,type,location\nMain Entrance,Fingerprint Scanner,Lobby\n\nBack Door,RFID Reader,\n"),
        )
        .await
        .unwrap();
        let devices = DeviceRepository::list(&store).await.unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[1].location, "Unknown");
    }

    #[tokio::test]
    async fn import_rejects_whole_file_on_bad_row() {
        let store = MemoryStore::new();
        let err = UserRepository::import(&store, csv("username,name,idNumber\njd,John,ID1\nbad,,ID2\n"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Line 3: Field 'name' is required");
        assert!(UserRepository::list(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sensor_states_become_status_payload() {
        let store = MemoryStore::new();
        let device = DeviceRepository::create(
            &store,
            DeviceDraft {
                name: "Gate".into(),
                r#type: "Camera".into(),
                status: Some("Closed".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let payload = store.latest_status(&device.id).await.unwrap().unwrap();
        assert_eq!(payload["door_status"], "closed");
    }

    #[tokio::test]
    async fn user_events_respect_window() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store.push_user_event(UserEvent {
            hist_id: "h1".into(),
            user_id: "u1".into(),
            timestamp: Some(now),
        });
        store.push_user_event(UserEvent {
            hist_id: "h0".into(),
            user_id: "u1".into(),
            timestamp: Some(now - Duration::days(3)),
        });
        let window = TimeWindow {
            start: now - Duration::hours(1),
            end: now + Duration::hours(1),
        };
        let events = store.user_events("u1", &window).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].hist_id, "h1");
    }

    #[tokio::test]
    async fn loads_demo_fixture() {
        let store = MemoryStore::load(Path::new("demo/fixture.json")).unwrap();
        assert_eq!(UserRepository::list(&store).await.unwrap().len(), 2);
        assert_eq!(store.profiles().await.unwrap().len(), 2);
        assert!(store.latest_status("d2").await.unwrap().unwrap().is_string());
        assert!(store.login("admin", "admin123").await.is_ok());
    }

    #[tokio::test]
    async fn memory_login() {
        let store = MemoryStore::from_fixture(MemoryFixture {
            operator: Some(OperatorCredentials {
                username: "admin".into(),
                password: "admin123".into(),
                profile: Profile {
                    id: "0".into(),
                    username: "admin".into(),
                    name: "Admin User".into(),
                    email: None,
                    authority: None,
                },
            }),
            ..Default::default()
        });
        let (token, profile) = store.login("admin", "admin123").await.unwrap();
        assert!(token.starts_with("memory-"));
        assert_eq!(profile.name, "Admin User");
        assert!(store.login("admin", "nope").await.is_err());
    }
}
