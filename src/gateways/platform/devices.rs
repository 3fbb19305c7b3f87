use super::mapping::{
    self, DeviceCredentials, DeviceProfileInfo, DeviceRecord, device_from_record,
};
use super::PlatformClient;
use crate::gateways::http::{expect_ok, multipart_form, read_json};
use crate::gateways::{DeviceRepository, GatewayResult};
use crate::models::{Device, DeviceDraft, DeviceProfile, ImportFile};
use async_trait::async_trait;

impl PlatformClient {
    async fn save_device(&self, id: Option<&str>, draft: &DeviceDraft) -> GatewayResult<Device> {
        let operation = if id.is_some() { "device update" } else { "device creation" };
        let request = self.authorized(
            self.http
                .post(self.url("/api/device"))
                .json(&mapping::device_to_wire(id, draft)),
        )?;
        let record: DeviceRecord = read_json(request, operation).await?;
        let device = device_from_record(record, &self.status_fallback);
        if draft.has_sensor_states() {
            // The device is saved upstream at this point, so the publish only warns.
            if let Err(err) = self.publish_sensor_states(&device.id, draft).await {
                tracing::warn!(device_id = %device.id, "Failed to publish sensor states: {}", err);
            }
        }
        Ok(device)
    }

    /// Pushes operator-chosen sensor states as device telemetry.
    ///
    /// Device telemetry is written with the device's own access token, which is
    /// looked up through its credentials.
    async fn publish_sensor_states(&self, id: &str, draft: &DeviceDraft) -> GatewayResult<()> {
        let url = self.url_of(&["api", "device", id, "credentials"], "device credentials")?;
        let credentials: DeviceCredentials = self.get_json(url, &[], "device credentials").await?;
        let url = self.url_of(
            &["api", "v1", credentials.credentials_id.as_str(), "telemetry"],
            "device status publish",
        )?;
        let request = self
            .http
            .post(url)
            .json(&mapping::sensor_states_to_wire(draft));
        expect_ok(request, "device status publish").await
    }
}

#[async_trait]
impl DeviceRepository for PlatformClient {
    async fn list(&self) -> GatewayResult<Vec<Device>> {
        let records: Vec<DeviceRecord> = self
            .get_all_pages("/api/tenant/devices", "device listing")
            .await?;
        Ok(records
            .into_iter()
            .map(|it| device_from_record(it, &self.status_fallback))
            .collect())
    }

    async fn get(&self, id: &str) -> GatewayResult<Device> {
        let url = self.url_of(&["api", "device", id], "device lookup")?;
        let record: DeviceRecord = self.get_json(url, &[], "device lookup").await?;
        Ok(device_from_record(record, &self.status_fallback))
    }

    async fn create(&self, draft: DeviceDraft) -> GatewayResult<Device> {
        self.save_device(None, &draft).await
    }

    async fn update(&self, id: &str, draft: DeviceDraft) -> GatewayResult<Device> {
        self.save_device(Some(id), &draft).await
    }

    async fn delete(&self, id: &str) -> GatewayResult<()> {
        let url = self.url_of(&["api", "device", id], "device deletion")?;
        self.delete_url(url, "device deletion").await
    }

    async fn profiles(&self) -> GatewayResult<Vec<DeviceProfile>> {
        let infos: Vec<DeviceProfileInfo> = self
            .get_all_pages("/api/deviceProfileInfos", "device profile listing")
            .await?;
        Ok(infos.into_iter().map(mapping::profile_from_wire).collect())
    }

    async fn import(&self, file: ImportFile) -> GatewayResult<()> {
        let request = self.authorized(
            self.http
                .post(self.url("/api/device/bulk_import"))
                .multipart(multipart_form(file)?),
        )?;
        expect_ok(request, "device import").await
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::client;
    use crate::gateways::testing::{serve, signed_in_session};
    use super::*;
    use crate::gateways::GatewayError;
    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{delete, get, post};
    use axum::Json;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    fn record(id: &str, name: &str) -> Value {
        json!({ "id": { "entityType": "DEVICE", "id": id }, "name": name, "type": "RFID Reader", "label": "Lobby" })
    }

    #[tokio::test]
    async fn lists_every_page() {
        let router = axum::Router::new().route(
            "/api/tenant/devices",
            get(|headers: HeaderMap, Query(q): Query<HashMap<String, String>>| async move {
                assert_eq!(headers["X-Authorization"], "Bearer platform-jwt");
                let page = q["page"].parse::<usize>().unwrap();
                let all = [record("d1", "A"), record("d2", "B"), record("d3", "C")];
                let data = all.iter().skip(page * 2).take(2).cloned().collect::<Vec<_>>();
                Json(json!({ "data": data, "hasNext": page == 0 }))
            }),
        );
        let client = client(serve(router).await, signed_in_session());
        let devices = DeviceRepository::list(&client).await.unwrap();
        assert_eq!(
            devices.iter().map(|it| it.id.as_str()).collect::<Vec<_>>(),
            vec!["d1", "d2", "d3"]
        );
        assert!(devices.iter().all(|it| it.status == "Unknown"));
    }

    #[tokio::test]
    async fn create_publishes_sensor_states_with_device_token() {
        let published = Arc::new(Mutex::new(None::<(String, Value)>));
        let sink = published.clone();
        let router = axum::Router::new()
            .route(
                "/api/device",
                post(|Json(body): Json<Value>| async move {
                    assert!(body.get("id").is_none());
                    Json(json!({ "id": { "id": "d7" }, "name": body["name"], "type": body["type"], "label": body["label"] }))
                }),
            )
            .route(
                "/api/device/{id}/credentials",
                get(|Path(id): Path<String>| async move {
                    Json(json!({ "credentialsId": format!("token-{id}"), "credentialsType": "ACCESS_TOKEN" }))
                }),
            )
            .route(
                "/api/v1/{token}/telemetry",
                post(move |Path(token): Path<String>, Json(body): Json<Value>| async move {
                    *sink.lock().unwrap() = Some((token, body));
                    StatusCode::OK
                }),
            );
        let client = client(serve(router).await, signed_in_session());
        let device = DeviceRepository::create(
            &client,
            DeviceDraft {
                name: "Side Door".into(),
                r#type: "Camera".into(),
                location: None,
                cam_status: Some("Inactive".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(device.id, "d7");
        assert_eq!(device.location, "Unknown");
        let (token, body) = published.lock().unwrap().clone().unwrap();
        assert_eq!(token, "token-d7");
        assert_eq!(body["status"]["cam_status"], "inactive");
    }

    #[tokio::test]
    async fn failed_publish_keeps_created_device() {
        let creates = Arc::new(Mutex::new(0usize));
        let counter = creates.clone();
        let router = axum::Router::new()
            .route(
                "/api/device",
                post(move |Json(body): Json<Value>| async move {
                    *counter.lock().unwrap() += 1;
                    Json(json!({ "id": { "id": "d8" }, "name": body["name"], "type": body["type"] }))
                }),
            )
            .route(
                "/api/device/{id}/credentials",
                get(|| async {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({ "message": "boom" })),
                    )
                }),
            );
        let client = client(serve(router).await, signed_in_session());
        let device = DeviceRepository::create(
            &client,
            DeviceDraft {
                name: "Back Door".into(),
                r#type: "RFID Reader".into(),
                rfid_status: Some("Active".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(device.id, "d8");
        assert_eq!(*creates.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn device_id_is_a_single_segment() {
        let hits = Arc::new(Mutex::new(Vec::<String>::new()));
        let (device_hits, credential_hits) = (hits.clone(), hits.clone());
        let router = axum::Router::new()
            .route(
                "/api/device/{id}",
                delete(move |Path(id): Path<String>| async move {
                    device_hits.lock().unwrap().push(format!("device:{id}"));
                    StatusCode::OK
                }),
            )
            .route(
                "/api/device/{id}/credentials",
                delete(move |Path(id): Path<String>| async move {
                    credential_hits.lock().unwrap().push(format!("credentials:{id}"));
                    StatusCode::OK
                }),
            );
        let client = client(serve(router).await, signed_in_session());

        DeviceRepository::delete(&client, "d1/credentials").await.unwrap();
        DeviceRepository::delete(&client, "x/../d2/credentials").await.unwrap();
        assert_eq!(
            *hits.lock().unwrap(),
            vec!["device:d1/credentials", "device:x/../d2/credentials"]
        );
    }

    #[tokio::test]
    async fn delete_surfaces_not_found() {
        let router = axum::Router::new().route(
            "/api/device/{id}",
            delete(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "status": 404, "message": "Requested item wasn't found!" })),
                )
            }),
        );
        let client = client(serve(router).await, signed_in_session());
        let err = DeviceRepository::delete(&client, "missing").await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(ref m) if m == "Requested item wasn't found!"));
    }

    #[tokio::test]
    async fn generic_message_without_remote_one() {
        let router = axum::Router::new().route(
            "/api/deviceProfileInfos",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let client = client(serve(router).await, signed_in_session());
        let err = client.profiles().await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown error for device profile listing");
    }
}
