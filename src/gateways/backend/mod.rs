//! Client of the custom persistence backend (users, permissions, history).

pub(crate) mod mapping;

use crate::config::BackendConfig;
use crate::gateways::http::{expect_ok, multipart_form, read_json, segment_url};
use crate::gateways::{
    GatewayResult, PermissionRepository, UserHistorySource, UserRepository,
};
use crate::models::{
    ImportFile, Permission, PermissionDraft, TimeWindow, User, UserDraft, UserEvent, UserPatch,
};
use crate::services::SessionStore;
use async_trait::async_trait;
use mapping::{BackendResource, Envelope, HistoryWire};
use reqwest::{RequestBuilder, Url};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

pub struct BackendClient {
    base_url: String,
    http: reqwest::Client,
    session: Arc<SessionStore>,
}

impl BackendClient {
    pub fn new(config: &BackendConfig, http: reqwest::Client, session: Arc<SessionStore>) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            session,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn item_url<R: BackendResource>(&self, id: &str, operation: &str) -> GatewayResult<Url> {
        segment_url(
            &self.base_url,
            &[R::COLLECTION.trim_start_matches('/'), id],
            operation,
        )
    }

    fn authorized(&self, request: RequestBuilder) -> GatewayResult<RequestBuilder> {
        Ok(request.bearer_auth(self.session.token()?))
    }

    async fn list_all<R: BackendResource>(&self) -> GatewayResult<Vec<R>> {
        let request = self.authorized(self.http.get(self.url(R::COLLECTION)))?;
        let wires: Envelope<Vec<R::Wire>> =
            read_json(request, &format!("{} listing", R::NAME)).await?;
        Ok(wires.into_inner().into_iter().map(R::from_wire).collect())
    }

    async fn fetch<R: BackendResource>(&self, id: &str) -> GatewayResult<R> {
        let operation = format!("{} lookup", R::NAME);
        let request = self.authorized(self.http.get(self.item_url::<R>(id, &operation)?))?;
        let wire: Envelope<R::Wire> = read_json(request, &operation).await?;
        Ok(R::from_wire(wire.into_inner()))
    }

    async fn insert<R, B>(&self, body: &B) -> GatewayResult<R>
    where
        R: BackendResource,
        B: Serialize + ?Sized,
    {
        let request = self.authorized(self.http.post(self.url(R::COLLECTION)).json(body))?;
        let wire: Envelope<R::Wire> =
            read_json(request, &format!("{} creation", R::NAME)).await?;
        Ok(R::from_wire(wire.into_inner()))
    }

    async fn replace<R, B>(&self, id: &str, body: &B) -> GatewayResult<R>
    where
        R: BackendResource,
        B: Serialize + ?Sized,
    {
        let operation = format!("{} update", R::NAME);
        let request = self.authorized(
            self.http
                .put(self.item_url::<R>(id, &operation)?)
                .json(body),
        )?;
        let wire: Envelope<R::Wire> = read_json(request, &operation).await?;
        Ok(R::from_wire(wire.into_inner()))
    }

    async fn remove<R: BackendResource>(&self, id: &str) -> GatewayResult<()> {
        let operation = format!("{} deletion", R::NAME);
        let request = self.authorized(self.http.delete(self.item_url::<R>(id, &operation)?))?;
        expect_ok(request, &operation).await
    }

    async fn upload<R: BackendResource>(&self, file: ImportFile) -> GatewayResult<()> {
        let request = self.authorized(
            self.http
                .post(self.url(&format!("{}/import", R::COLLECTION)))
                .multipart(multipart_form(file)?),
        )?;
        expect_ok(request, &format!("{} import", R::NAME)).await
    }
}

fn permission_body(draft: &PermissionDraft, window: &TimeWindow) -> serde_json::Value {
    json!({
        "userIds": draft.user_ids,
        "deviceIds": draft.device_ids,
        "startTime": window.start.to_rfc3339(),
        "endTime": window.end.to_rfc3339(),
    })
}

#[async_trait]
impl UserRepository for BackendClient {
    async fn list(&self) -> GatewayResult<Vec<User>> {
        self.list_all::<User>().await
    }

    async fn get(&self, id: &str) -> GatewayResult<User> {
        self.fetch::<User>(id).await
    }

    async fn create(&self, draft: UserDraft) -> GatewayResult<User> {
        self.insert::<User, _>(&draft).await
    }

    async fn update(&self, id: &str, patch: UserPatch) -> GatewayResult<User> {
        self.replace::<User, _>(id, &patch).await
    }

    async fn delete(&self, id: &str) -> GatewayResult<()> {
        self.remove::<User>(id).await
    }

    async fn import(&self, file: ImportFile) -> GatewayResult<()> {
        self.upload::<User>(file).await
    }
}

#[async_trait]
impl PermissionRepository for BackendClient {
    async fn list(&self) -> GatewayResult<Vec<Permission>> {
        self.list_all::<Permission>().await
    }

    async fn create(&self, draft: PermissionDraft, window: TimeWindow) -> GatewayResult<Permission> {
        self.insert::<Permission, _>(&permission_body(&draft, &window)).await
    }

    async fn update(
        &self,
        id: &str,
        draft: PermissionDraft,
        window: TimeWindow,
    ) -> GatewayResult<Permission> {
        self.replace::<Permission, _>(id, &permission_body(&draft, &window))
            .await
    }

    async fn delete(&self, id: &str) -> GatewayResult<()> {
        self.remove::<Permission>(id).await
    }
}

#[async_trait]
impl UserHistorySource for BackendClient {
    async fn user_events(&self, user_id: &str, window: &TimeWindow) -> GatewayResult<Vec<UserEvent>> {
        let request = self.authorized(self.http.get(self.url("/histories")).query(&[
            ("userId", user_id.to_string()),
            ("startTime", window.start.to_rfc3339()),
            ("endTime", window.end.to_rfc3339()),
        ]))?;
        let wires: Envelope<Vec<HistoryWire>> = read_json(request, "user history").await?;
        Ok(wires.into_inner().into_iter().map(UserEvent::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateways::testing::{serve, signed_in_session};
    use crate::gateways::GatewayError;
    use axum::extract::{Path, Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{delete, get};
    use axum::Json;
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::Mutex;

    type Rows = Arc<Mutex<Vec<Value>>>;

    /// A tiny backend keeping users in a vector.
    fn fake_backend(rows: Rows) -> axum::Router {
        axum::Router::new()
            .route(
                "/users",
                get(|headers: HeaderMap, State(rows): State<Rows>| async move {
                    assert_eq!(headers["authorization"], "Bearer platform-jwt");
                    Json(json!({ "data": rows.lock().unwrap().clone() }))
                })
                .post(|State(rows): State<Rows>, Json(mut body): Json<Value>| async move {
                    let mut rows = rows.lock().unwrap();
                    body["_id"] = json!(format!("u{}", rows.len() + 1));
                    rows.push(body.clone());
                    (StatusCode::CREATED, Json(body))
                }),
            )
            .route(
                "/users/{id}",
                get(|Path(id): Path<String>, State(rows): State<Rows>| async move {
                    let rows = rows.lock().unwrap();
                    match rows.iter().find(|it| it["_id"] == id.as_str()) {
                        Some(row) => (StatusCode::OK, Json(row.clone())),
                        None => (StatusCode::NOT_FOUND, Json(json!({ "message": "User not found" }))),
                    }
                }),
            )
            .with_state(rows)
    }

    fn client(base_url: String) -> BackendClient {
        BackendClient::new(
            &BackendConfig { base_url },
            reqwest::Client::new(),
            signed_in_session(),
        )
    }

    #[tokio::test]
    async fn created_user_is_listed() {
        let client = client(serve(fake_backend(Rows::default())).await);
        let created = UserRepository::create(
            &client,
            UserDraft {
                username: "emily.johnson".into(),
                name: "Emily Johnson".into(),
                id_number: "ID004".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(created.id, "u1");

        let users = UserRepository::list(&client).await.unwrap();
        assert!(users.iter().any(|it| it.id_number == "ID004"));
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let client = client(serve(fake_backend(Rows::default())).await);
        let err = UserRepository::get(&client, "nope").await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(ref m) if m == "User not found"));
    }

    #[tokio::test]
    async fn id_stays_inside_its_collection() {
        type Hits = Arc<Mutex<Vec<String>>>;
        let hits = Hits::default();
        let router = axum::Router::new()
            .route(
                "/users/{id}",
                delete(|Path(id): Path<String>, State(hits): State<Hits>| async move {
                    hits.lock().unwrap().push(format!("users:{id}"));
                    StatusCode::NO_CONTENT
                }),
            )
            .route(
                "/permissions/{id}",
                delete(|Path(id): Path<String>, State(hits): State<Hits>| async move {
                    hits.lock().unwrap().push(format!("permissions:{id}"));
                    StatusCode::NO_CONTENT
                }),
            )
            .with_state(hits.clone());
        let client = client(serve(router).await);

        UserRepository::delete(&client, "x/../../permissions/p1")
            .await
            .unwrap();
        assert_eq!(*hits.lock().unwrap(), vec!["users:x/../../permissions/p1"]);

        let err = UserRepository::delete(&client, "..").await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
        assert_eq!(hits.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn history_query_carries_window() {
        let router = axum::Router::new().route(
            "/histories",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                assert_eq!(q["userId"], "u1");
                assert!(q.contains_key("startTime") && q.contains_key("endTime"));
                Json(json!([{ "histId": "h1", "userId": "u1", "timestamp": 1700000000000i64 }]))
            }),
        );
        let client = client(serve(router).await);
        let now = chrono::Utc::now();
        let window = TimeWindow {
            start: now - chrono::Duration::days(1),
            end: now,
        };
        let events = client.user_events("u1", &window).await.unwrap();
        assert_eq!(events[0].hist_id, "h1");
        assert!(events[0].timestamp.is_some());
    }
}
