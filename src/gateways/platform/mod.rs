//! Client of the identity/telemetry platform (device registry, credentials, time-series).

mod devices;
pub(crate) mod mapping;
mod telemetry;

use crate::config::PlatformConfig;
use crate::gateways::http::{read_json, segment_url, send};
use crate::gateways::{Authenticator, GatewayResult};
use crate::models::{Profile, TimeWindow};
use crate::services::SessionStore;
use crate::utils::to_epoch_millis;
use async_trait::async_trait;
use mapping::{LoginResponse, PageData, PlatformUser, Timeseries};
use reqwest::{IntoUrl, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;

const AUTH_HEADER: &str = "X-Authorization";

pub struct PlatformClient {
    base_url: String,
    http: reqwest::Client,
    session: Arc<SessionStore>,
    page_size: u32,
    timeseries_limit: u32,
    status_fallback: String,
}

impl PlatformClient {
    pub fn new(
        config: &PlatformConfig,
        http: reqwest::Client,
        session: Arc<SessionStore>,
        status_fallback: &str,
    ) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            session,
            page_size: config.page_size.max(1),
            timeseries_limit: config.timeseries_limit,
            status_fallback: status_fallback.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Builds an url from fixed path parts and entity ids, one segment each.
    fn url_of(&self, segments: &[&str], operation: &str) -> GatewayResult<Url> {
        segment_url(&self.base_url, segments, operation)
    }

    fn authorized(&self, request: RequestBuilder) -> GatewayResult<RequestBuilder> {
        let token = self.session.token()?;
        Ok(request.header(AUTH_HEADER, format!("Bearer {token}")))
    }

    async fn get_json<T>(
        &self,
        url: impl IntoUrl,
        query: &[(&str, String)],
        operation: &str,
    ) -> GatewayResult<T>
    where
        T: DeserializeOwned,
    {
        let request = self.authorized(self.http.get(url).query(query))?;
        read_json(request, operation).await
    }

    async fn delete_url(&self, url: Url, operation: &str) -> GatewayResult<()> {
        let request = self.authorized(self.http.delete(url))?;
        send(request, operation).await.map(|_| ())
    }

    /// Walks every page of a paginated listing.
    async fn get_all_pages<T>(&self, path: &str, operation: &str) -> GatewayResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut page = 0u32;
        loop {
            let data: PageData<T> = self
                .get_json(
                    self.url(path),
                    &[
                        ("pageSize", self.page_size.to_string()),
                        ("page", page.to_string()),
                    ],
                    operation,
                )
                .await?;
            let has_next = data.has_next && !data.data.is_empty();
            items.extend(data.data);
            if !has_next {
                break;
            }
            page += 1;
        }
        Ok(items)
    }

    /// Reads time-series `keys` of an entity, the latest values when no window is given.
    async fn timeseries(
        &self,
        entity_type: &str,
        id: &str,
        keys: &[&str],
        window: Option<&TimeWindow>,
        operation: &str,
    ) -> GatewayResult<Timeseries> {
        let mut query = vec![("keys", keys.join(","))];
        if let Some(window) = window {
            query.push(("startTs", to_epoch_millis(&window.start).to_string()));
            query.push(("endTs", to_epoch_millis(&window.end).to_string()));
            query.push(("limit", self.timeseries_limit.to_string()));
        }
        let url = self.url_of(
            &["api", "plugins", "telemetry", entity_type, id, "values", "timeseries"],
            operation,
        )?;
        self.get_json(url, &query, operation).await
    }
}

#[async_trait]
impl Authenticator for PlatformClient {
    async fn login(&self, username: &str, password: &str) -> GatewayResult<(String, Profile)> {
        let request = self
            .http
            .post(self.url("/api/auth/login"))
            .json(&json!({ "username": username, "password": password }));
        let LoginResponse { token } = read_json(request, "login").await?;
        let request = self
            .http
            .get(self.url("/api/auth/user"))
            .header(AUTH_HEADER, format!("Bearer {token}"));
        let user: PlatformUser = read_json(request, "current user").await?;
        Ok((token, mapping::profile_from_user(user)))
    }
}
