use crate::common::{ApiError, ApiResult};
use crate::gateways::Authenticator;
use crate::models::Profile;
use crate::services::SessionStore;
use std::sync::Arc;

pub struct AuthService {
    authenticator: Arc<dyn Authenticator>,
    session: Arc<SessionStore>,
}

impl AuthService {
    pub fn new(authenticator: Arc<dyn Authenticator>, session: Arc<SessionStore>) -> Self {
        Self {
            authenticator,
            session,
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> ApiResult<Profile> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ApiError::Validation(
                "Username and password are required".to_string(),
            ));
        }
        let (token, profile) = self.authenticator.login(username, password).await?;
        tracing::info!("Operator '{}' signed in", profile.username);
        self.session.set_session(token, profile.clone());
        Ok(profile)
    }

    pub fn logout(&self) {
        self.session.clear();
        tracing::info!("Operator signed out");
    }

    pub fn current(&self) -> ApiResult<Profile> {
        Ok(self.session.profile()?)
    }
}
