//! Login, profile and password operations.

use aula_api_models::{
    ChangePasswordRequest, LoginRequest, MessageResponse, ProfileUpdate, TokenPair, UserProfile,
};
use reqwest::Method;
use tracing::{info, warn};

use crate::error::Result;
use crate::session::{SessionEvent, SessionState};
use crate::transport::AulaClient;

const LOGIN_PATH: &str = "/auth/login/";
const PROFILE_PATH: &str = "/auth/profile/";
const CHANGE_PASSWORD_PATH: &str = "/auth/usuarios/cambiar_password/";

impl AulaClient {
    /// Exchange credentials for a token pair without touching the session.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError::Api`] when the credentials are rejected.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<TokenPair> {
        self.post_unauthenticated(
            LOGIN_PATH,
            &LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            },
        )
        .await
    }

    /// Log in: store the token pair, then fetch and cache the profile.
    ///
    /// A failed profile fetch discards the freshly stored tokens so the
    /// session never holds tokens without a profile.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError`] when authentication or the profile
    /// fetch fails.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserProfile> {
        let tokens = self.authenticate(username, password).await?;
        self.session().store_tokens(&tokens)?;
        match self.profile().await {
            Ok(profile) => {
                info!(username = %profile.username, role = %profile.tipo, "logged in");
                Ok(profile)
            }
            Err(err) => {
                warn!(error = %err, "profile fetch after login failed; discarding tokens");
                self.session().clear(SessionEvent::LoggedOut)?;
                Err(err)
            }
        }
    }

    /// Fetch the current profile and cache it in the session.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError`] when the request fails.
    pub async fn profile(&self) -> Result<UserProfile> {
        let profile: UserProfile = self.get_json(PROFILE_PATH, Vec::new()).await?;
        self.session().cache_user(&profile)?;
        Ok(profile)
    }

    /// Apply a partial profile update and cache the result.
    ///
    /// Blank phone, birth date and address values are sent as `null`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError`] when the server rejects the update.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile> {
        let profile: UserProfile = self
            .send_json(Method::PATCH, PROFILE_PATH, &update.to_payload())
            .await?;
        self.session().cache_user(&profile)?;
        Ok(profile)
    }

    /// Change the account password and lift a forced-change flag.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError::Api`] when the current password is wrong
    /// or the new passwords do not match.
    pub async fn change_password(
        &self,
        current: &str,
        new_password: &str,
        confirmation: &str,
    ) -> Result<MessageResponse> {
        let response: MessageResponse = self
            .send_json(
                Method::POST,
                CHANGE_PASSWORD_PATH,
                &ChangePasswordRequest {
                    password_actual: current.to_string(),
                    password_nueva: new_password.to_string(),
                    password_nueva_confirm: confirmation.to_string(),
                },
            )
            .await?;
        self.session().mark_password_changed()?;
        Ok(response)
    }

    /// Forget the session.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError::Storage`] when the store cannot be
    /// cleared.
    pub fn logout(&self) -> Result<()> {
        self.session().clear(SessionEvent::LoggedOut)?;
        info!("logged out");
        Ok(())
    }

    /// Resume a persisted session by re-validating it against the server.
    ///
    /// Without a stored access token the session stays unauthenticated. A
    /// failed profile fetch clears the store.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError::Storage`] when the store cannot be read
    /// or cleared.
    pub async fn restore(&self) -> Result<SessionState> {
        if self.session().access_token()?.is_none() {
            return Ok(SessionState::Unauthenticated);
        }
        match self.profile().await {
            Ok(_) => Ok(self.session().state()),
            Err(err) => {
                warn!(error = %err, "stored session could not be restored");
                self.session().clear(SessionEvent::Expired)?;
                Ok(SessionState::Unauthenticated)
            }
        }
    }
}
