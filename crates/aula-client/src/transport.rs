//! Authenticated transport: bearer injection and the single-retry refresh
//! flow.

use std::sync::Arc;

use aula_api_models::{AccessGrant, ListResponse, RefreshRequest};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use crate::boundary::{ExpiryReason, LoginBoundary, NoopBoundary};
use crate::config::{ClientConfig, ConfigError, RefreshPolicy};
use crate::envelope::{AttemptedRequest, MultipartField, RequestEnvelope};
use crate::error::{ApiErrorBody, ClientError, Result};
use crate::session::{SessionContext, SessionEvent};

const HEADER_REQUEST_ID: &str = "x-request-id";
pub(crate) const REFRESH_PATH: &str = "/auth/refresh/";

/// Client for the Aula REST API.
///
/// Clones share the HTTP connection pool, the session and the refresh gate.
#[derive(Clone)]
pub struct AulaClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: Client,
    base_url: Url,
    session: SessionContext,
    boundary: Arc<dyn LoginBoundary>,
    policy: RefreshPolicy,
    refresh_gate: Mutex<()>,
}

impl std::fmt::Debug for AulaClient {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AulaClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("policy", &self.inner.policy)
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

/// Builder for [`AulaClient`].
pub struct AulaClientBuilder {
    config: ClientConfig,
    session: Option<SessionContext>,
    boundary: Option<Arc<dyn LoginBoundary>>,
}

impl AulaClientBuilder {
    /// Use an existing session instead of a fresh in-memory one.
    #[must_use]
    pub fn session(mut self, session: SessionContext) -> Self {
        self.session = Some(session);
        self
    }

    /// Install the collaborator invoked when the session expires.
    #[must_use]
    pub fn login_boundary(mut self, boundary: impl LoginBoundary + 'static) -> Self {
        self.boundary = Some(Arc::new(boundary));
        self
    }

    /// Construct the client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request id is not a valid header
    /// value or the HTTP client cannot be built.
    pub fn build(self) -> Result<AulaClient> {
        let mut default_headers = HeaderMap::new();
        if let Some(request_id) = &self.config.request_id {
            let value = HeaderValue::from_str(request_id).map_err(|_| {
                ConfigError::InvalidRequestId {
                    value: request_id.clone(),
                }
            })?;
            default_headers.insert(HEADER_REQUEST_ID, value);
        }

        let http = Client::builder()
            .timeout(self.config.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|source| ClientError::HttpClient { source })?;

        Ok(AulaClient {
            inner: Arc::new(ClientInner {
                http,
                base_url: self.config.base_url,
                session: self.session.unwrap_or_default(),
                boundary: self
                    .boundary
                    .unwrap_or_else(|| Arc::new(NoopBoundary)),
                policy: self.config.refresh_policy,
                refresh_gate: Mutex::new(()),
            }),
        })
    }
}

impl AulaClient {
    /// Start building a client.
    #[must_use]
    pub const fn builder(config: ClientConfig) -> AulaClientBuilder {
        AulaClientBuilder {
            config,
            session: None,
            boundary: None,
        }
    }

    /// Client with an in-memory session and no login boundary.
    ///
    /// # Errors
    ///
    /// See [`AulaClientBuilder::build`].
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Shared session.
    #[must_use]
    pub fn session(&self) -> &SessionContext {
        &self.inner.session
    }

    /// API root.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Refresh coordination in effect.
    #[must_use]
    pub fn refresh_policy(&self) -> RefreshPolicy {
        self.inner.policy
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<T> {
        self.request_json(RequestEnvelope::get(path).with_query(query))
            .await
    }

    pub(crate) async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<Vec<T>> {
        let response: ListResponse<T> = self.get_json(path, query).await?;
        Ok(response.into_items())
    }

    pub(crate) async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request_json(RequestEnvelope::new(method, path).with_json(body)?)
            .await
    }

    pub(crate) async fn send_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        fields: Vec<MultipartField>,
    ) -> Result<T> {
        self.request_json(RequestEnvelope::post(path).with_multipart(fields))
            .await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<()> {
        self.execute(RequestEnvelope::delete(path)).await?;
        Ok(())
    }

    pub(crate) async fn fetch_binary(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<Response> {
        self.execute(
            RequestEnvelope::get(path)
                .with_query(query)
                .expecting_binary(),
        )
        .await
    }

    /// POST outside the refresh flow, without a bearer token.
    pub(crate) async fn post_unauthenticated<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let envelope = RequestEnvelope::post(path).with_json(body)?;
        let operation = envelope.label();
        let response = self.dispatch(&envelope, None).await?;
        let response = ensure_success(response).await?;
        decode_json(&operation, response).await
    }

    async fn request_json<T: DeserializeOwned>(&self, envelope: RequestEnvelope) -> Result<T> {
        let operation = envelope.label();
        let response = self.execute(envelope).await?;
        decode_json(&operation, response).await
    }

    /// Send a request with the stored bearer token, recovering from one 401.
    pub(crate) async fn execute(&self, envelope: RequestEnvelope) -> Result<Response> {
        let mut pending = AttemptedRequest::new(envelope);
        let mut bearer = self.inner.session.access_token()?;
        loop {
            let response = self.dispatch(&pending.envelope, bearer.as_deref()).await?;
            if response.status() != StatusCode::UNAUTHORIZED || pending.attempted {
                return ensure_success(response).await;
            }
            debug!(operation = %pending.envelope.label(), "access token rejected");
            bearer = Some(self.recover(bearer.as_deref(), response).await?);
            pending = pending.into_retry();
        }
    }

    async fn dispatch(&self, envelope: &RequestEnvelope, bearer: Option<&str>) -> Result<Response> {
        debug!(
            method = %envelope.method,
            path = %envelope.path,
            authenticated = bearer.is_some(),
            "sending request"
        );
        let response = envelope
            .build(&self.inner.http, &self.inner.base_url, bearer)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                operation: envelope.label(),
                source,
            })?;
        debug!(status = %response.status(), path = %envelope.path, "received response");
        Ok(response)
    }

    async fn recover(&self, rejected: Option<&str>, response: Response) -> Result<String> {
        match self.inner.policy {
            RefreshPolicy::PerRequest => self.refresh_or_expire(response).await,
            RefreshPolicy::Shared => {
                let _gate = self.inner.refresh_gate.lock().await;
                match self.inner.session.access_token()? {
                    Some(current) if Some(current.as_str()) != rejected => {
                        debug!("reusing access token refreshed by a concurrent request");
                        Ok(current)
                    }
                    None if rejected.is_some() => {
                        debug!("session ended by a concurrent refresh");
                        Err(ClientError::SessionExpired {
                            source: Box::new(api_error(response).await),
                        })
                    }
                    _ => self.refresh_or_expire(response).await,
                }
            }
        }
    }

    async fn refresh_or_expire(&self, rejected: Response) -> Result<String> {
        let Some(refresh) = self.inner.session.refresh_token()? else {
            let original = api_error(rejected).await;
            warn!("request rejected and no refresh token is stored; ending session");
            self.expire(ExpiryReason::MissingRefreshToken)?;
            return Err(ClientError::SessionExpired {
                source: Box::new(original),
            });
        };
        drop(rejected);

        let exchange: Result<AccessGrant> = self
            .post_unauthenticated(REFRESH_PATH, &RefreshRequest { refresh })
            .await;
        match exchange {
            Ok(grant) => {
                self.inner.session.store_refreshed(&grant)?;
                debug!("access token refreshed");
                Ok(grant.access)
            }
            Err(err) => {
                warn!(error = %err, "token refresh failed; ending session");
                self.expire(ExpiryReason::RefreshRejected)?;
                Err(ClientError::RefreshFailed {
                    source: Box::new(err),
                })
            }
        }
    }

    fn expire(&self, reason: ExpiryReason) -> Result<()> {
        let cleared = self.inner.session.clear(SessionEvent::Expired);
        self.inner.boundary.redirect_to_login(reason);
        cleared.map_err(ClientError::from)
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(api_error(response).await)
    }
}

async fn api_error(response: Response) -> ClientError {
    let status = response.status();
    let bytes = response.bytes().await.unwrap_or_default();
    ClientError::Api {
        status,
        body: ApiErrorBody::from_bytes(&bytes),
    }
}

async fn decode_json<T: DeserializeOwned>(operation: &str, response: Response) -> Result<T> {
    let bytes = response
        .bytes()
        .await
        .map_err(|source| ClientError::Transport {
            operation: operation.to_string(),
            source,
        })?;
    serde_json::from_slice(&bytes).map_err(|source| ClientError::Decode {
        operation: operation.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    use anyhow::{Result, anyhow};
    use aula_api_models::Curso;
    use aula_test_support::fixtures::curso_json;
    use aula_test_support::mocks::api_base;
    use httpmock::prelude::*;
    use serde_json::json;

    use crate::store::{ACCESS_TOKEN_KEY, MemoryStore, REFRESH_TOKEN_KEY, SessionStore, USER_KEY};

    #[derive(Default)]
    struct RecordingBoundary {
        calls: StdMutex<Vec<ExpiryReason>>,
    }

    impl RecordingBoundary {
        fn record(&self, reason: ExpiryReason) {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(reason);
            }
        }

        fn calls(&self) -> Vec<ExpiryReason> {
            self.calls
                .lock()
                .map(|calls| calls.clone())
                .unwrap_or_default()
        }
    }

    struct Harness {
        client: AulaClient,
        store: Arc<MemoryStore>,
        boundary: Arc<RecordingBoundary>,
    }

    fn harness(server: &MockServer, policy: RefreshPolicy) -> Result<Harness> {
        let store = Arc::new(MemoryStore::new());
        let boundary = Arc::new(RecordingBoundary::default());
        let config = ClientConfig::new(Url::parse(&api_base(server))?).with_refresh_policy(policy);
        let recorder = boundary.clone();
        let client = AulaClient::builder(config)
            .session(SessionContext::from_shared(store.clone()))
            .login_boundary(move |reason| recorder.record(reason))
            .build()?;
        Ok(Harness {
            client,
            store,
            boundary,
        })
    }

    fn seed(store: &MemoryStore, access: &str, refresh: Option<&str>) -> Result<()> {
        store.set(ACCESS_TOKEN_KEY, access.to_string())?;
        if let Some(refresh) = refresh {
            store.set(REFRESH_TOKEN_KEY, refresh.to_string())?;
        }
        store.set(USER_KEY, "{}".to_string())?;
        Ok(())
    }

    #[tokio::test]
    async fn attaches_the_stored_bearer_token() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/cursos/")
                .header("authorization", "Bearer tok-1");
            then.status(200).json_body(json!([curso_json(1, "Biblia")]));
        });
        let harness = harness(&server, RefreshPolicy::PerRequest)?;
        seed(&harness.store, "tok-1", Some("ref-1"))?;

        let cursos: Vec<Curso> = harness.client.get_list("/cursos/", Vec::new()).await?;

        mock.assert();
        assert_eq!(cursos.len(), 1);
        assert_eq!(cursos[0].nombre, "Biblia");
        Ok(())
    }

    #[tokio::test]
    async fn refreshes_once_and_retries_with_the_new_token() -> Result<()> {
        let server = MockServer::start_async().await;
        let stale = server.mock(|when, then| {
            when.method(GET)
                .path("/api/cursos/")
                .header("authorization", "Bearer stale");
            then.status(401)
                .json_body(json!({"detail": "Given token not valid for any token type"}));
        });
        let refresh = server.mock(|when, then| {
            when.method(POST)
                .path("/api/auth/refresh/")
                .json_body(json!({"refresh": "ref-1"}));
            then.status(200).json_body(json!({"access": "fresh"}));
        });
        let fresh = server.mock(|when, then| {
            when.method(GET)
                .path("/api/cursos/")
                .header("authorization", "Bearer fresh");
            then.status(200)
                .json_body(json!({"count": 1, "next": null, "previous": null, "results": [curso_json(2, "Liturgia")]}));
        });
        let harness = harness(&server, RefreshPolicy::PerRequest)?;
        seed(&harness.store, "stale", Some("ref-1"))?;

        let cursos: Vec<Curso> = harness.client.get_list("/cursos/", Vec::new()).await?;

        stale.assert();
        refresh.assert();
        fresh.assert();
        assert_eq!(cursos[0].id, 2);
        assert_eq!(harness.store.get(ACCESS_TOKEN_KEY)?.as_deref(), Some("fresh"));
        assert_eq!(harness.store.get(REFRESH_TOKEN_KEY)?.as_deref(), Some("ref-1"));
        assert!(harness.boundary.calls().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn second_unauthorized_after_retry_is_final() -> Result<()> {
        let server = MockServer::start_async().await;
        let stale = server.mock(|when, then| {
            when.method(GET)
                .path("/api/cursos/")
                .header("authorization", "Bearer stale");
            then.status(401).json_body(json!({"detail": "expired"}));
        });
        let refresh = server.mock(|when, then| {
            when.method(POST).path("/api/auth/refresh/");
            then.status(200).json_body(json!({"access": "fresh"}));
        });
        let fresh = server.mock(|when, then| {
            when.method(GET)
                .path("/api/cursos/")
                .header("authorization", "Bearer fresh");
            then.status(401).json_body(json!({"detail": "still not allowed"}));
        });
        let harness = harness(&server, RefreshPolicy::PerRequest)?;
        seed(&harness.store, "stale", Some("ref-1"))?;

        let err = harness
            .client
            .get_list::<Curso>("/cursos/", Vec::new())
            .await
            .err()
            .ok_or_else(|| anyhow!("expected the retried request to fail"))?;

        stale.assert();
        refresh.assert();
        fresh.assert();
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(err.to_string(), "still not allowed");
        assert!(!err.is_session_expired());
        assert_eq!(harness.store.get(ACCESS_TOKEN_KEY)?.as_deref(), Some("fresh"));
        Ok(())
    }

    #[tokio::test]
    async fn missing_refresh_token_clears_session_and_fails() -> Result<()> {
        let server = MockServer::start_async().await;
        let rejected = server.mock(|when, then| {
            when.method(GET).path("/api/temas/");
            then.status(401).json_body(json!({"detail": "not authenticated"}));
        });
        let harness = harness(&server, RefreshPolicy::PerRequest)?;
        seed(&harness.store, "stale", None)?;

        let err = harness
            .client
            .get_json::<serde_json::Value>("/temas/", Vec::new())
            .await
            .err()
            .ok_or_else(|| anyhow!("expected failure"))?;

        rejected.assert();
        assert!(matches!(err, ClientError::SessionExpired { .. }));
        assert!(err.is_session_expired());
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(err.to_string(), "not authenticated");
        assert!(harness.store.is_empty());
        assert_eq!(
            harness.boundary.calls(),
            vec![ExpiryReason::MissingRefreshToken]
        );
        Ok(())
    }

    #[tokio::test]
    async fn failed_refresh_clears_session_and_invokes_boundary() -> Result<()> {
        let server = MockServer::start_async().await;
        let rejected = server.mock(|when, then| {
            when.method(GET).path("/api/examenes/");
            then.status(401);
        });
        let refresh = server.mock(|when, then| {
            when.method(POST).path("/api/auth/refresh/");
            then.status(401)
                .json_body(json!({"detail": "Token is invalid or expired", "code": "token_not_valid"}));
        });
        let harness = harness(&server, RefreshPolicy::PerRequest)?;
        seed(&harness.store, "stale", Some("revoked"))?;

        let err = harness
            .client
            .get_json::<serde_json::Value>("/examenes/", Vec::new())
            .await
            .err()
            .ok_or_else(|| anyhow!("expected failure"))?;

        rejected.assert();
        refresh.assert();
        assert!(matches!(err, ClientError::RefreshFailed { .. }));
        assert!(err.is_session_expired());
        assert!(harness.store.is_empty());
        assert_eq!(
            harness.boundary.calls(),
            vec![ExpiryReason::RefreshRejected]
        );
        assert_eq!(
            harness.client.session().state(),
            crate::session::SessionState::Unauthenticated
        );
        Ok(())
    }

    #[tokio::test]
    async fn non_unauthorized_failures_keep_the_decoded_body() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/cursos/");
            then.status(400)
                .json_body(json!({"nombre": ["Este campo es requerido."]}));
        });
        let harness = harness(&server, RefreshPolicy::PerRequest)?;
        seed(&harness.store, "tok", Some("ref"))?;

        let err = harness
            .client
            .send_json::<_, Curso>(Method::POST, "/cursos/", &json!({}))
            .await
            .err()
            .ok_or_else(|| anyhow!("expected failure"))?;

        mock.assert();
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(
            err.body().map(ApiErrorBody::field_errors),
            Some(vec![("nombre".to_string(), "Este campo es requerido.".to_string())])
        );
        assert_eq!(harness.store.get(ACCESS_TOKEN_KEY)?.as_deref(), Some("tok"));
        Ok(())
    }

    #[tokio::test]
    async fn shared_policy_runs_a_single_exchange_for_concurrent_failures() -> Result<()> {
        let server = MockServer::start_async().await;
        let mut rejected = Vec::new();
        let mut retried = Vec::new();
        for path in ["/api/cursos/", "/api/temas/"] {
            rejected.push(server.mock(|when, then| {
                when.method(GET)
                    .path(path)
                    .header("authorization", "Bearer stale");
                then.status(401);
            }));
            retried.push(server.mock(|when, then| {
                when.method(GET)
                    .path(path)
                    .header("authorization", "Bearer fresh");
                then.status(200).json_body(json!([]));
            }));
        }
        let refresh = server.mock(|when, then| {
            when.method(POST).path("/api/auth/refresh/");
            then.status(200).json_body(json!({"access": "fresh"}));
        });
        let harness = harness(&server, RefreshPolicy::Shared)?;
        seed(&harness.store, "stale", Some("ref-1"))?;

        let (cursos, temas) = tokio::join!(
            harness.client.get_list::<Curso>("/cursos/", Vec::new()),
            harness
                .client
                .get_list::<serde_json::Value>("/temas/", Vec::new()),
        );
        cursos?;
        temas?;

        refresh.assert();
        for mock in rejected.iter().chain(retried.iter()) {
            mock.assert();
        }
        Ok(())
    }

    #[tokio::test]
    async fn shared_policy_failed_refresh_ends_session_once() -> Result<()> {
        let server = MockServer::start_async().await;
        let mut rejected = Vec::new();
        for path in ["/api/cursos/", "/api/temas/"] {
            rejected.push(server.mock(|when, then| {
                when.method(GET)
                    .path(path)
                    .header("authorization", "Bearer stale");
                then.status(401).json_body(json!({"detail": "token expired"}));
            }));
        }
        let refresh = server.mock(|when, then| {
            when.method(POST).path("/api/auth/refresh/");
            then.status(401)
                .json_body(json!({"detail": "Token is invalid or expired", "code": "token_not_valid"}));
        });
        let harness = harness(&server, RefreshPolicy::Shared)?;
        seed(&harness.store, "stale", Some("revoked"))?;

        let (cursos, temas) = tokio::join!(
            harness.client.get_list::<Curso>("/cursos/", Vec::new()),
            harness
                .client
                .get_list::<serde_json::Value>("/temas/", Vec::new()),
        );
        let errors = [cursos.err(), temas.err()];

        refresh.assert();
        for mock in &rejected {
            mock.assert();
        }
        assert!(
            errors
                .iter()
                .all(|err| err.as_ref().is_some_and(ClientError::is_session_expired))
        );
        assert_eq!(
            errors
                .iter()
                .flatten()
                .filter(|err| matches!(err, ClientError::RefreshFailed { .. }))
                .count(),
            1
        );
        assert_eq!(
            harness.boundary.calls(),
            vec![ExpiryReason::RefreshRejected]
        );
        assert!(harness.store.is_empty());
        Ok(())
    }
}
