//! Command handlers grouped by concern.

pub(crate) mod auth;
pub(crate) mod courses;
pub(crate) mod exams;
pub(crate) mod outcomes;
pub(crate) mod users;

#[cfg(test)]
pub(crate) mod harness {
    use std::path::PathBuf;

    use aula_client::{
        ACCESS_TOKEN_KEY, ClientConfig, FileStore, REFRESH_TOKEN_KEY, SessionStore, USER_KEY,
    };
    use aula_test_support::mocks::api_base;
    use httpmock::MockServer;
    use serde_json::Value;
    use tempfile::TempDir;
    use url::Url;

    use crate::client::AppContext;

    /// Context bound to a mock server and a session file in a temp dir.
    pub(crate) struct TestContext {
        pub(crate) ctx: AppContext,
        pub(crate) session_file: PathBuf,
        _dir: TempDir,
    }

    impl TestContext {
        /// Reopen the session file as a fresh process would see it.
        pub(crate) fn reopen(&self) -> FileStore {
            FileStore::open(&self.session_file).expect("session file should reopen")
        }
    }

    pub(crate) fn context(server: &MockServer) -> TestContext {
        let dir = TempDir::new().expect("temp dir");
        let session_file = dir.path().join("aula").join("session.json");
        let store = FileStore::open(&session_file).expect("open store");
        let config = ClientConfig::new(Url::parse(&api_base(server)).expect("valid URL"));
        let ctx = AppContext::new(config, store).expect("client builds");
        TestContext {
            ctx,
            session_file,
            _dir: dir,
        }
    }

    /// Context whose session file already holds tokens and, optionally, a
    /// cached profile.
    pub(crate) fn logged_in(
        server: &MockServer,
        access: &str,
        refresh: Option<&str>,
        profile: Option<&Value>,
    ) -> TestContext {
        let dir = TempDir::new().expect("temp dir");
        let session_file = dir.path().join("session.json");
        {
            let seed = FileStore::open(&session_file).expect("open store");
            seed.set(ACCESS_TOKEN_KEY, access.to_string())
                .expect("seed access token");
            if let Some(refresh) = refresh {
                seed.set(REFRESH_TOKEN_KEY, refresh.to_string())
                    .expect("seed refresh token");
            }
            if let Some(profile) = profile {
                seed.set(USER_KEY, profile.to_string()).expect("seed user");
            }
        }
        let store = FileStore::open(&session_file).expect("reopen store");
        let config = ClientConfig::new(Url::parse(&api_base(server)).expect("valid URL"));
        let ctx = AppContext::new(config, store).expect("client builds");
        TestContext {
            ctx,
            session_file,
            _dir: dir,
        }
    }
}
