//! Shared client wiring and error types for the CLI.

use std::fmt::{self, Display, Formatter};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::anyhow;
use aula_client::{
    AulaClient, ClientConfig, ClientError, ErrorKind, ExpiryReason, FileStore, SessionContext,
    StoreError, parse_base_url,
};
use tracing::warn;
use url::Url;
use uuid::Uuid;

use crate::cli::Cli;

const SESSION_DIR: &str = ".aula";
const SESSION_FILE: &str = "session.json";
const RELOGIN_HINT: &str = "run `aula login <username>` to sign in again";

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<ClientError> for CliError {
    fn from(err: ClientError) -> Self {
        match err.kind() {
            ErrorKind::Auth if err.is_session_expired() => {
                Self::Validation(format!("{}; {RELOGIN_HINT}", err.user_message()))
            }
            ErrorKind::Auth => Self::Validation(err.user_message()),
            ErrorKind::Validation => Self::Validation(validation_message(&err)),
            ErrorKind::Server | ErrorKind::Transport | ErrorKind::Local => {
                Self::Failure(anyhow::Error::new(err))
            }
        }
    }
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        Self::Failure(anyhow::Error::new(err))
    }
}

/// Server message, followed by every field error when there are several.
fn validation_message(err: &ClientError) -> String {
    let message = err.user_message();
    let fields = err.body().map(aula_client::ApiErrorBody::field_errors).unwrap_or_default();
    if fields.len() < 2 {
        return message;
    }
    let details: Vec<String> = fields
        .into_iter()
        .map(|(field, problem)| format!("  {field}: {problem}"))
        .collect();
    format!("{message}\n{}", details.join("\n"))
}

/// Application context passed to command handlers.
#[derive(Clone, Debug)]
pub(crate) struct AppContext {
    pub(crate) client: AulaClient,
    pub(crate) session_file: PathBuf,
}

impl AppContext {
    /// Build the client from global flags, backed by the session file.
    pub(crate) fn from_cli(cli: &Cli) -> CliResult<Self> {
        if cli.timeout == 0 {
            return Err(CliError::validation("--timeout must be at least one second"));
        }
        let session_path = cli.session_file.clone().unwrap_or_else(default_session_path);
        let store = FileStore::open(&session_path)?;

        let config = ClientConfig::new(cli.api_url.clone())
            .with_timeout(Duration::from_secs(cli.timeout))
            .with_refresh_policy(cli.refresh_policy)
            .with_request_id(Uuid::new_v4().to_string());
        Self::new(config, store)
    }

    pub(crate) fn new(config: ClientConfig, store: FileStore) -> CliResult<Self> {
        let session_file = store.path().to_path_buf();
        let client = AulaClient::builder(config)
            .session(SessionContext::new(store))
            .login_boundary(|reason: ExpiryReason| {
                warn!(?reason, "session ended; login required");
            })
            .build()?;
        Ok(Self {
            client,
            session_file,
        })
    }
}

/// `$HOME/.aula/session.json`, or a relative `.aula/session.json` without a
/// home directory.
pub(crate) fn default_session_path() -> PathBuf {
    std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map_or_else(PathBuf::new, PathBuf::from)
        .join(SESSION_DIR)
        .join(SESSION_FILE)
}

/// Parse the API URL provided to the CLI.
pub(crate) fn parse_url(input: &str) -> Result<Url, String> {
    parse_base_url(input).map_err(|err| match err {
        aula_client::ConfigError::InvalidUrl { reason, .. } => {
            format!("invalid URL '{input}': {reason}")
        }
        other => other.to_string(),
    })
}

/// Use `provided` when present, otherwise prompt on an interactive terminal.
pub(crate) fn resolve_secret(provided: Option<&str>, prompt: &str, flag: &str) -> CliResult<String> {
    if let Some(value) = provided {
        if value.is_empty() {
            return Err(CliError::validation(format!("{flag} cannot be empty")));
        }
        return Ok(value.to_string());
    }

    if io::stdin().is_terminal() {
        let secret = rpassword::prompt_password(prompt)
            .map_err(|err| CliError::failure(anyhow!("failed to read {flag} from stdin: {err}")))?;
        if secret.is_empty() {
            return Err(CliError::validation(format!("{flag} cannot be empty")));
        }
        Ok(secret)
    } else {
        Err(CliError::validation(format!(
            "{flag} required; supply it explicitly when running non-interactively"
        )))
    }
}
