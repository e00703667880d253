#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
//! Session-authenticated client for the Aula course platform API.
//!
//! Every request carries the stored bearer token. A `401` triggers at most
//! one refresh exchange per request; when the refresh token is missing or
//! rejected the session is cleared and the [`LoginBoundary`] is told to send
//! the user back to the login entry point.
//!
//! Layout:
//! - `config.rs`: base URL, timeout and refresh policy
//! - `store.rs` / `session.rs`: persisted tokens and the session state machine
//! - `envelope.rs` / `transport.rs`: request descriptions and the refreshing dispatcher
//! - `auth.rs`: login, profile and password operations
//! - `resources/`: typed collections (`cursos`, `examenes`, ...)
//! - `download.rs`: binary downloads and file name resolution

mod auth;
mod boundary;
mod config;
mod download;
mod envelope;
mod error;
mod resources;
mod session;
mod store;
mod transport;

pub use aula_api_models as models;

pub use boundary::{ExpiryReason, LoginBoundary, NoopBoundary};
pub use config::{
    ClientConfig, ConfigError, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS, RefreshPolicy,
    parse_base_url,
};
pub use download::{
    DEFAULT_CONTENT_TYPE, DEFAULT_FILE_NAME, Download, filename_from_disposition,
    resolve_filename,
};
pub use envelope::UploadFile;
pub use error::{ApiErrorBody, ClientError, ErrorKind, GENERIC_FAILURE, Result};
pub use resources::{
    Asistencias, ByCurso, ByExamen, ByPromocion, ByTema, Calificaciones, Collection, Creatable,
    Cursos, Deletable, Diplomas, Examenes, Inscripciones, ListFilter, MaterialUpload,
    Materiales, NoFilter, Preguntas, Promedios, Promociones, RecuperacionFilter, Recuperaciones,
    Resource, Temas, Updatable, UpdateVerb, UsuarioFilter, Usuarios,
};
pub use session::{SessionContext, SessionEvent, SessionState};
pub use store::{
    ACCESS_TOKEN_KEY, FileStore, MemoryStore, REFRESH_TOKEN_KEY, SESSION_KEYS, SessionStore,
    StoreError, USER_KEY,
};
pub use transport::{AulaClient, AulaClientBuilder};
