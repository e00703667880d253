//! Outbound request description.
//!
//! Requests are kept as plain data until dispatch so the same envelope can be
//! rebuilt with a fresh bearer token when it is retried after a refresh.
//! Multipart forms in particular cannot be cloned once built.

use std::path::Path;

use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::ClientError;

/// File content attached to a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// Name reported to the server.
    pub file_name: String,
    /// Raw content.
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// In-memory upload.
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read an upload from disk, naming it after the file.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Upload`] when the file cannot be read.
    pub async fn from_path(path: &Path) -> Result<Self, ClientError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ClientError::Upload {
                path: path.to_path_buf(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map_or_else(|| "archivo".to_string(), |name| name.to_string_lossy().into_owned());
        Ok(Self { file_name, bytes })
    }
}

#[derive(Debug, Clone)]
pub(crate) enum MultipartField {
    Text { name: &'static str, value: String },
    File { name: &'static str, file: UploadFile },
}

#[derive(Debug, Clone)]
pub(crate) enum RequestBody {
    Empty,
    Json(Value),
    Multipart(Vec<MultipartField>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResponseKind {
    Json,
    Binary,
}

#[derive(Debug, Clone)]
pub(crate) struct RequestEnvelope {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) body: RequestBody,
    pub(crate) expect: ResponseKind,
}

impl RequestEnvelope {
    pub(crate) fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            expect: ResponseKind::Json,
        }
    }

    pub(crate) fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub(crate) fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub(crate) fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub(crate) fn with_query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    pub(crate) fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ClientError> {
        let value = serde_json::to_value(body).map_err(|source| ClientError::Encode {
            operation: self.label(),
            source,
        })?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    pub(crate) fn with_multipart(mut self, fields: Vec<MultipartField>) -> Self {
        self.body = RequestBody::Multipart(fields);
        self
    }

    pub(crate) const fn expecting_binary(mut self) -> Self {
        self.expect = ResponseKind::Binary;
        self
    }

    pub(crate) fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    pub(crate) fn build(&self, client: &Client, base: &Url, bearer: Option<&str>) -> RequestBuilder {
        let mut builder = client.request(self.method.clone(), endpoint_url(base, &self.path));
        if !self.query.is_empty() {
            builder = builder.query(&self.query);
        }
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        if self.expect == ResponseKind::Json {
            builder = builder.header(ACCEPT, "application/json");
        }
        match &self.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(fields) => builder.multipart(build_form(fields)),
        }
    }
}

fn build_form(fields: &[MultipartField]) -> Form {
    fields.iter().fold(Form::new(), |form, field| match field {
        MultipartField::Text { name, value } => form.text(*name, value.clone()),
        MultipartField::File { name, file } => form.part(
            *name,
            Part::bytes(file.bytes.clone()).file_name(file.file_name.clone()),
        ),
    })
}

/// Request paired with its retry marker.
///
/// A retried request is a new value with `attempted` set; the original is
/// consumed, so no request can be marked twice or observed half-marked.
#[derive(Debug, Clone)]
pub(crate) struct AttemptedRequest {
    pub(crate) envelope: RequestEnvelope,
    pub(crate) attempted: bool,
}

impl AttemptedRequest {
    pub(crate) const fn new(envelope: RequestEnvelope) -> Self {
        Self {
            envelope,
            attempted: false,
        }
    }

    pub(crate) fn into_retry(self) -> Self {
        Self {
            envelope: self.envelope,
            attempted: true,
        }
    }
}

/// Append `path` to the base URL path, keeping any prefix such as `/api`.
pub(crate) fn endpoint_url(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    let prefix = base.path().trim_end_matches('/');
    let suffix = path.trim_start_matches('/');
    url.set_path(&format!("{prefix}/{suffix}"));
    url
}
