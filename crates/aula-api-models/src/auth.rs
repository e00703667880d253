//! Authentication payloads and the user profile document.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Credentials submitted to `POST /auth/login/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    /// Account username.
    pub username: String,
    /// Plain-text password.
    pub password: String,
}

/// Token pair issued by a successful login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenPair {
    /// Short-lived bearer token.
    pub access: String,
    /// Long-lived token exchanged for new access tokens.
    pub refresh: String,
}

/// Body of `POST /auth/refresh/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefreshRequest {
    /// Refresh token being exchanged.
    pub refresh: String,
}

/// Response of `POST /auth/refresh/`.
///
/// Servers that rotate refresh tokens also return a replacement `refresh`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessGrant {
    /// Newly issued access token.
    pub access: String,
    /// Rotated refresh token, when the server issues one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
}

/// Platform role attached to every account.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Enrolled student.
    Alumno,
    /// Instructor.
    Docente,
    /// Platform administrator.
    Admin,
}

impl UserRole {
    /// Wire label used in query filters.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alumno => "alumno",
            Self::Docente => "docente",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "alumno" => Ok(Self::Alumno),
            "docente" => Ok(Self::Docente),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Profile returned by `GET /auth/profile/` and cached in the session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    /// Account identifier.
    pub id: i64,
    /// Login name.
    pub username: String,
    /// Contact email.
    #[serde(default)]
    pub email: String,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
    /// Account role.
    pub tipo: UserRole,
    /// Optional phone number.
    #[serde(default)]
    pub telefono: Option<String>,
    /// Optional birth date.
    #[serde(default)]
    pub fecha_nacimiento: Option<NaiveDate>,
    /// Optional postal address.
    #[serde(default)]
    pub direccion: Option<String>,
    /// Whether the account is enabled.
    #[serde(default = "default_true")]
    pub activo: bool,
    /// Forces a password change before the account can be used normally.
    #[serde(default)]
    pub debe_cambiar_password: bool,
    /// Account creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_creacion: Option<DateTime<Utc>>,
    /// Django superuser flag, only present on some payloads.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_superuser: bool,
}

const fn default_true() -> bool {
    true
}

impl UserProfile {
    /// Students only.
    #[must_use]
    pub fn is_alumno(&self) -> bool {
        self.tipo == UserRole::Alumno
    }

    /// Instructors and administrators both manage course content.
    #[must_use]
    pub fn is_docente(&self) -> bool {
        matches!(self.tipo, UserRole::Docente | UserRole::Admin)
    }

    /// Administrators, including Django superusers of any role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.tipo == UserRole::Admin || self.is_superuser
    }

    /// Full name when present, otherwise the username.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Partial profile update sent with `PATCH /auth/profile/`.
///
/// Unset fields are omitted. Blank optional contact fields are sent as
/// explicit `null` so the server clears them instead of rejecting an empty
/// date or storing an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    /// New email.
    pub email: Option<String>,
    /// New given name.
    pub first_name: Option<String>,
    /// New family name.
    pub last_name: Option<String>,
    /// New phone number; blank clears it.
    pub telefono: Option<String>,
    /// New birth date as `YYYY-MM-DD`; blank clears it.
    pub fecha_nacimiento: Option<String>,
    /// New address; blank clears it.
    pub direccion: Option<String>,
}

impl ProfileUpdate {
    /// Whether no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.telefono.is_none()
            && self.fecha_nacimiento.is_none()
            && self.direccion.is_none()
    }

    /// JSON document for the PATCH request.
    #[must_use]
    pub fn to_payload(&self) -> Value {
        let mut body = Map::new();
        for (key, value) in [
            ("email", &self.email),
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
        ] {
            if let Some(value) = value {
                body.insert(key.to_string(), Value::String(value.clone()));
            }
        }
        for (key, value) in [
            ("telefono", &self.telefono),
            ("fecha_nacimiento", &self.fecha_nacimiento),
            ("direccion", &self.direccion),
        ] {
            if let Some(value) = value {
                let cleaned = if value.trim().is_empty() {
                    Value::Null
                } else {
                    Value::String(value.clone())
                };
                body.insert(key.to_string(), cleaned);
            }
        }
        Value::Object(body)
    }
}

/// Body of `POST /auth/usuarios/cambiar_password/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangePasswordRequest {
    /// Current password.
    pub password_actual: String,
    /// Replacement password.
    pub password_nueva: String,
    /// Confirmation of the replacement password.
    pub password_nueva_confirm: String,
}

/// Plain acknowledgement returned by action endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    /// Human-readable confirmation.
    pub mensaje: String,
}
