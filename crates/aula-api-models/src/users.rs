//! Administrative user management payloads.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::auth::{UserProfile, UserRole};

/// Account as listed by `/auth/usuarios/`; same document as the profile.
pub type Usuario = UserProfile;

/// Body of `POST /auth/usuarios/`.
///
/// When `password` is omitted the server generates one and returns it in
/// [`UsuarioCreado::password_generada`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NuevoUsuario {
    /// Login name.
    pub username: String,
    /// Contact email.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Explicit password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Account role.
    pub tipo: UserRole,
    /// Optional phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    /// Optional birth date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_nacimiento: Option<NaiveDate>,
    /// Optional postal address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direccion: Option<String>,
}

/// Response of `POST /auth/usuarios/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UsuarioCreado {
    /// Created account.
    #[serde(flatten)]
    pub usuario: Usuario,
    /// Initial password in clear text.
    #[serde(default)]
    pub password_generada: Option<String>,
    /// Server confirmation.
    #[serde(default)]
    pub mensaje: Option<String>,
}
