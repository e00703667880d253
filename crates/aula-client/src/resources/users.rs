//! Account administration.

use aula_api_models::{NuevoUsuario, Usuario, UsuarioCreado};

use super::{Collection, Creatable, Deletable, Resource, Updatable, UpdateVerb, UsuarioFilter};
use crate::transport::AulaClient;

/// `/auth/usuarios/`; password changes go through
/// [`AulaClient::change_password`].
#[derive(Debug, Clone, Copy)]
pub struct Usuarios;

impl Resource for Usuarios {
    const PATH: &'static str = "/auth/usuarios/";
    type Item = Usuario;
    type Filter = UsuarioFilter;
}

impl Creatable for Usuarios {
    type Payload = NuevoUsuario;
    type Created = UsuarioCreado;
}

impl Updatable for Usuarios {
    type Patch = NuevoUsuario;
    const VERB: UpdateVerb = UpdateVerb::Put;
}

impl Deletable for Usuarios {}

impl AulaClient {
    /// Accounts.
    #[must_use]
    pub const fn usuarios(&self) -> Collection<'_, Usuarios> {
        Collection::new(self)
    }
}
