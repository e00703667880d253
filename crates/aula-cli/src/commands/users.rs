use aula_api_models::NuevoUsuario;
use aula_client::UsuarioFilter;

use crate::cli::{OutputFormat, UsuarioCreateArgs, UsuariosCommand};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{render_usuario_creado, render_usuarios};

pub(crate) async fn handle_usuarios(
    ctx: &AppContext,
    command: UsuariosCommand,
    format: OutputFormat,
) -> CliResult<()> {
    let usuarios = ctx.client.usuarios();
    match command {
        UsuariosCommand::Ls(args) => {
            let filter = UsuarioFilter { tipo: args.tipo };
            render_usuarios(&usuarios.list(&filter).await?, format)
        }
        UsuariosCommand::Create(args) => {
            let nuevo = nuevo_usuario(args)?;
            render_usuario_creado(&usuarios.create(&nuevo).await?, format)
        }
    }
}

fn nuevo_usuario(args: UsuarioCreateArgs) -> CliResult<NuevoUsuario> {
    let username = args.username.trim();
    if username.is_empty() {
        return Err(CliError::validation("username must not be empty"));
    }
    if !args.email.contains('@') {
        return Err(CliError::validation(format!(
            "'{}' is not an email address",
            args.email
        )));
    }
    Ok(NuevoUsuario {
        username: username.to_string(),
        email: args.email.trim().to_string(),
        first_name: args.first_name.trim().to_string(),
        last_name: args.last_name.trim().to_string(),
        password: args.password.filter(|password| !password.is_empty()),
        tipo: args.tipo,
        telefono: args
            .telefono
            .map(|telefono| telefono.trim().to_string())
            .filter(|telefono| !telefono.is_empty()),
        fecha_nacimiento: None,
        direccion: None,
    })
}
