use std::path::{Path, PathBuf};

use anyhow::anyhow;
use aula_api_models::CursoPayload;
use aula_client::{ByCurso, ByPromocion, ByTema, Download, MaterialUpload, UploadFile};
use tracing::info;

use crate::cli::{
    CursoCreateArgs, CursosCommand, InscripcionesCommand, MaterialDownloadArgs,
    MaterialUploadArgs, MaterialesCommand, OutputFormat, PromocionesCommand, TemasCommand,
};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{
    render_curso, render_cursos, render_inscripciones, render_material, render_materiales,
    render_promocion, render_promociones, render_temas,
};

pub(crate) async fn handle_cursos(
    ctx: &AppContext,
    command: CursosCommand,
    format: OutputFormat,
) -> CliResult<()> {
    let cursos = ctx.client.cursos();
    match command {
        CursosCommand::Ls => render_cursos(&cursos.all().await?, format),
        CursosCommand::Show(args) => render_curso(&cursos.get(args.id).await?, format),
        CursosCommand::Create(args) => {
            let payload = curso_payload(args)?;
            render_curso(&cursos.create(&payload).await?, format)
        }
        CursosCommand::Delete(args) => {
            cursos.delete(args.id).await?;
            println!("curso {} deleted", args.id);
            Ok(())
        }
    }
}

fn curso_payload(args: CursoCreateArgs) -> CliResult<CursoPayload> {
    let nombre = args.nombre.trim();
    if nombre.is_empty() {
        return Err(CliError::validation("course name must not be empty"));
    }
    Ok(CursoPayload {
        nombre: nombre.to_string(),
        descripcion: args
            .descripcion
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty()),
        activo: !args.inactive,
    })
}

pub(crate) async fn handle_promociones(
    ctx: &AppContext,
    command: PromocionesCommand,
    format: OutputFormat,
) -> CliResult<()> {
    let promociones = ctx.client.promociones();
    match command {
        PromocionesCommand::Ls(args) => {
            let filter = ByCurso { curso: args.curso };
            render_promociones(&promociones.list(&filter).await?, format)
        }
        PromocionesCommand::Show(args) => {
            render_promocion(&promociones.get(args.id).await?, format)
        }
    }
}

pub(crate) async fn handle_temas(
    ctx: &AppContext,
    command: TemasCommand,
    format: OutputFormat,
) -> CliResult<()> {
    match command {
        TemasCommand::Ls(args) => {
            let filter = ByPromocion {
                promocion: args.promocion,
            };
            render_temas(&ctx.client.temas().list(&filter).await?, format)
        }
    }
}

pub(crate) async fn handle_materiales(
    ctx: &AppContext,
    command: MaterialesCommand,
    format: OutputFormat,
) -> CliResult<()> {
    match command {
        MaterialesCommand::Ls(args) => {
            let filter = ByTema { tema: args.tema };
            render_materiales(&ctx.client.materiales().list(&filter).await?, format)
        }
        MaterialesCommand::Upload(args) => handle_material_upload(ctx, args, format).await,
        MaterialesCommand::Download(args) => handle_material_download(ctx, args).await,
    }
}

async fn handle_material_upload(
    ctx: &AppContext,
    args: MaterialUploadArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let titulo = args.titulo.trim();
    if titulo.is_empty() {
        return Err(CliError::validation("material title must not be empty"));
    }
    if !args.file.is_file() {
        return Err(CliError::validation(format!(
            "'{}' is not a readable file",
            args.file.display()
        )));
    }
    let archivo = UploadFile::from_path(&args.file).await?;
    let material = ctx
        .client
        .materiales()
        .upload(MaterialUpload {
            tema: args.tema,
            titulo: titulo.to_string(),
            descripcion: args.descripcion,
            archivo,
        })
        .await?;
    render_material(&material, format)
}

async fn handle_material_download(ctx: &AppContext, args: MaterialDownloadArgs) -> CliResult<()> {
    let materiales = ctx.client.materiales();
    let material = materiales.get(args.id).await?;
    let download = materiales.download(args.id, Some(&material)).await?;
    let target = download_target(args.out.as_deref(), &download);

    tokio::fs::write(&target, &download.bytes)
        .await
        .map_err(|err| {
            CliError::failure(anyhow!("failed to write '{}': {err}", target.display()))
        })?;
    info!(
        material = args.id,
        path = %target.display(),
        content_type = %download.content_type,
        "material saved"
    );
    println!("saved {} ({} bytes)", target.display(), download.bytes.len());
    Ok(())
}

/// Directories (existing ones, or the working directory when unset) receive
/// the resolved file name; any other path is used as the file itself.
fn download_target(out: Option<&Path>, download: &Download) -> PathBuf {
    match out {
        Some(path) if path.is_dir() => path.join(&download.file_name),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(&download.file_name),
    }
}

pub(crate) async fn handle_inscripciones(
    ctx: &AppContext,
    command: InscripcionesCommand,
    format: OutputFormat,
) -> CliResult<()> {
    match command {
        InscripcionesCommand::Ls(args) => {
            let filter = ByPromocion {
                promocion: args.promocion,
            };
            render_inscripciones(&ctx.client.inscripciones().list(&filter).await?, format)
        }
    }
}
