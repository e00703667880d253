use aula_client::ByPromocion;

use crate::cli::{DiplomasCommand, OutputFormat, PromediosCommand};
use crate::client::{AppContext, CliResult};
use crate::output::{render_diplomas, render_diplomas_generados, render_message, render_promedios};

pub(crate) async fn handle_promedios(
    ctx: &AppContext,
    command: PromediosCommand,
    format: OutputFormat,
) -> CliResult<()> {
    let promedios = ctx.client.promedios();
    match command {
        PromediosCommand::Ls(args) => {
            let filter = ByPromocion {
                promocion: args.promocion,
            };
            render_promedios(&promedios.list(&filter).await?, format)
        }
        PromediosCommand::Calcular(args) => {
            render_message(&promedios.calcular(args.promocion).await?, format)
        }
    }
}

pub(crate) async fn handle_diplomas(
    ctx: &AppContext,
    command: DiplomasCommand,
    format: OutputFormat,
) -> CliResult<()> {
    let diplomas = ctx.client.diplomas();
    match command {
        DiplomasCommand::Ls => render_diplomas(&diplomas.all().await?, format),
        DiplomasCommand::Generar(args) => {
            render_diplomas_generados(&diplomas.generar(args.promocion).await?, format)
        }
    }
}
