use std::collections::BTreeSet;

use aula_api_models::{ResponderRequest, Respuesta};
use aula_client::{ByExamen, ByTema, RecuperacionFilter};

use crate::cli::{
    AnswerArg, CalificacionesCommand, ExamenesCommand, OutputFormat, RecuperacionesCommand,
};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{
    render_calificacion, render_calificaciones, render_conteo, render_exam_sitting,
    render_examenes, render_recuperaciones,
};

pub(crate) async fn handle_examenes(
    ctx: &AppContext,
    command: ExamenesCommand,
    format: OutputFormat,
) -> CliResult<()> {
    let examenes = ctx.client.examenes();
    match command {
        ExamenesCommand::Ls(args) => {
            let filter = ByTema { tema: args.tema };
            render_examenes(&examenes.list(&filter).await?, format)
        }
        ExamenesCommand::Preguntas(args) => {
            let sitting = examenes.preguntas(args.id, args.recuperacion).await?;
            render_exam_sitting(&sitting, format)
        }
        ExamenesCommand::Responder(args) => {
            let request = responder_request(args.answers, args.recuperacion)?;
            let calificacion = examenes.responder(args.id, &request).await?;
            render_calificacion(&calificacion, format)
        }
    }
}

fn responder_request(answers: Vec<AnswerArg>, recuperacion: Option<i64>) -> CliResult<ResponderRequest> {
    if answers.is_empty() {
        return Err(CliError::validation("at least one --answer is required"));
    }
    let mut seen = BTreeSet::new();
    for answer in &answers {
        if !seen.insert(answer.pregunta_id) {
            return Err(CliError::validation(format!(
                "question {} answered more than once",
                answer.pregunta_id
            )));
        }
    }
    Ok(ResponderRequest {
        respuestas: answers
            .into_iter()
            .map(|answer| Respuesta {
                pregunta_id: answer.pregunta_id,
                respuesta: answer.respuesta,
            })
            .collect(),
        recuperacion_id: recuperacion,
    })
}

pub(crate) async fn handle_recuperaciones(
    ctx: &AppContext,
    command: RecuperacionesCommand,
    format: OutputFormat,
) -> CliResult<()> {
    let recuperaciones = ctx.client.recuperaciones();
    match command {
        RecuperacionesCommand::Ls(args) => {
            let filter = RecuperacionFilter {
                examen: args.examen,
                inscripcion: args.inscripcion,
            };
            render_recuperaciones(&recuperaciones.list(&filter).await?, format)
        }
        RecuperacionesCommand::Contar(args) => {
            let conteo = recuperaciones
                .contar_por_inscripcion(args.inscripcion)
                .await?;
            render_conteo(&conteo, format)
        }
    }
}

pub(crate) async fn handle_calificaciones(
    ctx: &AppContext,
    command: CalificacionesCommand,
    format: OutputFormat,
) -> CliResult<()> {
    match command {
        CalificacionesCommand::Ls(args) => {
            let filter = ByExamen {
                examen: args.examen,
            };
            render_calificaciones(&ctx.client.calificaciones().list(&filter).await?, format)
        }
    }
}
