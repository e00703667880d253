//! Output renderers and formatting helpers for CLI commands.

use anyhow::anyhow;
use aula_api_models::{
    Calificacion, ConteoRecuperaciones, Curso, Diploma, DiplomasGenerados, Examen,
    ExamenPreguntas, Inscripcion, Material, MessageResponse, Promedio, Promocion, Recuperacion,
    Tema, UserProfile, UsuarioCreado,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

/// Locally known session state, as reported by `aula status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct SessionStatus {
    pub(crate) state: &'static str,
    pub(crate) username: Option<String>,
    pub(crate) role: Option<&'static str>,
    pub(crate) must_change_password: bool,
    pub(crate) session_file: Option<String>,
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

/// Print `value` as JSON, or as the rows produced by `table`.
fn render_with<T, F>(value: &T, format: OutputFormat, table: F) -> CliResult<()>
where
    T: Serialize + ?Sized,
    F: FnOnce(&T),
{
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => {
            table(value);
            Ok(())
        }
    }
}

pub(crate) fn render_profile(profile: &UserProfile, format: OutputFormat) -> CliResult<()> {
    render_with(profile, format, |profile| {
        println!("id: {}", profile.id);
        println!("username: {}", profile.username);
        println!("name: {}", profile.display_name());
        println!("email: {}", or_dash(Some(profile.email.as_str())));
        println!("role: {}", profile.tipo);
        if let Some(telefono) = &profile.telefono {
            println!("telefono: {telefono}");
        }
        if let Some(fecha) = profile.fecha_nacimiento {
            println!("fecha_nacimiento: {fecha}");
        }
        if let Some(direccion) = &profile.direccion {
            println!("direccion: {direccion}");
        }
        if profile.debe_cambiar_password {
            println!("password change required: run `aula passwd`");
        }
    })
}

pub(crate) fn render_session_status(status: &SessionStatus, format: OutputFormat) -> CliResult<()> {
    render_with(status, format, |status| {
        println!("state: {}", status.state);
        if let Some(username) = &status.username {
            println!("user: {username} ({})", status.role.unwrap_or("-"));
        }
        if status.must_change_password {
            println!("password change required: run `aula passwd`");
        }
        if let Some(path) = &status.session_file {
            println!("session file: {path}");
        }
    })
}

pub(crate) fn render_cursos(cursos: &[Curso], format: OutputFormat) -> CliResult<()> {
    render_with(cursos, format, |cursos| {
        println!("{:>5} {:<6} NOMBRE", "ID", "ACTIVO");
        for curso in cursos {
            println!("{:>5} {:<6} {}", curso.id, yes_no(curso.activo), curso.nombre);
        }
    })
}

pub(crate) fn render_curso(curso: &Curso, format: OutputFormat) -> CliResult<()> {
    render_with(curso, format, |curso| {
        println!("id: {}", curso.id);
        println!("nombre: {}", curso.nombre);
        println!("descripcion: {}", or_dash(curso.descripcion.as_deref()));
        println!("activo: {}", yes_no(curso.activo));
        println!("creado: {}", format_timestamp(curso.fecha_creacion));
    })
}

pub(crate) fn render_promociones(promociones: &[Promocion], format: OutputFormat) -> CliResult<()> {
    render_with(promociones, format, |promociones| {
        println!(
            "{:>5} {:<24} {:<10} {:<10} {:<20} NOMBRE",
            "ID", "CURSO", "INICIO", "FIN", "DOCENTE"
        );
        for promocion in promociones {
            let fin = promocion
                .fecha_fin
                .map_or_else(|| "-".to_string(), |date| date.to_string());
            println!(
                "{:>5} {:<24} {:<10} {:<10} {:<20} {}",
                promocion.id,
                truncate(promocion.curso_nombre.as_deref().unwrap_or("-"), 24),
                promocion.fecha_inicio,
                fin,
                truncate(promocion.docente_nombre.as_deref().unwrap_or("-"), 20),
                promocion.nombre
            );
        }
    })
}

pub(crate) fn render_promocion(promocion: &Promocion, format: OutputFormat) -> CliResult<()> {
    render_with(promocion, format, |promocion| {
        println!("id: {}", promocion.id);
        println!("nombre: {}", promocion.nombre);
        println!(
            "curso: {} ({})",
            or_dash(promocion.curso_nombre.as_deref()),
            promocion.curso
        );
        println!("inicio: {}", promocion.fecha_inicio);
        if let Some(fin) = promocion.fecha_fin {
            println!("fin: {fin}");
        }
        println!("docente: {}", or_dash(promocion.docente_nombre.as_deref()));
        println!("activa: {}", yes_no(promocion.activa));
    })
}

pub(crate) fn render_temas(temas: &[Tema], format: OutputFormat) -> CliResult<()> {
    render_with(temas, format, |temas| {
        println!("{:>5} {:>3} {:<10} {:>4} TITULO", "ID", "N", "CLASE", "MAT");
        for tema in temas {
            let clase = tema
                .fecha_clase
                .map_or_else(|| "-".to_string(), |date| date.to_string());
            println!(
                "{:>5} {:>3} {:<10} {:>4} {}",
                tema.id,
                tema.numero_tema,
                clase,
                tema.materiales.len(),
                tema.titulo
            );
        }
    })
}

pub(crate) fn render_materiales(materiales: &[Material], format: OutputFormat) -> CliResult<()> {
    render_with(materiales, format, |materiales| {
        println!("{:>5} {:>5} {:<32} TITULO", "ID", "TEMA", "ARCHIVO");
        for material in materiales {
            println!(
                "{:>5} {:>5} {:<32} {}",
                material.id,
                material.tema,
                truncate(material.nombre_archivo.as_deref().unwrap_or("-"), 32),
                material.titulo
            );
        }
    })
}

pub(crate) fn render_material(material: &Material, format: OutputFormat) -> CliResult<()> {
    render_with(material, format, |material| {
        println!("id: {}", material.id);
        println!("tema: {}", material.tema);
        println!("titulo: {}", material.titulo);
        if let Some(nombre) = &material.nombre_archivo {
            println!("archivo: {nombre}");
        }
    })
}

pub(crate) fn render_inscripciones(
    inscripciones: &[Inscripcion],
    format: OutputFormat,
) -> CliResult<()> {
    render_with(inscripciones, format, |inscripciones| {
        println!("{:>5} {:>6} {:<6} {:<28} PROMOCION", "ID", "ALUMNO", "ACTIVA", "NOMBRE");
        for inscripcion in inscripciones {
            println!(
                "{:>5} {:>6} {:<6} {:<28} {}",
                inscripcion.id,
                inscripcion.alumno,
                yes_no(inscripcion.activa),
                truncate(inscripcion.alumno_nombre.as_deref().unwrap_or("-"), 28),
                inscripcion
                    .promocion_nombre
                    .clone()
                    .unwrap_or_else(|| inscripcion.promocion.to_string())
            );
        }
    })
}

pub(crate) fn render_examenes(examenes: &[Examen], format: OutputFormat) -> CliResult<()> {
    render_with(examenes, format, |examenes| {
        println!("{:>5} {:>5} {:>5} {:>6} {:<6} TITULO", "ID", "TEMA", "PREG", "LIMITE", "ACTIVO");
        for examen in examenes {
            let limite = examen
                .tiempo_limite
                .map_or_else(|| "-".to_string(), |minutes| format!("{minutes}m"));
            let titulo = examen
                .titulo
                .as_deref()
                .or(examen.tema_titulo.as_deref())
                .unwrap_or("<sin titulo>");
            println!(
                "{:>5} {:>5} {:>5} {:>6} {:<6} {}",
                examen.id,
                examen
                    .tema
                    .map_or_else(|| "-".to_string(), |tema| tema.to_string()),
                examen.numero_preguntas,
                limite,
                yes_no(examen.activo),
                titulo
            );
        }
    })
}

pub(crate) fn render_exam_sitting(sitting: &ExamenPreguntas, format: OutputFormat) -> CliResult<()> {
    render_with(sitting, format, |sitting| {
        let mut header = format!(
            "examen {}: {} preguntas, {} puntos",
            sitting.examen_id, sitting.numero_preguntas, sitting.puntaje_total
        );
        if let Some(limite) = sitting.tiempo_limite {
            header.push_str(&format!(", {limite} minutos"));
        }
        if let Some(recuperacion) = sitting.recuperacion_id {
            header.push_str(&format!(" (recuperacion {recuperacion})"));
        }
        println!("{header}");
        for (position, pregunta) in sitting.preguntas.iter().enumerate() {
            println!();
            println!("{}. [{}] {}", position + 1, pregunta.id, pregunta.pregunta_texto);
            for (label, text) in pregunta.options() {
                println!("   {label}) {text}");
            }
        }
    })
}

pub(crate) fn render_calificacion(calificacion: &Calificacion, format: OutputFormat) -> CliResult<()> {
    render_with(calificacion, format, |calificacion| {
        println!(
            "puntaje: {} / {}",
            format_score(calificacion.puntaje_obtenido),
            format_score(calificacion.puntaje_total)
        );
        println!("porcentaje: {}", format_percent(calificacion.porcentaje));
        println!(
            "resultado: {}",
            if calificacion.aprobado { "aprobado" } else { "reprobado" }
        );
    })
}

pub(crate) fn render_calificaciones(
    calificaciones: &[Calificacion],
    format: OutputFormat,
) -> CliResult<()> {
    render_with(calificaciones, format, |calificaciones| {
        println!(
            "{:>5} {:>6} {:>5} {:>7} {:<8} {:<4} ALUMNO",
            "ID", "EXAMEN", "INSC", "PORC", "APROBADO", "REC"
        );
        for calificacion in calificaciones {
            println!(
                "{:>5} {:>6} {:>5} {:>7} {:<8} {:<4} {}",
                calificacion.id,
                calificacion.examen,
                calificacion.inscripcion,
                format_percent(calificacion.porcentaje),
                yes_no(calificacion.aprobado),
                yes_no(calificacion.es_recuperacion),
                or_dash(calificacion.alumno_nombre.as_deref())
            );
        }
    })
}

pub(crate) fn render_recuperaciones(
    recuperaciones: &[Recuperacion],
    format: OutputFormat,
) -> CliResult<()> {
    render_with(recuperaciones, format, |recuperaciones| {
        println!(
            "{:>5} {:>6} {:>5} {:>3} {:<16} {:<16} ESTADO",
            "ID", "EXAMEN", "INSC", "N", "INICIO", "FIN"
        );
        for recuperacion in recuperaciones {
            let estado = if recuperacion.completada {
                "completada"
            } else if recuperacion.activa {
                "activa"
            } else {
                "inactiva"
            };
            println!(
                "{:>5} {:>6} {:>5} {:>3} {:<16} {:<16} {}",
                recuperacion.id,
                recuperacion.examen,
                recuperacion.inscripcion,
                recuperacion
                    .numero_recuperacion
                    .map_or_else(|| "-".to_string(), |n| n.to_string()),
                format_timestamp(Some(recuperacion.fecha_inicio)),
                format_timestamp(Some(recuperacion.fecha_fin)),
                estado
            );
        }
    })
}

pub(crate) fn render_conteo(conteo: &ConteoRecuperaciones, format: OutputFormat) -> CliResult<()> {
    render_with(conteo, format, |conteo| {
        println!(
            "inscripcion {}: {} recuperaciones",
            conteo.inscripcion_id, conteo.total_recuperaciones
        );
    })
}

pub(crate) fn render_promedios(promedios: &[Promedio], format: OutputFormat) -> CliResult<()> {
    render_with(promedios, format, |promedios| {
        println!("{:>5} {:>5} {:>8} {:<8} ALUMNO", "ID", "INSC", "PROMEDIO", "APROBADO");
        for promedio in promedios {
            println!(
                "{:>5} {:>5} {:>8} {:<8} {}",
                promedio.id,
                promedio.inscripcion,
                format_score(promedio.promedio_final),
                yes_no(promedio.aprobado),
                or_dash(promedio.alumno_nombre.as_deref())
            );
        }
    })
}

pub(crate) fn render_diplomas(diplomas: &[Diploma], format: OutputFormat) -> CliResult<()> {
    render_with(diplomas, format, |diplomas| {
        println!("{:>5} {:<20} {:<16} ALUMNO", "ID", "CODIGO", "EMISION");
        for diploma in diplomas {
            println!(
                "{:>5} {:<20} {:<16} {}",
                diploma.id,
                diploma.codigo_diploma,
                format_timestamp(diploma.fecha_emision),
                or_dash(diploma.alumno_nombre.as_deref())
            );
        }
    })
}

pub(crate) fn render_diplomas_generados(
    generados: &DiplomasGenerados,
    format: OutputFormat,
) -> CliResult<()> {
    render_with(generados, format, |generados| {
        println!("{}", generados.mensaje);
        for diploma in &generados.diplomas {
            println!("  {} {}", diploma.codigo, diploma.alumno);
        }
    })
}

pub(crate) fn render_usuarios(usuarios: &[UserProfile], format: OutputFormat) -> CliResult<()> {
    render_with(usuarios, format, |usuarios| {
        println!("{:>5} {:<16} {:<8} {:<6} NOMBRE", "ID", "USERNAME", "TIPO", "ACTIVO");
        for usuario in usuarios {
            println!(
                "{:>5} {:<16} {:<8} {:<6} {}",
                usuario.id,
                truncate(&usuario.username, 16),
                usuario.tipo,
                yes_no(usuario.activo),
                usuario.display_name()
            );
        }
    })
}

pub(crate) fn render_usuario_creado(creado: &UsuarioCreado, format: OutputFormat) -> CliResult<()> {
    render_with(creado, format, |creado| {
        if let Some(mensaje) = &creado.mensaje {
            println!("{mensaje}");
        }
        println!("id: {}", creado.usuario.id);
        println!("username: {}", creado.usuario.username);
        println!("role: {}", creado.usuario.tipo);
        if let Some(password) = &creado.password_generada {
            println!("generated password: {password}");
        }
    })
}

pub(crate) fn render_message(message: &MessageResponse, format: OutputFormat) -> CliResult<()> {
    render_with(message, format, |message| println!("{}", message.mensaje))
}

pub(crate) const fn yes_no(value: bool) -> &'static str {
    if value { "si" } else { "no" }
}

pub(crate) fn or_dash(value: Option<&str>) -> &str {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => text,
        _ => "-",
    }
}

pub(crate) fn format_score(value: f64) -> String {
    format!("{value:.2}")
}

pub(crate) fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}

pub(crate) fn format_timestamp(value: Option<DateTime<Utc>>) -> String {
    value.map_or_else(
        || "-".to_string(),
        |timestamp| timestamp.format("%Y-%m-%d %H:%M").to_string(),
    )
}

/// Shorten `text` to `width` characters, marking the cut with `~`.
pub(crate) fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut shortened: String = text.chars().take(width.saturating_sub(1)).collect();
    shortened.push('~');
    shortened
}
