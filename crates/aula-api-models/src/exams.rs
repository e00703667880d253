//! Question banks, exams, exam sittings, recoveries and grades.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Question format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Options `a` through `d`.
    OpcionMultiple,
    /// Answered with `verdadero` or `falso`.
    VerdaderoFalso,
    /// Free text.
    Texto,
}

/// Question in a topic's bank.
///
/// `respuesta_correcta` is only present for instructors; exam sittings
/// deliver questions without it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pregunta {
    /// Identifier.
    pub id: i64,
    /// Owning topic.
    pub tema: i64,
    /// Prompt text.
    pub pregunta_texto: String,
    /// Format.
    pub tipo_pregunta: QuestionKind,
    /// Option `a`.
    #[serde(default)]
    pub opcion_a: Option<String>,
    /// Option `b`.
    #[serde(default)]
    pub opcion_b: Option<String>,
    /// Option `c`.
    #[serde(default)]
    pub opcion_c: Option<String>,
    /// Option `d`.
    #[serde(default)]
    pub opcion_d: Option<String>,
    /// Expected answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respuesta_correcta: Option<String>,
    /// Points awarded for a correct answer.
    #[serde(default = "default_points")]
    pub puntos: u32,
}

impl Pregunta {
    /// Labelled options that carry text, in display order.
    #[must_use]
    pub fn options(&self) -> Vec<(&'static str, &str)> {
        [
            ("a", &self.opcion_a),
            ("b", &self.opcion_b),
            ("c", &self.opcion_c),
            ("d", &self.opcion_d),
        ]
        .into_iter()
        .filter_map(|(label, text)| text.as_deref().map(|text| (label, text)))
        .collect()
    }
}

/// Body for creating or replacing a [`Pregunta`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreguntaPayload {
    /// Owning topic.
    pub tema: i64,
    /// Prompt text.
    pub pregunta_texto: String,
    /// Format.
    pub tipo_pregunta: QuestionKind,
    /// Option `a`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opcion_a: Option<String>,
    /// Option `b`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opcion_b: Option<String>,
    /// Option `c`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opcion_c: Option<String>,
    /// Option `d`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opcion_d: Option<String>,
    /// Expected answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respuesta_correcta: Option<String>,
    /// Points awarded for a correct answer.
    pub puntos: u32,
}

/// Exam attached to a topic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Examen {
    /// Identifier.
    pub id: i64,
    /// Owning topic; omitted by the list serializer.
    #[serde(default)]
    pub tema: Option<i64>,
    /// Denormalised topic title.
    #[serde(default)]
    pub tema_titulo: Option<String>,
    /// Denormalised course name.
    #[serde(default)]
    pub curso_nombre: Option<String>,
    /// Title.
    #[serde(default)]
    pub titulo: Option<String>,
    /// Free-form description.
    #[serde(default)]
    pub descripcion: Option<String>,
    /// Questions drawn per sitting.
    pub numero_preguntas: u32,
    /// Points per question.
    pub puntos_por_pregunta: u32,
    /// Maximum score.
    #[serde(default)]
    pub puntaje_total: Option<u32>,
    /// Time limit in minutes.
    #[serde(default)]
    pub tiempo_limite: Option<u32>,
    /// Opening time.
    #[serde(default)]
    pub fecha_inicio: Option<DateTime<Utc>>,
    /// Closing time.
    #[serde(default)]
    pub fecha_fin: Option<DateTime<Utc>>,
    /// Whether the exam can be taken.
    #[serde(default = "default_true")]
    pub activo: bool,
    /// Size of the topic's question bank.
    #[serde(default)]
    pub cantidad_preguntas_disponibles: Option<u32>,
}

/// Body for creating or replacing an [`Examen`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExamenPayload {
    /// Owning topic.
    pub tema: i64,
    /// Title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub titulo: Option<String>,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    /// Questions drawn per sitting.
    pub numero_preguntas: u32,
    /// Points per question.
    pub puntos_por_pregunta: u32,
    /// Time limit in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiempo_limite: Option<u32>,
    /// Opening time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_inicio: Option<DateTime<Utc>>,
    /// Closing time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_fin: Option<DateTime<Utc>>,
    /// Whether the exam can be taken.
    pub activo: bool,
}

/// Questions served to a student for one sitting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExamenPreguntas {
    /// Exam being taken.
    pub examen_id: i64,
    /// Recovery window the sitting belongs to, if any.
    #[serde(default)]
    pub recuperacion_id: Option<i64>,
    /// Drawn questions, without expected answers.
    pub preguntas: Vec<Pregunta>,
    /// Questions drawn.
    pub numero_preguntas: u32,
    /// Points per question.
    pub puntos_por_pregunta: u32,
    /// Maximum score.
    pub puntaje_total: u32,
    /// Time limit in minutes.
    #[serde(default)]
    pub tiempo_limite: Option<u32>,
}

/// Answer to one question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Respuesta {
    /// Question answered.
    pub pregunta_id: i64,
    /// Chosen option label or free text.
    pub respuesta: String,
}

/// Body of `POST /examenes/{id}/responder/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResponderRequest {
    /// Answers for the sitting.
    pub respuestas: Vec<Respuesta>,
    /// Recovery window being used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recuperacion_id: Option<i64>,
}

/// Retake window granted to an enrollment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recuperacion {
    /// Identifier.
    pub id: i64,
    /// Exam being retaken.
    pub examen: i64,
    /// Denormalised exam title.
    #[serde(default)]
    pub examen_titulo: Option<String>,
    /// Enrollment the window is granted to.
    pub inscripcion: i64,
    /// Denormalised student name.
    #[serde(default)]
    pub alumno_nombre: Option<String>,
    /// Ordinal of this retake for the enrollment.
    #[serde(default)]
    pub numero_recuperacion: Option<u32>,
    /// Window opening.
    pub fecha_inicio: DateTime<Utc>,
    /// Window closing.
    pub fecha_fin: DateTime<Utc>,
    /// Whether the window is enabled.
    #[serde(default = "default_true")]
    pub activa: bool,
    /// Whether the student already sat the retake.
    #[serde(default)]
    pub completada: bool,
}

/// Body for creating or replacing a [`Recuperacion`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecuperacionPayload {
    /// Exam being retaken.
    pub examen: i64,
    /// Enrollment the window is granted to.
    pub inscripcion: i64,
    /// Window opening.
    pub fecha_inicio: DateTime<Utc>,
    /// Window closing.
    pub fecha_fin: DateTime<Utc>,
    /// Whether the window is enabled.
    pub activa: bool,
}

/// Response of `GET /recuperaciones/contar_por_inscripcion/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConteoRecuperaciones {
    /// Enrollment counted; echoed back as a string by the server.
    #[serde(deserialize_with = "crate::decimal::i64_lenient")]
    pub inscripcion_id: i64,
    /// Number of retake windows granted.
    pub total_recuperaciones: u32,
}

/// Grade of one exam sitting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Calificacion {
    /// Identifier.
    pub id: i64,
    /// Exam graded.
    pub examen: i64,
    /// Denormalised exam title.
    #[serde(default)]
    pub examen_titulo: Option<String>,
    /// Enrollment graded.
    pub inscripcion: i64,
    /// Denormalised student name.
    #[serde(default)]
    pub alumno_nombre: Option<String>,
    /// Retake window, when the sitting was a retake.
    #[serde(default)]
    pub recuperacion: Option<i64>,
    /// Points obtained.
    #[serde(deserialize_with = "crate::decimal::f64_lenient")]
    pub puntaje_obtenido: f64,
    /// Maximum points.
    #[serde(deserialize_with = "crate::decimal::f64_lenient")]
    pub puntaje_total: f64,
    /// Score as a percentage.
    #[serde(deserialize_with = "crate::decimal::f64_lenient")]
    pub porcentaje: f64,
    /// Whether the grade passes.
    #[serde(default)]
    pub aprobado: bool,
    /// Whether the sitting was a retake.
    #[serde(default)]
    pub es_recuperacion: bool,
    /// Completion timestamp.
    #[serde(default)]
    pub fecha_completado: Option<DateTime<Utc>>,
}

const fn default_true() -> bool {
    true
}

const fn default_points() -> u32 {
    1
}
