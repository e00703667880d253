//! Course catalog documents: cursos, promociones, temas, materiales,
//! inscripciones and asistencias.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Course definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Curso {
    /// Identifier.
    pub id: i64,
    /// Display name.
    pub nombre: String,
    /// Free-form description.
    #[serde(default)]
    pub descripcion: Option<String>,
    /// Whether the course is offered.
    #[serde(default = "default_true")]
    pub activo: bool,
    /// Creation timestamp.
    #[serde(default)]
    pub fecha_creacion: Option<DateTime<Utc>>,
    /// Last modification timestamp.
    #[serde(default)]
    pub fecha_actualizacion: Option<DateTime<Utc>>,
}

/// Body for creating or replacing a [`Curso`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CursoPayload {
    /// Display name.
    pub nombre: String,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    /// Whether the course is offered.
    pub activo: bool,
}

/// Scheduled offering (cohort) of a course.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Promocion {
    /// Identifier.
    pub id: i64,
    /// Owning course.
    pub curso: i64,
    /// Denormalised course name.
    #[serde(default)]
    pub curso_nombre: Option<String>,
    /// Display name.
    pub nombre: String,
    /// Free-form description.
    #[serde(default)]
    pub descripcion: Option<String>,
    /// First day of classes.
    pub fecha_inicio: NaiveDate,
    /// Last day of classes.
    #[serde(default)]
    pub fecha_fin: Option<NaiveDate>,
    /// Assigned instructor.
    #[serde(default)]
    pub docente: Option<i64>,
    /// Denormalised instructor name.
    #[serde(default)]
    pub docente_nombre: Option<String>,
    /// Whether the offering is running.
    #[serde(default = "default_true")]
    pub activa: bool,
}

/// Body for creating or replacing a [`Promocion`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PromocionPayload {
    /// Owning course.
    pub curso: i64,
    /// Display name.
    pub nombre: String,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    /// First day of classes.
    pub fecha_inicio: NaiveDate,
    /// Last day of classes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_fin: Option<NaiveDate>,
    /// Assigned instructor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docente: Option<i64>,
    /// Whether the offering is running.
    pub activa: bool,
}

/// Topic within a course. Detail responses embed its materials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tema {
    /// Identifier.
    pub id: i64,
    /// Owning course; omitted by the list serializer.
    #[serde(default)]
    pub curso: Option<i64>,
    /// Denormalised course name.
    #[serde(default)]
    pub curso_nombre: Option<String>,
    /// Position of the topic within the course.
    pub numero_tema: u32,
    /// Title.
    pub titulo: String,
    /// Free-form description.
    #[serde(default)]
    pub descripcion: Option<String>,
    /// Scheduled class date.
    #[serde(default)]
    pub fecha_clase: Option<NaiveDate>,
    /// Attached materials.
    #[serde(default)]
    pub materiales: Vec<Material>,
}

/// Body for creating or replacing a [`Tema`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemaPayload {
    /// Owning course.
    pub curso: i64,
    /// Position of the topic within the course.
    pub numero_tema: u32,
    /// Title.
    pub titulo: String,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    /// Scheduled class date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_clase: Option<NaiveDate>,
}

/// Learning material attached to a topic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Material {
    /// Identifier.
    pub id: i64,
    /// Owning topic.
    pub tema: i64,
    /// Title.
    pub titulo: String,
    /// Free-form description.
    #[serde(default)]
    pub descripcion: Option<String>,
    /// Storage URL of the uploaded file.
    #[serde(default)]
    pub archivo: Option<String>,
    /// Original file name, when the server exposes it.
    #[serde(default)]
    pub nombre_archivo: Option<String>,
    /// Upload timestamp.
    #[serde(default)]
    pub fecha_creacion: Option<DateTime<Utc>>,
}

/// Enrollment of a student in a promotion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Inscripcion {
    /// Identifier.
    pub id: i64,
    /// Enrolled student.
    pub alumno: i64,
    /// Denormalised student name.
    #[serde(default)]
    pub alumno_nombre: Option<String>,
    /// Promotion enrolled in.
    pub promocion: i64,
    /// Denormalised promotion name.
    #[serde(default)]
    pub promocion_nombre: Option<String>,
    /// Denormalised course name.
    #[serde(default)]
    pub curso_nombre: Option<String>,
    /// Enrollment timestamp.
    #[serde(default)]
    pub fecha_inscripcion: Option<DateTime<Utc>>,
    /// Whether the enrollment is active.
    #[serde(default = "default_true")]
    pub activa: bool,
}

/// Body for creating an [`Inscripcion`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InscripcionPayload {
    /// Student to enroll.
    pub alumno: i64,
    /// Target promotion.
    pub promocion: i64,
}

/// Partial update of an [`Inscripcion`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InscripcionPatch {
    /// New active flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activa: Option<bool>,
    /// Move the enrollment to another promotion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promocion: Option<i64>,
}

/// Attendance outcome for one class.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceKind {
    /// Attended on time.
    Presente,
    /// Attended late.
    Tarde,
    /// Attended with camera off.
    PresenteSinCamara,
    /// Absent.
    NoAsistio,
}

impl AttendanceKind {
    /// Wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Presente => "presente",
            Self::Tarde => "tarde",
            Self::PresenteSinCamara => "presente_sin_camara",
            Self::NoAsistio => "no_asistio",
        }
    }
}

impl std::fmt::Display for AttendanceKind {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Attendance record for an enrollment and a topic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Asistencia {
    /// Identifier.
    pub id: i64,
    /// Enrollment the record belongs to.
    pub inscripcion: i64,
    /// Denormalised student name.
    #[serde(default)]
    pub alumno_nombre: Option<String>,
    /// Topic (class) attended.
    pub tema: i64,
    /// Denormalised topic title.
    #[serde(default)]
    pub tema_titulo: Option<String>,
    /// Outcome.
    pub tipo_asistencia: AttendanceKind,
    /// Instructor notes.
    #[serde(default)]
    pub observaciones: Option<String>,
    /// Registration timestamp.
    #[serde(default)]
    pub fecha_registro: Option<DateTime<Utc>>,
}

/// Body for creating or replacing an [`Asistencia`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AsistenciaPayload {
    /// Enrollment the record belongs to.
    pub inscripcion: i64,
    /// Topic (class) attended.
    pub tema: i64,
    /// Outcome.
    pub tipo_asistencia: AttendanceKind,
    /// Instructor notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
}

const fn default_true() -> bool {
    true
}
