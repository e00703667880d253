#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
//! Shared HTTP DTOs for the Aula course platform API.
//!
//! These types mirror the JSON documents exchanged with the REST API so the
//! client and the CLI encode requests and decode responses from a single
//! definition. Read-only denormalised fields (`curso_nombre`, `alumno_nombre`,
//! ...) are optional because list and detail serializers do not always emit
//! them.
//!
//! Layout:
//! - `auth.rs`: tokens, login/refresh payloads, user profile
//! - `list.rs`: bare-array vs paginated list normalisation
//! - `courses.rs`: cursos, promociones, temas, materiales, inscripciones, asistencias
//! - `exams.rs`: preguntas, exámenes, recuperaciones, calificaciones
//! - `outcomes.rs`: promedios and diplomas
//! - `users.rs`: admin user management payloads

mod auth;
mod courses;
mod decimal;
mod exams;
mod list;
mod outcomes;
mod users;

pub use auth::{
    AccessGrant, ChangePasswordRequest, LoginRequest, MessageResponse, ProfileUpdate,
    RefreshRequest, TokenPair, UserProfile, UserRole,
};
pub use courses::{
    Asistencia, AsistenciaPayload, AttendanceKind, Curso, CursoPayload, Inscripcion,
    InscripcionPatch, InscripcionPayload, Material, Promocion, PromocionPayload, Tema,
    TemaPayload,
};
pub use exams::{
    Calificacion, ConteoRecuperaciones, Examen, ExamenPayload, ExamenPreguntas, Pregunta,
    PreguntaPayload, QuestionKind, Recuperacion, RecuperacionPayload, ResponderRequest,
    Respuesta,
};
pub use list::{ListResponse, Page};
pub use outcomes::{
    Diploma, DiplomaEmitido, DiplomasGenerados, Promedio, PromocionRequest,
};
pub use users::{NuevoUsuario, Usuario, UsuarioCreado};
