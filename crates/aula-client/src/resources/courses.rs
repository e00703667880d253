//! Courses, promotions, topics, materials, enrollments and attendance.

use aula_api_models::{
    Asistencia, AsistenciaPayload, Curso, CursoPayload, Inscripcion, InscripcionPatch,
    InscripcionPayload, Material, Promocion, PromocionPayload, Tema, TemaPayload,
};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderMap, HeaderName};
use tracing::debug;

use super::{
    ByCurso, ByPromocion, ByTema, Collection, Creatable, Deletable, NoFilter, Resource,
    Updatable, UpdateVerb, item_path,
};
use crate::download::{DEFAULT_CONTENT_TYPE, Download, resolve_filename};
use crate::envelope::{MultipartField, UploadFile};
use crate::error::{ClientError, Result};
use crate::transport::AulaClient;

/// `/cursos/`
#[derive(Debug, Clone, Copy)]
pub struct Cursos;

impl Resource for Cursos {
    const PATH: &'static str = "/cursos/";
    type Item = Curso;
    type Filter = NoFilter;
}

impl Creatable for Cursos {
    type Payload = CursoPayload;
    type Created = Curso;
}

impl Updatable for Cursos {
    type Patch = CursoPayload;
    const VERB: UpdateVerb = UpdateVerb::Put;
}

impl Deletable for Cursos {}

/// `/promociones/`
#[derive(Debug, Clone, Copy)]
pub struct Promociones;

impl Resource for Promociones {
    const PATH: &'static str = "/promociones/";
    type Item = Promocion;
    type Filter = ByCurso;
}

impl Creatable for Promociones {
    type Payload = PromocionPayload;
    type Created = Promocion;
}

impl Updatable for Promociones {
    type Patch = PromocionPayload;
    const VERB: UpdateVerb = UpdateVerb::Put;
}

impl Deletable for Promociones {}

/// `/temas/`
#[derive(Debug, Clone, Copy)]
pub struct Temas;

impl Resource for Temas {
    const PATH: &'static str = "/temas/";
    type Item = Tema;
    type Filter = ByPromocion;
}

impl Creatable for Temas {
    type Payload = TemaPayload;
    type Created = Tema;
}

impl Updatable for Temas {
    type Patch = TemaPayload;
    const VERB: UpdateVerb = UpdateVerb::Put;
}

impl Deletable for Temas {}

/// `/materiales/`; creation is a multipart upload.
#[derive(Debug, Clone, Copy)]
pub struct Materiales;

impl Resource for Materiales {
    const PATH: &'static str = "/materiales/";
    type Item = Material;
    type Filter = ByTema;
}

impl Deletable for Materiales {}

/// `/inscripciones/`; updates are partial.
#[derive(Debug, Clone, Copy)]
pub struct Inscripciones;

impl Resource for Inscripciones {
    const PATH: &'static str = "/inscripciones/";
    type Item = Inscripcion;
    type Filter = ByPromocion;
}

impl Creatable for Inscripciones {
    type Payload = InscripcionPayload;
    type Created = Inscripcion;
}

impl Updatable for Inscripciones {
    type Patch = InscripcionPatch;
    const VERB: UpdateVerb = UpdateVerb::Patch;
}

/// `/asistencias/`
#[derive(Debug, Clone, Copy)]
pub struct Asistencias;

impl Resource for Asistencias {
    const PATH: &'static str = "/asistencias/";
    type Item = Asistencia;
    type Filter = ByTema;
}

impl Creatable for Asistencias {
    type Payload = AsistenciaPayload;
    type Created = Asistencia;
}

impl Updatable for Asistencias {
    type Patch = AsistenciaPayload;
    const VERB: UpdateVerb = UpdateVerb::Put;
}

impl Deletable for Asistencias {}

/// New material upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialUpload {
    /// Owning topic.
    pub tema: i64,
    /// Title.
    pub titulo: String,
    /// Optional description.
    pub descripcion: Option<String>,
    /// File content.
    pub archivo: UploadFile,
}

impl MaterialUpload {
    fn into_fields(self) -> Vec<MultipartField> {
        let mut fields = vec![
            MultipartField::Text {
                name: "tema",
                value: self.tema.to_string(),
            },
            MultipartField::Text {
                name: "titulo",
                value: self.titulo,
            },
        ];
        if let Some(descripcion) = self.descripcion.filter(|text| !text.trim().is_empty()) {
            fields.push(MultipartField::Text {
                name: "descripcion",
                value: descripcion,
            });
        }
        fields.push(MultipartField::File {
            name: "archivo",
            file: self.archivo,
        });
        fields
    }
}

impl Collection<'_, Materiales> {
    /// Upload a material as a multipart form.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] when the server rejects the upload.
    pub async fn upload(&self, upload: MaterialUpload) -> Result<Material> {
        self.client
            .send_multipart(Materiales::PATH, upload.into_fields())
            .await
    }

    /// Download the file behind a material.
    ///
    /// `known` is the material document when the caller already has it; its
    /// `nombre_archivo` and title take part in file name resolution.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the request fails or the body cannot be
    /// read.
    pub async fn download(&self, id: i64, known: Option<&Material>) -> Result<Download> {
        let path = item_path::<Materiales>(id);
        let response = self
            .client
            .fetch_binary(&path, vec![("download".to_string(), "true".to_string())])
            .await?;
        let disposition = header_text(response.headers(), &CONTENT_DISPOSITION);
        let content_type = header_text(response.headers(), &CONTENT_TYPE)
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
        let bytes = response
            .bytes()
            .await
            .map_err(|source| ClientError::Transport {
                operation: format!("GET {path}"),
                source,
            })?;

        let file_name = resolve_filename(
            known.and_then(|material| material.nombre_archivo.as_deref()),
            disposition.as_deref(),
            known.map(|material| material.titulo.as_str()),
        );
        debug!(material = id, file = %file_name, size = bytes.len(), "material downloaded");
        Ok(Download {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}

fn header_text(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
}

impl AulaClient {
    /// Course catalog.
    #[must_use]
    pub const fn cursos(&self) -> Collection<'_, Cursos> {
        Collection::new(self)
    }

    /// Course editions.
    #[must_use]
    pub const fn promociones(&self) -> Collection<'_, Promociones> {
        Collection::new(self)
    }

    /// Topics.
    #[must_use]
    pub const fn temas(&self) -> Collection<'_, Temas> {
        Collection::new(self)
    }

    /// Materials.
    #[must_use]
    pub const fn materiales(&self) -> Collection<'_, Materiales> {
        Collection::new(self)
    }

    /// Enrollments.
    #[must_use]
    pub const fn inscripciones(&self) -> Collection<'_, Inscripciones> {
        Collection::new(self)
    }

    /// Attendance records.
    #[must_use]
    pub const fn asistencias(&self) -> Collection<'_, Asistencias> {
        Collection::new(self)
    }
}
