//! Question bank, exams, retake windows and grades.

use aula_api_models::{
    Calificacion, ConteoRecuperaciones, Examen, ExamenPayload, ExamenPreguntas, Pregunta,
    PreguntaPayload, Recuperacion, RecuperacionPayload, ResponderRequest,
};
use reqwest::Method;

use super::{
    ByExamen, ByTema, Collection, Creatable, Deletable, RecuperacionFilter, Resource, Updatable,
    UpdateVerb, collection_action_path, detail_action_path,
};
use crate::error::Result;
use crate::transport::AulaClient;

/// `/preguntas/`
#[derive(Debug, Clone, Copy)]
pub struct Preguntas;

impl Resource for Preguntas {
    const PATH: &'static str = "/preguntas/";
    type Item = Pregunta;
    type Filter = ByTema;
}

impl Creatable for Preguntas {
    type Payload = PreguntaPayload;
    type Created = Pregunta;
}

impl Updatable for Preguntas {
    type Patch = PreguntaPayload;
    const VERB: UpdateVerb = UpdateVerb::Put;
}

impl Deletable for Preguntas {}

/// `/examenes/`
#[derive(Debug, Clone, Copy)]
pub struct Examenes;

impl Resource for Examenes {
    const PATH: &'static str = "/examenes/";
    type Item = Examen;
    type Filter = ByTema;
}

impl Creatable for Examenes {
    type Payload = ExamenPayload;
    type Created = Examen;
}

impl Updatable for Examenes {
    type Patch = ExamenPayload;
    const VERB: UpdateVerb = UpdateVerb::Put;
}

impl Deletable for Examenes {}

/// `/recuperaciones/`
#[derive(Debug, Clone, Copy)]
pub struct Recuperaciones;

impl Resource for Recuperaciones {
    const PATH: &'static str = "/recuperaciones/";
    type Item = Recuperacion;
    type Filter = RecuperacionFilter;
}

impl Creatable for Recuperaciones {
    type Payload = RecuperacionPayload;
    type Created = Recuperacion;
}

impl Updatable for Recuperaciones {
    type Patch = RecuperacionPayload;
    const VERB: UpdateVerb = UpdateVerb::Put;
}

impl Deletable for Recuperaciones {}

/// `/calificaciones/`, read-only.
#[derive(Debug, Clone, Copy)]
pub struct Calificaciones;

impl Resource for Calificaciones {
    const PATH: &'static str = "/calificaciones/";
    type Item = Calificacion;
    type Filter = ByExamen;
}

impl Collection<'_, Examenes> {
    /// Draw the questions for a sitting, optionally inside a retake window.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError::Api`] when the exam is closed, already
    /// taken, or the retake window is not usable.
    pub async fn preguntas(&self, id: i64, recuperacion_id: Option<i64>) -> Result<ExamenPreguntas> {
        let query = recuperacion_id
            .map(|recuperacion| vec![("recuperacion_id".to_string(), recuperacion.to_string())])
            .unwrap_or_default();
        self.client
            .get_json(&detail_action_path::<Examenes>(id, "preguntas"), query)
            .await
    }

    /// Submit answers and receive the grade.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError::Api`] when the submission is rejected.
    pub async fn responder(&self, id: i64, request: &ResponderRequest) -> Result<Calificacion> {
        self.client
            .send_json(
                Method::POST,
                &detail_action_path::<Examenes>(id, "responder"),
                request,
            )
            .await
    }
}

impl Collection<'_, Recuperaciones> {
    /// Count retake windows granted to an enrollment.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError`] when the request fails.
    pub async fn contar_por_inscripcion(&self, inscripcion_id: i64) -> Result<ConteoRecuperaciones> {
        self.client
            .get_json(
                &collection_action_path::<Recuperaciones>("contar_por_inscripcion"),
                vec![("inscripcion_id".to_string(), inscripcion_id.to_string())],
            )
            .await
    }
}

impl AulaClient {
    /// Question bank.
    #[must_use]
    pub const fn preguntas(&self) -> Collection<'_, Preguntas> {
        Collection::new(self)
    }

    /// Exams.
    #[must_use]
    pub const fn examenes(&self) -> Collection<'_, Examenes> {
        Collection::new(self)
    }

    /// Retake windows.
    #[must_use]
    pub const fn recuperaciones(&self) -> Collection<'_, Recuperaciones> {
        Collection::new(self)
    }

    /// Grades.
    #[must_use]
    pub const fn calificaciones(&self) -> Collection<'_, Calificaciones> {
        Collection::new(self)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use aula_api_models::{QuestionKind, Respuesta};
    use aula_test_support::mocks::api_base;
    use httpmock::prelude::*;
    use serde_json::json;
    use url::Url;

    use super::*;
    use crate::config::ClientConfig;
    use crate::session::SessionContext;
    use crate::store::{ACCESS_TOKEN_KEY, MemoryStore, SessionStore};

    fn client(server: &MockServer) -> Result<AulaClient> {
        let store = Arc::new(MemoryStore::new());
        store.set(ACCESS_TOKEN_KEY, "tok".to_string())?;
        Ok(
            AulaClient::builder(ClientConfig::new(Url::parse(&api_base(server))?))
                .session(SessionContext::from_shared(store))
                .build()?,
        )
    }

    #[tokio::test]
    async fn sitting_draws_questions_then_submits_answers() -> Result<()> {
        let server = MockServer::start_async().await;
        let draw = server.mock(|when, then| {
            when.method(GET)
                .path("/api/examenes/4/preguntas/")
                .query_param("recuperacion_id", "2");
            then.status(200).json_body(json!({
                "examen_id": 4,
                "recuperacion_id": 2,
                "preguntas": [{
                    "id": 31,
                    "tema": 1,
                    "pregunta_texto": "¿Quién escribió Romanos?",
                    "tipo_pregunta": "opcion_multiple",
                    "opcion_a": "Pablo",
                    "opcion_b": "Pedro",
                    "opcion_c": null,
                    "opcion_d": null,
                    "puntos": 1
                }],
                "numero_preguntas": 1,
                "puntos_por_pregunta": 5,
                "puntaje_total": 5,
                "tiempo_limite": 30
            }));
        });
        let submit = server.mock(|when, then| {
            when.method(POST)
                .path("/api/examenes/4/responder/")
                .json_body(json!({
                    "respuestas": [{"pregunta_id": 31, "respuesta": "a"}],
                    "recuperacion_id": 2
                }));
            then.status(201).json_body(json!({
                "id": 90,
                "examen": 4,
                "inscripcion": 12,
                "recuperacion": 2,
                "puntaje_obtenido": "5.00",
                "puntaje_total": "5.00",
                "porcentaje": "100.00",
                "aprobado": true,
                "es_recuperacion": true
            }));
        });
        let client = client(&server)?;

        let sitting = client.examenes().preguntas(4, Some(2)).await?;
        let grade = client
            .examenes()
            .responder(
                sitting.examen_id,
                &ResponderRequest {
                    respuestas: vec![Respuesta {
                        pregunta_id: sitting.preguntas[0].id,
                        respuesta: "a".into(),
                    }],
                    recuperacion_id: sitting.recuperacion_id,
                },
            )
            .await?;

        draw.assert();
        submit.assert();
        assert_eq!(sitting.puntaje_total, 5);
        assert!(sitting.preguntas[0].respuesta_correcta.is_none());
        assert!(grade.aprobado);
        assert!((grade.porcentaje - 100.0).abs() < f64::EPSILON);
        Ok(())
    }

    #[tokio::test]
    async fn closed_exam_reports_the_server_reason() -> Result<()> {
        let server = MockServer::start_async().await;
        let _closed = server.mock(|when, then| {
            when.method(GET).path("/api/examenes/4/preguntas/");
            then.status(400)
                .json_body(json!({"error": "Ya has completado este examen"}));
        });
        let client = client(&server)?;

        let err = client
            .examenes()
            .preguntas(4, None)
            .await
            .expect_err("already taken");

        assert_eq!(err.to_string(), "Ya has completado este examen");
        Ok(())
    }

    #[tokio::test]
    async fn retakes_are_counted_and_filtered() -> Result<()> {
        let server = MockServer::start_async().await;
        let count = server.mock(|when, then| {
            when.method(GET)
                .path("/api/recuperaciones/contar_por_inscripcion/")
                .query_param("inscripcion_id", "12");
            then.status(200)
                .json_body(json!({"inscripcion_id": "12", "total_recuperaciones": 2}));
        });
        let listed = server.mock(|when, then| {
            when.method(GET)
                .path("/api/recuperaciones/")
                .query_param("examen", "4")
                .query_param("inscripcion", "12");
            then.status(200).json_body(json!([]));
        });
        let graded = server.mock(|when, then| {
            when.method(GET)
                .path("/api/calificaciones/")
                .query_param("examen", "4");
            then.status(200)
                .json_body(json!({"count": 0, "next": null, "previous": null, "results": []}));
        });
        let client = client(&server)?;

        let conteo = client.recuperaciones().contar_por_inscripcion(12).await?;
        let ventanas = client
            .recuperaciones()
            .list(&RecuperacionFilter {
                examen: Some(4),
                inscripcion: Some(12),
            })
            .await?;
        let notas = client.calificaciones().list(&ByExamen::examen(4)).await?;

        count.assert();
        listed.assert();
        graded.assert();
        assert_eq!(conteo.inscripcion_id, 12);
        assert_eq!(conteo.total_recuperaciones, 2);
        assert!(ventanas.is_empty());
        assert!(notas.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn question_bank_round_trips_through_the_collection() -> Result<()> {
        let server = MockServer::start_async().await;
        let created = server.mock(|when, then| {
            when.method(POST).path("/api/preguntas/").json_body(json!({
                "tema": 10,
                "pregunta_texto": "Pablo escribió Romanos",
                "tipo_pregunta": "verdadero_falso",
                "respuesta_correcta": "verdadero",
                "puntos": 5
            }));
            then.status(201).json_body(json!({
                "id": 77,
                "tema": 10,
                "pregunta_texto": "Pablo escribió Romanos",
                "tipo_pregunta": "verdadero_falso",
                "respuesta_correcta": "verdadero",
                "puntos": 5
            }));
        });
        let listed = server.mock(|when, then| {
            when.method(GET)
                .path("/api/preguntas/")
                .query_param("tema", "10");
            then.status(200).json_body(json!([{
                "id": 77,
                "tema": 10,
                "pregunta_texto": "Pablo escribió Romanos",
                "tipo_pregunta": "verdadero_falso"
            }]));
        });
        let removed = server.mock(|when, then| {
            when.method(DELETE).path("/api/preguntas/77/");
            then.status(204);
        });
        let client = client(&server)?;
        let preguntas = client.preguntas();

        let pregunta = preguntas
            .create(&PreguntaPayload {
                tema: 10,
                pregunta_texto: "Pablo escribió Romanos".to_string(),
                tipo_pregunta: QuestionKind::VerdaderoFalso,
                opcion_a: None,
                opcion_b: None,
                opcion_c: None,
                opcion_d: None,
                respuesta_correcta: Some("verdadero".to_string()),
                puntos: 5,
            })
            .await?;
        let banco = preguntas.list(&ByTema::tema(10)).await?;
        preguntas.delete(pregunta.id).await?;

        created.assert();
        listed.assert();
        removed.assert();
        assert_eq!(pregunta.respuesta_correcta.as_deref(), Some("verdadero"));
        assert!(banco[0].options().is_empty());
        assert!(banco[0].respuesta_correcta.is_none());
        Ok(())
    }
}
