//! Final averages and diplomas.

use aula_api_models::{Diploma, DiplomasGenerados, MessageResponse, Promedio, PromocionRequest};
use reqwest::Method;
use tracing::info;

use super::{ByPromocion, Collection, NoFilter, Resource, collection_action_path};
use crate::error::Result;
use crate::transport::AulaClient;

/// `/promedios/`
#[derive(Debug, Clone, Copy)]
pub struct Promedios;

impl Resource for Promedios {
    const PATH: &'static str = "/promedios/";
    type Item = Promedio;
    type Filter = ByPromocion;
}

/// `/diplomas/`
#[derive(Debug, Clone, Copy)]
pub struct Diplomas;

impl Resource for Diplomas {
    const PATH: &'static str = "/diplomas/";
    type Item = Diploma;
    type Filter = NoFilter;
}

impl Collection<'_, Promedios> {
    /// Recompute the final averages of every enrollment in a promotion.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError::Api`] when the promotion is unknown or
    /// the caller is not an instructor.
    pub async fn calcular(&self, promocion_id: i64) -> Result<MessageResponse> {
        let response: MessageResponse = self
            .client
            .send_json(
                Method::POST,
                &collection_action_path::<Promedios>("calcular_promedios"),
                &PromocionRequest { promocion_id },
            )
            .await?;
        info!(promocion = promocion_id, "averages recalculated");
        Ok(response)
    }
}

impl Collection<'_, Diplomas> {
    /// Issue diplomas for every passing enrollment of a promotion.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError::Api`] when the promotion is unknown or
    /// the caller is not an instructor.
    pub async fn generar(&self, promocion_id: i64) -> Result<DiplomasGenerados> {
        let response: DiplomasGenerados = self
            .client
            .send_json(
                Method::POST,
                &collection_action_path::<Diplomas>("generar_diplomas"),
                &PromocionRequest { promocion_id },
            )
            .await?;
        info!(
            promocion = promocion_id,
            issued = response.diplomas.len(),
            "diplomas generated"
        );
        Ok(response)
    }
}

impl AulaClient {
    /// Final averages.
    #[must_use]
    pub const fn promedios(&self) -> Collection<'_, Promedios> {
        Collection::new(self)
    }

    /// Diplomas.
    #[must_use]
    pub const fn diplomas(&self) -> Collection<'_, Diplomas> {
        Collection::new(self)
    }
}
