//! Typed resource catalog.
//!
//! Each REST collection is a marker type implementing [`Resource`]; the
//! capability traits ([`Creatable`], [`Updatable`], [`Deletable`]) unlock the
//! matching [`Collection`] operations, so an unsupported operation does not
//! type-check. Resource-specific actions live as inherent methods on
//! `Collection<'_, R>` in the sibling modules.

mod courses;
mod exams;
mod outcomes;
mod users;

use std::marker::PhantomData;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use aula_api_models::UserRole;

use crate::error::Result;
use crate::transport::AulaClient;

pub use courses::{
    Asistencias, Cursos, Inscripciones, MaterialUpload, Materiales, Promociones, Temas,
};
pub use exams::{Calificaciones, Examenes, Preguntas, Recuperaciones};
pub use outcomes::{Diplomas, Promedios};
pub use users::Usuarios;

/// Query parameters narrowing a list request.
pub trait ListFilter {
    /// `name=value` pairs appended to the list URL.
    fn query(&self) -> Vec<(String, String)>;
}

/// A REST collection.
pub trait Resource {
    /// Collection path relative to the API root, with trailing slash.
    const PATH: &'static str;
    /// Document returned by list and detail requests.
    type Item: DeserializeOwned;
    /// Filter accepted by list requests.
    type Filter: ListFilter;
}

/// Collections accepting JSON `POST` creation.
pub trait Creatable: Resource {
    /// Request body.
    type Payload: Serialize;
    /// Response document.
    type Created: DeserializeOwned;
}

/// HTTP verb used for updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateVerb {
    /// Full replacement.
    Put,
    /// Partial update.
    Patch,
}

impl UpdateVerb {
    const fn method(self) -> Method {
        match self {
            Self::Put => Method::PUT,
            Self::Patch => Method::PATCH,
        }
    }
}

/// Collections accepting updates of single items.
pub trait Updatable: Resource {
    /// Request body.
    type Patch: Serialize;
    /// Verb the server expects.
    const VERB: UpdateVerb;
}

/// Collections accepting `DELETE` of single items.
pub trait Deletable: Resource {}

/// Operations on one collection, borrowed from a client.
#[derive(Debug)]
pub struct Collection<'a, R> {
    client: &'a AulaClient,
    resource: PhantomData<R>,
}

impl<R> Clone for Collection<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for Collection<'_, R> {}

impl<'a, R: Resource> Collection<'a, R> {
    pub(crate) const fn new(client: &'a AulaClient) -> Self {
        Self {
            client,
            resource: PhantomData,
        }
    }

    /// List items matching `filter`; paginated and bare responses both
    /// yield the items.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError`] when the request fails.
    pub async fn list(&self, filter: &R::Filter) -> Result<Vec<R::Item>> {
        self.client.get_list(R::PATH, filter.query()).await
    }

    /// List every item.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError`] when the request fails.
    pub async fn all(&self) -> Result<Vec<R::Item>>
    where
        R::Filter: Default,
    {
        self.list(&R::Filter::default()).await
    }

    /// Fetch one item.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError`] when the request fails.
    pub async fn get(&self, id: i64) -> Result<R::Item> {
        self.client.get_json(&item_path::<R>(id), Vec::new()).await
    }
}

impl<R: Creatable> Collection<'_, R> {
    /// Create an item.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError::Api`] with field errors when validation
    /// fails.
    pub async fn create(&self, payload: &R::Payload) -> Result<R::Created> {
        self.client.send_json(Method::POST, R::PATH, payload).await
    }
}

impl<R: Updatable> Collection<'_, R> {
    /// Update an item with the verb the collection expects.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError::Api`] with field errors when validation
    /// fails.
    pub async fn update(&self, id: i64, patch: &R::Patch) -> Result<R::Item> {
        self.client
            .send_json(R::VERB.method(), &item_path::<R>(id), patch)
            .await
    }
}

impl<R: Deletable> Collection<'_, R> {
    /// Delete an item.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError`] when the request fails.
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.client.delete(&item_path::<R>(id)).await
    }
}

impl AulaClient {
    /// Operations on any collection.
    #[must_use]
    pub const fn collection<R: Resource>(&self) -> Collection<'_, R> {
        Collection::new(self)
    }
}

pub(crate) fn item_path<R: Resource>(id: i64) -> String {
    format!("{}{id}/", R::PATH)
}

pub(crate) fn detail_action_path<R: Resource>(id: i64, action: &str) -> String {
    format!("{}{id}/{action}/", R::PATH)
}

pub(crate) fn collection_action_path<R: Resource>(action: &str) -> String {
    format!("{}{action}/", R::PATH)
}

/// Filter for unfiltered collections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoFilter;

impl ListFilter for NoFilter {
    fn query(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

macro_rules! id_filter {
    ($(#[$meta:meta])* $name:ident, $field:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name {
            #[doc = concat!("Restrict to this `", stringify!($field), "` id.")]
            pub $field: Option<i64>,
        }

        impl $name {
            #[doc = concat!("Filter on one `", stringify!($field), "`.")]
            #[must_use]
            pub const fn $field(id: i64) -> Self {
                Self { $field: Some(id) }
            }
        }

        impl ListFilter for $name {
            fn query(&self) -> Vec<(String, String)> {
                self.$field
                    .map(|id| vec![(stringify!($field).to_string(), id.to_string())])
                    .unwrap_or_default()
            }
        }
    };
}

id_filter!(
    /// Filter by course.
    ByCurso,
    curso
);
id_filter!(
    /// Filter by promotion.
    ByPromocion,
    promocion
);
id_filter!(
    /// Filter by topic.
    ByTema,
    tema
);
id_filter!(
    /// Filter by exam.
    ByExamen,
    examen
);

/// Filter for retake windows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecuperacionFilter {
    /// Restrict to one exam.
    pub examen: Option<i64>,
    /// Restrict to one enrollment.
    pub inscripcion: Option<i64>,
}

impl ListFilter for RecuperacionFilter {
    fn query(&self) -> Vec<(String, String)> {
        [("examen", self.examen), ("inscripcion", self.inscripcion)]
            .into_iter()
            .filter_map(|(name, id)| id.map(|id| (name.to_string(), id.to_string())))
            .collect()
    }
}

/// Filter for accounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsuarioFilter {
    /// Restrict to one role.
    pub tipo: Option<UserRole>,
}

impl ListFilter for UsuarioFilter {
    fn query(&self) -> Vec<(String, String)> {
        self.tipo
            .map(|tipo| vec![("tipo".to_string(), tipo.as_str().to_string())])
            .unwrap_or_default()
    }
}
