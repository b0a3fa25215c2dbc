//! Article view entity
//!
//! One row per (article, client identity) pair. The pair carries a unique
//! constraint so a repeated view is dropped by the insert itself.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "article_views")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub article_id: String,

    /// Salted SHA-256 of the client address, hex encoded
    #[sea_orm(column_type = "Text")]
    pub client_identity: String,

    #[sea_orm(column_type = "Text")]
    pub country: String,

    #[sea_orm(column_type = "Text")]
    pub region: String,

    #[sea_orm(column_type = "Text")]
    pub city: String,

    #[sea_orm(column_type = "Text")]
    pub device_type: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// A view ready to be persisted
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewArticleView {
    pub article_id: String,
    pub client_identity: String,
    pub country: String,
    pub region: String,
    pub city: String,
    pub device_type: String,
}

impl NewArticleView {
    pub fn into_model(self, id: Uuid, created_at: DateTimeWithTimeZone) -> Model {
        Model {
            id,
            article_id: self.article_id,
            client_identity: self.client_identity,
            country: self.country,
            region: self.region,
            city: self.city,
            device_type: self.device_type,
            created_at,
        }
    }
}

/// Result of an insert-if-absent view write
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewWrite {
    Recorded,
    Duplicate,
}
