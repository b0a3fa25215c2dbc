//! News article entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle flag of an article
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleStatus {
    Published,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Published => "published",
        }
    }
}

impl From<ArticleStatus> for String {
    fn from(status: ArticleStatus) -> Self {
        status.as_str().to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "news_articles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub category: String,

    #[sea_orm(column_type = "Text", nullable)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub summary: String,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    #[sea_orm(column_type = "Text")]
    pub source_name: String,

    #[sea_orm(column_type = "Text", nullable)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub author_name: String,

    /// Public image URL, empty when the article has no image
    #[sea_orm(column_type = "Text")]
    pub image_url: String,

    #[sea_orm(column_type = "Text")]
    pub status: String,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    pub fn is_published(&self) -> bool {
        self.status == ArticleStatus::Published.as_str()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Fields accepted when publishing an article
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewArticle {
    pub title: String,
    pub category: String,
    pub platform: Option<String>,
    pub summary: String,
    pub content: String,
    pub source_name: String,
    pub source_url: Option<String>,
    pub author_name: String,
    pub image_url: Option<String>,
}

impl NewArticle {
    /// Build the published row; status is always forced to published
    pub fn into_model(self, id: Uuid, created_at: DateTimeWithTimeZone) -> Model {
        Model {
            id,
            title: self.title,
            category: self.category,
            platform: self.platform,
            summary: self.summary,
            content: self.content,
            source_name: self.source_name,
            source_url: self.source_url,
            author_name: self.author_name,
            image_url: self.image_url.unwrap_or_default(),
            status: ArticleStatus::Published.into(),
            created_at,
        }
    }
}
