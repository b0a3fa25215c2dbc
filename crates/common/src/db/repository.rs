//! Repository pattern for database operations
//!
//! Postgres-backed implementation of [`ContentStore`].

use crate::db::models::*;
use crate::db::{ContentStore, DbPool};
use crate::errors::Result;
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Statement,
};
use uuid::Uuid;

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }
}

#[async_trait]
impl ContentStore for Repository {
    // ========================================================================
    // Health Check
    // ========================================================================

    async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Article Views
    // ========================================================================

    async fn record_view(&self, view: NewArticleView) -> Result<ViewWrite> {
        let now = chrono::Utc::now();

        // The unique (article_id, client_identity) index decides; no pre-read
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"
            INSERT INTO article_views (
                id, article_id, client_identity, country, region, city,
                device_type, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (article_id, client_identity) DO NOTHING
            "#,
            vec![
                Uuid::new_v4().into(),
                view.article_id.into(),
                view.client_identity.into(),
                view.country.into(),
                view.region.into(),
                view.city.into(),
                view.device_type.into(),
                now.into(),
            ],
        );

        let result = self.write_conn().execute(stmt).await?;

        Ok(if result.rows_affected() > 0 {
            ViewWrite::Recorded
        } else {
            ViewWrite::Duplicate
        })
    }

    // ========================================================================
    // News Articles
    // ========================================================================

    async fn create_article(&self, article: NewArticle) -> Result<NewsArticle> {
        let model = article.into_model(Uuid::new_v4(), chrono::Utc::now().into());

        NewsArticleActiveModel::from(model)
            .insert(self.write_conn())
            .await
            .map_err(Into::into)
    }

    async fn list_published_articles(&self, limit: u64) -> Result<Vec<NewsArticle>> {
        NewsArticleEntity::find()
            .filter(NewsArticleColumn::Status.eq(ArticleStatus::Published.as_str()))
            .order_by_desc(NewsArticleColumn::CreatedAt)
            .limit(limit)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    async fn find_published_article(&self, id: Uuid) -> Result<Option<NewsArticle>> {
        NewsArticleEntity::find_by_id(id)
            .filter(NewsArticleColumn::Status.eq(ArticleStatus::Published.as_str()))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Fraud Reports
    // ========================================================================

    async fn list_public_reports(&self, limit: u64) -> Result<Vec<FraudReport>> {
        FraudReportEntity::find()
            .filter(FraudReportColumn::IsPublic.eq(true))
            .order_by_desc(FraudReportColumn::CreatedAt)
            .limit(limit)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    async fn find_public_report(&self, id: Uuid) -> Result<Option<FraudReport>> {
        FraudReportEntity::find_by_id(id)
            .filter(FraudReportColumn::IsPublic.eq(true))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Contact Messages
    // ========================================================================

    async fn create_contact_message(&self, message: NewContactMessage) -> Result<ContactMessage> {
        let model = message.into_model(Uuid::new_v4(), chrono::Utc::now().into());

        ContactMessageActiveModel::from(model)
            .insert(self.write_conn())
            .await
            .map_err(Into::into)
    }
}
