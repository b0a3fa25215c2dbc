//! Process-local content store
//!
//! Backs local runs without Postgres and the handler tests. All writes go
//! through a single lock, so the view uniqueness check and insert are one
//! atomic step just like the database's `ON CONFLICT DO NOTHING`.

use crate::db::models::*;
use crate::db::ContentStore;
use crate::errors::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    articles: Vec<NewsArticle>,
    views: Vec<ArticleView>,
    view_keys: HashSet<(String, String)>,
    reports: Vec<FraudReport>,
    contact_messages: Vec<ContactMessage>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a fraud report; reports have no write path through the API
    pub async fn insert_report(&self, report: FraudReport) {
        self.tables.write().await.reports.push(report);
    }

    /// Seed an article row as-is, bypassing the publish rules
    pub async fn insert_article(&self, article: NewsArticle) {
        self.tables.write().await.articles.push(article);
    }

    /// Snapshot of all stored views
    pub async fn views(&self) -> Vec<ArticleView> {
        self.tables.read().await.views.clone()
    }

    /// Snapshot of all stored contact messages
    pub async fn contact_messages(&self) -> Vec<ContactMessage> {
        self.tables.read().await.contact_messages.clone()
    }
}

fn newest_first<T, F>(mut rows: Vec<T>, created_at: F, limit: u64) -> Vec<T>
where
    F: Fn(&T) -> sea_orm::prelude::DateTimeWithTimeZone,
{
    rows.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    rows.truncate(limit as usize);
    rows
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn record_view(&self, view: NewArticleView) -> Result<ViewWrite> {
        let mut tables = self.tables.write().await;

        let key = (view.article_id.clone(), view.client_identity.clone());
        if !tables.view_keys.insert(key) {
            return Ok(ViewWrite::Duplicate);
        }

        let row = view.into_model(Uuid::new_v4(), chrono::Utc::now().into());
        tables.views.push(row);
        Ok(ViewWrite::Recorded)
    }

    async fn create_article(&self, article: NewArticle) -> Result<NewsArticle> {
        let row = article.into_model(Uuid::new_v4(), chrono::Utc::now().into());
        self.tables.write().await.articles.push(row.clone());
        Ok(row)
    }

    async fn list_published_articles(&self, limit: u64) -> Result<Vec<NewsArticle>> {
        let rows = self
            .tables
            .read()
            .await
            .articles
            .iter()
            .filter(|a| a.is_published())
            .cloned()
            .collect();
        Ok(newest_first(rows, |a: &NewsArticle| a.created_at, limit))
    }

    async fn find_published_article(&self, id: Uuid) -> Result<Option<NewsArticle>> {
        Ok(self
            .tables
            .read()
            .await
            .articles
            .iter()
            .find(|a| a.id == id && a.is_published())
            .cloned())
    }

    async fn list_public_reports(&self, limit: u64) -> Result<Vec<FraudReport>> {
        let rows = self
            .tables
            .read()
            .await
            .reports
            .iter()
            .filter(|r| r.is_public)
            .cloned()
            .collect();
        Ok(newest_first(rows, |r: &FraudReport| r.created_at, limit))
    }

    async fn find_public_report(&self, id: Uuid) -> Result<Option<FraudReport>> {
        Ok(self
            .tables
            .read()
            .await
            .reports
            .iter()
            .find(|r| r.id == id && r.is_public)
            .cloned())
    }

    async fn create_contact_message(&self, message: NewContactMessage) -> Result<ContactMessage> {
        let row = message.into_model(Uuid::new_v4(), chrono::Utc::now().into());
        self.tables.write().await.contact_messages.push(row.clone());
        Ok(row)
    }
}
