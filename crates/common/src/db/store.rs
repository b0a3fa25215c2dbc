//! Storage seam used by the HTTP layer
//!
//! The gateway owns one `Arc<dyn ContentStore>` for the life of the
//! process; handlers never reach for a global client.

use crate::db::models::*;
use crate::errors::Result;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Check that the backing store answers
    async fn ping(&self) -> Result<()>;

    /// Insert a view unless one already exists for (article_id, client_identity)
    async fn record_view(&self, view: NewArticleView) -> Result<ViewWrite>;

    /// Persist a new published article
    async fn create_article(&self, article: NewArticle) -> Result<NewsArticle>;

    /// Published articles, newest first
    async fn list_published_articles(&self, limit: u64) -> Result<Vec<NewsArticle>>;

    /// A published article by id
    async fn find_published_article(&self, id: Uuid) -> Result<Option<NewsArticle>>;

    /// Public fraud reports, newest first
    async fn list_public_reports(&self, limit: u64) -> Result<Vec<FraudReport>>;

    /// A public fraud report by id
    async fn find_public_report(&self, id: Uuid) -> Result<Option<FraudReport>>;

    /// Persist a contact form message
    async fn create_contact_message(&self, message: NewContactMessage) -> Result<ContactMessage>;
}
