//! SeaORM entity models
//!
//! Database entities for CyberSentry

mod article_view;
mod contact_message;
mod fraud_report;
mod news_article;

pub use news_article::{
    Entity as NewsArticleEntity,
    Model as NewsArticle,
    ActiveModel as NewsArticleActiveModel,
    Column as NewsArticleColumn,
    ArticleStatus,
    NewArticle,
};

pub use article_view::{
    Entity as ArticleViewEntity,
    Model as ArticleView,
    ActiveModel as ArticleViewActiveModel,
    Column as ArticleViewColumn,
    NewArticleView,
    ViewWrite,
};

pub use fraud_report::{
    Entity as FraudReportEntity,
    Model as FraudReport,
    ActiveModel as FraudReportActiveModel,
    Column as FraudReportColumn,
};

pub use contact_message::{
    Entity as ContactMessageEntity,
    Model as ContactMessage,
    ActiveModel as ContactMessageActiveModel,
    Column as ContactMessageColumn,
    NewContactMessage,
};
