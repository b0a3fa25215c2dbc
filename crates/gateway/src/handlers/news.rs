//! News publishing and reading handlers

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{
    null_as_empty, optional_text, require_fields, validation_error, AppJson, AppQuery, ListQuery,
};
use crate::AppState;
use cybersentry_common::{
    db::models::{NewArticle, NewsArticle},
    errors::{ApiResponse, AppError, Result},
    metrics,
};

/// Article fields accepted by both publish endpoints
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PublishNewsRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(length(max = 300))]
    pub title: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(length(max = 100))]
    pub category: String,

    #[serde(default)]
    #[validate(length(max = 100))]
    pub platform: Option<String>,

    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(length(max = 2000))]
    pub summary: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(length(max = 100000))]
    pub content: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(length(max = 200))]
    pub source_name: String,

    #[serde(default)]
    #[validate(length(max = 2048))]
    pub source_url: Option<String>,

    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(length(max = 200))]
    pub author_name: String,

    #[serde(default)]
    #[validate(length(max = 2048))]
    pub image_url: Option<String>,
}

impl PublishNewsRequest {
    /// Required fields must be present and non-blank; all are reported at once
    pub fn check(&self) -> Result<()> {
        require_fields(&[
            ("title", &self.title),
            ("category", &self.category),
            ("summary", &self.summary),
            ("content", &self.content),
            ("source_name", &self.source_name),
            ("author_name", &self.author_name),
        ])?;

        self.validate().map_err(validation_error)
    }

    /// Assign a multipart text field by name; unknown names are ignored
    fn set_field(&mut self, name: &str, value: String) {
        match name {
            "title" => self.title = value,
            "category" => self.category = value,
            "platform" => self.platform = Some(value),
            "summary" => self.summary = value,
            "content" => self.content = value,
            "source_name" => self.source_name = value,
            "source_url" => self.source_url = Some(value),
            "author_name" => self.author_name = value,
            "image_url" => self.image_url = Some(value),
            _ => tracing::debug!(field = %name, "Ignoring unknown form field"),
        }
    }

    fn into_new_article(self) -> NewArticle {
        NewArticle {
            title: self.title.trim().to_string(),
            category: self.category.trim().to_string(),
            platform: optional_text(self.platform),
            summary: self.summary.trim().to_string(),
            content: self.content.trim().to_string(),
            source_name: self.source_name.trim().to_string(),
            source_url: optional_text(self.source_url),
            author_name: self.author_name.trim().to_string(),
            image_url: optional_text(self.image_url),
        }
    }
}

struct ImagePart {
    file_name: String,
    content_type: String,
    data: Bytes,
}

/// Publish an article from a JSON body
pub async fn publish_news(
    State(state): State<AppState>,
    AppJson(request): AppJson<PublishNewsRequest>,
) -> Result<(StatusCode, Json<ApiResponse<NewsArticle>>)> {
    request.check()?;
    publish(&state, request).await
}

/// Publish an article from a multipart form with an optional `image` file
pub async fn publish_news_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<NewsArticle>>)> {
    let mut request = PublishNewsRequest::default();
    let mut image = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "image" {
            let file_name = field.file_name().unwrap_or("image").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field.bytes().await.map_err(multipart_error)?;

            // Browsers send an empty part when no file was chosen
            if !data.is_empty() {
                image = Some(ImagePart { file_name, content_type, data });
            }
            continue;
        }

        let value = field.text().await.map_err(multipart_error)?;
        request.set_field(&name, value);
    }

    request.check()?;

    if let Some(image) = image {
        if let Some(url) = upload_image(&state, image).await {
            request.image_url = Some(url);
        }
    }

    publish(&state, request).await
}

/// Published articles, newest first
pub async fn list_news(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<Json<ApiResponse<Vec<NewsArticle>>>> {
    let limit = state.config.page_size(query.limit);
    let articles = state.store.list_published_articles(limit).await?;
    Ok(Json(ApiResponse::ok(articles)))
}

/// A published article; every failure reads as not found
pub async fn get_news(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<NewsArticle>>> {
    let not_found = || AppError::ArticleNotFound { id: id.clone() };

    let article_id = Uuid::parse_str(&id).map_err(|_| not_found())?;

    match state.store.find_published_article(article_id).await {
        Ok(Some(article)) => Ok(Json(ApiResponse::ok(article))),
        Ok(None) => Err(not_found()),
        Err(e) => {
            tracing::error!(article_id = %article_id, error = %e, "Failed to load article");
            Err(not_found())
        }
    }
}

async fn publish(
    state: &AppState,
    request: PublishNewsRequest,
) -> Result<(StatusCode, Json<ApiResponse<NewsArticle>>)> {
    let article = state.store.create_article(request.into_new_article()).await?;
    let with_image = !article.image_url.is_empty();

    metrics::record_publish(with_image);
    tracing::info!(
        article_id = %article.id,
        category = %article.category,
        with_image,
        "News article published"
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(article))))
}

/// Upload an image; any problem means publishing without one
async fn upload_image(state: &AppState, image: ImagePart) -> Option<String> {
    if !state.images.is_enabled() {
        tracing::warn!("Object storage not configured, publishing without image");
        return None;
    }

    let limit = state.config.media.max_image_bytes;
    if image.data.len() > limit {
        metrics::record_image_upload(false);
        tracing::warn!(
            size = image.data.len(),
            limit,
            "Image too large, publishing without image"
        );
        return None;
    }

    if !image.content_type.starts_with("image/") {
        metrics::record_image_upload(false);
        tracing::warn!(
            content_type = %image.content_type,
            "Attachment is not an image, publishing without image"
        );
        return None;
    }

    match state
        .images
        .upload(&image.file_name, &image.content_type, image.data)
        .await
    {
        Ok(url) => {
            metrics::record_image_upload(true);
            Some(url)
        }
        Err(e) => {
            metrics::record_image_upload(false);
            tracing::warn!(error = %e, "Image upload failed, publishing without image");
            None
        }
    }
}

fn multipart_error(err: MultipartError) -> AppError {
    AppError::InvalidFormat {
        message: err.body_text(),
    }
}
