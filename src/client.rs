use async_trait::async_trait;
use log::{debug, error};
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::article::{Article, ArticleDraft, AuthStatus, UserProfile};
use crate::error::ClientError;

/// File name under which the adjusted image is uploaded
pub const UPLOAD_FILE_NAME: &str = "article-image.jpg";

/// The backend contract consumed by the feed
///
/// Implemented over HTTP by [`HttpClient`]; tests substitute in-memory fakes.
#[async_trait]
pub trait ArticleApi: Send + Sync {
    /// `GET /api/articles`
    async fn fetch_articles(&self) -> Result<Vec<Article>, ClientError>;

    /// `GET /api/auth/status`
    async fn auth_status(&self) -> Result<AuthStatus, ClientError>;

    /// `GET /api/profile`; `None` when the session is no longer valid
    async fn fetch_profile(&self) -> Result<Option<UserProfile>, ClientError>;

    /// `PUT /api/profile`
    async fn update_profile(&self, name: &str, email: &str) -> Result<UserProfile, ClientError>;

    /// `POST /api/articles` as multipart with the exported JPEG
    async fn submit_article(
        &self,
        draft: &ArticleDraft,
        image: Vec<u8>,
    ) -> Result<Article, ClientError>;

    /// `POST /api/logout`
    async fn logout(&self) -> Result<(), ClientError>;
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

#[derive(Deserialize)]
struct ArticlesEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    articles: Option<Vec<Article>>,
}

#[derive(Deserialize)]
struct ArticleEnvelope {
    article: Article,
}

#[derive(Deserialize)]
struct UserEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    user: Option<UserProfile>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// HTTP implementation of [`ArticleApi`]
///
/// Keeps a cookie store so the session cookie set by the backend travels with
/// every later request.
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpClient {
    /// Create a client for a backend root such as `http://127.0.0.1:3000`
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(HttpClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let response = check(response).await?;
        Ok(response.json::<T>().await?)
    }
}

// Non-2xx responses become `ClientError::Api` carrying the body's `error`
// string, or a generic status message when there is none.
async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.error)
        .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));
    debug!("{} -> {}", status, message);

    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl ArticleApi for HttpClient {
    async fn fetch_articles(&self) -> Result<Vec<Article>, ClientError> {
        let response = self.http.get(self.url("/api/articles")).send().await?;
        let envelope: ArticlesEnvelope = Self::json(response).await?;

        match (envelope.success, envelope.articles) {
            (true, Some(articles)) => Ok(articles),
            _ => Ok(Vec::new()),
        }
    }

    async fn auth_status(&self) -> Result<AuthStatus, ClientError> {
        let response = self.http.get(self.url("/api/auth/status")).send().await?;
        Self::json(response).await
    }

    async fn fetch_profile(&self) -> Result<Option<UserProfile>, ClientError> {
        let response = self.http.get(self.url("/api/profile")).send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Ok(None);
        }

        let envelope: UserEnvelope = Self::json(response).await?;
        Ok(envelope.user.filter(|_| envelope.success))
    }

    async fn update_profile(&self, name: &str, email: &str) -> Result<UserProfile, ClientError> {
        let response = self
            .http
            .put(self.url("/api/profile"))
            .json(&serde_json::json!({ "name": name, "email": email }))
            .send()
            .await?;

        let envelope: UserEnvelope = Self::json(response).await?;
        envelope
            .user
            .ok_or_else(|| ClientError::Decode("profile response without user".to_string()))
    }

    async fn submit_article(
        &self,
        draft: &ArticleDraft,
        image: Vec<u8>,
    ) -> Result<Article, ClientError> {
        let image_part = Part::bytes(image)
            .file_name(UPLOAD_FILE_NAME)
            .mime_str("image/jpeg")?;
        let form = Form::new()
            .text("title", draft.title.clone())
            .text("body", draft.body.clone())
            .text("tag", draft.tag.clone())
            .part("image", image_part);

        let response = self
            .http
            .post(self.url("/api/articles"))
            .multipart(form)
            .send()
            .await?;

        let envelope: ArticleEnvelope = Self::json(response).await.map_err(|e| {
            error!("Error submitting article: {}", e);
            e
        })?;
        Ok(envelope.article)
    }

    async fn logout(&self) -> Result<(), ClientError> {
        let response = self.http.post(self.url("/api/logout")).send().await?;
        check(response).await?;
        Ok(())
    }
}
