use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Maximum title length, in characters
pub const TITLE_MAX_CHARS: usize = 100;

/// Maximum body length, in characters
pub const BODY_MAX_CHARS: usize = 450;

/// Category labels offered by the submission form
///
/// The set is open: articles carrying any other tag are still accepted and displayed.
pub const KNOWN_TAGS: [&str; 4] = ["Campus", "Sports", "Events", "Opinion"];

/// Opaque row identity of an article or user
///
/// The backend emits integer row ids, but nothing in the feed depends on that,
/// so string ids are accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Number(i64),
    Text(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Number(n) => write!(f, "{}", n),
            EntityId::Text(s) => f.write_str(s),
        }
    }
}

/// Moderation status of an article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    /// Visible in the feed. Rows without a status come from the approved-only
    /// feed endpoint, hence the default.
    #[default]
    Approved,
    Pending,
}

/// A published article as delivered by `GET /api/articles`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: EntityId,
    pub title: String,
    pub body: String,
    pub tag: String,
    #[serde(default)]
    pub image_path: String,
    #[serde(default)]
    pub author_name: String,
    /// Creation timestamp as sent by the backend (RFC 3339 or `YYYY-MM-DD HH:MM:SS` UTC)
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub status: ArticleStatus,
}

impl Article {
    pub fn is_approved(&self) -> bool {
        self.status == ArticleStatus::Approved
    }
}

/// Keeps only articles that may be shown in the feed
pub fn approved_only(articles: Vec<Article>) -> Vec<Article> {
    articles.into_iter().filter(Article::is_approved).collect()
}

/// Article fields typed into the submission form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleDraft {
    pub title: String,
    pub body: String,
    pub tag: String,
}

impl ArticleDraft {
    pub fn new(title: &str, body: &str, tag: &str) -> Self {
        ArticleDraft {
            title: title.to_string(),
            body: body.to_string(),
            tag: tag.to_string(),
        }
    }

    /// Validate the draft before submission
    ///
    /// Checks run in the order the form reports them: required fields, then the
    /// image, then the title and body length limits.
    ///
    /// # Arguments
    /// * `has_image` - Whether an image is currently selected in the adjuster
    ///
    /// # Returns
    /// * `Result<(), ValidationError>` - The first failing rule, if any
    pub fn validate(&self, has_image: bool) -> Result<(), ValidationError> {
        if self.title.is_empty() || self.body.is_empty() || self.tag.is_empty() {
            return Err(ValidationError::MissingFields);
        }

        if !has_image {
            return Err(ValidationError::MissingImage);
        }

        if self.title.chars().count() > TITLE_MAX_CHARS {
            return Err(ValidationError::TitleTooLong);
        }

        if self.body.chars().count() > BODY_MAX_CHARS {
            return Err(ValidationError::BodyTooLong);
        }

        Ok(())
    }
}

/// Character counter shown under a form field, e.g. `"12/100"`
pub fn char_count_label(text: &str, max: usize) -> String {
    format!("{}/{}", text.chars().count(), max)
}

/// Authenticated user as returned by the auth and profile endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: EntityId,
    pub name: String,
    pub email: String,
    #[serde(default, rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Body of `GET /api/auth/status`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuthStatus {
    pub authenticated: bool,
    #[serde(default)]
    pub user: Option<UserProfile>,
}
