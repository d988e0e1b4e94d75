use chrono::{DateTime, Utc};
use handlebars::{Handlebars, TemplateError};
use log::error;
use serde::Serialize;
use serde_json::json;

use crate::article::{Article, UserProfile};
use crate::controller::{Notice, NoticeKind};
use crate::image_adjust::{ImageAdjuster, Transform};
use crate::time_ago::{parse_timestamp, time_ago};

/// Widest viewport, in CSS pixels, that still uses the scrolling mobile layout
pub const MOBILE_MAX_WIDTH: u32 = 768;

const CARD: &str = "card";
const EMPTY: &str = "empty";
const ERROR: &str = "error";
const LOADING: &str = "loading";
const PROFILE: &str = "profile";
const PROFILE_BUTTON: &str = "profile_button";
const NOTICE: &str = "notice";

/// Feed layout picked from the viewport width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Single column with infinite scroll
    Mobile,
    /// Fixed page of the first few articles
    Desktop,
}

impl Layout {
    pub fn from_width(viewport_width: u32) -> Self {
        if viewport_width <= MOBILE_MAX_WIDTH {
            Layout::Mobile
        } else {
            Layout::Desktop
        }
    }

    pub fn is_scrolling(self) -> bool {
        self == Layout::Mobile
    }
}

/// What the image adjustment area should display
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImageView {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
    pub zoom_percent: u32,
    pub min_zoom_percent: u32,
    pub max_zoom_percent: u32,
}

impl ImageView {
    /// Snapshot of an adjuster, `None` when no image is selected
    pub fn of(adjuster: &ImageAdjuster) -> Option<Self> {
        if !adjuster.has_image() {
            return None;
        }
        let Transform {
            scale,
            translate_x,
            translate_y,
        } = adjuster.transform();
        Some(ImageView {
            scale,
            translate_x,
            translate_y,
            zoom_percent: adjuster.zoom_percent(),
            min_zoom_percent: (adjuster.min_scale() * 100.0).round() as u32,
            max_zoom_percent: (adjuster.max_scale() * 100.0).round() as u32,
        })
    }

    /// CSS transform for an image centred in its container
    pub fn css_transform(&self) -> String {
        format!(
            "translate(-50%, -50%) scale({}) translate({}px, {}px)",
            self.scale,
            self.translate_x / self.scale,
            self.translate_y / self.scale
        )
    }
}

/// A single instruction for whatever surface displays the feed
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOp {
    /// Replace the feed with the "no articles" message
    ShowEmpty(String),
    /// Replace the feed with the load failure message
    ShowError(String),
    /// Replace the grid contents
    ReplaceGrid { layout: Layout, html: String },
    /// Append cards below the existing ones
    AppendToGrid(String),
    LoadingIndicator { visible: bool, html: String },
    /// Start or stop watching the scroll sentinel
    ObserveSentinel(bool),
    ProfileButton(String),
    ProfileModal(String),
    ProfileEditMode(bool),
    CloseProfileModal,
    ArticleForm { open: bool },
    Submitting(bool),
    ImageAdjust(Option<ImageView>),
}

/// Turns articles into escaped HTML fragments
///
/// Every user-supplied string passes through handlebars' HTML escaping, so a
/// title such as `<script>` is displayed as text and never becomes markup.
pub struct FeedRenderer {
    registry: Handlebars<'static>,
    clock: fn() -> DateTime<Utc>,
}

impl std::fmt::Debug for FeedRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedRenderer").finish_non_exhaustive()
    }
}

impl FeedRenderer {
    pub fn new() -> Result<Self, TemplateError> {
        FeedRenderer::with_clock(Utc::now)
    }

    /// Renderer whose relative-time labels are computed against `clock`
    pub fn with_clock(clock: fn() -> DateTime<Utc>) -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        registry.register_template_string(CARD, include_str!("./templates/card.hbs"))?;
        registry.register_template_string(EMPTY, include_str!("./templates/empty.hbs"))?;
        registry.register_template_string(ERROR, include_str!("./templates/error.hbs"))?;
        registry.register_template_string(LOADING, include_str!("./templates/loading.hbs"))?;
        registry.register_template_string(PROFILE, include_str!("./templates/profile.hbs"))?;
        registry.register_template_string(
            PROFILE_BUTTON,
            include_str!("./templates/profile_button.hbs"),
        )?;
        registry.register_template_string(NOTICE, include_str!("./templates/notice.hbs"))?;

        Ok(FeedRenderer { registry, clock })
    }

    fn render<T: Serialize>(&self, name: &str, data: &T) -> String {
        match self.registry.render(name, data) {
            Ok(html) => html,
            Err(e) => {
                error!("Failed to render {} template: {}", name, e);
                String::new()
            }
        }
    }

    /// HTML for one article card
    pub fn card(&self, article: &Article) -> String {
        let data = json!({
            "id": article.id.to_string(),
            "title": article.title,
            "body": article.body,
            "tag": article.tag,
            "image_path": safe_image_src(&article.image_path),
            "author_name": article.author_name,
            "time_ago": time_ago(&article.created_at, (self.clock)()),
        });
        self.render(CARD, &data)
    }

    fn cards(&self, articles: &[Article]) -> String {
        articles.iter().map(|a| self.card(a)).collect()
    }

    /// First render of the feed
    ///
    /// # Arguments
    /// * `articles` - What the layout shows first: the first batch on mobile,
    ///   the fixed prefix on desktop
    /// * `layout` - The active layout
    ///
    /// # Returns
    /// * `RenderOp` - `ShowEmpty` when there is nothing to show, otherwise `ReplaceGrid`
    pub fn initial_layout(&self, articles: &[Article], layout: Layout) -> RenderOp {
        if articles.is_empty() {
            return self.empty_state();
        }
        RenderOp::ReplaceGrid {
            layout,
            html: self.cards(articles),
        }
    }

    /// Cards for a further infinite-scroll batch; nothing for an empty batch
    pub fn append_batch(&self, batch: &[Article]) -> Option<RenderOp> {
        if batch.is_empty() {
            return None;
        }
        Some(RenderOp::AppendToGrid(self.cards(batch)))
    }

    pub fn empty_state(&self) -> RenderOp {
        RenderOp::ShowEmpty(self.render(EMPTY, &json!({})))
    }

    pub fn error_state(&self) -> RenderOp {
        RenderOp::ShowError(self.render(ERROR, &json!({})))
    }

    pub fn loading_indicator(&self, visible: bool) -> RenderOp {
        RenderOp::LoadingIndicator {
            visible,
            html: self.render(LOADING, &json!({})),
        }
    }

    pub fn profile_button(&self, name: &str) -> RenderOp {
        RenderOp::ProfileButton(self.render(PROFILE_BUTTON, &json!({ "name": name })))
    }

    /// Profile dialog, in view or edit mode
    pub fn profile_modal(&self, profile: &UserProfile, editing: bool) -> RenderOp {
        let member_since = profile
            .created_at
            .as_deref()
            .and_then(parse_timestamp)
            .map(|dt| dt.format("%Y-%m-%d").to_string());
        let data = json!({
            "name": profile.name,
            "email": profile.email,
            "member_since": member_since,
            "editing": editing,
        });
        RenderOp::ProfileModal(self.render(PROFILE, &data))
    }

    /// Placeholder dialog shown while the profile is fetched
    pub fn profile_loading(&self) -> RenderOp {
        let data = json!({
            "name": "Loading...",
            "email": "Loading...",
            "editing": false,
        });
        RenderOp::ProfileModal(self.render(PROFILE, &data))
    }

    /// Flash message fragment for a success or error notice
    pub fn notice(&self, notice: &Notice) -> String {
        let kind = match notice.kind {
            NoticeKind::Success => "success",
            NoticeKind::Error => "error",
        };
        self.render(NOTICE, &json!({ "kind": kind, "message": notice.message }))
    }
}

// Only site-relative and http(s) image sources are emitted; anything else
// (javascript:, data: ...) is dropped.
fn safe_image_src(path: &str) -> &str {
    let trimmed = path.trim();
    let lower = trimmed.to_ascii_lowercase();
    if trimmed.starts_with('/') && !trimmed.starts_with("//")
        || lower.starts_with("https://")
        || lower.starts_with("http://")
    {
        trimmed
    } else {
        ""
    }
}
