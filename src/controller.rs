//! Feed controller: the application's event handling as a state machine.
//!
//! Every user or network event is an [`Action`]. [`AppContext::dispatch`]
//! updates the owned state and answers with a list of [`Effect`]s (render
//! instructions, network calls, timers) for the surrounding runtime to carry
//! out. Results of network calls and timers come back as further actions, so
//! the whole cycle can be driven headlessly one step at a time.

use std::time::Duration;

use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::article::{Article, ArticleDraft, AuthStatus, UserProfile, approved_only};
use crate::error::{ClientError, ValidationError};
use crate::feed_store::FeedStore;
use crate::image_adjust::{ImageAdjuster, SelectedFile};
use crate::render::{FeedRenderer, ImageView, Layout, RenderOp};

/// Artificial pause before each infinite-scroll batch is shown
pub const LOAD_DELAY: Duration = Duration::from_millis(400);

/// Quiet period after the last resize before the layout is re-evaluated
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(200);

/// Where unauthenticated users are sent
pub const LOGIN_PATH: &str = "/login";

/// Something that happened: user input, a timer firing or a network result
#[derive(Debug)]
pub enum Action {
    Start { viewport_width: u32 },
    AuthChecked(Result<AuthStatus, ClientError>),
    ArticlesFetched(Result<Vec<Article>, ClientError>),
    /// Result of re-fetching the feed behind a grid that is already shown
    ArticlesRefreshed(Result<Vec<Article>, ClientError>),
    /// The scroll sentinel entered or left the viewport
    SentinelVisibility(bool),
    /// The pause of the load identified by `ticket` is over
    BatchDelayElapsed { ticket: u64 },
    Resized { viewport_width: u32 },
    ResizeSettled { generation: u64 },

    OpenArticleForm,
    CloseArticleForm,
    ImageSelected(SelectedFile),
    /// Zoom slider moved, in percent
    ZoomChanged(f64),
    ImagePanned { dx: f64, dy: f64 },
    DragStarted { x: f64, y: f64 },
    DragMoved { x: f64, y: f64 },
    DragEnded,
    ImageRemoved,
    SubmitArticle(ArticleDraft),
    ArticleSubmitted(Result<Article, ClientError>),

    OpenProfile,
    ProfileLoaded(Result<Option<UserProfile>, ClientError>),
    EditProfile,
    CancelEditProfile,
    CloseProfile,
    SaveProfile { name: String, email: String },
    ProfileSaved(Result<UserProfile, ClientError>),
    Logout,
    LoggedOut(Result<(), ClientError>),
}

impl Action {
    /// Logical name of the action, used for logging
    pub fn name(&self) -> &'static str {
        match self {
            Action::Start { .. } => "start",
            Action::AuthChecked(_) => "auth_checked",
            Action::ArticlesFetched(_) => "articles_fetched",
            Action::ArticlesRefreshed(_) => "articles_refreshed",
            Action::SentinelVisibility(_) => "sentinel_visibility",
            Action::BatchDelayElapsed { .. } => "batch_delay_elapsed",
            Action::Resized { .. } => "resized",
            Action::ResizeSettled { .. } => "resize_settled",
            Action::OpenArticleForm => "open_article_form",
            Action::CloseArticleForm => "close_article_form",
            Action::ImageSelected(_) => "image_selected",
            Action::ZoomChanged(_) => "zoom_changed",
            Action::ImagePanned { .. } => "image_panned",
            Action::DragStarted { .. } => "drag_started",
            Action::DragMoved { .. } => "drag_moved",
            Action::DragEnded => "drag_ended",
            Action::ImageRemoved => "image_removed",
            Action::SubmitArticle(_) => "submit_article",
            Action::ArticleSubmitted(_) => "article_submitted",
            Action::OpenProfile => "open_profile",
            Action::ProfileLoaded(_) => "profile_loaded",
            Action::EditProfile => "edit_profile",
            Action::CancelEditProfile => "cancel_edit_profile",
            Action::CloseProfile => "close_profile",
            Action::SaveProfile { .. } => "save_profile",
            Action::ProfileSaved(_) => "profile_saved",
            Action::Logout => "logout",
            Action::LoggedOut(_) => "logged_out",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A message shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: &str) -> Self {
        Notice {
            kind: NoticeKind::Success,
            message: message.to_string(),
        }
    }

    pub fn error(message: &str) -> Self {
        Notice {
            kind: NoticeKind::Error,
            message: message.to_string(),
        }
    }
}

impl From<ValidationError> for Notice {
    fn from(err: ValidationError) -> Self {
        Notice::error(&err.to_string())
    }
}

/// Work the runtime must perform on the controller's behalf
#[derive(Debug)]
pub enum Effect {
    CheckAuth,
    FetchArticles,
    /// Re-fetch the feed; a failure leaves the current grid in place
    RefreshArticles,
    Render(RenderOp),
    /// Deliver `action` back to the controller after `after`
    Schedule { after: Duration, action: Action },
    SubmitArticle { draft: ArticleDraft, image: Vec<u8> },
    FetchProfile,
    UpdateProfile { name: String, email: String },
    Logout,
    Notify(Notice),
    Redirect(String),
}

/// Owns the feed store, renderer and image adjuster for one page session
#[derive(Debug)]
pub struct AppContext {
    store: FeedStore,
    renderer: FeedRenderer,
    adjuster: ImageAdjuster,
    rng: StdRng,
    viewport_width: u32,
    layout: Option<Layout>,
    articles_ready: bool,
    is_loading: bool,
    load_ticket: u64,
    resize_generation: u64,
    form_open: bool,
    submitting: bool,
    profile: Option<UserProfile>,
    profile_open: bool,
}

impl AppContext {
    pub fn new(store: FeedStore, renderer: FeedRenderer, adjuster: ImageAdjuster) -> Self {
        AppContext {
            store,
            renderer,
            adjuster,
            rng: StdRng::from_entropy(),
            viewport_width: 0,
            layout: None,
            articles_ready: false,
            is_loading: false,
            load_ticket: 0,
            resize_generation: 0,
            form_open: false,
            submitting: false,
            profile: None,
            profile_open: false,
        }
    }

    /// Use a fixed seed for reshuffles, for reproducible feeds
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn store(&self) -> &FeedStore {
        &self.store
    }

    pub fn adjuster(&self) -> &ImageAdjuster {
        &self.adjuster
    }

    pub fn layout(&self) -> Option<Layout> {
        self.layout
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_form_open(&self) -> bool {
        self.form_open
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Handle one action and return the effects it requires
    pub fn dispatch(&mut self, action: Action) -> Vec<Effect> {
        debug!("Dispatching {}", action.name());

        match action {
            Action::Start { viewport_width } => {
                self.viewport_width = viewport_width;
                vec![Effect::CheckAuth]
            }
            Action::AuthChecked(result) => self.on_auth_checked(result),
            Action::ArticlesFetched(result) => self.on_articles_fetched(result),
            Action::ArticlesRefreshed(result) => self.on_articles_refreshed(result),
            Action::SentinelVisibility(visible) => self.on_sentinel(visible),
            Action::BatchDelayElapsed { ticket } => self.on_batch_delay_elapsed(ticket),
            Action::Resized { viewport_width } => {
                self.viewport_width = viewport_width;
                self.resize_generation += 1;
                vec![Effect::Schedule {
                    after: RESIZE_DEBOUNCE,
                    action: Action::ResizeSettled {
                        generation: self.resize_generation,
                    },
                }]
            }
            Action::ResizeSettled { generation } => self.on_resize_settled(generation),

            Action::OpenArticleForm => {
                self.form_open = true;
                vec![Effect::Render(RenderOp::ArticleForm { open: true })]
            }
            Action::CloseArticleForm => self.close_article_form(),
            Action::ImageSelected(file) => match self.adjuster.select(file) {
                Ok(()) => vec![self.image_view()],
                Err(e) => vec![Effect::Notify(e.into())],
            },
            Action::ZoomChanged(percent) => {
                self.adjuster.set_zoom_percent(percent);
                vec![self.image_view()]
            }
            Action::ImagePanned { dx, dy } => {
                self.adjuster.pan(dx, dy);
                vec![self.image_view()]
            }
            Action::DragStarted { x, y } => {
                self.adjuster.begin_drag(x, y);
                Vec::new()
            }
            Action::DragMoved { x, y } => {
                if !self.adjuster.is_dragging() {
                    return Vec::new();
                }
                self.adjuster.drag_to(x, y);
                vec![self.image_view()]
            }
            Action::DragEnded => {
                self.adjuster.end_drag();
                Vec::new()
            }
            Action::ImageRemoved => {
                self.adjuster.remove();
                vec![self.image_view()]
            }
            Action::SubmitArticle(draft) => self.on_submit(draft),
            Action::ArticleSubmitted(result) => self.on_article_submitted(result),

            Action::OpenProfile => {
                self.profile_open = true;
                vec![
                    Effect::Render(self.renderer.profile_loading()),
                    Effect::FetchProfile,
                ]
            }
            Action::ProfileLoaded(result) => self.on_profile_loaded(result),
            Action::EditProfile => vec![Effect::Render(RenderOp::ProfileEditMode(true))],
            Action::CancelEditProfile => vec![Effect::Render(RenderOp::ProfileEditMode(false))],
            Action::CloseProfile => {
                self.profile_open = false;
                vec![Effect::Render(RenderOp::CloseProfileModal)]
            }
            Action::SaveProfile { name, email } => {
                if name.trim().is_empty() || email.trim().is_empty() {
                    return vec![Effect::Notify(ValidationError::MissingProfileFields.into())];
                }
                vec![Effect::UpdateProfile { name, email }]
            }
            Action::ProfileSaved(result) => self.on_profile_saved(result),
            Action::Logout => vec![Effect::Logout],
            Action::LoggedOut(Ok(())) => vec![Effect::Redirect(LOGIN_PATH.to_string())],
            Action::LoggedOut(Err(e)) => {
                warn!("Error logging out: {}", e);
                vec![Effect::Notify(Notice::error("Failed to log out."))]
            }
        }
    }

    fn on_auth_checked(&mut self, result: Result<AuthStatus, ClientError>) -> Vec<Effect> {
        match result {
            Ok(AuthStatus {
                authenticated: true,
                user,
            }) => {
                let mut effects = Vec::new();
                if let Some(user) = user {
                    effects.push(Effect::Render(self.renderer.profile_button(&user.name)));
                    self.profile = Some(user);
                }
                effects.push(Effect::FetchArticles);
                effects
            }
            Ok(_) => {
                info!("Not authenticated, redirecting to {}", LOGIN_PATH);
                vec![Effect::Redirect(LOGIN_PATH.to_string())]
            }
            Err(e) => {
                warn!("Auth check failed: {}", e);
                vec![Effect::Redirect(LOGIN_PATH.to_string())]
            }
        }
    }

    fn on_articles_fetched(&mut self, result: Result<Vec<Article>, ClientError>) -> Vec<Effect> {
        match result {
            Ok(articles) => {
                self.store.load(approved_only(articles));
                self.articles_ready = true;
                self.layout = Some(Layout::from_width(self.viewport_width));
                self.render_for_layout()
            }
            Err(e) => {
                warn!("Error fetching articles: {}", e);
                vec![Effect::Render(self.renderer.error_state())]
            }
        }
    }

    fn on_articles_refreshed(&mut self, result: Result<Vec<Article>, ClientError>) -> Vec<Effect> {
        match result {
            Ok(articles) => self.on_articles_fetched(Ok(articles)),
            Err(e) => {
                warn!("Error refreshing articles, keeping current feed: {}", e);
                Vec::new()
            }
        }
    }

    // Fresh render from the top of the store. Any load still waiting on its
    // delay is abandoned by bumping the ticket.
    fn render_for_layout(&mut self) -> Vec<Effect> {
        let Some(layout) = self.layout else {
            return Vec::new();
        };
        info!(
            "Rendering {} articles for {:?} layout",
            self.store.len(),
            layout
        );

        self.store.reset_cursor();
        self.is_loading = false;
        self.load_ticket += 1;

        let mut effects = vec![Effect::Render(self.renderer.loading_indicator(false))];
        match layout {
            Layout::Mobile => {
                let batch = self.store.next_batch();
                effects.push(Effect::Render(self.renderer.initial_layout(&batch, layout)));
                effects.push(Effect::Render(RenderOp::ObserveSentinel(!batch.is_empty())));
            }
            Layout::Desktop => {
                let page = self.store.desktop_articles();
                effects.push(Effect::Render(self.renderer.initial_layout(page, layout)));
                effects.push(Effect::Render(RenderOp::ObserveSentinel(false)));
            }
        }
        effects
    }

    fn on_sentinel(&mut self, visible: bool) -> Vec<Effect> {
        let scrolling = self.layout.is_some_and(Layout::is_scrolling);
        if !visible || !scrolling || !self.articles_ready || self.store.is_empty() {
            return Vec::new();
        }
        if self.is_loading {
            debug!("Load already in flight, ignoring sentinel");
            return Vec::new();
        }

        self.is_loading = true;
        self.load_ticket += 1;
        vec![
            Effect::Render(self.renderer.loading_indicator(true)),
            Effect::Schedule {
                after: LOAD_DELAY,
                action: Action::BatchDelayElapsed {
                    ticket: self.load_ticket,
                },
            },
        ]
    }

    fn on_batch_delay_elapsed(&mut self, ticket: u64) -> Vec<Effect> {
        if !self.is_loading || ticket != self.load_ticket {
            debug!("Dropping stale load {}", ticket);
            return Vec::new();
        }

        if self.store.is_exhausted() {
            info!("Reached end of articles - shuffling for infinite scroll");
            self.store.reshuffle_with(&mut self.rng);
        }

        let batch = self.store.next_batch();
        debug!(
            "Loaded {} articles, cursor at {}/{}",
            batch.len(),
            self.store.cursor(),
            self.store.len()
        );

        let mut effects = Vec::new();
        if let Some(op) = self.renderer.append_batch(&batch) {
            effects.push(Effect::Render(op));
        }
        effects.push(Effect::Render(self.renderer.loading_indicator(false)));
        self.is_loading = false;
        effects
    }

    fn on_resize_settled(&mut self, generation: u64) -> Vec<Effect> {
        if generation != self.resize_generation || !self.articles_ready {
            return Vec::new();
        }

        let layout = Layout::from_width(self.viewport_width);
        if self.layout == Some(layout) {
            return Vec::new();
        }
        info!(
            "Resize: view mode changed from {:?} to {:?}. Re-rendering.",
            self.layout, layout
        );
        self.layout = Some(layout);
        self.render_for_layout()
    }

    fn image_view(&self) -> Effect {
        Effect::Render(RenderOp::ImageAdjust(ImageView::of(&self.adjuster)))
    }

    fn close_article_form(&mut self) -> Vec<Effect> {
        self.form_open = false;
        self.submitting = false;
        self.adjuster.reset();
        vec![
            Effect::Render(RenderOp::ArticleForm { open: false }),
            Effect::Render(RenderOp::Submitting(false)),
            self.image_view(),
        ]
    }

    fn on_submit(&mut self, draft: ArticleDraft) -> Vec<Effect> {
        if self.submitting {
            return Vec::new();
        }
        if let Err(e) = draft.validate(self.adjuster.has_image()) {
            return vec![Effect::Notify(e.into())];
        }

        let Some(image) = self.adjuster.export() else {
            return vec![Effect::Notify(ValidationError::MissingImage.into())];
        };

        self.submitting = true;
        vec![
            Effect::Render(RenderOp::Submitting(true)),
            Effect::SubmitArticle { draft, image },
        ]
    }

    fn on_article_submitted(&mut self, result: Result<Article, ClientError>) -> Vec<Effect> {
        match result {
            Ok(article) => {
                info!("Article {} submitted", article.id);
                let mut effects = vec![Effect::Notify(Notice::success(
                    "Article submitted successfully! Your article is now live.",
                ))];
                effects.extend(self.close_article_form());
                effects.push(Effect::RefreshArticles);
                effects
            }
            Err(e) => {
                warn!("Article submission error: {}", e);
                self.submitting = false;
                vec![
                    Effect::Notify(Notice::error(&api_message(
                        &e,
                        "Failed to submit article. Please try again.",
                    ))),
                    Effect::Render(RenderOp::Submitting(false)),
                ]
            }
        }
    }

    fn on_profile_loaded(&mut self, result: Result<Option<UserProfile>, ClientError>) -> Vec<Effect> {
        if !self.profile_open {
            return Vec::new();
        }
        match result {
            Ok(Some(user)) => {
                let effects = vec![Effect::Render(self.renderer.profile_modal(&user, false))];
                self.profile = Some(user);
                effects
            }
            Ok(None) => {
                self.profile_open = false;
                vec![
                    Effect::Render(RenderOp::CloseProfileModal),
                    Effect::Redirect(LOGIN_PATH.to_string()),
                ]
            }
            Err(e) => {
                warn!("Profile load error: {}", e);
                self.profile_open = false;
                vec![
                    Effect::Notify(Notice::error("Failed to load profile.")),
                    Effect::Render(RenderOp::CloseProfileModal),
                ]
            }
        }
    }

    fn on_profile_saved(&mut self, result: Result<UserProfile, ClientError>) -> Vec<Effect> {
        match result {
            Ok(user) => {
                let effects = vec![
                    Effect::Render(self.renderer.profile_modal(&user, false)),
                    Effect::Render(self.renderer.profile_button(&user.name)),
                    Effect::Notify(Notice::success("Profile updated successfully!")),
                ];
                self.profile = Some(user);
                effects
            }
            Err(e) => {
                warn!("Profile update error: {}", e);
                vec![Effect::Notify(Notice::error(&api_message(
                    &e,
                    "Failed to update profile.",
                )))]
            }
        }
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }
}

// Server-provided messages are shown verbatim; transport and decode failures
// get the generic text.
fn api_message(err: &ClientError, fallback: &str) -> String {
    match err {
        ClientError::Api { message, .. } if !message.is_empty() => message.clone(),
        _ => fallback.to_string(),
    }
}
